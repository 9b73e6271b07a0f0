use std::fmt;

use crate::source_map::SourceMap;

const MAX_WIDTH: usize = 80;
const ELLIPSIS_BEFORE: &str = "[...] ";
const ELLIPSIS_AFTER: &str = " [...]";

/// One line of source around a failing offset, trimmed to fit in
/// [`MAX_WIDTH`] columns, with the column of the offset for a caret.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Context {
    pub line: String,
    pub column: usize,
}

impl Context {
    pub fn new(text: &str, offset: usize) -> Self {
        let offset = floor_char_boundary(text, offset.min(text.len()));
        let map = SourceMap::new(text);
        let line = map.line_span(map.line_of(offset));
        let mut text = line.slice(text);
        let mut pos = offset - line.start;

        let mut prefix = "";
        if pos > MAX_WIDTH - 10 {
            // Drop whole half-widths so the offset lands in the middle.
            let half = MAX_WIDTH / 2;
            let drop = floor_char_boundary(text, (pos / half - 1) * half + pos % half);
            text = &text[drop..];
            pos -= drop;
            prefix = ELLIPSIS_BEFORE;
        }

        let (shown, suffix) = if text.len() > MAX_WIDTH {
            (
                &text[..floor_char_boundary(text, MAX_WIDTH - 8)],
                ELLIPSIS_AFTER,
            )
        } else {
            (text, "")
        };

        Self {
            line: format!("{prefix}{shown}{suffix}"),
            column: prefix.len() + text[..pos].chars().count(),
        }
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{:width$}^", self.line, "", width = self.column)
    }
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}
