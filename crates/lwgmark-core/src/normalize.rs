use crate::diagnostic::{E_CODE_FENCE, ErrorKind, IssueError};
use crate::html::escape_special_chars;

const FENCE: &str = "\n```\n";

/// Folds author shorthand into markup the extractor and rewriter understand:
/// fenced blocks, inline backtick code and the legacy `tt` tag.
///
/// Code is escaped exactly once, so this must run once on raw source. Running
/// it again over its own output escapes the `&` of every entity a second time.
pub fn normalize_source(mut text: String) -> Result<String, IssueError> {
    fold_fenced_blocks(&mut text)?;
    fold_inline_code(&mut text);
    fold_tt_tags(&mut text);
    Ok(text)
}

fn fold_fenced_blocks(text: &mut String) -> Result<(), IssueError> {
    let mut from = 0;
    while let Some(found) = text[from..].find(FENCE) {
        let open = from + found;
        let body_start = open + FENCE.len();
        let Some(len) = text[body_start..].find(FENCE) else {
            return Err(IssueError::new(
                ErrorKind::MalformedSource,
                E_CODE_FENCE,
                "Unmatched ``` code block",
            )
            .at(text, open + 1));
        };
        let close = body_start + len;
        let code = format!(
            "\n<pre><code>{}\n</code></pre>\n",
            escape_special_chars(&text[body_start..close])
        );
        text.replace_range(open..close + FENCE.len(), &code);
        from = open + code.len();
    }
    Ok(())
}

fn fold_inline_code(text: &mut String) {
    let mut from = 0;
    while let Some(found) = text[from..].find('`') {
        let open = from + found;
        if text.as_bytes().get(open + 1) == Some(&b'`') {
            // ``quoted like this''
            from = open + 2;
            continue;
        }
        let Some(len) = text[open + 1..].find('`') else {
            break;
        };
        let close = open + 1 + len;
        if text[open + 1..close].contains('\n') {
            from = close;
            continue;
        }
        let code = format!(
            "<code class='backtick'>{}</code>",
            escape_special_chars(&text[open + 1..close])
        );
        text.replace_range(open..=close, &code);
        from = open + code.len();
    }
}

fn fold_tt_tags(text: &mut String) {
    let mut from = 0;
    while let Some(found) = text[from..].find("<tt") {
        let pos = from + found;
        match text.as_bytes().get(pos + 3) {
            Some(&c) if c == b'>' || c.is_ascii_whitespace() => {
                text.replace_range(pos..pos + 3, "<code");
                from = pos + "<code".len();
            }
            _ => from = pos + 3,
        }
    }
    if text.contains("</tt>") {
        *text = text.replace("</tt>", "</code>");
    }
}
