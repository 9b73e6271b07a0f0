//! Substring-based lookups over issue markup.
//!
//! These expect input that follows XML rules rather than relaxed HTML5 ones:
//! element names are case-sensitive, attributes are quoted and end tags are
//! never optional. That is the shape of the issue format, so no tree is built.
//! Every lookup reports absence as `None`; callers decide whether it is fatal.

use crate::span::Span;

/// Spans of one element. `inner` is empty (and sits at `outer.end`) for `<name/>`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Element {
    pub outer: Span,
    pub inner: Span,
}

/// Offset of the first `<name` followed by `>`, whitespace or `/`.
pub fn find_element(name: &str, text: &str) -> Option<usize> {
    if name.is_empty() {
        return None;
    }
    let start_tag = format!("<{name}");
    let bytes = text.as_bytes();
    let mut from = 0;
    while let Some(found) = text[from..].find(&start_tag) {
        let pos = from + found;
        let after = pos + start_tag.len();
        if let Some(&c) = bytes.get(after)
            && (c == b'>' || c == b'/' || c.is_ascii_whitespace())
        {
            return Some(pos);
        }
        from = after;
    }
    None
}

/// Finds `<name ...>...</name>` or `<name .../>`.
///
/// The end tag is matched literally, so `</name >` is not recognised. An element
/// nested inside one of the same name ends at the first `</name>`: for
/// `<p> <p>nested</p> </p>` the inner text is `" "`.
pub fn get_element(name: &str, text: &str) -> Option<Element> {
    let start = find_element(name, text)?;
    let close = start + text[start..].find('>')?;
    if text.as_bytes()[close - 1] == b'/' {
        return Some(Element {
            outer: Span {
                start,
                end: close + 1,
            },
            inner: Span::empty_at(close + 1),
        });
    }

    let end_tag = format!("</{name}>");
    let inner_start = close + 1;
    let inner_end = inner_start + text[inner_start..].find(&end_tag)?;
    Some(Element {
        outer: Span {
            start,
            end: inner_end + end_tag.len(),
        },
        inner: Span {
            start: inner_start,
            end: inner_end,
        },
    })
}

/// The `...` of the first `<name>...</name>`.
pub fn get_element_contents<'a>(name: &str, text: &'a str) -> Option<&'a str> {
    get_element(name, text).map(|element| element.inner.slice(text))
}

/// Value of the first `name="..."` (or `name='...'`) in `text`.
///
/// The name must follow whitespace or the start of `text`, so `attr` never
/// matches inside `notattr`. Whitespace is allowed around `=`. A candidate that
/// turns out not to be an attribute is skipped and the scan moves on.
pub fn get_attribute(name: &str, text: &str) -> Option<Span> {
    if name.is_empty() {
        return None;
    }
    let bytes = text.as_bytes();
    let mut from = 0;
    while let Some(found) = text[from..].find(name) {
        let pos = from + found;
        from = pos + name.len();
        if pos > 0 && !bytes[pos - 1].is_ascii_whitespace() {
            continue;
        }
        let eq = skip_whitespace(bytes, pos + name.len());
        if bytes.get(eq) != Some(&b'=') {
            continue;
        }
        let open = skip_whitespace(bytes, eq + 1);
        let quote = match bytes.get(open) {
            Some(&quote @ (b'"' | b'\'')) => quote,
            _ => continue,
        };
        let value_start = open + 1;
        let Some(len) = text[value_start..].find(char::from(quote)) else {
            continue;
        };
        return Some(Span {
            start: value_start,
            end: value_start + len,
        });
    }
    None
}

/// Value of `attr` on the first `<elem ...>` start tag that carries it.
/// Only the start tag is searched, never the element's content.
pub fn get_attribute_of(attr: &str, elem: &str, text: &str) -> Option<Span> {
    attributes_of(attr, elem, text).next()
}

/// Every value of `attr` on successive `<elem ...>` start tags, in order.
pub fn attributes_of<'a>(attr: &'a str, elem: &'a str, text: &'a str) -> AttributesOf<'a> {
    AttributesOf {
        attr,
        elem,
        text,
        offset: 0,
    }
}

pub struct AttributesOf<'a> {
    attr: &'a str,
    elem: &'a str,
    text: &'a str,
    offset: usize,
}

impl Iterator for AttributesOf<'_> {
    type Item = Span;

    fn next(&mut self) -> Option<Span> {
        loop {
            let start = self.offset + find_element(self.elem, &self.text[self.offset..])?;
            let name_end = start + 1 + self.elem.len();
            let Some(close) = self.text[name_end..].find('>') else {
                self.offset = self.text.len();
                return None;
            };
            let tag_end = name_end + close + 1;
            self.offset = tag_end;
            if let Some(value) = get_attribute(self.attr, &self.text[start..tag_end]) {
                return Some(value.shift(start));
            }
        }
    }
}

fn skip_whitespace(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    pos
}
