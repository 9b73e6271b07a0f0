use ammonia::Builder;
use std::collections::{HashMap, HashSet};

/// Escapes `&`, `<` and `>`. `&` goes first so the other entities are not re-escaped.
pub fn escape_special_chars(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escapes text for use inside a double-quoted attribute such as `title="..."`.
/// Markup is kept as-is, matching how issue titles are written.
pub fn escape_title_attr(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Removes every `<...>` element, leaving only the text nodes.
pub fn strip_xml_elements(xml: &str) -> String {
    let mut out = String::with_capacity(xml.len());
    let mut rest = xml;
    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        match rest[open..].find('>') {
            Some(close) => rest = &rest[open + close + 1..],
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Cleans a rewritten issue fragment against the vocabulary the rewriter emits
/// plus the plain HTML authors write directly in issue bodies.
pub fn sanitize_html(raw_html: &str) -> String {
    let tags: HashSet<&'static str> = [
        "a",
        "b",
        "blockquote",
        "br",
        "code",
        "dd",
        "del",
        "div",
        "dl",
        "dt",
        "em",
        "h1",
        "h2",
        "h3",
        "h4",
        "h5",
        "h6",
        "hr",
        "i",
        "ins",
        "li",
        "ol",
        "p",
        "pre",
        "s",
        "span",
        "strong",
        "sub",
        "sup",
        "table",
        "tbody",
        "td",
        "th",
        "thead",
        "tr",
        "u",
        "ul",
    ]
    .iter()
    .copied()
    .collect();

    let generic_attributes: HashSet<&'static str> =
        ["class", "id", "title"].iter().copied().collect();

    let mut tag_attributes = HashMap::new();
    tag_attributes.insert("a", ["href", "title"].iter().copied().collect());
    tag_attributes.insert("ol", ["start"].iter().copied().collect());
    tag_attributes.insert("td", ["colspan", "rowspan"].iter().copied().collect());
    tag_attributes.insert("th", ["colspan", "rowspan"].iter().copied().collect());

    Builder::new()
        .tags(tags)
        .generic_attributes(generic_attributes)
        .tag_attributes(tag_attributes)
        .clean(raw_html)
        .to_string()
}
