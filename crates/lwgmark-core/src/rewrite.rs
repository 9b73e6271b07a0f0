//! Rewrites issue markup into HTML in place.
//!
//! The scan walks the buffer once, left to right, keeping a stack of open tag
//! names. Domain tags are replaced as they are met and the cursor jumps past
//! each replacement, so replacement text is never rescanned. Offsets taken
//! before a replacement are stale after it.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::collab::{PaperTitles, StatusClassifier};
use crate::diagnostic::{
    E_BAD_NUMBER, E_COMMENT_UNCLOSED, E_IREF_MISSING, E_MISSING_GT, E_MISSING_QUOTE,
    E_PAPER_INVALID, E_SREF_SYNTAX, E_TAG_EMPTY, E_TAG_MISMATCH, E_TAG_UNCLOSED, E_UNESCAPED_LT,
    ErrorKind, IssueError,
};
use crate::html::escape_title_attr;
use crate::issue::{Issue, make_html_anchor};
use crate::query::get_attribute;
use crate::section::{SectionDb, SectionLinker, SectionTag};

/// Open and close replacements for domain tags.
static SUBSTITUTIONS: Lazy<HashMap<&'static str, (&'static str, &'static str)>> =
    Lazy::new(|| {
        HashMap::from([
            ("discussion", ("<p><b>Discussion:</b></p>", "")),
            ("issue", ("", "")),
            ("resolution", ("", "")),
            ("rationale", ("<p><b>Rationale:</b></p>", "")),
            ("duplicate", ("", "")),
            ("note", ("<p><i>[", "]</i></p>\n")),
            (
                "superseded",
                (
                    "<p><strong>Previous resolution [SUPERSEDED]:</strong></p>\n<blockquote class=\"note\">\n",
                    "</blockquote>",
                ),
            ),
        ])
    });

static PAPER_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:N?[0-9]+|[DP][0-9]+(?:R[0-9]+)?)$").expect("paper number pattern")
});

const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";

/// Turns extracted issues into HTML fragments, resolving references to
/// sections, other issues and papers.
pub struct Rewriter<'a> {
    pub linker: &'a dyn SectionLinker,
    pub papers: &'a dyn PaperTitles,
    pub statuses: &'a dyn StatusClassifier,
}

impl Rewriter<'_> {
    /// Sorts `issues` by number and rewrites each of them. Issue numbers
    /// must be unique.
    pub fn prepare_issues(
        &self,
        issues: &mut [Issue],
        sections: &mut SectionDb,
    ) -> Result<(), IssueError> {
        issues.sort_by_key(|issue| issue.num);
        if let Some(pair) = issues.windows(2).find(|pair| pair[0].num == pair[1].num) {
            return Err(IssueError::duplicate_issue(pair[1].num));
        }
        for index in 0..issues.len() {
            self.rewrite_issue(index, issues, sections)?;
        }
        Ok(())
    }

    /// Rewrites `text` and then `resolution` of `issues[index]`.
    /// `issues` must be sorted by number.
    pub fn rewrite_issue(
        &self,
        index: usize,
        issues: &mut [Issue],
        sections: &mut SectionDb,
    ) -> Result<(), IssueError> {
        let mut text = std::mem::take(&mut issues[index].text);
        let result = self.rewrite_buffer(&mut text, index, issues, sections);
        issues[index].text = text;
        result?;

        let mut resolution = std::mem::take(&mut issues[index].resolution);
        let result = self.rewrite_buffer(&mut resolution, index, issues, sections);
        issues[index].resolution = resolution;
        result?;

        tracing::trace!(issue = issues[index].num, "rewrote issue");
        Ok(())
    }

    fn rewrite_buffer(
        &self,
        text: &mut String,
        index: usize,
        issues: &mut [Issue],
        sections: &mut SectionDb,
    ) -> Result<(), IssueError> {
        let num = issues[index].num;
        let fail = |kind, code, message: String, text: &str, at: usize| {
            IssueError::new(kind, code, message).in_issue(num).at(text, at)
        };

        // Open tag names with the offset each was found at.
        let mut stack: Vec<(String, usize)> = Vec::new();
        let mut cursor = 0;
        while let Some(found) = text[cursor..].find('<') {
            let open = cursor + found;

            if text[open..].starts_with(COMMENT_OPEN) {
                let Some(len) = text[open + COMMENT_OPEN.len()..].find(COMMENT_CLOSE) else {
                    return Err(fail(
                        ErrorKind::MissingDelimiter,
                        E_COMMENT_UNCLOSED,
                        "Missing '-->' for comment".to_string(),
                        text,
                        open,
                    ));
                };
                let end = open + COMMENT_OPEN.len() + len + COMMENT_CLOSE.len();
                text.replace_range(open..end, "");
                cursor = open;
                continue;
            }

            match text.as_bytes().get(open + 1) {
                Some(&c) if c.is_ascii_alphabetic() || c == b'/' || c == b'!' => {}
                _ => {
                    return Err(fail(
                        ErrorKind::UnescapedMarkup,
                        E_UNESCAPED_LT,
                        "Unescaped '<'".to_string(),
                        text,
                        open,
                    ));
                }
            }

            let Some(len) = text[open..].find('>') else {
                return Err(fail(
                    ErrorKind::MissingDelimiter,
                    E_MISSING_GT,
                    "Missing '>'".to_string(),
                    text,
                    open,
                ));
            };
            let close = open + len;
            let token = text[open + 1..close]
                .split_whitespace()
                .next()
                .unwrap_or("");

            if let Some(name) = token.strip_prefix('/') {
                if name.is_empty() {
                    return Err(fail(
                        ErrorKind::MalformedSource,
                        E_TAG_EMPTY,
                        "Unexpected </>".to_string(),
                        text,
                        open,
                    ));
                }
                match stack.last() {
                    Some((top, _)) if top == name => {}
                    top => {
                        let message = match top {
                            Some((top, _)) => format!(
                                "Mismatched tags. Open tag was <{top}>, closing tag was </{name}>"
                            ),
                            None => format!(
                                "Mismatched tags. Had no open tag, closing tag was </{name}>"
                            ),
                        };
                        return Err(fail(
                            ErrorKind::StructuralMismatch,
                            E_TAG_MISMATCH,
                            message,
                            text,
                            open,
                        ));
                    }
                }
                stack.pop();
                cursor = match SUBSTITUTIONS.get(name) {
                    Some(&(_, replacement)) => replace(text, open, close, replacement),
                    None => close + 1,
                };
                continue;
            }

            if text.as_bytes()[close - 1] == b'/' {
                let name = token.trim_end_matches('/');
                let tag = &text[open..=close];
                let replacement = match name {
                    "sref" => {
                        let value = attribute(tag, "ref", name).map_err(|message| {
                            fail(ErrorKind::MissingDelimiter, E_MISSING_QUOTE, message, text, open)
                        })?;
                        let Some(section) =
                            value.strip_prefix('[').and_then(|v| v.strip_suffix(']'))
                        else {
                            return Err(fail(
                                ErrorKind::MalformedSource,
                                E_SREF_SYNTAX,
                                format!("Section reference {value:?} is not of the form [name]"),
                                text,
                                open,
                            ));
                        };
                        let tag = sections
                            .resolve(SectionTag::new(issues[index].prefix(), section));
                        sections.register_placeholder(&tag);
                        Some(self.linker.section_link(sections, &tag))
                    }
                    "iref" => {
                        let value = attribute(tag, "ref", name).map_err(|message| {
                            fail(ErrorKind::MissingDelimiter, E_MISSING_QUOTE, message, text, open)
                        })?;
                        let Ok(target) = value.trim().parse::<u32>() else {
                            return Err(fail(
                                ErrorKind::MalformedSource,
                                E_BAD_NUMBER,
                                "Bad number in <iref>".to_string(),
                                text,
                                open,
                            ));
                        };
                        let Ok(found) = issues.binary_search_by_key(&target, |issue| issue.num)
                        else {
                            return Err(fail(
                                ErrorKind::ReferenceResolution,
                                E_IREF_MISSING,
                                format!("Could not find issue {target} for <iref>"),
                                text,
                                open,
                            ));
                        };
                        if stack.last().is_some_and(|(top, _)| top == "duplicate") {
                            let here = make_html_anchor(&issues[index], self.statuses);
                            let there = make_html_anchor(&issues[found], self.statuses);
                            issues[found].duplicates.insert(here);
                            issues[index].duplicates.insert(there);
                            Some(String::new())
                        } else {
                            Some(format!(
                                "{}<sup><a href=\"https://cplusplus.github.io/LWG/issue{target}\" title=\"Latest snapshot\">(i)</a></sup>",
                                make_html_anchor(&issues[found], self.statuses)
                            ))
                        }
                    }
                    "paper" => {
                        let value = attribute(tag, "num", name).map_err(|message| {
                            fail(ErrorKind::MissingDelimiter, E_MISSING_QUOTE, message, text, open)
                        })?;
                        if !PAPER_NUMBER.is_match(value) {
                            return Err(fail(
                                ErrorKind::ReferenceResolution,
                                E_PAPER_INVALID,
                                format!("Invalid paper number '{value}'"),
                                text,
                                open,
                            ));
                        }
                        let paper = value.to_ascii_uppercase();
                        let title = self
                            .papers
                            .paper_title(&paper)
                            .filter(|title| !title.is_empty())
                            .map(|title| format!(" title=\"{}\"", escape_title_attr(title)))
                            .unwrap_or_default();
                        Some(format!(
                            "<a href=\"https://wg21.link/{paper}\"{title}>{paper}</a>"
                        ))
                    }
                    _ => None,
                };
                cursor = match replacement {
                    Some(replacement) => replace(text, open, close, &replacement),
                    None => close + 1,
                };
                continue;
            }

            let name = token.to_string();
            cursor = if name == "resolution" {
                let heading = format!("<p id=\"res-{num}\"><b>Proposed resolution:</b></p>");
                replace(text, open, close, &heading)
            } else if let Some(&(replacement, _)) = SUBSTITUTIONS.get(name.as_str()) {
                replace(text, open, close, replacement)
            } else {
                close + 1
            };
            stack.push((name, open));
        }

        if let Some((top, at)) = stack.last() {
            return Err(fail(
                ErrorKind::StructuralMismatch,
                E_TAG_UNCLOSED,
                format!("Unclosed tag <{top}>"),
                text,
                *at,
            ));
        }
        Ok(())
    }
}

/// Replaces `text[open..=close]` and returns the offset just past the replacement.
fn replace(text: &mut String, open: usize, close: usize, replacement: &str) -> usize {
    text.replace_range(open..=close, replacement);
    open + replacement.len()
}

fn attribute<'a>(tag: &'a str, attr: &str, element: &str) -> Result<&'a str, String> {
    get_attribute(attr, tag)
        .map(|span| span.slice(tag))
        .ok_or_else(|| format!("Missing '\"' in <{element}>"))
}
