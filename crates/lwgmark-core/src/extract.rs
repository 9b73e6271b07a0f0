use std::collections::BTreeSet;
use std::path::Path;

use jiff::civil::Date;

use crate::collab::{ModDateSource, StatusClassifier};
use crate::diagnostic::{
    Diagnostic, DiagnosticSeverity, E_BAD_DATE, E_BAD_NUMBER, E_MISSING_END_TAG, E_MISSING_FIELD,
    E_SREF_SYNTAX, ErrorKind, IssueError, W_NUM_MISMATCH,
};
use crate::issue::Issue;
use crate::normalize::normalize_source;
use crate::query::{
    attributes_of, find_element, get_attribute_of, get_element, get_element_contents,
};
use crate::section::{SectionDb, SectionTag};
use crate::source_map::SourceMap;

/// Shorter resolutions are whitespace between tags, not a proposed wording.
const MIN_RESOLUTION_LEN: usize = 15;

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

#[derive(Debug)]
pub struct Extracted {
    pub issue: Issue,
    pub diagnostics: Vec<Diagnostic>,
}

/// Pulls the structured fields out of one issue document.
pub struct Extractor<'a> {
    pub mod_dates: &'a dyn ModDateSource,
    pub statuses: &'a dyn StatusClassifier,
}

impl Extractor<'_> {
    /// Normalizes `source` and extracts its fields. Section references are
    /// registered in `sections`, with a placeholder number when unknown.
    /// `source_name` is the file name, expected to look like `issue0123.xml`.
    pub fn extract(
        &self,
        source: String,
        source_name: &str,
        sections: &mut SectionDb,
    ) -> Result<Extracted, IssueError> {
        let mut text = normalize_source(source)?;
        let mut diagnostics = Vec::new();

        let num_span = get_attribute_of("num", "issue", &text)
            .ok_or_else(|| missing("Unable to find issue number"))?;
        let num_text = num_span.slice(&text);
        let num = match num_text.trim().parse::<u32>() {
            Ok(num) if num > 0 => num,
            _ => {
                return Err(IssueError::new(
                    ErrorKind::MalformedSource,
                    E_BAD_NUMBER,
                    format!("Invalid issue number {num_text:?}"),
                )
                .at(&text, num_span.start));
            }
        };

        if !source_name.ends_with(&format!("issue{num_text:0>4}.xml")) {
            tracing::warn!(
                issue = num,
                source = source_name,
                "issue number does not match file name"
            );
            let mut diagnostic = Diagnostic::new(
                DiagnosticSeverity::Warning,
                W_NUM_MISMATCH,
                format!("issue number {num} in {source_name} does not match file name"),
            )
            .in_issue(num);
            diagnostic.position = Some(SourceMap::new(&text).position(num_span.start));
            diagnostics.push(diagnostic);
        }

        let stat = get_attribute_of("status", "issue", &text)
            .map(|span| span.slice(&text).to_string())
            .ok_or_else(|| missing("Unable to find issue status").in_issue(num))?;

        let title = get_element_contents("title", &text)
            .ok_or_else(|| missing("Unable to find issue title").in_issue(num))?
            .to_string();
        let doc_prefix = doc_prefix_of(&title);

        let tags = self.section_tags(&text, num, doc_prefix.as_deref().unwrap_or(""), sections)?;

        let submitter = get_element_contents("submitter", &text)
            .ok_or_else(|| missing("Unable to find issue submitter").in_issue(num))?
            .to_string();

        let date_element = get_element("date", &text)
            .ok_or_else(|| missing("Unable to find issue date").in_issue(num))?;
        let date = parse_date(date_element.inner.slice(&text)).ok_or_else(|| {
            IssueError::new(ErrorKind::MalformedSource, E_BAD_DATE, "date format error")
                .in_issue(num)
                .at(&text, date_element.inner.start)
        })?;

        let mod_date = self
            .mod_dates
            .mod_date(parse_issue_number_from_name(source_name).unwrap_or(num))
            .unwrap_or(date);

        let priority = match find_element("priority", &text) {
            None => None,
            Some(start) => {
                let element = get_element("priority", &text).ok_or_else(|| {
                    IssueError::new(
                        ErrorKind::MissingDelimiter,
                        E_MISSING_END_TAG,
                        "Corrupt 'priority' element: no closing tag",
                    )
                    .in_issue(num)
                    .at(&text, start)
                })?;
                let value = element.inner.slice(&text).trim();
                Some(value.parse::<i32>().map_err(|_| {
                    IssueError::new(
                        ErrorKind::MalformedSource,
                        E_BAD_NUMBER,
                        format!("Invalid priority {value:?}"),
                    )
                    .in_issue(num)
                    .at(&text, element.inner.start)
                })?)
            }
        };

        let discussion = find_element("discussion", &text)
            .ok_or_else(|| missing("Unable to find issue discussion").in_issue(num))?;
        text.drain(..discussion);
        if let Some(end) = text.rfind("</issue>") {
            text.truncate(end);
        }

        let has_resolution = if self.statuses.is_active(&stat) || stat == "Pending WP" {
            get_element_contents("resolution", &text)
                .is_some_and(|resolution| resolution.len() >= MIN_RESOLUTION_LEN)
        } else {
            true
        };

        Ok(Extracted {
            issue: Issue {
                num,
                stat,
                title,
                doc_prefix,
                tags,
                submitter,
                date,
                mod_date,
                priority,
                has_resolution,
                text,
                resolution: String::new(),
                duplicates: BTreeSet::new(),
            },
            diagnostics,
        })
    }

    fn section_tags(
        &self,
        text: &str,
        num: u32,
        prefix: &str,
        sections: &mut SectionDb,
    ) -> Result<Vec<SectionTag>, IssueError> {
        let element = get_element("section", text)
            .ok_or_else(|| missing("Unable to find issue section").in_issue(num))?;
        let inner = element.inner.slice(text);

        let mut tags = Vec::new();
        for span in attributes_of("ref", "sref", inner) {
            let value = span.slice(inner);
            let Some(name) = value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) else {
                return Err(IssueError::new(
                    ErrorKind::MalformedSource,
                    E_SREF_SYNTAX,
                    format!("Section reference {value:?} is not of the form [name]"),
                )
                .in_issue(num)
                .at(text, element.inner.start + span.start));
            };
            let tag = SectionTag::new(prefix, name);
            sections.register_placeholder(&tag);
            tags.push(tag);
        }

        if tags.is_empty() {
            return Err(missing("Unable to find issue section").in_issue(num));
        }
        Ok(tags)
    }
}

fn missing(message: &str) -> IssueError {
    IssueError::new(ErrorKind::MalformedSource, E_MISSING_FIELD, message)
}

/// `P1234` from a title such as `[P1234] Fix the thing`.
fn doc_prefix_of(title: &str) -> Option<String> {
    if !title.starts_with('[') || title.contains("[CD]") {
        return None;
    }
    title.find(']').map(|end| title[1..end].to_string())
}

/// Issue number embedded in a file name: `issue0123.xml` gives `123`.
pub fn parse_issue_number_from_name(name: &str) -> Option<u32> {
    Path::new(name)
        .file_stem()?
        .to_str()?
        .strip_prefix("issue")?
        .parse()
        .ok()
}

/// Parses `12 Mar 2024`. Month names may be abbreviated and any case.
fn parse_date(text: &str) -> Option<Date> {
    let mut fields = text.split_whitespace();
    let (Some(day), Some(month), Some(year), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return None;
    };
    let month = month.to_ascii_lowercase();
    if month.len() < 3 {
        return None;
    }
    let month = MONTHS.iter().position(|name| name.starts_with(&month))?;
    Date::new(year.parse().ok()?, month as i8 + 1, day.parse().ok()?).ok()
}
