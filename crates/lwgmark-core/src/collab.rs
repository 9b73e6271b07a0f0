//! Lookups the extractor and rewriter consult but do not own.

use std::collections::HashMap;

use jiff::Timestamp;
use jiff::civil::Date;
use jiff::tz::TimeZone;

/// Last-modified date of an issue, keyed by issue number.
pub trait ModDateSource {
    fn mod_date(&self, issue: u32) -> Option<Date>;
}

impl ModDateSource for HashMap<u32, Date> {
    fn mod_date(&self, issue: u32) -> Option<Date> {
        self.get(&issue).copied()
    }
}

/// Display titles for papers, keyed by upper-case paper number.
pub trait PaperTitles {
    fn paper_title(&self, paper: &str) -> Option<&str>;
}

impl PaperTitles for HashMap<String, String> {
    fn paper_title(&self, paper: &str) -> Option<&str> {
        self.get(paper).map(String::as_str)
    }
}

/// Predicates over issue status strings.
pub trait StatusClassifier {
    fn is_active(&self, stat: &str) -> bool;
    fn is_votable(&self, stat: &str) -> bool;
    fn is_ready(&self, stat: &str) -> bool;
    fn is_assigned_elsewhere(&self, stat: &str) -> bool;
    /// Published list an issue with this status appears in.
    fn list_file(&self, stat: &str) -> &str;
}

/// Reads `NUMBER Title text` lines. Blank lines, `#` comments and numbers
/// without a title are skipped.
pub fn parse_paper_titles(text: &str) -> HashMap<String, String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let (number, title) = line.split_once(char::is_whitespace)?;
            let title = title.trim();
            (!title.is_empty()).then(|| (number.to_ascii_uppercase(), title.to_string()))
        })
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum CommitDatesError {
    #[error("line {line}: expected `<issue> <unix-seconds>`, found {text:?}")]
    Syntax { line: usize, text: String },
    #[error("line {line}: timestamp out of range")]
    Timestamp {
        line: usize,
        #[source]
        source: jiff::Error,
    },
}

/// Reads `<issue> <unix-seconds>` lines into UTC calendar dates.
pub fn parse_commit_dates(text: &str) -> Result<HashMap<u32, Date>, CommitDatesError> {
    let mut dates = HashMap::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let syntax = || CommitDatesError::Syntax {
            line: idx + 1,
            text: raw.to_string(),
        };
        let mut fields = line.split_whitespace();
        let (Some(issue), Some(seconds), None) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(syntax());
        };
        let issue: u32 = issue.parse().map_err(|_| syntax())?;
        let seconds: i64 = seconds.parse().map_err(|_| syntax())?;
        let timestamp = Timestamp::from_second(seconds).map_err(|source| {
            CommitDatesError::Timestamp {
                line: idx + 1,
                source,
            }
        })?;
        dates.insert(issue, timestamp.to_zoned(TimeZone::UTC).date());
    }
    Ok(dates)
}
