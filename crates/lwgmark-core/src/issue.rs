use std::collections::BTreeSet;

use jiff::civil::Date;

use crate::collab::StatusClassifier;
use crate::html::strip_xml_elements;
use crate::section::SectionTag;

/// One issue document after extraction. `text` and `resolution` hold markup
/// until the rewriter turns them into HTML fragments.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Issue {
    pub num: u32,
    pub stat: String,
    pub title: String,
    /// Paper named by a leading `[P1234]` in the title.
    pub doc_prefix: Option<String>,
    pub tags: Vec<SectionTag>,
    pub submitter: String,
    pub date: Date,
    pub mod_date: Date,
    pub priority: Option<i32>,
    pub has_resolution: bool,
    pub text: String,
    pub resolution: String,
    /// Anchors of issues this one duplicates or is duplicated by.
    pub duplicates: BTreeSet<String>,
}

impl Issue {
    pub fn prefix(&self) -> &str {
        self.doc_prefix.as_deref().unwrap_or("")
    }
}

/// `<a>` linking to the issue in the list for its status, titled with the
/// plain-text issue title.
pub fn make_html_anchor(issue: &Issue, statuses: &dyn StatusClassifier) -> String {
    let title = strip_xml_elements(&issue.title).replace('"', "&quot;");
    format!(
        "<a href=\"{file}#{num}\" title=\"{title} (Status: {stat})\">{num}</a>",
        file = statuses.list_file(&issue.stat),
        num = issue.num,
        stat = issue.stat,
    )
}
