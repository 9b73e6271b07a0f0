mod collab;
mod context;
mod diagnostic;
mod extract;
mod html;
mod issue;
mod normalize;
mod query;
mod rewrite;
mod section;
mod source_map;
mod span;
mod status;

pub use collab::{
    CommitDatesError, ModDateSource, PaperTitles, StatusClassifier, parse_commit_dates,
    parse_paper_titles,
};
pub use context::Context;
pub use diagnostic::{
    Diagnostic, DiagnosticSeverity, E_BAD_DATE, E_BAD_NUMBER, E_CODE_FENCE, E_COMMENT_UNCLOSED,
    E_DUPLICATE_ISSUE, E_IREF_MISSING, E_MISSING_END_TAG, E_MISSING_FIELD, E_MISSING_GT,
    E_MISSING_QUOTE, E_PAPER_INVALID, E_SREF_SYNTAX, E_TAG_EMPTY, E_TAG_MISMATCH, E_TAG_UNCLOSED,
    E_UNESCAPED_LT, ErrorKind, IssueError, W_NUM_MISMATCH,
};
pub use extract::{Extracted, Extractor, parse_issue_number_from_name};
pub use html::{escape_special_chars, escape_title_attr, sanitize_html, strip_xml_elements};
pub use issue::{Issue, make_html_anchor};
pub use normalize::normalize_source;
pub use query::{
    AttributesOf, Element, attributes_of, find_element, get_attribute, get_attribute_of,
    get_element, get_element_contents,
};
pub use rewrite::Rewriter;
pub use section::{
    SectionDb, SectionIndexError, SectionLinker, SectionNum, SectionTag, UNRESOLVED_SECTION,
    WgSectionLinker,
};
pub use source_map::{Position, SourceMap};
pub use span::{Span, SpanError};
pub use status::LwgStatuses;
