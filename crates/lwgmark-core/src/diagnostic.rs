use crate::context::Context;
use crate::source_map::{Position, SourceMap};

pub const E_MISSING_FIELD: &str = "E_MISSING_FIELD";
pub const E_BAD_NUMBER: &str = "E_BAD_NUMBER";
pub const E_BAD_DATE: &str = "E_BAD_DATE";
pub const E_CODE_FENCE: &str = "E_CODE_FENCE";
pub const E_SREF_SYNTAX: &str = "E_SREF_SYNTAX";
pub const E_UNESCAPED_LT: &str = "E_UNESCAPED_LT";
pub const E_TAG_EMPTY: &str = "E_TAG_EMPTY";
pub const E_TAG_MISMATCH: &str = "E_TAG_MISMATCH";
pub const E_TAG_UNCLOSED: &str = "E_TAG_UNCLOSED";
pub const E_IREF_MISSING: &str = "E_IREF_MISSING";
pub const E_PAPER_INVALID: &str = "E_PAPER_INVALID";
pub const E_MISSING_QUOTE: &str = "E_MISSING_QUOTE";
pub const E_MISSING_GT: &str = "E_MISSING_GT";
pub const E_MISSING_END_TAG: &str = "E_MISSING_END_TAG";
pub const E_COMMENT_UNCLOSED: &str = "E_COMMENT_UNCLOSED";
pub const E_DUPLICATE_ISSUE: &str = "E_DUPLICATE_ISSUE";

pub const W_NUM_MISMATCH: &str = "W_NUM_MISMATCH";

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    /// Missing mandatory element or attribute, bad date, non-numeric number, unmatched fence,
    /// or an issue number used twice.
    MalformedSource,
    /// `<` that does not start a tag or comment.
    UnescapedMarkup,
    /// Closing tag that does not match the open one, or a tag left open.
    StructuralMismatch,
    /// `iref` to an unknown issue, or an invalid paper number.
    ReferenceResolution,
    /// Attribute quote, `>` or end marker not found.
    MissingDelimiter,
}

/// A fault that abandons the current issue document.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("{message}{}{}", issue_suffix(.issue), context_suffix(.context))]
pub struct IssueError {
    pub kind: ErrorKind,
    pub code: &'static str,
    pub issue: Option<u32>,
    pub message: String,
    /// Byte offset into the buffer that was being scanned when the fault was found.
    pub offset: Option<usize>,
    pub position: Option<Position>,
    pub context: Option<Context>,
}

impl IssueError {
    pub fn new(kind: ErrorKind, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            code,
            issue: None,
            message: message.into(),
            offset: None,
            position: None,
            context: None,
        }
    }

    pub fn duplicate_issue(num: u32) -> Self {
        Self::new(
            ErrorKind::MalformedSource,
            E_DUPLICATE_ISSUE,
            format!("Issue number {num} is used more than once"),
        )
        .in_issue(num)
    }

    pub fn in_issue(mut self, num: u32) -> Self {
        self.issue = Some(num);
        self
    }

    pub fn at(mut self, text: &str, offset: usize) -> Self {
        self.offset = Some(offset);
        self.position = Some(SourceMap::new(text).position(offset));
        self.context = Some(Context::new(text, offset));
        self
    }
}

fn issue_suffix(issue: &Option<u32>) -> String {
    issue
        .map(|num| format!(" in issue {num}"))
        .unwrap_or_default()
}

fn context_suffix(context: &Option<Context>) -> String {
    context
        .as_ref()
        .map(|context| format!(":\n{context}"))
        .unwrap_or_default()
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub code: &'static str,
    pub issue: Option<u32>,
    pub message: String,
    pub position: Option<Position>,
}

impl Diagnostic {
    pub fn new(
        severity: DiagnosticSeverity,
        code: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            code,
            issue: None,
            message: message.into(),
            position: None,
        }
    }

    pub fn in_issue(mut self, num: u32) -> Self {
        self.issue = Some(num);
        self
    }
}

impl From<&IssueError> for Diagnostic {
    fn from(error: &IssueError) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            code: error.code,
            issue: error.issue,
            message: error.message.clone(),
            position: error.position,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}
