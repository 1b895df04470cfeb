use std::fmt;

use nova_extract_hir::Span;
use serde::Serialize;
use thiserror::Error;

/// The kind of write that gets routed through a back-pointer setter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RewriteKind {
    Assignment,
    CompoundAssignment,
    Increment,
    Decrement,
}

impl fmt::Display for RewriteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RewriteKind::Assignment => "assignment",
            RewriteKind::CompoundAssignment => "compound assignment",
            RewriteKind::Increment => "increment",
            RewriteKind::Decrement => "decrement",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractClassError {
    #[error("class '{0}' not found")]
    ClassNotFound(String),
    #[error("member '{member}' not found in class '{class}'")]
    MemberNotFound { class: String, member: String },
    #[error("'{0}' is not a valid Java class name")]
    InvalidClassName(String),
    #[error(
        "{kind} of field '{field}' is used as a value at bytes {}..{} and cannot be delegated",
        span.start,
        span.end
    )]
    IllegalCompoundRewriteContext {
        field: String,
        kind: RewriteKind,
        span: Span,
    },
    #[error("member '{member}' cannot be extracted: {reason}")]
    MemberSetInconsistency { member: String, reason: String },
}
