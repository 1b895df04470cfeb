//! Extract Class code synthesis.
//!
//! Given a class and a selection of its members, this crate produces the source
//! text of a new class that holds exactly those members:
//! - the Ownership Classifier decides where each referenced declaration lives
//!   after the move (`classify`)
//! - the Reference Rewriter retargets reads, writes and calls that still point
//!   at the original class through a back-pointer field (`rewrite`)
//! - the Class Synthesizer assembles header, fields, constructor, methods and
//!   inner classes (`synthesize`)
//!
//! The input is a resolved [`nova_extract_hir::SourceFile`]; nothing here parses
//! or performs I/O except config loading.

mod accessors;
mod check;
mod classify;
mod config;
mod error;
mod format;
mod members;
mod naming;
mod rewrite;
mod synthesize;

pub use accessors::{getter_prototype, setter_prototype};
pub use check::check_extraction;
pub use classify::{Classifier, MemberKind, Ownership};
pub use config::{ConfigError, ExtractClassConfig, LoggingConfig, NamingConfig};
pub use error::{ExtractClassError, RewriteKind};
pub use members::{BackPointerSpec, ExtractionContext, InnerClass, MemberSet, MemberSetBuilder};
pub use naming::{CodeStyleNaming, NamingStrategy, VariableKind};
pub use synthesize::{synthesize, synthesize_with_report, ExtractedClass};
