//! Java front end for class extraction.
//!
//! Parses a single compilation unit with `tree-sitter-java` and lowers it into a
//! resolved [`SourceFile`]. Resolution is single-file and best-effort: names
//! that refer to declarations outside the file stay unresolved, which the
//! extraction core treats as "leave the text alone".

use std::cell::RefCell;

use nova_extract_hir::{SourceFile, Span};
use thiserror::Error;
use tree_sitter::{Node, Parser, Tree};

mod lower;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("tree-sitter-java language load failed")]
    Language,
    #[error("tree-sitter parser is already in use")]
    ParserBusy,
    #[error("tree-sitter failed to produce a syntax tree")]
    NoTree,
    #[error("syntax error at bytes {}..{}", span.start, span.end)]
    Syntax { span: Span },
}

thread_local! {
    static JAVA_PARSER: RefCell<Result<Parser, ParseError>> = RefCell::new({
        let mut parser = Parser::new();
        match parser.set_language(tree_sitter_java::language()) {
            Ok(()) => Ok(parser),
            Err(_) => Err(ParseError::Language),
        }
    });
}

/// Parse Java source text with `tree-sitter-java`.
pub fn parse_java(source: &str) -> Result<Tree, ParseError> {
    JAVA_PARSER.with(|parser_cell| {
        let mut parser = parser_cell
            .try_borrow_mut()
            .map_err(|_| ParseError::ParserBusy)?;
        let parser = match parser.as_mut() {
            Ok(parser) => parser,
            Err(err) => return Err(err.clone()),
        };

        parser.parse(source, None).ok_or(ParseError::NoTree)
    })
}

/// Parse and lower `source` into a resolved [`SourceFile`].
///
/// Input with syntax errors is rejected: rewriting a partially parsed class
/// would silently drop text.
pub fn lower(source: &str) -> Result<SourceFile, ParseError> {
    let tree = parse_java(source)?;
    let root = tree.root_node();
    if let Some(span) = first_error(root) {
        return Err(ParseError::Syntax { span });
    }
    Ok(lower::lower_compilation_unit(source, root))
}

fn first_error(node: Node<'_>) -> Option<Span> {
    if !node.has_error() {
        return None;
    }
    if node.is_error() || node.is_missing() {
        return Some(Span::new(node.start_byte(), node.end_byte()));
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}
