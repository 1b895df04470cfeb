//! Pre-flight checks a caller runs before synthesizing.

use std::collections::HashSet;

use nova_extract_hir::{DeclId, NodeId, SourceFile};

use crate::classify::{Classifier, Plan};
use crate::error::ExtractClassError;
use crate::members::ExtractionContext;
use crate::naming::{is_java_keyword, NamingStrategy};
use crate::rewrite::Position;

/// Problems that make the synthesized class wrong or uncompilable.
///
/// [`crate::synthesize`] does not refuse these inputs; it is up to the caller
/// to reject them.
pub fn check_extraction(
    file: &SourceFile,
    ctx: &ExtractionContext,
    naming: &dyn NamingStrategy,
) -> Vec<ExtractClassError> {
    let mut problems = Vec::new();
    if !is_valid_class_name(&ctx.class_name) {
        problems.push(ExtractClassError::InvalidClassName(ctx.class_name.clone()));
    }
    check_members(file, ctx, &mut problems);
    check_accessors(file, ctx, naming, &mut problems);

    let classifier = Classifier::new(file, ctx);
    for node in ctx.emitted_code(file) {
        value_writes(file, &classifier, node, Position::Value, &mut problems);
    }
    tracing::debug!(
        target = "nova.extract",
        problems = problems.len(),
        "checked extraction"
    );
    problems
}

fn check_members(
    file: &SourceFile,
    ctx: &ExtractionContext,
    problems: &mut Vec<ExtractClassError>,
) {
    let original = &file.decl(ctx.original_class).name;
    let mut seen = HashSet::new();
    for member in ctx.members.iter() {
        let decl = file.decl(member);
        if decl.owner != Some(ctx.original_class) {
            problems.push(inconsistency(
                file,
                member,
                format!("it is not declared in class '{original}'"),
            ));
        }
        if !seen.insert(member) {
            problems.push(inconsistency(file, member, "it is selected more than once".into()));
        }
    }
}

fn check_accessors(
    file: &SourceFile,
    ctx: &ExtractionContext,
    naming: &dyn NamingStrategy,
    problems: &mut Vec<ExtractClassError>,
) {
    let mut fields: Vec<DeclId> = ctx
        .fields_needing_getters
        .iter()
        .chain(&ctx.fields_needing_setters)
        .copied()
        .collect();
    fields.sort();
    fields.dedup();

    let moved_methods: HashSet<&str> = ctx
        .members
        .methods
        .iter()
        .map(|method| file.decl(*method).name.as_str())
        .collect();

    for field in fields {
        if !ctx.members.fields.contains(&field) {
            problems.push(inconsistency(
                file,
                field,
                "an accessor is requested but the field is not moved".into(),
            ));
            continue;
        }
        let decl = file.decl(field);
        let mut accessors = Vec::new();
        if ctx.needs_getter(field) {
            accessors.push(naming.getter_name(decl));
        }
        if ctx.needs_setter(field) {
            accessors.push(naming.setter_name(decl));
        }
        for accessor in accessors {
            if moved_methods.contains(accessor.as_str()) {
                problems.push(inconsistency(
                    file,
                    field,
                    format!("its accessor '{accessor}' clashes with a moved method"),
                ));
            }
        }
    }
}

fn inconsistency(file: &SourceFile, member: DeclId, reason: String) -> ExtractClassError {
    let decl = file.decl(member);
    let member = if decl.name.is_empty() {
        format!("<initializer at byte {}>", decl.span.start)
    } else {
        decl.name.clone()
    };
    ExtractClassError::MemberSetInconsistency { member, reason }
}

/// Delegated writes whose result is consumed.
fn value_writes(
    file: &SourceFile,
    classifier: &Classifier<'_>,
    node: NodeId,
    position: Position,
    problems: &mut Vec<ExtractClassError>,
) {
    if let Plan::Write { field, kind } = classifier.plan(node) {
        if position == Position::Value {
            problems.push(ExtractClassError::IllegalCompoundRewriteContext {
                field: file.decl(field).name.clone(),
                kind,
                span: file.node(node).span(),
            });
        }
    }
    let syntax = file.node(node);
    let position = Position::of_children(syntax);
    for child in syntax.children() {
        value_writes(file, classifier, child, position, problems);
    }
}

fn is_valid_class_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphabetic() || first == '_' || first == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        && !is_java_keyword(name)
        && name != "_"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_names() {
        assert!(is_valid_class_name("ExtractedPoint"));
        assert!(is_valid_class_name("$Proxy1"));
        assert!(!is_valid_class_name(""));
        assert!(!is_valid_class_name("1Point"));
        assert!(!is_valid_class_name("class"));
        assert!(!is_valid_class_name("Point.Part"));
        assert!(!is_valid_class_name("_"));
    }
}
