//! Rewrites moved code so references still resolve from the new class.

use std::collections::HashMap;

use nova_extract_hir::{AssignOp, DeclId, Node, NodeId, SourceFile, Span};

use crate::classify::{CallTarget, Classifier, Plan};
use crate::error::RewriteKind;
use crate::members::ExtractionContext;
use crate::naming::NamingStrategy;

/// Whether the value of an expression is consumed by its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Position {
    /// Expression statements and `for` update clauses.
    Discarded,
    Value,
}

impl Position {
    /// Position of the children of `node`.
    pub(crate) fn of_children(node: &Node) -> Position {
        match node {
            Node::ExprStatement { .. } => Position::Discarded,
            _ => Position::Value,
        }
    }
}

/// Produces the text of a node as it must read inside the new class.
///
/// The tree is never modified; every call returns fresh text.
pub(crate) struct Rewriter<'a> {
    file: &'a SourceFile,
    ctx: &'a ExtractionContext,
    classifier: Classifier<'a>,
    naming: &'a dyn NamingStrategy,
    back_pointer: &'a str,
    overrides: HashMap<NodeId, String>,
}

impl<'a> Rewriter<'a> {
    pub(crate) fn new(
        file: &'a SourceFile,
        ctx: &'a ExtractionContext,
        naming: &'a dyn NamingStrategy,
        back_pointer: &'a str,
    ) -> Self {
        Self {
            file,
            ctx,
            classifier: Classifier::new(file, ctx),
            naming,
            back_pointer,
            overrides: HashMap::new(),
        }
    }

    /// Emits `text` in place of `node`.
    pub(crate) fn override_node(&mut self, node: NodeId, text: String) {
        self.overrides.insert(node, text);
    }

    pub(crate) fn rewrite(&self, node: NodeId) -> String {
        self.rewrite_in(node, Position::Value)
    }

    fn rewrite_in(&self, node: NodeId, position: Position) -> String {
        if let Some(text) = self.overrides.get(&node) {
            return text.clone();
        }
        let syntax = self.file.node(node);
        match (self.classifier.plan(node), syntax) {
            (Plan::MovedField { keep_this }, Node::FieldAccess { receiver, name, .. }) => {
                if !keep_this {
                    return name.clone();
                }
                match self.file.node(*receiver) {
                    Node::This {
                        qualifier: None, ..
                    } => format!("this.{name}"),
                    _ if self.classifier.is_original_this(*receiver) => {
                        format!("{}.this.{name}", self.ctx.class_name)
                    }
                    _ => format!("{}.{name}", self.file.node_text(*receiver)),
                }
            }
            (Plan::MovedStatic, Node::FieldAccess { name, .. }) => {
                format!("{}.{name}", self.ctx.class_name)
            }
            (
                Plan::MovedStatic,
                Node::Call {
                    name_span,
                    args,
                    span,
                    ..
                },
            ) => format!(
                "{}.{}",
                self.ctx.class_name,
                self.call_tail(*name_span, *args, *span)
            ),
            (
                Plan::StaticField,
                Node::Name { name, .. } | Node::FieldAccess { name, .. },
            ) => format!("{}.{name}", self.ctx.original_qualified_name),
            (Plan::Getter(field), _) => self.getter_call(field),
            (Plan::BackPointer, _) => self.back_pointer.to_string(),
            (Plan::NestedType, Node::TypeName { name, .. }) => {
                format!("{}.{name}", self.ctx.original_qualified_name)
            }
            (
                Plan::Call(target),
                Node::Call {
                    name_span,
                    args,
                    span,
                    ..
                },
            ) => {
                let qualifier = match target {
                    CallTarget::Static => self.ctx.original_qualified_name.as_str(),
                    CallTarget::BackPointer => self.back_pointer,
                };
                format!("{qualifier}.{}", self.call_tail(*name_span, *args, *span))
            }
            (
                Plan::KeepReceiver,
                Node::Call {
                    name_span,
                    args,
                    span,
                    ..
                },
            ) => {
                let receiver = self.file.span_text(Span::new(span.start, name_span.start));
                format!("{receiver}{}", self.call_tail(*name_span, *args, *span))
            }
            (Plan::Write { field, kind }, _) => self.delegated_write(node, field, kind, position),
            _ => self.splice(node),
        }
    }

    /// `name(args')`, keeping anything written between the two.
    fn call_tail(&self, name_span: Span, args: NodeId, span: Span) -> String {
        let args_span = self.file.node(args).span();
        format!(
            "{}{}{}",
            self.file.span_text(Span::new(name_span.start, args_span.start)),
            self.rewrite(args),
            self.file.span_text(Span::new(args_span.end, span.end)),
        )
    }

    /// The node's own text with each child replaced by its rewrite.
    fn splice(&self, node: NodeId) -> String {
        let syntax = self.file.node(node);
        let span = syntax.span();
        let position = Position::of_children(syntax);
        let mut out = String::with_capacity(span.len());
        let mut cursor = span.start;
        for child in syntax.children() {
            let child_span = self.file.node(child).span();
            out.push_str(self.file.span_text(Span::new(cursor, child_span.start)));
            out.push_str(&self.rewrite_in(child, position));
            cursor = child_span.end;
        }
        out.push_str(self.file.span_text(Span::new(cursor, span.end)));
        out
    }

    fn getter_call(&self, field: DeclId) -> String {
        let getter = self.naming.getter_name(self.file.decl(field));
        format!("{}.{getter}()", self.back_pointer)
    }

    fn delegated_write(
        &self,
        node: NodeId,
        field: DeclId,
        kind: RewriteKind,
        position: Position,
    ) -> String {
        let decl = self.file.decl(field);
        if position == Position::Value {
            tracing::warn!(
                target = "nova.extract",
                field = %decl.name,
                %kind,
                span = ?self.file.node(node).span(),
                "delegated write is used as a value; its result changes"
            );
        }
        let setter = self.naming.setter_name(decl);
        let bp = self.back_pointer;
        let value = match self.file.node(node) {
            Node::Assign {
                op: AssignOp::Plain,
                rhs,
                ..
            } => self.rewrite(*rhs),
            Node::Assign {
                op: AssignOp::Compound(op),
                rhs,
                ..
            } => {
                let rhs_text = self.rewrite(*rhs);
                let rhs_text = if self.file.node(*rhs).is_primary() {
                    rhs_text
                } else {
                    format!("({rhs_text})")
                };
                format!("{} {} {rhs_text}", self.getter_call(field), op.token())
            }
            Node::Update { op, .. } => {
                let sign = if op.is_increment() { '+' } else { '-' };
                format!("{} {sign} 1", self.getter_call(field))
            }
            _ => return self.splice(node),
        };
        tracing::debug!(
            target = "nova.extract",
            field = %decl.name,
            %kind,
            "routed write through setter"
        );
        format!("{bp}.{setter}({value})")
    }
}

/// Spans of references under `node` that resolve to nothing.
pub(crate) fn unresolved_references(file: &SourceFile, node: NodeId) -> Vec<Span> {
    let mut out = Vec::new();
    collect_unresolved(file, node, &mut out);
    out
}

fn collect_unresolved(file: &SourceFile, node: NodeId, out: &mut Vec<Span>) {
    let syntax = file.node(node);
    match syntax {
        Node::Name {
            resolved: None,
            span,
            ..
        } => out.push(*span),
        Node::Call {
            receiver,
            resolved: None,
            name_span,
            ..
        } => {
            let implicit = receiver.map_or(true, |r| matches!(file.node(r), Node::This { .. }));
            if implicit {
                out.push(*name_span);
            }
        }
        Node::FieldAccess {
            receiver,
            resolved: None,
            name_span,
            ..
        } if matches!(file.node(*receiver), Node::This { .. }) => out.push(*name_span),
        _ => {}
    }
    for child in syntax.children() {
        collect_unresolved(file, child, out);
    }
}
