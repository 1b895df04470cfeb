//! Ownership classification of references inside moved code.

use nova_extract_hir::{AssignOp, DeclId, DeclKind, Node, NodeId, Resolver, SourceFile, UpdateOp};

use crate::error::RewriteKind;
use crate::members::ExtractionContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Field,
    Method,
    Type,
}

/// Where the declaration behind a reference lives once extraction is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ownership {
    /// Selected for extraction, or declared inside a moved inner class.
    Moved,
    /// A non-static member that stays behind in the original class.
    OriginalInstance(MemberKind),
    /// A static member that stays behind in the original class.
    OriginalStatic(MemberKind),
    /// Locals, parameters, and members of unrelated types.
    Unrelated,
}

impl Ownership {
    #[must_use]
    pub fn is_original(self) -> bool {
        matches!(
            self,
            Ownership::OriginalInstance(_) | Ownership::OriginalStatic(_)
        )
    }
}

/// How a call that stays unqualified in the source gets retargeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CallTarget {
    /// `Original.method(..)`
    Static,
    /// `backPointer.method(..)`
    BackPointer,
}

/// The rewrite rule that applies to one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Plan {
    /// Copy the node, rewriting its children.
    Recurse,
    /// A moved field: its bare name, or `this.name` when a local shadows it.
    MovedField { keep_this: bool },
    /// A moved static member reached through the original class name.
    MovedStatic,
    /// `Original.field`
    StaticField,
    /// `backPointer.getField()`
    Getter(DeclId),
    /// `this` of the original instance.
    BackPointer,
    /// A nested type of the original that is not moved.
    NestedType,
    /// An unqualified (or `this.`) call retargeted at the original.
    Call(CallTarget),
    /// A call of a completely moved method: the receiver is copied as written.
    KeepReceiver,
    /// A write to an original instance field, routed through its setter.
    Write { field: DeclId, kind: RewriteKind },
}

/// Classifies references against one extraction run.
///
/// Every query is a pure function of the resolved tree and the member set.
#[derive(Clone, Copy)]
pub struct Classifier<'a> {
    file: &'a SourceFile,
    ctx: &'a ExtractionContext,
}

impl<'a> Classifier<'a> {
    pub fn new(file: &'a SourceFile, ctx: &'a ExtractionContext) -> Self {
        Self { file, ctx }
    }

    #[must_use]
    pub fn classify(&self, decl: DeclId) -> Ownership {
        let target = self.file.decl(decl);
        let kind = match target.kind {
            DeclKind::Field => MemberKind::Field,
            DeclKind::Method => MemberKind::Method,
            DeclKind::Class => MemberKind::Type,
            _ => return Ownership::Unrelated,
        };

        let members = &self.ctx.members;
        let in_moved_class = self
            .file
            .owners(decl)
            .any(|owner| members.inner_class_decls().any(|inner| inner == owner));
        let ownership = if members.contains(decl) || in_moved_class {
            Ownership::Moved
        } else if self.file.is_member_of(decl, self.ctx.original_class) {
            if target.is_static() {
                Ownership::OriginalStatic(kind)
            } else {
                Ownership::OriginalInstance(kind)
            }
        } else {
            Ownership::Unrelated
        };
        tracing::trace!(
            target = "nova.extract",
            name = %target.name,
            ?ownership,
            "classified declaration"
        );
        ownership
    }

    /// Classifies the declaration a reference node resolves to; unresolved
    /// references are [`Ownership::Unrelated`].
    #[must_use]
    pub fn classify_reference(&self, node: NodeId) -> Ownership {
        match self.file.resolve(node) {
            Some(decl) => self.classify(decl),
            None => Ownership::Unrelated,
        }
    }

    /// A moved method without overriding or overridden siblings.
    #[must_use]
    pub fn is_completely_moved(&self, method: DeclId) -> bool {
        self.ctx.members.methods.contains(&method)
            && !self
                .file
                .decl(method)
                .as_method()
                .is_some_and(|data| data.has_siblings)
    }

    /// Whether moved code under `node` refers to the original instance.
    #[must_use]
    pub fn needs_back_pointer(&self, node: NodeId) -> bool {
        match self.plan(node) {
            Plan::Getter(_) | Plan::BackPointer | Plan::Write { .. } => true,
            Plan::Call(CallTarget::BackPointer) => true,
            Plan::Call(CallTarget::Static) | Plan::KeepReceiver | Plan::MovedStatic => {
                match self.file.node(node) {
                    Node::Call { args, .. } => self.needs_back_pointer(*args),
                    _ => false,
                }
            }
            Plan::MovedField { .. } | Plan::StaticField | Plan::NestedType => false,
            Plan::Recurse => self
                .file
                .node(node)
                .children()
                .into_iter()
                .any(|child| self.needs_back_pointer(child)),
        }
    }

    pub(crate) fn plan(&self, node: NodeId) -> Plan {
        match self.file.node(node) {
            Node::Name { .. } => match self.field_reference(node) {
                Some((_, Ownership::OriginalStatic(_))) => Plan::StaticField,
                Some((field, Ownership::OriginalInstance(_))) => Plan::Getter(field),
                _ => Plan::Recurse,
            },
            Node::FieldAccess { receiver, .. } => {
                if self.names_original_class(*receiver) {
                    return match self.classify_reference(node) {
                        Ownership::Moved => Plan::MovedStatic,
                        _ => Plan::Recurse,
                    };
                }
                match self.field_reference(node) {
                    Some((_, Ownership::Moved)) => Plan::MovedField {
                        keep_this: self.file.is_shadowed(node),
                    },
                    Some((_, Ownership::OriginalStatic(_))) => Plan::StaticField,
                    Some((field, Ownership::OriginalInstance(_))) => Plan::Getter(field),
                    _ => Plan::Recurse,
                }
            }
            Node::This { .. } if self.is_original_this(node) => Plan::BackPointer,
            Node::TypeName { .. } => match self.classify_reference(node) {
                Ownership::OriginalInstance(MemberKind::Type)
                | Ownership::OriginalStatic(MemberKind::Type) => Plan::NestedType,
                _ => Plan::Recurse,
            },
            Node::Call {
                receiver, resolved, ..
            } => self.plan_call(*receiver, *resolved),
            Node::Assign { op, lhs, .. } => {
                let kind = match op {
                    AssignOp::Plain => RewriteKind::Assignment,
                    AssignOp::Compound(_) => RewriteKind::CompoundAssignment,
                };
                self.plan_write(*lhs, kind)
            }
            Node::Update { op, operand, .. } => {
                let kind = match op {
                    UpdateOp::PreIncrement | UpdateOp::PostIncrement => RewriteKind::Increment,
                    UpdateOp::PreDecrement | UpdateOp::PostDecrement => RewriteKind::Decrement,
                };
                self.plan_write(*operand, kind)
            }
            _ => Plan::Recurse,
        }
    }

    fn plan_call(&self, receiver: Option<NodeId>, resolved: Option<DeclId>) -> Plan {
        let Some(method) = resolved else {
            return Plan::Recurse;
        };
        match receiver {
            None => {}
            Some(receiver) if self.names_original_class(receiver) => {
                return match self.classify(method) {
                    Ownership::Moved => Plan::MovedStatic,
                    _ => Plan::Recurse,
                };
            }
            Some(receiver) => match self.file.node(receiver) {
                Node::This { .. } if self.is_original_this(receiver) => {}
                _ => return Plan::Recurse,
            },
        }

        let static_target = if self.file.decl(method).is_static() {
            CallTarget::Static
        } else {
            CallTarget::BackPointer
        };
        match self.classify(method) {
            Ownership::OriginalInstance(_) | Ownership::OriginalStatic(_) => {
                Plan::Call(static_target)
            }
            Ownership::Moved if self.ctx.members.methods.contains(&method) => {
                if self.is_completely_moved(method) {
                    Plan::KeepReceiver
                } else {
                    Plan::Call(static_target)
                }
            }
            Ownership::Moved | Ownership::Unrelated => Plan::KeepReceiver,
        }
    }

    fn plan_write(&self, target: NodeId, kind: RewriteKind) -> Plan {
        match self.field_reference(self.unparen(target)) {
            Some((field, Ownership::OriginalInstance(_))) => Plan::Write { field, kind },
            _ => Plan::Recurse,
        }
    }

    /// A bare name or `this.name` that resolves to a field, with its ownership.
    pub(crate) fn field_reference(&self, node: NodeId) -> Option<(DeclId, Ownership)> {
        match self.file.node(node) {
            Node::Name { .. } => {}
            Node::FieldAccess { receiver, .. }
                if matches!(self.file.node(*receiver), Node::This { .. }) => {}
            _ => return None,
        }
        let decl = self.file.resolve(node)?;
        if self.file.decl(decl).kind != DeclKind::Field {
            return None;
        }
        Some((decl, self.classify(decl)))
    }

    /// `this` or `Original.this` denoting the original instance.
    #[must_use]
    pub fn is_original_this(&self, node: NodeId) -> bool {
        match self.file.node(node) {
            Node::This { resolved, .. } => *resolved == Some(self.ctx.original_class),
            _ => false,
        }
    }

    fn names_original_class(&self, node: NodeId) -> bool {
        matches!(
            self.file.node(node),
            Node::TypeName { resolved: Some(class), .. } if *class == self.ctx.original_class
        )
    }

    pub(crate) fn unparen(&self, mut node: NodeId) -> NodeId {
        while let Node::Paren { inner, .. } = self.file.node(node) {
            node = *inner;
        }
        node
    }
}
