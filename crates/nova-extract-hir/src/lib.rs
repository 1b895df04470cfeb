//! Arena source model for class extraction.
//!
//! A [`SourceFile`] is a resolved snapshot of one Java compilation unit: every
//! syntax node lives in a node arena, every declaration in a declaration table,
//! and references hold a [`DeclId`] into that table instead of a pointer. The
//! model is built once (by `nova-extract-syntax` or by hand in tests) and is
//! immutable afterwards.

mod constant;
mod decl;
mod hir;

pub use decl::{ClassData, Decl, DeclData, DeclKind, FieldData, MethodData, Modifiers, TypeParam};
pub use hir::{
    Arena, AssignOp, BinaryOp, DeclId, LiteralKind, Node, NodeId, Span, UnaryOp, UpdateOp,
};

/// Identifier resolution over an already-resolved tree.
pub trait Resolver {
    /// The declaration a reference node denotes, or `None` when it could not be
    /// resolved (or the node is not a reference).
    fn resolve(&self, node: NodeId) -> Option<DeclId>;

    /// Whether a local variable or parameter with the same name as the
    /// referenced member is in scope at `node`.
    fn is_shadowed(&self, node: NodeId) -> bool;
}

#[derive(Debug, Clone)]
pub struct SourceFile {
    text: String,
    package: Option<String>,
    root: NodeId,
    nodes: Arena<Node>,
    decls: Arena<Decl>,
}

impl SourceFile {
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    #[must_use]
    pub fn decl(&self, id: DeclId) -> &Decl {
        &self.decls[id]
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn decls(&self) -> impl Iterator<Item = (DeclId, &Decl)> {
        self.decls.iter().map(|(raw, decl)| (DeclId::from_raw(raw), decl))
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().map(|(raw, node)| (NodeId::from_raw(raw), node))
    }

    /// Source text covered by `span`; empty when the span is out of bounds.
    #[must_use]
    pub fn span_text(&self, span: Span) -> &str {
        self.text.get(span.start..span.end).unwrap_or("")
    }

    #[must_use]
    pub fn node_text(&self, id: NodeId) -> &str {
        self.span_text(self.node(id).span())
    }

    /// Leading whitespace of the line containing `offset`.
    #[must_use]
    pub fn line_indent(&self, offset: usize) -> &str {
        let offset = offset.min(self.text.len());
        let line_start = self.text[..offset].rfind('\n').map_or(0, |idx| idx + 1);
        let line = &self.text[line_start..offset];
        let len = line.len() - line.trim_start_matches([' ', '\t']).len();
        &line[..len]
    }

    pub fn classes(&self) -> impl Iterator<Item = (DeclId, &Decl)> {
        self.decls().filter(|(_, decl)| decl.kind == DeclKind::Class)
    }

    /// Finds a named class by simple or qualified name; the outermost match wins.
    #[must_use]
    pub fn find_class(&self, name: &str) -> Option<DeclId> {
        let mut best: Option<(usize, DeclId)> = None;
        for (id, decl) in self.classes() {
            let Some(data) = decl.as_class() else {
                continue;
            };
            if data.anonymous {
                continue;
            }
            if decl.name != name && data.qualified_name != name {
                continue;
            }
            let depth = self.owners(id).count();
            if best.map_or(true, |(d, _)| depth < d) {
                best = Some((depth, id));
            }
        }
        best.map(|(_, id)| id)
    }

    /// Direct members of `class` in declaration order.
    #[must_use]
    pub fn members(&self, class: DeclId) -> &[DeclId] {
        self.decl(class)
            .as_class()
            .map(|data| data.members.as_slice())
            .unwrap_or(&[])
    }

    #[must_use]
    pub fn find_member(&self, class: DeclId, name: &str, kind: DeclKind) -> Option<DeclId> {
        self.members(class).iter().copied().find(|id| {
            let decl = self.decl(*id);
            decl.kind == kind && decl.name == name
        })
    }

    /// Successive owners of `decl`, innermost first.
    pub fn owners(&self, decl: DeclId) -> impl Iterator<Item = DeclId> + '_ {
        std::iter::successors(self.decl(decl).owner, move |id| self.decl(*id).owner)
    }

    /// The innermost class enclosing `decl` (not `decl` itself).
    #[must_use]
    pub fn enclosing_class(&self, decl: DeclId) -> Option<DeclId> {
        self.owners(decl)
            .find(|id| self.decl(*id).kind == DeclKind::Class)
    }

    /// All same-file supertypes of `class`, transitively, without `class` itself.
    #[must_use]
    pub fn supertypes(&self, class: DeclId) -> Vec<DeclId> {
        let mut out: Vec<DeclId> = Vec::new();
        let mut stack = vec![class];
        while let Some(current) = stack.pop() {
            let Some(data) = self.decl(current).as_class() else {
                continue;
            };
            for sup in &data.super_decls {
                if *sup != class && !out.contains(sup) {
                    out.push(*sup);
                    stack.push(*sup);
                }
            }
        }
        out
    }

    /// Whether `decl` is declared in `class` or inherited from one of its
    /// same-file supertypes.
    #[must_use]
    pub fn is_member_of(&self, decl: DeclId, class: DeclId) -> bool {
        let Some(owner) = self.decl(decl).owner else {
            return false;
        };
        owner == class || self.supertypes(class).contains(&owner)
    }

    /// Whether `decl` is declared anywhere inside `container` (nested to any depth).
    #[must_use]
    pub fn is_declared_within(&self, decl: DeclId, container: DeclId) -> bool {
        self.owners(decl).any(|owner| owner == container)
    }

    /// Whether `node` lies inside `container`'s text range.
    #[must_use]
    pub fn node_within(&self, node: NodeId, container: NodeId) -> bool {
        self.node(container).span().contains(self.node(node).span())
    }
}

impl Resolver for SourceFile {
    fn resolve(&self, node: NodeId) -> Option<DeclId> {
        self.node(node).resolved()
    }

    fn is_shadowed(&self, node: NodeId) -> bool {
        matches!(self.node(node), Node::FieldAccess { shadowed: true, .. })
    }
}

/// Allocates nodes and declarations for a [`SourceFile`].
#[derive(Debug)]
pub struct SourceFileBuilder {
    text: String,
    package: Option<String>,
    nodes: Arena<Node>,
    decls: Arena<Decl>,
}

impl SourceFileBuilder {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            package: None,
            nodes: Arena::default(),
            decls: Arena::default(),
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_package(&mut self, package: impl Into<String>) {
        self.package = Some(package.into());
    }

    pub fn alloc_node(&mut self, node: Node) -> NodeId {
        NodeId::from_raw(self.nodes.alloc(node))
    }

    pub fn alloc_decl(&mut self, decl: Decl) -> DeclId {
        DeclId::from_raw(self.decls.alloc(decl))
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    #[must_use]
    pub fn decl(&self, id: DeclId) -> &Decl {
        &self.decls[id]
    }

    /// Mutable access to a declaration while the file is still being built.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not allocated by this builder.
    pub fn decl_mut(&mut self, id: DeclId) -> &mut Decl {
        self.decls
            .get_mut(id.idx())
            .unwrap_or_else(|| panic!("{id:?} was not allocated by this builder"))
    }

    pub fn decls(&self) -> impl Iterator<Item = (DeclId, &Decl)> {
        self.decls.iter().map(|(raw, decl)| (DeclId::from_raw(raw), decl))
    }

    /// Adds `member` to the member list of `class` and sets its owner.
    pub fn add_member(&mut self, class: DeclId, member: DeclId) {
        self.decl_mut(member).owner = Some(class);
        if let DeclData::Class(data) = &mut self.decl_mut(class).data {
            data.members.push(member);
        }
    }

    #[must_use]
    pub fn finish(self, root: NodeId) -> SourceFile {
        SourceFile {
            text: self.text,
            package: self.package,
            root,
            nodes: self.nodes,
            decls: self.decls,
        }
    }
}
