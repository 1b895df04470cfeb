//! Lowering from the tree-sitter CST into the arena model.
//!
//! Runs in three passes over the tree:
//! 1. declare every named type and its members (so forward references resolve),
//! 2. link same-file supertypes and mark overriding method pairs,
//! 3. lower the tree itself while tracking a scope stack for name resolution.

use std::collections::{HashMap, HashSet};

use nova_extract_hir::{
    AssignOp, BinaryOp, ClassData, Decl, DeclData, DeclId, DeclKind, FieldData, LiteralKind,
    MethodData, Modifiers, Node, NodeId, SourceFile, SourceFileBuilder, Span, TypeParam, UnaryOp,
    UpdateOp,
};
use tree_sitter::Node as SyntaxNode;

const TYPE_DECLARATIONS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
    "annotation_type_declaration",
];

/// Statements and blocks that open a new local scope.
const SCOPE_KINDS: &[&str] = &[
    "block",
    "constructor_body",
    "for_statement",
    "enhanced_for_statement",
    "catch_clause",
    "try_with_resources_statement",
    "switch_block",
    "switch_block_statement_group",
    "switch_rule",
];

pub(crate) fn lower_compilation_unit(source: &str, root: SyntaxNode<'_>) -> SourceFile {
    let mut lowerer = Lowerer::new(source);
    lowerer.declare_compilation_unit(root);
    lowerer.link_supertypes();
    lowerer.mark_siblings();
    let root_id = lowerer.lower(root);

    tracing::debug!(
        target = "nova.extract",
        decls = lowerer.b.decls().count(),
        unresolved = lowerer.unresolved,
        "lowered Java compilation unit"
    );
    lowerer.b.finish(root_id)
}

#[derive(Debug, Clone, Copy)]
struct Arity {
    params: usize,
    varargs: bool,
}

impl Arity {
    fn accepts(self, args: usize) -> bool {
        if self.varargs {
            args + 1 >= self.params
        } else {
            args == self.params
        }
    }
}

enum Scope {
    Class(DeclId),
    Block(HashMap<String, DeclId>),
}

struct Lowerer<'s> {
    source: &'s str,
    b: SourceFileBuilder,
    package: Option<String>,
    /// Declarations created ahead of lowering, keyed by tree-sitter node id.
    declared: HashMap<usize, DeclId>,
    interfaces: HashSet<DeclId>,
    arity: HashMap<DeclId, Arity>,
    scopes: Vec<Scope>,
    /// Enclosing member declarations; the innermost one owns new locals.
    members: Vec<DeclId>,
    unresolved: usize,
}

impl<'s> Lowerer<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            b: SourceFileBuilder::new(source),
            package: None,
            declared: HashMap::new(),
            interfaces: HashSet::new(),
            arity: HashMap::new(),
            scopes: Vec::new(),
            members: Vec::new(),
            unresolved: 0,
        }
    }

    fn text(&self, node: SyntaxNode<'_>) -> &'s str {
        let source: &'s str = self.source;
        source.get(node.byte_range()).unwrap_or("")
    }

    // ---------------------------------------------------------------------
    // Pass 1: declarations
    // ---------------------------------------------------------------------

    fn declare_compilation_unit(&mut self, root: SyntaxNode<'_>) {
        for child in named_children(root) {
            match child.kind() {
                "package_declaration" => {
                    let name = named_children(child)
                        .into_iter()
                        .find(|n| matches!(n.kind(), "scoped_identifier" | "identifier"));
                    if let Some(name) = name {
                        let package = self.text(name).to_string();
                        self.b.set_package(package.clone());
                        self.package = Some(package);
                    }
                }
                kind if TYPE_DECLARATIONS.contains(&kind) => {
                    self.declare_type(child, None);
                }
                _ => {}
            }
        }
    }

    fn declare_type(&mut self, node: SyntaxNode<'_>, owner: Option<DeclId>) -> DeclId {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n).to_string())
            .unwrap_or_default();
        let (mut modifiers, _) = self.modifiers_of(node);
        let owner_class = owner.filter(|id| self.b.decl(*id).kind == DeclKind::Class);
        if let Some(outer) = owner_class {
            if self.interfaces.contains(&outer) {
                modifiers.insert(Modifiers::PUBLIC.with(Modifiers::STATIC));
            }
            if node.kind() != "class_declaration" {
                // Nested enums, records and interfaces are implicitly static.
                modifiers.insert(Modifiers::STATIC);
            }
        }

        let qualified_name = match (owner_class, owner) {
            (Some(outer), _) => format!("{}.{name}", self.qualified_name(outer)),
            (None, None) => match &self.package {
                Some(package) => format!("{package}.{name}"),
                None => name.clone(),
            },
            // Local classes have no canonical name.
            (None, Some(_)) => name.clone(),
        };

        let type_params = node
            .child_by_field_name("type_parameters")
            .map(|params| self.type_params(params))
            .unwrap_or_default();
        let supertypes = self.supertypes_of(node);
        let doc = self.doc_comment(node);

        let id = self.b.alloc_decl(Decl {
            name,
            kind: DeclKind::Class,
            modifiers,
            owner: None,
            node: None,
            span: span_of(node),
            data: DeclData::Class(ClassData {
                qualified_name,
                type_params,
                supertypes,
                doc,
                ..ClassData::default()
            }),
        });
        if let Some(owner) = owner {
            self.b.add_member(owner, id);
        }
        self.declared.insert(node.id(), id);

        let in_interface = matches!(
            node.kind(),
            "interface_declaration" | "annotation_type_declaration"
        );
        if in_interface {
            self.interfaces.insert(id);
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.declare_members(body, id, in_interface);
        }
        id
    }

    /// Declares an anonymous class body owned by the innermost member.
    fn declare_anonymous(&mut self, body: SyntaxNode<'_>) -> DeclId {
        let id = self.b.alloc_decl(Decl {
            name: String::new(),
            kind: DeclKind::Class,
            modifiers: Modifiers::empty(),
            owner: None,
            node: None,
            span: span_of(body),
            data: DeclData::Class(ClassData {
                anonymous: true,
                ..ClassData::default()
            }),
        });
        if let Some(owner) = self.members.last().copied() {
            self.b.decl_mut(id).owner = Some(owner);
        }
        self.declared.insert(body.id(), id);
        self.declare_members(body, id, false);
        id
    }

    fn declare_members(&mut self, body: SyntaxNode<'_>, class: DeclId, in_interface: bool) {
        for child in named_children(body) {
            match child.kind() {
                "field_declaration" | "constant_declaration" => {
                    self.declare_fields(child, class, in_interface);
                }
                "method_declaration" | "annotation_type_element_declaration" => {
                    self.declare_method(child, class, DeclKind::Method, in_interface);
                }
                "constructor_declaration" | "compact_constructor_declaration" => {
                    self.declare_method(child, class, DeclKind::Constructor, false);
                }
                "block" => self.declare_initializer(child, class, false),
                "static_initializer" => self.declare_initializer(child, class, true),
                "enum_constant" => self.declare_enum_constant(child, class),
                "enum_body_declarations" => self.declare_members(child, class, in_interface),
                kind if TYPE_DECLARATIONS.contains(&kind) => {
                    self.declare_type(child, Some(class));
                }
                _ => {}
            }
        }
    }

    fn declare_fields(&mut self, node: SyntaxNode<'_>, class: DeclId, in_interface: bool) {
        let (mut modifiers, annotations) = self.modifiers_of(node);
        if in_interface {
            modifiers.insert(
                Modifiers::PUBLIC
                    .with(Modifiers::STATIC)
                    .with(Modifiers::FINAL),
            );
        }
        let ty = node
            .child_by_field_name("type")
            .map(|n| self.text(n))
            .unwrap_or_default();
        let doc = self.doc_comment(node);

        let mut cursor = node.walk();
        let declarators: Vec<_> = node
            .children_by_field_name("declarator", &mut cursor)
            .collect();
        for declarator in declarators {
            let Some(name) = declarator.child_by_field_name("name") else {
                continue;
            };
            let dims = declarator
                .child_by_field_name("dimensions")
                .map(|n| self.text(n))
                .unwrap_or_default();
            let id = self.b.alloc_decl(Decl {
                name: self.text(name).to_string(),
                kind: DeclKind::Field,
                modifiers,
                owner: None,
                node: None,
                span: span_of(node),
                data: DeclData::Field(FieldData {
                    ty: format!("{ty}{dims}"),
                    annotations: annotations.clone(),
                    doc,
                    ..FieldData::default()
                }),
            });
            self.b.add_member(class, id);
            self.declared.insert(declarator.id(), id);
        }
    }

    fn declare_enum_constant(&mut self, node: SyntaxNode<'_>, class: DeclId) {
        let Some(name) = node.child_by_field_name("name") else {
            return;
        };
        let ty = self.b.decl(class).name.clone();
        let id = self.b.alloc_decl(Decl {
            name: self.text(name).to_string(),
            kind: DeclKind::Field,
            modifiers: Modifiers::PUBLIC
                .with(Modifiers::STATIC)
                .with(Modifiers::FINAL),
            owner: None,
            node: None,
            span: span_of(node),
            data: DeclData::Field(FieldData {
                ty,
                doc: self.doc_comment(node),
                ..FieldData::default()
            }),
        });
        self.b.add_member(class, id);
    }

    fn declare_method(
        &mut self,
        node: SyntaxNode<'_>,
        class: DeclId,
        kind: DeclKind,
        in_interface: bool,
    ) -> DeclId {
        let (mut modifiers, annotations) = self.modifiers_of(node);
        if in_interface {
            modifiers.insert(Modifiers::PUBLIC);
            let has_body = node.child_by_field_name("body").is_some();
            if !has_body {
                modifiers.insert(Modifiers::ABSTRACT);
            }
        }
        let name = match kind {
            DeclKind::Constructor => self.b.decl(class).name.clone(),
            _ => node
                .child_by_field_name("name")
                .map(|n| self.text(n).to_string())
                .unwrap_or_default(),
        };
        let overrides = annotations.iter().any(|span| {
            let text = self.source.get(span.start..span.end).unwrap_or("");
            text == "@Override" || text == "@java.lang.Override"
        });

        let mut arity = Arity {
            params: 0,
            varargs: false,
        };
        if let Some(params) = node.child_by_field_name("parameters") {
            for param in named_children(params) {
                match param.kind() {
                    "formal_parameter" => arity.params += 1,
                    "spread_parameter" => {
                        arity.params += 1;
                        arity.varargs = true;
                    }
                    _ => {}
                }
            }
        }

        let id = self.b.alloc_decl(Decl {
            name,
            kind,
            modifiers,
            owner: None,
            node: None,
            span: span_of(node),
            data: DeclData::Method(MethodData {
                params: Vec::new(),
                has_siblings: overrides,
                doc: self.doc_comment(node),
            }),
        });
        self.b.add_member(class, id);
        self.declared.insert(node.id(), id);
        self.arity.insert(id, arity);
        id
    }

    fn declare_initializer(&mut self, node: SyntaxNode<'_>, class: DeclId, is_static: bool) {
        let modifiers = if is_static {
            Modifiers::STATIC
        } else {
            Modifiers::empty()
        };
        let id = self.b.alloc_decl(Decl {
            name: String::new(),
            kind: DeclKind::Initializer,
            modifiers,
            owner: None,
            node: None,
            span: span_of(node),
            data: DeclData::Initializer {
                doc: self.doc_comment(node),
            },
        });
        self.b.add_member(class, id);
        self.declared.insert(node.id(), id);
    }

    /// Modifier keywords plus the spans of any annotations.
    fn modifiers_of(&self, node: SyntaxNode<'_>) -> (Modifiers, Vec<Span>) {
        let mut modifiers = Modifiers::empty();
        let mut annotations = Vec::new();
        let Some(list) = find_named_child(node, "modifiers") else {
            return (modifiers, annotations);
        };
        let mut cursor = list.walk();
        for child in list.children(&mut cursor) {
            match child.kind() {
                "marker_annotation" | "annotation" => annotations.push(span_of(child)),
                keyword => {
                    if let Some(m) = Modifiers::from_keyword(keyword) {
                        modifiers.insert(m);
                    }
                }
            }
        }
        (modifiers, annotations)
    }

    fn type_params(&self, list: SyntaxNode<'_>) -> Vec<TypeParam> {
        named_children(list)
            .into_iter()
            .filter(|n| n.kind() == "type_parameter")
            .map(|param| {
                let name = named_children(param)
                    .into_iter()
                    .find(|n| matches!(n.kind(), "type_identifier" | "identifier"))
                    .map(|n| self.text(n))
                    .unwrap_or_default();
                TypeParam::new(name, self.text(param))
            })
            .collect()
    }

    /// `extends`/`implements` clauses as written, in source order.
    fn supertypes_of(&self, node: SyntaxNode<'_>) -> Vec<String> {
        let mut out = Vec::new();
        for child in named_children(node) {
            match child.kind() {
                "superclass" => {
                    out.extend(
                        named_children(child)
                            .into_iter()
                            .filter(|n| !is_comment(*n))
                            .map(|n| self.text(n).to_string()),
                    );
                }
                "super_interfaces" | "extends_interfaces" => {
                    for list in named_children(child) {
                        if list.kind() == "type_list" {
                            out.extend(
                                named_children(list)
                                    .into_iter()
                                    .filter(|n| !is_comment(*n))
                                    .map(|n| self.text(n).to_string()),
                            );
                        }
                    }
                }
                _ => {}
            }
        }
        out
    }

    /// The `/** ... */` comment directly preceding `node`, if any.
    fn doc_comment(&self, node: SyntaxNode<'_>) -> Option<Span> {
        let prev = node.prev_named_sibling()?;
        if !is_comment(prev) || !self.text(prev).starts_with("/**") {
            return None;
        }
        let gap = self.source.get(prev.end_byte()..node.start_byte())?;
        gap.trim().is_empty().then(|| span_of(prev))
    }

    fn qualified_name(&self, class: DeclId) -> String {
        self.b
            .decl(class)
            .as_class()
            .map(|data| data.qualified_name.clone())
            .unwrap_or_default()
    }

    // ---------------------------------------------------------------------
    // Pass 2: type hierarchy
    // ---------------------------------------------------------------------

    fn link_supertypes(&mut self) {
        let classes: Vec<DeclId> = self
            .b
            .decls()
            .filter(|(_, decl)| decl.kind == DeclKind::Class)
            .map(|(id, _)| id)
            .collect();
        for class in classes {
            self.link_class(class);
        }
    }

    fn link_class(&mut self, class: DeclId) {
        let supertypes = self
            .b
            .decl(class)
            .as_class()
            .map(|data| data.supertypes.clone())
            .unwrap_or_default();
        let links: Vec<DeclId> = supertypes
            .iter()
            .filter_map(|ty| self.find_named_class(simple_type_name(ty), class))
            .collect();
        if let DeclData::Class(data) = &mut self.b.decl_mut(class).data {
            data.super_decls = links;
        }
    }

    fn find_named_class(&self, name: &str, except: DeclId) -> Option<DeclId> {
        self.b.decls().find_map(|(id, decl)| {
            let named = decl.as_class().is_some_and(|data| !data.anonymous);
            (id != except && named && decl.name == name).then_some(id)
        })
    }

    /// Marks methods that override, or are overridden by, a same-file method.
    fn mark_siblings(&mut self) {
        let classes: Vec<DeclId> = self
            .b
            .decls()
            .filter(|(_, decl)| decl.kind == DeclKind::Class)
            .map(|(id, _)| id)
            .collect();
        let mut marked = Vec::new();
        for class in classes {
            for sup in self.supertypes(class) {
                for method in self.methods_of(class) {
                    for candidate in self.methods_of(sup) {
                        if self.same_signature(method, candidate) {
                            marked.push(method);
                            marked.push(candidate);
                        }
                    }
                }
            }
        }
        for method in marked {
            if let DeclData::Method(data) = &mut self.b.decl_mut(method).data {
                data.has_siblings = true;
            }
        }
    }

    fn methods_of(&self, class: DeclId) -> Vec<DeclId> {
        self.class_members(class)
            .into_iter()
            .filter(|id| self.b.decl(*id).kind == DeclKind::Method)
            .collect()
    }

    fn same_signature(&self, a: DeclId, b: DeclId) -> bool {
        let (da, db) = (self.b.decl(a), self.b.decl(b));
        let arity = |id| self.arity.get(&id).map(|a: &Arity| a.params);
        !da.is_static() && !db.is_static() && da.name == db.name && arity(a) == arity(b)
    }

    fn class_members(&self, class: DeclId) -> Vec<DeclId> {
        self.b
            .decl(class)
            .as_class()
            .map(|data| data.members.clone())
            .unwrap_or_default()
    }

    /// Same-file supertypes of `class`, transitively.
    fn supertypes(&self, class: DeclId) -> Vec<DeclId> {
        let mut out: Vec<DeclId> = Vec::new();
        let mut stack = vec![class];
        while let Some(current) = stack.pop() {
            let Some(data) = self.b.decl(current).as_class() else {
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

    /// `class` followed by its supertypes: the lookup order for inherited members.
    fn hierarchy(&self, class: DeclId) -> Vec<DeclId> {
        let mut out = vec![class];
        out.extend(self.supertypes(class));
        out
    }

    // ---------------------------------------------------------------------
    // Pass 3: lowering
    // ---------------------------------------------------------------------

    fn lower(&mut self, node: SyntaxNode<'_>) -> NodeId {
        match node.kind() {
            kind if TYPE_DECLARATIONS.contains(&kind) => self.lower_type_declaration(node),
            "method_declaration"
            | "constructor_declaration"
            | "compact_constructor_declaration"
            | "annotation_type_element_declaration" => self.lower_method(node),
            "static_initializer" => self.lower_initializer(node),
            "block" if self.declared.contains_key(&node.id()) => self.lower_initializer(node),
            "class_body" if self.declared.contains_key(&node.id()) => {
                self.lower_anonymous_body(node)
            }
            "object_creation_expression" => self.lower_object_creation(node),
            "field_declaration" | "constant_declaration" => self.lower_field_declaration(node),
            "variable_declarator" => self.lower_declarator(node),
            "formal_parameter" | "spread_parameter" | "catch_formal_parameter"
            | "receiver_parameter" => self.lower_parameter(node),
            "lambda_expression" => self.lower_lambda(node),
            kind if SCOPE_KINDS.contains(&kind) => self.scoped(|this| this.lower_tree(node)),
            "identifier" => self.lower_name(node),
            "type_identifier" => self.lower_type_name(node),
            "this" => self.lower_this(node),
            "field_access" => self.lower_field_access(node),
            "method_invocation" => self.lower_call(node),
            "assignment_expression" => self.lower_assignment(node),
            "update_expression" => self.lower_update(node),
            "unary_expression" => self.lower_unary(node),
            "binary_expression" => self.lower_binary(node),
            "parenthesized_expression" => self.lower_paren(node),
            "expression_statement" => self.lower_expression_statement(node),
            "scoped_type_identifier" | "method_reference" => self.lower_qualifier_only(node),
            kind => match literal_kind(kind, self.text(node)) {
                Some(kind) => self.b.alloc_node(Node::Literal {
                    kind,
                    span: span_of(node),
                }),
                None if node.named_child_count() == 0 => self.token(node),
                None => self.lower_tree(node),
            },
        }
    }

    fn token(&mut self, node: SyntaxNode<'_>) -> NodeId {
        self.b.alloc_node(Node::Token {
            span: span_of(node),
        })
    }

    fn lower_tree(&mut self, node: SyntaxNode<'_>) -> NodeId {
        let children = self.lower_children(node);
        self.b.alloc_node(Node::Tree {
            children,
            span: span_of(node),
        })
    }

    fn lower_children(&mut self, node: SyntaxNode<'_>) -> Vec<NodeId> {
        let parent = node.kind();
        children_with_fields(node)
            .into_iter()
            .filter(|(_, child)| child.is_named())
            .map(|(field, child)| self.lower_child(node, parent, field, child))
            .collect()
    }

    fn lower_child(
        &mut self,
        parent_node: SyntaxNode<'_>,
        parent: &str,
        field: Option<&str>,
        child: SyntaxNode<'_>,
    ) -> NodeId {
        if child.kind() == "identifier" && !identifier_is_reference(parent, field) {
            if field == Some("name") && declares_variable(parent) {
                let ty = parent_node
                    .child_by_field_name("type")
                    .map(|n| self.text(n).to_string())
                    .unwrap_or_default();
                self.declare_variable(child, DeclKind::Local, ty);
            }
            return self.token(child);
        }
        if parent == "for_statement"
            && matches!(field, Some("update") | Some("init"))
            && child.kind() != "local_variable_declaration"
        {
            let expr = self.lower(child);
            return self.b.alloc_node(Node::ExprStatement {
                expr,
                span: span_of(child),
            });
        }
        if parent == "explicit_constructor_invocation" && field == Some("constructor") {
            return self.token(child);
        }
        self.lower(child)
    }

    fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.scopes.push(Scope::Block(HashMap::new()));
        let out = f(self);
        self.scopes.pop();
        out
    }

    fn with_member<T>(&mut self, member: DeclId, f: impl FnOnce(&mut Self) -> T) -> T {
        self.members.push(member);
        let out = f(self);
        self.members.pop();
        out
    }

    fn declare_variable(&mut self, name: SyntaxNode<'_>, kind: DeclKind, ty: String) -> DeclId {
        let id = self.b.alloc_decl(Decl {
            name: self.text(name).to_string(),
            kind,
            modifiers: Modifiers::empty(),
            owner: self.members.last().copied(),
            node: None,
            span: span_of(name),
            data: DeclData::Variable { ty },
        });
        let scope = self.scopes.iter_mut().rev().find_map(|scope| match scope {
            Scope::Block(names) => Some(names),
            Scope::Class(_) => None,
        });
        if let Some(names) = scope {
            names.insert(self.b.decl(id).name.clone(), id);
        }
        id
    }

    fn lower_type_declaration(&mut self, node: SyntaxNode<'_>) -> NodeId {
        let class = match self.declared.get(&node.id()) {
            Some(id) => *id,
            // Local class inside a method body.
            None => {
                let owner = self.members.last().copied();
                let class = self.declare_type(node, owner);
                self.link_class(class);
                class
            }
        };

        self.scopes.push(Scope::Class(class));
        let mut children = Vec::new();
        let mut modifiers_node = None;
        for (field, child) in children_with_fields(node) {
            if !child.is_named() {
                continue;
            }
            let lowered = self.lower_child(node, node.kind(), field, child);
            if child.kind() == "modifiers" {
                modifiers_node = Some(lowered);
            }
            children.push(lowered);
        }
        self.scopes.pop();

        let id = self.b.alloc_node(Node::Tree {
            children,
            span: span_of(node),
        });
        let decl = self.b.decl_mut(class);
        decl.node = Some(id);
        if let DeclData::Class(data) = &mut decl.data {
            data.modifiers_node = modifiers_node;
        }
        id
    }

    fn lower_object_creation(&mut self, node: SyntaxNode<'_>) -> NodeId {
        if let Some(body) = find_named_child(node, "class_body") {
            self.declare_anonymous(body);
        }
        self.lower_tree(node)
    }

    fn lower_anonymous_body(&mut self, body: SyntaxNode<'_>) -> NodeId {
        let Some(class) = self.declared.get(&body.id()).copied() else {
            return self.lower_tree(body);
        };
        self.scopes.push(Scope::Class(class));
        let id = self.lower_tree(body);
        self.scopes.pop();
        self.b.decl_mut(class).node = Some(id);
        id
    }

    fn lower_method(&mut self, node: SyntaxNode<'_>) -> NodeId {
        let method = match self.declared.get(&node.id()) {
            Some(id) => *id,
            None => {
                let Some(class) = self.current_class() else {
                    return self.lower_tree(node);
                };
                let kind = if node.kind() == "method_declaration" {
                    DeclKind::Method
                } else {
                    DeclKind::Constructor
                };
                self.declare_method(node, class, kind, false)
            }
        };
        let id = self.with_member(method, |this| this.scoped(|this| this.lower_tree(node)));
        self.b.decl_mut(method).node = Some(id);
        id
    }

    fn lower_initializer(&mut self, node: SyntaxNode<'_>) -> NodeId {
        let Some(initializer) = self.declared.get(&node.id()).copied() else {
            return self.scoped(|this| this.lower_tree(node));
        };
        let id = self.with_member(initializer, |this| this.scoped(|this| this.lower_tree(node)));
        self.b.decl_mut(initializer).node = Some(id);
        id
    }

    fn lower_field_declaration(&mut self, node: SyntaxNode<'_>) -> NodeId {
        let mut children = Vec::new();
        let mut ty_node = None;
        let mut fields = Vec::new();
        for (field, child) in children_with_fields(node) {
            if !child.is_named() {
                continue;
            }
            let lowered = self.lower_child(node, node.kind(), field, child);
            match field {
                Some("type") => ty_node = Some(lowered),
                Some("declarator") => fields.extend(self.declared.get(&child.id()).copied()),
                _ => {}
            }
            children.push(lowered);
        }
        for field in fields {
            if let DeclData::Field(data) = &mut self.b.decl_mut(field).data {
                data.ty_node = ty_node;
            }
        }
        self.b.alloc_node(Node::Tree {
            children,
            span: span_of(node),
        })
    }

    fn lower_declarator(&mut self, node: SyntaxNode<'_>) -> NodeId {
        let field = self.declared.get(&node.id()).copied();
        let value_node = node.child_by_field_name("value");

        let mut children = Vec::new();
        for (_, child) in children_with_fields(node) {
            if !child.is_named() || Some(child) == value_node {
                continue;
            }
            children.push(self.token(child));
        }
        let value = value_node.map(|value| match field {
            Some(field) => self.with_member(field, |this| this.lower(value)),
            None => self.lower(value),
        });
        children.extend(value);

        let id = self.b.alloc_node(Node::Tree {
            children,
            span: span_of(node),
        });
        match field {
            Some(field) => {
                let decl = self.b.decl_mut(field);
                decl.node = Some(id);
                if let DeclData::Field(data) = &mut decl.data {
                    data.initializer = value;
                }
            }
            None => {
                if let Some(name) = node.child_by_field_name("name") {
                    let ty = self.local_type(node);
                    self.declare_variable(name, DeclKind::Local, ty);
                }
            }
        }
        id
    }

    fn local_type(&self, declarator: SyntaxNode<'_>) -> String {
        let base = declarator
            .parent()
            .and_then(|parent| parent.child_by_field_name("type"))
            .map(|n| self.text(n))
            .unwrap_or_default();
        let dims = declarator
            .child_by_field_name("dimensions")
            .map(|n| self.text(n))
            .unwrap_or_default();
        format!("{base}{dims}")
    }

    fn lower_parameter(&mut self, node: SyntaxNode<'_>) -> NodeId {
        let name = node.child_by_field_name("name").or_else(|| {
            find_named_child(node, "variable_declarator")
                .and_then(|declarator| declarator.child_by_field_name("name"))
        });
        let ty = node
            .child_by_field_name("type")
            .or_else(|| find_named_child(node, "catch_type"))
            .or_else(|| {
                named_children(node)
                    .into_iter()
                    .find(|n| n.kind() != "modifiers" && n.kind() != "variable_declarator")
            })
            .map(|n| self.text(n).to_string())
            .unwrap_or_default();
        let ty = if node.kind() == "spread_parameter" {
            format!("{ty}...")
        } else {
            ty
        };

        let mut children = Vec::new();
        for (_, child) in children_with_fields(node) {
            if !child.is_named() {
                continue;
            }
            let lowered = if Some(child) == name || child.kind() == "variable_declarator" {
                self.token(child)
            } else {
                self.lower(child)
            };
            children.push(lowered);
        }
        let id = self.b.alloc_node(Node::Tree {
            children,
            span: span_of(node),
        });

        if let Some(name) = name {
            let param = self.declare_variable(name, DeclKind::Parameter, ty);
            if is_method_parameter(node) {
                if let Some(method) = self.members.last().copied() {
                    if let DeclData::Method(data) = &mut self.b.decl_mut(method).data {
                        data.params.push(param);
                    }
                }
            }
        }
        id
    }

    fn lower_lambda(&mut self, node: SyntaxNode<'_>) -> NodeId {
        self.scoped(|this| {
            let mut children = Vec::new();
            for (field, child) in children_with_fields(node) {
                if !child.is_named() {
                    continue;
                }
                let lowered = match (field, child.kind()) {
                    (Some("parameters"), "identifier") => {
                        this.declare_variable(child, DeclKind::Parameter, String::new());
                        this.token(child)
                    }
                    (Some("parameters"), "inferred_parameters") => {
                        for param in named_children(child) {
                            if param.kind() == "identifier" {
                                this.declare_variable(param, DeclKind::Parameter, String::new());
                            }
                        }
                        this.token(child)
                    }
                    _ => this.lower(child),
                };
                children.push(lowered);
            }
            this.b.alloc_node(Node::Tree {
                children,
                span: span_of(node),
            })
        })
    }

    /// Lowers only the leading qualifier of `a.b.C` or `a::b`; the rest are
    /// names in a non-reference position.
    fn lower_qualifier_only(&mut self, node: SyntaxNode<'_>) -> NodeId {
        let mut children = Vec::new();
        for (index, child) in named_children(node).into_iter().enumerate() {
            let lowered = if index == 0 {
                self.lower_receiver(child)
            } else {
                self.token(child)
            };
            children.push(lowered);
        }
        self.b.alloc_node(Node::Tree {
            children,
            span: span_of(node),
        })
    }

    fn lower_name(&mut self, node: SyntaxNode<'_>) -> NodeId {
        let name = self.text(node).to_string();
        let resolved = self.lookup_variable(&name);
        if resolved.is_none() {
            self.unresolved += 1;
            tracing::trace!(target = "nova.extract", name = %name, "unresolved name");
        }
        self.b.alloc_node(Node::Name {
            name,
            resolved,
            span: span_of(node),
        })
    }

    fn lower_type_name(&mut self, node: SyntaxNode<'_>) -> NodeId {
        let name = self.text(node).to_string();
        let resolved = self.lookup_type(&name);
        self.b.alloc_node(Node::TypeName {
            name,
            resolved,
            span: span_of(node),
        })
    }

    /// Lowers the object of a member access. A bare identifier that does not
    /// name a variable is taken to be a type name.
    fn lower_receiver(&mut self, node: SyntaxNode<'_>) -> NodeId {
        if node.kind() != "identifier" {
            return self.lower(node);
        }
        let name = self.text(node).to_string();
        if self.lookup_variable(&name).is_some() {
            return self.lower_name(node);
        }
        let resolved = self.lookup_type(&name);
        self.b.alloc_node(Node::TypeName {
            name,
            resolved,
            span: span_of(node),
        })
    }

    fn lower_this(&mut self, node: SyntaxNode<'_>) -> NodeId {
        let resolved = self.current_class();
        self.b.alloc_node(Node::This {
            qualifier: None,
            resolved,
            span: span_of(node),
        })
    }

    fn lower_field_access(&mut self, node: SyntaxNode<'_>) -> NodeId {
        let (Some(object), Some(field)) = (
            node.child_by_field_name("object"),
            node.child_by_field_name("field"),
        ) else {
            return self.lower_tree(node);
        };

        if field.kind() == "this" {
            let qualifier = self.text(object).to_string();
            let simple = simple_type_name(&qualifier);
            let resolved = self.class_scopes().find(|class| self.b.decl(*class).name == simple);
            return self.b.alloc_node(Node::This {
                qualifier: Some(qualifier),
                resolved,
                span: span_of(node),
            });
        }

        let receiver = self.lower_receiver(object);
        let name = self.text(field).to_string();
        let (resolved, shadowed) = match self.b.node(receiver) {
            Node::This {
                resolved: Some(class),
                ..
            } => {
                let field = self.find_field(*class, &name);
                // A bare `name` here would bind to a local, a parameter or a
                // field of an intervening class instead.
                let shadowed = field.is_some() && self.lookup_variable(&name) != field;
                (field, shadowed)
            }
            Node::TypeName {
                resolved: Some(class),
                ..
            } => (
                self.find_field(*class, &name)
                    .filter(|field| self.b.decl(*field).is_static()),
                false,
            ),
            _ => (None, false),
        };
        self.b.alloc_node(Node::FieldAccess {
            receiver,
            name,
            name_span: span_of(field),
            resolved,
            shadowed,
            span: span_of(node),
        })
    }

    fn lower_call(&mut self, node: SyntaxNode<'_>) -> NodeId {
        let (Some(name_node), Some(args_node)) = (
            node.child_by_field_name("name"),
            node.child_by_field_name("arguments"),
        ) else {
            return self.lower_tree(node);
        };
        let receiver = node
            .child_by_field_name("object")
            .map(|object| self.lower_receiver(object));
        let args = self.lower(args_node);
        let arity = named_children(args_node)
            .into_iter()
            .filter(|n| !is_comment(*n))
            .count();
        let name = self.text(name_node).to_string();

        // (class searched, static members only)
        let target = receiver.map(|r| match self.b.node(r) {
            Node::This { resolved, .. } => (*resolved, false),
            Node::TypeName { resolved, .. } => (*resolved, true),
            _ => (None, false),
        });
        let resolved = match target {
            None => {
                let found = self.lookup_method(&name, arity);
                if found.is_none() {
                    self.unresolved += 1;
                }
                found
            }
            Some((Some(class), statics_only)) => self
                .find_method(class, &name, arity)
                .filter(|method| !statics_only || self.b.decl(*method).is_static()),
            Some((None, _)) => None,
        };

        self.b.alloc_node(Node::Call {
            receiver,
            name,
            name_span: span_of(name_node),
            args,
            resolved,
            span: span_of(node),
        })
    }

    fn lower_assignment(&mut self, node: SyntaxNode<'_>) -> NodeId {
        let (Some(left), Some(right), Some(operator)) = (
            node.child_by_field_name("left"),
            node.child_by_field_name("right"),
            node.child_by_field_name("operator"),
        ) else {
            return self.lower_tree(node);
        };
        let Some(op) = AssignOp::from_token(operator.kind()) else {
            return self.lower_tree(node);
        };
        let lhs = self.lower(left);
        let rhs = self.lower(right);
        self.b.alloc_node(Node::Assign {
            op,
            lhs,
            rhs,
            span: span_of(node),
        })
    }

    fn lower_update(&mut self, node: SyntaxNode<'_>) -> NodeId {
        let mut operand = None;
        let mut op = None;
        for (_, child) in children_with_fields(node) {
            if child.is_named() {
                operand = Some(child);
                continue;
            }
            let prefix = operand.is_none();
            op = match (child.kind(), prefix) {
                ("++", true) => Some(UpdateOp::PreIncrement),
                ("--", true) => Some(UpdateOp::PreDecrement),
                ("++", false) => Some(UpdateOp::PostIncrement),
                ("--", false) => Some(UpdateOp::PostDecrement),
                _ => op,
            };
        }
        let (Some(operand), Some(op)) = (operand, op) else {
            return self.lower_tree(node);
        };
        let operand = self.lower(operand);
        self.b.alloc_node(Node::Update {
            op,
            operand,
            span: span_of(node),
        })
    }

    fn lower_unary(&mut self, node: SyntaxNode<'_>) -> NodeId {
        let (Some(operator), Some(operand)) = (
            node.child_by_field_name("operator"),
            node.child_by_field_name("operand"),
        ) else {
            return self.lower_tree(node);
        };
        let Some(op) = UnaryOp::from_token(operator.kind()) else {
            return self.lower_tree(node);
        };
        let operand = self.lower(operand);
        self.b.alloc_node(Node::Unary {
            op,
            operand,
            span: span_of(node),
        })
    }

    fn lower_binary(&mut self, node: SyntaxNode<'_>) -> NodeId {
        let (Some(left), Some(right), Some(operator)) = (
            node.child_by_field_name("left"),
            node.child_by_field_name("right"),
            node.child_by_field_name("operator"),
        ) else {
            return self.lower_tree(node);
        };
        let Some(op) = BinaryOp::from_token(operator.kind()) else {
            return self.lower_tree(node);
        };
        let lhs = self.lower(left);
        let rhs = self.lower(right);
        self.b.alloc_node(Node::Binary {
            op,
            lhs,
            rhs,
            span: span_of(node),
        })
    }

    fn lower_paren(&mut self, node: SyntaxNode<'_>) -> NodeId {
        let inner = named_children(node).into_iter().find(|n| !is_comment(*n));
        let Some(inner) = inner else {
            return self.lower_tree(node);
        };
        let inner = self.lower(inner);
        self.b.alloc_node(Node::Paren {
            inner,
            span: span_of(node),
        })
    }

    fn lower_expression_statement(&mut self, node: SyntaxNode<'_>) -> NodeId {
        let expr = named_children(node).into_iter().find(|n| !is_comment(*n));
        let Some(expr) = expr else {
            return self.lower_tree(node);
        };
        let expr = self.lower(expr);
        self.b.alloc_node(Node::ExprStatement {
            expr,
            span: span_of(node),
        })
    }

    // ---------------------------------------------------------------------
    // Name lookup
    // ---------------------------------------------------------------------

    /// Enclosing classes, innermost first.
    fn class_scopes(&self) -> impl Iterator<Item = DeclId> + '_ {
        self.scopes.iter().rev().filter_map(|scope| match scope {
            Scope::Class(class) => Some(*class),
            Scope::Block(_) => None,
        })
    }

    fn current_class(&self) -> Option<DeclId> {
        self.class_scopes().next()
    }

    fn lookup_variable(&self, name: &str) -> Option<DeclId> {
        self.scopes.iter().rev().find_map(|scope| match scope {
            Scope::Block(names) => names.get(name).copied(),
            Scope::Class(class) => self.find_field(*class, name),
        })
    }

    fn find_field(&self, class: DeclId, name: &str) -> Option<DeclId> {
        self.hierarchy(class).into_iter().find_map(|owner| {
            self.class_members(owner).into_iter().find(|id| {
                let decl = self.b.decl(*id);
                decl.kind == DeclKind::Field && decl.name == name
            })
        })
    }

    fn lookup_method(&self, name: &str, args: usize) -> Option<DeclId> {
        self.class_scopes()
            .find_map(|class| self.find_method(class, name, args))
    }

    /// Method `name` in `class` or its supertypes; prefers a matching arity.
    fn find_method(&self, class: DeclId, name: &str, args: usize) -> Option<DeclId> {
        let candidates: Vec<DeclId> = self
            .hierarchy(class)
            .into_iter()
            .flat_map(|owner| self.methods_of(owner))
            .filter(|id| self.b.decl(*id).name == name)
            .collect();
        candidates
            .iter()
            .copied()
            .find(|id| self.arity.get(id).is_some_and(|arity| arity.accepts(args)))
            .or_else(|| candidates.first().copied())
    }

    fn lookup_type(&self, name: &str) -> Option<DeclId> {
        for class in self.class_scopes() {
            if self.b.decl(class).name == name {
                return Some(class);
            }
            for owner in self.hierarchy(class) {
                let nested = self.class_members(owner).into_iter().find(|id| {
                    let decl = self.b.decl(*id);
                    decl.kind == DeclKind::Class && decl.name == name
                });
                if nested.is_some() {
                    return nested;
                }
            }
        }
        self.b.decls().find_map(|(id, decl)| {
            (decl.kind == DeclKind::Class && decl.owner.is_none() && decl.name == name)
                .then_some(id)
        })
    }
}

fn span_of(node: SyntaxNode<'_>) -> Span {
    Span::new(node.start_byte(), node.end_byte())
}

fn is_comment(node: SyntaxNode<'_>) -> bool {
    matches!(node.kind(), "comment" | "line_comment" | "block_comment")
}

fn named_children(node: SyntaxNode<'_>) -> Vec<SyntaxNode<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

fn find_named_child<'tree>(node: SyntaxNode<'tree>, kind: &str) -> Option<SyntaxNode<'tree>> {
    let mut cursor = node.walk();
    let found = node
        .named_children(&mut cursor)
        .find(|child| child.kind() == kind);
    found
}

fn children_with_fields(node: SyntaxNode<'_>) -> Vec<(Option<&'static str>, SyntaxNode<'_>)> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    if cursor.goto_first_child() {
        loop {
            out.push((cursor.field_name(), cursor.node()));
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
    out
}

/// Whether an identifier child of `parent` (in `field`) denotes a variable.
fn identifier_is_reference(parent: &str, field: Option<&str>) -> bool {
    if matches!(field, Some("name" | "key" | "label")) {
        return false;
    }
    !matches!(
        parent,
        "labeled_statement"
            | "break_statement"
            | "continue_statement"
            | "inferred_parameters"
            | "scoped_identifier"
            | "marker_annotation"
            | "annotation"
            | "package_declaration"
            | "import_declaration"
            | "module_declaration"
            | "requires_module_directive"
            | "exports_module_directive"
            | "opens_module_directive"
            | "enum_constant"
            | "type_parameter"
    )
}

/// Constructs whose `name` field introduces a local variable.
fn declares_variable(parent: &str) -> bool {
    matches!(
        parent,
        "enhanced_for_statement" | "resource" | "instanceof_expression"
    )
}

fn is_method_parameter(param: SyntaxNode<'_>) -> bool {
    param
        .parent()
        .filter(|list| list.kind() == "formal_parameters")
        .and_then(|list| list.parent())
        .is_some_and(|owner| {
            matches!(
                owner.kind(),
                "method_declaration" | "constructor_declaration"
            )
        })
}

fn literal_kind(kind: &str, text: &str) -> Option<LiteralKind> {
    Some(match kind {
        "decimal_integer_literal"
        | "hex_integer_literal"
        | "octal_integer_literal"
        | "binary_integer_literal" => {
            if text.ends_with(['l', 'L']) {
                LiteralKind::Long
            } else {
                LiteralKind::Int
            }
        }
        "decimal_floating_point_literal" | "hex_floating_point_literal" => {
            if text.ends_with(['f', 'F']) {
                LiteralKind::Float
            } else {
                LiteralKind::Double
            }
        }
        "character_literal" => LiteralKind::Char,
        "string_literal" => LiteralKind::String,
        "text_block" => LiteralKind::TextBlock,
        "true" | "false" => LiteralKind::Bool,
        "null_literal" => LiteralKind::Null,
        _ => return None,
    })
}

/// `java.util.List<String>` -> `List`.
fn simple_type_name(ty: &str) -> &str {
    let base = ty.split('<').next().unwrap_or(ty).trim();
    base.rsplit('.').next().unwrap_or(base).trim()
}
