use std::fmt;

use crate::hir::{DeclId, NodeId, Span};

/// Java modifier keywords as a bit set.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers(u16);

impl Modifiers {
    pub const PUBLIC: Modifiers = Modifiers(1 << 0);
    pub const PROTECTED: Modifiers = Modifiers(1 << 1);
    pub const PRIVATE: Modifiers = Modifiers(1 << 2);
    pub const STATIC: Modifiers = Modifiers(1 << 3);
    pub const FINAL: Modifiers = Modifiers(1 << 4);
    pub const ABSTRACT: Modifiers = Modifiers(1 << 5);
    pub const TRANSIENT: Modifiers = Modifiers(1 << 6);
    pub const VOLATILE: Modifiers = Modifiers(1 << 7);
    pub const SYNCHRONIZED: Modifiers = Modifiers(1 << 8);
    pub const NATIVE: Modifiers = Modifiers(1 << 9);
    pub const DEFAULT: Modifiers = Modifiers(1 << 10);
    pub const STRICTFP: Modifiers = Modifiers(1 << 11);

    const KEYWORDS: [(Modifiers, &'static str); 12] = [
        (Modifiers::PUBLIC, "public"),
        (Modifiers::PROTECTED, "protected"),
        (Modifiers::PRIVATE, "private"),
        (Modifiers::ABSTRACT, "abstract"),
        (Modifiers::STATIC, "static"),
        (Modifiers::FINAL, "final"),
        (Modifiers::TRANSIENT, "transient"),
        (Modifiers::VOLATILE, "volatile"),
        (Modifiers::SYNCHRONIZED, "synchronized"),
        (Modifiers::NATIVE, "native"),
        (Modifiers::DEFAULT, "default"),
        (Modifiers::STRICTFP, "strictfp"),
    ];

    #[must_use]
    pub const fn empty() -> Self {
        Modifiers(0)
    }

    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::KEYWORDS
            .iter()
            .find(|(_, kw)| *kw == keyword)
            .map(|(m, _)| *m)
    }

    #[must_use]
    pub fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Modifiers) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Modifiers) {
        self.0 &= !other.0;
    }

    #[must_use]
    pub fn with(mut self, other: Modifiers) -> Self {
        self.insert(other);
        self
    }

    #[must_use]
    pub fn is_static(self) -> bool {
        self.contains(Modifiers::STATIC)
    }

    /// Keywords in canonical Java order.
    pub fn keywords(self) -> impl Iterator<Item = &'static str> {
        Self::KEYWORDS
            .into_iter()
            .filter(move |(m, _)| self.contains(*m))
            .map(|(_, kw)| kw)
    }
}

impl fmt::Debug for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.keywords()).finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
    Class,
    Field,
    Method,
    Constructor,
    Initializer,
    Parameter,
    Local,
}

impl DeclKind {
    #[must_use]
    pub fn is_member(self) -> bool {
        matches!(
            self,
            DeclKind::Class
                | DeclKind::Field
                | DeclKind::Method
                | DeclKind::Constructor
                | DeclKind::Initializer
        )
    }
}

/// A type parameter of a generic class, e.g. `T extends Comparable<T>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParam {
    pub name: String,
    /// The full declaration text, bounds included.
    pub text: String,
}

impl TypeParam {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClassData {
    pub qualified_name: String,
    pub type_params: Vec<TypeParam>,
    /// `extends`/`implements` types as written.
    pub supertypes: Vec<String>,
    /// Supertypes declared in the same file.
    pub super_decls: Vec<DeclId>,
    pub members: Vec<DeclId>,
    pub modifiers_node: Option<NodeId>,
    pub anonymous: bool,
    pub doc: Option<Span>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldData {
    pub ty: String,
    /// Lowered type syntax, shared by every declarator of one declaration.
    pub ty_node: Option<NodeId>,
    pub annotations: Vec<Span>,
    pub initializer: Option<NodeId>,
    pub doc: Option<Span>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MethodData {
    pub params: Vec<DeclId>,
    /// The method overrides, or is overridden by, another method.
    pub has_siblings: bool,
    pub doc: Option<Span>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclData {
    Class(ClassData),
    Field(FieldData),
    Method(MethodData),
    Initializer { doc: Option<Span> },
    Variable { ty: String },
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decl {
    pub name: String,
    pub kind: DeclKind,
    pub modifiers: Modifiers,
    /// Enclosing class for members, enclosing member for locals and parameters.
    pub owner: Option<DeclId>,
    /// Declaration syntax; `None` for declarations known only by signature.
    pub node: Option<NodeId>,
    pub span: Span,
    pub data: DeclData,
}

impl Decl {
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.modifiers.is_static()
    }

    #[must_use]
    pub fn as_class(&self) -> Option<&ClassData> {
        match &self.data {
            DeclData::Class(data) => Some(data),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_field(&self) -> Option<&FieldData> {
        match &self.data {
            DeclData::Field(data) => Some(data),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_method(&self) -> Option<&MethodData> {
        match &self.data {
            DeclData::Method(data) => Some(data),
            _ => None,
        }
    }

    /// Declared type text for fields, parameters and locals.
    #[must_use]
    pub fn ty(&self) -> Option<&str> {
        match &self.data {
            DeclData::Field(data) => Some(&data.ty),
            DeclData::Variable { ty } => Some(ty),
            _ => None,
        }
    }

    #[must_use]
    pub fn doc(&self) -> Option<Span> {
        match &self.data {
            DeclData::Class(data) => data.doc,
            DeclData::Field(data) => data.doc,
            DeclData::Method(data) => data.doc,
            DeclData::Initializer { doc } => *doc,
            DeclData::Variable { .. } | DeclData::None => None,
        }
    }
}
