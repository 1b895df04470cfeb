use std::cell::OnceCell;
use std::collections::HashSet;

use nova_extract_hir::{DeclId, DeclKind, NodeId, SourceFile, Span, TypeParam};
use serde::Serialize;

use crate::classify::Classifier;
use crate::error::ExtractClassError;
use crate::naming::{decapitalize, NamingStrategy, VariableKind};

/// A nested class selected for extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InnerClass {
    pub decl: DeclId,
    /// Replace the class's access modifier with `public` in the new class.
    pub make_public: bool,
}

/// The members selected for extraction, in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberSet {
    pub fields: Vec<DeclId>,
    pub methods: Vec<DeclId>,
    pub initializers: Vec<DeclId>,
    pub inner_classes: Vec<InnerClass>,
    pub type_params: Vec<TypeParam>,
    /// Interfaces the new class implements, by qualified name.
    pub interfaces: Vec<String>,
}

impl MemberSet {
    /// Whether `decl` is one of the directly selected members.
    #[must_use]
    pub fn contains(&self, decl: DeclId) -> bool {
        self.fields.contains(&decl)
            || self.methods.contains(&decl)
            || self.initializers.contains(&decl)
            || self.inner_classes.iter().any(|inner| inner.decl == decl)
    }

    pub fn inner_class_decls(&self) -> impl Iterator<Item = DeclId> + '_ {
        self.inner_classes.iter().map(|inner| inner.decl)
    }

    /// All directly selected members.
    pub fn iter(&self) -> impl Iterator<Item = DeclId> + '_ {
        self.fields
            .iter()
            .chain(&self.methods)
            .chain(&self.initializers)
            .copied()
            .chain(self.inner_class_decls())
    }
}

/// Builds a [`MemberSet`] by selecting members of one class by name.
pub struct MemberSetBuilder<'f> {
    file: &'f SourceFile,
    class: DeclId,
    set: MemberSet,
}

impl<'f> MemberSetBuilder<'f> {
    pub fn new(file: &'f SourceFile, class: DeclId) -> Self {
        Self {
            file,
            class,
            set: MemberSet::default(),
        }
    }

    /// Starts a builder for the class named `name` (simple or qualified).
    pub fn for_class(file: &'f SourceFile, name: &str) -> Result<Self, ExtractClassError> {
        let class = file
            .find_class(name)
            .ok_or_else(|| ExtractClassError::ClassNotFound(name.to_string()))?;
        Ok(Self::new(file, class))
    }

    #[must_use]
    pub fn class(&self) -> DeclId {
        self.class
    }

    pub fn field(&mut self, name: &str) -> Result<&mut Self, ExtractClassError> {
        let decl = self.lookup(name, DeclKind::Field)?;
        push_unique(&mut self.set.fields, decl);
        Ok(self)
    }

    /// Selects every method named `name`, overloads included.
    pub fn method(&mut self, name: &str) -> Result<&mut Self, ExtractClassError> {
        let overloads: Vec<DeclId> = self
            .file
            .members(self.class)
            .iter()
            .copied()
            .filter(|id| {
                let decl = self.file.decl(*id);
                decl.kind == DeclKind::Method && decl.name == name
            })
            .collect();
        if overloads.is_empty() {
            return Err(self.not_found(name));
        }
        for decl in overloads {
            push_unique(&mut self.set.methods, decl);
        }
        Ok(self)
    }

    /// Selects the `index`-th (0-based) class initializer in source order.
    pub fn initializer(&mut self, index: usize) -> Result<&mut Self, ExtractClassError> {
        let decl = self
            .file
            .members(self.class)
            .iter()
            .copied()
            .filter(|id| self.file.decl(*id).kind == DeclKind::Initializer)
            .nth(index)
            .ok_or_else(|| self.not_found(&format!("initializer #{index}")))?;
        push_unique(&mut self.set.initializers, decl);
        Ok(self)
    }

    pub fn inner_class(
        &mut self,
        name: &str,
        make_public: bool,
    ) -> Result<&mut Self, ExtractClassError> {
        let decl = self.lookup(name, DeclKind::Class)?;
        match self.set.inner_classes.iter_mut().find(|inner| inner.decl == decl) {
            Some(existing) => existing.make_public |= make_public,
            None => self.set.inner_classes.push(InnerClass { decl, make_public }),
        }
        Ok(self)
    }

    pub fn interface(&mut self, qualified_name: impl Into<String>) -> &mut Self {
        let name = qualified_name.into();
        if !self.set.interfaces.contains(&name) {
            self.set.interfaces.push(name);
        }
        self
    }

    /// Carries over the original class's type parameter `name`.
    pub fn type_param(&mut self, name: &str) -> Result<&mut Self, ExtractClassError> {
        let param = self
            .original_type_params()
            .iter()
            .find(|param| param.name == name)
            .cloned()
            .ok_or_else(|| self.not_found(name))?;
        if !self.set.type_params.contains(&param) {
            self.set.type_params.push(param);
        }
        Ok(self)
    }

    /// Carries over every type parameter of the original class.
    pub fn all_type_params(&mut self) -> &mut Self {
        self.set.type_params = self.original_type_params().to_vec();
        self
    }

    #[must_use]
    pub fn build(&self) -> MemberSet {
        self.set.clone()
    }

    fn original_type_params(&self) -> &'f [TypeParam] {
        let file: &'f SourceFile = self.file;
        file.decl(self.class)
            .as_class()
            .map(|data| data.type_params.as_slice())
            .unwrap_or(&[])
    }

    fn lookup(&self, name: &str, kind: DeclKind) -> Result<DeclId, ExtractClassError> {
        self.file
            .find_member(self.class, name, kind)
            .ok_or_else(|| self.not_found(name))
    }

    fn not_found(&self, member: &str) -> ExtractClassError {
        ExtractClassError::MemberNotFound {
            class: self.file.decl(self.class).name.clone(),
            member: member.to_string(),
        }
    }
}

fn push_unique(list: &mut Vec<DeclId>, decl: DeclId) {
    if !list.contains(&decl) {
        list.push(decl);
    }
}

/// The back-pointer field that links the new class to the original instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackPointerSpec {
    pub required: bool,
    pub field_name: String,
    pub parameter_name: String,
}

/// Everything one synthesis run needs to know about the new class.
#[derive(Debug, Clone)]
pub struct ExtractionContext {
    pub class_name: String,
    pub package_name: Option<String>,
    pub original_class: DeclId,
    pub original_qualified_name: String,
    pub members: MemberSet,
    pub fields_needing_getters: HashSet<DeclId>,
    pub fields_needing_setters: HashSet<DeclId>,
    back_pointer: OnceCell<BackPointerSpec>,
}

impl ExtractionContext {
    /// A context for extracting `members` of `original_class` into `class_name`,
    /// placed in the original's package.
    pub fn new(
        file: &SourceFile,
        original_class: DeclId,
        class_name: impl Into<String>,
        members: MemberSet,
    ) -> Self {
        let original = file.decl(original_class);
        let original_qualified_name = original
            .as_class()
            .map(|data| data.qualified_name.clone())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| original.name.clone());
        Self {
            class_name: class_name.into(),
            package_name: file.package().map(str::to_string),
            original_class,
            original_qualified_name,
            members,
            fields_needing_getters: HashSet::new(),
            fields_needing_setters: HashSet::new(),
            back_pointer: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn with_package(mut self, package: Option<String>) -> Self {
        self.package_name = package.filter(|p| !p.is_empty());
        self
    }

    #[must_use]
    pub fn with_getters(mut self, fields: impl IntoIterator<Item = DeclId>) -> Self {
        self.fields_needing_getters.extend(fields);
        self
    }

    #[must_use]
    pub fn with_setters(mut self, fields: impl IntoIterator<Item = DeclId>) -> Self {
        self.fields_needing_setters.extend(fields);
        self
    }

    /// The back-pointer for this run, computed on first use.
    ///
    /// It is required when any emitted code reads, writes or calls through
    /// the original instance. The name is the decapitalized original class
    /// name, made unique against the selected field names and the variables
    /// declared inside emitted code.
    pub fn back_pointer(
        &self,
        file: &SourceFile,
        naming: &dyn NamingStrategy,
    ) -> &BackPointerSpec {
        self.back_pointer.get_or_init(|| {
            let classifier = Classifier::new(file, self);
            let required = self
                .emitted_code(file)
                .into_iter()
                .any(|node| classifier.needs_back_pointer(node));

            let simple_name = &file.decl(self.original_class).name;
            let base = naming.variable_name(&decapitalize(simple_name), VariableKind::Field);
            // Variables declared inside emitted code would shadow the field.
            let emitted: Vec<Span> = self
                .emitted_code(file)
                .into_iter()
                .map(|node| file.node(node).span())
                .collect();
            let nested = file.decls().filter(|(_, decl)| {
                matches!(
                    decl.kind,
                    DeclKind::Field | DeclKind::Parameter | DeclKind::Local
                ) && emitted.iter().any(|span| span.contains(decl.span))
            });
            let taken: Vec<&str> = self
                .members
                .fields
                .iter()
                .map(|field| file.decl(*field).name.as_str())
                .chain(nested.map(|(_, decl)| decl.name.as_str()))
                .collect();
            let field_name =
                naming.unique_variable_name(&base, &|name: &str| taken.iter().any(|t| *t == name));
            let parameter_name = naming
                .suggest_parameter_name(&naming.property_name(&field_name, VariableKind::Field));

            tracing::debug!(
                target = "nova.extract",
                required,
                field = %field_name,
                parameter = %parameter_name,
                "back-pointer"
            );
            BackPointerSpec {
                required,
                field_name,
                parameter_name,
            }
        })
    }

    /// Every node the synthesizer passes through the rewriter.
    pub(crate) fn emitted_code(&self, file: &SourceFile) -> Vec<NodeId> {
        let members = &self.members;
        let bodies = members
            .methods
            .iter()
            .chain(&members.initializers)
            .copied()
            .chain(members.inner_class_decls())
            .filter_map(|decl| file.decl(decl).node);
        let initializers = members
            .fields
            .iter()
            .filter_map(|field| inline_initializer(file, *field));
        bodies.chain(initializers).collect()
    }

    pub fn needs_getter(&self, field: DeclId) -> bool {
        self.fields_needing_getters.contains(&field)
    }

    pub fn needs_setter(&self, field: DeclId) -> bool {
        self.fields_needing_setters.contains(&field)
    }
}

/// The initializer a moved field keeps in its declaration: constants always,
/// and any initializer of a static field. Other fields are initialized through
/// the constructor.
pub(crate) fn inline_initializer(file: &SourceFile, field: DeclId) -> Option<NodeId> {
    let decl = file.decl(field);
    let init = decl.as_field()?.initializer?;
    (decl.is_static() || file.is_constant_expression(init)).then_some(init)
}
