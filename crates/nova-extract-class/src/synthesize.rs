//! Assembles the source text of the extracted class.

use nova_extract_hir::{Decl, DeclId, Modifiers, NodeId, SourceFile, Span};
use serde::Serialize;

use crate::accessors::{getter_prototype, setter_prototype};
use crate::format::{dedent_block, indent_block, reindent_member, INDENT};
use crate::members::{inline_initializer, BackPointerSpec, ExtractionContext, InnerClass};
use crate::naming::{NamingStrategy, VariableKind};
use crate::rewrite::{unresolved_references, Rewriter};

/// The synthesized class plus what a caller needs to wire it up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedClass {
    pub text: String,
    pub back_pointer: BackPointerSpec,
    /// References in moved code that could not be resolved and were copied
    /// unchanged.
    pub unresolved: Vec<Span>,
}

/// Source text of the new class.
#[must_use]
pub fn synthesize(
    file: &SourceFile,
    ctx: &ExtractionContext,
    naming: &dyn NamingStrategy,
) -> String {
    synthesize_with_report(file, ctx, naming).text
}

pub fn synthesize_with_report(
    file: &SourceFile,
    ctx: &ExtractionContext,
    naming: &dyn NamingStrategy,
) -> ExtractedClass {
    let back_pointer = ctx.back_pointer(file, naming).clone();
    let text = {
        let mut synth = Synthesizer {
            file,
            ctx,
            naming,
            back_pointer: &back_pointer,
            rewriter: Rewriter::new(file, ctx, naming, &back_pointer.field_name),
            blocks: Vec::new(),
        };
        synth.run()
    };

    let mut unresolved: Vec<Span> = ctx
        .emitted_code(file)
        .into_iter()
        .flat_map(|node| unresolved_references(file, node))
        .collect();
    unresolved.sort();
    unresolved.dedup();
    for span in &unresolved {
        tracing::debug!(
            target = "nova.extract",
            reference = file.span_text(*span),
            ?span,
            "unresolved reference copied verbatim"
        );
    }
    tracing::debug!(
        target = "nova.extract",
        class = %ctx.class_name,
        fields = ctx.members.fields.len(),
        methods = ctx.members.methods.len(),
        back_pointer = back_pointer.required,
        "synthesized class"
    );

    ExtractedClass {
        text,
        back_pointer,
        unresolved,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Field,
    Member,
}

struct Synthesizer<'a> {
    file: &'a SourceFile,
    ctx: &'a ExtractionContext,
    naming: &'a dyn NamingStrategy,
    back_pointer: &'a BackPointerSpec,
    rewriter: Rewriter<'a>,
    blocks: Vec<(BlockKind, String)>,
}

impl<'a> Synthesizer<'a> {
    fn run(&mut self) -> String {
        let mut out = String::new();
        if let Some(package) = self.ctx.package_name.as_deref() {
            out.push_str(&format!("package {package};\n\n"));
        }
        out.push_str(&self.header());
        out.push_str(" {\n");

        if self.back_pointer.required {
            let field = format!(
                "private final {} {};",
                self.original_type(),
                self.back_pointer.field_name
            );
            self.push(BlockKind::Field, indent_block(&field, INDENT));
        }
        self.emit_fields_and_initializers();
        self.emit_constructor();
        let ctx = self.ctx;
        for method in &ctx.members.methods {
            self.emit_code_member(*method);
        }
        for inner in &ctx.members.inner_classes {
            self.emit_inner_class(*inner);
        }

        let mut previous = None;
        for (kind, text) in &self.blocks {
            match (previous, kind) {
                (None, _) => {}
                (Some(BlockKind::Field), BlockKind::Field) => out.push('\n'),
                _ => out.push_str("\n\n"),
            }
            out.push_str(text);
            previous = Some(*kind);
        }
        if previous.is_some() {
            out.push('\n');
        }
        out.push_str("}\n");
        out
    }

    fn push(&mut self, kind: BlockKind, text: String) {
        self.blocks.push((kind, text));
    }

    fn header(&self) -> String {
        let members = &self.ctx.members;
        let is_abstract = members
            .methods
            .iter()
            .any(|method| self.file.decl(*method).modifiers.contains(Modifiers::ABSTRACT));

        let mut header = String::from("public ");
        if is_abstract {
            header.push_str("abstract ");
        }
        header.push_str("class ");
        header.push_str(&self.ctx.class_name);
        if !members.type_params.is_empty() {
            let params: Vec<&str> = members.type_params.iter().map(|p| p.text.as_str()).collect();
            header.push_str(&format!("<{}>", params.join(", ")));
        }
        if !members.interfaces.is_empty() {
            header.push_str(" implements ");
            header.push_str(&members.interfaces.join(", "));
        }
        header
    }

    /// The original class as a type, parameterized when every one of its type
    /// parameters is carried over; raw otherwise.
    fn original_type(&self) -> String {
        let original = self
            .file
            .decl(self.ctx.original_class)
            .as_class()
            .map(|data| data.type_params.as_slice())
            .unwrap_or(&[]);
        let qualified = &self.ctx.original_qualified_name;
        if original.is_empty() {
            return qualified.clone();
        }
        let carried = original.iter().all(|param| {
            self.ctx
                .members
                .type_params
                .iter()
                .any(|own| own.name == param.name)
        });
        if !carried {
            tracing::debug!(
                target = "nova.extract",
                class = %qualified,
                "type parameters not carried over; using the raw type"
            );
            return qualified.clone();
        }
        let names: Vec<&str> = original.iter().map(|param| param.name.as_str()).collect();
        format!("{qualified}<{}>", names.join(", "))
    }

    fn emit_fields_and_initializers(&mut self) {
        let (file, ctx) = (self.file, self.ctx);
        let mut initializers: Vec<DeclId> = ctx.members.initializers.clone();
        initializers.sort_by_key(|init| file.decl(*init).span.start);
        let mut pending = initializers.into_iter().peekable();

        for field in &ctx.members.fields {
            let start = file.decl(*field).span.start;
            while let Some(init) = pending.next_if(|init| file.decl(*init).span.start < start) {
                self.emit_code_member(init);
            }
            self.emit_field(*field);
        }
        for init in pending {
            self.emit_code_member(init);
        }
    }

    fn emit_field(&mut self, field: DeclId) {
        let file = self.file;
        let decl = file.decl(field);
        let Some(data) = decl.as_field() else {
            return;
        };

        let mut lines = Vec::new();
        if let Some(doc) = data.doc {
            lines.push(self.doc_text(doc));
        }
        for annotation in &data.annotations {
            lines.push(file.span_text(*annotation).to_string());
        }

        let mut modifiers = if decl.modifiers.contains(Modifiers::PUBLIC) && decl.is_static() {
            Modifiers::PUBLIC
        } else {
            Modifiers::PRIVATE
        };
        for kept in [Modifiers::STATIC, Modifiers::TRANSIENT, Modifiers::VOLATILE] {
            if decl.modifiers.contains(kept) {
                modifiers.insert(kept);
            }
        }
        if decl.modifiers.contains(Modifiers::FINAL) && !self.ctx.needs_setter(field) {
            modifiers.insert(Modifiers::FINAL);
        }
        let modifiers: Vec<&str> = modifiers.keywords().collect();

        let mut declaration = format!(
            "{} {} {}",
            modifiers.join(" "),
            self.field_type(decl),
            decl.name
        );
        if let Some(init) = inline_initializer(file, field) {
            declaration.push_str(" = ");
            declaration.push_str(self.rewriter.rewrite(init).trim());
        }
        declaration.push(';');
        lines.push(declaration);
        self.push(BlockKind::Field, indent_block(&lines.join("\n"), INDENT));

        if self.ctx.needs_getter(field) {
            let getter = getter_prototype(decl, self.naming);
            self.push(BlockKind::Member, indent_block(&getter, INDENT));
        }
        if self.ctx.needs_setter(field) {
            let setter = setter_prototype(decl, &self.ctx.class_name, self.naming);
            self.push(BlockKind::Member, indent_block(&setter, INDENT));
        }
    }

    /// Declared type of a field, with nested types of the original qualified.
    fn field_type(&self, decl: &Decl) -> String {
        let Some(data) = decl.as_field() else {
            return decl.ty().unwrap_or_default().to_string();
        };
        let Some(ty_node) = data.ty_node else {
            return data.ty.clone();
        };
        let dims = data
            .ty
            .strip_prefix(self.file.node_text(ty_node))
            .unwrap_or_default();
        format!("{}{dims}", self.rewriter.rewrite(ty_node))
    }

    fn emit_constructor(&mut self) {
        let (file, members) = (self.file, &self.ctx.members);
        let has_instance_member = members.iter().any(|member| !file.decl(member).is_static());
        if !has_instance_member && !self.back_pointer.required {
            return;
        }

        let mut params = Vec::new();
        let mut assignments = Vec::new();
        if self.back_pointer.required {
            let bp = self.back_pointer;
            params.push(format!("{} {}", self.original_type(), bp.parameter_name));
            assignments.push(assignment(&bp.field_name, &bp.parameter_name));
        }
        for field in &members.fields {
            let decl = file.decl(*field);
            let has_initializer = decl.as_field().is_some_and(|data| data.initializer.is_some());
            if decl.is_static() || !has_initializer || inline_initializer(file, *field).is_some() {
                continue;
            }
            let property = self.naming.property_name(&decl.name, VariableKind::of(decl));
            let parameter = self.naming.suggest_parameter_name(&property);
            params.push(format!("{} {parameter}", self.field_type(decl)));
            assignments.push(assignment(&decl.name, &parameter));
        }

        let mut text = format!("public {}({}) {{\n", self.ctx.class_name, params.join(", "));
        for line in &assignments {
            text.push_str(INDENT);
            text.push_str(line);
            text.push('\n');
        }
        text.push('}');
        self.push(BlockKind::Member, indent_block(&text, INDENT));
    }

    /// A method or initializer: its doc comment and rewritten body.
    fn emit_code_member(&mut self, member: DeclId) {
        let file = self.file;
        let decl = file.decl(member);
        let Some(node) = decl.node else {
            return;
        };
        let text = self.rewriter.rewrite(node);
        self.push_code(decl, node, text);
    }

    fn emit_inner_class(&mut self, inner: InnerClass) {
        let file = self.file;
        let decl = file.decl(inner.decl);
        let Some(node) = decl.node else {
            return;
        };
        let modifiers_node = decl.as_class().and_then(|data| data.modifiers_node);
        let text = match (inner.make_public, modifiers_node) {
            (false, _) => self.rewriter.rewrite(node),
            (true, Some(modifiers)) => {
                let public = self.public_modifiers(modifiers);
                self.rewriter.override_node(modifiers, public);
                self.rewriter.rewrite(node)
            }
            (true, None) => format!("public {}", self.rewriter.rewrite(node)),
        };
        self.push_code(decl, node, text);
    }

    fn push_code(&mut self, decl: &Decl, node: NodeId, text: String) {
        let start = self.file.node(node).span().start;
        let mut block = String::new();
        if let Some(doc) = decl.doc() {
            block.push_str(&indent_block(&self.doc_text(doc), INDENT));
            block.push('\n');
        }
        block.push_str(&reindent_member(&text, self.file.line_indent(start)));
        self.push(BlockKind::Member, block);
    }

    /// The modifier list of an inner class with its access keyword replaced
    /// by `public`.
    fn public_modifiers(&self, modifiers: NodeId) -> String {
        let syntax = self.file.node(modifiers);
        let span = syntax.span();
        let mut annotations = Vec::new();
        let mut keywords = Vec::new();
        let mut collect_keywords = |gap: &str| {
            for word in gap.split_whitespace() {
                let Some(modifier) = Modifiers::from_keyword(word) else {
                    continue;
                };
                let access = Modifiers::PUBLIC
                    .with(Modifiers::PROTECTED)
                    .with(Modifiers::PRIVATE);
                if !access.contains(modifier) {
                    keywords.push(word.to_string());
                }
            }
        };

        let mut cursor = span.start;
        for child in syntax.children() {
            let child_span = self.file.node(child).span();
            collect_keywords(self.file.span_text(Span::new(cursor, child_span.start)));
            annotations.push(self.rewriter.rewrite(child));
            cursor = child_span.end;
        }
        collect_keywords(self.file.span_text(Span::new(cursor, span.end)));

        annotations.push("public".to_string());
        annotations.extend(keywords);
        annotations.join(" ")
    }

    fn doc_text(&self, doc: Span) -> String {
        let text = self.file.span_text(doc);
        dedent_block(&format!("{}{text}", self.file.line_indent(doc.start)))
    }
}

fn assignment(field: &str, parameter: &str) -> String {
    if field == parameter {
        format!("this.{field} = {parameter};")
    } else {
        format!("{field} = {parameter};")
    }
}
