//! Naming conventions for generated fields, parameters and accessors.

use nova_extract_hir::{Decl, DeclKind};

use crate::config::NamingConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    Field,
    StaticField,
    Parameter,
    Local,
}

impl VariableKind {
    /// The naming kind of a field, parameter or local declaration.
    #[must_use]
    pub fn of(decl: &Decl) -> VariableKind {
        match decl.kind {
            DeclKind::Field if decl.is_static() => VariableKind::StaticField,
            DeclKind::Field => VariableKind::Field,
            DeclKind::Parameter => VariableKind::Parameter,
            _ => VariableKind::Local,
        }
    }
}

/// Naming policy consulted by the synthesizer.
///
/// Getter and setter names must be deterministic per field.
pub trait NamingStrategy {
    /// Strips the code-style prefix/suffix for `kind` from a variable name.
    fn property_name(&self, name: &str, kind: VariableKind) -> String;

    /// Applies the code-style prefix/suffix for `kind` to a property name.
    fn variable_name(&self, property: &str, kind: VariableKind) -> String;

    fn getter_name(&self, field: &Decl) -> String {
        let property = self.property_name(&field.name, VariableKind::of(field));
        let prefix = if field.ty() == Some("boolean") {
            "is"
        } else {
            "get"
        };
        format!("{prefix}{}", capitalize_property(&property))
    }

    fn setter_name(&self, field: &Decl) -> String {
        let property = self.property_name(&field.name, VariableKind::of(field));
        format!("set{}", capitalize_property(&property))
    }

    fn suggest_parameter_name(&self, property: &str) -> String {
        self.variable_name(property, VariableKind::Parameter)
    }

    /// `base`, or `base` with the smallest numeric suffix that is not taken.
    fn unique_variable_name(&self, base: &str, taken: &dyn Fn(&str) -> bool) -> String {
        if !taken(base) && !is_java_keyword(base) {
            return base.to_string();
        }
        (1..)
            .map(|n| format!("{base}{n}"))
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| base.to_string())
    }
}

/// [`NamingStrategy`] driven by the `[naming]` config table.
#[derive(Debug, Clone, Default)]
pub struct CodeStyleNaming {
    config: NamingConfig,
}

impl CodeStyleNaming {
    pub fn new(config: NamingConfig) -> Self {
        Self { config }
    }

    fn affixes(&self, kind: VariableKind) -> (&str, &str) {
        let c = &self.config;
        match kind {
            VariableKind::Field => (c.field_prefix.as_str(), c.field_suffix.as_str()),
            VariableKind::StaticField => (
                c.static_field_prefix.as_str(),
                c.static_field_suffix.as_str(),
            ),
            VariableKind::Parameter => (c.parameter_prefix.as_str(), c.parameter_suffix.as_str()),
            VariableKind::Local => (c.local_prefix.as_str(), c.local_suffix.as_str()),
        }
    }
}

impl NamingStrategy for CodeStyleNaming {
    fn property_name(&self, name: &str, kind: VariableKind) -> String {
        let (prefix, suffix) = self.affixes(kind);
        let mut property = name;
        let mut stripped_prefix = false;
        if !prefix.is_empty() && property.len() > prefix.len() {
            if let Some(rest) = property.strip_prefix(prefix) {
                property = rest;
                stripped_prefix = true;
            }
        }
        if !suffix.is_empty() && property.len() > suffix.len() {
            if let Some(rest) = property.strip_suffix(suffix) {
                property = rest;
            }
        }
        if stripped_prefix && !prefix.ends_with('_') {
            decapitalize(property)
        } else {
            property.to_string()
        }
    }

    fn variable_name(&self, property: &str, kind: VariableKind) -> String {
        let (prefix, suffix) = self.affixes(kind);
        if prefix.is_empty() || prefix.ends_with('_') {
            format!("{prefix}{property}{suffix}")
        } else {
            format!("{prefix}{}{suffix}", capitalize(property))
        }
    }
}

pub(crate) fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Bean-style capitalization: `xPos` stays `xPos` so the accessor is `getxPos`.
fn capitalize_property(property: &str) -> String {
    let mut chars = property.chars();
    match (chars.next(), chars.next()) {
        (Some(first), Some(second)) if first.is_lowercase() && second.is_uppercase() => {
            property.to_string()
        }
        _ => capitalize(property),
    }
}

/// `Point` -> `point`; acronyms such as `URLParser` are left alone.
pub(crate) fn decapitalize(word: &str) -> String {
    let mut chars = word.chars();
    match (chars.next(), chars.next()) {
        (Some(first), Some(second)) if first.is_uppercase() && second.is_uppercase() => {
            word.to_string()
        }
        (Some(first), _) => first.to_lowercase().to_string() + &word[first.len_utf8()..],
        (None, _) => String::new(),
    }
}

pub(crate) fn is_java_keyword(ident: &str) -> bool {
    matches!(
        ident,
        "abstract"
            | "assert"
            | "boolean"
            | "break"
            | "byte"
            | "case"
            | "catch"
            | "char"
            | "class"
            | "const"
            | "continue"
            | "default"
            | "do"
            | "double"
            | "else"
            | "enum"
            | "extends"
            | "final"
            | "finally"
            | "float"
            | "for"
            | "goto"
            | "if"
            | "implements"
            | "import"
            | "instanceof"
            | "int"
            | "interface"
            | "long"
            | "native"
            | "new"
            | "package"
            | "private"
            | "protected"
            | "public"
            | "return"
            | "short"
            | "static"
            | "strictfp"
            | "super"
            | "switch"
            | "synchronized"
            | "this"
            | "throw"
            | "throws"
            | "transient"
            | "try"
            | "void"
            | "volatile"
            | "while"
            | "true"
            | "false"
            | "null"
    )
}

#[cfg(test)]
mod tests {
    use nova_extract_hir::{DeclData, Modifiers, Span};
    use pretty_assertions::assert_eq;

    use super::*;

    fn field(name: &str, ty: &str, modifiers: Modifiers) -> Decl {
        Decl {
            name: name.to_string(),
            kind: DeclKind::Field,
            modifiers,
            owner: None,
            node: None,
            span: Span::new(0, 0),
            data: DeclData::Field(nova_extract_hir::FieldData {
                ty: ty.to_string(),
                ..Default::default()
            }),
        }
    }

    fn prefixed() -> CodeStyleNaming {
        CodeStyleNaming::new(NamingConfig {
            field_prefix: "my".into(),
            static_field_prefix: "our".into(),
            parameter_prefix: "p_".into(),
            ..NamingConfig::default()
        })
    }

    #[test]
    fn accessor_names_follow_bean_conventions() {
        let naming = CodeStyleNaming::default();
        let count = field("count", "int", Modifiers::empty());
        assert_eq!(naming.getter_name(&count), "getCount");
        assert_eq!(naming.setter_name(&count), "setCount");

        let flag = field("enabled", "boolean", Modifiers::empty());
        assert_eq!(naming.getter_name(&flag), "isEnabled");
        let boxed = field("enabled", "Boolean", Modifiers::empty());
        assert_eq!(naming.getter_name(&boxed), "getEnabled");

        let x_pos = field("xPos", "int", Modifiers::empty());
        assert_eq!(naming.getter_name(&x_pos), "getxPos");
    }

    #[test]
    fn prefixes_are_stripped_and_applied() {
        let naming = prefixed();
        let total = field("myTotal", "long", Modifiers::empty());
        assert_eq!(naming.getter_name(&total), "getTotal");
        assert_eq!(naming.property_name("myTotal", VariableKind::Field), "total");
        assert_eq!(naming.property_name("my", VariableKind::Field), "my");

        let shared = field("ourCache", "Map", Modifiers::STATIC);
        assert_eq!(naming.setter_name(&shared), "setCache");

        assert_eq!(naming.variable_name("point", VariableKind::Field), "myPoint");
        assert_eq!(naming.suggest_parameter_name("point"), "p_point");
        assert_eq!(naming.property_name("p_point", VariableKind::Parameter), "point");
    }

    #[test]
    fn unique_names_get_numeric_suffixes() {
        let naming = CodeStyleNaming::default();
        let taken = ["point", "point1"];
        let is_taken = |name: &str| taken.iter().any(|t| *t == name);
        assert_eq!(naming.unique_variable_name("point", &is_taken), "point2");
        assert_eq!(naming.unique_variable_name("other", &is_taken), "other");
        assert_eq!(naming.unique_variable_name("int", &|_: &str| false), "int1");
    }

    #[test]
    fn decapitalize_keeps_acronyms() {
        assert_eq!(decapitalize("Point"), "point");
        assert_eq!(decapitalize("URLParser"), "URLParser");
        assert_eq!(decapitalize("A"), "a");
        assert_eq!(decapitalize(""), "");
    }
}
