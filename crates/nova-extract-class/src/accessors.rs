//! Getter and setter prototypes for moved fields.

use nova_extract_hir::Decl;

use crate::naming::{NamingStrategy, VariableKind};

/// `public [static] T getX() { return x; }`, unindented.
#[must_use]
pub fn getter_prototype(field: &Decl, naming: &dyn NamingStrategy) -> String {
    let ty = field.ty().unwrap_or("Object");
    let modifiers = if field.is_static() {
        "public static"
    } else {
        "public"
    };
    format!(
        "{modifiers} {ty} {}() {{\n    return {};\n}}",
        naming.getter_name(field),
        field.name
    )
}

/// `public [static] void setX(T x) { this.x = x; }`, unindented.
///
/// When the parameter has the field's name, the assignment target is
/// qualified with `this` (or `class_name` for static fields).
#[must_use]
pub fn setter_prototype(field: &Decl, class_name: &str, naming: &dyn NamingStrategy) -> String {
    let ty = field.ty().unwrap_or("Object");
    let kind = VariableKind::of(field);
    let property = naming.property_name(&field.name, kind);
    let parameter = naming.suggest_parameter_name(&property);

    let target = match (parameter == field.name, field.is_static()) {
        (true, true) => format!("{class_name}.{}", field.name),
        (true, false) => format!("this.{}", field.name),
        (false, _) => field.name.clone(),
    };
    let modifiers = if field.is_static() {
        "public static"
    } else {
        "public"
    };
    format!(
        "{modifiers} void {}({ty} {parameter}) {{\n    {target} = {parameter};\n}}",
        naming.setter_name(field)
    )
}
