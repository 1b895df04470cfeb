use nova_extract_hir::{DeclKind, Modifiers, Node, NodeId, Resolver, SourceFile};
use nova_extract_syntax::{lower, ParseError};
use pretty_assertions::assert_eq;

/// The `nth` node whose text is exactly `text` and that matches `pred`.
fn find_node(file: &SourceFile, text: &str, nth: usize, pred: impl Fn(&Node) -> bool) -> NodeId {
    file.nodes()
        .filter(|(id, node)| pred(node) && file.node_text(*id) == text)
        .map(|(id, _)| id)
        .nth(nth)
        .unwrap_or_else(|| panic!("node `{text}` #{nth} not found"))
}

fn is_name(node: &Node) -> bool {
    matches!(node, Node::Name { .. })
}

const POINT: &str = r#"
package geo;

/** A point. */
public class Point<T extends Number> implements Comparable<Point<T>>, java.io.Serializable {
    /** Horizontal. */
    @Deprecated
    private int x, y;
    static final int SCALE = 2;

    int distanceSq() {
        return x * x + y * y;
    }

    void setX(int x) {
        this.x = x;
        int y = x;
        this.y = y;
    }

    public int compareTo(Point<T> other) { return 0; }
}
"#;

#[test]
fn declares_classes_and_members() {
    let file = lower(POINT).expect("lower");
    assert_eq!(file.package(), Some("geo"));

    let point = file.find_class("Point").expect("class");
    assert_eq!(file.find_class("geo.Point"), Some(point));
    let data = file.decl(point).as_class().expect("class data");
    assert_eq!(data.qualified_name, "geo.Point");
    assert_eq!(data.type_params.len(), 1);
    assert_eq!(data.type_params[0].name, "T");
    assert_eq!(data.type_params[0].text, "T extends Number");
    assert_eq!(
        data.supertypes,
        vec!["Comparable<Point<T>>".to_string(), "java.io.Serializable".to_string()]
    );
    assert_eq!(data.doc.map(|span| file.span_text(span)), Some("/** A point. */"));

    let names: Vec<_> = file
        .members(point)
        .iter()
        .map(|id| file.decl(*id).name.as_str())
        .collect();
    assert_eq!(names, vec!["x", "y", "SCALE", "distanceSq", "setX", "compareTo"]);

    let x = file.find_member(point, "x", DeclKind::Field).expect("x");
    let x_data = file.decl(x).as_field().expect("field data");
    assert_eq!(x_data.ty, "int");
    assert_eq!(x_data.annotations.len(), 1);
    assert_eq!(x_data.doc.map(|span| file.span_text(span)), Some("/** Horizontal. */"));
    assert!(file.decl(x).modifiers.contains(Modifiers::PRIVATE));

    let scale = file.find_member(point, "SCALE", DeclKind::Field).expect("SCALE");
    let init = file.decl(scale).as_field().and_then(|f| f.initializer).expect("init");
    assert!(file.is_constant_expression(init));
}

#[test]
fn resolves_fields_and_locals() {
    let file = lower(POINT).expect("lower");
    let point = file.find_class("Point").expect("class");
    let x = file.find_member(point, "x", DeclKind::Field);
    let y = file.find_member(point, "y", DeclKind::Field);

    // `return x * x + y * y;`
    let first_x = find_node(&file, "x", 0, is_name);
    assert_eq!(file.resolve(first_x), x);
    let first_y = find_node(&file, "y", 0, is_name);
    assert_eq!(file.resolve(first_y), y);

    // `this.x = x;` inside `setX(int x)`: the field access is shadowed, the
    // bare name is the parameter.
    let this_x = find_node(&file, "this.x", 0, |n| matches!(n, Node::FieldAccess { .. }));
    assert_eq!(file.resolve(this_x), x);
    assert!(file.is_shadowed(this_x));

    let set_x = file.find_member(point, "setX", DeclKind::Method).expect("setX");
    let params = &file.decl(set_x).as_method().expect("method").params;
    assert_eq!(params.len(), 1);
    let param_ref = find_node(&file, "x", 2, is_name);
    assert_eq!(file.resolve(param_ref), Some(params[0]));
    assert_eq!(file.decl(params[0]).kind, DeclKind::Parameter);
    assert_eq!(file.decl(params[0]).owner, Some(set_x));
}

#[test]
fn marks_overridden_methods() {
    let source = r#"
class Base {
    void hook() {}
    void plain() {}
}
class Derived extends Base {
    void hook() {}
    @Override public String toString() { return ""; }
}
"#;
    let file = lower(source).expect("lower");
    let base = file.find_class("Base").expect("Base");
    let derived = file.find_class("Derived").expect("Derived");
    assert_eq!(file.supertypes(derived), vec![base]);

    let siblings = |class, name| {
        let method = file.find_member(class, name, DeclKind::Method).expect(name);
        file.decl(method).as_method().expect("method").has_siblings
    };
    assert!(siblings(base, "hook"));
    assert!(siblings(derived, "hook"));
    assert!(!siblings(base, "plain"));
    assert!(siblings(derived, "toString"));

    let plain = file.find_member(base, "plain", DeclKind::Method).expect("plain");
    assert!(file.is_member_of(plain, derived));
}

#[test]
fn resolves_calls_this_and_nested_types() {
    let source = r#"
class Outer {
    static class Helper {}
    int count;
    static int twice(int v) { return v * 2; }
    void run() {
        Helper h = new Helper();
        count = Outer.twice(count);
        Runnable r = new Runnable() {
            public void run() { this.hashCode(); }
        };
        tick();
    }
    void tick() { count++; }
}
"#;
    let file = lower(source).expect("lower");
    let outer = file.find_class("Outer").expect("Outer");
    let helper = file.find_member(outer, "Helper", DeclKind::Class).expect("Helper");
    let twice = file.find_member(outer, "twice", DeclKind::Method);
    let tick = file.find_member(outer, "tick", DeclKind::Method);

    let helper_ty = find_node(&file, "Helper", 0, |n| matches!(n, Node::TypeName { .. }));
    assert_eq!(file.resolve(helper_ty), Some(helper));

    let qualified = find_node(&file, "Outer.twice(count)", 0, |n| {
        matches!(n, Node::Call { .. })
    });
    assert_eq!(file.resolve(qualified), twice);

    let bare = find_node(&file, "tick()", 0, |n| matches!(n, Node::Call { .. }));
    assert_eq!(file.resolve(bare), tick);

    let anon_this = find_node(&file, "this", 0, |n| matches!(n, Node::This { .. }));
    let anon = file.resolve(anon_this).expect("anonymous class");
    assert_ne!(anon, outer);
    assert!(file.decl(anon).as_class().expect("class").anonymous);

    let update = find_node(&file, "count++", 0, |n| matches!(n, Node::Update { .. }));
    let Node::Update { operand, .. } = file.node(update) else {
        unreachable!()
    };
    assert_eq!(file.resolve(*operand), file.find_member(outer, "count", DeclKind::Field));
}

#[test]
fn interface_members_get_implicit_modifiers() {
    let source = r#"
interface Shape {
    int SIDES = 4;
    double area();
    default String label() { return "shape"; }
}
"#;
    let file = lower(source).expect("lower");
    let shape = file.find_class("Shape").expect("Shape");
    let sides = file.find_member(shape, "SIDES", DeclKind::Field).expect("SIDES");
    let mods = file.decl(sides).modifiers;
    assert!(mods.contains(Modifiers::PUBLIC.with(Modifiers::STATIC).with(Modifiers::FINAL)));

    let area = file.find_member(shape, "area", DeclKind::Method).expect("area");
    assert!(file.decl(area).modifiers.contains(Modifiers::ABSTRACT));
    let label = file.find_member(shape, "label", DeclKind::Method).expect("label");
    assert!(!file.decl(label).modifiers.contains(Modifiers::ABSTRACT));
}

#[test]
fn lambda_parameters_shadow_fields() {
    let source = r#"
class Counter {
    int n;
    void each(java.util.List<Integer> xs) {
        xs.forEach(n -> System.out.println(n));
        for (int i : xs) { n += i; }
    }
}
"#;
    let file = lower(source).expect("lower");
    let counter = file.find_class("Counter").expect("Counter");
    let field = file.find_member(counter, "n", DeclKind::Field);

    let in_lambda = find_node(&file, "n", 0, is_name);
    let resolved = file.resolve(in_lambda).expect("lambda param");
    assert_eq!(file.decl(resolved).kind, DeclKind::Parameter);

    let in_loop = find_node(&file, "n", 1, is_name);
    assert_eq!(file.resolve(in_loop), field);
    let i = find_node(&file, "i", 0, is_name);
    assert_eq!(file.decl(file.resolve(i).expect("i")).kind, DeclKind::Local);
}

#[test]
fn syntax_errors_are_reported_with_a_span() {
    let source = "class A { int x = ; }";
    let err = lower(source).unwrap_err();
    let ParseError::Syntax { span } = err else {
        panic!("expected syntax error, got {err:?}");
    };
    assert!(span.end <= source.len());
}

#[test]
fn qualified_this_is_shadowed_by_inner_names() {
    let source = r#"
class Point {
    int x;
    int y;
    class Node {
        int y;
        int get(int x) { return Point.this.x + x + Point.this.y; }
        int plain() { return Point.this.x; }
    }
}
"#;
    let file = lower(source).expect("lower");
    let point = file.find_class("Point").expect("class");
    let is_access = |n: &Node| matches!(n, Node::FieldAccess { .. });

    // Hidden by the parameter `x`.
    let by_param = find_node(&file, "Point.this.x", 0, is_access);
    assert_eq!(file.resolve(by_param), file.find_member(point, "x", DeclKind::Field));
    assert!(file.is_shadowed(by_param));

    // Hidden by the field `Node.y`.
    let by_field = find_node(&file, "Point.this.y", 0, is_access);
    assert_eq!(file.resolve(by_field), file.find_member(point, "y", DeclKind::Field));
    assert!(file.is_shadowed(by_field));

    let visible = find_node(&file, "Point.this.x", 1, is_access);
    assert!(!file.is_shadowed(visible));
}
