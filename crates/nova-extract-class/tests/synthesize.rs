use insta::assert_snapshot;
use nova_extract_class::{
    check_extraction, synthesize, synthesize_with_report, Classifier, CodeStyleNaming,
    ExtractClassError, ExtractionContext, MemberKind, MemberSet, MemberSetBuilder, NamingConfig,
    Ownership, RewriteKind,
};
use nova_extract_hir::{DeclId, DeclKind, Node, NodeId, SourceFile};
use nova_extract_syntax::lower;
use pretty_assertions::assert_eq;

fn context(
    file: &SourceFile,
    class: &str,
    name: &str,
    select: impl FnOnce(&mut MemberSetBuilder<'_>) -> Result<(), ExtractClassError>,
) -> ExtractionContext {
    let mut builder = MemberSetBuilder::for_class(file, class).expect("class");
    select(&mut builder).expect("selection");
    ExtractionContext::new(file, builder.class(), name, builder.build())
}

fn fields(file: &SourceFile, class: &str, names: &[&str]) -> Vec<DeclId> {
    let class = file.find_class(class).expect("class");
    names
        .iter()
        .map(|name| file.find_member(class, name, DeclKind::Field).expect(name))
        .collect()
}

#[test]
fn delegates_reads_of_fields_left_behind() {
    let source = r#"
class Point {
    int x;
    int y;

    int distanceSq() {
        return x * x + y * y;
    }
}
"#;
    let file = lower(source).expect("lower");
    let ctx = context(&file, "Point", "ExtractedPoint", |b| {
        b.method("distanceSq")?;
        Ok(())
    });
    let naming = CodeStyleNaming::default();

    let back_pointer = ctx.back_pointer(&file, &naming);
    assert!(back_pointer.required);
    assert_eq!(back_pointer.field_name, "point");
    assert_eq!(back_pointer.parameter_name, "point");

    assert_eq!(
        synthesize(&file, &ctx, &naming),
        r#"public class ExtractedPoint {
    private final Point point;

    public ExtractedPoint(Point point) {
        this.point = point;
    }

    int distanceSq() {
        return point.getX() * point.getX() + point.getY() * point.getY();
    }
}
"#
    );
}

#[test]
fn non_constant_initializer_becomes_constructor_parameter() {
    let source = r#"
class Counter {
    private int count = computeInitial();
    private int step = 2;

    static int computeInitial() { return 1; }

    void tick() {
        count += step;
    }
}
"#;
    let file = lower(source).expect("lower");
    let ctx = context(&file, "Counter", "Ticker", |b| {
        b.field("count")?.field("step")?.method("tick")?;
        Ok(())
    });
    let naming = CodeStyleNaming::default();

    assert_eq!(
        synthesize(&file, &ctx, &naming),
        r#"public class Ticker {
    private int count;
    private int step = 2;

    public Ticker(int count) {
        this.count = count;
    }

    void tick() {
        count += step;
    }
}
"#
    );
    assert!(!ctx.back_pointer(&file, &naming).required);
}

#[test]
fn writes_to_delegated_fields_go_through_setters() {
    let source = r#"
class Account {
    private long total;
    private int ops;

    void deposit(long amount) {
        total += amount * 2;
        ops++;
        total = total - 1;
    }
}
"#;
    let file = lower(source).expect("lower");
    let ctx = context(&file, "Account", "Ledger", |b| {
        b.method("deposit")?;
        Ok(())
    });
    let naming = CodeStyleNaming::default();

    assert_snapshot!(
        synthesize(&file, &ctx, &naming),
        @r###"
public class Ledger {
    private final Account account;

    public Ledger(Account account) {
        this.account = account;
    }

    void deposit(long amount) {
        account.setTotal(account.getTotal() + (amount * 2));
        account.setOps(account.getOps() + 1);
        account.setTotal(account.getTotal() - 1);
    }
}
"###
    );
    assert!(check_extraction(&file, &ctx, &naming).is_empty());
}

#[test]
fn back_pointer_name_avoids_selected_fields() {
    let source = r#"
class Point {
    int point;
    int x;

    int norm() {
        return x + point;
    }
}
"#;
    let file = lower(source).expect("lower");
    let ctx = context(&file, "Point", "PointMath", |b| {
        b.field("point")?.method("norm")?;
        Ok(())
    });
    let naming = CodeStyleNaming::default();

    assert_eq!(
        synthesize(&file, &ctx, &naming),
        r#"public class PointMath {
    private final Point point1;
    private int point;

    public PointMath(Point point1) {
        this.point1 = point1;
    }

    int norm() {
        return point1.getX() + point;
    }
}
"#
    );
}

#[test]
fn static_members_and_calls_are_qualified() {
    let source = r#"
package app;

class Config {
    static final int LIMIT = 10;
    static int created;
    String name;

    static String prefix() { return "cfg"; }
    String label() { return name; }

    String describe(int n) {
        if (n > LIMIT) {
            created = created + 1;
        }
        return prefix() + label() + this.label();
    }
}
"#;
    let file = lower(source).expect("lower");
    let ctx = context(&file, "Config", "Describer", |b| {
        b.method("describe")?;
        Ok(())
    });
    let naming = CodeStyleNaming::default();

    assert_eq!(
        synthesize(&file, &ctx, &naming),
        r#"package app;

public class Describer {
    private final app.Config config;

    public Describer(app.Config config) {
        this.config = config;
    }

    String describe(int n) {
        if (n > app.Config.LIMIT) {
            app.Config.created = app.Config.created + 1;
        }
        return app.Config.prefix() + config.label() + config.label();
    }
}
"#
    );
}

#[test]
fn moved_calls_stay_unqualified_unless_overridden() {
    let source = r#"
class Base {
    int area() { return 0; }
}
class Shape extends Base {
    int sides;
    int area() { return sides; }
    int twice() { return area() + helper(); }
    int helper() { return 1; }
}
"#;
    let file = lower(source).expect("lower");
    let ctx = context(&file, "Shape", "ShapeMath", |b| {
        b.field("sides")?.method("area")?.method("twice")?.method("helper")?;
        Ok(())
    });
    let naming = CodeStyleNaming::default();
    let text = synthesize(&file, &ctx, &naming);

    // `area` overrides `Base.area`, so it is still reached through the original.
    assert!(text.contains("int twice() { return shape.area() + helper(); }"), "{text}");
    assert!(text.contains("int area() { return sides; }"), "{text}");
    assert!(text.contains("private final Shape shape;"), "{text}");
}

#[test]
fn inner_classes_move_and_can_become_public() {
    let source = r#"
class Shop {
    static class Item {
        int price;
    }
    private static class Cart {
        Item first;
        int size() { return 0; }
    }
    Item featured;

    int total(Item item) {
        return item.price;
    }
}
"#;
    let file = lower(source).expect("lower");
    let ctx = context(&file, "Shop", "ShopTotals", |b| {
        b.method("total")?.inner_class("Cart", true)?;
        Ok(())
    });
    let naming = CodeStyleNaming::default();

    assert_eq!(
        synthesize(&file, &ctx, &naming),
        r#"public class ShopTotals {
    public ShopTotals() {
    }

    int total(Shop.Item item) {
        return item.price;
    }

    public static class Cart {
        Shop.Item first;
        int size() { return 0; }
    }
}
"#
    );
}

#[test]
fn accessor_prototypes_follow_their_fields() {
    let source = r#"
class Sensor {
    /** Last reading. */
    @Deprecated
    private final double value = 0.5;
    public static String UNIT = "C";
    transient int samples;
}
"#;
    let file = lower(source).expect("lower");
    let ctx = context(&file, "Sensor", "Reading", |b| {
        b.field("value")?.field("UNIT")?.field("samples")?;
        Ok(())
    })
    .with_getters(fields(&file, "Sensor", &["value", "samples"]))
    .with_setters(fields(&file, "Sensor", &["value"]));
    let naming = CodeStyleNaming::default();

    assert_eq!(
        synthesize(&file, &ctx, &naming),
        r#"public class Reading {
    /** Last reading. */
    @Deprecated
    private double value = 0.5;

    public double getValue() {
        return value;
    }

    public void setValue(double value) {
        this.value = value;
    }

    public static String UNIT = "C";
    private transient int samples;

    public int getSamples() {
        return samples;
    }

    public Reading() {
    }
}
"#
    );
}

#[test]
fn initializers_keep_their_place_between_fields() {
    let source = r#"
class Boot {
    static int order;
    static {
        order = 1;
    }
    static int late = order + 1;
}
"#;
    let file = lower(source).expect("lower");
    let ctx = context(&file, "Boot", "BootState", |b| {
        b.field("order")?.field("late")?.initializer(0)?;
        Ok(())
    });
    let naming = CodeStyleNaming::default();

    assert_eq!(
        synthesize(&file, &ctx, &naming),
        r#"public class BootState {
    private static int order;

    static {
        order = 1;
    }

    private static int late = order + 1;
}
"#
    );
}

#[test]
fn header_carries_type_params_interfaces_and_package() {
    let source = r#"
package geo;

class Box<T extends Comparable<T>> {
    T value;
    abstract static class Visitor {}
    T get() { return value; }
}
"#;
    let file = lower(source).expect("lower");
    let ctx = context(&file, "Box", "Holder", |b| {
        b.method("get")?.all_type_params().interface("java.io.Serializable");
        Ok(())
    })
    .with_package(Some("geo.parts".into()));
    let naming = CodeStyleNaming::default();
    let text = synthesize(&file, &ctx, &naming);

    assert!(text.starts_with(
        "package geo.parts;\n\npublic class Holder<T extends Comparable<T>> implements java.io.Serializable {\n"
    ), "{text}");
    assert!(text.contains("    private final geo.Box<T> box;\n"), "{text}");
    assert!(text.contains("    T get() { return box.getValue(); }\n"), "{text}");
}

#[test]
fn field_prefixes_shape_generated_names() {
    let source = r#"
class Timer {
    long mElapsed;
    void reset() { mElapsed = 0; }
}
"#;
    let file = lower(source).expect("lower");
    let ctx = context(&file, "Timer", "TimerReset", |b| {
        b.method("reset")?;
        Ok(())
    });
    let naming = CodeStyleNaming::new(NamingConfig {
        field_prefix: "m".into(),
        ..NamingConfig::default()
    });

    let text = synthesize(&file, &ctx, &naming);
    assert!(text.contains("private final Timer mTimer;"), "{text}");
    assert!(text.contains("public TimerReset(Timer timer) {\n        mTimer = timer;\n    }"), "{text}");
    assert!(text.contains("void reset() { mTimer.setElapsed(0); }"), "{text}");
}

#[test]
fn report_lists_unresolved_references() {
    let source = r#"
class Job {
    int runs;
    void run() {
        log(runs);
        runs = missing;
    }
}
"#;
    let file = lower(source).expect("lower");
    let ctx = context(&file, "Job", "JobRunner", |b| {
        b.field("runs")?.method("run")?;
        Ok(())
    });
    let naming = CodeStyleNaming::default();

    let report = synthesize_with_report(&file, &ctx, &naming);
    let unresolved: Vec<&str> = report
        .unresolved
        .iter()
        .map(|span| file.span_text(*span))
        .collect();
    assert_eq!(unresolved, vec!["log", "missing"]);
    assert!(!report.back_pointer.required);
    assert!(report.text.contains("        log(runs);\n        runs = missing;\n"));
}

#[test]
fn classification_is_repeatable_over_a_parsed_file() {
    let source = r#"
class Point {
    int x;
    static int ORIGIN;
    int y;
    int sum(int dx) { return x + y + dx + ORIGIN; }
}
"#;
    let file = lower(source).expect("lower");
    let ctx = context(&file, "Point", "PointSum", |b| {
        b.field("y")?.method("sum")?;
        Ok(())
    });
    let classifier = Classifier::new(&file, &ctx);

    let mut names: Vec<(usize, NodeId)> = file
        .nodes()
        .filter(|(_, node)| matches!(node, Node::Name { .. }))
        .map(|(id, node)| (node.span().start, id))
        .collect();
    names.sort();
    let classes: Vec<(String, Ownership)> = names
        .into_iter()
        .map(|(_, id)| (file.node_text(id).to_string(), classifier.classify_reference(id)))
        .collect();
    assert_eq!(
        classes,
        vec![
            ("x".to_string(), Ownership::OriginalInstance(MemberKind::Field)),
            ("y".to_string(), Ownership::Moved),
            ("dx".to_string(), Ownership::Unrelated),
            ("ORIGIN".to_string(), Ownership::OriginalStatic(MemberKind::Field)),
        ]
    );
    for (id, node) in file.nodes() {
        if node.is_reference() {
            assert_eq!(classifier.classify_reference(id), classifier.classify_reference(id));
        }
    }
}

#[test]
fn check_flags_writes_whose_value_is_used() {
    let source = r#"
class Tally {
    int hits;
    int peek() { return hits++; }
    void bump() { hits++; }
}
"#;
    let file = lower(source).expect("lower");
    let ctx = context(&file, "Tally", "TallyOps", |b| {
        b.method("peek")?.method("bump")?;
        Ok(())
    });
    let naming = CodeStyleNaming::default();

    let problems = check_extraction(&file, &ctx, &naming);
    assert_eq!(problems.len(), 1, "{problems:?}");
    let ExtractClassError::IllegalCompoundRewriteContext { field, kind, span } = &problems[0] else {
        panic!("unexpected problem {:?}", problems[0]);
    };
    assert_eq!(field, "hits");
    assert_eq!(*kind, RewriteKind::Increment);
    assert_eq!(file.span_text(*span), "hits++");

    // Synthesis still succeeds.
    let text = synthesize(&file, &ctx, &naming);
    assert!(text.contains("void bump() { tally.setHits(tally.getHits() + 1); }"), "{text}");
}

#[test]
fn check_flags_inconsistent_member_sets() {
    let source = r#"
class A {
    int a;
    int getA() { return a; }
}
class B {
    int b;
}
"#;
    let file = lower(source).expect("lower");
    let a = file.find_class("A").expect("A");
    let a_field = file.find_member(a, "a", DeclKind::Field).expect("a");
    let b_field = fields(&file, "B", &["b"])[0];

    let members = MemberSet {
        fields: vec![a_field, b_field, a_field],
        ..MemberSet::default()
    };
    let ctx = ExtractionContext::new(&file, a, "2Bad", members)
        .with_getters([a_field]);
    let naming = CodeStyleNaming::default();

    let problems = check_extraction(&file, &ctx, &naming);
    assert_eq!(problems[0], ExtractClassError::InvalidClassName("2Bad".into()));
    let inconsistent: Vec<&str> = problems
        .iter()
        .filter_map(|problem| match problem {
            ExtractClassError::MemberSetInconsistency { member, .. } => Some(member.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(inconsistent, vec!["b", "a"]);
}

#[test]
fn unknown_members_are_reported_by_the_builder() {
    let file = lower("class A { int a; }").expect("lower");
    let mut builder = MemberSetBuilder::for_class(&file, "A").expect("A");
    assert_eq!(
        builder.method("missing").err(),
        Some(ExtractClassError::MemberNotFound {
            class: "A".into(),
            member: "missing".into(),
        })
    );
    assert_eq!(
        MemberSetBuilder::for_class(&file, "Nope").err(),
        Some(ExtractClassError::ClassNotFound("Nope".into()))
    );
}

#[test]
fn this_qualified_moved_fields_keep_the_qualifier_only_when_shadowed() {
    let source = r#"
class Point {
    int x;

    void set(int x) { this.x = x; }
    int twice() { return this.x * 2; }

    class Node {
        int get(int x) {
            return Point.this.x + x;
        }
        int plain() {
            return Point.this.x;
        }
    }
}
"#;
    let file = lower(source).expect("lower");
    let ctx = context(&file, "Point", "Extracted", |b| {
        b.field("x")?
            .method("set")?
            .method("twice")?
            .inner_class("Node", false)?;
        Ok(())
    });
    let naming = CodeStyleNaming::default();
    let text = synthesize(&file, &ctx, &naming);

    assert!(text.contains("void set(int x) { this.x = x; }"), "{text}");
    assert!(text.contains("int twice() { return x * 2; }"), "{text}");
    assert!(text.contains("return Extracted.this.x + x;"), "{text}");
    assert!(text.contains("int plain() {\n            return x;\n"), "{text}");
    assert!(!ctx.back_pointer(&file, &naming).required);
}

#[test]
fn constructor_parameters_use_qualified_field_types() {
    let source = r#"
package app;

class Point {
    static class Tag {}

    Tag tag = new Tag();
}
"#;
    let file = lower(source).expect("lower");
    let ctx = context(&file, "Point", "Extracted", |b| {
        b.field("tag")?;
        Ok(())
    });
    let naming = CodeStyleNaming::default();

    assert_eq!(
        synthesize(&file, &ctx, &naming),
        r#"package app;

public class Extracted {
    private app.Point.Tag tag;

    public Extracted(app.Point.Tag tag) {
        this.tag = tag;
    }
}
"#
    );
}

#[test]
fn back_pointer_name_avoids_parameters_of_moved_methods() {
    let source = r#"
class Point {
    int x;

    int norm(Point point) {
        int point1 = point.x;
        return x + point1;
    }
}
"#;
    let file = lower(source).expect("lower");
    let ctx = context(&file, "Point", "PointMath", |b| {
        b.method("norm")?;
        Ok(())
    });
    let naming = CodeStyleNaming::default();

    let back_pointer = ctx.back_pointer(&file, &naming);
    assert!(back_pointer.required);
    assert_eq!(back_pointer.field_name, "point2");

    let text = synthesize(&file, &ctx, &naming);
    assert!(text.contains("private final Point point2;"), "{text}");
    assert!(text.contains("int point1 = point.x;"), "{text}");
    assert!(text.contains("return point2.getX() + point1;"), "{text}");
}

#[test]
fn comments_indented_with_other_whitespace_survive_reindenting() {
    let source = "class Notes {\n    int size;\n\n    int count() {\n        /*\n\u{3000}note\n        */\n        return size;\n    }\n}\n";
    let file = lower(source).expect("lower");
    let ctx = context(&file, "Notes", "NoteCounter", |b| {
        b.field("size")?.method("count")?;
        Ok(())
    });
    let naming = CodeStyleNaming::default();

    let text = synthesize(&file, &ctx, &naming);
    assert!(text.contains("\u{3000}note\n"), "{text}");
    assert!(text.contains("return size;"), "{text}");
}
