use crate::helper::{config, lookup, lookup_err, string};
use cfglang::Value;

#[test]
fn arithmetic_over_numbers() {
    let cfg = config(concat!(
        "sum: 1 + 2\n",
        "mixed: 1 + 0.5\n",
        "difference: 7 - 9\n",
        "product: 6 * 7\n",
        "quotient: 7 / 2\n",
        "exact: 4 / 2\n",
        "floor: 7 // 2\n",
        "remainder: 7 % 3\n",
        "grouped: (1 + 2) * 3\n",
        "negated: -(1 + 2)\n",
    ));
    assert_eq!(lookup(&cfg, "sum"), Value::Integer(3));
    assert_eq!(lookup(&cfg, "mixed"), Value::Float(1.5));
    assert_eq!(lookup(&cfg, "difference"), Value::Integer(-2));
    assert_eq!(lookup(&cfg, "product"), Value::Integer(42));
    assert_eq!(lookup(&cfg, "quotient"), Value::Float(3.5));
    // A true division always produces a float.
    assert_eq!(lookup(&cfg, "exact"), Value::Float(2.0));
    assert_eq!(lookup(&cfg, "floor"), Value::Integer(3));
    assert_eq!(lookup(&cfg, "remainder"), Value::Integer(1));
    assert_eq!(lookup(&cfg, "grouped"), Value::Integer(9));
    assert_eq!(lookup(&cfg, "negated"), Value::Integer(-3));
}

#[test]
fn powers() {
    let cfg = config("a: 2 ** 10\nb: 2 ** -1\nc: 2.0 ** 3\nd: 2 ** 3 ** 2\n");
    assert_eq!(lookup(&cfg, "a"), Value::Integer(1024));
    assert_eq!(lookup(&cfg, "b"), Value::Float(0.5));
    assert_eq!(lookup(&cfg, "c"), Value::Float(8.0));
    assert_eq!(lookup(&cfg, "d"), Value::Integer(512));
}

#[test]
fn complex_arithmetic() {
    let cfg = config("a: 1j + 2\nb: 1j * 1j\nc: 2 ** 0.5\n");
    match lookup(&cfg, "a") {
        Value::Complex(z) => {
            assert_eq!(z.re, 2.0);
            assert_eq!(z.im, 1.0);
        }
        other => panic!("expected complex, got {other:?}"),
    }
    match lookup(&cfg, "b") {
        Value::Complex(z) => {
            assert_eq!(z.re, -1.0);
            assert_eq!(z.im, 0.0);
        }
        other => panic!("expected complex, got {other:?}"),
    }
    match lookup(&cfg, "c") {
        Value::Float(x) => assert!((x - std::f64::consts::SQRT_2).abs() < 1e-12),
        other => panic!("expected float, got {other:?}"),
    }
}

#[test]
fn bitwise_and_shifts() {
    let cfg = config(concat!(
        "a: 0x0F & 0x3\n",
        "b: 0x0F | 0x30\n",
        "c: 0x0F ^ 0x3\n",
        "d: 1 << 4\n",
        "e: 256 >> 4\n",
        "f: ~0\n",
    ));
    assert_eq!(lookup(&cfg, "a"), Value::Integer(3));
    assert_eq!(lookup(&cfg, "b"), Value::Integer(0x3F));
    assert_eq!(lookup(&cfg, "c"), Value::Integer(0xC));
    assert_eq!(lookup(&cfg, "d"), Value::Integer(16));
    assert_eq!(lookup(&cfg, "e"), Value::Integer(16));
    assert_eq!(lookup(&cfg, "f"), Value::Integer(-1));
}

#[test]
fn strings_and_lists_concatenate() {
    let cfg = config("s: 'foo' + 'bar'\nl: [1, 2] + [3]\n");
    assert_eq!(lookup(&cfg, "s"), string("foobar"));
    assert_eq!(
        lookup(&cfg, "l"),
        Value::List(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)])
    );
}

#[test]
fn mappings_merge_deeply() {
    let cfg = config(concat!(
        "merged: {a: {x: 1, y: 2}, b: 2} + {a: {y: 20, z: 30}, c: 3}\n",
        "piped: {a: 1} | {b: 2}\n",
        "removed: {a: 1, b: 2} - {b: 0}\n",
    ));
    match lookup(&cfg, "merged") {
        Value::Mapping(map) => {
            match map.get("a") {
                Some(Value::Mapping(inner)) => {
                    assert_eq!(inner.get("x"), Some(&Value::Integer(1)));
                    assert_eq!(inner.get("y"), Some(&Value::Integer(20)));
                    assert_eq!(inner.get("z"), Some(&Value::Integer(30)));
                }
                other => panic!("expected nested mapping, got {other:?}"),
            }
            assert_eq!(map.get("b"), Some(&Value::Integer(2)));
            assert_eq!(map.get("c"), Some(&Value::Integer(3)));
        }
        other => panic!("expected mapping, got {other:?}"),
    }
    match lookup(&cfg, "piped") {
        Value::Mapping(map) => {
            assert_eq!(map.get("a"), Some(&Value::Integer(1)));
            assert_eq!(map.get("b"), Some(&Value::Integer(2)));
        }
        other => panic!("expected mapping, got {other:?}"),
    }
    match lookup(&cfg, "removed") {
        Value::Mapping(map) => {
            assert_eq!(map.get("a"), Some(&Value::Integer(1)));
            assert!(map.get("b").is_none());
        }
        other => panic!("expected mapping, got {other:?}"),
    }
}

#[test]
fn merge_is_associative_for_distinct_leaves() {
    let cfg = config(concat!(
        "a: {p: {x: 1}}\n",
        "b: {p: {y: 2}}\n",
        "c: {p: {z: 3}}\n",
        "left: (${a} + ${b}) + ${c}\n",
        "right: ${a} + (${b} + ${c})\n",
    ));
    assert_eq!(lookup(&cfg, "left"), lookup(&cfg, "right"));
}

#[test]
fn logic_short_circuits_on_booleans() {
    let cfg = config(concat!(
        "yes: true or ${does.not.exist}\n",
        "no: false and ${does.not.exist}\n",
        "both: true and false\n",
        "either: false or true\n",
        "negated: not true\n",
    ));
    assert_eq!(lookup(&cfg, "yes"), Value::Bool(true));
    assert_eq!(lookup(&cfg, "no"), Value::Bool(false));
    assert_eq!(lookup(&cfg, "both"), Value::Bool(false));
    assert_eq!(lookup(&cfg, "either"), Value::Bool(true));
    assert_eq!(lookup(&cfg, "negated"), Value::Bool(false));
}

#[test]
fn comparisons_and_membership() {
    let cfg = config(concat!(
        "lt: 1 < 2\n",
        "le: 2 <= 2\n",
        "gt: 'b' > 'a'\n",
        "eq: 1 == 1.0\n",
        "ne: 1 != 2\n",
        "alt: 1 <> 2\n",
        "same: 'x' is 'x'\n",
        "differs: 'x' is not 'y'\n",
        "within: 'a' in 'cat'\n",
        "outside: 'x' not in 'cat'\n",
        "listed: 2 in [1, 2, 3]\n",
        "keyed: 'a' in {a: 1}\n",
    ));
    for key in [
        "lt", "le", "gt", "eq", "ne", "alt", "same", "differs", "within", "outside", "listed",
        "keyed",
    ] {
        assert_eq!(lookup(&cfg, key), Value::Bool(true), "value of {key}");
    }
}

#[test]
fn type_mismatches_report_both_kinds() {
    let cases = [
        ("x: 1 + 'a'", "cannot add Integer and String"),
        ("x: {a: 1} - 2", "cannot subtract Integer from Mapping"),
        ("x: 'a' * 2", "cannot multiply String by Integer"),
        ("x: [1] / 2", "cannot divide List by Integer"),
        ("x: 1.5 // 2", "cannot integer-divide Float by Integer"),
        ("x: 'a' << 1", "cannot left-shift String by Integer"),
        ("x: 1 & true", "cannot bitwise-and Integer and Boolean"),
        ("x: null < 1", "cannot compare NoneValue and Integer"),
        ("x: 1 in 2", "cannot test membership of Integer in Integer"),
        ("x: -'a'", "cannot negate String"),
        ("x: ~1.5", "cannot bitwise-complement Float"),
    ];
    for (source, expected) in cases {
        let cfg = config(source);
        let error = lookup_err(&cfg, "x");
        assert_eq!(error.to_string(), expected, "message for {source}");
    }
}

#[test]
fn division_by_zero_is_reported() {
    for source in ["x: 1 // 0", "x: 1 % 0"] {
        let cfg = config(source);
        let error = lookup_err(&cfg, "x");
        assert_eq!(error.to_string(), "division by zero", "message for {source}");
    }
}

#[test]
fn list_values_evaluate_lazily_but_fully() {
    let cfg = config("base: 2\nxs: [${base}, ${base} * 10, 'three']\n");
    assert_eq!(
        lookup(&cfg, "xs"),
        Value::List(vec![Value::Integer(2), Value::Integer(20), string("three")])
    );
    assert_eq!(lookup(&cfg, "xs[1]"), Value::Integer(20));
}
