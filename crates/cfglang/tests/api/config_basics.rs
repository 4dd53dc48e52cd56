use crate::helper::{config, load_err, lookup, lookup_err, string};
use cfglang::{CfgError, Config, Location, Value};

#[test]
fn scalar_literals_in_all_forms() {
    let cfg = config(concat!(
        "root: 1\n",
        "stream: 1.7\n",
        "neg: -1\n",
        "posexponent: 2.0999999e-08\n",
        "hexadecimal_integer: 0x123\n",
        "binary_integer: 0b000100100011\n",
        "octal_integer: 0o123\n",
        "legacy_octal: 0123\n",
        "imaginary: 4.3j\n",
        "yes: true\n",
        "no: false\n",
        "nothing: null\n",
        "message: 'hi'\n",
    ));
    assert_eq!(lookup(&cfg, "root"), Value::Integer(1));
    assert_eq!(lookup(&cfg, "stream"), Value::Float(1.7));
    assert_eq!(lookup(&cfg, "neg"), Value::Integer(-1));
    assert_eq!(lookup(&cfg, "posexponent"), Value::Float(2.0999999e-8));
    assert_eq!(lookup(&cfg, "hexadecimal_integer"), Value::Integer(291));
    assert_eq!(lookup(&cfg, "binary_integer"), Value::Integer(291));
    assert_eq!(lookup(&cfg, "octal_integer"), Value::Integer(83));
    assert_eq!(lookup(&cfg, "legacy_octal"), Value::Integer(83));
    match lookup(&cfg, "imaginary") {
        Value::Complex(z) => {
            assert_eq!(z.re, 0.0);
            assert_eq!(z.im, 4.3);
        }
        other => panic!("expected complex, got {other:?}"),
    }
    assert_eq!(lookup(&cfg, "yes"), Value::Bool(true));
    assert_eq!(lookup(&cfg, "no"), Value::Bool(false));
    assert_eq!(lookup(&cfg, "nothing"), Value::None);
    assert_eq!(lookup(&cfg, "message"), string("hi"));
}

#[test]
fn nested_access_by_path() {
    let cfg = config("server: { net: { host: 'h', port: 80 }, tags: ['a', 'b'] }");
    assert_eq!(lookup(&cfg, "server.net.port"), Value::Integer(80));
    assert_eq!(lookup(&cfg, "server.tags[1]"), string("b"));
    assert_eq!(lookup(&cfg, "server.tags[-1]"), string("b"));
}

#[test]
fn missing_keys_raise_or_default() {
    let cfg = config("a: 1");
    let error = lookup_err(&cfg, "missing");
    assert_eq!(error.to_string(), "not found in configuration: missing");

    let error = lookup_err(&cfg, "a.b.c");
    assert!(error.to_string().starts_with("invalid container for keyed access:"));

    assert_eq!(
        cfg.get_or("missing", Value::Integer(42)).expect("default"),
        Value::Integer(42)
    );
    assert_eq!(
        cfg.get_or("missing.path", string("d")).expect("default"),
        string("d")
    );
    assert_eq!(cfg.get_or("a", Value::Integer(0)).expect("present"), Value::Integer(1));
}

#[test]
fn unloaded_config_has_no_data() {
    let cfg = Config::new();
    let error = cfg.get("anything").expect_err("no data yet");
    assert_eq!(error.to_string(), "no data in configuration");
    let error = cfg
        .get_or("anything", Value::None)
        .expect_err("defaults do not mask an unloaded config");
    assert_eq!(error.to_string(), "no data in configuration");
}

#[test]
fn duplicate_keys_are_rejected_at_load_time() {
    let error = load_err("foo: 1\nbar: 2\nbaz: 3\nfoo: 4\n");
    assert_eq!(
        error.to_string(),
        "duplicate key foo seen at (4, 1) (previously at (1, 1))"
    );
    match error {
        CfgError::Config(inner) => assert_eq!(inner.location, Some(Location::new(4, 1))),
        other => panic!("expected config error, got {other:?}"),
    }

    // Nested literals are checked too.
    let error = load_err("outer: { x: 1, x: 2 }");
    assert!(error.to_string().starts_with("duplicate key x seen at"));
}

#[test]
fn duplicates_allowed_when_disabled_later_wins() {
    let mut cfg = Config::new();
    cfg.no_duplicates = false;
    cfg.load(std::io::Cursor::new(b"foo: 1\nfoo: 2\n".to_vec()))
        .expect("load with duplicates allowed");
    assert_eq!(lookup(&cfg, "foo"), Value::Integer(2));
}

#[test]
fn root_must_be_a_mapping() {
    let error = load_err("[1, 2, 3]");
    assert_eq!(error.to_string(), "root configuration must be a mapping");
}

#[test]
fn context_supplies_variables() {
    let mut cfg = Config::new();
    cfg.context.insert("workers".into(), Value::Integer(4));
    cfg.load(std::io::Cursor::new(b"total: workers * 2\n".to_vec()))
        .expect("load");
    assert_eq!(lookup(&cfg, "total"), Value::Integer(8));

    let cfg = config("total: workers * 2");
    let error = lookup_err(&cfg, "total");
    assert_eq!(error.to_string(), "unknown variable: workers");
}

#[test]
fn as_dict_is_idempotent_and_ordered() {
    let cfg = config("b: 1\na: { y: 2, x: 3 }\nc: [1, 'two']");
    let first = cfg.as_dict().expect("first pass");
    let second = cfg.as_dict().expect("second pass");
    assert_eq!(first, second);

    let keys: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    assert_eq!(keys, vec!["b", "a", "c"]);
    match first.get("a") {
        Some(Value::Mapping(inner)) => {
            let inner_keys: Vec<&str> = inner.keys().map(|k| k.as_str()).collect();
            assert_eq!(inner_keys, vec!["y", "x"]);
        }
        other => panic!("expected mapping, got {other:?}"),
    }
}

#[test]
fn repeated_lookups_agree_with_and_without_cache() {
    let source = "a: { b: [1, {c: 'd'}] }";
    let cfg = config(source);
    assert_eq!(lookup(&cfg, "a.b[1].c"), lookup(&cfg, "a.b[1].c"));

    let mut cached = Config::new();
    cached.set_cache(true);
    cached
        .load(std::io::Cursor::new(source.as_bytes().to_vec()))
        .expect("load");
    let first = lookup(&cached, "a.b[1].c");
    let second = lookup(&cached, "a.b[1].c");
    assert_eq!(first, second);
    assert_eq!(first, string("d"));
}

#[test]
fn out_of_range_indices() {
    let cfg = config("xs: [1, 2, 3]");
    let error = lookup_err(&cfg, "xs[3]");
    assert_eq!(
        error.to_string(),
        "index out of range: is 3, must be between 0 and 2"
    );
    let error = lookup_err(&cfg, "xs[-4]");
    assert_eq!(
        error.to_string(),
        "index out of range: is -4, must be between 0 and 2"
    );
    assert_eq!(lookup(&cfg, "xs[-3]"), Value::Integer(1));

    let error = lookup_err(&cfg, "xs['k']");
    assert_eq!(error.to_string(), "index is not an integer, but String");

    let cfg = config("m: {a: 1}");
    let error = lookup_err(&cfg, "m[0]");
    assert_eq!(
        error.to_string(),
        "invalid container for numeric index: Mapping"
    );
}
