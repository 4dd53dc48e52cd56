use crate::helper::{config, lookup, lookup_err, strings};
use cfglang::{Config, Value};

fn sliceable() -> Config {
    config("test_list: ['a', 'b', 'c', 'd', 'e', 'f', 'g']")
}

#[test]
fn full_slices_equal_the_list() {
    let cfg = sliceable();
    let full = strings(&["a", "b", "c", "d", "e", "f", "g"]);
    assert_eq!(lookup(&cfg, "test_list[:]"), full);
    assert_eq!(lookup(&cfg, "test_list[::]"), full);
    assert_eq!(lookup(&cfg, "test_list[:20]"), full);
    assert_eq!(lookup(&cfg, "test_list"), full);
}

#[test]
fn negative_step_walks_backwards() {
    let cfg = sliceable();
    assert_eq!(lookup(&cfg, "test_list[-2:2:-1]"), strings(&["f", "e", "d"]));
    assert_eq!(
        lookup(&cfg, "test_list[::-1]"),
        strings(&["g", "f", "e", "d", "c", "b", "a"])
    );
}

#[test]
fn strided_slices_compose() {
    let cfg = sliceable();
    assert_eq!(
        lookup(&cfg, "test_list[::2]"),
        strings(&["a", "c", "e", "g"])
    );
    assert_eq!(lookup(&cfg, "test_list[::2][::3]"), strings(&["a", "g"]));
}

#[test]
fn bounded_slices() {
    let cfg = sliceable();
    assert_eq!(lookup(&cfg, "test_list[1:3]"), strings(&["b", "c"]));
    assert_eq!(lookup(&cfg, "test_list[4:]"), strings(&["e", "f", "g"]));
    assert_eq!(lookup(&cfg, "test_list[-3:]"), strings(&["e", "f", "g"]));
    assert_eq!(lookup(&cfg, "test_list[2:2]"), strings(&[]));
}

#[test]
fn slice_misuse_is_reported() {
    let cfg = config("test_list: [1, 2]\nm: {a: 1}\ns: 'abc'");
    let error = lookup_err(&cfg, "test_list[::0]");
    assert_eq!(error.to_string(), "step cannot be zero");

    let error = lookup_err(&cfg, "test_list[::'x']");
    assert_eq!(error.to_string(), "step is not an integer, but String");

    let error = lookup_err(&cfg, "m[:]");
    assert_eq!(error.to_string(), "invalid container for slicing: Mapping");

    let error = lookup_err(&cfg, "s[:]");
    assert_eq!(error.to_string(), "invalid container for slicing: String");
}

#[test]
fn negative_indices_count_from_the_end() {
    let cfg = sliceable();
    let full: Vec<Value> = match lookup(&cfg, "test_list") {
        Value::List(items) => items,
        other => panic!("expected list, got {other:?}"),
    };
    let n = full.len() as i64;
    for i in 0..n {
        let positive = lookup(&cfg, &format!("test_list[{i}]"));
        let negative = lookup(&cfg, &format!("test_list[{}]", i - n));
        assert_eq!(positive, negative, "index {i}");
    }
}
