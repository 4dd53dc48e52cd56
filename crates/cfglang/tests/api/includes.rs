use crate::helper::{data_dir, lookup, lookup_err, string};
use cfglang::{Config, Value};

fn main_config() -> Config {
    let mut config = Config::from_file(data_dir().join("main.cfg")).expect("load main.cfg");
    config.include_path.push(data_dir().join("base"));
    config
}

#[test]
fn includes_resolve_through_the_search_path() {
    let cfg = main_config();
    assert_eq!(
        lookup(&cfg, "logging.appenders.file.filename"),
        string("run/server.log")
    );
    assert_eq!(lookup(&cfg, "logging.appenders.file.append"), Value::Bool(true));
    assert_eq!(lookup(&cfg, "logging.root.appenders[1]"), string("console"));
}

#[test]
fn list_rooted_includes_become_lists() {
    let cfg = main_config();
    assert_eq!(lookup(&cfg, "items[0]"), string("alpha"));
    assert_eq!(lookup(&cfg, "items[2].port"), Value::Integer(8080));
    match lookup(&cfg, "items") {
        Value::List(items) => assert_eq!(items.len(), 3),
        other => panic!("expected list, got {other:?}"),
    }
}

#[test]
fn missing_includes_are_located_errors() {
    let cfg = main_config();
    let mut probe = Config::from_source("nowhere: @\"does-not-exist.cfg\"").expect("load");
    probe.include_path = cfg.include_path.clone();
    let error = lookup_err(&probe, "nowhere");
    assert_eq!(error.to_string(), "unable to locate does-not-exist.cfg");
}

#[test]
fn self_inclusion_is_rejected() {
    let cfg = Config::from_file(data_dir().join("selfref.cfg")).expect("load selfref.cfg");
    let error = lookup_err(&cfg, "me");
    assert_eq!(
        error.to_string(),
        "configuration cannot include itself: selfref.cfg"
    );
}

#[test]
fn sub_configs_answer_their_own_queries() {
    let cfg = main_config();
    let logging = cfg.get_sub_config("logging").expect("sub-config");
    assert_eq!(lookup(&logging, "root.level"), string("DEBUG"));
    assert!(logging.path().is_some());
    assert!(logging.parent().is_some());

    let error = cfg.get_sub_config("greeting").expect_err("not a sub-config");
    assert_eq!(error.to_string(), "not a sub-configuration: greeting");
}

#[test]
fn include_values_unwrap_to_mappings() {
    let cfg = main_config();
    match lookup(&cfg, "logging") {
        Value::Mapping(map) => {
            assert!(map.contains_key("appenders"));
            assert!(map.contains_key("root"));
        }
        other => panic!("expected mapping, got {other:?}"),
    }

    let whole = cfg.as_dict().expect("as_dict");
    assert!(whole.contains_key("logging"));
    assert!(whole.contains_key("items"));
    assert_eq!(whole.get("greeting"), Some(&string("hello")));
}
