use cfglang::ast::AstNode;
use cfglang::{is_identifier, parse_path, to_source, unpack_path, TokenKind};

#[test]
fn paths_round_trip_through_source() {
    for source in [
        "a",
        "a.b.c",
        "a.b[0]",
        "a[1].b",
        "a.b['key with spaces']",
        "servers[1:3]",
        "servers[::2]",
        "servers[-2:2:-1]",
        "servers[:20]",
    ] {
        let parsed = parse_path(source).unwrap_or_else(|e| panic!("parse of {source}: {e}"));
        assert_eq!(to_source(&parsed), source, "round trip of {source}");
    }
}

#[test]
fn unpack_reproduces_head_and_tails() {
    let parsed = parse_path("a.b[2][1:2]").expect("parse");
    let elements = unpack_path(&parsed).expect("unpack");
    let ops: Vec<TokenKind> = elements.iter().map(|(op, _)| *op).collect();
    assert_eq!(
        ops,
        vec![
            TokenKind::Dot,
            TokenKind::Dot,
            TokenKind::LeftBracket,
            TokenKind::Colon,
        ]
    );
    match &elements[0].1 {
        AstNode::Token(token) => assert_eq!(token.text, "a"),
        other => panic!("expected head word, got {other:?}"),
    }
    match &elements[2].1 {
        AstNode::Token(token) => assert_eq!(token.text, "2"),
        other => panic!("expected index literal, got {other:?}"),
    }
    assert!(matches!(&elements[3].1, AstNode::Slice(_)));
}

#[test]
fn invalid_paths_are_rejected() {
    let error = parse_path("foo bar").expect_err("trailing tokens");
    assert_eq!(error.to_string(), "invalid path: foo bar");

    let error = parse_path("[1]").expect_err("must start with a word");
    assert_eq!(error.to_string(), "invalid path: [1]");

    let error = parse_path("").expect_err("empty input");
    assert_eq!(error.to_string(), "invalid path: ");

    let error = parse_path("foo.").expect_err("dangling dot");
    assert_eq!(error.to_string(), "expected Word but got EOF");

    let error = parse_path("foo[1, 2]").expect_err("multiple indices");
    assert_eq!(
        error.to_string(),
        "invalid index at (1, 4): expected 1 expression, found 2"
    );
}

#[test]
fn identifier_classification() {
    for text in ["foo", "_x1", "Étage", "a_b_c", "x9"] {
        assert!(is_identifier(text), "{text} should be an identifier");
    }
    for text in ["", "9x", "a-b", "a b", "foo.", "a.b", "$a"] {
        assert!(!is_identifier(text), "{text} should not be an identifier");
    }
}
