use std::io::Cursor;

use crate::helper::{config, load_err, lookup};
use cfglang::ast::AstNode;
use cfglang::parser::Parser;
use cfglang::{Location, TokenKind, Value};

fn parse_expr(source: &str) -> AstNode {
    let mut parser = Parser::new(Cursor::new(source.as_bytes().to_vec())).expect("tokenizer");
    parser.expr().expect("parse failed")
}

fn parse_container(source: &str) -> AstNode {
    let mut parser = Parser::new(Cursor::new(source.as_bytes().to_vec())).expect("tokenizer");
    parser.container().expect("parse failed")
}

#[test]
fn container_accepts_all_top_level_forms() {
    assert!(matches!(parse_container("{a: 1}"), AstNode::Mapping(_)));
    assert!(matches!(parse_container("[1, 2]"), AstNode::List(_)));
    assert!(matches!(parse_container("a: 1\nb: 2"), AstNode::Mapping(_)));
    assert!(matches!(parse_container("\n\n a: 1"), AstNode::Mapping(_)));
    // Empty input is an empty mapping.
    match parse_container("") {
        AstNode::Mapping(mapping) => assert!(mapping.entries.is_empty()),
        other => panic!("expected mapping, got {other:?}"),
    }
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    match parse_expr("1 + 2 * 3") {
        AstNode::Binary(add) => {
            assert_eq!(add.op, TokenKind::Plus);
            match &add.rhs {
                AstNode::Binary(mul) => assert_eq!(mul.op, TokenKind::Star),
                other => panic!("expected product on the right, got {other:?}"),
            }
        }
        other => panic!("expected sum, got {other:?}"),
    }
}

#[test]
fn power_is_right_associative() {
    match parse_expr("2 ** 3 ** 2") {
        AstNode::Binary(outer) => {
            assert_eq!(outer.op, TokenKind::Power);
            assert!(matches!(&outer.lhs, AstNode::Token(t) if t.kind == TokenKind::IntegerNumber));
            match &outer.rhs {
                AstNode::Binary(inner) => assert_eq!(inner.op, TokenKind::Power),
                other => panic!("expected nested power, got {other:?}"),
            }
        }
        other => panic!("expected power, got {other:?}"),
    }
}

#[test]
fn negated_comparisons_parse_as_negations() {
    match parse_expr("a is not b") {
        AstNode::Unary(not) => {
            assert_eq!(not.op, TokenKind::Not);
            assert!(matches!(&not.operand, AstNode::Binary(b) if b.op == TokenKind::Is));
        }
        other => panic!("expected negation, got {other:?}"),
    }
    match parse_expr("a not in b") {
        AstNode::Unary(not) => {
            assert_eq!(not.op, TokenKind::Not);
            assert!(matches!(&not.operand, AstNode::Binary(b) if b.op == TokenKind::In));
        }
        other => panic!("expected negation, got {other:?}"),
    }
}

#[test]
fn reference_atom_wraps_a_primary() {
    match parse_expr("${a.b[0]}") {
        AstNode::Unary(reference) => {
            assert_eq!(reference.op, TokenKind::Dollar);
            assert!(matches!(&reference.operand, AstNode::Binary(b) if b.op == TokenKind::LeftBracket));
        }
        other => panic!("expected reference, got {other:?}"),
    }
}

#[test]
fn trailing_commas_and_newlines_are_tolerated() {
    let cfg = config("{a: 1, b: 2,}");
    assert_eq!(lookup(&cfg, "b"), Value::Integer(2));

    let cfg = config("x: [\n  1,\n  2,\n  3,\n]\n");
    assert_eq!(
        lookup(&cfg, "x"),
        Value::List(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)])
    );

    let cfg = config("\n\na: 1\n\n\nb: 2\n");
    assert_eq!(lookup(&cfg, "a"), Value::Integer(1));
}

#[test]
fn adjacent_string_keys_concatenate() {
    let cfg = config("'ab' 'cd': 3");
    assert_eq!(lookup(&cfg, "abcd"), Value::Integer(3));
}

#[test]
fn assignment_separator_is_accepted() {
    let cfg = config("a = 1\nb = 'two'");
    assert_eq!(lookup(&cfg, "a"), Value::Integer(1));
    assert_eq!(lookup(&cfg, "b"), Value::String("two".to_string()));
}

#[test]
fn parser_error_messages() {
    let cases = [
        ("123", "unexpected token for container: IntegerNumber"),
        ("{1: 2}", "unexpected type for key: IntegerNumber"),
        ("a", "expected key-value separator, found EOF"),
        ("a:", "unexpected when looking for value: EOF"),
        ("a: 1 2", "unexpected following value: IntegerNumber"),
        ("a: [1, 2", "expected RightBracket but got EOF"),
        ("a: {b: 1", "expected RightCurly but got EOF"),
        ("a: 1\n}", "unexpected: RightCurly"),
        (
            "a: x[1, 2]",
            "invalid index at (1, 5): expected 1 expression, found 2",
        ),
    ];
    for (source, expected) in cases {
        let error = load_err(source);
        assert_eq!(error.to_string(), expected, "message for {source:?}");
    }
}

#[test]
fn parser_errors_carry_locations() {
    let error = load_err("a: 1\nb: [1, 2");
    assert_eq!(error.location(), Some(Location::new(2, 9)));
}
