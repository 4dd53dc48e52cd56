use crate::ast::AstNode;
use crate::diagnostics::{CfgError, CfgResult};
use crate::parser::Parser;
use crate::tokens::TokenKind;
use std::io::Cursor;

/// Parse a query path such as `a.b[0]` or `servers[1:3]`. The path must
/// begin with a word and consume the whole input.
pub fn parse_path(source: &str) -> CfgResult<AstNode> {
    let mut parser = Parser::new(Cursor::new(source.as_bytes()))?;
    if parser.current().kind != TokenKind::Word {
        return Err(CfgError::parser(
            parser.current().start,
            format!("invalid path: {source}"),
        ));
    }
    let node = parser.primary()?;
    if !parser.at_end() {
        return Err(CfgError::parser(
            parser.current().start,
            format!("invalid path: {source}"),
        ));
    }
    Ok(node)
}

/// Flatten a path into `(operation, operand)` steps. The head word becomes a
/// leading `Dot` step; subscripts yield `LeftBracket` with the index
/// expression, slices yield `Colon` with the slice node.
pub fn unpack_path(node: &AstNode) -> CfgResult<Vec<(TokenKind, AstNode)>> {
    let mut elements = Vec::new();
    flatten(node, &mut elements)?;
    Ok(elements)
}

fn flatten(node: &AstNode, out: &mut Vec<(TokenKind, AstNode)>) -> CfgResult<()> {
    match node {
        AstNode::Token(token) if token.kind == TokenKind::Word => {
            out.push((TokenKind::Dot, node.clone()));
            Ok(())
        }
        AstNode::Binary(binary)
            if matches!(
                binary.op,
                TokenKind::Dot | TokenKind::LeftBracket | TokenKind::Colon
            ) =>
        {
            flatten(&binary.lhs, out)?;
            out.push((binary.op, binary.rhs.clone()));
            Ok(())
        }
        _ => Err(CfgError::parser(
            node.start(),
            format!("invalid path: {}", to_source(node)),
        )),
    }
}

fn op_text(kind: TokenKind) -> &'static str {
    use TokenKind::*;
    match kind {
        Plus => "+",
        Minus => "-",
        Star => "*",
        Slash => "/",
        SlashSlash => "//",
        Modulo => "%",
        Power => "**",
        LeftShift => "<<",
        RightShift => ">>",
        BitwiseAnd => "&",
        BitwiseOr => "|",
        BitwiseXor => "^",
        LessThan => "<",
        LessThanOrEqual => "<=",
        GreaterThan => ">",
        GreaterThanOrEqual => ">=",
        Equal => "==",
        Unequal => "!=",
        AltUnequal => "<>",
        And => "&&",
        Or => "||",
        Is => "is",
        In => "in",
        _ => "?",
    }
}

/// Render a node back to source form. Token leaves reuse their original
/// spelling, so paths round-trip through `parse_path` exactly.
pub fn to_source(node: &AstNode) -> String {
    match node {
        AstNode::Token(token) => token.text.to_string(),
        AstNode::Unary(unary) => match unary.op {
            TokenKind::Dollar => format!("${{{}}}", to_source(&unary.operand)),
            TokenKind::At => format!("@{}", to_source(&unary.operand)),
            TokenKind::Not => format!("not {}", to_source(&unary.operand)),
            op => format!("{}{}", op_text(op), to_source(&unary.operand)),
        },
        AstNode::Binary(binary) => match binary.op {
            TokenKind::Dot => format!("{}.{}", to_source(&binary.lhs), to_source(&binary.rhs)),
            TokenKind::LeftBracket => {
                format!("{}[{}]", to_source(&binary.lhs), to_source(&binary.rhs))
            }
            TokenKind::Colon => {
                format!("{}[{}]", to_source(&binary.lhs), to_source(&binary.rhs))
            }
            op => format!(
                "{} {} {}",
                to_source(&binary.lhs),
                op_text(op),
                to_source(&binary.rhs)
            ),
        },
        AstNode::Slice(slice) => {
            let part = |node: &Option<AstNode>| node.as_ref().map(to_source).unwrap_or_default();
            let mut out = format!("{}:{}", part(&slice.start_index), part(&slice.stop_index));
            if let Some(step) = &slice.step {
                out.push(':');
                out.push_str(&to_source(step));
            }
            out
        }
        AstNode::List(list) => {
            let elements: Vec<String> = list.elements.iter().map(to_source).collect();
            format!("[{}]", elements.join(", "))
        }
        AstNode::Mapping(mapping) => {
            let entries: Vec<String> = mapping
                .entries
                .iter()
                .map(|(key, value)| format!("{}: {}", key.text, to_source(value)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}

/// Whether `text` is a plain identifier: a non-digit word character followed
/// by word characters, Unicode-aware.
pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(ch) if ch.is_alphabetic() || ch == '_' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_alphanumeric() || ch == '_')
}
