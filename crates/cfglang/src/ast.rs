use crate::position::Location;
use crate::tokens::{Token, TokenKind};
use serde::{Deserialize, Serialize};

/// A parsed expression or container. Leaves wrap the token they came from;
/// every node records the location where it started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AstNode {
    Token(Token),
    Unary(Box<UnaryNode>),
    Binary(Box<BinaryNode>),
    Slice(Box<SliceNode>),
    List(ListNode),
    Mapping(MappingNode),
}

impl AstNode {
    pub fn unary(op: TokenKind, operand: AstNode, start: Location) -> Self {
        AstNode::Unary(Box::new(UnaryNode { op, operand, start }))
    }

    pub fn binary(op: TokenKind, lhs: AstNode, rhs: AstNode, start: Location) -> Self {
        AstNode::Binary(Box::new(BinaryNode {
            op,
            lhs,
            rhs,
            start,
        }))
    }

    pub fn start(&self) -> Location {
        match self {
            AstNode::Token(token) => token.start,
            AstNode::Unary(node) => node.start,
            AstNode::Binary(node) => node.start,
            AstNode::Slice(node) => node.start,
            AstNode::List(node) => node.start,
            AstNode::Mapping(node) => node.start,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnaryNode {
    pub op: TokenKind,
    pub operand: AstNode,
    pub start: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryNode {
    pub op: TokenKind,
    pub lhs: AstNode,
    pub rhs: AstNode,
    pub start: Location,
}

/// `start`/`stop`/`step` are each optional; `[::2]` has only a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliceNode {
    pub start_index: Option<AstNode>,
    pub stop_index: Option<AstNode>,
    pub step: Option<AstNode>,
    pub start: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListNode {
    pub elements: Vec<AstNode>,
    pub start: Location,
}

/// Entries preserve source order; keys are the `Word` or `StringToken`
/// tokens they were written as, so duplicate reports can name both
/// locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingNode {
    pub entries: Vec<(Token, AstNode)>,
    pub start: Location,
}
