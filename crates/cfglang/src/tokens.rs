use crate::complex::Complex;
use crate::position::Location;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;

/// The closed set of token kinds produced by the tokenizer. Keyword
/// operators share a kind with their symbolic spellings: `and`/`&&`,
/// `or`/`||` and `not`/`!` each map to a single kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    Eof,
    Word,
    IntegerNumber,
    FloatNumber,
    Complex,
    StringToken,
    BackTick,
    True,
    False,
    None,
    Is,
    In,
    Not,
    And,
    Or,
    Newline,
    Colon,
    Comma,
    Dot,
    Minus,
    Plus,
    Star,
    Slash,
    SlashSlash,
    Modulo,
    LeftCurly,
    RightCurly,
    LeftBracket,
    RightBracket,
    LeftParenthesis,
    RightParenthesis,
    At,
    Assign,
    Dollar,
    LessThan,
    GreaterThan,
    LessThanOrEqual,
    GreaterThanOrEqual,
    Equal,
    Unequal,
    AltUnequal,
    LeftShift,
    RightShift,
    Power,
    BitwiseComplement,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    Error,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        use TokenKind::*;
        match self {
            Eof => "EOF",
            Word => "Word",
            IntegerNumber => "IntegerNumber",
            FloatNumber => "FloatNumber",
            Complex => "Complex",
            StringToken => "StringToken",
            BackTick => "BackTick",
            True => "True",
            False => "False",
            None => "None",
            Is => "Is",
            In => "In",
            Not => "Not",
            And => "And",
            Or => "Or",
            Newline => "Newline",
            Colon => "Colon",
            Comma => "Comma",
            Dot => "Dot",
            Minus => "Minus",
            Plus => "Plus",
            Star => "Star",
            Slash => "Slash",
            SlashSlash => "SlashSlash",
            Modulo => "Modulo",
            LeftCurly => "LeftCurly",
            RightCurly => "RightCurly",
            LeftBracket => "LeftBracket",
            RightBracket => "RightBracket",
            LeftParenthesis => "LeftParenthesis",
            RightParenthesis => "RightParenthesis",
            At => "At",
            Assign => "Assign",
            Dollar => "Dollar",
            LessThan => "LessThan",
            GreaterThan => "GreaterThan",
            LessThanOrEqual => "LessThanOrEqual",
            GreaterThanOrEqual => "GreaterThanOrEqual",
            Equal => "Equal",
            Unequal => "Unequal",
            AltUnequal => "AltUnequal",
            LeftShift => "LeftShift",
            RightShift => "RightShift",
            Power => "Power",
            BitwiseComplement => "BitwiseComplement",
            BitwiseAnd => "BitwiseAnd",
            BitwiseOr => "BitwiseOr",
            BitwiseXor => "BitwiseXor",
            Error => "Error",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The payload carried by a token; which arm is populated is determined by
/// the token's kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum TokenValue {
    #[default]
    None,
    Integer(i64),
    Float(f64),
    Complex(Complex),
    Str(String),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    /// The token's source spelling, escape sequences included.
    pub text: SmolStr,
    pub value: TokenValue,
    pub start: Location,
    pub end: Location,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<SmolStr>, value: TokenValue) -> Self {
        Self {
            kind,
            text: text.into(),
            value,
            start: Location::default(),
            end: Location::default(),
        }
    }

    /// The mapping key this token denotes: the spelling for words, the
    /// decoded value for strings.
    pub fn key_text(&self) -> SmolStr {
        match &self.value {
            TokenValue::Str(s) if self.kind == TokenKind::StringToken => SmolStr::from(s),
            _ => self.text.clone(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.text)
    }
}
