use crate::ast::{AstNode, ListNode, MappingNode, SliceNode};
use crate::diagnostics::{CfgError, CfgResult};
use crate::lexer::Tokenizer;
use crate::tokens::{Token, TokenKind, TokenValue};
use std::io::Read;

/// Recursive-descent parser over the token stream, with a single token of
/// lookahead. Entry points mirror the places a configuration can start:
/// `container`, `mapping`, `mapping_body`, `list`, `expr` and `primary`.
pub struct Parser<R> {
    tokenizer: Tokenizer<R>,
    next: Token,
}

/// Tokens that can begin an expression; list bodies consume elements only
/// while one of these is ahead.
fn is_expression_starter(kind: TokenKind) -> bool {
    use TokenKind::*;
    matches!(
        kind,
        Word | IntegerNumber
            | FloatNumber
            | Complex
            | StringToken
            | BackTick
            | True
            | False
            | None
            | LeftCurly
            | LeftBracket
            | LeftParenthesis
            | At
            | Dollar
            | Plus
            | Minus
            | BitwiseComplement
            | Not
    )
}

impl<R: Read> Parser<R> {
    pub fn new(reader: R) -> CfgResult<Self> {
        let mut tokenizer = Tokenizer::new(reader);
        let next = tokenizer.get_token()?;
        Ok(Self { tokenizer, next })
    }

    /// The lookahead token.
    pub fn current(&self) -> &Token {
        &self.next
    }

    pub fn at_end(&self) -> bool {
        self.next.kind == TokenKind::Eof
    }

    fn advance(&mut self) -> CfgResult<Token> {
        let incoming = self.tokenizer.get_token()?;
        Ok(std::mem::replace(&mut self.next, incoming))
    }

    fn error_here(&self, message: impl Into<String>) -> CfgError {
        CfgError::parser(self.next.start, message)
    }

    fn expect(&mut self, kind: TokenKind) -> CfgResult<Token> {
        if self.next.kind == kind {
            self.advance()
        } else {
            Err(self.error_here(format!("expected {} but got {}", kind, self.next.kind)))
        }
    }

    fn skip_newlines(&mut self) -> CfgResult<()> {
        while self.next.kind == TokenKind::Newline {
            self.advance()?;
        }
        Ok(())
    }

    /// A whole configuration: `{...}`, `[...]`, or a braceless mapping body,
    /// with any number of leading newlines.
    pub fn container(&mut self) -> CfgResult<AstNode> {
        self.skip_newlines()?;
        match self.next.kind {
            TokenKind::LeftCurly => self.mapping(),
            TokenKind::LeftBracket => self.list(),
            TokenKind::Word | TokenKind::StringToken => self.mapping_body(),
            TokenKind::Eof => Ok(AstNode::Mapping(MappingNode {
                entries: Vec::new(),
                start: self.next.start,
            })),
            kind => Err(self.error_here(format!("unexpected token for container: {kind}"))),
        }
    }

    pub fn mapping(&mut self) -> CfgResult<AstNode> {
        let open = self.expect(TokenKind::LeftCurly)?;
        let entries = self.map_entries()?;
        self.expect(TokenKind::RightCurly)?;
        Ok(AstNode::Mapping(MappingNode {
            entries,
            start: open.start,
        }))
    }

    /// A braceless sequence of key-value entries (the top-level form).
    pub fn mapping_body(&mut self) -> CfgResult<AstNode> {
        let start = self.next.start;
        let entries = self.map_entries()?;
        Ok(AstNode::Mapping(MappingNode { entries, start }))
    }

    fn map_entries(&mut self) -> CfgResult<Vec<(Token, AstNode)>> {
        let mut entries = Vec::new();
        self.skip_newlines()?;
        loop {
            match self.next.kind {
                TokenKind::Eof | TokenKind::RightCurly => break,
                TokenKind::Word | TokenKind::StringToken => {
                    let key = self.map_key()?;
                    match self.next.kind {
                        TokenKind::Colon | TokenKind::Assign => {
                            self.advance()?;
                        }
                        kind => {
                            return Err(
                                self.error_here(format!("expected key-value separator, found {kind}"))
                            )
                        }
                    }
                    self.skip_newlines()?;
                    let value = self.expr()?;
                    entries.push((key, value));
                    match self.next.kind {
                        TokenKind::Newline | TokenKind::Comma => {
                            self.advance()?;
                            self.skip_newlines()?;
                        }
                        TokenKind::RightCurly | TokenKind::Eof => {}
                        kind => {
                            return Err(
                                self.error_here(format!("unexpected following value: {kind}"))
                            )
                        }
                    }
                }
                kind => return Err(self.error_here(format!("unexpected type for key: {kind}"))),
            }
        }
        Ok(entries)
    }

    /// A mapping key; adjacent string literals concatenate into one key.
    fn map_key(&mut self) -> CfgResult<Token> {
        let mut key = self.advance()?;
        if key.kind == TokenKind::StringToken {
            while self.next.kind == TokenKind::StringToken {
                let follow = self.advance()?;
                let mut text = key.text.to_string();
                text.push_str(&follow.text);
                let value = match (&key.value, &follow.value) {
                    (TokenValue::Str(a), TokenValue::Str(b)) => {
                        TokenValue::Str(format!("{a}{b}"))
                    }
                    _ => TokenValue::None,
                };
                key = Token {
                    kind: TokenKind::StringToken,
                    text: text.into(),
                    value,
                    start: key.start,
                    end: follow.end,
                };
            }
        }
        Ok(key)
    }

    pub fn list(&mut self) -> CfgResult<AstNode> {
        let open = self.expect(TokenKind::LeftBracket)?;
        let mut elements = Vec::new();
        self.skip_newlines()?;
        while is_expression_starter(self.next.kind) {
            elements.push(self.expr()?);
            match self.next.kind {
                TokenKind::Newline | TokenKind::Comma => {
                    self.advance()?;
                    self.skip_newlines()?;
                }
                _ => break,
            }
        }
        self.expect(TokenKind::RightBracket)?;
        Ok(AstNode::List(ListNode {
            elements,
            start: open.start,
        }))
    }

    /// Lowest-precedence entry: `or` chains.
    pub fn expr(&mut self) -> CfgResult<AstNode> {
        let mut lhs = self.and_expr()?;
        while self.next.kind == TokenKind::Or {
            let start = lhs.start();
            self.advance()?;
            let rhs = self.and_expr()?;
            lhs = AstNode::binary(TokenKind::Or, lhs, rhs, start);
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> CfgResult<AstNode> {
        let mut lhs = self.not_expr()?;
        while self.next.kind == TokenKind::And {
            let start = lhs.start();
            self.advance()?;
            let rhs = self.not_expr()?;
            lhs = AstNode::binary(TokenKind::And, lhs, rhs, start);
        }
        Ok(lhs)
    }

    fn not_expr(&mut self) -> CfgResult<AstNode> {
        if self.next.kind == TokenKind::Not {
            let op = self.advance()?;
            let operand = self.not_expr()?;
            return Ok(AstNode::unary(TokenKind::Not, operand, op.start));
        }
        self.comparison()
    }

    /// At most one comparison per level; `is not` and `not in` are parsed as
    /// negations of `is` and `in` so the token-kind set stays closed.
    fn comparison(&mut self) -> CfgResult<AstNode> {
        use TokenKind::*;
        let lhs = self.bit_or_expr()?;
        let start = lhs.start();
        match self.next.kind {
            LessThan | LessThanOrEqual | GreaterThan | GreaterThanOrEqual | Equal | Unequal
            | AltUnequal | In => {
                let op = self.advance()?.kind;
                let rhs = self.bit_or_expr()?;
                Ok(AstNode::binary(op, lhs, rhs, start))
            }
            Is => {
                self.advance()?;
                let negated = if self.next.kind == Not {
                    self.advance()?;
                    true
                } else {
                    false
                };
                let rhs = self.bit_or_expr()?;
                let node = AstNode::binary(Is, lhs, rhs, start);
                Ok(if negated {
                    AstNode::unary(Not, node, start)
                } else {
                    node
                })
            }
            Not => {
                self.advance()?;
                self.expect(In)?;
                let rhs = self.bit_or_expr()?;
                let node = AstNode::binary(In, lhs, rhs, start);
                Ok(AstNode::unary(Not, node, start))
            }
            _ => Ok(lhs),
        }
    }

    fn bit_or_expr(&mut self) -> CfgResult<AstNode> {
        let mut lhs = self.bit_xor_expr()?;
        while self.next.kind == TokenKind::BitwiseOr {
            let start = lhs.start();
            self.advance()?;
            let rhs = self.bit_xor_expr()?;
            lhs = AstNode::binary(TokenKind::BitwiseOr, lhs, rhs, start);
        }
        Ok(lhs)
    }

    fn bit_xor_expr(&mut self) -> CfgResult<AstNode> {
        let mut lhs = self.bit_and_expr()?;
        while self.next.kind == TokenKind::BitwiseXor {
            let start = lhs.start();
            self.advance()?;
            let rhs = self.bit_and_expr()?;
            lhs = AstNode::binary(TokenKind::BitwiseXor, lhs, rhs, start);
        }
        Ok(lhs)
    }

    fn bit_and_expr(&mut self) -> CfgResult<AstNode> {
        let mut lhs = self.shift_expr()?;
        while self.next.kind == TokenKind::BitwiseAnd {
            let start = lhs.start();
            self.advance()?;
            let rhs = self.shift_expr()?;
            lhs = AstNode::binary(TokenKind::BitwiseAnd, lhs, rhs, start);
        }
        Ok(lhs)
    }

    fn shift_expr(&mut self) -> CfgResult<AstNode> {
        let mut lhs = self.add_expr()?;
        while matches!(self.next.kind, TokenKind::LeftShift | TokenKind::RightShift) {
            let op = self.next.kind;
            let start = lhs.start();
            self.advance()?;
            let rhs = self.add_expr()?;
            lhs = AstNode::binary(op, lhs, rhs, start);
        }
        Ok(lhs)
    }

    fn add_expr(&mut self) -> CfgResult<AstNode> {
        let mut lhs = self.mul_expr()?;
        while matches!(self.next.kind, TokenKind::Plus | TokenKind::Minus) {
            let op = self.next.kind;
            let start = lhs.start();
            self.advance()?;
            let rhs = self.mul_expr()?;
            lhs = AstNode::binary(op, lhs, rhs, start);
        }
        Ok(lhs)
    }

    fn mul_expr(&mut self) -> CfgResult<AstNode> {
        let mut lhs = self.unary_expr()?;
        while matches!(
            self.next.kind,
            TokenKind::Star | TokenKind::Slash | TokenKind::SlashSlash | TokenKind::Modulo
        ) {
            let op = self.next.kind;
            let start = lhs.start();
            self.advance()?;
            let rhs = self.unary_expr()?;
            lhs = AstNode::binary(op, lhs, rhs, start);
        }
        Ok(lhs)
    }

    fn unary_expr(&mut self) -> CfgResult<AstNode> {
        match self.next.kind {
            TokenKind::Plus | TokenKind::Minus | TokenKind::BitwiseComplement | TokenKind::At => {
                let op = self.advance()?;
                let operand = self.unary_expr()?;
                Ok(AstNode::unary(op.kind, operand, op.start))
            }
            _ => self.power_expr(),
        }
    }

    /// `**` binds tighter than unary operators on its right and is
    /// right-associative.
    fn power_expr(&mut self) -> CfgResult<AstNode> {
        let lhs = self.primary()?;
        if self.next.kind == TokenKind::Power {
            let start = lhs.start();
            self.advance()?;
            let rhs = self.unary_expr()?;
            return Ok(AstNode::binary(TokenKind::Power, lhs, rhs, start));
        }
        Ok(lhs)
    }

    /// An atom followed by any number of `.word`, `[index]` or `[slice]`
    /// trailers.
    pub fn primary(&mut self) -> CfgResult<AstNode> {
        let mut node = self.atom()?;
        loop {
            match self.next.kind {
                TokenKind::Dot => {
                    self.advance()?;
                    let word = self.expect(TokenKind::Word)?;
                    let start = node.start();
                    node = AstNode::binary(TokenKind::Dot, node, AstNode::Token(word), start);
                }
                TokenKind::LeftBracket => {
                    node = self.index_trailer(node)?;
                }
                _ => break,
            }
        }
        Ok(node)
    }

    fn index_trailer(&mut self, lhs: AstNode) -> CfgResult<AstNode> {
        let open = self.expect(TokenKind::LeftBracket)?;
        let lhs_start = lhs.start();
        let mut start_index = None;

        if self.next.kind != TokenKind::Colon {
            let first = self.expr()?;
            if self.next.kind == TokenKind::Comma {
                let mut found = 1usize;
                while self.next.kind == TokenKind::Comma {
                    self.advance()?;
                    self.expr()?;
                    found += 1;
                }
                return Err(CfgError::parser(
                    open.start,
                    format!(
                        "invalid index at {}: expected 1 expression, found {found}",
                        open.start
                    ),
                ));
            }
            if self.next.kind != TokenKind::Colon {
                self.expect(TokenKind::RightBracket)?;
                return Ok(AstNode::binary(TokenKind::LeftBracket, lhs, first, lhs_start));
            }
            start_index = Some(first);
        }

        // A slice: up to three colon-separated optional expressions.
        self.expect(TokenKind::Colon)?;
        let mut stop_index = None;
        let mut step = None;
        if !matches!(self.next.kind, TokenKind::Colon | TokenKind::RightBracket) {
            stop_index = Some(self.expr()?);
        }
        if self.next.kind == TokenKind::Colon {
            self.advance()?;
            if self.next.kind != TokenKind::RightBracket {
                step = Some(self.expr()?);
            }
        }
        self.expect(TokenKind::RightBracket)?;
        let slice = AstNode::Slice(Box::new(SliceNode {
            start_index,
            stop_index,
            step,
            start: open.start,
        }));
        Ok(AstNode::binary(TokenKind::Colon, lhs, slice, lhs_start))
    }

    fn atom(&mut self) -> CfgResult<AstNode> {
        use TokenKind::*;
        match self.next.kind {
            LeftCurly => self.mapping(),
            LeftBracket => self.list(),
            LeftParenthesis => {
                self.advance()?;
                let inner = self.expr()?;
                self.expect(RightParenthesis)?;
                Ok(inner)
            }
            Dollar => {
                let dollar = self.advance()?;
                self.expect(LeftCurly)?;
                let path = self.primary()?;
                self.expect(RightCurly)?;
                Ok(AstNode::unary(Dollar, path, dollar.start))
            }
            Word | IntegerNumber | FloatNumber | Complex | StringToken | BackTick | True
            | False | None => {
                let token = self.advance()?;
                Ok(AstNode::Token(token))
            }
            kind => Err(self.error_here(format!("unexpected when looking for value: {kind}"))),
        }
    }
}
