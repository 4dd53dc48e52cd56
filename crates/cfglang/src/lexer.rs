use crate::complex::Complex;
use crate::decoder::Decoder;
use crate::diagnostics::{CfgError, CfgResult};
use crate::position::Location;
use crate::tokens::{Token, TokenKind, TokenValue};
use std::io::Read;

/// The tokenizer: a push-back character source over the UTF-8 decoder plus
/// `get_token`, which produces one located token per call. Tokens are
/// produced lazily; nothing is read beyond the current token and at most one
/// look-ahead character.
pub struct Tokenizer<R> {
    decoder: Decoder<R>,
    location: Location,
    char_location: Location,
    pushed_back: Vec<(char, Location)>,
}

fn is_word_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

fn is_word_continuation(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

impl<R: Read> Tokenizer<R> {
    pub fn new(reader: R) -> Self {
        Self {
            decoder: Decoder::new(reader),
            location: Location::default(),
            char_location: Location::default(),
            pushed_back: Vec::new(),
        }
    }

    /// Read the next character, honouring the push-back stack. `'\0'` means
    /// end of input. After this call `char_location` is the position of the
    /// returned character.
    fn get_char(&mut self) -> CfgResult<char> {
        let (ch, loc) = match self.pushed_back.pop() {
            Some(entry) => entry,
            None => (self.decoder.decode()?, self.location),
        };
        self.char_location = loc;
        self.location = loc;
        if ch != '\0' {
            self.location.advance(ch);
        }
        Ok(ch)
    }

    /// Return `ch` so that the next `get_char` yields it again, at the same
    /// location.
    fn push_back(&mut self, ch: char) {
        if ch != '\0' {
            self.pushed_back.push((ch, self.char_location));
            self.location = self.char_location;
        }
    }

    fn peek(&mut self) -> CfgResult<char> {
        let ch = self.get_char()?;
        self.push_back(ch);
        Ok(ch)
    }

    fn error(&self, location: Location, message: impl Into<String>) -> CfgError {
        CfgError::tokenizer(location, message)
    }

    /// Produce the next token, with its start and end locations.
    pub fn get_token(&mut self) -> CfgResult<Token> {
        let ch = loop {
            let ch = self.get_char()?;
            match ch {
                '\0' => {
                    let mut token = Token::new(TokenKind::Eof, "", TokenValue::None);
                    token.start = self.char_location;
                    token.end = self.char_location;
                    return Ok(token);
                }
                '#' => return self.read_comment(),
                '\n' => {
                    return Ok(self.make_newline(self.char_location, self.char_location));
                }
                '\r' => {
                    let start = self.char_location;
                    let next = self.get_char()?;
                    let end = if next == '\n' {
                        self.char_location
                    } else {
                        self.push_back(next);
                        start
                    };
                    return Ok(self.make_newline(start, end));
                }
                '\\' => {
                    // Line continuation: backslash followed by CR?LF.
                    let backslash_at = self.char_location;
                    let mut next = self.get_char()?;
                    if next == '\r' {
                        next = self.get_char()?;
                    }
                    if next != '\n' {
                        return Err(self.error(backslash_at, "unexpected character: \\"));
                    }
                }
                _ if ch.is_whitespace() => {}
                _ => break ch,
            }
        };

        let start = self.char_location;
        match ch {
            '\'' | '"' => self.read_string(ch, start),
            '`' => self.read_back_tick(start),
            '0'..='9' => self.read_number(ch, start),
            '.' => {
                if self.peek()?.is_ascii_digit() {
                    self.read_number(ch, start)
                } else {
                    Ok(self.punctuation(TokenKind::Dot, ".", start))
                }
            }
            '-' | '+' => {
                let next = self.peek()?;
                if next.is_ascii_digit() || next == '.' {
                    self.read_number(ch, start)
                } else if ch == '-' {
                    Ok(self.punctuation(TokenKind::Minus, "-", start))
                } else {
                    Ok(self.punctuation(TokenKind::Plus, "+", start))
                }
            }
            _ if is_word_start(ch) => self.read_word(ch, start),
            _ => self.read_punctuation(ch, start),
        }
    }

    fn make_newline(&self, start: Location, end: Location) -> Token {
        let mut token = Token::new(TokenKind::Newline, "\n", TokenValue::None);
        token.start = start;
        token.end = end;
        token
    }

    /// Punctuation never spans lines, so the end column follows from the
    /// spelling. (`char_location` may already sit on a peeked character.)
    fn punctuation(&self, kind: TokenKind, text: &str, start: Location) -> Token {
        let mut token = Token::new(kind, text, TokenValue::None);
        token.start = start;
        token.end = Location::new(start.line, start.column + text.chars().count() as u32 - 1);
        token
    }

    /// `#` runs to end of line and stands in for the newline that ends it.
    fn read_comment(&mut self) -> CfgResult<Token> {
        let start = self.char_location;
        let mut text = String::from("#");
        let end = loop {
            let ch = self.get_char()?;
            match ch {
                '\0' => break self.char_location,
                '\n' => break self.char_location,
                '\r' => {
                    let cr_at = self.char_location;
                    let next = self.get_char()?;
                    if next == '\n' {
                        break self.char_location;
                    }
                    self.push_back(next);
                    break cr_at;
                }
                _ => text.push(ch),
            }
        };
        let mut token = Token::new(TokenKind::Newline, text, TokenValue::None);
        token.start = start;
        token.end = end;
        Ok(token)
    }

    fn read_word(&mut self, first: char, start: Location) -> CfgResult<Token> {
        let mut text = String::new();
        text.push(first);
        let mut end = self.char_location;
        loop {
            let ch = self.get_char()?;
            if is_word_continuation(ch) {
                text.push(ch);
                end = self.char_location;
            } else {
                self.push_back(ch);
                break;
            }
        }
        let (kind, value) = match text.as_str() {
            "true" => (TokenKind::True, TokenValue::Bool(true)),
            "false" => (TokenKind::False, TokenValue::Bool(false)),
            "null" => (TokenKind::None, TokenValue::None),
            "is" => (TokenKind::Is, TokenValue::None),
            "in" => (TokenKind::In, TokenValue::None),
            "not" => (TokenKind::Not, TokenValue::None),
            "and" => (TokenKind::And, TokenValue::None),
            "or" => (TokenKind::Or, TokenValue::None),
            _ => (TokenKind::Word, TokenValue::None),
        };
        let mut token = Token::new(kind, text, value);
        token.start = start;
        token.end = end;
        Ok(token)
    }

    fn read_string(&mut self, quote: char, start: Location) -> CfgResult<Token> {
        let mut text = String::new();
        text.push(quote);

        // Two more quotes mean a multi-line literal; one means it was empty.
        let mut triple = false;
        let first = self.get_char()?;
        if first == quote {
            let second = self.get_char()?;
            if second == quote {
                triple = true;
                text.push(quote);
                text.push(quote);
            } else {
                self.push_back(second);
                text.push(quote);
                let mut token =
                    Token::new(TokenKind::StringToken, text, TokenValue::Str(String::new()));
                token.start = start;
                token.end = Location::new(start.line, start.column + 1);
                return Ok(token);
            }
        } else if first == '\0' || first == '\n' || first == '\r' {
            return Err(self.error(start, format!("unterminated quoted string: {text}")));
        } else {
            self.push_back(first);
        }

        let quotes = if triple { 3 } else { 1 };
        let mut escaped = false;
        let mut quote_run = 0usize;
        let mut before_run = '\0';
        loop {
            let ch = self.get_char()?;
            if ch == '\0' || (!triple && (ch == '\n' || ch == '\r')) {
                return Err(self.error(start, format!("unterminated quoted string: {text}")));
            }
            text.push(ch);
            if triple {
                // Closing needs three quotes in a row whose fourth-last
                // character is not a backslash.
                if ch == quote {
                    quote_run += 1;
                    let four_back = if quote_run == 3 { before_run } else { quote };
                    if quote_run >= 3 && four_back != '\\' {
                        break;
                    }
                } else {
                    quote_run = 0;
                    before_run = ch;
                }
            } else if ch == '\\' {
                escaped = !escaped;
            } else if ch == quote && !escaped {
                break;
            } else {
                escaped = false;
            }
        }

        let chars: Vec<char> = text.chars().collect();
        let inner: String = chars[quotes..chars.len() - quotes].iter().collect();
        let decoded = self.decode_escapes(&inner, &text, start)?;
        let mut token = Token::new(TokenKind::StringToken, text, TokenValue::Str(decoded));
        token.start = start;
        token.end = self.char_location;
        Ok(token)
    }

    fn read_back_tick(&mut self, start: Location) -> CfgResult<Token> {
        let mut text = String::from("`");
        loop {
            let ch = self.get_char()?;
            if ch == '\0' || ch == '\n' || ch == '\r' {
                return Err(self.error(start, format!("unterminated back-tick string: {text}")));
            }
            text.push(ch);
            if ch == '`' {
                break;
            }
        }
        let inner: String = {
            let chars: Vec<char> = text.chars().collect();
            chars[1..chars.len() - 1].iter().collect()
        };
        let decoded = self.decode_escapes(&inner, &text, start)?;
        let mut token = Token::new(TokenKind::BackTick, text, TokenValue::Str(decoded));
        token.start = start;
        token.end = self.char_location;
        Ok(token)
    }

    fn decode_escapes(&self, inner: &str, literal: &str, at: Location) -> CfgResult<String> {
        let invalid = || self.error(at, format!("invalid escape sequence in: {literal}"));
        let mut out = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(ch) = chars.next() {
            if ch != '\\' {
                out.push(ch);
                continue;
            }
            let code = chars.next().ok_or_else(invalid)?;
            match code {
                'a' => out.push('\u{0007}'),
                'b' => out.push('\u{0008}'),
                'f' => out.push('\u{000C}'),
                'n' => out.push('\n'),
                'r' => out.push('\r'),
                't' => out.push('\t'),
                'v' => out.push('\u{000B}'),
                '\\' => out.push('\\'),
                '\'' => out.push('\''),
                '"' => out.push('"'),
                'x' | 'u' | 'U' => {
                    let width = match code {
                        'x' => 2,
                        'u' => 4,
                        _ => 8,
                    };
                    let mut scalar = 0u32;
                    for _ in 0..width {
                        let digit = chars.next().and_then(|c| c.to_digit(16)).ok_or_else(invalid)?;
                        scalar = scalar * 16 + digit;
                    }
                    if (0xD800..=0xDFFF).contains(&scalar) || scalar > 0x0010_FFFF {
                        return Err(invalid());
                    }
                    out.push(char::from_u32(scalar).ok_or_else(invalid)?);
                }
                _ => return Err(invalid()),
            }
        }
        Ok(out)
    }

    fn read_number(&mut self, first: char, start: Location) -> CfgResult<Token> {
        let mut text = String::new();
        let mut end = self.char_location;
        text.push(first);

        let mut ch = first;
        if ch == '-' || ch == '+' {
            // The caller guarantees a digit or '.' follows the sign.
            ch = self.get_char()?;
            text.push(ch);
            end = self.char_location;
        }

        if ch == '0' {
            let next = self.peek()?;
            if matches!(next, 'x' | 'X' | 'o' | 'O' | 'b' | 'B') {
                return self.read_radix_number(text, start);
            }
        }

        let mut dot_seen = ch == '.';
        let mut exponent_seen = false;
        let mut is_complex = false;
        let mut prev = ch;
        loop {
            let ch = self.get_char()?;
            match ch {
                '0'..='9' => {
                    text.push(ch);
                    end = self.char_location;
                    prev = ch;
                }
                '_' => {
                    text.push(ch);
                    if !prev.is_ascii_digit() {
                        return Err(self.error(start, format!("invalid '_' in number: {text}")));
                    }
                    end = self.char_location;
                    prev = ch;
                }
                '.' => {
                    text.push(ch);
                    if dot_seen || exponent_seen {
                        return Err(self.error(start, "invalid character in number: .".to_string()));
                    }
                    if prev == '_' {
                        return Err(self.error(start, format!("invalid '_' in number: {text}")));
                    }
                    dot_seen = true;
                    end = self.char_location;
                    prev = ch;
                }
                'e' | 'E' => {
                    text.push(ch);
                    if exponent_seen {
                        return Err(self.error(start, format!("invalid character in number: {ch}")));
                    }
                    if prev == '_' {
                        return Err(self.error(start, format!("invalid '_' in number: {text}")));
                    }
                    exponent_seen = true;
                    end = self.char_location;
                    prev = ch;
                    let sign = self.get_char()?;
                    if sign == '-' {
                        text.push(sign);
                        end = self.char_location;
                        prev = sign;
                    } else {
                        self.push_back(sign);
                    }
                }
                'j' | 'J' => {
                    if prev == '_' {
                        return Err(self.error(start, format!("invalid '_' at end of number: {text}")));
                    }
                    text.push(ch);
                    is_complex = true;
                    end = self.char_location;
                    break;
                }
                _ if ch.is_alphanumeric() => {
                    return Err(self.error(start, format!("invalid character in number: {ch}")));
                }
                _ => {
                    self.push_back(ch);
                    break;
                }
            }
        }

        if prev == '_' {
            return Err(self.error(start, format!("invalid '_' at end of number: {text}")));
        }

        let stripped: String = text.chars().filter(|&c| c != '_').collect();
        let malformed = || self.error(start, format!("badly formed number: {text}"));
        let (kind, value) = if is_complex {
            let mantissa = &stripped[..stripped.len() - 1];
            let imaginary: f64 = mantissa.parse().map_err(|_| malformed())?;
            (
                TokenKind::Complex,
                TokenValue::Complex(Complex::new(0.0, imaginary)),
            )
        } else if dot_seen || exponent_seen {
            let float: f64 = stripped.parse().map_err(|_| malformed())?;
            (TokenKind::FloatNumber, TokenValue::Float(float))
        } else {
            let (negative, digits) = match stripped.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, stripped.strip_prefix('+').unwrap_or(&stripped)),
            };
            if digits.len() > 1 && digits.starts_with('0') {
                // Legacy leading-zero octal.
                if digits.contains('8') || digits.contains('9') {
                    return Err(self.error(start, format!("badly formed octal constant: {text}")));
                }
                let magnitude = i64::from_str_radix(digits, 8).map_err(|_| malformed())?;
                let value = if negative { -magnitude } else { magnitude };
                (TokenKind::IntegerNumber, TokenValue::Integer(value))
            } else {
                match stripped.parse::<i64>() {
                    Ok(value) => (TokenKind::IntegerNumber, TokenValue::Integer(value)),
                    // Magnitudes beyond i64 degrade to floating point.
                    Err(_) => {
                        let float: f64 = stripped.parse().map_err(|_| malformed())?;
                        (TokenKind::FloatNumber, TokenValue::Float(float))
                    }
                }
            }
        };
        let mut token = Token::new(kind, text, value);
        token.start = start;
        token.end = end;
        Ok(token)
    }

    /// Scan the digits of a `0x`/`0o`/`0b` literal; `text` already holds the
    /// sign (if any) and the leading zero.
    fn read_radix_number(&mut self, mut text: String, start: Location) -> CfgResult<Token> {
        let radix_char = self.get_char()?;
        text.push(radix_char);
        let mut end = self.char_location;
        let radix = match radix_char {
            'x' | 'X' => 16,
            'o' | 'O' => 8,
            _ => 2,
        };

        let mut digits = String::new();
        let mut prev = radix_char;
        loop {
            let ch = self.get_char()?;
            if ch.to_digit(radix).is_some() {
                text.push(ch);
                digits.push(ch);
                end = self.char_location;
                prev = ch;
            } else if ch == '_' {
                text.push(ch);
                if prev == '_' || prev.to_digit(radix).is_none() {
                    return Err(self.error(start, format!("invalid '_' in number: {text}")));
                }
                end = self.char_location;
                prev = ch;
            } else if ch.is_alphanumeric() {
                return Err(self.error(start, format!("invalid character in number: {ch}")));
            } else {
                self.push_back(ch);
                break;
            }
        }
        if prev == '_' {
            return Err(self.error(start, format!("invalid '_' at end of number: {text}")));
        }
        if digits.is_empty() {
            return Err(self.error(start, format!("badly formed number: {text}")));
        }

        let negative = text.starts_with('-');
        let magnitude = i64::from_str_radix(&digits, radix)
            .map_err(|_| self.error(start, format!("badly formed number: {text}")))?;
        let value = if negative { -magnitude } else { magnitude };
        let mut token = Token::new(
            TokenKind::IntegerNumber,
            text,
            TokenValue::Integer(value),
        );
        token.start = start;
        token.end = end;
        Ok(token)
    }

    fn read_punctuation(&mut self, first: char, start: Location) -> CfgResult<Token> {
        use TokenKind::*;
        let (kind, text): (TokenKind, &str) = match first {
            ':' => (Colon, ":"),
            ',' => (Comma, ","),
            '%' => (Modulo, "%"),
            '{' => (LeftCurly, "{"),
            '}' => (RightCurly, "}"),
            '[' => (LeftBracket, "["),
            ']' => (RightBracket, "]"),
            '(' => (LeftParenthesis, "("),
            ')' => (RightParenthesis, ")"),
            '@' => (At, "@"),
            '$' => (Dollar, "$"),
            '^' => (BitwiseXor, "^"),
            '~' => (BitwiseComplement, "~"),
            '=' => {
                if self.peek()? == '=' {
                    self.get_char()?;
                    (Equal, "==")
                } else {
                    (Assign, "=")
                }
            }
            '!' => {
                if self.peek()? == '=' {
                    self.get_char()?;
                    (Unequal, "!=")
                } else {
                    (Not, "!")
                }
            }
            '<' => match self.peek()? {
                '=' => {
                    self.get_char()?;
                    (LessThanOrEqual, "<=")
                }
                '>' => {
                    self.get_char()?;
                    (AltUnequal, "<>")
                }
                '<' => {
                    self.get_char()?;
                    (LeftShift, "<<")
                }
                _ => (LessThan, "<"),
            },
            '>' => match self.peek()? {
                '=' => {
                    self.get_char()?;
                    (GreaterThanOrEqual, ">=")
                }
                '>' => {
                    self.get_char()?;
                    (RightShift, ">>")
                }
                _ => (GreaterThan, ">"),
            },
            '*' => {
                if self.peek()? == '*' {
                    self.get_char()?;
                    (Power, "**")
                } else {
                    (Star, "*")
                }
            }
            '/' => {
                if self.peek()? == '/' {
                    self.get_char()?;
                    (SlashSlash, "//")
                } else {
                    (Slash, "/")
                }
            }
            '&' => {
                if self.peek()? == '&' {
                    self.get_char()?;
                    (And, "&&")
                } else {
                    (BitwiseAnd, "&")
                }
            }
            '|' => {
                if self.peek()? == '|' {
                    self.get_char()?;
                    (Or, "||")
                } else {
                    (BitwiseOr, "|")
                }
            }
            _ => {
                return Err(self.error(start, format!("unexpected character: {first}")));
            }
        };
        Ok(self.punctuation(kind, text, start))
    }
}
