//! Lexer implementation.
//!
//! Scans source bytes into tokens on demand. The compiler pulls one token at a
//! time with `next_token` and may push a single token back with `save_token`.
//!
//! Design: single linear pass over the input, line counting as newlines are
//! consumed, escapes decoded while the literal is read.
//!
//! Related: `bob_syntax::Token`, `bob_syntax::CompileError`.
use crate::keywords::keyword;
use bob_syntax::{CompileError, Span, Token, TokenKind, TokenValue};

/// Longest identifier or string literal the scanner accepts.
pub const MAX_TOKEN_LEN: usize = 1024;

/// Result of scanning a whole input eagerly.
pub struct LexResult {
    pub tokens: Vec<Token>,
    pub error: Option<CompileError>,
}

/// Bob lexer.
pub struct Lexer<'a> {
    bytes: &'a [u8],
    i: usize,
    line: u32,
    saved: Option<Token>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer.
    pub fn new(input: &'a str) -> Self {
        Self::from_bytes(input.as_bytes())
    }

    pub fn from_bytes(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            i: 0,
            line: 1,
            saved: None,
        }
    }

    /// Line the scanner is currently on.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Push a token back; the next call to `next_token` returns it.
    pub fn save_token(&mut self, tok: Token) {
        debug_assert!(self.saved.is_none(), "only one token of lookahead");
        self.saved = Some(tok);
    }

    /// Scan everything, stopping at the first error.
    pub fn lex(mut self) -> LexResult {
        let mut tokens = Vec::with_capacity(self.bytes.len().saturating_div(4).max(32));
        loop {
            match self.next_token() {
                Ok(t) => {
                    let eof = t.kind == TokenKind::Eof;
                    tokens.push(t);
                    if eof {
                        return LexResult {
                            tokens,
                            error: None,
                        };
                    }
                }
                Err(e) => {
                    return LexResult {
                        tokens,
                        error: Some(e),
                    };
                }
            }
        }
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Result<Token, CompileError> {
        if let Some(t) = self.saved.take() {
            return Ok(t);
        }
        loop {
            self.skip_spaces();
            let start = self.i;
            let Some(c) = self.peek() else {
                return Ok(self.token(TokenKind::Eof, start));
            };
            self.i += 1;
            let kind = match c {
                b'"' => return self.lex_string(start),
                b'\'' => return self.lex_char(start),
                b'<' => {
                    if self.eat(b'=') {
                        TokenKind::Le
                    } else if self.eat(b'<') {
                        if self.eat(b'=') { TokenKind::ShlEq } else { TokenKind::Shl }
                    } else {
                        TokenKind::Lt
                    }
                }
                b'>' => {
                    if self.eat(b'=') {
                        TokenKind::Ge
                    } else if self.eat(b'>') {
                        if self.eat(b'=') { TokenKind::ShrEq } else { TokenKind::Shr }
                    } else {
                        TokenKind::Gt
                    }
                }
                b'=' => self.pick(b'=', TokenKind::EqEq, TokenKind::Assign),
                b'!' => self.pick(b'=', TokenKind::Ne, TokenKind::Bang),
                b'&' => {
                    if self.eat(b'&') {
                        TokenKind::AndAnd
                    } else {
                        self.pick(b'=', TokenKind::AmpEq, TokenKind::Amp)
                    }
                }
                b'|' => {
                    if self.eat(b'|') {
                        TokenKind::OrOr
                    } else {
                        self.pick(b'=', TokenKind::PipeEq, TokenKind::Pipe)
                    }
                }
                b'^' => self.pick(b'=', TokenKind::CaretEq, TokenKind::Caret),
                b'+' => {
                    if self.eat(b'+') {
                        TokenKind::Inc
                    } else {
                        self.pick(b'=', TokenKind::PlusEq, TokenKind::Plus)
                    }
                }
                b'-' => {
                    if self.eat(b'-') {
                        TokenKind::Dec
                    } else {
                        self.pick(b'=', TokenKind::MinusEq, TokenKind::Minus)
                    }
                }
                b'*' => self.pick(b'=', TokenKind::StarEq, TokenKind::Star),
                b'%' => self.pick(b'=', TokenKind::PercentEq, TokenKind::Percent),
                b'/' => {
                    if self.eat(b'/') {
                        self.skip_line();
                        continue;
                    } else if self.eat(b'*') {
                        self.skip_block_comment();
                        continue;
                    }
                    self.pick(b'=', TokenKind::SlashEq, TokenKind::Slash)
                }
                b'#' => {
                    self.skip_line();
                    continue;
                }
                b'.' => {
                    if self.peek().is_some_and(|b| b.is_ascii_digit()) {
                        self.i = start;
                        return self.lex_number(start);
                    }
                    self.pick(b'.', TokenKind::DotDot, TokenKind::Dot)
                }
                b'0' if matches!(self.peek(), Some(b'x') | Some(b'X')) => {
                    self.i += 1;
                    return self.lex_radix(start, 16);
                }
                b'0' if matches!(self.peek(), Some(b'0'..=b'7')) => {
                    return self.lex_radix(start, 8);
                }
                b'0'..=b'9' => {
                    self.i = start;
                    return self.lex_number(start);
                }
                b'(' => TokenKind::LParen,
                b')' => TokenKind::RParen,
                b'[' => TokenKind::LBracket,
                b']' => TokenKind::RBracket,
                b'{' => TokenKind::LBrace,
                b'}' => TokenKind::RBrace,
                b',' => TokenKind::Comma,
                b';' => TokenKind::Semi,
                b':' => TokenKind::Colon,
                b'?' => TokenKind::Question,
                b'~' => TokenKind::Tilde,
                b'\\' => TokenKind::Backslash,
                c if c == b'_' || c.is_ascii_alphabetic() => {
                    return self.lex_ident(start);
                }
                c if c.is_ascii() => TokenKind::Other(c as char),
                _ => {
                    // Report a whole UTF-8 character rather than one byte of it.
                    let end = (start + 4).min(self.bytes.len());
                    let ch = String::from_utf8_lossy(&self.bytes[start..end])
                        .chars()
                        .next()
                        .unwrap_or(char::REPLACEMENT_CHARACTER);
                    if ch != char::REPLACEMENT_CHARACTER {
                        self.i = start + ch.len_utf8();
                    }
                    TokenKind::Other(ch)
                }
            };
            return Ok(self.token(kind, start));
        }
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token {
        Token::new(kind, Span::new(start as u32, self.i as u32, self.line))
    }

    fn error(&self, msg: &str) -> CompileError {
        CompileError::syntax(msg, self.line)
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.i).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.i += 1;
        if c == b'\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn eat(&mut self, c: u8) -> bool {
        if self.peek() == Some(c) {
            self.i += 1;
            true
        } else {
            false
        }
    }

    fn pick(&mut self, next: u8, yes: TokenKind, no: TokenKind) -> TokenKind {
        if self.eat(next) { yes } else { no }
    }

    fn skip_spaces(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_ascii_whitespace() {
                break;
            }
            self.bump();
        }
    }

    fn skip_line(&mut self) {
        while let Some(c) = self.bump() {
            if c == b'\n' {
                break;
            }
        }
    }

    fn skip_block_comment(&mut self) {
        let mut prev = 0u8;
        while let Some(c) = self.bump() {
            if prev == b'*' && c == b'/' {
                return;
            }
            prev = c;
        }
    }

    fn lex_ident(&mut self, start: usize) -> Result<Token, CompileError> {
        while let Some(c) = self.peek() {
            if !(c == b'_' || c.is_ascii_alphanumeric()) {
                break;
            }
            self.i += 1;
        }
        if self.i - start > MAX_TOKEN_LEN {
            return Err(self.error("identifier too long"));
        }
        let bytes = &self.bytes[start..self.i];
        // Identifier bytes are ASCII by construction.
        let text = std::str::from_utf8(bytes).unwrap_or_default();
        let kind = keyword(text);
        let tok = self.token(kind, start);
        Ok(if kind == TokenKind::Ident {
            tok.with_value(TokenValue::Bytes(bytes.to_vec()))
        } else {
            tok
        })
    }

    fn lex_number(&mut self, start: usize) -> Result<Token, CompileError> {
        let mut is_float = false;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.i += 1;
        }
        if self.peek() == Some(b'.') && self.bytes.get(self.i + 1) != Some(&b'.') {
            is_float = true;
            self.i += 1;
            while self.peek().is_some_and(|b| b.is_ascii_digit()) {
                self.i += 1;
            }
        }
        if matches!(self.peek(), Some(b'e') | Some(b'E')) {
            is_float = true;
            self.i += 1;
            if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                self.i += 1;
            }
            while self.peek().is_some_and(|b| b.is_ascii_digit()) {
                self.i += 1;
            }
        }
        let text = std::str::from_utf8(&self.bytes[start..self.i]).unwrap_or("0");
        if text.len() > MAX_TOKEN_LEN {
            return Err(self.error("number too long"));
        }
        if is_float {
            let value = parse_float_prefix(text);
            Ok(self.token(TokenKind::Float, start).with_value(TokenValue::Float(value)))
        } else {
            let value = text.bytes().fold(0i64, |acc, d| {
                acc.wrapping_mul(10).wrapping_add(i64::from(d - b'0'))
            });
            Ok(self.token(TokenKind::Int, start).with_value(TokenValue::Int(value)))
        }
    }

    fn lex_radix(&mut self, start: usize, radix: u32) -> Result<Token, CompileError> {
        let mut value: i64 = 0;
        while let Some(d) = self.peek().and_then(|c| (c as char).to_digit(radix)) {
            value = value.wrapping_mul(i64::from(radix)).wrapping_add(i64::from(d));
            self.i += 1;
        }
        Ok(self.token(TokenKind::Int, start).with_value(TokenValue::Int(value)))
    }

    fn lex_string(&mut self, start: usize) -> Result<Token, CompileError> {
        let mut out = Vec::new();
        loop {
            let Some(c) = self.bump() else {
                return Err(self.error("end of file in literal string"));
            };
            if c == b'"' {
                break;
            }
            if c == b'\\' {
                let code = self.escape()?;
                push_utf8(&mut out, code).map_err(|_| self.error("invalid UTF-8 character"))?;
            } else {
                out.push(c);
            }
            if out.len() > MAX_TOKEN_LEN {
                return Err(self.error("string too long"));
            }
        }
        Ok(self.token(TokenKind::Str, start).with_value(TokenValue::Bytes(out)))
    }

    fn lex_char(&mut self, start: usize) -> Result<Token, CompileError> {
        let value = match self.bump() {
            Some(b'\\') => self.escape()?,
            Some(c) => u32::from(c),
            None => return Err(self.error("end of file in character constant")),
        };
        if !self.eat(b'\'') {
            return Err(self.error("Expecting a closing single quote"));
        }
        Ok(self
            .token(TokenKind::Int, start)
            .with_value(TokenValue::Int(i64::from(value))))
    }

    /// Decode the escape after a backslash into a character code.
    fn escape(&mut self) -> Result<u32, CompileError> {
        let Some(c) = self.bump() else {
            return Ok(u32::from(b'\\'));
        };
        Ok(match c {
            b'b' => 0x08,
            b'f' => 0x0c,
            b'n' => u32::from(b'\n'),
            b'r' => u32::from(b'\r'),
            b't' => u32::from(b'\t'),
            b'x' => self.collect_digits(16, 2),
            b'u' => self.collect_digits(16, 4),
            b'0'..=b'7' => {
                self.i -= 1;
                self.collect_digits(8, 3)
            }
            other => u32::from(other),
        })
    }

    fn collect_digits(&mut self, radix: u32, max: usize) -> u32 {
        let mut value = 0u32;
        for _ in 0..max {
            match self.peek().and_then(|c| (c as char).to_digit(radix)) {
                Some(d) => {
                    value = value * radix + d;
                    self.i += 1;
                }
                None => break,
            }
        }
        value
    }
}

fn push_utf8(out: &mut Vec<u8>, code: u32) -> Result<(), ()> {
    match code {
        0..=0x7f => out.push(code as u8),
        0x80..=0x7ff => {
            out.push(0xc0 | ((code >> 6) & 0x1f) as u8);
            out.push(0x80 | (code & 0x3f) as u8);
        }
        0x800..=0xffff => {
            out.push(0xe0 | ((code >> 12) & 0x0f) as u8);
            out.push(0x80 | ((code >> 6) & 0x3f) as u8);
            out.push(0x80 | (code & 0x3f) as u8);
        }
        _ => return Err(()),
    }
    Ok(())
}

/// Parse the longest valid float prefix, the way `atof` would.
fn parse_float_prefix(text: &str) -> f64 {
    if let Ok(v) = text.parse::<f64>() {
        return v;
    }
    // "1e" or "2.5e+" have a dangling exponent marker.
    let trimmed = text.trim_end_matches(['e', 'E', '+', '-']);
    trimmed.parse::<f64>().unwrap_or(0.0)
}
