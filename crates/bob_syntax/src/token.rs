//! Token definitions.
//!
//! Defines all tokens of the Bob language: literals, identifiers, keywords,
//! operators and delimiters. `TokenKind::name` gives the spelling used in
//! "Expecting ..., found ..." diagnostics.
use crate::Span;

/// Token kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// String literal.
    Str,
    /// Identifier.
    Ident,
    /// Integer literal (including character constants).
    Int,
    /// Float literal.
    Float,

    /// `define`
    KwDefine,
    /// `function`
    KwFunction,
    /// `local`
    KwLocal,
    /// `if`
    KwIf,
    /// `else`
    KwElse,
    /// `while`
    KwWhile,
    /// `return`
    KwReturn,
    /// `for`
    KwFor,
    /// `break`
    KwBreak,
    /// `continue`
    KwContinue,
    /// `do`
    KwDo,
    /// `switch`
    KwSwitch,
    /// `case`
    KwCase,
    /// `default`
    KwDefault,
    /// `nil`
    KwNil,
    /// `super`
    KwSuper,
    /// `new`
    KwNew,
    /// `try`
    KwTry,
    /// `catch`
    KwCatch,
    /// `finally`
    KwFinally,
    /// `throw`
    KwThrow,

    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `,`
    Comma,
    /// `;`
    Semi,
    /// `:`
    Colon,
    /// `?`
    Question,
    /// `.`
    Dot,
    /// `..`
    DotDot,
    /// `\`
    Backslash,

    /// `=`
    Assign,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `&`
    Amp,
    /// `|`
    Pipe,
    /// `^`
    Caret,
    /// `~`
    Tilde,
    /// `!`
    Bang,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    Le,
    /// `>=`
    Ge,
    /// `==`
    EqEq,
    /// `!=`
    Ne,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
    /// `++`
    Inc,
    /// `--`
    Dec,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,
    AmpEq,
    PipeEq,
    CaretEq,
    ShlEq,
    ShrEq,

    /// Any other single character; the scanner keeps it so the parser can
    /// report it by name.
    Other(char),

    /// End of file.
    Eof,
}

impl TokenKind {
    /// Display name of the token kind.
    pub fn name(self) -> String {
        let s = match self {
            TokenKind::Str => "<string>",
            TokenKind::Ident => "<identifier>",
            TokenKind::Int => "<integer>",
            TokenKind::Float => "<float>",
            TokenKind::KwDefine => "define",
            TokenKind::KwFunction => "function",
            TokenKind::KwLocal => "local",
            TokenKind::KwIf => "if",
            TokenKind::KwElse => "else",
            TokenKind::KwWhile => "while",
            TokenKind::KwReturn => "return",
            TokenKind::KwFor => "for",
            TokenKind::KwBreak => "break",
            TokenKind::KwContinue => "continue",
            TokenKind::KwDo => "do",
            TokenKind::KwSwitch => "switch",
            TokenKind::KwCase => "case",
            TokenKind::KwDefault => "default",
            TokenKind::KwNil => "nil",
            TokenKind::KwSuper => "super",
            TokenKind::KwNew => "new",
            TokenKind::KwTry => "try",
            TokenKind::KwCatch => "catch",
            TokenKind::KwFinally => "finally",
            TokenKind::KwThrow => "throw",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Comma => ",",
            TokenKind::Semi => ";",
            TokenKind::Colon => ":",
            TokenKind::Question => "?",
            TokenKind::Dot => ".",
            TokenKind::DotDot => "..",
            TokenKind::Backslash => "\\",
            TokenKind::Assign => "=",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Amp => "&",
            TokenKind::Pipe => "|",
            TokenKind::Caret => "^",
            TokenKind::Tilde => "~",
            TokenKind::Bang => "!",
            TokenKind::Lt => "<",
            TokenKind::Gt => ">",
            TokenKind::Le => "<=",
            TokenKind::Ge => ">=",
            TokenKind::EqEq => "==",
            TokenKind::Ne => "!=",
            TokenKind::Shl => "<<",
            TokenKind::Shr => ">>",
            TokenKind::AndAnd => "&&",
            TokenKind::OrOr => "||",
            TokenKind::Inc => "++",
            TokenKind::Dec => "--",
            TokenKind::PlusEq => "+=",
            TokenKind::MinusEq => "-=",
            TokenKind::StarEq => "*=",
            TokenKind::SlashEq => "/=",
            TokenKind::PercentEq => "%=",
            TokenKind::AmpEq => "&=",
            TokenKind::PipeEq => "|=",
            TokenKind::CaretEq => "^=",
            TokenKind::ShlEq => "<<=",
            TokenKind::ShrEq => ">>=",
            TokenKind::Other(c) => return c.to_string(),
            TokenKind::Eof => "<eof>",
        };
        s.to_string()
    }
}

/// Decoded literal payload of a token.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum TokenValue {
    #[default]
    None,
    Int(i64),
    Float(f64),
    /// Identifier name or decoded string bytes.
    Bytes(Vec<u8>),
}

/// Token.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    /// Token kind.
    pub kind: TokenKind,
    /// Span in source text.
    pub span: Span,
    /// Literal payload.
    pub value: TokenValue,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self {
            kind,
            span,
            value: TokenValue::None,
        }
    }

    pub fn with_value(mut self, value: TokenValue) -> Self {
        self.value = value;
        self
    }

    pub fn line(&self) -> u32 {
        self.span.line
    }

    /// Identifier or string text, lossily decoded.
    pub fn text(&self) -> String {
        match &self.value {
            TokenValue::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
            TokenValue::Int(n) => n.to_string(),
            TokenValue::Float(f) => f.to_string(),
            TokenValue::None => self.kind.name(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        match &self.value {
            TokenValue::Bytes(b) => b,
            _ => &[],
        }
    }
}
