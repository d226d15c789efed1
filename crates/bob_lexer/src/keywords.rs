use bob_syntax::TokenKind;

static KEYWORDS: phf::Map<&'static str, TokenKind> = phf::phf_map! {
    "define" => TokenKind::KwDefine,
    "function" => TokenKind::KwFunction,
    "local" => TokenKind::KwLocal,
    "if" => TokenKind::KwIf,
    "else" => TokenKind::KwElse,
    "while" => TokenKind::KwWhile,
    "return" => TokenKind::KwReturn,
    "for" => TokenKind::KwFor,
    "break" => TokenKind::KwBreak,
    "continue" => TokenKind::KwContinue,
    "do" => TokenKind::KwDo,
    "switch" => TokenKind::KwSwitch,
    "case" => TokenKind::KwCase,
    "default" => TokenKind::KwDefault,
    "nil" => TokenKind::KwNil,
    "super" => TokenKind::KwSuper,
    "new" => TokenKind::KwNew,
    "try" => TokenKind::KwTry,
    "catch" => TokenKind::KwCatch,
    "finally" => TokenKind::KwFinally,
    "throw" => TokenKind::KwThrow,
};

/// Keyword kind for `s`, or `Ident` when it is an ordinary identifier.
pub fn keyword(s: &str) -> TokenKind {
    KEYWORDS.get(s).cloned().unwrap_or(TokenKind::Ident)
}
