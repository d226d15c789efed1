use bob_lexer::Lexer;
use bob_syntax::TokenKind;

fn one(src: &str) -> TokenKind {
    let mut lx = Lexer::new(src);
    let t = lx.next_token().expect("token");
    assert_eq!(
        lx.next_token().expect("eof").kind,
        TokenKind::Eof,
        "{src:?} should be a single token"
    );
    t.kind
}

#[test]
fn compound_operators_are_maximal_munch() {
    let cases = [
        ("<<=", TokenKind::ShlEq),
        (">>=", TokenKind::ShrEq),
        ("<<", TokenKind::Shl),
        (">>", TokenKind::Shr),
        ("<=", TokenKind::Le),
        (">=", TokenKind::Ge),
        ("==", TokenKind::EqEq),
        ("!=", TokenKind::Ne),
        ("&&", TokenKind::AndAnd),
        ("||", TokenKind::OrOr),
        ("++", TokenKind::Inc),
        ("--", TokenKind::Dec),
        ("+=", TokenKind::PlusEq),
        ("-=", TokenKind::MinusEq),
        ("*=", TokenKind::StarEq),
        ("/=", TokenKind::SlashEq),
        ("%=", TokenKind::PercentEq),
        ("&=", TokenKind::AmpEq),
        ("|=", TokenKind::PipeEq),
        ("^=", TokenKind::CaretEq),
        ("..", TokenKind::DotDot),
        ("\\", TokenKind::Backslash),
    ];
    for (src, kind) in cases {
        assert_eq!(one(src), kind, "{src}");
    }
}

#[test]
fn unknown_characters_are_reported_by_name() {
    assert_eq!(one("@"), TokenKind::Other('@'));
    assert_eq!(one("€"), TokenKind::Other('€'));
    assert_eq!(TokenKind::Other('@').name(), "@");
}

#[test]
fn rest_parameter_marker_after_identifier() {
    let r = Lexer::new("args..").lex();
    let k: Vec<_> = r.tokens.iter().map(|t| t.kind).collect();
    assert_eq!(k, vec![TokenKind::Ident, TokenKind::DotDot, TokenKind::Eof]);
}
