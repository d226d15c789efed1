use bob_lexer::Lexer;
use bob_syntax::{TokenKind, TokenValue};

fn kinds(src: &str) -> Vec<TokenKind> {
    let r = Lexer::new(src).lex();
    assert!(r.error.is_none(), "{:?}", r.error);
    r.tokens.into_iter().map(|t| t.kind).collect()
}

#[test]
fn lex_define_function() {
    let k = kinds("define f(a, b = 2) { return a + b; }");
    assert_eq!(
        k,
        vec![
            TokenKind::KwDefine,
            TokenKind::Ident,
            TokenKind::LParen,
            TokenKind::Ident,
            TokenKind::Comma,
            TokenKind::Ident,
            TokenKind::Assign,
            TokenKind::Int,
            TokenKind::RParen,
            TokenKind::LBrace,
            TokenKind::KwReturn,
            TokenKind::Ident,
            TokenKind::Plus,
            TokenKind::Ident,
            TokenKind::Semi,
            TokenKind::RBrace,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn true_and_false_are_identifiers() {
    assert_eq!(
        kinds("true false nil"),
        vec![TokenKind::Ident, TokenKind::Ident, TokenKind::KwNil, TokenKind::Eof]
    );
}

#[test]
fn numbers_in_every_radix() {
    let r = Lexer::new("42 0x1F 017 'A' 3.5 .25 1e3 08").lex();
    let values: Vec<TokenValue> = r.tokens.into_iter().map(|t| t.value).collect();
    assert_eq!(
        values,
        vec![
            TokenValue::Int(42),
            TokenValue::Int(31),
            TokenValue::Int(15),
            TokenValue::Int(65),
            TokenValue::Float(3.5),
            TokenValue::Float(0.25),
            TokenValue::Float(1000.0),
            TokenValue::Int(8),
            TokenValue::None,
        ]
    );
}

#[test]
fn string_escapes_are_decoded() {
    let mut lx = Lexer::new(r#""a\tb\n\x41\101é\"""#);
    let t = lx.next_token().expect("token");
    assert_eq!(t.kind, TokenKind::Str);
    let mut expected = b"a\tb\nAA".to_vec();
    expected.extend_from_slice("é".as_bytes());
    expected.push(b'"');
    assert_eq!(t.bytes(), expected.as_slice());
}

#[test]
fn comments_are_skipped_and_lines_counted() {
    let mut lx = Lexer::new("#!/usr/bin/env bob\n// one\n/* two\nthree */ x");
    let t = lx.next_token().expect("token");
    assert_eq!(t.kind, TokenKind::Ident);
    assert_eq!(t.line(), 4);
}

#[test]
fn save_token_gives_one_token_of_lookahead() {
    let mut lx = Lexer::new("a b");
    let a = lx.next_token().expect("a");
    lx.save_token(a.clone());
    assert_eq!(lx.next_token().expect("again"), a);
    assert_eq!(lx.next_token().expect("b").text(), "b");
}

#[test]
fn unterminated_string_is_an_error() {
    let r = Lexer::new("x = \"abc\n").lex();
    let err = r.error.expect("error");
    assert!(err.to_string().contains("end of file in literal string"), "{err}");
    assert_eq!(err.line, 2);
}

#[test]
fn oversize_identifier_is_an_error() {
    let src = "a".repeat(bob_lexer::MAX_TOKEN_LEN + 1);
    let r = Lexer::new(&src).lex();
    assert!(r.error.is_some());
}
