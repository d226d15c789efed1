use bob_lexer::Lexer;
use bob_syntax::TokenKind;
use proptest::prelude::*;
use proptest::test_runner::Config as ProptestConfig;

fn any_bob_like() -> impl Strategy<Value = String> {
    let ascii =
        proptest::collection::vec(any::<char>().prop_filter("ascii", |c| c.is_ascii()), 0..40)
            .prop_map(|v| v.into_iter().collect::<String>());
    let unicode = proptest::collection::vec(
        any::<char>().prop_filter("non-ascii", |c| !c.is_ascii()),
        0..20,
    )
    .prop_map(|v| v.into_iter().collect::<String>());
    let sym = "define f(a,b=2){ return a+b; } \\[1,2] \\{x: 1} 0x1f 'a' \"s\\n\" /* c */ // c\n <<= >>= .. \\sym"
        .to_string();
    (ascii, unicode, any::<bool>()).prop_map(move |(a, b, f)| {
        let mut s = String::new();
        s.push_str(&a);
        if f {
            s.push_str(&sym);
        }
        s.push_str(&b);
        s.chars().take(200).collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64, max_shrink_iters: 200, .. ProptestConfig::default()
    })]
    #[test]
    fn lex_random_input_should_not_panic(s in any_bob_like()) {
        let result = Lexer::new(&s).lex();
        // Either an error was reported or the stream ends with EOF.
        if result.error.is_none() {
            assert!(matches!(result.tokens.last().map(|t| t.kind), Some(TokenKind::Eof)));
        }
    }
}
