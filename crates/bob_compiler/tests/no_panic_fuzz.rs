use bob_compiler::{CompileOptions, compile_source};
use proptest::prelude::*;

const PIECES: &[&str] = &[
    "define", "f", "(", ")", "{", "}", "[", "]", "local", "x", "=", "+=", ";", ",", ".", "..",
    "if", "else", "while", "for", "do", "switch", "case", "default", ":", "break", "continue",
    "return", "try", "catch", "finally", "throw", "new", "super", "function", "\\", "1", "2.5",
    "\"s\"", "nil", "true", "?", "||", "&&", "++", "--", "-", "!", "<<", "==",
];

fn source() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(PIECES), 0..48).prop_map(|v| v.join(" "))
}

proptest! {
    #[test]
    fn compiler_never_panics(src in source()) {
        let _ = compile_source(src.as_bytes(), CompileOptions { emit_line_numbers: true });
    }
}

#[test]
fn valid_programs_compile() {
    let programs = [
        "define fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }",
        "define Point.initialize(x, y) { this.x = x; this.y = y; this; }",
        "for (i = 0; i < 10; ++i) { if (i == 5) break; else continue; }",
        "do { x -= 1; } while (x > 0);",
        "switch (c) { case \\a: 1; break; case \"s\": 2; default: 3; }",
        "try { throw 1; } catch (e) { print(e); } finally { done = true; }",
        "f = function (a, b = a * 2, rest..) { [a, b, rest]; };",
        "o = \\{ Point x: 1, y: 2 }; o.(\\x) = 3;",
        "x = a ? b : c, y = ~z << 2;",
    ];
    for src in programs {
        if let Err(e) = compile_source(src.as_bytes(), CompileOptions::default()) {
            panic!("{src}: {e}");
        }
    }
}
