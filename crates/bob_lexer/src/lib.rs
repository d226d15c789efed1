//! Bob scanner.
//!
//! Turns source text into tokens on demand, with exactly one token of
//! lookahead for the single-pass compiler.

mod keywords;
mod lexer;

pub use keywords::keyword;
pub use lexer::{LexResult, Lexer, MAX_TOKEN_LEN};
