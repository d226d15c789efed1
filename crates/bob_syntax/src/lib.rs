//! Shared syntax definitions for the Bob toolchain.
//!
//! Tokens, source positions and the compile-time error taxonomy used by the
//! scanner and the compiler.

mod error;
mod span;
mod token;

pub use error::{CompileError, CompileErrorKind, codes};
pub use span::{ByteIndex, Span};
pub use token::{Token, TokenKind, TokenValue};
