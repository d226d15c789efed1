//! Single-pass compiler from Bob source to bytecode.
//!
//! There is no syntax tree: the recursive-descent parser emits code as it
//! recognizes constructs. Every top-level statement becomes a thunk
//! (`CodeUnit` with no parameters) and every function body a nested
//! `CodeUnit` stored as a literal of its enclosing unit.
mod compiler;
mod emit;
mod expr;
mod scope;
mod stmt;

pub use compiler::{CompileOptions, Compiler, compile_source};
pub use emit::{MAX_CODE, MAX_LITERALS};
