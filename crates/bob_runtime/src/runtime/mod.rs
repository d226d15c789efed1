//! Interpreter context, configuration and the object model.

mod config;
mod gc;
mod interp;
mod loader;
mod print;
pub(crate) mod types;

pub use config::InterpreterConfig;
pub use interp::{ErrorHandler, Interpreter};
pub use types::TypeKind;
