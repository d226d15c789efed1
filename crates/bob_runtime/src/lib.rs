//! Bob language runtime.

#![allow(clippy::collapsible_if)]
#![allow(clippy::collapsible_else_if)]
#![allow(clippy::new_without_default)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::manual_range_contains)]
#![allow(clippy::unnecessary_cast)]
#![allow(clippy::len_zero)]
#![allow(clippy::type_complexity)]

pub mod core;
pub mod errors;
pub mod objfile;
pub mod vm;

mod builtins;
mod runtime;

// Re-exports from core/
pub use core::gc::GcStats;
pub use core::heap::{Heap, NativeResource};
pub use core::value::Value;

pub use errors::BobError;
pub use objfile::Persisted;
pub use runtime::{ErrorHandler, Interpreter, InterpreterConfig, TypeKind};
pub use vm::{Args, NativeFn, VirtualGetter, VirtualSetter};
