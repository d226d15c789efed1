//! Bytecode virtual machine.
//!
//! A value register, one value stack, a frame stack for calls and blocks,
//! and a handler stack for `TRY`.

mod dispatch;
mod exception;
pub(crate) mod ops;
mod stack;

pub use stack::{Args, NativeFn, VirtualGetter, VirtualSetter};
pub(crate) use stack::{CallFrame, Frame, Handler, Machine};
