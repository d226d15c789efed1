//! Bytecode definitions shared by the compiler and the virtual machine.
//!
//! The opcode byte values are part of the object-file format and never change.

mod code;
mod disasm;
mod opcode;

pub use code::{CodeUnit, LineEntry, Literal, FIRST_LITERAL, NAME_LITERAL};
pub use disasm::{decode_instruction, disassemble};
pub use opcode::{Op, OperandFormat, read_u16};
