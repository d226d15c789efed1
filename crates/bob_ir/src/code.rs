//! Compiler output.
//!
//! A `CodeUnit` is one function body: its bytecode and literal pool. The pool
//! mirrors the runtime layout of compiled code, where slot 0 holds the bytecode
//! string and slot 1 the function name, so literal operands index it directly.

/// Literal slot holding the unit's name (a string or nil).
pub const NAME_LITERAL: usize = 1;
/// First slot available for ordinary literals.
pub const FIRST_LITERAL: usize = 2;

#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Nil,
    Int(i64),
    Float(f64),
    Str(Vec<u8>),
    Symbol(Vec<u8>),
    Code(Box<CodeUnit>),
}

impl Literal {
    /// Literals the compiler shares within one pool. Strings and floats are
    /// always given a fresh slot.
    pub fn is_shareable(&self) -> bool {
        matches!(self, Literal::Nil | Literal::Int(_) | Literal::Symbol(_))
    }
}

/// Source line of the instruction starting at `pc`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineEntry {
    pub pc: u32,
    pub line: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CodeUnit {
    pub bytecode: Vec<u8>,
    /// Slot 0 is a placeholder for the bytecode, slot 1 the name.
    pub literals: Vec<Literal>,
    /// Empty unless line numbers were requested.
    pub lines: Vec<LineEntry>,
}

impl CodeUnit {
    pub fn new(name: Option<&[u8]>) -> Self {
        let name = match name {
            Some(n) => Literal::Str(n.to_vec()),
            None => Literal::Nil,
        };
        Self {
            bytecode: Vec::new(),
            literals: vec![Literal::Nil, name],
            lines: Vec::new(),
        }
    }

    pub fn name(&self) -> Option<&[u8]> {
        match self.literals.get(NAME_LITERAL) {
            Some(Literal::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// Line of the last recorded instruction at or before `pc`.
    pub fn line_for_pc(&self, pc: usize) -> Option<u32> {
        let idx = self.lines.partition_point(|e| e.pc as usize <= pc);
        idx.checked_sub(1).map(|i| self.lines[i].line)
    }
}
