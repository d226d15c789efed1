//! Code buffer for one function body.
//!
//! Forward branches are resolved through fixup chains: each unresolved operand
//! word holds the address of the previous operand waiting on the same target,
//! and `fixup` walks the chain rewriting every link with the real address.
//! Address 0 always holds the frame header, so 0 terminates a chain.

use bob_ir::{CodeUnit, FIRST_LITERAL, LineEntry, Literal, Op, read_u16};
use bob_syntax::CompileErrorKind;

/// Chain terminator.
pub const NO_CHAIN: u16 = 0;

/// Largest addressable code offset (branch operands are 16 bits).
pub const MAX_CODE: usize = 0xffff;
/// Largest literal index.
pub const MAX_LITERALS: usize = 0xffff;

pub(crate) struct Emitter {
    unit: CodeUnit,
    emit_lines: bool,
    line: u32,
    line_changed: bool,
}

impl Emitter {
    pub fn new(name: Option<&[u8]>, emit_lines: bool, line: u32) -> Self {
        Self {
            unit: CodeUnit::new(name),
            emit_lines,
            line,
            line_changed: false,
        }
    }

    pub fn addr(&self) -> u16 {
        self.unit.bytecode.len() as u16
    }

    /// Record that the scanner moved to `line`; the next byte emitted opens
    /// a line table entry.
    pub fn set_line(&mut self, line: u32) {
        if line != self.line {
            self.line = line;
            self.line_changed = true;
        }
    }

    /// Start line tracking at the current line (used after the frame header).
    pub fn mark_line(&mut self) {
        self.line_changed = true;
    }

    /// Keep the next byte out of the line table.
    pub fn hold_line(&mut self) {
        self.line_changed = false;
    }

    pub fn put_byte(&mut self, b: u8) -> Result<u16, CompileErrorKind> {
        let addr = self.unit.bytecode.len();
        if addr >= MAX_CODE {
            return Err(CompileErrorKind::TooMuchCode);
        }
        if self.emit_lines && self.line_changed {
            self.line_changed = false;
            self.unit.lines.push(LineEntry {
                pc: addr as u32,
                line: self.line,
            });
        }
        self.unit.bytecode.push(b);
        Ok(addr as u16)
    }

    pub fn put_op(&mut self, op: Op) -> Result<u16, CompileErrorKind> {
        self.put_byte(op as u8)
    }

    pub fn put_word(&mut self, w: u16) -> Result<u16, CompileErrorKind> {
        let addr = self.unit.bytecode.len();
        if addr + 2 > MAX_CODE {
            return Err(CompileErrorKind::TooMuchCode);
        }
        self.unit.bytecode.extend_from_slice(&w.to_le_bytes());
        Ok(addr as u16)
    }

    pub fn patch_byte(&mut self, at: u16, b: u8) {
        if let Some(slot) = self.unit.bytecode.get_mut(at as usize) {
            *slot = b;
        }
    }

    /// Resolve every link of `chain` to `target`.
    pub fn fixup(&mut self, mut chain: u16, target: u16) {
        let code = &mut self.unit.bytecode;
        while chain != NO_CHAIN {
            let at = chain as usize;
            let next = read_u16(code, at);
            code[at..at + 2].copy_from_slice(&target.to_le_bytes());
            chain = next;
        }
    }

    /// Index of `lit` in the literal pool. Shareable literals are reused.
    pub fn literal(&mut self, lit: Literal) -> Result<u16, CompileErrorKind> {
        if lit.is_shareable() {
            if let Some(pos) = self.unit.literals[FIRST_LITERAL..]
                .iter()
                .position(|l| *l == lit)
            {
                return Ok((FIRST_LITERAL + pos) as u16);
            }
        }
        let idx = self.unit.literals.len();
        if idx > MAX_LITERALS {
            return Err(CompileErrorKind::TooManyLiterals);
        }
        self.unit.literals.push(lit);
        Ok(idx as u16)
    }

    pub fn finish(self) -> CodeUnit {
        self.unit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixup_rewrites_every_link() {
        let mut e = Emitter::new(None, false, 1);
        e.put_op(Op::AFrame).unwrap();
        e.put_byte(2).unwrap();
        e.put_byte(0).unwrap();
        e.put_op(Op::Brt).unwrap();
        let first = e.put_word(NO_CHAIN).unwrap();
        e.put_op(Op::Brt).unwrap();
        let second = e.put_word(first).unwrap();
        e.put_op(Op::T).unwrap();
        let target = e.addr();
        e.fixup(second, target);
        let unit = e.finish();
        assert_eq!(read_u16(&unit.bytecode, first as usize), target);
        assert_eq!(read_u16(&unit.bytecode, second as usize), target);
    }

    #[test]
    fn shareable_literals_are_reused() {
        let mut e = Emitter::new(None, false, 1);
        let a = e.literal(Literal::Int(7)).unwrap();
        let b = e.literal(Literal::Int(7)).unwrap();
        let s1 = e.literal(Literal::Str(b"x".to_vec())).unwrap();
        let s2 = e.literal(Literal::Str(b"x".to_vec())).unwrap();
        assert_eq!(a, b);
        assert_eq!(a as usize, FIRST_LITERAL);
        assert_ne!(s1, s2);
    }

    #[test]
    fn line_entries_follow_line_changes() {
        let mut e = Emitter::new(None, true, 1);
        e.put_op(Op::AFrame).unwrap();
        e.mark_line();
        e.put_op(Op::Nil).unwrap();
        e.put_op(Op::Push).unwrap();
        e.set_line(3);
        e.put_op(Op::T).unwrap();
        let unit = e.finish();
        assert_eq!(
            unit.lines,
            vec![LineEntry { pc: 1, line: 1 }, LineEntry { pc: 3, line: 3 }]
        );
    }

    #[test]
    fn code_size_is_bounded() {
        let mut e = Emitter::new(None, false, 1);
        for _ in 0..MAX_CODE {
            e.put_op(Op::Nil).unwrap();
        }
        assert_eq!(e.put_op(Op::Nil), Err(CompileErrorKind::TooMuchCode));
    }
}
