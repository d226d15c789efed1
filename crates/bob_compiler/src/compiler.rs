//! Compiler state and entry points.
//!
//! Parsing and code generation are one pass: each `expr*`/statement method
//! consumes tokens and emits bytecode directly into the current function's
//! `Emitter`. Nested function bodies swap in a fresh `FunctionState` and
//! restore the outer one when the body is finished.

use std::mem;

use bob_ir::{CodeUnit, Literal, Op};
use bob_lexer::Lexer;
use bob_syntax::{CompileError, CompileErrorKind, Token, TokenKind};
use bumpalo::Bump;

use crate::emit::{Emitter, NO_CHAIN};
use crate::scope::Scopes;

#[derive(Clone, Copy, Debug, Default)]
pub struct CompileOptions {
    /// Record a pc to line table in every code unit.
    pub emit_line_numbers: bool,
}

/// Where a partial expression lives. Everything except `Value` can be loaded
/// from and stored into; the store code for `Property` and `Index` expects the
/// object (and for stores the tag) already pushed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Place {
    /// Already in the value register.
    Value,
    /// `true`, `false` or `nil`; loads with the given opcode.
    Constant(Op),
    Argument { level: u8, offset: u8 },
    /// Global symbol at the given literal index.
    Global(u16),
    /// Object on the stack, tag in the value register.
    Property,
    /// Vector or string on the stack, index in the value register.
    Index,
}

pub(crate) struct BreakTarget {
    pub chain: u16,
    pub level: u32,
    pub try_depth: u32,
}

pub(crate) struct ContinueTarget {
    /// Known loop address, or `None` while the target is still ahead.
    pub target: Option<u16>,
    pub chain: u16,
    pub level: u32,
    pub try_depth: u32,
}

pub(crate) struct Case {
    pub value: Literal,
    pub literal: u16,
    pub label: u16,
}

#[derive(Default)]
pub(crate) struct SwitchContext {
    pub cases: Vec<Case>,
    pub default: Option<u16>,
}

/// Per function body.
pub(crate) struct FunctionState {
    pub emitter: Emitter,
    /// Block frames opened since the function entry.
    pub block_level: u32,
    /// Active `try` handlers since the function entry.
    pub try_depth: u32,
    pub breaks: Vec<BreakTarget>,
    pub continues: Vec<ContinueTarget>,
    pub switches: Vec<SwitchContext>,
}

impl FunctionState {
    pub fn new(name: Option<&[u8]>, emit_lines: bool, line: u32) -> Self {
        Self {
            emitter: Emitter::new(name, emit_lines, line),
            block_level: 0,
            try_depth: 0,
            breaks: Vec::new(),
            continues: Vec::new(),
            switches: Vec::new(),
        }
    }
}

/// Bob compiler.
///
/// Each call to `next_unit` compiles one top-level statement into a thunk:
/// an argumentless code unit whose value is the statement's value.
pub struct Compiler<'a, 'b> {
    pub(crate) lexer: Lexer<'a>,
    pub(crate) scopes: Scopes<'b>,
    pub(crate) cur: FunctionState,
    /// Function bodies currently open around `cur`.
    pub(crate) nesting: u32,
    pub(crate) options: CompileOptions,
}

impl<'a, 'b> Compiler<'a, 'b> {
    pub fn new(source: &'a [u8], bump: &'b Bump, options: CompileOptions) -> Self {
        Self {
            lexer: Lexer::from_bytes(source),
            scopes: Scopes::new(bump),
            cur: FunctionState::new(None, options.emit_line_numbers, 1),
            nesting: 0,
            options,
        }
    }

    /// Line the scanner is on.
    pub fn line(&self) -> u32 {
        self.lexer.line()
    }

    /// Compile the next top-level statement. `Ok(None)` at end of input.
    pub fn next_unit(&mut self) -> Result<Option<CodeUnit>, CompileError> {
        self.scopes.clear();
        self.nesting = 0;
        let line = self.lexer.line();
        self.cur = FunctionState::new(None, self.options.emit_line_numbers, line);

        let tok = self.token()?;
        if tok.kind == TokenKind::Eof {
            return Ok(None);
        }
        self.save(tok);

        self.cur.emitter.hold_line();
        self.op(Op::AFrame)?;
        self.byte(2)?;
        self.byte(0)?;
        self.cur.emitter.mark_line();

        self.statement()?;
        self.op(Op::Return)?;

        let line = self.lexer.line();
        let done = mem::replace(
            &mut self.cur,
            FunctionState::new(None, self.options.emit_line_numbers, line),
        );
        Ok(Some(done.emitter.finish()))
    }

    // ---- tokens ----

    pub(crate) fn token(&mut self) -> Result<Token, CompileError> {
        let tok = self.lexer.next_token()?;
        self.cur.emitter.set_line(tok.line());
        Ok(tok)
    }

    pub(crate) fn save(&mut self, tok: Token) {
        self.lexer.save_token(tok);
    }

    /// Next token if it is `kind`; otherwise the token is pushed back.
    pub(crate) fn accept(&mut self, kind: TokenKind) -> Result<Option<Token>, CompileError> {
        let tok = self.token()?;
        if tok.kind == kind {
            Ok(Some(tok))
        } else {
            self.save(tok);
            Ok(None)
        }
    }

    pub(crate) fn require(&self, tok: &Token, kind: TokenKind) -> Result<(), CompileError> {
        if tok.kind == kind {
            return Ok(());
        }
        Err(self.error(format!(
            "Expecting '{}', found '{}'",
            kind.name(),
            tok.kind.name()
        )))
    }

    pub(crate) fn frequire(&mut self, kind: TokenKind) -> Result<Token, CompileError> {
        let tok = self.token()?;
        self.require(&tok, kind)?;
        Ok(tok)
    }

    pub(crate) fn error(&self, message: impl Into<String>) -> CompileError {
        CompileError::syntax(message, self.lexer.line())
    }

    fn fail(&self, kind: CompileErrorKind) -> CompileError {
        CompileError::new(kind, self.lexer.line())
    }

    // ---- emission ----

    pub(crate) fn addr(&self) -> u16 {
        self.cur.emitter.addr()
    }

    pub(crate) fn op(&mut self, op: Op) -> Result<u16, CompileError> {
        self.cur.emitter.put_op(op).map_err(|k| self.fail(k))
    }

    pub(crate) fn byte(&mut self, b: u8) -> Result<u16, CompileError> {
        self.cur.emitter.put_byte(b).map_err(|k| self.fail(k))
    }

    pub(crate) fn word(&mut self, w: u16) -> Result<u16, CompileError> {
        self.cur.emitter.put_word(w).map_err(|k| self.fail(k))
    }

    /// Emit a branch whose operand links into `chain`; returns the new chain head.
    pub(crate) fn branch(&mut self, op: Op, chain: u16) -> Result<u16, CompileError> {
        self.op(op)?;
        self.word(chain)
    }

    pub(crate) fn fixup(&mut self, chain: u16, target: u16) {
        self.cur.emitter.fixup(chain, target);
    }

    pub(crate) fn fixup_here(&mut self, chain: u16) {
        let here = self.addr();
        self.fixup(chain, here);
    }

    pub(crate) fn literal(&mut self, lit: Literal) -> Result<u16, CompileError> {
        self.cur.emitter.literal(lit).map_err(|k| self.fail(k))
    }

    pub(crate) fn code_literal(&mut self, idx: u16) -> Result<(), CompileError> {
        self.op(Op::Lit)?;
        self.word(idx)?;
        Ok(())
    }

    pub(crate) fn lit_symbol(&mut self, name: &[u8]) -> Result<(), CompileError> {
        let idx = self.literal(Literal::Symbol(name.to_vec()))?;
        self.code_literal(idx)
    }

    pub(crate) fn small(&self, n: usize, what: &str) -> Result<u8, CompileError> {
        u8::try_from(n).map_err(|_| self.error(format!("Too many {what}")))
    }

    /// Emit `count` UNFRAMEs and `tries` ENDTRYs to leave nested blocks.
    pub(crate) fn unwind(&mut self, count: u32, tries: u32) -> Result<(), CompileError> {
        for _ in 0..tries {
            self.op(Op::EndTry)?;
        }
        for _ in 0..count {
            self.op(Op::Unframe)?;
        }
        Ok(())
    }

    // ---- places ----

    pub(crate) fn find_variable(&mut self, name: &[u8]) -> Result<Place, CompileError> {
        match name {
            b"true" => return Ok(Place::Constant(Op::T)),
            b"false" | b"nil" => return Ok(Place::Constant(Op::Nil)),
            _ => {}
        }
        if let Some((level, offset)) = self.scopes.find(name) {
            return Ok(Place::Argument {
                level: self.small(level, "nested scopes")?,
                offset: self.small(offset, "variables in one scope")?,
            });
        }
        let idx = self.literal(Literal::Symbol(name.to_vec()))?;
        Ok(Place::Global(idx))
    }

    pub(crate) fn load(&mut self, place: Place) -> Result<(), CompileError> {
        match place {
            Place::Value => {}
            Place::Constant(op) => {
                self.op(op)?;
            }
            Place::Argument { level, offset } => {
                self.op(Op::Eref)?;
                self.byte(level)?;
                self.byte(offset)?;
            }
            Place::Global(idx) => {
                self.op(Op::Gref)?;
                self.word(idx)?;
            }
            Place::Property => {
                self.op(Op::Getp)?;
            }
            Place::Index => {
                self.op(Op::Vref)?;
            }
        }
        Ok(())
    }

    pub(crate) fn store(&mut self, place: Place) -> Result<(), CompileError> {
        match place {
            Place::Value => return Err(self.error("Expecting an lvalue")),
            Place::Constant(_) => return Err(self.fail(CompileErrorKind::StoreIntoConstant)),
            Place::Argument { level, offset } => {
                self.op(Op::Eset)?;
                self.byte(level)?;
                self.byte(offset)?;
            }
            Place::Global(idx) => {
                self.op(Op::Gset)?;
                self.word(idx)?;
            }
            Place::Property => {
                self.op(Op::Setp)?;
            }
            Place::Index => {
                self.op(Op::Vset)?;
            }
        }
        Ok(())
    }

    /// Before a simple assignment: push the tag so the store finds it on the stack.
    pub(crate) fn push_place(&mut self, place: Place) -> Result<(), CompileError> {
        if matches!(place, Place::Property | Place::Index) {
            self.op(Op::Push)?;
        }
        Ok(())
    }

    /// Before a compound assignment: keep object and tag for the later store.
    pub(crate) fn dup_place(&mut self, place: Place) -> Result<(), CompileError> {
        if matches!(place, Place::Property | Place::Index) {
            self.op(Op::Dup2)?;
        }
        Ok(())
    }

    /// Load `place` into the value register if it is not there already.
    pub(crate) fn rvalue(&mut self, place: Place) -> Result<Place, CompileError> {
        self.load(place)?;
        Ok(Place::Value)
    }

    pub(crate) fn check_lvalue(&self, place: Place) -> Result<(), CompileError> {
        if place == Place::Value {
            return Err(self.error("Expecting an lvalue"));
        }
        Ok(())
    }

    pub(crate) fn variable_ref(&mut self, name: &[u8]) -> Result<(), CompileError> {
        let place = self.find_variable(name)?;
        self.load(place)
    }

    /// Load a function argument by name; `false` when no such argument is in scope.
    pub(crate) fn load_argument(&mut self, name: &[u8]) -> Result<bool, CompileError> {
        let Some((level, offset)) = self.scopes.find(name) else {
            return Ok(false);
        };
        let place = Place::Argument {
            level: self.small(level, "nested scopes")?,
            offset: self.small(offset, "variables in one scope")?,
        };
        self.load(place)?;
        Ok(true)
    }

    // ---- context stacks ----

    pub(crate) fn push_break(&mut self, chain: u16) {
        let target = BreakTarget {
            chain,
            level: self.cur.block_level,
            try_depth: self.cur.try_depth,
        };
        self.cur.breaks.push(target);
    }

    /// Pop the innermost break context and return its pending chain.
    pub(crate) fn pop_break(&mut self) -> u16 {
        self.cur.breaks.pop().map_or(NO_CHAIN, |b| b.chain)
    }

    pub(crate) fn push_continue(&mut self, target: Option<u16>) {
        let target = ContinueTarget {
            target,
            chain: NO_CHAIN,
            level: self.cur.block_level,
            try_depth: self.cur.try_depth,
        };
        self.cur.continues.push(target);
    }

    /// Pop the innermost continue context and return the chain of forward
    /// `continue` jumps that still need a target.
    pub(crate) fn pop_continue(&mut self) -> u16 {
        self.cur.continues.pop().map_or(NO_CHAIN, |c| c.chain)
    }

    /// True at the outermost level of a top-level statement.
    pub(crate) fn at_top_level(&self) -> bool {
        self.nesting == 0 && self.scopes.is_empty()
    }

    pub(crate) fn new_function_state(&self, name: Option<&[u8]>) -> FunctionState {
        FunctionState::new(name, self.options.emit_line_numbers, self.lexer.line())
    }
}

impl Iterator for Compiler<'_, '_> {
    type Item = Result<CodeUnit, CompileError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_unit().transpose()
    }
}

/// Compile a whole source text into its sequence of thunks.
pub fn compile_source(
    source: &[u8],
    options: CompileOptions,
) -> Result<Vec<CodeUnit>, CompileError> {
    let bump = Bump::new();
    let mut compiler = Compiler::new(source, &bump, options);
    let mut units = Vec::new();
    while let Some(unit) = compiler.next_unit()? {
        units.push(unit);
    }
    Ok(units)
}
