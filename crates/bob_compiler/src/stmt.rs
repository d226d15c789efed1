//! Statements, blocks and function bodies.

use std::mem;

use bob_ir::{Literal, Op};
use bob_syntax::{CompileError, TokenKind, TokenValue};

use crate::compiler::{Case, Compiler, SwitchContext};
use crate::emit::NO_CHAIN;
use crate::expr::token_literal;
use crate::scope::HIDDEN;

impl<'a, 'b> Compiler<'a, 'b> {
    pub(crate) fn statement(&mut self) -> Result<(), CompileError> {
        let tok = self.token()?;
        match tok.kind {
            TokenKind::KwDefine => self.define(),
            TokenKind::KwIf => self.if_statement(),
            TokenKind::KwWhile => self.while_statement(),
            TokenKind::KwDo => self.do_statement(),
            TokenKind::KwFor => self.for_statement(),
            TokenKind::KwBreak => self.break_statement(),
            TokenKind::KwContinue => self.continue_statement(),
            TokenKind::KwSwitch => self.switch_statement(),
            TokenKind::KwCase => self.case_label(),
            TokenKind::KwDefault => self.default_label(),
            TokenKind::KwReturn => self.return_statement(),
            TokenKind::KwTry => self.try_statement(),
            TokenKind::KwThrow => self.throw_statement(),
            TokenKind::KwLocal if self.at_top_level() => self.top_level_locals(),
            TokenKind::LBrace => self.block(),
            TokenKind::Semi => Ok(()),
            _ => {
                self.save(tok);
                self.expr()?;
                self.frequire(TokenKind::Semi)?;
                Ok(())
            }
        }
    }

    /// `define name(args) {}` or `define A.b.c(args) {}`.
    fn define(&mut self) -> Result<(), CompileError> {
        let tok = self.token()?;
        if tok.kind != TokenKind::Ident {
            return Err(self.error("Expecting a function or a method definition"));
        }
        let name = tok.bytes().to_vec();
        if self.accept(TokenKind::Dot)?.is_some() {
            self.define_method(&name)
        } else {
            self.compile_code(Some(&name))?;
            let idx = self.literal(Literal::Symbol(name))?;
            self.op(Op::Gset)?;
            self.word(idx)?;
            Ok(())
        }
    }

    /// Walk the property path, then store the method under the last selector.
    fn define_method(&mut self, class: &[u8]) -> Result<(), CompileError> {
        self.variable_ref(class)?;
        self.op(Op::Push)?;
        let selector = loop {
            let sel = self.frequire(TokenKind::Ident)?;
            if self.accept(TokenKind::Dot)?.is_none() {
                break sel.bytes().to_vec();
            }
            self.lit_symbol(sel.bytes())?;
            self.op(Op::Getp)?;
            self.op(Op::Push)?;
        };
        self.lit_symbol(&selector)?;
        self.op(Op::Push)?;
        self.compile_code(Some(&selector))?;
        self.op(Op::Setp)?;
        Ok(())
    }

    /// Compile `(args) { body }` into a nested code unit and emit the code
    /// that closes over the current environment.
    pub(crate) fn compile_code(&mut self, name: Option<&[u8]>) -> Result<(), CompileError> {
        let fresh = self.new_function_state(name);
        let outer = mem::replace(&mut self.cur, fresh);
        self.nesting += 1;
        self.scopes.push();
        self.scopes.add(b"this");
        self.scopes.add(b"_next");

        let header = self.op(Op::AFrame)?;
        self.byte(0)?;
        self.byte(0)?;
        self.cur.emitter.mark_line();

        self.frequire(TokenKind::LParen)?;
        let (required, optional) = self.parameters(header)?;
        self.cur.emitter.patch_byte(header + 1, required);
        self.cur.emitter.patch_byte(header + 2, optional);

        self.frequire(TokenKind::LBrace)?;
        self.block()?;
        self.op(Op::Return)?;

        let inner = mem::replace(&mut self.cur, outer);
        self.scopes.pop();
        self.nesting -= 1;

        let idx = self.literal(Literal::Code(Box::new(inner.emitter.finish())))?;
        self.code_literal(idx)?;
        self.op(Op::Close)?;
        Ok(())
    }

    /// Parameter list through `)`. Counts include `this` and `_next`.
    /// A parameter with a default compiles to a check of the actual argument
    /// count; every parameter after the first optional one is optional too.
    fn parameters(&mut self, header: u16) -> Result<(u8, u8), CompileError> {
        let mut required = 2usize;
        let mut optional = 0usize;
        let mut tok = self.token()?;
        if tok.kind != TokenKind::RParen {
            self.save(tok);
            loop {
                let id = self.frequire(TokenKind::Ident)?;
                tok = self.token()?;
                match tok.kind {
                    TokenKind::Assign => {
                        optional += 1;
                        let slot = self.small(required + optional, "arguments")?;
                        self.op(Op::ArgsGe)?;
                        self.byte(slot)?;
                        let skip = self.branch(Op::Brt, NO_CHAIN)?;
                        self.init_expr()?;
                        self.scopes.add(id.bytes());
                        self.op(Op::Eset)?;
                        self.byte(0)?;
                        self.byte(slot)?;
                        self.fixup_here(skip);
                        tok = self.token()?;
                    }
                    TokenKind::DotDot => {
                        self.scopes.add(id.bytes());
                        self.cur.emitter.patch_byte(header, Op::AFrameR as u8);
                        tok = self.token()?;
                        break;
                    }
                    _ => {
                        self.scopes.add(id.bytes());
                        if optional > 0 {
                            optional += 1;
                        } else {
                            required += 1;
                        }
                    }
                }
                if tok.kind != TokenKind::Comma {
                    break;
                }
            }
        }
        self.require(&tok, TokenKind::RParen)?;
        Ok((
            self.small(required, "arguments")?,
            self.small(optional, "arguments")?,
        ))
    }

    /// Body of a `{ ... }` after the opening brace. Leading `local`
    /// declarations open a block frame that is closed again at the end.
    pub(crate) fn block(&mut self) -> Result<(), CompileError> {
        let mut count = 0usize;
        let mut tok = self.token()?;
        if tok.kind == TokenKind::KwLocal {
            self.scopes.push();
            self.op(Op::CFrame)?;
            let size_at = self.byte(0)?;
            self.cur.block_level += 1;
            while tok.kind == TokenKind::KwLocal {
                loop {
                    let name = self.frequire(TokenKind::Ident)?;
                    if self.accept(TokenKind::Assign)?.is_some() {
                        let slot = self.small(count + 1, "local variables")?;
                        self.init_expr()?;
                        self.op(Op::Eset)?;
                        self.byte(0)?;
                        self.byte(slot)?;
                    }
                    self.scopes.add(name.bytes());
                    count += 1;
                    tok = self.token()?;
                    if tok.kind != TokenKind::Comma {
                        break;
                    }
                }
                self.require(&tok, TokenKind::Semi)?;
                tok = self.token()?;
            }
            let size = self.small(count, "local variables")?;
            self.cur.emitter.patch_byte(size_at, size);
        }

        if tok.kind == TokenKind::RBrace {
            self.op(Op::Nil)?;
        } else {
            while tok.kind != TokenKind::RBrace {
                self.save(tok);
                self.statement()?;
                tok = self.token()?;
            }
        }

        if count > 0 {
            self.op(Op::Unframe)?;
            self.scopes.pop();
            self.cur.block_level -= 1;
        }
        Ok(())
    }

    /// `local a = 1, b;` outside any function or block binds globals, so the
    /// names stay visible to later top-level statements.
    fn top_level_locals(&mut self) -> Result<(), CompileError> {
        loop {
            let name = self.frequire(TokenKind::Ident)?;
            if self.accept(TokenKind::Assign)?.is_some() {
                self.init_expr()?;
            } else {
                self.op(Op::Nil)?;
            }
            let idx = self.literal(Literal::Symbol(name.bytes().to_vec()))?;
            self.op(Op::Gset)?;
            self.word(idx)?;
            let tok = self.token()?;
            if tok.kind != TokenKind::Comma {
                return self.require(&tok, TokenKind::Semi);
            }
        }
    }

    fn if_statement(&mut self) -> Result<(), CompileError> {
        self.test()?;
        let mut nxt = self.branch(Op::Brf, NO_CHAIN)?;
        self.statement()?;
        if self.accept(TokenKind::KwElse)?.is_some() {
            let end = self.branch(Op::Br, NO_CHAIN)?;
            self.fixup_here(nxt);
            self.statement()?;
            nxt = end;
        }
        self.fixup_here(nxt);
        Ok(())
    }

    fn while_statement(&mut self) -> Result<(), CompileError> {
        let top = self.addr();
        self.test()?;
        let end = self.branch(Op::Brf, NO_CHAIN)?;
        self.push_break(end);
        self.push_continue(Some(top));
        self.statement()?;
        let end = self.pop_break();
        self.pop_continue();
        self.op(Op::Br)?;
        self.word(top)?;
        self.fixup_here(end);
        Ok(())
    }

    /// `continue` inside the body jumps forward to the test.
    fn do_statement(&mut self) -> Result<(), CompileError> {
        let top = self.addr();
        self.push_break(NO_CHAIN);
        self.push_continue(None);
        self.statement()?;
        let end = self.pop_break();
        let pending = self.pop_continue();
        self.fixup_here(pending);
        self.frequire(TokenKind::KwWhile)?;
        self.test()?;
        self.frequire(TokenKind::Semi)?;
        self.op(Op::Brt)?;
        self.word(top)?;
        self.fixup_here(end);
        Ok(())
    }

    /// Layout: init; test: cond BRT body BR end; update: ... BR test;
    /// body: ... BR update; end:
    fn for_statement(&mut self) -> Result<(), CompileError> {
        self.frequire(TokenKind::LParen)?;
        if self.accept(TokenKind::Semi)?.is_none() {
            loop {
                self.init_expr()?;
                let tok = self.token()?;
                if tok.kind != TokenKind::Comma {
                    self.require(&tok, TokenKind::Semi)?;
                    break;
                }
            }
        }

        let test = self.addr();
        if self.accept(TokenKind::Semi)?.is_some() {
            self.op(Op::T)?;
        } else {
            self.expr()?;
            self.frequire(TokenKind::Semi)?;
        }
        let body = self.branch(Op::Brt, NO_CHAIN)?;
        let end = self.branch(Op::Br, NO_CHAIN)?;

        let update = self.addr();
        if self.accept(TokenKind::RParen)?.is_none() {
            self.expr()?;
            self.frequire(TokenKind::RParen)?;
        }
        self.op(Op::Br)?;
        self.word(test)?;

        self.fixup_here(body);
        self.push_break(end);
        self.push_continue(Some(update));
        self.statement()?;
        let end = self.pop_break();
        self.pop_continue();
        self.op(Op::Br)?;
        self.word(update)?;
        self.fixup_here(end);
        Ok(())
    }

    fn break_statement(&mut self) -> Result<(), CompileError> {
        let Some(target) = self.cur.breaks.last() else {
            return Err(self.error("Break outside of loop or switch"));
        };
        let frames = self.cur.block_level - target.level;
        let tries = self.cur.try_depth - target.try_depth;
        let chain = target.chain;
        self.unwind(frames, tries)?;
        let at = self.branch(Op::Br, chain)?;
        if let Some(target) = self.cur.breaks.last_mut() {
            target.chain = at;
        }
        self.frequire(TokenKind::Semi)?;
        Ok(())
    }

    fn continue_statement(&mut self) -> Result<(), CompileError> {
        let Some(target) = self.cur.continues.last() else {
            return Err(self.error("Continue outside of loop"));
        };
        let frames = self.cur.block_level - target.level;
        let tries = self.cur.try_depth - target.try_depth;
        let (known, chain) = (target.target, target.chain);
        self.unwind(frames, tries)?;
        match known {
            Some(addr) => {
                self.op(Op::Br)?;
                self.word(addr)?;
            }
            None => {
                let at = self.branch(Op::Br, chain)?;
                if let Some(target) = self.cur.continues.last_mut() {
                    target.chain = at;
                }
            }
        }
        self.frequire(TokenKind::Semi)?;
        Ok(())
    }

    /// The body is compiled first; the dispatch table follows it.
    fn switch_statement(&mut self) -> Result<(), CompileError> {
        self.test()?;
        let dispatch = self.branch(Op::Br, NO_CHAIN)?;

        self.cur.switches.push(SwitchContext::default());
        self.push_break(NO_CHAIN);
        self.statement()?;
        let brk = self.pop_break();
        let switch = self.cur.switches.pop().unwrap_or_default();

        let mut end = self.branch(Op::Br, brk)?;
        self.fixup_here(dispatch);
        self.op(Op::Switch)?;
        let count = u16::try_from(switch.cases.len())
            .map_err(|_| self.error("Too many cases"))?;
        self.word(count)?;
        for case in &switch.cases {
            self.word(case.literal)?;
            self.word(case.label)?;
        }
        match switch.default {
            Some(label) => {
                self.word(label)?;
            }
            None => end = self.word(end)?,
        }
        self.fixup_here(end);
        Ok(())
    }

    fn case_label(&mut self) -> Result<(), CompileError> {
        if self.cur.switches.is_empty() {
            return Err(self.error("Case outside of switch"));
        }
        let tok = self.token()?;
        let value = match tok.kind {
            TokenKind::Backslash => {
                let sym = self.token()?;
                if sym.kind != TokenKind::Ident {
                    return Err(self.error("Expecting a literal symbol"));
                }
                Literal::Symbol(sym.bytes().to_vec())
            }
            TokenKind::Int | TokenKind::Float | TokenKind::Str => token_literal(tok),
            TokenKind::KwNil => Literal::Nil,
            TokenKind::Minus => {
                let num = self.token()?;
                match num.value {
                    TokenValue::Int(n) if num.kind == TokenKind::Int => {
                        Literal::Int(n.wrapping_neg())
                    }
                    TokenValue::Float(f) if num.kind == TokenKind::Float => Literal::Float(-f),
                    _ => return Err(self.error("Expecting a literal value")),
                }
            }
            _ => return Err(self.error("Expecting a literal value")),
        };
        self.frequire(TokenKind::Colon)?;
        let duplicate = self
            .cur
            .switches
            .last()
            .is_some_and(|s| s.cases.iter().any(|c| c.value == value));
        if duplicate {
            return Err(self.error("Duplicate case"));
        }
        let literal = self.literal(value.clone())?;
        let label = self.addr();
        if let Some(switch) = self.cur.switches.last_mut() {
            switch.cases.push(Case {
                value,
                literal,
                label,
            });
        }
        Ok(())
    }

    fn default_label(&mut self) -> Result<(), CompileError> {
        if self.cur.switches.is_empty() {
            return Err(self.error("Default outside of switch"));
        }
        self.frequire(TokenKind::Colon)?;
        let label = self.addr();
        if let Some(switch) = self.cur.switches.last_mut() {
            switch.default = Some(label);
        }
        Ok(())
    }

    fn return_statement(&mut self) -> Result<(), CompileError> {
        if self.accept(TokenKind::Semi)?.is_some() {
            self.op(Op::Nil)?;
        } else {
            self.expr()?;
            self.frequire(TokenKind::Semi)?;
        }
        let frames = self.cur.block_level;
        self.unwind(frames, 0)?;
        self.op(Op::Return)?;
        Ok(())
    }

    /// `try { B } [catch (e) { C }] [finally { F }]`
    ///
    /// The statement runs inside a block frame. With a `finally` clause the
    /// frame has two slots: a flag saying an exception is pending and the
    /// pending value. Layout with both clauses:
    ///
    /// ```text
    ///      CFRAME 2
    ///      TRY h1; B; ENDTRY; BR fin
    /// h1:  TRY h2; CFRAME 1; ESET 0 1; C; UNFRAME; ENDTRY; BR fin
    /// h2:  ESET 0 2; T; ESET 0 1
    /// fin: F; EREF 0 1; BRF done; EREF 0 2; THROW
    /// done: UNFRAME
    /// ```
    ///
    /// Without `finally`, h2 is a bare THROW and the frame has no slots.
    fn try_statement(&mut self) -> Result<(), CompileError> {
        // The clauses are only known after the protected block, so the hidden
        // frame is always opened and its size patched once `finally` is seen.
        self.op(Op::CFrame)?;
        let size_at = self.byte(0)?;
        self.scopes.push();
        self.scopes.add(HIDDEN);
        self.scopes.add(HIDDEN);
        self.cur.block_level += 1;

        self.frequire(TokenKind::LBrace)?;
        let h1 = self.branch(Op::Try, NO_CHAIN)?;
        self.cur.try_depth += 1;
        self.block()?;
        self.cur.try_depth -= 1;
        self.op(Op::EndTry)?;
        let mut fin = self.branch(Op::Br, NO_CHAIN)?;
        self.fixup_here(h1);

        let mut tok = self.token()?;
        let mut rethrow = NO_CHAIN;
        let catch = tok.kind == TokenKind::KwCatch;
        if catch {
            self.frequire(TokenKind::LParen)?;
            let var = self.frequire(TokenKind::Ident)?;
            self.frequire(TokenKind::RParen)?;
            self.frequire(TokenKind::LBrace)?;

            rethrow = self.branch(Op::Try, NO_CHAIN)?;
            self.cur.try_depth += 1;
            self.op(Op::CFrame)?;
            self.byte(1)?;
            self.op(Op::Eset)?;
            self.byte(0)?;
            self.byte(1)?;
            self.scopes.push();
            self.scopes.add(var.bytes());
            self.cur.block_level += 1;
            self.block()?;
            self.cur.block_level -= 1;
            self.scopes.pop();
            self.op(Op::Unframe)?;
            self.cur.try_depth -= 1;
            self.op(Op::EndTry)?;
            fin = self.branch(Op::Br, fin)?;
            tok = self.token()?;
        }

        if tok.kind == TokenKind::KwFinally {
            self.cur.emitter.patch_byte(size_at, 2);
            self.fixup_here(rethrow);
            self.op(Op::Eset)?;
            self.byte(0)?;
            self.byte(2)?;
            self.op(Op::T)?;
            self.op(Op::Eset)?;
            self.byte(0)?;
            self.byte(1)?;
            self.fixup_here(fin);
            self.frequire(TokenKind::LBrace)?;
            self.block()?;
            self.op(Op::Eref)?;
            self.byte(0)?;
            self.byte(1)?;
            let done = self.branch(Op::Brf, NO_CHAIN)?;
            self.op(Op::Eref)?;
            self.byte(0)?;
            self.byte(2)?;
            self.op(Op::Throw)?;
            self.fixup_here(done);
        } else {
            self.save(tok);
            if catch {
                // An exception raised by the catch clause propagates.
                self.fixup_here(rethrow);
                self.op(Op::Throw)?;
            }
            // Without any clause the exception is dropped.
            self.fixup_here(fin);
        }

        self.op(Op::Unframe)?;
        self.scopes.pop();
        self.cur.block_level -= 1;
        Ok(())
    }

    fn throw_statement(&mut self) -> Result<(), CompileError> {
        self.expr()?;
        self.op(Op::Throw)?;
        self.frequire(TokenKind::Semi)?;
        Ok(())
    }
}
