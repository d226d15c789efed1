//! Expressions.
//!
//! One method per precedence level, loosest first. Each returns the `Place`
//! of its result; callers decide whether to load it (`rvalue`) or store to it.

use bob_ir::{Literal, Op};
use bob_syntax::{CompileError, Token, TokenKind, TokenValue};

use crate::compiler::{Compiler, Place};
use crate::emit::NO_CHAIN;

type Level<'a, 'b> = fn(&mut Compiler<'a, 'b>) -> Result<Place, CompileError>;

impl<'a, 'b> Compiler<'a, 'b> {
    /// Full expression, loaded into the value register.
    pub(crate) fn expr(&mut self) -> Result<(), CompileError> {
        let place = self.expr1()?;
        self.rvalue(place)?;
        Ok(())
    }

    /// Expression without the comma operator, loaded.
    pub(crate) fn init_expr(&mut self) -> Result<(), CompileError> {
        let place = self.expr2()?;
        self.rvalue(place)?;
        Ok(())
    }

    /// `( expr )` as used by `if`, `while` and `switch`.
    pub(crate) fn test(&mut self) -> Result<(), CompileError> {
        self.frequire(TokenKind::LParen)?;
        self.expr()?;
        self.frequire(TokenKind::RParen)?;
        Ok(())
    }

    // a, b
    fn expr1(&mut self) -> Result<Place, CompileError> {
        let mut place = self.expr2()?;
        while self.accept(TokenKind::Comma)?.is_some() {
            self.rvalue(place)?;
            let rhs = self.expr1()?;
            place = self.rvalue(rhs)?;
        }
        Ok(place)
    }

    // = += -= ...
    pub(crate) fn expr2(&mut self) -> Result<Place, CompileError> {
        let mut place = self.expr3()?;
        loop {
            let tok = self.token()?;
            let op = match tok.kind {
                TokenKind::Assign => None,
                TokenKind::PlusEq => Some(Op::Add),
                TokenKind::MinusEq => Some(Op::Sub),
                TokenKind::StarEq => Some(Op::Mul),
                TokenKind::SlashEq => Some(Op::Div),
                TokenKind::PercentEq => Some(Op::Rem),
                TokenKind::AmpEq => Some(Op::Band),
                TokenKind::PipeEq => Some(Op::Bor),
                TokenKind::CaretEq => Some(Op::Xor),
                TokenKind::ShlEq => Some(Op::Shl),
                TokenKind::ShrEq => Some(Op::Shr),
                _ => {
                    self.save(tok);
                    return Ok(place);
                }
            };
            self.check_lvalue(place)?;
            match op {
                None => {
                    self.push_place(place)?;
                    self.init_expr()?;
                    self.store(place)?;
                }
                Some(op) => {
                    self.dup_place(place)?;
                    self.load(place)?;
                    self.op(Op::Push)?;
                    self.init_expr()?;
                    self.op(op)?;
                    self.store(place)?;
                }
            }
            place = Place::Value;
        }
    }

    // c ? a : b
    fn expr3(&mut self) -> Result<Place, CompileError> {
        let mut place = self.expr4()?;
        while self.accept(TokenKind::Question)?.is_some() {
            self.rvalue(place)?;
            let nxt = self.branch(Op::Brf, NO_CHAIN)?;
            self.expr()?;
            self.frequire(TokenKind::Colon)?;
            let end = self.branch(Op::Br, NO_CHAIN)?;
            self.fixup_here(nxt);
            self.expr()?;
            self.fixup_here(end);
            place = Place::Value;
        }
        Ok(place)
    }

    // ||
    fn expr4(&mut self) -> Result<Place, CompileError> {
        self.short_circuit(TokenKind::OrOr, Op::Brt, Self::expr5)
    }

    // &&
    fn expr5(&mut self) -> Result<Place, CompileError> {
        self.short_circuit(TokenKind::AndAnd, Op::Brf, Self::expr6)
    }

    /// Every operand except the last branches to the end with its own value
    /// in the register when it decides the result.
    fn short_circuit(
        &mut self,
        kind: TokenKind,
        branch: Op,
        operand: Level<'a, 'b>,
    ) -> Result<Place, CompileError> {
        let mut place = operand(self)?;
        let mut end = NO_CHAIN;
        while self.accept(kind)?.is_some() {
            self.rvalue(place)?;
            end = self.branch(branch, end)?;
            let rhs = operand(self)?;
            place = self.rvalue(rhs)?;
        }
        self.fixup_here(end);
        Ok(place)
    }

    fn expr6(&mut self) -> Result<Place, CompileError> {
        self.binary(&[(TokenKind::Pipe, Op::Bor)], Self::expr7)
    }

    fn expr7(&mut self) -> Result<Place, CompileError> {
        self.binary(&[(TokenKind::Caret, Op::Xor)], Self::expr8)
    }

    fn expr8(&mut self) -> Result<Place, CompileError> {
        self.binary(&[(TokenKind::Amp, Op::Band)], Self::expr9)
    }

    fn expr9(&mut self) -> Result<Place, CompileError> {
        self.binary(
            &[(TokenKind::EqEq, Op::Eq), (TokenKind::Ne, Op::Ne)],
            Self::expr10,
        )
    }

    fn expr10(&mut self) -> Result<Place, CompileError> {
        self.binary(
            &[
                (TokenKind::Lt, Op::Lt),
                (TokenKind::Le, Op::Le),
                (TokenKind::Ge, Op::Ge),
                (TokenKind::Gt, Op::Gt),
            ],
            Self::expr11,
        )
    }

    fn expr11(&mut self) -> Result<Place, CompileError> {
        self.binary(
            &[(TokenKind::Shl, Op::Shl), (TokenKind::Shr, Op::Shr)],
            Self::expr12,
        )
    }

    fn expr12(&mut self) -> Result<Place, CompileError> {
        self.binary(
            &[(TokenKind::Plus, Op::Add), (TokenKind::Minus, Op::Sub)],
            Self::expr13,
        )
    }

    fn expr13(&mut self) -> Result<Place, CompileError> {
        self.binary(
            &[
                (TokenKind::Star, Op::Mul),
                (TokenKind::Slash, Op::Div),
                (TokenKind::Percent, Op::Rem),
            ],
            Self::expr14,
        )
    }

    /// Left-associative binary level: the left operand is pushed, the right
    /// one ends up in the register, and the operator combines them.
    fn binary(
        &mut self,
        ops: &[(TokenKind, Op)],
        operand: Level<'a, 'b>,
    ) -> Result<Place, CompileError> {
        let mut place = operand(self)?;
        loop {
            let tok = self.token()?;
            let Some(&(_, op)) = ops.iter().find(|(k, _)| *k == tok.kind) else {
                self.save(tok);
                return Ok(place);
            };
            self.rvalue(place)?;
            self.op(Op::Push)?;
            let rhs = operand(self)?;
            self.rvalue(rhs)?;
            self.op(op)?;
            place = Place::Value;
        }
    }

    // unary - ! ~ ++ --
    fn expr14(&mut self) -> Result<Place, CompileError> {
        let tok = self.token()?;
        let op = match tok.kind {
            TokenKind::Minus => Op::Neg,
            TokenKind::Bang => Op::Not,
            TokenKind::Tilde => Op::Bnot,
            TokenKind::Inc => return self.pre_increment(Op::Inc),
            TokenKind::Dec => return self.pre_increment(Op::Dec),
            _ => {
                self.save(tok);
                return self.expr15();
            }
        };
        let operand = self.expr14()?;
        self.rvalue(operand)?;
        self.op(op)?;
        Ok(Place::Value)
    }

    fn pre_increment(&mut self, op: Op) -> Result<Place, CompileError> {
        let place = self.expr15()?;
        self.check_lvalue(place)?;
        self.dup_place(place)?;
        self.load(place)?;
        self.op(op)?;
        self.store(place)?;
        Ok(Place::Value)
    }

    /// The stored value is incremented; the expression yields the old one.
    fn post_increment(&mut self, place: Place, op: Op) -> Result<Place, CompileError> {
        self.check_lvalue(place)?;
        self.dup_place(place)?;
        self.load(place)?;
        self.op(op)?;
        self.store(place)?;
        self.op(if op == Op::Inc { Op::Dec } else { Op::Inc })?;
        Ok(Place::Value)
    }

    // calls, indexing, property references, postfix ++ --
    fn expr15(&mut self) -> Result<Place, CompileError> {
        let mut place = self.primary()?;
        loop {
            let tok = self.token()?;
            place = match tok.kind {
                TokenKind::LParen => self.call(place)?,
                TokenKind::LBracket => self.index(place)?,
                TokenKind::Dot => self.property_reference(place)?,
                TokenKind::Inc => self.post_increment(place, Op::Inc)?,
                TokenKind::Dec => self.post_increment(place, Op::Dec)?,
                _ => {
                    self.save(tok);
                    return Ok(place);
                }
            };
        }
    }

    fn primary(&mut self) -> Result<Place, CompileError> {
        let tok = self.token()?;
        match tok.kind {
            TokenKind::KwFunction => self.function_literal(),
            TokenKind::Backslash => self.literal_expr(),
            TokenKind::LBracket => self.vector_literal(),
            TokenKind::LParen => {
                let place = self.expr1()?;
                self.frequire(TokenKind::RParen)?;
                Ok(place)
            }
            TokenKind::Int | TokenKind::Float | TokenKind::Str => {
                let lit = token_literal(tok);
                let idx = self.literal(lit)?;
                self.code_literal(idx)?;
                Ok(Place::Value)
            }
            TokenKind::KwNil => {
                self.op(Op::Nil)?;
                Ok(Place::Value)
            }
            TokenKind::Ident => self.find_variable(tok.bytes()),
            TokenKind::KwSuper => self.super_call(),
            TokenKind::KwNew => self.new_object(),
            TokenKind::LBrace => {
                self.block()?;
                Ok(Place::Value)
            }
            _ => Err(self.error("Expecting a primary expression")),
        }
    }

    /// `function [name](args) { body }`; a named function is also stored in
    /// the global of that name.
    fn function_literal(&mut self) -> Result<Place, CompileError> {
        let tok = self.token()?;
        match tok.kind {
            TokenKind::Ident => {
                let name = tok.bytes().to_vec();
                self.compile_code(Some(&name))?;
                let idx = self.literal(Literal::Symbol(name))?;
                self.op(Op::Gset)?;
                self.word(idx)?;
            }
            TokenKind::Str => {
                self.compile_code(Some(tok.bytes()))?;
            }
            _ => {
                self.save(tok);
                self.compile_code(None)?;
            }
        }
        Ok(Place::Value)
    }

    // \sym  \[ ... ]  \{ ... }
    fn literal_expr(&mut self) -> Result<Place, CompileError> {
        let tok = self.token()?;
        match tok.kind {
            TokenKind::Ident => {
                self.lit_symbol(tok.bytes())?;
                Ok(Place::Value)
            }
            TokenKind::LBracket => self.vector_literal(),
            TokenKind::LBrace => self.object_literal(),
            _ => Err(self.error("Expecting a symbol, vector or object literal")),
        }
    }

    /// Elements are pushed, then NEWVECTOR pops them with the count in the register.
    fn vector_literal(&mut self) -> Result<Place, CompileError> {
        let mut count: i64 = 0;
        if self.accept(TokenKind::RBracket)?.is_none() {
            loop {
                count += 1;
                self.init_expr()?;
                self.op(Op::Push)?;
                let tok = self.token()?;
                if tok.kind != TokenKind::Comma {
                    self.require(&tok, TokenKind::RBracket)?;
                    break;
                }
            }
        }
        let idx = self.literal(Literal::Int(count))?;
        self.code_literal(idx)?;
        self.op(Op::NewVector)?;
        Ok(Place::Value)
    }

    /// `\{}`, `\{ a: 1, b: 2 }` (instance of `Object`) or `\{ Class a: 1 }`.
    fn object_literal(&mut self) -> Result<Place, CompileError> {
        let tok = self.token()?;
        if tok.kind == TokenKind::RBrace {
            self.variable_ref(b"Object")?;
            self.op(Op::NewObject)?;
            return Ok(Place::Value);
        }
        self.require(&tok, TokenKind::Ident)?;
        let first = tok.bytes().to_vec();
        let tok = self.token()?;
        if tok.kind == TokenKind::Colon {
            self.variable_ref(b"Object")?;
            self.op(Op::NewObject)?;
            self.object_property(&first)?;
            self.object_properties()?;
        } else {
            self.variable_ref(&first)?;
            self.op(Op::NewObject)?;
            if tok.kind != TokenKind::RBrace {
                self.save(tok);
                let name = self.frequire(TokenKind::Ident)?;
                self.frequire(TokenKind::Colon)?;
                self.object_property(name.bytes())?;
                self.object_properties()?;
            }
        }
        Ok(Place::Value)
    }

    /// `, name: value` pairs up to the closing brace.
    fn object_properties(&mut self) -> Result<(), CompileError> {
        loop {
            let tok = self.token()?;
            if tok.kind != TokenKind::Comma {
                return self.require(&tok, TokenKind::RBrace);
            }
            let name = self.frequire(TokenKind::Ident)?;
            self.frequire(TokenKind::Colon)?;
            self.object_property(name.bytes())?;
        }
    }

    /// With the new object in the register, store one property and leave the
    /// object in the register again.
    fn object_property(&mut self, name: &[u8]) -> Result<(), CompileError> {
        self.op(Op::Push)?;
        self.op(Op::Push)?;
        self.lit_symbol(name)?;
        self.op(Op::Push)?;
        self.init_expr()?;
        self.op(Op::Setp)?;
        self.op(Op::Drop)?;
        Ok(())
    }

    /// `f(args)`: stack holds function, `this`, `_next`, then the arguments.
    fn call(&mut self, place: Place) -> Result<Place, CompileError> {
        self.rvalue(place)?;
        self.op(Op::Push)?;
        self.op(Op::Nil)?;
        self.op(Op::Push)?;
        self.op(Op::Push)?;
        let argc = self.arguments()?;
        self.op(Op::Call)?;
        self.byte(argc)?;
        Ok(Place::Value)
    }

    /// Push call arguments up to `)`; returns the argument count including
    /// `this` and `_next`.
    fn arguments(&mut self) -> Result<u8, CompileError> {
        let mut n = 2usize;
        if self.accept(TokenKind::RParen)?.is_none() {
            loop {
                self.init_expr()?;
                self.op(Op::Push)?;
                n += 1;
                let tok = self.token()?;
                if tok.kind != TokenKind::Comma {
                    self.require(&tok, TokenKind::RParen)?;
                    break;
                }
            }
        }
        self.small(n, "arguments")
    }

    /// Arguments and SEND; receiver, selector and lookup start are already pushed.
    fn method_call(&mut self) -> Result<Place, CompileError> {
        let argc = self.arguments()?;
        self.op(Op::Send)?;
        self.byte(argc)?;
        Ok(Place::Value)
    }

    fn index(&mut self, place: Place) -> Result<Place, CompileError> {
        self.rvalue(place)?;
        self.op(Op::Push)?;
        self.expr()?;
        self.frequire(TokenKind::RBracket)?;
        Ok(Place::Index)
    }

    /// `obj.name`, `obj.(expr)`, or a send when followed by `(`.
    fn property_reference(&mut self, place: Place) -> Result<Place, CompileError> {
        self.rvalue(place)?;
        self.op(Op::Push)?;
        self.selector()?;
        if self.accept(TokenKind::LParen)?.is_some() {
            self.op(Op::Push)?;
            self.op(Op::Over)?;
            return self.method_call();
        }
        Ok(Place::Property)
    }

    fn selector(&mut self) -> Result<(), CompileError> {
        let tok = self.token()?;
        match tok.kind {
            TokenKind::Ident => self.lit_symbol(tok.bytes()),
            TokenKind::LParen => {
                self.expr()?;
                self.frequire(TokenKind::RParen)?;
                Ok(())
            }
            _ => Err(self.error("Expecting a property selector")),
        }
    }

    /// `super.sel(args)`: receiver is `this`, lookup starts at `_next`.
    fn super_call(&mut self) -> Result<Place, CompileError> {
        if !self.load_argument(b"this")? {
            return Err(self.error("Use of super outside of a method"));
        }
        self.op(Op::Push)?;
        self.frequire(TokenKind::Dot)?;
        self.selector()?;
        self.op(Op::Push)?;
        self.frequire(TokenKind::LParen)?;
        self.load_argument(b"_next")?;
        self.op(Op::Push)?;
        self.method_call()
    }

    /// `new Class` or `new (expr)`, followed by an optional `initialize` send.
    fn new_object(&mut self) -> Result<Place, CompileError> {
        let tok = self.token()?;
        match tok.kind {
            TokenKind::Ident => self.variable_ref(tok.bytes())?,
            TokenKind::LParen => {
                self.expr()?;
                self.frequire(TokenKind::RParen)?;
            }
            _ => return Err(self.error("Expecting an object expression")),
        }
        self.op(Op::NewObject)?;
        if self.accept(TokenKind::LParen)?.is_some() {
            self.op(Op::Push)?;
            self.lit_symbol(b"initialize")?;
            self.op(Op::Push)?;
            self.op(Op::Over)?;
            return self.method_call();
        }
        Ok(Place::Value)
    }
}

/// Literal value of an integer, float or string token.
pub(crate) fn token_literal(tok: Token) -> Literal {
    match tok.value {
        TokenValue::Int(n) => Literal::Int(n),
        TokenValue::Float(f) => Literal::Float(f),
        TokenValue::Bytes(b) => Literal::Str(b),
        TokenValue::None => Literal::Nil,
    }
}
