use bob_ir::Op;

use crate::core::Value;
use crate::errors::BobError;
use crate::runtime::Interpreter;
use crate::vm::exception::{catch, stack_trace, unwind_to};
use crate::vm::ops::call::{Callee, callee_slot, classify, enter_method, resolve_send};
use crate::vm::ops::{access, call, compare, flow, math};
use crate::vm::Args;

impl Interpreter {
    /// Call the value sitting below `argc` arguments on the stack and run it
    /// to completion. Entry point for embedders and for natives calling back
    /// into bytecode.
    pub(crate) fn apply(&mut self, argc: usize) -> Result<Value, BobError> {
        let slot = callee_slot(self, argc)?;
        let callee = self.vm.stack[slot];
        match classify(self, callee) {
            Callee::Native(handler) => {
                let result = handler(self, Args::new(slot + 1, argc));
                self.vm.stack.truncate(slot);
                result
            }
            Callee::Bytecode { code, env } => {
                let frames = self.vm.frames.len();
                let handlers = self.vm.handlers.len();
                if let Err(e) = enter_method(self, slot, argc, code, env, true) {
                    self.vm.stack.truncate(slot);
                    return Err(e);
                }
                let result = self.execute(handlers);
                if result.is_err() {
                    unwind_to(self, frames, handlers, slot);
                }
                result
            }
            Callee::Other => {
                self.vm.stack.truncate(slot);
                Err(BobError::TypeError(self.print_string(callee)))
            }
        }
    }

    /// `apply` for `[receiver, selector, start, args..]` on the stack.
    pub(crate) fn send_value(&mut self, argc: usize) -> Result<Value, BobError> {
        let slot = callee_slot(self, argc)?;
        if let Err(e) = resolve_send(self, slot) {
            self.vm.stack.truncate(slot);
            return Err(e);
        }
        self.apply(argc)
    }

    /// Run until the frame entered by `apply` returns. Thrown values are
    /// caught by handlers installed since then; handlers below
    /// `handlers_base` belong to an outer activation.
    fn execute(&mut self, handlers_base: usize) -> Result<Value, BobError> {
        loop {
            match self.run() {
                Ok(v) => return Ok(v),
                Err(BobError::Uncaught(msg)) => {
                    if self.vm.thrown.is_some() && self.vm.handlers.len() > handlers_base {
                        catch(self)?;
                        continue;
                    }
                    if self.vm.trace.is_none() {
                        self.vm.trace = Some(stack_trace(self));
                    }
                    return Err(BobError::Uncaught(msg));
                }
                Err(e) => {
                    if self.vm.trace.is_none() {
                        self.vm.trace = Some(stack_trace(self));
                    }
                    return Err(e);
                }
            }
        }
    }

    fn run(&mut self) -> Result<Value, BobError> {
        loop {
            self.safe_point()?;
            let byte = self.vm.fetch_byte()?;
            let op = Op::from_byte(byte).ok_or(BobError::BadOpcode(byte))?;
            match op {
                Op::Brt => {
                    let target = self.vm.fetch_word()?;
                    flow::op_branch(self, target, Some(true));
                }
                Op::Brf => {
                    let target = self.vm.fetch_word()?;
                    flow::op_branch(self, target, Some(false));
                }
                Op::Br => {
                    let target = self.vm.fetch_word()?;
                    flow::op_branch(self, target, None);
                }
                Op::T => self.vm.val = Value::TRUE,
                Op::Nil => self.vm.val = Value::NIL,
                Op::Push => self.vm.push(self.vm.val)?,
                Op::Not => math::op_not(self),
                Op::Add
                | Op::Sub
                | Op::Mul
                | Op::Div
                | Op::Rem
                | Op::Band
                | Op::Bor
                | Op::Xor
                | Op::Shl
                | Op::Shr => math::op_binary(self, op)?,
                Op::Neg | Op::Inc | Op::Dec | Op::Bnot => math::op_unary(self, op)?,
                Op::Lt | Op::Le | Op::Eq | Op::Ne | Op::Ge | Op::Gt => {
                    compare::op_compare(self, op)?
                }
                Op::Lit => {
                    let index = self.vm.fetch_word()?;
                    self.vm.val = access::literal(self, index)?;
                }
                Op::Gref => {
                    let index = self.vm.fetch_word()?;
                    access::op_gref(self, index)?;
                }
                Op::Gset => {
                    let index = self.vm.fetch_word()?;
                    access::op_gset(self, index)?;
                }
                Op::Getp | Op::Vref => access::op_get(self)?,
                Op::Setp | Op::Vset => access::op_set(self)?,
                Op::Return => {
                    if call::op_return(self)? {
                        return Ok(self.vm.val);
                    }
                }
                Op::Call => {
                    let argc = self.vm.fetch_byte()?;
                    call::op_call(self, usize::from(argc))?;
                }
                Op::Send => {
                    let argc = self.vm.fetch_byte()?;
                    call::op_send(self, usize::from(argc))?;
                }
                Op::Eref => {
                    let level = self.vm.fetch_byte()?;
                    let offset = self.vm.fetch_byte()?;
                    access::op_eref(self, level, offset)?;
                }
                Op::Eset => {
                    let level = self.vm.fetch_byte()?;
                    let offset = self.vm.fetch_byte()?;
                    access::op_eset(self, level, offset)?;
                }
                Op::Frame | Op::CFrame => {
                    let n = self.vm.fetch_byte()?;
                    flow::op_cframe(self, n)?;
                }
                Op::Unframe => {
                    if flow::op_unframe(self)? {
                        return Ok(self.vm.val);
                    }
                }
                Op::Dup2 => {
                    let obj = self.vm.peek(0)?;
                    self.vm.push(self.vm.val)?;
                    self.vm.push(obj)?;
                }
                Op::Drop => self.vm.val = self.vm.pop()?,
                Op::Dup => {
                    let top = self.vm.peek(0)?;
                    self.vm.push(top)?;
                }
                Op::Over => {
                    let second = self.vm.peek(1)?;
                    self.vm.push(second)?;
                }
                Op::NewObject => access::op_new_object(self)?,
                Op::NewVector => access::op_new_vector(self)?,
                Op::Close => call::op_close(self)?,
                Op::Switch => flow::op_switch(self)?,
                Op::ArgsGe => {
                    let n = self.vm.fetch_byte()?;
                    call::op_argsge(self, usize::from(n));
                }
                Op::Try => {
                    let target = self.vm.fetch_word()?;
                    flow::op_try(self, target);
                }
                Op::EndTry => flow::op_end_try(self)?,
                Op::Throw => return Err(flow::op_throw(self)),
                Op::AFrame | Op::AFrameR => return Err(BobError::BadOpcode(byte)),
            }
        }
    }
}
