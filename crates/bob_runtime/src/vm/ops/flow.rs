//! Branches, switch dispatch, block frames and exception handlers.

use crate::core::Value;
use crate::errors::BobError;
use crate::runtime::types::eql;
use crate::runtime::Interpreter;
use crate::vm::ops::access::literal;
use crate::vm::{Frame, Handler};

/// Execute Op::Br, Op::Brt or Op::Brf after the target was fetched.
pub(crate) fn op_branch(interp: &mut Interpreter, target: u16, when: Option<bool>) {
    let taken = match when {
        None => true,
        Some(truthy) => interp.vm.val.is_truthy() == truthy,
    };
    if taken {
        interp.vm.pc = usize::from(target);
    }
}

/// Execute Op::Switch: `count`, then `(literal, target)` pairs, then the
/// default target. Cases are tried in order with language equality.
pub(crate) fn op_switch(interp: &mut Interpreter) -> Result<(), BobError> {
    let count = interp.vm.fetch_word()?;
    let val = interp.vm.val;
    let mut chosen = None;
    for _ in 0..count {
        let lit = interp.vm.fetch_word()?;
        let target = interp.vm.fetch_word()?;
        if chosen.is_none() && eql(&interp.heap, val, literal(interp, lit)?) {
            chosen = Some(target);
        }
    }
    let default = interp.vm.fetch_word()?;
    interp.vm.pc = usize::from(chosen.unwrap_or(default));
    Ok(())
}

/// Execute Op::CFrame and Op::Frame: open a block with `n` local slots.
pub(crate) fn op_cframe(interp: &mut Interpreter, n: u8) -> Result<(), BobError> {
    if interp.vm.frames.len() >= interp.config.max_frames {
        return Err(BobError::StackOverflow);
    }
    let env = interp
        .heap
        .make_env(vec![Value::NIL; usize::from(n)], interp.vm.env)?;
    let outer = std::mem::replace(&mut interp.vm.env, env);
    interp.vm.frames.push(Frame::Block { env: outer });
    Ok(())
}

/// Execute Op::Unframe. Closing a call frame returns from it; `true` when
/// that leaves the loop.
pub(crate) fn op_unframe(interp: &mut Interpreter) -> Result<bool, BobError> {
    match interp.vm.frames.pop() {
        Some(Frame::Block { env }) => {
            interp.vm.env = env;
            Ok(false)
        }
        Some(Frame::Call(frame)) => {
            let top = frame.top;
            interp.vm.restore(frame);
            Ok(top)
        }
        None => Err(BobError::Impossible),
    }
}

/// Execute Op::Try: install a handler resuming at `target`.
pub(crate) fn op_try(interp: &mut Interpreter, target: u16) {
    let vm = &mut interp.vm;
    let handler = Handler {
        target: usize::from(target),
        sp: vm.stack.len(),
        frames: vm.frames.len(),
        env: vm.env,
        code: vm.code,
        bytecode: vm.bytecode.clone(),
        argc: vm.argc,
    };
    vm.handlers.push(handler);
}

/// Execute Op::EndTry.
pub(crate) fn op_end_try(interp: &mut Interpreter) -> Result<(), BobError> {
    interp.vm.handlers.pop().map(|_| ()).ok_or(BobError::Impossible)
}

/// Execute Op::Throw: raise the value in the register.
pub(crate) fn op_throw(interp: &mut Interpreter) -> BobError {
    let v = interp.vm.val;
    interp.vm.thrown = Some(v);
    BobError::Uncaught(interp.print_string(v))
}
