//! Call, send, return and closure operations.
//!
//! A call finds the callee below its arguments: `[.., callee, this, _next,
//! args..]`. Native methods run inline and leave their result in the value
//! register. Bytecode methods get a fresh environment holding the arguments
//! and a call frame saving the caller's registers; execution continues at
//! the callee's first instruction after its `AFRAME` header.

use std::mem;

use bob_ir::Op;

use crate::core::heap::Record;
use crate::core::Value;
use crate::errors::BobError;
use crate::runtime::types::class_of;
use crate::runtime::Interpreter;
use crate::vm::{Args, CallFrame, Frame, NativeFn};

/// Size of the `AFRAME req opt` header every method starts with.
pub(crate) const HEADER_SIZE: usize = 3;

pub(crate) enum Callee {
    Native(NativeFn),
    Bytecode { code: Value, env: Value },
    Other,
}

pub(crate) fn classify(interp: &Interpreter, callee: Value) -> Callee {
    match interp.heap.get(callee) {
        Some(Record::CMethod(m)) => Callee::Native(m.handler),
        Some(Record::Method { code, env }) => Callee::Bytecode {
            code: *code,
            env: *env,
        },
        _ => Callee::Other,
    }
}

/// Slot of the callee for a call with `argc` arguments on the stack.
pub(crate) fn callee_slot(interp: &Interpreter, argc: usize) -> Result<usize, BobError> {
    interp
        .vm
        .stack
        .len()
        .checked_sub(argc + 1)
        .ok_or(BobError::Impossible)
}

/// Execute Op::Call, and the call half of Op::Send.
pub(crate) fn op_call(interp: &mut Interpreter, argc: usize) -> Result<(), BobError> {
    let slot = callee_slot(interp, argc)?;
    let callee = interp.vm.stack[slot];
    match classify(interp, callee) {
        Callee::Native(handler) => {
            let result = handler(interp, Args::new(slot + 1, argc))?;
            interp.vm.stack.truncate(slot);
            interp.vm.val = result;
            Ok(())
        }
        Callee::Bytecode { code, env } => enter_method(interp, slot, argc, code, env, false),
        Callee::Other => Err(BobError::TypeError(interp.print_string(callee))),
    }
}

/// Execute Op::Send.
pub(crate) fn op_send(interp: &mut Interpreter, argc: usize) -> Result<(), BobError> {
    let slot = callee_slot(interp, argc)?;
    resolve_send(interp, slot)?;
    op_call(interp, argc)
}

/// Turn `[receiver, selector, start]` at `slot` into `[method, this, _next]`.
///
/// The search starts at `start` (the receiver itself, or the `_next` of the
/// sending method for `super`) and climbs class links until a level holds
/// the selector.
pub(crate) fn resolve_send(interp: &mut Interpreter, slot: usize) -> Result<(), BobError> {
    let stack = &interp.vm.stack;
    if slot + 3 > stack.len() {
        return Err(BobError::Impossible);
    }
    let (receiver, selector, start) = (stack[slot], stack[slot + 1], stack[slot + 2]);
    let mut cur = start;
    let method = loop {
        if let Some(m) = interp.get_property1(cur, selector)? {
            break m;
        }
        match class_of(&interp.heap, cur) {
            Some(class) => cur = class,
            None => {
                return Err(BobError::NoMethod {
                    object: interp.print_string(receiver),
                    selector: interp.print_string(selector),
                });
            }
        }
    };
    let next = if interp.heap.is_object(cur) {
        interp.heap.object(cur).map_or(Value::NIL, |o| o.class)
    } else {
        Value::NIL
    };
    let stack = &mut interp.vm.stack;
    stack[slot] = method;
    stack[slot + 1] = receiver;
    stack[slot + 2] = next;
    Ok(())
}

/// Bind the arguments above `slot` and start executing `code`.
pub(crate) fn enter_method(
    interp: &mut Interpreter,
    slot: usize,
    argc: usize,
    code: Value,
    env: Value,
    top: bool,
) -> Result<(), BobError> {
    if interp.vm.frames.len() >= interp.config.max_frames {
        return Err(BobError::StackOverflow);
    }
    let bytecode = interp
        .heap
        .code(code)
        .map(|c| c.bytecode.clone())
        .ok_or(BobError::Impossible)?;
    if bytecode.len() < HEADER_SIZE {
        return Err(BobError::BadOpcode(bytecode.first().copied().unwrap_or(0)));
    }
    let rest = match Op::from_byte(bytecode[0]) {
        Some(Op::AFrame) => false,
        Some(Op::AFrameR) => true,
        _ => return Err(BobError::BadOpcode(bytecode[0])),
    };
    let required = usize::from(bytecode[1]);
    let optional = usize::from(bytecode[2]);

    if argc < required {
        let callee = interp.vm.stack[slot];
        return Err(BobError::TooFewArguments(interp.print_string(callee)));
    }
    if !rest && argc > required + optional {
        let callee = interp.vm.stack[slot];
        return Err(BobError::TooManyArguments(interp.print_string(callee)));
    }

    let mut slots: Vec<Value> = interp.vm.stack.drain(slot + 1..).collect();
    let fixed = required + optional;
    let extra = if slots.len() > fixed {
        slots.split_off(fixed)
    } else {
        Vec::new()
    };
    slots.resize(fixed, Value::NIL);
    if rest {
        let v = interp.heap.make_vector(extra)?;
        slots.push(v);
    }
    let env = interp.heap.make_env(slots, env)?;

    let vm = &mut interp.vm;
    let frame = CallFrame {
        code: vm.code,
        bytecode: mem::replace(&mut vm.bytecode, bytecode),
        pc: vm.pc,
        env: vm.env,
        argc: vm.argc,
        base: slot,
        handlers: vm.handlers.len(),
        top,
    };
    vm.frames.push(Frame::Call(frame));
    vm.stack.truncate(slot);
    vm.code = code;
    vm.env = env;
    vm.pc = HEADER_SIZE;
    vm.argc = argc;
    Ok(())
}

/// Execute Op::Return. `true` when the returning frame was entered from
/// outside the loop.
pub(crate) fn op_return(interp: &mut Interpreter) -> Result<bool, BobError> {
    loop {
        match interp.vm.frames.pop() {
            Some(Frame::Block { .. }) => continue,
            Some(Frame::Call(frame)) => {
                let top = frame.top;
                interp.vm.restore(frame);
                return Ok(top);
            }
            None => return Err(BobError::Impossible),
        }
    }
}

/// Execute Op::Close: pair the code in the register with the current
/// environment.
pub(crate) fn op_close(interp: &mut Interpreter) -> Result<(), BobError> {
    if interp.heap.code(interp.vm.val).is_none() {
        return Err(BobError::TypeError(interp.print_string(interp.vm.val)));
    }
    interp.vm.val = interp.heap.make_method(interp.vm.val, interp.vm.env)?;
    Ok(())
}

/// Execute Op::ArgsGe: were at least `n` arguments passed?
pub(crate) fn op_argsge(interp: &mut Interpreter, n: usize) {
    interp.vm.val = Value::from_bool(interp.vm.argc >= n);
}
