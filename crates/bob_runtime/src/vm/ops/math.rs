//! Arithmetic and bitwise operations for the VM.
//!
//! Binary operators combine the popped stack top (left operand) with the
//! value register (right operand). Integer arithmetic wraps; division or
//! remainder by zero yields zero. A float on either side promotes the
//! operation to floating point, where the bitwise operators and `%` are
//! type errors.

use bob_ir::Op;

use crate::core::Value;
use crate::errors::BobError;
use crate::runtime::Interpreter;

#[derive(Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

fn number(interp: &Interpreter, v: Value) -> Option<Num> {
    if let Some(i) = interp.heap.integer(v) {
        return Some(Num::Int(i));
    }
    interp.heap.float(v).map(Num::Float)
}

fn as_float(n: Num) -> f64 {
    match n {
        Num::Int(i) => i as f64,
        Num::Float(f) => f,
    }
}

/// Negative counts shift by zero; counts of 64 or more shift every bit out.
fn shift_count(b: i64) -> u32 {
    b.clamp(0, 64) as u32
}

fn int_op(op: Op, a: i64, b: i64) -> i64 {
    match op {
        Op::Add => a.wrapping_add(b),
        Op::Sub => a.wrapping_sub(b),
        Op::Mul => a.wrapping_mul(b),
        Op::Div if b == 0 => 0,
        Op::Div => a.wrapping_div(b),
        Op::Rem if b == 0 => 0,
        Op::Rem => a.wrapping_rem(b),
        Op::Band => a & b,
        Op::Bor => a | b,
        Op::Xor => a ^ b,
        Op::Shl => a.checked_shl(shift_count(b)).unwrap_or(0),
        Op::Shr => a.checked_shr(shift_count(b)).unwrap_or(if a < 0 { -1 } else { 0 }),
        _ => 0,
    }
}

fn float_op(op: Op, a: f64, b: f64) -> Option<f64> {
    Some(match op {
        Op::Add => a + b,
        Op::Sub => a - b,
        Op::Mul => a * b,
        Op::Div if b == 0.0 => 0.0,
        Op::Div => a / b,
        _ => return None,
    })
}

/// Execute a binary arithmetic or bitwise opcode.
pub(crate) fn op_binary(interp: &mut Interpreter, op: Op) -> Result<(), BobError> {
    let p1 = interp.vm.pop()?;
    let p2 = interp.vm.val;

    if op == Op::Add && interp.heap.is_string(p2) {
        let Some(left) = interp.heap.string(p1) else {
            return Err(BobError::TypeError(interp.print_string(p1)));
        };
        let mut joined = Vec::with_capacity(left.len() + interp.heap.string(p2).map_or(0, <[u8]>::len));
        joined.extend_from_slice(left);
        joined.extend_from_slice(interp.heap.string(p2).unwrap_or(&[]));
        interp.vm.val = interp.heap.make_string(&joined)?;
        return Ok(());
    }

    let Some(a) = number(interp, p1) else {
        return Err(BobError::TypeError(interp.print_string(p1)));
    };
    let Some(b) = number(interp, p2) else {
        return Err(BobError::TypeError(interp.print_string(p2)));
    };
    interp.vm.val = match (a, b) {
        (Num::Int(x), Num::Int(y)) => interp.heap.make_integer(int_op(op, x, y))?,
        _ => match float_op(op, as_float(a), as_float(b)) {
            Some(f) => interp.heap.make_float(f)?,
            None => return Err(BobError::TypeError(interp.print_string(p1))),
        },
    };
    Ok(())
}

/// Execute Op::Neg, Op::Inc, Op::Dec or Op::Bnot on the value register.
pub(crate) fn op_unary(interp: &mut Interpreter, op: Op) -> Result<(), BobError> {
    let v = interp.vm.val;
    interp.vm.val = match number(interp, v) {
        Some(Num::Int(i)) => {
            let r = match op {
                Op::Neg => i.wrapping_neg(),
                Op::Inc => i.wrapping_add(1),
                Op::Dec => i.wrapping_sub(1),
                _ => !i,
            };
            interp.heap.make_integer(r)?
        }
        Some(Num::Float(f)) => {
            let r = match op {
                Op::Neg => -f,
                Op::Inc => f + 1.0,
                Op::Dec => f - 1.0,
                _ => return Err(BobError::TypeError(interp.print_string(v))),
            };
            interp.heap.make_float(r)?
        }
        None => return Err(BobError::TypeError(interp.print_string(v))),
    };
    Ok(())
}

/// Execute Op::Not.
pub(crate) fn op_not(interp: &mut Interpreter) {
    interp.vm.val = Value::from_bool(!interp.vm.val.is_truthy());
}
