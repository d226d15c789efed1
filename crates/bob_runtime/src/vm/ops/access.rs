//! Variable, property and element access for the VM.

use crate::core::heap::Record;
use crate::core::Value;
use crate::errors::BobError;
use crate::runtime::Interpreter;

pub(crate) fn literal(interp: &Interpreter, index: u16) -> Result<Value, BobError> {
    interp
        .heap
        .code(interp.vm.code)
        .and_then(|c| c.literals.get(usize::from(index)).copied())
        .ok_or(BobError::Impossible)
}

/// Execute Op::Gref. Unbound globals read as `nil`.
pub(crate) fn op_gref(interp: &mut Interpreter, index: u16) -> Result<(), BobError> {
    let sym = literal(interp, index)?;
    interp.vm.val = interp.symbol_value(sym);
    Ok(())
}

/// Execute Op::Gset.
pub(crate) fn op_gset(interp: &mut Interpreter, index: u16) -> Result<(), BobError> {
    let sym = literal(interp, index)?;
    interp.set_symbol_value(sym, interp.vm.val);
    Ok(())
}

/// Environment `level` links out from the current one.
fn env_at(interp: &Interpreter, level: u8) -> Result<Value, BobError> {
    let mut env = interp.vm.env;
    for _ in 0..level {
        env = match interp.heap.get(env) {
            Some(Record::Env { next, .. }) => *next,
            _ => return Err(BobError::Impossible),
        };
    }
    Ok(env)
}

/// Execute Op::Eref. Slots are numbered from 1.
pub(crate) fn op_eref(interp: &mut Interpreter, level: u8, offset: u8) -> Result<(), BobError> {
    let env = env_at(interp, level)?;
    let slot = usize::from(offset).checked_sub(1).ok_or(BobError::Impossible)?;
    interp.vm.val = match interp.heap.get(env) {
        Some(Record::Env { slots, .. }) => *slots.get(slot).ok_or(BobError::Impossible)?,
        _ => return Err(BobError::Impossible),
    };
    Ok(())
}

/// Execute Op::Eset.
pub(crate) fn op_eset(interp: &mut Interpreter, level: u8, offset: u8) -> Result<(), BobError> {
    let env = env_at(interp, level)?;
    let slot = usize::from(offset).checked_sub(1).ok_or(BobError::Impossible)?;
    let val = interp.vm.val;
    match interp.heap.get_mut(env) {
        Some(Record::Env { slots, .. }) => {
            *slots.get_mut(slot).ok_or(BobError::Impossible)? = val;
            Ok(())
        }
        _ => Err(BobError::Impossible),
    }
}

/// Execute Op::Getp and Op::Vref: object popped, tag in the register.
pub(crate) fn op_get(interp: &mut Interpreter) -> Result<(), BobError> {
    let obj = interp.vm.pop()?;
    let tag = interp.vm.val;
    match interp.get_property(obj, tag)? {
        Some(v) => {
            interp.vm.val = v;
            Ok(())
        }
        None => Err(BobError::NoProperty {
            object: interp.print_string(obj),
            tag: interp.print_string(tag),
        }),
    }
}

/// Execute Op::Setp and Op::Vset: object and tag popped, value in the
/// register (and left there).
pub(crate) fn op_set(interp: &mut Interpreter) -> Result<(), BobError> {
    let tag = interp.vm.pop()?;
    let obj = interp.vm.pop()?;
    let value = interp.vm.val;
    if interp.set_property(obj, tag, value)? {
        Ok(())
    } else {
        Err(BobError::NoProperty {
            object: interp.print_string(obj),
            tag: interp.print_string(tag),
        })
    }
}

/// Execute Op::NewObject on the class in the register.
pub(crate) fn op_new_object(interp: &mut Interpreter) -> Result<(), BobError> {
    interp.vm.val = interp.new_instance(interp.vm.val)?;
    Ok(())
}

/// Execute Op::NewVector: the register holds the element count, the
/// elements are on the stack in order.
pub(crate) fn op_new_vector(interp: &mut Interpreter) -> Result<(), BobError> {
    let count = interp.vm.val;
    let n = interp
        .heap
        .integer(count)
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| BobError::TypeError(interp.print_string(count)))?;
    let start = interp
        .vm
        .stack
        .len()
        .checked_sub(n)
        .ok_or(BobError::Impossible)?;
    let items = interp.vm.stack.split_off(start);
    interp.vm.val = interp.heap.make_vector(items)?;
    Ok(())
}
