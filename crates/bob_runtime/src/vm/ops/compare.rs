//! Relational and equality operations for the VM.

use std::cmp::Ordering;

use bob_ir::Op;

use crate::core::Value;
use crate::errors::BobError;
use crate::runtime::types::eql;
use crate::runtime::Interpreter;

/// Execute a comparison opcode: popped value on the left, register on the
/// right.
pub(crate) fn op_compare(interp: &mut Interpreter, op: Op) -> Result<(), BobError> {
    let p1 = interp.vm.pop()?;
    let p2 = interp.vm.val;
    let result = match op {
        Op::Eq => eql(&interp.heap, p1, p2),
        Op::Ne => !eql(&interp.heap, p1, p2),
        _ => {
            let ord = interp.compare(p1, p2)?;
            match op {
                Op::Lt => ord == Ordering::Less,
                Op::Le => ord != Ordering::Greater,
                Op::Ge => ord != Ordering::Less,
                Op::Gt => ord == Ordering::Greater,
                _ => return Err(BobError::Impossible),
            }
        }
    };
    interp.vm.val = Value::from_bool(result);
    Ok(())
}
