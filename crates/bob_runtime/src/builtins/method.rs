//! Methods of `Method`.

use smallvec::SmallVec;

use super::args::{check_count, check_min, this};
use crate::core::heap::Record;
use crate::core::Value;
use crate::errors::BobError;
use crate::runtime::{Interpreter, TypeKind};
use crate::vm::{Args, NativeFn};

const METHODS: &[(&str, NativeFn)] = &[("Decode", bif_decode), ("Apply", bif_apply)];

pub(super) fn install(interp: &mut Interpreter) -> Result<(), BobError> {
    let ty = interp.type_object(TypeKind::Method);
    for &(name, f) in METHODS {
        interp.define_method(ty, name, f)?;
    }
    let ty = interp.type_object(TypeKind::CMethod);
    for &(name, f) in METHODS {
        interp.define_method(ty, name, f)?;
    }
    Ok(())
}

impl Interpreter {
    /// Disassembly of a method's bytecode, one instruction per line.
    pub fn disassemble(&self, method: Value) -> Option<String> {
        let code = match self.heap.get(method)? {
            Record::Method { code, .. } => *code,
            Record::Code(_) => method,
            _ => return None,
        };
        let c = self.heap.code(code)?;
        let prefix = self
            .code_name(code)
            .unwrap_or_else(|| format!("{:08x}", code.bits() as u32));
        let literal = |i: u16| {
            c.literals
                .get(usize::from(i))
                .map_or_else(|| "?".to_string(), |v| self.print_string(*v))
        };
        Some(bob_ir::disassemble(&prefix, &c.bytecode, &literal))
    }
}

fn bif_decode(interp: &mut Interpreter, args: Args) -> Result<Value, BobError> {
    check_count(interp, args, 2)?;
    let method = this(interp, args);
    let text = match interp.heap.get(method) {
        Some(Record::CMethod(_)) => format!("{}\n", interp.print_string(method)),
        Some(Record::Method { .. }) => interp.disassemble(method).unwrap_or_default(),
        _ => return Err(BobError::TypeError(interp.print_string(method))),
    };
    interp.write_output(&text);
    Ok(Value::TRUE)
}

/// `method.Apply(this, args..., vector)`: call with an explicit `this`, the
/// vector's elements following the other arguments.
fn bif_apply(interp: &mut Interpreter, args: Args) -> Result<Value, BobError> {
    check_min(interp, args, 4)?;
    let method = this(interp, args);
    let last = args.get(interp, args.count());
    let Some(spread) = interp.heap.vector(last) else {
        return Err(BobError::TypeError(interp.print_string(last)));
    };
    let mut pushed: SmallVec<[Value; 8]> = SmallVec::new();
    pushed.push(method);
    pushed.push(args.get(interp, 3));
    pushed.push(Value::NIL);
    for i in 4..args.count() {
        pushed.push(args.get(interp, i));
    }
    pushed.extend(spread.iter().copied());
    let argc = pushed.len() - 1;
    for v in pushed {
        interp.vm.push(v)?;
    }
    interp.apply(argc)
}
