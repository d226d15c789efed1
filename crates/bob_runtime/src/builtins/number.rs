//! Methods of `Integer` and `Float`.

use super::args::{check_count, check_range, integer_or, this};
use crate::core::Value;
use crate::errors::BobError;
use crate::runtime::{Interpreter, TypeKind};
use crate::vm::{Args, NativeFn};

const INTEGER_METHODS: &[(&str, NativeFn)] = &[
    ("toFloat", bif_int_to_float),
    ("toInteger", bif_int_to_integer),
    ("toString", bif_int_to_string),
];

const FLOAT_METHODS: &[(&str, NativeFn)] = &[
    ("toFloat", bif_float_to_float),
    ("toInteger", bif_float_to_integer),
];

pub(super) fn install(interp: &mut Interpreter) -> Result<(), BobError> {
    let ty = interp.type_object(TypeKind::Integer);
    for &(name, f) in INTEGER_METHODS {
        interp.define_method(ty, name, f)?;
    }
    let ty = interp.type_object(TypeKind::Float);
    for &(name, f) in FLOAT_METHODS {
        interp.define_method(ty, name, f)?;
    }
    Ok(())
}

fn integer_this(interp: &Interpreter, args: Args) -> Result<i64, BobError> {
    let v = this(interp, args);
    interp
        .heap
        .integer(v)
        .ok_or_else(|| BobError::TypeError(interp.print_string(v)))
}

fn float_this(interp: &Interpreter, args: Args) -> Result<f64, BobError> {
    let v = this(interp, args);
    interp
        .heap
        .float(v)
        .ok_or_else(|| BobError::TypeError(interp.print_string(v)))
}

fn bif_int_to_float(interp: &mut Interpreter, args: Args) -> Result<Value, BobError> {
    check_count(interp, args, 2)?;
    let i = integer_this(interp, args)?;
    interp.heap.make_float(i as f64)
}

fn bif_int_to_integer(interp: &mut Interpreter, args: Args) -> Result<Value, BobError> {
    check_count(interp, args, 2)?;
    integer_this(interp, args)?;
    Ok(this(interp, args))
}

/// Digits of `i` in base 8, 10 or 16; other radixes have no rendering.
pub(crate) fn radix_string(i: i64, radix: i64) -> Option<String> {
    match radix {
        8 => Some(format!("{i:o}")),
        10 => Some(itoa::Buffer::new().format(i).to_string()),
        16 => Some(format!("{i:x}")),
        _ => None,
    }
}

fn bif_int_to_string(interp: &mut Interpreter, args: Args) -> Result<Value, BobError> {
    check_range(interp, args, 2, 3)?;
    let i = integer_this(interp, args)?;
    let radix = integer_or(interp, args, 3, 10)?;
    match radix_string(i, radix) {
        Some(s) => interp.heap.make_string(s.as_bytes()),
        None => Ok(Value::NIL),
    }
}

fn bif_float_to_float(interp: &mut Interpreter, args: Args) -> Result<Value, BobError> {
    check_count(interp, args, 2)?;
    float_this(interp, args)?;
    Ok(this(interp, args))
}

fn bif_float_to_integer(interp: &mut Interpreter, args: Args) -> Result<Value, BobError> {
    check_count(interp, args, 2)?;
    let f = float_this(interp, args)?;
    interp.heap.make_integer(f as i64)
}
