//! Argument checks shared by the built-ins.
//!
//! Counts include `this` and `_next`, so a method taking one argument
//! expects 3.

use crate::core::Value;
use crate::errors::BobError;
use crate::runtime::Interpreter;
use crate::vm::Args;

pub(crate) fn check_count(interp: &Interpreter, args: Args, n: usize) -> Result<(), BobError> {
    check_range(interp, args, n, n)
}

pub(crate) fn check_range(
    interp: &Interpreter,
    args: Args,
    min: usize,
    max: usize,
) -> Result<(), BobError> {
    if args.count() < min {
        return Err(BobError::TooFewArguments(interp.print_string(args.callee(interp))));
    }
    if args.count() > max {
        return Err(BobError::TooManyArguments(interp.print_string(args.callee(interp))));
    }
    Ok(())
}

pub(crate) fn check_min(interp: &Interpreter, args: Args, min: usize) -> Result<(), BobError> {
    check_range(interp, args, min, usize::MAX)
}

pub(crate) fn this(interp: &Interpreter, args: Args) -> Value {
    args.get(interp, 1)
}

pub(crate) fn integer(interp: &Interpreter, args: Args, n: usize) -> Result<i64, BobError> {
    let v = args.get(interp, n);
    interp
        .heap
        .integer(v)
        .ok_or_else(|| BobError::TypeError(interp.print_string(v)))
}

/// Optional integer argument.
pub(crate) fn integer_or(
    interp: &Interpreter,
    args: Args,
    n: usize,
    default: i64,
) -> Result<i64, BobError> {
    if args.count() < n {
        Ok(default)
    } else {
        integer(interp, args, n)
    }
}

pub(crate) fn string(interp: &Interpreter, args: Args, n: usize) -> Result<Vec<u8>, BobError> {
    let v = args.get(interp, n);
    interp
        .heap
        .string(v)
        .map(<[u8]>::to_vec)
        .ok_or_else(|| BobError::TypeError(interp.print_string(v)))
}

/// String argument naming a file.
pub(crate) fn path(interp: &Interpreter, args: Args, n: usize) -> Result<String, BobError> {
    string(interp, args, n).map(|b| String::from_utf8_lossy(&b).into_owned())
}
