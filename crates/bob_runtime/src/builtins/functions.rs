//! Global functions.

use super::args::{check_count, check_min, check_range, integer, integer_or, path, string};
use crate::core::Value;
use crate::errors::BobError;
use crate::runtime::types::hash_value;
use crate::runtime::{Interpreter, TypeKind};
use crate::vm::{Args, NativeFn};

const FUNCTIONS: &[(&str, NativeFn)] = &[
    ("Type", bif_type),
    ("Hash", bif_hash),
    ("toString", bif_to_string),
    ("rand", bif_rand),
    ("gc", bif_gc),
    ("Quit", bif_quit),
    ("print", bif_print),
    ("Load", bif_load),
    ("Eval", bif_eval),
    ("CompileFile", bif_compile_file),
    ("LoadObjectFile", bif_load_object_file),
];

pub(super) fn install(interp: &mut Interpreter) -> Result<(), BobError> {
    for &(name, f) in FUNCTIONS {
        interp.define_function(name, f)?;
    }
    Ok(())
}

fn bif_type(interp: &mut Interpreter, args: Args) -> Result<Value, BobError> {
    check_count(interp, args, 3)?;
    let name = TypeKind::of(&interp.heap, args.get(interp, 3)).name();
    interp.intern(name)
}

fn bif_hash(interp: &mut Interpreter, args: Args) -> Result<Value, BobError> {
    check_count(interp, args, 3)?;
    let h = hash_value(&interp.heap, args.get(interp, 3));
    interp.heap.make_integer(h)
}

/// Pad `text` with `fill` to `width` bytes: on the left for a positive
/// width, on the right for a negative one.
pub(crate) fn pad(text: &[u8], width: i64, fill: u8) -> Vec<u8> {
    let target = width.unsigned_abs() as usize;
    if text.len() >= target {
        return text.to_vec();
    }
    let padding = vec![fill; target - text.len()];
    if width > 0 {
        [padding.as_slice(), text].concat()
    } else {
        [text, padding.as_slice()].concat()
    }
}

fn bif_to_string(interp: &mut Interpreter, args: Args) -> Result<Value, BobError> {
    check_range(interp, args, 3, 5)?;
    let width = integer_or(interp, args, 4, 0)?;
    let fill = integer_or(interp, args, 5, i64::from(b' '))?;
    let text = interp.display_string(args.get(interp, 3));
    let padded = pad(text.as_bytes(), width, fill as u8);
    interp.heap.make_string(&padded)
}

fn bif_rand(interp: &mut Interpreter, args: Args) -> Result<Value, BobError> {
    check_count(interp, args, 3)?;
    let n = integer(interp, args, 3)?;
    if n <= 0 {
        return Err(BobError::ValueError(interp.print_string(args.get(interp, 3))));
    }
    let r = interp.next_random() % n;
    interp.heap.make_integer(r)
}

fn bif_gc(interp: &mut Interpreter, args: Args) -> Result<Value, BobError> {
    check_count(interp, args, 2)?;
    interp.collect();
    Ok(Value::NIL)
}

fn bif_quit(interp: &mut Interpreter, args: Args) -> Result<Value, BobError> {
    check_count(interp, args, 2)?;
    Err(BobError::Exit)
}

fn bif_print(interp: &mut Interpreter, args: Args) -> Result<Value, BobError> {
    check_min(interp, args, 2)?;
    let mut out = String::new();
    for i in 3..=args.count() {
        interp.write_value(&mut out, args.get(interp, i), false, 0);
    }
    interp.write_output(&out);
    Ok(Value::NIL)
}

/// `true` when the file was loaded, `nil` when it could not be opened.
fn loaded(result: Result<(), BobError>) -> Result<Value, BobError> {
    match result {
        Ok(()) => Ok(Value::TRUE),
        Err(BobError::FileNotFound(_)) => Ok(Value::NIL),
        Err(e) => Err(e),
    }
}

fn bif_load(interp: &mut Interpreter, args: Args) -> Result<Value, BobError> {
    check_count(interp, args, 3)?;
    let name = path(interp, args, 3)?;
    loaded(interp.load_file(name))
}

fn bif_eval(interp: &mut Interpreter, args: Args) -> Result<Value, BobError> {
    check_count(interp, args, 3)?;
    let source = string(interp, args, 3)?;
    interp.eval_bytes(&source)
}

fn bif_compile_file(interp: &mut Interpreter, args: Args) -> Result<Value, BobError> {
    check_count(interp, args, 4)?;
    let input = path(interp, args, 3)?;
    let output = path(interp, args, 4)?;
    loaded(interp.compile_file(input, output))
}

fn bif_load_object_file(interp: &mut Interpreter, args: Args) -> Result<Value, BobError> {
    check_count(interp, args, 3)?;
    let name = path(interp, args, 3)?;
    loaded(interp.load_object_file(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_direction_follows_the_sign() {
        assert_eq!(pad(b"7", 3, b'0'), b"007");
        assert_eq!(pad(b"7", -3, b'.'), b"7..");
        assert_eq!(pad(b"1234", 2, b' '), b"1234");
        assert_eq!(pad(b"x", 0, b' '), b"x");
    }
}
