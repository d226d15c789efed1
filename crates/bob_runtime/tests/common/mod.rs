#![allow(dead_code)]

use bob_runtime::{BobError, Interpreter, Value};

pub fn interp() -> Interpreter {
    Interpreter::new().unwrap()
}

/// Evaluate `src` in a fresh interpreter and return the last statement's
/// value along with the interpreter that owns it.
pub fn eval(src: &str) -> (Interpreter, Value) {
    let mut interp = interp();
    let v = interp.eval(src).unwrap_or_else(|e| panic!("{src}: {e}"));
    (interp, v)
}

pub fn eval_int(src: &str) -> i64 {
    let (interp, v) = eval(src);
    interp
        .integer_value(v)
        .unwrap_or_else(|| panic!("{src}: not an integer: {}", interp.print_string(v)))
}

pub fn eval_printed(src: &str) -> String {
    let (interp, v) = eval(src);
    interp.print_string(v)
}

/// Output written by `src` through `print`.
pub fn output_of(src: &str) -> String {
    let mut interp = interp();
    interp.load_source(src).unwrap_or_else(|e| panic!("{src}: {e}"));
    interp.take_output()
}

pub fn eval_err(src: &str) -> BobError {
    let mut interp = interp();
    match interp.eval(src) {
        Ok(v) => panic!("{src}: expected an error, got {}", interp.print_string(v)),
        Err(e) => e,
    }
}
