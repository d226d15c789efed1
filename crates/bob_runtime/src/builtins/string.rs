//! Methods and properties of `String` and `Symbol`.

use super::args::{check_count, check_range, integer, integer_or, this};
use crate::core::Value;
use crate::errors::BobError;
use crate::runtime::{Interpreter, TypeKind};
use crate::vm::{Args, NativeFn};

const METHODS: &[(&str, NativeFn)] = &[
    ("initialize", bif_initialize),
    ("Intern", bif_intern),
    ("Index", bif_index),
    ("ReverseIndex", bif_reverse_index),
    ("Substring", bif_substring),
    ("toInteger", bif_to_integer),
    ("toFloat", bif_to_float),
];

pub(super) fn install(interp: &mut Interpreter) -> Result<(), BobError> {
    let ty = interp.type_object(TypeKind::String);
    for &(name, f) in METHODS {
        interp.define_method(ty, name, f)?;
    }
    interp.define_virtual_property(ty, "size", Some(vp_size), None)?;
    let sym = interp.type_object(TypeKind::Symbol);
    interp.define_virtual_property(sym, "printName", Some(vp_print_name), None)
}

fn string_this(interp: &Interpreter, args: Args) -> Result<Vec<u8>, BobError> {
    let v = this(interp, args);
    interp
        .heap
        .string(v)
        .map(<[u8]>::to_vec)
        .ok_or_else(|| BobError::TypeError(interp.print_string(v)))
}

/// `String.initialize(size)` makes a new string of `size` NUL bytes.
fn bif_initialize(interp: &mut Interpreter, args: Args) -> Result<Value, BobError> {
    check_range(interp, args, 2, 3)?;
    string_this(interp, args)?;
    let size = integer_or(interp, args, 3, 0)?;
    let size = usize::try_from(size).map_err(|_| BobError::ValueError(size.to_string()))?;
    interp.heap.make_string(&vec![0; size])
}

fn bif_intern(interp: &mut Interpreter, args: Args) -> Result<Value, BobError> {
    check_count(interp, args, 2)?;
    let s = string_this(interp, args)?;
    interp.intern_bytes(&s)
}

fn find_byte(interp: &mut Interpreter, args: Args, reverse: bool) -> Result<Value, BobError> {
    check_count(interp, args, 3)?;
    let s = string_this(interp, args)?;
    let ch = integer(interp, args, 3)? as u8;
    let found = if reverse {
        s.iter().rposition(|&b| b == ch)
    } else {
        s.iter().position(|&b| b == ch)
    };
    match found {
        Some(i) => interp.heap.make_integer(i as i64),
        None => Ok(Value::NIL),
    }
}

fn bif_index(interp: &mut Interpreter, args: Args) -> Result<Value, BobError> {
    find_byte(interp, args, false)
}

fn bif_reverse_index(interp: &mut Interpreter, args: Args) -> Result<Value, BobError> {
    find_byte(interp, args, true)
}

/// Byte range for `Substring(start, count)`. A negative start counts from
/// the end; a negative count takes the rest of the string.
pub(crate) fn substring_range(len: usize, start: i64, count: i64) -> Option<(usize, usize)> {
    let len = len as i64;
    let start = if start < 0 { len + start } else { start };
    if start < 0 || start > len {
        return None;
    }
    let count = if count < 0 { len - start } else { count };
    if start + count > len {
        return None;
    }
    Some((start as usize, (start + count) as usize))
}

fn bif_substring(interp: &mut Interpreter, args: Args) -> Result<Value, BobError> {
    check_range(interp, args, 3, 4)?;
    let s = string_this(interp, args)?;
    let start = integer(interp, args, 3)?;
    let count = integer_or(interp, args, 4, -1)?;
    match substring_range(s.len(), start, count) {
        Some((from, to)) => interp.heap.make_string(&s[from..to]),
        None => Ok(Value::NIL),
    }
}

/// Leading integer of `s` the way `atoi` reads it: optional blanks and sign,
/// then digits. Anything else yields 0.
pub(crate) fn parse_leading_int(s: &[u8]) -> i64 {
    let text = String::from_utf8_lossy(s);
    let t = text.trim_start();
    let (neg, digits) = match t.as_bytes().first() {
        Some(b'-') => (true, &t[1..]),
        Some(b'+') => (false, &t[1..]),
        _ => (false, t),
    };
    let n = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |n, d| n.wrapping_mul(10).wrapping_add(i64::from(d - b'0')));
    if neg { n.wrapping_neg() } else { n }
}

/// Longest float prefix of `s`, as `atof` reads it.
pub(crate) fn parse_leading_float(s: &[u8]) -> f64 {
    let text = String::from_utf8_lossy(s);
    let t = text.trim_start();
    let bytes = t.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    if bytes.get(end) == Some(&b'.') {
        end += 1;
        while bytes.get(end).is_some_and(u8::is_ascii_digit) {
            end += 1;
        }
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        if bytes.get(exp).is_some_and(u8::is_ascii_digit) {
            while bytes.get(exp).is_some_and(u8::is_ascii_digit) {
                exp += 1;
            }
            end = exp;
        }
    }
    // Shrink until the prefix parses, e.g. a lone sign or a lone dot.
    while end > 0 {
        if let Ok(f) = t[..end].parse::<f64>() {
            return f;
        }
        end -= 1;
    }
    0.0
}

fn bif_to_integer(interp: &mut Interpreter, args: Args) -> Result<Value, BobError> {
    check_count(interp, args, 2)?;
    let s = string_this(interp, args)?;
    interp.heap.make_integer(parse_leading_int(&s))
}

fn bif_to_float(interp: &mut Interpreter, args: Args) -> Result<Value, BobError> {
    check_count(interp, args, 2)?;
    let s = string_this(interp, args)?;
    interp.heap.make_float(parse_leading_float(&s))
}

fn vp_size(interp: &mut Interpreter, v: Value) -> Result<Value, BobError> {
    let len = interp.heap.string(v).map_or(0, <[u8]>::len);
    interp.heap.make_integer(len as i64)
}

fn vp_print_name(interp: &mut Interpreter, v: Value) -> Result<Value, BobError> {
    let name = interp
        .heap
        .symbol(v)
        .map(|s| s.name.to_vec())
        .ok_or_else(|| BobError::TypeError(interp.print_string(v)))?;
    interp.heap.make_string(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_ranges() {
        assert_eq!(substring_range(5, 1, 2), Some((1, 3)));
        assert_eq!(substring_range(5, 1, -1), Some((1, 5)));
        assert_eq!(substring_range(5, -2, -1), Some((3, 5)));
        assert_eq!(substring_range(5, 6, -1), None);
        assert_eq!(substring_range(5, -6, -1), None);
        assert_eq!(substring_range(5, 3, 3), None);
        assert_eq!(substring_range(5, 5, -1), Some((5, 5)));
    }

    #[test]
    fn leading_numbers() {
        assert_eq!(parse_leading_int(b"  42abc"), 42);
        assert_eq!(parse_leading_int(b"-7"), -7);
        assert_eq!(parse_leading_int(b"x1"), 0);
        assert_eq!(parse_leading_float(b"2.5e2x"), 250.0);
        assert_eq!(parse_leading_float(b"1e"), 1.0);
        assert_eq!(parse_leading_float(b"-.5"), -0.5);
        assert_eq!(parse_leading_float(b"."), 0.0);
    }
}
