//! Methods and properties of `Vector`.

use super::args::{check_count, check_range, integer_or, this};
use crate::core::Value;
use crate::errors::BobError;
use crate::runtime::{Interpreter, TypeKind};
use crate::vm::{Args, NativeFn};

const METHODS: &[(&str, NativeFn)] = &[
    ("initialize", bif_initialize),
    ("Clone", bif_clone),
    ("Push", bif_push),
    ("PushFront", bif_push_front),
    ("Pop", bif_pop),
    ("PopFront", bif_pop_front),
];

pub(super) fn install(interp: &mut Interpreter) -> Result<(), BobError> {
    let ty = interp.type_object(TypeKind::Vector);
    for &(name, f) in METHODS {
        interp.define_method(ty, name, f)?;
    }
    interp.define_virtual_property(ty, "size", Some(vp_size), Some(vp_set_size))
}

fn vector_this(interp: &Interpreter, args: Args) -> Result<Value, BobError> {
    let v = this(interp, args);
    if interp.heap.is_vector(v) {
        Ok(v)
    } else {
        Err(BobError::TypeError(interp.print_string(v)))
    }
}

/// Spare capacity added when a vector outgrows its allocation.
fn growth(len: usize) -> usize {
    (len / 2).clamp(8, 128)
}

fn resize(interp: &mut Interpreter, v: Value, size: i64) -> Result<(), BobError> {
    let Ok(size) = usize::try_from(size) else {
        return Err(BobError::ValueError(itoa::Buffer::new().format(size).to_string()));
    };
    let Some(items) = interp.heap.grow_vector(v, size, growth(size))? else {
        return Err(BobError::TypeError(interp.print_string(v)));
    };
    items.truncate(size);
    Ok(())
}

fn bif_initialize(interp: &mut Interpreter, args: Args) -> Result<Value, BobError> {
    check_range(interp, args, 2, 3)?;
    let v = vector_this(interp, args)?;
    let size = integer_or(interp, args, 3, 0)?;
    resize(interp, v, size)?;
    Ok(v)
}

fn bif_clone(interp: &mut Interpreter, args: Args) -> Result<Value, BobError> {
    check_count(interp, args, 2)?;
    let v = vector_this(interp, args)?;
    let items = interp.heap.vector(v).cloned().unwrap_or_default();
    interp.heap.make_vector(items)
}

fn push(interp: &mut Interpreter, args: Args, front: bool) -> Result<Value, BobError> {
    check_count(interp, args, 3)?;
    let v = vector_this(interp, args)?;
    let value = args.get(interp, 3);
    let len = interp.heap.vector(v).map_or(0, Vec::len);
    if let Some(items) = interp.heap.grow_vector(v, len + 1, growth(len))? {
        if front {
            items.pop();
            items.insert(0, value);
        } else {
            items[len] = value;
        }
    }
    Ok(value)
}

fn bif_push(interp: &mut Interpreter, args: Args) -> Result<Value, BobError> {
    push(interp, args, false)
}

fn bif_push_front(interp: &mut Interpreter, args: Args) -> Result<Value, BobError> {
    push(interp, args, true)
}

fn pop(interp: &mut Interpreter, args: Args, front: bool) -> Result<Value, BobError> {
    check_count(interp, args, 2)?;
    let v = vector_this(interp, args)?;
    let popped = match interp.heap.vector_mut(v) {
        Some(items) if !items.is_empty() => Some(if front {
            items.remove(0)
        } else {
            items.pop().unwrap_or(Value::NIL)
        }),
        _ => None,
    };
    popped.ok_or_else(|| BobError::StackEmpty(interp.print_string(v)))
}

fn bif_pop(interp: &mut Interpreter, args: Args) -> Result<Value, BobError> {
    pop(interp, args, false)
}

fn bif_pop_front(interp: &mut Interpreter, args: Args) -> Result<Value, BobError> {
    pop(interp, args, true)
}

fn vp_size(interp: &mut Interpreter, v: Value) -> Result<Value, BobError> {
    let len = interp.heap.vector(v).map_or(0, Vec::len);
    interp.heap.make_integer(len as i64)
}

fn vp_set_size(interp: &mut Interpreter, v: Value, size: Value) -> Result<(), BobError> {
    let Some(n) = interp.heap.integer(size) else {
        return Err(BobError::TypeError(interp.print_string(size)));
    };
    resize(interp, v, n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_is_clamped() {
        assert_eq!(growth(0), 8);
        assert_eq!(growth(100), 50);
        assert_eq!(growth(10_000), 128);
    }
}
