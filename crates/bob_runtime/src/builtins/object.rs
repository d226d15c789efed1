//! Methods of the root object.

use smallvec::SmallVec;

use super::args::{check_count, check_min, this};
use crate::core::Value;
use crate::errors::BobError;
use crate::runtime::types::{clone_store, find_local, local_properties};
use crate::runtime::{Interpreter, TypeKind};
use crate::vm::{Args, NativeFn};

const METHODS: &[(&str, NativeFn)] = &[
    ("initialize", bif_initialize),
    ("Class", bif_class),
    ("Clone", bif_clone),
    ("Exists", bif_exists),
    ("ExistsLocally", bif_exists_locally),
    ("Send", bif_send),
    ("Show", bif_show),
];

pub(super) fn install(interp: &mut Interpreter) -> Result<(), BobError> {
    let root = interp.type_object(TypeKind::Object);
    for &(name, f) in METHODS {
        interp.define_method(root, name, f)?;
    }
    Ok(())
}

fn object_this(interp: &Interpreter, args: Args) -> Result<Value, BobError> {
    let obj = this(interp, args);
    if interp.heap.is_object(obj) {
        Ok(obj)
    } else {
        Err(BobError::TypeError(interp.print_string(obj)))
    }
}

fn bif_initialize(interp: &mut Interpreter, args: Args) -> Result<Value, BobError> {
    check_count(interp, args, 2)?;
    object_this(interp, args)
}

fn bif_class(interp: &mut Interpreter, args: Args) -> Result<Value, BobError> {
    check_count(interp, args, 2)?;
    let obj = object_this(interp, args)?;
    Ok(interp.heap.object(obj).map_or(Value::NIL, |o| o.class))
}

fn bif_clone(interp: &mut Interpreter, args: Args) -> Result<Value, BobError> {
    check_count(interp, args, 2)?;
    let obj = object_this(interp, args)?;
    let class = interp.heap.object(obj).map_or(Value::NIL, |o| o.class);
    let store = clone_store(&interp.heap, obj).unwrap_or_default();
    let copy = interp.heap.make_object(class)?;
    if let Some(o) = interp.heap.object_mut(copy) {
        o.store = store;
    }
    Ok(copy)
}

fn bif_exists(interp: &mut Interpreter, args: Args) -> Result<Value, BobError> {
    check_count(interp, args, 3)?;
    let mut obj = object_this(interp, args)?;
    let tag = args.get(interp, 3);
    while interp.heap.is_object(obj) {
        if find_local(&interp.heap, obj, tag).is_some() {
            return Ok(Value::TRUE);
        }
        obj = interp.heap.object(obj).map_or(Value::NIL, |o| o.class);
    }
    Ok(Value::NIL)
}

fn bif_exists_locally(interp: &mut Interpreter, args: Args) -> Result<Value, BobError> {
    check_count(interp, args, 3)?;
    let obj = object_this(interp, args)?;
    let tag = args.get(interp, 3);
    Ok(Value::from_bool(find_local(&interp.heap, obj, tag).is_some()))
}

/// `obj.Send(selector, args..., vector)`: the vector's elements follow the
/// other arguments.
fn bif_send(interp: &mut Interpreter, args: Args) -> Result<Value, BobError> {
    check_min(interp, args, 4)?;
    let obj = object_this(interp, args)?;
    let last = args.get(interp, args.count());
    let Some(spread) = interp.heap.vector(last) else {
        return Err(BobError::TypeError(interp.print_string(last)));
    };
    let mut pushed: SmallVec<[Value; 8]> = SmallVec::new();
    pushed.push(obj);
    pushed.push(args.get(interp, 3));
    pushed.push(obj);
    for i in 4..args.count() {
        pushed.push(args.get(interp, i));
    }
    pushed.extend(spread.iter().copied());
    let argc = pushed.len() - 1;
    for v in pushed {
        interp.vm.push(v)?;
    }
    interp.send_value(argc)
}

fn bif_show(interp: &mut Interpreter, args: Args) -> Result<Value, BobError> {
    check_count(interp, args, 2)?;
    let obj = object_this(interp, args)?;
    let class = interp.heap.object(obj).map_or(Value::NIL, |o| o.class);
    let mut out = format!("Class: {}\n", interp.print_string(class));
    let props = local_properties(&interp.heap, obj);
    if !props.is_empty() {
        out.push_str("Properties:\n");
        for (tag, value) in props {
            out.push_str("  ");
            out.push_str(&interp.print_string(tag));
            out.push_str(": ");
            out.push_str(&interp.print_string(value));
            out.push('\n');
        }
    }
    interp.write_output(&out);
    Ok(obj)
}
