use std::cell::RefCell;
use std::rc::Rc;

use bob_runtime::errors::codes;
use bob_runtime::{
    Args, BobError, Interpreter, InterpreterConfig, NativeResource, TypeKind, Value,
};

fn native_sum(interp: &mut Interpreter, args: Args) -> Result<Value, BobError> {
    let mut total = 0;
    for i in 3..=args.count() {
        let v = args.get(interp, i);
        total += interp
            .integer_value(v)
            .ok_or_else(|| BobError::TypeError(interp.print_string(v)))?;
    }
    interp.make_integer(total)
}

fn native_callback(interp: &mut Interpreter, args: Args) -> Result<Value, BobError> {
    let f = args.get(interp, 3);
    let x = args.get(interp, 4);
    interp.call(f, &[x, x])
}

#[test]
fn native_functions_are_callable_from_scripts() {
    let mut interp = Interpreter::new().unwrap();
    interp.define_function("sum", native_sum).unwrap();
    let v = interp.eval("sum(1, 2, 3, 4);").unwrap();
    assert_eq!(interp.integer_value(v), Some(10));
    assert!(matches!(interp.eval("sum(1, nil);"), Err(BobError::TypeError(_))));
}

#[test]
fn natives_can_call_back_into_scripts() {
    let mut interp = Interpreter::new().unwrap();
    interp.define_function("twice", native_callback).unwrap();
    let v = interp
        .eval("define mul(a, b) { return a * b; } twice(mul, 9);")
        .unwrap();
    assert_eq!(interp.integer_value(v), Some(81));
}

#[test]
fn script_throw_crosses_a_native_frame() {
    let mut interp = Interpreter::new().unwrap();
    interp.define_function("twice", native_callback).unwrap();
    let src = r#"
        define bad(a, b) { throw a + b; }
        r = nil;
        try { twice(bad, 4); } catch (e) { r = e; }
        r;
    "#;
    let v = interp.eval(src).unwrap();
    assert_eq!(interp.integer_value(v), Some(8));
}

#[test]
fn call_and_send_from_the_host() {
    let mut interp = Interpreter::new().unwrap();
    interp
        .load_source(
            r#"
            define inc(x) { return x + 1; }
            Counter = new Object();
            define Counter.initialize() { this.n = 0; return this; }
            define Counter.bump(by) { this.n += by; return this.n; }
            c = new Counter();
            "#,
        )
        .unwrap();
    let inc = interp.global("inc");
    let v = interp.call(inc, &[Value::small_int(41).unwrap()]).unwrap();
    assert_eq!(interp.integer_value(v), Some(42));

    let c = interp.global("c");
    interp.send(c, "bump", &[Value::small_int(5).unwrap()]).unwrap();
    let c = interp.global("c");
    let n = interp.send(c, "bump", &[Value::small_int(2).unwrap()]).unwrap();
    assert_eq!(interp.integer_value(n), Some(7));

    let c = interp.global("c");
    assert!(matches!(
        interp.send(c, "missing", &[]),
        Err(BobError::NoMethod { .. })
    ));
}

#[test]
fn errors_leave_the_interpreter_usable() {
    let mut interp = Interpreter::new().unwrap();
    assert!(interp.eval("define f() { return nil + 1; } f();").is_err());
    let v = interp.eval("1 + 1;").unwrap();
    assert_eq!(interp.integer_value(v), Some(2));
}

#[test]
fn default_handler_writes_message_and_trace() {
    let mut interp = Interpreter::with_config(InterpreterConfig {
        emit_line_numbers: true,
        ..InterpreterConfig::default()
    })
    .unwrap();
    let err = interp
        .eval("define inner() {\n  return nil - 1;\n}\ndefine outer() { return inner(); }\nouter();")
        .unwrap_err();
    assert!(matches!(err, BobError::TypeError(_)));
    let trace = interp.last_trace().unwrap().to_string();
    assert!(trace.starts_with("Happened in inner at "), "{trace}");
    assert!(trace.contains("line 2"), "{trace}");
    assert!(trace.contains("Called from:\n  outer"), "{trace}");

    interp.handle_error(&err);
    let errors = interp.take_errors();
    assert!(errors.starts_with("Error: Wrong type - "), "{errors}");
    assert!(errors.contains("Happened in inner"), "{errors}");
    assert!(interp.last_trace().is_none());
}

#[test]
fn installed_handler_receives_errors() {
    let seen: Rc<RefCell<Vec<(u32, String)>>> = Rc::default();
    let sink = seen.clone();
    let mut interp = Interpreter::new().unwrap();
    interp.set_error_handler(Box::new(move |err: &BobError, _trace: &str| {
        sink.borrow_mut().push((err.code(), err.to_string()));
    }));
    let err = interp.eval("undefinedThing.x;").unwrap_err();
    interp.handle_error(&err);
    let err = interp.eval("Quit();").unwrap_err();
    interp.handle_error(&err);
    let seen = seen.borrow();
    assert_eq!(seen[1], (codes::EXIT, "Exit".to_string()));
    assert_eq!(seen.len(), 2);
    assert!(interp.take_errors().is_empty());
}

#[test]
fn compile_errors_name_the_line() {
    let mut interp = Interpreter::new().unwrap();
    let err = interp.eval("a = 1;\nb = ;\n").unwrap_err();
    let BobError::Compile(e) = &err else {
        panic!("{err:?}");
    };
    assert_eq!(e.line, 2);
    // statements before the error already ran
    assert_eq!(interp.integer_value(interp.global("a")), Some(1));
}

struct Sensor;

impl NativeResource for Sensor {
    fn type_name(&self) -> &str {
        "Sensor"
    }

    fn destroy(self: Box<Self>) {}
}

#[test]
fn virtual_properties_on_native_objects() {
    fn get_answer(interp: &mut Interpreter, _obj: Value) -> Result<Value, BobError> {
        interp.make_integer(42)
    }
    let mut interp = Interpreter::new().unwrap();
    let ty = interp.type_object(TypeKind::CObject);
    interp
        .define_virtual_property(ty, "answer", Some(get_answer), None)
        .unwrap();
    let class = interp.global("Object");
    let sensor = interp.make_cobject(class, Box::new(Sensor)).unwrap();
    interp.set_global("sensor", sensor).unwrap();
    let v = interp.eval("sensor.answer;").unwrap();
    assert_eq!(interp.integer_value(v), Some(42));
    assert_eq!(
        interp.eval("sensor.answer = 1;").unwrap_err(),
        BobError::ReadOnlyProperty
    );
    // ordinary properties still land in the object's own store
    let v = interp.eval("sensor.note = 5; sensor.note;").unwrap();
    assert_eq!(interp.integer_value(v), Some(5));
}

#[test]
fn protected_values_track_collection() {
    let mut interp = Interpreter::new().unwrap();
    let s = interp.make_string("pinned").unwrap();
    interp.protect(s);
    for _ in 0..50 {
        interp.make_string("noise").unwrap();
    }
    interp.collect();
    let s = interp.unprotect();
    assert_eq!(interp.string_value(s), Some(&b"pinned"[..]));
}
