mod common;

use std::cell::Cell;
use std::rc::Rc;

use bob_runtime::{Interpreter, InterpreterConfig, NativeResource};
use proptest::prelude::*;

fn small_heap() -> Interpreter {
    Interpreter::with_config(InterpreterConfig {
        heap_size: 256 * 1024,
        ..InterpreterConfig::default()
    })
    .unwrap()
}

#[test]
fn allocation_pressure_triggers_collections() {
    let mut interp = small_heap();
    let src = r#"
        keep = [];
        for (i = 0; i < 20000; ++i) {
            s = toString(i);
            if (i % 1000 == 0) keep.Push(s);
        }
        keep.size;
    "#;
    let n = interp.eval(src).unwrap();
    assert_eq!(interp.integer_value(n), Some(20));
    assert!(interp.heap().collections() > 0);
    let keep = interp.global("keep");
    let items = interp.vector_items(keep).unwrap().to_vec();
    assert_eq!(interp.string_value(items[7]), Some(&b"7000"[..]));
}

#[test]
fn closures_survive_collections_mid_call() {
    let mut interp = small_heap();
    let src = r#"
        define make(n) { local tag = toString(n); return function () { return tag; }; }
        fs = [];
        for (i = 0; i < 200; ++i) { fs.Push(make(i)); gc(); }
        fs[123]();
    "#;
    let v = interp.eval(src).unwrap();
    assert_eq!(interp.string_value(v), Some(&b"123"[..]));
}

/// Each element is stored, and `gc()` runs after elements whose flag is set.
fn program(items: &[(i32, bool)]) -> String {
    let mut src = String::from("keep = [];\n");
    for (n, collect) in items {
        src.push_str(&format!(
            "keep.Push(\\{{ n: {n}, s: \"{n}\", f: {n}.5, v: [{n}] }});\n"
        ));
        if *collect {
            src.push_str("gc();\n");
        }
    }
    src
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn reachable_values_are_unchanged_by_collection(
        items in prop::collection::vec((-100_000i32..100_000, any::<bool>()), 1..40)
    ) {
        let mut interp = small_heap();
        interp.load_source(&program(&items)).unwrap();
        interp.collect();
        let keep = interp.global("keep");
        let objects = interp.vector_items(keep).unwrap().to_vec();
        prop_assert_eq!(objects.len(), items.len());
        let n_tag = interp.intern("n").unwrap();
        let s_tag = interp.intern("s").unwrap();
        let f_tag = interp.intern("f").unwrap();
        let v_tag = interp.intern("v").unwrap();
        for (obj, (n, _)) in objects.iter().zip(&items) {
            let n_val = interp.property(*obj, n_tag).unwrap().unwrap();
            prop_assert_eq!(interp.integer_value(n_val), Some(i64::from(*n)));
            let s_val = interp.property(*obj, s_tag).unwrap().unwrap();
            let text = n.to_string();
            prop_assert_eq!(interp.string_value(s_val), Some(text.as_bytes()));
            let f_val = interp.property(*obj, f_tag).unwrap().unwrap();
            let expected: f64 = format!("{n}.5").parse().unwrap();
            prop_assert_eq!(interp.float_value(f_val), Some(expected));
            let v_val = interp.property(*obj, v_tag).unwrap().unwrap();
            let inner = interp.vector_items(v_val).unwrap().to_vec();
            prop_assert!(interp.equal(inner[0], n_val));
        }
    }
}

struct Counted(Rc<Cell<usize>>);

impl NativeResource for Counted {
    fn type_name(&self) -> &str {
        "Counted"
    }

    fn destroy(self: Box<Self>) {
        self.0.set(self.0.get() + 1);
    }
}

#[test]
fn unreachable_cobjects_are_destroyed_once() {
    let dropped = Rc::new(Cell::new(0));
    let kept = Rc::new(Cell::new(0));
    let mut interp = Interpreter::new().unwrap();
    let class = interp.global("Object");
    interp
        .make_cobject(class, Box::new(Counted(dropped.clone())))
        .unwrap();
    let held = interp
        .make_cobject(class, Box::new(Counted(kept.clone())))
        .unwrap();
    interp.set_global("held", held).unwrap();

    let stats = interp.collect();
    assert_eq!(stats.destroyed, 1);
    assert_eq!(dropped.get(), 1);
    assert_eq!(kept.get(), 0);

    interp.collect();
    assert_eq!(dropped.get(), 1);
    let held = interp.global("held");
    assert!(interp.print_string(held).starts_with("<Counted-"));

    drop(interp);
    assert_eq!(kept.get(), 1);
    assert_eq!(dropped.get(), 1);
}

#[test]
fn cobjects_keep_properties_across_collections() {
    let count = Rc::new(Cell::new(0));
    let mut interp = Interpreter::new().unwrap();
    let class = interp.global("Object");
    let c = interp.make_cobject(class, Box::new(Counted(count.clone()))).unwrap();
    interp.set_global("c", c).unwrap();
    interp.load_source("c.label = \"native\"; gc();").unwrap();
    let v = interp.eval("c.label;").unwrap();
    assert_eq!(interp.string_value(v), Some(&b"native"[..]));
    assert_eq!(count.get(), 0);
}
