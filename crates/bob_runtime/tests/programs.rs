mod common;

use bob_runtime::{BobError, Interpreter, InterpreterConfig};
use common::{eval_err, eval_int, eval_printed, output_of};

#[test]
fn optional_argument_takes_its_default() {
    assert_eq!(eval_int("define f(a, b = 2) { return a + b; } f(3);"), 5);
    assert_eq!(eval_int("define f(a, b = 2) { return a + b; } f(3, 4);"), 7);
}

#[test]
fn defaults_see_earlier_arguments() {
    assert_eq!(eval_int("define f(a, b = a * 10) { return b; } f(4);"), 40);
}

#[test]
fn vector_push_grows_size() {
    assert_eq!(eval_int("local v = [1, 2, 3]; v.Push(4); v.size;"), 4);
}

#[test]
fn switch_runs_matching_case_only_with_break() {
    let src = r#"
        r = "";
        switch (2) {
            case 1: r = r + "a"; break;
            case 2: r = r + "b"; break;
            default: r = r + "d";
        }
        r;
    "#;
    assert_eq!(eval_printed(src), "\"b\"");
}

#[test]
fn switch_falls_through_without_break() {
    let src = r#"
        r = "";
        switch (2) {
            case 1: r = r + "a";
            case 2: r = r + "b";
            default: r = r + "d";
        }
        r;
    "#;
    assert_eq!(eval_printed(src), "\"bd\"");
}

#[test]
fn switch_without_match_takes_default() {
    let src = "r = 0; switch (9) { case 1: r = 1; break; default: r = 2; } r;";
    assert_eq!(eval_int(src), 2);
}

#[test]
fn integer_and_float_arithmetic() {
    assert_eq!(eval_int("7 / 2;"), 3);
    assert_eq!(eval_int("7 % 3;"), 1);
    assert_eq!(eval_int("-7 / 2;"), -3);
    assert_eq!(eval_int("1 << 10 | 3;"), 1027);
    assert_eq!(eval_int("6 ^ 3;"), 5);
    assert_eq!(eval_int("~0;"), -1);
    assert_eq!(eval_printed("1 / 2.0;"), "0.5");
    assert_eq!(eval_printed("2.0 * 3;"), "6.0");
    assert_eq!(eval_int("1 / 0;"), 0);
    assert_eq!(eval_int("1 << 64;"), 0);
    assert_eq!(eval_int("-8 >> 70;"), -1);
}

#[test]
fn zero_is_true() {
    assert_eq!(eval_int("r = 1; if (0) r = 2; r;"), 2);
    assert_eq!(eval_printed("!0;"), "nil");
}

#[test]
fn comparisons_mix_numbers() {
    assert_eq!(eval_printed("1 < 1.5;"), "true");
    assert_eq!(eval_printed("2 == 2.0;"), "true");
    assert_eq!(eval_printed("\"abc\" < \"abd\";"), "true");
    assert_eq!(eval_printed("3 != 3;"), "nil");
}

#[test]
fn loops_and_continue() {
    assert_eq!(eval_int("s = 0; for (i = 0; i < 10; ++i) s += i; s;"), 45);
    let src = "n = 0; i = 0; while (i < 10) { ++i; if (i % 2 == 1) continue; n += i; } n;";
    assert_eq!(eval_int(src), 30);
    assert_eq!(eval_int("i = 0; do { i += 3; } while (i < 10); i;"), 12);
}

#[test]
fn break_leaves_a_block_with_locals() {
    let src = r#"
        define f() {
            local n = 0;
            while (1) {
                local k = n;
                if (k > 4) break;
                n = k + 1;
            }
            return n;
        }
        f();
    "#;
    assert_eq!(eval_int(src), 5);
}

#[test]
fn closures_capture_and_mutate() {
    let src = r#"
        define adder(n) { return function (x) { return x + n; }; }
        add2 = adder(2);
        add2(5);
    "#;
    assert_eq!(eval_int(src), 7);
    let src = r#"
        define counter() {
            local n = 0;
            return function () { return ++n; };
        }
        c = counter();
        c(); c();
        d = counter();
        d();
        c();
    "#;
    assert_eq!(eval_int(src), 3);
}

#[test]
fn recursion() {
    let src = "define fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); } fib(15);";
    assert_eq!(eval_int(src), 610);
}

#[test]
fn rest_parameter_collects_extra_arguments() {
    assert_eq!(eval_int("define h(a, r..) { return r.size; } h(1, 2, 3);"), 2);
    assert_eq!(eval_int("define h(a, r..) { return r.size; } h(1);"), 0);
}

const POINT: &str = r#"
    Point = new Object();
    define Point.initialize(x, y) { this.x = x; this.y = y; return this; }
    define Point.sum() { return this.x + this.y; }
"#;

#[test]
fn instances_use_prototype_methods() {
    let src = format!("{POINT} p = new Point(3, 4); p.sum();");
    assert_eq!(eval_int(&src), 7);
}

#[test]
fn instance_properties_shadow_without_touching_the_prototype() {
    let src = format!(
        r#"{POINT}
        Point.color = "red";
        p = new Point(0, 0);
        q = new Point(1, 1);
        p.color = "blue";
        print(p.color, " ", q.color, " ", Point.color);
        "#
    );
    assert_eq!(output_of(&src), "blue red red");
}

#[test]
fn super_starts_at_the_next_prototype() {
    let src = r#"
        Base = new Object();
        define Base.name() { return "base"; }
        Derived = new Base();
        define Derived.name() { return "derived+" + super.name(); }
        d = new Derived();
        d.name();
    "#;
    assert_eq!(eval_printed(src), "\"derived+base\"");
}

#[test]
fn object_literals_and_builtin_object_methods() {
    let src = r#"
        o = \{ a: 1, b: 2 };
        c = o.Clone();
        c.a = 10;
        print(o.a, " ", c.a, " ", o.Exists(\b), " ", c.ExistsLocally(\zz));
    "#;
    assert_eq!(output_of(src), "1 10 true nil");
    assert_eq!(eval_printed(r"o = \{ a: 1 }; o.Send(\Exists, \a, []);"), "true");
}

#[test]
fn try_catch_receives_thrown_value() {
    assert_eq!(eval_int("try { throw 5; } catch (e) { r = e; } r;"), 5);
    let src = r#"
        define f() { throw "boom"; }
        try { f(); } catch (e) { r = e; }
        r;
    "#;
    assert_eq!(eval_printed(src), "\"boom\"");
}

#[test]
fn finally_runs_on_both_paths() {
    let src = r#"
        t = "";
        try { t = t + "t"; } catch (e) { t = t + "c"; } finally { t = t + "f"; }
        t;
    "#;
    assert_eq!(eval_printed(src), "\"tf\"");
    let src = r#"
        t = "";
        try { t = t + "t"; throw 1; } catch (e) { t = t + "c"; } finally { t = t + "f"; }
        t;
    "#;
    assert_eq!(eval_printed(src), "\"tcf\"");
}

#[test]
fn uncaught_throw_is_an_error() {
    assert_eq!(eval_err("throw 42;"), BobError::Uncaught("42".into()));
}

#[test]
fn arity_errors() {
    assert!(matches!(
        eval_err("define g(a, b) { return a; } g(1);"),
        BobError::TooFewArguments(_)
    ));
    assert!(matches!(
        eval_err("define g(a, b = 1) { return a; } g(1, 2, 3);"),
        BobError::TooManyArguments(_)
    ));
}

#[test]
fn type_and_lookup_errors() {
    assert!(matches!(eval_err("nil * 2;"), BobError::TypeError(_)));
    assert!(matches!(eval_err("x = new Object(); x.frob();"), BobError::NoMethod { .. }));
    assert!(matches!(eval_err("x = new Object(); x.y;"), BobError::NoProperty { .. }));
    assert!(matches!(eval_err("[1, 2][5];"), BobError::IndexOutOfBounds(_)));
    assert!(matches!(eval_err("v = []; v.Pop();"), BobError::StackEmpty(_)));
    assert_eq!(eval_err("Quit();"), BobError::Exit);
}

#[test]
fn runaway_recursion_overflows() {
    let config = InterpreterConfig {
        max_frames: 256,
        ..InterpreterConfig::default()
    };
    let mut interp = Interpreter::with_config(config).unwrap();
    let err = interp.eval("define f(n) { return f(n + 1); } f(0);").unwrap_err();
    assert_eq!(err, BobError::StackOverflow);
    // the interpreter is usable again after unwinding
    assert_eq!(interp.eval("f;").map(|v| interp.print_string(v)).unwrap(), "<Method-f>");
}

fn small_heap() -> Interpreter {
    Interpreter::with_config(InterpreterConfig {
        heap_size: 256 * 1024,
        ..InterpreterConfig::default()
    })
    .unwrap()
}

#[test]
fn huge_vector_index_or_size_runs_out_of_memory() {
    assert_eq!(
        eval_err("v = [1]; v[4611686018427387000] = 2;"),
        BobError::InsufficientMemory
    );
    assert_eq!(
        eval_err("v = [1]; v.size = 4611686018427387000;"),
        BobError::InsufficientMemory
    );
    assert_eq!(eval_err("v = new Vector(50000000);"), BobError::InsufficientMemory);
}

#[test]
fn failed_growth_leaves_the_vector_intact() {
    let mut interp = Interpreter::new().unwrap();
    let err = interp.eval("v = [1, 2]; v.size = 4611686018427387000;").unwrap_err();
    assert_eq!(err, BobError::InsufficientMemory);
    assert_eq!(interp.eval("v.size;").map(|v| interp.integer_value(v)), Ok(Some(2)));
}

#[test]
fn unbounded_push_exhausts_the_heap() {
    let mut interp = small_heap();
    let err = interp.eval("v = []; while (true) v.Push(v.size);").unwrap_err();
    assert_eq!(err, BobError::InsufficientMemory);
}

#[test]
fn vector_growth_triggers_collection() {
    let mut interp = small_heap();
    let src = r#"
        v = [];
        for (i = 0; i < 10000; ++i) v.Push(i);
        v = nil;
        w = [];
        for (i = 0; i < 10000; ++i) w.PushFront(i);
        w.size;
    "#;
    let v = interp.eval(src).unwrap();
    assert_eq!(interp.integer_value(v), Some(10000));
    assert!(interp.heap().collections() > 0);
}

#[test]
fn true_is_bound_to_itself() {
    let interp = Interpreter::new().unwrap();
    assert_eq!(interp.global("true"), bob_runtime::Value::TRUE);
}

#[test]
fn vector_builtins() {
    assert_eq!(eval_int("v = [1]; v[3] = 4; v.size;"), 4);
    assert_eq!(eval_printed("v = [1]; v[3] = 4; v;"), "[1,nil,nil,4]");
    assert_eq!(eval_printed("v = [1, 2]; v.PushFront(0); v;"), "[0,1,2]");
    assert_eq!(eval_int("v = [1, 2, 3]; v.PopFront();"), 1);
    assert_eq!(eval_printed("v = [1, 2, 3]; v.size = 1; v;"), "[1]");
    assert_eq!(eval_printed("v = new Vector(2); v;"), "[nil,nil]");
}

#[test]
fn string_builtins() {
    assert_eq!(eval_int("\"hello\".size;"), 5);
    assert_eq!(eval_int("\"abc\"[1];"), 98);
    assert_eq!(eval_printed("\"hello\".Substring(1, 3);"), "\"ell\"");
    assert_eq!(eval_int("\"hello\".Index('l');"), 2);
    assert_eq!(eval_int("\"hello\".ReverseIndex('l');"), 3);
    assert_eq!(eval_int("\"42abc\".toInteger();"), 42);
    assert_eq!(eval_printed("\"2.5x\".toFloat();"), "2.5");
    assert_eq!(eval_printed("\"ab\" + \"cd\";"), "\"abcd\"");
    assert_eq!(eval_printed("\"name\".Intern();"), "name");
}

#[test]
fn number_builtins() {
    assert_eq!(eval_printed("x = 255; x.toString(16);"), "\"ff\"");
    assert_eq!(eval_printed("x = 8; x.toString(8);"), "\"10\"");
    assert_eq!(eval_printed("x = 3; x.toFloat();"), "3.0");
    assert_eq!(eval_int("x = 3.9; x.toInteger();"), 3);
}

#[test]
fn global_functions() {
    assert_eq!(eval_printed("Type(1.5);"), "Float");
    assert_eq!(eval_printed("toString(42, 5, '0');"), "\"00042\"");
    assert_eq!(eval_printed("toString(42, -4);"), "\"42  \"");
    assert_eq!(eval_int("Eval(\"1 + 2;\");"), 3);
    assert_eq!(eval_printed("Hash(\"a\") == Hash(\"a\");"), "true");
    assert_eq!(eval_printed("r = rand(10); r >= 0 && r < 10;"), "true");
    assert_eq!(output_of("print(\"x=\", 1, \" \", 2.0, \" \", [1, \"s\"]);"), "x=1 2.0 [1,s]");
}

#[test]
fn apply_spreads_a_vector() {
    let src = "define add3(a, b, c) { return a + b + c; } add3.Apply(nil, 1, [2, 3]);";
    assert_eq!(eval_int(src), 6);
    let src = format!("{POINT} p = new Point(1, 2); Point.sum.Apply(p, []);");
    assert_eq!(eval_int(&src), 3);
}

#[test]
fn decode_writes_a_listing() {
    let out = output_of("define sq(x) { return x * x; } sq.Decode();");
    assert!(out.contains("MUL"), "{out}");
    assert!(out.contains("RETURN"), "{out}");
}

#[test]
fn unbound_globals_read_as_nil() {
    assert_eq!(eval_printed("neverAssigned;"), "nil");
}
