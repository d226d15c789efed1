use std::fs;

use bob_runtime::{BobError, Interpreter, InterpreterConfig};

const PROGRAM: &str = r#"
    define fact(n) { return n < 2 ? 1 : n * fact(n - 1); }
    Shape = new Object();
    define Shape.initialize(w, h) { this.w = w; this.h = h; return this; }
    define Shape.area() { return this.w * this.h; }
    s = new Shape(3, 4.5);
    names = [\alpha, "beta", -7, 2.25, nil];
    print(fact(10), " ", s.area(), " ", names, "\n");
    for (i = 0; i < 3; ++i) { switch (i) { case 1: print("one "); break; default: print(i, " "); } }
    try { throw \oops; } catch (e) { print(e, "\n"); }
    big = 100000 * 3;
"#;

fn run_source(src: &str) -> String {
    let mut interp = Interpreter::new().unwrap();
    interp.load_source(src).unwrap();
    interp.take_output()
}

#[test]
fn compiled_object_file_runs_like_source() {
    let dir = tempfile::tempdir().unwrap();
    let src_path = dir.path().join("prog.bob");
    let obj_path = dir.path().join("prog.bbo");
    fs::write(&src_path, PROGRAM).unwrap();

    let mut compiler = Interpreter::new().unwrap();
    compiler.compile_file(&src_path, &obj_path).unwrap();
    let bytes = fs::read(&obj_path).unwrap();
    assert_eq!(&bytes[..8], b"BOBO\0\0\0\x04");

    let mut loader = Interpreter::new().unwrap();
    loader.load_object_file(&obj_path).unwrap();
    let expected = run_source(PROGRAM);
    assert_eq!(loader.take_output(), expected);
    assert!(expected.starts_with("3628800 13.5 [alpha,beta,-7,2.25,nil]\n"));
    assert_eq!(loader.integer_value(loader.global("big")), Some(300_000));
}

#[test]
fn reversed_floats_round_trip_with_matching_config() {
    let dir = tempfile::tempdir().unwrap();
    let src_path = dir.path().join("f.bob");
    let obj_path = dir.path().join("f.bbo");
    fs::write(&src_path, "x = 1.25;").unwrap();
    let config = InterpreterConfig {
        reverse_floats: true,
        ..InterpreterConfig::default()
    };
    Interpreter::with_config(config)
        .unwrap()
        .compile_file(&src_path, &obj_path)
        .unwrap();
    let mut loader = Interpreter::with_config(config).unwrap();
    loader.load_object_file(&obj_path).unwrap();
    assert_eq!(loader.float_value(loader.global("x")), Some(1.25));
}

#[test]
fn echo_announces_and_prints_each_thunk() {
    let dir = tempfile::tempdir().unwrap();
    let src_path = dir.path().join("e.bob");
    let obj_path = dir.path().join("e.bbo");
    fs::write(&src_path, "1 + 2; \"s\";").unwrap();
    Interpreter::new()
        .unwrap()
        .compile_file(&src_path, &obj_path)
        .unwrap();
    let mut loader = Interpreter::with_config(InterpreterConfig {
        echo_results: true,
        ..InterpreterConfig::default()
    })
    .unwrap();
    loader.load_object_file(&obj_path).unwrap();
    let out = loader.take_output();
    assert!(out.starts_with("Loading '"), "{out}");
    assert!(out.ends_with("3\n\"s\"\n"), "{out}");
}

#[test]
fn load_errors() {
    let dir = tempfile::tempdir().unwrap();
    let bad = dir.path().join("bad.bbo");
    fs::write(&bad, b"#!not an object file").unwrap();
    let mut interp = Interpreter::new().unwrap();
    assert!(matches!(
        interp.load_object_file(&bad),
        Err(BobError::NotAnObjectFile(_))
    ));
    let truncated = dir.path().join("cut.bbo");
    fs::write(&truncated, b"BOBO\0\0\0\x04\x01\0\0\0\x05").unwrap();
    assert!(matches!(
        interp.load_object_file(&truncated),
        Err(BobError::NotAnObjectFile(_))
    ));
    assert!(matches!(
        interp.load_object_file(dir.path().join("missing.bbo")),
        Err(BobError::FileNotFound(_))
    ));
}

#[test]
fn script_level_compile_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let src_path = dir.path().join("lib.bob");
    let obj_path = dir.path().join("lib.bbo");
    fs::write(&src_path, "define twice(x) { return x * 2; }").unwrap();
    let src = format!(
        "CompileFile({:?}, {:?}); LoadObjectFile({:?}); twice(21);",
        src_path.display().to_string(),
        obj_path.display().to_string(),
        obj_path.display().to_string()
    );
    let mut interp = Interpreter::new().unwrap();
    let v = interp.eval(&src).unwrap();
    assert_eq!(interp.integer_value(v), Some(42));
    let v = interp.eval("LoadObjectFile(\"/nonexistent/x.bbo\");").unwrap();
    assert!(v.is_nil());
}
