use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use bob_runtime::{BobError, Interpreter};

/// Whether processing continues after a step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Failed,
    Exit,
}

/// Write buffered program output to stdout and error reports to stderr.
pub(crate) fn flush(interp: &mut Interpreter) {
    let out = interp.take_output();
    if !out.is_empty() {
        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(out.as_bytes());
        let _ = stdout.flush();
    }
    let errors = interp.take_errors();
    if !errors.is_empty() {
        eprint!("{errors}");
    }
}

pub(crate) fn finish(interp: &mut Interpreter, result: Result<(), BobError>) -> Flow {
    let flow = match result {
        Ok(()) => Flow::Continue,
        Err(BobError::Exit) => Flow::Exit,
        Err(e) => {
            interp.handle_error(&e);
            Flow::Failed
        }
    };
    flush(interp);
    flow
}

fn with_default_extension(name: &str, ext: &str) -> PathBuf {
    let path = PathBuf::from(name);
    if path.extension().is_some() {
        path
    } else {
        path.with_extension(ext)
    }
}

/// Input and output names for `-c`: a bare input gets `.bob`, the output
/// defaults to the input with `.bbo`.
pub(crate) fn compile_names(input: &str, output: Option<&str>) -> (PathBuf, PathBuf) {
    let input = with_default_extension(input, "bob");
    let output = match output {
        Some(o) => with_default_extension(o, "bbo"),
        None => input.with_extension("bbo"),
    };
    (input, output)
}

pub(crate) fn compile(interp: &mut Interpreter, input: &str, output: Option<&str>) -> Flow {
    let (input, output) = compile_names(input, output);
    println!(
        "Compiling '{}' -> '{}'",
        input.display(),
        output.display()
    );
    let result = interp.compile_file(&input, &output);
    finish(interp, result)
}

/// Load a source or object file, chosen by extension.
pub(crate) fn load(interp: &mut Interpreter, name: &str, verbose: bool) -> Flow {
    let path = Path::new(name);
    interp.config_mut().echo_results = verbose;
    let result = match path.extension().and_then(|e| e.to_str()) {
        None => interp.load_file(path.with_extension("bob")),
        Some("bob") => interp.load_file(path),
        Some("bbo") => interp.load_object_file(path),
        Some(_) => {
            eprintln!("Unknown file extension '{name}'");
            return Flow::Failed;
        }
    };
    let flow = finish(interp, result);
    interp.config_mut().echo_results = false;
    flow
}

/// Read, evaluate and print lines until end of input or `Quit()`.
pub(crate) fn repl(interp: &mut Interpreter, input: impl BufRead) -> Flow {
    let mut lines = input.lines();
    loop {
        print!("\n> ");
        let _ = std::io::stdout().flush();
        let Some(Ok(line)) = lines.next() else {
            return Flow::Continue;
        };
        if line.trim().is_empty() {
            continue;
        }
        match interp.eval(&line) {
            Ok(v) => {
                flush(interp);
                println!("--> {}", interp.print_string(v));
            }
            Err(e) => {
                if finish(interp, Err(e)) == Flow::Exit {
                    return Flow::Exit;
                }
            }
        }
    }
}
