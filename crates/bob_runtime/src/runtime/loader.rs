//! Loading and evaluating source.
//!
//! Source is compiled one top-level statement at a time and each thunk runs
//! before the next statement is compiled, so a definition is visible to the
//! statements after it.

use std::fs;
use std::path::Path;

use bob_compiler::{CompileOptions, Compiler};
use bob_ir::{CodeUnit, Literal};
use bumpalo::Bump;

use crate::core::Value;
use crate::errors::BobError;
use crate::objfile;
use crate::runtime::Interpreter;

impl Interpreter {
    fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            emit_line_numbers: self.config.emit_line_numbers,
        }
    }

    /// Copy a compiled unit into the heap as a code object.
    pub(crate) fn materialize_unit(&mut self, unit: &CodeUnit) -> Result<Value, BobError> {
        let mut literals = Vec::with_capacity(unit.literals.len());
        for (i, lit) in unit.literals.iter().enumerate() {
            let v = match lit {
                _ if i == 0 => Value::NIL,
                Literal::Nil => Value::NIL,
                Literal::Int(n) => self.heap.make_integer(*n)?,
                Literal::Float(f) => self.heap.make_float(*f)?,
                Literal::Str(s) => self.heap.make_string(s)?,
                Literal::Symbol(s) => self.intern_bytes(s)?,
                Literal::Code(inner) => self.materialize_unit(inner)?,
            };
            literals.push(v);
        }
        self.heap.make_code(&unit.bytecode, literals, &unit.lines)
    }

    /// Run a top-level thunk built by `build`, echoing its value when asked.
    pub(crate) fn run_thunk<F>(&mut self, build: F, echo: bool) -> Result<Value, BobError>
    where
        F: FnOnce(&mut Self) -> Result<Value, BobError>,
    {
        self.enter_idle();
        let result = self.run_thunk_inner(build);
        self.leave_idle(&result);
        if echo && self.config.echo_results {
            if let Ok(v) = &result {
                let printed = self.print_string(*v);
                self.write_output(&printed);
                self.write_output("\n");
            }
        }
        result
    }

    fn run_thunk_inner<F>(&mut self, build: F) -> Result<Value, BobError>
    where
        F: FnOnce(&mut Self) -> Result<Value, BobError>,
    {
        self.safe_point()?;
        let code = build(self)?;
        let method = self.heap.make_method(code, Value::NIL)?;
        self.vm.push(method)?;
        self.vm.push(Value::NIL)?;
        self.vm.push(Value::NIL)?;
        self.apply(2)
    }

    fn run_source(&mut self, source: &[u8], echo: bool) -> Result<Value, BobError> {
        let bump = Bump::new();
        let mut compiler = Compiler::new(source, &bump, self.compile_options());
        let mut last = Value::NIL;
        while let Some(unit) = compiler.next_unit()? {
            last = self.run_thunk(|interp| interp.materialize_unit(&unit), echo)?;
        }
        Ok(last)
    }

    /// Compile and run every statement of `source`, echoing results when
    /// configured. The first error ends the load.
    pub fn load_source(&mut self, source: &str) -> Result<(), BobError> {
        self.run_source(source.as_bytes(), true).map(|_| ())
    }

    /// Load a source file.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<(), BobError> {
        let path = path.as_ref();
        let name = path.display().to_string();
        let source = fs::read(path).map_err(|_| BobError::FileNotFound(name.clone()))?;
        self.announce(&name);
        self.run_source(&source, true).map(|_| ())
    }

    /// Evaluate `source` and return the value of its last statement.
    pub fn eval(&mut self, source: &str) -> Result<Value, BobError> {
        self.eval_bytes(source.as_bytes())
    }

    pub(crate) fn eval_bytes(&mut self, source: &[u8]) -> Result<Value, BobError> {
        self.run_source(source, false)
    }

    /// Compile a source file into an object file without running it.
    pub fn compile_file(
        &mut self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<(), BobError> {
        let input = input.as_ref();
        let source =
            fs::read(input).map_err(|_| BobError::FileNotFound(input.display().to_string()))?;
        let units = bob_compiler::compile_source(&source, self.compile_options())?;
        let bytes = objfile::write_object(&units, self.config.reverse_floats).map_err(|e| {
            log::debug!("cannot encode '{}': {e}", input.display());
            BobError::Write
        })?;
        fs::write(output.as_ref(), bytes).map_err(|_| BobError::Write)?;
        log::debug!(
            "compiled {} units from '{}' to '{}'",
            units.len(),
            input.display(),
            output.as_ref().display()
        );
        Ok(())
    }

    pub(crate) fn announce(&mut self, name: &str) {
        log::info!("loading '{name}'");
        if self.config.echo_results {
            self.write_output(&format!("Loading '{name}'\n"));
        }
    }
}
