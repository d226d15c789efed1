use std::fs;
use std::path::Path;

use super::{DecodeError, Decoder, Persisted};
use crate::core::Value;
use crate::errors::BobError;
use crate::runtime::Interpreter;
use crate::runtime::types::set_local;

impl DecodeError {
    fn into_bob(self, name: &str) -> BobError {
        match self {
            DecodeError::Version(v) => BobError::WrongObjectVersion(i64::from(v)),
            _ => BobError::NotAnObjectFile(name.to_string()),
        }
    }
}

impl Interpreter {
    /// Build heap values for a decoded tree. Slot 0 of a code object is
    /// reserved for the bytecode; a symbol in class position names a global.
    pub(crate) fn materialize(&mut self, p: &Persisted) -> Result<Value, BobError> {
        Ok(match p {
            Persisted::Nil => Value::NIL,
            Persisted::Integer(i) => self.heap.make_integer(*i)?,
            Persisted::Float(f) => self.heap.make_float(*f)?,
            Persisted::String(s) => self.heap.make_string(s)?,
            Persisted::Symbol(s) => self.intern_bytes(s)?,
            Persisted::Vector(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.materialize(item)?);
                }
                self.heap.make_vector(values)?
            }
            Persisted::Code(items) => {
                let Some((Persisted::String(bytecode), rest)) = items.split_first() else {
                    return Err(BobError::NotAnObjectFile("code without bytecode".into()));
                };
                let mut literals = Vec::with_capacity(items.len());
                literals.push(Value::NIL);
                for item in rest {
                    literals.push(self.materialize(item)?);
                }
                self.heap.make_code(bytecode, literals, &[])?
            }
            Persisted::Object { class, properties } => {
                let class = match class.as_ref() {
                    Persisted::Symbol(name) => {
                        let sym = self.intern_bytes(name)?;
                        self.symbol_value(sym)
                    }
                    other => self.materialize(other)?,
                };
                let obj = self.heap.make_object(class)?;
                for (tag, value) in properties {
                    let tag = self.materialize(tag)?;
                    let value = self.materialize(value)?;
                    set_local(&mut self.heap, obj, tag, value);
                }
                obj
            }
        })
    }

    /// Run every thunk of an object file held in memory. `name` is used in
    /// error messages.
    pub fn load_object_bytes(&mut self, name: &str, bytes: &[u8]) -> Result<(), BobError> {
        let mut decoder = Decoder::new(bytes, self.config.reverse_floats);
        decoder.read_header().map_err(|e| e.into_bob(name))?;
        let mut count = 0usize;
        while let Some(thunk) = decoder.next_thunk().map_err(|e| e.into_bob(name))? {
            if !matches!(thunk, Persisted::Code(_)) {
                return Err(BobError::NotAnObjectFile(name.to_string()));
            }
            self.run_thunk(|interp| interp.materialize(&thunk), true)?;
            count += 1;
        }
        log::debug!("ran {count} thunks from '{name}'");
        Ok(())
    }

    /// Load and run an object file.
    pub fn load_object_file(&mut self, path: impl AsRef<Path>) -> Result<(), BobError> {
        let path = path.as_ref();
        let name = path.display().to_string();
        let bytes = fs::read(path).map_err(|_| BobError::FileNotFound(name.clone()))?;
        self.announce(&name);
        self.load_object_bytes(&name, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objfile::write_object;

    #[test]
    fn compiled_units_run_from_bytes() {
        let units =
            bob_compiler::compile_source(b"x = 40; y = x + 2;", Default::default()).unwrap();
        let bytes = write_object(&units, false).unwrap();
        let mut interp = Interpreter::new().unwrap();
        interp.load_object_bytes("mem", &bytes).unwrap();
        assert_eq!(interp.integer_value(interp.global("y")), Some(42));
    }

    #[test]
    fn bad_header_is_reported() {
        let mut interp = Interpreter::new().unwrap();
        assert!(matches!(
            interp.load_object_bytes("junk", b"NOPE\0\0\0\x04"),
            Err(BobError::NotAnObjectFile(n)) if n == "junk"
        ));
        assert!(matches!(
            interp.load_object_bytes("old", b"BOBO\0\0\0\x02"),
            Err(BobError::WrongObjectVersion(2))
        ));
    }

    #[test]
    fn non_code_thunk_is_rejected() {
        let mut bytes = Vec::new();
        super::super::write_header(&mut bytes);
        super::super::encode(&Persisted::Integer(1), false, &mut bytes).unwrap();
        let mut interp = Interpreter::new().unwrap();
        assert!(matches!(
            interp.load_object_bytes("int", &bytes),
            Err(BobError::NotAnObjectFile(_))
        ));
    }

    #[test]
    fn objects_resolve_their_class_by_global_name() {
        let mut interp = Interpreter::new().unwrap();
        let p = Persisted::Object {
            class: Box::new(Persisted::Symbol(b"Object".to_vec())),
            properties: vec![(Persisted::Symbol(b"n".to_vec()), Persisted::Integer(3))],
        };
        let obj = interp.materialize(&p).unwrap();
        let tag = interp.intern("n").unwrap();
        let n = interp.property(obj, tag).unwrap().unwrap();
        assert_eq!(interp.integer_value(n), Some(3));
        let class = interp.global("Object");
        assert!(interp.equal(interp.heap.object(obj).unwrap().class, class));
    }
}
