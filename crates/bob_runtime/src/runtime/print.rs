//! Printed forms of values.
//!
//! The print form quotes strings; the display form (used by `print` and
//! `toString`) writes their bytes as they are.

use std::fmt::Write as _;

use crate::core::heap::Record;
use crate::core::Value;
use crate::runtime::Interpreter;

const MAX_PRINT_DEPTH: usize = 32;

pub(crate) fn format_float(f: f64) -> String {
    if !f.is_finite() {
        return if f.is_nan() {
            "nan".to_string()
        } else if f > 0.0 {
            "inf".to_string()
        } else {
            "-inf".to_string()
        };
    }
    let mut buf = ryu::Buffer::new();
    let s = buf.format_finite(f);
    if s.contains(['.', 'e', 'E']) {
        s.to_string()
    } else {
        format!("{s}.0")
    }
}

impl Interpreter {
    /// Print form of `v`, strings quoted.
    pub fn print_string(&self, v: Value) -> String {
        let mut out = String::new();
        self.write_value(&mut out, v, true, 0);
        out
    }

    /// Display form of `v`, strings raw.
    pub fn display_string(&self, v: Value) -> String {
        let mut out = String::new();
        self.write_value(&mut out, v, false, 0);
        out
    }

    pub(crate) fn write_value(&self, out: &mut String, v: Value, quote: bool, depth: usize) {
        if let Some(i) = v.as_small_int() {
            out.push_str(itoa::Buffer::new().format(i));
            return;
        }
        let addr = v.bits() as u32;
        match self.heap.get(v) {
            Some(Record::Symbol(s)) => out.push_str(&String::from_utf8_lossy(&s.name)),
            Some(Record::String(s)) => {
                if quote {
                    out.push('"');
                }
                out.push_str(&String::from_utf8_lossy(s));
                if quote {
                    out.push('"');
                }
            }
            Some(Record::Integer(i)) => out.push_str(itoa::Buffer::new().format(*i)),
            Some(Record::Float(f)) => out.push_str(&format_float(*f)),
            Some(Record::Vector(items)) => {
                if depth >= MAX_PRINT_DEPTH {
                    out.push_str("[...]");
                    return;
                }
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    self.write_value(out, *item, quote, depth + 1);
                }
                out.push(']');
            }
            Some(Record::Method { code, .. }) => {
                match self.code_name(*code) {
                    Some(name) => {
                        let _ = write!(out, "<Method-{name}>");
                    }
                    None => {
                        let _ = write!(out, "<Method-{addr:08x}>");
                    }
                }
            }
            Some(Record::CMethod(m)) => {
                let _ = write!(out, "<CMethod-{}>", m.name);
            }
            Some(Record::VirtualProperty(vp)) => {
                let _ = write!(out, "<VPMethod-{}>", vp.name);
            }
            Some(Record::Type(t)) => {
                let _ = write!(out, "<Type-{}>", t.kind.name());
            }
            Some(Record::Object(_)) => {
                let _ = write!(out, "<Object-{addr:08x}>");
            }
            Some(Record::CObject(c)) => {
                let name = c.resource.as_deref().map_or("CObject", |r| r.type_name());
                let _ = write!(out, "<{name}-{addr:08x}>");
            }
            Some(Record::Code(_)) => {
                let _ = write!(out, "<CompiledCode-{addr:08x}>");
            }
            Some(Record::Env { .. }) => {
                let _ = write!(out, "<Environment-{addr:08x}>");
            }
            Some(Record::Forwarded(_)) | None => {
                let _ = write!(out, "<Unknown-{addr:08x}>");
            }
        }
    }

    /// Name stored in a code object, when it has one.
    pub(crate) fn code_name(&self, code: Value) -> Option<String> {
        let name = *self.heap.code(code)?.literals.get(bob_ir::NAME_LITERAL)?;
        self.heap
            .string(name)
            .map(|s| String::from_utf8_lossy(s).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floats_always_look_like_floats() {
        assert_eq!(format_float(1.0), "1.0");
        assert_eq!(format_float(2.5), "2.5");
        assert_eq!(format_float(-0.25), "-0.25");
        assert!(format_float(1e300).contains('e'));
    }

    #[test]
    fn print_forms() {
        let mut interp = Interpreter::new().unwrap();
        let s = interp.heap.make_string(b"hi").unwrap();
        let one = Value::small_int(1).unwrap();
        let v = interp.heap.make_vector(vec![one, s, Value::NIL]).unwrap();
        assert_eq!(interp.print_string(v), r#"[1,"hi",nil]"#);
        assert_eq!(interp.display_string(v), "[1,hi,nil]");
        assert_eq!(interp.print_string(Value::TRUE), "true");
    }

    #[test]
    fn self_containing_vector_prints_finitely() {
        let mut interp = Interpreter::new().unwrap();
        let v = interp.heap.make_vector(vec![Value::NIL]).unwrap();
        interp.heap.vector_mut(v).unwrap()[0] = v;
        assert!(interp.print_string(v).contains("[...]"));
    }
}
