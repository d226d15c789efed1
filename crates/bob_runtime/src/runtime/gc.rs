//! Collection roots and the safe point.
//!
//! Allocation never collects. It only marks a collection as pending, and the
//! interpreter collects before the next instruction, when every live value is
//! in a register, on a stack, in the symbol table or protected.

use crate::core::GcStats;
use crate::errors::BobError;
use crate::runtime::Interpreter;

impl Interpreter {
    /// Collect now.
    pub fn collect(&mut self) -> GcStats {
        let mut gc = self.heap.begin_collection();
        for v in self.symbols.values_mut() {
            gc.relocate(v);
        }
        for v in &mut self.types {
            gc.relocate(v);
        }
        self.vm.roots(&mut |v| gc.relocate(v));
        gc.finish()
    }

    /// Collect if an allocation went over budget. Still being over budget
    /// afterwards is fatal.
    pub(crate) fn safe_point(&mut self) -> Result<(), BobError> {
        if self.heap.pending {
            self.collect();
            if self.heap.bytes_used() > self.heap.semispace_size() {
                return Err(BobError::InsufficientMemory);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::core::Value;
    use crate::runtime::Interpreter;

    #[test]
    fn globals_survive_collection() {
        let mut interp = Interpreter::new().unwrap();
        let s = interp.make_string("kept").unwrap();
        interp.set_global("k", s).unwrap();
        for _ in 0..100 {
            interp.make_string("garbage").unwrap();
        }
        let before = interp.heap().record_count();
        interp.collect();
        assert!(interp.heap().record_count() < before);
        let s = interp.global("k");
        assert_eq!(interp.string_value(s), Some(&b"kept"[..]));
        assert_eq!(interp.global("nil"), Value::NIL);
    }

    #[test]
    fn protected_values_follow_their_records() {
        let mut interp = Interpreter::new().unwrap();
        let v = interp.make_vector(vec![Value::TRUE]).unwrap();
        interp.protect(v);
        interp.collect();
        interp.collect();
        let v = interp.unprotect();
        assert_eq!(interp.vector_items(v), Some(&[Value::TRUE][..]));
    }
}
