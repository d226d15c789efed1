//! Interned symbols.
//!
//! One symbol record exists per distinct name, so symbols compare by identity.
//! The table is a root: every interned symbol (and through it, every global
//! binding) survives collection.

use ahash::RandomState;
use hashbrown::HashMap;

use super::heap::Heap;
use super::value::Value;
use crate::errors::BobError;

pub(crate) struct SymbolTable {
    map: HashMap<Box<[u8]>, Value, RandomState>,
}

impl SymbolTable {
    pub(crate) fn new() -> Self {
        let mut map = HashMap::with_capacity_and_hasher(256, RandomState::new());
        map.insert(b"nil"[..].into(), Value::NIL);
        map.insert(b"true"[..].into(), Value::TRUE);
        Self { map }
    }

    pub(crate) fn intern(&mut self, heap: &mut Heap, name: &[u8]) -> Result<Value, BobError> {
        if let Some(v) = self.map.get(name) {
            return Ok(*v);
        }
        let v = heap.make_symbol(name)?;
        self.map.insert(name.into(), v);
        Ok(v)
    }

    pub(crate) fn lookup(&self, name: &[u8]) -> Option<Value> {
        self.map.get(name).copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }

    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = &mut Value> {
        self.map.values_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent() {
        let mut heap = Heap::new(64 * 1024);
        let mut table = SymbolTable::new();
        let a = table.intern(&mut heap, b"foo").unwrap();
        let b = table.intern(&mut heap, b"foo").unwrap();
        let c = table.intern(&mut heap, b"bar").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(table.intern(&mut heap, b"true").unwrap(), Value::TRUE);
        assert_eq!(table.lookup(b"nil"), Some(Value::NIL));
    }
}
