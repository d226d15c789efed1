//! Heap records and allocation.
//!
//! The heap is one semispace of records addressed by index. Every record is
//! charged against a byte budget of half the configured heap size; going over
//! the budget marks a collection as pending, and the interpreter collects at
//! its next safe point (see `gc.rs`). Slot 0 always holds `nil` and slot 1
//! `true`, which the collector copies first.

use std::rc::Rc;

use bob_ir::LineEntry;

use super::property::PropertyStore;
use super::value::Value;
use crate::errors::BobError;
use crate::runtime::TypeKind;
use crate::vm::{NativeFn, VirtualGetter, VirtualSetter};

const RECORD_HEADER: usize = 16;

/// Native payload carried by a `CObject`. `destroy` runs exactly once, either
/// when a collection finds the object unreachable or when the interpreter is
/// dropped.
pub trait NativeResource {
    fn type_name(&self) -> &str {
        "CObject"
    }

    fn destroy(self: Box<Self>);
}

pub(crate) struct Symbol {
    pub(crate) name: Box<[u8]>,
    pub(crate) hash: i64,
    /// Global value cell.
    pub(crate) value: Value,
}

pub(crate) struct Object {
    pub(crate) class: Value,
    pub(crate) store: PropertyStore,
}

pub(crate) struct CObject {
    pub(crate) object: Object,
    pub(crate) resource: Option<Box<dyn NativeResource>>,
}

pub(crate) struct Code {
    pub(crate) bytecode: Rc<[u8]>,
    /// Same layout as the compiler's pool: slot 0 unused, slot 1 the name.
    pub(crate) literals: Vec<Value>,
    pub(crate) lines: Rc<[LineEntry]>,
}

pub(crate) struct CMethod {
    pub(crate) name: &'static str,
    pub(crate) handler: NativeFn,
}

pub(crate) struct VirtualProperty {
    pub(crate) name: &'static str,
    pub(crate) get: Option<VirtualGetter>,
    pub(crate) set: Option<VirtualSetter>,
}

pub(crate) struct TypeObject {
    pub(crate) kind: TypeKind,
    pub(crate) store: PropertyStore,
}

pub(crate) enum Record {
    Symbol(Symbol),
    String(Vec<u8>),
    Integer(i64),
    Float(f64),
    Object(Object),
    CObject(CObject),
    Vector(Vec<Value>),
    Code(Code),
    Method { code: Value, env: Value },
    CMethod(CMethod),
    VirtualProperty(VirtualProperty),
    Env { slots: Vec<Value>, next: Value },
    Type(TypeObject),
    /// Left behind in from-space by the collector.
    Forwarded(usize),
}

impl Record {
    /// Bytes charged against the heap budget.
    pub(crate) fn size(&self) -> usize {
        let word = std::mem::size_of::<Value>();
        let prop = 3 * word;
        RECORD_HEADER
            + match self {
                Record::Symbol(s) => s.name.len() + 2 * word,
                Record::String(s) => s.len(),
                Record::Integer(_) | Record::Float(_) => word,
                Record::Object(o) => word + o.store.len() * prop,
                Record::CObject(c) => 2 * word + c.object.store.len() * prop,
                Record::Vector(v) => v.len() * word,
                Record::Code(c) => c.bytecode.len() + c.literals.len() * word + c.lines.len() * word,
                Record::Method { .. } => 2 * word,
                Record::CMethod(_) => 2 * word,
                Record::VirtualProperty(_) => 3 * word,
                Record::Env { slots, .. } => (slots.len() + 1) * word,
                Record::Type(t) => word + t.store.len() * prop,
                Record::Forwarded(_) => 0,
            }
    }

    /// Visit every value the record refers to.
    pub(crate) fn trace(&mut self, f: &mut dyn FnMut(&mut Value)) {
        match self {
            Record::Symbol(s) => f(&mut s.value),
            Record::Object(o) => trace_object(o, f),
            Record::CObject(c) => trace_object(&mut c.object, f),
            Record::Vector(v) => v.iter_mut().for_each(f),
            Record::Code(c) => c.literals.iter_mut().for_each(f),
            Record::Method { code, env } => {
                f(code);
                f(env);
            }
            Record::Env { slots, next } => {
                slots.iter_mut().for_each(&mut *f);
                f(next);
            }
            Record::Type(t) => {
                for p in t.store.iter_mut() {
                    f(&mut p.tag);
                    f(&mut p.value);
                }
            }
            Record::String(_)
            | Record::Integer(_)
            | Record::Float(_)
            | Record::CMethod(_)
            | Record::VirtualProperty(_)
            | Record::Forwarded(_) => {}
        }
    }
}

fn trace_object(o: &mut Object, f: &mut dyn FnMut(&mut Value)) {
    f(&mut o.class);
    for p in o.store.iter_mut() {
        f(&mut p.tag);
        f(&mut p.value);
    }
}

pub struct Heap {
    pub(crate) space: Vec<Record>,
    pub(crate) used: usize,
    pub(crate) limit: usize,
    pub(crate) collections: usize,
    pub(crate) pending: bool,
    pub(crate) protected: Vec<Value>,
    /// Indices of the CObjects in the active space.
    pub(crate) cobjects: Vec<usize>,
}

impl Heap {
    /// `size` covers both semispaces.
    pub fn new(size: usize) -> Self {
        let mut heap = Self {
            space: Vec::with_capacity(1024),
            used: 0,
            limit: size / 2,
            collections: 0,
            pending: false,
            protected: Vec::new(),
            cobjects: Vec::new(),
        };
        heap.push(Record::Symbol(Symbol {
            name: b"nil"[..].into(),
            hash: hash_bytes(b"nil"),
            value: Value::NIL,
        }));
        heap.push(Record::Symbol(Symbol {
            name: b"true"[..].into(),
            hash: hash_bytes(b"true"),
            value: Value::TRUE,
        }));
        heap
    }

    fn push(&mut self, record: Record) -> Value {
        self.used += record.size();
        let index = self.space.len();
        if matches!(record, Record::CObject(_)) {
            self.cobjects.push(index);
        }
        self.space.push(record);
        Value::from_index(index)
    }

    /// Allocate a record. Never collects; an allocation that overruns the
    /// budget only marks a collection as pending.
    pub(crate) fn alloc(&mut self, record: Record) -> Result<Value, BobError> {
        let size = record.size();
        if !self.fits(size) {
            return Err(BobError::InsufficientMemory);
        }
        let v = self.push(record);
        if self.used > self.limit {
            self.pending = true;
        }
        Ok(v)
    }

    fn fits(&self, bytes: usize) -> bool {
        bytes <= self.limit
            && self
                .used
                .checked_add(bytes)
                .is_some_and(|total| total <= self.limit.saturating_mul(2))
    }

    /// Extend a vector in place to `len` slots filled with nil, reserving
    /// `spare` more when the allocation has to grow. The added slots are
    /// charged like an allocation before any memory is reserved. `None` when
    /// `v` is not a vector.
    pub(crate) fn grow_vector(
        &mut self,
        v: Value,
        len: usize,
        spare: usize,
    ) -> Result<Option<&mut Vec<Value>>, BobError> {
        let Some(old) = self.vector(v).map(Vec::len) else {
            return Ok(None);
        };
        if len > old {
            let bytes = (len - old)
                .checked_mul(std::mem::size_of::<Value>())
                .filter(|b| self.fits(*b))
                .ok_or(BobError::InsufficientMemory)?;
            self.used += bytes;
            if self.used > self.limit {
                self.pending = true;
            }
        }
        let Some(items) = self.vector_mut(v) else {
            return Ok(None);
        };
        if len > items.capacity() {
            items.reserve_exact(len - items.len() + spare);
        }
        if len > items.len() {
            items.resize(len, Value::NIL);
        }
        Ok(Some(items))
    }

    pub fn bytes_used(&self) -> usize {
        self.used
    }

    pub fn bytes_free(&self) -> usize {
        self.limit.saturating_sub(self.used)
    }

    pub fn semispace_size(&self) -> usize {
        self.limit
    }

    pub fn collections(&self) -> usize {
        self.collections
    }

    pub fn record_count(&self) -> usize {
        self.space.len()
    }

    /// Keep `v` alive and up to date across collections until the matching
    /// `unprotect`.
    pub fn protect(&mut self, v: Value) {
        self.protected.push(v);
    }

    /// Release the most recently protected value and return its current form.
    pub fn unprotect(&mut self) -> Value {
        self.protected.pop().unwrap_or(Value::NIL)
    }

    /// Current form of the `depth`-th protected value from the top.
    pub fn protected(&self, depth: usize) -> Value {
        self.protected
            .len()
            .checked_sub(depth + 1)
            .map_or(Value::NIL, |i| self.protected[i])
    }

    #[inline]
    pub(crate) fn get(&self, v: Value) -> Option<&Record> {
        self.space.get(v.index()?)
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, v: Value) -> Option<&mut Record> {
        self.space.get_mut(v.index()?)
    }

    // ---- typed access ----

    pub(crate) fn integer(&self, v: Value) -> Option<i64> {
        if let Some(i) = v.as_small_int() {
            return Some(i);
        }
        match self.get(v)? {
            Record::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub(crate) fn float(&self, v: Value) -> Option<f64> {
        match self.get(v)? {
            Record::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub(crate) fn string(&self, v: Value) -> Option<&[u8]> {
        match self.get(v)? {
            Record::String(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn string_mut(&mut self, v: Value) -> Option<&mut Vec<u8>> {
        match self.get_mut(v)? {
            Record::String(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn symbol(&self, v: Value) -> Option<&Symbol> {
        match self.get(v)? {
            Record::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn vector(&self, v: Value) -> Option<&Vec<Value>> {
        match self.get(v)? {
            Record::Vector(items) => Some(items),
            _ => None,
        }
    }

    pub(crate) fn vector_mut(&mut self, v: Value) -> Option<&mut Vec<Value>> {
        match self.get_mut(v)? {
            Record::Vector(items) => Some(items),
            _ => None,
        }
    }

    /// Plain objects and CObjects share the object layout.
    pub(crate) fn object(&self, v: Value) -> Option<&Object> {
        match self.get(v)? {
            Record::Object(o) => Some(o),
            Record::CObject(c) => Some(&c.object),
            _ => None,
        }
    }

    pub(crate) fn object_mut(&mut self, v: Value) -> Option<&mut Object> {
        match self.get_mut(v)? {
            Record::Object(o) => Some(o),
            Record::CObject(c) => Some(&mut c.object),
            _ => None,
        }
    }

    pub(crate) fn code(&self, v: Value) -> Option<&Code> {
        match self.get(v)? {
            Record::Code(c) => Some(c),
            _ => None,
        }
    }

    pub(crate) fn is_object(&self, v: Value) -> bool {
        self.object(v).is_some()
    }

    pub(crate) fn is_string(&self, v: Value) -> bool {
        self.string(v).is_some()
    }

    pub(crate) fn is_vector(&self, v: Value) -> bool {
        self.vector(v).is_some()
    }

    // ---- constructors ----

    pub(crate) fn make_integer(&mut self, i: i64) -> Result<Value, BobError> {
        match Value::small_int(i) {
            Some(v) => Ok(v),
            None => self.alloc(Record::Integer(i)),
        }
    }

    pub(crate) fn make_float(&mut self, f: f64) -> Result<Value, BobError> {
        self.alloc(Record::Float(f))
    }

    pub(crate) fn make_string(&mut self, bytes: &[u8]) -> Result<Value, BobError> {
        self.alloc(Record::String(bytes.to_vec()))
    }

    pub(crate) fn make_vector(&mut self, items: Vec<Value>) -> Result<Value, BobError> {
        self.alloc(Record::Vector(items))
    }

    pub(crate) fn make_object(&mut self, class: Value) -> Result<Value, BobError> {
        self.alloc(Record::Object(Object {
            class,
            store: PropertyStore::default(),
        }))
    }

    pub(crate) fn make_cobject(
        &mut self,
        class: Value,
        resource: Box<dyn NativeResource>,
    ) -> Result<Value, BobError> {
        self.alloc(Record::CObject(CObject {
            object: Object {
                class,
                store: PropertyStore::default(),
            },
            resource: Some(resource),
        }))
    }

    pub(crate) fn make_code(
        &mut self,
        bytecode: &[u8],
        literals: Vec<Value>,
        lines: &[LineEntry],
    ) -> Result<Value, BobError> {
        self.alloc(Record::Code(Code {
            bytecode: Rc::from(bytecode),
            literals,
            lines: Rc::from(lines),
        }))
    }

    pub(crate) fn make_env(&mut self, slots: Vec<Value>, next: Value) -> Result<Value, BobError> {
        self.alloc(Record::Env { slots, next })
    }

    pub(crate) fn make_method(&mut self, code: Value, env: Value) -> Result<Value, BobError> {
        self.alloc(Record::Method { code, env })
    }

    pub(crate) fn make_cmethod(
        &mut self,
        name: &'static str,
        handler: NativeFn,
    ) -> Result<Value, BobError> {
        self.alloc(Record::CMethod(CMethod { name, handler }))
    }

    pub(crate) fn make_virtual_property(
        &mut self,
        name: &'static str,
        get: Option<VirtualGetter>,
        set: Option<VirtualSetter>,
    ) -> Result<Value, BobError> {
        self.alloc(Record::VirtualProperty(VirtualProperty { name, get, set }))
    }

    pub(crate) fn make_type(&mut self, kind: TypeKind) -> Result<Value, BobError> {
        self.alloc(Record::Type(TypeObject {
            kind,
            store: PropertyStore::default(),
        }))
    }

    /// A fresh, uninterned symbol. Interning goes through the symbol table.
    pub(crate) fn make_symbol(&mut self, name: &[u8]) -> Result<Value, BobError> {
        self.alloc(Record::Symbol(Symbol {
            name: name.into(),
            hash: hash_bytes(name),
            value: Value::NIL,
        }))
    }

    /// Destroy every native resource still held by a live CObject.
    pub(crate) fn destroy_all_cobjects(&mut self) {
        for i in std::mem::take(&mut self.cobjects) {
            if let Some(Record::CObject(c)) = self.space.get_mut(i) {
                if let Some(resource) = c.resource.take() {
                    resource.destroy();
                }
            }
        }
    }
}

impl Drop for Heap {
    fn drop(&mut self) {
        self.destroy_all_cobjects();
    }
}

/// Hash of a byte string: `h * 31 + b`, kept non-negative.
pub(crate) fn hash_bytes(bytes: &[u8]) -> i64 {
    let h = bytes
        .iter()
        .fold(0i64, |h, &b| h.wrapping_mul(31).wrapping_add(i64::from(b)));
    h & i64::MAX
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singletons_occupy_the_first_slots() {
        let heap = Heap::new(64 * 1024);
        assert_eq!(heap.symbol(Value::NIL).map(|s| &*s.name), Some(&b"nil"[..]));
        assert_eq!(heap.symbol(Value::TRUE).map(|s| &*s.name), Some(&b"true"[..]));
        assert_eq!(heap.symbol(Value::NIL).map(|s| s.value), Some(Value::NIL));
        assert_eq!(heap.symbol(Value::TRUE).map(|s| s.value), Some(Value::TRUE));
    }

    #[test]
    fn large_integers_spill_to_the_heap() {
        let mut heap = Heap::new(64 * 1024);
        let big = heap.make_integer(i64::MAX).unwrap();
        assert!(!big.is_small_int());
        assert_eq!(heap.integer(big), Some(i64::MAX));
        let small = heap.make_integer(-5).unwrap();
        assert_eq!(heap.integer(small), Some(-5));
    }

    #[test]
    fn overrunning_the_budget_requests_a_collection() {
        let mut heap = Heap::new(4 * 1024);
        while !heap.pending {
            heap.make_string(&[0u8; 100]).unwrap();
        }
        assert!(heap.bytes_used() > heap.semispace_size());
    }

    #[test]
    fn oversized_allocation_fails() {
        let mut heap = Heap::new(1024);
        assert_eq!(
            heap.make_string(&[0u8; 4096]),
            Err(BobError::InsufficientMemory)
        );
    }

    #[test]
    fn vector_growth_is_charged() {
        let mut heap = Heap::new(4 * 1024);
        let v = heap.make_vector(Vec::new()).unwrap();
        let before = heap.bytes_used();
        let items = heap.grow_vector(v, 10, 8).unwrap().unwrap();
        assert_eq!(items.len(), 10);
        assert!(items.capacity() >= 18);
        assert_eq!(heap.bytes_used(), before + 10 * std::mem::size_of::<Value>());
        assert!(!heap.pending);
        assert_eq!(
            heap.grow_vector(v, usize::MAX, 8).map(|items| items.map(|i| i.len())),
            Err(BobError::InsufficientMemory)
        );
        assert_eq!(heap.vector(v).map(Vec::len), Some(10));
        assert!(heap.grow_vector(Value::NIL, 1, 0).unwrap().is_none());
    }

    #[test]
    fn protected_values_are_lifo() {
        let mut heap = Heap::new(1024);
        let a = Value::small_int(1).unwrap();
        let b = Value::small_int(2).unwrap();
        heap.protect(a);
        heap.protect(b);
        assert_eq!(heap.protected(0), b);
        assert_eq!(heap.protected(1), a);
        assert_eq!(heap.unprotect(), b);
        assert_eq!(heap.unprotect(), a);
    }

    #[test]
    fn byte_hash_is_stable() {
        assert_eq!(hash_bytes(b""), 0);
        assert_eq!(hash_bytes(b"a"), 97);
        assert_eq!(hash_bytes(b"ab"), 97 * 31 + 98);
    }
}
