//! Runtime types and property access.
//!
//! Plain objects hold their own properties and inherit through their class
//! link. Every other value resolves named properties through the record of
//! its type, where a virtual property intercepts the lookup with native
//! accessors. Vectors and strings also accept integer tags as indices.

use std::cmp::Ordering;
use std::mem;

use crate::core::heap::{Heap, Record, hash_bytes};
use crate::core::property::PropertyStore;
use crate::core::Value;
use crate::errors::BobError;
use crate::runtime::Interpreter;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Type,
    Object,
    CObject,
    Symbol,
    String,
    Integer,
    Float,
    Vector,
    Method,
    CMethod,
    CompiledCode,
    Environment,
    VirtualProperty,
}

impl TypeKind {
    pub const ALL: [TypeKind; 13] = [
        TypeKind::Type,
        TypeKind::Object,
        TypeKind::CObject,
        TypeKind::Symbol,
        TypeKind::String,
        TypeKind::Integer,
        TypeKind::Float,
        TypeKind::Vector,
        TypeKind::Method,
        TypeKind::CMethod,
        TypeKind::CompiledCode,
        TypeKind::Environment,
        TypeKind::VirtualProperty,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TypeKind::Type => "Type",
            TypeKind::Object => "Object",
            TypeKind::CObject => "CObject",
            TypeKind::Symbol => "Symbol",
            TypeKind::String => "String",
            TypeKind::Integer => "Integer",
            TypeKind::Float => "Float",
            TypeKind::Vector => "Vector",
            TypeKind::Method => "Method",
            TypeKind::CMethod => "CMethod",
            TypeKind::CompiledCode => "CompiledCode",
            TypeKind::Environment => "Environment",
            TypeKind::VirtualProperty => "VPMethod",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }

    pub(crate) fn of(heap: &Heap, v: Value) -> TypeKind {
        if v.is_small_int() {
            return TypeKind::Integer;
        }
        match heap.get(v) {
            Some(Record::Symbol(_)) => TypeKind::Symbol,
            Some(Record::String(_)) => TypeKind::String,
            Some(Record::Integer(_)) => TypeKind::Integer,
            Some(Record::Float(_)) => TypeKind::Float,
            Some(Record::CObject(_)) => TypeKind::CObject,
            Some(Record::Vector(_)) => TypeKind::Vector,
            Some(Record::Code(_)) => TypeKind::CompiledCode,
            Some(Record::Method { .. }) => TypeKind::Method,
            Some(Record::CMethod(_)) => TypeKind::CMethod,
            Some(Record::VirtualProperty(_)) => TypeKind::VirtualProperty,
            Some(Record::Env { .. }) => TypeKind::Environment,
            Some(Record::Type(_)) => TypeKind::Type,
            Some(Record::Object(_)) | Some(Record::Forwarded(_)) | None => TypeKind::Object,
        }
    }
}

/// Language equality: numbers compare by value across integer and float,
/// strings by contents, everything else by identity.
pub(crate) fn eql(heap: &Heap, a: Value, b: Value) -> bool {
    if a == b {
        return heap.float(a).is_none_or(|f| !f.is_nan());
    }
    if let Some(i) = heap.integer(a) {
        return match heap.integer(b) {
            Some(j) => i == j,
            None => heap.float(b).is_some_and(|f| i as f64 == f),
        };
    }
    if let Some(f) = heap.float(a) {
        return match heap.float(b) {
            Some(g) => f == g,
            None => heap.integer(b).is_some_and(|j| f == j as f64),
        };
    }
    match (heap.string(a), heap.string(b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Hash consistent with [`eql`]. Values compared by identity hash to 0 so
/// the hash survives collection.
pub(crate) fn hash_value(heap: &Heap, v: Value) -> i64 {
    if let Some(i) = heap.integer(v) {
        return i;
    }
    match heap.get(v) {
        Some(Record::Float(f)) => {
            if f.fract() == 0.0 && f.abs() < 9.0e18 {
                *f as i64
            } else {
                f.to_bits() as i64
            }
        }
        Some(Record::String(s)) => hash_bytes(s),
        Some(Record::Symbol(s)) => s.hash,
        _ => 0,
    }
}

fn store_of(heap: &Heap, v: Value) -> Option<&PropertyStore> {
    match heap.get(v)? {
        Record::Object(o) => Some(&o.store),
        Record::CObject(c) => Some(&c.object.store),
        Record::Type(t) => Some(&t.store),
        _ => None,
    }
}

fn store_mut(heap: &mut Heap, v: Value) -> Option<&mut PropertyStore> {
    match heap.get_mut(v)? {
        Record::Object(o) => Some(&mut o.store),
        Record::CObject(c) => Some(&mut c.object.store),
        Record::Type(t) => Some(&mut t.store),
        _ => None,
    }
}

/// Property of `obj`'s own store, no inheritance.
pub(crate) fn find_local(heap: &Heap, obj: Value, tag: Value) -> Option<Value> {
    let store = store_of(heap, obj)?;
    store.get(hash_value(heap, tag), |t| eql(heap, t, tag))
}

/// Add or update a property in `obj`'s own store. `false` when `obj` has no
/// store.
pub(crate) fn set_local(heap: &mut Heap, obj: Value, tag: Value, value: Value) -> bool {
    let hash = hash_value(heap, tag);
    let Some(store) = store_mut(heap, obj) else {
        return false;
    };
    let mut store = mem::take(store);
    store.set(tag, value, hash, |t| eql(heap, t, tag));
    if let Some(slot) = store_mut(heap, obj) {
        *slot = store;
    }
    true
}

/// Copy of an object's own store.
pub(crate) fn clone_store(heap: &Heap, obj: Value) -> Option<PropertyStore> {
    store_of(heap, obj).cloned()
}

/// `(tag, value)` pairs of an object's own store, in store order.
pub(crate) fn local_properties(heap: &Heap, obj: Value) -> Vec<(Value, Value)> {
    store_of(heap, obj)
        .map(|s| s.iter().map(|p| (p.tag, p.value)).collect())
        .unwrap_or_default()
}

/// Class link of an object, `None` for non-objects and the root.
pub(crate) fn class_of(heap: &Heap, v: Value) -> Option<Value> {
    heap.object(v).map(|o| o.class).filter(|c| !c.is_nil())
}

impl Interpreter {
    pub(crate) fn type_record(&self, kind: TypeKind) -> Value {
        self.types[kind.index()]
    }

    /// Look `tag` up on `obj` itself, without following class links.
    pub(crate) fn get_property1(&mut self, obj: Value, tag: Value) -> Result<Option<Value>, BobError> {
        let kind = TypeKind::of(&self.heap, obj);
        match kind {
            TypeKind::Object | TypeKind::Type => Ok(find_local(&self.heap, obj, tag)),
            TypeKind::CObject => match find_local(&self.heap, obj, tag) {
                Some(v) => Ok(Some(v)),
                None => self.get_virtual(obj, kind, tag),
            },
            TypeKind::Vector => match self.heap.integer(tag) {
                Some(i) => {
                    let items = self.heap.vector(obj).map(Vec::as_slice).unwrap_or(&[]);
                    match usize::try_from(i).ok().and_then(|i| items.get(i)) {
                        Some(v) => Ok(Some(*v)),
                        None => Err(BobError::IndexOutOfBounds(self.print_string(tag))),
                    }
                }
                None => self.get_virtual(obj, kind, tag),
            },
            TypeKind::String => match self.heap.integer(tag) {
                Some(i) => {
                    let bytes = self.heap.string(obj).unwrap_or(&[]);
                    match usize::try_from(i).ok().and_then(|i| bytes.get(i)) {
                        Some(b) => Ok(Value::small_int(i64::from(*b))),
                        None => Err(BobError::IndexOutOfBounds(self.print_string(tag))),
                    }
                }
                None => self.get_virtual(obj, kind, tag),
            },
            _ => self.get_virtual(obj, kind, tag),
        }
    }

    /// Look `tag` up on `obj` and then along its class chain.
    pub(crate) fn get_property(&mut self, obj: Value, tag: Value) -> Result<Option<Value>, BobError> {
        let mut cur = obj;
        loop {
            if let Some(v) = self.get_property1(cur, tag)? {
                return Ok(Some(v));
            }
            match class_of(&self.heap, cur) {
                Some(class) => cur = class,
                None => return Ok(None),
            }
        }
    }

    /// Store a property. `false` when `obj` cannot hold `tag`.
    pub(crate) fn set_property(&mut self, obj: Value, tag: Value, value: Value) -> Result<bool, BobError> {
        let kind = TypeKind::of(&self.heap, obj);
        match kind {
            TypeKind::Object | TypeKind::Type => Ok(set_local(&mut self.heap, obj, tag, value)),
            TypeKind::CObject => {
                if find_local(&self.heap, obj, tag).is_some() || !self.set_virtual(obj, kind, tag, value)? {
                    return Ok(set_local(&mut self.heap, obj, tag, value));
                }
                Ok(true)
            }
            TypeKind::Vector => match self.heap.integer(tag) {
                Some(i) => {
                    let Ok(i) = usize::try_from(i) else {
                        return Err(BobError::IndexOutOfBounds(self.print_string(tag)));
                    };
                    let len = i.checked_add(1).ok_or(BobError::InsufficientMemory)?;
                    let Some(items) = self.heap.grow_vector(obj, len, 0)? else {
                        return Ok(false);
                    };
                    items[i] = value;
                    Ok(true)
                }
                None => self.set_virtual(obj, kind, tag, value),
            },
            TypeKind::String => match self.heap.integer(tag) {
                Some(i) => {
                    let Some(byte) = self.heap.integer(value) else {
                        return Err(BobError::TypeError(self.print_string(value)));
                    };
                    let len = self.heap.string(obj).map_or(0, <[u8]>::len);
                    match usize::try_from(i).ok().filter(|i| *i < len) {
                        Some(i) => {
                            if let Some(bytes) = self.heap.string_mut(obj) {
                                bytes[i] = byte as u8;
                            }
                            Ok(true)
                        }
                        None => Err(BobError::IndexOutOfBounds(self.print_string(tag))),
                    }
                }
                None => self.set_virtual(obj, kind, tag, value),
            },
            _ => self.set_virtual(obj, kind, tag, value),
        }
    }

    fn get_virtual(&mut self, obj: Value, kind: TypeKind, tag: Value) -> Result<Option<Value>, BobError> {
        let Some(found) = find_local(&self.heap, self.type_record(kind), tag) else {
            return Ok(None);
        };
        match self.heap.get(found) {
            Some(Record::VirtualProperty(vp)) => match vp.get {
                Some(get) => get(self, obj).map(Some),
                None => Err(BobError::WriteOnlyProperty),
            },
            _ => Ok(Some(found)),
        }
    }

    fn set_virtual(&mut self, obj: Value, kind: TypeKind, tag: Value, value: Value) -> Result<bool, BobError> {
        let Some(found) = find_local(&self.heap, self.type_record(kind), tag) else {
            return Ok(false);
        };
        match self.heap.get(found) {
            Some(Record::VirtualProperty(vp)) => match vp.set {
                Some(set) => {
                    set(self, obj, value)?;
                    Ok(true)
                }
                None => Err(BobError::ReadOnlyProperty),
            },
            _ => Ok(false),
        }
    }

    /// `new` applied to `class`.
    pub(crate) fn new_instance(&mut self, class: Value) -> Result<Value, BobError> {
        if self.heap.is_object(class) {
            return self.heap.make_object(class);
        }
        match self.heap.get(class) {
            Some(Record::Type(t)) => match t.kind {
                TypeKind::Vector => self.heap.make_vector(Vec::new()),
                TypeKind::String => self.heap.make_string(b""),
                _ => Err(BobError::NewInstance),
            },
            _ => Err(BobError::NewInstance),
        }
    }

    /// Ordering for the relational operators: numbers, or two strings.
    pub(crate) fn compare(&self, a: Value, b: Value) -> Result<Ordering, BobError> {
        let heap = &self.heap;
        if let (Some(i), Some(j)) = (heap.integer(a), heap.integer(b)) {
            return Ok(i.cmp(&j));
        }
        let num = |v: Value| heap.float(v).or_else(|| heap.integer(v).map(|i| i as f64));
        if heap.float(a).is_some() || heap.float(b).is_some() {
            let x = num(a).ok_or_else(|| BobError::TypeError(self.print_string(a)))?;
            let y = num(b).ok_or_else(|| BobError::TypeError(self.print_string(b)))?;
            let diff = x - y;
            return Ok(if diff < 0.0 {
                Ordering::Less
            } else if diff == 0.0 {
                Ordering::Equal
            } else {
                Ordering::Greater
            });
        }
        match (heap.string(a), heap.string(b)) {
            (Some(x), Some(y)) => Ok(x.cmp(y)),
            _ => Err(BobError::TypeError(self.print_string(a))),
        }
    }

    /// Name of the value's runtime type.
    pub fn type_name(&self, v: Value) -> &'static str {
        TypeKind::of(&self.heap, v).name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_compare_across_representations() {
        let mut heap = Heap::new(64 * 1024);
        let one = heap.make_integer(1).unwrap();
        let one_f = heap.make_float(1.0).unwrap();
        let half = heap.make_float(0.5).unwrap();
        assert!(eql(&heap, one, one_f));
        assert!(eql(&heap, one_f, one));
        assert!(!eql(&heap, one, half));
        assert_eq!(hash_value(&heap, one), hash_value(&heap, one_f));
    }

    #[test]
    fn strings_compare_by_contents() {
        let mut heap = Heap::new(64 * 1024);
        let a = heap.make_string(b"abc").unwrap();
        let b = heap.make_string(b"abc").unwrap();
        let c = heap.make_string(b"abd").unwrap();
        assert_ne!(a, b);
        assert!(eql(&heap, a, b));
        assert!(!eql(&heap, a, c));
        assert_eq!(hash_value(&heap, a), hash_value(&heap, b));
    }

    #[test]
    fn nan_is_not_equal_to_itself() {
        let mut heap = Heap::new(64 * 1024);
        let nan = heap.make_float(f64::NAN).unwrap();
        assert!(!eql(&heap, nan, nan));
    }

    #[test]
    fn local_store_round_trip() {
        let mut heap = Heap::new(64 * 1024);
        let obj = heap.make_object(Value::NIL).unwrap();
        let tag = heap.make_string(b"k").unwrap();
        let same = heap.make_string(b"k").unwrap();
        let seven = Value::small_int(7).unwrap();
        assert!(set_local(&mut heap, obj, tag, seven));
        assert_eq!(find_local(&heap, obj, same), Some(seven));
        assert!(!set_local(&mut heap, seven, tag, seven));
    }
}
