//! Tagged value representation.
//!
//! A `Value` is one machine word. With the low bit set it is an immediate
//! 63-bit integer; otherwise the remaining bits index a record in the active
//! heap space. Indices are only meaningful until the next collection, which
//! rewrites every value it can reach.

use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Value(u64);

/// Smallest integer held without a heap record.
pub const SMALL_INT_MIN: i64 = -(1 << 62);
/// Largest integer held without a heap record.
pub const SMALL_INT_MAX: i64 = (1 << 62) - 1;

impl Value {
    /// `nil` is the symbol record the heap keeps in slot 0. It doubles as false.
    pub const NIL: Value = Value(0);
    /// `true` is the symbol record in slot 1.
    pub const TRUE: Value = Value(2);

    #[inline]
    pub fn small_int(i: i64) -> Option<Value> {
        if (SMALL_INT_MIN..=SMALL_INT_MAX).contains(&i) {
            Some(Value(((i as u64) << 1) | 1))
        } else {
            None
        }
    }

    #[inline]
    pub fn is_small_int(self) -> bool {
        self.0 & 1 == 1
    }

    #[inline]
    pub fn as_small_int(self) -> Option<i64> {
        if self.is_small_int() {
            Some((self.0 as i64) >> 1)
        } else {
            None
        }
    }

    #[inline]
    pub(crate) fn from_index(index: usize) -> Value {
        Value((index as u64) << 1)
    }

    #[inline]
    pub(crate) fn index(self) -> Option<usize> {
        if self.is_small_int() {
            None
        } else {
            Some((self.0 >> 1) as usize)
        }
    }

    #[inline]
    pub fn is_nil(self) -> bool {
        self == Value::NIL
    }

    /// Only `nil` (which is also `false`) is falsy.
    #[inline]
    pub fn is_truthy(self) -> bool {
        self != Value::NIL
    }

    #[inline]
    pub fn from_bool(b: bool) -> Value {
        if b { Value::TRUE } else { Value::NIL }
    }

    /// Raw word, used for the `<Type-xxxxxxxx>` print form.
    pub fn bits(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_small_int() {
            Some(i) => write!(f, "Int({i})"),
            None => write!(f, "Ref({})", self.0 >> 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_integers_round_trip_at_the_edges() {
        for i in [0, 1, -1, SMALL_INT_MIN, SMALL_INT_MAX] {
            assert_eq!(Value::small_int(i).and_then(Value::as_small_int), Some(i));
        }
        assert!(Value::small_int(SMALL_INT_MAX + 1).is_none());
        assert!(Value::small_int(i64::MIN).is_none());
    }

    #[test]
    fn singletons_are_heap_references() {
        assert_eq!(Value::NIL.index(), Some(0));
        assert_eq!(Value::TRUE.index(), Some(1));
        assert!(!Value::NIL.is_truthy());
        assert!(Value::small_int(0).is_some_and(|v| v.is_truthy()));
    }
}
