//! Two-space copying collector.
//!
//! `Heap::begin_collection` swaps the active space out and returns a
//! `Collector`. The caller relocates every root through it, then `finish`
//! scans the copied records breadth first, copying everything they refer to.
//! Each vacated from-space slot holds a `Forwarded` marker, so a record
//! reached twice is copied once.

use std::mem;

use super::heap::{Heap, Record};
use super::value::Value;

/// Outcome of one collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GcStats {
    pub bytes_free: usize,
    pub bytes_total: usize,
    pub collections: usize,
    pub destroyed: usize,
}

pub(crate) struct Collector<'h> {
    heap: &'h mut Heap,
    from: Vec<Record>,
    old_cobjects: Vec<usize>,
}

impl Heap {
    pub(crate) fn begin_collection(&mut self) -> Collector<'_> {
        let from = mem::take(&mut self.space);
        self.space = Vec::with_capacity(from.len() / 2 + 16);
        self.used = 0;
        let old_cobjects = mem::take(&mut self.cobjects);
        let mut gc = Collector {
            heap: self,
            from,
            old_cobjects,
        };
        // The singletons keep their slots.
        gc.copy(Value::NIL);
        gc.copy(Value::TRUE);
        let mut protected = mem::take(&mut gc.heap.protected);
        protected.iter_mut().for_each(|v| gc.relocate(v));
        gc.heap.protected = protected;
        gc
    }
}

impl Collector<'_> {
    /// To-space form of `v`, copying its record on first sight.
    pub(crate) fn copy(&mut self, v: Value) -> Value {
        let Some(index) = v.index() else {
            return v;
        };
        let to = self.heap.space.len();
        let Some(slot) = self.from.get_mut(index) else {
            return v;
        };
        if let Record::Forwarded(new) = slot {
            return Value::from_index(*new);
        }
        let record = mem::replace(slot, Record::Forwarded(to));
        self.heap.used += record.size();
        if matches!(record, Record::CObject(_)) {
            self.heap.cobjects.push(to);
        }
        self.heap.space.push(record);
        Value::from_index(to)
    }

    #[inline]
    pub(crate) fn relocate(&mut self, v: &mut Value) {
        *v = self.copy(*v);
    }

    pub(crate) fn finish(mut self) -> GcStats {
        let mut scan = 0;
        while scan < self.heap.space.len() {
            let mut record = mem::replace(&mut self.heap.space[scan], Record::Forwarded(scan));
            record.trace(&mut |v| *v = self.copy(*v));
            self.heap.space[scan] = record;
            scan += 1;
        }

        let mut destroyed = 0;
        for index in mem::take(&mut self.old_cobjects) {
            if let Some(Record::CObject(c)) = self.from.get_mut(index) {
                if let Some(resource) = c.resource.take() {
                    resource.destroy();
                    destroyed += 1;
                }
            }
        }

        self.heap.collections += 1;
        self.heap.pending = false;
        let stats = GcStats {
            bytes_free: self.heap.bytes_free(),
            bytes_total: self.heap.limit,
            collections: self.heap.collections,
            destroyed,
        };
        log::debug!(
            "[GC - {} bytes free out of {}, collections {}]",
            stats.bytes_free,
            stats.bytes_total,
            stats.collections
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::core::heap::NativeResource;

    struct Counted(Rc<Cell<u32>>);

    impl NativeResource for Counted {
        fn destroy(self: Box<Self>) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn unreachable_records_are_dropped() {
        let mut heap = Heap::new(64 * 1024);
        let keep = heap.make_string(b"keep").unwrap();
        for _ in 0..10 {
            heap.make_string(b"garbage").unwrap();
        }
        heap.protect(keep);
        let stats = heap.begin_collection().finish();
        assert_eq!(stats.collections, 1);
        let keep = heap.unprotect();
        assert_eq!(heap.string(keep), Some(&b"keep"[..]));
        // nil, true and the kept string.
        assert_eq!(heap.record_count(), 3);
    }

    #[test]
    fn shared_records_are_copied_once() {
        let mut heap = Heap::new(64 * 1024);
        let s = heap.make_string(b"shared").unwrap();
        let v = heap.make_vector(vec![s, s]).unwrap();
        heap.protect(v);
        heap.begin_collection().finish();
        let v = heap.unprotect();
        let items = heap.vector(v).unwrap().clone();
        assert_eq!(items[0], items[1]);
        assert_eq!(heap.string(items[0]), Some(&b"shared"[..]));
    }

    #[test]
    fn cycles_survive() {
        let mut heap = Heap::new(64 * 1024);
        let v = heap.make_vector(vec![Value::NIL]).unwrap();
        heap.vector_mut(v).unwrap()[0] = v;
        heap.protect(v);
        heap.begin_collection().finish();
        let v = heap.unprotect();
        assert_eq!(heap.vector(v).unwrap()[0], v);
    }

    #[test]
    fn dead_cobjects_are_destroyed_once() {
        let count = Rc::new(Cell::new(0));
        let mut heap = Heap::new(64 * 1024);
        heap.make_cobject(Value::NIL, Box::new(Counted(count.clone())))
            .unwrap();
        let live = heap
            .make_cobject(Value::NIL, Box::new(Counted(count.clone())))
            .unwrap();
        heap.protect(live);
        let stats = heap.begin_collection().finish();
        assert_eq!(stats.destroyed, 1);
        heap.begin_collection().finish();
        assert_eq!(count.get(), 1);
        drop(heap);
        assert_eq!(count.get(), 2);
    }
}
