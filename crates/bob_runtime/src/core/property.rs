//! Property stores.
//!
//! An object's properties start out as a short list. Adding a property to a
//! list that already holds `CREATE_THRESHOLD` entries turns it into a hash
//! table of `CREATE_THRESHOLD` buckets; a table doubles once its count reaches
//! `EXPAND_THRESHOLD` entries per bucket, until it has `EXPAND_MAXIMUM`
//! buckets. Doubling splits each bucket on the newly significant hash bit.
//!
//! Tag equality and hashing belong to the heap, so callers pass the tag's
//! hash and an equality predicate. Each entry remembers its hash so
//! rebucketing never has to consult the heap.

use super::value::Value;

pub(crate) const CREATE_THRESHOLD: usize = 4;
pub(crate) const EXPAND_THRESHOLD: usize = 2;
pub(crate) const EXPAND_MAXIMUM: usize = 64 * 1024;

#[derive(Clone, Copy, Debug)]
pub(crate) struct Property {
    pub(crate) tag: Value,
    pub(crate) value: Value,
    pub(crate) hash: i64,
}

#[derive(Clone, Debug)]
enum Repr {
    List(Vec<Property>),
    Table(Vec<Vec<Property>>),
}

#[derive(Clone, Debug)]
pub(crate) struct PropertyStore {
    repr: Repr,
    count: usize,
}

impl Default for PropertyStore {
    fn default() -> Self {
        Self {
            repr: Repr::List(Vec::new()),
            count: 0,
        }
    }
}

#[inline]
fn bucket(hash: i64, size: usize) -> usize {
    (hash as u64 as usize) & (size - 1)
}

impl PropertyStore {
    pub(crate) fn len(&self) -> usize {
        self.count
    }

    /// Number of hash buckets, or `None` while the store is still a list.
    pub(crate) fn buckets(&self) -> Option<usize> {
        match &self.repr {
            Repr::List(_) => None,
            Repr::Table(t) => Some(t.len()),
        }
    }

    pub(crate) fn find(&self, hash: i64, eq: impl Fn(Value) -> bool) -> Option<&Property> {
        let chain = match &self.repr {
            Repr::List(list) => list,
            Repr::Table(table) => &table[bucket(hash, table.len())],
        };
        chain.iter().rev().find(|p| eq(p.tag))
    }

    pub(crate) fn get(&self, hash: i64, eq: impl Fn(Value) -> bool) -> Option<Value> {
        self.find(hash, eq).map(|p| p.value)
    }

    /// Update the entry for `tag`, or add one. Returns `true` when added.
    pub(crate) fn set(
        &mut self,
        tag: Value,
        value: Value,
        hash: i64,
        eq: impl Fn(Value) -> bool,
    ) -> bool {
        let chain = match &mut self.repr {
            Repr::List(list) => list,
            Repr::Table(table) => {
                let size = table.len();
                &mut table[bucket(hash, size)]
            }
        };
        if let Some(p) = chain.iter_mut().rev().find(|p| eq(p.tag)) {
            p.value = value;
            return false;
        }
        self.add(Property { tag, value, hash });
        true
    }

    fn add(&mut self, prop: Property) {
        match &mut self.repr {
            Repr::List(list) => {
                if self.count >= CREATE_THRESHOLD {
                    let mut table = vec![Vec::new(); CREATE_THRESHOLD];
                    for p in list.drain(..) {
                        table[bucket(p.hash, CREATE_THRESHOLD)].push(p);
                    }
                    table[bucket(prop.hash, CREATE_THRESHOLD)].push(prop);
                    self.repr = Repr::Table(table);
                } else {
                    list.push(prop);
                }
            }
            Repr::Table(table) => {
                let size = table.len();
                if self.count >= size * EXPAND_THRESHOLD && size * 2 <= EXPAND_MAXIMUM {
                    expand(table);
                }
                let size = table.len();
                table[bucket(prop.hash, size)].push(prop);
            }
        }
        self.count += 1;
    }

    /// Entries newest first within each chain, chains in bucket order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Property> {
        let chains: &[Vec<Property>] = match &self.repr {
            Repr::List(list) => std::slice::from_ref(list),
            Repr::Table(table) => table,
        };
        chains.iter().flat_map(|c| c.iter().rev())
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Property> {
        let chains: &mut [Vec<Property>] = match &mut self.repr {
            Repr::List(list) => std::slice::from_mut(list),
            Repr::Table(table) => table,
        };
        chains.iter_mut().flat_map(|c| c.iter_mut())
    }
}

/// Double the bucket count, keeping each entry's relative order.
fn expand(table: &mut Vec<Vec<Property>>) {
    let old = table.len();
    let mut high: Vec<Vec<Property>> = Vec::with_capacity(old);
    for chain in table.iter_mut() {
        let (hi, lo): (Vec<Property>, Vec<Property>) =
            chain.drain(..).partition(|p| (p.hash as u64 as usize) & old != 0);
        *chain = lo;
        high.push(hi);
    }
    table.extend(high);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(i: i64) -> Value {
        Value::small_int(i).unwrap_or(Value::NIL)
    }

    fn put(store: &mut PropertyStore, k: i64, v: i64) -> bool {
        store.set(int(k), int(v), k, |t| t == int(k))
    }

    fn lookup(store: &PropertyStore, k: i64) -> Option<Value> {
        store.get(k, |t| t == int(k))
    }

    #[test]
    fn list_becomes_table_past_threshold() {
        let mut s = PropertyStore::default();
        for k in 0..CREATE_THRESHOLD as i64 {
            assert!(put(&mut s, k, k));
        }
        assert_eq!(s.buckets(), None);
        put(&mut s, 100, 1);
        assert_eq!(s.buckets(), Some(CREATE_THRESHOLD));
        for k in 0..CREATE_THRESHOLD as i64 {
            assert_eq!(lookup(&s, k), Some(int(k)));
        }
    }

    #[test]
    fn table_doubles_and_keeps_entries() {
        let mut s = PropertyStore::default();
        for k in 0..100 {
            put(&mut s, k, k * 10);
        }
        assert_eq!(s.len(), 100);
        assert!(s.buckets().is_some_and(|b| b >= 32));
        for k in 0..100 {
            assert_eq!(lookup(&s, k), Some(int(k * 10)));
        }
    }

    #[test]
    fn update_does_not_add() {
        let mut s = PropertyStore::default();
        assert!(put(&mut s, 7, 1));
        assert!(!put(&mut s, 7, 2));
        assert_eq!(s.len(), 1);
        assert_eq!(lookup(&s, 7), Some(int(2)));
    }

    #[test]
    fn negative_hashes_land_in_range() {
        let mut s = PropertyStore::default();
        for k in -40..0 {
            put(&mut s, k, -k);
        }
        for k in -40..0 {
            assert_eq!(lookup(&s, k), Some(int(-k)));
        }
    }

    #[test]
    fn newest_entries_iterate_first() {
        let mut s = PropertyStore::default();
        put(&mut s, 1, 1);
        put(&mut s, 2, 2);
        let tags: Vec<Value> = s.iter().map(|p| p.tag).collect();
        assert_eq!(tags, vec![int(2), int(1)]);
    }
}
