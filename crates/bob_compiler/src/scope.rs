//! Lexical argument tables.
//!
//! Every function body and every block with `local` declarations pushes one
//! table; a name resolves to `(level, offset)` where level counts tables
//! outward from the innermost and offset is 1-based within the table. This
//! matches the runtime environment chain, where each call frame and block
//! frame contributes one environment.

use bumpalo::Bump;
use bumpalo::collections::Vec as BumpVec;

/// Slot names that can never match an identifier.
pub const HIDDEN: &[u8] = b"";

pub(crate) struct Scopes<'b> {
    bump: &'b Bump,
    tables: Vec<BumpVec<'b, &'b [u8]>>,
}

impl<'b> Scopes<'b> {
    pub fn new(bump: &'b Bump) -> Self {
        Self {
            bump,
            tables: Vec::new(),
        }
    }

    pub fn push(&mut self) {
        self.tables.push(BumpVec::new_in(self.bump));
    }

    pub fn pop(&mut self) {
        self.tables.pop();
    }

    pub fn clear(&mut self) {
        self.tables.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Add a name to the innermost table.
    pub fn add(&mut self, name: &[u8]) {
        let name: &'b [u8] = self.bump.alloc_slice_copy(name);
        if let Some(table) = self.tables.last_mut() {
            table.push(name);
        }
    }

    pub fn find(&self, name: &[u8]) -> Option<(usize, usize)> {
        if name == HIDDEN {
            return None;
        }
        self.tables.iter().rev().enumerate().find_map(|(level, table)| {
            table
                .iter()
                .position(|n| *n == name)
                .map(|pos| (level, pos + 1))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_tables_shadow_outer_ones() {
        let bump = Bump::new();
        let mut s = Scopes::new(&bump);
        s.push();
        s.add(b"this");
        s.add(b"_next");
        s.add(b"x");
        s.push();
        s.add(b"y");
        s.add(b"x");
        assert_eq!(s.find(b"x"), Some((0, 2)));
        assert_eq!(s.find(b"this"), Some((1, 1)));
        assert_eq!(s.find(b"z"), None);
        s.pop();
        assert_eq!(s.find(b"x"), Some((0, 3)));
    }

    #[test]
    fn hidden_slots_are_never_found() {
        let bump = Bump::new();
        let mut s = Scopes::new(&bump);
        s.push();
        s.add(HIDDEN);
        assert_eq!(s.find(HIDDEN), None);
    }
}
