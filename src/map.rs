//! Named value storage.
//!
//! A [`Map`] keeps its names in insertion order, parallel to an embedded
//! [`Array`] holding the values. Names are raw bytes and are compared
//! byte-for-byte; uniqueness within one map is enforced by the parser.

use crate::alloc::{grow_vec, Allocator};
use crate::array::{next_capacity, release_payload, Array};
use crate::value::Value;
use crate::Result;

/// An ordered collection of uniquely named values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Map {
    names: Vec<Box<[u8]>>,
    names_cap: usize,
    array: Array,
}

impl Map {
    pub(crate) const fn empty() -> Self {
        Map {
            names: Vec::new(),
            names_cap: 0,
            array: Array::empty(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names in insertion order.
    pub fn names(&self) -> impl ExactSizeIterator<Item = &[u8]> + '_ {
        self.names.iter().map(|name| &name[..])
    }

    /// The values, in the same order as [`Map::names`].
    pub fn array(&self) -> &Array {
        &self.array
    }

    /// Position of `name`, comparing bytes exactly.
    pub fn position(&self, name: &[u8]) -> Option<usize> {
        self.names.iter().position(|n| **n == *name)
    }

    #[must_use]
    pub fn contains(&self, name: &[u8]) -> bool {
        self.position(name).is_some()
    }

    pub fn get(&self, name: &[u8]) -> Option<&Value> {
        self.position(name).and_then(|i| self.array.get(i))
    }

    /// Returns the entry at `index`.
    pub fn entry(&self, index: usize) -> Option<(&[u8], &Value)> {
        Some((self.names.get(index)?, self.array.get(index)?))
    }

    /// Appends an entry whose name and payload are already charged to `alloc`.
    ///
    /// On failure both charges are released.
    pub(crate) fn push(&mut self, alloc: &dyn Allocator, name: Box<[u8]>, value: Value) -> Result<()> {
        if self.names.len() == self.names_cap {
            let new_cap = next_capacity(self.names_cap);
            if let Err(e) = grow_vec(alloc, &mut self.names, &mut self.names_cap, new_cap) {
                alloc.free(name.len());
                release_payload(alloc, &value);
                return Err(e);
            }
        }
        if let Err(e) = self.array.push(alloc, value) {
            alloc.free(name.len());
            return Err(e);
        }
        self.names.push(name);
        Ok(())
    }

    pub(crate) fn release_payloads(&self, alloc: &dyn Allocator) {
        self.array.release_payloads(alloc);
    }

    pub(crate) fn release_values(&mut self, alloc: &dyn Allocator) {
        self.array.release_storage(alloc);
    }

    /// Releases every name and the name buffer itself.
    pub(crate) fn release_names(&mut self, alloc: &dyn Allocator) {
        for name in &self.names {
            if !name.is_empty() {
                alloc.free(name.len());
            }
        }
        if self.names_cap > 0 {
            alloc.free(self.names_cap * std::mem::size_of::<Box<[u8]>>());
        }
        self.names = Vec::new();
        self.names_cap = 0;
    }
}
