//! Unnamed value storage and the capacity policy shared by all tables.

use crate::alloc::{grow_vec, Allocator};
use crate::value::Value;
use crate::Result;

/// Slots added on top of doubling whenever a table grows.
pub(crate) const GROWTH_PAD: usize = 4;

/// Capacity after one growth step: `old * 2 + GROWTH_PAD`.
#[inline]
pub(crate) fn next_capacity(cap: usize) -> usize {
    cap.saturating_mul(2).saturating_add(GROWTH_PAD)
}

/// An ordered collection of values without names.
///
/// Length and capacity are tracked separately; capacity is what has been
/// admitted by the document's allocator and is always at least the length.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Array {
    values: Vec<Value>,
    cap: usize,
}

impl Array {
    pub(crate) const fn empty() -> Self {
        Array {
            values: Vec::new(),
            cap: 0,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of slots admitted by the allocator.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.cap
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Makes room for one more value, growing by the shared policy.
    pub(crate) fn reserve_one(&mut self, alloc: &dyn Allocator) -> Result<()> {
        if self.values.len() < self.cap {
            return Ok(());
        }
        let new_cap = next_capacity(self.cap);
        grow_vec(alloc, &mut self.values, &mut self.cap, new_cap)
    }

    /// Appends a value whose payload is already charged to `alloc`.
    ///
    /// If the value cannot be stored its payload charge is released.
    pub(crate) fn push(&mut self, alloc: &dyn Allocator, value: Value) -> Result<()> {
        if let Err(e) = self.reserve_one(alloc) {
            release_payload(alloc, &value);
            return Err(e);
        }
        self.values.push(value);
        Ok(())
    }

    /// Releases the charge for every string and blob payload.
    pub(crate) fn release_payloads(&self, alloc: &dyn Allocator) {
        for value in &self.values {
            release_payload(alloc, value);
        }
    }

    /// Releases the charge for the value buffer and empties the array.
    pub(crate) fn release_storage(&mut self, alloc: &dyn Allocator) {
        if self.cap > 0 {
            alloc.free(self.cap * std::mem::size_of::<Value>());
        }
        self.values = Vec::new();
        self.cap = 0;
    }
}

pub(crate) fn release_payload(alloc: &dyn Allocator, value: &Value) {
    let len = value.payload_len();
    if len > 0 {
        alloc.free(len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TrackingAllocator;

    #[test]
    fn test_growth_policy() {
        assert_eq!(next_capacity(0), 4);
        assert_eq!(next_capacity(4), 12);
        assert_eq!(next_capacity(usize::MAX), usize::MAX);
    }

    #[test]
    fn test_push_grows_capacity() {
        let tracker = TrackingAllocator::new();
        let mut array = Array::default();
        for n in 0..5 {
            array.push(&tracker, Value::Int(n)).unwrap();
            assert!(array.capacity() >= array.len());
        }
        assert_eq!(array.len(), 5);
        assert_eq!(array.capacity(), 12);
        assert_eq!(
            tracker.live_bytes(),
            12 * std::mem::size_of::<Value>()
        );
        array.release_storage(&tracker);
        assert_eq!(tracker.live_bytes(), 0);
        assert!(array.is_empty());
    }

    #[test]
    fn test_refused_push_releases_payload() {
        let tracker = TrackingAllocator::new();
        tracker.resize(0, 3).unwrap();
        tracker.set_limit(3);
        let mut array = Array::default();
        let value = Value::String(Box::from(&b"abc"[..]));
        assert!(array.push(&tracker, value).is_err());
        assert_eq!(tracker.live_bytes(), 0);
    }
}
