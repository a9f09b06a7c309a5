//! Allocator injection for NVF documents.
//!
//! Every buffer a [`Document`](crate::Document) owns (the map and array
//! tables, each aggregate's entry storage, every name, string and blob
//! payload) is admitted through one [`Allocator`] before it grows and released
//! through the same allocator when the document is deinited. Buffers handed to
//! the caller by the auto-allocating getters and the renderer are [`Buffer`]s
//! charged to that allocator too, and they release their charge on drop.
//!
//! The real memory still comes from the global allocator via
//! `Vec::try_reserve_exact`; an [`Allocator`] decides whether a request is
//! admitted and keeps whatever books it wants.
//!
//! ## Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use nvf::{Document, TrackingAllocator};
//!
//! let tracker = Arc::new(TrackingAllocator::new());
//! let mut doc = Document::with_allocator(tracker.clone());
//! doc.parse(b"name \"value\"").unwrap();
//! assert!(tracker.live_bytes() > 0);
//!
//! doc.deinit().unwrap();
//! assert_eq!(tracker.live_bytes(), 0);
//! ```

use crate::{Error, Result};
use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Returned by an [`Allocator`] that refuses a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllocError;

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("allocation refused")
    }
}

impl std::error::Error for AllocError {}

/// A resize-or-allocate / free pair that all document memory flows through.
///
/// `resize(0, n)` allocates `n` bytes, `resize(old, new)` grows or shrinks an
/// existing allocation, and `free(n)` releases an allocation of `n` bytes.
/// Sizes passed to `free` always match an earlier successful `resize`.
pub trait Allocator: fmt::Debug + Send + Sync {
    /// Admits a change of an allocation from `old` to `new` bytes.
    fn resize(&self, old: usize, new: usize) -> std::result::Result<(), AllocError>;

    /// Releases an allocation of `size` bytes.
    fn free(&self, size: usize);
}

/// The default allocator: admits every request.
///
/// Genuine out-of-memory conditions are still reported as
/// [`Error::BadAlloc`] because the reservation itself is fallible.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemAllocator;

impl Allocator for SystemAllocator {
    fn resize(&self, _old: usize, _new: usize) -> std::result::Result<(), AllocError> {
        Ok(())
    }

    fn free(&self, _size: usize) {}
}

/// An allocator that counts live bytes and can enforce a byte limit.
///
/// # Examples
///
/// ```rust
/// use nvf::{Allocator, TrackingAllocator};
///
/// let tracker = TrackingAllocator::with_limit(16);
/// assert!(tracker.resize(0, 10).is_ok());
/// assert!(tracker.resize(10, 32).is_err());
/// tracker.free(10);
/// assert_eq!(tracker.live_bytes(), 0);
/// assert_eq!(tracker.peak_bytes(), 10);
/// ```
#[derive(Debug)]
pub struct TrackingAllocator {
    live: AtomicUsize,
    peak: AtomicUsize,
    limit: AtomicUsize,
    allocations: AtomicUsize,
    frees: AtomicUsize,
}

impl TrackingAllocator {
    /// Creates a tracker without a limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limit(usize::MAX)
    }

    /// Creates a tracker that refuses to hold more than `limit` live bytes.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        TrackingAllocator {
            live: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            limit: AtomicUsize::new(limit),
            allocations: AtomicUsize::new(0),
            frees: AtomicUsize::new(0),
        }
    }

    /// Changes the live-byte limit. Existing allocations are kept.
    pub fn set_limit(&self, limit: usize) {
        self.limit.store(limit, Ordering::SeqCst);
    }

    /// Bytes currently admitted and not yet freed.
    pub fn live_bytes(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// The highest value `live_bytes` has reached.
    pub fn peak_bytes(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Number of fresh allocations (`resize` from zero) admitted.
    pub fn allocation_count(&self) -> usize {
        self.allocations.load(Ordering::SeqCst)
    }

    /// Number of `free` calls.
    pub fn free_count(&self) -> usize {
        self.frees.load(Ordering::SeqCst)
    }
}

impl Default for TrackingAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl Allocator for TrackingAllocator {
    fn resize(&self, old: usize, new: usize) -> std::result::Result<(), AllocError> {
        let limit = self.limit.load(Ordering::SeqCst);
        let mut live = self.live.load(Ordering::SeqCst);
        loop {
            let next = (live - old.min(live)).checked_add(new).ok_or(AllocError)?;
            if new > old && next > limit {
                return Err(AllocError);
            }
            match self
                .live
                .compare_exchange(live, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => {
                    self.peak.fetch_max(next, Ordering::SeqCst);
                    if old == 0 && new > 0 {
                        self.allocations.fetch_add(1, Ordering::SeqCst);
                    }
                    return Ok(());
                }
                Err(current) => live = current,
            }
        }
    }

    fn free(&self, size: usize) {
        // Saturate so a mismatched free cannot wrap the counter.
        let _ = self
            .live
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |live| {
                Some(live.saturating_sub(size))
            });
        self.frees.fetch_add(1, Ordering::SeqCst);
    }
}

/// Admits a resize through `alloc`, mapping a refusal to [`Error::BadAlloc`].
pub(crate) fn admit(alloc: &dyn Allocator, old: usize, new: usize) -> Result<()> {
    alloc
        .resize(old, new)
        .map_err(|_| Error::BadAlloc { requested: new })
}

/// Grows `vec` so it can hold `new_cap` elements, charging the byte delta.
///
/// `charged` is the element capacity currently charged for `vec`; on success
/// it becomes `new_cap`. On failure nothing stays charged beyond the old size.
pub(crate) fn grow_vec<T>(
    alloc: &dyn Allocator,
    vec: &mut Vec<T>,
    charged: &mut usize,
    new_cap: usize,
) -> Result<()> {
    let elem = std::mem::size_of::<T>().max(1);
    let old_bytes = *charged * elem;
    let new_bytes = new_cap
        .checked_mul(elem)
        .ok_or(Error::BadAlloc { requested: usize::MAX })?;
    admit(alloc, old_bytes, new_bytes)?;
    if vec
        .try_reserve_exact(new_cap.saturating_sub(vec.len()))
        .is_err()
    {
        // Roll the admission back so the books match what we actually hold.
        let _ = alloc.resize(new_bytes, old_bytes);
        return Err(Error::BadAlloc {
            requested: new_bytes,
        });
    }
    *charged = new_cap;
    Ok(())
}

/// Copies `bytes` into an exactly sized allocation charged to `alloc`.
pub(crate) fn alloc_bytes(alloc: &dyn Allocator, bytes: &[u8]) -> Result<Box<[u8]>> {
    admit(alloc, 0, bytes.len())?;
    let mut owned = Vec::new();
    if owned.try_reserve_exact(bytes.len()).is_err() {
        alloc.free(bytes.len());
        return Err(Error::BadAlloc {
            requested: bytes.len(),
        });
    }
    owned.extend_from_slice(bytes);
    Ok(owned.into_boxed_slice())
}

/// An owned byte buffer charged to a document's allocator.
///
/// Produced by the auto-allocating getters ([`Document::get_str`],
/// [`Document::get_blob`]) and by rendering. Ownership transfers to the
/// caller; dropping the buffer releases its charge through the same
/// allocator that admitted it.
///
/// [`Document::get_str`]: crate::Document::get_str
/// [`Document::get_blob`]: crate::Document::get_blob
pub struct Buffer {
    bytes: Vec<u8>,
    charged: usize,
    alloc: Arc<dyn Allocator>,
}

impl Buffer {
    pub(crate) fn new(alloc: Arc<dyn Allocator>) -> Self {
        Buffer {
            bytes: Vec::new(),
            charged: 0,
            alloc,
        }
    }

    /// Allocates exactly `bytes.len()` bytes and copies `bytes` in.
    pub(crate) fn copy_exact(alloc: Arc<dyn Allocator>, bytes: &[u8]) -> Result<Self> {
        let mut buffer = Buffer::new(alloc);
        buffer.reserve_exact(bytes.len())?;
        buffer.bytes.extend_from_slice(bytes);
        Ok(buffer)
    }

    fn reserve_exact(&mut self, cap: usize) -> Result<()> {
        let Buffer {
            bytes,
            charged,
            alloc,
        } = self;
        grow_vec(alloc.as_ref(), bytes, charged, cap)
    }

    /// Appends `data`, doubling the charged capacity when it runs out.
    pub(crate) fn extend(&mut self, data: &[u8]) -> Result<()> {
        let needed = self
            .bytes
            .len()
            .checked_add(data.len())
            .ok_or(Error::BadAlloc { requested: usize::MAX })?;
        if needed > self.charged {
            let cap = needed.max(self.charged.saturating_mul(2)).max(64);
            self.reserve_exact(cap)?;
        }
        self.bytes.extend_from_slice(data);
        Ok(())
    }

    /// Returns the contents.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the contents as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadData`] if the contents are not valid UTF-8.
    pub fn as_str(&self) -> Result<&str> {
        std::str::from_utf8(&self.bytes).map_err(|e| Error::BadData(e.to_string()))
    }

    /// Detaches the bytes from the allocator, releasing the charge.
    pub fn into_vec(mut self) -> Vec<u8> {
        std::mem::take(&mut self.bytes)
    }
}

impl Deref for Buffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl AsRef<[u8]> for Buffer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl PartialEq<[u8]> for Buffer {
    fn eq(&self, other: &[u8]) -> bool {
        self.bytes == other
    }
}

impl PartialEq<&[u8]> for Buffer {
    fn eq(&self, other: &&[u8]) -> bool {
        self.bytes == *other
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("bytes", &String::from_utf8_lossy(&self.bytes))
            .field("charged", &self.charged)
            .finish()
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if self.charged > 0 {
            self.alloc.free(self.charged);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracking_counts_and_limit() {
        let tracker = TrackingAllocator::with_limit(100);
        tracker.resize(0, 60).unwrap();
        assert_eq!(tracker.live_bytes(), 60);
        assert_eq!(tracker.resize(60, 120), Err(AllocError));
        assert_eq!(tracker.live_bytes(), 60);
        tracker.resize(60, 80).unwrap();
        tracker.free(80);
        assert_eq!(tracker.live_bytes(), 0);
        assert_eq!(tracker.peak_bytes(), 80);
        assert_eq!(tracker.allocation_count(), 1);
        assert_eq!(tracker.free_count(), 1);
    }

    #[test]
    fn test_shrink_is_always_admitted() {
        let tracker = TrackingAllocator::with_limit(10);
        tracker.resize(0, 10).unwrap();
        tracker.set_limit(0);
        assert!(tracker.resize(10, 4).is_ok());
        assert_eq!(tracker.live_bytes(), 4);
    }

    #[test]
    fn test_grow_vec_rolls_back_on_refusal() {
        let tracker = TrackingAllocator::with_limit(16);
        let mut vec: Vec<u64> = Vec::new();
        let mut charged = 0;
        grow_vec(&tracker, &mut vec, &mut charged, 2).unwrap();
        assert_eq!(tracker.live_bytes(), 16);
        let err = grow_vec(&tracker, &mut vec, &mut charged, 3).unwrap_err();
        assert!(matches!(err, Error::BadAlloc { .. }));
        assert_eq!(charged, 2);
        assert_eq!(tracker.live_bytes(), 16);
    }

    #[test]
    fn test_buffer_releases_on_drop() {
        let tracker = Arc::new(TrackingAllocator::new());
        let buffer = Buffer::copy_exact(tracker.clone(), b"hello").unwrap();
        assert_eq!(tracker.live_bytes(), 5);
        assert_eq!(buffer.as_str().unwrap(), "hello");
        drop(buffer);
        assert_eq!(tracker.live_bytes(), 0);
    }

    #[test]
    fn test_buffer_into_vec_releases_charge() {
        let tracker = Arc::new(TrackingAllocator::new());
        let mut buffer = Buffer::new(tracker.clone());
        buffer.extend(b"abc").unwrap();
        buffer.extend(b"def").unwrap();
        assert!(tracker.live_bytes() >= 6);
        assert_eq!(buffer.into_vec(), b"abcdef".to_vec());
        assert_eq!(tracker.live_bytes(), 0);
    }
}
