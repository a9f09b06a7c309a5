//! The document root: owner of every map and array parsed from NVF text.
//!
//! A [`Document`] holds two flat tables, one of [`Map`]s and one of
//! [`Array`]s. Nested aggregates refer to each other by index into these
//! tables, so the tables can be reallocated as they grow without leaving
//! anything dangling. The map at index 0 is the implicit outermost scope.
//!
//! All memory the document owns is admitted through a single
//! [`Allocator`]; [`Document::deinit`] releases it and marks the document as
//! no longer initialized, after which every operation fails with
//! [`Error::NotInitialized`].

use crate::alloc::{alloc_bytes, grow_vec, Allocator, SystemAllocator};
use crate::array::{next_capacity, release_payload, Array};
use crate::map::Map;
use crate::value::Value;
use crate::{Error, Result};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Index of the outermost map.
pub(crate) const ROOT_MAP: usize = 0;

/// Owns every map and array of one NVF tree plus the allocator behind them.
///
/// # Examples
///
/// ```rust
/// use nvf::Document;
///
/// let mut doc = Document::new();
/// let end = doc.parse("m { y \"hi\" }").unwrap();
/// assert_eq!(end, 12);
/// assert_eq!(doc.get_str(&["m", "y"]).unwrap().as_str().unwrap(), "hi");
/// ```
pub struct Document {
    pub(crate) arrays: Vec<Array>,
    arrays_cap: usize,
    pub(crate) maps: Vec<Map>,
    maps_cap: usize,
    alloc: Arc<dyn Allocator>,
    initialized: bool,
}

impl Document {
    /// Creates an empty document backed by the [`SystemAllocator`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_allocator(Arc::new(SystemAllocator))
    }

    /// Creates an empty document whose memory flows through `alloc`.
    #[must_use]
    pub fn with_allocator(alloc: Arc<dyn Allocator>) -> Self {
        Document {
            arrays: Vec::new(),
            arrays_cap: 0,
            maps: Vec::new(),
            maps_cap: 0,
            alloc,
            initialized: true,
        }
    }

    /// Returns `true` until [`Document::deinit`] has run.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// The allocator this document charges its memory to.
    pub fn allocator(&self) -> &Arc<dyn Allocator> {
        &self.alloc
    }

    /// Number of arrays stored, not counting the arrays embedded in maps.
    #[must_use]
    pub fn array_count(&self) -> usize {
        self.arrays.len()
    }

    /// Number of maps stored, including the root map once anything is parsed.
    #[must_use]
    pub fn map_count(&self) -> usize {
        self.maps.len()
    }

    pub(crate) fn ensure_initialized(&self) -> Result<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(Error::NotInitialized)
        }
    }

    /// Appends an empty map to the map table and returns its index.
    pub(crate) fn new_map(&mut self) -> Result<usize> {
        if self.maps.len() == self.maps_cap {
            let new_cap = next_capacity(self.maps_cap);
            grow_vec(self.alloc.as_ref(), &mut self.maps, &mut self.maps_cap, new_cap)?;
        }
        self.maps.push(Map::default());
        Ok(self.maps.len() - 1)
    }

    /// Appends an empty array to the array table and returns its index.
    pub(crate) fn new_array(&mut self) -> Result<usize> {
        if self.arrays.len() == self.arrays_cap {
            let new_cap = next_capacity(self.arrays_cap);
            grow_vec(
                self.alloc.as_ref(),
                &mut self.arrays,
                &mut self.arrays_cap,
                new_cap,
            )?;
        }
        self.arrays.push(Array::default());
        Ok(self.arrays.len() - 1)
    }

    /// Copies a string or blob payload into memory charged to this document.
    pub(crate) fn alloc_payload(&self, bytes: &[u8]) -> Result<Box<[u8]>> {
        alloc_bytes(self.alloc.as_ref(), bytes)
    }

    /// Appends a named entry to the map at `map`, copying `name`.
    ///
    /// `value`'s payload must already be charged to this document; it is
    /// released again if the entry cannot be stored.
    pub(crate) fn push_map_entry(&mut self, map: usize, name: &[u8], value: Value) -> Result<()> {
        let alloc = self.alloc.as_ref();
        let name = match alloc_bytes(alloc, name) {
            Ok(name) => name,
            Err(e) => {
                release_payload(alloc, &value);
                return Err(e);
            }
        };
        self.maps[map].push(alloc, name, value)
    }

    /// Appends an entry to the array at `array`.
    pub(crate) fn push_array_entry(&mut self, array: usize, value: Value) -> Result<()> {
        self.arrays[array].push(self.alloc.as_ref(), value)
    }

    /// Returns the root map index, creating the root map on first use.
    pub(crate) fn root_index(&mut self) -> Result<usize> {
        if self.maps.is_empty() {
            self.new_map()?;
        }
        Ok(ROOT_MAP)
    }

    /// Releases every allocation and marks the document uninitialized.
    ///
    /// Payloads go first, then each array's value buffer, then each map's
    /// values and names, and finally the two tables themselves.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] if the document was already deinited;
    /// nothing is released in that case.
    pub fn deinit(&mut self) -> Result<()> {
        self.ensure_initialized()?;
        let alloc = Arc::clone(&self.alloc);
        let alloc = alloc.as_ref();

        for array in &self.arrays {
            array.release_payloads(alloc);
        }
        for map in &self.maps {
            map.release_payloads(alloc);
        }
        for array in &mut self.arrays {
            array.release_storage(alloc);
        }
        for map in &mut self.maps {
            map.release_values(alloc);
            map.release_names(alloc);
        }

        if self.arrays_cap > 0 {
            alloc.free(self.arrays_cap * std::mem::size_of::<Array>());
        }
        if self.maps_cap > 0 {
            alloc.free(self.maps_cap * std::mem::size_of::<Map>());
        }
        debug!(
            arrays = self.arrays.len(),
            maps = self.maps.len(),
            "deinit document"
        );
        self.arrays = Vec::new();
        self.arrays_cap = 0;
        self.maps = Vec::new();
        self.maps_cap = 0;
        self.initialized = false;
        Ok(())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("maps", &self.maps)
            .field("arrays", &self.arrays)
            .field("initialized", &self.initialized)
            .finish()
    }
}

impl Drop for Document {
    fn drop(&mut self) {
        if self.initialized {
            let _ = self.deinit();
        }
    }
}
