//! Path-based lookups on a parsed [`Document`].
//!
//! A path is a slice of names. Every segment except the last must name a map;
//! the last segment names the value being requested. An empty path passed to
//! [`Document::get_map`] denotes the root map.
//!
//! Typed getters check the stored tag and fail with
//! [`ErrorCode::BadValueType`](crate::ErrorCode::BadValueType) on a mismatch.
//! String and blob getters come in two forms: `*_into` copies into a caller
//! buffer and reports the required size when it is too small, and the plain
//! form returns a [`Buffer`] charged to the document's allocator.
//!
//! ## Examples
//!
//! ```rust
//! use nvf::{Document, ErrorCode};
//!
//! let mut doc = Document::new();
//! doc.parse("server { port 8080 name \"edge\" }").unwrap();
//!
//! assert_eq!(doc.get_int(&["server", "port"]).unwrap(), 8080);
//!
//! let mut small = [0u8; 2];
//! let err = doc.get_str_into(&["server", "name"], &mut small).unwrap_err();
//! assert_eq!(err.code(), ErrorCode::BufferOverflow);
//! assert_eq!(err.required_len(), Some(4));
//!
//! let mut buf = vec![0u8; 4];
//! let n = doc.get_str_into(&["server", "name"], &mut buf).unwrap();
//! assert_eq!(&buf[..n], b"edge");
//! ```

use crate::alloc::Buffer;
use crate::document::{Document, ROOT_MAP};
use crate::value::{Tag, Value};
use crate::view::{ArrayView, Item, MapView, EMPTY_MAP};
use crate::{Error, Result};
use std::sync::Arc;

impl Document {
    /// Returns a view of the root map.
    ///
    /// A document that has not parsed anything yet has an empty root.
    pub fn root(&self) -> Result<MapView<'_>> {
        self.get_map(&[])
    }

    /// Walks `path` from the root, each segment naming a nested map.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if a segment is missing or does not name a map.
    pub fn get_map(&self, path: &[&str]) -> Result<MapView<'_>> {
        self.ensure_initialized()?;
        let Some(root) = self.maps.get(ROOT_MAP) else {
            return match path.first() {
                Some(segment) => Err(Error::not_found(segment)),
                None => Ok(MapView::new(self, &EMPTY_MAP, ROOT_MAP)),
            };
        };

        let mut index = ROOT_MAP;
        let mut map = root;
        for segment in path {
            match map.get(segment.as_bytes()) {
                Some(Value::Map(next)) => {
                    index = *next;
                    map = self
                        .maps
                        .get(index)
                        .ok_or_else(|| Error::not_found(segment))?;
                }
                _ => return Err(Error::not_found(segment)),
            }
        }
        Ok(MapView::new(self, map, index))
    }

    /// Resolves `path` to a stored value of type `tag`.
    ///
    /// # Errors
    ///
    /// - [`Error::BadArgument`] for an empty path
    /// - [`Error::NotFound`] if any segment is missing
    /// - [`Error::TypeMismatch`] if the value has a different type
    pub fn get_value(&self, path: &[&str], tag: Tag) -> Result<&Value> {
        let value = self.lookup(path)?;
        if value.tag() != tag {
            return Err(Error::type_mismatch(tag, value.tag()));
        }
        Ok(value)
    }

    /// Resolves `path` to an [`Item`] of whatever type is stored there.
    pub fn get(&self, path: &[&str]) -> Result<Item<'_>> {
        let value = self.lookup(path)?;
        Ok(Item::resolve(self, value))
    }

    fn lookup(&self, path: &[&str]) -> Result<&Value> {
        let (last, prefix) = path
            .split_last()
            .ok_or_else(|| Error::bad_argument("path must name at least one entry"))?;
        let parent = self.get_map(prefix)?;
        parent
            .map()
            .get(last.as_bytes())
            .ok_or_else(|| Error::not_found(last))
    }

    pub fn get_int(&self, path: &[&str]) -> Result<i64> {
        match self.get_value(path, Tag::Int)? {
            Value::Int(n) => Ok(*n),
            other => Err(Error::type_mismatch(Tag::Int, other.tag())),
        }
    }

    pub fn get_float(&self, path: &[&str]) -> Result<f64> {
        match self.get_value(path, Tag::Float)? {
            Value::Float(n) => Ok(*n),
            other => Err(Error::type_mismatch(Tag::Float, other.tag())),
        }
    }

    /// Copies the string at `path` into `out` and returns its length.
    ///
    /// # Errors
    ///
    /// [`Error::BufferOverflow`] carrying the required length when `out` is
    /// too small; `out` is left untouched in that case.
    pub fn get_str_into(&self, path: &[&str], out: &mut [u8]) -> Result<usize> {
        copy_into(self.payload(path, Tag::String)?, out)
    }

    /// Copies the blob at `path` into `out` and returns its length.
    pub fn get_blob_into(&self, path: &[&str], out: &mut [u8]) -> Result<usize> {
        copy_into(self.payload(path, Tag::Blob)?, out)
    }

    /// Returns a copy of the string at `path`, charged to this document's
    /// allocator.
    pub fn get_str(&self, path: &[&str]) -> Result<Buffer> {
        let bytes = self.payload(path, Tag::String)?;
        Buffer::copy_exact(Arc::clone(self.allocator()), bytes)
    }

    /// Returns a copy of the blob at `path`, charged to this document's
    /// allocator.
    pub fn get_blob(&self, path: &[&str]) -> Result<Buffer> {
        let bytes = self.payload(path, Tag::Blob)?;
        Buffer::copy_exact(Arc::clone(self.allocator()), bytes)
    }

    fn payload(&self, path: &[&str], tag: Tag) -> Result<&[u8]> {
        self.get_value(path, tag)?
            .as_bytes()
            .ok_or_else(|| Error::type_mismatch(tag, Tag::None))
    }

    /// Returns a view of the array at `path`.
    pub fn get_array(&self, path: &[&str]) -> Result<ArrayView<'_>> {
        match self.get_value(path, Tag::Array)? {
            Value::Array(index) => self.array(*index),
            other => Err(Error::type_mismatch(Tag::Array, other.tag())),
        }
    }

    /// Returns a view of the array stored at `index` in the array table.
    pub fn array(&self, index: usize) -> Result<ArrayView<'_>> {
        self.ensure_initialized()?;
        self.arrays
            .get(index)
            .map(|array| ArrayView::new(self, array, index))
            .ok_or_else(|| Error::NotFound(format!("array #{index}")))
    }

    /// Returns a view of the map stored at `index` in the map table.
    pub fn map(&self, index: usize) -> Result<MapView<'_>> {
        self.ensure_initialized()?;
        self.maps
            .get(index)
            .map(|map| MapView::new(self, map, index))
            .ok_or_else(|| Error::NotFound(format!("map #{index}")))
    }
}

fn copy_into(bytes: &[u8], out: &mut [u8]) -> Result<usize> {
    if out.len() < bytes.len() {
        return Err(Error::BufferOverflow {
            required: bytes.len(),
        });
    }
    out[..bytes.len()].copy_from_slice(bytes);
    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;

    fn parsed(input: &str) -> Document {
        let mut doc = Document::new();
        doc.parse(input).unwrap();
        doc
    }

    #[test]
    fn test_typed_getters() {
        let doc = parsed("i -7 f 2.5 s \"hey\" b bx00ff m { n 1 } a [1 2]");
        assert_eq!(doc.get_int(&["i"]).unwrap(), -7);
        assert_eq!(doc.get_float(&["f"]).unwrap(), 2.5);
        assert_eq!(doc.get_str(&["s"]).unwrap().as_bytes(), b"hey");
        assert_eq!(doc.get_blob(&["b"]).unwrap().as_bytes(), &[0x00, 0xff]);
        assert_eq!(doc.get_int(&["m", "n"]).unwrap(), 1);
        assert_eq!(doc.get_array(&["a"]).unwrap().len(), 2);
    }

    #[test]
    fn test_wrong_type_is_bad_value_type() {
        let doc = parsed("f 2.5");
        let err = doc.get_int(&["f"]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::BadValueType);
        assert_eq!(err, Error::type_mismatch(Tag::Int, Tag::Float));
    }

    #[test]
    fn test_missing_and_non_map_segments() {
        let doc = parsed("m { x 1 } y 2");
        assert_eq!(doc.get_int(&["m", "z"]).unwrap_err().code(), ErrorCode::NotFound);
        assert_eq!(doc.get_int(&["q", "x"]).unwrap_err().code(), ErrorCode::NotFound);
        assert_eq!(doc.get_int(&["y", "x"]).unwrap_err().code(), ErrorCode::NotFound);
        assert_eq!(doc.get_map(&["y"]).unwrap_err().code(), ErrorCode::NotFound);
    }

    #[test]
    fn test_empty_path() {
        let doc = parsed("x 1");
        assert_eq!(doc.get_int(&[]).unwrap_err().code(), ErrorCode::BadArgument);
        assert_eq!(doc.get_map(&[]).unwrap().len(), 1);
    }

    #[test]
    fn test_unparsed_document() {
        let doc = Document::new();
        assert!(doc.root().unwrap().is_empty());
        assert_eq!(doc.get_int(&["x"]).unwrap_err().code(), ErrorCode::NotFound);
    }

    #[test]
    fn test_blob_into_exact_fit() {
        let doc = parsed("b bx010203");
        let mut out = [0u8; 3];
        assert_eq!(doc.get_blob_into(&["b"], &mut out).unwrap(), 3);
        assert_eq!(out, [1, 2, 3]);

        let mut short = [9u8; 2];
        let err = doc.get_blob_into(&["b"], &mut short).unwrap_err();
        assert_eq!(err, Error::BufferOverflow { required: 3 });
        assert_eq!(short, [9, 9]);
    }

    #[test]
    fn test_table_access_by_index() {
        let doc = parsed("a [1] m { }");
        assert_eq!(doc.array(0).unwrap().get(0), Item::Int(1));
        assert!(doc.map(1).unwrap().is_empty());
        assert_eq!(doc.array(5).unwrap_err().code(), ErrorCode::NotFound);
    }

    #[test]
    fn test_queries_after_deinit() {
        let mut doc = parsed("x 1");
        doc.deinit().unwrap();
        assert_eq!(doc.get_int(&["x"]).unwrap_err().code(), ErrorCode::NotInitialized);
        assert_eq!(doc.root().unwrap_err().code(), ErrorCode::NotInitialized);
    }
}
