//! Borrowed, resolved views into a [`Document`].
//!
//! Stored values refer to nested aggregates by index. The types in this module
//! pair those indices with the document that owns them, so nested data can be
//! walked without looking anything up by hand:
//!
//! - [`MapView`]: a map plus its document
//! - [`ArrayView`]: an array plus its document
//! - [`Item`]: a resolved value, or [`Item::None`] for a missing position
//!
//! All three implement [`serde::Serialize`], so a parsed document can be
//! exported through any serde data format.
//!
//! ## Examples
//!
//! ```rust
//! use nvf::{Document, Item, Tag};
//!
//! let mut doc = Document::new();
//! doc.parse("a [1 [2 3]]").unwrap();
//!
//! let array = doc.get_array(&["a"]).unwrap();
//! let nested = array.get(1).as_array().unwrap();
//! assert_eq!(nested.get(0), Item::Int(2));
//! assert_eq!(nested.get(9).tag(), Tag::None);
//! ```

use crate::array::Array;
use crate::document::Document;
use crate::map::Map;
use crate::value::{Tag, Value};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::fmt;

pub(crate) static EMPTY_MAP: Map = Map::empty();

/// A resolved value borrowed from a document.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Item<'a> {
    /// No value: returned for positions past the end of an array.
    None,
    Int(i64),
    Float(f64),
    String(&'a [u8]),
    Blob(&'a [u8]),
    Map(MapView<'a>),
    Array(ArrayView<'a>),
}

impl<'a> Item<'a> {
    pub(crate) fn resolve(doc: &'a Document, value: &'a Value) -> Self {
        match value {
            Value::Int(n) => Item::Int(*n),
            Value::Float(n) => Item::Float(*n),
            Value::String(s) => Item::String(s),
            Value::Blob(b) => Item::Blob(b.as_bytes()),
            Value::Map(index) => doc
                .maps
                .get(*index)
                .map_or(Item::None, |map| Item::Map(MapView::new(doc, map, *index))),
            Value::Array(index) => doc
                .arrays
                .get(*index)
                .map_or(Item::None, |array| {
                    Item::Array(ArrayView::new(doc, array, *index))
                }),
        }
    }

    #[must_use]
    pub const fn tag(&self) -> Tag {
        match self {
            Item::None => Tag::None,
            Item::Int(_) => Tag::Int,
            Item::Float(_) => Tag::Float,
            Item::String(_) => Tag::String,
            Item::Blob(_) => Tag::Blob,
            Item::Map(_) => Tag::Map,
            Item::Array(_) => Tag::Array,
        }
    }

    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Item::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Item::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns string or blob bytes.
    pub fn as_bytes(&self) -> Option<&'a [u8]> {
        match self {
            Item::String(s) | Item::Blob(s) => Some(*s),
            _ => None,
        }
    }

    /// Returns the string as UTF-8 text, if it is a string and valid UTF-8.
    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            Item::String(s) => std::str::from_utf8(*s).ok(),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<MapView<'a>> {
        match self {
            Item::Map(m) => Some(*m),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<ArrayView<'a>> {
        match self {
            Item::Array(a) => Some(*a),
            _ => None,
        }
    }
}

/// A map together with the document that owns it.
#[derive(Clone, Copy)]
pub struct MapView<'a> {
    doc: &'a Document,
    map: &'a Map,
    index: usize,
}

impl<'a> MapView<'a> {
    pub(crate) fn new(doc: &'a Document, map: &'a Map, index: usize) -> Self {
        MapView { doc, map, index }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub(crate) fn map(&self) -> &'a Map {
        self.map
    }

    /// Looks up `name`, returning [`Item::None`] when it is absent.
    pub fn get(&self, name: &str) -> Item<'a> {
        self.map
            .get(name.as_bytes())
            .map_or(Item::None, |value| Item::resolve(self.doc, value))
    }

    /// Iterates over `(name, item)` pairs in insertion order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&'a [u8], Item<'a>)> + 'a {
        let doc = self.doc;
        let map = self.map;
        map.names()
            .zip(map.array().values())
            .map(move |(name, value)| (name, Item::resolve(doc, value)))
    }
}

impl PartialEq for MapView<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.index == other.index
    }
}

impl fmt::Debug for MapView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.iter()
                    .map(|(name, item)| (String::from_utf8_lossy(name), item)),
            )
            .finish()
    }
}

/// An array together with the document that owns it.
#[derive(Clone, Copy)]
pub struct ArrayView<'a> {
    doc: &'a Document,
    array: &'a Array,
    index: usize,
}

impl<'a> ArrayView<'a> {
    pub(crate) fn new(doc: &'a Document, array: &'a Array, index: usize) -> Self {
        ArrayView { doc, array, index }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.array.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }

    /// Returns the item at `position`, or [`Item::None`] past the end.
    ///
    /// Never fails, so callers can iterate until they see `Item::None`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use nvf::{Document, Item};
    ///
    /// let mut doc = Document::new();
    /// doc.parse("a [1 2 3]").unwrap();
    /// let array = doc.get_array(&["a"]).unwrap();
    ///
    /// let mut sum = 0;
    /// let mut i = 0;
    /// while let Item::Int(n) = array.get(i) {
    ///     sum += n;
    ///     i += 1;
    /// }
    /// assert_eq!(sum, 6);
    /// ```
    pub fn get(&self, position: usize) -> Item<'a> {
        self.array
            .get(position)
            .map_or(Item::None, |value| Item::resolve(self.doc, value))
    }

    /// Iterates over the items in order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = Item<'a>> + 'a {
        let doc = self.doc;
        let array = self.array;
        array
            .values()
            .iter()
            .map(move |value| Item::resolve(doc, value))
    }
}

impl PartialEq for ArrayView<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.index == other.index
    }
}

impl fmt::Debug for ArrayView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl Serialize for Item<'_> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Item::None => serializer.serialize_unit(),
            Item::Int(n) => serializer.serialize_i64(*n),
            Item::Float(n) => serializer.serialize_f64(*n),
            Item::String(s) => match std::str::from_utf8(s) {
                Ok(text) => serializer.serialize_str(text),
                Err(_) => serializer.serialize_bytes(s),
            },
            Item::Blob(b) => serializer.serialize_bytes(b),
            Item::Map(m) => m.serialize(serializer),
            Item::Array(a) => a.serialize(serializer),
        }
    }
}

impl Serialize for MapView<'_> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, item) in self.iter() {
            map.serialize_entry(&String::from_utf8_lossy(name), &item)?;
        }
        map.end()
    }
}

impl Serialize for ArrayView<'_> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for item in self.iter() {
            seq.serialize_element(&item)?;
        }
        seq.end()
    }
}

impl Serialize for Document {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.root()
            .map_err(<S::Error as serde::ser::Error>::custom)?
            .serialize(serializer)
    }
}
