//! Stored value representation for NVF documents.
//!
//! ## Core Types
//!
//! - [`Value`]: a closed enum over every storable value. Nested aggregates are
//!   stored as indices into the owning [`Document`](crate::Document)'s map and
//!   array tables, never as references, so the tables can be reallocated
//!   freely while a parse is appending to them.
//! - [`Tag`]: the type of a value, plus the [`Tag::None`] query sentinel.
//! - [`Blob`]: binary payload written as `bx` hex in text form.
//!
//! Borrowed, resolved views of values are provided by [`Item`](crate::Item).
//!
//! ## Examples
//!
//! ```rust
//! use nvf::{Tag, Value};
//!
//! let value = Value::Int(42);
//! assert_eq!(value.tag(), Tag::Int);
//! assert_eq!(value.as_i64(), Some(42));
//! assert_eq!(Tag::Blob.as_str(), "blob");
//! ```

use std::fmt;

/// The type of a value.
///
/// `None` never describes a stored value; it is returned by
/// [`ArrayView::get`](crate::ArrayView::get) for positions past the end.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tag {
    None,
    Float,
    Int,
    Blob,
    String,
    Map,
    Array,
}

impl Tag {
    /// Every tag, in declaration order.
    pub const ALL: [Tag; 7] = [
        Tag::None,
        Tag::Float,
        Tag::Int,
        Tag::Blob,
        Tag::String,
        Tag::Map,
        Tag::Array,
    ];

    /// Returns the display name of this tag.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Tag::None => "none",
            Tag::Float => "float",
            Tag::Int => "int",
            Tag::Blob => "blob",
            Tag::String => "string",
            Tag::Map => "map",
            Tag::Array => "array",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binary data, stored with its exact length.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Blob {
    data: Box<[u8]>,
}

impl Blob {
    pub(crate) fn from_boxed(data: Box<[u8]>) -> Self {
        Blob { data }
    }

    /// Length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("bx")?;
        for byte in self.data.iter() {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// A stored value.
///
/// The variant determines which payload is live, so the tag/value pairing
/// can never disagree.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    /// Decoded string bytes. Not required to be UTF-8.
    String(Box<[u8]>),
    Blob(Blob),
    /// Index into the document's map table.
    Map(usize),
    /// Index into the document's array table.
    Array(usize),
}

impl Value {
    /// Returns the tag for this value.
    #[must_use]
    pub const fn tag(&self) -> Tag {
        match self {
            Value::Int(_) => Tag::Int,
            Value::Float(_) => Tag::Float,
            Value::String(_) => Tag::String,
            Value::Blob(_) => Tag::Blob,
            Value::Map(_) => Tag::Map,
            Value::Array(_) => Tag::Array,
        }
    }

    #[inline]
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns string or blob bytes.
    #[inline]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::String(s) => Some(s),
            Value::Blob(b) => Some(b.as_bytes()),
            _ => None,
        }
    }

    /// Bytes of heap payload this value owns directly.
    pub(crate) fn payload_len(&self) -> usize {
        match self {
            Value::String(s) => s.len(),
            Value::Blob(b) => b.len(),
            _ => 0,
        }
    }
}
