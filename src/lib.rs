//! # nvf
//!
//! A parser, query engine and renderer for NVF (Name Value Format), a small
//! text configuration format of named values, nested maps and arrays.
//!
//! ## What is NVF?
//!
//! NVF is a whitespace-separated format for configuration and settings files.
//! Each entry is a name followed by a value; values can be integers, floats,
//! strings, binary blobs, maps or arrays:
//!
//! ```text
//! title "example"
//! retries 3
//! backoff 1.5
//! server { host "localhost" port 8080 }
//! ```
//!
//! Integers accept `0x` hex and leading-`0` octal; blobs are `bx` plus hex
//! digits; adjacent quoted strings join into one; `#` starts a line comment
//! and `#[ ... ]#` a block comment. Maps cannot appear inside arrays.
//!
//! ## Key Features
//!
//! - **Allocator-aware**: every byte a [`Document`] holds is admitted through a
//!   pluggable [`Allocator`], and [`Document::deinit`] releases all of it
//! - **Path queries**: typed getters resolve `&["server", "port"]` style paths
//! - **Probe-then-retry**: `*_into` getters report the size a caller buffer
//!   needs when it is too small
//! - **Round trip**: [`render`] writes text that parses back to the same tree
//! - **Serde export**: a parsed document implements [`serde::Serialize`]
//! - **No Unsafe Code**: written entirely in safe Rust
//!
//! ## Quick Start
//!
//! ```rust
//! use nvf::Document;
//!
//! let mut doc = Document::new();
//! doc.parse("server { host \"localhost\" port 8080 }").unwrap();
//!
//! assert_eq!(doc.get_int(&["server", "port"]).unwrap(), 8080);
//! let host = doc.get_str(&["server", "host"]).unwrap();
//! assert_eq!(host.as_str().unwrap(), "localhost");
//! ```
//!
//! ### Iterating Arrays
//!
//! ```rust
//! use nvf::{from_str, Item};
//!
//! let doc = from_str("ports [80 443 8080]").unwrap();
//! let ports = doc.get_array(&["ports"]).unwrap();
//! let total: i64 = ports.iter().filter_map(|item| item.as_i64()).sum();
//! assert_eq!(total, 8603);
//! assert_eq!(ports.get(3), Item::None);
//! ```
//!
//! ### Tracking Memory
//!
//! ```rust
//! use nvf::{Document, TrackingAllocator};
//! use std::sync::Arc;
//!
//! let tracker = Arc::new(TrackingAllocator::new());
//! let mut doc = Document::with_allocator(tracker.clone());
//! doc.parse("a [1 2 3] s \"text\"").unwrap();
//! assert!(tracker.live_bytes() > 0);
//!
//! doc.deinit().unwrap();
//! assert_eq!(tracker.live_bytes(), 0);
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`Result`]. Match on [`Error::code`] for
//! the category of failure; parse errors additionally carry the offset, line
//! and column where parsing stopped.
//!
//! ## Logging
//!
//! Parsing, rendering and deinit emit [`tracing`] events at `debug` and
//! `trace` level. The crate never installs a subscriber.

pub mod alloc;
pub mod array;
pub mod de;
pub mod document;
pub mod error;
mod lexer;
pub mod map;
pub mod options;
mod query;
pub mod ser;
pub mod value;
pub mod view;

pub use alloc::{AllocError, Allocator, Buffer, SystemAllocator, TrackingAllocator};
pub use array::Array;
pub use document::Document;
pub use error::{Error, ErrorCode, Result};
pub use map::Map;
pub use options::{Indent, ParseOptions, RenderOptions, DEFAULT_MAX_DEPTH};
pub use ser::render;
pub use value::{Blob, Tag, Value};
pub use view::{ArrayView, Item, MapView};

use std::io;

/// Parse NVF text into a new [`Document`].
///
/// # Examples
///
/// ```rust
/// use nvf::from_str;
///
/// let doc = from_str("x 1 y 2.5").unwrap();
/// assert_eq!(doc.get_int(&["x"]).unwrap(), 1);
/// assert_eq!(doc.get_float(&["y"]).unwrap(), 2.5);
/// ```
///
/// # Errors
///
/// Returns [`Error::Parse`] if the text is not valid NVF.
pub fn from_str(s: &str) -> Result<Document> {
    from_slice(s.as_bytes())
}

/// Parse NVF bytes into a new [`Document`].
///
/// NVF is byte-oriented, so the input need not be valid UTF-8.
///
/// # Errors
///
/// Returns [`Error::Parse`] if the bytes are not valid NVF.
pub fn from_slice(v: &[u8]) -> Result<Document> {
    let mut doc = Document::new();
    doc.parse(v)?;
    Ok(doc)
}

/// Read NVF from an `io::Read` source into a new [`Document`].
///
/// # Examples
///
/// ```rust
/// use nvf::from_reader;
/// use std::io::Cursor;
///
/// let doc = from_reader(Cursor::new("n 7")).unwrap();
/// assert_eq!(doc.get_int(&["n"]).unwrap(), 7);
/// ```
///
/// # Errors
///
/// Returns an error if reading fails or the input is not valid NVF.
pub fn from_reader<R>(mut reader: R) -> Result<Document>
where
    R: io::Read,
{
    let mut buf = Vec::new();
    reader
        .read_to_end(&mut buf)
        .map_err(|e| Error::custom(e.to_string()))?;
    from_slice(&buf)
}

/// Render a [`Document`] as an NVF string with default options.
///
/// # Examples
///
/// ```rust
/// use nvf::{from_str, to_string};
///
/// let doc = from_str("m { x 1 }").unwrap();
/// assert_eq!(to_string(&doc).unwrap(), "m {\n\tx 1\n}\n");
/// ```
///
/// # Errors
///
/// Returns [`Error::BadAlloc`] if the allocator refuses the output, or
/// [`Error::BadData`] if a string or name is not valid UTF-8.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string(doc: &Document) -> Result<String> {
    to_string_with_options(doc, &RenderOptions::default())
}

/// Render a [`Document`] as an NVF string with custom options.
///
/// # Errors
///
/// See [`to_string`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_with_options(doc: &Document, options: &RenderOptions) -> Result<String> {
    let buffer = render(doc, options)?;
    String::from_utf8(buffer.into_vec()).map_err(|e| Error::BadData(e.to_string()))
}

/// Render a [`Document`] into an `io::Write` sink.
///
/// # Errors
///
/// Returns an error if rendering or writing fails.
pub fn to_writer<W>(mut writer: W, doc: &Document) -> Result<()>
where
    W: io::Write,
{
    let buffer = render(doc, &RenderOptions::default())?;
    writer
        .write_all(&buffer)
        .map_err(|e| Error::custom(e.to_string()))
}
