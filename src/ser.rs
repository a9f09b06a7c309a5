//! NVF rendering.
//!
//! [`render`] turns a [`Document`] back into NVF text that parses to an
//! equivalent document.
//!
//! ## Layout
//!
//! - The root map is written without braces, one `name value` entry per line.
//! - A nested map is written as `name {`, its entries one level deeper, then
//!   `}` on its own line.
//! - Arrays are written as `[`, one element per line one level deeper, then
//!   `]`.
//! - Strings are quoted with `"`, `\`, newline, tab and carriage return
//!   escaped. Blobs are `bx` plus lowercase hex. Floats always carry a
//!   fractional part or an exponent so they read back as floats.
//!
//! The output buffer is charged to the document's allocator. If the allocator
//! refuses to grow it, the partial output is released and
//! [`Error::BadAlloc`](crate::Error::BadAlloc) is returned.
//!
//! ## Usage
//!
//! ```rust
//! use nvf::{render, Document, RenderOptions};
//!
//! let mut doc = Document::new();
//! doc.parse("a [1 2] m { s \"x\" }").unwrap();
//!
//! let text = render(&doc, &RenderOptions::default()).unwrap();
//! assert_eq!(text.as_str().unwrap(), "a [\n\t1\n\t2\n]\nm {\n\ts \"x\"\n}\n");
//! ```

use crate::alloc::Buffer;
use crate::array::Array;
use crate::document::Document;
use crate::map::Map;
use crate::options::RenderOptions;
use crate::value::Value;
use crate::{Error, Result};
use std::sync::Arc;
use tracing::debug;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Renders `doc` as NVF text into a buffer charged to its allocator.
///
/// # Errors
///
/// - [`Error::NotInitialized`] if the document has been deinited
/// - [`Error::BadAlloc`] if the allocator refuses the output buffer
pub fn render(doc: &Document, options: &RenderOptions) -> Result<Buffer> {
    doc.ensure_initialized()?;
    let mut renderer = Renderer {
        doc,
        out: Buffer::new(Arc::clone(doc.allocator())),
        indent: options.indent.unit(),
    };
    if let Some(root) = doc.maps.first() {
        renderer.write_map_entries(root, 0)?;
    }
    debug!(len = renderer.out.len(), "rendered document");
    Ok(renderer.out)
}

struct Renderer<'a> {
    doc: &'a Document,
    out: Buffer,
    indent: String,
}

impl Renderer<'_> {
    #[inline]
    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.out.extend(data)
    }

    fn write_indent(&mut self, depth: usize) -> Result<()> {
        for _ in 0..depth {
            self.out.extend(self.indent.as_bytes())?;
        }
        Ok(())
    }

    fn write_map_entries(&mut self, map: &Map, depth: usize) -> Result<()> {
        for (name, value) in map.names().zip(map.array().values()) {
            self.write_indent(depth)?;
            self.write(name)?;
            self.write(b" ")?;
            self.write_value(value, depth)?;
            self.write(b"\n")?;
        }
        Ok(())
    }

    fn write_array_entries(&mut self, array: &Array, depth: usize) -> Result<()> {
        for value in array.values() {
            self.write_indent(depth)?;
            self.write_value(value, depth)?;
            self.write(b"\n")?;
        }
        Ok(())
    }

    fn write_value(&mut self, value: &Value, depth: usize) -> Result<()> {
        match value {
            Value::Int(n) => self.write(n.to_string().as_bytes()),
            Value::Float(n) => self.write(format_float(*n).as_bytes()),
            Value::String(s) => self.write_string(s),
            Value::Blob(b) => self.write_blob(b.as_bytes()),
            Value::Map(index) => {
                let doc = self.doc;
                let map = doc
                    .maps
                    .get(*index)
                    .ok_or_else(|| Error::custom(format!("dangling map index {index}")))?;
                self.write(b"{\n")?;
                self.write_map_entries(map, depth + 1)?;
                self.write_indent(depth)?;
                self.write(b"}")
            }
            Value::Array(index) => {
                let doc = self.doc;
                let array = doc
                    .arrays
                    .get(*index)
                    .ok_or_else(|| Error::custom(format!("dangling array index {index}")))?;
                self.write(b"[\n")?;
                self.write_array_entries(array, depth + 1)?;
                self.write_indent(depth)?;
                self.write(b"]")
            }
        }
    }

    fn write_string(&mut self, s: &[u8]) -> Result<()> {
        self.write(b"\"")?;
        let mut start = 0;
        for (i, &b) in s.iter().enumerate() {
            let escaped: &[u8] = match b {
                b'"' => b"\\\"",
                b'\\' => b"\\\\",
                b'\n' => b"\\n",
                b'\t' => b"\\t",
                b'\r' => b"\\r",
                _ => continue,
            };
            self.write(&s[start..i])?;
            self.write(escaped)?;
            start = i + 1;
        }
        self.write(&s[start..])?;
        self.write(b"\"")
    }

    fn write_blob(&mut self, data: &[u8]) -> Result<()> {
        self.write(b"bx")?;
        let mut pair = [0u8; 2];
        for &b in data {
            pair[0] = HEX_DIGITS[usize::from(b >> 4)];
            pair[1] = HEX_DIGITS[usize::from(b & 0x0f)];
            self.write(&pair)?;
        }
        Ok(())
    }
}

/// Formats a float so that it parses back as a float, never as an integer.
fn format_float(n: f64) -> String {
    // Debug output keeps a `.0` on integral values and switches to an
    // exponent for very large or small magnitudes.
    format!("{n:?}")
}
