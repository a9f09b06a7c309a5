//! NVF parsing.
//!
//! This module implements a recursive-descent parser that reads NVF text from
//! a byte buffer and appends what it finds to a [`Document`].
//!
//! ## Overview
//!
//! - **One call per aggregate**: each scope (the implicit root map, every
//!   `{ ... }` and every `[ ... ]`) is parsed by one call, and nested
//!   aggregates recurse.
//! - **Index-based**: scopes are addressed by their index in the document's
//!   tables. Nothing borrowed from a table is held across a call that could
//!   grow it.
//! - **Resumable**: [`Document::parse`] returns the offset where parsing
//!   stopped, and parsing another buffer into the same document keeps adding
//!   entries to its root map.
//!
//! ## Usage
//!
//! ```rust
//! use nvf::Document;
//!
//! let mut doc = Document::new();
//! doc.parse("a [1 2 3]").unwrap();
//! doc.parse("b bx0a0b").unwrap();
//! assert_eq!(doc.get_array(&["a"]).unwrap().len(), 3);
//! assert_eq!(&*doc.get_blob(&["b"]).unwrap(), &[0x0a, 0x0b][..]);
//! ```

use crate::document::Document;
use crate::lexer::{is_delimiter, skip_trivia};
use crate::options::ParseOptions;
use crate::value::{Blob, Value};
use crate::{Error, Result};
use memchr::memchr2;
use tracing::{debug, trace};

/// The kind of aggregate a scope populates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ScopeKind {
    Map,
    Array,
}

impl ScopeKind {
    const fn as_str(self) -> &'static str {
        match self {
            ScopeKind::Map => "map",
            ScopeKind::Array => "array",
        }
    }
}

impl Document {
    /// Parses NVF text into this document with default [`ParseOptions`].
    ///
    /// Entries are appended to the root map. On success the offset where
    /// parsing stopped is returned; this is the input length unless a stray
    /// `]` ended the root scope early.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] wrapping the underlying error together with
    /// the offset, line and column where parsing stopped. Entries parsed
    /// before the failure stay in the document.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use nvf::{Document, ErrorCode};
    ///
    /// let mut doc = Document::new();
    /// assert_eq!(doc.parse("x 5").unwrap(), 3);
    ///
    /// let err = doc.parse("y }").unwrap_err();
    /// assert_eq!(err.code(), ErrorCode::BadValueType);
    /// ```
    pub fn parse<B>(&mut self, input: &B) -> Result<usize>
    where
        B: AsRef<[u8]> + ?Sized,
    {
        self.parse_with_options(input, &ParseOptions::default())
    }

    /// Parses NVF text into this document with custom options.
    ///
    /// # Errors
    ///
    /// See [`Document::parse`].
    pub fn parse_with_options<B>(&mut self, input: &B, options: &ParseOptions) -> Result<usize>
    where
        B: AsRef<[u8]> + ?Sized,
    {
        let input = input.as_ref();
        self.ensure_initialized().map_err(|e| e.at(input, 0))?;
        let root = self.root_index().map_err(|e| e.at(input, 0))?;

        debug!(len = input.len(), max_depth = options.max_depth, "parse start");
        let mut parser = Parser::new(input, options);
        match parser.parse_scope(self, root, ScopeKind::Map, 0) {
            Ok(()) => {
                debug!(offset = parser.pos, "parse finished");
                Ok(parser.pos)
            }
            Err(e) => {
                let e = e.at(input, parser.pos);
                debug!(error = %e, "parse failed");
                Err(e)
            }
        }
    }
}

/// Parser state for one input buffer.
pub(crate) struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
    max_depth: usize,
    scratch: Vec<u8>,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(input: &'a [u8], options: &ParseOptions) -> Self {
        Parser {
            input,
            pos: 0,
            max_depth: options.max_depth,
            scratch: Vec::new(),
        }
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Parses the direct children of the aggregate at `target`.
    ///
    /// Returns after consuming a closing token or reaching end of input.
    pub(crate) fn parse_scope(
        &mut self,
        doc: &mut Document,
        target: usize,
        kind: ScopeKind,
        depth: usize,
    ) -> Result<()> {
        trace!(index = target, kind = kind.as_str(), depth, "enter scope");
        loop {
            self.pos = skip_trivia(self.input, self.pos);
            let Some(byte) = self.peek() else {
                return Ok(());
            };

            if byte == b'}' || byte == b']' {
                if byte == b'}' && depth == 0 && kind == ScopeKind::Map {
                    return Err(Error::UnmatchedBrace('}'));
                }
                self.pos += 1;
                return Ok(());
            }

            let name = match kind {
                ScopeKind::Map => Some(self.parse_name(doc, target)?),
                ScopeKind::Array => None,
            };

            self.pos = skip_trivia(self.input, self.pos);
            let value = self.parse_value(doc, kind, depth)?;

            // `doc` may have grown during parse_value; only indices are reused here.
            match name {
                Some((start, end)) => {
                    doc.push_map_entry(target, &self.input[start..end], value)?;
                }
                None => doc.push_array_entry(target, value)?,
            }
        }
    }

    /// Scans a name and checks it against the names already in the map.
    fn parse_name(&mut self, doc: &Document, map: usize) -> Result<(usize, usize)> {
        let start = self.pos;
        let len = self.input[start..]
            .iter()
            .position(|&b| b.is_ascii_whitespace() || b == b'{' || b == b'[')
            .unwrap_or(self.input.len() - start);
        if len == 0 {
            return Err(Error::bad_data("expected a name before the value"));
        }
        let end = start + len;
        let name = &self.input[start..end];
        if doc.maps[map].contains(name) {
            return Err(Error::duplicate_name(name));
        }
        self.pos = end;
        Ok((start, end))
    }

    fn parse_value(&mut self, doc: &mut Document, kind: ScopeKind, depth: usize) -> Result<Value> {
        let Some(lead) = self.peek() else {
            return Err(Error::bad_format("expected a value, found end of input"));
        };
        match lead {
            b'0'..=b'9' | b'-' => self.parse_number(),
            b'"' => {
                self.parse_string()?;
                let bytes = doc.alloc_payload(&self.scratch)?;
                Ok(Value::String(bytes))
            }
            b'b' if self.input.get(self.pos + 1) == Some(&b'x') => {
                self.parse_blob()?;
                let bytes = doc.alloc_payload(&self.scratch)?;
                Ok(Value::Blob(Blob::from_boxed(bytes)))
            }
            b'{' if kind == ScopeKind::Map => self.parse_nested(doc, ScopeKind::Map, depth),
            b'[' => self.parse_nested(doc, ScopeKind::Array, depth),
            other => Err(Error::UnexpectedValue {
                found: other as char,
                scope: kind.as_str(),
            }),
        }
    }

    /// Allocates a slot for a nested aggregate and parses into it.
    fn parse_nested(&mut self, doc: &mut Document, kind: ScopeKind, depth: usize) -> Result<Value> {
        let depth = depth + 1;
        if depth > self.max_depth {
            return Err(Error::DepthExceeded {
                limit: self.max_depth,
            });
        }
        self.pos += 1;
        match kind {
            ScopeKind::Map => {
                let index = doc.new_map()?;
                self.parse_scope(doc, index, kind, depth)?;
                Ok(Value::Map(index))
            }
            ScopeKind::Array => {
                let index = doc.new_array()?;
                self.parse_scope(doc, index, kind, depth)?;
                Ok(Value::Array(index))
            }
        }
    }

    /// Parses an integer, falling back to a float when the integer span is
    /// followed by something other than a delimiter.
    ///
    /// The float reading ends wherever the float literal ends; whatever
    /// follows is left for the enclosing scope.
    fn parse_number(&mut self) -> Result<Value> {
        let start = self.pos;
        let int_end = scan_integer(self.input, start);
        if int_end > start && self.ends_token(int_end) {
            let value = parse_integer(&self.input[start..int_end])?;
            self.pos = int_end;
            return Ok(Value::Int(value));
        }

        let float_end = scan_float(self.input, start);
        if float_end == start {
            return Err(Error::bad_format("expected a number"));
        }
        let value = parse_float(&self.input[start..float_end])?;
        self.pos = float_end;
        Ok(Value::Float(value))
    }

    #[inline]
    fn ends_token(&self, pos: usize) -> bool {
        self.input.get(pos).map_or(true, |&b| is_delimiter(b))
    }

    /// Decodes a quoted string into `scratch`.
    ///
    /// Quoted segments separated only by trivia are concatenated.
    fn parse_string(&mut self) -> Result<()> {
        self.scratch.clear();
        loop {
            self.read_quoted()?;
            let next = skip_trivia(self.input, self.pos);
            if self.input.get(next) != Some(&b'"') {
                return Ok(());
            }
            self.pos = next;
        }
    }

    /// Reads one `"..."` segment, appending decoded bytes to `scratch`.
    fn read_quoted(&mut self) -> Result<()> {
        let open = self.pos;
        self.pos += 1;
        loop {
            let Some(i) = memchr2(b'"', b'\\', &self.input[self.pos..]) else {
                self.pos = open;
                return Err(Error::UnterminatedString);
            };
            self.scratch
                .extend_from_slice(&self.input[self.pos..self.pos + i]);
            self.pos += i;
            if self.input[self.pos] == b'"' {
                self.pos += 1;
                return Ok(());
            }
            let decoded = match self.input.get(self.pos + 1) {
                Some(b'n') => b'\n',
                Some(b't') => b'\t',
                Some(b'r') => b'\r',
                Some(b'"') => b'"',
                Some(b'\\') => b'\\',
                Some(&other) => {
                    return Err(Error::BadData(format!(
                        "unknown escape sequence '\\{}'",
                        other as char
                    )))
                }
                None => {
                    self.pos = open;
                    return Err(Error::UnterminatedString);
                }
            };
            self.scratch.push(decoded);
            self.pos += 2;
        }
    }

    /// Decodes `bx` followed by hex digits into `scratch`.
    ///
    /// An odd digit count pads the last byte with a zero low nibble.
    fn parse_blob(&mut self) -> Result<()> {
        let start = self.pos + 2;
        let end = self.input[start..]
            .iter()
            .position(|&b| is_delimiter(b))
            .map_or(self.input.len(), |i| start + i);
        if start == end {
            self.pos = start;
            return Err(Error::bad_format("blob needs at least one hex digit"));
        }

        self.scratch.clear();
        for (i, pair) in self.input[start..end].chunks(2).enumerate() {
            let mut nibbles = [0u8; 2];
            for (j, &digit) in pair.iter().enumerate() {
                match hex_value(digit) {
                    Some(v) => nibbles[j] = v,
                    None => {
                        self.pos = start + i * 2 + j;
                        return Err(Error::bad_format("invalid hex digit in blob"));
                    }
                }
            }
            self.scratch.push((nibbles[0] << 4) | nibbles[1]);
        }
        self.pos = end;
        Ok(())
    }
}

#[inline]
fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

fn count_while(input: &[u8], pos: usize, pred: impl Fn(u8) -> bool) -> usize {
    input[pos.min(input.len())..]
        .iter()
        .take_while(|&&b| pred(b))
        .count()
}

#[inline]
fn has_hex_prefix(input: &[u8], pos: usize) -> bool {
    input.get(pos) == Some(&b'0')
        && matches!(input.get(pos + 1), Some(b'x' | b'X'))
        && input.get(pos + 2).map_or(false, u8::is_ascii_hexdigit)
}

/// Returns the end of the integer literal starting at `start`, or `start`.
///
/// Accepts an optional `-`, then `0x` hex digits, `0` octal digits, or
/// decimal digits, matching C's base-0 integer conventions.
fn scan_integer(input: &[u8], start: usize) -> usize {
    let mut pos = start;
    if input.get(pos) == Some(&b'-') {
        pos += 1;
    }
    if has_hex_prefix(input, pos) {
        return pos + 2 + count_while(input, pos + 2, |b| b.is_ascii_hexdigit());
    }
    if input.get(pos) == Some(&b'0') {
        return pos + 1 + count_while(input, pos + 1, |b| (b'0'..=b'7').contains(&b));
    }
    let digits = count_while(input, pos, |b| b.is_ascii_digit());
    if digits == 0 {
        start
    } else {
        pos + digits
    }
}

/// Converts an integer literal found by [`scan_integer`], checking range.
fn parse_integer(literal: &[u8]) -> Result<i64> {
    let (negative, body) = match literal.split_first() {
        Some((b'-', rest)) => (true, rest),
        _ => (false, literal),
    };
    let (radix, digits) = if body.len() > 2 && matches!(body[1], b'x' | b'X') {
        (16, &body[2..])
    } else if body.len() > 1 && body[0] == b'0' {
        (8, &body[1..])
    } else {
        (10, body)
    };

    let mut magnitude: u64 = 0;
    for &d in digits {
        let digit = u64::from(hex_value(d).ok_or_else(|| Error::bad_format("invalid digit"))?);
        magnitude = magnitude
            .checked_mul(radix)
            .and_then(|m| m.checked_add(digit))
            .ok_or_else(|| Error::numeric_overflow(literal))?;
    }

    if negative {
        match magnitude {
            m if m == 1 << 63 => Ok(i64::MIN),
            m if m < 1 << 63 => Ok(-(m as i64)),
            _ => Err(Error::numeric_overflow(literal)),
        }
    } else {
        i64::try_from(magnitude).map_err(|_| Error::numeric_overflow(literal))
    }
}

/// Returns the end of the float literal starting at `start`, or `start`.
///
/// Decimal: `-? digits? (. digits?)? ([eE] [+-]? digits)?` with at least one
/// mantissa digit. Hex: `-? 0x hexdigits (. hexdigits?)? ([pP] [+-]? digits)?`.
fn scan_float(input: &[u8], start: usize) -> usize {
    let mut pos = start;
    if input.get(pos) == Some(&b'-') {
        pos += 1;
    }
    let hex = has_hex_prefix(input, pos);
    if hex {
        pos += 2;
    }
    let is_digit = |b: u8| {
        if hex {
            b.is_ascii_hexdigit()
        } else {
            b.is_ascii_digit()
        }
    };
    let exp_marks: &[u8] = if hex { b"pP" } else { b"eE" };

    let mut mantissa = count_while(input, pos, is_digit);
    pos += mantissa;
    if input.get(pos) == Some(&b'.') {
        let fraction = count_while(input, pos + 1, is_digit);
        if mantissa + fraction > 0 {
            pos += 1 + fraction;
            mantissa += fraction;
        }
    }
    if mantissa == 0 {
        return start;
    }

    if input.get(pos).map_or(false, |b| exp_marks.contains(b)) {
        let mut exp = pos + 1;
        if matches!(input.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let digits = count_while(input, exp, |b| b.is_ascii_digit());
        if digits > 0 {
            pos = exp + digits;
        }
    }
    pos
}

/// Converts a float literal found by [`scan_float`], rejecting infinities.
fn parse_float(literal: &[u8]) -> Result<f64> {
    let (negative, body) = match literal.split_first() {
        Some((b'-', rest)) => (true, rest),
        _ => (false, literal),
    };
    let value = if body.len() > 2 && matches!(body[1], b'x' | b'X') {
        parse_hex_float(&body[2..])
    } else {
        std::str::from_utf8(body)
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .ok_or_else(|| Error::bad_format("invalid float"))?
    };
    if !value.is_finite() {
        return Err(Error::numeric_overflow(literal));
    }
    Ok(if negative { -value } else { value })
}

/// Evaluates `hexdigits[.hexdigits][p[+-]digits]` (prefix and sign removed).
fn parse_hex_float(body: &[u8]) -> f64 {
    let (mantissa, exponent) = match body.iter().position(|&b| b == b'p' || b == b'P') {
        Some(p) => (&body[..p], Some(&body[p + 1..])),
        None => (body, None),
    };

    let mut value = 0.0_f64;
    let mut scale = 0_i32;
    let mut in_fraction = false;
    for &b in mantissa {
        match hex_value(b) {
            Some(digit) => {
                value = value * 16.0 + f64::from(digit);
                if in_fraction {
                    scale = scale.saturating_sub(4);
                }
            }
            None => in_fraction = true,
        }
    }

    if let Some(exponent) = exponent {
        // Out-of-range exponents saturate; the caller rejects the infinity.
        let exp = std::str::from_utf8(exponent)
            .ok()
            .and_then(|s| s.parse::<i32>().ok())
            .unwrap_or(if exponent.first() == Some(&b'-') {
                i32::MIN / 2
            } else {
                i32::MAX / 2
            });
        scale = scale.saturating_add(exp);
    }
    value * 2f64.powi(scale)
}
