//! Error types for NVF parsing, querying and rendering.
//!
//! Every fallible operation in this crate returns [`Result`]. Each [`Error`]
//! variant maps onto a stable [`ErrorCode`], which is what callers should match
//! on when they only care about the category of failure.
//!
//! ## Error Categories
//!
//! - **Usage**: bad arguments, operations on a deinited [`Document`](crate::Document)
//! - **Resource**: allocation refused, caller buffer too small
//! - **Format**: malformed literals, unexpected lead bytes, unmatched closing
//!   tokens, numeric overflow, excessive nesting
//! - **Lookup**: missing names, wrong value types, duplicate names
//!
//! ## Parse Errors
//!
//! Failures raised while parsing are wrapped in [`Error::Parse`], which records
//! the byte offset, line and column where the parser stopped. [`Error::code`]
//! looks through the wrapper:
//!
//! ```rust
//! use nvf::{Document, ErrorCode};
//!
//! let mut doc = Document::new();
//! let err = doc.parse(b"x 5\nx 6").unwrap_err();
//! assert_eq!(err.code(), ErrorCode::DuplicateName);
//! assert_eq!(err.offset(), Some(4));
//! ```

use crate::value::Tag;
use std::fmt;
use thiserror::Error;

/// Represents all possible errors produced by this crate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Unclassified internal error
    #[error("Error: {0}")]
    Generic(String),

    /// The allocator refused a request, or the system ran out of memory
    #[error("Allocation of {requested} bytes failed")]
    BadAlloc { requested: usize },

    /// A caller buffer is too small, or a string literal never terminates
    #[error("Buffer overflow: {required} bytes required")]
    BufferOverflow { required: usize },

    /// A string literal has no closing quote
    #[error("Unterminated string literal")]
    UnterminatedString,

    /// A numeric or blob literal is malformed
    #[error("Bad value format: {0}")]
    BadValueFormat(String),

    /// An argument is invalid for the requested operation
    #[error("Bad argument: {0}")]
    BadArgument(String),

    /// The input contains data that cannot be decoded
    #[error("Bad data: {0}")]
    BadData(String),

    /// The value at a path has a different type than requested
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: Tag, found: Tag },

    /// A value starts with a byte that does not begin any value type
    #[error("Unexpected value starting with {found:?} in {scope}")]
    UnexpectedValue { found: char, scope: &'static str },

    /// The document was never initialized or has been deinited
    #[error("Document is not initialized")]
    NotInitialized,

    /// A path segment does not name an entry
    #[error("Name not found: {0}")]
    NotFound(String),

    /// A name appears twice in one map
    #[error("Duplicate name: {0}")]
    DuplicateName(String),

    /// A closing token has no matching opening token
    #[error("Unmatched closing token '{0}'")]
    UnmatchedBrace(char),

    /// A numeric literal is outside the representable range
    #[error("Number too large to be represented: {0}")]
    NumericOverflow(String),

    /// Aggregates are nested deeper than the configured limit
    #[error("Nesting exceeds the maximum depth of {limit}")]
    DepthExceeded { limit: usize },

    /// A parse failure with its location in the input buffer
    #[error("{source} (line {line}, column {column}, offset {offset})")]
    Parse {
        offset: usize,
        line: usize,
        column: usize,
        source: Box<Error>,
    },
}

impl Error {
    /// Creates a type mismatch error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use nvf::{Error, ErrorCode, Tag};
    ///
    /// let err = Error::type_mismatch(Tag::Int, Tag::Float);
    /// assert_eq!(err.code(), ErrorCode::BadValueType);
    /// assert!(err.to_string().contains("expected int"));
    /// ```
    pub fn type_mismatch(expected: Tag, found: Tag) -> Self {
        Error::TypeMismatch { expected, found }
    }

    /// Creates a not-found error for a path segment.
    pub fn not_found(name: &str) -> Self {
        Error::NotFound(name.to_string())
    }

    /// Creates a duplicate-name error from raw name bytes.
    pub fn duplicate_name(name: &[u8]) -> Self {
        Error::DuplicateName(String::from_utf8_lossy(name).into_owned())
    }

    /// Creates a bad value format error.
    pub fn bad_format(msg: &str) -> Self {
        Error::BadValueFormat(msg.to_string())
    }

    /// Creates a bad data error.
    pub fn bad_data(msg: &str) -> Self {
        Error::BadData(msg.to_string())
    }

    /// Creates a bad argument error.
    pub fn bad_argument(msg: &str) -> Self {
        Error::BadArgument(msg.to_string())
    }

    /// Creates a numeric overflow error for the offending literal.
    pub fn numeric_overflow(literal: &[u8]) -> Self {
        Error::NumericOverflow(String::from_utf8_lossy(literal).into_owned())
    }

    /// Creates a generic error with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use nvf::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Generic(msg.to_string())
    }

    /// Wraps an error with the location where parsing stopped.
    ///
    /// Line and column are 1-based and computed from `input[..offset]`.
    pub(crate) fn at(self, input: &[u8], offset: usize) -> Self {
        let offset = offset.min(input.len());
        let consumed = &input[..offset];
        let line = memchr::memchr_iter(b'\n', consumed).count() + 1;
        let column = match memchr::memrchr(b'\n', consumed) {
            Some(nl) => offset - nl,
            None => offset + 1,
        };
        Error::Parse {
            offset,
            line,
            column,
            source: Box::new(self),
        }
    }

    /// Returns the stable code for this error, looking through parse locations.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Generic(_) => ErrorCode::Generic,
            Error::BadAlloc { .. } => ErrorCode::BadAlloc,
            Error::BufferOverflow { .. } | Error::UnterminatedString => ErrorCode::BufferOverflow,
            Error::BadValueFormat(_) => ErrorCode::BadValueFormat,
            Error::BadArgument(_) => ErrorCode::BadArgument,
            Error::BadData(_) => ErrorCode::BadData,
            Error::TypeMismatch { .. } | Error::UnexpectedValue { .. } => ErrorCode::BadValueType,
            Error::NotInitialized => ErrorCode::NotInitialized,
            Error::NotFound(_) => ErrorCode::NotFound,
            Error::DuplicateName(_) => ErrorCode::DuplicateName,
            Error::UnmatchedBrace(_) => ErrorCode::UnmatchedBrace,
            Error::NumericOverflow(_) => ErrorCode::NumericOverflow,
            Error::DepthExceeded { .. } => ErrorCode::DepthExceeded,
            Error::Parse { source, .. } => source.code(),
        }
    }

    /// Returns the byte offset where parsing stopped, for parse errors.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Error::Parse { offset, .. } => Some(*offset),
            _ => None,
        }
    }

    /// Returns the number of bytes a caller buffer needs, for buffer overflows.
    ///
    /// This supports the probe-then-retry pattern of the `*_into` getters.
    pub fn required_len(&self) -> Option<usize> {
        match self {
            Error::BufferOverflow { required } => Some(*required),
            Error::Parse { source, .. } => source.required_len(),
            _ => None,
        }
    }
}

/// Stable, field-less error codes.
///
/// # Examples
///
/// ```rust
/// use nvf::ErrorCode;
///
/// assert_eq!(ErrorCode::NotFound.as_str(), "name not found");
/// assert!(ErrorCode::ALL.iter().all(|c| !c.as_str().is_empty()));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Generic,
    BadAlloc,
    BufferOverflow,
    BadValueFormat,
    BadArgument,
    BadData,
    BadValueType,
    NotInitialized,
    NotFound,
    DuplicateName,
    UnmatchedBrace,
    NumericOverflow,
    DepthExceeded,
}

impl ErrorCode {
    /// Every code, in declaration order.
    pub const ALL: [ErrorCode; 13] = [
        ErrorCode::Generic,
        ErrorCode::BadAlloc,
        ErrorCode::BufferOverflow,
        ErrorCode::BadValueFormat,
        ErrorCode::BadArgument,
        ErrorCode::BadData,
        ErrorCode::BadValueType,
        ErrorCode::NotInitialized,
        ErrorCode::NotFound,
        ErrorCode::DuplicateName,
        ErrorCode::UnmatchedBrace,
        ErrorCode::NumericOverflow,
        ErrorCode::DepthExceeded,
    ];

    /// Returns a human-readable description of this code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Generic => "generic error",
            ErrorCode::BadAlloc => "allocation failed",
            ErrorCode::BufferOverflow => "buffer overflow",
            ErrorCode::BadValueFormat => "bad value format",
            ErrorCode::BadArgument => "bad argument",
            ErrorCode::BadData => "bad data",
            ErrorCode::BadValueType => "unexpected value type",
            ErrorCode::NotInitialized => "document not initialized",
            ErrorCode::NotFound => "name not found",
            ErrorCode::DuplicateName => "name already exists",
            ErrorCode::UnmatchedBrace => "unmatched brace or bracket",
            ErrorCode::NumericOverflow => "number too big to be represented",
            ErrorCode::DepthExceeded => "nesting too deep",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
