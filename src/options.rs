//! Configuration options for parsing and rendering NVF.
//!
//! - [`RenderOptions`]: controls how [`render`](crate::render) lays out text
//! - [`Indent`]: one indentation level, either a tab or a number of spaces
//! - [`ParseOptions`]: limits applied while parsing
//!
//! ## Examples
//!
//! ```rust
//! use nvf::{Document, Indent, RenderOptions, to_string_with_options};
//!
//! let mut doc = Document::new();
//! doc.parse("m { x 1 }").unwrap();
//!
//! let options = RenderOptions::new().with_indent(Indent::Spaces(2));
//! let text = to_string_with_options(&doc, &options).unwrap();
//! assert_eq!(text, "m {\n  x 1\n}\n");
//! ```

/// One level of indentation in rendered output.
///
/// # Examples
///
/// ```rust
/// use nvf::Indent;
///
/// assert_eq!(Indent::Tab.unit(), "\t");
/// assert_eq!(Indent::Spaces(4).unit(), "    ");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum Indent {
    #[default]
    Tab,
    Spaces(usize),
}

impl Indent {
    /// Returns the text written for one level.
    #[must_use]
    pub fn unit(&self) -> String {
        match self {
            Indent::Tab => "\t".to_string(),
            Indent::Spaces(n) => " ".repeat(*n),
        }
    }
}

/// Configuration options for rendering.
///
/// # Examples
///
/// ```rust
/// use nvf::{Indent, RenderOptions};
///
/// let options = RenderOptions::new();
/// assert_eq!(options.indent, Indent::Tab);
///
/// let options = RenderOptions::new().with_indent(Indent::Spaces(4));
/// assert_eq!(options.indent, Indent::Spaces(4));
/// ```
#[derive(Clone, Debug, Default)]
pub struct RenderOptions {
    pub indent: Indent,
}

impl RenderOptions {
    /// Creates default options (tab indentation).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the indentation used for each nesting level.
    #[must_use]
    pub fn with_indent(mut self, indent: Indent) -> Self {
        self.indent = indent;
        self
    }
}

/// Default nesting limit for [`ParseOptions`].
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Configuration options for parsing.
///
/// # Examples
///
/// ```rust
/// use nvf::{Document, ErrorCode, ParseOptions};
///
/// let mut doc = Document::new();
/// let options = ParseOptions::new().with_max_depth(1);
/// assert!(doc.parse_with_options("a [1]", &options).is_ok());
///
/// let err = doc.parse_with_options("b [[1]]", &options).unwrap_err();
/// assert_eq!(err.code(), ErrorCode::DepthExceeded);
/// ```
#[derive(Clone, Debug)]
pub struct ParseOptions {
    /// Deepest allowed nesting of `{ }` and `[ ]`; the root map is depth 0.
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParseOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the nesting limit.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
