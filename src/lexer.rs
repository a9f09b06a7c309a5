//! Trivia skipping: whitespace, line comments and block comments.
//!
//! - `#` starts a line comment that runs to the next `\n`.
//! - `#[` starts a block comment that ends at the first `]` immediately
//!   followed by `#`. A bare `]` inside the comment does not end it.
//!
//! Block comments do not nest: in `#[ a #[ b ]# c ]#` the comment ends at the
//! first `]#`, leaving ` c ]#` as input.

use memchr::memchr;

/// Returns the position of the next significant byte at or after `pos`.
///
/// Returns `buf.len()` when only trivia remains. An unterminated block
/// comment consumes the rest of the buffer.
pub(crate) fn skip_trivia(buf: &[u8], mut pos: usize) -> usize {
    while pos < buf.len() {
        match buf[pos] {
            b if b.is_ascii_whitespace() => pos += 1,
            b'#' if buf.get(pos + 1) == Some(&b'[') => pos = skip_block_comment(buf, pos + 2),
            b'#' => {
                pos = match memchr(b'\n', &buf[pos..]) {
                    Some(nl) => pos + nl + 1,
                    None => buf.len(),
                };
            }
            _ => break,
        }
    }
    pos.min(buf.len())
}

fn skip_block_comment(buf: &[u8], mut pos: usize) -> usize {
    while pos < buf.len() {
        match memchr(b']', &buf[pos..]) {
            Some(close) => {
                pos += close + 1;
                if buf.get(pos) == Some(&b'#') {
                    return pos + 1;
                }
            }
            None => return buf.len(),
        }
    }
    buf.len()
}

/// Returns `true` for bytes that end a bare token: whitespace and brackets.
#[inline]
pub(crate) fn is_delimiter(byte: u8) -> bool {
    byte.is_ascii_whitespace() || matches!(byte, b'[' | b']' | b'{' | b'}')
}
