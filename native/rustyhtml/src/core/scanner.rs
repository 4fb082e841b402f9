//! SIMD-accelerated HTML scanning using memchr
//!
//! Uses memchr crate for fast byte searching with SIMD acceleration:
//! - SSE2 (default x86_64)
//! - AVX2 (runtime detection)
//! - NEON (aarch64)

use memchr::{memchr, memmem};

/// Scanner for markup delimiter detection
pub struct Scanner<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    /// Create a new scanner for the given input
    #[inline]
    pub fn new(input: &'a [u8]) -> Self {
        Scanner { input, pos: 0 }
    }

    /// Get the current position
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Set the current position
    #[inline]
    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos.min(self.input.len());
    }

    /// Total input length
    #[inline]
    pub fn len(&self) -> usize {
        self.input.len()
    }

    /// Check if we've reached the end
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Peek at current byte without advancing
    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Advance by n bytes
    #[inline]
    pub fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    /// Find next '<' (tag start) using SIMD
    #[inline]
    pub fn find_tag_start(&self) -> Option<usize> {
        memchr(b'<', &self.input[self.pos..]).map(|i| self.pos + i)
    }

    /// Find next '>' (tag end) using SIMD
    /// Note: Does not handle '>' inside quotes - use find_tag_end_quoted for that
    #[inline]
    pub fn find_tag_end(&self) -> Option<usize> {
        memchr(b'>', &self.input[self.pos..]).map(|i| self.pos + i)
    }

    /// Find tag end while handling quotes properly
    /// Returns the position of '>' that is not inside an attribute value.
    ///
    /// Quotes only open a value when they follow '=' (optionally after
    /// whitespace), so a stray apostrophe in an attribute name does not
    /// swallow the rest of the document.
    pub fn find_tag_end_quoted(&self) -> Option<usize> {
        let mut pos = self.pos;
        let mut after_equals = false;

        while pos < self.input.len() {
            match self.input[pos] {
                b'>' => return Some(pos),
                b'=' => after_equals = true,
                q @ (b'"' | b'\'') if after_equals => {
                    let close = memchr(q, &self.input[pos + 1..])?;
                    pos += close + 1;
                    after_equals = false;
                }
                b if is_whitespace(b) => {}
                _ => after_equals = false,
            }
            pos += 1;
        }
        None
    }

    /// Find next occurrence of a byte sequence
    #[inline]
    pub fn find_bytes(&self, needle: &[u8]) -> Option<usize> {
        memmem::find(&self.input[self.pos..], needle).map(|i| self.pos + i)
    }

    /// Find the next `</name` sequence, ASCII case-insensitive, where the name
    /// is followed by whitespace, '/', '>' or end of input.
    pub fn find_close_tag(&self, name: &[u8]) -> Option<usize> {
        let mut pos = self.pos;
        while let Some(i) = memchr(b'<', &self.input[pos..]) {
            let at = pos + i;
            let rest = &self.input[at..];
            if rest.len() >= name.len() + 2
                && rest[1] == b'/'
                && rest[2..2 + name.len()].eq_ignore_ascii_case(name)
            {
                match rest.get(2 + name.len()) {
                    None => return Some(at),
                    Some(&b) if is_whitespace(b) || b == b'/' || b == b'>' => return Some(at),
                    _ => {}
                }
            }
            pos = at + 1;
        }
        None
    }

    /// Check if input starts with a byte sequence at current position
    #[inline]
    pub fn starts_with(&self, needle: &[u8]) -> bool {
        self.input[self.pos..].starts_with(needle)
    }

    /// Read a tag name (starts with an ASCII letter, continues with name chars)
    pub fn read_name(&mut self) -> Option<&'a [u8]> {
        let start = self.pos;

        if start >= self.input.len() || !is_name_start_char(self.input[start]) {
            return None;
        }

        self.pos += 1;

        while self.pos < self.input.len() && is_name_char(self.input[self.pos]) {
            self.pos += 1;
        }

        Some(&self.input[start..self.pos])
    }
}

/// HTML whitespace bytes
#[inline]
pub fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0C)
}

/// A tag name must start with an ASCII letter
#[inline]
pub fn is_name_start_char(b: u8) -> bool {
    b.is_ascii_alphabetic()
}

/// Characters allowed after the first one in a tag name
#[inline]
pub fn is_name_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' | b'.' | b':') || b >= 0x80
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_tag_start() {
        let scanner = Scanner::new(b"hello <world>");
        assert_eq!(scanner.find_tag_start(), Some(6));
    }

    #[test]
    fn test_find_tag_end_quoted() {
        let scanner = Scanner::new(b"<a title=\">test\">content");
        assert_eq!(scanner.find_tag_end_quoted(), Some(16));
    }

    #[test]
    fn test_stray_quote_does_not_open_value() {
        let scanner = Scanner::new(b"<a don't>text");
        assert_eq!(scanner.find_tag_end_quoted(), Some(8));
    }

    #[test]
    fn test_read_name() {
        let mut scanner = Scanner::new(b"h1 class=x>");
        assert_eq!(scanner.read_name(), Some(b"h1" as &[u8]));
        assert_eq!(scanner.position(), 2);
    }

    #[test]
    fn test_read_name_rejects_digit_start() {
        let mut scanner = Scanner::new(b"3 < 4");
        assert_eq!(scanner.read_name(), None);
    }

    #[test]
    fn test_find_close_tag_ignores_case_and_prefixes() {
        let scanner = Scanner::new(b"var a = '</scripts>'; </SCRIPT >");
        assert_eq!(scanner.find_close_tag(b"script"), Some(22));
    }
}
