//! Span - byte range into the source text
//!
//! Zero-copy reference to a portion of the input document.
//! Used for tags, element content and text runs.

/// A half-open byte range `[start, end)` into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Span {
    /// Byte offset of the first byte
    pub start: usize,
    /// Byte offset one past the last byte
    pub end: usize,
}

impl Span {
    /// Create a new span
    #[inline]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Create an empty span positioned at `at`
    #[inline]
    pub const fn empty_at(at: usize) -> Self {
        Self { start: at, end: at }
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Span of `slice` within `text`, when `slice` points into `text`
    pub fn of_slice(slice: &str, text: &str) -> Option<Self> {
        let text_start = text.as_ptr() as usize;
        let slice_start = slice.as_ptr() as usize;

        if slice_start >= text_start && slice_start + slice.len() <= text_start + text.len() {
            let start = slice_start - text_start;
            Some(Self::new(start, start + slice.len()))
        } else {
            None
        }
    }

    /// Extract the text from the source, or "" when out of range
    #[inline]
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        text.get(self.start..self.end).unwrap_or("")
    }
}
