//! Source - owned markup text with lazy, memoized queries
//!
//! The first query that needs tags runs one full sequential parse over the
//! text and keeps the resulting segment list. Every later query (element
//! search, rendering, metadata) reads that same list, so targeted lookups and
//! whole-document walks always agree on where tags, comments and text are.

use crate::core::attributes::parse_attributes;
use crate::core::encoding::{decode_html, decode_html_with_label};
use crate::core::tokenizer::{TokenKind, Tokenizer};
use crate::element::{Element, StartTag};
use crate::error::HtmlError;
use crate::render::{RenderConfig, Renderer};
use crate::span::Span;
use std::collections::HashMap;
use std::io::Read;
use std::sync::OnceLock;
use tracing::debug;

/// One token of the sequential parse, with owned tag data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    StartTag(StartTag),
    EndTag { name: String, span: Span },
    /// Text with character references still encoded
    Text(Span),
    /// `script`/`style` content
    RawText(Span),
    CData { span: Span, content: Span },
    Comment { span: Span, content: Span },
    Declaration(Span),
    ProcessingInstruction(Span),
}

impl Segment {
    /// Byte range of the whole segment
    pub fn span(&self) -> Span {
        match self {
            Segment::StartTag(tag) => tag.span,
            Segment::EndTag { span, .. }
            | Segment::Text(span)
            | Segment::RawText(span)
            | Segment::CData { span, .. }
            | Segment::Comment { span, .. }
            | Segment::Declaration(span)
            | Segment::ProcessingInstruction(span) => *span,
        }
    }
}

/// Result of the full sequential parse
#[derive(Debug)]
struct Parsed {
    segments: Vec<Segment>,
    /// For each segment index holding a start tag, the index of its end tag
    closers: Vec<Option<usize>>,
}

impl Parsed {
    fn build(text: &str) -> Self {
        let mut segments = Vec::new();
        let mut closers = Vec::new();
        let mut open: HashMap<String, Vec<usize>> = HashMap::new();

        for token in Tokenizer::new(text) {
            let index = segments.len();
            let content_span = || {
                token
                    .content
                    .and_then(|c| Span::of_slice(c, text))
                    .unwrap_or(Span::empty_at(token.span.start))
            };

            let segment = match token.kind {
                TokenKind::StartTag => {
                    let name = token.name.as_deref().unwrap_or_default().to_string();
                    let tag = StartTag {
                        attributes: parse_attributes(token.content.unwrap_or("")),
                        span: token.span,
                        self_closing: token.self_closing,
                        name,
                    };
                    if tag.has_content() {
                        open.entry(tag.name.clone()).or_default().push(index);
                    }
                    Segment::StartTag(tag)
                }
                TokenKind::EndTag => {
                    let name = token.name.as_deref().unwrap_or_default().to_string();
                    if let Some(opener) = open.get_mut(&name).and_then(Vec::pop) {
                        closers[opener] = Some(index);
                    }
                    Segment::EndTag { name, span: token.span }
                }
                TokenKind::Text => Segment::Text(token.span),
                TokenKind::RawText => Segment::RawText(token.span),
                TokenKind::CData => Segment::CData {
                    span: token.span,
                    content: content_span(),
                },
                TokenKind::Comment => Segment::Comment {
                    span: token.span,
                    content: content_span(),
                },
                TokenKind::Declaration => Segment::Declaration(token.span),
                TokenKind::ProcessingInstruction => Segment::ProcessingInstruction(token.span),
            };

            segments.push(segment);
            closers.push(None);
        }

        Parsed { segments, closers }
    }
}

/// Immutable markup text plus its memoized sequential parse
#[derive(Debug)]
pub struct Source {
    text: String,
    parsed: OnceLock<Parsed>,
}

impl Source {
    /// Create a source from markup already held as a string
    pub fn new(text: impl Into<String>) -> Self {
        Source {
            text: text.into(),
            parsed: OnceLock::new(),
        }
    }

    /// Create a source from raw bytes, detecting the charset
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Source::new(decode_html(bytes).into_owned())
    }

    /// Create a source from raw bytes in a known charset
    pub fn from_bytes_with_encoding(bytes: &[u8], label: &str) -> Result<Self, HtmlError> {
        Ok(Source::new(decode_html_with_label(bytes, label)?.into_owned()))
    }

    /// Read a whole byte stream and create a source from it.
    ///
    /// # Errors
    ///
    /// Returns [`HtmlError::Io`] when the stream cannot be read; nothing is
    /// scanned in that case.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, HtmlError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(Source::from_bytes(&bytes))
    }

    /// The full markup text
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length of the markup in bytes
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Run the token-by-token walk over the whole document if it has not run
    /// yet. Calling it again does nothing.
    pub fn full_sequential_parse(&self) {
        self.parsed();
    }

    /// Whether the sequential parse has already run
    pub fn is_parsed(&self) -> bool {
        self.parsed.get().is_some()
    }

    fn parsed(&self) -> &Parsed {
        self.parsed.get_or_init(|| {
            let parsed = Parsed::build(&self.text);
            debug!(bytes = self.text.len(), segments = parsed.segments.len(), "full sequential parse");
            parsed
        })
    }

    /// All segments of the sequential parse, in document order
    pub fn segments(&self) -> &[Segment] {
        &self.parsed().segments
    }

    /// Segment index of the end tag closing the start tag at `index`
    pub(crate) fn closer(&self, index: usize) -> Option<usize> {
        self.parsed().closers.get(index).copied().flatten()
    }

    /// Every start tag outside comments, in document order
    pub fn start_tags(&self) -> impl Iterator<Item = &StartTag> {
        self.segments().iter().filter_map(|s| match s {
            Segment::StartTag(tag) => Some(tag),
            _ => None,
        })
    }

    fn elements_where<'s>(&'s self, mut predicate: impl FnMut(&StartTag) -> bool) -> Vec<Element<'s>> {
        let parsed = self.parsed();
        parsed
            .segments
            .iter()
            .enumerate()
            .filter_map(|(index, segment)| match segment {
                Segment::StartTag(tag) if predicate(tag) => {
                    Some(Element::new(self, tag, index, parsed.closers[index]))
                }
                _ => None,
            })
            .collect()
    }

    /// Every element in the document
    pub fn all_elements(&self) -> Vec<Element<'_>> {
        self.elements_where(|_| true)
    }

    /// Every element whose start tag carries the named attribute
    pub fn all_elements_with_attribute(&self, attribute: &str) -> Vec<Element<'_>> {
        self.elements_where(|tag| tag.attributes.contains(attribute))
    }

    /// Every element with the given tag name (case-insensitive)
    pub fn all_elements_named(&self, name: &str) -> Vec<Element<'_>> {
        self.elements_where(|tag| tag.name.eq_ignore_ascii_case(name))
    }

    /// First element with the given tag name
    pub fn first_element_named(&self, name: &str) -> Option<Element<'_>> {
        let parsed = self.parsed();
        parsed.segments.iter().enumerate().find_map(|(index, segment)| match segment {
            Segment::StartTag(tag) if tag.name.eq_ignore_ascii_case(name) => {
                Some(Element::new(self, tag, index, parsed.closers[index]))
            }
            _ => None,
        })
    }

    /// Next start tag beginning at or after byte offset `from` whose
    /// `attribute` equals `value` (whole-value comparison, optionally
    /// ASCII case-insensitive).
    pub fn next_start_tag_with_attribute_value(
        &self,
        from: usize,
        attribute: &str,
        value: &str,
        case_sensitive: bool,
    ) -> Option<&StartTag> {
        self.start_tags().filter(|tag| tag.span.start >= from).find(|tag| {
            tag.attributes.value(attribute).is_some_and(|v| {
                if case_sensitive {
                    v == value
                } else {
                    v.eq_ignore_ascii_case(value)
                }
            })
        })
    }

    /// Render the visible text of the document
    pub fn render(&self, config: &RenderConfig) -> String {
        Renderer::new(self, config).render()
    }
}
