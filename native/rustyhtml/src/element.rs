//! Element and start tag model
//!
//! A `StartTag` is materialised once per tag by the sequential parse. An
//! `Element` is a view pairing a start tag with its content region; its
//! extracted text is computed on first use.

use crate::core::attributes::Attributes;
use crate::core::entities::{collapse_whitespace, decode_text};
use crate::source::{Segment, Source};
use crate::span::Span;
use std::cell::OnceCell;

/// Elements that never have content
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose boundaries separate words in extracted text
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "br", "caption", "center", "dd", "div", "dl", "dt",
    "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "head", "header",
    "hr", "html", "li", "main", "nav", "ol", "p", "pre", "section", "table", "tbody", "td", "tfoot", "th",
    "thead", "tr", "ul",
];

#[inline]
pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

#[inline]
pub fn is_block_element(name: &str) -> bool {
    BLOCK_ELEMENTS.contains(&name)
}

/// An opening tag with its attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    /// Lowercased tag name
    pub name: String,
    pub attributes: Attributes,
    /// Byte range of the whole tag, `<` to `>` inclusive
    pub span: Span,
    /// Written as `<name ... />`
    pub self_closing: bool,
}

impl StartTag {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Decoded attribute value, case-insensitive name lookup
    pub fn attribute_value(&self, name: &str) -> Option<&str> {
        self.attributes.value(name)
    }

    /// Byte offset just past the closing `>`
    pub fn end(&self) -> usize {
        self.span.end
    }

    /// Whether the element opened by this tag can have content
    pub fn has_content(&self) -> bool {
        !self.self_closing && !is_void_element(&self.name)
    }
}

/// A start tag plus its content, up to the matching end tag
#[derive(Debug)]
pub struct Element<'s> {
    source: &'s Source,
    start_tag: &'s StartTag,
    /// Segment index of the start tag
    index: usize,
    /// Segment index of the matching end tag
    end_index: Option<usize>,
    text: OnceCell<String>,
}

impl<'s> Element<'s> {
    pub(crate) fn new(source: &'s Source, start_tag: &'s StartTag, index: usize, end_index: Option<usize>) -> Self {
        Element {
            source,
            start_tag,
            index,
            end_index,
            text: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &'s str {
        &self.start_tag.name
    }

    pub fn start_tag(&self) -> &'s StartTag {
        self.start_tag
    }

    pub fn attribute_value(&self, name: &str) -> Option<&'s str> {
        self.start_tag.attributes.value(name)
    }

    /// Byte range of the content between the start and end tags.
    /// Empty, positioned after the start tag, when the element has no content.
    pub fn content_span(&self) -> Span {
        match self.end_index.and_then(|i| self.source.segments().get(i)) {
            Some(end_tag) => Span::new(self.start_tag.end(), end_tag.span().start),
            None => Span::empty_at(self.start_tag.end()),
        }
    }

    /// Byte range of the whole element
    pub fn span(&self) -> Span {
        match self.end_index.and_then(|i| self.source.segments().get(i)) {
            Some(end_tag) => Span::new(self.start_tag.span.start, end_tag.span().end),
            None => self.start_tag.span,
        }
    }

    /// Raw markup of the content region
    pub fn content(&self) -> &'s str {
        self.content_span().slice(self.source.as_str())
    }

    /// Visible text of the content: nested tags stripped, `script`/`style`
    /// skipped, references decoded, whitespace collapsed.
    pub fn text(&self) -> &str {
        self.text.get_or_init(|| extract_text(self.source, self.content_segments()))
    }

    fn content_segments(&self) -> &'s [Segment] {
        match self.end_index {
            Some(end) => &self.source.segments()[self.index + 1..end],
            None => &[],
        }
    }
}

/// Concatenate the visible text of a run of segments
pub(crate) fn extract_text(source: &Source, segments: &[Segment]) -> String {
    let text = source.as_str();
    let mut out = String::new();

    for segment in segments {
        match segment {
            Segment::Text(span) => out.push_str(&decode_text(span.slice(text))),
            Segment::CData { content, .. } => out.push_str(content.slice(text)),
            Segment::StartTag(tag) if is_block_element(&tag.name) => out.push(' '),
            Segment::EndTag { name, .. } if is_block_element(name) => out.push(' '),
            _ => {}
        }
    }

    collapse_whitespace(&out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_text_strips_nested_markup() {
        let source = Source::new("<a href=\"x\">Here, <b>a</b> link &amp; <!-- not --> more</a>");
        let links = source.all_elements_named("a");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].text(), "Here, a link & more");
    }

    #[test]
    fn test_block_boundaries_separate_words() {
        let source = Source::new("<div><p>one</p><p>two</p></div>");
        let div = source.first_element_named("div").unwrap();
        assert_eq!(div.text(), "one two");
    }

    #[test]
    fn test_script_content_is_not_text() {
        let source = Source::new("<div>a<script>var x = 1;</script>b<style>p{}</style></div>");
        assert_eq!(source.first_element_named("div").unwrap().text(), "ab");
    }

    #[test]
    fn test_void_and_self_closing_have_no_content() {
        let source = Source::new("<link href=\"s.css\">text<img src=\"a.png\"/>more</img>");
        let link = source.first_element_named("link").unwrap();
        assert_eq!(link.text(), "");
        assert!(link.content_span().is_empty());
        assert_eq!(source.first_element_named("img").unwrap().text(), "");
    }

    #[test]
    fn test_unclosed_element_has_no_content() {
        let source = Source::new("<p>para one<p>para two");
        let paragraphs = source.all_elements_named("p");
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[0].text(), "");
        assert_eq!(paragraphs[0].span(), paragraphs[0].start_tag().span);
    }

    #[test]
    fn test_nested_same_name_elements() {
        let source = Source::new("<div id=\"outer\"><div>in</div>out</div>");
        let divs = source.all_elements_named("div");
        assert_eq!(divs[0].text(), "in out");
        assert_eq!(divs[0].content(), "<div>in</div>out");
        assert_eq!(divs[1].text(), "in");
    }

    #[test]
    fn test_start_tag_helpers() {
        let source = Source::new("<IMG SRC=\"a.png\" ALT=\"An &amp; B\">");
        let img = source.first_element_named("img").unwrap();
        assert_eq!(img.name(), "img");
        assert_eq!(img.attribute_value("alt"), Some("An & B"));
        assert!(!img.start_tag().has_content());
        assert_eq!(img.start_tag().end(), 34);
    }
}
