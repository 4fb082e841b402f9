//! HtmlParser - one extraction session over one document
//!
//! Wraps a [`Source`] and memoizes the link and image lists, so repeated
//! queries on the same session return the same slices.

use crate::error::HtmlError;
use crate::links::{extract_img_src, extract_links, LinkInfo};
use crate::metadata;
use crate::render::RenderConfig;
use crate::source::Source;
use rayon::prelude::*;
use std::io::Read;
use std::sync::OnceLock;
use tracing::trace;

/// Key under which [`HtmlParser::info`] reports the title
pub const TITLE_KEY: &str = "title";

#[derive(Debug)]
pub struct HtmlParser {
    source: Source,
    links: OnceLock<Vec<LinkInfo>>,
    img_src: OnceLock<Vec<String>>,
}

impl HtmlParser {
    /// Session over markup held as a string
    pub fn new(html: impl Into<String>) -> Self {
        Self::from_source(Source::new(html))
    }

    /// Session over raw bytes; the charset is detected
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::from_source(Source::from_bytes(bytes))
    }

    /// Session over raw bytes in a caller-chosen charset
    pub fn from_bytes_with_encoding(bytes: &[u8], label: &str) -> Result<Self, HtmlError> {
        Source::from_bytes_with_encoding(bytes, label).map(Self::from_source)
    }

    /// Session over a byte stream, read to the end before anything is scanned
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, HtmlError> {
        Source::from_reader(reader).map(Self::from_source)
    }

    pub fn from_source(source: Source) -> Self {
        HtmlParser {
            source,
            links: OnceLock::new(),
            img_src: OnceLock::new(),
        }
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    /// Link-bearing elements: `href` matches first, then `src` matches
    pub fn links(&self) -> &[LinkInfo] {
        self.links.get_or_init(|| {
            let links = extract_links(&self.source);
            trace!(count = links.len(), "extracted links");
            links
        })
    }

    /// Non-blank `src` values of `img` elements
    pub fn img_src(&self) -> &[String] {
        self.img_src.get_or_init(|| {
            let img_src = extract_img_src(&self.source);
            trace!(count = img_src.len(), "extracted image sources");
            img_src
        })
    }

    /// Plain text with the default rendering options
    pub fn plain_text(&self) -> String {
        self.plain_text_with(&RenderConfig::default())
    }

    pub fn plain_text_with(&self, config: &RenderConfig) -> String {
        self.source.render(config)
    }

    pub fn title(&self) -> String {
        metadata::title(&self.source)
    }

    pub fn meta_value(&self, key: &str) -> String {
        metadata::meta_value(&self.source, key)
    }

    /// Title plus the meta values named in a comma-separated list.
    ///
    /// Keys are trimmed and blank entries skipped. A key listed twice, or a
    /// meta named `title`, replaces the earlier entry in place.
    pub fn info(&self, meta_list: &str) -> Vec<(String, String)> {
        let mut info = vec![(TITLE_KEY.to_string(), self.title())];
        for key in meta_list.split(',').map(str::trim).filter(|k| !k.is_empty()) {
            let value = self.meta_value(key);
            match info.iter_mut().find(|(k, _)| k == key) {
                Some(entry) => entry.1 = value,
                None => info.push((key.to_string(), value)),
            }
        }
        info
    }
}

/// Extract the links of many documents in parallel
pub fn links_parallel<B: AsRef<[u8]> + Sync>(documents: &[B]) -> Vec<Vec<LinkInfo>> {
    documents
        .par_iter()
        .map(|bytes| extract_links(&Source::from_bytes(bytes.as_ref())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = include_str!("../tests/fixtures/test.html");

    fn fixture() -> HtmlParser {
        HtmlParser::from_bytes(FIXTURE.as_bytes())
    }

    #[test]
    fn test_links() {
        let parser = fixture();
        let links = parser.links();
        assert_eq!(links.len(), 5, "{links:?}");

        assert!(links[0].matches(Some("link"), Some("href"), Some(""), Some("does/not/exist/style.css")));
        assert!(links[1].matches(
            Some("a"),
            Some("href"),
            Some("Here, a link to nuxeo.com"),
            Some("http://nuxeo.com")
        ));
        assert!(links[2].matches(
            Some("a"),
            Some("href"),
            Some("(This does not exist in the test files)"),
            Some("sub1/sub2/sub.html")
        ));
        assert!(links[3].matches(Some("script"), Some("src"), Some(""), Some("does/not/exist/script.js")));
        assert!(links[4].matches(
            Some("img"),
            Some("src"),
            None,
            Some("http://does.not.exist.com/just/for/test.jpg")
        ));
    }

    #[test]
    fn test_links_are_memoized() {
        let parser = fixture();
        let first = parser.links().as_ptr();
        assert_eq!(parser.links().as_ptr(), first);
        assert_eq!(parser.img_src().as_ptr(), parser.img_src().as_ptr());
    }

    #[test]
    fn test_img_src() {
        assert_eq!(fixture().img_src(), ["http://does.not.exist.com/just/for/test.jpg"]);
    }

    #[test]
    fn test_plain_text() {
        let text = fixture().plain_text();
        assert!(text.contains("Welcome to the HTMLParserTest"), "{text}");
        assert!(text.contains("This does not exist in the test files"));
        assert!(!text.contains("<script"));
        assert!(!text.contains("These one should not be listed"));
        assert!(!text.contains("http://nuxeo.com"));
    }

    #[test]
    fn test_plain_text_with_urls() {
        let config = RenderConfig::new().include_hyperlink_urls(true);
        let text = fixture().plain_text_with(&config);
        assert!(text.contains("http://nuxeo.com"));
        assert!(!text.contains("These one should not be listed"));
    }

    #[test]
    fn test_title_and_meta() {
        let parser = fixture();
        assert_eq!(parser.title(), "Nuxeo HTMLParser Rocks!");
        assert_eq!(parser.meta_value("description"), "The description");
        assert_eq!(parser.meta_value("keywords"), "kw1,kw2,kw3");
        assert_eq!(parser.meta_value("author"), "John Smith");
        assert_eq!(parser.meta_value("generator"), "");
    }

    #[test]
    fn test_info() {
        let info = fixture().info(" description, ,author,missing");
        assert_eq!(
            info,
            vec![
                ("title".to_string(), "Nuxeo HTMLParser Rocks!".to_string()),
                ("description".to_string(), "The description".to_string()),
                ("author".to_string(), "John Smith".to_string()),
                ("missing".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_info_duplicate_keys() {
        let info = fixture().info("author,author");
        assert_eq!(info.len(), 2);
        let info = fixture().info("title");
        assert_eq!(info, vec![("title".to_string(), String::new())]);
    }

    #[test]
    fn test_session_shares_one_parse() {
        let parser = fixture();
        assert!(!parser.source().is_parsed());
        parser.title();
        assert!(parser.source().is_parsed());
        let segments = parser.source().segments().as_ptr();
        parser.links();
        parser.plain_text();
        assert_eq!(parser.source().segments().as_ptr(), segments);
    }

    #[test]
    fn test_from_reader() {
        let parser = HtmlParser::from_reader(FIXTURE.as_bytes()).unwrap();
        assert_eq!(parser.links().len(), 5);
    }

    #[test]
    fn test_from_bytes_with_unknown_encoding() {
        let err = HtmlParser::from_bytes_with_encoding(b"<p>x</p>", "klingon").unwrap_err();
        assert_eq!(err.reason(), "unknown_encoding");
    }

    #[test]
    fn test_links_parallel() {
        let documents = vec![FIXTURE.as_bytes().to_vec(), b"<a href=\"x\">x</a>".to_vec(), Vec::new()];
        let links = links_parallel(&documents);
        assert_eq!(links.len(), 3);
        assert_eq!(links[0].len(), 5);
        assert_eq!(links[1], vec![LinkInfo::new("a", "href", "x", "x")]);
        assert!(links[2].is_empty());
    }
}
