//! Plain-text rendering
//!
//! Walks the segments of the full sequential parse and writes the visible
//! text. Whitespace in ordinary text collapses to single spaces; block
//! elements turn into line breaks that are only written once more text
//! follows, so the output never starts or ends with a separator.

use crate::core::entities::{decode_text, is_html_space};
use crate::element::StartTag;
use crate::source::{Segment, Source};

/// Line drawn for `<hr>`
const HORIZONTAL_RULE: &str = "----------------------------------------";

/// Separator written between table cells
const CELL_SEPARATOR: &str = " \t";

/// Options for [`Source::render`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    line_separator: String,
    include_hyperlink_urls: bool,
    include_alternate_text: bool,
    convert_non_breaking_spaces: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            line_separator: "\n".to_string(),
            include_hyperlink_urls: false,
            include_alternate_text: false,
            convert_non_breaking_spaces: false,
        }
    }
}

impl RenderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Literal written for every line break. An empty or whitespace-only
    /// separator falls back to `"\n"`.
    pub fn line_separator(mut self, separator: impl Into<String>) -> Self {
        let separator = separator.into();
        self.line_separator = if separator.trim().is_empty() {
            "\n".to_string()
        } else {
            separator
        };
        self
    }

    /// Append ` <URL>` after the text of each anchor
    pub fn include_hyperlink_urls(mut self, include: bool) -> Self {
        self.include_hyperlink_urls = include;
        self
    }

    /// Write the `alt` text of images and image maps
    pub fn include_alternate_text(mut self, include: bool) -> Self {
        self.include_alternate_text = include;
        self
    }

    /// Write U+00A0 as an ordinary space
    pub fn convert_non_breaking_spaces(mut self, convert: bool) -> Self {
        self.convert_non_breaking_spaces = convert;
        self
    }

    pub fn separator(&self) -> &str {
        &self.line_separator
    }

    pub fn hyperlink_urls(&self) -> bool {
        self.include_hyperlink_urls
    }

    pub fn alternate_text(&self) -> bool {
        self.include_alternate_text
    }

    pub fn non_breaking_spaces_converted(&self) -> bool {
        self.convert_non_breaking_spaces
    }
}

/// How a tag affects the line layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Inline,
    /// Starts and ends on its own line
    Line,
    /// Separated from its surroundings by a blank line
    Paragraph,
}

fn layout_of(name: &str) -> Layout {
    match name {
        "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "blockquote" | "pre" | "table" => Layout::Paragraph,
        "div" | "ul" | "ol" | "li" | "dl" | "dt" | "dd" | "tr" | "address" | "center" | "form" | "hr"
        | "section" | "article" | "header" | "footer" | "nav" | "aside" | "main" | "figure" | "figcaption"
        | "caption" | "fieldset" | "tbody" | "thead" | "tfoot" => Layout::Line,
        _ => Layout::Inline,
    }
}

/// Elements whose whole content is dropped
fn is_hidden(name: &str) -> bool {
    matches!(name, "script" | "style" | "title" | "template")
}

#[derive(Debug)]
struct List {
    ordered: bool,
    next_number: usize,
}

/// An open anchor waiting for its end tag
#[derive(Debug)]
struct Anchor {
    href: Option<String>,
    /// Output length when the anchor opened
    text_start: usize,
}

/// One-shot writer turning a [`Source`] into plain text
pub struct Renderer<'s> {
    source: &'s Source,
    config: &'s RenderConfig,
    out: String,
    /// Nothing, not even indentation, written on the current line yet
    at_line_start: bool,
    /// Visible text written on the current line after any indentation
    line_has_text: bool,
    pending_space: bool,
    /// Line breaks owed before the next text: 1 for a new line, 2 for a blank line
    pending_breaks: usize,
    lists: Vec<List>,
    anchors: Vec<Anchor>,
    pre_depth: usize,
    /// Drop the newline directly after `<pre>`
    skip_pre_newline: bool,
    cell_in_row: usize,
}

impl<'s> Renderer<'s> {
    pub fn new(source: &'s Source, config: &'s RenderConfig) -> Self {
        Renderer {
            source,
            config,
            out: String::with_capacity(source.len() / 2),
            at_line_start: true,
            line_has_text: false,
            pending_space: false,
            pending_breaks: 0,
            lists: Vec::new(),
            anchors: Vec::new(),
            pre_depth: 0,
            skip_pre_newline: false,
            cell_in_row: 0,
        }
    }

    pub fn render(mut self) -> String {
        let text = self.source.as_str();
        let segments = self.source.segments();
        let mut index = 0;

        while index < segments.len() {
            match &segments[index] {
                Segment::StartTag(tag) if is_hidden(&tag.name) => {
                    if let Some(end) = self.source.closer(index) {
                        index = end;
                    }
                }
                Segment::StartTag(tag) => self.start_tag(tag, index),
                Segment::EndTag { name, .. } => self.end_tag(name),
                Segment::Text(span) => {
                    let decoded = decode_text(span.slice(text));
                    self.text(&decoded);
                }
                Segment::CData { content, .. } => self.text(content.slice(text)),
                Segment::RawText(_)
                | Segment::Comment { .. }
                | Segment::Declaration(_)
                | Segment::ProcessingInstruction(_) => {}
            }
            index += 1;
        }

        self.out
    }

    fn start_tag(&mut self, tag: &StartTag, index: usize) {
        let name = tag.name.as_str();
        match layout_of(name) {
            Layout::Paragraph => self.break_lines(2),
            Layout::Line => self.break_lines(1),
            Layout::Inline => {}
        }

        match name {
            "br" => self.newline(),
            "hr" => {
                self.write_str(HORIZONTAL_RULE);
                self.break_lines(1);
            }
            "pre" => {
                self.pre_depth += 1;
                self.skip_pre_newline = true;
            }
            "ul" | "ol" => self.lists.push(List {
                ordered: name == "ol",
                next_number: tag
                    .attribute_value("start")
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or(1),
            }),
            "li" => self.bullet(),
            "tr" => self.cell_in_row = 0,
            "td" | "th" => {
                if self.cell_in_row > 0 {
                    self.pending_space = false;
                    self.write_str(CELL_SEPARATOR);
                }
                self.cell_in_row += 1;
            }
            "a" => self.open_anchor(tag, index),
            "img" | "area" => self.alternate_text(tag),
            "input" if tag.attribute_value("type").is_some_and(|t| t.eq_ignore_ascii_case("image")) => {
                self.alternate_text(tag)
            }
            _ => {}
        }
    }

    fn end_tag(&mut self, name: &str) {
        match name {
            "pre" => self.pre_depth = self.pre_depth.saturating_sub(1),
            "ul" | "ol" => {
                self.lists.pop();
            }
            "a" => self.close_anchor(),
            _ => {}
        }

        match layout_of(name) {
            Layout::Paragraph => self.break_lines(2),
            Layout::Line => self.break_lines(1),
            Layout::Inline => {}
        }
    }

    fn open_anchor(&mut self, tag: &StartTag, index: usize) {
        if !self.config.include_hyperlink_urls {
            return;
        }
        let href = tag.attribute_value("href").map(str::trim).filter(|h| is_rendered_url(h));
        if self.source.closer(index).is_none() {
            // No end tag to wait for
            if let Some(href) = href {
                self.write_url(href);
            }
            return;
        }
        self.anchors.push(Anchor {
            href: href.map(str::to_string),
            text_start: self.out.len(),
        });
    }

    fn close_anchor(&mut self) {
        let Some(anchor) = self.anchors.pop() else {
            return;
        };
        if let Some(href) = anchor.href {
            let text = self.out.get(anchor.text_start..).unwrap_or("").trim();
            if text != href {
                self.write_url(&href);
            }
        }
    }

    fn write_url(&mut self, href: &str) {
        self.pending_space = true;
        self.write_str("<");
        self.write_str(href);
        self.write_str(">");
    }

    fn alternate_text(&mut self, tag: &StartTag) {
        if !self.config.include_alternate_text {
            return;
        }
        if let Some(alt) = tag.attribute_value("alt").filter(|a| !a.trim().is_empty()) {
            let alt = alt.to_string();
            self.inline_text(&alt);
        }
    }

    fn bullet(&mut self) {
        let depth = self.lists.len();
        let marker = match self.lists.last_mut() {
            Some(list) if list.ordered => {
                let marker = format!("{}. ", list.next_number);
                list.next_number += 1;
                marker
            }
            _ => "* ".to_string(),
        };

        self.flush_breaks();
        if !self.at_line_start {
            self.newline();
        }
        self.out.push_str(&"  ".repeat(depth.saturating_sub(1)));
        self.out.push_str(&marker);
        self.at_line_start = false;
        self.line_has_text = false;
        self.pending_space = false;
    }

    fn text(&mut self, text: &str) {
        if self.pre_depth > 0 {
            self.preformatted_text(text);
        } else {
            self.inline_text(text);
        }
    }

    fn inline_text(&mut self, text: &str) {
        for c in text.chars() {
            if is_html_space(c) {
                self.pending_space = true;
            } else {
                self.put(c);
            }
        }
    }

    fn preformatted_text(&mut self, text: &str) {
        let mut text = text;
        if self.skip_pre_newline {
            text = text
                .strip_prefix("\r\n")
                .or_else(|| text.strip_prefix('\n'))
                .unwrap_or(text);
        }
        for c in text.chars() {
            match c {
                '\n' => self.newline(),
                '\r' => {}
                _ => {
                    self.flush_breaks();
                    self.begin_line();
                    self.push_char(c);
                    self.line_has_text = true;
                }
            }
        }
    }

    fn write_str(&mut self, s: &str) {
        for c in s.chars() {
            self.put(c);
        }
    }

    /// Write one visible character, settling owed breaks and spaces first
    fn put(&mut self, c: char) {
        self.flush_breaks();
        self.begin_line();
        if self.pending_space && self.line_has_text {
            self.out.push(' ');
        }
        self.pending_space = false;
        self.push_char(c);
        self.line_has_text = true;
    }

    fn push_char(&mut self, c: char) {
        self.skip_pre_newline = false;
        if c == '\u{A0}' && self.config.convert_non_breaking_spaces {
            self.out.push(' ');
        } else {
            self.out.push(c);
        }
    }

    fn begin_line(&mut self) {
        if self.at_line_start {
            self.out.push_str(&"  ".repeat(self.lists.len()));
            self.at_line_start = false;
        }
    }

    /// Owe at least `count` line breaks before the next text
    fn break_lines(&mut self, count: usize) {
        self.pending_breaks = self.pending_breaks.max(count);
        self.pending_space = false;
    }

    fn flush_breaks(&mut self) {
        if self.pending_breaks == 0 {
            return;
        }
        let breaks = if self.out.is_empty() {
            0
        } else if self.at_line_start {
            // A line already ended; only the blank line may still be owed
            self.pending_breaks.saturating_sub(1)
        } else {
            self.pending_breaks
        };
        for _ in 0..breaks {
            self.out.push_str(&self.config.line_separator);
        }
        if breaks > 0 {
            self.at_line_start = true;
            self.line_has_text = false;
        }
        self.pending_breaks = 0;
    }

    /// Unconditional line break, as for `<br>` or a newline inside `<pre>`
    fn newline(&mut self) {
        self.flush_breaks();
        self.skip_pre_newline = false;
        self.pending_space = false;
        if !self.out.is_empty() {
            self.out.push_str(&self.config.line_separator);
        }
        self.at_line_start = true;
        self.line_has_text = false;
    }
}

/// Whether an anchor target is worth appending to the text
fn is_rendered_url(href: &str) -> bool {
    !href.is_empty()
        && !href.starts_with('#')
        && !href
            .get(..11)
            .is_some_and(|scheme| scheme.eq_ignore_ascii_case("javascript:"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(html: &str) -> String {
        Source::new(html).render(&RenderConfig::default())
    }

    fn render_with(html: &str, config: RenderConfig) -> String {
        Source::new(html).render(&config)
    }

    #[test]
    fn test_whitespace_collapses() {
        assert_eq!(render("  <b>Hello</b>\n\n   <i>world</i>  "), "Hello world");
    }

    #[test]
    fn test_paragraphs_get_blank_lines() {
        assert_eq!(render("<h1>Title</h1><p>One</p><p>Two</p>"), "Title\n\nOne\n\nTwo");
    }

    #[test]
    fn test_divs_break_lines() {
        assert_eq!(render("<div>a</div><div>b</div>text"), "a\nb\ntext");
    }

    #[test]
    fn test_br() {
        assert_eq!(render("one<br>two<br><br>three"), "one\ntwo\n\nthree");
    }

    #[test]
    fn test_custom_separator() {
        let config = RenderConfig::new().line_separator("<br>");
        assert_eq!(render_with("<p>a</p><p>b</p>", config), "a<br><br>b");
    }

    #[test]
    fn test_blank_separator_falls_back() {
        for blank in ["", "  ", "\t", "\r\n", "\r", "\n\n", " \n "] {
            assert_eq!(RenderConfig::new().line_separator(blank).separator(), "\n", "{blank:?}");
        }
        let config = RenderConfig::new().line_separator(" \n ");
        assert_eq!(render_with("<p>a</p><p>b</p>", config), "a\n\nb");
    }

    #[test]
    fn test_config_defaults_and_setters() {
        let config = RenderConfig::default();
        assert_eq!(config.separator(), "\n");
        assert!(!config.hyperlink_urls());
        assert!(!config.alternate_text());
        assert!(!config.non_breaking_spaces_converted());

        let config = config
            .include_hyperlink_urls(true)
            .include_alternate_text(true)
            .convert_non_breaking_spaces(true);
        assert!(config.hyperlink_urls());
        assert!(config.alternate_text());
        assert!(config.non_breaking_spaces_converted());
    }

    #[test]
    fn test_hidden_content() {
        let html = "<html><head><title>T</title><style>p{color:red}</style></head>\
                    <body><script>var a = '<b>';</script>visible<!-- secret --></body></html>";
        assert_eq!(render(html), "visible");
    }

    #[test]
    fn test_unclosed_title_does_not_hide_document() {
        assert_eq!(render("<title>broken<p>body text"), "broken\n\nbody text");
    }

    #[test]
    fn test_entities_are_decoded() {
        assert_eq!(render("<p>Fish &amp; Chips &lt;3</p>"), "Fish & Chips <3");
    }

    #[test]
    fn test_hyperlink_urls() {
        let html = "<p>See <a href=\"http://nuxeo.com\">Nuxeo</a> now</p>";
        assert_eq!(render(html), "See Nuxeo now");
        let config = RenderConfig::new().include_hyperlink_urls(true);
        assert_eq!(render_with(html, config), "See Nuxeo <http://nuxeo.com> now");
    }

    #[test]
    fn test_hyperlink_url_follows_text_with_unquoted_href() {
        let config = RenderConfig::new().include_hyperlink_urls(true);
        let html = "<p><a href=http://nuxeo.com/>Nuxeo</a> and <a href=/about/>About us</a></p>";
        assert_eq!(render_with(html, config), "Nuxeo <http://nuxeo.com/> and About us </about/>");
    }

    #[test]
    fn test_hyperlink_urls_skipped() {
        let config = RenderConfig::new().include_hyperlink_urls(true);
        let html = "<a href=\"#top\">Top</a> <a href=\"javascript:go()\">Go</a> \
                    <a href=\"http://x.org\">http://x.org</a>";
        assert_eq!(render_with(html, config), "Top Go http://x.org");
    }

    #[test]
    fn test_alternate_text() {
        let html = "<p>Logo: <img src=\"l.png\" alt=\"ACME\"> <input type=\"image\" alt=\"Send\"></p>";
        assert_eq!(render(html), "Logo:");
        let config = RenderConfig::new().include_alternate_text(true);
        assert_eq!(render_with(html, config), "Logo: ACME Send");
    }

    #[test]
    fn test_non_breaking_spaces() {
        assert_eq!(render("a&nbsp;b"), "a\u{A0}b");
        let config = RenderConfig::new().convert_non_breaking_spaces(true);
        assert_eq!(render_with("a&nbsp;b", config), "a b");
    }

    #[test]
    fn test_lists() {
        let html = "<ul><li>one</li><li>two<ol><li>a</li><li>b</li></ol></li></ul>";
        assert_eq!(render(html), "* one\n* two\n  1. a\n  2. b");
    }

    #[test]
    fn test_ordered_list_start() {
        assert_eq!(render("<ol start=\"3\"><li>c</li><li>d</li></ol>"), "3. c\n4. d");
    }

    #[test]
    fn test_table_cells() {
        let html = "<table><tr><th>A</th><th>B</th></tr>\n<tr> <td>1</td> <td>2</td> </tr></table>";
        assert_eq!(render(html), "A \tB\n1 \t2");
    }

    #[test]
    fn test_horizontal_rule() {
        assert_eq!(render("above<hr>below"), format!("above\n{HORIZONTAL_RULE}\nbelow"));
    }

    #[test]
    fn test_preformatted() {
        let html = "<p>x</p><pre>\n  indented\n    more</pre>after";
        assert_eq!(render(html), "x\n\n  indented\n    more\n\nafter");
    }

    #[test]
    fn test_cdata() {
        assert_eq!(render("a <![CDATA[<raw>]]> b"), "a <raw> b");
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(render(""), "");
        assert_eq!(render("<html><body>  </body></html>"), "");
    }
}
