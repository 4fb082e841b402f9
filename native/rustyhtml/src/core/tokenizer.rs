//! HTML Tokenizer - lenient state machine for markup token extraction
//!
//! Implements a pull-parser style tokenizer that extracts HTML tokens:
//! - Start/end tags
//! - Text content
//! - Raw text of `script`/`style` elements
//! - CDATA sections
//! - Comments
//! - Declarations (`<!DOCTYPE ...>`) and processing instructions
//!
//! The tokenizer never fails. A `<` that does not open recognisable markup,
//! or a tag left unterminated at end of input, is returned as text.

use super::scanner::{is_name_start_char, is_whitespace, Scanner};
use crate::span::Span;
use std::borrow::Cow;

/// Current parsing state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    /// Between tags
    InsideText,
    /// Inside an element whose content is not markup (`script`, `title`, ...)
    InsideRawText(RawTextKind),
    /// End of input reached
    Done,
}

/// Elements whose content is not tokenized as markup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawTextKind {
    /// `script`, `style`: content is never visible text
    Raw(&'static str),
    /// `title`, `textarea`: content is text with character references
    Escapable(&'static str),
}

impl RawTextKind {
    fn for_element(name: &str) -> Option<Self> {
        match name {
            "script" => Some(RawTextKind::Raw("script")),
            "style" => Some(RawTextKind::Raw("style")),
            "title" => Some(RawTextKind::Escapable("title")),
            "textarea" => Some(RawTextKind::Escapable("textarea")),
            _ => None,
        }
    }

    fn element(self) -> &'static str {
        match self {
            RawTextKind::Raw(name) | RawTextKind::Escapable(name) => name,
        }
    }
}

/// Type of HTML token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Element start tag: <element ...> or <element .../>
    StartTag,
    /// Element end tag: </element>
    EndTag,
    /// Text content (character references not yet decoded)
    Text,
    /// Content of `script`/`style`
    RawText,
    /// CDATA section: <![CDATA[...]]>
    CData,
    /// Comment: <!--...-->
    Comment,
    /// `<!DOCTYPE ...>` or another `<!...>` declaration
    Declaration,
    /// `<?...>`
    ProcessingInstruction,
}

/// A parsed HTML token
#[derive(Debug, Clone)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Raw span in input
    pub span: Span,
    /// For tags: the lowercased element name
    pub name: Option<Cow<'a, str>>,
    /// Text/comment/CDATA body, or for start tags the raw attribute region
    pub content: Option<&'a str>,
    /// Start tag written as `<name ... />`
    pub self_closing: bool,
}

impl<'a> Token<'a> {
    fn new(kind: TokenKind, start: usize, end: usize) -> Self {
        Token {
            kind,
            span: Span::new(start, end),
            name: None,
            content: None,
            self_closing: false,
        }
    }

    fn with_name(mut self, name: &'a str) -> Self {
        self.name = Some(lowercase(name));
        self
    }

    fn with_content(mut self, content: &'a str) -> Self {
        self.content = Some(content);
        self
    }
}

/// HTML tokenizer implementing a pull-parser pattern
pub struct Tokenizer<'a> {
    input: &'a str,
    scanner: Scanner<'a>,
    state: ParseState,
}

impl<'a> Tokenizer<'a> {
    /// Create a new tokenizer for the given input
    pub fn new(input: &'a str) -> Self {
        Tokenizer {
            input,
            scanner: Scanner::new(input.as_bytes()),
            state: ParseState::InsideText,
        }
    }

    /// Get the current parse state
    pub fn state(&self) -> ParseState {
        self.state
    }

    /// Get the current position in the input
    pub fn position(&self) -> usize {
        self.scanner.position()
    }

    /// Get the next token, or None at end of input
    pub fn next_token(&mut self) -> Option<Token<'a>> {
        loop {
            if self.scanner.is_eof() {
                self.state = ParseState::Done;
            }

            match self.state {
                ParseState::Done => return None,
                ParseState::InsideRawText(kind) => {
                    self.state = ParseState::InsideText;
                    if let Some(token) = self.parse_raw_text(kind) {
                        return Some(token);
                    }
                }
                ParseState::InsideText => {
                    let start = self.scanner.position();
                    if self.scanner.peek() == Some(b'<') {
                        if let Some(token) = self.parse_markup(start) {
                            return Some(token);
                        }
                        // Not markup: the '<' is literal text
                        self.scanner.set_position(start);
                        return Some(self.parse_text(start, 1));
                    }
                    return Some(self.parse_text(start, 0));
                }
            }
        }
    }

    /// Text runs until the next '<' after `skip` bytes
    fn parse_text(&mut self, start: usize, skip: usize) -> Token<'a> {
        self.scanner.set_position(start + skip);
        let end = self.scanner.find_tag_start().unwrap_or(self.scanner.len());
        self.scanner.set_position(end);
        Token::new(TokenKind::Text, start, end).with_content(&self.input[start..end])
    }

    /// Parse markup starting with '<'. Returns None (leaving the position
    /// unspecified) when the bytes do not form markup.
    fn parse_markup(&mut self, start: usize) -> Option<Token<'a>> {
        self.scanner.advance(1); // Skip '<'

        match self.scanner.peek()? {
            b'/' => self.parse_end_tag(start),
            b'!' => Some(self.parse_bang_markup(start)),
            b'?' => Some(self.parse_pi(start)),
            b if is_name_start_char(b) => self.parse_start_tag(start),
            _ => None,
        }
    }

    /// Parse a start tag
    fn parse_start_tag(&mut self, start: usize) -> Option<Token<'a>> {
        let name_start = self.scanner.position();
        self.scanner.read_name()?;
        let name_end = self.scanner.position();

        // Find the end of the tag, handling quoted attributes
        let end = self.scanner.find_tag_end_quoted()?;

        let attrs = &self.input[name_end..end];
        let self_closing = ends_with_self_closing_slash(attrs.as_bytes());

        self.scanner.set_position(end + 1);

        let mut token = Token::new(TokenKind::StartTag, start, end + 1)
            .with_name(&self.input[name_start..name_end])
            .with_content(attrs);
        token.self_closing = self_closing;

        if !self_closing {
            if let Some(kind) = token.name.as_deref().and_then(RawTextKind::for_element) {
                self.state = ParseState::InsideRawText(kind);
            }
        }

        Some(token)
    }

    /// Parse an end tag
    fn parse_end_tag(&mut self, start: usize) -> Option<Token<'a>> {
        self.scanner.advance(1); // Skip '/'

        let name_start = self.scanner.position();
        self.scanner.read_name()?;
        let name_end = self.scanner.position();

        let end = self.scanner.find_tag_end()?;
        self.scanner.set_position(end + 1);

        Some(Token::new(TokenKind::EndTag, start, end + 1).with_name(&self.input[name_start..name_end]))
    }

    /// Parse markup starting with '!' (comment, CDATA, DOCTYPE, other declarations)
    fn parse_bang_markup(&mut self, start: usize) -> Token<'a> {
        self.scanner.advance(1); // Skip '!'

        if self.scanner.starts_with(b"--") {
            self.parse_comment(start)
        } else if self.scanner.starts_with(b"[CDATA[") {
            self.parse_cdata(start)
        } else {
            self.parse_declaration(start)
        }
    }

    /// Parse a comment <!--...-->. An unterminated comment runs to end of input.
    fn parse_comment(&mut self, start: usize) -> Token<'a> {
        self.scanner.advance(2); // Skip '--'
        let content_start = self.scanner.position();

        // <!--> and <!---> are empty comments
        for abrupt in [&b">"[..], &b"->"[..]] {
            if self.scanner.starts_with(abrupt) {
                self.scanner.advance(abrupt.len());
                return Token::new(TokenKind::Comment, start, self.scanner.position()).with_content("");
            }
        }

        match self.scanner.find_bytes(b"-->") {
            Some(pos) => {
                self.scanner.set_position(pos + 3);
                Token::new(TokenKind::Comment, start, pos + 3).with_content(&self.input[content_start..pos])
            }
            None => {
                let end = self.scanner.len();
                self.scanner.set_position(end);
                Token::new(TokenKind::Comment, start, end).with_content(&self.input[content_start..end])
            }
        }
    }

    /// Parse a CDATA section <![CDATA[...]]>
    fn parse_cdata(&mut self, start: usize) -> Token<'a> {
        self.scanner.advance(7); // Skip '[CDATA['
        let content_start = self.scanner.position();

        let (content_end, end) = match self.scanner.find_bytes(b"]]>") {
            Some(pos) => (pos, pos + 3),
            None => (self.scanner.len(), self.scanner.len()),
        };
        self.scanner.set_position(end);
        Token::new(TokenKind::CData, start, end).with_content(&self.input[content_start..content_end])
    }

    /// Parse a DOCTYPE or other `<!...>` declaration, up to the next '>'
    fn parse_declaration(&mut self, start: usize) -> Token<'a> {
        let content_start = self.scanner.position();
        let (content_end, end) = match self.scanner.find_tag_end() {
            Some(pos) => (pos, pos + 1),
            None => (self.scanner.len(), self.scanner.len()),
        };
        self.scanner.set_position(end);
        Token::new(TokenKind::Declaration, start, end).with_content(&self.input[content_start..content_end])
    }

    /// Parse a processing instruction or server directive `<?...>`
    fn parse_pi(&mut self, start: usize) -> Token<'a> {
        self.scanner.advance(1); // Skip '?'
        let content_start = self.scanner.position();
        let (content_end, end) = match self.scanner.find_tag_end() {
            Some(pos) => (pos, pos + 1),
            None => (self.scanner.len(), self.scanner.len()),
        };
        self.scanner.set_position(end);
        let content = self.input[content_start..content_end].trim_end_matches('?');
        Token::new(TokenKind::ProcessingInstruction, start, end).with_content(content)
    }

    /// Content of a raw text element, up to its end tag.
    ///
    /// `script`/`style` without an end tag run to end of input. An unclosed
    /// `title`/`textarea` is tokenized as ordinary markup instead.
    fn parse_raw_text(&mut self, kind: RawTextKind) -> Option<Token<'a>> {
        let start = self.scanner.position();
        let end = match (self.scanner.find_close_tag(kind.element().as_bytes()), kind) {
            (Some(end), _) => end,
            (None, RawTextKind::Raw(_)) => self.scanner.len(),
            (None, RawTextKind::Escapable(_)) => return None,
        };
        if end == start {
            return None;
        }
        self.scanner.set_position(end);

        let token_kind = match kind {
            RawTextKind::Raw(_) => TokenKind::RawText,
            RawTextKind::Escapable(_) => TokenKind::Text,
        };
        Some(Token::new(token_kind, start, end).with_content(&self.input[start..end]))
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

/// Whether the attribute region of a start tag ends in the `/` of `/>`.
///
/// The slash must sit directly before `>` and must not belong to an
/// attribute value: in `<a href=/about/>` it ends the unquoted value.
fn ends_with_self_closing_slash(attrs: &[u8]) -> bool {
    let Some((&b'/', body)) = attrs.split_last() else {
        return false;
    };

    let mut quote = None;
    let mut expecting_value = false;
    let mut in_unquoted_value = false;

    for &b in body {
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b if is_whitespace(b) => in_unquoted_value = false,
            b'=' if !in_unquoted_value => expecting_value = true,
            b'"' | b'\'' if expecting_value => {
                quote = Some(b);
                expecting_value = false;
            }
            _ if expecting_value => {
                in_unquoted_value = true;
                expecting_value = false;
            }
            _ => {}
        }
    }

    !in_unquoted_value && !expecting_value && quote.is_none()
}

/// Lowercase an ASCII name, borrowing when it is already lowercase
fn lowercase(name: &str) -> Cow<'_, str> {
    if name.bytes().any(|b| b.is_ascii_uppercase()) {
        Cow::Owned(name.to_ascii_lowercase())
    } else {
        Cow::Borrowed(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Tokenizer::new(input).map(|t| t.kind).collect()
    }

    #[test]
    fn test_simple_element() {
        let mut tok = Tokenizer::new("<P>content</p>");

        let t1 = tok.next_token().unwrap();
        assert_eq!(t1.kind, TokenKind::StartTag);
        assert_eq!(t1.name.as_deref(), Some("p"));

        let t2 = tok.next_token().unwrap();
        assert_eq!(t2.kind, TokenKind::Text);
        assert_eq!(t2.content, Some("content"));

        let t3 = tok.next_token().unwrap();
        assert_eq!(t3.kind, TokenKind::EndTag);
        assert_eq!(t3.name.as_deref(), Some("p"));
        assert_eq!(t3.span, Span::new(10, 14));

        assert!(tok.next_token().is_none());
    }

    #[test]
    fn test_self_closing_tag() {
        let t = Tokenizer::new(r#"<img src="a.png"/>"#).next().unwrap();
        assert_eq!(t.kind, TokenKind::StartTag);
        assert!(t.self_closing);
        assert_eq!(t.content, Some(r#" src="a.png"/"#));
    }

    #[test]
    fn test_slash_in_unquoted_value_is_not_self_closing() {
        let tokens: Vec<_> = Tokenizer::new("<a href=/about/>About us</a><a href=http://nuxeo.com/>N</a>").collect();
        assert_eq!(tokens[0].kind, TokenKind::StartTag);
        assert!(!tokens[0].self_closing);
        assert_eq!(tokens[0].content, Some(" href=/about/"));
        assert_eq!(tokens[1].content, Some("About us"));
        assert!(!tokens[3].self_closing);
    }

    #[test]
    fn test_self_closing_forms() {
        let closing = |html: &str| Tokenizer::new(html).next().unwrap().self_closing;
        assert!(closing("<br/>"));
        assert!(closing("<br />"));
        assert!(closing("<a href='x'/>"));
        assert!(closing("<input disabled/>"));
        assert!(closing("<a href=x />"));
        assert!(!closing("<a href=/>"));
        assert!(!closing("<a href = />"));
        assert!(!closing("<br / >"));
        assert!(!closing("<a title=\"a/\">"));
    }

    #[test]
    fn test_comment_hides_markup() {
        let tokens: Vec<_> = Tokenizer::new(r#"a<!-- <a href="x">b</a> -->c"#).collect();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].kind, TokenKind::Comment);
        assert_eq!(tokens[1].content, Some(r#" <a href="x">b</a> "#));
    }

    #[test]
    fn test_unterminated_comment_runs_to_end() {
        assert_eq!(kinds("a<!-- <b>never"), vec![TokenKind::Text, TokenKind::Comment]);
    }

    #[test]
    fn test_empty_comment_forms() {
        assert_eq!(kinds("<!-->x<!--->"), vec![TokenKind::Comment, TokenKind::Text, TokenKind::Comment]);
    }

    #[test]
    fn test_script_content_is_raw() {
        let tokens: Vec<_> = Tokenizer::new("<script>if (a<b) { x = '<a href=\"y\">'; }</script>").collect();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].kind, TokenKind::RawText);
        assert_eq!(tokens[2].kind, TokenKind::EndTag);
    }

    #[test]
    fn test_state_tracks_raw_text() {
        let mut tok = Tokenizer::new("<style>p{}</style>");
        assert_eq!(tok.state(), ParseState::InsideText);
        tok.next_token();
        assert_eq!(tok.state(), ParseState::InsideRawText(RawTextKind::Raw("style")));
        assert_eq!(tok.position(), 7);
        while tok.next_token().is_some() {}
        assert_eq!(tok.state(), ParseState::Done);
    }

    #[test]
    fn test_empty_script() {
        assert_eq!(kinds(r#"<script src="x.js"></script>"#), vec![TokenKind::StartTag, TokenKind::EndTag]);
    }

    #[test]
    fn test_title_is_escapable_text() {
        let tokens: Vec<_> = Tokenizer::new("<title>a <b> &amp; c</title>").collect();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].kind, TokenKind::Text);
        assert_eq!(tokens[1].content, Some("a <b> &amp; c"));
    }

    #[test]
    fn test_unclosed_title_falls_back_to_markup() {
        assert_eq!(
            kinds("<title>x<b>y"),
            vec![TokenKind::StartTag, TokenKind::Text, TokenKind::StartTag, TokenKind::Text]
        );
    }

    #[test]
    fn test_stray_less_than_is_text() {
        let tokens: Vec<_> = Tokenizer::new("1 < 2 <3").collect();
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Text));
        let text: String = tokens.iter().filter_map(|t| t.content).collect();
        assert_eq!(text, "1 < 2 <3");
    }

    #[test]
    fn test_unterminated_tag_is_text() {
        assert_eq!(kinds("ok <a href=\"x\""), vec![TokenKind::Text, TokenKind::Text]);
    }

    #[test]
    fn test_doctype_and_pi() {
        assert_eq!(
            kinds("<!DOCTYPE html><?xml version=\"1.0\"?><html>"),
            vec![TokenKind::Declaration, TokenKind::ProcessingInstruction, TokenKind::StartTag]
        );
    }

    #[test]
    fn test_cdata() {
        let t = Tokenizer::new("<![CDATA[<b>x</b>]]>").next().unwrap();
        assert_eq!(t.kind, TokenKind::CData);
        assert_eq!(t.content, Some("<b>x</b>"));
    }
}
