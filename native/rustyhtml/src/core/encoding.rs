//! HTML Encoding Detection and Conversion
//!
//! Handles detection of the document charset from a byte order mark or a
//! `<meta>` declaration near the start of the document, then decodes to UTF-8
//! with `encoding_rs`. Undeclared documents are read as UTF-8; malformed
//! sequences become U+FFFD instead of failing.

use super::attributes::parse_attributes;
use super::tokenizer::{TokenKind, Tokenizer};
use crate::error::HtmlError;
use encoding_rs::{Encoding, UTF_8};
use std::borrow::Cow;
use tracing::debug;

/// How far into the document a `<meta>` charset declaration is looked for
const SNIFF_LIMIT: usize = 1024;

/// Decode raw bytes, detecting the encoding
pub fn decode_html(input: &[u8]) -> Cow<'_, str> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(input) {
        let (text, _) = encoding.decode_without_bom_handling(&input[bom_len..]);
        return text;
    }

    let encoding = sniff_meta_charset(input).unwrap_or(UTF_8);
    let (text, _) = encoding.decode_without_bom_handling(input);
    text
}

/// Decode raw bytes with a caller-chosen charset label (a BOM still wins)
pub fn decode_html_with_label<'a>(input: &'a [u8], label: &str) -> Result<Cow<'a, str>, HtmlError> {
    let encoding = Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| HtmlError::UnknownEncoding(label.to_string()))?;
    let (text, _, _) = encoding.decode(input);
    Ok(text)
}

/// Look for `<meta charset="...">` or
/// `<meta http-equiv="Content-Type" content="text/html; charset=...">`
fn sniff_meta_charset(input: &[u8]) -> Option<&'static Encoding> {
    let prefix = String::from_utf8_lossy(&input[..input.len().min(SNIFF_LIMIT)]);

    for token in Tokenizer::new(&prefix) {
        if token.kind != TokenKind::StartTag || token.name.as_deref() != Some("meta") {
            continue;
        }
        let attrs = parse_attributes(token.content.unwrap_or(""));
        let label = match attrs.value("charset") {
            Some(charset) => Some(charset.to_string()),
            None if attrs
                .value("http-equiv")
                .is_some_and(|v| v.trim().eq_ignore_ascii_case("content-type")) =>
            {
                attrs.value("content").and_then(charset_from_content_type)
            }
            None => None,
        };

        if let Some(encoding) = label.and_then(|l| Encoding::for_label_no_replacement(l.trim().as_bytes())) {
            debug!(charset = encoding.name(), "sniffed document charset");
            // A UTF-16 declaration in ASCII-compatible bytes cannot be right
            return Some(encoding.output_encoding());
        }
    }
    None
}

/// Extract the charset parameter from a Content-Type value
fn charset_from_content_type(content: &str) -> Option<String> {
    let lower = content.to_ascii_lowercase();
    let at = lower.find("charset")?;
    let rest = lower[at + "charset".len()..].trim_start();
    let rest = rest.strip_prefix('=')?.trim_start();
    let rest = rest.trim_start_matches(['"', '\'']);
    let value: String = rest
        .chars()
        .take_while(|c| !matches!(c, ';' | '"' | '\'') && !c.is_whitespace())
        .collect();
    (!value.is_empty()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_passthrough() {
        let html = "<p>caf\u{00E9}</p>";
        assert_eq!(decode_html(html.as_bytes()), html);
    }

    #[test]
    fn test_utf8_bom_is_stripped() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"<p>x</p>");
        assert_eq!(decode_html(&bytes), "<p>x</p>");
    }

    #[test]
    fn test_utf16_le_bom() {
        // "<b/>" in UTF-16 LE with BOM
        let bytes = [0xFF, 0xFE, b'<', 0x00, b'b', 0x00, b'/', 0x00, b'>', 0x00];
        assert_eq!(decode_html(&bytes), "<b/>");
    }

    #[test]
    fn test_utf16_be_bom() {
        let bytes = [0xFE, 0xFF, 0x00, b'<', 0x00, b'b', 0x00, b'/', 0x00, b'>'];
        assert_eq!(decode_html(&bytes), "<b/>");
    }

    #[test]
    fn test_meta_charset() {
        let mut bytes = b"<meta charset=\"iso-8859-1\"><p>caf".to_vec();
        bytes.push(0xE9);
        assert!(decode_html(&bytes).ends_with("caf\u{00E9}"));
    }

    #[test]
    fn test_http_equiv_charset() {
        let mut bytes =
            b"<META HTTP-EQUIV=\"Content-Type\" CONTENT=\"text/html; charset=windows-1252\"><p>".to_vec();
        bytes.push(0x93);
        assert!(decode_html(&bytes).ends_with('\u{201C}'));
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        assert_eq!(decode_html(b"a\xFFb"), "a\u{FFFD}b");
    }

    #[test]
    fn test_explicit_label() {
        assert_eq!(decode_html_with_label(b"caf\xE9", "latin1").unwrap(), "caf\u{00E9}");
        assert!(matches!(
            decode_html_with_label(b"x", "no-such-charset"),
            Err(HtmlError::UnknownEncoding(_))
        ));
    }

    #[test]
    fn test_charset_from_content_type() {
        assert_eq!(charset_from_content_type("text/html; charset=UTF-8").as_deref(), Some("utf-8"));
        assert_eq!(charset_from_content_type("text/html"), None);
    }
}
