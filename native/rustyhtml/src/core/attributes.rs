//! HTML Attribute Parsing
//!
//! Parses attributes from start tag content. Names are ASCII-lowercased,
//! values have character references decoded.

use super::entities::decode_attribute;
use super::scanner::is_whitespace;

/// A parsed attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute name, lowercased
    pub name: String,
    /// Attribute value (references decoded, empty for valueless attributes)
    pub value: String,
    /// Whether the attribute was written with a value (`checked` vs `checked=""`)
    pub has_value: bool,
}

/// Ordered attribute mapping with case-insensitive lookup.
///
/// Document order is preserved for iteration. When a name repeats, the first
/// occurrence wins and later ones are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    items: Vec<Attribute>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an attribute by name (ASCII case-insensitive)
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.items.iter().find(|a| a.name.eq_ignore_ascii_case(name))
    }

    /// Look up an attribute value by name
    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name).map(|a| a.value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.items.iter()
    }

    fn push(&mut self, attribute: Attribute) {
        if !self.contains(&attribute.name) {
            self.items.push(attribute);
        }
    }
}

/// Parse attributes from raw tag content (after the element name, before '>')
///
/// Never fails: bytes that cannot start an attribute name are skipped.
pub fn parse_attributes(input: &str) -> Attributes {
    let bytes = input.as_bytes();
    let mut attrs = Attributes::new();
    let mut pos = 0;

    while pos < bytes.len() {
        while pos < bytes.len() && (is_whitespace(bytes[pos]) || bytes[pos] == b'/') {
            pos += 1;
        }
        if pos >= bytes.len() {
            break;
        }

        // Attribute name runs until whitespace, '=', '/' or '>'
        let name_start = pos;
        if matches!(bytes[pos], b'"' | b'\'' | b'<' | b'=' | b'>') {
            pos += 1;
            continue;
        }
        while pos < bytes.len() && !is_name_terminator(bytes[pos]) {
            pos += 1;
        }
        let name = input[name_start..pos].to_ascii_lowercase();

        // Skip whitespace around '='
        let before_equals = pos;
        while pos < bytes.len() && is_whitespace(bytes[pos]) {
            pos += 1;
        }

        if pos >= bytes.len() || bytes[pos] != b'=' {
            // Attribute without value (like boolean attributes)
            attrs.push(Attribute {
                name,
                value: String::new(),
                has_value: false,
            });
            pos = before_equals;
            continue;
        }

        pos += 1; // Skip '='
        while pos < bytes.len() && is_whitespace(bytes[pos]) {
            pos += 1;
        }

        let raw_value = match bytes.get(pos) {
            Some(&quote) if quote == b'"' || quote == b'\'' => {
                pos += 1; // Skip opening quote
                let value_start = pos;
                while pos < bytes.len() && bytes[pos] != quote {
                    pos += 1;
                }
                let value = &input[value_start..pos];
                if pos < bytes.len() {
                    pos += 1; // Skip closing quote
                }
                value
            }
            Some(_) => {
                let value_start = pos;
                while pos < bytes.len() && !is_whitespace(bytes[pos]) && bytes[pos] != b'>' {
                    pos += 1;
                }
                &input[value_start..pos]
            }
            None => "",
        };

        attrs.push(Attribute {
            name,
            value: decode_attribute(raw_value).into_owned(),
            has_value: true,
        });
    }

    attrs
}

#[inline]
fn is_name_terminator(b: u8) -> bool {
    is_whitespace(b) || matches!(b, b'=' | b'/' | b'>')
}
