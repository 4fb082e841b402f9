//! Link and image extraction

use crate::source::Source;
use std::fmt;

/// Attributes whose values are reported as links, in report order
pub const HANDLED_LINK_ATTRIBUTES: &[&str] = &["href", "src"];

/// One element carrying a link-bearing attribute
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LinkInfo {
    tag: String,
    attribute: String,
    text: String,
    link: String,
}

impl LinkInfo {
    pub fn new(
        tag: impl Into<String>,
        attribute: impl Into<String>,
        text: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        LinkInfo {
            tag: tag.into(),
            attribute: attribute.into(),
            text: text.into(),
            link: link.into(),
        }
    }

    /// Lowercased tag name
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Attribute the link was read from
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Visible text of the element, empty when it has none
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Attribute value, possibly empty
    pub fn link(&self) -> &str {
        &self.link
    }

    /// Compare only the fields given; `None` matches anything.
    pub fn matches(&self, tag: Option<&str>, attribute: Option<&str>, text: Option<&str>, link: Option<&str>) -> bool {
        fn field(expected: Option<&str>, actual: &str) -> bool {
            expected.is_none_or(|e| e == actual)
        }
        field(tag, &self.tag) && field(attribute, &self.attribute) && field(text, &self.text) && field(link, &self.link)
    }
}

impl fmt::Display for LinkInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tag: {} - attribute: {} - text: {} - link: {}",
            self.tag, self.attribute, self.text, self.link
        )
    }
}

/// Every element carrying a handled attribute: all `href` matches in
/// document order, then all `src` matches.
pub fn extract_links(source: &Source) -> Vec<LinkInfo> {
    let mut links = Vec::new();
    for &attribute in HANDLED_LINK_ATTRIBUTES {
        for element in source.all_elements_with_attribute(attribute) {
            links.push(LinkInfo::new(
                element.name(),
                attribute,
                element.text(),
                element.attribute_value(attribute).unwrap_or_default(),
            ));
        }
    }
    links
}

/// `src` of every `img` element, skipping blank values
pub fn extract_img_src(source: &Source) -> Vec<String> {
    source
        .all_elements_named("img")
        .iter()
        .filter_map(|img| img.attribute_value("src"))
        .filter(|src| !src.trim().is_empty())
        .map(str::to_string)
        .collect()
}
