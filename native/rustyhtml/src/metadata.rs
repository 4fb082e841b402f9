//! Title and `<meta>` queries

use crate::core::entities::decode_collapse_whitespace;
use crate::source::Source;

/// Content of the first `title` element, decoded and whitespace-collapsed
pub fn title(source: &Source) -> String {
    source.full_sequential_parse();
    source
        .first_element_named("title")
        .map(|title| decode_collapse_whitespace(title.content()))
        .unwrap_or_default()
}

/// `content` of the first tag whose `name` equals `key`, compared ASCII
/// case-insensitively.
///
/// Only the first tag with that name is considered: when it is not a `meta`
/// tag the answer is empty even if a matching `meta` follows.
pub fn meta_value(source: &Source, key: &str) -> String {
    source.full_sequential_parse();
    match source.next_start_tag_with_attribute_value(0, "name", key, false) {
        Some(tag) if tag.name() == "meta" => tag.attribute_value("content").unwrap_or_default().to_string(),
        _ => String::new(),
    }
}
