//! ResourceArc Wrappers
//!
//! Persistent extraction sessions. A session owns its document and memoized
//! results, so repeated queries from the host never re-scan the markup.

use crate::parser::HtmlParser;
use rustler::ResourceArc;

/// Wrapper for HtmlParser that can be stored in a ResourceArc.
/// The parser memoizes with `OnceLock`, so no lock is needed here.
pub struct HtmlParserResource {
    pub parser: HtmlParser,
}

impl HtmlParserResource {
    pub fn new(parser: HtmlParser) -> Self {
        HtmlParserResource { parser }
    }
}

#[rustler::resource_impl]
impl rustler::Resource for HtmlParserResource {}

/// Type alias for the ResourceArc
pub type HtmlParserRef = ResourceArc<HtmlParserResource>;
