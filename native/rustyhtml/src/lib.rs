//! RustyHTML - Fast HTML extraction for Elixir
//!
//! Operations:
//! - Links: every element carrying `href` or `src`, with its visible text
//! - Images: `src` of every `img`
//! - Plain text: rendered visible text of the whole document
//! - Metadata: `<title>` and `<meta name=... content=...>` values
//!
//! A parsed session (`parse/1`) keeps its document and memoized results in
//! a ResourceArc; the `html_*` functions are one-shot conveniences.

use rustler::{Binary, Encoder, Env, NifResult, ResourceArc, Term};

pub mod core;
pub mod element;
pub mod error;
pub mod links;
pub mod metadata;
pub mod parser;
pub mod render;
mod resource;
pub mod source;
pub mod span;
mod term;

use parser::{links_parallel, HtmlParser};
use render::RenderConfig;
use resource::{HtmlParserRef, HtmlParserResource};
use term::{error_to_term, info_to_term, links_to_term, str_to_binary, strings_to_term};

// ============================================================================
// Allocator Configuration
// ============================================================================

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

// ============================================================================
// Sessions
// ============================================================================

/// Parse HTML bytes into a session (returns ResourceArc).
/// The charset is detected from a BOM or `<meta>`, defaulting to UTF-8.
#[rustler::nif]
fn parse(input: Binary) -> HtmlParserRef {
    ResourceArc::new(HtmlParserResource::new(HtmlParser::from_bytes(input.as_slice())))
}

/// Parse HTML bytes in a caller-chosen charset.
/// Returns {:ok, session} or {:error, :unknown_encoding}
#[rustler::nif]
fn parse_with_encoding<'a>(env: Env<'a>, input: Binary<'a>, encoding: &str) -> NifResult<Term<'a>> {
    match HtmlParser::from_bytes_with_encoding(input.as_slice(), encoding) {
        Ok(parser) => {
            let arc = ResourceArc::new(HtmlParserResource::new(parser));
            Ok((term::ok(), arc).encode(env))
        }
        Err(e) => error_to_term(env, &e),
    }
}

/// Link records of a session: `href` matches first, then `src` matches
#[rustler::nif]
fn get_links<'a>(env: Env<'a>, session: HtmlParserRef) -> NifResult<Term<'a>> {
    links_to_term(env, session.parser.links())
}

#[rustler::nif]
fn get_img_src<'a>(env: Env<'a>, session: HtmlParserRef) -> Term<'a> {
    strings_to_term(env, session.parser.img_src())
}

/// Render the visible text; a nil or whitespace-only separator means "\n"
#[rustler::nif]
fn get_plain_text<'a>(
    env: Env<'a>,
    session: HtmlParserRef,
    line_separator: Option<&str>,
    include_hyperlink_urls: bool,
    include_alternate_text: bool,
    convert_non_breaking_spaces: bool,
) -> Term<'a> {
    let config = render_config(
        line_separator,
        include_hyperlink_urls,
        include_alternate_text,
        convert_non_breaking_spaces,
    );
    str_to_binary(env, &session.parser.plain_text_with(&config))
}

#[rustler::nif]
fn get_title<'a>(env: Env<'a>, session: HtmlParserRef) -> Term<'a> {
    str_to_binary(env, &session.parser.title())
}

#[rustler::nif]
fn get_meta_value<'a>(env: Env<'a>, session: HtmlParserRef, key: &str) -> Term<'a> {
    str_to_binary(env, &session.parser.meta_value(key))
}

/// Title plus the requested meta values, as a map with binary keys.
/// `meta_list` is comma-separated.
#[rustler::nif]
fn get_info<'a>(env: Env<'a>, session: HtmlParserRef, meta_list: &str) -> NifResult<Term<'a>> {
    info_to_term(env, &session.parser.info(meta_list))
}

// ============================================================================
// One-shot Extraction
// ============================================================================

#[rustler::nif]
fn html_links<'a>(env: Env<'a>, input: Binary<'a>) -> NifResult<Term<'a>> {
    let parser = HtmlParser::from_bytes(input.as_slice());
    links_to_term(env, parser.links())
}

#[rustler::nif]
fn html_plain_text<'a>(
    env: Env<'a>,
    input: Binary<'a>,
    line_separator: Option<&str>,
    include_hyperlink_urls: bool,
    include_alternate_text: bool,
    convert_non_breaking_spaces: bool,
) -> Term<'a> {
    let config = render_config(
        line_separator,
        include_hyperlink_urls,
        include_alternate_text,
        convert_non_breaking_spaces,
    );
    let parser = HtmlParser::from_bytes(input.as_slice());
    str_to_binary(env, &parser.plain_text_with(&config))
}

#[rustler::nif]
fn html_info<'a>(env: Env<'a>, input: Binary<'a>, meta_list: &str) -> NifResult<Term<'a>> {
    let parser = HtmlParser::from_bytes(input.as_slice());
    info_to_term(env, &parser.info(meta_list))
}

// ============================================================================
// Parallel Batch
// ============================================================================

/// Extract links from many documents in parallel, one list per document
#[rustler::nif(schedule = "DirtyCpu")]
fn get_links_batch<'a>(env: Env<'a>, inputs: Vec<Binary<'a>>) -> NifResult<Term<'a>> {
    let documents: Vec<&[u8]> = inputs.iter().map(|b| b.as_slice()).collect();
    let results = links_parallel(&documents);

    let mut list = Term::list_new_empty(env);
    for links in results.iter().rev() {
        list = list.list_prepend(links_to_term(env, links)?);
    }
    Ok(list)
}

fn render_config(
    line_separator: Option<&str>,
    include_hyperlink_urls: bool,
    include_alternate_text: bool,
    convert_non_breaking_spaces: bool,
) -> RenderConfig {
    RenderConfig::new()
        .line_separator(line_separator.unwrap_or_default())
        .include_hyperlink_urls(include_hyperlink_urls)
        .include_alternate_text(include_alternate_text)
        .convert_non_breaking_spaces(convert_non_breaking_spaces)
}

// ============================================================================
// NIF Initialization
// ============================================================================

rustler::init!("Elixir.RustyHTML.Native");
