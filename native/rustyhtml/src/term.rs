//! Elixir Term Conversion Utilities
//!
//! Converts extraction results to Elixir terms.

use crate::error::HtmlError;
use crate::links::LinkInfo;
use rustler::{Atom, Encoder, Env, NewBinary, NifResult, Term};

// Pre-defined atoms for efficiency - created once at compile time
rustler::atoms! {
    ok,
    error,
    tag,
    attribute,
    text,
    link,
}

/// Convert a link record to `%{tag: .., attribute: .., text: .., link: ..}`
pub fn link_to_term<'a>(env: Env<'a>, info: &LinkInfo) -> NifResult<Term<'a>> {
    let pairs = [
        (tag().encode(env), str_to_binary(env, info.tag())),
        (attribute().encode(env), str_to_binary(env, info.attribute())),
        (text().encode(env), str_to_binary(env, info.text())),
        (link().encode(env), str_to_binary(env, info.link())),
    ];
    Term::map_from_pairs(env, &pairs)
}

/// Convert link records to a list of maps, preserving order
pub fn links_to_term<'a>(env: Env<'a>, links: &[LinkInfo]) -> NifResult<Term<'a>> {
    let mut list = Term::list_new_empty(env);
    for info in links.iter().rev() {
        list = list.list_prepend(link_to_term(env, info)?);
    }
    Ok(list)
}

/// Convert strings to a list of binaries
pub fn strings_to_term<'a>(env: Env<'a>, strings: &[String]) -> Term<'a> {
    let mut list = Term::list_new_empty(env);
    for s in strings.iter().rev() {
        list = list.list_prepend(str_to_binary(env, s));
    }
    list
}

/// Convert `(key, value)` pairs to a map with binary keys.
/// Keys must be unique.
pub fn info_to_term<'a>(env: Env<'a>, info: &[(String, String)]) -> NifResult<Term<'a>> {
    let pairs: Vec<(Term<'a>, Term<'a>)> = info
        .iter()
        .map(|(key, value)| (str_to_binary(env, key), str_to_binary(env, value)))
        .collect();
    Term::map_from_pairs(env, &pairs)
}

/// `{:error, reason}` for an input acquisition failure
pub fn error_to_term<'a>(env: Env<'a>, err: &HtmlError) -> NifResult<Term<'a>> {
    let reason = Atom::from_str(env, err.reason())?;
    Ok((error(), reason).encode(env))
}

/// Convert a string to a binary term (more efficient than .encode())
#[inline]
pub fn str_to_binary<'a>(env: Env<'a>, s: &str) -> Term<'a> {
    let bytes = s.as_bytes();
    let mut binary = NewBinary::new(env, bytes.len());
    binary.as_mut_slice().copy_from_slice(bytes);
    binary.into()
}
