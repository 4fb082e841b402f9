//! HTML Character Reference Decoding
//!
//! Handles decoding of character references:
//! - Named references from the HTML 4 set plus `&apos;`
//! - Numeric character references: &#123; &#x7B; (semicolon optional)
//!
//! Uses Cow for zero-copy when no references are present.

use memchr::memchr;
use std::borrow::Cow;

/// Decode text content, handling character references
///
/// Returns Borrowed if no references present (zero-copy),
/// returns Owned if references were decoded.
#[inline]
pub fn decode_text(input: &str) -> Cow<'_, str> {
    if memchr(b'&', input.as_bytes()).is_none() {
        return Cow::Borrowed(input);
    }
    Cow::Owned(decode_references(input, false))
}

/// Decode an attribute value.
///
/// Same as [`decode_text`] except that a legacy named reference without a
/// terminating `;` is left alone when followed by an alphanumeric or `=`,
/// so query strings such as `?a=1&copy=2` survive intact.
#[inline]
pub fn decode_attribute(input: &str) -> Cow<'_, str> {
    if memchr(b'&', input.as_bytes()).is_none() {
        return Cow::Borrowed(input);
    }
    Cow::Owned(decode_references(input, true))
}

/// Decode, then collapse every run of HTML whitespace into one space and trim.
pub fn decode_collapse_whitespace(input: &str) -> String {
    collapse_whitespace(&decode_text(input))
}

/// Collapse runs of HTML whitespace into single spaces, trimming both ends.
/// Non-breaking spaces are not whitespace here.
pub fn collapse_whitespace(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_space = false;
    for c in input.chars() {
        if is_html_space(c) {
            pending_space = !out.is_empty();
        } else {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(c);
        }
    }
    out
}

/// HTML whitespace characters
#[inline]
pub fn is_html_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\u{0C}')
}

fn decode_references(input: &str, in_attribute: bool) -> String {
    let bytes = input.as_bytes();
    let mut result = String::with_capacity(input.len());
    let mut pos = 0;

    while let Some(amp_offset) = memchr(b'&', &bytes[pos..]) {
        let amp = pos + amp_offset;
        result.push_str(&input[pos..amp]);

        match decode_reference_at(&bytes[amp + 1..], in_attribute) {
            Some((decoded, consumed)) => {
                result.push(decoded);
                pos = amp + 1 + consumed;
            }
            None => {
                // Unknown or malformed reference, keep the ampersand
                result.push('&');
                pos = amp + 1;
            }
        }
    }
    result.push_str(&input[pos..]);

    result
}

/// Decode the reference following an '&'. Returns the character and the number
/// of bytes consumed after the ampersand.
fn decode_reference_at(rest: &[u8], in_attribute: bool) -> Option<(char, usize)> {
    if rest.first() == Some(&b'#') {
        return decode_numeric(&rest[1..]).map(|(c, n)| (c, n + 1));
    }

    let name_len = rest.iter().take_while(|b| b.is_ascii_alphanumeric()).count();
    if name_len == 0 {
        return None;
    }
    let name = &rest[..name_len];

    if rest.get(name_len) == Some(&b';') {
        return lookup_named(name).map(|c| (c, name_len + 1));
    }

    // Missing semicolon: only the legacy references are recognised
    if !is_legacy_name(name) {
        return None;
    }
    if in_attribute {
        if let Some(&next) = rest.get(name_len) {
            if next.is_ascii_alphanumeric() || next == b'=' {
                return None;
            }
        }
    }
    lookup_named(name).map(|c| (c, name_len))
}

/// Decode a numeric character reference body (after '#')
fn decode_numeric(rest: &[u8]) -> Option<(char, usize)> {
    let (radix, prefix) = match rest.first() {
        Some(b'x') | Some(b'X') => (16, 1),
        _ => (10, 0),
    };
    let digits = rest[prefix..]
        .iter()
        .take_while(|b| if radix == 16 { b.is_ascii_hexdigit() } else { b.is_ascii_digit() })
        .count();
    if digits == 0 {
        return None;
    }

    let text = std::str::from_utf8(&rest[prefix..prefix + digits]).ok()?;
    // Overlong values saturate into the invalid range
    let codepoint = u32::from_str_radix(text, radix).unwrap_or(u32::MAX);

    let mut consumed = prefix + digits;
    if rest.get(consumed) == Some(&b';') {
        consumed += 1;
    }

    Some((numeric_to_char(codepoint), consumed))
}

fn numeric_to_char(codepoint: u32) -> char {
    if (0x80..=0x9F).contains(&codepoint) {
        if let Some(c) = windows_1252_c1(codepoint) {
            return c;
        }
    }
    match codepoint {
        0 => '\u{FFFD}',
        _ => char::from_u32(codepoint).unwrap_or('\u{FFFD}'),
    }
}

/// Browsers map C1 control references to their Windows-1252 glyphs
fn windows_1252_c1(codepoint: u32) -> Option<char> {
    let c = match codepoint {
        0x80 => '\u{20AC}',
        0x82 => '\u{201A}',
        0x83 => '\u{0192}',
        0x84 => '\u{201E}',
        0x85 => '\u{2026}',
        0x86 => '\u{2020}',
        0x87 => '\u{2021}',
        0x88 => '\u{02C6}',
        0x89 => '\u{2030}',
        0x8A => '\u{0160}',
        0x8B => '\u{2039}',
        0x8C => '\u{0152}',
        0x8E => '\u{017D}',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x95 => '\u{2022}',
        0x96 => '\u{2013}',
        0x97 => '\u{2014}',
        0x98 => '\u{02DC}',
        0x99 => '\u{2122}',
        0x9A => '\u{0161}',
        0x9B => '\u{203A}',
        0x9C => '\u{0153}',
        0x9E => '\u{017E}',
        0x9F => '\u{0178}',
        _ => return None,
    };
    Some(c)
}

/// References browsers accept without the trailing semicolon
fn is_legacy_name(name: &[u8]) -> bool {
    matches!(
        name,
        b"amp" | b"AMP" | b"lt" | b"LT" | b"gt" | b"GT" | b"quot" | b"QUOT" | b"nbsp" | b"copy" | b"COPY"
            | b"reg" | b"REG"
    )
}

/// Named character references (HTML 4.01 set, plus `apos`)
fn lookup_named(name: &[u8]) -> Option<char> {
    let c = match name {
        // Markup-significant
        b"quot" | b"QUOT" => '"',
        b"amp" | b"AMP" => '&',
        b"apos" => '\'',
        b"lt" | b"LT" => '<',
        b"gt" | b"GT" => '>',
        // Latin-1
        b"nbsp" => '\u{00A0}',
        b"iexcl" => '\u{00A1}',
        b"cent" => '\u{00A2}',
        b"pound" => '\u{00A3}',
        b"curren" => '\u{00A4}',
        b"yen" => '\u{00A5}',
        b"brvbar" => '\u{00A6}',
        b"sect" => '\u{00A7}',
        b"uml" => '\u{00A8}',
        b"copy" | b"COPY" => '\u{00A9}',
        b"ordf" => '\u{00AA}',
        b"laquo" => '\u{00AB}',
        b"not" => '\u{00AC}',
        b"shy" => '\u{00AD}',
        b"reg" | b"REG" => '\u{00AE}',
        b"macr" => '\u{00AF}',
        b"deg" => '\u{00B0}',
        b"plusmn" => '\u{00B1}',
        b"sup2" => '\u{00B2}',
        b"sup3" => '\u{00B3}',
        b"acute" => '\u{00B4}',
        b"micro" => '\u{00B5}',
        b"para" => '\u{00B6}',
        b"middot" => '\u{00B7}',
        b"cedil" => '\u{00B8}',
        b"sup1" => '\u{00B9}',
        b"ordm" => '\u{00BA}',
        b"raquo" => '\u{00BB}',
        b"frac14" => '\u{00BC}',
        b"frac12" => '\u{00BD}',
        b"frac34" => '\u{00BE}',
        b"iquest" => '\u{00BF}',
        b"Agrave" => '\u{00C0}',
        b"Aacute" => '\u{00C1}',
        b"Acirc" => '\u{00C2}',
        b"Atilde" => '\u{00C3}',
        b"Auml" => '\u{00C4}',
        b"Aring" => '\u{00C5}',
        b"AElig" => '\u{00C6}',
        b"Ccedil" => '\u{00C7}',
        b"Egrave" => '\u{00C8}',
        b"Eacute" => '\u{00C9}',
        b"Ecirc" => '\u{00CA}',
        b"Euml" => '\u{00CB}',
        b"Igrave" => '\u{00CC}',
        b"Iacute" => '\u{00CD}',
        b"Icirc" => '\u{00CE}',
        b"Iuml" => '\u{00CF}',
        b"ETH" => '\u{00D0}',
        b"Ntilde" => '\u{00D1}',
        b"Ograve" => '\u{00D2}',
        b"Oacute" => '\u{00D3}',
        b"Ocirc" => '\u{00D4}',
        b"Otilde" => '\u{00D5}',
        b"Ouml" => '\u{00D6}',
        b"times" => '\u{00D7}',
        b"Oslash" => '\u{00D8}',
        b"Ugrave" => '\u{00D9}',
        b"Uacute" => '\u{00DA}',
        b"Ucirc" => '\u{00DB}',
        b"Uuml" => '\u{00DC}',
        b"Yacute" => '\u{00DD}',
        b"THORN" => '\u{00DE}',
        b"szlig" => '\u{00DF}',
        b"agrave" => '\u{00E0}',
        b"aacute" => '\u{00E1}',
        b"acirc" => '\u{00E2}',
        b"atilde" => '\u{00E3}',
        b"auml" => '\u{00E4}',
        b"aring" => '\u{00E5}',
        b"aelig" => '\u{00E6}',
        b"ccedil" => '\u{00E7}',
        b"egrave" => '\u{00E8}',
        b"eacute" => '\u{00E9}',
        b"ecirc" => '\u{00EA}',
        b"euml" => '\u{00EB}',
        b"igrave" => '\u{00EC}',
        b"iacute" => '\u{00ED}',
        b"icirc" => '\u{00EE}',
        b"iuml" => '\u{00EF}',
        b"eth" => '\u{00F0}',
        b"ntilde" => '\u{00F1}',
        b"ograve" => '\u{00F2}',
        b"oacute" => '\u{00F3}',
        b"ocirc" => '\u{00F4}',
        b"otilde" => '\u{00F5}',
        b"ouml" => '\u{00F6}',
        b"divide" => '\u{00F7}',
        b"oslash" => '\u{00F8}',
        b"ugrave" => '\u{00F9}',
        b"uacute" => '\u{00FA}',
        b"ucirc" => '\u{00FB}',
        b"uuml" => '\u{00FC}',
        b"yacute" => '\u{00FD}',
        b"thorn" => '\u{00FE}',
        b"yuml" => '\u{00FF}',
        // Latin Extended and spacing modifiers
        b"OElig" => '\u{0152}',
        b"oelig" => '\u{0153}',
        b"Scaron" => '\u{0160}',
        b"scaron" => '\u{0161}',
        b"Yuml" => '\u{0178}',
        b"fnof" => '\u{0192}',
        b"circ" => '\u{02C6}',
        b"tilde" => '\u{02DC}',
        // Greek
        b"Alpha" => '\u{0391}',
        b"Beta" => '\u{0392}',
        b"Gamma" => '\u{0393}',
        b"Delta" => '\u{0394}',
        b"Epsilon" => '\u{0395}',
        b"Zeta" => '\u{0396}',
        b"Eta" => '\u{0397}',
        b"Theta" => '\u{0398}',
        b"Iota" => '\u{0399}',
        b"Kappa" => '\u{039A}',
        b"Lambda" => '\u{039B}',
        b"Mu" => '\u{039C}',
        b"Nu" => '\u{039D}',
        b"Xi" => '\u{039E}',
        b"Omicron" => '\u{039F}',
        b"Pi" => '\u{03A0}',
        b"Rho" => '\u{03A1}',
        b"Sigma" => '\u{03A3}',
        b"Tau" => '\u{03A4}',
        b"Upsilon" => '\u{03A5}',
        b"Phi" => '\u{03A6}',
        b"Chi" => '\u{03A7}',
        b"Psi" => '\u{03A8}',
        b"Omega" => '\u{03A9}',
        b"alpha" => '\u{03B1}',
        b"beta" => '\u{03B2}',
        b"gamma" => '\u{03B3}',
        b"delta" => '\u{03B4}',
        b"epsilon" => '\u{03B5}',
        b"zeta" => '\u{03B6}',
        b"eta" => '\u{03B7}',
        b"theta" => '\u{03B8}',
        b"iota" => '\u{03B9}',
        b"kappa" => '\u{03BA}',
        b"lambda" => '\u{03BB}',
        b"mu" => '\u{03BC}',
        b"nu" => '\u{03BD}',
        b"xi" => '\u{03BE}',
        b"omicron" => '\u{03BF}',
        b"pi" => '\u{03C0}',
        b"rho" => '\u{03C1}',
        b"sigmaf" => '\u{03C2}',
        b"sigma" => '\u{03C3}',
        b"tau" => '\u{03C4}',
        b"upsilon" => '\u{03C5}',
        b"phi" => '\u{03C6}',
        b"chi" => '\u{03C7}',
        b"psi" => '\u{03C8}',
        b"omega" => '\u{03C9}',
        b"thetasym" => '\u{03D1}',
        b"upsih" => '\u{03D2}',
        b"piv" => '\u{03D6}',
        // General punctuation
        b"ensp" => '\u{2002}',
        b"emsp" => '\u{2003}',
        b"thinsp" => '\u{2009}',
        b"zwnj" => '\u{200C}',
        b"zwj" => '\u{200D}',
        b"lrm" => '\u{200E}',
        b"rlm" => '\u{200F}',
        b"ndash" => '\u{2013}',
        b"mdash" => '\u{2014}',
        b"lsquo" => '\u{2018}',
        b"rsquo" => '\u{2019}',
        b"sbquo" => '\u{201A}',
        b"ldquo" => '\u{201C}',
        b"rdquo" => '\u{201D}',
        b"bdquo" => '\u{201E}',
        b"dagger" => '\u{2020}',
        b"Dagger" => '\u{2021}',
        b"bull" => '\u{2022}',
        b"hellip" => '\u{2026}',
        b"permil" => '\u{2030}',
        b"prime" => '\u{2032}',
        b"Prime" => '\u{2033}',
        b"lsaquo" => '\u{2039}',
        b"rsaquo" => '\u{203A}',
        b"oline" => '\u{203E}',
        b"frasl" => '\u{2044}',
        b"euro" => '\u{20AC}',
        // Letterlike symbols and arrows
        b"image" => '\u{2111}',
        b"weierp" => '\u{2118}',
        b"real" => '\u{211C}',
        b"trade" => '\u{2122}',
        b"alefsym" => '\u{2135}',
        b"larr" => '\u{2190}',
        b"uarr" => '\u{2191}',
        b"rarr" => '\u{2192}',
        b"darr" => '\u{2193}',
        b"harr" => '\u{2194}',
        b"crarr" => '\u{21B5}',
        b"lArr" => '\u{21D0}',
        b"uArr" => '\u{21D1}',
        b"rArr" => '\u{21D2}',
        b"dArr" => '\u{21D3}',
        b"hArr" => '\u{21D4}',
        // Mathematical operators
        b"forall" => '\u{2200}',
        b"part" => '\u{2202}',
        b"exist" => '\u{2203}',
        b"empty" => '\u{2205}',
        b"nabla" => '\u{2207}',
        b"isin" => '\u{2208}',
        b"notin" => '\u{2209}',
        b"ni" => '\u{220B}',
        b"prod" => '\u{220F}',
        b"sum" => '\u{2211}',
        b"minus" => '\u{2212}',
        b"lowast" => '\u{2217}',
        b"radic" => '\u{221A}',
        b"prop" => '\u{221D}',
        b"infin" => '\u{221E}',
        b"ang" => '\u{2220}',
        b"and" => '\u{2227}',
        b"or" => '\u{2228}',
        b"cap" => '\u{2229}',
        b"cup" => '\u{222A}',
        b"int" => '\u{222B}',
        b"there4" => '\u{2234}',
        b"sim" => '\u{223C}',
        b"cong" => '\u{2245}',
        b"asymp" => '\u{2248}',
        b"ne" => '\u{2260}',
        b"equiv" => '\u{2261}',
        b"le" => '\u{2264}',
        b"ge" => '\u{2265}',
        b"sub" => '\u{2282}',
        b"sup" => '\u{2283}',
        b"nsub" => '\u{2284}',
        b"sube" => '\u{2286}',
        b"supe" => '\u{2287}',
        b"oplus" => '\u{2295}',
        b"otimes" => '\u{2297}',
        b"perp" => '\u{22A5}',
        b"sdot" => '\u{22C5}',
        // Misc technical and shapes
        b"lceil" => '\u{2308}',
        b"rceil" => '\u{2309}',
        b"lfloor" => '\u{230A}',
        b"rfloor" => '\u{230B}',
        b"lang" => '\u{2329}',
        b"rang" => '\u{232A}',
        b"loz" => '\u{25CA}',
        b"spades" => '\u{2660}',
        b"clubs" => '\u{2663}',
        b"hearts" => '\u{2665}',
        b"diams" => '\u{2666}',
        _ => return None,
    };
    Some(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_references() {
        let result = decode_text("Hello, World!");
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, "Hello, World!");
    }

    #[test]
    fn test_basic_references() {
        assert_eq!(decode_text("&lt;hello&gt; &amp; &quot;world&quot;"), "<hello> & \"world\"");
    }

    #[test]
    fn test_numeric_decimal_and_hex() {
        assert_eq!(decode_text("&#65;&#x42;&#X43;"), "ABC");
        assert_eq!(decode_text("&#169;"), "\u{00A9}");
    }

    #[test]
    fn test_numeric_without_semicolon() {
        assert_eq!(decode_text("&#65B"), "AB");
    }

    #[test]
    fn test_c1_numeric_maps_to_windows_1252() {
        assert_eq!(decode_text("&#150;&#x80;"), "\u{2013}\u{20AC}");
    }

    #[test]
    fn test_invalid_codepoints_become_replacement() {
        assert_eq!(decode_text("&#0;&#xD800;&#99999999999;"), "\u{FFFD}\u{FFFD}\u{FFFD}");
    }

    #[test]
    fn test_unknown_reference_is_kept() {
        assert_eq!(decode_text("&unknown; & &;"), "&unknown; & &;");
    }

    #[test]
    fn test_legacy_reference_without_semicolon() {
        assert_eq!(decode_text("fish &amp chips"), "fish & chips");
        assert_eq!(decode_text("&eacute"), "&eacute");
    }

    #[test]
    fn test_attribute_keeps_query_strings() {
        assert_eq!(decode_attribute("page?a=1&copy=2"), "page?a=1&copy=2");
        assert_eq!(decode_attribute("page?a=1&amp;b=2"), "page?a=1&b=2");
    }

    #[test]
    fn test_nbsp_is_not_collapsed() {
        assert_eq!(decode_collapse_whitespace("  a&nbsp;\n\t b  "), "a\u{00A0} b");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("\n  Nuxeo   HTMLParser\tRocks!  "), "Nuxeo HTMLParser Rocks!");
        assert_eq!(collapse_whitespace("   "), "");
    }
}
