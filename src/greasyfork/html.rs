//! HTML 文本辅助函数
//!
//! Entity decoding and tag stripping for the few text fragments pulled out
//! of page markup. Not a parser.

use once_cell::sync::Lazy;
use regex::Regex;

static TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

static ENTITY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(?:#(?P<dec>[0-9]{1,7})|#[xX](?P<hex>[0-9a-fA-F]{1,6})|(?P<name>[a-zA-Z]+));").unwrap());

static BLOCK_BREAK_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>|</p>|</li>|</div>").unwrap());

fn named_entity(name: &str) -> Option<&'static str> {
    Some(match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => "\u{a0}",
        "hellip" => "\u{2026}",
        "mdash" => "\u{2014}",
        "ndash" => "\u{2013}",
        "copy" => "\u{a9}",
        _ => return None,
    })
}

/// Decode HTML character references
///
/// Numeric references and the common named ones are decoded; anything else
/// (unknown names, invalid code points) is kept verbatim.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    ENTITY_REGEX
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let decoded = if let Some(dec) = caps.name("dec") {
                dec.as_str()
                    .parse::<u32>()
                    .ok()
                    .and_then(char::from_u32)
                    .map(String::from)
            } else if let Some(hex) = caps.name("hex") {
                u32::from_str_radix(hex.as_str(), 16)
                    .ok()
                    .and_then(char::from_u32)
                    .map(String::from)
            } else {
                caps.name("name")
                    .and_then(|n| named_entity(n.as_str()))
                    .map(String::from)
            };
            decoded.unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Remove tags, decode entities and collapse whitespace
///
/// Block-level breaks become newlines so multi-paragraph change notes keep
/// their shape.
pub fn html_to_text(fragment: &str) -> String {
    let with_breaks = BLOCK_BREAK_REGEX.replace_all(fragment, "\n");
    let stripped = TAG_REGEX.replace_all(&with_breaks, "");
    let decoded = decode_entities(&stripped);

    decoded
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
