//! Greasy Fork 页面匹配规则
//!
//! Every assumption about the site's markup lives in this file. When the
//! site changes its templates, this is the file to update.

use once_cell::sync::Lazy;
use regex::Regex;

/// Opening or closing `<li>` tag
///
/// History entries are the top-level items; change notes are rendered
/// markdown and may nest their own lists.
pub static LIST_ITEM_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<(?P<close>/)?li\b[^>]*>").unwrap());

/// Link to a specific version: `href="/en/scripts/123-name?version=456">1.2.0</a>`
pub static VERSION_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"<a\b[^>]*\bhref="[^"]*/scripts/\d+[^"?]*\?(?:[^"]*&(?:amp;)?)?version=(?P<seq>\d+)[^"]*"[^>]*>(?P<tag>[^<]*)</a>"#,
    )
    .unwrap()
});

/// Publication time of a version
pub static VERSION_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<time\b[^>]*\bdatetime="(?P<datetime>[^"]+)"[^>]*>.*?</time>"#).unwrap());

/// Author link of a history entry, directly after its `<time>` element
///
/// Anchored: user links further on belong to the change note.
pub static VERSION_AUTHOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*(?:by\s+)?<a\b[^>]*\bhref="[^"]*/users/[^"]*"[^>]*>(?P<author>[^<]+)</a>"#).unwrap()
});

/// Any `<a ...>` opening tag, used to find the pagination link
pub static ANCHOR_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<a\b[^>]*>").unwrap());

/// Marks the anchor as the "next page" link
pub static NEXT_PAGE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\brel="next"|\bclass="[^"]*\bnext_page\b[^"]*""#).unwrap());

/// `href` attribute value
pub static HREF_ATTR: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\bhref="(?P<href>[^"]+)""#).unwrap());

/// Script name on the homepage
pub static SCRIPT_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<header>\s*<h2[^>]*>(?P<name>[^<]+)</h2>").unwrap());

/// Script description on the homepage
pub static SCRIPT_DESCRIPTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)<p\b[^>]*\bid="script-description"[^>]*>(?P<description>.*?)</p>"#).unwrap());

/// Script author on the homepage
pub static SCRIPT_AUTHOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<dd\b[^>]*\bclass="[^"]*\bscript-show-author\b[^"]*"[^>]*>.*?<a\b[^>]*>(?P<author>[^<]+)</a>"#)
        .unwrap()
});

/// Canonical link of the homepage, carries the slug
pub static CANONICAL_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<link\b[^>]*\brel="canonical"[^>]*\bhref="(?P<url>[^"]+)""#).unwrap());

/// Code block of an HTML-rendered code page
pub static CODE_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<pre\b[^>]*>(?P<code>.*?)</pre>").unwrap());
