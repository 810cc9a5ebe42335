//! 版本历史页面解析
//!
//! Turns one page of `/scripts/{id}/versions` into descriptors plus the
//! link to the next page, if any. Page fetching and ordering are handled
//! by the client.

use chrono::DateTime;
use reqwest::Url;

use super::html::{decode_entities, html_to_text};
use super::patterns::{
    ANCHOR_TAG, HREF_ATTR, LIST_ITEM_TAG, NEXT_PAGE_MARKER, VERSION_AUTHOR, VERSION_LINK,
    VERSION_TIME,
};
use crate::models::VersionDescriptor;
use crate::source::SourceError;

/// Author used when neither the entry nor the homepage names one
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// One parsed history page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryPage {
    /// Entries in page order (the site lists newest first)
    pub entries: Vec<HistoryEntry>,
    /// Absolute URL of the next page
    pub next: Option<Url>,
}

/// A history entry before the author fallback is applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub seq: u64,
    pub tag: String,
    pub timestamp: DateTime<chrono::FixedOffset>,
    pub author: Option<String>,
    pub note: Option<String>,
}

impl HistoryEntry {
    /// Resolve into a descriptor, filling in the author if the entry had none
    pub fn into_descriptor(self, fallback_author: Option<&str>) -> VersionDescriptor {
        let author = self
            .author
            .or_else(|| fallback_author.map(str::to_string))
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
        VersionDescriptor {
            seq: self.seq,
            tag: self.tag,
            timestamp: self.timestamp,
            author,
            note: self.note,
        }
    }
}

/// Parse one history page
///
/// # Arguments
/// * `html` - Page body
/// * `page_url` - URL the page was fetched from, used to resolve the next link
///
/// # Errors
/// Parse 错误: 页面中没有任何版本条目，或条目的时间无法解析
pub fn parse_history_page(html: &str, page_url: &Url) -> Result<HistoryPage, SourceError> {
    let mut entries = Vec::new();

    for body in top_level_items(html) {
        let Some(link) = VERSION_LINK.captures(body) else {
            // navigation and other list items
            continue;
        };

        let seq = link["seq"]
            .parse::<u64>()
            .map_err(|_| SourceError::parse(format!("版本号无效: {}", &link["seq"])))?;
        let tag = decode_entities(link["tag"].trim());

        let time = VERSION_TIME
            .captures(body)
            .ok_or_else(|| SourceError::parse(format!("版本 {seq} 缺少发布时间")))?;
        let timestamp = DateTime::parse_from_rfc3339(&time["datetime"]).map_err(|e| {
            SourceError::parse(format!("版本 {seq} 的时间无效 ({}): {e}", &time["datetime"]))
        })?;

        // `<time>`, then an optional author link, then the change note
        let after_time = &body[time.get(0).map_or(0, |m| m.end())..];
        let author_caps = VERSION_AUTHOR.captures(after_time);
        let author = author_caps
            .as_ref()
            .map(|caps| decode_entities(caps["author"].trim()))
            .filter(|a| !a.is_empty());
        let note_start = author_caps.and_then(|caps| caps.get(0)).map_or(0, |m| m.end());

        let note = html_to_text(&after_time[note_start..]);
        let note = note.trim_start_matches(['-', '\u{2013}', '\u{2014}']).trim();
        let note = (!note.is_empty()).then(|| note.to_string());

        entries.push(HistoryEntry {
            seq,
            tag,
            timestamp,
            author,
            note,
        });
    }

    if entries.is_empty() {
        return Err(SourceError::parse(format!("{page_url} 中没有找到任何版本条目")));
    }

    Ok(HistoryPage {
        entries,
        next: find_next_page(html, page_url),
    })
}

/// Bodies of the top-level `<li>` elements, nested lists included
///
/// An item left open at the end of the document runs to the end.
fn top_level_items(html: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;

    for caps in LIST_ITEM_TAG.captures_iter(html) {
        let Some(tag) = caps.get(0) else { continue };
        if caps.name("close").is_some() {
            match depth {
                0 => {}
                1 => {
                    items.push(&html[start..tag.start()]);
                    depth = 0;
                }
                _ => depth -= 1,
            }
        } else {
            if depth == 0 {
                start = tag.end();
            }
            depth += 1;
        }
    }
    if depth > 0 {
        items.push(&html[start..]);
    }
    items
}

/// Find the pagination link to the following page
pub fn find_next_page(html: &str, page_url: &Url) -> Option<Url> {
    ANCHOR_TAG
        .find_iter(html)
        .map(|m| m.as_str())
        .filter(|tag| NEXT_PAGE_MARKER.is_match(tag))
        .find_map(|tag| HREF_ATTR.captures(tag))
        .and_then(|caps| page_url.join(&decode_entities(&caps["href"])).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<ul class="history_versions">
<li>
  <input type="radio" name="v1" value="300">
  <input type="radio" name="v2" value="300">
  <a rel="nofollow" href="/en/scripts/12345-demo?version=300">1.2</a>
  <time datetime="2020-03-01T08:30:00+08:00" prefix="v">3/1/2020</time>
  by <a href="/en/users/7-bob">bob</a>
  - Fix &quot;save&quot; button &amp; layout
</li>
<li>
  <input type="radio" name="v1" value="120">
  <input type="radio" name="v2" value="120">
  <a rel="nofollow" href="/en/scripts/12345-demo?version=120">1.1</a>
  <time datetime="2020-02-01T00:00:00+00:00">2/1/2020</time>
</li>
</ul>
<div class="pagination">
  <span class="previous_page disabled">Previous</span>
  <a class="next_page" rel="next" href="/en/scripts/12345-demo/versions?page=2&amp;show_all_versions=1">Next</a>
</div>
"#;

    fn page_url() -> Url {
        Url::parse("https://greasyfork.org/en/scripts/12345/versions?show_all_versions=1").unwrap()
    }

    #[test]
    fn test_parse_entries_in_page_order() {
        let page = parse_history_page(PAGE, &page_url()).unwrap();
        assert_eq!(page.entries.len(), 2);

        let newest = &page.entries[0];
        assert_eq!(newest.seq, 300);
        assert_eq!(newest.tag, "1.2");
        assert_eq!(newest.timestamp.to_rfc3339(), "2020-03-01T08:30:00+08:00");
        assert_eq!(newest.author.as_deref(), Some("bob"));

        let older = &page.entries[1];
        assert_eq!(older.seq, 120);
        assert_eq!(older.author, None);
        assert_eq!(older.note, None);
    }

    #[test]
    fn test_parse_note_is_decoded() {
        let page = parse_history_page(PAGE, &page_url()).unwrap();
        assert_eq!(
            page.entries[0].note.as_deref(),
            Some("Fix \"save\" button & layout")
        );
    }

    #[test]
    fn test_next_page_is_resolved() {
        let page = parse_history_page(PAGE, &page_url()).unwrap();
        assert_eq!(
            page.next.unwrap().as_str(),
            "https://greasyfork.org/en/scripts/12345-demo/versions?page=2&show_all_versions=1"
        );
    }

    #[test]
    fn test_last_page_has_no_next() {
        let html = PAGE.replace("rel=\"next\"", "").replace("class=\"next_page\"", "");
        let page = parse_history_page(&html, &page_url()).unwrap();
        assert!(page.next.is_none());
    }

    #[test]
    fn test_page_without_entries_is_parse_error() {
        let html = "<html><body><ul><li><a href=\"/en/forum\">Forum</a></li></ul></body></html>";
        let err = parse_history_page(html, &page_url()).unwrap_err();
        assert!(matches!(err, SourceError::Parse(_)));
    }

    #[test]
    fn test_invalid_datetime_is_parse_error() {
        let html = r#"<li><a href="/en/scripts/1?version=2">1.0</a><time datetime="yesterday">x</time></li>"#;
        let err = parse_history_page(html, &page_url()).unwrap_err();
        assert!(matches!(err, SourceError::Parse(_)));
    }

    #[test]
    fn test_user_link_in_note_is_not_the_author() {
        let html = r#"<ul><li>
  <a href="/en/scripts/12345-demo?version=5">1.0</a>
  <time datetime="2020-01-01T00:00:00Z">1/1/2020</time>
  - Fixed crash reported by <a href="/en/users/9-carol">carol</a>, thanks
</li></ul>"#;
        let page = parse_history_page(html, &page_url()).unwrap();
        let entry = &page.entries[0];
        assert_eq!(entry.author, None);
        assert_eq!(entry.note.as_deref(), Some("Fixed crash reported by carol, thanks"));
        assert_eq!(entry.clone().into_descriptor(Some("alice")).author, "alice");
    }

    #[test]
    fn test_bulleted_note_keeps_every_item() {
        let html = r#"<ul class="history_versions">
<li>
  <a href="/en/scripts/12345-demo?version=9">2.0</a>
  <time datetime="2020-05-01T00:00:00Z">5/1/2020</time>
  by <a href="/en/users/7-bob">bob</a>
  - <ul><li>Fix A</li><li>Fix B</li><li>Fix C</li></ul>
</li>
<li>
  <a href="/en/scripts/12345-demo?version=8">1.9</a>
  <time datetime="2020-04-01T00:00:00Z">4/1/2020</time>
  - <ol><li>Only <b>one</b></li></ol>
</li>
</ul>"#;
        let page = parse_history_page(html, &page_url()).unwrap();
        assert_eq!(page.entries.len(), 2);
        assert_eq!(page.entries[0].author.as_deref(), Some("bob"));
        assert_eq!(page.entries[0].note.as_deref(), Some("Fix A\nFix B\nFix C"));
        assert_eq!(page.entries[1].seq, 8);
        assert_eq!(page.entries[1].note.as_deref(), Some("Only one"));
    }

    #[test]
    fn test_top_level_items() {
        let html = "<li>a<ul><li>b</li></ul></li></li><li>c";
        assert_eq!(top_level_items(html), vec!["a<ul><li>b</li></ul>", "c"]);
    }

    #[test]
    fn test_author_fallback() {
        let page = parse_history_page(PAGE, &page_url()).unwrap();
        let mut entries = page.entries.into_iter();

        let with_author = entries.next().unwrap().into_descriptor(Some("alice"));
        assert_eq!(with_author.author, "bob");

        let entry = entries.next().unwrap();
        assert_eq!(entry.clone().into_descriptor(Some("alice")).author, "alice");
        assert_eq!(entry.into_descriptor(None).author, UNKNOWN_AUTHOR);
    }
}
