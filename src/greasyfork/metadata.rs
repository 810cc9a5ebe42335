//! 脚本主页元数据解析

use reqwest::Url;

use super::html::{decode_entities, html_to_text};
use super::patterns::{CANONICAL_LINK, SCRIPT_AUTHOR, SCRIPT_DESCRIPTION, SCRIPT_NAME};
use crate::models::{ScriptId, ScriptMetadata};
use crate::source::SourceError;

/// Parse the script homepage
///
/// # Errors
/// Parse 错误: 缺少脚本名称或 canonical 链接
pub fn parse_metadata(id: ScriptId, html: &str) -> Result<ScriptMetadata, SourceError> {
    let name = SCRIPT_NAME
        .captures(html)
        .map(|caps| decode_entities(caps["name"].trim()))
        .filter(|n| !n.is_empty())
        .ok_or_else(|| SourceError::parse(format!("脚本 {id} 的主页中没有找到名称")))?;

    let description = SCRIPT_DESCRIPTION
        .captures(html)
        .map(|caps| html_to_text(&caps["description"]))
        .unwrap_or_default();

    let author = SCRIPT_AUTHOR
        .captures(html)
        .map(|caps| decode_entities(caps["author"].trim()))
        .filter(|a| !a.is_empty());

    let canonical = CANONICAL_LINK
        .captures(html)
        .map(|caps| decode_entities(&caps["url"]))
        .ok_or_else(|| SourceError::parse(format!("脚本 {id} 的主页中没有 canonical 链接")))?;

    Ok(ScriptMetadata {
        id,
        name,
        description,
        author,
        slug: slug_from_canonical(id, &canonical),
    })
}

/// `https://greasyfork.org/en/scripts/123-my-script` -> `my-script`
pub fn slug_from_canonical(id: ScriptId, canonical: &str) -> String {
    let last_segment = Url::parse(canonical)
        .ok()
        .and_then(|url| {
            url.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .unwrap_or_else(|| canonical.rsplit('/').next().unwrap_or_default().to_string());

    let id_prefix = id.to_string();
    let rest = last_segment.strip_prefix(id_prefix.as_str()).unwrap_or(&last_segment);
    let rest = rest.strip_prefix('-').unwrap_or(rest);

    urlencoding::decode(rest)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| rest.to_string())
}
