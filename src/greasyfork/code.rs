//! 代码内容提取
//!
//! The code endpoint normally answers with the raw script. When it answers
//! with a rendered page instead, the script is recovered from the first
//! `<pre>` block and entity-decoded here, so callers always get literal
//! source text.

use super::html::decode_entities;
use super::patterns::CODE_BLOCK;
use crate::models::VersionContent;
use crate::source::SourceError;

/// Whether a response looks like a rendered HTML page
pub fn is_html_response(content_type: Option<&str>, body: &str) -> bool {
    if content_type.is_some_and(|ct| ct.to_ascii_lowercase().contains("text/html")) {
        return true;
    }
    let head: String = body.trim_start().chars().take(15).collect::<String>().to_ascii_lowercase();
    head.starts_with("<!doctype html") || head.starts_with("<html")
}

/// Build the content of version `seq` from a code response
///
/// # Errors
/// Parse 错误: HTML 页面中没有代码块，或代码为空
pub fn extract_code(
    seq: u64,
    content_type: Option<&str>,
    body: String,
) -> Result<VersionContent, SourceError> {
    let text = if is_html_response(content_type, &body) {
        let caps = CODE_BLOCK
            .captures(&body)
            .ok_or_else(|| SourceError::parse(format!("版本 {seq} 的代码页面中没有 <pre> 代码块")))?;
        decode_entities(&caps["code"])
    } else {
        body
    };

    if text.trim().is_empty() {
        return Err(SourceError::parse(format!("版本 {seq} 的代码为空")));
    }

    Ok(VersionContent::new(seq, text))
}
