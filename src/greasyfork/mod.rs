//! Greasy Fork 站点客户端
//!
//! Implements [`MetadataSource`], [`VersionLister`] and [`ContentFetcher`]
//! against greasyfork.org (or any site serving the same markup, e.g.
//! sleazyfork.org or a test server). Page-structure knowledge is confined
//! to [`patterns`] and the parsing submodules.

pub mod code;
pub mod history;
pub mod html;
pub mod metadata;
pub mod patterns;

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, StatusCode, Url};

use crate::config::MigrationConfig;
use crate::models::{ScriptId, ScriptMetadata, VersionContent, VersionDescriptor, VersionHistory};
use crate::source::{ContentFetcher, MetadataSource, SourceError, VersionLister};

/// Default site root
pub const DEFAULT_BASE_URL: &str = "https://greasyfork.org";

/// A fetched response body
struct Fetched {
    content_type: Option<String>,
    body: String,
}

/// Greasy Fork HTTP client
pub struct GreasyForkClient {
    http_client: reqwest::Client,
    base_url: Url,
    all_versions: bool,
    max_pages: usize,
    /// Homepage metadata already fetched by this client
    metadata_cache: Mutex<HashMap<ScriptId, ScriptMetadata>>,
}

impl GreasyForkClient {
    /// 根据配置创建客户端
    ///
    /// # Errors
    /// base_url 无效或 HTTP 客户端无法构建时返回错误
    pub fn new(config: &MigrationConfig) -> Result<Self, SourceError> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SourceError::network(e.to_string()))?;
        Self::with_client(http_client, config)
    }

    /// 使用自定义 HTTP 客户端创建
    pub fn with_client(
        http_client: reqwest::Client,
        config: &MigrationConfig,
    ) -> Result<Self, SourceError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| SourceError::network(format!("无效的站点地址 {}: {e}", config.base_url)))?;
        Ok(Self {
            http_client,
            base_url,
            all_versions: config.all_versions,
            max_pages: config.max_pages,
            metadata_cache: Mutex::new(HashMap::new()),
        })
    }

    fn url(&self, path: &str) -> Result<Url, SourceError> {
        self.base_url
            .join(path)
            .map_err(|e| SourceError::network(format!("无法构建 URL {path}: {e}")))
    }

    /// `/en/scripts/{id}`
    pub fn homepage_url(&self, script: ScriptId) -> Result<Url, SourceError> {
        self.url(&format!("/en/scripts/{script}"))
    }

    /// `/en/scripts/{id}/versions`, with `show_all_versions=1` when configured
    pub fn history_url(&self, script: ScriptId) -> Result<Url, SourceError> {
        let mut url = self.url(&format!("/en/scripts/{script}/versions"))?;
        if self.all_versions {
            url.query_pairs_mut().append_pair("show_all_versions", "1");
        }
        Ok(url)
    }

    /// `/scripts/{id}/code/code.js?version={seq}`
    pub fn code_url(&self, script: ScriptId, seq: u64) -> Result<Url, SourceError> {
        let mut url = self.url(&format!("/scripts/{script}/code/code.js"))?;
        url.query_pairs_mut().append_pair("version", &seq.to_string());
        Ok(url)
    }

    fn cached_metadata(&self, script: ScriptId) -> Option<ScriptMetadata> {
        self.metadata_cache
            .lock()
            .ok()
            .and_then(|cache| cache.get(&script).cloned())
    }

    async fn get(&self, url: Url) -> Result<Fetched, SourceError> {
        tracing::debug!(%url, "GET");

        let response = self
            .http_client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| SourceError::network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(SourceError::not_found(url.to_string()));
        }
        if !status.is_success() {
            return Err(SourceError::network(format!("HTTP {status}: {url}")));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .await
            .map_err(|e| SourceError::network(e.to_string()))?;

        Ok(Fetched { content_type, body })
    }
}

#[async_trait]
impl MetadataSource for GreasyForkClient {
    /// The homepage is requested once per script; later calls (such as the
    /// author fallback of [`VersionLister::list_versions`]) reuse it.
    async fn fetch_metadata(&self, script: ScriptId) -> Result<ScriptMetadata, SourceError> {
        if let Some(cached) = self.cached_metadata(script) {
            tracing::debug!(%script, "using cached metadata");
            return Ok(cached);
        }

        let page = self.get(self.homepage_url(script)?).await?;
        let parsed = metadata::parse_metadata(script, &page.body)?;
        if let Ok(mut cache) = self.metadata_cache.lock() {
            cache.insert(script, parsed.clone());
        }
        Ok(parsed)
    }
}

#[async_trait]
impl VersionLister for GreasyForkClient {
    async fn list_versions(&self, script: ScriptId) -> Result<VersionHistory, SourceError> {
        let mut entries = Vec::new();
        let mut next = Some(self.history_url(script)?);
        let mut pages = 0usize;

        while let Some(page_url) = next.take() {
            pages += 1;
            if pages > self.max_pages {
                return Err(SourceError::parse(format!(
                    "脚本 {script} 的历史超过 {} 页，分页链接可能有误",
                    self.max_pages
                )));
            }

            let page = self.get(page_url.clone()).await?;
            let parsed = history::parse_history_page(&page.body, &page_url)?;
            tracing::debug!(%page_url, entries = parsed.entries.len(), "parsed history page");

            entries.extend(parsed.entries);
            next = parsed.next;
        }

        // the homepage is only needed when some entry carries no author
        let fallback_author = if entries.iter().any(|e| e.author.is_none()) {
            self.fetch_metadata(script).await?.author
        } else {
            None
        };

        let descriptors: Vec<VersionDescriptor> = entries
            .into_iter()
            .map(|e| e.into_descriptor(fallback_author.as_deref()))
            .collect();

        let history = VersionHistory::from_unordered(descriptors)
            .map_err(|seq| SourceError::parse(format!("脚本 {script} 的历史中版本 {seq} 重复出现")))?;

        let violations = history.chronology_violations();
        if !violations.is_empty() {
            tracing::warn!(?violations, "version timestamps are not in sequence order");
        }

        tracing::info!(%script, versions = history.len(), pages, "listed versions");
        Ok(history)
    }
}

#[async_trait]
impl ContentFetcher for GreasyForkClient {
    async fn fetch_content(
        &self,
        script: ScriptId,
        version: &VersionDescriptor,
    ) -> Result<VersionContent, SourceError> {
        let page = self.get(self.code_url(script, version.seq)?).await?;
        code::extract_code(version.seq, page.content_type.as_deref(), page.body)
    }
}

#[cfg(test)]
mod tests;
