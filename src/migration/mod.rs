//! 迁移流程
//!
//! Drives the three stages for one script: list versions, fetch the
//! content of every version not yet in the target repository, then
//! materialize them as commits. Fetching finishes before anything is
//! committed, so a failed fetch leaves the target untouched.

use std::path::PathBuf;

use serde::Serialize;

use crate::config::{validate_script_file, MigrationConfig};
use crate::error::AppError;
use crate::git::{self, CommittedVersion, HistoryMaterializer, MaterializerOptions};
use crate::models::{ScriptId, ScriptMetadata, VersionPair};
use crate::source::{ContentFetcher, VersionLister};

/// What to migrate and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationPlan {
    pub script: ScriptId,
    /// Repository directory, created if missing
    pub target_dir: PathBuf,
    /// Tracked script file, relative to the repository root
    pub script_file: String,
}

/// Outcome of one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationSummary {
    /// Versions listed upstream
    pub listed: usize,
    /// Versions fetched by this run
    pub fetched: usize,
    /// Versions committed by this run
    pub committed: Vec<CommittedVersion>,
    /// Versions already present in the target
    pub skipped: Vec<u64>,
    /// README commit, when one was created
    pub readme_commit: Option<String>,
    /// Tags created
    pub tags: Vec<String>,
    /// HEAD after the run
    pub head: Option<String>,
}

/// Pipeline driver
pub struct Migrator<'a> {
    lister: &'a dyn VersionLister,
    fetcher: &'a dyn ContentFetcher,
    config: &'a MigrationConfig,
}

impl<'a> Migrator<'a> {
    pub fn new(
        lister: &'a dyn VersionLister,
        fetcher: &'a dyn ContentFetcher,
        config: &'a MigrationConfig,
    ) -> Self {
        Self {
            lister,
            fetcher,
            config,
        }
    }

    fn materializer_options(&self, plan: &MigrationPlan) -> MaterializerOptions {
        MaterializerOptions {
            script_file: plan.script_file.clone(),
            initial_branch: self.config.initial_branch.clone(),
            email_domain: self.config.email_domain.clone(),
        }
    }

    /// Link to the script used in the README
    pub fn script_url(&self, script: ScriptId) -> String {
        format!("{}/scripts/{script}", self.config.base_url.trim_end_matches('/'))
    }

    /// 执行一次迁移
    ///
    /// # Arguments
    /// * `plan` - 脚本与目标目录
    /// * `metadata` - 脚本主页元数据 (README 与默认作者)
    ///
    /// # Errors
    /// 任何错误都会终止本次运行；抓取阶段的错误带有出错的版本序号
    pub async fn run(
        &self,
        plan: &MigrationPlan,
        metadata: &ScriptMetadata,
    ) -> Result<MigrationSummary, AppError> {
        validate_script_file(&plan.script_file)?;

        tracing::info!(script = %plan.script, "listing versions");
        let history = self.lister.list_versions(plan.script).await?;
        let listed = history.len();
        let first_published = history.first().map(|v| v.timestamp);

        let materializer =
            HistoryMaterializer::open_or_init(&plan.target_dir, self.materializer_options(plan))?;
        let migrated = materializer.migrated_versions()?;
        let pending = HistoryMaterializer::pending(&migrated, history.seqs())?;
        let skipped: Vec<u64> = history.seqs().filter(|seq| migrated.contains_key(seq)).collect();

        if pending.is_empty() {
            tracing::info!(versions = listed, "target is already up to date");
        } else {
            tracing::info!(pending = pending.len(), already = skipped.len(), "fetching versions");
        }

        let mut pairs = Vec::with_capacity(pending.len());
        for descriptor in history {
            if pending.binary_search(&descriptor.seq).is_err() {
                continue;
            }
            let seq = descriptor.seq;
            tracing::info!(seq, tag = %descriptor.tag, "fetching version");

            let content = self
                .fetcher
                .fetch_content(plan.script, &descriptor)
                .await
                .map_err(|e| AppError::at_version(seq, e))?;
            pairs.push(VersionPair::new(descriptor, content).map_err(|e| AppError::at_version(seq, e))?);
        }
        let fetched = pairs.len();

        let readme_commit = match first_published {
            Some(at) if self.config.readme => {
                let readme = git::render_readme(metadata, &self.script_url(plan.script));
                materializer.bootstrap_readme(&readme, &at, metadata.author.as_deref())?
            }
            _ => None,
        };

        let report = materializer.materialize(pairs)?;

        let tags = if self.config.tag_versions {
            git::tag_versions(materializer.repository(), &report.created)?
        } else {
            Vec::new()
        };

        tracing::info!(
            committed = report.created.len(),
            skipped = skipped.len(),
            tags = tags.len(),
            "migration finished"
        );

        Ok(MigrationSummary {
            listed,
            fetched,
            committed: report.created,
            skipped,
            readme_commit: readme_commit.map(|oid| oid.to_string()),
            tags,
            head: report.head,
        })
    }
}
