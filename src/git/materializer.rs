//! History Materializer 核心实现
//!
//! 提供历史重建功能：
//! - 打开或初始化目标仓库
//! - 识别已迁移的版本 (基于提交信息中的 trailer)
//! - 按序号升序为每个新版本创建一个提交，作者与时间取自版本描述

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use git2::{
    Commit, ErrorCode, Index, IndexEntry, IndexTime, Oid, Repository, RepositoryInitOptions,
    Signature, Time,
};
use serde::Serialize;

use super::error::GitError;
use super::trailer;
use crate::config::{DEFAULT_BRANCH, DEFAULT_EMAIL_DOMAIN};
use crate::models::{VersionDescriptor, VersionPair};

/// Committer name used when a version has no author
const FALLBACK_NAME: &str = "Unknown";

/// Regular, non-executable file
const FILE_MODE: u32 = 0o100_644;

/// 提交选项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializerOptions {
    /// Tracked script file, relative to the repository root
    pub script_file: String,
    /// Branch created in a fresh repository
    pub initial_branch: String,
    /// Domain of synthesized author e-mail addresses
    pub email_domain: String,
}

impl MaterializerOptions {
    pub fn new(script_file: impl Into<String>) -> Self {
        Self {
            script_file: script_file.into(),
            initial_branch: DEFAULT_BRANCH.to_string(),
            email_domain: DEFAULT_EMAIL_DOMAIN.to_string(),
        }
    }
}

/// A version committed by this run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommittedVersion {
    pub seq: u64,
    /// Version label, used for tagging
    pub tag: String,
    /// Commit SHA
    pub commit_hash: String,
}

/// 一次 materialize 的结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MaterializeReport {
    /// Versions committed by this call, ascending
    pub created: Vec<CommittedVersion>,
    /// Versions that were already present
    pub skipped: Vec<u64>,
    /// HEAD after the call
    pub head: Option<String>,
}

/// Writes version pairs into a git repository
pub struct HistoryMaterializer {
    repo: Repository,
    options: MaterializerOptions,
}

impl HistoryMaterializer {
    /// 打开或初始化目标仓库
    ///
    /// - 目录不存在: 创建目录并初始化
    /// - 空目录: 初始化
    /// - 已有非 bare 仓库: 打开
    /// - 其他情况: NotARepository
    pub fn open_or_init(target: &Path, options: MaterializerOptions) -> Result<Self, GitError> {
        if !target.exists() {
            fs::create_dir_all(target).map_err(|e| GitError::io(target, e))?;
            tracing::info!(path = %target.display(), "initializing repository");
            return Self::init(target, options);
        }

        if !target.is_dir() {
            return Err(GitError::NotARepository(target.display().to_string()));
        }

        match Repository::open(target) {
            Ok(repo) => {
                if repo.is_bare() {
                    return Err(GitError::NotARepository(target.display().to_string()));
                }
                tracing::debug!(path = %target.display(), "opened existing repository");
                Ok(Self { repo, options })
            }
            Err(e) if e.code() == ErrorCode::NotFound => {
                let mut entries = fs::read_dir(target).map_err(|e| GitError::io(target, e))?;
                if entries.next().is_some() {
                    return Err(GitError::NotARepository(target.display().to_string()));
                }
                tracing::info!(path = %target.display(), "initializing repository in empty directory");
                Self::init(target, options)
            }
            Err(e) => Err(GitError::RepositoryError(e)),
        }
    }

    fn init(target: &Path, options: MaterializerOptions) -> Result<Self, GitError> {
        let mut init_options = RepositoryInitOptions::new();
        init_options.initial_head(&options.initial_branch);
        let repo = Repository::init_opts(target, &init_options)?;
        Ok(Self { repo, options })
    }

    /// 底层仓库
    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    pub fn options(&self) -> &MaterializerOptions {
        &self.options
    }

    /// Working directory of the repository
    pub fn workdir(&self) -> Result<PathBuf, GitError> {
        self.repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| GitError::NotARepository("bare repository has no workdir".to_string()))
    }

    /// HEAD 指向的提交；分支尚未创建时返回 None
    pub fn head_commit(&self) -> Result<Option<Commit<'_>>, GitError> {
        match self.repo.head() {
            Ok(head) => Ok(Some(head.peel_to_commit()?)),
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => Ok(None),
            Err(e) => Err(GitError::RepositoryError(e)),
        }
    }

    /// Whether the repository has no commits yet
    pub fn is_unborn(&self) -> Result<bool, GitError> {
        Ok(self.head_commit()?.is_none())
    }

    /// 已迁移的版本: 序号 -> 提交
    ///
    /// Walks the first-parent history of HEAD; commits without a trailer
    /// (README, manual edits) are ignored.
    pub fn migrated_versions(&self) -> Result<BTreeMap<u64, Oid>, GitError> {
        let mut migrated = BTreeMap::new();
        if self.is_unborn()? {
            return Ok(migrated);
        }

        let mut revwalk = self.repo.revwalk()?;
        revwalk.push_head()?;
        revwalk.simplify_first_parent()?;

        for oid_result in revwalk {
            let oid = oid_result?;
            let commit = self.repo.find_commit(oid)?;
            if let Some(seq) = commit.message().and_then(trailer::parse_seq) {
                migrated.entry(seq).or_insert(oid);
            }
        }
        Ok(migrated)
    }

    /// Sequence numbers of `seqs` that still need a commit
    ///
    /// # Errors
    /// - UnorderedInput: `seqs` is not strictly ascending
    /// - OutOfOrder: a missing version is older than the newest migrated one
    pub fn pending(
        migrated: &BTreeMap<u64, Oid>,
        seqs: impl IntoIterator<Item = u64>,
    ) -> Result<Vec<u64>, GitError> {
        let newest = migrated.keys().next_back().copied();
        let mut previous: Option<u64> = None;
        let mut pending = Vec::new();

        for seq in seqs {
            if let Some(prev) = previous {
                if seq <= prev {
                    return Err(GitError::UnorderedInput { previous: prev, seq });
                }
            }
            previous = Some(seq);

            if migrated.contains_key(&seq) {
                continue;
            }
            if let Some(newest) = newest {
                if seq < newest {
                    return Err(GitError::OutOfOrder { seq, newest });
                }
            }
            pending.push(seq);
        }
        Ok(pending)
    }

    /// 按序号升序提交所有尚未迁移的版本
    ///
    /// The whole input is validated before anything is written, so an
    /// ordering error leaves the repository untouched.
    pub fn materialize(
        &self,
        pairs: impl IntoIterator<Item = VersionPair>,
    ) -> Result<MaterializeReport, GitError> {
        let pairs: Vec<VersionPair> = pairs.into_iter().collect();
        let migrated = self.migrated_versions()?;
        Self::pending(&migrated, pairs.iter().map(VersionPair::seq))?;

        let mut report = MaterializeReport::default();
        for pair in &pairs {
            if migrated.contains_key(&pair.seq()) {
                tracing::debug!(seq = pair.seq(), "already migrated, skipping");
                report.skipped.push(pair.seq());
                continue;
            }

            let oid = self.commit_version(pair)?;
            tracing::info!(
                seq = pair.seq(),
                tag = %pair.descriptor.tag,
                commit = %oid,
                "committed version"
            );
            report.created.push(CommittedVersion {
                seq: pair.seq(),
                tag: pair.descriptor.tag.clone(),
                commit_hash: oid.to_string(),
            });
        }

        report.head = self.head_commit()?.map(|c| c.id().to_string());
        Ok(report)
    }

    /// Commit one version on top of HEAD
    fn commit_version(&self, pair: &VersionPair) -> Result<Oid, GitError> {
        let seq = pair.seq();
        let rejected = |source: git2::Error| GitError::CommitRejected { seq, source };

        let signature = self.signature(&pair.descriptor).map_err(rejected)?;
        let message = trailer::compose_message(&pair.descriptor.commit_subject(), seq);

        // identical trees are committed as well: an empty diff still records
        // that nothing changed between the two timestamps
        self.commit_file(&self.options.script_file, &pair.content.text, &signature, &message)
            .map_err(|e| match e {
                GitError::RepositoryError(source) => rejected(source),
                other => other,
            })
    }

    /// Commit `content` at `relative` on top of HEAD
    ///
    /// The tree is HEAD's tree plus this one file, built in a detached
    /// index: whatever is staged in the repository stays staged and out of
    /// the commit. Afterwards the working tree and the repository index are
    /// updated for this file only.
    pub(crate) fn commit_file(
        &self,
        relative: &str,
        content: &str,
        signature: &Signature<'_>,
        message: &str,
    ) -> Result<Oid, GitError> {
        let parent = self.head_commit()?;

        let mut index = Index::new()?;
        if let Some(parent) = &parent {
            index.read_tree(&parent.tree()?)?;
        }
        let blob = self.repo.blob(content.as_bytes())?;
        index.add(&IndexEntry {
            ctime: IndexTime::new(0, 0),
            mtime: IndexTime::new(0, 0),
            dev: 0,
            ino: 0,
            mode: FILE_MODE,
            uid: 0,
            gid: 0,
            file_size: u32::try_from(content.len()).unwrap_or(u32::MAX),
            id: blob,
            flags: 0,
            flags_extended: 0,
            path: relative.as_bytes().to_vec(),
        })?;
        let tree = self.repo.find_tree(index.write_tree_to(&self.repo)?)?;

        let parents: Vec<&Commit<'_>> = parent.iter().collect();
        let oid = self
            .repo
            .commit(Some("HEAD"), signature, signature, message, &tree, &parents)?;

        self.write_file(relative, content)?;
        let mut repo_index = self.repo.index()?;
        repo_index.add_path(Path::new(relative))?;
        repo_index.write()?;

        Ok(oid)
    }

    /// Write a file relative to the working directory
    pub(crate) fn write_file(&self, relative: &str, content: &str) -> Result<(), GitError> {
        let path = self.workdir()?.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| GitError::io(parent, e))?;
        }
        fs::write(&path, content.as_bytes()).map_err(|e| GitError::io(&path, e))
    }

    /// Author and committer of a version commit
    fn signature(&self, descriptor: &VersionDescriptor) -> Result<Signature<'static>, git2::Error> {
        let name = signature_name(&descriptor.author);
        let email = author_email(&name, &self.options.email_domain);
        Signature::new(&name, &email, &git_time(&descriptor.timestamp))
    }
}

/// 一次性入口：打开/初始化目标目录并提交所有版本
pub fn materialize(
    target: &Path,
    pairs: impl IntoIterator<Item = VersionPair>,
    options: MaterializerOptions,
) -> Result<MaterializeReport, GitError> {
    HistoryMaterializer::open_or_init(target, options)?.materialize(pairs)
}

/// Convert a timestamp, keeping its UTC offset
pub fn git_time(timestamp: &DateTime<FixedOffset>) -> Time {
    Time::new(timestamp.timestamp(), timestamp.offset().local_minus_utc() / 60)
}

/// Author name as git accepts it
///
/// libgit2 rejects angle brackets and line breaks in signatures; they are
/// dropped and whitespace is collapsed. An empty result becomes `Unknown`.
pub fn signature_name(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '<' | '>'))
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let name = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if name.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        name
    }
}

/// `Alice Smith` -> `alice-smith@<domain>`
pub fn author_email(name: &str, domain: &str) -> String {
    let mut local = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '.' || c == '_' {
            local.push(c.to_ascii_lowercase());
        } else if !local.ends_with('-') {
            local.push('-');
        }
    }
    let local = local.trim_matches(|c| c == '-' || c == '.');
    let local = if local.is_empty() { "unknown" } else { local };
    format!("{local}@{domain}")
}
