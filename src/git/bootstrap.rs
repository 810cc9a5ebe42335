//! 初始 README 提交
//!
//! A fresh repository starts with a README commit describing where the
//! history came from. It carries no version trailer, so it never counts as
//! a migrated version.

use chrono::{DateTime, FixedOffset};
use git2::{Oid, Signature};

use super::error::GitError;
use super::materializer::{author_email, git_time, signature_name, HistoryMaterializer};
use crate::models::ScriptMetadata;

/// Message of the README commit
pub const BOOTSTRAP_MESSAGE: &str = "Init with greasygit";

const README_FILE: &str = "README.md";

/// Name used for the README commit when git has no configured identity and
/// the script has no known author
const BOOTSTRAP_NAME: &str = "greasygit";

/// README 内容
pub fn render_readme(metadata: &ScriptMetadata, script_url: &str) -> String {
    let mut readme = format!("# {}\n", metadata.name);
    if !metadata.description.is_empty() {
        readme.push_str(&metadata.description);
        readme.push('\n');
    }
    readme.push_str(&format!(
        "\n[Migrated from Greasy Fork]({script_url})\nwith the help of greasygit.\n"
    ));
    readme
}

impl HistoryMaterializer {
    /// 在空仓库中创建 README 提交
    ///
    /// # Arguments
    /// * `readme` - README 内容
    /// * `at` - 提交时间，通常取第一个版本的发布时间，保证历史按时间排列
    ///
    /// # Returns
    /// 仓库已有提交时不做任何事并返回 None
    pub fn bootstrap_readme(
        &self,
        readme: &str,
        at: &DateTime<FixedOffset>,
        author: Option<&str>,
    ) -> Result<Option<Oid>, GitError> {
        if !self.is_unborn()? {
            return Ok(None);
        }

        let repo = self.repository();
        let when = git_time(at);
        let signature = match repo.signature() {
            Ok(configured) => Signature::new(
                configured.name().unwrap_or(BOOTSTRAP_NAME),
                configured.email().unwrap_or_default(),
                &when,
            )?,
            Err(_) => {
                let name = signature_name(author.unwrap_or(BOOTSTRAP_NAME));
                let email = author_email(&name, &self.options().email_domain);
                Signature::new(&name, &email, &when)?
            }
        };

        let oid = self.commit_file(README_FILE, readme, &signature, BOOTSTRAP_MESSAGE)?;
        tracing::info!(commit = %oid, "created README commit");
        Ok(Some(oid))
    }
}
