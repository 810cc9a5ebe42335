//! 版本标签
//!
//! Optional lightweight tags named after each version label. Runs after the
//! history is materialized and never touches commits.

use git2::{ObjectType, Oid, Reference, Repository};

use super::error::GitError;
use super::materializer::CommittedVersion;

/// Tag each committed version with its label
///
/// Labels that are not valid ref names, and labels that already exist as a
/// tag (several versions can share a label), are skipped with a warning.
///
/// # Returns
/// The tag names created
pub fn tag_versions(repo: &Repository, committed: &[CommittedVersion]) -> Result<Vec<String>, GitError> {
    let mut created = Vec::new();

    for version in committed {
        let name = version.tag.trim();
        let refname = format!("refs/tags/{name}");

        if name.is_empty() || !Reference::is_valid_name(&refname) {
            tracing::warn!(seq = version.seq, tag = %version.tag, "skipping invalid tag name");
            continue;
        }
        if repo.find_reference(&refname).is_ok() {
            tracing::warn!(seq = version.seq, tag = name, "tag already exists, skipping");
            continue;
        }

        let oid = Oid::from_str(&version.commit_hash)?;
        let target = repo.find_object(oid, Some(ObjectType::Commit))?;
        repo.tag_lightweight(name, &target, false)?;
        tracing::debug!(seq = version.seq, tag = name, "tagged version");
        created.push(name.to_string());
    }

    Ok(created)
}
