//! Version descriptors and contents
//!
//! A descriptor is what the history page says about a version (who, when,
//! why); the content is the script text at that version. Both are immutable
//! once fetched and are joined by their sequence number.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Metadata of one historical version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDescriptor {
    /// Site-wide version number, increasing with time (gaps allowed)
    pub seq: u64,
    /// Human version label, e.g. `1.2.0`
    pub tag: String,
    /// When the version was published
    pub timestamp: DateTime<FixedOffset>,
    /// Author display name
    pub author: String,
    /// Change note, if the author wrote one
    #[serde(default)]
    pub note: Option<String>,
}

impl VersionDescriptor {
    /// First paragraph of the commit message
    ///
    /// The change note when it is present and not blank, otherwise a
    /// placeholder naming the version.
    pub fn commit_subject(&self) -> String {
        match self.note.as_deref().map(str::trim) {
            Some(note) if !note.is_empty() => note.to_string(),
            _ if self.tag.trim().is_empty() => format!("Version {}", self.seq),
            _ => format!("Version {} ({})", self.tag.trim(), self.seq),
        }
    }
}

/// Script text of one version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionContent {
    /// Sequence number of the version this text belongs to
    pub seq: u64,
    /// Raw source text
    pub text: String,
}

impl VersionContent {
    pub fn new(seq: u64, text: impl Into<String>) -> Self {
        Self {
            seq,
            text: text.into(),
        }
    }
}

/// A descriptor joined with its content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionPair {
    pub descriptor: VersionDescriptor,
    pub content: VersionContent,
}

impl VersionPair {
    /// Join a descriptor with its content
    ///
    /// # Errors
    /// 返回 MismatchedPair 如果两者的序号不一致
    pub fn new(descriptor: VersionDescriptor, content: VersionContent) -> Result<Self, AppError> {
        if descriptor.seq != content.seq {
            return Err(AppError::MismatchedPair {
                descriptor: descriptor.seq,
                content: content.seq,
            });
        }
        Ok(Self {
            descriptor,
            content,
        })
    }

    pub fn seq(&self) -> u64 {
        self.descriptor.seq
    }
}

/// Ordered version list of a script
///
/// Strictly ascending by sequence number with no duplicates. Consumed by
/// value; there is no way to rewind it once iterated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionHistory {
    versions: Vec<VersionDescriptor>,
}

impl VersionHistory {
    /// Normalize descriptors collected in page order
    ///
    /// # Returns
    /// The sorted history, or the first duplicated sequence number
    pub fn from_unordered(mut versions: Vec<VersionDescriptor>) -> Result<Self, u64> {
        versions.sort_by_key(|v| v.seq);
        if let Some(dup) = versions.windows(2).find(|w| w[0].seq == w[1].seq) {
            return Err(dup[0].seq);
        }
        Ok(Self { versions })
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Oldest version
    pub fn first(&self) -> Option<&VersionDescriptor> {
        self.versions.first()
    }

    /// Newest version
    pub fn latest(&self) -> Option<&VersionDescriptor> {
        self.versions.last()
    }

    /// Sequence numbers in ascending order
    pub fn seqs(&self) -> impl Iterator<Item = u64> + '_ {
        self.versions.iter().map(|v| v.seq)
    }

    /// Sequence numbers whose timestamp is earlier than their predecessor's
    pub fn chronology_violations(&self) -> Vec<u64> {
        self.versions
            .windows(2)
            .filter(|w| w[1].timestamp < w[0].timestamp)
            .map(|w| w[1].seq)
            .collect()
    }
}

impl IntoIterator for VersionHistory {
    type Item = VersionDescriptor;
    type IntoIter = std::vec::IntoIter<VersionDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.versions.into_iter()
    }
}
