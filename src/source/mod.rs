//! Script source interfaces
//!
//! The narrow seam between the migration pipeline and the hosting site.
//! Everything that knows about page markup lives behind these traits
//! (see [`crate::greasyfork`]); the materializer and the data model never
//! see HTML.

mod error;

pub use error::SourceError;

use async_trait::async_trait;

use crate::models::{ScriptId, ScriptMetadata, VersionContent, VersionDescriptor, VersionHistory};

/// Reads a script's homepage metadata (name, description, author, slug)
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn fetch_metadata(&self, script: ScriptId) -> Result<ScriptMetadata, SourceError>;
}

/// Lists every historical version of a script
#[async_trait]
pub trait VersionLister: Send + Sync {
    /// Returns the full history in ascending sequence order, whatever order
    /// the site lists it in.
    async fn list_versions(&self, script: ScriptId) -> Result<VersionHistory, SourceError>;
}

/// Retrieves the literal source text of one version
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch_content(
        &self,
        script: ScriptId,
        version: &VersionDescriptor,
    ) -> Result<VersionContent, SourceError>;
}
