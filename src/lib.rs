// greasygit
// Migrates the version history of a Greasy Fork user script into a git repository

pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod greasyfork;
pub mod logging;
pub mod migration;
pub mod models;
pub mod source;

pub use config::MigrationConfig;
pub use error::{AppError, ErrorKind, ErrorResponse};
pub use greasyfork::GreasyForkClient;
pub use migration::{MigrationPlan, MigrationSummary, Migrator};
pub use models::{ScriptId, ScriptMetadata, VersionContent, VersionDescriptor, VersionHistory, VersionPair};
pub use source::{ContentFetcher, MetadataSource, SourceError, VersionLister};
