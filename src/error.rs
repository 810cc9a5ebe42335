//! Unified application error types
//!
//! Wraps the source-site and git errors into a single error type for the
//! migration driver and the CLI, and classifies every failure into one of
//! the error kinds reported to the user.

use serde::Serialize;
use thiserror::Error;

use crate::git::GitError;
use crate::source::SourceError;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Script site error (listing, fetching, metadata)
    #[error("{0}")]
    Source(#[from] SourceError),

    /// Git repository error
    #[error("{0}")]
    Git(#[from] GitError),

    /// Error raised while processing a specific version
    #[error("处理版本 {seq} 时出错: {source}")]
    AtVersion {
        /// Sequence number being processed
        seq: u64,
        /// Underlying error
        #[source]
        source: Box<AppError>,
    },

    /// Descriptor and content do not belong to the same version
    #[error("版本描述 {descriptor} 与内容 {content} 不匹配")]
    MismatchedPair {
        /// Descriptor sequence number
        descriptor: u64,
        /// Content sequence number
        content: u64,
    },

    /// Invalid configuration or user input
    #[error("配置错误: {0}")]
    Config(String),

    /// File operation error
    #[error("文件操作错误: {0}")]
    Io(#[from] std::io::Error),
}

/// Error classification shared by every failure of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Script or version absent upstream
    NotFound,
    /// Page structure did not match the expected patterns
    Parse,
    /// Transport-level failure
    Network,
    /// Local filesystem or repository access failure
    Io,
    /// Git rejected a commit
    Commit,
    /// Malformed script id or configuration
    InvalidInput,
}

impl ErrorKind {
    /// Error code for client-side handling
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Parse => "PARSE_ERROR",
            Self::Network => "NETWORK_ERROR",
            Self::Io => "IO_ERROR",
            Self::Commit => "COMMIT_ERROR",
            Self::InvalidInput => "INVALID_INPUT",
        }
    }

    /// Process exit code, distinct per kind
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::InvalidInput => 2,
            Self::NotFound => 3,
            Self::Parse => 4,
            Self::Network => 5,
            Self::Io => 6,
            Self::Commit => 7,
        }
    }
}

/// Serializable error response for `--json` output
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for client-side handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Sequence number of the version being processed, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.kind().code().to_string(),
            message: err.to_string(),
            seq: err.seq(),
        }
    }
}

impl AppError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Attach the sequence number of the version being processed
    pub fn at_version(seq: u64, err: impl Into<AppError>) -> Self {
        Self::AtVersion {
            seq,
            source: Box::new(err.into()),
        }
    }

    /// Sequence number this error is attached to, if any
    pub fn seq(&self) -> Option<u64> {
        match self {
            Self::AtVersion { seq, .. } => Some(*seq),
            _ => None,
        }
    }

    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Source(e) => e.kind(),
            Self::Git(e) => e.kind(),
            Self::AtVersion { source, .. } => source.kind(),
            Self::MismatchedPair { .. } => ErrorKind::InvalidInput,
            Self::Config(_) => ErrorKind::InvalidInput,
            Self::Io(_) => ErrorKind::Io,
        }
    }
}
