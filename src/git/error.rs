//! Git 模块错误类型
//!
//! 定义 GitError 枚举，包含迁移目标仓库上所有操作可能的错误类型。

use thiserror::Error;

use crate::error::ErrorKind;

/// Git 操作错误类型
#[derive(Error, Debug)]
pub enum GitError {
    /// 路径已存在但不是可用的 Git 仓库
    #[error("路径不是有效的 Git 仓库: {0}")]
    NotARepository(String),

    /// 工作目录读写失败
    #[error("无法写入 {path}: {source}")]
    Io {
        /// 出错的路径
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Git 拒绝了某个版本的提交
    #[error("版本 {seq} 提交失败: {source}")]
    CommitRejected {
        /// 版本序号
        seq: u64,
        #[source]
        source: git2::Error,
    },

    /// 待提交的版本早于仓库中已迁移的最新版本
    #[error("版本 {seq} 早于已迁移的版本 {newest}，无法按时间顺序追加")]
    OutOfOrder {
        /// 待提交的版本
        seq: u64,
        /// 已迁移的最新版本
        newest: u64,
    },

    /// 输入的版本序列不是严格递增的
    #[error("版本序列未按升序排列: {seq} 出现在 {previous} 之后")]
    UnorderedInput {
        /// 前一个版本
        previous: u64,
        /// 当前版本
        seq: u64,
    },

    /// Git 仓库底层错误
    #[error("Git 仓库错误: {0}")]
    RepositoryError(#[from] git2::Error),
}

impl GitError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotARepository(_) | Self::Io { .. } | Self::RepositoryError(_) => ErrorKind::Io,
            Self::CommitRejected { .. } | Self::OutOfOrder { .. } | Self::UnorderedInput { .. } => {
                ErrorKind::Commit
            }
        }
    }
}
