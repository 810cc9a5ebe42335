//! Git 历史重建模块
//!
//! 将 (版本描述, 内容) 序列写成按时间顺序排列的 Git 提交。
//! Each version commit carries a `Script-Version` trailer so that re-runs
//! can tell which versions are already present.

pub mod bootstrap;
pub mod error;
pub mod materializer;
pub mod tags;
pub mod trailer;

pub use bootstrap::{render_readme, BOOTSTRAP_MESSAGE};
pub use error::GitError;
pub use materializer::{
    materialize, CommittedVersion, HistoryMaterializer, MaterializeReport, MaterializerOptions,
};
pub use tags::tag_versions;
