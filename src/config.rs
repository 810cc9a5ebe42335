//! 迁移配置模块
//!
//! All run settings live in one explicit value handed to each component.
//! Settings are read from an optional YAML file and then overridden by
//! command-line flags.

use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::greasyfork::DEFAULT_BASE_URL;

/// 配置文件名
const CONFIG_FILENAME: &str = "config.yaml";

/// 默认请求超时 (秒)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// 历史页数上限
pub const DEFAULT_MAX_PAGES: usize = 100;

/// 默认分支
pub const DEFAULT_BRANCH: &str = "main";

/// Domain of the synthesized author e-mail addresses
pub const DEFAULT_EMAIL_DOMAIN: &str = "users.noreply.greasyfork.org";

/// Migration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Site root, e.g. `https://greasyfork.org`
    pub base_url: String,
    /// User-Agent header of every request
    pub user_agent: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Include versions whose code did not change
    pub all_versions: bool,
    /// Upper bound on followed history pages
    pub max_pages: usize,
    /// Branch created in a fresh repository
    pub initial_branch: String,
    /// Domain of synthesized author e-mail addresses
    pub email_domain: String,
    /// Create a README commit in a fresh repository
    pub readme: bool,
    /// Tag every migrated commit with its version label
    pub tag_versions: bool,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: concat!("greasygit/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            all_versions: true,
            max_pages: DEFAULT_MAX_PAGES,
            initial_branch: DEFAULT_BRANCH.to_string(),
            email_domain: DEFAULT_EMAIL_DOMAIN.to_string(),
            readme: true,
            tag_versions: false,
        }
    }
}

impl MigrationConfig {
    /// 加载配置
    ///
    /// # Arguments
    /// * `path` - 显式指定的配置文件；为 None 时尝试用户配置目录下的
    ///   `greasygit/config.yaml`
    ///
    /// # Returns
    /// 未指定且默认文件不存在时返回默认配置；显式指定的文件必须存在且可解析
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        match path {
            Some(path) => Self::load_file(path),
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::load_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    fn load_file(path: &Path) -> Result<Self, AppError> {
        let content = fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("无法读取配置文件 {}: {e}", path.display())))?;
        let config: Self = serde_yaml::from_str(&content)
            .map_err(|e| AppError::config(format!("配置文件 {} 格式无效: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// 用户配置目录下的默认配置文件路径
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("greasygit").join(CONFIG_FILENAME))
    }

    /// 验证配置
    pub fn validate(&self) -> Result<(), AppError> {
        let url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| AppError::config(format!("base_url 无效 ({}): {e}", self.base_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AppError::config(format!("base_url 必须是 http(s) 地址: {}", self.base_url)));
        }
        if self.timeout_secs == 0 {
            return Err(AppError::config("timeout_secs must be > 0"));
        }
        if self.max_pages == 0 {
            return Err(AppError::config("max_pages must be > 0"));
        }
        if !git2::Reference::is_valid_name(&format!("refs/heads/{}", self.initial_branch)) {
            return Err(AppError::config(format!("无效的分支名: {}", self.initial_branch)));
        }
        if self.email_domain.trim().is_empty() || self.email_domain.contains(['@', '<', '>', ' ']) {
            return Err(AppError::config(format!("无效的邮箱域名: {}", self.email_domain)));
        }
        Ok(())
    }
}

/// Check the tracked script file name: relative, inside the repository,
/// and not inside `.git`
pub fn validate_script_file(name: &str) -> Result<(), AppError> {
    let path = Path::new(name);
    if name.trim().is_empty() {
        return Err(AppError::config("脚本文件名不能为空"));
    }
    for component in path.components() {
        match component {
            Component::Normal(part) if part != ".git" => {}
            _ => return Err(AppError::config(format!("脚本文件名必须是仓库内的相对路径: {name}"))),
        }
    }
    Ok(())
}
