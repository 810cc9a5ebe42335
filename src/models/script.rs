//! Script identity and homepage metadata

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::source::SourceError;

/// Matches the script id in a script URL, e.g.
/// `https://greasyfork.org/en/scripts/12345-some-name/versions`
static SCRIPT_URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://[^/\s]+/(?:[A-Za-z][\w-]*/)?scripts/(?P<id>\d+)(?:[-/?#]\S*)?$").unwrap()
});

/// Numeric script identifier on the hosting site
///
/// Always positive. Parsed from a bare number or from a script URL, so a
/// malformed identifier is rejected before any request is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScriptId(u64);

impl ScriptId {
    /// Create a ScriptId, rejecting zero
    pub fn new(id: u64) -> Result<Self, SourceError> {
        if id == 0 {
            return Err(SourceError::invalid_script_id("0"));
        }
        Ok(Self(id))
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ScriptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ScriptId {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();

        let digits = if !input.is_empty() && input.bytes().all(|b| b.is_ascii_digit()) {
            input
        } else {
            SCRIPT_URL_REGEX
                .captures(input)
                .and_then(|caps| caps.name("id"))
                .map(|m| m.as_str())
                .ok_or_else(|| SourceError::invalid_script_id(input))?
        };

        let id = digits
            .parse::<u64>()
            .map_err(|_| SourceError::invalid_script_id(input))?;
        Self::new(id).map_err(|_| SourceError::invalid_script_id(input))
    }
}

/// Script homepage metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptMetadata {
    /// Script id
    pub id: ScriptId,
    /// Display name
    pub name: String,
    /// Short description (may be empty)
    #[serde(default)]
    pub description: String,
    /// Script author display name
    #[serde(default)]
    pub author: Option<String>,
    /// URL slug without the id prefix, e.g. `some-name`
    pub slug: String,
}

impl ScriptMetadata {
    /// Default repository directory name
    pub fn default_repo_name(&self) -> String {
        if self.slug.trim().is_empty() {
            format!("script-{}", self.id)
        } else {
            self.slug.clone()
        }
    }

    /// Default name of the tracked script file
    pub fn default_script_file(&self) -> String {
        format!("{}.user.js", self.default_repo_name())
    }
}
