//! Commit message trailer identifying a migrated version

use once_cell::sync::Lazy;
use regex::Regex;

/// Trailer key
pub const TRAILER_KEY: &str = "Script-Version";

static TRAILER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^Script-Version:[ \t]*(?P<seq>\d+)[ \t]*$").unwrap());

/// Full commit message: subject, blank line, trailer
pub fn compose_message(subject: &str, seq: u64) -> String {
    format!("{}\n\n{TRAILER_KEY}: {seq}\n", subject.trim_end())
}

/// Sequence number recorded in a commit message
///
/// The last trailer wins, so a change note quoting a trailer line does not
/// confuse the lookup.
pub fn parse_seq(message: &str) -> Option<u64> {
    TRAILER_REGEX
        .captures_iter(message)
        .last()
        .and_then(|caps| caps["seq"].parse().ok())
}
