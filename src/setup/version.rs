//! Config version checks.
//!
//! The first line of the config file records which release wrote it. Setup
//! runs again when that release is older than the running binary.

use anyhow::anyhow;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::path::Path;

/// Current application version from Cargo.toml
pub(crate) const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A `major.minor.patch` release number.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd)]
struct Release(u32, u32, u32);

impl Release {
    fn parse(text: &str) -> anyhow::Result<Self> {
        let mut parts = text.trim().split('.').map(|part| part.parse::<u32>());
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(Ok(major)), Some(Ok(minor)), Some(Ok(patch)), None) => {
                Ok(Release(major, minor, patch))
            }
            _ => Err(anyhow!(
                "Invalid version format: '{}'. Expected 'major.minor.patch'",
                text
            )),
        }
    }
}

impl fmt::Display for Release {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.0, self.1, self.2)
    }
}

/// Outcome of comparing the config file against the binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupNeed {
    /// No config file yet
    Missing,
    /// The file was written by an older release (or carries no version line)
    Outdated(String),
    UpToDate,
}

/// Extracts the version from a `config_version = "X.Y.Z"` first line.
fn version_line(content: &str) -> anyhow::Result<Option<String>> {
    let Some(first_line) = content.lines().next() else {
        return Ok(None);
    };
    let regex = Regex::new(r#"^\s*config_version\s*=\s*"([^"]+)""#)?;
    Ok(regex
        .captures(first_line)
        .map(|caps| caps[1].to_string()))
}

fn compare(content: &str, current: &str) -> anyhow::Result<SetupNeed> {
    let Some(found) = version_line(content)? else {
        return Ok(SetupNeed::Outdated("unknown".to_string()));
    };

    match Release::parse(&found)?.cmp(&Release::parse(current)?) {
        Ordering::Less => Ok(SetupNeed::Outdated(found)),
        Ordering::Equal => Ok(SetupNeed::UpToDate),
        Ordering::Greater => {
            tracing::warn!(
                "Config version {} is newer than app version {}",
                found,
                current
            );
            Ok(SetupNeed::UpToDate)
        }
    }
}

/// Determines whether setup has to (re)write the config file.
///
/// # Errors
/// Returns an error if the file can't be read or its version line is malformed.
pub fn check_setup_needed(config_path: &Path) -> anyhow::Result<SetupNeed> {
    if !config_path.exists() {
        return Ok(SetupNeed::Missing);
    }
    let content = std::fs::read_to_string(config_path)?;
    compare(&content, CURRENT_VERSION)
}
