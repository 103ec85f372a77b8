//! Configuration types.

use std::path::PathBuf;
use std::str::FromStr;

use crate::channels::email::{EmailConfig, parse_var};
use crate::error::ConfigError;

/// How persisted files are named.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FileNaming {
    /// Keep the attachment's own file name.
    #[default]
    Original,
    /// Insert a UUID before the extension so repeated names never collide.
    Unique,
}

impl FromStr for FileNaming {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "original" => Ok(Self::Original),
            "unique" => Ok(Self::Unique),
            other => Err(format!("expected `original` or `unique`, got `{other}`")),
        }
    }
}

/// What happens to attachments the classifier rejects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RejectedPolicy {
    /// Write them under the `invalid/` folder.
    #[default]
    Retain,
    /// Log and drop them.
    Discard,
}

impl FromStr for RejectedPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "retain" => Ok(Self::Retain),
            "discard" => Ok(Self::Discard),
            other => Err(format!("expected `retain` or `discard`, got `{other}`")),
        }
    }
}

/// Where and how pipeline output is written.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Root output directory. CSVs land here, rejected files in `invalid/`,
    /// consolidated orders in `json/`.
    pub directory: PathBuf,
    pub naming: FileNaming,
    pub rejected: RejectedPolicy,
    /// Keep a copy of every accepted CSV next to its JSON output.
    pub archive_source_csv: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("/tmp"),
            naming: FileNaming::default(),
            rejected: RejectedPolicy::default(),
            archive_source_csv: true,
        }
    }
}

impl OutputConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            directory: std::env::var("ATTACHMENT_DIRECTORY")
                .map(PathBuf::from)
                .unwrap_or(defaults.directory),
            naming: parse_var("ATTACHMENT_NAMING", defaults.naming)?,
            rejected: parse_var("REJECTED_ATTACHMENTS", defaults.rejected)?,
            archive_source_csv: parse_var("ARCHIVE_SOURCE_CSV", defaults.archive_source_csv)?,
        })
    }
}

/// Full service configuration.
#[derive(Debug, Clone)]
pub struct IntakeConfig {
    pub email: EmailConfig,
    pub output: OutputConfig,
}

impl IntakeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            email: EmailConfig::from_env()?,
            output: OutputConfig::from_env()?,
        })
    }
}
