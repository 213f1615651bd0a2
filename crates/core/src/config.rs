//! TOML-based configuration for the commute tools.
//!
//! Every field is optional. A missing file means defaults, and command-line
//! flags layer on top of whatever the file provides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::conflict::{MergeBackend, DEFAULT_MARKER_SIZE};
use crate::errors::ConfigError;

/// File looked up at the repository root when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = ".commute.toml";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommuteConfig {
    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,

    /// Defaults for `commute-merge`.
    #[serde(default)]
    pub merge: MergeConfig,

    /// Defaults for `commute-record`.
    #[serde(default)]
    pub record: RecordConfig,
}

// ---------------------------------------------------------------------------
// Log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogConfig {
    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".into()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

/// Defaults for the commuting-merge driver. Flags can only switch these on.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MergeConfig {
    /// Disallow the both-sides-insert-at-same-point union.
    #[serde(default)]
    pub strict_commute: bool,

    /// Leave the merge in progress when files stay unresolved.
    #[serde(default)]
    pub keep_merge: bool,

    /// Commit the merge once every file is resolved.
    #[serde(default)]
    pub auto_continue: bool,

    /// Skip the clean-working-tree precondition.
    #[serde(default)]
    pub allow_dirty: bool,

    /// Resolution store consulted for files whose edits do not commute.
    #[serde(default)]
    pub replay_store: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// Defaults for the hunk resolution extractor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordConfig {
    /// Three-way merge primitive used to rebuild conflict text.
    #[serde(default)]
    pub backend: MergeBackend,

    /// Length of conflict marker runs.
    #[serde(default = "default_marker_size")]
    pub marker_size: usize,
}

fn default_marker_size() -> usize {
    DEFAULT_MARKER_SIZE
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            backend: MergeBackend::default(),
            marker_size: default_marker_size(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading & validation
// ---------------------------------------------------------------------------

impl CommuteConfig {
    /// Load configuration from a TOML file at `path`.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: CommuteConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Load `explicit` if given, otherwise `.commute.toml` under `repo_root`
    /// if it exists, otherwise defaults. The result is validated.
    pub fn discover(explicit: Option<&Path>, repo_root: &Path) -> Result<Self, ConfigError> {
        let config = match explicit {
            Some(path) => Self::load_from_file(path)?,
            None => {
                let candidate = repo_root.join(CONFIG_FILE_NAME);
                if candidate.is_file() {
                    Self::load_from_file(candidate)?
                } else {
                    debug!("no configuration file found; using defaults");
                    Self::default()
                }
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that the loaded values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.record.marker_size < DEFAULT_MARKER_SIZE {
            return Err(ConfigError::InvalidValue {
                field: "record.marker_size".into(),
                detail: format!("marker size must be at least {DEFAULT_MARKER_SIZE}"),
            });
        }
        if let Some(store) = &self.merge.replay_store {
            if store.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "merge.replay_store".into(),
                    detail: "replay store path must not be empty".into(),
                });
            }
        }
        if self.log.level.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "log.level".into(),
                detail: "log level must not be empty".into(),
            });
        }

        Ok(())
    }
}
