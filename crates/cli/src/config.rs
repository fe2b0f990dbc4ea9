//! TOML-based configuration for the `teamjoin` binary.
//!
//! Everything here is host glue: the core library never reads files. The
//! config file supplies defaults for repeated invocations (CI builds, site
//! deploy scripts); command-line flags override individual fields.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Configuration for a join invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinConfig {
    /// Build the public view: strip private data instead of promoting it.
    #[serde(default)]
    pub public: bool,

    /// Path to the team directory JSON file.
    #[serde(default)]
    pub team: Option<PathBuf>,

    /// Path to the project roster JSON file.
    #[serde(default)]
    pub projects: Option<PathBuf>,

    /// Path to the snippets JSON file.
    #[serde(default)]
    pub snippets: Option<PathBuf>,

    /// Where to write the joined dataset (stdout when unset).
    #[serde(default)]
    pub output: Option<PathBuf>,

    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self {
            public: false,
            team: None,
            projects: None,
            snippets: None,
            output: None,
            log_level: default_log_level(),
        }
    }
}

impl JoinConfig {
    /// Load a [`JoinConfig`] from a TOML file at the given path.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let config: JoinConfig = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file '{}'", path.display()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Load the config file when given, else start from defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Validate that the configuration is sane.
    pub fn validate(&self) -> Result<()> {
        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => bail!("invalid log_level '{other}'"),
        }
        if self.team.is_none() && self.projects.is_none() && self.snippets.is_none() {
            bail!("no input collections configured: set at least one of team, projects, snippets");
        }
        Ok(())
    }
}
