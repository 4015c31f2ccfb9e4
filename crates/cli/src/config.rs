//! Configuration management for the CLI
//!
//! Settings are layered: defaults, then the optional config file
//! (`~/.config/dtv/config.{json,toml,yaml}`), then `DTV_*` environment
//! variables. Command-line flags override all of them.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use validator_lib::schema::DEFAULT_SCHEMA_DIR;

use crate::output::OutputFormat;

/// CLI configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CliConfig {
    /// Directory holding `<name>.json` schema files
    #[serde(default = "default_schema_dir")]
    pub schema_dir: PathBuf,

    /// Output format when `--format` is not given
    #[serde(default)]
    pub default_format: Option<OutputFormat>,

    /// Emit logs as JSON lines
    #[serde(default)]
    pub log_json: bool,
}

fn default_schema_dir() -> PathBuf {
    PathBuf::from(DEFAULT_SCHEMA_DIR)
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            schema_dir: default_schema_dir(),
            default_format: None,
            log_json: false,
        }
    }
}

impl CliConfig {
    /// Load configuration from the user config file and environment
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_base().as_deref())
    }

    /// Load configuration from a config file base path and environment
    ///
    /// The base path has no extension; any format the `config` crate
    /// recognises is picked up. A missing file is not an error.
    pub fn load_from(base: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(base) = base {
            builder = builder.add_source(
                config::File::with_name(&base.to_string_lossy()).required(false),
            );
        }

        let config = builder
            .add_source(config::Environment::with_prefix("DTV"))
            .build()
            .context("Failed to load configuration")?;

        config
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    /// Base path of the user config file, without extension
    fn config_base() -> Option<PathBuf> {
        dirs_next::home_dir().map(|home| home.join(".config").join("dtv").join("config"))
    }
}
