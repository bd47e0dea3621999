//! Stub server settings.
//!
//! Flags (and their environment variables) win over a TOML file given with
//! `--config`; whatever neither sets keeps its built-in value. The stub is
//! test tooling, so there is no per-user config location to search.
//!
//! ```toml
//! bind_addr = "127.0.0.1:5000"
//! listing_shape = "data"
//! signup_signs_in = false
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use taskboard_proto::listing::ListingShape;

/// A config file that could not be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read stub config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid stub config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Command line of `taskboard-stub`.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "In-memory Taskboard API for tests and demos")]
pub struct StubCliArgs {
    /// Address to listen on.
    #[arg(short, long, env = "TASKBOARD_STUB_ADDR")]
    pub bind: Option<String>,

    /// TOML file with stub settings.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// How task listings are wrapped: bare, tasks or data.
    #[arg(long, value_parser = parse_shape)]
    pub listing_shape: Option<ListingShape>,

    /// Return only a confirmation from signup, without a token.
    #[arg(long)]
    pub signup_without_token: bool,

    /// Tracing filter, e.g. `debug` or `taskboard_stub=trace`.
    #[arg(long, default_value = "info", env = "TASKBOARD_STUB_LOG")]
    pub log_level: String,
}

/// How the stub behaves towards clients.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StubConfig {
    /// Listen address, e.g. `127.0.0.1:5000`.
    pub bind_addr: String,
    /// Wrapping of `GET /api/tasks` bodies.
    #[serde(deserialize_with = "shape_from_toml")]
    pub listing_shape: ListingShape,
    /// Whether signup hands out a token.
    pub signup_signs_in: bool,
}

impl Default for StubConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
            listing_shape: ListingShape::Bare,
            signup_signs_in: true,
        }
    }
}

impl StubConfig {
    /// Settings for this command line.
    ///
    /// # Errors
    ///
    /// Fails only when `--config` names a file that cannot be read or parsed.
    pub fn load(cli: &StubCliArgs) -> Result<Self, ConfigError> {
        let base = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(base.with_overrides(cli))
    }

    /// Reads settings from a TOML file. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies whatever the command line set explicitly.
    #[must_use]
    pub fn with_overrides(mut self, cli: &StubCliArgs) -> Self {
        if let Some(bind) = &cli.bind {
            self.bind_addr.clone_from(bind);
        }
        if let Some(shape) = cli.listing_shape {
            self.listing_shape = shape;
        }
        if cli.signup_without_token {
            self.signup_signs_in = false;
        }
        self
    }
}

fn parse_shape(raw: &str) -> Result<ListingShape, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "bare" => Ok(ListingShape::Bare),
        "tasks" => Ok(ListingShape::Tasks),
        "data" => Ok(ListingShape::Data),
        _ => Err(format!("unknown listing shape {raw:?} (expected bare, tasks or data)")),
    }
}

fn shape_from_toml<'de, D: serde::Deserializer<'de>>(de: D) -> Result<ListingShape, D::Error> {
    let raw = String::deserialize(de)?;
    parse_shape(&raw).map_err(serde::de::Error::custom)
}
