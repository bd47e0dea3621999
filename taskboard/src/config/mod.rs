//! Configuration for the `taskboard` client.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/taskboard/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::{Path, PathBuf};
use std::time::Duration;

use taskboard_proto::moment::Moment;
use taskboard_proto::task::{Priority, TaskStatus};

use crate::views::{CompletedSort, DateFilter, FilterParseError, FilterSet, PriorityFilter, SortOrder};

/// Default API base URL.
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:5000";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// A view default in the config file is not a known name.
    #[error("invalid value for view.{key}: {source}")]
    InvalidView {
        /// Setting name.
        key: &'static str,
        /// Parse failure.
        source: FilterParseError,
    },
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    api: ApiFileConfig,
    session: SessionFileConfig,
    view: ViewFileConfig,
}

/// `[api]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ApiFileConfig {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

/// `[session]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct SessionFileConfig {
    file: Option<PathBuf>,
}

/// `[view]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ViewFileConfig {
    date_filter: Option<String>,
    priority_filter: Option<String>,
    sort_order: Option<String>,
    completed_sort: Option<String>,
}

// ---------------------------------------------------------------------------
// Resolved configuration (concrete types, all fields populated)
// ---------------------------------------------------------------------------

/// Fully resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Root of the task API, without a trailing slash.
    pub api_base: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Where the session is kept between runs. `None` uses the default
    /// data directory location.
    pub session_file: Option<PathBuf>,
    /// Dashboard filters used when the command line gives none.
    pub filters: FilterSet,
    /// Completed-view order used when the command line gives none.
    pub completed_sort: CompletedSort,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(60),
            session_file: None,
            filters: FilterSet::default(),
            completed_sort: CompletedSort::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read,
    /// if any config file cannot be parsed, or if a view default is not a
    /// recognized name.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Self::resolve(cli, &file)
    }

    /// Resolve a `ClientConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default. Separated from `load()` so it can be
    /// tested without CLI parsing.
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            api_base: cli
                .api_base
                .clone()
                .or_else(|| file.api.base_url.clone())
                .unwrap_or(defaults.api_base),
            timeout: cli
                .timeout_secs
                .or(file.api.timeout_secs)
                .map_or(defaults.timeout, Duration::from_secs),
            session_file: cli
                .session_file
                .clone()
                .or_else(|| file.session.file.clone()),
            filters: FilterSet {
                date: parse_view("date_filter", file.view.date_filter.as_deref())?
                    .unwrap_or(defaults.filters.date),
                priority: parse_view("priority_filter", file.view.priority_filter.as_deref())?
                    .unwrap_or(defaults.filters.priority),
                sort: parse_view("sort_order", file.view.sort_order.as_deref())?
                    .unwrap_or(defaults.filters.sort),
            },
            completed_sort: parse_view("completed_sort", file.view.completed_sort.as_deref())?
                .unwrap_or(defaults.completed_sort),
        })
    }
}

fn parse_view<T>(key: &'static str, raw: Option<&str>) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr<Err = FilterParseError>,
{
    raw.map(str::parse)
        .transpose()
        .map_err(|source| ConfigError::InvalidView { key, source })
}

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Task board client")]
pub struct CliArgs {
    /// Base URL of the task API.
    #[arg(long, env = "TASKBOARD_API_BASE", global = true)]
    pub api_base: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Path to config file (default: `~/.config/taskboard/config.toml`).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the session file.
    #[arg(long, env = "TASKBOARD_SESSION_FILE", global = true)]
    pub session_file: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TASKBOARD_LOG", global = true)]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/taskboard.log`).
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// What to do. Defaults to `list`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// `taskboard` subcommands.
#[derive(clap::Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Log in and remember the session.
    Login {
        /// Account email.
        email: String,
        /// Account password.
        #[arg(long, env = "TASKBOARD_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account.
    Signup {
        /// Display name.
        name: String,
        /// Account email.
        email: String,
        /// Account password.
        #[arg(long, env = "TASKBOARD_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the session.
    Logout,

    /// Show who is logged in.
    Whoami,

    /// Show open tasks.
    List {
        /// Due-date window: all, today, tomorrow, week, month.
        #[arg(long)]
        date: Option<DateFilter>,
        /// Priority: all, low, medium, high.
        #[arg(long)]
        priority: Option<PriorityFilter>,
        /// Order: newest, oldest.
        #[arg(long)]
        sort: Option<SortOrder>,
    },

    /// Show completed tasks.
    Completed {
        /// Order: newest, oldest, priority.
        #[arg(long)]
        sort: Option<CompletedSort>,
    },

    /// Show counts and productivity insights.
    Stats,

    /// Create a task.
    Add {
        /// Task title.
        title: String,
        /// Free-form description.
        #[arg(long)]
        description: Option<String>,
        /// Due date (`YYYY-MM-DD` or RFC 3339).
        #[arg(long)]
        due: Option<Moment>,
        /// Priority: low, medium, high.
        #[arg(long)]
        priority: Option<Priority>,
        /// Checklist item (repeatable).
        #[arg(long = "subtask")]
        subtasks: Vec<String>,
    },

    /// Change a task.
    Edit {
        /// Task id.
        id: String,
        /// New title.
        #[arg(long)]
        title: Option<String>,
        /// New description.
        #[arg(long)]
        description: Option<String>,
        /// New due date (`YYYY-MM-DD` or RFC 3339).
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<Moment>,
        /// Remove the due date.
        #[arg(long)]
        clear_due: bool,
        /// New priority.
        #[arg(long)]
        priority: Option<Priority>,
        /// New status: in-progress or completed.
        #[arg(long, value_parser = parse_status)]
        status: Option<TaskStatus>,
    },

    /// Delete a task.
    Delete {
        /// Task id.
        id: String,
    },

    /// Mark a task completed, or back in progress.
    Toggle {
        /// Task id.
        id: String,
    },
}

fn parse_status(raw: &str) -> Result<TaskStatus, String> {
    match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
        "in_progress" => Ok(TaskStatus::InProgress),
        "completed" => Ok(TaskStatus::Completed),
        _ => Err(format!("unknown status {raw:?} (expected in-progress or completed)")),
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// If `explicit_path` is `None`, the default path is tried and a missing
/// file is treated as empty config.
fn load_config_file(explicit_path: Option<&Path>) -> Result<ConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(ConfigFile::default());
        };
        config_dir.join("taskboard").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
