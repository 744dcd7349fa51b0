// Configuration loading and parsing (gwlive.toml).

use gwlive_core::{BonusPolicy, Gameweek};
use serde::Deserialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const CONFIG_FILE: &str = "gwlive.toml";

/// Gameweeks in a season.
pub const MAX_GAMEWEEK: u32 = 38;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// gwlive.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub feed: FeedConfig,
    pub poll: PollConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub entries: EntriesConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl FeedConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollConfig {
    pub interval_secs: u64,
    /// Pin a gameweek; when absent the bootstrap's current gameweek is used.
    #[serde(default)]
    pub gameweek: Option<u32>,
    /// Stop after this many polls; when absent run until Ctrl+C.
    #[serde(default)]
    pub max_polls: Option<u64>,
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn gameweek(&self) -> Option<Gameweek> {
        self.gameweek.map(Gameweek)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    #[serde(flatten)]
    pub bonus: BonusPolicy,
    pub track_provisional_finishes: bool,
    pub include_extended_stats: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            bonus: BonusPolicy::default(),
            track_provisional_finishes: true,
            include_extended_stats: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntriesConfig {
    #[serde(default)]
    pub ids: Vec<u64>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/gwlive.toml` relative to `base_dir`.
///
/// Does not copy defaults; prefer `load_config()`.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    let config: Config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    validate(&config)?;

    Ok(config)
}

/// Seed `config/gwlive.toml` from `defaults/gwlive.toml` when it is missing.
///
/// A user's file is never overwritten. Returns the path written, if any.
pub fn ensure_config_files(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let target = base_dir.join("config").join(CONFIG_FILE);
    if target.is_file() {
        return Ok(None);
    }

    let source = base_dir.join("defaults").join(CONFIG_FILE);
    let defaults = std::fs::read(&source).map_err(|e| {
        seed_error(format!(
            "no {CONFIG_FILE} in config/ and cannot read {}: {e}",
            source.display()
        ))
    })?;

    let config_dir = base_dir.join("config");
    std::fs::create_dir_all(&config_dir)
        .map_err(|e| seed_error(format!("failed to create {}: {e}", config_dir.display())))?;

    // The file may have appeared since the check above.
    match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&target)
    {
        Ok(mut dest) => {
            dest.write_all(&defaults)
                .map_err(|e| seed_error(format!("failed to write {}: {e}", target.display())))?;
            Ok(Some(target))
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(None),
        Err(e) => Err(seed_error(format!("failed to create {}: {e}", target.display()))),
    }
}

/// Directory holding `config/` and `defaults/`: the working directory when
/// it has either, else this crate's own directory.
pub fn resolve_base_dir(cwd: &Path) -> PathBuf {
    if cwd.join("config").join(CONFIG_FILE).is_file() || cwd.join("defaults").is_dir() {
        cwd.to_path_buf()
    } else {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    }
}

/// Load config, seeding it from `defaults/` first. See `resolve_base_dir`
/// for where the files are looked up.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    let base_dir = resolve_base_dir(&cwd);
    ensure_config_files(&base_dir)?;
    load_config_from(&base_dir)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn seed_error(message: String) -> ConfigError {
    ConfigError::DefaultsCopyError { message }
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.feed.base_url.trim().is_empty() {
        return Err(invalid("feed.base_url", "must not be empty"));
    }
    if config.feed.timeout_secs == 0 {
        return Err(invalid("feed.timeout_secs", "must be greater than 0"));
    }
    if config.poll.interval_secs == 0 {
        return Err(invalid("poll.interval_secs", "must be greater than 0"));
    }
    if let Some(gw) = config.poll.gameweek {
        if !(1..=MAX_GAMEWEEK).contains(&gw) {
            return Err(invalid(
                "poll.gameweek",
                format!("must be between 1 and {MAX_GAMEWEEK}, got {gw}"),
            ));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
