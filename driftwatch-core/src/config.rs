//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/driftwatch/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/driftwatch/` (~/.config/driftwatch/)
//! - Data: `$XDG_DATA_HOME/driftwatch/` (~/.local/share/driftwatch/)
//! - State/Logs: `$XDG_STATE_HOME/driftwatch/` (~/.local/state/driftwatch/)

use crate::analytics::{MAX_LOOKBACK_WEEKS, MAX_WINDOW_DAYS};
use crate::error::{Error, Result};
use crate::types::PatternType;
use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Analysis window and detector selection
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Pattern detector thresholds
    #[serde(default)]
    pub thresholds: DetectorThresholds,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Analysis run configuration
#[derive(Debug, Deserialize)]
pub struct AnalysisConfig {
    /// Length of each metric window in days
    #[serde(default = "default_window_days")]
    pub window_days: u32,

    /// How far back each run loads commits, in weeks
    #[serde(default = "default_lookback_weeks")]
    pub lookback_weeks: u32,

    /// Patterns whose detectors are not registered (e.g. "tool-transition")
    #[serde(default)]
    pub disabled_detectors: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            lookback_weeks: default_lookback_weeks(),
            disabled_detectors: vec![],
        }
    }
}

impl AnalysisConfig {
    /// Parse `disabled_detectors` into pattern types.
    pub fn disabled_patterns(&self) -> Result<Vec<PatternType>> {
        self.disabled_detectors
            .iter()
            .map(|name| PatternType::from_str(name).map_err(Error::Config))
            .collect()
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_WINDOW_DAYS).contains(&self.window_days) {
            return Err(Error::Config(format!(
                "analysis.window_days must be between 1 and {}",
                MAX_WINDOW_DAYS
            )));
        }
        if !(1..=MAX_LOOKBACK_WEEKS).contains(&self.lookback_weeks) {
            return Err(Error::Config(format!(
                "analysis.lookback_weeks must be between 1 and {}",
                MAX_LOOKBACK_WEEKS
            )));
        }
        self.disabled_patterns()?;
        Ok(())
    }
}

fn default_window_days() -> u32 {
    7
}

fn default_lookback_weeks() -> u32 {
    12
}

/// Thresholds for every pattern detector.
///
/// Each table can be overridden independently, e.g.
///
/// ```toml
/// [thresholds.changelog_silence]
/// min_commits = 20
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectorThresholds {
    pub sprint_drift: SprintDriftThresholds,
    pub ghost_churn: GhostChurnThresholds,
    pub ai_handoff_cliff: AiHandoffCliffThresholds,
    pub test_drift: TestDriftThresholds,
    pub changelog_silence: ChangelogSilenceThresholds,
    pub workflow_breakthrough: WorkflowBreakthroughThresholds,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SprintDriftThresholds {
    /// Minimum AI ratio (inclusive)
    pub ai_ratio: f64,
    /// Minimum cleanup ratio over non-bot commits (inclusive)
    pub cleanup_ratio: f64,
}

impl Default for SprintDriftThresholds {
    fn default() -> Self {
        Self {
            ai_ratio: 0.6,
            cleanup_ratio: 0.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct GhostChurnThresholds {
    /// Ghost commits / AI commits must exceed this
    pub ghost_ratio: f64,
    /// How long after an AI commit a reversal still counts
    pub window_days: u32,
}

impl Default for GhostChurnThresholds {
    fn default() -> Self {
        Self {
            ghost_ratio: 0.2,
            window_days: 7,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct AiHandoffCliffThresholds {
    /// AI ratio must exceed this
    pub ai_ratio: f64,
    /// Test ratio must be below this
    pub test_ratio: f64,
}

impl Default for AiHandoffCliffThresholds {
    fn default() -> Self {
        Self {
            ai_ratio: 0.7,
            test_ratio: 0.1,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct TestDriftThresholds {
    /// Minimum AI ratio (inclusive)
    pub ai_ratio: f64,
    /// Test ratio must be below this
    pub test_ratio: f64,
}

impl Default for TestDriftThresholds {
    fn default() -> Self {
        Self {
            ai_ratio: 0.5,
            test_ratio: 0.15,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChangelogSilenceThresholds {
    /// Non-bot commit count must exceed this
    pub min_commits: usize,
    /// Feature ratio must be below this
    pub feat_ratio: f64,
}

impl Default for ChangelogSilenceThresholds {
    fn default() -> Self {
        Self {
            min_commits: 10,
            feat_ratio: 0.1,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorkflowBreakthroughThresholds {
    /// AI ratio increase over the baseline must exceed this
    pub increase: f64,
    /// Minimum history windows, and minimum baseline windows
    pub min_history_windows: usize,
    /// Minimum consecutive elevated windows, current included
    pub min_sustained_windows: usize,
}

impl Default for WorkflowBreakthroughThresholds {
    fn default() -> Self {
        Self {
            increase: 0.15,
            min_history_windows: 2,
            min_sustained_windows: 2,
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.analysis.validate()?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/driftwatch/config.toml` (~/.config/driftwatch/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("driftwatch").join("config.toml")
    }

    /// Returns the data directory path (for SQLite database)
    ///
    /// `$XDG_DATA_HOME/driftwatch/` (~/.local/share/driftwatch/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("driftwatch")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/driftwatch/` (~/.local/state/driftwatch/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("driftwatch")
    }

    /// Returns the database file path
    ///
    /// `$XDG_DATA_HOME/driftwatch/data.db` (~/.local/share/driftwatch/data.db)
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("data.db")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/driftwatch/driftwatch.log` (~/.local/state/driftwatch/driftwatch.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("driftwatch.log")
    }

    /// Ensure XDG base directory environment variables are set.
    ///
    /// This is mainly for CLI binaries that want explicit, stable path behavior
    /// before invoking other components that read these env vars.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_DATA_HOME").is_err() {
            std::env::set_var("XDG_DATA_HOME", home.join(".local/share"));
        }

        if std::env::var("XDG_STATE_HOME").is_err() {
            std::env::set_var("XDG_STATE_HOME", home.join(".local/state"));
        }

        if std::env::var("XDG_CONFIG_HOME").is_err() {
            std::env::set_var("XDG_CONFIG_HOME", home.join(".config"));
        }
    }
}
