use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PulseError;

/// Environment variable that overrides the configured data path.
pub const DATA_ENV_VAR: &str = "ISSUEPULSE_DATA";

/// Top-level configuration loaded from `.issuepulse.toml`.
///
/// Supports layered resolution: CLI flags > env vars > local config > defaults.
///
/// # Examples
///
/// ```
/// use issuepulse_core::PulseConfig;
///
/// let config = PulseConfig::default();
/// assert_eq!(config.analysis.top_n, 5);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PulseConfig {
    /// Data source settings.
    #[serde(default)]
    pub data: DataConfig,
    /// Analysis defaults.
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

impl PulseConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Io`] if the file cannot be read, or
    /// [`PulseError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use issuepulse_core::PulseConfig;
    /// use std::path::Path;
    ///
    /// let config = PulseConfig::from_file(Path::new(".issuepulse.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, PulseError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use issuepulse_core::PulseConfig;
    ///
    /// let toml = r#"
    /// [analysis]
    /// top_n = 10
    /// "#;
    /// let config = PulseConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.analysis.top_n, 10);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, PulseError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Resolve the data file path: CLI override > `ISSUEPULSE_DATA` > config.
    pub fn resolve_data_path(&self, cli_override: Option<&Path>) -> PathBuf {
        if let Some(path) = cli_override {
            return path.to_path_buf();
        }
        if let Ok(env_path) = std::env::var(DATA_ENV_VAR) {
            if !env_path.is_empty() {
                return PathBuf::from(env_path);
            }
        }
        self.data.path.clone()
    }
}

/// Data source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Path to the issue export (default: `./issues.json`).
    #[serde(default = "default_data_path")]
    pub path: PathBuf,
}

fn default_data_path() -> PathBuf {
    PathBuf::from("./issues.json")
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
        }
    }
}

/// Default parameters for the analysis subcommands.
///
/// # Examples
///
/// ```
/// use issuepulse_core::AnalysisConfig;
///
/// let config = AnalysisConfig::default();
/// assert_eq!(config.top_n, 5);
/// assert_eq!(config.window, "all");
/// assert_eq!(config.other_top_k, 10);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// How many top issues to show (default: 5).
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Default window preset (default: `"all"`).
    #[serde(default = "default_window")]
    pub window: String,
    /// How many labels/families to surface in the Other breakdown (default: 10).
    #[serde(default = "default_other_top_k")]
    pub other_top_k: usize,
}

fn default_top_n() -> usize {
    5
}

fn default_window() -> String {
    "all".into()
}

fn default_other_top_k() -> usize {
    10
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            window: default_window(),
            other_top_k: default_other_top_k(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = PulseConfig::default();
        assert_eq!(config.data.path, PathBuf::from("./issues.json"));
        assert_eq!(config.analysis.top_n, 5);
        assert_eq!(config.analysis.window, "all");
        assert_eq!(config.analysis.other_top_k, 10);
    }

    #[test]
    fn parse_minimal_toml() {
        let toml = r#"
[analysis]
top_n = 8
window = "12m"
"#;
        let config = PulseConfig::from_toml(toml).unwrap();
        assert_eq!(config.analysis.top_n, 8);
        assert_eq!(config.analysis.window, "12m");
        assert_eq!(config.analysis.other_top_k, 10);
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
[data]
path = "exports/poetry_issues.json"

[analysis]
top_n = 20
window = "24m"
other_top_k = 5
"#;
        let config = PulseConfig::from_toml(toml).unwrap();
        assert_eq!(config.data.path, PathBuf::from("exports/poetry_issues.json"));
        assert_eq!(config.analysis.top_n, 20);
        assert_eq!(config.analysis.other_top_k, 5);
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = PulseConfig::from_toml("").unwrap();
        assert_eq!(config.analysis.top_n, 5);
        assert_eq!(config.data.path, PathBuf::from("./issues.json"));
    }

    #[test]
    fn invalid_toml_returns_error() {
        let result = PulseConfig::from_toml("{{invalid}}");
        assert!(result.is_err());
    }

    #[test]
    fn cli_override_wins_over_config() {
        let config = PulseConfig::default();
        let resolved = config.resolve_data_path(Some(Path::new("/tmp/x.json")));
        assert_eq!(resolved, PathBuf::from("/tmp/x.json"));
    }
}
