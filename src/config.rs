use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
    #[serde(default)]
    pub stats: StatsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AiConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    /// Caller-enforced bound on every provider call, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: None,
            timeout_secs: 30,
        }
    }
}

impl AiConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaginationConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: i64,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: i64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

fn default_page_size() -> i64 {
    20
}
fn default_max_page_size() -> i64 {
    100
}

#[derive(Debug, Deserialize, Clone)]
pub struct SummaryConfig {
    /// Cap on the batch fed to the AI provider for one summary. Bounds
    /// prompt size, cost, and latency regardless of how broad a filter is.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: i64,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            max_batch_size: default_max_batch_size(),
        }
    }
}

fn default_max_batch_size() -> i64 {
    50
}

#[derive(Debug, Deserialize, Clone)]
pub struct StatsConfig {
    /// Trailing window for the `recent_count` statistic.
    #[serde(default = "default_recent_window_days")]
    pub recent_window_days: i64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            recent_window_days: default_recent_window_days(),
        }
    }
}

fn default_recent_window_days() -> i64 {
    7
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    // Validate pagination
    if config.pagination.default_page_size < 1 {
        anyhow::bail!("pagination.default_page_size must be >= 1");
    }
    if config.pagination.max_page_size < config.pagination.default_page_size {
        anyhow::bail!("pagination.max_page_size must be >= pagination.default_page_size");
    }

    // Validate summary
    if config.summary.max_batch_size < 1 {
        anyhow::bail!("summary.max_batch_size must be >= 1");
    }

    // Validate stats
    if config.stats.recent_window_days < 1 {
        anyhow::bail!("stats.recent_window_days must be >= 1");
    }

    // Validate ai
    match config.ai.provider.as_str() {
        "disabled" | "gemini" => {}
        other => anyhow::bail!("Unknown AI provider: '{}'. Must be disabled or gemini.", other),
    }
    if config.ai.is_enabled() && config.ai.model.is_none() {
        anyhow::bail!(
            "ai.model must be specified when provider is '{}'",
            config.ai.provider
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_optional_sections() {
        let config: Config = toml::from_str(
            r#"
            [db]
            path = "./data/feedback.sqlite"

            [server]
            bind = "127.0.0.1:7410"
            "#,
        )
        .unwrap();

        assert_eq!(config.ai.provider, "disabled");
        assert_eq!(config.pagination.default_page_size, 20);
        assert_eq!(config.pagination.max_page_size, 100);
        assert_eq!(config.summary.max_batch_size, 50);
        assert_eq!(config.stats.recent_window_days, 7);
    }

    #[test]
    fn test_gemini_requires_model() {
        let config: Config = toml::from_str(
            r#"
            [db]
            path = "./data/feedback.sqlite"

            [server]
            bind = "127.0.0.1:7410"

            [ai]
            provider = "gemini"
            "#,
        )
        .unwrap();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let config: Config = toml::from_str(
            r#"
            [db]
            path = "./data/feedback.sqlite"

            [server]
            bind = "127.0.0.1:7410"

            [ai]
            provider = "delphi"
            model = "oracle-1"
            "#,
        )
        .unwrap();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_page_size_bounds_checked() {
        let config: Config = toml::from_str(
            r#"
            [db]
            path = "./data/feedback.sqlite"

            [server]
            bind = "127.0.0.1:7410"

            [pagination]
            default_page_size = 50
            max_page_size = 10
            "#,
        )
        .unwrap();
        assert!(validate(&config).is_err());
    }
}
