use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{IndexerError, Result};

/// Environment variable holding the YouTube Data API key
pub const API_KEY_ENV: &str = "YOUTUBE_API_KEY";

/// Configuration for the RocketScope indexer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Channel registry, indexed in order
    pub channels: Vec<ChannelConfig>,

    /// Listing window and worker settings
    pub indexing: IndexingConfig,

    /// Transcript retrieval settings
    pub transcripts: TranscriptConfig,

    /// YouTube Data API settings
    pub youtube: YouTubeConfig,

    /// Roster settings
    pub roster: RosterConfig,

    /// Output and storage settings
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Display name used in the report
    pub name: String,

    /// Upstream channel identifier
    pub channel_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexingConfig {
    /// Only list videos published within this many days (None = no floor)
    pub days_back: Option<u32>,

    /// Ceiling on candidate videos per channel
    pub max_results: usize,

    /// Maximum number of concurrent transcript workers
    pub max_workers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptConfig {
    /// Language preference order, first available wins
    pub languages: Vec<String>,

    /// Timeout for a single transcript request (seconds)
    pub request_timeout_seconds: u64,

    /// Maximum retries for transient failures
    pub max_retries: u32,

    /// Backoff before the first retry (milliseconds), doubled per attempt
    pub initial_backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YouTubeConfig {
    /// Base URL of the Data API
    pub api_base: String,

    /// Timeout for a single listing request (seconds)
    pub request_timeout_seconds: u64,

    /// Maximum retries for transient failures
    pub max_retries: u32,

    /// Backoff before the first retry (milliseconds), doubled per attempt
    pub initial_backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    /// User-editable roster file, one name per line
    pub user_roster_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Durable cache store
    pub cache_path: PathBuf,

    /// Report consumed by the frontend
    pub report_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            channels: vec![ChannelConfig {
                name: "Retals".to_string(),
                channel_id: "UCRLM6B6rGXDSJawUH_mHHPw".to_string(),
            }],
            indexing: IndexingConfig::default(),
            transcripts: TranscriptConfig::default(),
            youtube: YouTubeConfig::default(),
            roster: RosterConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            days_back: Some(30),
            max_results: 500,
            max_workers: num_cpus::get().min(4),
        }
    }
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            languages: vec!["en".to_string(), "en-US".to_string(), "en-GB".to_string()],
            request_timeout_seconds: 20,
            max_retries: 3,
            initial_backoff_ms: 500,
        }
    }
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            api_base: "https://www.googleapis.com/youtube/v3".to_string(),
            request_timeout_seconds: 15,
            max_retries: 3,
            initial_backoff_ms: 500,
        }
    }
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            user_roster_file: Some(PathBuf::from("config/friends.txt")),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            cache_path: PathBuf::from("cache/video_cache.json"),
            report_path: PathBuf::from("data/mentions.json"),
        }
    }
}

impl Config {
    /// Load configuration from an explicit file, or from the default locations.
    ///
    /// An explicit path that cannot be read or parsed is an error. Default
    /// locations are optional; when none exists the built-in defaults are used.
    /// Environment overrides are applied last in both cases.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::from_default_locations(),
        };
        Ok(config.with_env_overrides())
    }

    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        tracing::info!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    fn from_default_locations() -> Self {
        let config_paths = ["rocketscope.toml", "config/rocketscope.toml"];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str(&config_str) {
                    Ok(config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        tracing::debug!("No configuration file found, using defaults");
        Self::default()
    }

    /// Apply environment variable overrides
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(days) = std::env::var("ROCKETSCOPE_DAYS_BACK") {
            match days.trim() {
                "" | "0" | "all" => self.indexing.days_back = None,
                value => {
                    if let Ok(days) = value.parse() {
                        self.indexing.days_back = Some(days);
                    }
                }
            }
        }

        if let Ok(max_results) = std::env::var("ROCKETSCOPE_MAX_RESULTS") {
            self.indexing.max_results = max_results.parse().unwrap_or(self.indexing.max_results);
        }

        if let Ok(workers) = std::env::var("ROCKETSCOPE_WORKERS") {
            self.indexing.max_workers = workers.parse().unwrap_or(self.indexing.max_workers);
        }

        if let Ok(cache_path) = std::env::var("ROCKETSCOPE_CACHE_PATH") {
            self.output.cache_path = PathBuf::from(cache_path);
        }

        if let Ok(report_path) = std::env::var("ROCKETSCOPE_REPORT_PATH") {
            self.output.report_path = PathBuf::from(report_path);
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.channels.is_empty() {
            return Err(IndexerError::Config("at least one channel must be configured".to_string()));
        }

        if let Some(channel) = self.channels.iter().find(|c| c.channel_id.trim().is_empty()) {
            return Err(IndexerError::Config(format!("channel '{}' has an empty channel_id", channel.name)));
        }

        if self.indexing.max_results == 0 {
            return Err(IndexerError::Config("max_results must be greater than 0".to_string()));
        }

        if self.indexing.max_workers == 0 {
            return Err(IndexerError::Config("max_workers must be greater than 0".to_string()));
        }

        if self.transcripts.languages.is_empty() {
            return Err(IndexerError::Config("at least one transcript language is required".to_string()));
        }

        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        let window = match self.indexing.days_back {
            Some(days) => format!("last {} days", days),
            None => "all time".to_string(),
        };

        format!(
            "RocketScope Configuration:\n\
            - Channels: {}\n\
            - Window: {}\n\
            - Max results per channel: {}\n\
            - Workers: {}\n\
            - Languages: {}\n\
            - Cache: {}\n\
            - Report: {}",
            self.channels.iter().map(|c| c.name.as_str()).collect::<Vec<_>>().join(", "),
            window,
            self.indexing.max_results,
            self.indexing.max_workers,
            self.transcripts.languages.join(", "),
            self.output.cache_path.display(),
            self.output.report_path.display(),
        )
    }
}

/// Opaque API credential, read from the environment only
#[derive(Clone)]
pub struct ApiCredential(String);

impl ApiCredential {
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(IndexerError::MissingCredential(API_KEY_ENV.to_string()));
        }
        Ok(Self(key.trim().to_string()))
    }

    /// Read the credential from `YOUTUBE_API_KEY`
    pub fn from_env() -> Result<Self> {
        let key = std::env::var(API_KEY_ENV)
            .map_err(|_| IndexerError::MissingCredential(API_KEY_ENV.to_string()))?;
        Self::new(key)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiCredential(***)")
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_channels(mut self, channels: Vec<ChannelConfig>) -> Self {
        self.config.channels = channels;
        self
    }

    pub fn with_days_back(mut self, days_back: Option<u32>) -> Self {
        self.config.indexing.days_back = days_back;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.config.indexing.max_results = max_results;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.config.indexing.max_workers = workers;
        self
    }

    pub fn with_cache_path(mut self, path: PathBuf) -> Self {
        self.config.output.cache_path = path;
        self
    }

    pub fn with_report_path(mut self, path: PathBuf) -> Self {
        self.config.output.report_path = path;
        self
    }

    pub fn with_user_roster_file(mut self, path: Option<PathBuf>) -> Self {
        self.config.roster.user_roster_file = path;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a `NAME=CHANNEL_ID` pair from the command line
pub fn parse_channel_arg(arg: &str) -> std::result::Result<ChannelConfig, String> {
    match arg.split_once('=') {
        Some((name, id)) if !name.trim().is_empty() && !id.trim().is_empty() => Ok(ChannelConfig {
            name: name.trim().to_string(),
            channel_id: id.trim().to_string(),
        }),
        _ => Err(format!("expected NAME=CHANNEL_ID, got '{}'", arg)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.indexing.days_back, Some(30));
        assert_eq!(config.indexing.max_results, 500);
        assert_eq!(config.transcripts.languages, vec!["en", "en-US", "en-GB"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .with_workers(8)
            .with_days_back(None)
            .with_max_results(50)
            .build();

        assert_eq!(config.indexing.max_workers, 8);
        assert_eq!(config.indexing.days_back, None);
        assert_eq!(config.indexing.max_results, 50);
    }

    #[test]
    fn test_config_validation() {
        let config = ConfigBuilder::new().with_workers(0).build();
        assert!(config.validate().is_err());

        let config = ConfigBuilder::new().with_channels(Vec::new()).build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("rocketscope.toml");
        std::fs::write(
            &path,
            r#"
[[channels]]
name = "Lethamyr"
channel_id = "UCMJCb8wW88j0e6K8Ac7Xf8A"

[indexing]
days_back = 7
"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.channels.len(), 1);
        assert_eq!(config.channels[0].name, "Lethamyr");
        assert_eq!(config.indexing.days_back, Some(7));
        assert_eq!(config.indexing.max_results, 500);
        assert_eq!(config.output.cache_path, PathBuf::from("cache/video_cache.json"));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        assert!(Config::from_file(&temp_dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_blank_credential_rejected() {
        assert!(matches!(ApiCredential::new("   "), Err(IndexerError::MissingCredential(_))));
        let credential = ApiCredential::new(" abc ").unwrap();
        assert_eq!(credential.expose(), "abc");
        assert_eq!(format!("{:?}", credential), "ApiCredential(***)");
    }

    #[test]
    fn test_parse_channel_arg() {
        let channel = parse_channel_arg("Retals=UCRLM6B6rGXDSJawUH_mHHPw").unwrap();
        assert_eq!(channel.name, "Retals");
        assert_eq!(channel.channel_id, "UCRLM6B6rGXDSJawUH_mHHPw");
        assert!(parse_channel_arg("Retals").is_err());
        assert!(parse_channel_arg("=abc").is_err());
    }
}
