use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::catalogue::ChannelInfo;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to write config file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("unknown timezone: {0}")]
    Timezone(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("required environment variable not set: {0}")]
    MissingEnv(&'static str),
}

/// Configuration for the On This Day archive
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Channel whose uploads are catalogued
    pub channel: ChannelConfig,

    /// Catalogue location
    pub storage: StorageConfig,

    /// Title date extraction and "today" settings
    pub date_parsing: DateParsingConfig,

    /// Daily playlist settings
    pub playlist: PlaylistConfig,

    /// Daily forum post settings
    pub reddit: RedditConfig,

    /// Feature switches
    pub features: FeatureConfig,

    /// Log level and optional log file
    pub logging: LoggingConfig,

    /// HTTP client settings
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Channel handle, with or without the leading `@`
    pub handle: String,

    /// Display name used before the first fetch
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Catalogue JSON file; the backup lives next to it with a `.backup` suffix
    pub videos_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DateParsingConfig {
    /// strftime patterns matched against the whole title, in order
    pub title_patterns: Vec<String>,

    /// Scan titles for any embedded date when no pattern matches
    pub fuzzy_matching: bool,

    /// Use the upload date when the title yields nothing
    pub use_upload_date_fallback: bool,

    /// IANA zone used to decide what "today" is
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaylistConfig {
    /// Title template, supports `{month}` and `{day}`
    pub title_format: String,

    /// Description template, supports `{month}`, `{day}` and `{date}`
    pub description_format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedditConfig {
    pub subreddit: String,

    /// Post title template
    pub post_title_format: String,

    /// Post body template, supports `{video_list}` and `{playlist_url}` as well
    pub post_template: String,

    /// Flair applied after submission when available
    pub flair_text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Log what would be published without writing anything remote
    pub dry_run: bool,

    pub create_playlist: bool,

    pub post_to_reddit: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,

    /// Append logs to this file as well as stdout
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            handle: "@TheDailyWoo".to_string(),
            name: "Adam The Woo".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            videos_path: PathBuf::from("data/videos.json"),
        }
    }
}

impl Default for DateParsingConfig {
    fn default() -> Self {
        Self {
            title_patterns: vec![
                "%m/%d/%Y".to_string(),
                "%m/%d/%y".to_string(),
                "%B %d, %Y".to_string(),
                "%Y-%m-%d".to_string(),
            ],
            fuzzy_matching: true,
            use_upload_date_fallback: true,
            timezone: "America/New_York".to_string(),
        }
    }
}

impl Default for PlaylistConfig {
    fn default() -> Self {
        Self {
            title_format: "On This Day: {month} {day}".to_string(),
            description_format: "Videos recorded on {date} across the years.".to_string(),
        }
    }
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            subreddit: "Adamthewoo".to_string(),
            post_title_format: "On This Day - {month} {day}".to_string(),
            post_template: "Videos recorded on {date} in past years:\n\n{video_list}\n\n\
                            Playlist: {playlist_url}"
                .to_string(),
            flair_text: None,
        }
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            create_playlist: true,
            post_to_reddit: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_seconds: 30 }
    }
}

impl DateParsingConfig {
    /// Parsed `timezone`
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::Timezone(self.timezone.clone()))
    }
}

impl ChannelConfig {
    /// Channel info used for a catalogue that has never been fetched
    pub fn placeholder(&self) -> ChannelInfo {
        ChannelInfo::placeholder(&self.name, &self.handle)
    }
}

impl Config {
    /// Well-known config file locations, first hit wins
    pub const SEARCH_PATHS: [&'static str; 3] = [
        "on-this-day.toml",
        "config/on-this-day.toml",
        "/etc/on-this-day/config.toml",
    ];

    /// Load from the first config file found (defaults if none), then apply
    /// environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::SEARCH_PATHS.iter().map(Path::new).find(|p| p.exists()) {
            Some(path) => Self::from_file(path)?,
            None => {
                tracing::info!("No configuration file found, using defaults");
                Self::default()
            }
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a specific TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let config_str = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = toml::from_str(&config_str).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::info!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production, a map in tests)
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(handle) = lookup("YOUTUBE_CHANNEL_HANDLE").filter(|v| !v.is_empty()) {
            self.channel.handle = handle;
        }

        if let Some(path) = lookup("OTD_VIDEOS_PATH") {
            self.storage.videos_path = PathBuf::from(path);
        }

        if let Some(tz) = lookup("OTD_TIMEZONE") {
            self.date_parsing.timezone = tz;
        }

        if let Some(dry_run) = lookup("OTD_DRY_RUN") {
            self.features.dry_run = matches!(dry_run.to_lowercase().as_str(), "1" | "true" | "yes");
        }

        if let Some(level) = lookup("OTD_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Some(file) = lookup("OTD_LOG_FILE") {
            self.logging.file = Some(PathBuf::from(file));
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!("💾 Configuration saved to: {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.date_parsing.tz()?;

        if self.storage.videos_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("storage.videos_path must not be empty".to_string()));
        }

        if self.channel.handle.trim_start_matches('@').is_empty() {
            return Err(ConfigError::Invalid("channel.handle must not be empty".to_string()));
        }

        if self.features.post_to_reddit && self.reddit.subreddit.is_empty() {
            return Err(ConfigError::Invalid(
                "reddit.subreddit is required when posting is enabled".to_string(),
            ));
        }

        if self.http.timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "http.timeout_seconds must be greater than 0".to_string(),
            ));
        }

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "On This Day Configuration:\n\
            - Channel: {}\n\
            - Catalogue: {}\n\
            - Title Patterns: {}\n\
            - Fuzzy Matching: {}\n\
            - Upload Date Fallback: {}\n\
            - Timezone: {}\n\
            - Dry Run: {}",
            self.channel.handle,
            self.storage.videos_path.display(),
            self.date_parsing.title_patterns.join(", "),
            self.date_parsing.fuzzy_matching,
            self.date_parsing.use_upload_date_fallback,
            self.date_parsing.timezone,
            self.features.dry_run
        )
    }
}

/// OAuth client for playlist writes
#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

/// Script-app credentials for the forum account
#[derive(Debug, Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub user_agent: String,
}

/// Secrets read once at startup and handed to the publishers explicitly
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    youtube_api_key: Option<String>,
    youtube_client_id: Option<String>,
    youtube_client_secret: Option<String>,
    youtube_refresh_token: Option<String>,
    reddit_client_id: Option<String>,
    reddit_client_secret: Option<String>,
    reddit_username: Option<String>,
    reddit_password: Option<String>,
    reddit_user_agent: Option<String>,
}

pub const DEFAULT_USER_AGENT: &str = "on-this-day-bot/1.0";

impl Credentials {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        Self {
            youtube_api_key: get("YOUTUBE_API_KEY"),
            youtube_client_id: get("YOUTUBE_CLIENT_ID"),
            youtube_client_secret: get("YOUTUBE_CLIENT_SECRET"),
            youtube_refresh_token: get("YOUTUBE_REFRESH_TOKEN"),
            reddit_client_id: get("REDDIT_CLIENT_ID"),
            reddit_client_secret: get("REDDIT_CLIENT_SECRET"),
            reddit_username: get("REDDIT_USERNAME"),
            reddit_password: get("REDDIT_PASSWORD"),
            reddit_user_agent: get("REDDIT_USER_AGENT"),
        }
    }

    pub fn youtube_api_key(&self) -> Result<&str, ConfigError> {
        required(&self.youtube_api_key, "YOUTUBE_API_KEY")
    }

    pub fn youtube_oauth(&self) -> Result<OAuthCredentials, ConfigError> {
        Ok(OAuthCredentials {
            client_id: required(&self.youtube_client_id, "YOUTUBE_CLIENT_ID")?.to_string(),
            client_secret: required(&self.youtube_client_secret, "YOUTUBE_CLIENT_SECRET")?
                .to_string(),
            refresh_token: required(&self.youtube_refresh_token, "YOUTUBE_REFRESH_TOKEN")?
                .to_string(),
        })
    }

    pub fn reddit(&self) -> Result<RedditCredentials, ConfigError> {
        Ok(RedditCredentials {
            client_id: required(&self.reddit_client_id, "REDDIT_CLIENT_ID")?.to_string(),
            client_secret: required(&self.reddit_client_secret, "REDDIT_CLIENT_SECRET")?
                .to_string(),
            username: required(&self.reddit_username, "REDDIT_USERNAME")?.to_string(),
            password: required(&self.reddit_password, "REDDIT_PASSWORD")?.to_string(),
            user_agent: self
                .reddit_user_agent
                .clone()
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        })
    }
}

fn required<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, ConfigError> {
    value.as_deref().ok_or(ConfigError::MissingEnv(name))
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

    pub fn with_videos_path(mut self, path: PathBuf) -> Self {
        self.config.storage.videos_path = path;
        self
    }

    pub fn with_title_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.date_parsing.title_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timezone(mut self, timezone: &str) -> Self {
        self.config.date_parsing.timezone = timezone.to_string();
        self
    }

    pub fn enable_fuzzy_matching(mut self, enable: bool) -> Self {
        self.config.date_parsing.fuzzy_matching = enable;
        self
    }

    pub fn enable_upload_date_fallback(mut self, enable: bool) -> Self {
        self.config.date_parsing.use_upload_date_fallback = enable;
        self
    }

    pub fn dry_run(mut self, enable: bool) -> Self {
        self.config.features.dry_run = enable;
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
