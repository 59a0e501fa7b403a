//! Configuration loader and validator for the pwnews→Telegram bot.
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub app: App,
    pub telegram: Telegram,
    pub site: Site,
}

/// App-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    /// UTC wall-clock time ("HH:MM") of the automatic weekly-results run.
    pub daily_results_time: String,
}

/// Telegram bot settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Telegram {
    pub bot_token: String,
    /// Target channel: "@username" or a numeric chat id. When unset, every
    /// publish attempt fails with an operator-visible message.
    #[serde(default)]
    pub channel: Option<String>,
}

/// News-site endpoints and scraping knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Site {
    pub base_url: String,
    pub review_listing: String,
    pub results_listing: String,
    pub weekly_listing: String,
    pub video_blog: String,
    /// Reviewer names; the review body is cut before the first sentence
    /// mentioning any of them.
    #[serde(default)]
    pub reviewers: Vec<String>,
}

impl App {
    /// Parsed form of `daily_results_time`. Valid after [`load`].
    pub fn daily_results_time(&self) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(&self.daily_results_time, "%H:%M").ok()
    }
}

impl Site {
    /// Join a site-relative path onto `base_url`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.daily_results_time().is_none() {
        return Err(ConfigError::Invalid(
            "app.daily_results_time must be HH:MM",
        ));
    }

    if cfg.telegram.bot_token.trim().is_empty() {
        return Err(ConfigError::Invalid("telegram.bot_token must be non-empty"));
    }
    if let Some(channel) = &cfg.telegram.channel {
        if channel.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "telegram.channel must be non-empty when set",
            ));
        }
    }

    if reqwest::Url::parse(&cfg.site.base_url).is_err() {
        return Err(ConfigError::Invalid("site.base_url must be a valid URL"));
    }
    if cfg.site.review_listing.trim().is_empty() {
        return Err(ConfigError::Invalid("site.review_listing must be non-empty"));
    }
    if cfg.site.results_listing.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "site.results_listing must be non-empty",
        ));
    }
    if cfg.site.weekly_listing.trim().is_empty() {
        return Err(ConfigError::Invalid("site.weekly_listing must be non-empty"));
    }
    if cfg.site.video_blog.trim().is_empty() {
        return Err(ConfigError::Invalid("site.video_blog must be non-empty"));
    }

    Ok(())
}

/// Returns an example YAML config.
pub fn example() -> &'static str {
    r#"app:
  daily_results_time: "04:30"

telegram:
  bot_token: "YOUR_TELEGRAM_BOT_TOKEN"
  channel: "@your_channel"

site:
  base_url: "https://pwnews.net"
  review_listing: "/news/1-0-23"
  results_listing: "/news/1-0-21"
  weekly_listing: "/news/1-0-21"
  video_blog: "/blog"
  reviewers:
    - "Smith"
"#
}
