//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file when present).

use std::env;
use std::str::FromStr;

use contest_core::{ChatId, UserId};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub bot: BotConfig,
    pub database: DatabaseConfig,
    /// Absent means the ephemeral store falls back to process memory
    pub redis: Option<RedisConfig>,
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default)]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Bot identity and operators
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BotConfig {
    pub token: String,
    /// Channel every participant must be subscribed to, unless a contest opts out
    pub base_channel: Option<ChatId>,
    #[serde(default)]
    pub admin_ids: Vec<UserId>,
}

impl BotConfig {
    pub fn is_admin(&self, user: UserId) -> bool {
        self.admin_ids.contains(&user)
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Redis configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    #[serde(default = "default_redis_max_connections")]
    pub max_connections: u32,
}

/// Default premium prices in stars; runtime settings may override them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PricingConfig {
    pub monthly_stars: i64,
    pub one_time_stars: i64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            monthly_stars: default_monthly_price(),
            one_time_stars: default_one_time_price(),
        }
    }
}

/// Tunables for referrals, draws and rate limiting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LimitsConfig {
    pub referral_points: i64,
    /// Age after which a draw lock counts as abandoned
    pub draw_lock_ttl_secs: u64,
    pub rate_limit_max_calls: u64,
    pub rate_limit_window_secs: u64,
    /// Pause between the draw announcement and the result
    pub draw_countdown_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            referral_points: default_referral_points(),
            draw_lock_ttl_secs: default_draw_lock_ttl(),
            rate_limit_max_calls: default_rate_limit_calls(),
            rate_limit_window_secs: default_rate_limit_window(),
            draw_countdown_secs: default_draw_countdown(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "contest-bot".to_string()
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    2
}

fn default_redis_max_connections() -> u32 {
    10
}

fn default_monthly_price() -> i64 {
    100
}

fn default_one_time_price() -> i64 {
    10
}

fn default_referral_points() -> i64 {
    1
}

fn default_draw_lock_ttl() -> u64 {
    600
}

fn default_rate_limit_calls() -> u64 {
    3
}

fn default_rate_limit_window() -> u64 {
    5
}

fn default_draw_countdown() -> u64 {
    30
}

/// Read an optional variable, falling back to `default` when unset
fn var_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name, raw)),
        _ => Ok(default),
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::MissingVar(name))
}

/// Parse a comma-separated list of user ids
fn parse_admin_ids(raw: &str) -> Result<Vec<UserId>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            UserId::parse(s).map_err(|_| ConfigError::InvalidValue("ADMIN_IDS", s.to_string()))
        })
        .collect()
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let base_channel = match env::var("BOT_BASE_CHANNEL") {
            Ok(raw) if !raw.trim().is_empty() => Some(
                ChatId::parse(&raw).map_err(|_| ConfigError::InvalidValue("BOT_BASE_CHANNEL", raw))?,
            ),
            _ => None,
        };

        Ok(Self {
            app: AppSettings {
                name: env::var("APP_NAME").unwrap_or_else(|_| default_app_name()),
                env: env::var("APP_ENV")
                    .ok()
                    .and_then(|s| Environment::parse(&s))
                    .unwrap_or_default(),
            },
            bot: BotConfig {
                token: required("BOT_TOKEN")?,
                base_channel,
                admin_ids: parse_admin_ids(&env::var("ADMIN_IDS").unwrap_or_default())?,
            },
            database: DatabaseConfig {
                url: required("DATABASE_URL")?,
                max_connections: var_or("DATABASE_MAX_CONNECTIONS", default_max_connections())?,
                min_connections: var_or("DATABASE_MIN_CONNECTIONS", default_min_connections())?,
            },
            redis: match env::var("REDIS_URL") {
                Ok(url) if !url.trim().is_empty() => Some(RedisConfig {
                    url,
                    max_connections: var_or(
                        "REDIS_MAX_CONNECTIONS",
                        default_redis_max_connections(),
                    )?,
                }),
                _ => None,
            },
            pricing: PricingConfig {
                monthly_stars: var_or("PRICE_MONTHLY_STARS", default_monthly_price())?,
                one_time_stars: var_or("PRICE_ONE_TIME_STARS", default_one_time_price())?,
            },
            limits: LimitsConfig {
                referral_points: var_or("REFERRAL_POINTS", default_referral_points())?,
                draw_lock_ttl_secs: var_or("DRAW_LOCK_TTL_SECS", default_draw_lock_ttl())?,
                rate_limit_max_calls: var_or("RATE_LIMIT_MAX_CALLS", default_rate_limit_calls())?,
                rate_limit_window_secs: var_or(
                    "RATE_LIMIT_WINDOW_SECS",
                    default_rate_limit_window(),
                )?,
                draw_countdown_secs: var_or("DRAW_COUNTDOWN_SECS", default_draw_countdown())?,
            },
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
