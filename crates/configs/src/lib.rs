//! # configs
//!
//! Layered settings for the catalog server. Sources, lowest priority first:
//!
//! 1. built-in defaults ([`Settings::default`])
//! 2. `config/default.toml` (optional)
//! 3. `config/{APP_ENV}.toml` (optional)
//! 4. `CATALOG__*` environment variables, `__` separating sections
//!    (`CATALOG__SERVER__PORT=9000`)
//!
//! A `.env` file is read first so its values reach step 4.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use domains::ScoringWeights;
use secrecy::SecretString;
use serde::Deserialize;
use tracing::debug;

pub const ENV_PREFIX: &str = "CATALOG";
const ENV_SEPARATOR: &str = "__";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub feed: FeedSettings,
    pub similarity: SimilaritySettings,
    pub suppression: SuppressionSettings,
    pub legacy: LegacySettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { host: "0.0.0.0".into(), port: 8080 }
    }
}

impl ServerSettings {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// No `url` means the in-memory adapters are used.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: Option<SecretString>,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self { url: None, max_connections: 10 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub jwt_secret: Option<SecretString>,
    pub issuer: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self { jwt_secret: None, issuer: "indie-catalog".into() }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    pub default_limit: usize,
    pub max_limit: usize,
    /// 0 disables the timeout
    pub legacy_timeout_ms: u64,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self { default_limit: 24, max_limit: 100, legacy_timeout_ms: 2_000 }
    }
}

impl FeedSettings {
    pub fn legacy_timeout(&self) -> Option<Duration> {
        (self.legacy_timeout_ms > 0).then(|| Duration::from_millis(self.legacy_timeout_ms))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimilaritySettings {
    /// Feed items considered as candidates. Should cover the whole catalog
    /// for the result size to be exact.
    pub pool_size: usize,
    pub default_limit: usize,
    pub weights: ScoringWeights,
}

impl Default for SimilaritySettings {
    fn default() -> Self {
        Self { pool_size: 500, default_limit: 6, weights: ScoringWeights::default() }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SuppressionSettings {
    /// 0 disables caching
    pub cache_ttl_secs: u64,
}

impl Default for SuppressionSettings {
    fn default() -> Self {
        Self { cache_ttl_secs: 5 }
    }
}

impl SuppressionSettings {
    pub fn cache_ttl(&self) -> Option<Duration> {
        (self.cache_ttl_secs > 0).then(|| Duration::from_secs(self.cache_ttl_secs))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LegacySettings {
    /// JSON array of legacy entries loaded into the in-memory catalog.
    pub seed_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub format: LogFormat,
    /// `EnvFilter` directive; `RUST_LOG` wins when set.
    pub filter: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self { format: LogFormat::Pretty, filter: "info,sqlx=warn".into() }
    }
}

impl Settings {
    /// Loads settings from `./config` and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        Self::load_from(Path::new("config"), &env)
    }

    /// Same as [`Settings::load`] with an explicit config directory and
    /// environment name. Does not read `.env`.
    pub fn load_from(dir: &Path, env: &str) -> Result<Self, ConfigError> {
        debug!(dir = %dir.display(), env, "loading settings");
        let settings: Settings = Config::builder()
            .add_source(File::from(dir.join("default")).required(false))
            .add_source(File::from(dir.join(env)).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feed.max_limit == 0 {
            return Err(ConfigError::Invalid {
                key: "feed.max_limit",
                reason: "must be greater than zero".into(),
            });
        }
        if self.feed.default_limit > self.feed.max_limit {
            return Err(ConfigError::Invalid {
                key: "feed.default_limit",
                reason: format!("exceeds feed.max_limit ({})", self.feed.max_limit),
            });
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid {
                key: "database.max_connections",
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }
}
