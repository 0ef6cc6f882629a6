// ============================
// carelink-backend-lib/src/config.rs
// ============================
//! Configuration management.
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::auth::password::{PasswordRequirements, DEFAULT_HASH_LOG_N};
use crate::auth::rate_limit::{DEFAULT_LOCKOUT_DURATION, DEFAULT_MAX_ATTEMPTS};
use crate::auth::session::{MULTI_ROLE_SESSION_TTL, SINGLE_ROLE_SESSION_TTL};

/// Config files read when no path is given, in merge order
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";
pub const DEFAULT_JSON_CONFIG_FILE: &str = "config.json";

/// Prefix of environment overrides, e.g. `CARELINK_FORCE_FALLBACK=true`.
/// Nested keys use `__`: `CARELINK_AUTH_RATE_LIMIT__MAX_ATTEMPTS=3`.
pub const ENV_PREFIX: &str = "CARELINK_";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Application settings.
///
/// Not `Debug`: `database_url` may embed credentials.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Directory holding the session token store
    pub data_dir: PathBuf,
    /// Log level, used when `RUST_LOG` is unset
    pub log_level: String,
    pub log_format: LogFormat,
    /// Persistent user store connection string
    pub database_url: Option<String>,
    /// Use the in-memory backend even if the persistent store is reachable
    pub force_fallback: bool,
    /// Short-lived single-role session TTL in seconds
    pub single_role_ttl_secs: u64,
    /// Multi-role session TTL in seconds
    pub multi_role_ttl_secs: u64,
    /// Let accounts without a stored password hash sign in
    pub allow_passwordless: bool,
    /// scrypt cost (log2 N) for newly hashed passwords
    pub password_hash_log_n: u8,
    pub auth_rate_limit: AuthRateLimitSettings,
    pub password_requirements: PasswordRequirements,
}

/// Failed sign-in lockout settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthRateLimitSettings {
    pub max_attempts: u32,
    pub lockout_secs: u64,
}

impl Default for AuthRateLimitSettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            lockout_secs: DEFAULT_LOCKOUT_DURATION.as_secs(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            data_dir: PathBuf::from("data"),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            database_url: None,
            force_fallback: false,
            single_role_ttl_secs: SINGLE_ROLE_SESSION_TTL.as_secs(),
            multi_role_ttl_secs: MULTI_ROLE_SESSION_TTL.as_secs(),
            allow_passwordless: true,
            password_hash_log_n: DEFAULT_HASH_LOG_N,
            auth_rate_limit: AuthRateLimitSettings::default(),
            password_requirements: PasswordRequirements::default(),
        }
    }
}

impl Settings {
    /// Load defaults, then `config.toml`, then `config.json`, then the environment
    pub fn load() -> Result<Self> {
        let figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(DEFAULT_CONFIG_FILE))
            .merge(Json::file(DEFAULT_JSON_CONFIG_FILE));
        Self::extract(figment)
    }

    /// Load from a TOML or JSON file (by extension) layered over the defaults,
    /// with environment variables on top. A missing file is not an error.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let figment = Figment::from(Serialized::defaults(Settings::default()));
        let figment = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => figment.merge(Json::file(path)),
            _ => figment.merge(Toml::file(path)),
        };
        Self::extract(figment)
    }

    fn extract(figment: Figment) -> Result<Self> {
        let settings: Settings = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            bail!("invalid log level: {}", self.log_level);
        }
        if self.single_role_ttl_secs == 0 || self.multi_role_ttl_secs == 0 {
            bail!("session TTLs must be greater than zero");
        }
        if self.single_role_ttl_secs > self.multi_role_ttl_secs {
            bail!("single-role session TTL must not exceed the multi-role TTL");
        }
        if self.password_requirements.min_length < 8 {
            bail!("password minimum length must be at least 8");
        }
        if self.auth_rate_limit.max_attempts == 0 {
            bail!("auth_rate_limit.max_attempts must be greater than zero");
        }
        if !(10..=20).contains(&self.password_hash_log_n) {
            bail!("password_hash_log_n must be between 10 and 20");
        }
        Ok(())
    }

    pub fn single_role_ttl(&self) -> Duration {
        Duration::from_secs(self.single_role_ttl_secs)
    }

    pub fn multi_role_ttl(&self) -> Duration {
        Duration::from_secs(self.multi_role_ttl_secs)
    }

    pub fn lockout_duration(&self) -> Duration {
        Duration::from_secs(self.auth_rate_limit.lockout_secs)
    }
}
