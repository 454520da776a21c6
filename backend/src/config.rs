//! Service configuration loaded via OrthoConfig.
//!
//! [`AppSettings`] is read once at start-up from CLI flags, `DOCKET_*`
//! environment variables, and the config file, then validated into
//! [`ServiceSettings`], which holds the typed configuration each component
//! receives. Nothing reads configuration after start-up.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use chrono::TimeDelta;
use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::{
    DEFAULT_MAX_UPLOAD_BYTES, SchedulerConfig, SchedulerConfigError, SigningKey,
    SimulationConfig, SimulationConfigError, TokenConfig, TokenSetupError,
};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_ACCESS_TOKEN_TTL_MINUTES: i64 = 30;
const DEFAULT_REFRESH_TOKEN_TTL_DAYS: i64 = 7;
const DEFAULT_UPLOAD_DIR: &str = "./uploads";
const DEFAULT_WORKER_CONCURRENCY: usize = 4;
const DEFAULT_QUEUE_CAPACITY: usize = 64;
const DEFAULT_PROCESSING_MIN_MS: u64 = 500;
const DEFAULT_PROCESSING_MAX_MS: u64 = 1500;
const DEFAULT_PROCESSING_FAILURE_RATE: f64 = 0.05;
const DEV_JWT_SECRET: &str = "docket-development-secret-change-me";

/// Raw configuration values as supplied by the operator.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(prefix = "DOCKET")]
pub struct AppSettings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL; in-memory stores are used when absent.
    pub database_url: Option<String>,
    /// HMAC secret for signing tokens.
    pub jwt_secret: Option<String>,
    /// Access token lifetime in minutes.
    pub access_token_ttl_minutes: Option<i64>,
    /// Refresh token lifetime in days.
    pub refresh_token_ttl_days: Option<i64>,
    /// Directory uploaded files are written to.
    pub upload_dir: Option<PathBuf>,
    /// Processing jobs allowed to run at once.
    #[ortho_config(default = 4)]
    pub worker_concurrency: usize,
    /// Submissions that may wait for a worker.
    #[ortho_config(default = 64)]
    pub queue_capacity: usize,
    /// Shortest simulated processing run, in milliseconds.
    pub processing_min_ms: Option<u64>,
    /// Longest simulated processing run, in milliseconds.
    pub processing_max_ms: Option<u64>,
    /// Probability in `[0, 1]` that a simulated run fails.
    pub processing_failure_rate: Option<f64>,
    /// Largest accepted upload body.
    pub max_upload_bytes: Option<usize>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            bind_addr: None,
            database_url: None,
            jwt_secret: None,
            access_token_ttl_minutes: None,
            refresh_token_ttl_days: None,
            upload_dir: None,
            worker_concurrency: DEFAULT_WORKER_CONCURRENCY,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            processing_min_ms: None,
            processing_max_ms: None,
            processing_failure_rate: None,
            max_upload_bytes: None,
        }
    }
}

/// Whether a missing `jwt_secret` may fall back to the development secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretPolicy {
    /// Fall back to the built-in development secret.
    AllowDevelopmentDefault,
    /// Refuse to start without an explicit secret.
    Require,
}

impl SecretPolicy {
    /// Development default in debug builds only.
    pub fn for_build() -> Self {
        if cfg!(debug_assertions) {
            Self::AllowDevelopmentDefault
        } else {
            Self::Require
        }
    }
}

/// Reasons [`AppSettings`] cannot be turned into [`ServiceSettings`].
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// `bind_addr` did not parse.
    #[error("bind_addr `{value}` is not a socket address")]
    InvalidBindAddr { value: String },
    /// No secret under [`SecretPolicy::Require`].
    #[error("jwt_secret must be set")]
    MissingSecret,
    /// The secret was blank.
    #[error("jwt_secret must not be empty")]
    EmptySecret,
    /// A TTL does not fit in a [`TimeDelta`].
    #[error("{field} is too large")]
    TtlOutOfRange { field: &'static str },
    /// Token lifetimes were rejected.
    #[error(transparent)]
    Tokens(#[from] TokenSetupError),
    /// Scheduler sizing was rejected.
    #[error(transparent)]
    Scheduler(#[from] SchedulerConfigError),
    /// Simulation parameters were rejected.
    #[error(transparent)]
    Simulation(#[from] SimulationConfigError),
    /// `max_upload_bytes` was zero.
    #[error("max_upload_bytes must be greater than zero")]
    ZeroUploadLimit,
}

/// Validated configuration handed to the server builder.
#[derive(Debug)]
pub struct ServiceSettings {
    /// Listener address.
    pub bind_addr: SocketAddr,
    /// Non-blank database URL, if any.
    pub database_url: Option<String>,
    /// Token signing key.
    pub signing_key: SigningKey,
    /// True when the development secret is in use.
    pub uses_development_secret: bool,
    /// Token lifetimes.
    pub tokens: TokenConfig,
    /// Upload directory.
    pub upload_dir: PathBuf,
    /// Worker pool sizing.
    pub scheduler: SchedulerConfig,
    /// Simulated processor parameters.
    pub simulation: SimulationConfig,
    /// Upload body limit in bytes.
    pub max_upload_bytes: usize,
}

impl AppSettings {
    /// Configured upload directory, or `./uploads`.
    pub fn upload_dir(&self) -> PathBuf {
        self.upload_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR))
    }

    /// Validate every value and build the typed component configurations.
    ///
    /// # Errors
    /// Returns the first [`SettingsError`] encountered.
    pub fn resolve(&self, policy: SecretPolicy) -> Result<ServiceSettings, SettingsError> {
        let raw_addr = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        let bind_addr = raw_addr
            .parse()
            .map_err(|_| SettingsError::InvalidBindAddr {
                value: raw_addr.to_owned(),
            })?;

        let (secret, uses_development_secret) = match (self.jwt_secret.as_deref(), policy) {
            (Some(secret), _) => (secret, false),
            (None, SecretPolicy::AllowDevelopmentDefault) => (DEV_JWT_SECRET, true),
            (None, SecretPolicy::Require) => return Err(SettingsError::MissingSecret),
        };
        let signing_key =
            SigningKey::new(secret.as_bytes().to_vec()).map_err(|_| SettingsError::EmptySecret)?;

        let access_minutes = self
            .access_token_ttl_minutes
            .unwrap_or(DEFAULT_ACCESS_TOKEN_TTL_MINUTES);
        let refresh_days = self
            .refresh_token_ttl_days
            .unwrap_or(DEFAULT_REFRESH_TOKEN_TTL_DAYS);
        let tokens = TokenConfig::new(
            TimeDelta::try_minutes(access_minutes).ok_or(SettingsError::TtlOutOfRange {
                field: "access_token_ttl_minutes",
            })?,
            TimeDelta::try_days(refresh_days).ok_or(SettingsError::TtlOutOfRange {
                field: "refresh_token_ttl_days",
            })?,
        )?;

        let scheduler = SchedulerConfig::new(self.worker_concurrency, self.queue_capacity)?;

        let simulation = SimulationConfig::new(
            Duration::from_millis(self.processing_min_ms.unwrap_or(DEFAULT_PROCESSING_MIN_MS)),
            Duration::from_millis(self.processing_max_ms.unwrap_or(DEFAULT_PROCESSING_MAX_MS)),
            self.processing_failure_rate
                .unwrap_or(DEFAULT_PROCESSING_FAILURE_RATE),
        )?;

        let max_upload_bytes = self.max_upload_bytes.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);
        if max_upload_bytes == 0 {
            return Err(SettingsError::ZeroUploadLimit);
        }

        Ok(ServiceSettings {
            bind_addr,
            database_url: self.database_url.clone().filter(|url| !url.trim().is_empty()),
            signing_key,
            uses_development_secret,
            tokens,
            upload_dir: self.upload_dir(),
            scheduler,
            simulation,
            max_upload_bytes,
        })
    }
}
