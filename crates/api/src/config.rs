use std::time::Duration;

use reelswap_fal::api::{DEFAULT_MODEL_ID, DEFAULT_QUEUE_URL, DEFAULT_STORAGE_URL};
use reelswap_fal::poller::PollConfig;
use reelswap_fal::FalConfig;

/// Path the provider posts push notifications to.
pub const WEBHOOK_PATH: &str = "/api/webhook";

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development, except
/// the provider credential, which has none.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `600`; uploads are large).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for in-flight requests, in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Maximum request body size in bytes (default: 500 MiB).
    pub max_upload_bytes: usize,
    /// fal credential and endpoints.
    pub fal: FalConfig,
    /// Publicly reachable base URL of this server. When set, jobs are
    /// submitted with a webhook and updates are pushed; otherwise the event
    /// stream polls.
    pub public_base_url: Option<String>,
    /// Server-side polling cadence and budget.
    pub poll: PollConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                                 |
    /// |-------------------------|-----------------------------------------|
    /// | `HOST`                  | `0.0.0.0`                               |
    /// | `PORT`                  | `3000`                                  |
    /// | `CORS_ORIGINS`          | `http://localhost:5173`                 |
    /// | `REQUEST_TIMEOUT_SECS`  | `600`                                   |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                                    |
    /// | `MAX_UPLOAD_BYTES`      | `524288000`                             |
    /// | `FAL_KEY`               | unset                                   |
    /// | `FAL_MODEL_ID`          | `fal-ai/wan/v2.2-14b/animate/replace`   |
    /// | `FAL_QUEUE_URL`         | `https://queue.fal.run`                 |
    /// | `FAL_STORAGE_URL`       | `https://rest.alpha.fal.ai`             |
    /// | `PUBLIC_BASE_URL`       | unset (poll mode)                       |
    /// | `POLL_INTERVAL_SECS`    | `5`                                     |
    /// | `POLL_MAX_ATTEMPTS`     | `120`                                   |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = parse_var("PORT", "3000");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = parse_var("REQUEST_TIMEOUT_SECS", "600");
        let shutdown_timeout_secs: u64 = parse_var("SHUTDOWN_TIMEOUT_SECS", "30");
        let max_upload_bytes: usize = parse_var("MAX_UPLOAD_BYTES", "524288000");

        let fal = FalConfig {
            key: optional_var("FAL_KEY"),
            model_id: std::env::var("FAL_MODEL_ID").unwrap_or_else(|_| DEFAULT_MODEL_ID.into()),
            queue_url: std::env::var("FAL_QUEUE_URL").unwrap_or_else(|_| DEFAULT_QUEUE_URL.into()),
            storage_url: std::env::var("FAL_STORAGE_URL")
                .unwrap_or_else(|_| DEFAULT_STORAGE_URL.into()),
        };

        let poll = PollConfig {
            interval: Duration::from_secs(parse_var("POLL_INTERVAL_SECS", "5")),
            max_attempts: parse_var("POLL_MAX_ATTEMPTS", "120"),
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            max_upload_bytes,
            fal,
            public_base_url: optional_var("PUBLIC_BASE_URL"),
            poll,
        }
    }

    /// Whether provider updates arrive by webhook.
    pub fn push_enabled(&self) -> bool {
        self.public_base_url.is_some()
    }

    /// Callback address handed to the provider on submission, in push mode.
    pub fn webhook_url(&self) -> Option<String> {
        self.public_base_url
            .as_deref()
            .map(|base| format!("{}{WEBHOOK_PATH}", base.trim_end_matches('/')))
    }
}

/// Read and parse an env var, falling back to `default`.
///
/// Panics at startup on an unparsable value; misconfiguration should fail fast.
fn parse_var<T>(name: &str, default: &str) -> T
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(name).unwrap_or_else(|_| default.into());
    raw.parse()
        .unwrap_or_else(|e| panic!("{name} must be a valid {}: {e}", std::any::type_name::<T>()))
}

/// Read an env var, treating blank values as unset.
fn optional_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
