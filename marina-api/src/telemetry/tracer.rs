//! Tracing Subscriber Initialization
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` (`RUST_LOG`)
//! and either a JSON or a human-readable formatter.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{ApiError, ApiResult};

const DEFAULT_FILTER: &str = "marina_api=debug,tower_http=info,info";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line.
    Json,
    /// Multi-line, human-readable output for local development.
    Pretty,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "pretty" | "text" => Some(Self::Pretty),
            _ => None,
        }
    }
}

/// Telemetry configuration from environment variables.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// `MARINA_LOG_FORMAT`: json (default) or pretty
    pub log_format: LogFormat,
    /// `MARINA_SERVICE_NAME`
    pub service_name: String,
    /// `MARINA_ENVIRONMENT`
    pub environment: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Json,
            service_name: "marina-api".to_string(),
            environment: "development".to_string(),
        }
    }
}

impl TelemetryConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            log_format: std::env::var("MARINA_LOG_FORMAT")
                .ok()
                .and_then(|s| LogFormat::parse(&s))
                .unwrap_or(defaults.log_format),
            service_name: std::env::var("MARINA_SERVICE_NAME")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.service_name),
            environment: std::env::var("MARINA_ENVIRONMENT")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.environment),
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// Call once at startup, before anything logs.
pub fn init_tracing(config: &TelemetryConfig) -> ApiResult<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let registry = tracing_subscriber::registry().with(env_filter);

    let result = match config.log_format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
    };
    result.map_err(|e| ApiError::internal_error(format!("Failed to init subscriber: {}", e)))?;

    tracing::info!(
        service_name = %config.service_name,
        environment = %config.environment,
        log_format = ?config.log_format,
        "Telemetry initialized"
    );

    Ok(())
}
