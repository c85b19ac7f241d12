//! # Telemetry
//!
//! Installs a global `tracing` subscriber. Safe to call more than once; only
//! the first call takes effect.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Subscriber settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    pub filter: String,
    /// Emit JSON lines instead of human-readable text.
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

impl TelemetryConfig {
    /// Validate the settings. Returns a list of error messages (empty = valid).
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if let Err(e) = EnvFilter::try_new(&self.filter) {
            errors.push(format!("telemetry.filter {:?} is not a valid filter: {e}", self.filter));
        }
        errors
    }
}

/// Install the global subscriber. Returns `false` if one was already set.
pub fn init(config: &TelemetryConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.is_ok()
}
