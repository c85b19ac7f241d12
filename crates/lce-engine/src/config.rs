//! # Engine Configuration
//!
//! ```yaml
//! windows:
//!   breach_claim_window_secs: 86400
//!   return_grace_window_secs: 604800
//! telemetry:
//!   filter: "lce_engine=debug,info"
//!   json: true
//! ```
//!
//! Every field is optional; missing fields take their defaults.

use std::path::Path;

use lce_arbitration::DisputeWindows;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::telemetry::TelemetryConfig;

/// Engine-wide settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Dispute protocol windows.
    pub windows: DisputeWindows,
    /// Subscriber settings for [`telemetry::init`](crate::telemetry::init).
    pub telemetry: TelemetryConfig,
}

impl EngineConfig {
    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] if the YAML does not parse. The result
    /// is not validated; see [`EngineConfig::validate`].
    pub fn from_yaml_str(yaml: &str) -> EngineResult<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| EngineError::Config(format!("failed to parse config YAML: {e}")))
    }

    /// Read and parse configuration from a YAML file.
    pub fn load(path: &Path) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Validate the configuration. Returns a list of error messages (empty = valid).
    pub fn validate(&self) -> Vec<String> {
        let mut errors = self.windows.validate();
        errors.extend(self.telemetry.validate());
        errors
    }

    /// Fail with [`EngineError::Config`] listing every problem, if any.
    pub fn ensure_valid(&self) -> EngineResult<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(EngineError::Config(errors.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_yaml_gives_defaults() {
        let cfg = EngineConfig::from_yaml_str("{}").unwrap();
        assert_eq!(cfg, EngineConfig::default());
        assert_eq!(cfg.windows.breach_claim_window_secs, 86_400);
        assert_eq!(cfg.windows.return_grace_window_secs, 604_800);
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn partial_yaml_overrides_only_named_fields() {
        let cfg = EngineConfig::from_yaml_str(
            "windows:\n  breach_claim_window_secs: 60\ntelemetry:\n  json: true\n",
        )
        .unwrap();
        assert_eq!(cfg.windows.breach_claim_window_secs, 60);
        assert_eq!(cfg.windows.return_grace_window_secs, 604_800);
        assert!(cfg.telemetry.json);
        assert_eq!(cfg.telemetry.filter, "info");
    }

    #[test]
    fn zero_grace_window_is_invalid() {
        let cfg = EngineConfig::from_yaml_str("windows:\n  return_grace_window_secs: 0\n").unwrap();
        assert_eq!(cfg.validate().len(), 1);
        let err = cfg.ensure_valid().unwrap_err();
        assert_eq!(err.kind(), lce_core::ErrorKind::Config);
    }

    #[test]
    fn malformed_yaml_is_config_error() {
        let err = EngineConfig::from_yaml_str("windows: [1, 2").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "windows:\n  breach_claim_window_secs: 5").unwrap();
        let cfg = EngineConfig::load(file.path()).unwrap();
        assert_eq!(cfg.windows.breach_claim_window_secs, 5);
    }

    #[test]
    fn load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = EngineConfig::load(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(err.to_string().contains("cannot read"));
    }
}
