//! # Configuration System
//!
//! YAML-based configuration for hrsim: sensor dynamics, engine pacing, the
//! sample sink, logging, and extra named scenarios.
//!
//! ## Configuration Search Path
//!
//! Configuration is loaded from the first file found:
//! 1. Path specified via `HRSIM_CONFIG` environment variable
//! 2. `./hrsim.yaml` (current directory)
//! 3. `~/.config/hrsim/config.yaml` (user config)
//! 4. `/etc/hrsim/config.yaml` (system config)
//!
//! `HRSIM_SINK_ADDR`, when set, overrides `sink.address`.
//!
//! ## Example Configuration
//!
//! ```yaml
//! sensor:
//!   max_rate_change_per_second: 3.0
//!   seed: 7
//!
//! engine:
//!   sampling_rate_hz: 2.0
//!   duration_s: 60
//!
//! sink:
//!   kind: tcp
//!   address: "kafka1:29092"
//!   topic: "heart-rate-data"
//!
//! scenarios:
//!   - name: tempo
//!     target_rate: 150
//!     rate_variance: 8
//!     target_interval_ms: 400
//!     interval_variance_ms: 40
//! ```

use crate::logging::LogConfig;
use crate::scenario::{Scenario, ScenarioCatalog};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "HRSIM_CONFIG";
/// Environment variable overriding the sink address
pub const SINK_ADDR_ENV: &str = "HRSIM_SINK_ADDR";

/// Error type for configuration operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("config not found: {0}")]
    NotFound(String),

    #[error("failed to read config: {0}")]
    Read(String),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Validation(String),
}

/// Simulated sensor dynamics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Largest change of the baseline rate per second of wall time (bpm/s)
    pub max_rate_change_per_second: f64,
    /// Frequency of the slow oscillation layered on the baseline (Hz)
    pub oscillation_frequency_hz: f64,
    /// Fixed RNG seed; entropy-seeded when absent
    pub seed: Option<u64>,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            max_rate_change_per_second: 4.0,
            oscillation_frequency_hz: 0.1, // one slow cycle per ~10 s
            seed: None,
        }
    }
}

/// Sampling engine pacing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub sampling_rate_hz: f64,
    /// Stream length; `None` streams until interrupted
    pub duration_s: Option<f64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sampling_rate_hz: 1.0,
            duration_s: Some(30.0),
        }
    }
}

/// Where samples go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Human-readable lines on stdout
    #[default]
    Console,
    /// One JSON object per line (file or stdout)
    Jsonl,
    /// Newline-delimited JSON to a broker-style TCP endpoint
    Tcp,
    /// Discard
    None,
}

/// Fields carried by serialized samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    /// timestamp, rate, interval only
    #[default]
    Minimal,
    /// Every sample field, tags included
    Full,
}

/// Sink configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    pub kind: SinkKind,
    /// host:port of the broker endpoint (tcp)
    pub address: String,
    /// Topic name placed in each envelope (tcp)
    pub topic: String,
    /// Output file (jsonl); stdout when absent
    pub path: Option<PathBuf>,
    pub payload: PayloadFormat,
    /// Reconnect-and-resend attempts per sample (tcp)
    pub retries: u32,
    /// Connect/write timeout in milliseconds (tcp)
    pub timeout_ms: u64,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            kind: SinkKind::Console,
            address: "localhost:9092".to_string(),
            topic: "fake-heart-data-test".to_string(),
            path: None,
            payload: PayloadFormat::Minimal,
            retries: 3,
            timeout_ms: 10_000,
        }
    }
}

/// Top-level hrsim configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HrsimConfig {
    pub sensor: SensorConfig,
    pub engine: EngineConfig,
    pub sink: SinkConfig,
    pub logging: LogConfig,
    /// Additional scenarios, resolvable by name
    pub scenarios: Vec<Scenario>,
}

impl HrsimConfig {
    /// Load configuration from the default search path.
    ///
    /// Returns defaults if no file is found. The sink address environment
    /// override is applied either way. The result is not validated; callers
    /// layer their own overrides first and then call [`HrsimConfig::validate`].
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::locate()?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn locate() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if !path.exists() {
                return Err(ConfigError::NotFound(format!(
                    "{} points at {}",
                    CONFIG_ENV,
                    path.display()
                )));
            }
            return Self::load_from(&path);
        }

        for path in Self::config_search_paths() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(format!("{}: {}", path.display(), e)))?;

        Self::parse(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply `HRSIM_SINK_ADDR`.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var(SINK_ADDR_ENV) {
            self.apply_sink_address(Some(addr));
        }
    }

    fn apply_sink_address(&mut self, addr: Option<String>) {
        if let Some(addr) = addr.filter(|a| !a.trim().is_empty()) {
            self.sink.address = addr;
        }
    }

    /// Get configuration search paths.
    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./hrsim.yaml")];

        if let Some(dirs) = directories::ProjectDirs::from("", "", "hrsim") {
            paths.push(dirs.config_dir().join("config.yaml"));
        }

        paths.push(PathBuf::from("/etc/hrsim/config.yaml"));
        paths
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.engine.sampling_rate_hz > 0.0) {
            return Err(ConfigError::Validation(format!(
                "engine.sampling_rate_hz must be positive, got {}",
                self.engine.sampling_rate_hz
            )));
        }

        if let Some(d) = self.engine.duration_s {
            if !(d > 0.0) {
                return Err(ConfigError::Validation(format!(
                    "engine.duration_s must be positive, got {}",
                    d
                )));
            }
        }

        if !(self.sensor.max_rate_change_per_second > 0.0) {
            return Err(ConfigError::Validation(
                "sensor.max_rate_change_per_second must be positive".to_string(),
            ));
        }

        if !(self.sensor.oscillation_frequency_hz > 0.0) {
            return Err(ConfigError::Validation(
                "sensor.oscillation_frequency_hz must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Scenario lookup including this config's custom scenarios
    pub fn catalog(&self) -> ScenarioCatalog {
        ScenarioCatalog::with_custom(self.scenarios.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogLevel;

    #[test]
    fn test_default_config() {
        let config = HrsimConfig::default();
        assert_eq!(config.sensor.max_rate_change_per_second, 4.0);
        assert_eq!(config.sensor.oscillation_frequency_hz, 0.1);
        assert_eq!(config.engine.sampling_rate_hz, 1.0);
        assert_eq!(config.engine.duration_s, Some(30.0));
        assert_eq!(config.sink.kind, SinkKind::Console);
        assert_eq!(config.sink.address, "localhost:9092");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
sensor:
  max_rate_change_per_second: 2.5
  seed: 11

engine:
  sampling_rate_hz: 4.0
  duration_s: ~

sink:
  kind: tcp
  address: "kafka1:29092"
  payload: full

logging:
  level: debug

scenarios:
  - name: tempo
    target_rate: 150
    rate_variance: 8
    target_interval_ms: 400
    interval_variance_ms: 40
"#;
        let config = HrsimConfig::parse(yaml).unwrap();
        assert_eq!(config.sensor.max_rate_change_per_second, 2.5);
        assert_eq!(config.sensor.oscillation_frequency_hz, 0.1);
        assert_eq!(config.sensor.seed, Some(11));
        assert_eq!(config.engine.sampling_rate_hz, 4.0);
        assert_eq!(config.engine.duration_s, None);
        assert_eq!(config.sink.kind, SinkKind::Tcp);
        assert_eq!(config.sink.payload, PayloadFormat::Full);
        assert_eq!(config.sink.topic, "fake-heart-data-test");
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.scenarios.len(), 1);

        let catalog = config.catalog();
        assert_eq!(catalog.resolve("tempo", None).unwrap().target_rate(), 150.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_scenario_fails_parse() {
        let yaml = r#"
scenarios:
  - name: broken
    target_rate: 0
    rate_variance: 8
    target_interval_ms: 400
    interval_variance_ms: 40
"#;
        assert!(matches!(HrsimConfig::parse(yaml), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validation() {
        let mut config = HrsimConfig::default();
        config.engine.sampling_rate_hz = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let mut config = HrsimConfig::default();
        config.engine.duration_s = Some(-1.0);
        assert!(config.validate().is_err());

        let mut config = HrsimConfig::default();
        config.sensor.max_rate_change_per_second = 0.0;
        assert!(config.validate().is_err());

        let mut config = HrsimConfig::default();
        config.sensor.oscillation_frequency_hz = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sink_address_override() {
        let mut config = HrsimConfig::default();
        config.apply_sink_address(None);
        assert_eq!(config.sink.address, "localhost:9092");

        config.apply_sink_address(Some("  ".to_string()));
        assert_eq!(config.sink.address, "localhost:9092");

        config.apply_sink_address(Some("broker:9093".to_string()));
        assert_eq!(config.sink.address, "broker:9093");
    }

    #[test]
    fn test_yaml_roundtrip() {
        let mut config = HrsimConfig::default();
        config.sink.kind = SinkKind::Jsonl;
        config.sink.path = Some(PathBuf::from("/tmp/hr.jsonl"));
        let yaml = config.to_yaml().unwrap();
        let parsed = HrsimConfig::parse(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_load_defers_validation() {
        let path = std::env::temp_dir().join(format!("hrsim-load-{}.yaml", std::process::id()));
        std::fs::write(&path, "engine:\n  duration_s: 0\n").unwrap();
        std::env::set_var(CONFIG_ENV, &path);
        let loaded = HrsimConfig::load();
        std::env::remove_var(CONFIG_ENV);
        std::fs::remove_file(&path).unwrap();

        let mut config = loaded.unwrap();
        assert_eq!(config.engine.duration_s, Some(0.0));
        assert!(config.validate().is_err());

        // An unbounded run no longer trips over the file's duration
        config.engine.duration_s = None;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_missing_file() {
        let result = HrsimConfig::load_from(Path::new("/nonexistent/hrsim.yaml"));
        assert!(matches!(result, Err(ConfigError::Read(_))));
    }
}
