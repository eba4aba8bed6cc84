//! Emitted Readings
//!
//! One [`Sample`] per sensor read: elapsed time, heart rate, beat-to-beat
//! interval, the label of the scenario that produced it, and free-form tags.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Lowest heart rate a sample may carry (bpm)
pub const RATE_MIN: f64 = 30.0;
/// Highest heart rate a sample may carry (bpm)
pub const RATE_MAX: f64 = 220.0;
/// Shortest beat-to-beat interval (ms)
pub const INTERVAL_MIN_MS: f64 = 300.0;
/// Longest beat-to-beat interval (ms)
pub const INTERVAL_MAX_MS: f64 = 2000.0;

/// Tag key set on every reading from a simulated sensor
pub const TAG_SIMULATED: &str = "simulated";
/// Tag key carrying the engine sampling rate, when known
pub const TAG_SAMPLING_RATE: &str = "sampling_rate_hz";

/// Annotation value attached to a sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl From<bool> for TagValue {
    fn from(v: bool) -> Self {
        Self::Flag(v)
    }
}

impl From<f64> for TagValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for TagValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for TagValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// A single heart reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Seconds since the producing sensor's epoch
    pub timestamp: f64,
    /// Instantaneous heart rate (bpm)
    pub rate: f64,
    /// Beat-to-beat interval (ms)
    pub interval_ms: f64,
    /// Scenario active when the reading was taken
    pub scenario_name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, TagValue>,
}

/// Wire payload without scenario metadata.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinimalSample {
    pub timestamp: f64,
    pub rate: f64,
    pub interval_ms: f64,
}

impl Sample {
    pub fn new(timestamp: f64, rate: f64, interval_ms: f64, scenario_name: impl Into<String>) -> Self {
        Self {
            timestamp,
            rate,
            interval_ms,
            scenario_name: scenario_name.into(),
            tags: BTreeMap::new(),
        }
    }

    /// Add a tag (builder style)
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<TagValue>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn tag(&self, key: &str) -> Option<&TagValue> {
        self.tags.get(key)
    }

    /// True if the reading is flagged as coming from a simulator
    pub fn is_simulated(&self) -> bool {
        matches!(self.tags.get(TAG_SIMULATED), Some(TagValue::Flag(true)))
    }

    /// Raw sensor view: timestamp, rate and interval only
    pub fn minimal(&self) -> MinimalSample {
        MinimalSample {
            timestamp: self.timestamp,
            rate: self.rate,
            interval_ms: self.interval_ms,
        }
    }

    /// Both values inside the physiological bounds
    pub fn in_bounds(&self) -> bool {
        (RATE_MIN..=RATE_MAX).contains(&self.rate)
            && (INTERVAL_MIN_MS..=INTERVAL_MAX_MS).contains(&self.interval_ms)
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] rate: {:.1} | interval: {:.0}ms | t: {:.2}s",
            self.scenario_name, self.rate, self.interval_ms, self.timestamp
        )
    }
}
