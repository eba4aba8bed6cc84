//! Cardiac Scenarios
//!
//! A [`Scenario`] is the declarative target the simulated sensor converges
//! toward: a heart rate and beat-to-beat interval, each with a variance.
//! Scenarios are validated on construction and immutable afterwards; the
//! sensor and engine share them as `Arc<Scenario>`.
//!
//! ## Presets
//!
//! | Name       | Rate (bpm) | Interval (ms) |
//! |------------|------------|---------------|
//! | `rest`     | 60 ± 5     | 1000 ± 100    |
//! | `sleep`    | 52 ± 4     | 1150 ± 150    |
//! | `exercise` | 120 ± 10   | 500 ± 50      |
//!
//! ## Example
//!
//! ```rust
//! use hrsim_core::scenario::{Scenario, ScenarioKind};
//!
//! let rest = ScenarioKind::Rest.scenario();
//! assert_eq!(rest.name(), "rest");
//!
//! let effort = Scenario::custom_exercise(150.0).unwrap();
//! assert_eq!(effort.name(), "exercise_150");
//! assert_eq!(effort.target_interval_ms(), 400.0);
//!
//! assert!(Scenario::new("bad", 0.0, 5.0, 1000.0, 100.0).is_err());
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Result type for scenario operations
pub type ScenarioResult<T> = Result<T, ScenarioError>;

/// Errors raised while building or resolving scenarios
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScenarioError {
    #[error("Invalid scenario field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),
}

/// Target physiological state for the simulated sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawScenario")]
pub struct Scenario {
    name: String,
    target_rate: f64,
    rate_variance: f64,
    target_interval_ms: f64,
    interval_variance_ms: f64,
    #[serde(skip_serializing_if = "String::is_empty")]
    description: String,
}

/// Unvalidated scenario fields, as read from a config file.
#[derive(Debug, Clone, Deserialize)]
struct RawScenario {
    name: String,
    target_rate: f64,
    rate_variance: f64,
    target_interval_ms: f64,
    interval_variance_ms: f64,
    #[serde(default)]
    description: String,
}

impl TryFrom<RawScenario> for Scenario {
    type Error = ScenarioError;

    fn try_from(raw: RawScenario) -> ScenarioResult<Self> {
        Ok(Scenario::new(
            raw.name,
            raw.target_rate,
            raw.rate_variance,
            raw.target_interval_ms,
            raw.interval_variance_ms,
        )?
        .with_description(raw.description))
    }
}

fn require_positive(field: &'static str, value: f64) -> ScenarioResult<()> {
    // `!(x > 0)` also catches NaN
    if !(value > 0.0) || !value.is_finite() {
        return Err(ScenarioError::InvalidField {
            field,
            reason: format!("must be positive, got {}", value),
        });
    }
    Ok(())
}

fn require_non_negative(field: &'static str, value: f64) -> ScenarioResult<()> {
    if !(value >= 0.0) || !value.is_finite() {
        return Err(ScenarioError::InvalidField {
            field,
            reason: format!("must be zero or positive, got {}", value),
        });
    }
    Ok(())
}

impl Scenario {
    /// Build a validated scenario.
    ///
    /// Targets must be positive and variances zero or positive; nothing is
    /// clamped.
    pub fn new(
        name: impl Into<String>,
        target_rate: f64,
        rate_variance: f64,
        target_interval_ms: f64,
        interval_variance_ms: f64,
    ) -> ScenarioResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ScenarioError::InvalidField {
                field: "name",
                reason: "must not be empty".to_string(),
            });
        }
        require_positive("target_rate", target_rate)?;
        require_non_negative("rate_variance", rate_variance)?;
        require_positive("target_interval_ms", target_interval_ms)?;
        require_non_negative("interval_variance_ms", interval_variance_ms)?;

        Ok(Self {
            name,
            target_rate,
            rate_variance,
            target_interval_ms,
            interval_variance_ms,
            description: String::new(),
        })
    }

    /// Attach a free-text description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Exercise scenario centred on `intensity` bpm.
    ///
    /// The interval target follows the rate (60000 / bpm) and both variances
    /// scale with intensity, with floors of 5 bpm and 30 ms.
    pub fn custom_exercise(intensity: f64) -> ScenarioResult<Self> {
        require_positive("intensity", intensity)?;
        let target_interval_ms = 60_000.0 / intensity;
        let rate_variance = (intensity * 0.08).max(5.0);
        let interval_variance_ms = (target_interval_ms * 0.1).max(30.0);

        Ok(Self::new(
            format!("exercise_{}", intensity as i64),
            intensity,
            rate_variance,
            target_interval_ms,
            interval_variance_ms,
        )?
        .with_description(format!("Custom exercise at {} bpm", intensity)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target_rate(&self) -> f64 {
        self.target_rate
    }

    pub fn rate_variance(&self) -> f64 {
        self.rate_variance
    }

    pub fn target_interval_ms(&self) -> f64 {
        self.target_interval_ms
    }

    pub fn interval_variance_ms(&self) -> f64 {
        self.interval_variance_ms
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: rate={}±{}, interval={}±{}ms",
            self.name,
            self.target_rate,
            self.rate_variance,
            self.target_interval_ms,
            self.interval_variance_ms
        )
    }
}

/// Built-in scenario presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioKind {
    /// Awake and calm
    Rest,
    /// Deep sleep
    Sleep,
    /// Moderate to intense physical effort
    Exercise,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 3] = [Self::Rest, Self::Sleep, Self::Exercise];

    /// Preset name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Rest => "rest",
            Self::Sleep => "sleep",
            Self::Exercise => "exercise",
        }
    }

    /// Build the preset scenario
    pub fn scenario(&self) -> Scenario {
        // Preset values are known-valid
        let (rate, rate_var, interval, interval_var, description) = match self {
            Self::Rest => (60.0, 5.0, 1000.0, 100.0, "Resting, calm and awake"),
            Self::Sleep => (52.0, 4.0, 1150.0, 150.0, "Deep sleep"),
            Self::Exercise => (120.0, 10.0, 500.0, 50.0, "Moderate to intense effort"),
        };
        Scenario {
            name: self.name().to_string(),
            target_rate: rate,
            rate_variance: rate_var,
            target_interval_ms: interval,
            interval_variance_ms: interval_var,
            description: description.to_string(),
        }
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScenarioKind {
    type Err = ScenarioError;

    fn from_str(s: &str) -> ScenarioResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rest" => Ok(Self::Rest),
            "sleep" => Ok(Self::Sleep),
            "exercise" => Ok(Self::Exercise),
            _ => Err(ScenarioError::UnknownScenario(s.to_string())),
        }
    }
}

/// Name → scenario lookup over the presets plus any custom scenarios.
#[derive(Debug, Clone, Default)]
pub struct ScenarioCatalog {
    custom: BTreeMap<String, Arc<Scenario>>,
}

impl ScenarioCatalog {
    /// Catalog with presets only
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with additional scenarios; custom names shadow presets.
    pub fn with_custom<I>(scenarios: I) -> Self
    where
        I: IntoIterator<Item = Scenario>,
    {
        let custom = scenarios
            .into_iter()
            .map(|s| (s.name().to_string(), Arc::new(s)))
            .collect();
        Self { custom }
    }

    /// Resolve a scenario by name.
    ///
    /// `intensity` replaces the `exercise` preset with
    /// [`Scenario::custom_exercise`]; it is ignored for other names.
    pub fn resolve(&self, name: &str, intensity: Option<f64>) -> ScenarioResult<Arc<Scenario>> {
        if let Some(found) = self.custom.get(name) {
            return Ok(Arc::clone(found));
        }

        let kind: ScenarioKind = name.parse()?;
        match (kind, intensity) {
            (ScenarioKind::Exercise, Some(bpm)) => Ok(Arc::new(Scenario::custom_exercise(bpm)?)),
            _ => Ok(Arc::new(kind.scenario())),
        }
    }

    /// All resolvable names, presets first
    pub fn names(&self) -> Vec<String> {
        ScenarioKind::ALL
            .iter()
            .map(|k| k.name().to_string())
            .chain(self.custom.keys().cloned())
            .collect()
    }
}
