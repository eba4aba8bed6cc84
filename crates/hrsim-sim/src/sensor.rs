//! Heart Sensor Abstraction
//!
//! This module defines the common interface for all heart sensors. The
//! simulator in [`crate::simulator`] is the only implementation shipped
//! here; a hardware-backed sensor would implement the same trait.

use hrsim_core::{Sample, Scenario};
use std::sync::Arc;

/// Result type for sensor operations
pub type SensorResult<T> = Result<T, SensorError>;

/// Errors that can occur while configuring or reading a sensor
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SensorError {
    #[error("No active scenario; call set_scenario() first")]
    NoActiveScenario,

    #[error("Sampling rate must be positive with a nonzero interval, got {0} Hz")]
    InvalidSamplingRate(f64),

    #[error("Configuration error: {0}")]
    InvalidConfig(String),
}

/// Common interface for heart sensors
pub trait HeartSensor: Send {
    /// Sensor name/description
    fn name(&self) -> &str;

    /// Take one reading.
    ///
    /// Fails with [`SensorError::NoActiveScenario`] when nothing has been
    /// configured yet.
    fn read(&mut self) -> SensorResult<Sample>;

    /// Swap the active scenario. Internal state is kept so the output moves
    /// toward the new target gradually.
    fn set_scenario(&mut self, scenario: Arc<Scenario>);

    /// Restart the sensor timeline, keeping the scenario
    fn reset(&mut self);

    /// Currently active scenario, if any
    fn current_scenario(&self) -> Option<Arc<Scenario>>;

    /// Tell the sensor how often it will be read. Informational only.
    fn set_sampling_rate_hint(&mut self, _hz: f64) {}
}

impl<S: HeartSensor + ?Sized> HeartSensor for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn read(&mut self) -> SensorResult<Sample> {
        (**self).read()
    }

    fn set_scenario(&mut self, scenario: Arc<Scenario>) {
        (**self).set_scenario(scenario)
    }

    fn reset(&mut self) {
        (**self).reset()
    }

    fn current_scenario(&self) -> Option<Arc<Scenario>> {
        (**self).current_scenario()
    }

    fn set_sampling_rate_hint(&mut self, hz: f64) {
        (**self).set_sampling_rate_hint(hz)
    }
}
