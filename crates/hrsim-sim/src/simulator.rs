//! Simulated Heart Sensor
//!
//! This module provides a pure-software heart sensor, producing heart-rate
//! and beat-interval readings that behave plausibly without any hardware.
//!
//! ## Signal Model
//!
//! Each read advances an internal baseline toward the active scenario's
//! target at a bounded slope, then layers two variability terms on top:
//!
//! ```text
//!   Δt = now − last_read
//!   baseline  ← bounded_step(baseline, target_rate, max_rate_change · Δt)
//!   phase     ← phase + 2π · f_osc · Δt
//!   rate      = clamp(baseline + sin(phase) · 0.3σ_r + N(0, 0.4σ_r), 30, 220)
//!   interval  = clamp(60000 / rate + N(0, σ_i), 300, 2000)
//! ```
//!
//! Rate noise and interval noise are drawn independently. Swapping the
//! scenario never touches the baseline, so consecutive readings cannot jump
//! between targets.

use std::f64::consts::TAU;
use std::sync::Arc;
use std::time::Instant;

use hrsim_core::config::SensorConfig;
use hrsim_core::sample::{
    INTERVAL_MAX_MS, INTERVAL_MIN_MS, RATE_MAX, RATE_MIN, TAG_SAMPLING_RATE, TAG_SIMULATED,
};
use hrsim_core::transitions::bounded_step;
use hrsim_core::{Sample, Scenario};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use tracing::{debug, info, trace};

use crate::clock::{Clock, SystemClock};
use crate::sensor::{HeartSensor, SensorError, SensorResult};

/// Baseline rate used when the sensor starts without a scenario
pub const DEFAULT_RATE: f64 = 60.0;

/// Share of the rate variance used as oscillation amplitude
const OSCILLATION_SHARE: f64 = 0.3;
/// Share of the rate variance used as noise standard deviation
const NOISE_SHARE: f64 = 0.4;

/// Software heart sensor.
///
/// Owns its evolving state exclusively; one instance should be driven by a
/// single reader. Randomness comes from the injected `R`, time from the
/// injected [`Clock`].
pub struct SimulatedHeartSensor<R = StdRng> {
    name: String,
    config: SensorConfig,
    scenario: Option<Arc<Scenario>>,
    /// Rate-limited baseline, before oscillation and noise
    current_rate: f64,
    oscillation_phase: f64,
    clock: Arc<dyn Clock>,
    epoch_start: Instant,
    last_read: Instant,
    rng: R,
    sampling_rate_hz: Option<f64>,
}

impl SimulatedHeartSensor<StdRng> {
    /// Sensor with default dynamics and an entropy-seeded RNG
    pub fn new(initial: Option<Arc<Scenario>>) -> Self {
        let rng = StdRng::from_entropy();
        Self::build(initial, SensorConfig::default(), rng)
    }

    /// Sensor with explicit dynamics; seeded from `config.seed` when present.
    pub fn with_config(initial: Option<Arc<Scenario>>, config: SensorConfig) -> SensorResult<Self> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::from_rng(initial, config, rng)
    }
}

impl<R: Rng + Send> SimulatedHeartSensor<R> {
    /// Sensor drawing all randomness from `rng`
    pub fn from_rng(
        initial: Option<Arc<Scenario>>,
        config: SensorConfig,
        rng: R,
    ) -> SensorResult<Self> {
        validate_config(&config)?;
        Ok(Self::build(initial, config, rng))
    }

    fn build(initial: Option<Arc<Scenario>>, config: SensorConfig, mut rng: R) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let now = clock.now();
        let current_rate = initial
            .as_ref()
            .map(|s| s.target_rate())
            .unwrap_or(DEFAULT_RATE);
        let oscillation_phase = rng.gen_range(0.0..TAU);

        Self {
            name: "Simulated Heart Sensor".to_string(),
            config,
            scenario: initial,
            current_rate,
            oscillation_phase,
            clock,
            epoch_start: now,
            last_read: now,
            rng,
            sampling_rate_hz: None,
        }
    }

    /// Replace the time source and re-anchor the epoch on it
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        self.clock = clock;
        self.epoch_start = now;
        self.last_read = now;
        self
    }

    /// Baseline rate before oscillation and noise
    pub fn current_rate(&self) -> f64 {
        self.current_rate
    }

    pub fn oscillation_phase(&self) -> f64 {
        self.oscillation_phase
    }

    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    /// Shared handle to the sensor's clock
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }
}

fn validate_config(config: &SensorConfig) -> SensorResult<()> {
    if !(config.max_rate_change_per_second > 0.0) {
        return Err(SensorError::InvalidConfig(format!(
            "max_rate_change_per_second must be positive, got {}",
            config.max_rate_change_per_second
        )));
    }
    if !(config.oscillation_frequency_hz > 0.0) {
        return Err(SensorError::InvalidConfig(format!(
            "oscillation_frequency_hz must be positive, got {}",
            config.oscillation_frequency_hz
        )));
    }
    Ok(())
}

fn normal(std_dev: f64) -> SensorResult<Normal<f64>> {
    Normal::new(0.0, std_dev).map_err(|e| SensorError::InvalidConfig(e.to_string()))
}

impl<R: Rng + Send> HeartSensor for SimulatedHeartSensor<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self) -> SensorResult<Sample> {
        let scenario = self
            .scenario
            .clone()
            .ok_or(SensorError::NoActiveScenario)?;

        // Build distributions before touching state so a failure leaves it intact
        let rate_noise = normal(scenario.rate_variance() * NOISE_SHARE)?;
        let interval_noise = normal(scenario.interval_variance_ms())?;

        let now = self.clock.now();
        let elapsed = now.saturating_duration_since(self.epoch_start).as_secs_f64();
        let dt = now.saturating_duration_since(self.last_read).as_secs_f64();
        self.last_read = now;

        let max_change = self.config.max_rate_change_per_second * dt;
        self.current_rate = bounded_step(self.current_rate, scenario.target_rate(), max_change);

        self.oscillation_phase =
            (self.oscillation_phase + TAU * self.config.oscillation_frequency_hz * dt) % TAU;
        let oscillation =
            self.oscillation_phase.sin() * (scenario.rate_variance() * OSCILLATION_SHARE);
        let noise = rate_noise.sample(&mut self.rng);

        let rate = (self.current_rate + oscillation + noise).clamp(RATE_MIN, RATE_MAX);

        let nominal_interval = 60_000.0 / rate;
        let interval = (nominal_interval + interval_noise.sample(&mut self.rng))
            .clamp(INTERVAL_MIN_MS, INTERVAL_MAX_MS);

        trace!(
            dt,
            baseline = self.current_rate,
            oscillation,
            noise,
            "Sensor state advanced"
        );

        let mut sample =
            Sample::new(elapsed, rate, interval, scenario.name()).with_tag(TAG_SIMULATED, true);
        if let Some(hz) = self.sampling_rate_hz {
            sample = sample.with_tag(TAG_SAMPLING_RATE, hz);
        }

        debug!(
            scenario = scenario.name(),
            timestamp = elapsed,
            rate,
            interval_ms = interval,
            "Simulated reading"
        );

        Ok(sample)
    }

    fn set_scenario(&mut self, scenario: Arc<Scenario>) {
        info!(
            from = self.scenario.as_ref().map(|s| s.name()).unwrap_or("<none>"),
            to = scenario.name(),
            baseline = self.current_rate,
            "Scenario changed"
        );
        self.scenario = Some(scenario);
    }

    fn reset(&mut self) {
        let now = self.clock.now();
        self.epoch_start = now;
        self.last_read = now;
        if let Some(ref scenario) = self.scenario {
            self.current_rate = scenario.target_rate();
        }
        self.oscillation_phase = self.rng.gen_range(0.0..TAU);
        info!(baseline = self.current_rate, "Sensor reset");
    }

    fn current_scenario(&self) -> Option<Arc<Scenario>> {
        self.scenario.clone()
    }

    fn set_sampling_rate_hint(&mut self, hz: f64) {
        self.sampling_rate_hz = Some(hz);
    }
}

/// Convenience function to create a deterministic simulator for testing
pub fn create_test_sensor(scenario: Scenario, seed: u64) -> SimulatedHeartSensor {
    let config = SensorConfig {
        seed: Some(seed),
        ..Default::default()
    };
    let rng = StdRng::seed_from_u64(seed);
    SimulatedHeartSensor::build(Some(Arc::new(scenario)), config, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use approx::assert_relative_eq;
    use hrsim_core::ScenarioKind;
    use std::time::Duration;

    fn flat(name: &str, rate: f64) -> Arc<Scenario> {
        Arc::new(Scenario::new(name, rate, 0.0, 60_000.0 / rate, 0.0).unwrap())
    }

    fn manual_sensor(initial: Option<Arc<Scenario>>, seed: u64) -> (SimulatedHeartSensor, ManualClock) {
        let clock = ManualClock::new();
        let sensor = SimulatedHeartSensor::from_rng(
            initial,
            SensorConfig::default(),
            StdRng::seed_from_u64(seed),
        )
        .unwrap()
        .with_clock(Arc::new(clock.clone()));
        (sensor, clock)
    }

    #[test]
    fn test_sensor_creation() {
        let sensor = SimulatedHeartSensor::new(None);
        assert_eq!(sensor.name(), "Simulated Heart Sensor");
        assert_eq!(sensor.current_rate(), DEFAULT_RATE);
        assert!(sensor.current_scenario().is_none());
        assert!((0.0..TAU).contains(&sensor.oscillation_phase()));

        let sleep = Arc::new(ScenarioKind::Sleep.scenario());
        let sensor = SimulatedHeartSensor::new(Some(sleep));
        assert_eq!(sensor.current_rate(), 52.0);
        assert_eq!(sensor.current_scenario().unwrap().name(), "sleep");
    }

    #[test]
    fn test_read_without_scenario_fails() {
        let mut sensor = SimulatedHeartSensor::new(None);
        assert_eq!(sensor.read(), Err(SensorError::NoActiveScenario));
        assert_eq!(sensor.current_rate(), DEFAULT_RATE);

        sensor.set_scenario(Arc::new(ScenarioKind::Rest.scenario()));
        assert!(sensor.read().is_ok());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SensorConfig {
            max_rate_change_per_second: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            SimulatedHeartSensor::with_config(None, config),
            Err(SensorError::InvalidConfig(_))
        ));

        let config = SensorConfig {
            oscillation_frequency_hz: -0.1,
            ..Default::default()
        };
        assert!(SimulatedHeartSensor::with_config(None, config).is_err());
    }

    #[test]
    fn test_zero_variance_is_exact() {
        let (mut sensor, clock) = manual_sensor(Some(flat("flat", 60.0)), 1);
        clock.advance_secs(1.0);
        let sample = sensor.read().unwrap();
        assert_eq!(sample.rate, 60.0);
        assert_eq!(sample.interval_ms, 1000.0);
        assert_eq!(sample.scenario_name, "flat");
        assert!(sample.is_simulated());
    }

    #[test]
    fn test_timestamp_tracks_clock() {
        let (mut sensor, clock) = manual_sensor(Some(flat("flat", 70.0)), 2);
        assert_eq!(sensor.read().unwrap().timestamp, 0.0);

        clock.advance(Duration::from_millis(2500));
        assert_relative_eq!(sensor.read().unwrap().timestamp, 2.5);

        clock.advance(Duration::from_millis(100));
        assert_relative_eq!(sensor.read().unwrap().timestamp, 2.6, epsilon = 1e-12);
    }

    #[test]
    fn test_scenario_switch_is_rate_limited() {
        let (mut sensor, clock) = manual_sensor(Some(flat("low", 60.0)), 3);
        clock.advance_secs(1.0);
        let before = sensor.read().unwrap();
        assert_eq!(before.rate, 60.0);

        sensor.set_scenario(flat("high", 120.0));
        // set_scenario alone keeps the baseline
        assert_eq!(sensor.current_rate(), 60.0);

        clock.advance_secs(0.5);
        let after = sensor.read().unwrap();
        assert_relative_eq!(after.rate, 62.0);
        assert!((after.rate - before.rate).abs() <= 4.0 * 0.5 + 1e-9);
        assert_eq!(after.scenario_name, "high");

        // Converges after enough time: 58 bpm left at 4 bpm/s
        for _ in 0..15 {
            clock.advance_secs(1.0);
            sensor.read().unwrap();
        }
        assert_eq!(sensor.current_rate(), 120.0);
    }

    #[test]
    fn test_set_scenario_keeps_phase() {
        let (mut sensor, _clock) = manual_sensor(Some(flat("a", 60.0)), 4);
        let phase = sensor.oscillation_phase();
        sensor.set_scenario(flat("b", 90.0));
        assert_eq!(sensor.oscillation_phase(), phase);
        assert_eq!(sensor.current_rate(), 60.0);
    }

    #[test]
    fn test_reset_starts_fresh_epoch() {
        let (mut sensor, clock) = manual_sensor(Some(flat("low", 60.0)), 5);
        sensor.set_scenario(flat("high", 150.0));
        clock.advance_secs(10.0);
        sensor.read().unwrap();
        assert_relative_eq!(sensor.current_rate(), 100.0);

        sensor.reset();
        assert_eq!(sensor.current_rate(), 150.0);
        assert_eq!(sensor.current_scenario().unwrap().name(), "high");

        clock.advance(Duration::from_millis(200));
        let sample = sensor.read().unwrap();
        assert!(sample.timestamp < 1.0);
        assert_eq!(sample.rate, 150.0);
    }

    #[test]
    fn test_reset_without_scenario_keeps_baseline() {
        let (mut sensor, _clock) = manual_sensor(None, 6);
        sensor.reset();
        assert_eq!(sensor.current_rate(), DEFAULT_RATE);
    }

    #[test]
    fn test_outputs_always_clamped() {
        let extremes = [
            Scenario::new("max", 215.0, 60.0, 280.0, 900.0).unwrap(),
            Scenario::new("min", 32.0, 60.0, 1900.0, 900.0).unwrap(),
            ScenarioKind::Exercise.scenario(),
        ];
        let (mut sensor, clock) = manual_sensor(None, 7);
        for scenario in extremes {
            sensor.set_scenario(Arc::new(scenario));
            for _ in 0..300 {
                clock.advance(Duration::from_millis(100));
                let s = sensor.read().unwrap();
                assert!(s.in_bounds(), "out of bounds: {}", s);
            }
        }
    }

    #[test]
    fn test_seeded_sensors_agree() {
        let rest = Arc::new(ScenarioKind::Rest.scenario());
        let (mut a, clock_a) = manual_sensor(Some(Arc::clone(&rest)), 42);
        let (mut b, clock_b) = manual_sensor(Some(rest), 42);
        for _ in 0..20 {
            clock_a.advance_secs(0.25);
            clock_b.advance_secs(0.25);
            assert_eq!(a.read().unwrap(), b.read().unwrap());
        }
    }

    #[test]
    fn test_oscillation_without_noise() {
        // Oscillation amplitude is 3 bpm and noise σ is 4 bpm; 6σ is a loose bound.
        // Zero interval variance leaves the interval at exactly 60000 / rate.
        let scenario = Arc::new(Scenario::new("osc", 80.0, 10.0, 750.0, 0.0).unwrap());
        let (mut sensor, clock) = manual_sensor(Some(scenario), 8);
        for _ in 0..100 {
            clock.advance_secs(0.5);
            let s = sensor.read().unwrap();
            assert!((s.rate - 80.0).abs() <= 3.0 + 6.0 * 4.0);
            assert_relative_eq!(s.interval_ms, 60_000.0 / s.rate, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_sampling_rate_tag() {
        let (mut sensor, _clock) = manual_sensor(Some(flat("flat", 60.0)), 9);
        assert!(sensor.read().unwrap().tag(TAG_SAMPLING_RATE).is_none());
        sensor.set_sampling_rate_hint(10.0);
        assert_eq!(
            sensor.read().unwrap().tag(TAG_SAMPLING_RATE),
            Some(&hrsim_core::TagValue::Number(10.0))
        );
    }

    #[test]
    fn test_create_test_sensor() {
        let mut sensor = create_test_sensor(ScenarioKind::Rest.scenario(), 1);
        let s = sensor.read().unwrap();
        assert_eq!(s.scenario_name, "rest");
        assert!(s.in_bounds());
    }
}
