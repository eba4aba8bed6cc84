//! # Stream Statistics
//!
//! Running summary of a sample stream, updated one sample at a time so a
//! long or unbounded stream never has to be buffered.
//!
//! ```rust
//! use hrsim_core::sample::Sample;
//! use hrsim_core::stats::StreamStats;
//!
//! let mut stats = StreamStats::new();
//! stats.record(&Sample::new(0.0, 60.0, 1000.0, "rest"));
//! stats.record(&Sample::new(1.0, 64.0, 940.0, "rest"));
//!
//! assert_eq!(stats.count(), 2);
//! assert_eq!(stats.rate_mean(), Some(62.0));
//! assert_eq!(stats.duration(), 1.0);
//! ```

use crate::sample::Sample;
use crate::scenario::Scenario;
use std::fmt::Write as _;

/// Online statistics over rate and interval values.
#[derive(Debug, Clone, Default)]
pub struct StreamStats {
    count: u64,
    rate_mean: f64,
    rate_min: f64,
    rate_max: f64,
    interval_mean: f64,
    /// Sum of squared deviations from the interval mean (Welford)
    interval_m2: f64,
    first_timestamp: f64,
    last_timestamp: f64,
}

impl StreamStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one sample into the summary.
    pub fn record(&mut self, sample: &Sample) {
        self.count += 1;
        let n = self.count as f64;

        if self.count == 1 {
            self.rate_min = sample.rate;
            self.rate_max = sample.rate;
            self.first_timestamp = sample.timestamp;
        } else {
            self.rate_min = self.rate_min.min(sample.rate);
            self.rate_max = self.rate_max.max(sample.rate);
        }
        self.last_timestamp = sample.timestamp;

        self.rate_mean += (sample.rate - self.rate_mean) / n;

        let delta = sample.interval_ms - self.interval_mean;
        self.interval_mean += delta / n;
        self.interval_m2 += delta * (sample.interval_ms - self.interval_mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn rate_mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.rate_mean)
    }

    pub fn rate_min(&self) -> Option<f64> {
        (self.count > 0).then_some(self.rate_min)
    }

    pub fn rate_max(&self) -> Option<f64> {
        (self.count > 0).then_some(self.rate_max)
    }

    pub fn interval_mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.interval_mean)
    }

    /// Population standard deviation of the interval
    pub fn interval_std(&self) -> Option<f64> {
        (self.count > 0).then(|| (self.interval_m2 / self.count as f64).sqrt())
    }

    /// Seconds between the first and last recorded sample
    pub fn duration(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.last_timestamp - self.first_timestamp
        }
    }

    /// Multi-line summary against the scenario targets.
    pub fn report(&self, scenario: &Scenario) -> String {
        let rule = "=".repeat(60);
        let mut out = String::new();
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "SIMULATION STATISTICS");
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "Scenario: {}", scenario.name());
        let _ = writeln!(out, "Samples collected: {}", self.count);
        let _ = writeln!(out, "Covered duration: {:.2} s", self.duration());

        if let (Some(mean), Some(min), Some(max)) = (self.rate_mean(), self.rate_min(), self.rate_max()) {
            let _ = writeln!(out);
            let _ = writeln!(out, "Heart rate (bpm):");
            let _ = writeln!(out, "  Mean:    {:.1}", mean);
            let _ = writeln!(out, "  Minimum: {:.1}", min);
            let _ = writeln!(out, "  Maximum: {:.1}", max);
            let _ = writeln!(
                out,
                "  Target:  {:.1} ±{:.1}",
                scenario.target_rate(),
                scenario.rate_variance()
            );
        }

        if let (Some(mean), Some(std)) = (self.interval_mean(), self.interval_std()) {
            let _ = writeln!(out);
            let _ = writeln!(out, "Beat interval (ms):");
            let _ = writeln!(out, "  Mean:    {:.0}", mean);
            let _ = writeln!(out, "  Std dev: {:.0}", std);
            let _ = writeln!(
                out,
                "  Target:  {:.0} ±{:.0}",
                scenario.target_interval_ms(),
                scenario.interval_variance_ms()
            );
        }

        let _ = write!(out, "{}", rule);
        out
    }
}
