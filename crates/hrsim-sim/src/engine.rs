//! Sampling engine: paced reads from a heart sensor
//!
//! Wraps a [`HeartSensor`] and reads it at a fixed rate. Streams are lazy
//! and pull-driven; each [`SampleStream::step`] performs one transition of
//!
//! ```text
//!   Idle ──► Reading ──► Waiting ──► Reading ──► ... ──► Done
//!              │  (duration elapsed, cancelled, or read error)  ▲
//!              └────────────────────────────────────────────────┘
//! ```
//!
//! The iterator adapter sleeps on the engine clock for every `Wait` step.

use std::iter::FusedIterator;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use hrsim_core::{Sample, Scenario};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::sensor::{HeartSensor, SensorError, SensorResult};

/// Longest single sleep while a cancel flag is being watched
const CANCEL_POLL: Duration = Duration::from_millis(50);

/// Reads a sensor at a configurable rate
pub struct SamplingEngine<S> {
    sensor: S,
    sampling_rate_hz: f64,
    interval: Duration,
    clock: Arc<dyn Clock>,
}

fn interval_for(hz: f64) -> SensorResult<Duration> {
    if !(hz > 0.0) || !hz.is_finite() {
        return Err(SensorError::InvalidSamplingRate(hz));
    }
    match Duration::try_from_secs_f64(1.0 / hz) {
        Ok(interval) if !interval.is_zero() => Ok(interval),
        _ => Err(SensorError::InvalidSamplingRate(hz)),
    }
}

impl<S: HeartSensor> SamplingEngine<S> {
    /// Create an engine reading `sensor` at `sampling_rate_hz`
    pub fn new(mut sensor: S, sampling_rate_hz: f64) -> SensorResult<Self> {
        let interval = interval_for(sampling_rate_hz)?;
        sensor.set_sampling_rate_hint(sampling_rate_hz);
        Ok(Self {
            sensor,
            sampling_rate_hz,
            interval,
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the clock used for pacing and duration checks
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// One reading, no pacing
    pub fn sample(&mut self) -> SensorResult<Sample> {
        self.sensor.read()
    }

    /// Lazy stream of readings, bounded by `duration` when given.
    ///
    /// Elapsed time is measured from the first step of the stream.
    pub fn stream(&mut self, duration: Option<Duration>) -> SampleStream<'_, S> {
        SampleStream {
            engine: self,
            duration,
            started: None,
            state: StreamState::Idle,
            on_sample: None,
            cancel: None,
            emitted: 0,
        }
    }

    pub fn set_scenario(&mut self, scenario: Arc<Scenario>) {
        self.sensor.set_scenario(scenario);
    }

    pub fn reset(&mut self) {
        self.sensor.reset();
    }

    pub fn current_scenario(&self) -> Option<Arc<Scenario>> {
        self.sensor.current_scenario()
    }

    /// Change the pacing. Rejects non-positive and non-finite rates and
    /// leaves the previous rate in place.
    pub fn set_sampling_rate(&mut self, hz: f64) -> SensorResult<()> {
        let interval = interval_for(hz)?;
        self.sampling_rate_hz = hz;
        self.interval = interval;
        self.sensor.set_sampling_rate_hint(hz);
        debug!(hz, interval_ms = interval.as_millis() as u64, "Sampling rate changed");
        Ok(())
    }

    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate_hz
    }

    /// Wait between consecutive reads
    pub fn sampling_interval(&self) -> Duration {
        self.interval
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }
}

/// Lifecycle of a [`SampleStream`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Created, nothing read yet
    Idle,
    /// A read is due on the next step
    Reading,
    /// A sample was just produced; the next step is a wait
    Waiting,
    /// Finished; every further step is `Done`
    Done,
}

/// Outcome of one [`SampleStream::step`]
#[derive(Debug, Clone, PartialEq)]
pub enum StreamStep {
    /// Caller should wait this long before the next step
    Wait(Duration),
    Sample(Sample),
    Done,
}

type SampleCallback<'a> = Box<dyn FnMut(&Sample) + 'a>;

/// Lazy, finite or unbounded sequence of readings from an engine.
///
/// Holds the engine mutably for its lifetime; use [`SampleStream::engine_mut`]
/// to switch scenarios or rates while streaming.
pub struct SampleStream<'a, S> {
    engine: &'a mut SamplingEngine<S>,
    duration: Option<Duration>,
    started: Option<Instant>,
    state: StreamState,
    on_sample: Option<SampleCallback<'a>>,
    cancel: Option<Arc<AtomicBool>>,
    emitted: u64,
}

impl<'a, S: HeartSensor> SampleStream<'a, S> {
    /// Invoke `callback` on every sample before it is yielded
    pub fn on_sample(mut self, callback: impl FnMut(&Sample) + 'a) -> Self {
        self.on_sample = Some(Box::new(callback));
        self
    }

    /// Stop at the next step once `flag` is set
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Samples produced so far
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    pub fn engine(&self) -> &SamplingEngine<S> {
        self.engine
    }

    pub fn engine_mut(&mut self) -> &mut SamplingEngine<S> {
        self.engine
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    fn finish(&mut self, reason: &str) {
        if self.state != StreamState::Done {
            self.state = StreamState::Done;
            info!(samples = self.emitted, reason, "Stream finished");
        }
    }

    /// Advance the stream by one transition without blocking.
    ///
    /// A read error ends the stream: it is returned once and every later
    /// step reports `Done`.
    pub fn step(&mut self) -> SensorResult<StreamStep> {
        match self.state {
            StreamState::Done => Ok(StreamStep::Done),
            StreamState::Waiting => {
                self.state = StreamState::Reading;
                Ok(StreamStep::Wait(self.engine.interval))
            }
            StreamState::Idle | StreamState::Reading => {
                let now = self.engine.clock.now();
                let started = match self.started {
                    Some(started) => started,
                    None => {
                        info!(
                            hz = self.engine.sampling_rate_hz,
                            duration_s = self.duration.map(|d| d.as_secs_f64()),
                            "Stream started"
                        );
                        self.started = Some(now);
                        now
                    }
                };

                if self.is_cancelled() {
                    self.finish("cancelled");
                    return Ok(StreamStep::Done);
                }
                if let Some(limit) = self.duration {
                    if now.saturating_duration_since(started) >= limit {
                        self.finish("duration elapsed");
                        return Ok(StreamStep::Done);
                    }
                }

                self.state = StreamState::Reading;
                match self.engine.sensor.read() {
                    Ok(sample) => {
                        self.emitted += 1;
                        if let Some(callback) = self.on_sample.as_mut() {
                            callback(&sample);
                        }
                        self.state = StreamState::Waiting;
                        Ok(StreamStep::Sample(sample))
                    }
                    Err(e) => {
                        warn!(error = %e, "Sensor read failed");
                        self.finish("read error");
                        Err(e)
                    }
                }
            }
        }
    }

    fn wait(&self, duration: Duration) {
        let clock = &self.engine.clock;
        if self.cancel.is_none() {
            clock.sleep(duration);
            return;
        }

        let deadline = clock.now() + duration;
        loop {
            let now = clock.now();
            if now >= deadline || self.is_cancelled() {
                break;
            }
            clock.sleep((deadline - now).min(CANCEL_POLL));
        }
    }
}

impl<S: HeartSensor> Iterator for SampleStream<'_, S> {
    type Item = SensorResult<Sample>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.step() {
                Ok(StreamStep::Wait(duration)) => self.wait(duration),
                Ok(StreamStep::Sample(sample)) => return Some(Ok(sample)),
                Ok(StreamStep::Done) => return None,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

impl<S: HeartSensor> FusedIterator for SampleStream<'_, S> {}
