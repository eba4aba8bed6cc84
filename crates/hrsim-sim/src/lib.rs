//! # Heart Telemetry Simulator
//!
//! Simulated heart sensor, sampling engine and sample sinks for testing
//! heart-rate and beat-interval pipelines without hardware.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐   read()   ┌────────────────┐  samples  ┌──────────┐
//! │ SimulatedHeart  │◄───────────│ SamplingEngine │──────────►│   Sink   │
//! │ Sensor          │            │  (paced stream)│           │ console  │
//! │  baseline       │            └───────▲────────┘           │ jsonl    │
//! │  + oscillation  │                    │ set_scenario       │ tcp      │
//! │  + noise        │            ┌───────┴────────┐           └──────────┘
//! └─────────────────┘            │ ScenarioPlanner│
//!                                └────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use hrsim_core::ScenarioKind;
//! use hrsim_sim::{SamplingEngine, SimulatedHeartSensor};
//!
//! let rest = Arc::new(ScenarioKind::Rest.scenario());
//! let sensor = SimulatedHeartSensor::new(Some(rest));
//! let mut engine = SamplingEngine::new(sensor, 1.0).unwrap();
//!
//! for sample in engine.stream(Some(Duration::from_secs(10))) {
//!     println!("{}", sample.unwrap());
//! }
//! ```

pub mod clock;
pub mod engine;
pub mod planner;
pub mod sensor;
pub mod simulator;
pub mod sink;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{SampleStream, SamplingEngine, StreamState, StreamStep};
pub use planner::{run_plan, Phase, PhasePlan, PhaseSummary, RandomPlanner, ScenarioPlanner};
pub use sensor::{HeartSensor, SensorError, SensorResult};
pub use simulator::SimulatedHeartSensor;
pub use sink::{build_sink, FanOut, Sink, SinkError, SinkResult};
