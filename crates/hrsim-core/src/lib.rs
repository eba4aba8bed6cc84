//! # Heart Telemetry Simulation Core
//!
//! Building blocks shared by the hrsim crates: the declarative
//! [`Scenario`] a simulated sensor converges toward, the [`Sample`] it
//! emits, the transition math that keeps changes physiologically gradual,
//! and the ambient pieces (configuration, logging, statistics).
//!
//! ## Signal Model
//!
//! ```text
//! Scenario (target) ──► bounded_step ──► baseline rate
//!                                           │
//!                          + slow oscillation (sin, ~0.1 Hz)
//!                          + fast gaussian noise
//!                                           │
//!                          clamp [30, 220] ─┴─► rate ──► 60000 / rate
//!                                                          + gaussian noise
//!                                                          clamp [300, 2000] ─► interval
//! ```
//!
//! ## Example
//!
//! ```rust
//! use hrsim_core::{Scenario, ScenarioKind, transitions::bounded_step};
//!
//! let rest = ScenarioKind::Rest.scenario();
//! let effort = Scenario::custom_exercise(140.0).unwrap();
//!
//! // Baseline may move at most 4 bpm per second
//! let next = bounded_step(rest.target_rate(), effort.target_rate(), 4.0);
//! assert_eq!(next, 64.0);
//! ```

pub mod config;
pub mod logging;
pub mod sample;
pub mod scenario;
pub mod stats;
pub mod transitions;

pub use config::{ConfigError, HrsimConfig};
pub use sample::{Sample, TagValue};
pub use scenario::{Scenario, ScenarioCatalog, ScenarioError, ScenarioKind, ScenarioResult};
pub use stats::StreamStats;
