//! Scenario planning
//!
//! A planner hands out a sequence of [`Phase`]s (scenario + duration);
//! [`run_plan`] switches the engine to each phase's scenario in turn and
//! streams until the phase is over. The sensor is never reset between
//! phases, so every switch shows up as a gradual ramp.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hrsim_core::{Sample, Scenario, ScenarioKind, StreamStats};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::engine::SamplingEngine;
use crate::sensor::{HeartSensor, SensorResult};

/// Default length of each step in [`PhasePlan::transitions`]
pub const TRANSITION_PHASE: Duration = Duration::from_secs(15);

/// One scheduled stretch of a single scenario
#[derive(Debug, Clone, PartialEq)]
pub struct Phase {
    pub label: String,
    pub scenario: Arc<Scenario>,
    pub duration: Duration,
}

impl Phase {
    pub fn new(label: impl Into<String>, scenario: Arc<Scenario>, duration: Duration) -> Self {
        Self {
            label: label.into(),
            scenario,
            duration,
        }
    }
}

/// Source of phases. Returning `None` ends the plan.
pub trait ScenarioPlanner: Send {
    fn next_phase(&mut self) -> Option<Phase>;
}

/// Fixed, ordered list of phases
#[derive(Debug, Clone, Default)]
pub struct PhasePlan {
    phases: VecDeque<Phase>,
}

impl PhasePlan {
    pub fn new(phases: impl IntoIterator<Item = Phase>) -> Self {
        Self {
            phases: phases.into_iter().collect(),
        }
    }

    /// rest → sleep → rest → exercise → rest, `phase` each
    pub fn transitions(phase: Duration) -> Self {
        let rest = Arc::new(ScenarioKind::Rest.scenario());
        let sleep = Arc::new(ScenarioKind::Sleep.scenario());
        let exercise = Arc::new(ScenarioKind::Exercise.scenario());
        Self::new([
            Phase::new("initial rest", Arc::clone(&rest), phase),
            Phase::new("falling asleep", sleep, phase),
            Phase::new("waking up", Arc::clone(&rest), phase),
            Phase::new("activity onset", exercise, phase),
            Phase::new("cool down", rest, phase),
        ])
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Total scheduled time of the remaining phases
    pub fn total_duration(&self) -> Duration {
        self.phases.iter().map(|p| p.duration).sum()
    }
}

impl ScenarioPlanner for PhasePlan {
    fn next_phase(&mut self) -> Option<Phase> {
        self.phases.pop_front()
    }
}

#[derive(Debug, Clone)]
struct Alternative {
    label: String,
    scenario: Arc<Scenario>,
    min: Duration,
    max: Duration,
}

/// Endless planner that mostly stays on a base scenario.
///
/// Each phase stays on the base with probability `stay_probability` for a
/// uniform 3–5 s; otherwise one alternative is picked uniformly and held for
/// a uniform duration within its own bounds.
pub struct RandomPlanner<R = StdRng> {
    base_label: String,
    base: Arc<Scenario>,
    base_min: Duration,
    base_max: Duration,
    stay_probability: f64,
    alternatives: Vec<Alternative>,
    rng: R,
}

impl RandomPlanner<StdRng> {
    /// rest base with sleep (20–40 s) and exercise (15–30 s) excursions
    pub fn standard(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new("rest", Arc::new(ScenarioKind::Rest.scenario()), rng)
            .with_alternative(
                "sleep",
                Arc::new(ScenarioKind::Sleep.scenario()),
                Duration::from_secs(20),
                Duration::from_secs(40),
            )
            .with_alternative(
                "exercise",
                Arc::new(ScenarioKind::Exercise.scenario()),
                Duration::from_secs(15),
                Duration::from_secs(30),
            )
    }
}

impl<R: Rng + Send> RandomPlanner<R> {
    pub fn new(base_label: impl Into<String>, base: Arc<Scenario>, rng: R) -> Self {
        Self {
            base_label: base_label.into(),
            base,
            base_min: Duration::from_secs(3),
            base_max: Duration::from_secs(5),
            stay_probability: 0.7,
            alternatives: Vec::new(),
            rng,
        }
    }

    /// Add an excursion held for a uniform duration in `[min, max]`
    pub fn with_alternative(
        mut self,
        label: impl Into<String>,
        scenario: Arc<Scenario>,
        min: Duration,
        max: Duration,
    ) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        self.alternatives.push(Alternative {
            label: label.into(),
            scenario,
            min,
            max,
        });
        self
    }

    /// Probability of another base phase, clamped to [0, 1]
    pub fn with_stay_probability(mut self, p: f64) -> Self {
        self.stay_probability = if p.is_nan() { 1.0 } else { p.clamp(0.0, 1.0) };
        self
    }

    fn uniform(&mut self, min: Duration, max: Duration) -> Duration {
        if min == max {
            return min;
        }
        Duration::from_secs_f64(self.rng.gen_range(min.as_secs_f64()..=max.as_secs_f64()))
    }
}

impl<R: Rng + Send> ScenarioPlanner for RandomPlanner<R> {
    fn next_phase(&mut self) -> Option<Phase> {
        if self.alternatives.is_empty() || self.rng.gen_bool(self.stay_probability) {
            let duration = self.uniform(self.base_min, self.base_max);
            return Some(Phase::new(
                self.base_label.clone(),
                Arc::clone(&self.base),
                duration,
            ));
        }

        let pick = self.rng.gen_range(0..self.alternatives.len());
        let Alternative {
            label,
            scenario,
            min,
            max,
        } = self.alternatives[pick].clone();
        let duration = self.uniform(min, max);
        Some(Phase::new(label, scenario, duration))
    }
}

/// What one phase of a plan produced
#[derive(Debug, Clone)]
pub struct PhaseSummary {
    pub label: String,
    pub scenario_name: String,
    pub stats: StreamStats,
}

impl PhaseSummary {
    pub fn samples(&self) -> u64 {
        self.stats.count()
    }

    pub fn rate_mean(&self) -> Option<f64> {
        self.stats.rate_mean()
    }
}

/// Drive `engine` through the planner's phases until the planner runs out
/// or `cancel` is set.
///
/// `on_sample` sees every sample together with the phase it belongs to. A
/// sensor error aborts the plan.
pub fn run_plan<S, P, F>(
    engine: &mut SamplingEngine<S>,
    planner: &mut P,
    cancel: &Arc<AtomicBool>,
    mut on_sample: F,
) -> SensorResult<Vec<PhaseSummary>>
where
    S: HeartSensor,
    P: ScenarioPlanner + ?Sized,
    F: FnMut(&Phase, &Sample),
{
    let mut summaries = Vec::new();

    while !cancel.load(Ordering::SeqCst) {
        let Some(phase) = planner.next_phase() else {
            break;
        };
        info!(
            label = %phase.label,
            scenario = phase.scenario.name(),
            duration_s = phase.duration.as_secs_f64(),
            "Entering phase"
        );
        engine.set_scenario(Arc::clone(&phase.scenario));

        let mut stats = StreamStats::new();
        for sample in engine
            .stream(Some(phase.duration))
            .with_cancel(Arc::clone(cancel))
        {
            let sample = sample?;
            stats.record(&sample);
            on_sample(&phase, &sample);
        }

        summaries.push(PhaseSummary {
            label: phase.label,
            scenario_name: phase.scenario.name().to_string(),
            stats,
        });
    }

    Ok(summaries)
}
