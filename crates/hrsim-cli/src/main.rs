//! hrsim: simulated heart-rate and beat-interval telemetry
//!
//! ```text
//! hrsim --scenario rest --duration 30
//! hrsim --scenario exercise --intensity 140 --duration 60
//! hrsim --scenario sleep --rate 2.0 --sink jsonl --output sleep.jsonl
//! hrsim --plan random --sink tcp
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use hrsim_core::config::SinkKind;
use hrsim_core::logging::{init_logging, LogConfig, LogLevel};
use hrsim_core::{HrsimConfig, Sample, Scenario, StreamStats};
use hrsim_sim::planner::TRANSITION_PHASE;
use hrsim_sim::{
    build_sink, run_plan, PhasePlan, RandomPlanner, SamplingEngine, ScenarioPlanner,
    SimulatedHeartSensor, Sink,
};
use tokio::signal;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "hrsim", version, about = "Simulated heart-rate and beat-interval telemetry")]
struct Cli {
    /// Scenario to simulate: rest, sleep, exercise or a name from the config file
    #[arg(short, long, default_value = "rest")]
    scenario: String,

    /// Stream length in seconds (phase length with --plan transitions)
    #[arg(short, long)]
    duration: Option<f64>,

    /// Stream until interrupted
    #[arg(long, conflicts_with = "duration")]
    continuous: bool,

    /// Sampling rate in Hz
    #[arg(short, long)]
    rate: Option<f64>,

    /// Target bpm for the exercise scenario
    #[arg(short, long)]
    intensity: Option<f64>,

    /// Only print the final statistics
    #[arg(short, long)]
    quiet: bool,

    /// Print statistics at the end
    #[arg(long)]
    stats: bool,

    /// Run a multi-phase plan instead of a single scenario
    #[arg(long, value_enum)]
    plan: Option<PlanArg>,

    /// Where samples go
    #[arg(long, value_enum)]
    sink: Option<SinkArg>,

    /// Output file for the jsonl sink
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Fixed RNG seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// trace, debug, info, warn or error
    #[arg(long)]
    log_level: Option<LogLevel>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PlanArg {
    /// rest → sleep → rest → exercise → rest
    Transitions,
    /// Mostly rest with random sleep and exercise excursions, until interrupted
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SinkArg {
    Console,
    Jsonl,
    Tcp,
    None,
}

impl From<SinkArg> for SinkKind {
    fn from(arg: SinkArg) -> Self {
        match arg {
            SinkArg::Console => SinkKind::Console,
            SinkArg::Jsonl => SinkKind::Jsonl,
            SinkArg::Tcp => SinkKind::Tcp,
            SinkArg::None => SinkKind::None,
        }
    }
}

impl Cli {
    /// Fold command-line overrides into the loaded configuration
    fn apply(&self, config: &mut HrsimConfig) {
        if let Some(rate) = self.rate {
            config.engine.sampling_rate_hz = rate;
        }
        if self.continuous {
            config.engine.duration_s = None;
        } else if let Some(duration) = self.duration {
            config.engine.duration_s = Some(duration);
        }
        if let Some(seed) = self.seed {
            config.sensor.seed = Some(seed);
        }

        if let Some(ref path) = self.output {
            config.sink.path = Some(path.clone());
            config.sink.kind = SinkKind::Jsonl;
        }
        if let Some(kind) = self.sink {
            config.sink.kind = kind.into();
        }
        if self.quiet && config.sink.kind == SinkKind::Console {
            config.sink.kind = SinkKind::None;
        }

        match self.log_level {
            Some(level) => config.logging.level = level,
            None if self.quiet => {
                config.logging = LogConfig {
                    filter: config.logging.filter.clone(),
                    ..LogConfig::quiet()
                }
            }
            None => {}
        }
    }
}

enum Mode {
    Single(Option<Duration>),
    Plan(Box<dyn ScenarioPlanner>),
}

fn secs(value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value).with_context(|| format!("invalid duration {}", value))
}

fn load_config(cli: &Cli) -> Result<HrsimConfig> {
    let mut config = match cli.config {
        Some(ref path) => {
            let mut config = HrsimConfig::load_from(path)?;
            config.apply_env_overrides();
            config
        }
        None => HrsimConfig::load()?,
    };
    cli.apply(&mut config);
    config.validate()?;
    Ok(config)
}

fn print_banner(scenario: &Scenario, config: &HrsimConfig) {
    let rule = "=".repeat(60);
    println!("{}", rule);
    println!("HEART TELEMETRY SIMULATOR");
    println!("{}", rule);
    println!("Scenario: {}", scenario);
    match config.engine.duration_s {
        Some(d) => println!("Duration: {} s", d),
        None => println!("Duration: until Ctrl+C"),
    }
    println!("Rate: {} Hz", config.engine.sampling_rate_hz);
    println!("{}", rule);
    println!();
}

fn deliver(sink: &mut dyn Sink, stats: &mut StreamStats, sample: &Sample) {
    stats.record(sample);
    if let Err(e) = sink.send(sample) {
        warn!(sink = sink.name(), error = %e, "Sample not delivered");
    }
}

/// Blocking part: pull samples until done or cancelled
fn simulate(
    mut engine: SamplingEngine<SimulatedHeartSensor>,
    sink: &mut dyn Sink,
    mode: Mode,
    cancel: Arc<AtomicBool>,
    verbose: bool,
) -> Result<StreamStats> {
    let mut stats = StreamStats::new();

    match mode {
        Mode::Single(duration) => {
            for sample in engine.stream(duration).with_cancel(cancel) {
                deliver(sink, &mut stats, &sample?);
            }
        }
        Mode::Plan(mut planner) => {
            let summaries = run_plan(&mut engine, planner.as_mut(), &cancel, |_, sample| {
                deliver(sink, &mut stats, sample)
            })?;
            if verbose {
                for summary in &summaries {
                    eprintln!(
                        "Phase '{}' ({}): {} samples, mean rate {}",
                        summary.label,
                        summary.scenario_name,
                        summary.samples(),
                        summary
                            .rate_mean()
                            .map_or_else(|| "-".to_string(), |m| format!("{:.1}", m)),
                    );
                }
            }
        }
    }

    Ok(stats)
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    init_logging(&config.logging);

    let scenario = config
        .catalog()
        .resolve(&cli.scenario, cli.intensity)
        .with_context(|| format!("cannot select scenario '{}'", cli.scenario))?;

    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, stopping");
            flag.store(true, Ordering::SeqCst);
        }
    });

    let sensor = SimulatedHeartSensor::with_config(Some(Arc::clone(&scenario)), config.sensor.clone())?;
    let engine = SamplingEngine::new(sensor, config.engine.sampling_rate_hz)?;
    let mut sink = build_sink(&config.sink)
        .with_context(|| format!("cannot open {:?} sink", config.sink.kind))?;

    let mode = match cli.plan {
        None => Mode::Single(config.engine.duration_s.map(secs).transpose()?),
        Some(PlanArg::Transitions) => {
            let phase = match cli.duration {
                Some(d) => secs(d)?,
                None => TRANSITION_PHASE,
            };
            Mode::Plan(Box::new(PhasePlan::transitions(phase)))
        }
        Some(PlanArg::Random) => {
            let seed = config.sensor.seed.map(|s| s.wrapping_add(1));
            Mode::Plan(Box::new(RandomPlanner::standard(seed)))
        }
    };

    let console = config.sink.kind == SinkKind::Console;
    if console {
        print_banner(&scenario, &config);
    }

    info!(
        scenario = scenario.name(),
        hz = config.engine.sampling_rate_hz,
        sink = sink.name(),
        "Simulation starting"
    );

    let task_cancel = Arc::clone(&cancel);
    let verbose = !cli.quiet;
    let (stats, sink) = tokio::task::spawn_blocking(move || {
        let stats = simulate(engine, sink.as_mut(), mode, task_cancel, verbose);
        (stats, sink)
    })
    .await
    .context("simulation task panicked")?;
    let mut sink = sink;
    let stats = stats?;

    if let Err(e) = sink.close() {
        warn!(error = %e, "Closing sink failed");
    }
    info!(samples = stats.count(), delivered = sink.sent(), "Simulation finished");

    if cancel.load(Ordering::SeqCst) {
        eprintln!("\nInterrupted by user (Ctrl+C)");
    }

    if (cli.stats || cli.quiet) && !stats.is_empty() {
        println!();
        println!("{}", stats.report(&scenario));
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
