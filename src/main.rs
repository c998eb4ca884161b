//! Flappy Neuro entry point
//!
//! Headless runner: evaluates one session per generation with a population of
//! controllers and reports per-generation statistics.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use rand::SeedableRng;
use rand_pcg::Pcg32;

use flappy_neuro::controller::{Controller, Hover, Idle, Perceptron};
use flappy_neuro::frame::{FrameSink, JsonLinesSink, LogSink};
use flappy_neuro::sim::{Pacing, Session, TickInput};
use flappy_neuro::{GenerationStats, StatsLog, WorldConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Policy {
    /// Never jump
    Idle,
    /// Scripted: stay near the middle of the gap
    Hover,
    /// Random single-layer networks, resampled every generation
    Perceptron,
}

#[derive(Debug, Parser)]
#[command(name = "flappy-neuro", about = "Run obstacle-course sessions with a controller population")]
struct Cli {
    /// World config (JSON); defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Policy::Perceptron)]
    policy: Policy,

    /// Controllers per generation
    #[arg(long, default_value_t = 50)]
    population: usize,

    /// Number of generations (sessions) to run
    #[arg(long, default_value_t = 50)]
    generations: u32,

    /// Base seed for obstacles and controller weights
    #[arg(long)]
    seed: Option<u64>,

    /// Hold the configured tick rate instead of running flat out
    #[arg(long)]
    realtime: bool,

    /// Write every frame as JSON lines to this file
    #[arg(long)]
    trace: Option<PathBuf>,

    /// Quit each session after this many ticks
    #[arg(long)]
    max_ticks: Option<u64>,
}

fn population(policy: Policy, size: usize, rng: &mut Pcg32) -> Vec<Box<dyn Controller>> {
    (0..size)
        .map(|_| -> Box<dyn Controller> {
            match policy {
                Policy::Idle => Box::new(Idle),
                Policy::Hover => Box::new(Hover::default()),
                Policy::Perceptron => Box::new(Perceptron::random(rng)),
            }
        })
        .collect()
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => WorldConfig::load(path)?,
        None => WorldConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    let base_seed = config.seed;

    let mut stats = StatsLog::new();

    let mut sink: Box<dyn FrameSink> = match &cli.trace {
        Some(path) => Box::new(JsonLinesSink::new(BufWriter::new(File::create(path)?))),
        None => Box::new(LogSink),
    };
    let pacing = if cli.realtime {
        Pacing::Realtime
    } else {
        Pacing::Unpaced
    };

    let mut rng = Pcg32::seed_from_u64(base_seed);
    for generation in 1..=cli.generations {
        let controllers = population(cli.policy, cli.population, &mut rng);
        let world = config.clone().with_seed(base_seed.wrapping_add(generation as u64));
        let mut session = Session::new(world, controllers, generation)?;

        let max_ticks = cli.max_ticks;
        let report = session.run(
            sink.as_mut(),
            |s| TickInput {
                quit: max_ticks.is_some_and(|max| s.time_ticks >= max),
            },
            pacing,
        );

        if let Some(rank) = stats.record(GenerationStats::from_report(&report)) {
            log::info!("Generation {generation} ranked #{rank}");
        }
        if report.score >= config.score_cap {
            log::info!("Score cap reached in generation {generation}, stopping");
            break;
        }
    }

    if let Some(best) = stats.best() {
        println!(
            "Best generation: {} (score {}, best fitness {:.1})",
            best.generation, best.score, best.best_fitness
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Flappy Neuro starting...");

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
