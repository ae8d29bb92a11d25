//! Command-line entry point: run agents through a level file and report.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use wayfarer_core::AgentProfile;
use wayfarer_sim::{LevelSpec, Simulation};

/// Run synthetic players through a level.
#[derive(Debug, Parser)]
#[command(name = "wayfarer-sim", version, about)]
struct Args {
    /// Level file (TOML).
    level: PathBuf,

    /// Number of agents to spawn.
    #[arg(short, long, default_value_t = 1)]
    agents: usize,

    /// Override the level's drive sampling seed.
    #[arg(short, long)]
    seed: Option<u64>,

    /// Built-in profile to sample drives from
    /// (explorer, achiever, speedrunner, cautious, brawler).
    #[arg(short, long)]
    profile: Option<String>,

    /// Override the level's duration in seconds.
    #[arg(short, long)]
    duration: Option<f32>,

    /// Print the run summary as JSON instead of a table.
    #[arg(long)]
    json: bool,

    /// Write each agent's final memory snapshot into this directory.
    #[arg(long, value_name = "DIR")]
    snapshot: Option<PathBuf>,

    /// Print the first agent's explored grid.
    #[arg(long)]
    grid: bool,

    /// Emit logs as JSON lines.
    #[arg(long, env = "WAYFARER_LOG_JSON")]
    log_json: bool,
}

fn setup_logging(json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.log_json);

    let mut spec = LevelSpec::from_file(&args.level)
        .with_context(|| format!("loading level {}", args.level.display()))?;
    if let Some(seed) = args.seed {
        spec.seed = seed;
    }
    if let Some(duration) = args.duration {
        spec.duration = duration.max(0.0);
    }
    let profile = args
        .profile
        .as_deref()
        .map(AgentProfile::preset)
        .transpose()
        .context("selecting profile")?;

    let mut sim = Simulation::new(&spec, args.agents.max(1), profile.as_ref())?;
    let summary = sim.run();

    if let Some(dir) = &args.snapshot {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        for (i, agent) in sim.agents().enumerate() {
            let path = dir.join(format!("agent-{i}.json"));
            std::fs::write(&path, agent.memory_snapshot().to_json()?)
                .with_context(|| format!("writing {}", path.display()))?;
            tracing::info!(path = %path.display(), "Memory snapshot written");
        }
    }

    if args.json {
        println!("{}", summary.to_json()?);
    } else {
        println!(
            "{}: {} agent(s), {:.1}s simulated, {} finished",
            summary.level,
            summary.agents.len(),
            summary.elapsed,
            summary.finished()
        );
        for (i, agent) in summary.agents.iter().enumerate() {
            let finish = agent
                .finished_at
                .map_or_else(|| "-".to_string(), |t| format!("{t:.1}s"));
            println!(
                "  #{i} finish={finish:>7} walked={:>6.1} visits={:>2} detours={} explored={:>4} health={:.0}",
                agent.distance,
                agent.visits.len(),
                agent.detours,
                agent.explored_cells,
                agent.health,
            );
        }
    }

    if args.grid
        && let Some(agent) = sim.agents().next()
    {
        println!("{}", agent.grid().render_ascii());
    }

    Ok(())
}
