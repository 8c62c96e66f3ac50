#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless simulation of the Barnstack pacing engine.
//!
//! Runs the spawn director and the pressure governor against a synthetic
//! player and prints every decision as one JSON line, followed by a summary.

mod config;
mod host;

use std::{
    io::{self, BufWriter, Write},
    path::PathBuf,
};

use anyhow::{ensure, Context, Result};
use barnstack_core::{LinearRail, SeededRandom};
use barnstack_system_pressure_governor::PressureGovernor;
use barnstack_system_spawn_director::SpawnDirector;
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::{
    config::SimulationConfig,
    host::{Profile, Summary, SyntheticHost},
};

const HOST_SEED_SALT: u64 = 0x9e37_79b9_7f4a_7c15;
const PRESSURE_SEED_SALT: u64 = 0x2545_f491_4f6c_dd1d;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Seed shared by every random stream of the run
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Simulated duration in milliseconds
    #[arg(long, default_value_t = 120_000.0)]
    duration_ms: f32,
    /// Tick length in milliseconds
    #[arg(long, default_value_t = 1_000.0 / 60.0)]
    dt_ms: f32,
    /// TOML file overriding tuning, creatures and power-ups
    #[arg(long)]
    config: Option<PathBuf>,
    /// Simulated player
    #[arg(long, value_enum, default_value = "steady")]
    profile: Profile,
}

#[derive(Serialize)]
struct SummaryLine<'a> {
    event: &'static str,
    seed: u64,
    profile: Profile,
    #[serde(flatten)]
    summary: &'a Summary,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    ensure!(cli.dt_ms > 0.0, "--dt-ms must be positive, got {}", cli.dt_ms);
    ensure!(
        cli.duration_ms >= 0.0,
        "--duration-ms must not be negative, got {}",
        cli.duration_ms
    );

    let config = match &cli.config {
        Some(path) => SimulationConfig::from_path(path)?,
        None => SimulationConfig::default(),
    };
    tracing::info!(
        seed = cli.seed,
        profile = ?cli.profile,
        creatures = config.creatures.spawnable_count(),
        "starting simulation"
    );

    let mut director = SpawnDirector::new(
        config.spawn.clone(),
        config.creatures.clone(),
        config.power_ups.clone(),
        LinearRail::across_viewport(config.viewport_width, config.rail_margin),
    )
    .context("invalid spawn director configuration")?;
    let mut governor = PressureGovernor::new(config.pressure.clone());
    let mut pacing_rng = SeededRandom::from_seed(cli.seed);
    let mut pressure_rng = SeededRandom::from_seed(cli.seed ^ PRESSURE_SEED_SALT);
    let mut host_rng = SeededRandom::from_seed(cli.seed ^ HOST_SEED_SALT);
    let mut host = SyntheticHost::new(cli.profile, config);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut elapsed_ms = 0.0;
    while elapsed_ms < cli.duration_ms && !host.is_game_over() {
        let records = host.tick(
            cli.dt_ms,
            &mut director,
            &mut governor,
            &mut pacing_rng,
            &mut pressure_rng,
            &mut host_rng,
        );
        for record in &records {
            serde_json::to_writer(&mut out, record).context("failed to encode record")?;
            writeln!(out).context("failed to write record")?;
        }
        elapsed_ms += cli.dt_ms;
    }

    let summary = host.finish(&director, &governor);
    tracing::info!(
        spawns = summary.spawns,
        topples = summary.topples,
        game_over = summary.game_over,
        "simulation finished"
    );
    serde_json::to_writer(
        &mut out,
        &SummaryLine {
            event: "summary",
            seed: cli.seed,
            profile: cli.profile,
            summary: &summary,
        },
    )
    .context("failed to encode summary")?;
    writeln!(out).context("failed to write summary")?;
    out.flush().context("failed to flush output")?;
    Ok(())
}
