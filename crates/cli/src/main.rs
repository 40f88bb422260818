//! Colony CLI - drives the workforce scheduler against a simulated world.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colony_core::{ColonyId, RoleKind};
use colony_execution::{
    Colony, IntentBuffer, Orchestrator, OrchestratorConfig, Overseer, PlanOutcome, Verdict,
};
use colony_sim::{census, ScenarioBuilder, SimWorld};
use colony_storage::{ColonyRecord, JsonStorage, Storage};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Document key the simulated world is saved under.
const WORLD_DOCUMENT: &str = "world";

#[derive(Parser)]
#[command(name = "colony")]
#[command(about = "Colony workforce scheduler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run scheduling cycles against the simulated world
    Run {
        /// Number of cycles to run
        #[arg(long, default_value = "1")]
        cycles: u64,
        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Data directory
        #[arg(long, default_value = ".colony")]
        data: PathBuf,
        /// Continue from the saved world and agent memories
        #[arg(long)]
        resume: bool,
        /// Rooms to claim when starting fresh
        #[arg(long = "room", default_value = "W1N1")]
        rooms: Vec<String>,
        /// Construction sites per room when starting fresh
        #[arg(long, default_value = "3")]
        sites: u32,
        /// Hostiles per room when starting fresh
        #[arg(long, default_value = "0")]
        hostiles: u32,
    },
    /// Show persisted colonies
    Status {
        /// Data directory
        #[arg(long, default_value = ".colony")]
        data: PathBuf,
    },
    /// Print the effective configuration
    Config {
        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { cycles, config, data, resume, rooms, sites, hostiles } => {
            let config = load_config(config.as_deref())?;
            let mut storage = JsonStorage::new(&data).await?;

            let saved = if resume { load_world(&storage).await? } else { None };
            let mut world = match saved {
                Some(world) => {
                    info!("Resuming at t={}", world.time());
                    world
                }
                None => {
                    let mut rooms = rooms.into_iter();
                    let first = rooms.next().unwrap_or_else(|| "W1N1".to_string());
                    rooms
                        .fold(ScenarioBuilder::new(first), |builder, room| builder.with_room(room))
                        .with_sites(sites)
                        .with_hostiles(hostiles)
                        .build()
                }
            };

            let mut overseer = Overseer::new(Orchestrator::new(config));
            if resume {
                for id in storage.list_colonies().await? {
                    if let Some(record) = storage.load_colony(&id).await? {
                        info!("Restoring {} with {} agents", record.colony, record.agents.len());
                        overseer.insert(Colony::restore(record.colony, record.agents));
                    }
                }
            }
            let owned: Vec<_> = world
                .state()
                .rooms
                .values()
                .filter(|room| room.controller.as_ref().is_some_and(|c| c.owned))
                .map(|room| ColonyId::for_room(&room.name))
                .collect();
            for id in owned {
                overseer.establish(id);
            }

            for _ in 0..cycles {
                step(&mut overseer, &mut world);
            }

            for (colony, agents) in overseer.memories() {
                storage.save_colony(&ColonyRecord { colony, agents }).await?;
            }
            storage
                .save_document(WORLD_DOCUMENT, &serde_json::to_value(&world)?)
                .await?;
            info!("Completed {} cycles, now at t={}", cycles, world.time());

            print_population(&overseer, &world);
        }
        Commands::Status { data } => {
            let storage = JsonStorage::new(&data).await?;
            let colonies = storage.list_colonies().await?;

            println!("Colony Status");
            if let Some(world) = load_world(&storage).await? {
                println!("  Time: {}", world.time());
            }
            if colonies.is_empty() {
                println!("  No colonies saved in {}", data.display());
            }
            for id in colonies {
                let Some(record) = storage.load_colony(&id).await? else {
                    continue;
                };
                let meta = storage.colony_meta(&id).await?;

                println!("  {} ({} agents)", record.colony, record.agents.len());
                if let Some(meta) = meta {
                    println!("    Version: {} saved {}", meta.version, meta.saved_at);
                }
                let mut by_role: BTreeMap<RoleKind, usize> = BTreeMap::new();
                let mut holding = 0;
                for agent in &record.agents {
                    *by_role.entry(agent.role).or_default() += 1;
                    holding += usize::from(agent.task.is_some());
                }
                for (role, count) in by_role {
                    println!("    {}: {}", role, count);
                }
                println!("    Holding tasks: {}", holding);
            }
        }
        Commands::Config { config } => {
            let config = load_config(config.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

/// One global time step: every colony decides, then the world acts.
fn step(overseer: &mut Overseer, world: &mut SimWorld) {
    let snapshot = world.snapshot();
    let mut buf = IntentBuffer::new(&snapshot);

    let tick = overseer.run_tick(&snapshot, &mut buf);
    for report in &tick.reports {
        if let Some(PlanOutcome::Evaluated(decisions)) = &report.plan {
            for decision in decisions {
                if let Verdict::Waiting { role, cost, available } = &decision.verdict {
                    debug!("{}: {} waits for {} energy ({} on hand)", report.colony, role, cost, available);
                }
            }
        }
    }
    for (colony, e) in &tick.failures {
        warn!("{} skipped at t={}: {}", colony, snapshot.time, e);
    }

    let applied = world.step(buf.intents());
    debug!("t={}: {} intents applied, {} skipped", snapshot.time, applied.applied, applied.skipped);
}

fn load_config(path: Option<&Path>) -> Result<OrchestratorConfig> {
    match path {
        Some(path) => OrchestratorConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(OrchestratorConfig::default()),
    }
}

async fn load_world(storage: &JsonStorage) -> Result<Option<SimWorld>> {
    let Some(value) = storage.load_document(WORLD_DOCUMENT).await? else {
        return Ok(None);
    };
    let world = serde_json::from_value(value).context("saved world is unreadable")?;
    Ok(Some(world))
}

fn print_population(overseer: &Overseer, world: &SimWorld) {
    let bodies = census(world.state());
    for colony in overseer.colonies() {
        let room = colony.room();
        println!(
            "{}: {} agents, {} bodies, {} live tasks",
            colony.id,
            colony.agents.len(),
            bodies.get(&room).copied().unwrap_or(0),
            colony.registry.len(),
        );
        for role in RoleKind::ALL {
            let count = colony.agents.values().filter(|a| a.role == role).count();
            if count > 0 {
                println!("  {}: {}", role, count);
            }
        }
        if let Some(state) = world.state().room(&room) {
            println!("  Energy: {}/{}", state.energy_available, state.energy_capacity);
            if let Some(controller) = &state.controller {
                println!("  Controller: level {} ({} progress)", controller.level, controller.progress);
            }
        }
    }
}
