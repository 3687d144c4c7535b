//! Cluster simulator binary

use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use ringkv::common::{AuditLogger, AuditSink, Config};
use ringkv::sim::Cluster;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ringkv-sim")]
#[command(about = "Simulate a ringkv cluster over a lossy in-process network")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulated workload
    Run {
        /// Initial number of nodes
        #[arg(long)]
        nodes: Option<usize>,

        /// Probability of dropping each message
        #[arg(long)]
        drop_rate: Option<f64>,

        /// Shuffle each node's inbound batch
        #[arg(long)]
        reorder: bool,

        /// Ticks of workload to run
        #[arg(long)]
        ticks: Option<u64>,

        /// Wall-clock milliseconds per tick
        #[arg(long)]
        tick_ms: Option<u64>,

        /// Fail a random node at this tick
        #[arg(long)]
        fail_at: Option<u64>,

        /// Join a fresh node at this tick
        #[arg(long)]
        join_at: Option<u64>,

        /// RNG seed for the network and workload
        #[arg(long)]
        seed: Option<u64>,

        /// JSON-lines audit log
        #[arg(long)]
        audit_log: Option<PathBuf>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,

        /// Skip the Prometheus metrics dump
        #[arg(long)]
        no_metrics: bool,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Run {
            nodes,
            drop_rate,
            reorder,
            ticks,
            tick_ms,
            fail_at,
            join_at,
            seed,
            audit_log,
            json,
            no_metrics,
        } => {
            // CLI flags take priority over file and environment
            let sim = &mut config.sim;
            if let Some(n) = nodes {
                sim.nodes = n;
            }
            if let Some(rate) = drop_rate {
                sim.drop_rate = rate;
            }
            sim.reorder |= reorder;
            if let Some(t) = ticks {
                sim.ticks = t;
            }
            if let Some(ms) = tick_ms {
                sim.tick_ms = ms;
            }
            if fail_at.is_some() {
                sim.fail_at_tick = fail_at;
            }
            if join_at.is_some() {
                sim.join_at_tick = join_at;
            }
            if let Some(s) = seed {
                sim.seed = s;
            }
            if audit_log.is_some() {
                config.audit.path = audit_log;
            }
            config.sim.validate()?;

            run(config, json, !no_metrics).await?;
        }
    }

    Ok(())
}

async fn run(config: Config, json: bool, metrics: bool) -> anyhow::Result<()> {
    let extra: Option<Arc<dyn AuditSink>> =
        if config.audit.path.is_some() || config.audit.stdout {
            Some(Arc::new(AuditLogger::new(
                config.audit.path.as_deref(),
                config.audit.stdout,
            )))
        } else {
            None
        };

    let sim = config.sim.clone();
    let mut cluster = Cluster::with_audit(config.node.clone(), &sim, extra);
    let mut rng = StdRng::seed_from_u64(sim.seed);
    let mut interval = tokio::time::interval(sim.tick_interval());

    tracing::info!(
        "Simulating {} nodes for {} ticks (drop rate {}, reorder {})",
        sim.nodes,
        sim.ticks,
        sim.drop_rate,
        sim.reorder
    );

    // Workload phase, then enough quiet ticks for every request to resolve
    let total = sim.ticks + config.node.wait_ticks + 1;
    let mut tick = 0;
    while tick < total {
        tokio::select! {
            _ = interval.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted at tick {}", tick);
                break;
            }
        }
        tick += 1;

        if sim.fail_at_tick == Some(tick) {
            let live = cluster.addresses();
            if let Some(victim) = live.choose(&mut rng) {
                cluster.fail(victim);
            }
        }
        if sim.join_at_tick == Some(tick) {
            cluster.join();
        }
        if tick <= sim.ticks {
            cluster.run_workload(&mut rng, sim.ops_per_tick);
        }
        cluster.tick();
    }

    let summary = cluster.summary();
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", summary);
    }
    if metrics {
        print!("{}", cluster.metrics_text());
    }
    Ok(())
}
