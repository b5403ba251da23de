//! Meshlab - Node actor network simulator
//!
//! Runs a network of message-passing nodes, one tokio task per node, and
//! prints what every node ended up with.

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use meshlab_core::{IterationPolicy, NodeId};
use meshlab_logging::{FileConfig, LogConfig, MeshlabSubscriberBuilder, WorkerGuard};

use meshlab_simulation::scenarios::{self, SCENARIOS};
use meshlab_simulation::{AlgorithmKind, CodecKind, SimConfig, Simulation, TopologyBuilder, TopologyKind};

#[derive(Parser)]
#[command(
    name = "meshlab",
    about = "Node actor network simulator with per-node mailboxes",
    version
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Console log format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    /// Also write JSONL logs to `<dir>/meshlab.log`
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation; flags override values from --config
    Run(RunArgs),

    /// Create and visualize a topology
    Topology {
        /// Shape of the topology
        #[arg(short, long, value_enum, default_value_t = TopologyKind::Ring)]
        topology: TopologyKind,

        /// Number of nodes
        #[arg(short, long, default_value = "6")]
        nodes: u32,

        /// Connection probability for random topology
        #[arg(short, long, default_value = "0.4")]
        connection_prob: f64,
    },

    /// Run a pre-defined scenario (averaging, election, echo)
    Scenario {
        /// Scenario name
        name: String,
    },
}

#[derive(clap::Args)]
struct RunArgs {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of nodes
    #[arg(short, long)]
    nodes: Option<u32>,

    /// Shape of the topology
    #[arg(short, long, value_enum)]
    topology: Option<TopologyKind>,

    /// Connection probability for random topology
    #[arg(short, long)]
    connection_prob: Option<f64>,

    /// Algorithm every node runs
    #[arg(short, long, value_enum)]
    algorithm: Option<AlgorithmKind>,

    /// Messages each node processes before terminating
    #[arg(short, long)]
    iteration_max: Option<u64>,

    /// Let the algorithm advance the iteration counter itself
    ///
    /// None of the bundled algorithms advance the counter, so with them a
    /// run only ends through --timeout. Meant for custom algorithms that
    /// call `NodeContext::advance_iteration`.
    #[arg(long)]
    manual_iterations: bool,

    /// Mailbox encoding
    #[arg(long, value_enum)]
    codec: Option<CodecKind>,

    /// Initial value for a node, as `id=value` (repeatable)
    #[arg(long = "value", value_parser = parse_initial_value)]
    values: Vec<(NodeId, f64)>,

    /// Give up after this many seconds (0 waits forever)
    #[arg(long)]
    timeout: Option<u64>,
}

impl RunArgs {
    fn into_config(self) -> anyhow::Result<SimConfig> {
        let mut config = match &self.config {
            Some(path) => SimConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => SimConfig::default(),
        };

        if let Some(nodes) = self.nodes {
            config.nodes = nodes;
        }
        if let Some(topology) = self.topology {
            config.topology = topology;
        }
        if let Some(p) = self.connection_prob {
            config.connection_probability = p;
        }
        if let Some(algorithm) = self.algorithm {
            config.algorithm = algorithm;
        }
        if let Some(iteration_max) = self.iteration_max {
            config.iteration_max = iteration_max;
        }
        if self.manual_iterations {
            config.iteration_policy = IterationPolicy::Manual;
        }
        if let Some(codec) = self.codec {
            config.codec = codec;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = (timeout > 0).then_some(timeout);
        }
        config.initial_values.extend(self.values);

        config.validate()?;
        Ok(config)
    }
}

fn parse_initial_value(raw: &str) -> Result<(NodeId, f64), String> {
    let (id, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected id=value, got {}", raw))?;
    let id = id.parse::<NodeId>().map_err(|e| format!("bad node id {}: {}", id, e))?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("bad value {}: {}", value, e))?;
    Ok((id, value))
}

fn init_logging(cli: &Cli) -> Option<WorkerGuard> {
    let level = if cli.verbose { "debug" } else { "info" };
    let base = match cli.log_format {
        LogFormat::Pretty => LogConfig::development(),
        LogFormat::Json => LogConfig::default(),
    };

    let mut builder = MeshlabSubscriberBuilder::new()
        .with_config(base)
        .with_level(level);
    if let Some(directory) = &cli.log_dir {
        builder = builder.with_file_output(FileConfig::single_file(directory, "meshlab"));
    }
    builder.init()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    // Flushes the file writer on drop
    let _guard = init_logging(&cli);

    match cli.command {
        Commands::Run(args) => {
            let config = args.into_config()?;
            let sim = Simulation::new(config)?;
            println!("{}", sim.topology().visualize());

            let report = sim.run().await?;
            println!("{}", report.summary());
            if !report.all_completed() {
                bail!("{} node(s) halted", report.halted().len());
            }
        }
        Commands::Topology {
            topology,
            nodes,
            connection_prob,
        } => {
            let topology = TopologyBuilder::new(nodes).build(topology, connection_prob);
            println!("{}", topology.visualize());
        }
        Commands::Scenario { name } => match scenarios::run_scenario(&name).await {
            Some(result) => {
                result?;
            }
            None => bail!(
                "Unknown scenario: {}. Available: {}",
                name,
                SCENARIOS.join(", ")
            ),
        },
    }

    Ok(())
}
