//! Murmur - simulated gossip network harness
//!
//! Floods messages through simulated networks, analyzes connectivity, and
//! exports visualization data for the replay front-end.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use murmur_simulation::{NetworkBuilder, scenarios};
use murmur_transport::MemoryNetwork;

#[derive(Parser)]
#[command(
    name = "murmur",
    about = "Simulated gossip network with connectivity analysis",
    version
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Flood one message through a random topology and report coverage
    Spread {
        /// Number of nodes
        #[arg(short, long, default_value = "100")]
        nodes: usize,

        /// Random peers per node
        #[arg(short, long, default_value = "2")]
        peers: usize,

        /// Settle time in milliseconds before counting
        #[arg(short, long, default_value = "1000")]
        settle_ms: u64,
    },

    /// Run the 5-node directed ring scenario
    Ring,

    /// Partition half of a ring, gossip, heal, gossip again
    Partition,

    /// Run a spread and export the visualization document
    Export {
        /// Number of nodes
        #[arg(short, long, default_value = "100")]
        nodes: usize,

        /// Random peers per node
        #[arg(short, long, default_value = "2")]
        peers: usize,

        /// Output directory for network_visualization.json
        #[arg(short, long, default_value = "visualization")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Spread {
            nodes,
            peers,
            settle_ms,
        } => {
            let report =
                scenarios::run_spread(nodes, peers, Duration::from_millis(settle_ms)).await?;
            println!("{report}");
        }
        Commands::Ring => {
            let report = scenarios::run_ring(Duration::from_millis(500)).await?;
            println!("{report}");
        }
        Commands::Partition => {
            let report = scenarios::run_partition(Duration::from_millis(500)).await?;
            println!("{report}");
        }
        Commands::Export {
            nodes,
            peers,
            output,
        } => {
            let mut builder = NetworkBuilder::new(MemoryNetwork::new());
            builder.create_nodes(nodes)?;
            builder.build_random_topology(peers);
            builder.start_all();
            builder.initiate_gossip("hello from the gossip network");
            builder.settle(Duration::from_secs(1)).await;
            builder.close_all().await;

            let path = builder.export_visualization_data(&output)?;
            println!("Exported visualization data to {}", path.display());
        }
    }

    Ok(())
}
