use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::info;

use tripwise::api::AppState;
use tripwise::{FjallPlanStore, MemoryPlanStore, PlanStore, TripPlanner, TripwiseConfig};

/// Travel planning backend
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Configuration file (defaults to <config dir>/tripwise/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Port to listen on, overriding the configured one
    #[arg(long)]
    port: Option<u16>,
}

fn open_store(config: &TripwiseConfig) -> Result<Arc<dyn PlanStore>> {
    match config.storage.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryPlanStore::new())),
        "fjall" => {
            let store = FjallPlanStore::open(&config.storage.path).with_context(|| {
                format!("Failed to open plan store at {}", config.storage.path)
            })?;
            Ok(Arc::new(store))
        }
        other => bail!("unknown storage backend '{other}'"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = TripwiseConfig::load_from_path(cli.config)?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    tripwise::telemetry::init_tracing(&config.logging)?;

    let store = open_store(&config)?;
    let planner = TripPlanner::from_config(&config, store)?;
    let providers = planner.availability();
    info!(
        "Starting Tripwise {} (routing: {}, flights: {}, narrative: {})",
        tripwise::VERSION,
        providers.routing,
        providers.flights,
        providers.narrative
    );

    let state = AppState {
        planner: Arc::new(planner),
    };

    tripwise::web::run(&config.server, state).await
}
