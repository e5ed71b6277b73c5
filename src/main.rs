use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use fleetbook::config::Config;
use fleetbook::engine::Engine;
use fleetbook::notify::NotifyHub;
use fleetbook::scenario::{self, Scenario};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env();
    fleetbook::observability::init(config.metrics_port)?;

    info!("fleetbook replaying {}", config.scenario_path.display());
    info!("  metrics: {}", config.metrics_port.map_or("disabled".to_string(), |p| format!("http://0.0.0.0:{p}/metrics")));

    let scenario = Scenario::load(&config.scenario_path)?;
    let engine = Engine::new(Arc::new(NotifyHub::new()));
    let report = scenario::run(&engine, scenario).await?;

    let out = if config.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{out}");

    // Keep the metrics endpoint up for scraping until interrupted.
    if config.metrics_port.is_some() {
        info!("serving metrics, ctrl-c to exit");
        tokio::signal::ctrl_c().await?;
    }

    info!("fleetbook stopped");
    Ok(())
}
