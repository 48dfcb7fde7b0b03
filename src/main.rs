use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use realm_server::config::ServerConfig;
use realm_server::game::tick::start_world_tick;
use realm_server::metrics::{self, Metrics};
use realm_server::net::transport::MudServer;
use realm_server::world::content::WorldSpec;
use realm_server::world::graph::World;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("Realm Server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = ServerConfig::load_or_default();
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    info!(
        "Configuration loaded: {}, tick={}ms, max_connections={}",
        config.bind_addr(),
        config.tick_interval_ms,
        config.max_connections
    );

    // Build the world
    let spec = match &config.world_file {
        Some(path) => WorldSpec::from_json_file(path)
            .with_context(|| format!("Failed to load world from {}", path.display()))?,
        None => WorldSpec::reference(),
    };
    let world = Arc::new(World::from_spec(&spec).context("Invalid world")?);
    info!(
        "World ready: {} rooms, players start in {}",
        world.rooms().len(),
        world.start_room().name
    );

    // Initialize metrics
    let metrics = Arc::new(Metrics::new());

    if cfg!(feature = "metrics_http") && config.metrics_port != 0 {
        let metrics_clone = metrics.clone();
        let metrics_port = config.metrics_port;
        tokio::spawn(async move {
            if let Err(e) = metrics::start_metrics_server(metrics_clone, metrics_port).await {
                error!("Metrics server error: {}", e);
            }
        });
    }
    let stats_logger = metrics::start_stats_logger(metrics.clone(), config.stats_interval());
    info!("Telemetry: {}", metrics.summary());

    let tick = start_world_tick(world.clone(), metrics.clone(), config.tick_config());

    let server = MudServer::bind(&config, world.clone(), metrics.clone()).await?;
    info!("Connect with: telnet {} {}", config.bind_address, config.port);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut server_task = tokio::spawn(server.run(shutdown_rx));

    // Shutdown signal handler
    let server_finished = tokio::select! {
        result = &mut server_task => {
            match result {
                Ok(Err(e)) => error!("Server error: {}", e),
                Err(e) => error!("Server task failed: {}", e),
                Ok(Ok(())) => {}
            }
            true
        }
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                error!("Failed to listen for Ctrl+C: {}", e);
            }
            info!("Shutting down...");
            false
        }
    };

    // Cleanup: stop accepting, let sessions say goodbye, stop the tick
    let _ = shutdown_tx.send(true);
    if !server_finished
        && tokio::time::timeout(Duration::from_secs(5), server_task)
            .await
            .is_err()
    {
        error!("Timed out waiting for the server to stop");
    }
    tick.stop().await;
    stats_logger.abort();

    // Give sessions a moment to flush their farewells
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while world.player_count() > 0 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    info!("Final stats: {}", metrics.summary());
    info!("Server stopped");

    Ok(())
}
