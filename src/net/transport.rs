//! TCP server
//!
//! Accepts telnet-style connections and spawns one session task each.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

use crate::config::ServerConfig;
use crate::game::interpreter::Interpreter;
use crate::metrics::Metrics;
use crate::net::limits::{ConnectionLimits, LimitConfig};
use crate::net::line;
use crate::net::session::{run_session, SessionConfig};
use crate::world::graph::World;

/// Line-protocol MUD server
pub struct MudServer {
    listener: TcpListener,
    interpreter: Arc<Interpreter>,
    limits: Arc<ConnectionLimits>,
    session_config: SessionConfig,
    metrics: Arc<Metrics>,
}

impl MudServer {
    /// Bind the listener
    pub async fn bind(
        config: &ServerConfig,
        world: Arc<World>,
        metrics: Arc<Metrics>,
    ) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(config.bind_addr()).await?;
        let limits = ConnectionLimits::new(LimitConfig {
            max_connections_total: config.max_connections,
            max_connections_per_ip: config.max_connections_per_ip,
            max_commands_per_second: config.max_commands_per_second,
            ..LimitConfig::default()
        });

        Ok(Self {
            listener,
            interpreter: Arc::new(Interpreter::new(world, metrics.clone())),
            limits,
            session_config: config.session_config(),
            metrics,
        })
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until `shutdown` is raised. Sessions are told to
    /// finish through the same signal.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        tracing::info!("MUD server listening on {}", self.local_addr()?);

        loop {
            let (stream, peer) = tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        tracing::warn!("Failed to accept connection: {}", e);
                        continue;
                    }
                },
                _ = shutdown.changed() => break,
            };

            let permit = match self.limits.acquire(peer.ip()) {
                Ok(permit) => permit,
                Err(e) => {
                    tracing::warn!("Connection from {} rejected: {}", peer, e);
                    self.metrics.connection_rejected();
                    tokio::spawn(refuse(stream, e.to_string()));
                    continue;
                }
            };

            let interpreter = self.interpreter.clone();
            let limiter = self.limits.command_limiter();
            let session_config = self.session_config;
            let metrics = self.metrics.clone();
            let shutdown = shutdown.clone();

            tokio::spawn(async move {
                let _permit = permit;
                metrics.connection_opened();
                tracing::debug!("Connection from {}", peer);

                match run_session(stream, interpreter, session_config, limiter, shutdown).await {
                    Ok(end) => tracing::debug!("Connection from {} ended: {:?}", peer, end),
                    Err(e) => tracing::warn!("Connection error from {}: {}", peer, e),
                }

                metrics.connection_closed();
            });
        }

        tracing::info!("MUD server stopped accepting connections");
        Ok(())
    }
}

/// Tell a refused client why, then hang up
async fn refuse(mut stream: TcpStream, reason: String) {
    let _ = line::write_line(&mut stream, &reason).await;
}
