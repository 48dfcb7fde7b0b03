//! Per-connection session
//!
//! Runs the name handshake, joins the player to the world, then reads one
//! command line at a time until quit, end of stream, an I/O error or server
//! shutdown. Outbound lines flow through the player's outbox to a writer
//! task, so nothing that holds a room lock ever waits on the socket.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::game::interpreter::{Actor, Interpreter, Outcome};
use crate::net::limits::CommandRateLimiter;
use crate::net::line::{self, LineError};
use crate::net::outbox::Outbox;
use crate::world::graph::World;
use crate::world::player::{Player, PlayerId, PlayerTemplate};

/// How long queued lines may take to drain once a session ends
const FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-session settings
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub max_line_length: usize,
    pub outbox_capacity: usize,
    pub player: PlayerTemplate,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_line_length: crate::game::constants::net::MAX_LINE_LENGTH,
            outbox_capacity: crate::game::constants::net::OUTBOX_CAPACITY,
            player: PlayerTemplate::default(),
        }
    }
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Disconnected or gave an empty name before joining
    NeverJoined,
    Quit,
    Disconnected,
    Shutdown,
}

/// Removes the player from the world when the session goes away, however
/// it goes away. Removal is idempotent, so an explicit leave plus this
/// guard still announces the departure once.
struct Departure {
    world: Arc<World>,
    id: PlayerId,
}

impl Drop for Departure {
    fn drop(&mut self) {
        if let Some(player) = self.world.remove_player(self.id) {
            info!("{} left the game", player.name);
        }
    }
}

/// Wait for the shutdown flag to be raised (or its sender to go away)
async fn shutdown_signal(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

/// Drive one connection to completion
pub async fn run_session<S>(
    stream: S,
    interpreter: Arc<Interpreter>,
    config: SessionConfig,
    mut limiter: CommandRateLimiter,
    mut shutdown: watch::Receiver<bool>,
) -> Result<SessionEnd, LineError>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (read_half, mut write_half) = tokio::io::split(stream);
    let mut reader = BufReader::new(read_half);

    line::write_line(&mut write_half, "Welcome to the MUD!").await?;
    line::write_line(&mut write_half, "What is your name?").await?;

    let name = tokio::select! {
        result = line::read_line(&mut reader, config.max_line_length) => result?,
        _ = shutdown_signal(&mut shutdown) => None,
    };
    let Some(name) = name else {
        return Ok(SessionEnd::NeverJoined);
    };
    if name.is_empty() {
        line::write_line(&mut write_half, "Invalid name. Goodbye!").await?;
        let _ = write_half.shutdown().await;
        return Ok(SessionEnd::NeverJoined);
    }

    let (outbox, mut outbox_rx) = Outbox::channel(config.outbox_capacity);
    let writer = tokio::spawn(async move {
        while let Some(text) = outbox_rx.recv().await {
            if let Err(e) = line::write_line(&mut write_half, &text).await {
                debug!("Write failed, dropping remaining output: {}", e);
                return;
            }
        }
        let _ = write_half.shutdown().await;
    });

    let world = interpreter.world().clone();
    let id = Uuid::new_v4();
    let actor = Actor::new(id, name.clone(), outbox.clone());
    world.add_player(Player::new(id, name.clone(), config.player, outbox));
    let departure = Departure {
        world: world.clone(),
        id,
    };
    interpreter.metrics().player_created();
    info!("{} entered the game", name);

    world.with_player(id, |scope| {
        scope.player.send(format!("Hello, {}!", name));
        scope
            .player
            .send_all(scope.room.render(scope.contents, id));
        scope
            .contents
            .broadcast(&format!("{} has entered the game.", name), None);
    });

    let result = loop {
        let read = tokio::select! {
            result = line::read_line(&mut reader, config.max_line_length) => result,
            _ = shutdown_signal(&mut shutdown) => {
                actor.send("The server is shutting down. Goodbye!");
                break Ok(SessionEnd::Shutdown);
            }
        };

        match read {
            Ok(Some(text)) => {
                if cfg!(feature = "flood_control") {
                    if let Err(e) = limiter.check() {
                        actor.send(e.to_string());
                        continue;
                    }
                }
                if interpreter.handle_line(&actor, &text) == Outcome::Quit {
                    break Ok(SessionEnd::Quit);
                }
            }
            Ok(None) => break Ok(SessionEnd::Disconnected),
            Err(LineError::LineTooLong(max)) => {
                warn!("{} sent a line over {} bytes, disconnecting", name, max);
                actor.send("Line too long. Goodbye!");
                break Err(LineError::LineTooLong(max));
            }
            Err(e) => break Err(e),
        }
    };

    // Removing the player drops its outbox sender; with the actor's gone too
    // the writer drains what is queued and closes the stream.
    drop(departure);
    drop(actor);
    if tokio::time::timeout(FLUSH_TIMEOUT, writer).await.is_err() {
        debug!("Timed out flushing output for {}", name);
    }

    result
}
