//! World tick
//!
//! One task walks every room on a fixed interval and lets its monsters act.
//! Each room is handled under its own lock (plus the respawn room's), so a
//! tick never blocks the whole world and never races a player's attack on
//! the same monster.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::game::constants::tick;
use crate::game::systems::monster_ai::{self, TurnReport};
use crate::metrics::Metrics;
use crate::world::graph::World;

/// Tick settings
#[derive(Debug, Clone, Copy)]
pub struct TickConfig {
    pub interval: Duration,
    pub passive_attack_chance: f64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(tick::INTERVAL_MS),
            passive_attack_chance: tick::PASSIVE_ATTACK_CHANCE,
        }
    }
}

/// The periodic monster-behavior pass
pub struct WorldTick {
    world: Arc<World>,
    metrics: Arc<Metrics>,
    config: TickConfig,
}

impl WorldTick {
    pub fn new(world: Arc<World>, metrics: Arc<Metrics>, config: TickConfig) -> Self {
        Self {
            world,
            metrics,
            config,
        }
    }

    /// Run one tick over every room in lock order
    pub fn run_once<R: Rng + ?Sized>(&self, rng: &mut R) -> TurnReport {
        let start = Instant::now();
        let mut report = TurnReport::default();

        for (index, room) in self.world.rooms().iter().enumerate() {
            // Cheap check under the single room lock before taking the pair
            {
                let contents = room.lock();
                if contents.players.is_empty() || !contents.has_living_monsters() {
                    continue;
                }
            }

            if let Some(mut encounter) = self.world.encounter(index) {
                report.merge(monster_ai::run_monster_turns(
                    rng,
                    &mut encounter,
                    self.config.passive_attack_chance,
                ));
            }
        }

        for _ in 0..report.attacks {
            self.metrics.record_combat();
        }
        for _ in 0..report.deaths {
            self.metrics.record_player_death();
        }
        self.metrics.record_tick_time(start.elapsed());

        report
    }
}

/// Running tick task
pub struct TickHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl TickHandle {
    /// Signal the task and wait for the in-flight tick to finish
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

/// Spawn the world tick on the current runtime
pub fn start_world_tick(world: Arc<World>, metrics: Arc<Metrics>, config: TickConfig) -> TickHandle {
    let (shutdown, mut shutdown_rx) = watch::channel(false);
    let tick = WorldTick::new(world, metrics, config);

    let task = tokio::spawn(async move {
        let mut ticker = interval(tick.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately; monsters wait a full interval
        ticker.tick().await;

        let mut rng = StdRng::from_entropy();
        let mut tick_count: u64 = 0;
        info!("World tick started every {:?}", tick.config.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown_rx.changed() => break,
            }

            tick_count += 1;
            let report = tick.run_once(&mut rng);
            if report.attacks > 0 {
                debug!(
                    "Tick {}: {} monster attacks, {} deaths",
                    tick_count, report.attacks, report.deaths
                );
            }
        }

        info!("World tick stopped after {} ticks", tick_count);
    });

    TickHandle { shutdown, task }
}
