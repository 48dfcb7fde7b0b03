//! Server telemetry
//!
//! Counters for connections, commands and combat, rendered in Prometheus
//! text format or JSON. Default endpoint: http://localhost:9090/metrics

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use hashbrown::HashMap;
use parking_lot::RwLock;
use serde::Serialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Metrics registry for the server
#[derive(Debug)]
pub struct Metrics {
    // Connections
    pub connections_total: AtomicU64,
    pub connections_active: AtomicU64,
    pub connections_rejected: AtomicU64,
    pub players_created: AtomicU64,

    // Commands
    pub commands_executed: AtomicU64,
    pub command_errors: AtomicU64,

    // Combat
    pub combat_actions: AtomicU64,
    pub monster_kills: AtomicU64,
    pub player_deaths: AtomicU64,

    // World tick timing (microseconds)
    pub tick_count: AtomicU64,
    pub tick_time_us: AtomicU64,
    pub tick_time_p95_us: AtomicU64,
    pub tick_time_max_us: AtomicU64,

    start_time: Instant,

    // Rolling tick times for percentile calculation
    tick_history: RwLock<VecDeque<u64>>,
    room_visits: RwLock<HashMap<String, u64>>,
    command_counts: RwLock<HashMap<String, u64>>,
}

/// Point-in-time copy of every counter
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_seconds: u64,
    pub connections_total: u64,
    pub connections_active: u64,
    pub connections_rejected: u64,
    pub players_created: u64,
    pub commands_executed: u64,
    pub command_errors: u64,
    pub combat_actions: u64,
    pub monster_kills: u64,
    pub player_deaths: u64,
    pub tick_count: u64,
    pub tick_time_us: u64,
    pub tick_time_p95_us: u64,
    pub tick_time_max_us: u64,
    pub room_visits: BTreeMap<String, u64>,
    pub command_counts: BTreeMap<String, u64>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            connections_total: AtomicU64::new(0),
            connections_active: AtomicU64::new(0),
            connections_rejected: AtomicU64::new(0),
            players_created: AtomicU64::new(0),
            commands_executed: AtomicU64::new(0),
            command_errors: AtomicU64::new(0),
            combat_actions: AtomicU64::new(0),
            monster_kills: AtomicU64::new(0),
            player_deaths: AtomicU64::new(0),
            tick_count: AtomicU64::new(0),
            tick_time_us: AtomicU64::new(0),
            tick_time_p95_us: AtomicU64::new(0),
            tick_time_max_us: AtomicU64::new(0),
            start_time: Instant::now(),
            tick_history: RwLock::new(VecDeque::with_capacity(1000)),
            room_visits: RwLock::new(HashMap::new()),
            command_counts: RwLock::new(HashMap::new()),
        }
    }

    pub fn connection_opened(&self) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
        self.connections_active.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        let _ = self
            .connections_active
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| Some(n.saturating_sub(1)));
    }

    pub fn connection_rejected(&self) {
        self.connections_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn player_created(&self) {
        self.players_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_command(&self, verb: &str) {
        self.commands_executed.fetch_add(1, Ordering::Relaxed);
        *self.command_counts.write().entry(verb.to_string()).or_insert(0) += 1;
    }

    pub fn record_command_error(&self) {
        self.command_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_combat(&self) {
        self.combat_actions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_monster_kill(&self) {
        self.monster_kills.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_player_death(&self) {
        self.player_deaths.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_room_visit(&self, room_name: &str) {
        *self.room_visits.write().entry(room_name.to_string()).or_insert(0) += 1;
    }

    /// Record a tick time and update percentiles
    pub fn record_tick_time(&self, duration: Duration) {
        let us = duration.as_micros() as u64;
        self.tick_time_us.store(us, Ordering::Relaxed);
        self.tick_count.fetch_add(1, Ordering::Relaxed);

        let mut history = self.tick_history.write();
        history.push_back(us);
        while history.len() > 1000 {
            history.pop_front();
        }

        let mut sorted: Vec<u64> = history.iter().copied().collect();
        sorted.sort_unstable();
        let p95_idx = ((sorted.len() as f64 * 0.95) as usize).min(sorted.len() - 1);
        self.tick_time_p95_us.store(sorted[p95_idx], Ordering::Relaxed);
        self.tick_time_max_us
            .store(sorted.last().copied().unwrap_or(0), Ordering::Relaxed);
    }

    /// Get uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_seconds: self.uptime_seconds(),
            connections_total: self.connections_total.load(Ordering::Relaxed),
            connections_active: self.connections_active.load(Ordering::Relaxed),
            connections_rejected: self.connections_rejected.load(Ordering::Relaxed),
            players_created: self.players_created.load(Ordering::Relaxed),
            commands_executed: self.commands_executed.load(Ordering::Relaxed),
            command_errors: self.command_errors.load(Ordering::Relaxed),
            combat_actions: self.combat_actions.load(Ordering::Relaxed),
            monster_kills: self.monster_kills.load(Ordering::Relaxed),
            player_deaths: self.player_deaths.load(Ordering::Relaxed),
            tick_count: self.tick_count.load(Ordering::Relaxed),
            tick_time_us: self.tick_time_us.load(Ordering::Relaxed),
            tick_time_p95_us: self.tick_time_p95_us.load(Ordering::Relaxed),
            tick_time_max_us: self.tick_time_max_us.load(Ordering::Relaxed),
            room_visits: self
                .room_visits
                .read()
                .iter()
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
            command_counts: self
                .command_counts
                .read()
                .iter()
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
        }
    }

    /// Generate Prometheus-format metrics output
    pub fn to_prometheus(&self) -> String {
        let snapshot = self.snapshot();
        let mut output = String::with_capacity(4096);

        macro_rules! metric {
            ($name:expr, $help:expr, $type:expr, $value:expr) => {
                output.push_str(&format!(
                    "# HELP {} {}\n# TYPE {} {}\n{} {}\n",
                    $name, $help, $name, $type, $name, $value
                ));
            };
        }

        metric!("realm_connections_total", "Connections accepted", "counter",
            snapshot.connections_total);
        metric!("realm_connections_active", "Open connections", "gauge",
            snapshot.connections_active);
        metric!("realm_connections_rejected_total", "Connections refused by limits", "counter",
            snapshot.connections_rejected);
        metric!("realm_players_created_total", "Players that completed the handshake", "counter",
            snapshot.players_created);
        metric!("realm_commands_total", "Commands executed", "counter",
            snapshot.commands_executed);
        metric!("realm_command_errors_total", "Commands rejected with an error", "counter",
            snapshot.command_errors);
        metric!("realm_combat_actions_total", "Attacks resolved", "counter",
            snapshot.combat_actions);
        metric!("realm_monster_kills_total", "Monsters killed by players", "counter",
            snapshot.monster_kills);
        metric!("realm_player_deaths_total", "Players killed by monsters", "counter",
            snapshot.player_deaths);
        metric!("realm_tick_count", "World ticks processed", "counter",
            snapshot.tick_count);
        metric!("realm_tick_time_microseconds", "Last world tick duration", "gauge",
            snapshot.tick_time_us);
        metric!("realm_tick_time_p95_microseconds", "95th percentile tick duration", "gauge",
            snapshot.tick_time_p95_us);
        metric!("realm_tick_time_max_microseconds", "Maximum tick duration", "gauge",
            snapshot.tick_time_max_us);
        metric!("realm_uptime_seconds", "Server uptime in seconds", "counter",
            snapshot.uptime_seconds);

        output.push_str("# HELP realm_commands_by_verb Commands executed per verb\n");
        output.push_str("# TYPE realm_commands_by_verb counter\n");
        for (verb, count) in &snapshot.command_counts {
            output.push_str(&format!("realm_commands_by_verb{{verb=\"{}\"}} {}\n", verb, count));
        }

        output.push_str("# HELP realm_room_visits Arrivals per room\n");
        output.push_str("# TYPE realm_room_visits counter\n");
        for (room, count) in &snapshot.room_visits {
            output.push_str(&format!(
                "realm_room_visits{{room=\"{}\"}} {}\n",
                room.replace('"', "\\\""),
                count
            ));
        }

        output
    }

    /// JSON rendering of the snapshot
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }

    /// One-line summary for logs
    pub fn summary(&self) -> String {
        let s = self.snapshot();
        format!(
            "Uptime: {}s | Connections: {}/{} | Commands: {} | Combat: {} | Kills: {} | Deaths: {}",
            s.uptime_seconds,
            s.connections_active,
            s.connections_total,
            s.commands_executed,
            s.combat_actions,
            s.monster_kills,
            s.player_deaths
        )
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Start the metrics HTTP server
pub async fn start_metrics_server(metrics: Arc<Metrics>, port: u16) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await?;

    info!("Metrics server listening on http://{}/metrics", addr);

    loop {
        let (mut socket, peer) = listener.accept().await?;
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 1024];

            match socket.read(&mut buffer).await {
                Ok(n) if n > 0 => {
                    let request = String::from_utf8_lossy(&buffer[..n]);
                    let response = http_response(&metrics, &request);

                    if let Err(e) = socket.write_all(response.as_bytes()).await {
                        debug!("Failed to write metrics response to {}: {}", peer, e);
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    debug!("Failed to read from metrics socket {}: {}", peer, e);
                }
            }
        });
    }
}

fn http_response(metrics: &Metrics, request: &str) -> String {
    let (content_type, body) = if request.starts_with("GET /metrics/json") {
        ("application/json", metrics.to_json())
    } else if request.starts_with("GET /metrics") {
        ("text/plain; version=0.0.4", metrics.to_prometheus())
    } else if request.starts_with("GET /health") {
        ("text/plain", "OK".to_string())
    } else {
        return "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
            .to_string();
    };

    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        content_type,
        body.len(),
        body
    )
}

/// Log the summary line every `interval`
pub fn start_stats_logger(metrics: Arc<Metrics>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // First tick fires immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            info!("Stats: {}", metrics.summary());
            let snapshot = metrics.snapshot();
            for (room, visits) in snapshot.room_visits.iter().filter(|(_, v)| **v > 0) {
                debug!("  {}: {} visits", room, visits);
            }
            for (verb, count) in &snapshot.command_counts {
                debug!("  {}: {} times", verb, count);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = Metrics::new();
        assert_eq!(metrics.connections_total.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.tick_count.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_connection_counters() {
        let metrics = Metrics::new();
        metrics.connection_opened();
        metrics.connection_opened();
        metrics.connection_closed();
        metrics.connection_closed();
        metrics.connection_closed();

        assert_eq!(metrics.connections_total.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.connections_active.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_command_counts() {
        let metrics = Metrics::new();
        metrics.record_command("look");
        metrics.record_command("look");
        metrics.record_command("say");

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.commands_executed, 3);
        assert_eq!(snapshot.command_counts.get("look"), Some(&2));
        assert_eq!(snapshot.command_counts.get("say"), Some(&1));
    }

    #[test]
    fn test_room_visits() {
        let metrics = Metrics::new();
        metrics.record_room_visit("Tavern");
        metrics.record_room_visit("Tavern");

        assert_eq!(metrics.snapshot().room_visits.get("Tavern"), Some(&2));
    }

    #[test]
    fn test_record_tick_time() {
        let metrics = Metrics::new();

        for i in 0..100 {
            metrics.record_tick_time(Duration::from_micros(100 + i * 10));
        }

        assert_eq!(metrics.tick_count.load(Ordering::Relaxed), 100);
        assert!(metrics.tick_time_p95_us.load(Ordering::Relaxed) >= 1000);
        assert_eq!(metrics.tick_time_max_us.load(Ordering::Relaxed), 1090);
    }

    #[test]
    fn test_prometheus_format() {
        let metrics = Metrics::new();
        metrics.connection_opened();
        metrics.record_monster_kill();
        metrics.record_command("attack");

        let output = metrics.to_prometheus();

        assert!(output.contains("realm_connections_total 1"));
        assert!(output.contains("realm_monster_kills_total 1"));
        assert!(output.contains("realm_commands_by_verb{verb=\"attack\"} 1"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_json_format() {
        let metrics = Metrics::new();
        metrics.record_player_death();

        let value: serde_json::Value = serde_json::from_str(&metrics.to_json()).unwrap();
        assert_eq!(value["player_deaths"], 1);
    }

    #[test]
    fn test_summary() {
        let metrics = Metrics::new();
        metrics.connection_opened();
        assert!(metrics.summary().contains("Connections: 1/1"));
    }

    #[test]
    fn test_http_routes() {
        let metrics = Metrics::new();
        assert!(http_response(&metrics, "GET /metrics HTTP/1.1").contains("realm_uptime_seconds"));
        assert!(http_response(&metrics, "GET /metrics/json HTTP/1.1").contains("application/json"));
        assert!(http_response(&metrics, "GET /health HTTP/1.1").ends_with("OK"));
        assert!(http_response(&metrics, "GET /nope HTTP/1.1").starts_with("HTTP/1.1 404"));
    }
}
