use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::game::constants::{net, player, tick};
use crate::game::tick::TickConfig;
use crate::net::session::SessionConfig;
use crate::world::player::PlayerTemplate;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to
    pub bind_address: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Port for the metrics endpoint (0 disables it)
    pub metrics_port: u16,
    /// Milliseconds between world ticks
    pub tick_interval_ms: u64,
    /// Chance per tick that a passive monster attacks
    pub passive_attack_chance: f64,
    /// JSON world file; the built-in world is used when unset
    pub world_file: Option<PathBuf>,
    /// Starting health for new players
    pub player_health: i32,
    /// Starting base damage for new players
    pub player_damage: i32,
    /// Undelivered lines buffered per player
    pub outbox_capacity: usize,
    /// Maximum total concurrent connections
    pub max_connections: usize,
    /// Maximum connections per IP address
    pub max_connections_per_ip: usize,
    /// Commands accepted per connection per second (0 disables the limit)
    pub max_commands_per_second: u32,
    /// Longest accepted input line in bytes
    pub max_line_length: usize,
    /// Seconds between logged stats summaries
    pub stats_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 4000,
            metrics_port: 9090,
            tick_interval_ms: tick::INTERVAL_MS,
            passive_attack_chance: tick::PASSIVE_ATTACK_CHANCE,
            world_file: None,
            player_health: player::STARTING_HEALTH,
            player_damage: player::BASE_DAMAGE,
            outbox_capacity: net::OUTBOX_CAPACITY,
            max_connections: 1000,
            max_connections_per_ip: 10,
            max_commands_per_second: 20,
            max_line_length: net::MAX_LINE_LENGTH,
            stats_interval_secs: 300,
        }
    }
}

/// Parse `name` from `lookup`, warning and returning `None` when the value
/// is malformed or fails `accept`
fn parse_var<T, L, A>(lookup: &L, name: &str, requirement: &str, accept: A) -> Option<T>
where
    T: FromStr,
    L: Fn(&str) -> Option<String>,
    A: Fn(&T) -> bool,
{
    let raw = lookup(name)?;
    match raw.trim().parse::<T>() {
        Ok(parsed) if accept(&parsed) => Some(parsed),
        Ok(_) => {
            tracing::warn!("{} must be {}, using default", name, requirement);
            None
        }
        Err(_) => {
            tracing::warn!("Invalid {} '{}', using default", name, raw);
            None
        }
    }
}

impl ServerConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        Self::load_from(|name| std::env::var(name).ok())
    }

    /// Load config from any variable source, falling back per field
    pub fn load_from<L: Fn(&str) -> Option<String>>(lookup: L) -> Self {
        let mut config = Self::default();

        if let Some(addr) = parse_var(&lookup, "BIND_ADDRESS", "an IP address", |_: &IpAddr| true) {
            config.bind_address = addr;
        }
        if let Some(port) = parse_var(&lookup, "PORT", "> 0", |p: &u16| *p > 0) {
            config.port = port;
        }
        if let Some(port) = parse_var(&lookup, "METRICS_PORT", "a port number", |_: &u16| true) {
            config.metrics_port = port;
        }
        if let Some(ms) = parse_var(&lookup, "TICK_INTERVAL_MS", "10-600000", |ms: &u64| {
            (10..=600_000).contains(ms)
        }) {
            config.tick_interval_ms = ms;
        }
        if let Some(chance) = parse_var(&lookup, "PASSIVE_ATTACK_CHANCE", "0.0-1.0", |c: &f64| {
            (0.0..=1.0).contains(c)
        }) {
            config.passive_attack_chance = chance;
        }
        if let Some(path) = lookup("WORLD_FILE").filter(|p| !p.trim().is_empty()) {
            config.world_file = Some(PathBuf::from(path.trim()));
        }
        if let Some(health) = parse_var(&lookup, "PLAYER_HEALTH", "1-10000", |h: &i32| {
            (1..=10_000).contains(h)
        }) {
            config.player_health = health;
        }
        if let Some(damage) = parse_var(&lookup, "PLAYER_DAMAGE", "0-1000", |d: &i32| {
            (0..=1000).contains(d)
        }) {
            config.player_damage = damage;
        }
        if let Some(capacity) = parse_var(&lookup, "OUTBOX_CAPACITY", "> 0", |c: &usize| *c > 0) {
            config.outbox_capacity = capacity;
        }
        if let Some(max) = parse_var(&lookup, "MAX_CONNECTIONS", "> 0", |m: &usize| *m > 0) {
            config.max_connections = max;
        }
        if let Some(max) = parse_var(&lookup, "MAX_CONNECTIONS_PER_IP", "> 0", |m: &usize| *m > 0) {
            config.max_connections_per_ip = max;
        }
        if let Some(max) = parse_var(&lookup, "MAX_COMMANDS_PER_SECOND", "a count", |_: &u32| true) {
            config.max_commands_per_second = max;
        }
        if let Some(len) = parse_var(&lookup, "MAX_LINE_LENGTH", "64-65536", |l: &usize| {
            (64..=65_536).contains(l)
        }) {
            config.max_line_length = len;
        }
        if let Some(secs) = parse_var(&lookup, "STATS_INTERVAL_SECS", "> 0", |s: &u64| *s > 0) {
            config.stats_interval_secs = secs;
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("Port cannot be 0".to_string());
        }
        if self.metrics_port != 0 && self.metrics_port == self.port {
            return Err("metrics_port must differ from port".to_string());
        }
        if self.tick_interval_ms == 0 {
            return Err("tick_interval_ms must be at least 1".to_string());
        }
        if !(0.0..=1.0).contains(&self.passive_attack_chance) {
            return Err("passive_attack_chance must be between 0 and 1".to_string());
        }
        if self.player_health <= 0 {
            return Err("player_health must be positive".to_string());
        }
        if self.outbox_capacity == 0 {
            return Err("outbox_capacity must be at least 1".to_string());
        }
        if self.max_connections == 0 || self.max_connections_per_ip == 0 {
            return Err("connection limits must be at least 1".to_string());
        }
        if self.max_connections_per_ip > self.max_connections {
            return Err("max_connections_per_ip cannot exceed max_connections".to_string());
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    pub fn tick_config(&self) -> TickConfig {
        TickConfig {
            interval: Duration::from_millis(self.tick_interval_ms),
            passive_attack_chance: self.passive_attack_chance,
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            max_line_length: self.max_line_length,
            outbox_capacity: self.outbox_capacity,
            player: PlayerTemplate {
                health: self.player_health,
                damage: self.player_damage,
            },
        }
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.stats_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::load_from(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 4000);
        assert_eq!(config.metrics_port, 9090);
        assert_eq!(config.tick_interval_ms, 3000);
        assert_eq!(config.passive_attack_chance, 0.3);
        assert_eq!(config.player_health, 30);
        assert_eq!(config.player_damage, 5);
        assert!(config.world_file.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_or_default() {
        let config = ServerConfig::load_or_default();
        assert!(config.port > 0);
    }

    #[test]
    fn test_load_overrides() {
        let config = load(&[
            ("BIND_ADDRESS", "127.0.0.1"),
            ("PORT", "5555"),
            ("METRICS_PORT", "0"),
            ("TICK_INTERVAL_MS", "500"),
            ("PASSIVE_ATTACK_CHANCE", "0.5"),
            ("WORLD_FILE", "worlds/small.json"),
            ("MAX_COMMANDS_PER_SECOND", "0"),
        ]);

        assert_eq!(config.bind_addr(), "127.0.0.1:5555".parse().unwrap());
        assert_eq!(config.metrics_port, 0);
        assert_eq!(config.tick_config().interval, Duration::from_millis(500));
        assert_eq!(config.tick_config().passive_attack_chance, 0.5);
        assert_eq!(config.world_file, Some(PathBuf::from("worlds/small.json")));
        assert_eq!(config.max_commands_per_second, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = load(&[
            ("PORT", "0"),
            ("BIND_ADDRESS", "not-an-ip"),
            ("PASSIVE_ATTACK_CHANCE", "1.5"),
            ("PLAYER_HEALTH", "lots"),
            ("OUTBOX_CAPACITY", "0"),
        ]);
        let defaults = ServerConfig::default();

        assert_eq!(config.port, defaults.port);
        assert_eq!(config.bind_address, defaults.bind_address);
        assert_eq!(config.passive_attack_chance, defaults.passive_attack_chance);
        assert_eq!(config.player_health, defaults.player_health);
        assert_eq!(config.outbox_capacity, defaults.outbox_capacity);
    }

    #[test]
    fn test_session_config() {
        let config = load(&[("PLAYER_HEALTH", "50"), ("PLAYER_DAMAGE", "7")]);
        let session = config.session_config();
        assert_eq!(session.player, PlayerTemplate { health: 50, damage: 7 });
        assert_eq!(session.max_line_length, 1024);
    }

    #[test]
    fn test_validate_rejects() {
        let config = ServerConfig {
            max_connections: 5,
            max_connections_per_ip: 10,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ServerConfig {
            metrics_port: 4000,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
