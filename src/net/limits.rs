use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use hashbrown::HashMap;
use parking_lot::Mutex;

/// Connection and flood limits
#[derive(Debug, Clone)]
pub struct LimitConfig {
    /// Maximum total concurrent connections
    pub max_connections_total: usize,
    /// Maximum connections per IP address
    pub max_connections_per_ip: usize,
    /// Maximum commands per window per connection (0 disables the check)
    pub max_commands_per_second: u32,
    /// Time window for rate limiting
    pub rate_limit_window: Duration,
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            max_connections_total: 1000,
            max_connections_per_ip: 10,
            max_commands_per_second: 20,
            rate_limit_window: Duration::from_secs(1),
        }
    }
}

/// Errors from limit checks; each renders as the line sent to the client
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LimitError {
    #[error("The server is full. Please try again later.")]
    TooManyConnections,
    #[error("Too many connections from your address.")]
    TooManyConnectionsFromIp,
    #[error("You are sending commands too quickly.")]
    RateLimitExceeded,
}

#[derive(Debug, Default)]
struct ConnectionCounts {
    per_ip: HashMap<IpAddr, usize>,
    total: usize,
}

/// Shared connection counter enforcing the total and per-IP caps
#[derive(Debug)]
pub struct ConnectionLimits {
    config: LimitConfig,
    counts: Mutex<ConnectionCounts>,
}

impl ConnectionLimits {
    pub fn new(config: LimitConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            counts: Mutex::new(ConnectionCounts::default()),
        })
    }

    pub fn config(&self) -> &LimitConfig {
        &self.config
    }

    /// Reserve a slot for a new connection from `ip`.
    ///
    /// The slot is released when the returned permit drops.
    pub fn acquire(self: &Arc<Self>, ip: IpAddr) -> Result<ConnectionPermit, LimitError> {
        let mut counts = self.counts.lock();

        if counts.total >= self.config.max_connections_total {
            return Err(LimitError::TooManyConnections);
        }

        let ip_count = counts.per_ip.get(&ip).copied().unwrap_or(0);
        if ip_count >= self.config.max_connections_per_ip {
            return Err(LimitError::TooManyConnectionsFromIp);
        }

        *counts.per_ip.entry(ip).or_insert(0) += 1;
        counts.total += 1;

        Ok(ConnectionPermit {
            limits: Arc::clone(self),
            ip,
        })
    }

    fn release(&self, ip: IpAddr) {
        let mut counts = self.counts.lock();
        if let Some(count) = counts.per_ip.get_mut(&ip) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                counts.per_ip.remove(&ip);
            }
        }
        counts.total = counts.total.saturating_sub(1);
    }

    /// Get current connection count
    pub fn connection_count(&self) -> usize {
        self.counts.lock().total
    }

    /// Get connections from an IP
    pub fn connections_from_ip(&self, ip: IpAddr) -> usize {
        self.counts.lock().per_ip.get(&ip).copied().unwrap_or(0)
    }

    /// Fresh per-connection command limiter using these settings
    pub fn command_limiter(&self) -> CommandRateLimiter {
        CommandRateLimiter::new(self.config.max_commands_per_second, self.config.rate_limit_window)
    }
}

/// A reserved connection slot
#[derive(Debug)]
pub struct ConnectionPermit {
    limits: Arc<ConnectionLimits>,
    ip: IpAddr,
}

impl ConnectionPermit {
    pub fn ip(&self) -> IpAddr {
        self.ip
    }
}

impl Drop for ConnectionPermit {
    fn drop(&mut self) {
        self.limits.release(self.ip);
    }
}

/// Fixed-window command counter for one connection
#[derive(Debug)]
pub struct CommandRateLimiter {
    max_per_window: u32,
    window: Duration,
    count: u32,
    window_start: Instant,
}

impl CommandRateLimiter {
    pub fn new(max_per_window: u32, window: Duration) -> Self {
        Self {
            max_per_window,
            window,
            count: 0,
            window_start: Instant::now(),
        }
    }

    /// Count one command now
    pub fn check(&mut self) -> Result<(), LimitError> {
        self.check_at(Instant::now())
    }

    pub fn check_at(&mut self, now: Instant) -> Result<(), LimitError> {
        if self.max_per_window == 0 {
            return Ok(());
        }

        // Reset window if expired
        if now.saturating_duration_since(self.window_start) >= self.window {
            self.window_start = now;
            self.count = 0;
        }

        self.count += 1;
        if self.count > self.max_per_window {
            Err(LimitError::RateLimitExceeded)
        } else {
            Ok(())
        }
    }
}
