//! Realm Server Library
//!
//! A multi-user text adventure server: a shared world of rooms, items and
//! monsters, played over line-oriented TCP connections.
//!
//! # Features
//!
//! - `metrics_http` - Prometheus/JSON metrics endpoint (enabled by default)
//! - `flood_control` - Per-connection command rate limiting (enabled by default)

pub mod config;
pub mod game;
pub mod metrics;
pub mod net;
pub mod world;
