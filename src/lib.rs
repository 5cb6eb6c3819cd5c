//! Tilt Arcade - phone-tilt controller relay and fixed-tick arcade engine
//!
//! - `ws` / `room`: the WebSocket relay that pairs a display host with
//!   phone controllers inside a room
//! - `input`: turns raw device orientation into a calibrated control signal
//! - `game` / `session`: the host-side simulation for the three games

pub mod app;
pub mod client;
pub mod config;
pub mod game;
pub mod http;
pub mod input;
pub mod room;
pub mod session;
pub mod util;
pub mod ws;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging. `RUST_LOG` wins over `log_level`.
pub fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}
