//! Host session: orchestrator plus the loop that drives it

pub mod orchestrator;
pub mod runner;

pub use orchestrator::Session;
pub use runner::{HostRunner, DEFAULT_FRAME_HZ};
