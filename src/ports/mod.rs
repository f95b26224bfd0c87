//! Port traits: the seams between the engine and the outside world.

pub mod config_port;
pub mod data_port;
pub mod notifier_port;
