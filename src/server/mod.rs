pub mod config;
pub mod heartbeat;
pub mod logging;
pub mod signals;
