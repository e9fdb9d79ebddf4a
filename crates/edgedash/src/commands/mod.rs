//! Command handlers: CLI args -> settings -> core -> output formatting.

pub mod check;
pub mod config_cmd;
pub mod render;
pub mod sync;
