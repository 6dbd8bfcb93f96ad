//! Process-level plumbing shared by the `server` and `migrate` binaries:
//! configuration loading, logging setup and the bulk seed runner.

pub mod config;
pub mod logging;
pub mod seed;

pub use crate::config::{AppConfig, LogConfig, LogFormat, ServerConfig, load_config};
pub use logging::init_tracing;
pub use seed::{SeedReport, load_seed, seed};
