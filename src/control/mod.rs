//! Runtime control for the command-line runner: the TOML runtime record and
//! the real-time pacer that drives a simulation through it.

pub mod config;
pub mod pacer;

pub use config::RuntimeConfig;
pub use pacer::{PaceReport, Pacer};
