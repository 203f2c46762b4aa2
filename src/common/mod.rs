//! Common utilities shared by the CLI, the simulation and the harness

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use error::{Error, Result};
