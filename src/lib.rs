//! Caravel test harness
//!
//! Cycle-based simulation of a Caravel chip running management firmware,
//! an environment API for test procedures, and explicit test registration
//! with pass/fail reporting.

pub mod cli;
pub mod commands;
pub mod common;
pub mod env;
pub mod sim;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use env::{test_configure, CaravelEnv, Environment};
pub use sim::{Dut, FirmwareProgram, Level};
pub use testing::{TestRegistry, TestReport};
