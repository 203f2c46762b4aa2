//! Error types for the Caravel test harness
//!
//! Messages name the signal or condition involved so a failed report is
//! readable without a waveform.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the harness
#[derive(Error, Debug)]
pub enum Error {
    // === Simulation Errors ===
    #[error("Simulation timed out after {cycles} cycles waiting for {waiting_for}")]
    Timeout { cycles: u64, waiting_for: String },

    #[error("Simulation driver stopped unexpectedly")]
    DriverStopped,

    #[error("Invalid logic level {0}, expected 0 or 1")]
    InvalidLevel(u8),

    // === Harness Errors ===
    #[error("Test '{name}' is not registered. Available: {available}")]
    UnknownTest { name: String, available: String },

    #[error("{failed} of {total} tests failed")]
    TestsFailed { failed: usize, total: usize },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a timeout error for a wait condition
    pub fn timeout(cycles: u64, waiting_for: impl Into<String>) -> Self {
        Self::Timeout {
            cycles,
            waiting_for: waiting_for.into(),
        }
    }

    /// Create an unknown test error listing registered names
    pub fn unknown_test<S: AsRef<str>>(name: &str, available: &[S]) -> Self {
        Self::UnknownTest {
            name: name.to_string(),
            available: available
                .iter()
                .map(|s| s.as_ref())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// Whether this error was raised by the cycle timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
