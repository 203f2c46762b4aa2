//! Logging sink handed to test procedures

use serde::Serialize;
use std::sync::{Arc, Mutex};

/// One recorded informational line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub message: String,
}

/// Emits tracing events and keeps a copy for the test report
#[derive(Debug, Clone)]
pub struct TestLog {
    test: Arc<str>,
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl TestLog {
    pub fn new(test: &str) -> Self {
        Self {
            test: Arc::from(test),
            entries: Arc::default(),
        }
    }

    pub fn info(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(test = %self.test, "{}", message);
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(LogEntry { message });
        }
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries().into_iter().map(|e| e.message).collect()
    }
}
