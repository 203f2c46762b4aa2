//! Test registration and reporting
//!
//! Tests are plain async functions taking a `TestContext`. The registry
//! maps names to those functions and `report_test` turns one run into a
//! `TestReport`: a test passes when it returns `Ok`, which means it reached
//! its end before the environment's cycle timeout fired.

use futures_util::future::{BoxFuture, FutureExt};
use serde::Serialize;
use std::path::Path;
use std::time::Instant;

use crate::common::{Error, Result};
use crate::sim::{Dut, FirmwareProgram};

use super::log::{LogEntry, TestLog};

/// Signature of a registered test
pub type TestFn = fn(TestContext) -> BoxFuture<'static, Result<()>>;

/// Everything a test receives from the harness
pub struct TestContext {
    pub dut: Dut,
    pub log: TestLog,
    timeout_override: Option<u64>,
}

impl TestContext {
    pub fn new(name: &str, dut: Dut) -> Self {
        Self {
            dut,
            log: TestLog::new(name),
            timeout_override: None,
        }
    }

    pub fn with_timeout_override(mut self, timeout_cycles: Option<u64>) -> Self {
        self.timeout_override = timeout_cycles;
        self
    }

    /// The cycle bound a test should pass to `test_configure`
    pub fn timeout_cycles(&self, default: u64) -> u64 {
        self.timeout_override.unwrap_or(default)
    }
}

/// Result of a test run
#[derive(Debug, Clone, Serialize)]
pub struct TestReport {
    pub name: String,
    pub passed: bool,
    pub error: Option<String>,
    pub log: Vec<LogEntry>,
    pub cycles: u64,
    pub sim_time_ns: u64,
    pub elapsed_ms: u64,
}

/// Run `test` on its own task and build its report
pub async fn report_test(name: &str, test: TestFn, ctx: TestContext) -> TestReport {
    let probe = ctx.dut.probe();
    let clock_period_ns = ctx.dut.clock_period_ns();
    let log = ctx.log.clone();

    tracing::info!(test = name, "Starting {} test", name);
    let started = Instant::now();

    let outcome = match tokio::spawn(test(ctx)).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => Err(Error::Internal(format!("test panicked: {}", e))),
        Err(e) => Err(Error::Internal(format!("test task failed: {}", e))),
    };

    let cycles = probe.cycle();
    let report = TestReport {
        name: name.to_string(),
        passed: outcome.is_ok(),
        error: outcome.err().map(|e| e.to_string()),
        log: log.entries(),
        cycles,
        sim_time_ns: cycles.saturating_mul(clock_period_ns),
        elapsed_ms: started.elapsed().as_millis() as u64,
    };

    match &report.error {
        None => tracing::info!(test = name, cycles, "Test passed"),
        Some(error) => tracing::error!(test = name, cycles, %error, "Test failed"),
    }

    report
}

/// A named test and the firmware it expects the DUT to run
#[derive(Clone)]
pub struct RegisteredTest {
    pub name: &'static str,
    pub firmware: fn() -> FirmwareProgram,
    pub test: TestFn,
}

/// Ordered set of runnable tests
#[derive(Clone, Default)]
pub struct TestRegistry {
    tests: Vec<RegisteredTest>,
}

impl TestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every test shipped with the crate
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("ram_word", FirmwareProgram::ram_word, |ctx: TestContext| {
            super::ram_word::ram_word(ctx).boxed()
        });
        registry
    }

    /// Register a test; a later registration under the same name replaces it
    pub fn register(
        &mut self,
        name: &'static str,
        firmware: fn() -> FirmwareProgram,
        test: TestFn,
    ) -> &mut Self {
        let entry = RegisteredTest {
            name,
            firmware,
            test,
        };
        if let Some(existing) = self.tests.iter_mut().find(|t| t.name == name) {
            *existing = entry;
        } else {
            self.tests.push(entry);
        }
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tests.iter().map(|t| t.name).collect()
    }

    pub fn get(&self, name: &str) -> Result<&RegisteredTest> {
        self.tests
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| Error::unknown_test(name, &self.names()))
    }

    /// Run one registered test against `dut`
    pub async fn run(&self, name: &str, dut: Dut, timeout_override: Option<u64>) -> Result<TestReport> {
        let registered = self.get(name)?;
        let ctx = TestContext::new(registered.name, dut).with_timeout_override(timeout_override);
        Ok(report_test(registered.name, registered.test, ctx).await)
    }
}

/// Write reports as pretty JSON
pub fn write_reports(path: &Path, reports: &[TestReport]) -> Result<()> {
    let json = serde_json::to_string_pretty(reports)?;
    std::fs::write(path, json)?;
    Ok(())
}
