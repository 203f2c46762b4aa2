//! Test harness
//!
//! Explicit registration of named async tests, the logging sink they
//! write to, and the reporting wrapper that turns a run into a
//! `TestReport`.

mod harness;
mod log;
pub mod ram_word;

pub use harness::{
    report_test, write_reports, RegisteredTest, TestContext, TestFn, TestRegistry, TestReport,
};
pub use log::{LogEntry, TestLog};
