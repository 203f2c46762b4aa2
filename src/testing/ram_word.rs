//! ReRAM single-word write/read test
//!
//! The firmware raises the management GPIO once the user interface is
//! configured, performs its writes and reads, then drops the GPIO. The test
//! follows along and passes by reaching the end before the cycle timeout.

use crate::common::Result;
use crate::env::{test_configure, Environment};
use crate::sim::Level;

use super::{TestContext, TestLog};

pub const RAM_WORD_TIMEOUT_CYCLES: u64 = 500_000;

pub const MSG_START: &str = "[TEST] Start Write and Read.";
pub const MSG_PROCESSING: &str = "[TEST] Processing Write and Read.";
pub const MSG_COMPLETED: &str = "[TEST] Completed Write and Read";

/// Registered entry point
pub async fn ram_word(ctx: TestContext) -> Result<()> {
    let timeout_cycles = ctx.timeout_cycles(RAM_WORD_TIMEOUT_CYCLES);
    let mut env = test_configure(ctx.dut, timeout_cycles).await?;
    write_and_read(&mut env, &ctx.log).await
}

/// The fixed sequence: ready, release CSB, done
pub async fn write_and_read<E: Environment + ?Sized>(env: &mut E, log: &TestLog) -> Result<()> {
    env.wait_mgmt_gpio(Level::High).await?;
    log.info(MSG_START);
    env.release_csb().await?;
    log.info(MSG_PROCESSING);
    env.wait_mgmt_gpio(Level::Low).await?;
    log.info(MSG_COMPLETED);
    Ok(())
}
