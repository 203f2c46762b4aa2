//! Simulation driver task
//!
//! The driver owns the `Design`. Requests arrive on a bounded channel and
//! every reply goes back on its own oneshot, so each awaited environment
//! call is a single receive.

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::common::{Error, Result};

use super::{Design, Dut, Level};

/// Requests the environment sends to the driver
#[derive(Debug)]
pub(crate) enum DriverRequest {
    /// Run the power-on reset to completion
    Reset { reply: oneshot::Sender<Result<u64>> },
    /// Step until the management GPIO pad shows `level`
    WaitMgmtGpio {
        level: Level,
        reply: oneshot::Sender<Result<u64>>,
    },
    /// Release CSB, then step one cycle
    ReleaseCsb { reply: oneshot::Sender<Result<u64>> },
}

struct Driver {
    design: Design,
    timeout_cycles: u64,
    yield_interval: u64,
}

/// Spawn the driver for a DUT; it stops when the sender is dropped
pub(crate) fn spawn(dut: Dut, timeout_cycles: u64) -> (mpsc::Sender<DriverRequest>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(1);
    let driver = Driver {
        design: Design::new(dut.program, dut.config.reset_cycles, dut.probe),
        timeout_cycles,
        yield_interval: dut.config.yield_interval.max(1),
    };
    let handle = tokio::spawn(driver.run(rx));
    (tx, handle)
}

impl Driver {
    async fn run(mut self, mut rx: mpsc::Receiver<DriverRequest>) {
        tracing::debug!(timeout_cycles = self.timeout_cycles, "Simulation driver started");

        while let Some(request) = rx.recv().await {
            match request {
                DriverRequest::Reset { reply } => {
                    let result = self.run_until("reset release", |d| !d.in_reset()).await;
                    let _ = reply.send(result);
                }
                DriverRequest::WaitMgmtGpio { level, reply } => {
                    let condition = format!("mgmt_gpio == {}", level);
                    let result = self.run_until(&condition, |d| d.mgmt_gpio() == level).await;
                    let _ = reply.send(result);
                }
                DriverRequest::ReleaseCsb { reply } => {
                    self.design.release_csb();
                    let result = self.advance(1, "csb release").await;
                    let _ = reply.send(result);
                }
            }
        }

        tracing::debug!(cycle = self.design.cycle(), "Simulation driver stopped");
    }

    /// Step until `done` holds, checking before every step
    async fn run_until(&mut self, condition: &str, done: impl Fn(&Design) -> bool) -> Result<u64> {
        let mut since_yield = 0;
        loop {
            if done(&self.design) {
                return Ok(self.design.cycle());
            }
            self.step(condition)?;

            since_yield += 1;
            if since_yield >= self.yield_interval {
                since_yield = 0;
                tokio::task::yield_now().await;
            }
        }
    }

    async fn advance(&mut self, cycles: u64, condition: &str) -> Result<u64> {
        for _ in 0..cycles {
            self.step(condition)?;
        }
        Ok(self.design.cycle())
    }

    fn step(&mut self, condition: &str) -> Result<()> {
        if self.design.cycle() >= self.timeout_cycles {
            tracing::warn!(
                cycle = self.design.cycle(),
                condition,
                "Cycle timeout reached"
            );
            return Err(Error::timeout(self.timeout_cycles, condition));
        }
        self.design.step();
        Ok(())
    }
}
