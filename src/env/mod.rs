//! Test environment handed to test procedures
//!
//! `test_configure` powers up the DUT and returns a `CaravelEnv`. Tests
//! talk to the environment only through the `Environment` trait, which
//! keeps sequencers independent of the simulation backend.

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::common::{Error, Result};
use crate::sim::driver::{self, DriverRequest};
use crate::sim::{Dut, Level};

/// Operations a test can perform against the chip
#[async_trait]
pub trait Environment: Send {
    /// Suspend until the management GPIO pad shows `level`
    async fn wait_mgmt_gpio(&mut self, level: Level) -> Result<()>;

    /// Stop driving the CSB pad from the testbench
    async fn release_csb(&mut self) -> Result<()>;

    /// Last simulation cycle observed by this handle
    fn cycle(&self) -> u64;
}

/// Environment backed by the cycle-based simulation
pub struct CaravelEnv {
    requests: mpsc::Sender<DriverRequest>,
    timeout_cycles: u64,
    cycle: u64,
}

/// Power up and reset the DUT, enforcing `timeout_cycles` on every wait
pub async fn test_configure(dut: Dut, timeout_cycles: u64) -> Result<CaravelEnv> {
    if timeout_cycles == 0 {
        return Err(Error::Config(
            "timeout_cycles must be greater than zero".to_string(),
        ));
    }

    tracing::info!(
        program = %dut.program().name,
        timeout_cycles,
        clock_period_ns = dut.clock_period_ns(),
        "Configuring test environment"
    );

    let (requests, _driver) = driver::spawn(dut, timeout_cycles);
    let mut env = CaravelEnv {
        requests,
        timeout_cycles,
        cycle: 0,
    };
    env.cycle = env.request(|reply| DriverRequest::Reset { reply }).await?;

    tracing::debug!(cycle = env.cycle, "Reset released");
    Ok(env)
}

impl CaravelEnv {
    pub fn timeout_cycles(&self) -> u64 {
        self.timeout_cycles
    }

    async fn request(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<u64>>) -> DriverRequest,
    ) -> Result<u64> {
        let (reply, response) = oneshot::channel();
        self.requests
            .send(make(reply))
            .await
            .map_err(|_| Error::DriverStopped)?;
        response.await.map_err(|_| Error::DriverStopped)?
    }
}

#[async_trait]
impl Environment for CaravelEnv {
    async fn wait_mgmt_gpio(&mut self, level: Level) -> Result<()> {
        tracing::debug!(%level, cycle = self.cycle, "Waiting for mgmt_gpio");
        self.cycle = self
            .request(|reply| DriverRequest::WaitMgmtGpio { level, reply })
            .await?;
        tracing::debug!(%level, cycle = self.cycle, "mgmt_gpio reached");
        Ok(())
    }

    async fn release_csb(&mut self) -> Result<()> {
        self.cycle = self
            .request(|reply| DriverRequest::ReleaseCsb { reply })
            .await?;
        tracing::debug!(cycle = self.cycle, "CSB released");
        Ok(())
    }

    fn cycle(&self) -> u64 {
        self.cycle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::SimulationConfig;
    use crate::sim::{FirmwareOp, FirmwareProgram, SimEvent};

    #[tokio::test]
    async fn test_zero_timeout_rejected() {
        let err = test_configure(Dut::ram_word(), 0).await.err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_configure_runs_reset() {
        let dut = Dut::ram_word();
        let probe = dut.probe();
        let env = test_configure(dut, 500_000).await.unwrap();

        assert_eq!(env.cycle(), 20);
        assert_eq!(env.timeout_cycles(), 500_000);
        assert_eq!(probe.events(), vec![SimEvent::ResetReleased { cycle: 20 }]);
    }

    #[tokio::test]
    async fn test_timeout_shorter_than_reset() {
        let err = test_configure(Dut::ram_word(), 10).await.err().unwrap();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_wait_for_gpio_that_never_rises() {
        let dut = Dut::new(
            FirmwareProgram::new("silent", vec![FirmwareOp::MgmtGpioOutputEnable]),
            SimulationConfig::default(),
        );
        let mut env = test_configure(dut, 200).await.unwrap();

        let err = env.wait_mgmt_gpio(Level::High).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Simulation timed out after 200 cycles waiting for mgmt_gpio == 1"
        );
    }

    #[tokio::test]
    async fn test_release_csb_advances_one_cycle() {
        let dut = Dut::ram_word();
        let probe = dut.probe();
        let mut env = test_configure(dut, 500_000).await.unwrap();

        env.release_csb().await.unwrap();
        assert_eq!(env.cycle(), 21);
        assert!(probe
            .events()
            .contains(&SimEvent::CsbReleased { cycle: 20 }));
    }
}
