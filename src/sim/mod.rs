//! Cycle-based simulation of the device under test
//!
//! The design is a management core running a firmware program, a
//! management GPIO pad, the CSB pad, and a ReRAM user project on the
//! Wishbone bus. A driver task owns the design and advances it only while
//! answering environment requests, so runs are deterministic.

mod design;
pub(crate) mod driver;
pub mod firmware;
pub mod reram;

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::common::config::SimulationConfig;
use crate::common::Error;

pub use design::Design;
pub use firmware::{FirmwareOp, FirmwareProgram};

/// Logical value of a single-bit line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Level {
    Low,
    High,
}

impl TryFrom<u8> for Level {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Low),
            1 => Ok(Self::High),
            other => Err(Error::InvalidLevel(other)),
        }
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> u8 {
        match level {
            Level::Low => 0,
            Level::High => 1,
        }
    }
}

impl From<bool> for Level {
    fn from(value: bool) -> Self {
        if value {
            Self::High
        } else {
            Self::Low
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}

/// Something observable that happened in the design
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SimEvent {
    ResetReleased { cycle: u64 },
    MgmtGpio { cycle: u64, level: Level },
    CsbReleased { cycle: u64 },
    WbWrite { cycle: u64, addr: u32, data: u32 },
    WbRead { cycle: u64, addr: u32, data: u32 },
    FirmwareHalted { cycle: u64 },
}

impl SimEvent {
    pub fn cycle(&self) -> u64 {
        match self {
            Self::ResetReleased { cycle }
            | Self::MgmtGpio { cycle, .. }
            | Self::CsbReleased { cycle }
            | Self::WbWrite { cycle, .. }
            | Self::WbRead { cycle, .. }
            | Self::FirmwareHalted { cycle } => *cycle,
        }
    }
}

/// Shared view of a running simulation
///
/// Only the driver writes; the harness reads it after the test finishes.
#[derive(Debug, Clone, Default)]
pub struct SimProbe {
    inner: Arc<ProbeInner>,
}

#[derive(Debug, Default)]
struct ProbeInner {
    cycle: AtomicU64,
    events: Mutex<Vec<SimEvent>>,
}

impl SimProbe {
    pub fn cycle(&self) -> u64 {
        self.inner.cycle.load(Ordering::Acquire)
    }

    pub fn events(&self) -> Vec<SimEvent> {
        self.inner
            .events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub(crate) fn set_cycle(&self, cycle: u64) {
        self.inner.cycle.store(cycle, Ordering::Release);
    }

    pub(crate) fn record(&self, event: SimEvent) {
        tracing::debug!(?event, "sim event");
        if let Ok(mut events) = self.inner.events.lock() {
            events.push(event);
        }
    }
}

/// Handle to the device under test, consumed by `test_configure`
#[derive(Debug)]
pub struct Dut {
    pub(crate) program: FirmwareProgram,
    pub(crate) config: SimulationConfig,
    pub(crate) probe: SimProbe,
}

impl Dut {
    pub fn new(program: FirmwareProgram, config: SimulationConfig) -> Self {
        Self {
            program,
            config,
            probe: SimProbe::default(),
        }
    }

    /// The design running the ram_word firmware with default settings
    pub fn ram_word() -> Self {
        Self::new(FirmwareProgram::ram_word(), SimulationConfig::default())
    }

    pub fn program(&self) -> &FirmwareProgram {
        &self.program
    }

    pub fn clock_period_ns(&self) -> u64 {
        self.config.clock_period_ns
    }

    /// Probe that stays readable after the DUT is handed to a test
    pub fn probe(&self) -> SimProbe {
        self.probe.clone()
    }
}
