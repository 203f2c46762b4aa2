//! Management-core firmware programs
//!
//! A program is a flat list of operations interpreted one at a time by the
//! simulated management core. Programs can be loaded from YAML:
//!
//! ```yaml
//! name: gpio_toggle
//! ops:
//!   - op: mgmt_gpio_output_enable
//!   - op: mgmt_gpio_write
//!     level: 1
//!   - op: delay
//!     cycles: 100
//!   - op: mgmt_gpio_write
//!     level: 0
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::common::{Error, Result};

use super::reram::{Command, RERAM_REG_ADDR};
use super::Level;

/// Cycles the ram_word firmware spends configuring the user GPIOs
const RAM_WORD_GPIO_CONFIG_CYCLES: u64 = 4_000;

/// A single firmware operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FirmwareOp {
    /// Drive the management GPIO pad from the core
    MgmtGpioOutputEnable,
    /// Write the management GPIO output register
    MgmtGpioWrite { level: Level },
    /// Configure and load all user GPIO pads
    ConfigureGpios { cycles: u64 },
    /// Enable the Wishbone interface to the user project
    EnableUserInterface,
    /// Wishbone write
    WbWrite { addr: u32, data: u32 },
    /// Wishbone read; the value is recorded as a simulation event
    WbRead { addr: u32 },
    /// Busy loop
    Delay { cycles: u64 },
    /// Poll until the testbench stops driving CSB
    WaitCsbRelease,
}

/// An ordered firmware program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareProgram {
    pub name: String,
    pub ops: Vec<FirmwareOp>,
}

impl FirmwareProgram {
    pub fn new(name: impl Into<String>, ops: Vec<FirmwareOp>) -> Self {
        Self {
            name: name.into(),
            ops,
        }
    }

    /// Firmware for the ram_word test: signal ready on the management GPIO,
    /// program and read back two cells, then signal done.
    pub fn ram_word() -> Self {
        let write = |data: u32| FirmwareOp::WbWrite {
            addr: RERAM_REG_ADDR,
            data,
        };
        let read = FirmwareOp::WbRead {
            addr: RERAM_REG_ADDR,
        };

        Self::new(
            "ram_word",
            vec![
                FirmwareOp::MgmtGpioOutputEnable,
                FirmwareOp::MgmtGpioWrite { level: Level::Low },
                FirmwareOp::ConfigureGpios {
                    cycles: RAM_WORD_GPIO_CONFIG_CYCLES,
                },
                FirmwareOp::EnableUserInterface,
                FirmwareOp::MgmtGpioWrite { level: Level::High },
                write(Command::program(1, 1, 0xFF).encode()),
                write(Command::read(1, 1).encode()),
                FirmwareOp::Delay { cycles: 300 },
                read.clone(),
                write(Command::program(5, 4, 0).encode()),
                write(Command::read(5, 4).encode()),
                write(Command::read(1, 1).encode()),
                FirmwareOp::Delay { cycles: 900 },
                read.clone(),
                read,
                FirmwareOp::MgmtGpioWrite { level: Level::Low },
            ],
        )
    }

    /// Load a program from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::from_yaml(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse firmware program: {}", e)))
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| Error::Internal(format!("Failed to serialize firmware program: {}", e)))
    }
}
