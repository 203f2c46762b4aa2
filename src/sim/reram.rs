//! ReRAM user project model
//!
//! The user project exposes one Wishbone register. Writing it issues a
//! command to the array; reading it returns the byte latched by the last
//! read command.
//!
//! Command word layout:
//!
//! ```text
//!  31 30 | 29 .. 25 | 24 .. 20 | 19 .. 0
//!  mode  |   row    |  column  |  data (cell stores [7:0])
//! ```

use serde::Serialize;

/// Wishbone address of the command/data register
pub const RERAM_REG_ADDR: u32 = 0x3000_000C;

/// Rows and columns in the array
pub const RERAM_DIM: usize = 32;

const FIELD_MASK: u32 = 0x1F;
const DATA_MASK: u32 = 0xF_FFFF;

/// Operation selected by bits [31:30]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandMode {
    Idle,
    Read,
    Reserved,
    Program,
}

impl CommandMode {
    fn from_bits(bits: u32) -> Self {
        match bits & 0x3 {
            0b00 => Self::Idle,
            0b01 => Self::Read,
            0b10 => Self::Reserved,
            _ => Self::Program,
        }
    }

    fn bits(self) -> u32 {
        match self {
            Self::Idle => 0b00,
            Self::Read => 0b01,
            Self::Reserved => 0b10,
            Self::Program => 0b11,
        }
    }
}

/// A decoded command word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub mode: CommandMode,
    pub row: u8,
    pub col: u8,
    pub data: u32,
}

impl Command {
    pub fn program(row: u8, col: u8, data: u32) -> Self {
        Self::new(CommandMode::Program, row, col, data)
    }

    pub fn read(row: u8, col: u8) -> Self {
        Self::new(CommandMode::Read, row, col, 0)
    }

    /// Fields wider than their slot are truncated (row/col wrap at 32).
    pub fn new(mode: CommandMode, row: u8, col: u8, data: u32) -> Self {
        Self {
            mode,
            row: (u32::from(row) & FIELD_MASK) as u8,
            col: (u32::from(col) & FIELD_MASK) as u8,
            data: data & DATA_MASK,
        }
    }

    pub fn decode(word: u32) -> Self {
        Self {
            mode: CommandMode::from_bits(word >> 30),
            row: ((word >> 25) & FIELD_MASK) as u8,
            col: ((word >> 20) & FIELD_MASK) as u8,
            data: word & DATA_MASK,
        }
    }

    pub fn encode(&self) -> u32 {
        (self.mode.bits() << 30)
            | ((u32::from(self.row) & FIELD_MASK) << 25)
            | ((u32::from(self.col) & FIELD_MASK) << 20)
            | (self.data & DATA_MASK)
    }
}

/// The 32x32 byte array behind the register
#[derive(Debug, Clone)]
pub struct ReramArray {
    cells: [[u8; RERAM_DIM]; RERAM_DIM],
    read_latch: u32,
}

impl Default for ReramArray {
    fn default() -> Self {
        Self::new()
    }
}

impl ReramArray {
    pub fn new() -> Self {
        Self {
            cells: [[0; RERAM_DIM]; RERAM_DIM],
            read_latch: 0,
        }
    }

    /// Handle a bus write to the command register
    pub fn write(&mut self, word: u32) {
        let cmd = Command::decode(word);
        let (row, col) = (cmd.row as usize, cmd.col as usize);
        match cmd.mode {
            CommandMode::Program => {
                self.cells[row][col] = (cmd.data & 0xFF) as u8;
                tracing::trace!(row, col, data = cmd.data & 0xFF, "ReRAM program");
            }
            CommandMode::Read => {
                self.read_latch = u32::from(self.cells[row][col]);
                tracing::trace!(row, col, data = self.read_latch, "ReRAM read");
            }
            CommandMode::Idle | CommandMode::Reserved => {}
        }
    }

    /// Handle a bus read of the command register
    pub fn read(&self) -> u32 {
        self.read_latch
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<u8> {
        self.cells.get(row).and_then(|r| r.get(col)).copied()
    }
}
