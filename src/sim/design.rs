//! Cycle stepping for the simulated design

use std::ops::RangeInclusive;

use super::firmware::{FirmwareOp, FirmwareProgram};
use super::reram::{ReramArray, RERAM_REG_ADDR};
use super::{Level, SimEvent, SimProbe};

/// Wishbone window routed to the user project
const USER_AREA: RangeInclusive<u32> = 0x3000_0000..=0x7FFF_FFFF;

/// Cycles for one Wishbone access, including the ack
const WB_ACCESS_CYCLES: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CpuState {
    Reset { remaining: u64 },
    Running,
    Halted,
}

/// The full simulated chip
pub struct Design {
    cycle: u64,
    program: FirmwareProgram,
    pc: usize,
    busy: u64,
    cpu: CpuState,
    gpio_output_enabled: bool,
    gpio_out: Level,
    csb_driven: bool,
    user_interface_enabled: bool,
    reram: ReramArray,
    probe: SimProbe,
}

impl Design {
    /// Power on with the core held in reset for `reset_cycles`
    pub fn new(program: FirmwareProgram, reset_cycles: u64, probe: SimProbe) -> Self {
        Self {
            cycle: 0,
            program,
            pc: 0,
            busy: 0,
            cpu: CpuState::Reset {
                remaining: reset_cycles,
            },
            gpio_output_enabled: false,
            gpio_out: Level::Low,
            csb_driven: true,
            user_interface_enabled: false,
            reram: ReramArray::new(),
            probe,
        }
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn in_reset(&self) -> bool {
        matches!(self.cpu, CpuState::Reset { .. })
    }

    pub fn halted(&self) -> bool {
        self.cpu == CpuState::Halted
    }

    /// Value seen on the management GPIO pad
    pub fn mgmt_gpio(&self) -> Level {
        if self.gpio_output_enabled {
            self.gpio_out
        } else {
            Level::Low
        }
    }

    pub fn csb_released(&self) -> bool {
        !self.csb_driven
    }

    pub fn reram(&self) -> &ReramArray {
        &self.reram
    }

    /// Stop driving CSB from the testbench side
    pub fn release_csb(&mut self) {
        if self.csb_driven {
            self.csb_driven = false;
            self.probe.record(SimEvent::CsbReleased { cycle: self.cycle });
        }
    }

    /// Advance one clock cycle
    pub fn step(&mut self) {
        self.cycle += 1;
        self.probe.set_cycle(self.cycle);

        match self.cpu {
            CpuState::Reset { remaining } => {
                if remaining <= 1 {
                    self.cpu = CpuState::Running;
                    self.probe
                        .record(SimEvent::ResetReleased { cycle: self.cycle });
                } else {
                    self.cpu = CpuState::Reset {
                        remaining: remaining - 1,
                    };
                }
            }
            CpuState::Halted => {}
            CpuState::Running => {
                if self.busy > 0 {
                    self.busy -= 1;
                } else {
                    self.execute();
                }
            }
        }
    }

    fn execute(&mut self) {
        let Some(op) = self.program.ops.get(self.pc).cloned() else {
            self.cpu = CpuState::Halted;
            self.probe
                .record(SimEvent::FirmwareHalted { cycle: self.cycle });
            return;
        };

        let pad_before = self.mgmt_gpio();

        let cost = match op {
            FirmwareOp::MgmtGpioOutputEnable => {
                self.gpio_output_enabled = true;
                1
            }
            FirmwareOp::MgmtGpioWrite { level } => {
                self.gpio_out = level;
                1
            }
            FirmwareOp::ConfigureGpios { cycles } => cycles.max(1),
            FirmwareOp::EnableUserInterface => {
                self.user_interface_enabled = true;
                1
            }
            FirmwareOp::WbWrite { addr, data } => {
                if !self.bus_acks(addr) {
                    return;
                }
                if addr == RERAM_REG_ADDR {
                    self.reram.write(data);
                }
                self.probe.record(SimEvent::WbWrite {
                    cycle: self.cycle,
                    addr,
                    data,
                });
                WB_ACCESS_CYCLES
            }
            FirmwareOp::WbRead { addr } => {
                if !self.bus_acks(addr) {
                    return;
                }
                let data = if addr == RERAM_REG_ADDR {
                    self.reram.read()
                } else {
                    0
                };
                self.probe.record(SimEvent::WbRead {
                    cycle: self.cycle,
                    addr,
                    data,
                });
                WB_ACCESS_CYCLES
            }
            FirmwareOp::Delay { cycles } => cycles.max(1),
            FirmwareOp::WaitCsbRelease => {
                if self.csb_driven {
                    return;
                }
                1
            }
        };

        let pad_after = self.mgmt_gpio();
        if pad_after != pad_before {
            self.probe.record(SimEvent::MgmtGpio {
                cycle: self.cycle,
                level: pad_after,
            });
        }

        self.pc += 1;
        self.busy = cost - 1;
    }

    /// A user-area access without the interface enabled never gets an ack,
    /// so the core stays on the same instruction.
    fn bus_acks(&self, addr: u32) -> bool {
        !USER_AREA.contains(&addr) || self.user_interface_enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::reram::Command;

    fn run(design: &mut Design, cycles: u64) {
        for _ in 0..cycles {
            design.step();
        }
    }

    fn design(ops: Vec<FirmwareOp>, reset_cycles: u64) -> (Design, SimProbe) {
        let probe = SimProbe::default();
        let design = Design::new(FirmwareProgram::new("t", ops), reset_cycles, probe.clone());
        (design, probe)
    }

    #[test]
    fn test_reset_holds_core() {
        let (mut d, probe) = design(vec![FirmwareOp::MgmtGpioOutputEnable], 5);
        run(&mut d, 4);
        assert!(d.in_reset());
        d.step();
        assert!(!d.in_reset());
        assert_eq!(probe.events(), vec![SimEvent::ResetReleased { cycle: 5 }]);
    }

    #[test]
    fn test_gpio_needs_output_enable() {
        let (mut d, _) = design(
            vec![
                FirmwareOp::MgmtGpioWrite { level: Level::High },
                FirmwareOp::MgmtGpioOutputEnable,
            ],
            1,
        );
        run(&mut d, 2);
        assert_eq!(d.mgmt_gpio(), Level::Low);
        d.step();
        assert_eq!(d.mgmt_gpio(), Level::High);
    }

    #[test]
    fn test_halts_after_last_op() {
        let (mut d, probe) = design(vec![FirmwareOp::Delay { cycles: 3 }], 1);
        run(&mut d, 4);
        assert!(!d.halted());
        d.step();
        assert!(d.halted());
        assert_eq!(
            probe.events().last(),
            Some(&SimEvent::FirmwareHalted { cycle: 5 })
        );
    }

    #[test]
    fn test_user_bus_stalls_without_interface() {
        let (mut d, probe) = design(
            vec![FirmwareOp::WbWrite {
                addr: RERAM_REG_ADDR,
                data: Command::program(0, 0, 0x5A).encode(),
            }],
            1,
        );
        run(&mut d, 1_000);
        assert!(!d.halted());
        assert_eq!(d.reram().cell(0, 0), Some(0));
        assert_eq!(probe.events().len(), 1);
    }

    #[test]
    fn test_non_user_bus_acks_without_interface() {
        let (mut d, probe) = design(vec![FirmwareOp::WbRead { addr: 0x2600_0000 }], 1);
        run(&mut d, 10);
        assert!(d.halted());
        assert!(probe.events().contains(&SimEvent::WbRead {
            cycle: 2,
            addr: 0x2600_0000,
            data: 0
        }));
    }

    #[test]
    fn test_wait_csb_release_blocks_until_released() {
        let (mut d, _) = design(
            vec![
                FirmwareOp::MgmtGpioOutputEnable,
                FirmwareOp::WaitCsbRelease,
                FirmwareOp::MgmtGpioWrite { level: Level::High },
            ],
            1,
        );
        run(&mut d, 100);
        assert_eq!(d.mgmt_gpio(), Level::Low);

        d.release_csb();
        d.release_csb();
        assert!(d.csb_released());
        run(&mut d, 2);
        assert_eq!(d.mgmt_gpio(), Level::High);
    }

    #[test]
    fn test_ram_word_reads_back_programmed_byte() {
        let probe = SimProbe::default();
        let mut d = Design::new(FirmwareProgram::ram_word(), 20, probe.clone());
        run(&mut d, 10_000);
        assert!(d.halted());
        assert_eq!(d.mgmt_gpio(), Level::Low);

        let reads: Vec<u32> = probe
            .events()
            .iter()
            .filter_map(|e| match e {
                SimEvent::WbRead { data, .. } => Some(*data),
                _ => None,
            })
            .collect();
        assert_eq!(reads, vec![0xFF, 0xFF, 0xFF]);
        assert_eq!(d.reram().cell(5, 4), Some(0));
    }
}
