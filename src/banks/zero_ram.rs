//! Zero-page RAM bank with 6510 on-chip port ($00 / $01) emulation.
//!
//! Addresses $00 (data direction) and $01 (data port) control the PLA
//! banking lines LORAM / HIRAM / CHAREN.  Bits 6 & 7 of the data port
//! are unconnected on the 6510 and exhibit a capacitor-like fall-off from
//! 1→0 once they stop being driven.  Everything else in the page goes
//! straight to system RAM, and writes to $00/$01 also land in RAM.

use std::cell::RefCell;
use std::rc::Rc;

use super::bank::Bank;
use super::system_ram::SystemRamBank;
use crate::event::{EventClock, EventScheduler, Phase};

// ── Data-bit fall-off emulation ───────────────────────────────

/// Fall-off time in PHI2 cycles for a 6510 (~350 ms at ~1 MHz).
const FALL_OFF_CYCLES: EventClock = 350_000;

struct DataBit {
    data_set_clk: EventClock,
    is_falling_off: bool,
    data_set: u8,
    bit_mask: u8,
}

impl DataBit {
    fn new(bit: u8) -> Self {
        Self {
            data_set_clk: 0,
            is_falling_off: false,
            data_set: 0,
            bit_mask: 1 << bit,
        }
    }

    fn reset(&mut self) {
        self.is_falling_off = false;
        self.data_set = 0;
    }

    fn read(&mut self, phi2_time: EventClock) -> u8 {
        if self.is_falling_off && self.data_set_clk < phi2_time {
            self.reset();
        }
        self.data_set
    }

    fn write(&mut self, phi2_time: EventClock, value: u8) {
        self.data_set_clk = phi2_time + FALL_OFF_CYCLES;
        self.data_set = value & self.bit_mask;
        self.is_falling_off = true;
    }
}

// ── ZeroRamBank ───────────────────────────────────────────────

/// Callback so the bank can tell the PLA about port changes.
/// Receives the 3-bit PLA state (LORAM | HIRAM | CHAREN).
pub type CpuPortCallback = Box<dyn FnMut(u8)>;

pub struct ZeroRamBank {
    scheduler: Rc<EventScheduler>,
    ram: Rc<RefCell<SystemRamBank>>,

    /// Direction register ($00).
    dir: u8,
    /// Data register ($01).
    data: u8,
    /// Computed value that reads back from $01.
    data_read: u8,
    /// Current state of the port pins.
    proc_port_pins: u8,

    bit6: DataBit,
    bit7: DataBit,

    on_port_change: Option<CpuPortCallback>,
}

impl ZeroRamBank {
    pub fn new(scheduler: Rc<EventScheduler>, ram: Rc<RefCell<SystemRamBank>>) -> Self {
        Self {
            scheduler,
            ram,
            dir: 0,
            data: 0x3F,
            data_read: 0x3F,
            proc_port_pins: 0x3F,
            bit6: DataBit::new(6),
            bit7: DataBit::new(7),
            on_port_change: None,
        }
    }

    /// Wire up the callback that feeds PLA state to the memory map.
    pub fn set_port_callback(&mut self, cb: CpuPortCallback) {
        self.on_port_change = Some(cb);
    }

    pub fn reset(&mut self) {
        self.bit6.reset();
        self.bit7.reset();
        self.dir = 0;
        self.data = 0x3F;
        self.data_read = 0x3F;
        self.proc_port_pins = 0x3F;
        self.update_cpu_port();
    }

    fn phi2_time(&self) -> EventClock {
        self.scheduler.get_time(Phase::Phi2)
    }

    fn update_cpu_port(&mut self) {
        self.proc_port_pins = (self.proc_port_pins & !self.dir) | (self.data & self.dir);
        self.data_read = (self.data | !self.dir) & (self.proc_port_pins | 0x17);

        let pla_state = (self.data | !self.dir) & 0x07;

        if (self.dir & 0x20) == 0 {
            self.data_read &= !0x20;
        }

        if let Some(ref mut cb) = self.on_port_change {
            cb(pla_state);
        }
    }
}

impl Bank for ZeroRamBank {
    fn read(&mut self, address: u16) -> u8 {
        match address {
            0 => self.dir,
            1 => {
                let mut retval = self.data_read;
                let t = self.phi2_time();
                if (self.dir & 0x40) == 0 {
                    retval &= !0x40;
                    retval |= self.bit6.read(t);
                }
                if (self.dir & 0x80) == 0 {
                    retval &= !0x80;
                    retval |= self.bit7.read(t);
                }
                retval
            }
            _ => self.ram.borrow_mut().read(address),
        }
    }

    fn write(&mut self, address: u16, value: u8) {
        match address {
            0 => {
                if self.dir != value {
                    let t = self.phi2_time();
                    if (self.dir & 0x40) != 0 && (value & 0x40) == 0 {
                        self.bit6.write(t, self.data);
                    }
                    if (self.dir & 0x80) != 0 && (value & 0x80) == 0 {
                        self.bit7.write(t, self.data);
                    }
                    self.dir = value;
                    self.update_cpu_port();
                }
            }
            1 => {
                let t = self.phi2_time();
                if self.dir & 0x40 != 0 {
                    self.bit6.write(t, value);
                }
                if self.dir & 0x80 != 0 {
                    self.bit7.write(t, value);
                }
                if self.data != value {
                    self.data = value;
                    self.update_cpu_port();
                }
            }
            _ => {}
        }
        self.ram.borrow_mut().write(address, value);
    }
}
