//! Per-instruction observation hooks.

use std::fmt;

use super::opcodes::{decode, Mode};
use super::status::Status;
use crate::event::EventClock;

/// Register snapshot handed to a [`Disassembler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuState {
    pub pc: u16,
    pub opcode: u8,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub p: Status,
}

impl fmt::Display for CpuState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (op, mode) = decode(self.opcode);
        let mode = match mode {
            Mode::Implied => "",
            Mode::Accumulator => " A",
            Mode::Immediate => " #imm",
            Mode::ZeroPage => " zp",
            Mode::ZeroPageX => " zp,X",
            Mode::ZeroPageY => " zp,Y",
            Mode::Absolute => " abs",
            Mode::AbsoluteX => " abs,X",
            Mode::AbsoluteY => " abs,Y",
            Mode::Indirect => " (abs)",
            Mode::IndirectX => " (zp,X)",
            Mode::IndirectY => " (zp),Y",
            Mode::Relative => " rel",
        };
        let mnemonic = format!("{}{mode}", op.mnemonic());
        write!(
            f,
            "${:04X}  {:02X}  {:<12} A={:02X} X={:02X} Y={:02X} SP={:02X} {}",
            self.pc, self.opcode, mnemonic, self.a, self.x, self.y, self.sp, self.p
        )
    }
}

/// Observer called by the CPU.  `instruction` runs right after each
/// opcode fetch with `pc` pointing at the opcode; `interrupt` runs when
/// the CPU starts acknowledging RST, NMI or IRQ instead.
pub trait Disassembler {
    fn instruction(&mut self, cycle: EventClock, state: &CpuState);

    fn interrupt(&mut self, _cycle: EventClock, _state: &CpuState) {}
}

/// Writes every instruction to the `trace` log level.
#[derive(Debug, Default)]
pub struct TraceLogger {
    count: u64,
}

impl TraceLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instructions seen so far.
    pub fn count(&self) -> u64 {
        self.count
    }
}

impl Disassembler for TraceLogger {
    fn instruction(&mut self, cycle: EventClock, state: &CpuState) {
        self.count += 1;
        log::trace!("[cpu] {cycle:>10} {state}");
    }

    fn interrupt(&mut self, cycle: EventClock, state: &CpuState) {
        log::trace!("[cpu] {cycle:>10} ---- interrupt (pc=${:04X})", state.pc);
    }
}
