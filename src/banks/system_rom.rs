//! System ROM banks: Kernal, BASIC, Character ROM.
//!
//! Images are checked for their exact size when the bank is built, so a
//! bad dump fails before the machine runs a single cycle.  Writes to ROM
//! are ignored.  When no Kernal image is supplied a minimal stub is
//! installed: it sets up the stack and RAM vectors, then idles with IRQs
//! enabled.

use super::bank::Bank;
use crate::error::{Error, Result};

/// 6502 opcodes used in the stub ROM.
mod opc {
    pub const RTS: u8 = 0x60;
    pub const RTI: u8 = 0x40;
    pub const JMP_ABS: u8 = 0x4C;
    pub const JMP_IND: u8 = 0x6C;
    pub const NOP_ABS: u8 = 0x0C; // unofficial – 3-byte NOP
    pub const PHA: u8 = 0x48;
    pub const PLA: u8 = 0x68;
    pub const TXA: u8 = 0x8A;
    pub const TAX: u8 = 0xAA;
    pub const TYA: u8 = 0x98;
    pub const TAY: u8 = 0xA8;
    pub const TXS: u8 = 0x9A;
    pub const SEI: u8 = 0x78;
    pub const CLI: u8 = 0x58;
    pub const LDA_IMM: u8 = 0xA9;
    pub const LDX_IMM: u8 = 0xA2;
    pub const STA_ABS: u8 = 0x8D;
}

pub const KERNAL_SIZE: usize = 0x2000;
pub const BASIC_SIZE: usize = 0x2000;
pub const CHARGEN_SIZE: usize = 0x1000;

// ── Generic ROM helpers ───────────────────────────────────────

fn mask(size: usize, addr: u16) -> usize {
    (addr as usize) & (size - 1)
}

fn check_size(name: &'static str, data: &[u8], expected: usize) -> Result<()> {
    if data.len() != expected {
        return Err(Error::RomSize {
            name,
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

// ── Kernal ROM ($E000-$FFFF, 8 KB) ───────────────────────────

pub struct KernalRomBank {
    rom: Box<[u8; KERNAL_SIZE]>,
    reset_vector: [u8; 2], // backup of $FFFC/$FFFD
}

impl KernalRomBank {
    /// Build from an 8 KB image, or the stub when `None`.
    pub fn new(image: Option<&[u8]>) -> Result<Self> {
        let mut k = Self {
            rom: Box::new([opc::RTS; KERNAL_SIZE]),
            reset_vector: [0; 2],
        };
        match image {
            Some(data) => {
                check_size("kernal", data, KERNAL_SIZE)?;
                k.rom.copy_from_slice(data);
            }
            None => k.install_stub(),
        }
        k.reset_vector[0] = k.rom[mask(KERNAL_SIZE, 0xFFFC)];
        k.reset_vector[1] = k.rom[mask(KERNAL_SIZE, 0xFFFD)];
        Ok(k)
    }

    /// Restore the reset vector overwritten by `install_reset_hook`.
    pub fn reset(&mut self) {
        self.rom[mask(KERNAL_SIZE, 0xFFFC)] = self.reset_vector[0];
        self.rom[mask(KERNAL_SIZE, 0xFFFD)] = self.reset_vector[1];
    }

    /// Point the reset vector at `addr` until the next `reset`.
    pub fn install_reset_hook(&mut self, addr: u16) {
        let [lo, hi] = addr.to_le_bytes();
        self.rom[mask(KERNAL_SIZE, 0xFFFC)] = lo;
        self.rom[mask(KERNAL_SIZE, 0xFFFD)] = hi;
    }

    pub fn rom(&self) -> &[u8; KERNAL_SIZE] {
        &self.rom
    }

    fn set_bytes(&mut self, addr: u16, bytes: &[u8]) {
        let start = mask(KERNAL_SIZE, addr);
        self.rom[start..start + bytes.len()].copy_from_slice(bytes);
    }

    fn install_stub(&mut self) {
        // IRQ exit at $EA31
        self.set_bytes(0xEA31, &[opc::JMP_ABS, 0x7E, 0xEA]);
        self.set_bytes(
            0xEA7E,
            &[
                opc::NOP_ABS, 0x0D, 0xDC, // clear CIA1 IRQ latch
                opc::PLA, opc::TAY,
                opc::PLA, opc::TAX,
                opc::PLA,
                opc::RTI,
            ],
        );

        // RESET entry: stack, RAM vectors, then idle
        self.set_bytes(
            0xFCE2,
            &[
                opc::LDX_IMM, 0xFF,
                opc::TXS,
                opc::LDA_IMM, 0x31, opc::STA_ABS, 0x14, 0x03, // CINV = $EA31
                opc::LDA_IMM, 0xEA, opc::STA_ABS, 0x15, 0x03,
                opc::LDA_IMM, 0x47, opc::STA_ABS, 0x18, 0x03, // NMINV = $FE47
                opc::LDA_IMM, 0xFE, opc::STA_ABS, 0x19, 0x03,
                opc::CLI,
                opc::JMP_ABS, 0xFA, 0xFC, // $FCFA: JMP $FCFA
            ],
        );

        // NMI
        self.set_bytes(0xFE43, &[opc::SEI, opc::JMP_IND, 0x18, 0x03, opc::RTI]);

        // IRQ entry
        self.set_bytes(
            0xFF48,
            &[
                opc::PHA, opc::TXA, opc::PHA, opc::TYA, opc::PHA,
                opc::JMP_IND, 0x14, 0x03,
            ],
        );

        // Hardware vectors: NMI → $FE43, RESET → $FCE2, IRQ → $FF48
        self.set_bytes(0xFFFA, &[0x43, 0xFE, 0xE2, 0xFC, 0x48, 0xFF]);
    }
}

impl Bank for KernalRomBank {
    fn read(&mut self, address: u16) -> u8 {
        self.rom[mask(KERNAL_SIZE, address)]
    }

    fn write(&mut self, _address: u16, _value: u8) {}
}

// ── BASIC ROM ($A000-$BFFF, 8 KB) ────────────────────────────

pub struct BasicRomBank {
    rom: Box<[u8; BASIC_SIZE]>,
}

impl BasicRomBank {
    /// Build from an 8 KB image, or a block of RTS when `None`.
    pub fn new(image: Option<&[u8]>) -> Result<Self> {
        let mut b = Self {
            rom: Box::new([opc::RTS; BASIC_SIZE]),
        };
        if let Some(data) = image {
            check_size("basic", data, BASIC_SIZE)?;
            b.rom.copy_from_slice(data);
        }
        Ok(b)
    }
}

impl Bank for BasicRomBank {
    fn read(&mut self, address: u16) -> u8 {
        self.rom[mask(BASIC_SIZE, address)]
    }

    fn write(&mut self, _address: u16, _value: u8) {}
}

// ── Character ROM ($D000-$DFFF, 4 KB) ────────────────────────

pub struct CharacterRomBank {
    rom: Box<[u8; CHARGEN_SIZE]>,
}

impl CharacterRomBank {
    pub fn new(image: Option<&[u8]>) -> Result<Self> {
        let mut c = Self {
            rom: Box::new([0; CHARGEN_SIZE]),
        };
        if let Some(data) = image {
            check_size("chargen", data, CHARGEN_SIZE)?;
            c.rom.copy_from_slice(data);
        }
        Ok(c)
    }
}

impl Bank for CharacterRomBank {
    fn read(&mut self, address: u16) -> u8 {
        self.rom[mask(CHARGEN_SIZE, address)]
    }

    fn write(&mut self, _address: u16, _value: u8) {}
}
