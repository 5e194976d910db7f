//! Color RAM: 1 K × 4-bit SRAM ($D800-$DBFF).
//!
//! Only the low nibble is stored.  The upper nibble is not driven by the
//! chip and reads back whatever was last on the data bus.

use super::bank::Bank;

pub struct ColorRamBank {
    ram: [u8; 0x400],
    floating: Option<Box<dyn Fn() -> u8>>,
}

impl ColorRamBank {
    pub fn new() -> Self {
        Self {
            ram: [0; 0x400],
            floating: None,
        }
    }

    pub fn reset(&mut self) {
        self.ram.fill(0);
    }

    /// Source for the undriven upper nibble.
    pub fn set_floating_bus_fn(&mut self, f: Box<dyn Fn() -> u8>) {
        self.floating = Some(f);
    }
}

impl Default for ColorRamBank {
    fn default() -> Self {
        Self::new()
    }
}

impl Bank for ColorRamBank {
    fn read(&mut self, address: u16) -> u8 {
        let upper = self.floating.as_ref().map_or(0, |f| f() & 0xF0);
        upper | self.ram[(address & 0x3FF) as usize]
    }

    fn write(&mut self, address: u16, value: u8) {
        self.ram[(address & 0x3FF) as usize] = value & 0x0F;
    }
}
