//! Disconnected bus bank.
//!
//! Used for I/O pages with no device behind them ($DE00–$DFFF without a
//! cartridge).  Reads return the value left on the data bus by the last
//! access; writes go nowhere.

use super::bank::Bank;

pub struct DisconnectedBusBank {
    /// Returns the byte currently floating on the bus.
    last_read_byte_fn: Option<Box<dyn Fn() -> u8>>,
}

impl DisconnectedBusBank {
    pub fn new() -> Self {
        Self {
            last_read_byte_fn: None,
        }
    }

    pub fn set_last_read_byte_fn(&mut self, f: Box<dyn Fn() -> u8>) {
        self.last_read_byte_fn = Some(f);
    }
}

impl Default for DisconnectedBusBank {
    fn default() -> Self {
        Self::new()
    }
}

impl Bank for DisconnectedBusBank {
    fn read(&mut self, _address: u16) -> u8 {
        self.last_read_byte_fn.as_ref().map_or(0xFF, |f| f())
    }

    fn write(&mut self, _address: u16, _value: u8) {}
}
