//! I/O region router ($D000–$DFFF).
//!
//! The 4 KB I/O area is divided into 16 × 256-byte pages, each routed to
//! whichever chip is plugged in there (VIC-II, SID, Color RAM, CIA1,
//! CIA2, IO1, IO2).  The chips are owned by their models; the router
//! only keeps `Weak` handles.  Empty pages, or pages whose chip has been
//! dropped, fall back to the disconnected bus.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::bank::{Bank, BankRef};
use super::disconnected_bus::DisconnectedBusBank;

pub const IO_PAGES: usize = 16;

pub struct IoBank {
    map: [Option<Weak<RefCell<dyn Bank>>>; IO_PAGES],
    disconnected: DisconnectedBusBank,
}

impl IoBank {
    pub fn new(disconnected: DisconnectedBusBank) -> Self {
        Self {
            map: Default::default(),
            disconnected,
        }
    }

    /// Route `$Dp00-$DpFF` to `bank`.
    pub fn set_bank(&mut self, page: usize, bank: &BankRef) {
        assert!(page < IO_PAGES, "I/O page {page} out of range");
        self.map[page] = Some(Rc::downgrade(bank));
    }

    /// Return a page to the disconnected bus.
    pub fn clear_bank(&mut self, page: usize) {
        assert!(page < IO_PAGES, "I/O page {page} out of range");
        self.map[page] = None;
    }

    /// The live bank routed at `page`, if any.
    pub fn get_bank(&self, page: usize) -> Option<BankRef> {
        self.map.get(page)?.as_ref()?.upgrade()
    }

    fn dispatch(&self, address: u16) -> Option<BankRef> {
        self.get_bank(((address >> 8) & 0x0F) as usize)
    }
}

impl Bank for IoBank {
    fn read(&mut self, address: u16) -> u8 {
        match self.dispatch(address) {
            Some(bank) => bank.borrow_mut().read(address),
            None => self.disconnected.read(address),
        }
    }

    fn write(&mut self, address: u16, value: u8) {
        match self.dispatch(address) {
            Some(bank) => bank.borrow_mut().write(address, value),
            None => self.disconnected.write(address, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::banks::ColorRamBank;

    #[test]
    fn test_routes_by_page() {
        let color: BankRef = Rc::new(RefCell::new(ColorRamBank::new()));
        let mut io = IoBank::new(DisconnectedBusBank::new());
        for page in 0x8..=0xB {
            io.set_bank(page, &color);
        }
        io.write(0xD9FF, 0x07);
        assert_eq!(io.read(0xD9FF), 0x07);
        assert_eq!(color.borrow_mut().read(0xD9FF), 0x07);
    }

    #[test]
    fn test_empty_and_dropped_pages_float() {
        let mut bus = DisconnectedBusBank::new();
        bus.set_last_read_byte_fn(Box::new(|| 0x42));
        let mut io = IoBank::new(bus);
        assert_eq!(io.read(0xDE00), 0x42);

        let color: BankRef = Rc::new(RefCell::new(ColorRamBank::new()));
        io.set_bank(0x8, &color);
        assert!(io.get_bank(0x8).is_some());
        drop(color);
        assert!(io.get_bank(0x8).is_none());
        assert_eq!(io.read(0xD800), 0x42);
    }
}
