//! The `Bank` trait: read/write interface for every memory-mapped device.

use std::cell::RefCell;
use std::rc::Rc;

/// Every memory-mapped device implements this trait.
///
/// Reads take `&mut self` because real chips have read side effects
/// (CIA interrupt acknowledge, CPU-port bit fall-off).
pub trait Bank {
    /// Read the byte at `address`.
    fn read(&mut self, address: u16) -> u8;

    /// Write `value` to `address`.
    fn write(&mut self, address: u16, value: u8);
}

/// Shared handle to a bank.  The chip model owns it; dispatch tables
/// only keep `Weak` copies.
pub type BankRef = Rc<RefCell<dyn Bank>>;
