//! C64 MMU: the CPU-side memory map and the PLA that drives it.
//!
//! `MemoryMap` resolves every CPU address to a bank through page tables
//! of 16 × 4 KB or 64 × 1 KB entries, one table for reads and one for
//! writes so ROM can shadow RAM.  The tables hold `Weak` handles; the
//! chips own their banks.  Whatever was last driven on the data bus is
//! remembered and returned for unmapped pages.
//!
//! `Pla` applies the C64 banking rules: pages A–B, D and E–F switch
//! between RAM, ROM and I/O based on the LORAM / HIRAM / CHAREN signals
//! from the CPU port and the EXROM / GAME cartridge lines.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::banks::{Bank, BankRef};
use crate::mos6510::CpuBus;

// ── MemoryMap ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSize {
    /// 16 pages of 4 KB.
    Kb4,
    /// 64 pages of 1 KB.
    Kb1,
}

impl PageSize {
    fn shift(self) -> u32 {
        match self {
            Self::Kb4 => 12,
            Self::Kb1 => 10,
        }
    }
}

type PageTable = Vec<Option<Weak<RefCell<dyn Bank>>>>;

pub struct MemoryMap {
    shift: u32,
    read_table: RefCell<PageTable>,
    write_table: RefCell<PageTable>,
    last_value: Cell<u8>,
}

impl MemoryMap {
    pub fn new(page_size: PageSize) -> Self {
        let shift = page_size.shift();
        let pages = 0x1_0000 >> shift;
        Self {
            shift,
            read_table: RefCell::new(vec![None; pages]),
            write_table: RefCell::new(vec![None; pages]),
            last_value: Cell::new(0xFF),
        }
    }

    pub fn page_count(&self) -> usize {
        0x1_0000 >> self.shift
    }

    pub fn page_of(&self, address: u16) -> usize {
        (address >> self.shift) as usize
    }

    // ── Mapping ────────────────────────────────────────────────

    /// Route reads and writes of `page` to `bank`.
    pub fn map(&self, page: usize, bank: &BankRef) {
        self.map_read(page, bank);
        self.map_write(page, bank);
    }

    pub fn map_read(&self, page: usize, bank: &BankRef) {
        Self::set(&self.read_table, page, Some(Rc::downgrade(bank)));
    }

    pub fn map_write(&self, page: usize, bank: &BankRef) {
        Self::set(&self.write_table, page, Some(Rc::downgrade(bank)));
    }

    /// Leave `page` open: reads float, writes are lost.
    pub fn unmap(&self, page: usize) {
        Self::set(&self.read_table, page, None);
        Self::set(&self.write_table, page, None);
    }

    fn set(table: &RefCell<PageTable>, page: usize, entry: Option<Weak<RefCell<dyn Bank>>>) {
        let mut table = table.borrow_mut();
        let len = table.len();
        let slot = table
            .get_mut(page)
            .unwrap_or_else(|| panic!("page {page} out of range (map has {len} pages)"));
        *slot = entry;
    }

    /// The bank answering reads of `page`, if it is mapped and alive.
    pub fn read_bank(&self, page: usize) -> Option<BankRef> {
        self.read_table.borrow().get(page)?.as_ref()?.upgrade()
    }

    /// The bank taking writes to `page`, if it is mapped and alive.
    pub fn write_bank(&self, page: usize) -> Option<BankRef> {
        self.write_table.borrow().get(page)?.as_ref()?.upgrade()
    }

    // ── Access ─────────────────────────────────────────────────

    /// The table borrow is released before the bank runs, so a bank may
    /// remap the table from inside its own access.
    pub fn read(&self, address: u16) -> u8 {
        match self.read_bank(self.page_of(address)) {
            Some(bank) => {
                let value = bank.borrow_mut().read(address);
                self.last_value.set(value);
                value
            }
            None => self.last_value.get(),
        }
    }

    pub fn write(&self, address: u16, value: u8) {
        self.last_value.set(value);
        if let Some(bank) = self.write_bank(self.page_of(address)) {
            bank.borrow_mut().write(address, value);
        }
    }

    /// Last byte driven on the data bus.
    pub fn last_value(&self) -> u8 {
        self.last_value.get()
    }
}

impl CpuBus for Rc<MemoryMap> {
    fn cpu_read(&mut self, address: u16) -> u8 {
        self.read(address)
    }

    fn cpu_write(&mut self, address: u16, value: u8) {
        self.write(address, value);
    }
}

// ── PLA ───────────────────────────────────────────────────────

/// Banks the PLA switches between.
pub struct PlaBanks {
    pub zero_ram: BankRef,
    pub ram: BankRef,
    pub basic: BankRef,
    pub kernal: BankRef,
    pub chargen: BankRef,
    pub io: BankRef,
}

pub struct Pla {
    map: Rc<MemoryMap>,
    banks: PlaBanks,

    loram: bool,
    hiram: bool,
    charen: bool,
    /// EXROM line state: true = high = no cartridge ROM at $8000.
    exrom: bool,
    /// GAME line state: true = high; low with EXROM high = Ultimax mode.
    game: bool,
}

impl Pla {
    /// `map` must use `PageSize::Kb4`.
    pub fn new(map: Rc<MemoryMap>, banks: PlaBanks) -> Self {
        assert_eq!(map.page_count(), 16, "the PLA drives a 4 KB page map");
        let mut pla = Self {
            map,
            banks,
            loram: true,
            hiram: true,
            charen: true,
            exrom: true,
            game: true,
        };
        pla.update_mapping();
        pla
    }

    /// Port lines high (all inputs), no cartridge.
    pub fn reset(&mut self) {
        self.loram = true;
        self.hiram = true;
        self.charen = true;
        self.exrom = true;
        self.game = true;
        self.update_mapping();
    }

    /// Called by the zero-page bank when $00/$01 change the port lines.
    pub fn set_cpu_port(&mut self, state: u8) {
        self.loram = (state & 1) != 0;
        self.hiram = (state & 2) != 0;
        self.charen = (state & 4) != 0;
        self.update_mapping();
    }

    /// Set the EXROM and GAME cartridge port lines.
    /// Both true = no cartridge (default).
    pub fn set_exrom_game(&mut self, exrom: bool, game: bool) {
        self.exrom = exrom;
        self.game = game;
        self.update_mapping();
    }

    fn update_mapping(&mut self) {
        let map = &self.map;
        let b = &self.banks;

        map.map(0x0, &b.zero_ram);
        for page in 0x1..=0xF {
            map.map(page, &b.ram);
        }

        // Ultimax mode (EXROM high, GAME low): only the first 4 KB of RAM
        // is visible, $D000-$DFFF is always I/O and $E000-$FFFF always
        // Kernal.  The port bits are ignored.
        if self.exrom && !self.game {
            for page in (0x1..=0x7).chain(0xA..=0xC) {
                map.unmap(page);
            }
            map.map(0xD, &b.io);
            map.map_read(0xE, &b.kernal);
            map.map_read(0xF, &b.kernal);
            return;
        }

        if self.hiram {
            map.map_read(0xE, &b.kernal);
            map.map_read(0xF, &b.kernal);
        }

        if self.loram && self.hiram {
            map.map_read(0xA, &b.basic);
            map.map_read(0xB, &b.basic);
        }

        if self.loram || self.hiram {
            if self.charen {
                map.map(0xD, &b.io);
            } else {
                // writes still go to RAM
                map.map_read(0xD, &b.chargen);
            }
        }
    }
}
