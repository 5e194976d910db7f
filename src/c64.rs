//! Top-level machine: scheduler, CPU, memory map and banks wired the
//! way the C64 board connects them.
//!
//! Chips outside the CPU (VIC-II, CIAs, SID) register their banks in
//! the I/O area through [`C64::io_bank`] and drive the CPU lines from
//! their own scheduler events.

use std::cell::RefCell;
use std::rc::Rc;

use crate::banks::{
    BankRef, BasicRomBank, CharacterRomBank, ColorRamBank, DisconnectedBusBank, IoBank,
    KernalRomBank, SystemRamBank, ZeroRamBank,
};
use crate::config::MachineConfig;
use crate::error::Result;
use crate::event::{EventClock, EventScheduler, Phase};
use crate::mmu::{MemoryMap, PageSize, Pla, PlaBanks};
use crate::mos6510::{Mos6510, TraceLogger};
use crate::roms::RomSet;

/// The 6510 as wired in the C64: every access goes through the memory map.
pub type Cpu = Mos6510<Rc<MemoryMap>>;

/// I/O sub-pages ($D800-$DBFF) occupied by colour RAM.
const COLOR_RAM_PAGES: std::ops::RangeInclusive<usize> = 0x8..=0xB;

pub struct C64 {
    config: MachineConfig,

    scheduler: Rc<EventScheduler>,
    map: Rc<MemoryMap>,
    cpu: Rc<RefCell<Cpu>>,
    pla: Rc<RefCell<Pla>>,

    // ── Memory ──
    // The map and the I/O bank only hold weak handles; these keep the
    // banks alive.
    ram: Rc<RefCell<SystemRamBank>>,
    zero_ram: Rc<RefCell<ZeroRamBank>>,
    kernal_rom: Rc<RefCell<KernalRomBank>>,
    basic_rom: Rc<RefCell<BasicRomBank>>,
    char_rom: Rc<RefCell<CharacterRomBank>>,
    color_ram: Rc<RefCell<ColorRamBank>>,
    io_bank: Rc<RefCell<IoBank>>,
}

impl C64 {
    /// Build and power on the machine.
    ///
    /// ROM images come from `roms` when given, otherwise from
    /// `config.rom_dir`; with neither, the built-in Kernal stub is used.
    /// Every image is validated before the first cycle runs.
    pub fn new(config: MachineConfig, roms: Option<RomSet>) -> Result<Self> {
        let roms = match (roms, &config.rom_dir) {
            (Some(roms), _) => Some(roms),
            (None, Some(dir)) => Some(RomSet::load_from(dir)?),
            (None, None) => None,
        };
        let (kernal, basic, chargen) = match &roms {
            Some(r) => (
                Some(r.kernal.as_slice()),
                Some(r.basic.as_slice()),
                Some(r.chargen.as_slice()),
            ),
            None => {
                log::info!("[c64] No ROM images, using the built-in Kernal stub");
                (None, None, None)
            }
        };
        let kernal_rom = Rc::new(RefCell::new(KernalRomBank::new(kernal)?));
        let basic_rom = Rc::new(RefCell::new(BasicRomBank::new(basic)?));
        let char_rom = Rc::new(RefCell::new(CharacterRomBank::new(chargen)?));

        let scheduler = Rc::new(EventScheduler::new());
        scheduler.set_cycles_per_second(config.model.cpu_frequency());

        let map = Rc::new(MemoryMap::new(PageSize::Kb4));

        // Unconnected reads return whatever was last on the data bus.
        let floating_bus = {
            let map = Rc::downgrade(&map);
            move || map.upgrade().map_or(0xFF, |m| m.last_value())
        };

        let ram = Rc::new(RefCell::new(SystemRamBank::new()));
        let zero_ram = Rc::new(RefCell::new(ZeroRamBank::new(
            Rc::clone(&scheduler),
            Rc::clone(&ram),
        )));

        let color_ram = Rc::new(RefCell::new(ColorRamBank::new()));
        color_ram
            .borrow_mut()
            .set_floating_bus_fn(Box::new(floating_bus.clone()));

        let mut disconnected = DisconnectedBusBank::new();
        disconnected.set_last_read_byte_fn(Box::new(floating_bus));
        let io_bank = Rc::new(RefCell::new(IoBank::new(disconnected)));
        {
            let color_ram: BankRef = color_ram.clone();
            let mut io = io_bank.borrow_mut();
            for page in COLOR_RAM_PAGES {
                io.set_bank(page, &color_ram);
            }
        }

        let pla = Rc::new(RefCell::new(Pla::new(
            Rc::clone(&map),
            PlaBanks {
                zero_ram: zero_ram.clone(),
                ram: ram.clone(),
                basic: basic_rom.clone(),
                kernal: kernal_rom.clone(),
                chargen: char_rom.clone(),
                io: io_bank.clone(),
            },
        )));

        // 6510 port lines → PLA
        {
            let pla = Rc::downgrade(&pla);
            zero_ram
                .borrow_mut()
                .set_port_callback(Box::new(move |state| {
                    if let Some(pla) = pla.upgrade() {
                        pla.borrow_mut().set_cpu_port(state);
                    }
                }));
        }

        let cpu = Mos6510::new(Rc::clone(&scheduler), Rc::clone(&map));
        if config.trace {
            cpu.borrow_mut().set_debug(Some(Box::new(TraceLogger::new())));
        }

        log::info!(
            "[c64] Model {:?}, CPU clock {:.3} Hz",
            config.model,
            config.model.cpu_frequency()
        );

        let mut c64 = Self {
            config,
            scheduler,
            map,
            cpu,
            pla,
            ram,
            zero_ram,
            kernal_rom,
            basic_rom,
            char_rom,
            color_ram,
            io_bank,
        };
        c64.reset();
        Ok(c64)
    }

    // ── Reset ─────────────────────────────────────────────────

    /// Power-cycle: clear the event queue, restore the RAM power-on
    /// pattern and the standard memory configuration, then pull RST.
    pub fn reset(&mut self) {
        self.scheduler.reset();
        self.ram.borrow_mut().reset();
        self.color_ram.borrow_mut().reset();
        self.kernal_rom.borrow_mut().reset();
        self.pla.borrow_mut().reset();
        self.zero_ram.borrow_mut().reset();
        self.cpu.borrow_mut().trigger_rst();
    }

    /// Reset, but have the CPU start at `address` instead of following
    /// the Kernal reset vector.  The vector is restored by the next
    /// `reset`.
    pub fn reset_to(&mut self, address: u16) {
        self.reset();
        self.kernal_rom.borrow_mut().install_reset_hook(address);
        log::debug!("[c64] Reset vector redirected to ${address:04X}");
    }

    // ── Running ───────────────────────────────────────────────

    /// Run `cycles` full clock cycles.
    pub fn run_cycles(&self, cycles: EventClock) {
        let target = self.scheduler.get_time(Phase::Phi1) + cycles;
        self.scheduler.run_until(target);
    }

    /// Copy `data` into RAM at `address`, clipped at $FFFF.  Bypasses
    /// the memory map, so ROM and I/O never shadow the write.
    pub fn load(&self, address: u16, data: &[u8]) {
        self.ram.borrow_mut().load(address, data);
    }

    /// RAM contents without side effects.
    pub fn peek_ram(&self, address: u16) -> u8 {
        self.ram.borrow().peek(address)
    }

    /// Elapsed emulated time in milliseconds.
    pub fn time_ms(&self) -> u64 {
        let cycles = self.scheduler.get_time(Phase::Phi2) as f64;
        (cycles * 1000.0 / self.scheduler.cycles_per_second()) as u64
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &Rc<EventScheduler> {
        &self.scheduler
    }

    pub fn cpu(&self) -> &Rc<RefCell<Cpu>> {
        &self.cpu
    }

    pub fn memory_map(&self) -> &Rc<MemoryMap> {
        &self.map
    }

    pub fn pla(&self) -> &Rc<RefCell<Pla>> {
        &self.pla
    }

    /// $D000-$DFFF dispatcher.  Chips register their banks here.
    pub fn io_bank(&self) -> &Rc<RefCell<IoBank>> {
        &self.io_bank
    }

    pub fn color_ram(&self) -> &Rc<RefCell<ColorRamBank>> {
        &self.color_ram
    }

    pub fn basic_rom(&self) -> &Rc<RefCell<BasicRomBank>> {
        &self.basic_rom
    }

    pub fn char_rom(&self) -> &Rc<RefCell<CharacterRomBank>> {
        &self.char_rom
    }
}
