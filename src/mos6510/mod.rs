//! Cycle-exact MOS 6510 emulation.
//!
//! Every instruction is split into micro-cycles, one per PHI2 edge.  The
//! cycles of all 256 opcodes live in one table indexed by
//! `(opcode << 3) | subcycle`; running the CPU only ever advances that
//! index.  The CPU drives itself through the scheduler with one of two
//! events: with RDY high every cycle runs, with RDY low the CPU stalls on
//! the first read cycle while writes still complete.
//!
//! The CPU is shared as `Rc<RefCell<Mos6510<_>>>`.  Chips that drive the
//! IRQ/NMI/RDY lines do so from their own scheduler events; a bank must
//! not call back into the CPU from inside one of its bus accesses.

mod alu;
mod debug;
mod instr_table;
pub mod opcodes;
pub mod status;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::event::{Event, EventClock, EventScheduler, Phase};

pub use debug::{CpuState, Disassembler, TraceLogger};
pub use status::Status;

use instr_table::MicroCycle;
use opcodes::{BRK, NOP_IMPLIED};
use status::{B, I};

/// Memory interface of the CPU.  The embedding system wires it to its
/// bus dispatcher.
pub trait CpuBus {
    fn cpu_read(&mut self, address: u16) -> u8;
    fn cpu_write(&mut self, address: u16, value: u8);
}

/// IRQ/NMI magic limit.  Must be larger than any table index
/// (0x100 << 3) but must not overflow when offset.
const MAX: i32 = 65536;

const SP_PAGE: u16 = 0x0100;

// ── Clock events ──────────────────────────────────────────────

/// Runs one CPU cycle per PHI2.  `steal` selects the RDY-low variant.
struct CpuClock<B> {
    cpu: Weak<RefCell<Mos6510<B>>>,
    steal: bool,
}

impl<B: CpuBus + 'static> Event for CpuClock<B> {
    fn name(&self) -> &str {
        if self.steal {
            "CPU-steal"
        } else {
            "CPU-nosteal"
        }
    }

    fn fire(self: Rc<Self>, scheduler: &EventScheduler) {
        let Some(cpu) = self.cpu.upgrade() else {
            return;
        };
        let ran = cpu.borrow_mut().clock(self.steal);
        if ran {
            scheduler.schedule_same_phase(self, 1);
        }
    }
}

// ── CPU ───────────────────────────────────────────────────────

pub struct Mos6510<B> {
    scheduler: Rc<EventScheduler>,
    bus: B,

    table: Box<[MicroCycle<B>]>,
    no_steal_event: Rc<dyn Event>,
    steal_event: Rc<dyn Event>,

    /// RDY pin state (stop CPU on read).
    rdy: bool,

    /// Current instruction and subcycle within instruction.
    cycle_count: i32,

    // Data regarding the current instruction.
    effective_address: u16,
    wrong_effective_address: u16,
    pointer: u16,
    data: u8,
    opcode: u8,
    instr_start_pc: u16,

    // Registers.
    pc: u16,
    a: u8,
    x: u8,
    y: u8,
    sp: u8,
    p: Status,

    irq_asserted_on_pin: bool,
    /// Cycle at which an interrupt condition appeared.  `-MAX` means
    /// "during some earlier instruction", `MAX` means "none".
    interrupt_cycle: i32,
    nmi_flag: bool,
    rst_flag: bool,

    jammed: bool,
    disassembler: Option<Box<dyn Disassembler>>,
}

impl<B: CpuBus + 'static> Mos6510<B> {
    /// Build the CPU.  It stays idle until `trigger_rst`.
    pub fn new(scheduler: Rc<EventScheduler>, bus: B) -> Rc<RefCell<Self>> {
        Rc::new_cyclic(|cpu: &Weak<RefCell<Self>>| {
            let no_steal_event: Rc<dyn Event> = Rc::new(CpuClock {
                cpu: cpu.clone(),
                steal: false,
            });
            let steal_event: Rc<dyn Event> = Rc::new(CpuClock {
                cpu: cpu.clone(),
                steal: true,
            });
            RefCell::new(Self {
                scheduler,
                bus,
                table: instr_table::build(),
                no_steal_event,
                steal_event,
                rdy: true,
                cycle_count: 0,
                effective_address: 0,
                wrong_effective_address: 0,
                pointer: 0,
                data: 0,
                opcode: 0,
                instr_start_pc: 0,
                pc: 0,
                a: 0,
                x: 0,
                y: 0,
                sp: 0xFF,
                p: Status::new(),
                irq_asserted_on_pin: false,
                interrupt_cycle: MAX,
                nmi_flag: false,
                rst_flag: false,
                jammed: false,
                disassembler: None,
            })
        })
    }

    /// Run one micro-cycle.  Returns `false` when the steal loop stalls
    /// on a read; the clock event then stops until RDY or an interrupt
    /// line restarts it.
    fn clock(&mut self, steal: bool) -> bool {
        let slot = self.table[self.cycle_count as usize];
        if steal && slot.is_read() {
            // Even while stalled, the CPU can still process the first
            // clock of interrupt delay, but only the first one.
            if self.interrupt_cycle == self.cycle_count {
                self.interrupt_cycle -= 1;
            }
            return false;
        }
        self.cycle_count += 1;
        (slot.action)(self);
        true
    }

    // ── Interrupt state machine ───────────────────────────────

    /// Latch the current cycle if an interrupt condition just appeared.
    fn calculate_interrupt_trigger_cycle(&mut self) {
        if self.interrupt_cycle == MAX && self.interrupt_condition() {
            self.interrupt_cycle = self.cycle_count;
        }
    }

    fn interrupt_condition(&self) -> bool {
        self.rst_flag || self.nmi_flag || (!self.p.is_set(I) && self.irq_asserted_on_pin)
    }

    fn interrupts_and_next_opcode(&mut self) {
        if self.cycle_count > self.interrupt_cycle + 2 {
            let time = self.now();
            log::debug!(
                "[cpu] interrupt at cycle {time} (pc=${:04X} rst={} nmi={} irq={})",
                self.pc,
                self.rst_flag,
                self.nmi_flag,
                self.irq_asserted_on_pin
            );
            if self.disassembler.is_some() {
                let state = self.state();
                if let Some(d) = self.disassembler.as_mut() {
                    d.interrupt(time, &state);
                }
            }

            self.bus.cpu_read(self.pc);
            self.cycle_count = i32::from(BRK) << 3;
            self.p.clear(B);
            self.interrupt_cycle = MAX;
        } else {
            self.fetch_next_opcode();
        }
    }

    fn fetch_next_opcode(&mut self) {
        self.instr_start_pc = self.pc;
        self.opcode = self.bus.cpu_read(self.pc);
        self.cycle_count = i32::from(self.opcode) << 3;
        self.pc = self.pc.wrapping_add(1);

        if !self.interrupt_condition() {
            self.interrupt_cycle = MAX;
        }
        if self.interrupt_cycle != MAX {
            self.interrupt_cycle = -MAX;
        }

        if self.disassembler.is_some() {
            let time = self.now();
            let mut state = self.state();
            state.pc = self.instr_start_pc;
            if let Some(d) = self.disassembler.as_mut() {
                d.instruction(time, &state);
            }
        }
    }

    // ── Bus helpers ───────────────────────────────────────────

    fn push(&mut self, value: u8) {
        self.bus.cpu_write(SP_PAGE | u16::from(self.sp), value);
        self.sp = self.sp.wrapping_sub(1);
    }

    fn pop(&mut self) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        self.bus.cpu_read(SP_PAGE | u16::from(self.sp))
    }

    // ── Control surface ───────────────────────────────────────

    fn initialise(&mut self) {
        self.sp = 0xFF;
        self.p = Status::new();
        self.pc = 0;

        self.irq_asserted_on_pin = false;
        self.nmi_flag = false;
        self.rst_flag = false;
        self.interrupt_cycle = MAX;
        self.jammed = false;

        self.rdy = true;
        self.scheduler.cancel(&self.steal_event);
        self.scheduler
            .schedule(Rc::clone(&self.no_steal_event), 0, Phase::Phi2);
    }

    /// Abort whatever the CPU is doing and enter the RST sequence.
    /// Instructions are cut off mid-execution, which no program can
    /// observe.
    pub fn trigger_rst(&mut self) {
        self.initialise();
        self.cycle_count = i32::from(BRK) << 3;
        self.rst_flag = true;
        self.calculate_interrupt_trigger_cycle();
    }

    /// Latch an NMI.  It cannot be withdrawn once given.
    pub fn trigger_nmi(&mut self) {
        self.nmi_flag = true;
        self.calculate_interrupt_trigger_cycle();

        // maybe process 1 clock of interrupt delay
        if !self.rdy {
            self.scheduler.cancel(&self.steal_event);
            self.scheduler
                .schedule(Rc::clone(&self.steal_event), 0, Phase::Phi2);
        }
    }

    /// Pull the IRQ line low.
    pub fn trigger_irq(&mut self) {
        self.irq_asserted_on_pin = true;
        self.calculate_interrupt_trigger_cycle();

        // maybe process 1 clock of interrupt delay
        if !self.rdy && self.interrupt_cycle == self.cycle_count {
            self.scheduler.cancel(&self.steal_event);
            self.scheduler
                .schedule(Rc::clone(&self.steal_event), 0, Phase::Phi2);
        }
    }

    /// Release the IRQ line.
    pub fn clear_irq(&mut self) {
        self.irq_asserted_on_pin = false;
        self.calculate_interrupt_trigger_cycle();
    }

    /// RDY high runs every cycle; RDY low stalls the CPU at its next
    /// read cycle.
    pub fn set_rdy(&mut self, rdy: bool) {
        if rdy != self.rdy {
            log::debug!(
                "[cpu] RDY {} at cycle {}",
                if rdy { "high" } else { "low" },
                self.now()
            );
        }
        self.rdy = rdy;

        let (stop, start) = if rdy {
            (&self.steal_event, &self.no_steal_event)
        } else {
            (&self.no_steal_event, &self.steal_event)
        };
        self.scheduler.cancel(stop);
        self.scheduler.schedule(Rc::clone(start), 0, Phase::Phi2);
    }

    /// Continue execution at `address` from the next cycle on.
    pub fn forced_jump(&mut self, address: u16) {
        self.cycle_count = (i32::from(NOP_IMPLIED) << 3) + 1;
        self.pc = address;
        self.effective_address = address;
    }

    /// Install or remove the per-instruction observer.
    pub fn set_debug(&mut self, disassembler: Option<Box<dyn Disassembler>>) {
        self.disassembler = disassembler;
    }

    /// Drive the SO pin.
    pub fn set_flag_v(&mut self, flag: bool) {
        self.p.set_if(status::V, flag);
    }

    pub fn flag_v(&self) -> bool {
        self.p.is_set(status::V)
    }

    /// The byte a CPU stalled by BA (but not yet tristated by AEC) puts
    /// a read request out for.  Approximated by the byte under PC, which
    /// is right for the usual case of a stall right after a write.
    pub fn stalled_on_byte(&mut self) -> u8 {
        self.bus.cpu_read(self.pc)
    }

    // ── Inspection ────────────────────────────────────────────

    pub fn state(&self) -> CpuState {
        CpuState {
            pc: self.pc,
            opcode: self.opcode,
            a: self.a,
            x: self.x,
            y: self.y,
            sp: self.sp,
            p: self.p,
        }
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn rdy(&self) -> bool {
        self.rdy
    }

    /// Locked up on a JAM opcode.  Only RST recovers.
    pub fn is_jammed(&self) -> bool {
        self.jammed
    }

    pub fn scheduler(&self) -> &Rc<EventScheduler> {
        &self.scheduler
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Current cycle, for timestamps in log lines and trace output.
    fn now(&self) -> EventClock {
        self.scheduler.get_time(Phase::Phi2)
    }
}
