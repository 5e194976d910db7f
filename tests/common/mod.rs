//! Test rig: a bare 6510 on 64 KB of flat RAM.  Every bus access and
//! every opcode fetch is recorded with its cycle number.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use c64_emu::{
    CpuBus, CpuState, Disassembler, Event, EventClock, EventScheduler, FnEvent, Mos6510, Phase,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read(u16),
    Write(u16, u8),
}

pub struct FlatBus {
    scheduler: Rc<EventScheduler>,
    pub mem: Vec<u8>,
    pub accesses: Vec<(EventClock, Access)>,
}

impl FlatBus {
    fn now(&self) -> EventClock {
        self.scheduler.get_time(Phase::Phi2)
    }
}

impl CpuBus for FlatBus {
    fn cpu_read(&mut self, address: u16) -> u8 {
        let now = self.now();
        self.accesses.push((now, Access::Read(address)));
        self.mem[address as usize]
    }

    fn cpu_write(&mut self, address: u16, value: u8) {
        let now = self.now();
        self.accesses.push((now, Access::Write(address, value)));
        self.mem[address as usize] = value;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trace {
    Fetch { cycle: EventClock, pc: u16, opcode: u8 },
    Interrupt { cycle: EventClock, pc: u16 },
}

struct Recorder(Rc<RefCell<Vec<Trace>>>);

impl Disassembler for Recorder {
    fn instruction(&mut self, cycle: EventClock, state: &CpuState) {
        self.0.borrow_mut().push(Trace::Fetch {
            cycle,
            pc: state.pc,
            opcode: state.opcode,
        });
    }

    fn interrupt(&mut self, cycle: EventClock, state: &CpuState) {
        self.0
            .borrow_mut()
            .push(Trace::Interrupt { cycle, pc: state.pc });
    }
}

pub type TestCpu = Mos6510<FlatBus>;

pub const IRQ_HANDLER: u16 = 0x2000;
pub const NMI_HANDLER: u16 = 0x3000;

pub struct Rig {
    pub scheduler: Rc<EventScheduler>,
    pub cpu: Rc<RefCell<TestCpu>>,
    trace: Rc<RefCell<Vec<Trace>>>,
}

impl Rig {
    /// Load `program` at `origin`, point RST there and pull RST.  The
    /// IRQ and NMI vectors point at `IRQ_HANDLER` / `NMI_HANDLER`, which
    /// hold NOPs unless the test loads something else.  The first
    /// opcode fetch happens at cycle 6.
    pub fn new(origin: u16, program: &[u8]) -> Self {
        init_logging();
        let scheduler = Rc::new(EventScheduler::new());
        let mut bus = FlatBus {
            scheduler: Rc::clone(&scheduler),
            mem: vec![0; 0x1_0000],
            accesses: Vec::new(),
        };
        bus.mem[IRQ_HANDLER as usize..IRQ_HANDLER as usize + 0x100].fill(0xEA);
        bus.mem[NMI_HANDLER as usize..NMI_HANDLER as usize + 0x100].fill(0xEA);
        bus.mem[0xFFFA..0xFFFC].copy_from_slice(&NMI_HANDLER.to_le_bytes());
        bus.mem[0xFFFC..0xFFFE].copy_from_slice(&origin.to_le_bytes());
        bus.mem[0xFFFE..].copy_from_slice(&IRQ_HANDLER.to_le_bytes());
        let start = origin as usize;
        bus.mem[start..start + program.len()].copy_from_slice(program);

        let cpu = Mos6510::new(Rc::clone(&scheduler), bus);
        let trace = Rc::new(RefCell::new(Vec::new()));
        cpu.borrow_mut()
            .set_debug(Some(Box::new(Recorder(Rc::clone(&trace)))));
        cpu.borrow_mut().trigger_rst();
        Self {
            scheduler,
            cpu,
            trace,
        }
    }

    /// Run `cycles` full cycles.
    pub fn run(&self, cycles: EventClock) {
        let target = self.scheduler.get_time(Phase::Phi1) + cycles;
        self.scheduler.run_until(target);
    }

    /// Run until cycle `cycle` starts.
    pub fn run_to(&self, cycle: EventClock) {
        self.scheduler.run_until(cycle);
    }

    /// Run `action` on the CPU at PHI1 of `cycle`.
    pub fn at(&self, cycle: EventClock, action: impl Fn(&mut TestCpu) + 'static) {
        let cpu = Rc::downgrade(&self.cpu);
        let event: Rc<dyn Event> = FnEvent::new(format!("test@{cycle}"), move |_| {
            if let Some(cpu) = cpu.upgrade() {
                action(&mut cpu.borrow_mut());
            }
        });
        self.scheduler.schedule_absolute(event, cycle, Phase::Phi1);
    }

    pub fn poke(&self, address: u16, data: &[u8]) {
        let mut cpu = self.cpu.borrow_mut();
        let start = address as usize;
        cpu.bus_mut().mem[start..start + data.len()].copy_from_slice(data);
    }

    pub fn peek(&self, address: u16) -> u8 {
        self.cpu.borrow().bus().mem[address as usize]
    }

    pub fn state(&self) -> CpuState {
        self.cpu.borrow().state()
    }

    pub fn trace(&self) -> Vec<Trace> {
        self.trace.borrow().clone()
    }

    /// `(cycle, pc)` of every opcode fetch so far.
    pub fn fetches(&self) -> Vec<(EventClock, u16)> {
        self.trace
            .borrow()
            .iter()
            .filter_map(|t| match *t {
                Trace::Fetch { cycle, pc, .. } => Some((cycle, pc)),
                Trace::Interrupt { .. } => None,
            })
            .collect()
    }

    /// Cycles at which an interrupt acknowledge started.
    pub fn interrupts(&self) -> Vec<EventClock> {
        self.trace
            .borrow()
            .iter()
            .filter_map(|t| match *t {
                Trace::Interrupt { cycle, .. } => Some(cycle),
                Trace::Fetch { .. } => None,
            })
            .collect()
    }

    pub fn accesses(&self) -> Vec<(EventClock, Access)> {
        self.cpu.borrow().bus().accesses.clone()
    }
}

/// Run `program` at $1000, with `memory` poked in first, until it
/// reaches the JAM opcode that must end it.  Returns the rig and the
/// final register state.
pub fn run_program(program: &[u8], memory: &[(u16, u8)]) -> (Rig, CpuState) {
    let rig = Rig::new(0x1000, program);
    for &(address, value) in memory {
        rig.poke(address, &[value]);
    }
    rig.run(500);
    assert!(
        rig.cpu.borrow().is_jammed(),
        "program did not reach its JAM terminator"
    );
    let state = rig.state();
    (rig, state)
}
