//! Commodore 64 emulation core.
//!
//! A cycle-exact MOS 6510 driven by a two-phase event scheduler, the
//! C64 memory map with its PLA banking rules, and the memory banks the
//! board connects to the CPU.  Video, sound and the CIAs plug in from
//! outside through [`banks::IoBank`] and scheduler events.

pub mod banks;
pub mod c64;
pub mod config;
pub mod error;
pub mod event;
pub mod mmu;
pub mod mos6510;
pub mod roms;

pub use c64::{Cpu, C64};
pub use config::{C64Model, MachineConfig};
pub use error::{Error, Result};
pub use event::{Event, EventClock, EventScheduler, FnEvent, Phase};
pub use mos6510::{CpuBus, CpuState, Disassembler, Mos6510, TraceLogger};
pub use roms::RomSet;
