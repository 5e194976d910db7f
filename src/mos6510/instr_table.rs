//! Micro-cycle table construction.
//!
//! For each opcode the builder emits the addressing-mode cycles, an
//! operand load for instructions that read memory, the cycles of the
//! operation itself, and finally the shared "fetch next opcode or
//! service an interrupt" cycle.  Cycles that write to the bus are
//! marked so that the RDY-low loop lets them through.
//!
//! Most read instructions complete by running the ALU and fetching the
//! next opcode in the same cycle, so their trailing fetch slot is never
//! reached.

use super::alu;
use super::opcodes::{decode, Kind, Mode, Op};
use super::status::{Status, B, C, D, I, N, V, Z};
use super::{CpuBus, Mos6510, MAX};

/// ANE/XAA magic constant.  It is chip and temperature dependent on real
/// hardware; $FF makes the one known use of the opcode in real software
/// work.
const ANE_CONST: u8 = 0xFF;

/// LXA magic constant.
const LXA_CONST: u8 = 0xEE;

pub(super) struct MicroCycle<B> {
    pub(super) action: fn(&mut Mos6510<B>),
    write: bool,
}

impl<B> MicroCycle<B> {
    /// Reads can be held off by RDY; writes cannot.
    pub(super) fn is_read(&self) -> bool {
        !self.write
    }
}

impl<B> Clone for MicroCycle<B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B> Copy for MicroCycle<B> {}

struct Cycles<B>(Vec<MicroCycle<B>>);

impl<B> Cycles<B> {
    fn read(&mut self, action: fn(&mut Mos6510<B>)) {
        self.0.push(MicroCycle { action, write: false });
    }

    fn write(&mut self, action: fn(&mut Mos6510<B>)) {
        self.0.push(MicroCycle { action, write: true });
    }
}

pub(super) fn build<B: CpuBus + 'static>() -> Box<[MicroCycle<B>]> {
    let filler = MicroCycle {
        action: Mos6510::<B>::interrupts_and_next_opcode,
        write: false,
    };
    let mut table = vec![filler; 0x100 << 3];
    for opcode in 0..=0xFFu8 {
        let cycles = Mos6510::<B>::opcode_cycles(opcode);
        assert!(cycles.len() <= 8, "opcode {opcode:02X} needs {} cycles", cycles.len());
        let base = usize::from(opcode) << 3;
        table[base..base + cycles.len()].copy_from_slice(&cycles);
    }
    table.into_boxed_slice()
}

impl<B: CpuBus + 'static> Mos6510<B> {
    fn opcode_cycles(opcode: u8) -> Vec<MicroCycle<B>> {
        let (op, mode) = decode(opcode);
        let kind = op.kind();
        let mut c = Cycles(Vec::with_capacity(8));

        // ── Addressing ────────────────────────────────────────
        // Only pure reads skip the wrong-address cycle when no page is
        // crossed; stores and RMW always take it.
        let skip_when_same_page = kind == Kind::Read;
        let high_x: fn(&mut Self) = if skip_when_same_page {
            Self::fetch_high_addr_x_skip
        } else {
            Self::fetch_high_addr_x
        };
        let high_y: fn(&mut Self) = if skip_when_same_page {
            Self::fetch_high_addr_y_skip
        } else {
            Self::fetch_high_addr_y
        };
        let high_eff_y: fn(&mut Self) = if skip_when_same_page {
            Self::fetch_high_eff_addr_y_skip
        } else {
            Self::fetch_high_eff_addr_y
        };

        match op {
            Op::Brk | Op::Rti | Op::Rts => c.read(Self::fetch_immediate),
            Op::Jsr => c.read(Self::fetch_low_addr),
            Op::Jam => {}
            _ => match mode {
                Mode::Implied | Mode::Accumulator => c.read(Self::dummy_read_pc),
                Mode::Immediate | Mode::Relative => c.read(Self::fetch_immediate),
                Mode::ZeroPage => c.read(Self::fetch_low_addr),
                Mode::ZeroPageX => {
                    c.read(Self::fetch_low_addr_x);
                    // dummy read of the unindexed zero-page address
                    c.read(Self::wasted);
                }
                Mode::ZeroPageY => {
                    c.read(Self::fetch_low_addr_y);
                    c.read(Self::wasted);
                }
                Mode::Absolute => {
                    c.read(Self::fetch_low_addr);
                    c.read(Self::fetch_high_addr);
                }
                Mode::AbsoluteX => {
                    c.read(Self::fetch_low_addr);
                    c.read(high_x);
                    c.read(Self::throw_away_read);
                }
                Mode::AbsoluteY => {
                    c.read(Self::fetch_low_addr);
                    c.read(high_y);
                    c.read(Self::throw_away_read);
                }
                Mode::Indirect => {
                    c.read(Self::fetch_low_pointer);
                    c.read(Self::fetch_high_pointer);
                    c.read(Self::fetch_low_eff_addr);
                    c.read(Self::fetch_high_eff_addr);
                }
                Mode::IndirectX => {
                    c.read(Self::fetch_low_pointer);
                    c.read(Self::index_pointer_x);
                    c.read(Self::fetch_low_eff_addr);
                    c.read(Self::fetch_high_eff_addr);
                }
                Mode::IndirectY => {
                    c.read(Self::fetch_low_pointer);
                    c.read(Self::fetch_low_eff_addr);
                    c.read(high_eff_y);
                    c.read(Self::throw_away_read);
                }
            },
        }

        let memory_operand = !matches!(
            mode,
            Mode::Implied | Mode::Accumulator | Mode::Immediate | Mode::Relative
        );
        if memory_operand && matches!(kind, Kind::Read | Kind::Modify) {
            c.read(Self::load_data);
        }

        // ── Operation ─────────────────────────────────────────
        match op {
            Op::Adc => c.read(Self::adc),
            Op::Anc => c.read(Self::anc),
            Op::And => c.read(Self::and),
            Op::Ane => c.read(Self::ane),
            Op::Arr => c.read(Self::arr),
            Op::Asr => c.read(Self::asr),
            Op::Bit => c.read(Self::bit),
            Op::Cmp => c.read(Self::cmp),
            Op::Cpx => c.read(Self::cpx),
            Op::Cpy => c.read(Self::cpy),
            Op::Eor => c.read(Self::eor),
            Op::Las => c.read(Self::las),
            Op::Lax => c.read(Self::lax),
            Op::Lda => c.read(Self::lda),
            Op::Ldx => c.read(Self::ldx),
            Op::Ldy => c.read(Self::ldy),
            Op::Lxa => c.read(Self::lxa),
            Op::Ora => c.read(Self::ora),
            Op::Sbc => c.read(Self::sbc),
            Op::Sbx => c.read(Self::sbx),
            // NOPs of every addressing mode only spend their cycles.
            Op::Nop => {}

            Op::Asl | Op::Lsr | Op::Rol | Op::Ror if mode == Mode::Accumulator => {
                c.read(match op {
                    Op::Asl => Self::asl_a,
                    Op::Lsr => Self::lsr_a,
                    Op::Rol => Self::rol_a,
                    _ => Self::ror_a,
                });
            }
            Op::Asl | Op::Lsr | Op::Rol | Op::Ror | Op::Dec | Op::Inc | Op::Dcp | Op::Isb
            | Op::Rla | Op::Rra | Op::Slo | Op::Sre => {
                c.write(match op {
                    Op::Asl => Self::asl_m,
                    Op::Lsr => Self::lsr_m,
                    Op::Rol => Self::rol_m,
                    Op::Ror => Self::ror_m,
                    Op::Dec => Self::dec_m,
                    Op::Inc => Self::inc_m,
                    Op::Dcp => Self::dcp,
                    Op::Isb => Self::isb,
                    Op::Rla => Self::rla,
                    Op::Rra => Self::rra,
                    Op::Slo => Self::slo,
                    _ => Self::sre,
                });
                c.write(Self::write_data);
            }

            Op::Sax => c.write(Self::sax),
            Op::Sta => c.write(Self::sta),
            Op::Stx => c.write(Self::stx),
            Op::Sty => c.write(Self::sty),
            Op::Sha => c.write(Self::sha),
            Op::Shs => c.write(Self::shs),
            Op::Shx => c.write(Self::shx),
            Op::Shy => c.write(Self::shy),

            Op::Bcc | Op::Bcs | Op::Beq | Op::Bmi | Op::Bne | Op::Bpl | Op::Bvc | Op::Bvs => {
                c.read(match op {
                    Op::Bcc => Self::bcc,
                    Op::Bcs => Self::bcs,
                    Op::Beq => Self::beq,
                    Op::Bmi => Self::bmi,
                    Op::Bne => Self::bne,
                    Op::Bpl => Self::bpl,
                    Op::Bvc => Self::bvc,
                    _ => Self::bvs,
                });
                // page-crossing branches read at the wrong address first
                c.read(Self::throw_away_read);
            }

            Op::Brk => {
                c.write(Self::push_high_pc);
                c.write(Self::push_low_pc_select_vector);
                c.write(Self::push_sr_disable_irq);
                c.read(Self::fetch_vector_low);
                c.read(Self::fetch_vector_high);
                c.read(Self::fetch_next_opcode);
            }
            Op::Jsr => {
                // stack read, no visible effect
                c.read(Self::wasted);
                c.write(Self::push_high_pc);
                c.write(Self::push_low_pc);
                c.read(Self::fetch_high_addr);
                c.read(Self::jump);
            }
            Op::Jmp => c.read(Self::jump),
            Op::Rti => {
                c.read(Self::wasted);
                c.read(Self::pop_sr);
                c.read(Self::pop_low_pc);
                c.read(Self::pop_high_pc);
                c.read(Self::return_from_interrupt);
            }
            Op::Rts => {
                c.read(Self::wasted);
                c.read(Self::pop_low_pc);
                c.read(Self::pop_high_pc);
                c.read(Self::return_from_subroutine);
            }
            Op::Pha => c.write(Self::pha),
            Op::Php => c.write(Self::php),
            Op::Pla => {
                c.read(Self::wasted);
                c.read(Self::pla);
            }
            Op::Plp => {
                c.read(Self::wasted);
                c.read(Self::pop_sr);
                c.read(Self::interrupts_and_next_opcode);
            }

            Op::Clc => c.read(Self::clc),
            Op::Cld => c.read(Self::cld),
            Op::Cli => c.read(Self::cli),
            Op::Clv => c.read(Self::clv),
            Op::Sec => c.read(Self::sec),
            Op::Sed => c.read(Self::sed),
            Op::Sei => c.read(Self::sei),
            Op::Dex => c.read(Self::dex),
            Op::Dey => c.read(Self::dey),
            Op::Inx => c.read(Self::inx),
            Op::Iny => c.read(Self::iny),
            Op::Tax => c.read(Self::tax),
            Op::Tay => c.read(Self::tay),
            Op::Tsx => c.read(Self::tsx),
            Op::Txa => c.read(Self::txa),
            Op::Txs => c.read(Self::txs),
            Op::Tya => c.read(Self::tya),

            // The state machine locks up and never recovers.
            Op::Jam => c.read(Self::lock_up),
        }

        c.read(Self::interrupts_and_next_opcode);
        c.0
    }

    // ── Addressing micro-cycles ───────────────────────────────

    /// Immediate operand; PC only advances outside interrupt entry.
    fn fetch_immediate(&mut self) {
        self.data = self.bus.cpu_read(self.pc);
        if self.p.is_set(B) {
            self.pc = self.pc.wrapping_add(1);
        }
    }

    /// Read the next opcode byte and throw it away.
    fn dummy_read_pc(&mut self) {
        self.bus.cpu_read(self.pc);
    }

    fn wasted(&mut self) {}

    fn fetch_low_addr(&mut self) {
        self.effective_address = u16::from(self.bus.cpu_read(self.pc));
        self.pc = self.pc.wrapping_add(1);
    }

    fn fetch_low_addr_x(&mut self) {
        self.fetch_low_addr();
        self.effective_address = (self.effective_address + u16::from(self.x)) & 0xFF;
    }

    fn fetch_low_addr_y(&mut self) {
        self.fetch_low_addr();
        self.effective_address = (self.effective_address + u16::from(self.y)) & 0xFF;
    }

    fn fetch_high_addr(&mut self) {
        self.effective_address |= u16::from(self.bus.cpu_read(self.pc)) << 8;
        self.pc = self.pc.wrapping_add(1);
    }

    /// Add an index to the effective address, remembering the address
    /// the CPU first puts out (carry not yet applied to the high byte).
    fn index_effective_address(&mut self, index: u8) {
        let indexed = self.effective_address.wrapping_add(u16::from(index));
        self.wrong_effective_address = (self.effective_address & 0xFF00) | (indexed & 0x00FF);
        self.effective_address = indexed;
    }

    /// Skip the throwaway read when no page boundary was crossed.
    fn skip_if_same_page(&mut self) {
        if self.effective_address == self.wrong_effective_address {
            self.cycle_count += 1;
        }
    }

    fn fetch_high_addr_x(&mut self) {
        self.fetch_high_addr();
        self.index_effective_address(self.x);
    }

    fn fetch_high_addr_x_skip(&mut self) {
        self.fetch_high_addr_x();
        self.skip_if_same_page();
    }

    fn fetch_high_addr_y(&mut self) {
        self.fetch_high_addr();
        self.index_effective_address(self.y);
    }

    fn fetch_high_addr_y_skip(&mut self) {
        self.fetch_high_addr_y();
        self.skip_if_same_page();
    }

    fn fetch_low_pointer(&mut self) {
        self.pointer = u16::from(self.bus.cpu_read(self.pc));
        self.pc = self.pc.wrapping_add(1);
    }

    fn fetch_high_pointer(&mut self) {
        self.pointer |= u16::from(self.bus.cpu_read(self.pc)) << 8;
        self.pc = self.pc.wrapping_add(1);
    }

    fn index_pointer_x(&mut self) {
        self.pointer = (self.pointer + u16::from(self.x)) & 0xFF;
    }

    fn fetch_low_eff_addr(&mut self) {
        self.effective_address = u16::from(self.bus.cpu_read(self.pointer));
    }

    /// The pointer increment never carries into the high byte.
    fn fetch_high_eff_addr(&mut self) {
        self.pointer = (self.pointer & 0xFF00) | (self.pointer.wrapping_add(1) & 0x00FF);
        self.effective_address |= u16::from(self.bus.cpu_read(self.pointer)) << 8;
    }

    fn fetch_high_eff_addr_y(&mut self) {
        self.fetch_high_eff_addr();
        self.index_effective_address(self.y);
    }

    fn fetch_high_eff_addr_y_skip(&mut self) {
        self.fetch_high_eff_addr_y();
        self.skip_if_same_page();
    }

    /// Some programs use this read to acknowledge CIA interrupts.
    fn throw_away_read(&mut self) {
        self.bus.cpu_read(self.wrong_effective_address);
    }

    fn load_data(&mut self) {
        self.data = self.bus.cpu_read(self.effective_address);
    }

    fn write_data(&mut self) {
        self.bus.cpu_write(self.effective_address, self.data);
    }

    // ── Loads and ALU ─────────────────────────────────────────

    fn adc(&mut self) {
        self.a = alu::adc(self.a, self.data, &mut self.p);
        self.interrupts_and_next_opcode();
    }

    fn anc(&mut self) {
        self.a &= self.data;
        self.p.update_nz(self.a);
        self.p.set_if(C, self.p.is_set(N));
        self.interrupts_and_next_opcode();
    }

    fn and(&mut self) {
        self.a &= self.data;
        self.p.update_nz(self.a);
        self.interrupts_and_next_opcode();
    }

    fn ane(&mut self) {
        self.a = (self.a | ANE_CONST) & self.x & self.data;
        self.p.update_nz(self.a);
        self.interrupts_and_next_opcode();
    }

    fn arr(&mut self) {
        self.a = alu::arr(self.a, self.data, &mut self.p);
        self.interrupts_and_next_opcode();
    }

    fn asr(&mut self) {
        self.a = alu::lsr(self.a & self.data, &mut self.p);
        self.interrupts_and_next_opcode();
    }

    fn bit(&mut self) {
        alu::bit(self.a, self.data, &mut self.p);
        self.interrupts_and_next_opcode();
    }

    fn cmp(&mut self) {
        alu::compare(self.a, self.data, &mut self.p);
        self.interrupts_and_next_opcode();
    }

    fn cpx(&mut self) {
        alu::compare(self.x, self.data, &mut self.p);
        self.interrupts_and_next_opcode();
    }

    fn cpy(&mut self) {
        alu::compare(self.y, self.data, &mut self.p);
        self.interrupts_and_next_opcode();
    }

    fn eor(&mut self) {
        self.a ^= self.data;
        self.p.update_nz(self.a);
        self.interrupts_and_next_opcode();
    }

    fn las(&mut self) {
        self.data &= self.sp;
        self.a = self.data;
        self.x = self.data;
        self.sp = self.data;
        self.p.update_nz(self.data);
        self.interrupts_and_next_opcode();
    }

    fn lax(&mut self) {
        self.a = self.data;
        self.x = self.data;
        self.p.update_nz(self.data);
        self.interrupts_and_next_opcode();
    }

    fn lda(&mut self) {
        self.a = self.data;
        self.p.update_nz(self.a);
        self.interrupts_and_next_opcode();
    }

    fn ldx(&mut self) {
        self.x = self.data;
        self.p.update_nz(self.x);
        self.interrupts_and_next_opcode();
    }

    fn ldy(&mut self) {
        self.y = self.data;
        self.p.update_nz(self.y);
        self.interrupts_and_next_opcode();
    }

    fn lxa(&mut self) {
        self.a = self.data & (self.a | LXA_CONST);
        self.x = self.a;
        self.p.update_nz(self.a);
        self.interrupts_and_next_opcode();
    }

    fn ora(&mut self) {
        self.a |= self.data;
        self.p.update_nz(self.a);
        self.interrupts_and_next_opcode();
    }

    fn sbc(&mut self) {
        self.a = alu::sbc(self.a, self.data, &mut self.p);
        self.interrupts_and_next_opcode();
    }

    fn sbx(&mut self) {
        self.x = alu::sbx(self.a, self.x, self.data, &mut self.p);
        self.interrupts_and_next_opcode();
    }

    // ── Accumulator shifts ────────────────────────────────────

    fn asl_a(&mut self) {
        self.a = alu::asl(self.a, &mut self.p);
        self.interrupts_and_next_opcode();
    }

    fn lsr_a(&mut self) {
        self.a = alu::lsr(self.a, &mut self.p);
        self.interrupts_and_next_opcode();
    }

    fn rol_a(&mut self) {
        self.a = alu::rol(self.a, &mut self.p);
        self.interrupts_and_next_opcode();
    }

    fn ror_a(&mut self) {
        self.a = alu::ror(self.a, &mut self.p);
        self.interrupts_and_next_opcode();
    }

    // ── Read-modify-write ─────────────────────────────────────
    //
    // The unmodified value is written back while the ALU works; the
    // result is written on the following cycle.

    fn asl_m(&mut self) {
        self.write_data();
        self.data = alu::asl(self.data, &mut self.p);
    }

    fn lsr_m(&mut self) {
        self.write_data();
        self.data = alu::lsr(self.data, &mut self.p);
    }

    fn rol_m(&mut self) {
        self.write_data();
        self.data = alu::rol(self.data, &mut self.p);
    }

    fn ror_m(&mut self) {
        self.write_data();
        self.data = alu::ror(self.data, &mut self.p);
    }

    fn dec_m(&mut self) {
        self.write_data();
        self.data = self.data.wrapping_sub(1);
        self.p.update_nz(self.data);
    }

    fn inc_m(&mut self) {
        self.write_data();
        self.data = self.data.wrapping_add(1);
        self.p.update_nz(self.data);
    }

    fn dcp(&mut self) {
        self.write_data();
        self.data = self.data.wrapping_sub(1);
        alu::compare(self.a, self.data, &mut self.p);
    }

    fn isb(&mut self) {
        self.write_data();
        self.data = self.data.wrapping_add(1);
        self.p.update_nz(self.data);
        self.a = alu::sbc(self.a, self.data, &mut self.p);
    }

    fn rla(&mut self) {
        self.write_data();
        self.data = alu::rol(self.data, &mut self.p);
        self.a &= self.data;
        self.p.update_nz(self.a);
    }

    fn rra(&mut self) {
        self.write_data();
        self.data = alu::ror(self.data, &mut self.p);
        self.a = alu::adc(self.a, self.data, &mut self.p);
    }

    fn slo(&mut self) {
        self.write_data();
        self.data = alu::asl(self.data, &mut self.p);
        self.a |= self.data;
        self.p.update_nz(self.a);
    }

    fn sre(&mut self) {
        self.write_data();
        self.data = alu::lsr(self.data, &mut self.p);
        self.a ^= self.data;
        self.p.update_nz(self.a);
    }

    // ── Stores ────────────────────────────────────────────────

    fn sax(&mut self) {
        self.data = self.a & self.x;
        self.write_data();
    }

    fn sta(&mut self) {
        self.data = self.a;
        self.write_data();
    }

    fn stx(&mut self) {
        self.data = self.x;
        self.write_data();
    }

    fn sty(&mut self) {
        self.data = self.y;
        self.write_data();
    }

    /// SHA/SHS/SHX/SHY store `value & (high byte + 1)`.  When the index
    /// crossed a page, the stored value also replaces the high byte of
    /// the target address.
    fn store_and_high(&mut self, value: u8) {
        let high_plus_one = ((self.effective_address >> 8) + 1) as u8;
        self.data = value & high_plus_one;
        if self.wrong_effective_address != self.effective_address {
            self.effective_address =
                (u16::from(self.data) << 8) | (self.effective_address & 0x00FF);
        }
        self.write_data();
    }

    fn sha(&mut self) {
        self.store_and_high(self.x & self.a);
    }

    fn shs(&mut self) {
        self.sp = self.a & self.x;
        self.store_and_high(self.sp);
    }

    fn shx(&mut self) {
        self.store_and_high(self.x);
    }

    fn shy(&mut self) {
        self.store_and_high(self.y);
    }

    // ── Branches ──────────────────────────────────────────────

    /// Not taken: fetch the next opcode right away.  Taken without page
    /// crossing: continue at the target on the next cycle, which delays
    /// an interrupt raised during this instruction by one more
    /// instruction.  Taken across a page: one more cycle reading at the
    /// wrong address first.
    fn branch(&mut self, condition: bool) {
        if !condition {
            self.interrupts_and_next_opcode();
            return;
        }

        self.bus.cpu_read(self.pc);
        let target = self.pc.wrapping_add(self.data as i8 as u16);
        self.wrong_effective_address = (self.pc & 0xFF00) | (target & 0x00FF);
        self.effective_address = target;
        if self.effective_address == self.wrong_effective_address {
            self.cycle_count += 1;
            if self.interrupt_cycle >> 3 == self.cycle_count >> 3 {
                self.interrupt_cycle += 2;
            }
        }
        self.pc = target;
    }

    fn bcc(&mut self) {
        self.branch(!self.p.is_set(C));
    }

    fn bcs(&mut self) {
        self.branch(self.p.is_set(C));
    }

    fn beq(&mut self) {
        self.branch(self.p.is_set(Z));
    }

    fn bmi(&mut self) {
        self.branch(self.p.is_set(N));
    }

    fn bne(&mut self) {
        self.branch(!self.p.is_set(Z));
    }

    fn bpl(&mut self) {
        self.branch(!self.p.is_set(N));
    }

    fn bvc(&mut self) {
        self.branch(!self.p.is_set(V));
    }

    fn bvs(&mut self) {
        self.branch(self.p.is_set(V));
    }

    // ── Stack, jumps and interrupt entry ──────────────────────

    fn push_high_pc(&mut self) {
        self.push((self.pc >> 8) as u8);
    }

    fn push_low_pc(&mut self) {
        self.push(self.pc as u8);
    }

    /// RST takes priority over NMI, NMI over IRQ/BRK.  The serviced
    /// latch is cleared here.
    fn push_low_pc_select_vector(&mut self) {
        self.push_low_pc();
        self.effective_address = if self.rst_flag {
            0xFFFC
        } else if self.nmi_flag {
            0xFFFA
        } else {
            0xFFFE
        };
        self.rst_flag = false;
        self.nmi_flag = false;
        self.calculate_interrupt_trigger_cycle();
    }

    fn push_sr_disable_irq(&mut self) {
        self.push(self.p.0);
        self.p.set(B | I);
    }

    fn fetch_vector_low(&mut self) {
        self.pc = u16::from(self.bus.cpu_read(self.effective_address));
    }

    fn fetch_vector_high(&mut self) {
        let address = self.effective_address.wrapping_add(1);
        self.pc |= u16::from(self.bus.cpu_read(address)) << 8;
    }

    fn jump(&mut self) {
        self.pc = self.effective_address;
        self.interrupts_and_next_opcode();
    }

    fn pop_low_pc(&mut self) {
        self.effective_address = u16::from(self.pop());
    }

    fn pop_high_pc(&mut self) {
        self.effective_address |= u16::from(self.pop()) << 8;
    }

    fn pop_sr(&mut self) {
        let value = self.pop();
        self.p = Status::from_stack(value);
        self.calculate_interrupt_trigger_cycle();
    }

    fn return_from_interrupt(&mut self) {
        self.pc = self.effective_address;
        self.interrupts_and_next_opcode();
    }

    fn return_from_subroutine(&mut self) {
        self.bus.cpu_read(self.effective_address);
        self.pc = self.effective_address.wrapping_add(1);
    }

    fn pha(&mut self) {
        self.push(self.a);
    }

    fn php(&mut self) {
        self.push(self.p.0);
    }

    fn pla(&mut self) {
        self.a = self.pop();
        self.p.update_nz(self.a);
    }

    // ── Flags and transfers ───────────────────────────────────

    fn clc(&mut self) {
        self.p.clear(C);
        self.interrupts_and_next_opcode();
    }

    fn cld(&mut self) {
        self.p.clear(D);
        self.interrupts_and_next_opcode();
    }

    fn cli(&mut self) {
        self.p.clear(I);
        self.calculate_interrupt_trigger_cycle();
        self.interrupts_and_next_opcode();
    }

    fn clv(&mut self) {
        self.p.clear(V);
        self.interrupts_and_next_opcode();
    }

    fn sec(&mut self) {
        self.p.set(C);
        self.interrupts_and_next_opcode();
    }

    fn sed(&mut self) {
        self.p.set(D);
        self.interrupts_and_next_opcode();
    }

    /// An IRQ already due is still taken; one that has not matured yet
    /// is dropped.
    fn sei(&mut self) {
        self.p.set(I);
        self.interrupts_and_next_opcode();
        if !self.rst_flag && !self.nmi_flag && self.interrupt_cycle != MAX {
            self.interrupt_cycle = MAX;
        }
    }

    fn dex(&mut self) {
        self.x = self.x.wrapping_sub(1);
        self.p.update_nz(self.x);
        self.interrupts_and_next_opcode();
    }

    fn dey(&mut self) {
        self.y = self.y.wrapping_sub(1);
        self.p.update_nz(self.y);
        self.interrupts_and_next_opcode();
    }

    fn inx(&mut self) {
        self.x = self.x.wrapping_add(1);
        self.p.update_nz(self.x);
        self.interrupts_and_next_opcode();
    }

    fn iny(&mut self) {
        self.y = self.y.wrapping_add(1);
        self.p.update_nz(self.y);
        self.interrupts_and_next_opcode();
    }

    fn tax(&mut self) {
        self.x = self.a;
        self.p.update_nz(self.x);
        self.interrupts_and_next_opcode();
    }

    fn tay(&mut self) {
        self.y = self.a;
        self.p.update_nz(self.y);
        self.interrupts_and_next_opcode();
    }

    fn tsx(&mut self) {
        self.x = self.sp;
        self.p.update_nz(self.x);
        self.interrupts_and_next_opcode();
    }

    fn txa(&mut self) {
        self.a = self.x;
        self.p.update_nz(self.a);
        self.interrupts_and_next_opcode();
    }

    fn txs(&mut self) {
        self.sp = self.x;
        self.interrupts_and_next_opcode();
    }

    fn tya(&mut self) {
        self.a = self.y;
        self.p.update_nz(self.a);
        self.interrupts_and_next_opcode();
    }

    // ── Lock-up ───────────────────────────────────────────────

    fn lock_up(&mut self) {
        self.cycle_count -= 1;
        if !self.jammed {
            self.jammed = true;
            log::warn!(
                "[cpu] JAM ${:02X} at ${:04X}, cycle {}: CPU halted until RST",
                self.opcode,
                self.instr_start_pc,
                self.now()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullBus;

    impl CpuBus for NullBus {
        fn cpu_read(&mut self, _address: u16) -> u8 {
            0
        }
        fn cpu_write(&mut self, _address: u16, _value: u8) {}
    }

    fn slots(opcode: u8) -> Vec<bool> {
        Mos6510::<NullBus>::opcode_cycles(opcode)
            .iter()
            .map(MicroCycle::is_read)
            .collect()
    }

    #[test]
    fn test_table_covers_every_opcode() {
        let table = build::<NullBus>();
        assert_eq!(table.len(), 0x800);
    }

    #[test]
    fn test_store_cycles_are_not_stealable() {
        // STA abs: low, high, write, fetch
        assert_eq!(slots(0x8D), [true, true, false, true]);
        // INC abs: low, high, load, dummy write, write, fetch
        assert_eq!(slots(0xEE), [true, true, true, false, false, true]);
        // BRK: operand, 3 pushes, vector, fetch, trailing slot
        assert_eq!(slots(0x00), [true, false, false, false, true, true, true, true]);
    }

    #[test]
    fn test_rmw_indexed_forms_use_all_eight_slots() {
        assert_eq!(slots(0xC3).len(), 8); // DCP (zp,X)
        assert_eq!(slots(0xF3).len(), 8); // ISB (zp),Y
    }

    #[test]
    fn test_jam_is_single_read_slot_plus_fetch() {
        assert_eq!(slots(0x02), [true, true]);
    }
}
