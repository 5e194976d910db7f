//! Opcode decoding: operation and addressing mode for all 256 opcodes,
//! including the undocumented ones.

/// Addressing modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    IndirectX,
    IndirectY,
    Relative,
}

/// Operations.  Undocumented ones use the names from the VICE
/// documentation (SLO, RLA, SRE, RRA, SAX, LAX, DCP, ISB, ANC, ASR, ARR,
/// ANE, LXA, SBX, SHA, SHS, SHX, SHY, LAS).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Adc, Anc, And, Ane, Arr, Asl, Asr,
    Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs,
    Clc, Cld, Cli, Clv, Cmp, Cpx, Cpy,
    Dcp, Dec, Dex, Dey, Eor,
    Inc, Inx, Iny, Isb,
    Jam, Jmp, Jsr,
    Las, Lax, Lda, Ldx, Ldy, Lsr, Lxa,
    Nop, Ora,
    Pha, Php, Pla, Plp,
    Rla, Rol, Ror, Rra, Rti, Rts,
    Sax, Sbc, Sbx, Sec, Sed, Sei, Sha, Shs, Shx, Shy, Slo, Sre, Sta, Stx, Sty,
    Tax, Tay, Tsx, Txa, Txs, Tya,
}

/// How an operation uses its memory operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Loads the operand, never writes.
    Read,
    /// Read-modify-write: load, dummy write, final write.
    Modify,
    /// Stores without loading.
    Store,
    /// Control flow, stack and register ops.
    Other,
}

impl Op {
    pub fn kind(self) -> Kind {
        use Op::*;
        match self {
            Adc | Anc | And | Ane | Arr | Asr | Bit | Cmp | Cpx | Cpy | Eor | Las | Lax
            | Lda | Ldx | Ldy | Lxa | Nop | Ora | Sbc | Sbx => Kind::Read,
            Asl | Dcp | Dec | Inc | Isb | Lsr | Rla | Rol | Ror | Rra | Slo | Sre => {
                Kind::Modify
            }
            Sax | Sha | Shs | Shx | Shy | Sta | Stx | Sty => Kind::Store,
            _ => Kind::Other,
        }
    }

    /// True for opcodes outside the documented instruction set.
    pub fn is_undocumented(self) -> bool {
        use Op::*;
        matches!(
            self,
            Anc | Ane | Arr | Asr | Dcp | Isb | Jam | Las | Lax | Lxa | Rla | Rra | Sax
                | Sbx | Sha | Shs | Shx | Shy | Slo | Sre
        )
    }

    pub fn mnemonic(self) -> &'static str {
        use Op::*;
        match self {
            Adc => "ADC", Anc => "ANC", And => "AND", Ane => "ANE", Arr => "ARR",
            Asl => "ASL", Asr => "ASR", Bcc => "BCC", Bcs => "BCS", Beq => "BEQ",
            Bit => "BIT", Bmi => "BMI", Bne => "BNE", Bpl => "BPL", Brk => "BRK",
            Bvc => "BVC", Bvs => "BVS", Clc => "CLC", Cld => "CLD", Cli => "CLI",
            Clv => "CLV", Cmp => "CMP", Cpx => "CPX", Cpy => "CPY", Dcp => "DCP",
            Dec => "DEC", Dex => "DEX", Dey => "DEY", Eor => "EOR", Inc => "INC",
            Inx => "INX", Iny => "INY", Isb => "ISB", Jam => "JAM", Jmp => "JMP",
            Jsr => "JSR", Las => "LAS", Lax => "LAX", Lda => "LDA", Ldx => "LDX",
            Ldy => "LDY", Lsr => "LSR", Lxa => "LXA", Nop => "NOP", Ora => "ORA",
            Pha => "PHA", Php => "PHP", Pla => "PLA", Plp => "PLP", Rla => "RLA",
            Rol => "ROL", Ror => "ROR", Rra => "RRA", Rti => "RTI", Rts => "RTS",
            Sax => "SAX", Sbc => "SBC", Sbx => "SBX", Sec => "SEC", Sed => "SED",
            Sei => "SEI", Sha => "SHA", Shs => "SHS", Shx => "SHX", Shy => "SHY",
            Slo => "SLO", Sre => "SRE", Sta => "STA", Stx => "STX", Sty => "STY",
            Tax => "TAX", Tay => "TAY", Tsx => "TSX", Txa => "TXA", Txs => "TXS",
            Tya => "TYA",
        }
    }
}

// Opcodes the sequencer refers to directly.
pub const BRK: u8 = 0x00;
pub const NOP_IMPLIED: u8 = 0xEA;

/// Decode an opcode byte.
pub fn decode(opcode: u8) -> (Op, Mode) {
    OPCODES[opcode as usize]
}

use Mode::{
    Absolute as ABS, AbsoluteX as ABX, AbsoluteY as ABY, Accumulator as ACC,
    Immediate as IMM, Implied as IMP, Indirect as IND, IndirectX as IZX, IndirectY as IZY,
    Relative as REL, ZeroPage as ZP, ZeroPageX as ZPX, ZeroPageY as ZPY,
};
use Op::*;

#[rustfmt::skip]
static OPCODES: [(Op, Mode); 256] = [
    // 0x00
    (Brk, IMP), (Ora, IZX), (Jam, IMP), (Slo, IZX), (Nop, ZP),  (Ora, ZP),  (Asl, ZP),  (Slo, ZP),
    (Php, IMP), (Ora, IMM), (Asl, ACC), (Anc, IMM), (Nop, ABS), (Ora, ABS), (Asl, ABS), (Slo, ABS),
    // 0x10
    (Bpl, REL), (Ora, IZY), (Jam, IMP), (Slo, IZY), (Nop, ZPX), (Ora, ZPX), (Asl, ZPX), (Slo, ZPX),
    (Clc, IMP), (Ora, ABY), (Nop, IMP), (Slo, ABY), (Nop, ABX), (Ora, ABX), (Asl, ABX), (Slo, ABX),
    // 0x20
    (Jsr, ABS), (And, IZX), (Jam, IMP), (Rla, IZX), (Bit, ZP),  (And, ZP),  (Rol, ZP),  (Rla, ZP),
    (Plp, IMP), (And, IMM), (Rol, ACC), (Anc, IMM), (Bit, ABS), (And, ABS), (Rol, ABS), (Rla, ABS),
    // 0x30
    (Bmi, REL), (And, IZY), (Jam, IMP), (Rla, IZY), (Nop, ZPX), (And, ZPX), (Rol, ZPX), (Rla, ZPX),
    (Sec, IMP), (And, ABY), (Nop, IMP), (Rla, ABY), (Nop, ABX), (And, ABX), (Rol, ABX), (Rla, ABX),
    // 0x40
    (Rti, IMP), (Eor, IZX), (Jam, IMP), (Sre, IZX), (Nop, ZP),  (Eor, ZP),  (Lsr, ZP),  (Sre, ZP),
    (Pha, IMP), (Eor, IMM), (Lsr, ACC), (Asr, IMM), (Jmp, ABS), (Eor, ABS), (Lsr, ABS), (Sre, ABS),
    // 0x50
    (Bvc, REL), (Eor, IZY), (Jam, IMP), (Sre, IZY), (Nop, ZPX), (Eor, ZPX), (Lsr, ZPX), (Sre, ZPX),
    (Cli, IMP), (Eor, ABY), (Nop, IMP), (Sre, ABY), (Nop, ABX), (Eor, ABX), (Lsr, ABX), (Sre, ABX),
    // 0x60
    (Rts, IMP), (Adc, IZX), (Jam, IMP), (Rra, IZX), (Nop, ZP),  (Adc, ZP),  (Ror, ZP),  (Rra, ZP),
    (Pla, IMP), (Adc, IMM), (Ror, ACC), (Arr, IMM), (Jmp, IND), (Adc, ABS), (Ror, ABS), (Rra, ABS),
    // 0x70
    (Bvs, REL), (Adc, IZY), (Jam, IMP), (Rra, IZY), (Nop, ZPX), (Adc, ZPX), (Ror, ZPX), (Rra, ZPX),
    (Sei, IMP), (Adc, ABY), (Nop, IMP), (Rra, ABY), (Nop, ABX), (Adc, ABX), (Ror, ABX), (Rra, ABX),
    // 0x80
    (Nop, IMM), (Sta, IZX), (Nop, IMM), (Sax, IZX), (Sty, ZP),  (Sta, ZP),  (Stx, ZP),  (Sax, ZP),
    (Dey, IMP), (Nop, IMM), (Txa, IMP), (Ane, IMM), (Sty, ABS), (Sta, ABS), (Stx, ABS), (Sax, ABS),
    // 0x90
    (Bcc, REL), (Sta, IZY), (Jam, IMP), (Sha, IZY), (Sty, ZPX), (Sta, ZPX), (Stx, ZPY), (Sax, ZPY),
    (Tya, IMP), (Sta, ABY), (Txs, IMP), (Shs, ABY), (Shy, ABX), (Sta, ABX), (Shx, ABY), (Sha, ABY),
    // 0xA0
    (Ldy, IMM), (Lda, IZX), (Ldx, IMM), (Lax, IZX), (Ldy, ZP),  (Lda, ZP),  (Ldx, ZP),  (Lax, ZP),
    (Tay, IMP), (Lda, IMM), (Tax, IMP), (Lxa, IMM), (Ldy, ABS), (Lda, ABS), (Ldx, ABS), (Lax, ABS),
    // 0xB0
    (Bcs, REL), (Lda, IZY), (Jam, IMP), (Lax, IZY), (Ldy, ZPX), (Lda, ZPX), (Ldx, ZPY), (Lax, ZPY),
    (Clv, IMP), (Lda, ABY), (Tsx, IMP), (Las, ABY), (Ldy, ABX), (Lda, ABX), (Ldx, ABY), (Lax, ABY),
    // 0xC0
    (Cpy, IMM), (Cmp, IZX), (Nop, IMM), (Dcp, IZX), (Cpy, ZP),  (Cmp, ZP),  (Dec, ZP),  (Dcp, ZP),
    (Iny, IMP), (Cmp, IMM), (Dex, IMP), (Sbx, IMM), (Cpy, ABS), (Cmp, ABS), (Dec, ABS), (Dcp, ABS),
    // 0xD0
    (Bne, REL), (Cmp, IZY), (Jam, IMP), (Dcp, IZY), (Nop, ZPX), (Cmp, ZPX), (Dec, ZPX), (Dcp, ZPX),
    (Cld, IMP), (Cmp, ABY), (Nop, IMP), (Dcp, ABY), (Nop, ABX), (Cmp, ABX), (Dec, ABX), (Dcp, ABX),
    // 0xE0
    (Cpx, IMM), (Sbc, IZX), (Nop, IMM), (Isb, IZX), (Cpx, ZP),  (Sbc, ZP),  (Inc, ZP),  (Isb, ZP),
    (Inx, IMP), (Sbc, IMM), (Nop, IMP), (Sbc, IMM), (Cpx, ABS), (Sbc, ABS), (Inc, ABS), (Isb, ABS),
    // 0xF0
    (Beq, REL), (Sbc, IZY), (Jam, IMP), (Isb, IZY), (Nop, ZPX), (Sbc, ZPX), (Inc, ZPX), (Isb, ZPX),
    (Sed, IMP), (Sbc, ABY), (Nop, IMP), (Isb, ABY), (Nop, ABX), (Sbc, ABX), (Inc, ABX), (Isb, ABX),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_twelve_jam_opcodes() {
        let jams: Vec<u8> = (0..=255u8).filter(|&o| decode(o).0 == Jam).collect();
        assert_eq!(
            jams,
            [0x02, 0x12, 0x22, 0x32, 0x42, 0x52, 0x62, 0x72, 0x92, 0xB2, 0xD2, 0xF2]
        );
    }

    #[test]
    fn test_documented_set_has_151_opcodes() {
        let documented = (0..=255u8)
            .filter(|&o| {
                let (op, _) = decode(o);
                !op.is_undocumented() && !(op == Nop && o != NOP_IMPLIED) && o != 0xEB
            })
            .count();
        assert_eq!(documented, 151);
    }

    #[test]
    fn test_spot_checks() {
        assert_eq!(decode(0xA9), (Lda, Mode::Immediate));
        assert_eq!(decode(0x6C), (Jmp, Mode::Indirect));
        assert_eq!(decode(0x9E), (Shx, Mode::AbsoluteY));
        assert_eq!(decode(0xBB), (Las, Mode::AbsoluteY));
        assert_eq!(decode(0xEB), (Sbc, Mode::Immediate));
        assert_eq!(decode(BRK).0, Brk);
    }
}
