//! Arithmetic with NMOS 6510 flag behaviour.
//!
//! Pure functions over the accumulator, the operand and the status
//! register, so the decimal-mode quirks can be pinned down without
//! running the instruction sequencer.

use super::status::{Status, C, D, N, V, Z};

fn carry(p: &Status) -> u32 {
    u32::from(p.is_set(C))
}

/// ADC.  In decimal mode Z comes from the binary sum, N and V from the
/// high digit before the final correction, C from the corrected result.
pub fn adc(a: u8, s: u8, p: &mut Status) -> u8 {
    let c = carry(p);
    let (a32, s32) = (u32::from(a), u32::from(s));
    let binary = a32 + s32 + c;

    if p.is_set(D) {
        let mut lo = (a32 & 0x0F) + (s32 & 0x0F) + c;
        let mut hi = (a32 & 0xF0) + (s32 & 0xF0);
        if lo > 0x09 {
            lo += 0x06;
        }
        if lo > 0x0F {
            hi += 0x10;
        }

        p.set_if(Z, binary & 0xFF == 0);
        p.set_if(N, hi & 0x80 != 0);
        p.set_if(V, (hi ^ a32) & 0x80 != 0 && (a32 ^ s32) & 0x80 == 0);
        if hi > 0x90 {
            hi += 0x60;
        }

        p.set_if(C, hi > 0xFF);
        ((hi & 0xF0) | (lo & 0x0F)) as u8
    } else {
        p.set_if(C, binary > 0xFF);
        p.set_if(V, (binary ^ a32) & 0x80 != 0 && (a32 ^ s32) & 0x80 == 0);
        let result = binary as u8;
        p.update_nz(result);
        result
    }
}

/// SBC.  All flags come from the binary difference, in both modes.
pub fn sbc(a: u8, s: u8, p: &mut Status) -> u8 {
    let borrow = 1 - carry(p) as i32;
    let (a32, s32) = (i32::from(a), i32::from(s));
    let binary = a32 - s32 - borrow;

    p.set_if(C, binary >= 0);
    p.set_if(V, (binary ^ a32) & 0x80 != 0 && (a32 ^ s32) & 0x80 != 0);
    p.update_nz(binary as u8);

    if p.is_set(D) {
        let mut lo = (a32 & 0x0F) - (s32 & 0x0F) - borrow;
        let mut hi = (a32 & 0xF0) - (s32 & 0xF0);
        if lo & 0x10 != 0 {
            lo -= 0x06;
            hi -= 0x10;
        }
        if hi & 0x100 != 0 {
            hi -= 0x60;
        }
        ((hi & 0xF0) | (lo & 0x0F)) as u8
    } else {
        binary as u8
    }
}

/// CMP / CPX / CPY / DCP.
pub fn compare(reg: u8, s: u8, p: &mut Status) {
    p.update_nz(reg.wrapping_sub(s));
    p.set_if(C, reg >= s);
}

/// ARR: AND, then ROR with a decimal-mode fix-up of its own.
pub fn arr(a: u8, imm: u8, p: &mut Status) -> u8 {
    let data = imm & a;
    let mut result = (data >> 1) | if p.is_set(C) { 0x80 } else { 0 };

    if p.is_set(D) {
        p.set_if(N, p.is_set(C));
        p.set_if(Z, result == 0);
        p.set_if(V, (data ^ result) & 0x40 != 0);

        if (data & 0x0F) + (data & 0x01) > 5 {
            result = (result & 0xF0) | (result.wrapping_add(6) & 0x0F);
        }
        let fix_high = ((u16::from(data) + u16::from(data & 0x10)) & 0x1F0) > 0x50;
        p.set_if(C, fix_high);
        if fix_high {
            result = result.wrapping_add(0x60);
        }
    } else {
        p.update_nz(result);
        p.set_if(C, result & 0x40 != 0);
        p.set_if(V, ((result & 0x40) ^ ((result & 0x20) << 1)) != 0);
    }
    result
}

/// SBX: X = (A & X) - imm, carry as for CMP, no decimal mode.
pub fn sbx(a: u8, x: u8, imm: u8, p: &mut Status) -> u8 {
    let tmp = i32::from(a & x) - i32::from(imm);
    let result = tmp as u8;
    p.update_nz(result);
    p.set_if(C, tmp >= 0);
    result
}

pub fn asl(value: u8, p: &mut Status) -> u8 {
    p.set_if(C, value & 0x80 != 0);
    let result = value << 1;
    p.update_nz(result);
    result
}

pub fn lsr(value: u8, p: &mut Status) -> u8 {
    p.set_if(C, value & 0x01 != 0);
    let result = value >> 1;
    p.update_nz(result);
    result
}

pub fn rol(value: u8, p: &mut Status) -> u8 {
    let result = (value << 1) | u8::from(p.is_set(C));
    p.set_if(C, value & 0x80 != 0);
    p.update_nz(result);
    result
}

pub fn ror(value: u8, p: &mut Status) -> u8 {
    let result = (value >> 1) | if p.is_set(C) { 0x80 } else { 0 };
    p.set_if(C, value & 0x01 != 0);
    p.update_nz(result);
    result
}

/// BIT: Z from A & M, N and V copied from the operand.
pub fn bit(a: u8, s: u8, p: &mut Status) {
    p.set_if(Z, a & s == 0);
    p.set_if(N, s & 0x80 != 0);
    p.set_if(V, s & 0x40 != 0);
}
