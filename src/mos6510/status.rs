//! 6510 processor status register (P).

/// Carry.
pub const C: u8 = 0x01;

/// Zero.
pub const Z: u8 = 0x02;

/// Interrupt disable.  While set, a low IRQ line is ignored.
pub const I: u8 = 0x04;

/// Decimal mode for ADC/SBC (and ARR).
pub const D: u8 = 0x08;

/// Break.  Not a latch on the chip: it is clear only while the CPU is
/// acknowledging a hardware interrupt, so the status byte pushed by
/// IRQ/NMI/RST has it clear and the one pushed by BRK/PHP has it set.
pub const B: u8 = 0x10;

/// Unused bit, always reads as 1.
pub const U: u8 = 0x20;

/// Overflow.  Also settable from outside through the SO pin.
pub const V: u8 = 0x40;

/// Negative.
pub const N: u8 = 0x80;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Status(pub u8);

impl Status {
    /// Value after power-on / RST: only U and B set.
    #[must_use]
    pub const fn new() -> Self {
        Self(U | B)
    }

    /// Status pulled off the stack.  B and U always read back set.
    #[must_use]
    pub const fn from_stack(value: u8) -> Self {
        Self(value | B | U)
    }

    #[must_use]
    pub const fn is_set(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    pub fn set(&mut self, flag: u8) {
        self.0 |= flag;
    }

    pub fn clear(&mut self, flag: u8) {
        self.0 &= !flag;
    }

    pub fn set_if(&mut self, flag: u8, condition: bool) {
        if condition {
            self.set(flag);
        } else {
            self.clear(flag);
        }
    }

    /// Update N and Z from a result byte.
    pub fn update_nz(&mut self, value: u8) {
        self.set_if(N, value & 0x80 != 0);
        self.set_if(Z, value == 0);
    }
}

impl std::fmt::Display for Status {
    /// `NV-BDIZC` style, lowercase for clear bits.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const NAMES: [(u8, char); 8] = [
            (N, 'N'),
            (V, 'V'),
            (U, '-'),
            (B, 'B'),
            (D, 'D'),
            (I, 'I'),
            (Z, 'Z'),
            (C, 'C'),
        ];
        for (flag, name) in NAMES {
            let c = if self.is_set(flag) { name } else { name.to_ascii_lowercase() };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pulled_status_forces_b_and_u() {
        assert_eq!(Status::from_stack(0x00).0, B | U);
        assert_eq!(Status::from_stack(0xC3).0, 0xC3 | B | U);
    }

    #[test]
    fn test_display() {
        let p = Status(N | U | B | I | C);
        assert_eq!(p.to_string(), "Nv-BdIzC");
    }
}
