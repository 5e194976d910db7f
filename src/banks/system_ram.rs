//! 64 KB system RAM with the classic C64 power-on pattern.

use super::bank::Bank;

pub struct SystemRamBank {
    ram: Box<[u8; 0x1_0000]>,
}

impl SystemRamBank {
    pub fn new() -> Self {
        let mut bank = Self {
            ram: Box::new([0; 0x1_0000]),
        };
        bank.reset();
        bank
    }

    /// Fill RAM with the power-up pattern:
    /// ```text
    /// $0000: 00 00 ff ff ff ff 00 00  00 00 ff ff ff ff 00 00
    /// $4000: ff ff 00 00 00 00 ff ff  ff ff 00 00 00 00 ff ff
    /// $8000: (same as $0000)
    /// $C000: (same as $4000)
    /// ```
    pub fn reset(&mut self) {
        let mut byte: u8 = 0x00;
        for j in (0..0x1_0000usize).step_by(0x4000) {
            self.ram[j..j + 0x4000].fill(byte);
            byte = !byte;
            for i in (0x02..0x4000usize).step_by(0x08) {
                let start = j + i;
                let end = (start + 4).min(j + 0x4000);
                self.ram[start..end].fill(byte);
            }
        }
    }

    /// Copy `data` into RAM starting at `address`, clipped at $FFFF.
    pub fn load(&mut self, address: u16, data: &[u8]) {
        let start = address as usize;
        let end = (start + data.len()).min(0x1_0000);
        self.ram[start..end].copy_from_slice(&data[..end - start]);
    }

    /// Side-effect free read for debuggers and tests.
    pub fn peek(&self, address: u16) -> u8 {
        self.ram[address as usize]
    }

    pub fn ram(&self) -> &[u8; 0x1_0000] {
        &self.ram
    }
}

impl Default for SystemRamBank {
    fn default() -> Self {
        Self::new()
    }
}

impl Bank for SystemRamBank {
    fn read(&mut self, address: u16) -> u8 {
        self.ram[address as usize]
    }

    fn write(&mut self, address: u16, value: u8) {
        self.ram[address as usize] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_on_pattern() {
        let ram = SystemRamBank::new();
        assert_eq!(&ram.ram()[0x0000..0x0008], &[0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00]);
        assert_eq!(&ram.ram()[0x4000..0x0004 + 0x4000], &[0xFF, 0xFF, 0x00, 0x00]);
        assert_eq!(ram.peek(0x8002), 0xFF);
        assert_eq!(ram.peek(0xC000), 0xFF);
    }

    #[test]
    fn test_load_clips_at_top_of_memory() {
        let mut ram = SystemRamBank::new();
        ram.load(0xFFFE, &[1, 2, 3, 4]);
        assert_eq!(ram.peek(0xFFFE), 1);
        assert_eq!(ram.peek(0xFFFF), 2);
    }
}
