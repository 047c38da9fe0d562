/// Byte8 register set helpers
use std::fmt;

/// Number of general purpose registers.
pub const REG_COUNT: usize = 4;

/// The full architectural register state: four general purpose byte
/// registers, the program counter and the instruction register.
/// The PC is 8 bits wide and wraps modulo 256 on increment, so a program
/// can never address more than 256 bytes of code space.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct Set {
    pub r: [u8; REG_COUNT],
    pub pc: u8,
    pub ir: u8,
}

impl Set {
    pub fn reset(&mut self) { *self = Set::default(); }
}

impl fmt::Display for Set {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "R0={:02X} R1={:02X} R2={:02X} R3={:02X} PC={:02X} IR={:02X}",
            self.r[0], self.r[1], self.r[2], self.r[3], self.pc, self.ir
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn reset_zeroes_everything() {
        let mut reg = Set {
            r: [1, 2, 3, 4],
            pc: 0x40,
            ir: 0x0b,
        };
        reg.reset();
        assert_eq!(reg, Set::default());
    }
    #[test]
    fn display_is_hex() {
        let reg = Set {
            r: [0x0f, 8, 0, 0],
            pc: 6,
            ir: 2,
        };
        assert_eq!(reg.to_string(), "R0=0F R1=08 R2=00 R3=00 PC=06 IR=02");
    }
}
