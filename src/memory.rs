//! The 256-byte data memory. This is data space only; the encoded program
//! lives in its own buffer and there is no path for a program to modify its
//! own code.
//!
//! Addresses are single bytes, so every possible operand value is a valid
//! cell and access is total by construction.

pub const MEM_SIZE: usize = 256;

pub struct Memory {
    cells: [u8; MEM_SIZE],
}

impl Memory {
    pub fn new() -> Memory { Memory { cells: [0; MEM_SIZE] } }
    pub fn read(&self, addr: u8) -> u8 { self.cells[addr as usize] }
    pub fn write(&mut self, addr: u8, value: u8) { self.cells[addr as usize] = value; }
    pub fn reset(&mut self) { self.cells = [0; MEM_SIZE]; }
    /// Every cell currently holding a non-zero value, in address order.
    pub fn non_zero(&self) -> Vec<(u8, u8)> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &v)| v != 0)
            .map(|(a, &v)| (a as u8, v))
            .collect()
    }
}

impl Default for Memory {
    fn default() -> Self { Self::new() }
}
