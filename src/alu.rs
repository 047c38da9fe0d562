//! The ALU is a set of pure functions over byte operands. Arithmetic is
//! unsigned 8-bit with silent wraparound; no carry or flag state is kept
//! anywhere, so every function here is total.

pub fn add(a: u8, b: u8) -> u8 { a.wrapping_add(b) }
pub fn sub(a: u8, b: u8) -> u8 { a.wrapping_sub(b) }
pub fn and_op(a: u8, b: u8) -> u8 { a & b }
pub fn or_op(a: u8, b: u8) -> u8 { a | b }
pub fn xor_op(a: u8, b: u8) -> u8 { a ^ b }
pub fn nop() -> u8 { 0 }
