//! The Byte8 instruction set and its encoding.
//!
//! Every instruction encodes as a single opcode byte immediately followed by
//! exactly `arity` raw operand bytes. There are no length prefixes and no
//! alignment, so decoding depends entirely on walking opcodes in order; a
//! jump that lands mid-operand desynchronizes everything after it. That is
//! an accepted property of the format, not something the decoder tries to
//! detect.

use super::*;
use std::collections::HashMap;
use std::fmt;

/// Operation selector used by the runtime dispatcher.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Op {
    Nop,
    Load,
    Add,
    Sub,
    Store,
    And,
    Or,
    Xor,
    Read,
    Write,
    Jmp,
    Call,
    Ret,
    Beq,
    Bne,
    Int,
}

/// Static metadata for one instruction: mnemonic, opcode byte and the
/// number of operand bytes that follow the opcode.
#[derive(Debug)]
pub struct Descriptor {
    pub op: Op,
    pub name: &'static str,
    pub opcode: u8,
    pub arity: usize,
}

#[rustfmt::skip]
static DESCRIPTORS: [Descriptor; 16] = [
    Descriptor { op: Op::Load,  name: "LOAD",  opcode: 0x01, arity: 2 },
    Descriptor { op: Op::Add,   name: "ADD",   opcode: 0x02, arity: 2 },
    Descriptor { op: Op::Sub,   name: "SUB",   opcode: 0x03, arity: 2 },
    Descriptor { op: Op::Store, name: "STORE", opcode: 0x04, arity: 2 },
    Descriptor { op: Op::Nop,   name: "NOP",   opcode: 0x05, arity: 0 },
    Descriptor { op: Op::And,   name: "AND",   opcode: 0x06, arity: 2 },
    Descriptor { op: Op::Or,    name: "OR",    opcode: 0x07, arity: 2 },
    Descriptor { op: Op::Xor,   name: "XOR",   opcode: 0x08, arity: 2 },
    Descriptor { op: Op::Read,  name: "READ",  opcode: 0x09, arity: 1 },
    Descriptor { op: Op::Write, name: "WRITE", opcode: 0x0a, arity: 1 },
    Descriptor { op: Op::Jmp,   name: "JMP",   opcode: 0x0b, arity: 1 },
    Descriptor { op: Op::Call,  name: "CALL",  opcode: 0x0c, arity: 1 },
    Descriptor { op: Op::Ret,   name: "RET",   opcode: 0x0d, arity: 0 },
    Descriptor { op: Op::Beq,   name: "BEQ",   opcode: 0x0e, arity: 1 },
    Descriptor { op: Op::Bne,   name: "BNE",   opcode: 0x0f, arity: 1 },
    Descriptor { op: Op::Int,   name: "INT",   opcode: 0x10, arity: 0 },
];

/// Immutable lookup tables mapping mnemonics and opcode bytes to their
/// descriptors. Built once and passed by reference into both the Assembler
/// and the Core; there is no global table.
pub struct OpcodeTable {
    by_name: HashMap<&'static str, &'static Descriptor>,
    by_code: [Option<&'static Descriptor>; 256],
}

impl OpcodeTable {
    pub fn new() -> OpcodeTable {
        let mut by_name = HashMap::new();
        let mut by_code: [Option<&'static Descriptor>; 256] = [None; 256];
        for desc in &DESCRIPTORS {
            by_name.insert(desc.name, desc);
            by_code[desc.opcode as usize] = Some(desc);
        }
        OpcodeTable { by_name, by_code }
    }
    /// Mnemonic lookup; case sensitive.
    pub fn by_name(&self, name: &str) -> Option<&'static Descriptor> { self.by_name.get(name).copied() }
    pub fn by_opcode(&self, opcode: u8) -> Option<&'static Descriptor> { self.by_code[opcode as usize] }
    pub fn descriptors(&self) -> impl Iterator<Item = &'static Descriptor> { DESCRIPTORS.iter() }
}

impl Default for OpcodeTable {
    fn default() -> Self { Self::new() }
}

/// One decoded instruction: its descriptor, its operand bytes, the address
/// of its opcode and its total encoded size.
#[derive(Clone, Copy, Debug)]
pub struct Instruction {
    pub desc: &'static Descriptor,
    pub operands: [u8; 2],
    pub addr: u8,
    pub size: u8,
}

impl Instruction {
    pub fn operand(&self, n: usize) -> u8 { self.operands[n] }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:5}", self.desc.name)?;
        for n in 0..self.desc.arity {
            write!(f, " {}", self.operands[n])?;
        }
        Ok(())
    }
}

/// Decode the instruction whose opcode byte sits at `pc`.
///
/// Operand bytes are read from the (not yet incremented) addresses
/// following the opcode; they must lie inside the program buffer. A final
/// instruction whose operands would extend past the end of the buffer is a
/// `TruncatedInstruction` error rather than an out-of-range read. The
/// caller is responsible for advancing the program counter by
/// `Instruction::size`; decode never touches machine state.
pub fn decode(code: &[u8], pc: u8, table: &OpcodeTable) -> Result<Instruction, Error> {
    let opcode = code[pc as usize];
    let desc = if let Some(desc) = table.by_opcode(opcode) {
        desc
    } else {
        return Err(runtime_err!(
            ErrorKind::UnknownOpcode,
            None,
            "unknown opcode {:02X} at {:02X}",
            opcode,
            pc
        ));
    };
    let mut operands = [0u8; 2];
    for n in 0..desc.arity {
        let at = pc as usize + 1 + n;
        if at >= code.len() {
            return Err(runtime_err!(
                ErrorKind::TruncatedInstruction,
                None,
                "truncated instruction: {} at {:02X} needs {} operand byte(s) but the program ends at {:02X}",
                desc.name,
                pc,
                desc.arity,
                code.len()
            ));
        }
        operands[n] = code[at];
    }
    Ok(Instruction {
        desc,
        operands,
        addr: pc,
        size: 1 + desc.arity as u8,
    })
}
