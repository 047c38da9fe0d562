use super::assembler::Diagnostic;
use super::test::TestCriterion;
use super::*;

use std::io::Write;

/// One encoded source line, kept for the program listing.
#[derive(Debug)]
pub struct ListingLine {
    pub addr: u8,          // address of the first emitted byte
    pub size: u8,          // number of bytes emitted for this line
    pub src_line_num: usize,
    pub src: String,       // verbatim line from source
}

/// The output of one assembly pass: machine code in source order plus
/// everything the caller needs to judge and observe it.
#[derive(Debug, Default)]
pub struct Program {
    pub code: Vec<u8>,
    pub diagnostics: Vec<Diagnostic>,
    pub criteria: Vec<TestCriterion>,
    pub lines: Vec<ListingLine>,
}

impl Program {
    pub fn new() -> Program { Program::default() }
    pub fn has_errors(&self) -> bool { !self.diagnostics.is_empty() }

    /// Write a listing of the program: address, emitted bytes and source
    /// text for every line that produced code.
    pub fn write_listing(&self, w: &mut dyn Write) -> Result<(), Error> {
        for line in &self.lines {
            let start = line.addr as usize;
            let bytes = &self.code[start..start + line.size as usize];
            let hex: Vec<String> = bytes.iter().map(|b| format!("{:02X}", b)).collect();
            writeln!(w, "{:02X}  {:8}  {}", line.addr, hex.join(" "), line.src)?;
        }
        Ok(())
    }
}
