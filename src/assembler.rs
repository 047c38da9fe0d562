//! The Byte8 assembler is a single pass over the source lines.
//!
//! Each line is either a test criterion (`#! lhs = value`), a comment/blank
//! line, or one instruction: a mnemonic followed by whitespace-delimited
//! numeric operands, with `#` starting a comment anywhere on the line.
//! There are no labels and no directives; branch and jump targets are
//! absolute byte addresses written by hand. That is a known ergonomic gap
//! of the source format, not something the assembler papers over.
//!
//! Errors never abort the pass. Every invalid line is recorded as a
//! Diagnostic and skipped whole, so the caller gets the encoding of all the
//! valid lines plus the full list of problems and can decide whether a
//! partially-broken program is still worth running. A line that fails any
//! validation emits no bytes at all; encoding is atomic per line.

use super::*;

use regex::Regex;
use std::fs::File;
use std::io::{self, BufRead};

/// Problems found during assembly. These are collected, not thrown.
#[derive(Debug, PartialEq, Eq)]
pub enum Diagnostic {
    UnknownInstruction {
        line: usize,
        mnemonic: String,
    },
    OperandCountMismatch {
        line: usize,
        mnemonic: &'static str,
        expected: usize,
        got: usize,
    },
    InvalidOperand {
        line: usize,
        mnemonic: &'static str,
        token: String,
    },
    MalformedCriterion {
        line: usize,
        text: String,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Diagnostic::UnknownInstruction { line, mnemonic } => {
                write!(f, "line {}: unknown instruction \"{}\"", line, mnemonic)
            }
            Diagnostic::OperandCountMismatch {
                line,
                mnemonic,
                expected,
                got,
            } => write!(
                f,
                "line {}: {} takes {} operand(s) but {} were given",
                line, mnemonic, expected, got
            ),
            Diagnostic::InvalidOperand { line, mnemonic, token } => {
                write!(f, "line {}: invalid operand \"{}\" for {}", line, token, mnemonic)
            }
            Diagnostic::MalformedCriterion { line, text } => {
                write!(f, "line {}: malformed test criterion \"{}\"", line, text)
            }
        }
    }
}

/// Parse a byte literal: decimal, '0x' hex or '$' hex.
pub fn parse_byte(token: &str) -> Option<u8> {
    if let Some(hex) = token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        u8::from_str_radix(hex, 16).ok()
    } else if let Some(hex) = token.strip_prefix('$') {
        u8::from_str_radix(hex, 16).ok()
    } else {
        token.parse::<u8>().ok()
    }
}

/// The container for our assembler methods.
pub struct Assembler<'a> {
    table: &'a OpcodeTable,
    re_criterion: Regex, // matches a test criterion line
}

impl<'a> Assembler<'a> {
    pub fn new(table: &'a OpcodeTable) -> Assembler<'a> {
        Assembler {
            table,
            re_criterion: Regex::new(r"^\s*#![ \t]*([^\s]+)[ \t]*=[ \t]*([^\s]+)[ \t]*.*$").unwrap(),
        }
    }

    /// Attempt to load and assemble a program from a file with the given path.
    pub fn assemble_from_file(&self, path: &str) -> Result<Program, Error> {
        let src = io::BufReader::new(File::open(path)?)
            .lines()
            .collect::<Result<Vec<String>, io::Error>>()?;
        Ok(self.assemble(src.iter().map(String::as_str)))
    }

    /// Assemble the given source lines into a Program.
    ///
    /// The returned Program carries the machine code of every valid line in
    /// source order, the diagnostics for every invalid one, any embedded
    /// test criteria, and a listing entry per encoded line.
    pub fn assemble<'s, I: IntoIterator<Item = &'s str>>(&self, lines: I) -> Program {
        let mut program = Program::new();
        for (n, line) in lines.into_iter().enumerate() {
            let src_line_num = n + 1;
            self.assemble_line(&mut program, src_line_num, line);
        }
        program
    }

    fn assemble_line(&self, program: &mut Program, src_line_num: usize, line: &str) {
        // criterion lines start with the comment marker, so check for them
        // before stripping comments
        if let Some(c) = self.re_criterion.captures(line) {
            match test::TestCriterion::parse(src_line_num, &c[1], &c[2]) {
                Ok(tc) => program.criteria.push(tc),
                Err(_) => program.diagnostics.push(Diagnostic::MalformedCriterion {
                    line: src_line_num,
                    text: line.trim().to_string(),
                }),
            }
            return;
        }
        let code_part = line.split('#').next().unwrap_or("");
        let mut tokens = code_part.split_whitespace();
        let mnemonic = match tokens.next() {
            Some(t) => t,
            None => return, // blank or comment-only line
        };
        let desc = match self.table.by_name(mnemonic) {
            Some(d) => d,
            None => {
                program.diagnostics.push(Diagnostic::UnknownInstruction {
                    line: src_line_num,
                    mnemonic: mnemonic.to_string(),
                });
                return;
            }
        };
        let operand_tokens: Vec<&str> = tokens.collect();
        if operand_tokens.len() != desc.arity {
            program.diagnostics.push(Diagnostic::OperandCountMismatch {
                line: src_line_num,
                mnemonic: desc.name,
                expected: desc.arity,
                got: operand_tokens.len(),
            });
            return;
        }
        let mut operands = Vec::with_capacity(desc.arity);
        for token in operand_tokens {
            match parse_byte(token) {
                Some(b) => operands.push(b),
                None => {
                    program.diagnostics.push(Diagnostic::InvalidOperand {
                        line: src_line_num,
                        mnemonic: desc.name,
                        token: token.to_string(),
                    });
                    return;
                }
            }
        }
        let addr = program.code.len() as u8;
        program.code.push(desc.opcode);
        program.code.extend_from_slice(&operands);
        program.lines.push(ListingLine {
            addr,
            size: 1 + operands.len() as u8,
            src_line_num,
            src: line.trim_end().to_string(),
        });
    }
}
