//! # The Byte8 Assembler and CPU Simulator written in Rust.
//!
//! Byte8 is a small teaching machine: four byte-wide registers, an 8-bit
//! program counter, 256 bytes of data memory and a sixteen-opcode
//! instruction set with an explicit call stack. The assembler turns
//! line-oriented mnemonic text into a byte-encoded program; the simulator
//! fetches, decodes and executes those bytes.
//!
//! ## Getting Started
//! To assemble and run a program:
//! ```
//! cargo run -- -r /path/to/program.asm
//! ```
//! ...or if you've already built the binary then just...
//! ```
//! byte8 -r /path/to/program.asm
//! ```
//! ## Options
//! Help for command line options is available using -h or --help.
#[macro_use]
mod macros;
mod alu;
mod assembler;
mod config;
mod core;
mod devices;
mod error;
mod instructions;
mod memory;
mod program;
mod registers;
mod runtime;
use crate::assembler::Assembler;
use std::ffi::OsStr;
use std::path::Path;
use std::result::Result;
use std::{fmt, io};
pub(crate) use {crate::core::*, crate::error::*, crate::instructions::*, program::*};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    config::init();
    // process_file does all the work
    if let Err(e) = process_file(config::ARGS.file.as_str()) {
        println!("{}", e);
        return Err(Box::new(e));
    }
    Ok(())
}
/// process_file drives the top level functionality (assemble, list, run) of the app
fn process_file(filename: &str) -> Result<(), Error> {
    let path = Path::new(filename);
    let ext = path.extension().and_then(OsStr::to_str).unwrap_or("");
    if !matches!(ext.to_ascii_lowercase().as_str(), "asm" | "s") {
        return Err(general_err!("unrecognized file type"));
    }
    let table = OpcodeTable::new();
    let asm = Assembler::new(&table);
    info!("Assembling {}", filename);
    let program = asm.assemble_from_file(filename)?;
    for d in &program.diagnostics {
        warn!("{}", d);
    }
    if program.has_errors() {
        // diagnostics are not fatal; the encoded program simply skips the
        // offending lines and the caller decides whether to run it anyway
        warn!("{} line(s) failed to assemble", program.diagnostics.len());
    }
    verbose_println!("assembled {} bytes", program.code.len());
    if config::ARGS.list {
        program.write_listing(&mut io::stdout())?;
    }
    if config::run() {
        let mut core = Core::new(table);
        core.load_program(&program)?;
        core.reset();
        info!("Executing {}", filename);
        core.exec()?;
        if config::ARGS.dump {
            print!("{}", core.snapshot());
        }
        core.check_criteria(&program.criteria)?;
    }
    Ok(())
}
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    #[test]
    pub fn rudimentary() -> Result<(), Error> {
        // LOAD 0 0x38; ADD 0 0x2b; STORE 0 0x42
        const PROGRAM01: &[u8] = &[0x01, 0x00, 0x38, 0x02, 0x00, 0x2b, 0x04, 0x00, 0x42];
        let mut core = Core::new(OpcodeTable::new());
        info!("Starting Byte8 rudimentary test...");
        core.load_bytes(PROGRAM01);
        core.reset();
        info!("Running simple test program...");
        let mut step = 0;
        while core.step()? == runtime::Status::Running {
            step += 1;
            println!("{:2}  [{}]", step, core.reg);
            if step > PROGRAM01.len() {
                return Err(general_err!("Failed to find end of basic test program."));
            }
        }
        // check outcome
        assert_eq!(core.mem.read(0x42), 0x63);
        assert_eq!(core.reg.pc, PROGRAM01.len() as u8);
        info!("Rudimentary test complete.");
        Ok(())
    }
    #[test]
    fn various_programs() -> Result<(), Error> {
        // try to load and run each .asm file in the ./test directory
        // all of them should run successfully and pass all embedded test criteria
        const TEST_PATH: &str = "test";
        println!("Attempting to run all .asm files in {}", TEST_PATH);
        let mut entries = fs::read_dir(TEST_PATH)?
            .map(|res| res.map(|e| e.path()))
            .collect::<Result<Vec<_>, io::Error>>()?;
        entries.sort();
        for e in entries {
            if !e.is_file() {
                continue;
            }
            if let Some(ext) = e.extension() {
                if !ext.eq_ignore_ascii_case("asm") {
                    continue;
                }
                process_file(e.to_str().unwrap())?
            }
        }
        Ok(())
    }
    #[test]
    fn runtime_errors() -> Result<(), Error> {
        // try to load and run each .asm file in the ./test/errors directory
        // every one of them should cleanly return a runtime-class error
        const TEST_PATH: &str = "test/errors";
        println!("Attempting to run all .asm files in {}", TEST_PATH);
        let mut entries = fs::read_dir(TEST_PATH)?
            .map(|res| res.map(|e| e.path()))
            .collect::<Result<Vec<_>, io::Error>>()?;
        entries.sort();
        for pb in entries {
            if !pb.is_file() {
                continue;
            }
            if let Some(ext) = pb.extension() {
                if !ext.eq_ignore_ascii_case("asm") {
                    continue;
                }
                if let Some(msg) = match process_file(pb.to_str().unwrap()) {
                    Err(e) if e.kind.is_runtime() => None,
                    Err(e) => Some(e.to_string()),
                    Ok(()) => Some("Ok()".to_string()),
                } {
                    panic!(
                        "Expected a runtime error when running {} but got {}",
                        pb.to_str().unwrap(),
                        msg
                    )
                }
            }
        }
        Ok(())
    }
}
