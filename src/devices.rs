//! I/O devices consumed by the READ and WRITE opcodes.
//!
//! The engine only needs two capabilities: pull the next input byte and
//! emit an output byte. It treats both as opaque; it neither buffers nor
//! retries them. The console device blocks on stdin, which is the one
//! suspension point in the whole machine.

use super::*;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

pub trait InputDevice {
    fn next_byte(&mut self) -> Result<u8, Error>;
}
pub trait OutputDevice {
    fn emit(&mut self, byte: u8) -> Result<(), Error>;
}

/// Interactive device: reads byte values line-by-line from stdin and
/// prints emitted bytes to stdout.
pub struct Console;

impl InputDevice for Console {
    fn next_byte(&mut self) -> Result<u8, Error> {
        let stdin = io::stdin();
        loop {
            print!("{} ", yellow!("in>"));
            io::stdout().flush()?;
            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                return Err(Error::new(ErrorKind::IO, None, "input device closed"));
            }
            match assembler::parse_byte(line.trim()) {
                Some(b) => return Ok(b),
                None => warn!("expected a byte value in 0..=255, got \"{}\"", line.trim()),
            }
        }
    }
}
impl OutputDevice for Console {
    fn emit(&mut self, byte: u8) -> Result<(), Error> {
        println!("{} {}", yellow!("out>"), byte);
        Ok(())
    }
}

/// Input device fed from a fixed byte script. Pulling past the end of the
/// script is an IO error, mirroring a closed console.
pub struct ScriptedInput {
    bytes: VecDeque<u8>,
}
impl ScriptedInput {
    pub fn new(bytes: &[u8]) -> ScriptedInput {
        ScriptedInput {
            bytes: bytes.iter().copied().collect(),
        }
    }
}
impl InputDevice for ScriptedInput {
    fn next_byte(&mut self) -> Result<u8, Error> {
        self.bytes
            .pop_front()
            .ok_or_else(|| Error::new(ErrorKind::IO, None, "scripted input exhausted"))
    }
}

/// Output device that collects every emitted byte for later inspection.
/// Clones share the same buffer, so a caller can keep a handle while the
/// Core owns the device.
#[derive(Clone, Default)]
pub struct CapturedOutput {
    bytes: Rc<RefCell<Vec<u8>>>,
}
impl CapturedOutput {
    pub fn new() -> CapturedOutput { CapturedOutput::default() }
    pub fn bytes(&self) -> Vec<u8> { self.bytes.borrow().clone() }
}
impl OutputDevice for CapturedOutput {
    fn emit(&mut self, byte: u8) -> Result<(), Error> {
        self.bytes.borrow_mut().push(byte);
        Ok(())
    }
}
