use super::devices::{Console, InputDevice, OutputDevice};
use super::test::TestCriterion;
use super::*;

/// Non-fatal runtime faults. These are reported and recorded but never stop
/// the run: invalid register reads substitute zero, invalid writes are
/// dropped, and a RET on an empty stack leaves the program counter alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    InvalidIndex { pc: u8, index: u8 },
    CallStackUnderflow { pc: u8 },
}
impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Fault::InvalidIndex { pc, index } => {
                write!(f, "invalid register index {} in instruction at {:02X}", index, pc)
            }
            Fault::CallStackUnderflow { pc } => write!(f, "call stack underflow in RET at {:02X}", pc),
        }
    }
}

/// The Core struct implements the Byte8 simulator.
/// Its implementation spans multiple files: runtime.rs, memory.rs, registers.rs
pub struct Core {
    pub table: OpcodeTable,        // the instruction set, built once per run
    pub reg: registers::Set,       // registers, PC and IR
    pub mem: memory::Memory,       // 256-byte data space
    pub call_stack: Vec<u8>,       // return addresses pushed by CALL
    pub stack_limit: usize,        // explicit cap on call stack depth
    pub code: Vec<u8>,             // the encoded program; code space is separate from mem
    pub input: Box<dyn InputDevice>,
    pub output: Box<dyn OutputDevice>,
    pub faults: Vec<Fault>,        // every non-fatal fault reported so far
    pub instruction_count: u64,    // instructions executed since the last reset
    pub trace: bool,               // if true then display each instruction as it's executed
}

impl Core {
    pub fn new(table: OpcodeTable) -> Core {
        Core::with_devices(table, Box::new(Console), Box::new(Console))
    }
    pub fn with_devices(table: OpcodeTable, input: Box<dyn InputDevice>, output: Box<dyn OutputDevice>) -> Core {
        Core {
            table,
            reg: Default::default(),
            mem: memory::Memory::new(),
            call_stack: Vec::new(),
            stack_limit: config::ARGS.stack_limit as usize,
            code: Vec::new(),
            input,
            output,
            faults: Vec::new(),
            instruction_count: 0,
            trace: config::ARGS.trace,
        }
    }

    /// load_program copies the machine code of the given Program into the
    /// simulator's code space.
    pub fn load_program(&mut self, program: &Program) -> Result<(), Error> {
        if program.code.len() > memory::MEM_SIZE {
            return Err(Error::new(
                ErrorKind::Memory,
                None,
                format!(
                    "program overflowed code space ({} bytes into {})",
                    program.code.len(),
                    memory::MEM_SIZE
                )
                .as_str(),
            ));
        }
        self.code = program.code.clone();
        verbose_println!("loaded {} bytes", self.code.len());
        Ok(())
    }

    /// load_bytes copies raw machine code into the code space.
    /// This is only used in tests atm.
    #[cfg(test)]
    pub fn load_bytes(&mut self, bytes: &[u8]) { self.code = bytes.to_vec(); }

    /// Put the machine back into its power-on state. The loaded program is
    /// kept; everything architectural is zeroed.
    pub fn reset(&mut self) {
        self.reg.reset();
        self.mem.reset();
        self.call_stack.clear();
        self.faults.clear();
        self.instruction_count = 0;
    }

    pub fn fault(&mut self, fault: Fault) {
        warn!("{}", fault);
        self.faults.push(fault);
    }

    /// Read-only snapshot of the architectural state for display; never
    /// mutates anything.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            reg: self.reg,
            non_zero_mem: self.mem.non_zero(),
            stack_depth: self.call_stack.len(),
        }
    }

    /// check_criteria evaluates each TestCriterion provided and returns Err(Error) if any fail
    pub fn check_criteria(&self, criteria: &[TestCriterion]) -> Result<(), Error> {
        if criteria.is_empty() {
            return Ok(());
        }
        info!(
            "Validating {} test criteri{}",
            criteria.len(),
            if criteria.len() == 1 { "on" } else { "a" }
        );
        let mut error_count = 0;
        for tc in criteria {
            print!("\t{} --> ", tc);
            match tc.eval(self) {
                Ok(_) => println!(green!("PASS")),
                Err(e) => {
                    error_count += 1;
                    println!(red!("FAIL {}"), e.msg)
                }
            }
        }
        if error_count == 0 {
            Ok(())
        } else {
            Err(Error {
                kind: ErrorKind::Test,
                ctx: None,
                msg: format!("Failed {error_count} test(s)"),
            })
        }
    }
}

/// What the state dump shows: every register plus every non-zero memory
/// cell, as the original display operation did.
pub struct Snapshot {
    pub reg: registers::Set,
    pub non_zero_mem: Vec<(u8, u8)>,
    pub stack_depth: usize,
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Registers:")?;
        for (n, v) in self.reg.r.iter().enumerate() {
            writeln!(f, "R{}: {} ({:08b})", n, v, v)?;
        }
        writeln!(f, "PC: {}  IR: {:02X}  stack depth: {}", self.reg.pc, self.reg.ir, self.stack_depth)?;
        if self.non_zero_mem.is_empty() {
            writeln!(f, "No non-zero memory locations.")
        } else {
            writeln!(f, "Non-zero memory:")?;
            for (addr, value) in &self.non_zero_mem {
                writeln!(f, "M[{}] = {} ({:08b})", addr, value, value)?;
            }
            Ok(())
        }
    }
}
