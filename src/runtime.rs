/// Implements the fetch-decode-execute engine of the simulator.
use crate::instructions::Op;

use super::*;

/// State of the machine after one cycle. A fatal error (unknown opcode,
/// truncated instruction, call stack overflow) surfaces as Err instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Running,
    Halted,
}

impl Core {
    /// Starts executing instructions at the current program counter and
    /// runs until the PC walks off the end of the program (the only normal
    /// halt; there is no HALT opcode) or a fatal error occurs. The final
    /// machine state is left as-is either way, partial execution included.
    ///
    /// A program whose jumps keep the PC inside the buffer runs forever;
    /// bounding that is the caller's problem, not the engine's.
    pub fn exec(&mut self) -> Result<(), Error> {
        loop {
            if self.step()? == Status::Halted {
                verbose_println!(
                    "halted normally at PC={:02X} after {} instruction(s)",
                    self.reg.pc,
                    self.instruction_count
                );
                return Ok(());
            }
        }
    }

    /// One fetch-decode-execute cycle.
    pub fn step(&mut self) -> Result<Status, Error> {
        if self.reg.pc as usize >= self.code.len() {
            return Ok(Status::Halted);
        }
        let inst = instructions::decode(&self.code, self.reg.pc, &self.table).map_err(|mut e| {
            e.ctx = Some(self.reg);
            e
        })?;
        self.reg.ir = inst.desc.opcode;
        // the single place where sequential PC arithmetic happens; control
        // flow instructions overwrite the PC in apply()
        self.reg.pc = self.reg.pc.wrapping_add(inst.size);
        if self.trace {
            println!("{:4}  {:02X}: {}  [{}]", self.instruction_count, inst.addr, inst, self.reg);
        }
        self.apply(&inst)?;
        self.instruction_count += 1;
        Ok(Status::Running)
    }

    /// Apply one decoded instruction to the machine state. On entry the PC
    /// already points past the instruction's operands, which is exactly the
    /// return address CALL must save and the fall-through address for
    /// branches.
    fn apply(&mut self, inst: &Instruction) -> Result<(), Error> {
        match inst.desc.op {
            Op::Nop => {}
            Op::Load => self.write_reg(inst, inst.operand(0), inst.operand(1)),
            Op::Add => self.alu_op(inst, alu::add),
            Op::Sub => self.alu_op(inst, alu::sub),
            Op::And => self.alu_op(inst, alu::and_op),
            Op::Or => self.alu_op(inst, alu::or_op),
            Op::Xor => self.alu_op(inst, alu::xor_op),
            Op::Store => {
                let value = self.read_reg(inst, inst.operand(0));
                self.mem.write(inst.operand(1), value);
            }
            Op::Read => {
                let byte = self.input.next_byte()?;
                self.write_reg(inst, inst.operand(0), byte);
            }
            Op::Write => {
                let value = self.read_reg(inst, inst.operand(0));
                self.output.emit(value)?;
            }
            // no validation that the target is an instruction boundary;
            // landing mid-operand desynchronizes decoding by design of the
            // format
            Op::Jmp => self.reg.pc = inst.operand(0),
            Op::Call => {
                if self.call_stack.len() >= self.stack_limit {
                    return Err(runtime_err!(
                        ErrorKind::CallStackOverflow,
                        Some(self.reg),
                        "call stack exceeded {} entries in CALL at {:02X}",
                        self.stack_limit,
                        inst.addr
                    ));
                }
                self.call_stack.push(self.reg.pc);
                self.reg.pc = inst.operand(0);
            }
            Op::Ret => match self.call_stack.pop() {
                Some(addr) => self.reg.pc = addr,
                None => self.fault(Fault::CallStackUnderflow { pc: inst.addr }),
            },
            Op::Beq => {
                if self.reg.r[0] == self.reg.r[1] {
                    self.reg.pc = inst.operand(0);
                }
            }
            Op::Bne => {
                if self.reg.r[0] != self.reg.r[1] {
                    self.reg.pc = inst.operand(0);
                }
            }
            Op::Int => {
                // stub: acknowledge the signal, no vectoring
                verbose_println!("INT acknowledged at {:02X}", inst.addr);
            }
        }
        Ok(())
    }

    fn alu_op(&mut self, inst: &Instruction, f: fn(u8, u8) -> u8) {
        let index = inst.operand(0);
        let current = self.read_reg(inst, index);
        self.write_reg(inst, index, f(current, inst.operand(1)));
    }

    fn read_reg(&mut self, inst: &Instruction, index: u8) -> u8 {
        if (index as usize) < registers::REG_COUNT {
            self.reg.r[index as usize]
        } else {
            self.fault(Fault::InvalidIndex { pc: inst.addr, index });
            0
        }
    }

    fn write_reg(&mut self, inst: &Instruction, index: u8, value: u8) {
        if (index as usize) < registers::REG_COUNT {
            self.reg.r[index as usize] = value;
        } else {
            self.fault(Fault::InvalidIndex { pc: inst.addr, index });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::{CapturedOutput, ScriptedInput};

    /// Assemble the given lines and return a Core with the program loaded
    /// and reset, plus a handle on the captured output.
    fn machine(lines: &[&str], input: &[u8]) -> (Core, CapturedOutput) {
        let table = OpcodeTable::new();
        let program = Assembler::new(&table).assemble(lines.iter().copied());
        assert!(program.diagnostics.is_empty(), "test program failed to assemble: {:?}", program.diagnostics);
        let output = CapturedOutput::new();
        let mut core = Core::with_devices(
            table,
            Box::new(ScriptedInput::new(input)),
            Box::new(output.clone()),
        );
        core.load_program(&program).unwrap();
        core.reset();
        (core, output)
    }

    #[test]
    fn alu_ops_match_manual_computation() {
        let (mut core, _) = machine(&["LOAD 0 15", "LOAD 1 8", "AND 0 1"], &[]);
        core.exec().unwrap();
        assert_eq!(core.reg.r[0], 15 & 8);
        assert_eq!(core.reg.r[1], 8);
        assert_eq!(core.reg.pc, 9); // one byte past the last operand
        assert_eq!(core.reg.ir, 0x06);
        assert_eq!(core.instruction_count, 3);
    }
    #[test]
    fn add_wraps_modulo_256() {
        let (mut core, _) = machine(&["LOAD 0 10", "ADD 0 250"], &[]);
        core.exec().unwrap();
        assert_eq!(core.reg.r[0], 4);
    }
    #[test]
    fn sub_wraps_modulo_256() {
        let (mut core, _) = machine(&["SUB 0 1"], &[]);
        core.exec().unwrap();
        assert_eq!(core.reg.r[0], 255);
    }
    #[test]
    fn or_and_xor() {
        let (mut core, _) = machine(&["LOAD 0 0xf0", "OR 0 0x0f", "LOAD 1 0xff", "XOR 1 0x0f"], &[]);
        core.exec().unwrap();
        assert_eq!(core.reg.r[0], 0xff);
        assert_eq!(core.reg.r[1], 0xf0);
    }
    #[test]
    fn nop_program_halts_at_pc_n() {
        let (mut core, _) = machine(&["NOP", "NOP", "NOP", "NOP", "NOP"], &[]);
        core.exec().unwrap();
        assert_eq!(core.reg.pc, 5);
        assert_eq!(core.instruction_count, 5);
        assert_eq!(core.reg, registers::Set { pc: 5, ir: 0x05, ..Default::default() });
    }
    #[test]
    fn store_writes_data_space_not_code_space() {
        let (mut core, _) = machine(&["LOAD 0 42", "STORE 0 100"], &[]);
        core.exec().unwrap();
        assert_eq!(core.mem.read(100), 42);
        assert_eq!(core.mem.non_zero(), vec![(100, 42)]);
        // code space untouched
        assert_eq!(core.code, vec![0x01, 0, 42, 0x04, 0, 100]);
    }
    #[test]
    fn read_and_write_flow_through_devices() {
        let (mut core, output) = machine(&["READ 0", "WRITE 0", "READ 1", "WRITE 1"], &[7, 9]);
        core.exec().unwrap();
        assert_eq!(core.reg.r[0], 7);
        assert_eq!(core.reg.r[1], 9);
        assert_eq!(output.bytes(), vec![7, 9]);
    }
    #[test]
    fn jmp_is_absolute() {
        // 00: JMP 5 / 02: LOAD 0 9 (skipped) / 05: NOP
        let (mut core, _) = machine(&["JMP 5", "LOAD 0 9", "NOP"], &[]);
        core.exec().unwrap();
        assert_eq!(core.reg.r[0], 0);
        assert_eq!(core.reg.pc, 6);
    }
    #[test]
    fn jmp_past_the_buffer_halts_normally() {
        let (mut core, _) = machine(&["JMP 200"], &[]);
        core.exec().unwrap();
        assert_eq!(core.reg.pc, 200);
        assert!(core.faults.is_empty());
    }
    #[test]
    fn call_pushes_the_byte_after_its_operand() {
        // 00: CALL 5 / 02..04: NOP / 05: RET
        let (mut core, _) = machine(&["CALL 5", "NOP", "NOP", "NOP", "RET"], &[]);
        assert_eq!(core.step().unwrap(), Status::Running);
        assert_eq!(core.reg.pc, 5);
        assert_eq!(core.call_stack, vec![2]);
        assert_eq!(core.step().unwrap(), Status::Running);
        // RET returns to the byte following CALL's operand, not to 5
        assert_eq!(core.reg.pc, 2);
        assert!(core.call_stack.is_empty());
    }
    #[test]
    fn ret_on_empty_stack_is_a_reported_fault() {
        let (mut core, _) = machine(&["RET", "LOAD 0 1"], &[]);
        core.exec().unwrap();
        // PC was not altered by the failing RET, so the LOAD still ran
        assert_eq!(core.reg.r[0], 1);
        assert_eq!(core.faults, vec![Fault::CallStackUnderflow { pc: 0 }]);
    }
    #[test]
    fn beq_taken_and_not_taken() {
        // R0 == R1 == 0 at power-on, so the branch is taken
        let (mut core, _) = machine(&["BEQ 5", "LOAD 2 9", "NOP"], &[]);
        assert_eq!(core.step().unwrap(), Status::Running);
        assert_eq!(core.reg.pc, 5);
        core.exec().unwrap();
        assert_eq!(core.reg.r[2], 0);
        // not taken: PC falls through to just past the operand
        let (mut core, _) = machine(&["LOAD 0 1", "BEQ 0"], &[]);
        core.step().unwrap();
        core.step().unwrap();
        assert_eq!(core.reg.pc, 5);
    }
    #[test]
    fn bne_taken_and_not_taken() {
        let (mut core, _) = machine(&["LOAD 0 1", "BNE 0"], &[]);
        core.step().unwrap();
        core.step().unwrap();
        assert_eq!(core.reg.pc, 0); // taken: 1 != 0
        let (mut core, _) = machine(&["BNE 7"], &[]);
        core.step().unwrap();
        assert_eq!(core.reg.pc, 2); // not taken: 0 == 0
    }
    #[test]
    fn invalid_register_index_substitutes_zero() {
        let (mut core, output) = machine(&["LOAD 9 7", "WRITE 9"], &[]);
        core.exec().unwrap();
        // the write was dropped and the read substituted zero
        assert_eq!(output.bytes(), vec![0]);
        assert_eq!(core.reg.r, [0, 0, 0, 0]);
        assert_eq!(
            core.faults,
            vec![
                Fault::InvalidIndex { pc: 0, index: 9 },
                Fault::InvalidIndex { pc: 3, index: 9 }
            ]
        );
    }
    #[test]
    fn int_is_a_stub() {
        let (mut core, _) = machine(&["INT"], &[]);
        core.exec().unwrap();
        assert!(core.faults.is_empty());
        assert_eq!(core.reg, registers::Set { pc: 1, ir: 0x10, ..Default::default() });
        assert!(core.call_stack.is_empty());
    }
    #[test]
    fn unknown_opcode_is_fatal() {
        let mut core = Core::new(OpcodeTable::new());
        core.load_bytes(&[0x00]);
        let e = core.exec().unwrap_err();
        assert_eq!(e.kind, ErrorKind::UnknownOpcode);
        assert!(e.ctx.is_some());
    }
    #[test]
    fn desynchronized_jump_hits_unknown_opcode() {
        // JMP 1 lands on LOAD's register operand byte, which is 0x00
        let (mut core, _) = machine(&["LOAD 0 99", "JMP 1"], &[]);
        let e = core.exec().unwrap_err();
        assert_eq!(e.kind, ErrorKind::UnknownOpcode);
    }
    #[test]
    fn truncated_final_instruction_is_fatal() {
        // JMP 4 lands on the JMP operand byte 0x04 (STORE), whose two
        // operands would extend past the end of the program
        let (mut core, _) = machine(&["LOAD 0 1", "JMP 4"], &[]);
        let e = core.exec().unwrap_err();
        assert_eq!(e.kind, ErrorKind::TruncatedInstruction);
    }
    #[test]
    fn runaway_recursion_trips_the_stack_limit() {
        let (mut core, _) = machine(&["CALL 0"], &[]);
        let e = core.exec().unwrap_err();
        assert_eq!(e.kind, ErrorKind::CallStackOverflow);
        assert_eq!(core.call_stack.len(), core.stack_limit);
    }
    #[test]
    fn embedded_criteria_validate_the_run() {
        let table = OpcodeTable::new();
        let program = Assembler::new(&table).assemble(
            ["LOAD 0 15", "LOAD 1 8", "AND 0 1", "STORE 0 100", "#! R0 = 8", "#! M[100] = 8"],
        );
        let mut core = Core::new(table);
        core.load_program(&program).unwrap();
        core.reset();
        core.exec().unwrap();
        core.check_criteria(&program.criteria).unwrap();
    }
}
