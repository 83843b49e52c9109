use crate::error::VmError;
use crate::isn::Opcode;
use crate::operand::Operand;
use crate::program::{Program, CAPACITY};
use crate::record::Record;
use crate::stack::Stack;

/// A stack machine that loads one compiled program and evaluates it
/// against one decoded record at a time.
///
/// One `Vm` owns one stack, one program, and one current record;
/// concurrent calls against the same `Vm` are not supported. A caller
/// that wants to parallelise across records constructs one `Vm` per
/// worker, sharing the same compiled [`Program`]/regexes read-only.
pub struct Vm {
    stack: Stack,
    program: Program,
    pc: usize,
    ac: i64,
    halted: bool,
    record: Option<Record>,
}

impl Default for Vm {
    fn default() -> Self {
        Vm::new()
    }
}

impl Vm {
    pub fn new() -> Self {
        Vm {
            stack: Stack::new(),
            program: Program::new(),
            pc: 0,
            ac: 0,
            halted: true,
            record: None,
        }
    }

    /// Loads a compiled program. Requires the VM to be halted (idle).
    pub fn load_code(&mut self, program: Program) -> Result<(), VmError> {
        if !self.halted {
            return Err(VmError::Busy);
        }
        if program.len() > CAPACITY {
            return Err(VmError::ProgramTooLarge(program.len(), CAPACITY));
        }
        self.program = program;
        Ok(())
    }

    /// Installs the record the next `run()` will evaluate against.
    /// Requires the VM to be halted (idle).
    pub fn set_record(&mut self, record: Record) -> Result<(), VmError> {
        if !self.halted {
            return Err(VmError::Busy);
        }
        self.record = Some(record);
        Ok(())
    }

    /// The `ac` register after the most recent `run()`: the program's
    /// return value, `0` or `1`.
    pub fn result(&self) -> i64 {
        self.ac
    }

    /// Resets `pc`/`ac`/the stack and executes the loaded program against
    /// the installed record to completion.
    pub fn run(&mut self) -> Result<i64, VmError> {
        self.stack.clear();
        self.pc = 0;
        self.ac = 0;
        self.halted = false;

        loop {
            if self.pc == self.program.len() {
                // A correctly compiled program always ends with RET; if we
                // fall off the end it means the program was malformed.
                self.halted = true;
                return Err(VmError::Overrun);
            }

            let inst = self
                .program
                .get(self.pc)
                .expect("pc was range-checked above")
                .clone();

            let mut jumped = false;

            match inst.opcode {
                Opcode::Nop => {}

                Opcode::Push => {
                    let v = match &inst.operand {
                        Some(Operand::Integer(v)) => *v,
                        _ => return Err(VmError::BadOperand(self.pc)),
                    };
                    if !self.stack.push(v) {
                        return Err(VmError::StackOverflow(self.pc));
                    }
                }

                Opcode::Pop => {
                    self.stack
                        .pop()
                        .ok_or(VmError::StackUnderflow(self.pc))?;
                }

                Opcode::And => {
                    let vals = self.stack.drain_all();
                    let res = vals.iter().all(|&v| v == 1);
                    self.push_bool(res)?;
                }

                Opcode::Or => {
                    let vals = self.stack.drain_all();
                    let res = vals.iter().any(|&v| v == 1);
                    self.push_bool(res)?;
                }

                Opcode::Not => {
                    let vals = self.stack.drain_all();
                    let res = vals.iter().all(|&v| v == 0);
                    self.push_bool(res)?;
                }

                Opcode::Find => {
                    let term = match &inst.operand {
                        Some(Operand::Term(t)) => t,
                        _ => return Err(VmError::BadOperand(self.pc)),
                    };
                    let found = self
                        .record
                        .as_ref()
                        .and_then(|r| r.get_str(&term.field))
                        .zip(term.compiled.as_ref())
                        .is_some_and(|(hay, re)| re.is_match(hay));
                    self.push_bool(found)?;
                }

                Opcode::Jz => {
                    let val = self.stack.pop().ok_or(VmError::StackUnderflow(self.pc))?;
                    if val == 0 {
                        self.pc = self.jump_target(&inst)?;
                        jumped = true;
                    }
                }

                Opcode::Jnz => {
                    let val = self.stack.pop().ok_or(VmError::StackUnderflow(self.pc))?;
                    if val != 0 {
                        self.pc = self.jump_target(&inst)?;
                        jumped = true;
                    }
                }

                Opcode::Clear => self.stack.clear(),

                Opcode::Ret => {
                    let val = self.stack.pop().ok_or(VmError::StackUnderflow(self.pc))?;
                    self.ac = val;
                    self.halted = true;
                    return Ok(self.ac);
                }
            }

            if !jumped {
                self.pc += 1;
            }
        }
    }

    fn push_bool(&mut self, val: bool) -> Result<(), VmError> {
        if !self.stack.push(if val { 1 } else { 0 }) {
            return Err(VmError::StackOverflow(self.pc));
        }
        Ok(())
    }

    fn jump_target(&self, inst: &crate::isn::Inst) -> Result<usize, VmError> {
        match &inst.operand {
            Some(Operand::Label(l)) => match l.offset {
                Some(off) if off < self.program.len() => Ok(off),
                Some(off) => Err(VmError::BadJumpTarget(off)),
                None => Err(VmError::BadJumpTarget(self.pc)),
            },
            _ => Err(VmError::BadOperand(self.pc)),
        }
    }
}
