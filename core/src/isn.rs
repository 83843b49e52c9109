use crate::operand::{Label, Operand};
use std::fmt;

/// The stack machine's opcode set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Nop,
    Push,
    Pop,
    And,
    Or,
    Not,
    Find,
    Jz,
    Jnz,
    Clear,
    Ret,
}

impl Opcode {
    /// `true` for the instructions the optimiser's short-circuit scan
    /// treats as "stack-affecting" when looking backward for the most
    /// recent one preceding an `OR`.
    pub(crate) fn is_stack_op(self) -> bool {
        matches!(
            self,
            Opcode::Not | Opcode::Or | Opcode::And | Opcode::Push | Opcode::Pop | Opcode::Clear
        )
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Opcode::Nop => "NOP",
            Opcode::Push => "PUSH",
            Opcode::Pop => "POP",
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::Not => "NOT",
            Opcode::Find => "FIND",
            Opcode::Jz => "JZ",
            Opcode::Jnz => "JNZ",
            Opcode::Clear => "CLEAR",
            Opcode::Ret => "RET",
        };
        f.write_str(s)
    }
}

/// One instruction: an optional label it's addressed by, the opcode, and
/// an optional typed operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inst {
    pub label: Option<Label>,
    pub opcode: Opcode,
    pub operand: Option<Operand>,
}

impl Inst {
    pub fn new(opcode: Opcode, operand: Option<Operand>) -> Self {
        Inst {
            label: None,
            opcode,
            operand,
        }
    }

    pub fn labeled(label: Label, opcode: Opcode, operand: Option<Operand>) -> Self {
        Inst {
            label: Some(label),
            opcode,
            operand,
        }
    }

    /// The `NNN:\t<label|8 spaces><opcode><operand?>` disassembly line for
    /// this instruction, minus the leading index — see `Program::disassemble`.
    pub fn bytecode(&self) -> String {
        let label = match &self.label {
            Some(l) => l.target.clone(),
            None => String::new(),
        };
        let mut buf = format!("{:8}{:<6}", label, self.opcode.to_string());
        if let Some(op) = &self.operand {
            buf.push_str(&op.bytecode());
        }
        buf
    }
}

impl fmt::Display for Inst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match &self.label {
            Some(l) => l.target.clone(),
            None => String::new(),
        };
        write!(f, "{:8}{:<10}", label, self.opcode.to_string())?;
        if let Some(op) = &self.operand {
            write!(f, "{}", op)?;
        }
        Ok(())
    }
}
