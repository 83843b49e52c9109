use crate::error::CompileError;
use crate::isn::{Inst, Opcode};
use crate::labels::LabelTable;
use crate::operand::Operand;
use crate::program::{Program, CAPACITY};

/// Two passes over an unoptimised instruction stream: insert the `OR`
/// short-circuit fragment, then append a terminator and resolve labels.
pub struct Optimizer {
    unoptimised: Vec<Inst>,
    optimised: Vec<Inst>,
    labels: LabelTable,
}

impl Optimizer {
    pub fn new(unoptimised: Vec<Inst>) -> Self {
        Optimizer {
            unoptimised,
            optimised: Vec::new(),
            labels: LabelTable::new(),
        }
    }

    /// Scans `self.unoptimised[1..=idx]` backward for the most recent
    /// stack-affecting instruction, returning its index. Mirrors the
    /// original's `findLastStackOp`, including its choice to never look
    /// at index 0.
    fn find_last_stack_op(&self, idx: usize) -> Option<usize> {
        let mut i = idx;
        while i > 0 {
            if self.unoptimised[i].opcode.is_stack_op() {
                return Some(i);
            }
            i -= 1;
        }
        None
    }

    /// Pass 1: copy instructions in order, materialising the short-circuit
    /// fragment after every non-outermost `OR`.
    fn optimise_pass(&mut self) {
        let mut end_fragment = Vec::new();

        for idx in 0..self.unoptimised.len() {
            let inst = self.unoptimised[idx].clone();
            if inst.opcode == Opcode::Or {
                self.optimised.push(inst);
                if idx > 0 {
                    if let Some(last) = self.find_last_stack_op(idx - 1) {
                        if last > 1 {
                            let label = self.labels.make_label();
                            self.optimised
                                .push(Inst::new(Opcode::Jz, Some(Operand::Label(label.clone()))));
                            end_fragment.push(Inst::new(Opcode::Ret, None));
                            end_fragment.push(Inst::labeled(label, Opcode::Clear, None));
                            end_fragment.push(Inst::new(
                                Opcode::Push,
                                Some(Operand::Integer(0)),
                            ));
                        }
                    }
                }
            } else {
                self.optimised.push(inst);
            }
        }

        self.optimised.append(&mut end_fragment);
        self.optimised.push(Inst::new(Opcode::Ret, None));
    }

    /// Pass 2: resolve every label's symbolic offset to the index of the
    /// instruction that bears it.
    fn assemble(&mut self) -> Result<(), CompileError> {
        let mut resolutions = Vec::new();
        for (idx, inst) in self.optimised.iter().enumerate() {
            if let Some(label) = &inst.label {
                if self.labels.was_minted(&label.target) {
                    resolutions.push((label.target.clone(), idx));
                }
            }
        }

        for inst in &mut self.optimised {
            if let Some(Operand::Label(l)) = &mut inst.operand {
                match resolutions.iter().find(|(t, _)| *t == l.target) {
                    Some((_, idx)) => l.offset = Some(*idx),
                    None => return Err(CompileError::UnresolvedLabel(l.target.clone())),
                }
            }
        }

        Ok(())
    }

    /// Runs both passes, then hands back the optimised program. Fails if
    /// the resulting program exceeds [`CAPACITY`] or a label never
    /// resolves (the latter would be an optimiser bug, not user error).
    pub fn optimize(mut self) -> Result<Program, CompileError> {
        self.optimise_pass();
        self.assemble()?;

        if self.optimised.len() > CAPACITY {
            return Err(CompileError::ProgramTooLarge(
                self.optimised.len(),
                CAPACITY,
            ));
        }

        Ok(Program::from(self.optimised))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isn::Opcode;

    #[test]
    fn ends_with_ret() {
        let code = vec![Inst::new(Opcode::Find, None)];
        let program = Optimizer::new(code).optimize().unwrap();
        assert_eq!(program.get(program.len() - 1).unwrap().opcode, Opcode::Ret);
    }

    #[test]
    fn outermost_or_gets_no_short_circuit_fragment() {
        // FIND FIND OR RET  (no JZ inserted: this OR is the only/outermost stack op)
        let code = vec![
            Inst::new(Opcode::Find, None),
            Inst::new(Opcode::Find, None),
            Inst::new(Opcode::Or, None),
        ];
        let program = Optimizer::new(code).optimize().unwrap();
        assert!(program.iter().all(|i| i.opcode != Opcode::Jz));
    }

    #[test]
    fn second_of_two_sibling_ors_gets_short_circuit_fragment() {
        // FIND FIND OR FIND FIND OR AND : compiled form of
        // AND(OR(a,b), OR(c,d)). The second OR is preceded by a
        // stack-affecting instruction (the first OR) and so is not the
        // program's outermost boolean op.
        let code = vec![
            Inst::new(Opcode::Find, None),
            Inst::new(Opcode::Find, None),
            Inst::new(Opcode::Or, None),
            Inst::new(Opcode::Find, None),
            Inst::new(Opcode::Find, None),
            Inst::new(Opcode::Or, None),
            Inst::new(Opcode::And, None),
        ];
        let program = Optimizer::new(code).optimize().unwrap();
        assert!(program.iter().any(|i| i.opcode == Opcode::Jz));
        for inst in program.iter() {
            if let Some(Operand::Label(l)) = &inst.operand {
                assert!(l.offset.is_some());
            }
        }
    }
}
