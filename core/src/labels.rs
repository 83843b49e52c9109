use crate::operand::Label;
use std::collections::HashSet;

/// Mints unique jump-target symbols for one compilation.
///
/// Deliberately a plain per-[`crate::compiler::compile`] value rather than
/// a process-wide singleton, so two compiles running on two threads never
/// share mutable state.
#[derive(Debug, Default)]
pub struct LabelTable {
    gensym: usize,
    minted: HashSet<String>,
}

impl LabelTable {
    pub fn new() -> Self {
        LabelTable::default()
    }

    pub fn make_label(&mut self) -> Label {
        self.gensym += 1;
        let target = format!("L{}", self.gensym);
        self.minted.insert(target.clone());
        Label {
            target,
            offset: None,
        }
    }

    pub fn was_minted(&self, target: &str) -> bool {
        self.minted.contains(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_unique_per_table() {
        let mut lt = LabelTable::new();
        let a = lt.make_label();
        let b = lt.make_label();
        assert_ne!(a.target, b.target);
        assert!(lt.was_minted(&a.target));
        assert!(lt.was_minted(&b.target));
    }

    #[test]
    fn separate_tables_do_not_share_state() {
        let mut t1 = LabelTable::new();
        let mut t2 = LabelTable::new();
        let a = t1.make_label();
        let b = t2.make_label();
        assert_eq!(a.target, b.target, "fresh tables both start at L1");
    }
}
