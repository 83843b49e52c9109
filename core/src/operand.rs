use regex::RegexBuilder;
use std::fmt;

/// A `field:pattern` search term, compiled once to a case-insensitive
/// regex at query-compile time.
///
/// Compilation failures are soft: `compiled` is `None` and the term
/// evaluates to `0` (no match) against every record, rather than failing
/// the whole compile or matching everything.
#[derive(Debug, Clone)]
pub struct Term {
    pub field: String,
    pub pattern: String,
    pub compiled: Option<regex::Regex>,
}

impl Term {
    pub fn new(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        let field = field.into();
        let pattern = pattern.into();
        let compiled = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .ok();
        Term {
            field,
            pattern,
            compiled,
        }
    }
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        self.field == other.field && self.pattern == other.pattern
    }
}
impl Eq for Term {}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, self.pattern)
    }
}

/// A symbolic jump target, minted during compilation and resolved to a
/// concrete instruction index during assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub target: String,
    pub offset: Option<usize>,
}

/// The typed argument attached to an instruction.
///
/// Each opcode statically constrains which variant it expects; a VM that
/// encounters the wrong variant for an opcode reports [`crate::error::VmError::BadOperand`]
/// rather than guessing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Integer(i64),
    Label(Label),
    Term(Term),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Integer(i) => write!(f, "{}", i),
            Operand::Label(l) => write!(f, "{}", l.target),
            Operand::Term(t) => write!(f, "{}", t),
        }
    }
}

impl Operand {
    /// The compact form used inside a bytecode disassembly line.
    pub fn bytecode(&self) -> String {
        match self {
            Operand::Integer(i) => i.to_string(),
            Operand::Label(l) => match l.offset {
                Some(off) => off.to_string(),
                None => l.target.clone(),
            },
            Operand::Term(t) => t.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_pattern_has_no_compiled_regex() {
        let term = Term::new("msg", "(unclosed");
        assert!(term.compiled.is_none());
    }

    #[test]
    fn valid_pattern_compiles_case_insensitively() {
        let term = Term::new("msg", "hello");
        let re = term.compiled.expect("should compile");
        assert!(re.is_match("HELLO world"));
    }
}
