use crate::token::Token;
use std::fmt;

/// One node of the parsed query tree.
///
/// Only five [`Token`] kinds ever appear here: `And`, `Or`, `Not`, `Term`,
/// and transiently `Illegal` for an uninitialised node the parser has not
/// yet assigned a kind to. `Term` literals have the canonical form
/// `field:pattern` (colon-joined, unquoted).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Syntax {
    pub token: Token,
    pub literal: String,
    pub children: Vec<Syntax>,
}

impl Syntax {
    pub fn new_illegal() -> Self {
        Syntax {
            token: Token::Illegal,
            literal: String::new(),
            children: Vec::new(),
        }
    }

    pub fn new_term(literal: impl Into<String>) -> Self {
        Syntax {
            token: Token::Term,
            literal: literal.into(),
            children: Vec::new(),
        }
    }

    pub fn add_child(&mut self, node: Syntax) {
        self.children.push(node);
    }

    /// Sorts this node's children so non-terminal subtrees precede
    /// terminal `Term` children, recursing into every child. This gives
    /// the compiler a deterministic emission order and is what lets the
    /// optimiser's `OR` short-circuit rewrite key off "most recent
    /// stack-affecting instruction".
    pub fn sort(&mut self) {
        self.children
            .sort_by_key(|c| c.token.sort_rank());
        for child in &mut self.children {
            child.sort();
        }
    }

    /// Splits a canonical `field:pattern` term literal into its two parts.
    ///
    /// Panics if called on a non-`Term` node whose literal lacks a colon;
    /// the parser never constructs such a node.
    pub fn split_term(&self) -> (&str, &str) {
        debug_assert_eq!(self.token, Token::Term);
        let idx = self
            .literal
            .find(':')
            .expect("TERM literal must be field:pattern");
        (&self.literal[..idx], &self.literal[idx + 1..])
    }

    fn dump(&self, indent: usize) -> String {
        let children = self.dump_children(indent + 1);
        format!("{} [{}] {}{}", indent, self.token, self.literal, children)
    }

    fn dump_children(&self, indent: usize) -> String {
        if self.children.is_empty() {
            return String::new();
        }
        let leader = format!("\n{}", "  ".repeat(indent));
        self.children
            .iter()
            .map(|c| format!("{}{}", leader, c.dump(indent)))
            .collect()
    }
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dump(0))
    }
}
