use crate::ast::Syntax;
use crate::isn::{Inst, Opcode};
use crate::operand::{Operand, Term};
use crate::token::Token;

/// Lowers an AST into the unoptimised stack form: a post-order emission
/// where every boolean node emits its children in order and then its own
/// n-ary reducer opcode, and every `Term` leaf emits a single `FIND`.
pub fn compile(ast: &Syntax) -> Vec<Inst> {
    let mut out = Vec::new();
    emit(ast, &mut out);
    out
}

fn emit(node: &Syntax, out: &mut Vec<Inst>) {
    match node.token {
        Token::And => {
            for child in &node.children {
                emit(child, out);
            }
            out.push(Inst::new(Opcode::And, None));
        }
        Token::Or => {
            for child in &node.children {
                emit(child, out);
            }
            out.push(Inst::new(Opcode::Or, None));
        }
        Token::Not => {
            for child in &node.children {
                emit(child, out);
            }
            out.push(Inst::new(Opcode::Not, None));
        }
        Token::Term => {
            let (field, pattern) = node.split_term();
            out.push(Inst::new(
                Opcode::Find,
                Some(Operand::Term(Term::new(field, pattern))),
            ));
        }
        Token::Illegal | Token::String | Token::LParen | Token::RParen | Token::Colon => {
            // The parser never hands the compiler a node of these kinds.
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn term_compiles_to_single_find() {
        let ast = Syntax::new_term("level:info");
        let code = compile(&ast);
        assert_eq!(code.len(), 1);
        assert_eq!(code[0].opcode, Opcode::Find);
    }

    #[test]
    fn and_emits_children_then_reducer() {
        let ast = Syntax {
            token: Token::And,
            literal: String::new(),
            children: vec![Syntax::new_term("a:x"), Syntax::new_term("b:y")],
        };
        let code = compile(&ast);
        assert_eq!(code.len(), 3);
        assert_eq!(code[0].opcode, Opcode::Find);
        assert_eq!(code[1].opcode, Opcode::Find);
        assert_eq!(code[2].opcode, Opcode::And);
    }
}
