use crate::ast::Syntax;
use crate::error::{ParseError, Position};
use crate::lexer::Lexer;
use crate::token::Token;

struct Elem {
    pos: Position,
    token: Token,
    literal: String,
}

fn lex_tokens(source: &str) -> Vec<Elem> {
    let mut lexer = Lexer::new(source);
    let mut out = Vec::new();
    loop {
        let (pos, token, literal) = lexer.lex();
        if token == Token::Eof {
            break;
        }
        out.push(Elem { pos, token, literal });
    }
    out
}

fn parse_error(elem: &Elem, message: impl Into<String>) -> ParseError {
    ParseError {
        pos: elem.pos,
        message: message.into(),
    }
}

/// `TERM ':' STRING` -> the canonical `field:pattern` literal.
fn build_search_term(tokens: &[Elem], idx: usize) -> Result<String, ParseError> {
    let colon = tokens.get(idx + 1).ok_or_else(|| ParseError {
        pos: tokens[idx].pos,
        message: "Invalid search term. Must be 'field:pattern'.".to_string(),
    })?;
    if colon.token != Token::Colon {
        return Err(parse_error(
            colon,
            format!(
                "Invalid search term. Got '{}', must be 'field:pattern'.",
                colon.token
            ),
        ));
    }

    let pattern = tokens.get(idx + 2).ok_or_else(|| ParseError {
        pos: colon.pos,
        message: "Invalid search term. Pattern missing.".to_string(),
    })?;
    if pattern.token != Token::String {
        return Err(parse_error(pattern, "Invalid search term. Pattern missing."));
    }

    Ok(format!("{}:{}", tokens[idx].literal, pattern.literal))
}

/// Attaches a parsed term to `root`: the first term
/// under an uninitialised node becomes that node's own literal; any
/// further term becomes a child, and the children are re-sorted so
/// non-terminals precede terms.
fn make_term(root: &mut Syntax, term: String) {
    if root.token == Token::Illegal {
        root.token = Token::Term;
        root.literal = term;
    } else {
        root.add_child(Syntax::new_term(term));
        root.sort();
    }
}

fn do_make_ast(
    tokens: &[Elem],
    root: &mut Syntax,
    mut pos: usize,
    depth: usize,
) -> Result<usize, ParseError> {
    while pos < tokens.len() {
        match tokens[pos].token {
            Token::LParen => {
                let mut child = Syntax::new_illegal();
                let npos = do_make_ast(tokens, &mut child, pos + 1, depth + 1)?;
                root.add_child(child);
                pos = npos;
            }

            Token::RParen => {
                if depth == 0 {
                    return Err(parse_error(
                        &tokens[pos],
                        "Unbalanced parentheses. Unexpected ')'.",
                    ));
                }
                return Ok(pos);
            }

            Token::And | Token::Or | Token::Not => {
                let op = tokens[pos].token;
                match root.token {
                    Token::Illegal => root.token = op,
                    t if t == op => { /* same operator repeated: flat n-ary, absorbed */ }
                    Token::Term => {
                        let demoted = Syntax {
                            token: Token::Term,
                            literal: std::mem::take(&mut root.literal),
                            children: Vec::new(),
                        };
                        root.token = op;
                        root.add_child(demoted);
                    }
                    other => {
                        return Err(parse_error(
                            &tokens[pos],
                            format!("Boolean operator already set! {} {}", other, op),
                        ));
                    }
                }
            }

            Token::Term => {
                let term = build_search_term(tokens, pos)?;
                make_term(root, term);
                pos += 2;
            }

            // STRING/COLON/ILLEGAL/EOF never appear bare at this level in a
            // well-formed query; a lone one is silently skipped, matching
            // the original's switch with no matching case.
            Token::String | Token::Colon | Token::Illegal | Token::Eof => {}
        }
        pos += 1;
    }

    if depth > 0 {
        let last = tokens.last().expect("depth > 0 implies an opening '(' was consumed");
        return Err(parse_error(last, "Unbalanced parentheses. Missing ')'."));
    }

    root.sort();
    Ok(pos)
}

/// Tokenises and parses `source` into an AST, ready for [`crate::compiler::compile`].
pub fn parse(source: &str) -> Result<Syntax, ParseError> {
    let tokens = lex_tokens(source);
    let mut root = Syntax::new_illegal();
    do_make_ast(&tokens, &mut root, 0, 0)?;
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_term() {
        let ast = parse(r#"level:"info""#).unwrap();
        assert_eq!(ast.token, Token::Term);
        assert_eq!(ast.literal, "level:info");
    }

    #[test]
    fn and_of_two_terms() {
        let ast = parse(r#"level:"info" AND msg:"hi""#).unwrap();
        assert_eq!(ast.token, Token::And);
        assert_eq!(ast.children.len(), 2);
    }

    #[test]
    fn repeated_same_operator_is_flat() {
        let ast = parse(r#"a:"1" AND b:"2" AND c:"3""#).unwrap();
        assert_eq!(ast.token, Token::And);
        assert_eq!(ast.children.len(), 3);
    }

    #[test]
    fn conflicting_operators_is_an_error() {
        let err = parse(r#"a:"1" AND b:"2" OR c:"3""#).unwrap_err();
        assert!(err.message.contains("Boolean operator already set"));
    }

    #[test]
    fn parenthesised_group_becomes_a_child() {
        let ast = parse(r#"(a:"1" OR b:"2") AND c:"3""#).unwrap();
        assert_eq!(ast.token, Token::And);
        assert_eq!(ast.children.len(), 2);
        assert_eq!(ast.children[0].token, Token::Or);
        assert_eq!(ast.children[1].token, Token::Term);
    }

    #[test]
    fn not_wraps_its_atom() {
        let ast = parse(r#"NOT level:"fatal""#).unwrap();
        assert_eq!(ast.token, Token::Not);
        assert_eq!(ast.children.len(), 1);
        assert_eq!(ast.children[0].literal, "level:fatal");
    }

    #[test]
    fn missing_colon_is_an_error() {
        let err = parse(r#"level "info""#).unwrap_err();
        assert!(err.message.contains("field:pattern"));
    }

    #[test]
    fn missing_pattern_is_an_error() {
        let err = parse("level:").unwrap_err();
        assert!(err.message.contains("Pattern missing"));
    }

    #[test]
    fn stray_close_paren_is_an_error() {
        let err = parse(r#"a:"1") AND b:"2""#).unwrap_err();
        assert!(err.message.contains("Unbalanced parentheses"));
    }

    #[test]
    fn missing_close_paren_is_an_error() {
        let err = parse(r#"(a:"1" OR b:"2""#).unwrap_err();
        assert!(err.message.contains("Unbalanced parentheses"));
    }
}
