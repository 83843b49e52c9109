use crate::error::Position;
use crate::token::Token;

/// Tokenises a query string one token per `lex()` call.
///
/// Lookahead is implemented by rune push-back (`backup`), mirroring the
/// original reader-based lexer: read a rune, decide, and un-read it if it
/// turns out to belong to the next token.
pub struct Lexer {
    runes: Vec<char>,
    idx: usize,
    pos: Position,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            runes: source.chars().collect(),
            idx: 0,
            pos: Position { line: 1, column: 0 },
        }
    }

    fn reset_position(&mut self) {
        self.pos.line += 1;
        self.pos.column = 0;
    }

    fn read_rune(&mut self) -> Option<char> {
        if self.idx >= self.runes.len() {
            return None;
        }
        let r = self.runes[self.idx];
        self.idx += 1;
        self.pos.column += 1;
        Some(r)
    }

    fn backup(&mut self) {
        self.idx -= 1;
        self.pos.column -= 1;
    }

    fn lex_term(&mut self) -> String {
        let mut lit = String::new();
        loop {
            match self.read_rune() {
                None => return lit,
                Some(r) if r.is_alphanumeric() => lit.push(r),
                Some(_) => {
                    self.backup();
                    return lit;
                }
            }
        }
    }

    /// Returns `(literal, ok)`. `ok` is false if an embedded newline was
    /// found before the closing quote, or input ran out mid-string.
    fn lex_string(&mut self) -> (String, bool) {
        let mut lit = String::new();
        let mut started = false;

        loop {
            let r = match self.read_rune() {
                None => return (lit, false),
                Some(r) => r,
            };

            if started {
                match r {
                    '\n' => return (String::new(), false),
                    '"' => return (lit, true),
                    _ => lit.push(r),
                }
            } else if r == '"' {
                started = true;
            }
        }
    }

    fn term_or_operator(lit: &str) -> Token {
        let upper = lit.to_uppercase();
        Token::keyword(&upper).unwrap_or(Token::Term)
    }

    /// Advance one token, returning the position the token started at,
    /// the token kind, and its literal (the raw source substring for
    /// `Term`/`String`/`Illegal`, canonical punctuation otherwise).
    pub fn lex(&mut self) -> (Position, Token, String) {
        loop {
            let r = match self.read_rune() {
                None => return (self.pos, Token::Eof, String::new()),
                Some(r) => r,
            };

            match r {
                '\n' => self.reset_position(),
                ':' => return (self.pos, Token::Colon, ":".to_string()),
                '(' => return (self.pos, Token::LParen, "(".to_string()),
                ')' => return (self.pos, Token::RParen, ")".to_string()),
                '"' => {
                    let start_pos = self.pos;
                    self.backup();
                    let (lit, ok) = self.lex_string();
                    if !ok {
                        return (start_pos, Token::Illegal, lit);
                    }
                    return (start_pos, Token::String, lit);
                }
                _ if r.is_whitespace() => continue,
                _ if r.is_alphanumeric() => {
                    let start_pos = self.pos;
                    self.backup();
                    let lit = self.lex_term();
                    let tok = Self::term_or_operator(&lit);
                    return (start_pos, tok, lit);
                }
                _ => return (self.pos, Token::Illegal, r.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(source: &str) -> Vec<(Token, String)> {
        let mut lexer = Lexer::new(source);
        let mut out = Vec::new();
        loop {
            let (_, tok, lit) = lexer.lex();
            if tok == Token::Eof {
                break;
            }
            out.push((tok, lit));
        }
        out
    }

    #[test]
    fn lexes_term_colon_string() {
        let toks = lex_all(r#"level:"info""#);
        assert_eq!(
            toks,
            vec![
                (Token::Term, "level".to_string()),
                (Token::Colon, ":".to_string()),
                (Token::String, "info".to_string()),
            ]
        );
    }

    #[test]
    fn keywords_are_case_insensitive() {
        for kw in ["and", "And", "AND"] {
            let toks = lex_all(kw);
            assert_eq!(toks, vec![(Token::And, kw.to_string())]);
        }
    }

    #[test]
    fn parens_and_boolean_ops() {
        let toks = lex_all(r#"(a:"x" OR b:"y") AND NOT c:"z""#);
        let kinds: Vec<Token> = toks.iter().map(|(t, _)| *t).collect();
        assert_eq!(
            kinds,
            vec![
                Token::LParen,
                Token::Term,
                Token::Colon,
                Token::String,
                Token::Or,
                Token::Term,
                Token::Colon,
                Token::String,
                Token::RParen,
                Token::And,
                Token::Not,
                Token::Term,
                Token::Colon,
                Token::String,
            ]
        );
    }

    #[test]
    fn unterminated_string_is_illegal() {
        let mut lexer = Lexer::new("a:\"oops\nmore");
        let (_, t1, _) = lexer.lex();
        let (_, t2, _) = lexer.lex();
        let (_, t3, _) = lexer.lex();
        assert_eq!(t1, Token::Term);
        assert_eq!(t2, Token::Colon);
        assert_eq!(t3, Token::Illegal);
    }

    #[test]
    fn unknown_rune_is_illegal() {
        let toks = lex_all("@");
        assert_eq!(toks, vec![(Token::Illegal, "@".to_string())]);
    }

    #[test]
    fn line_and_column_advance() {
        let mut lexer = Lexer::new("a\nb");
        let (pos1, _, _) = lexer.lex();
        assert_eq!(pos1, Position { line: 1, column: 1 });
        let (pos2, _, _) = lexer.lex();
        assert_eq!(pos2, Position { line: 2, column: 1 });
    }
}
