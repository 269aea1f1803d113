use mapl_core::{MaplError, Span};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Nat(u64),
    Symbol(String),
}

#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

/// Split source text into bracket tokens and atoms.
///
/// `;` starts a comment running to end of line. `,` and `:` are whitespace.
/// Each bracket is its own token regardless of surrounding whitespace; any
/// other maximal non-whitespace run is an atom: a natural if it is all
/// digits, a symbol otherwise. There are no string literals and no escaping.
pub fn tokenize(input: &str) -> Result<Vec<SpannedToken>, MaplError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    let mut line = 1;
    let mut col = 1;

    while i < chars.len() {
        let ch = chars[i];
        let span = Span { line, col };

        match ch {
            ' ' | '\t' | '\r' | ',' | ':' => {
                col += 1;
                i += 1;
            }
            '\n' => {
                line += 1;
                col = 1;
                i += 1;
            }

            ';' => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }

            '(' | ')' | '[' | ']' | '{' | '}' => {
                let token = match ch {
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    '[' => Token::LBracket,
                    ']' => Token::RBracket,
                    '{' => Token::LBrace,
                    _ => Token::RBrace,
                };
                tokens.push(SpannedToken { token, span });
                col += 1;
                i += 1;
            }

            _ => {
                let start = i;
                while i < chars.len() && !ends_atom(chars[i]) {
                    i += 1;
                    col += 1;
                }
                let atom: String = chars[start..i].iter().collect();
                let token = if atom.chars().all(|c| c.is_ascii_digit()) {
                    let n: u64 = atom.parse().map_err(|_| {
                        MaplError::reader(format!("natural literal too large: {atom}"), span)
                    })?;
                    Token::Nat(n)
                } else {
                    Token::Symbol(atom)
                };
                tokens.push(SpannedToken { token, span });
            }
        }
    }

    Ok(tokens)
}

fn ends_atom(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, ',' | ':' | ';' | '(' | ')' | '[' | ']' | '{' | '}')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Token> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn brackets_tokenize_without_whitespace() {
        assert_eq!(
            kinds("(){}[]"),
            vec![
                Token::LParen,
                Token::RParen,
                Token::LBrace,
                Token::RBrace,
                Token::LBracket,
                Token::RBracket,
            ]
        );
    }

    #[test]
    fn comma_and_colon_are_whitespace() {
        assert_eq!(
            kinds("{1:2,3:4}"),
            vec![
                Token::LBrace,
                Token::Nat(1),
                Token::Nat(2),
                Token::Nat(3),
                Token::Nat(4),
                Token::RBrace,
            ]
        );
    }

    #[test]
    fn comments_run_to_end_of_line() {
        assert_eq!(
            kinds("1 ; everything here (vanishes) {\n2"),
            vec![Token::Nat(1), Token::Nat(2)]
        );
        assert_eq!(kinds("; nothing but comment"), vec![]);
    }

    #[test]
    fn digit_runs_are_naturals_and_everything_else_is_a_symbol() {
        assert_eq!(kinds("12"), vec![Token::Nat(12)]);
        assert_eq!(kinds("a1"), vec![Token::Symbol("a1".to_string())]);
        assert_eq!(kinds("1a"), vec![Token::Symbol("1a".to_string())]);
        assert_eq!(kinds("->"), vec![Token::Symbol("->".to_string())]);
    }

    #[test]
    fn oversized_natural_is_an_error() {
        assert!(tokenize("99999999999999999999999999").is_err());
    }

    #[test]
    fn spans_track_lines() {
        let tokens = tokenize("1\n  2").unwrap();
        assert_eq!(tokens[0].span, Span::new(1, 1));
        assert_eq!(tokens[1].span, Span::new(2, 3));
    }

    #[test]
    fn atoms_split_at_brackets() {
        assert_eq!(
            kinds("(add x[0])"),
            vec![
                Token::LParen,
                Token::Symbol("add".to_string()),
                Token::Symbol("x".to_string()),
                Token::LBracket,
                Token::Nat(0),
                Token::RBracket,
                Token::RParen,
            ]
        );
    }
}
