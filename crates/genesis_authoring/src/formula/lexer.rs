//! Formula tokenizer.

use super::FormulaError;

/// A lexical token.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    /// Numeric literal.
    Number(f64),
    /// Quoted string literal, unescaped.
    Str(String),
    /// Identifier or function name.
    Ident(String),
    /// `true` or `false`.
    Bool(bool),
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `**`
    StarStar,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `!`
    Bang,
    /// `==` or `===`
    EqEq,
    /// `!=` or `!==`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
    /// `?`
    Question,
    /// `:`
    Colon,
    /// `,`
    Comma,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
}

/// Operator spellings, longest first.
const OPERATORS: &[(&str, Token)] = &[
    ("===", Token::EqEq),
    ("!==", Token::NotEq),
    ("**", Token::StarStar),
    ("==", Token::EqEq),
    ("!=", Token::NotEq),
    ("<=", Token::LtEq),
    (">=", Token::GtEq),
    ("&&", Token::AndAnd),
    ("||", Token::OrOr),
    ("+", Token::Plus),
    ("-", Token::Minus),
    ("*", Token::Star),
    ("/", Token::Slash),
    ("%", Token::Percent),
    ("!", Token::Bang),
    ("<", Token::Lt),
    (">", Token::Gt),
    ("?", Token::Question),
    (":", Token::Colon),
    (",", Token::Comma),
    ("(", Token::LParen),
    (")", Token::RParen),
    ("[", Token::LBracket),
    ("]", Token::RBracket),
];

/// A token with its byte offset in the source.
#[derive(Clone, Debug, PartialEq)]
pub struct Spanned {
    /// The token.
    pub token: Token,
    /// Byte offset of the first character.
    pub position: usize,
}

/// Splits formula source into tokens.
///
/// # Errors
///
/// Returns [`FormulaError::Parse`] on an unexpected character, an
/// unterminated string or a malformed number.
pub fn tokenize(source: &str) -> Result<Vec<Spanned>, FormulaError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(position, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let token = if c.is_ascii_digit() || c == '.' {
            let mut end = position;
            let mut seen_exponent = false;
            while let Some(&(i, d)) = chars.peek() {
                let exponent_sign = seen_exponent
                    && (d == '+' || d == '-')
                    && matches!(source[..i].chars().last(), Some('e' | 'E'));
                if d.is_ascii_digit() || d == '.' || exponent_sign {
                    end = i + d.len_utf8();
                    chars.next();
                } else if (d == 'e' || d == 'E') && !seen_exponent {
                    seen_exponent = true;
                    end = i + 1;
                    chars.next();
                } else {
                    break;
                }
            }
            let text = &source[position..end];
            let value = text
                .parse::<f64>()
                .map_err(|_| FormulaError::parse(position, format!("malformed number '{text}'")))?;
            Token::Number(value)
        } else if c.is_alphabetic() || c == '_' || c == '$' {
            let mut end = position;
            while let Some(&(i, d)) = chars.peek() {
                if d.is_alphanumeric() || d == '_' || d == '$' {
                    end = i + d.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            match &source[position..end] {
                "true" => Token::Bool(true),
                "false" => Token::Bool(false),
                ident => Token::Ident(ident.to_string()),
            }
        } else if c == '"' || c == '\'' {
            chars.next();
            let mut text = String::new();
            let mut closed = false;
            while let Some((_, d)) = chars.next() {
                match d {
                    '\\' => match chars.next() {
                        Some((_, 'n')) => text.push('\n'),
                        Some((_, 't')) => text.push('\t'),
                        Some((_, escaped)) => text.push(escaped),
                        None => break,
                    },
                    d if d == c => {
                        closed = true;
                        break;
                    }
                    d => text.push(d),
                }
            }
            if !closed {
                return Err(FormulaError::parse(position, "unterminated string"));
            }
            Token::Str(text)
        } else {
            let rest = &source[position..];
            let (text, token) = OPERATORS
                .iter()
                .find(|(text, _)| rest.starts_with(text))
                .ok_or_else(|| FormulaError::parse(position, format!("unexpected character '{c}'")))?;
            // Operators are ASCII, one char per byte
            for _ in 0..text.len() {
                chars.next();
            }
            token.clone()
        };

        tokens.push(Spanned { token, position });
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("1 2.5 .5 1e3 2.5E-2"),
            vec![
                Token::Number(1.0),
                Token::Number(2.5),
                Token::Number(0.5),
                Token::Number(1000.0),
                Token::Number(0.025),
            ]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("a ** b === c !== d <= e && f || !g"),
            vec![
                Token::Ident("a".into()),
                Token::StarStar,
                Token::Ident("b".into()),
                Token::EqEq,
                Token::Ident("c".into()),
                Token::NotEq,
                Token::Ident("d".into()),
                Token::LtEq,
                Token::Ident("e".into()),
                Token::AndAnd,
                Token::Ident("f".into()),
                Token::OrOr,
                Token::Bang,
                Token::Ident("g".into()),
            ]
        );
    }

    #[test]
    fn test_strings_and_literals() {
        assert_eq!(
            kinds(r#"'rocky' "ice\"cap" true false"#),
            vec![
                Token::Str("rocky".into()),
                Token::Str("ice\"cap".into()),
                Token::Bool(true),
                Token::Bool(false),
            ]
        );
    }

    #[test]
    fn test_positions() {
        let tokens = tokenize("ab + 1").unwrap();
        let positions: Vec<usize> = tokens.iter().map(|t| t.position).collect();
        assert_eq!(positions, [0, 3, 5]);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(tokenize("a # b"), Err(FormulaError::Parse { position: 2, .. })));
        assert!(matches!(tokenize("'open"), Err(FormulaError::Parse { .. })));
        assert!(matches!(tokenize("1.2.3"), Err(FormulaError::Parse { .. })));
        assert!(matches!(tokenize("a = b"), Err(FormulaError::Parse { .. })));
    }
}
