//! Recursive-descent formula parser.
//!
//! Precedence, loosest first:
//!
//! ```text
//! ternary     ?:
//! or          ||
//! and         &&
//! equality    == != === !==
//! comparison  < <= > >=
//! additive    + -
//! multiply    * / %
//! unary       - + !
//! power       **        (right-associative)
//! postfix     calls
//! primary     literals, identifiers, ( ), [ ]
//! ```

use super::ast::{BinaryOp, Expr, UnaryOp};
use super::lexer::{tokenize, Spanned, Token};
use super::FormulaError;

/// Maximum nesting depth of a formula.
const MAX_DEPTH: usize = 64;

/// Maximum number of operators in a formula.
///
/// Operator chains such as `1 + 1 + ... + 1` build a tree as deep as the
/// chain is long, so this bounds the recursion of evaluation and drop.
const MAX_OPERATORS: usize = 256;

/// Parses formula source into an expression.
///
/// # Errors
///
/// Returns [`FormulaError::Parse`] on any lexical or syntax error,
/// including trailing input and empty formulas.
pub fn parse(source: &str) -> Result<Expr, FormulaError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        operators: 0,
        end: source.len(),
    };
    let expr = parser.expression()?;
    if let Some(extra) = parser.tokens.get(parser.pos) {
        return Err(FormulaError::parse(
            extra.position,
            format!("unexpected {:?} after expression", extra.token),
        ));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
    operators: usize,
    /// Source length, reported for errors at end of input.
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn position(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |s| s.position)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|s| s.token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token, what: &str) -> Result<(), FormulaError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(FormulaError::parse(self.position(), format!("expected {what}")))
        }
    }

    /// Counts one more operator node against [`MAX_OPERATORS`].
    fn operator(&mut self) -> Result<(), FormulaError> {
        self.operators += 1;
        if self.operators > MAX_OPERATORS {
            return Err(FormulaError::parse(self.position(), "formula has too many operators"));
        }
        Ok(())
    }

    fn expression(&mut self) -> Result<Expr, FormulaError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(FormulaError::parse(self.position(), "formula nested too deeply"));
        }
        let expr = self.ternary();
        self.depth -= 1;
        expr
    }

    fn ternary(&mut self) -> Result<Expr, FormulaError> {
        let cond = self.or()?;
        if !self.eat(&Token::Question) {
            return Ok(cond);
        }
        self.operator()?;
        let then = self.expression()?;
        self.expect(&Token::Colon, "':' in conditional")?;
        let otherwise = self.expression()?;
        Ok(Expr::Conditional {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    /// Parses a left-associative chain of operators from `ops`.
    fn left_assoc(
        &mut self,
        ops: &[(Token, BinaryOp)],
        next: fn(&mut Self) -> Result<Expr, FormulaError>,
    ) -> Result<Expr, FormulaError> {
        let mut lhs = next(self)?;
        'chain: loop {
            for (token, op) in ops {
                if self.eat(token) {
                    self.operator()?;
                    let rhs = next(self)?;
                    lhs = Expr::Binary {
                        op: *op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    };
                    continue 'chain;
                }
            }
            return Ok(lhs);
        }
    }

    fn or(&mut self) -> Result<Expr, FormulaError> {
        self.left_assoc(&[(Token::OrOr, BinaryOp::Or)], Self::and)
    }

    fn and(&mut self) -> Result<Expr, FormulaError> {
        self.left_assoc(&[(Token::AndAnd, BinaryOp::And)], Self::equality)
    }

    fn equality(&mut self) -> Result<Expr, FormulaError> {
        self.left_assoc(
            &[(Token::EqEq, BinaryOp::Eq), (Token::NotEq, BinaryOp::NotEq)],
            Self::comparison,
        )
    }

    fn comparison(&mut self) -> Result<Expr, FormulaError> {
        self.left_assoc(
            &[
                (Token::LtEq, BinaryOp::LtEq),
                (Token::GtEq, BinaryOp::GtEq),
                (Token::Lt, BinaryOp::Lt),
                (Token::Gt, BinaryOp::Gt),
            ],
            Self::additive,
        )
    }

    fn additive(&mut self) -> Result<Expr, FormulaError> {
        self.left_assoc(
            &[(Token::Plus, BinaryOp::Add), (Token::Minus, BinaryOp::Sub)],
            Self::multiplicative,
        )
    }

    fn multiplicative(&mut self) -> Result<Expr, FormulaError> {
        self.left_assoc(
            &[
                (Token::Star, BinaryOp::Mul),
                (Token::Slash, BinaryOp::Div),
                (Token::Percent, BinaryOp::Rem),
            ],
            Self::unary,
        )
    }

    fn unary(&mut self) -> Result<Expr, FormulaError> {
        let op = match self.peek() {
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Plus) => UnaryOp::Plus,
            Some(Token::Bang) => UnaryOp::Not,
            _ => return self.power(),
        };
        self.pos += 1;
        self.operator()?;

        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(FormulaError::parse(self.position(), "formula nested too deeply"));
        }
        let expr = self.unary();
        self.depth -= 1;

        Ok(Expr::Unary {
            op,
            expr: Box::new(expr?),
        })
    }

    fn power(&mut self) -> Result<Expr, FormulaError> {
        let base = self.postfix()?;
        if !self.eat(&Token::StarStar) {
            return Ok(base);
        }
        self.operator()?;
        // Right-associative: the exponent may itself be a unary or power
        let exponent = self.unary()?;
        Ok(Expr::Binary {
            op: BinaryOp::Pow,
            lhs: Box::new(base),
            rhs: Box::new(exponent),
        })
    }

    fn postfix(&mut self) -> Result<Expr, FormulaError> {
        let position = self.position();
        let expr = self.primary()?;
        if self.peek() != Some(&Token::LParen) {
            return Ok(expr);
        }
        let Expr::Ident(name) = expr else {
            return Err(FormulaError::parse(position, "only named functions can be called"));
        };
        self.pos += 1;
        let args = self.list_items(&Token::RParen, "')' after arguments")?;
        Ok(Expr::Call { name, args })
    }

    /// Comma-separated expressions up to `close`, which is consumed.
    fn list_items(&mut self, close: &Token, what: &str) -> Result<Vec<Expr>, FormulaError> {
        let mut items = Vec::new();
        if self.eat(close) {
            return Ok(items);
        }
        loop {
            items.push(self.expression()?);
            if self.eat(close) {
                return Ok(items);
            }
            self.expect(&Token::Comma, what)?;
        }
    }

    fn primary(&mut self) -> Result<Expr, FormulaError> {
        let position = self.position();
        match self.advance() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Str(s)) => Ok(Expr::Text(s)),
            Some(Token::Bool(b)) => Ok(Expr::Bool(b)),
            Some(Token::Ident(name)) => Ok(Expr::Ident(name)),
            Some(Token::LParen) => {
                let expr = self.expression()?;
                self.expect(&Token::RParen, "')'")?;
                Ok(expr)
            }
            Some(Token::LBracket) => {
                let items = self.list_items(&Token::RBracket, "']' after list")?;
                Ok(Expr::List(items))
            }
            Some(token) => Err(FormulaError::parse(position, format!("unexpected {token:?}"))),
            None => Err(FormulaError::parse(position, "unexpected end of formula")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Box<Expr> {
        Box::new(Expr::Number(n))
    }

    #[test]
    fn test_precedence() {
        assert_eq!(
            parse("1 + 2 * 3").unwrap(),
            Expr::Binary {
                op: BinaryOp::Add,
                lhs: num(1.0),
                rhs: Box::new(Expr::Binary {
                    op: BinaryOp::Mul,
                    lhs: num(2.0),
                    rhs: num(3.0),
                }),
            }
        );
    }

    #[test]
    fn test_power_is_right_associative() {
        assert_eq!(
            parse("2 ** 3 ** 2").unwrap(),
            Expr::Binary {
                op: BinaryOp::Pow,
                lhs: num(2.0),
                rhs: Box::new(Expr::Binary {
                    op: BinaryOp::Pow,
                    lhs: num(3.0),
                    rhs: num(2.0),
                }),
            }
        );
    }

    #[test]
    fn test_negation_binds_looser_than_power() {
        assert_eq!(
            parse("-2 ** 2").unwrap(),
            Expr::Unary {
                op: UnaryOp::Neg,
                expr: Box::new(Expr::Binary {
                    op: BinaryOp::Pow,
                    lhs: num(2.0),
                    rhs: num(2.0),
                }),
            }
        );
    }

    #[test]
    fn test_subtraction_is_left_associative() {
        assert_eq!(
            parse("5 - 2 - 1").unwrap(),
            Expr::Binary {
                op: BinaryOp::Sub,
                lhs: Box::new(Expr::Binary {
                    op: BinaryOp::Sub,
                    lhs: num(5.0),
                    rhs: num(2.0),
                }),
                rhs: num(1.0),
            }
        );
    }

    #[test]
    fn test_calls_lists_and_ternary() {
        let expr = parse("radius > 1 ? randomChoice(seed, 'crust', ['rocky', 'icy']) : 'gas'").unwrap();
        let Expr::Conditional { then, .. } = expr else {
            panic!("Expected conditional");
        };
        let Expr::Call { name, args } = *then else {
            panic!("Expected call");
        };
        assert_eq!(name, "randomChoice");
        assert_eq!(args.len(), 3);
        assert!(matches!(&args[2], Expr::List(items) if items.len() == 2));
    }

    #[test]
    fn test_empty_call() {
        assert_eq!(
            parse("f()").unwrap(),
            Expr::Call {
                name: "f".into(),
                args: Vec::new(),
            }
        );
    }

    #[test]
    fn test_syntax_errors() {
        for bad in ["", "1 +", "(1", "max(1,", "1 2", "a ? b", "[1, 2", "3(4)", ")"] {
            assert!(
                matches!(parse(bad), Err(FormulaError::Parse { .. })),
                "'{bad}' should not parse"
            );
        }
    }

    #[test]
    fn test_depth_limit() {
        let deep = format!("{}1{}", "(".repeat(200), ")".repeat(200));
        assert!(matches!(parse(&deep), Err(FormulaError::Parse { .. })));

        let negations = format!("{}1", "-".repeat(200));
        assert!(matches!(parse(&negations), Err(FormulaError::Parse { .. })));
    }

    #[test]
    fn test_operator_chain_limit() {
        let within = format!("1{}", " + 1".repeat(MAX_OPERATORS));
        assert!(parse(&within).is_ok(), "A chain at the limit parses");

        for op in ["+", "*", "&&", "||", "==", "<", "**"] {
            let long = format!("1{}", format!(" {op} 1").repeat(200_000));
            assert!(
                matches!(parse(&long), Err(FormulaError::Parse { .. })),
                "A long '{op}' chain must be rejected"
            );
        }

        let ternaries = format!("{}1", "a ? 1 : ".repeat(MAX_OPERATORS + 1));
        assert!(matches!(parse(&ternaries), Err(FormulaError::Parse { .. })));
    }
}
