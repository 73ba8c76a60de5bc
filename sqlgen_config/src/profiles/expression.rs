//! Profile expressions used by document restrictions.
//!
//! A declared entry is either a plain profile name or an expression built
//! from names, `!`, `&`, `|` and parentheses, e.g. `prod & (eu | us)`.
//! `&` and `|` may not be mixed at one level without parentheses.

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Expr {
    Name(String),
    Not(Box<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
}

impl Expr {
    fn matches(&self, is_active: &dyn Fn(&str) -> bool) -> bool {
        match self {
            Expr::Name(name) => is_active(name),
            Expr::Not(inner) => !inner.matches(is_active),
            Expr::And(parts) => parts.iter().all(|p| p.matches(is_active)),
            Expr::Or(parts) => parts.iter().any(|p| p.matches(is_active)),
        }
    }
}

/// A parsed set of declared profile expressions.
///
/// The set is accepted when any one of its expressions matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profiles {
    expressions: Vec<Expr>,
}

impl Profiles {
    /// Parse each declared entry.
    pub fn parse<S: AsRef<str>>(declared: &[S]) -> Result<Self> {
        let expressions = declared
            .iter()
            .map(|entry| parse_expression(entry.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { expressions })
    }

    pub fn matches(&self, is_active: &dyn Fn(&str) -> bool) -> bool {
        self.expressions.iter().any(|e| e.matches(is_active))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Name(String),
    Not,
    And,
    Or,
    Open,
    Close,
}

fn tokenize(expression: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for c in expression.chars() {
        let token = match c {
            '!' => Some(Token::Not),
            '&' => Some(Token::And),
            '|' => Some(Token::Or),
            '(' => Some(Token::Open),
            ')' => Some(Token::Close),
            c if c.is_whitespace() => None,
            c => {
                current.push(c);
                continue;
            }
        };
        if !current.is_empty() {
            tokens.push(Token::Name(std::mem::take(&mut current)));
        }
        tokens.extend(token);
    }
    if !current.is_empty() {
        tokens.push(Token::Name(current));
    }
    tokens
}

fn parse_expression(expression: &str) -> Result<Expr> {
    let tokens = tokenize(expression);
    if tokens.is_empty() {
        return Err(invalid(expression, "expression is empty"));
    }
    let mut parser = Parser {
        expression,
        tokens: &tokens,
        position: 0,
    };
    let expr = parser.parse_group()?;
    if parser.position != tokens.len() {
        return Err(invalid(expression, "unexpected ')'"));
    }
    Ok(expr)
}

struct Parser<'a> {
    expression: &'a str,
    tokens: &'a [Token],
    position: usize,
}

impl Parser<'_> {
    fn next(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.position);
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    /// operand ((`&` operand)* | (`|` operand)*)
    fn parse_group(&mut self) -> Result<Expr> {
        let mut operands = vec![self.parse_operand()?];
        let mut operator: Option<Token> = None;

        while let Some(token) = self.peek() {
            let token = token.clone();
            match token {
                Token::And | Token::Or => {
                    if operator.as_ref().is_some_and(|op| *op != token) {
                        return Err(invalid(
                            self.expression,
                            "mixing '&' and '|' requires parentheses",
                        ));
                    }
                    self.position += 1;
                    operator = Some(token);
                    operands.push(self.parse_operand()?);
                }
                Token::Close => break,
                _ => return Err(invalid(self.expression, "expected '&' or '|'")),
            }
        }

        Ok(match operator {
            Some(Token::And) => Expr::And(operands),
            Some(_) => Expr::Or(operands),
            None => operands.remove(0),
        })
    }

    fn parse_operand(&mut self) -> Result<Expr> {
        match self.next().cloned() {
            Some(Token::Name(name)) => Ok(Expr::Name(name)),
            Some(Token::Not) => Ok(Expr::Not(Box::new(self.parse_operand()?))),
            Some(Token::Open) => {
                let inner = self.parse_group()?;
                match self.next() {
                    Some(Token::Close) => Ok(inner),
                    _ => Err(invalid(self.expression, "missing ')'")),
                }
            }
            Some(_) => Err(invalid(self.expression, "expected a profile name")),
            None => Err(invalid(self.expression, "unexpected end of expression")),
        }
    }
}

fn invalid(expression: &str, reason: &str) -> Error {
    Error::InvalidProfileExpression {
        expression: expression.to_string(),
        reason: reason.to_string(),
    }
}
