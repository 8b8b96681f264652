//! Constrained arithmetic evaluation
//!
//! Only numeric literals, `+ - * /`, unary signs and parentheses are
//! accepted. Spoken operators are rewritten to symbols first.

use crate::{Error, Result};

/// Maximum parenthesis/unary nesting accepted by the parser
const MAX_DEPTH: usize = 64;

/// Words stripped from a command before evaluation
const TRIGGER_WORDS: &[&str] = &["calculate", "what is", "what's"];

/// Multi-word operators, rewritten before single words
const PHRASE_OPERATORS: &[(&str, &str)] = &[("multiplied by", "*"), ("divided by", "/")];

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

/// Turn a spoken command into a symbolic expression
///
/// "calculate 2 plus 2" becomes "2 + 2".
#[must_use]
pub fn prepare_expression(command: &str) -> String {
    let mut text = format!(" {} ", command.to_lowercase());
    for trigger in TRIGGER_WORDS {
        text = text.replace(trigger, " ");
    }
    for (phrase, symbol) in PHRASE_OPERATORS {
        text = text.replace(phrase, &format!(" {symbol} "));
    }

    text.split_whitespace()
        .map(|word| match word {
            "plus" => "+",
            "minus" => "-",
            "times" | "x" => "*",
            "over" => "/",
            other => other,
        })
        .map(|word| word.trim_end_matches(['?', '=', '!']))
        .filter(|word| !word.is_empty())
        .map(|word| word.replace(',', ""))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Evaluate a symbolic arithmetic expression
///
/// # Errors
///
/// Returns `Error::Expression` for anything that is not a well-formed
/// expression, for division by zero and for non-finite results
pub fn evaluate(expression: &str) -> Result<f64> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(Error::Expression("empty expression".to_string()));
    }

    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.expr(0)?;
    if parser.pos != parser.tokens.len() {
        return Err(Error::Expression(format!(
            "unexpected token at position {}",
            parser.pos
        )));
    }
    if !value.is_finite() {
        return Err(Error::Expression("result is not finite".to_string()));
    }
    Ok(value)
}

/// Format a result for speech: integers without a fraction, others trimmed
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let formatted = format!("{value:.6}");
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut literal = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        literal.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| Error::Expression(format!("invalid number {literal:?}")))?;
                tokens.push(Token::Number(value));
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' | '−' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' | '×' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '/' | '÷' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            other => {
                return Err(Error::Expression(format!("unexpected character {other:?}")));
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self, depth: usize) -> Result<f64> {
        let mut value = self.term(depth)?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.pos += 1;
            let rhs = self.term(depth)?;
            if op == Token::Plus {
                value += rhs;
            } else {
                value -= rhs;
            }
        }
        Ok(value)
    }

    // term := factor (('*' | '/') factor)*
    fn term(&mut self, depth: usize) -> Result<f64> {
        let mut value = self.factor(depth)?;
        while let Some(op @ (Token::Star | Token::Slash)) = self.peek() {
            self.pos += 1;
            let rhs = self.factor(depth)?;
            if op == Token::Star {
                value *= rhs;
            } else {
                if rhs == 0.0 {
                    return Err(Error::Expression("division by zero".to_string()));
                }
                value /= rhs;
            }
        }
        Ok(value)
    }

    // factor := ('+' | '-') factor | number | '(' expr ')'
    fn factor(&mut self, depth: usize) -> Result<f64> {
        if depth > MAX_DEPTH {
            return Err(Error::Expression("expression nested too deeply".to_string()));
        }
        match self.next() {
            Some(Token::Number(value)) => Ok(value),
            Some(Token::Minus) => Ok(-self.factor(depth + 1)?),
            Some(Token::Plus) => self.factor(depth + 1),
            Some(Token::LParen) => {
                let value = self.expr(depth + 1)?;
                match self.next() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err(Error::Expression("missing closing parenthesis".to_string())),
                }
            }
            Some(token) => Err(Error::Expression(format!("unexpected {token:?}"))),
            None => Err(Error::Expression("unexpected end of expression".to_string())),
        }
    }
}
