//! Arithmetic calculator tool

use super::parse_params;
use crate::Tool;
use async_trait::async_trait;
use harper_core::{Error, Result};
use harper_llm::tools::schema;
use serde::Deserialize;
use serde_json::{Value, json};

const NAME: &str = "calculator";

/// Evaluates arithmetic expressions
///
/// Supports `+ - * / %`, exponentiation with `^` or `**`, parentheses and
/// unary signs over floating point numbers. Nothing else is accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalculatorTool;

#[derive(Debug, Deserialize)]
struct CalculatorParams {
    #[serde(alias = "input")]
    expression: String,
}

#[async_trait]
impl Tool for CalculatorTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        let params: CalculatorParams = parse_params(NAME, params)?;
        let value = evaluate(&params.expression).map_err(|msg| Error::tool(NAME, msg))?;
        Ok(json!(format_number(value)))
    }

    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Perform mathematical calculations. Input should be a valid arithmetic \
         expression such as '15 * 23' or '(2 + 3) ^ 2'."
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({
                "expression": schema::string("Arithmetic expression to evaluate"),
            }),
            &["expression"],
        )
    }
}

/// Evaluate an expression to a finite number
pub fn evaluate(expression: &str) -> std::result::Result<f64, String> {
    if let Some(c) = expression
        .chars()
        .find(|c| !(c.is_ascii_digit() || c.is_whitespace() || "+-*/%^.()".contains(*c)))
    {
        return Err(format!("Invalid character in expression: '{c}'"));
    }

    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err("Empty expression".to_string());
    }

    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.expr()?;
    if let Some(token) = parser.peek() {
        return Err(format!("Unexpected token: {token:?}"));
    }

    if value.is_finite() {
        Ok(value)
    } else {
        Err("Result is not a finite number".to_string())
    }
}

/// Integral values print without a fractional part
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Num(f64),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Pow,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> std::result::Result<Vec<Token>, String> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let token = match c {
            ' ' | '\t' | '\n' | '\r' => {
                i += 1;
                continue;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let n = literal
                    .parse::<f64>()
                    .map_err(|_| format!("Invalid number: {literal}"))?;
                tokens.push(Token::Num(n));
                continue;
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                i += 1;
                Token::Pow
            }
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '%' => Token::Percent,
            '^' => Token::Pow,
            '(' => Token::LParen,
            ')' => Token::RParen,
            other => return Err(format!("Invalid character in expression: '{other}'")),
        };
        tokens.push(token);
        i += 1;
    }

    Ok(tokens)
}

// expr    := term (('+' | '-') term)*
// term    := unary (('*' | '/' | '%') unary)*
// unary   := ('+' | '-') unary | power
// power   := primary (('^' | '**') unary)?
// primary := number | '(' expr ')'
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
        self.pos += 1;
        token
    }

    fn expr(&mut self) -> std::result::Result<f64, String> {
        let mut value = self.term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == Token::Plus { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> std::result::Result<f64, String> {
        let mut value = self.unary()?;
        while let Some(op @ (Token::Star | Token::Slash | Token::Percent)) = self.peek() {
            self.pos += 1;
            let rhs = self.unary()?;
            value = match op {
                Token::Star => value * rhs,
                _ if rhs == 0.0 => return Err("Division by zero".to_string()),
                Token::Slash => value / rhs,
                // floored modulo: the result takes the sign of the divisor
                _ => value - rhs * (value / rhs).floor(),
            };
        }
        Ok(value)
    }

    fn unary(&mut self) -> std::result::Result<f64, String> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(-self.unary()?)
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> std::result::Result<f64, String> {
        let base = self.primary()?;
        if self.peek() == Some(Token::Pow) {
            self.pos += 1;
            let exponent = self.unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> std::result::Result<f64, String> {
        match self.next() {
            Some(Token::Num(n)) => Ok(n),
            Some(Token::LParen) => {
                let value = self.expr()?;
                match self.next() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err("Missing closing parenthesis".to_string()),
                }
            }
            Some(token) => Err(format!("Unexpected token: {token:?}")),
            None => Err("Unexpected end of expression".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calc(expr: &str) -> String {
        format_number(evaluate(expr).unwrap())
    }

    #[test]
    fn test_basic_arithmetic() {
        assert_eq!(calc("15 * 23"), "345");
        assert_eq!(calc("2 + 3 * 4"), "14");
        assert_eq!(calc("(2 + 3) * 4"), "20");
        assert_eq!(calc("10 / 4"), "2.5");
        assert_eq!(calc("7 - 10"), "-3");
    }

    #[test]
    fn test_powers_and_unary() {
        assert_eq!(calc("2 ^ 10"), "1024");
        assert_eq!(calc("2 ** 3 ** 2"), "512");
        assert_eq!(calc("-2 ^ 2"), "-4");
        assert_eq!(calc("2 ^ -1"), "0.5");
        assert_eq!(calc("--3"), "3");
    }

    #[test]
    fn test_modulo() {
        assert_eq!(calc("17 % 5"), "2");
        assert_eq!(calc("-7 % 3"), "2");
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(evaluate("import os").is_err());
        assert!(evaluate("2 +").is_err());
        assert!(evaluate("(1 + 2").is_err());
        assert!(evaluate("1 2").is_err());
        assert!(evaluate("1..2").is_err());
        assert!(evaluate("").is_err());
        assert_eq!(evaluate("1 / 0").unwrap_err(), "Division by zero");
        assert_eq!(evaluate("5 % 0").unwrap_err(), "Division by zero");
    }

    #[test]
    fn test_execute_is_idempotent() {
        let tool = CalculatorTool;
        let first =
            tokio_test::block_on(tool.execute(json!({"expression": "(3 + 4) * 1.5"}))).unwrap();
        let second =
            tokio_test::block_on(tool.execute(json!({"expression": "(3 + 4) * 1.5"}))).unwrap();
        assert_eq!(first, json!("10.5"));
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_execute_errors_are_tool_errors() {
        let err = CalculatorTool
            .execute(json!({"input": "1/0"}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ToolExecution { ref tool, .. } if tool == "calculator"));
    }
}
