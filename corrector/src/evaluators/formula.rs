//! Spreadsheet-style arithmetic formulas.
//!
//! Grammar (lowest to highest precedence):
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := power (('*' | '/') power)*
//! power   := unary ('^' unary)*
//! unary   := ('-' | '+') unary | primary
//! primary := number | name | name '(' args ')' | '(' expr ')'
//! args    := expr ((',' | ';') expr)*
//! ```
//!
//! As in spreadsheet applications, unary minus binds tighter than `^` (`-2^2` is `4`) and
//! `^` associates to the left. Names and function names are case-insensitive.

use std::collections::HashMap;
use std::fmt;

/// Why a formula could not produce a value.
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaError {
    UnexpectedChar(char, usize),
    UnexpectedEnd,
    UnexpectedToken(String),
    UnknownName(String),
    UnknownFunction(String),
    Arity {
        function: String,
        expected: &'static str,
        got: usize,
    },
    NotFinite,
}

impl fmt::Display for FormulaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaError::UnexpectedChar(c, pos) => write!(f, "unexpected character {c:?} at {pos}"),
            FormulaError::UnexpectedEnd => write!(f, "unexpected end of formula"),
            FormulaError::UnexpectedToken(t) => write!(f, "unexpected token {t}"),
            FormulaError::UnknownName(n) => write!(f, "unknown name {n:?}"),
            FormulaError::UnknownFunction(n) => write!(f, "unknown function {n:?}"),
            FormulaError::Arity {
                function,
                expected,
                got,
            } => write!(f, "{function} expects {expected} argument(s), got {got}"),
            FormulaError::NotFinite => write!(f, "result is not a finite number"),
        }
    }
}

impl std::error::Error for FormulaError {}

/// Named values visible to a formula. Keys are stored lowercase.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    values: HashMap<String, f64>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_lowercase(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(&name.to_lowercase()).copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Op(char),
    LParen,
    RParen,
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{n}"),
            Token::Ident(s) => write!(f, "{s}"),
            Token::Op(c) => write!(f, "{c}"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
        }
    }
}

fn tokenize(source: &str) -> Result<Vec<Token>, FormulaError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // exponent: 1e5, 2.5E-3
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        i = j;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let text: String = chars[start..i].iter().collect();
                let value = text
                    .parse::<f64>()
                    .map_err(|_| FormulaError::UnexpectedToken(text.clone()))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            '+' | '-' | '*' | '/' | '^' => {
                tokens.push(Token::Op(c));
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' | ';' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            other => return Err(FormulaError::UnexpectedChar(other, i)),
        }
    }
    Ok(tokens)
}

struct Parser<'s> {
    tokens: Vec<Token>,
    pos: usize,
    scope: &'s Scope,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Result<Token, FormulaError> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or(FormulaError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(token)
    }

    fn expect(&mut self, expected: Token) -> Result<(), FormulaError> {
        let token = self.next()?;
        if token != expected {
            return Err(FormulaError::UnexpectedToken(token.to_string()));
        }
        Ok(())
    }

    fn expr(&mut self) -> Result<f64, FormulaError> {
        let mut value = self.term()?;
        while let Some(Token::Op(op @ ('+' | '-'))) = self.peek() {
            let op = *op;
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == '+' { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, FormulaError> {
        let mut value = self.power()?;
        while let Some(Token::Op(op @ ('*' | '/'))) = self.peek() {
            let op = *op;
            self.pos += 1;
            let rhs = self.power()?;
            value = if op == '*' { value * rhs } else { value / rhs };
        }
        Ok(value)
    }

    fn power(&mut self) -> Result<f64, FormulaError> {
        let mut value = self.unary()?;
        while let Some(Token::Op('^')) = self.peek() {
            self.pos += 1;
            let rhs = self.unary()?;
            value = value.powf(rhs);
        }
        Ok(value)
    }

    fn unary(&mut self) -> Result<f64, FormulaError> {
        match self.peek() {
            Some(Token::Op('-')) => {
                self.pos += 1;
                Ok(-self.unary()?)
            }
            Some(Token::Op('+')) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<f64, FormulaError> {
        match self.next()? {
            Token::Number(n) => Ok(n),
            Token::LParen => {
                let value = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(value)
            }
            Token::Ident(name) => {
                if let Some(Token::LParen) = self.peek() {
                    self.pos += 1;
                    let args = self.args()?;
                    call(&name, &args)
                } else {
                    self.name(&name)
                }
            }
            other => Err(FormulaError::UnexpectedToken(other.to_string())),
        }
    }

    fn args(&mut self) -> Result<Vec<f64>, FormulaError> {
        let mut args = Vec::new();
        if let Some(Token::RParen) = self.peek() {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            match self.next()? {
                Token::Comma => continue,
                Token::RParen => return Ok(args),
                other => return Err(FormulaError::UnexpectedToken(other.to_string())),
            }
        }
    }

    fn name(&self, name: &str) -> Result<f64, FormulaError> {
        if let Some(value) = self.scope.get(name) {
            return Ok(value);
        }
        match name.to_lowercase().as_str() {
            "pi" => Ok(std::f64::consts::PI),
            "e" => Ok(std::f64::consts::E),
            _ => Err(FormulaError::UnknownName(name.to_string())),
        }
    }
}

fn arity(function: &str, args: &[f64], expected: &'static str, ok: bool) -> Result<(), FormulaError> {
    if ok {
        Ok(())
    } else {
        Err(FormulaError::Arity {
            function: function.to_string(),
            expected,
            got: args.len(),
        })
    }
}

fn call(function: &str, args: &[f64]) -> Result<f64, FormulaError> {
    let lower = function.to_lowercase();
    let unary: Option<fn(f64) -> f64> = match lower.as_str() {
        "abs" => Some(f64::abs),
        "sqrt" => Some(f64::sqrt),
        "exp" => Some(f64::exp),
        "ln" => Some(f64::ln),
        "log10" => Some(f64::log10),
        "sin" => Some(f64::sin),
        "cos" => Some(f64::cos),
        "tan" => Some(f64::tan),
        "asin" => Some(f64::asin),
        "acos" => Some(f64::acos),
        "atan" => Some(f64::atan),
        "floor" => Some(f64::floor),
        "ceil" => Some(f64::ceil),
        _ => None,
    };
    if let Some(f) = unary {
        arity(function, args, "1", args.len() == 1)?;
        return Ok(f(args[0]));
    }

    match lower.as_str() {
        "round" => {
            arity(function, args, "1 or 2", matches!(args.len(), 1 | 2))?;
            let digits = args.get(1).copied().unwrap_or(0.0).trunc();
            let factor = 10f64.powf(digits);
            Ok((args[0] * factor).round() / factor)
        }
        "min" | "max" => {
            arity(function, args, "at least 1", !args.is_empty())?;
            let fold: fn(f64, f64) -> f64 = if lower == "min" { f64::min } else { f64::max };
            Ok(args[1..].iter().copied().fold(args[0], fold))
        }
        "mod" => {
            arity(function, args, "2", args.len() == 2)?;
            // sign follows the divisor
            let (a, b) = (args[0], args[1]);
            Ok(a - b * (a / b).floor())
        }
        "power" => {
            arity(function, args, "2", args.len() == 2)?;
            Ok(args[0].powf(args[1]))
        }
        _ => Err(FormulaError::UnknownFunction(function.to_string())),
    }
}

/// Evaluates `source` against `scope`. A leading `=` is ignored.
pub fn evaluate(source: &str, scope: &Scope) -> Result<f64, FormulaError> {
    let body = source.trim();
    let body = body.strip_prefix('=').unwrap_or(body);

    let mut parser = Parser {
        tokens: tokenize(body)?,
        pos: 0,
        scope,
    };
    let value = parser.expr()?;
    if let Some(token) = parser.peek() {
        return Err(FormulaError::UnexpectedToken(token.to_string()));
    }
    if !value.is_finite() {
        return Err(FormulaError::NotFinite);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(source: &str) -> Result<f64, FormulaError> {
        evaluate(source, &Scope::new())
    }

    #[test]
    fn precedence_and_parentheses() {
        assert_eq!(eval("=1 + 2 * 3").unwrap(), 7.0);
        assert_eq!(eval("(1 + 2) * 3").unwrap(), 9.0);
        assert_eq!(eval("2 ^ 3 ^ 2").unwrap(), 64.0);
        assert_eq!(eval("-2^2").unwrap(), 4.0);
        assert_eq!(eval("10 - 4 - 3").unwrap(), 3.0);
        assert_eq!(eval("1.5e2 / 3").unwrap(), 50.0);
    }

    #[test]
    fn names_are_case_insensitive() {
        let mut scope = Scope::new();
        scope.set("MAT_NUM", 123456.0);
        scope.set("a1", 2.0);
        assert_eq!(evaluate("=mat_num / A1", &scope).unwrap(), 61728.0);
    }

    #[test]
    fn functions() {
        assert_eq!(eval("SQRT(16)").unwrap(), 4.0);
        assert_eq!(eval("round(3.14159; 2)").unwrap(), 3.14);
        assert_eq!(eval("max(1, 7, 3)").unwrap(), 7.0);
        assert_eq!(eval("mod(-7, 3)").unwrap(), 2.0);
        assert_eq!(eval("power(2, 10)").unwrap(), 1024.0);
        assert!((eval("sin(pi / 2)").unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn errors() {
        assert_eq!(eval("1 / 0"), Err(FormulaError::NotFinite));
        assert_eq!(eval("sqrt(-1)"), Err(FormulaError::NotFinite));
        assert_eq!(eval("x + 1"), Err(FormulaError::UnknownName("x".into())));
        assert_eq!(eval("foo(1)"), Err(FormulaError::UnknownFunction("foo".into())));
        assert_eq!(eval("1 +"), Err(FormulaError::UnexpectedEnd));
        assert!(matches!(eval("1 2"), Err(FormulaError::UnexpectedToken(_))));
        assert!(matches!(eval("1 # 2"), Err(FormulaError::UnexpectedChar('#', 2))));
        assert!(matches!(eval("abs(1, 2)"), Err(FormulaError::Arity { got: 2, .. })));
    }
}
