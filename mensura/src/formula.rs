//! Formula expressions over a single variable
//!
//! Catalog formulas are plain arithmetic in `value`: numbers, `+ - * /`,
//! unary signs and parentheses. Nothing else is accepted; there is no way
//! for a formula to reach functions, other names or the environment.

use thiserror::Error;

/// The only identifier a formula may reference
pub const VARIABLE: &str = "value";

/// Longest formula source accepted, in bytes
pub const MAX_FORMULA_LEN: usize = 1024;

/// Deepest nesting of parentheses and unary signs accepted
pub const MAX_DEPTH: usize = 64;

/// Error type for formula parsing and evaluation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    #[error("empty expression")]
    Empty,

    #[error("expression longer than 1024 bytes")]
    TooLong,

    #[error("expression nested deeper than 64 levels")]
    TooDeep,

    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("unknown identifier '{0}'; only 'value' is allowed")]
    UnknownIdentifier(String),

    #[error("unexpected token {0}")]
    UnexpectedToken(String),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("expected closing ')'")]
    UnclosedParen,

    #[error("division by zero")]
    DivisionByZero,
}

/// Token types for the expression parser
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Variable,
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(n) => n.to_string(),
            Token::Variable => VARIABLE.to_string(),
            Token::Plus => "'+'".to_string(),
            Token::Minus => "'-'".to_string(),
            Token::Star => "'*'".to_string(),
            Token::Slash => "'/'".to_string(),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
        }
    }
}

/// AST node for expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Num(f64),
    Var,
    BinOp(Box<Expr>, Op, Box<Expr>),
    Neg(Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

fn tokenize(input: &str) -> Result<Vec<Token>, FormulaError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&ch) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '+' | '-' | '*' | '/' | '(' | ')' => {
                tokens.push(match ch {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '/' => Token::Slash,
                    '(' => Token::LParen,
                    _ => Token::RParen,
                });
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut num_str = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_digit() || c == '.' {
                        num_str.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                // Optional exponent: 1e3, 2.5E-4
                if matches!(chars.peek(), Some('e') | Some('E')) {
                    let mut lookahead = chars.clone();
                    lookahead.next();
                    let mut exp = String::from("e");
                    let sign = lookahead.peek().copied().filter(|c| *c == '+' || *c == '-');
                    if let Some(sign) = sign {
                        exp.push(sign);
                        lookahead.next();
                    }
                    if lookahead.peek().is_some_and(|c| c.is_ascii_digit()) {
                        while let Some(&c) = lookahead.peek() {
                            if !c.is_ascii_digit() {
                                break;
                            }
                            exp.push(c);
                            lookahead.next();
                        }
                        num_str.push_str(&exp);
                        chars = lookahead;
                    }
                }
                let n: f64 = num_str
                    .parse()
                    .map_err(|_| FormulaError::InvalidNumber(num_str.clone()))?;
                if !n.is_finite() {
                    return Err(FormulaError::InvalidNumber(num_str));
                }
                tokens.push(Token::Number(n));
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let mut ident = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' || c == '$' {
                        ident.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if ident != VARIABLE {
                    return Err(FormulaError::UnknownIdentifier(ident));
                }
                tokens.push(Token::Variable);
            }
            _ => return Err(FormulaError::UnexpectedChar(ch)),
        }
    }

    Ok(tokens)
}

/// Recursive-descent parser over the token stream
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0, depth: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn enter(&mut self) -> Result<(), FormulaError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(FormulaError::TooDeep);
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    // expr = term (('+' | '-') term)*
    fn parse_expr(&mut self) -> Result<Expr, FormulaError> {
        let mut left = self.parse_term()?;

        loop {
            let op = match self.peek() {
                Some(Token::Plus) => Op::Add,
                Some(Token::Minus) => Op::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_term()?;
            left = Expr::BinOp(Box::new(left), op, Box::new(right));
        }

        Ok(left)
    }

    // term = unary (('*' | '/') unary)*
    fn parse_term(&mut self) -> Result<Expr, FormulaError> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.peek() {
                Some(Token::Star) => Op::Mul,
                Some(Token::Slash) => Op::Div,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::BinOp(Box::new(left), op, Box::new(right));
        }

        Ok(left)
    }

    // unary = ('-' | '+') unary | primary
    fn parse_unary(&mut self) -> Result<Expr, FormulaError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.advance();
                self.enter()?;
                let inner = self.parse_unary()?;
                self.leave();
                Ok(Expr::Neg(Box::new(inner)))
            }
            Some(Token::Plus) => {
                self.advance();
                self.enter()?;
                let inner = self.parse_unary()?;
                self.leave();
                Ok(inner)
            }
            _ => self.parse_primary(),
        }
    }

    // primary = number | 'value' | '(' expr ')'
    fn parse_primary(&mut self) -> Result<Expr, FormulaError> {
        match self.peek().cloned() {
            Some(Token::Number(n)) => {
                self.advance();
                Ok(Expr::Num(n))
            }
            Some(Token::Variable) => {
                self.advance();
                Ok(Expr::Var)
            }
            Some(Token::LParen) => {
                self.advance();
                self.enter()?;
                let expr = self.parse_expr()?;
                self.leave();
                if !matches!(self.peek(), Some(Token::RParen)) {
                    return Err(FormulaError::UnclosedParen);
                }
                self.advance();
                Ok(expr)
            }
            Some(token) => Err(FormulaError::UnexpectedToken(token.describe())),
            None => Err(FormulaError::UnexpectedEnd),
        }
    }
}

/// A parsed formula, ready to evaluate any number of times
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    /// Parse formula source text
    pub fn parse(source: &str) -> Result<Self, FormulaError> {
        if source.len() > MAX_FORMULA_LEN {
            return Err(FormulaError::TooLong);
        }
        let tokens = tokenize(source)?;
        if tokens.is_empty() {
            return Err(FormulaError::Empty);
        }

        let mut parser = Parser::new(tokens);
        let expr = parser.parse_expr()?;

        if let Some(token) = parser.peek() {
            return Err(FormulaError::UnexpectedToken(token.describe()));
        }

        Ok(Formula {
            source: source.to_string(),
            expr,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Evaluate with `value` bound to the given number
    pub fn eval(&self, value: f64) -> Result<f64, FormulaError> {
        eval_expr(&self.expr, value)
    }
}

/// Evaluate an expression with `value` bound
pub fn eval_expr(expr: &Expr, value: f64) -> Result<f64, FormulaError> {
    match expr {
        Expr::Num(n) => Ok(*n),
        Expr::Var => Ok(value),
        Expr::Neg(inner) => Ok(-eval_expr(inner, value)?),
        Expr::BinOp(left, op, right) => {
            let l = eval_expr(left, value)?;
            let r = eval_expr(right, value)?;
            match op {
                Op::Add => Ok(l + r),
                Op::Sub => Ok(l - r),
                Op::Mul => Ok(l * r),
                Op::Div => {
                    if r == 0.0 {
                        return Err(FormulaError::DivisionByZero);
                    }
                    Ok(l / r)
                }
            }
        }
    }
}
