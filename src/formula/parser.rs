//! # 表达式解析器
//!
//! 递归下降解析单自由变量的算术表达式，替代任意代码求值。
//!
//! ## 语法
//! ```text
//! Expression     ::= Addition
//! Addition       ::= Multiplication ( ( "+" | "-" ) Multiplication )*
//! Multiplication ::= Unary ( ( "*" | "/" ) Unary )*
//! Unary          ::= ( "+" | "-" ) Unary | Power
//! Power          ::= Primary ( ( "**" | "^" ) Unary )?
//! Primary        ::= Number | Variable | Constant | Call | "(" Expression ")"
//! Call           ::= Function "(" Expression ")"
//! ```
//! 乘方右结合，且比一元负号结合更紧：`-T**2 == -(T**2)`。
//!
//! ## 依赖关系
//! - 被 `formula/resolver.rs` 和 `formula/integrate.rs` 调用
//! - 构造 `formula/expr.rs` 的 Expr

use super::expr::{Expr, Function};
use std::f64::consts::{E, PI};

/// 词法单元
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Identifier(String),
    Plus,
    Minus,
    Multiply,
    Divide,
    Power,
    LeftParen,
    RightParen,
    Eof,
}

/// 词法分析器
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    current_char: Option<char>,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        let chars: Vec<char> = input.chars().collect();
        let current_char = chars.first().copied();

        Self {
            input: chars,
            position: 0,
            current_char,
        }
    }

    fn advance(&mut self) {
        self.position += 1;
        self.current_char = self.input.get(self.position).copied();
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// 读取数字（整数、小数、科学计数法）
    fn read_number(&mut self) -> Result<f64, String> {
        let mut number_str = String::new();

        while let Some(ch) = self.current_char {
            if ch.is_ascii_digit() || ch == '.' {
                number_str.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        // 指数部分: e / E 后接可选符号和数字
        if matches!(self.current_char, Some('e') | Some('E')) {
            let mut lookahead = self.position + 1;
            if matches!(self.input.get(lookahead), Some('+') | Some('-')) {
                lookahead += 1;
            }
            if self
                .input
                .get(lookahead)
                .is_some_and(|c| c.is_ascii_digit())
            {
                number_str.push('e');
                self.advance();
                if let Some(sign @ ('+' | '-')) = self.current_char {
                    number_str.push(sign);
                    self.advance();
                }
                while let Some(ch) = self.current_char {
                    if ch.is_ascii_digit() {
                        number_str.push(ch);
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
        }

        number_str
            .parse::<f64>()
            .map_err(|_| format!("Invalid number '{}'", number_str))
    }

    /// 读取标识符，允许 `np.exp` 这样的点分名称
    fn read_identifier(&mut self) -> String {
        let mut ident = String::new();

        while let Some(ch) = self.current_char {
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '.' {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        ident
    }

    pub fn next_token(&mut self) -> Result<Token, String> {
        self.skip_whitespace();

        match self.current_char {
            None => Ok(Token::Eof),
            Some(ch) if ch.is_ascii_digit() || ch == '.' => Ok(Token::Number(self.read_number()?)),
            Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => {
                Ok(Token::Identifier(self.read_identifier()))
            }
            Some('+') => {
                self.advance();
                Ok(Token::Plus)
            }
            Some('-') => {
                self.advance();
                Ok(Token::Minus)
            }
            Some('*') => {
                if self.peek() == Some('*') {
                    self.advance();
                    self.advance();
                    Ok(Token::Power)
                } else {
                    self.advance();
                    Ok(Token::Multiply)
                }
            }
            Some('/') => {
                self.advance();
                Ok(Token::Divide)
            }
            Some('^') => {
                self.advance();
                Ok(Token::Power)
            }
            Some('(') => {
                self.advance();
                Ok(Token::LeftParen)
            }
            Some(')') => {
                self.advance();
                Ok(Token::RightParen)
            }
            Some(ch) => Err(format!("Unexpected character '{}'", ch)),
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, String> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }

        Ok(tokens)
    }
}

/// 递归下降解析器
pub struct Parser<'a> {
    tokens: Vec<Token>,
    position: usize,
    variable: &'a str,
}

impl<'a> Parser<'a> {
    /// 创建解析器，`variable` 为唯一允许的自由变量名
    pub fn new(input: &str, variable: &'a str) -> Result<Self, String> {
        let tokens = Lexer::new(input).tokenize()?;
        Ok(Self {
            tokens,
            position: 0,
            variable,
        })
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), String> {
        if *self.current() == expected {
            self.advance();
            Ok(())
        } else {
            Err(format!("Expected {:?}, found {:?}", expected, self.current()))
        }
    }

    /// 解析完整输入，残留的词法单元视为错误
    pub fn parse(&mut self) -> Result<Expr, String> {
        if *self.current() == Token::Eof {
            return Err("Empty expression".to_string());
        }

        let expr = self.parse_addition()?;

        if *self.current() != Token::Eof {
            return Err(format!("Unexpected token {:?}", self.current()));
        }

        Ok(expr)
    }

    fn parse_addition(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_multiplication()?;

        loop {
            match self.current() {
                Token::Plus => {
                    self.advance();
                    left = left.add(self.parse_multiplication()?);
                }
                Token::Minus => {
                    self.advance();
                    left = left.sub(self.parse_multiplication()?);
                }
                _ => break,
            }
        }

        Ok(left)
    }

    fn parse_multiplication(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_unary()?;

        loop {
            match self.current() {
                Token::Multiply => {
                    self.advance();
                    left = left.mul(self.parse_unary()?);
                }
                Token::Divide => {
                    self.advance();
                    left = left.div(self.parse_unary()?);
                }
                _ => break,
            }
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, String> {
        match self.current() {
            Token::Minus => {
                self.advance();
                Ok(Expr::Neg(self.parse_unary()?.boxed()))
            }
            Token::Plus => {
                self.advance();
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> Result<Expr, String> {
        let base = self.parse_primary()?;

        if *self.current() == Token::Power {
            self.advance();
            let exponent = self.parse_unary()?;
            return Ok(base.pow(exponent));
        }

        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr, String> {
        match self.current().clone() {
            Token::Number(v) => {
                self.advance();
                Ok(Expr::Const(v))
            }
            Token::Identifier(name) => {
                self.advance();
                self.parse_identifier(&name)
            }
            Token::LeftParen => {
                self.advance();
                let expr = self.parse_addition()?;
                self.expect(Token::RightParen)?;
                Ok(expr)
            }
            other => Err(format!("Unexpected token {:?}", other)),
        }
    }

    fn parse_identifier(&mut self, name: &str) -> Result<Expr, String> {
        if name == self.variable {
            return Ok(Expr::var(name));
        }

        match name {
            "pi" | "np.pi" | "math.pi" => return Ok(Expr::Const(PI)),
            "e" | "np.e" | "math.e" => return Ok(Expr::Const(E)),
            _ => {}
        }

        if let Some(func) = Function::from_name(name) {
            self.expect(Token::LeftParen)?;
            let arg = self.parse_addition()?;
            self.expect(Token::RightParen)?;
            return Ok(Expr::call(func, arg));
        }

        Err(format!(
            "Unknown identifier '{}' (free variable is '{}')",
            name, self.variable
        ))
    }
}

/// 解析表达式的便捷入口
pub fn parse_expression(input: &str, variable: &str) -> Result<Expr, String> {
    Parser::new(input, variable)?.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(input: &str, x: f64) -> f64 {
        parse_expression(input, "T").unwrap().eval(x)
    }

    #[test]
    fn test_tokenize_power_variants() {
        let tokens = Lexer::new("T**2 ^ 3").tokenize().unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Identifier("T".to_string()),
                Token::Power,
                Token::Number(2.0),
                Token::Power,
                Token::Number(3.0),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_scientific_notation() {
        assert!((eval("1.5e-3*T", 2.0) - 3.0e-3).abs() < 1e-15);
        assert!((eval("2E+2", 0.0) - 200.0).abs() < 1e-12);
        assert!((eval("5.000000e-1*(T+1)", 1.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_precedence() {
        assert!((eval("1 + 2*T", 3.0) - 7.0).abs() < 1e-12);
        assert!((eval("-T**2", 3.0) + 9.0).abs() < 1e-12);
        assert!((eval("2**3**2", 0.0) - 512.0).abs() < 1e-9);
        assert!((eval("T/2/2", 8.0) - 2.0).abs() < 1e-12);
        assert!((eval("T**-1", 4.0) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_functions_and_constants() {
        assert!((eval("np.exp(-T/300)", 300.0) - (-1.0f64).exp()).abs() < 1e-12);
        assert!((eval("sin(pi/2)", 0.0) - 1.0).abs() < 1e-12);
        assert!((eval("sqrt(T)*log(e)", 16.0) - 4.0).abs() < 1e-12);
        assert!((eval("tanh(0)", 0.0)).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_foreign_variable() {
        let err = parse_expression("x + 1", "T").unwrap_err();
        assert!(err.contains("Unknown identifier 'x'"));

        // strain 上下文中 T 不是合法变量
        assert!(parse_expression("T*strain", "strain").is_err());
    }

    #[test]
    fn test_rejects_malformed_input() {
        assert!(parse_expression("", "T").is_err());
        assert!(parse_expression("(T + 1", "T").is_err());
        assert!(parse_expression("T +", "T").is_err());
        assert!(parse_expression("T $ 2", "T").is_err());
        assert!(parse_expression("__import__('os')", "T").is_err());
    }
}
