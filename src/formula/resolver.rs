//! # 性质解析器
//!
//! 将晶胞性质的输入（数值、表达式字符串或它们的列表）转换为单变量可调用函数，
//! 并保留与之同步的字符串形式。
//!
//! ## 输入形式
//! - 数值 `v`：常函数，规范字符串 `lambda T: v`（最短的精确写法）
//! - 字符串：`lambda T: <expr>` 或裸表达式 `<expr>`，原样保存
//! - 直接传入函数：拒绝，必须使用字符串形式以便显示和序列化
//!
//! ## 依赖关系
//! - 被 `models/unit_cell.rs` 和 `formula/integrate.rs` 使用
//! - 使用 `formula/parser.rs` 解析表达式
//! - 使用 `regex` 拆分 `lambda <var>:` 头

use super::expr::{format_number, Expr};
use super::parser::parse_expression;
use crate::error::{CellError, Result};

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// 热学性质的自由变量（温度）
pub const TEMPERATURE: &str = "T";

/// 原子位置的自由变量（应变）
pub const STRAIN: &str = "strain";

/// `lambda <var>: <body>` 形式的函数头
static LAMBDA_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*lambda\s+([A-Za-z_][A-Za-z0-9_]*)\s*:(.*)$").unwrap());

/// 性质输入
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertySpec {
    /// 数值常量
    Number(f64),
    /// 表达式字符串
    Expression(String),
    /// 每个子系统一个元素的列表
    List(Vec<PropertySpec>),
    /// 直接传入的函数，总是被拒绝
    #[serde(skip)]
    Callable(fn(f64) -> f64),
    /// 其他任何 JSON 值
    Other(serde_json::Value),
}

impl Default for PropertySpec {
    fn default() -> Self {
        PropertySpec::Number(0.0)
    }
}

impl From<f64> for PropertySpec {
    fn from(v: f64) -> Self {
        PropertySpec::Number(v)
    }
}

impl From<i32> for PropertySpec {
    fn from(v: i32) -> Self {
        PropertySpec::Number(v as f64)
    }
}

impl From<&str> for PropertySpec {
    fn from(s: &str) -> Self {
        PropertySpec::Expression(s.to_string())
    }
}

impl From<String> for PropertySpec {
    fn from(s: String) -> Self {
        PropertySpec::Expression(s)
    }
}

impl From<fn(f64) -> f64> for PropertySpec {
    fn from(f: fn(f64) -> f64) -> Self {
        PropertySpec::Callable(f)
    }
}

impl<T: Into<PropertySpec>> From<Vec<T>> for PropertySpec {
    fn from(items: Vec<T>) -> Self {
        PropertySpec::List(items.into_iter().map(Into::into).collect())
    }
}

impl PropertySpec {
    /// 展开为元素列表（标量变为单元素列表）
    pub fn into_items(self) -> Vec<PropertySpec> {
        match self {
            PropertySpec::List(items) => items,
            other => vec![other],
        }
    }
}

/// 已解析的单变量函数
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    variable: String,
    expr: Expr,
}

impl Formula {
    pub fn new(variable: impl Into<String>, expr: Expr) -> Self {
        Self {
            variable: variable.into(),
            expr,
        }
    }

    /// 常函数
    pub fn constant(variable: impl Into<String>, value: f64) -> Self {
        Self::new(variable, Expr::Const(value))
    }

    /// 在给定点求值
    pub fn eval(&self, x: f64) -> f64 {
        self.expr.eval(x)
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lambda {}: {}", self.variable, self.expr)
    }
}

/// 函数与其字符串形式
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyFunction {
    pub function: Formula,
    pub source: String,
}

impl PropertyFunction {
    pub fn eval(&self, x: f64) -> f64 {
        self.function.eval(x)
    }
}

/// 拆出函数列表和字符串列表
pub fn split_pairs(items: &[PropertyFunction]) -> (Vec<&Formula>, Vec<&str>) {
    items
        .iter()
        .map(|p| (&p.function, p.source.as_str()))
        .unzip()
}

/// 解析失败条目的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolveMode {
    /// 第一个错误即返回
    #[default]
    Strict,
    /// 记录并跳过无法解析的表达式
    Permissive,
}

/// 性质解析器
#[derive(Debug, Clone)]
pub struct FormulaResolver {
    variable: String,
    mode: ResolveMode,
}

impl FormulaResolver {
    /// 创建解析器，`variable` 为表达式中的自由变量
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            mode: ResolveMode::Strict,
        }
    }

    /// 温度相关性质的解析器
    pub fn temperature() -> Self {
        Self::new(TEMPERATURE)
    }

    /// 应变相关性质的解析器
    pub fn strain() -> Self {
        Self::new(STRAIN)
    }

    pub fn with_mode(mut self, mode: ResolveMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn permissive(self) -> Self {
        self.with_mode(ResolveMode::Permissive)
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// 解析性质输入，输出顺序与输入一致
    pub fn resolve(&self, spec: impl Into<PropertySpec>) -> Result<Vec<PropertyFunction>> {
        let items = spec.into().into_items();
        let mut output = Vec::with_capacity(items.len());

        for item in items {
            match item {
                PropertySpec::Number(v) => output.push(self.constant(v)),
                PropertySpec::Expression(text) => match self.parse_text(&text) {
                    Ok(function) => output.push(PropertyFunction {
                        function,
                        source: text,
                    }),
                    Err(e) => {
                        log::warn!("{}", e);
                        if self.mode == ResolveMode::Strict {
                            return Err(e);
                        }
                    }
                },
                PropertySpec::Callable(_) => return Err(CellError::UnsupportedInput),
                PropertySpec::List(_) => {
                    return Err(CellError::InvalidInput("a nested list".to_string()))
                }
                PropertySpec::Other(value) => {
                    return Err(CellError::InvalidInput(describe_json(&value)))
                }
            }
        }

        Ok(output)
    }

    /// 数值常量的规范形式
    fn constant(&self, v: f64) -> PropertyFunction {
        PropertyFunction {
            function: Formula::constant(&self.variable, v),
            source: format!("lambda {}: {}", self.variable, format_number(v)),
        }
    }

    /// 解析单个表达式字符串
    pub fn parse_text(&self, text: &str) -> Result<Formula> {
        let body = match LAMBDA_HEADER.captures(text) {
            Some(caps) => {
                let declared = &caps[1];
                if declared != self.variable {
                    return Err(CellError::InvalidExpression {
                        expression: text.to_string(),
                        reason: format!(
                            "function argument '{}' does not match the expected variable '{}'",
                            declared, self.variable
                        ),
                    });
                }
                caps.get(2).map_or("", |m| m.as_str())
            }
            None => text,
        };

        let expr = parse_expression(body, &self.variable).map_err(|reason| {
            CellError::InvalidExpression {
                expression: text.to_string(),
                reason,
            }
        })?;

        Ok(Formula::new(&self.variable, expr))
    }
}

fn describe_json(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "null".to_string(),
        serde_json::Value::Bool(b) => format!("boolean {}", b),
        serde_json::Value::Object(_) => "an object".to_string(),
        other => other.to_string(),
    }
}
