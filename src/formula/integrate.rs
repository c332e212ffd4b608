//! # 符号积分
//!
//! 对 `label: expression` 形式的表达式求原函数，生成新的可调用函数及其字符串。
//!
//! ## 支持的规则
//! - 常数、多项式（乘积与非负整数次幂会先展开）
//! - 和、差、常数因子、常数除数
//! - `(a*x+b)**n`（含 `n = -1`）、`c/(a*x+b)`、`c**(a*x+b)`
//! - 指数与底数可以是任意不含自变量的表达式，如 `T**(3/2)`、`(2*pi)**T`
//! - 线性自变量的 `exp`、`sin`、`cos`、`sinh`、`cosh`、`sqrt`
//!
//! 其余形式返回 `SymbolicIntegration` 错误，调用方应手动设置原函数。
//!
//! ## 依赖关系
//! - 被 `models/unit_cell.rs` 的惰性积分性质调用
//! - 使用 `formula/parser.rs` 解析输入，`formula/expr.rs` 构造结果

use super::expr::{Expr, Function};
use super::parser::parse_expression;
use super::resolver::{Formula, PropertyFunction, TEMPERATURE};
use crate::error::{CellError, Result};

/// 多项式展开允许的最大次数
const MAX_POLYNOMIAL_DEGREE: usize = 64;

/// 符号积分器
#[derive(Debug, Clone)]
pub struct SymbolicDerivator {
    variable: String,
}

impl Default for SymbolicDerivator {
    fn default() -> Self {
        Self::new(TEMPERATURE)
    }
}

impl SymbolicDerivator {
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
        }
    }

    /// 对一组表达式求原函数
    ///
    /// 任何一个表达式失败都会使整批失败，不返回部分结果。
    pub fn integrate<S: AsRef<str>>(&self, sources: &[S]) -> Result<Vec<PropertyFunction>> {
        sources
            .iter()
            .map(|source| {
                let antiderivative = self.antiderivative(source.as_ref())?;
                let function = Formula::new(&self.variable, antiderivative);
                Ok(PropertyFunction {
                    source: function.to_string(),
                    function,
                })
            })
            .collect()
    }

    /// 单个表达式的原函数
    pub fn antiderivative(&self, source: &str) -> Result<Expr> {
        let body = match source.split_once(':') {
            Some((_, body)) => body,
            None => source,
        };

        let integrand = parse_expression(body, &self.variable).map_err(|reason| {
            CellError::SymbolicIntegration {
                expression: source.to_string(),
                reason,
            }
        })?;

        integrate_expr(&integrand, &self.variable)
            .map(|e| e.simplify())
            .ok_or_else(|| CellError::SymbolicIntegration {
                expression: source.to_string(),
                reason: format!("no integration rule applies to '{}'", integrand),
            })
    }
}

/// 对 `x` 求不定积分（积分常数取 0）
pub fn integrate_expr(expr: &Expr, x: &str) -> Option<Expr> {
    if !expr.contains_var(x) {
        return Some(expr.clone().mul(Expr::var(x)));
    }

    if let Some(coeffs) = polynomial(expr, x) {
        return Some(integrate_polynomial(&coeffs, x));
    }

    match expr {
        Expr::Neg(e) => integrate_expr(e, x).map(|i| Expr::Neg(i.boxed())),
        Expr::Add(l, r) => Some(integrate_expr(l, x)?.add(integrate_expr(r, x)?)),
        Expr::Sub(l, r) => Some(integrate_expr(l, x)?.sub(integrate_expr(r, x)?)),
        Expr::Mul(l, r) if !l.contains_var(x) => Some((**l).clone().mul(integrate_expr(r, x)?)),
        Expr::Mul(l, r) if !r.contains_var(x) => Some(integrate_expr(l, x)?.mul((**r).clone())),
        Expr::Div(l, r) if !r.contains_var(x) => Some(integrate_expr(l, x)?.div((**r).clone())),
        Expr::Div(l, r) if !l.contains_var(x) => {
            let reciprocal = match &**r {
                Expr::Pow(base, exponent) => match constant_value(exponent, x) {
                    Some(n) => (**base).clone().pow(Expr::Const(-n)),
                    None => return None,
                },
                other => other.clone().pow(Expr::Const(-1.0)),
            };
            Some((**l).clone().mul(integrate_expr(&reciprocal, x)?))
        }
        Expr::Pow(base, exponent) => integrate_power(base, exponent, x),
        Expr::Call(Function::Sqrt, arg) => integrate_power(arg, &Expr::Const(0.5), x),
        Expr::Call(func, arg) => integrate_call(*func, arg, x),
        _ => None,
    }
}

/// `base**exponent` 的积分
fn integrate_power(base: &Expr, exponent: &Expr, x: &str) -> Option<Expr> {
    // (a*x+b)**n
    if let (Some(n), Some((a, _))) = (constant_value(exponent, x), linear(base, x)) {
        if n == -1.0 {
            return Some(Expr::call(Function::Ln, base.clone()).div(Expr::Const(a)));
        }
        return Some(
            base.clone()
                .pow(Expr::Const(n + 1.0))
                .div(Expr::Const(a * (n + 1.0))),
        );
    }

    // c**(a*x+b)
    if let (Some(c), Some((a, _))) = (constant_value(base, x), linear(exponent, x)) {
        if c > 0.0 && c != 1.0 {
            return Some(
                Expr::Const(c)
                    .pow(exponent.clone())
                    .div(Expr::Const(a * c.ln())),
            );
        }
    }

    None
}

/// 不含 `x` 的子表达式的数值，如 `3/2`、`2*pi`
fn constant_value(expr: &Expr, x: &str) -> Option<f64> {
    if expr.contains_var(x) {
        return None;
    }
    Some(expr.eval(0.0)).filter(|v| v.is_finite())
}

/// 线性自变量的初等函数积分
fn integrate_call(func: Function, arg: &Expr, x: &str) -> Option<Expr> {
    let (a, _) = linear(arg, x)?;
    let arg = arg.clone();

    let primitive = match func {
        Function::Exp => Expr::call(Function::Exp, arg),
        Function::Sin => Expr::Neg(Expr::call(Function::Cos, arg).boxed()),
        Function::Cos => Expr::call(Function::Sin, arg),
        Function::Sinh => Expr::call(Function::Cosh, arg),
        Function::Cosh => Expr::call(Function::Sinh, arg),
        _ => return None,
    };

    Some(primitive.div(Expr::Const(a)))
}

/// 若表达式是 `a*x + b` 且 `a != 0`，返回 `(a, b)`
fn linear(expr: &Expr, x: &str) -> Option<(f64, f64)> {
    let mut coeffs = polynomial(expr, x)?;
    while coeffs.len() > 1 && coeffs.last() == Some(&0.0) {
        coeffs.pop();
    }
    match coeffs.as_slice() {
        [b, a] if *a != 0.0 => Some((*a, *b)),
        _ => None,
    }
}

/// 展开为多项式系数（升幂），无法展开时返回 None
fn polynomial(expr: &Expr, x: &str) -> Option<Vec<f64>> {
    if !expr.contains_var(x) {
        let v = expr.eval(0.0);
        return v.is_finite().then(|| vec![v]);
    }

    let coeffs = match expr {
        Expr::Var(_) => vec![0.0, 1.0],
        Expr::Neg(e) => polynomial(e, x)?.into_iter().map(|c| -c).collect(),
        Expr::Add(l, r) => poly_add(&polynomial(l, x)?, &polynomial(r, x)?, 1.0),
        Expr::Sub(l, r) => poly_add(&polynomial(l, x)?, &polynomial(r, x)?, -1.0),
        Expr::Mul(l, r) => poly_mul(&polynomial(l, x)?, &polynomial(r, x)?)?,
        Expr::Div(l, r) if !r.contains_var(x) => {
            let d = r.eval(0.0);
            if d == 0.0 || !d.is_finite() {
                return None;
            }
            polynomial(l, x)?.into_iter().map(|c| c / d).collect()
        }
        Expr::Pow(base, exponent) if !exponent.contains_var(x) => {
            let n = exponent.eval(0.0);
            if n < 0.0 || n.fract() != 0.0 || n as usize > MAX_POLYNOMIAL_DEGREE {
                return None;
            }
            let base = polynomial(base, x)?;
            let mut acc = vec![1.0];
            for _ in 0..n as usize {
                acc = poly_mul(&acc, &base)?;
            }
            acc
        }
        _ => return None,
    };

    Some(coeffs)
}

fn poly_add(a: &[f64], b: &[f64], sign: f64) -> Vec<f64> {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| a.get(i).copied().unwrap_or(0.0) + sign * b.get(i).copied().unwrap_or(0.0))
        .collect()
}

fn poly_mul(a: &[f64], b: &[f64]) -> Option<Vec<f64>> {
    if a.len() + b.len() - 1 > MAX_POLYNOMIAL_DEGREE + 1 {
        return None;
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, ca) in a.iter().enumerate() {
        for (j, cb) in b.iter().enumerate() {
            out[i + j] += ca * cb;
        }
    }
    Some(out)
}

/// 多项式逐项积分，按降幂输出
fn integrate_polynomial(coeffs: &[f64], x: &str) -> Expr {
    let mut result: Option<Expr> = None;

    for (k, c) in coeffs.iter().enumerate().rev() {
        if *c == 0.0 {
            continue;
        }
        let coeff = c / (k + 1) as f64;
        let power = Expr::var(x).pow(Expr::Const((k + 1) as f64)).simplify();
        let magnitude = Expr::Const(coeff.abs()).mul(power).simplify();

        result = Some(match result {
            None if coeff < 0.0 => Expr::Neg(magnitude.boxed()),
            None => magnitude,
            Some(acc) if coeff < 0.0 => acc.sub(magnitude),
            Some(acc) => acc.add(magnitude),
        });
    }

    result.unwrap_or(Expr::Const(0.0))
}
