//! # 表达式语法树
//!
//! 单自由变量的算术表达式：求值、化简、打印。
//!
//! ## 打印规则
//! 输出使用与输入相同的语法（`**` 表示乘方），并且只在优先级需要时加括号，
//! 因此 `Display` 的结果可以被 `formula::parser` 重新解析为同一函数。
//!
//! ## 依赖关系
//! - 被 `formula/parser.rs` 构造
//! - 被 `formula/integrate.rs` 变换
//! - 被 `formula/resolver.rs` 包装为可调用的 `Formula`

use std::fmt;

/// 白名单内的一元函数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Exp,
    Ln,
    Log10,
    Sqrt,
    Abs,
}

impl Function {
    /// 按名称查找函数，允许 `np.` / `numpy.` / `math.` 前缀
    pub fn from_name(name: &str) -> Option<Self> {
        let bare = name
            .strip_prefix("np.")
            .or_else(|| name.strip_prefix("numpy."))
            .or_else(|| name.strip_prefix("math."))
            .unwrap_or(name);

        match bare {
            "sin" => Some(Function::Sin),
            "cos" => Some(Function::Cos),
            "tan" => Some(Function::Tan),
            "asin" | "arcsin" => Some(Function::Asin),
            "acos" | "arccos" => Some(Function::Acos),
            "atan" | "arctan" => Some(Function::Atan),
            "sinh" => Some(Function::Sinh),
            "cosh" => Some(Function::Cosh),
            "tanh" => Some(Function::Tanh),
            "exp" => Some(Function::Exp),
            "log" | "ln" => Some(Function::Ln),
            "log10" => Some(Function::Log10),
            "sqrt" => Some(Function::Sqrt),
            "abs" | "fabs" => Some(Function::Abs),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Function::Sin => "sin",
            Function::Cos => "cos",
            Function::Tan => "tan",
            Function::Asin => "asin",
            Function::Acos => "acos",
            Function::Atan => "atan",
            Function::Sinh => "sinh",
            Function::Cosh => "cosh",
            Function::Tanh => "tanh",
            Function::Exp => "exp",
            Function::Ln => "log",
            Function::Log10 => "log10",
            Function::Sqrt => "sqrt",
            Function::Abs => "abs",
        }
    }

    pub fn apply(&self, x: f64) -> f64 {
        match self {
            Function::Sin => x.sin(),
            Function::Cos => x.cos(),
            Function::Tan => x.tan(),
            Function::Asin => x.asin(),
            Function::Acos => x.acos(),
            Function::Atan => x.atan(),
            Function::Sinh => x.sinh(),
            Function::Cosh => x.cosh(),
            Function::Tanh => x.tanh(),
            Function::Exp => x.exp(),
            Function::Ln => x.ln(),
            Function::Log10 => x.log10(),
            Function::Sqrt => x.sqrt(),
            Function::Abs => x.abs(),
        }
    }
}

/// 表达式节点
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Const(f64),
    Var(String),
    Neg(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    Call(Function, Box<Expr>),
}

impl Expr {
    pub fn var(name: &str) -> Expr {
        Expr::Var(name.to_string())
    }

    pub fn boxed(self) -> Box<Expr> {
        Box::new(self)
    }

    pub fn add(self, rhs: Expr) -> Expr {
        Expr::Add(self.boxed(), rhs.boxed())
    }

    pub fn sub(self, rhs: Expr) -> Expr {
        Expr::Sub(self.boxed(), rhs.boxed())
    }

    pub fn mul(self, rhs: Expr) -> Expr {
        Expr::Mul(self.boxed(), rhs.boxed())
    }

    pub fn div(self, rhs: Expr) -> Expr {
        Expr::Div(self.boxed(), rhs.boxed())
    }

    pub fn pow(self, rhs: Expr) -> Expr {
        Expr::Pow(self.boxed(), rhs.boxed())
    }

    pub fn call(func: Function, arg: Expr) -> Expr {
        Expr::Call(func, arg.boxed())
    }

    /// 代入自由变量的值并求值
    ///
    /// 解析阶段已保证表达式中只出现一个自由变量，所以任何 `Var` 都取 `x`。
    pub fn eval(&self, x: f64) -> f64 {
        match self {
            Expr::Const(v) => *v,
            Expr::Var(_) => x,
            Expr::Neg(e) => -e.eval(x),
            Expr::Add(l, r) => l.eval(x) + r.eval(x),
            Expr::Sub(l, r) => l.eval(x) - r.eval(x),
            Expr::Mul(l, r) => l.eval(x) * r.eval(x),
            Expr::Div(l, r) => l.eval(x) / r.eval(x),
            Expr::Pow(b, e) => pow(b.eval(x), e.eval(x)),
            Expr::Call(f, e) => f.apply(e.eval(x)),
        }
    }

    /// 表达式是否含有变量 `var`
    pub fn contains_var(&self, var: &str) -> bool {
        match self {
            Expr::Const(_) => false,
            Expr::Var(name) => name == var,
            Expr::Neg(e) | Expr::Call(_, e) => e.contains_var(var),
            Expr::Add(l, r)
            | Expr::Sub(l, r)
            | Expr::Mul(l, r)
            | Expr::Div(l, r)
            | Expr::Pow(l, r) => l.contains_var(var) || r.contains_var(var),
        }
    }

    /// 若表达式为常数，返回其数值
    pub fn as_const(&self) -> Option<f64> {
        match self {
            Expr::Const(v) => Some(*v),
            Expr::Neg(e) => e.as_const().map(|v| -v),
            _ => None,
        }
    }

    /// 代数化简：常数折叠与单位元消去
    pub fn simplify(&self) -> Expr {
        match self {
            Expr::Const(_) | Expr::Var(_) => self.clone(),
            Expr::Neg(e) => match e.simplify() {
                Expr::Const(v) => Expr::Const(-v),
                Expr::Neg(inner) => *inner,
                other => Expr::Neg(other.boxed()),
            },
            Expr::Add(l, r) => match (l.simplify(), r.simplify()) {
                (Expr::Const(a), Expr::Const(b)) => Expr::Const(a + b),
                (Expr::Const(z), other) | (other, Expr::Const(z)) if z == 0.0 => other,
                (a, Expr::Neg(b)) => Expr::Sub(a.boxed(), b),
                (a, Expr::Const(b)) if b < 0.0 => Expr::Sub(a.boxed(), Expr::Const(-b).boxed()),
                (a, Expr::Mul(c, rest)) if matches!(*c, Expr::Const(v) if v < 0.0) => {
                    Expr::Sub(a.boxed(), Expr::Mul(Expr::Const(-c.eval(0.0)).boxed(), rest).boxed())
                }
                (a, b) => Expr::Add(a.boxed(), b.boxed()),
            },
            Expr::Sub(l, r) => match (l.simplify(), r.simplify()) {
                (Expr::Const(a), Expr::Const(b)) => Expr::Const(a - b),
                (a, Expr::Const(z)) if z == 0.0 => a,
                (Expr::Const(z), b) if z == 0.0 => Expr::Neg(b.boxed()).simplify(),
                (a, Expr::Neg(b)) => Expr::Add(a.boxed(), b),
                (a, Expr::Mul(c, rest)) if matches!(*c, Expr::Const(v) if v < 0.0) => {
                    Expr::Add(a.boxed(), Expr::Mul(Expr::Const(-c.eval(0.0)).boxed(), rest).boxed())
                }
                (a, b) => Expr::Sub(a.boxed(), b.boxed()),
            },
            Expr::Mul(l, r) => match (l.simplify(), r.simplify()) {
                (Expr::Const(a), Expr::Const(b)) => Expr::Const(a * b),
                (Expr::Const(z), _) | (_, Expr::Const(z)) if z == 0.0 => Expr::Const(0.0),
                (Expr::Const(o), other) | (other, Expr::Const(o)) if o == 1.0 => other,
                (Expr::Const(m), other) | (other, Expr::Const(m)) if m == -1.0 => {
                    Expr::Neg(other.boxed()).simplify()
                }
                (Expr::Const(c), Expr::Neg(inner)) => Expr::Mul(Expr::Const(-c).boxed(), inner),
                // c * (x / k) -> (c/k) * x
                (Expr::Const(c), Expr::Div(num, den)) => match *den {
                    Expr::Const(k) if k != 0.0 => Expr::Mul(Expr::Const(c / k).boxed(), num),
                    den => Expr::Mul(Expr::Const(c).boxed(), Expr::Div(num, den.boxed()).boxed()),
                },
                // c1 * (c2 * x) -> (c1*c2) * x
                (Expr::Const(a), Expr::Mul(inner_l, inner_r)) => match *inner_l {
                    Expr::Const(b) => Expr::Mul(Expr::Const(a * b).boxed(), inner_r),
                    other => Expr::Mul(
                        Expr::Const(a).boxed(),
                        Expr::Mul(other.boxed(), inner_r).boxed(),
                    ),
                },
                (other, Expr::Const(c)) => Expr::Mul(Expr::Const(c).boxed(), other.boxed()),
                (a, b) => Expr::Mul(a.boxed(), b.boxed()),
            },
            Expr::Div(l, r) => match (l.simplify(), r.simplify()) {
                (Expr::Const(a), Expr::Const(b)) if b != 0.0 => Expr::Const(a / b),
                (Expr::Const(z), _) if z == 0.0 => Expr::Const(0.0),
                (a, Expr::Const(o)) if o == 1.0 => a,
                (a, Expr::Const(m)) if m == -1.0 => Expr::Neg(a.boxed()).simplify(),
                (Expr::Mul(inner_l, inner_r), Expr::Const(b)) if b != 0.0 => match *inner_l {
                    Expr::Const(a) => Expr::Mul(Expr::Const(a / b).boxed(), inner_r),
                    other => Expr::Div(Expr::Mul(other.boxed(), inner_r).boxed(), Expr::Const(b).boxed()),
                },
                (a, b) => Expr::Div(a.boxed(), b.boxed()),
            },
            Expr::Pow(b, e) => match (b.simplify(), e.simplify()) {
                (Expr::Const(a), Expr::Const(n)) => Expr::Const(pow(a, n)),
                (_, Expr::Const(z)) if z == 0.0 => Expr::Const(1.0),
                (base, Expr::Const(o)) if o == 1.0 => base,
                (base, exp) => Expr::Pow(base.boxed(), exp.boxed()),
            },
            Expr::Call(f, e) => match e.simplify() {
                Expr::Const(v) => Expr::Const(f.apply(v)),
                arg => Expr::Call(*f, arg.boxed()),
            },
        }
    }

    /// 打印优先级（数值越大结合越紧）
    fn precedence(&self) -> u8 {
        match self {
            Expr::Add(..) | Expr::Sub(..) => 1,
            Expr::Mul(..) | Expr::Div(..) => 2,
            Expr::Neg(_) => 3,
            Expr::Const(v) if v.is_sign_negative() && *v != 0.0 => 3,
            Expr::Pow(..) => 4,
            Expr::Const(_) | Expr::Var(_) | Expr::Call(..) => 5,
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, min_prec: u8) -> fmt::Result {
        if self.precedence() < min_prec {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

/// 整数指数走 `powi`，保证负底数的整数次幂有定义
fn pow(base: f64, exponent: f64) -> f64 {
    if exponent.fract() == 0.0 && exponent.abs() <= i32::MAX as f64 {
        base.powi(exponent as i32)
    } else {
        base.powf(exponent)
    }
}

/// 数值的规范文本：整数不带小数点，极大/极小值用科学计数法
pub fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{:?}", v)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Const(v) => write!(f, "{}", format_number(*v)),
            Expr::Var(name) => write!(f, "{}", name),
            Expr::Neg(e) => {
                write!(f, "-")?;
                e.fmt_operand(f, 4)
            }
            Expr::Add(l, r) => {
                l.fmt_operand(f, 1)?;
                write!(f, " + ")?;
                r.fmt_operand(f, 2)
            }
            Expr::Sub(l, r) => {
                l.fmt_operand(f, 1)?;
                write!(f, " - ")?;
                r.fmt_operand(f, 2)
            }
            Expr::Mul(l, r) => {
                l.fmt_operand(f, 2)?;
                write!(f, "*")?;
                r.fmt_operand(f, 4)
            }
            Expr::Div(l, r) => {
                l.fmt_operand(f, 2)?;
                write!(f, "/")?;
                r.fmt_operand(f, 4)
            }
            Expr::Pow(b, e) => {
                b.fmt_operand(f, 5)?;
                write!(f, "**")?;
                e.fmt_operand(f, 3)
            }
            Expr::Call(func, arg) => write!(f, "{}({})", func.name(), arg),
        }
    }
}
