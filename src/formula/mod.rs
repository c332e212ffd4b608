//! # 公式模块
//!
//! 性质表达式的解析、求值与符号积分。
//!
//! ## 子模块
//! - `expr`: 表达式语法树
//! - `parser`: 词法分析与递归下降解析
//! - `resolver`: 性质输入 -> (函数, 字符串) 对
//! - `integrate`: 符号原函数
//!
//! ## 依赖关系
//! - 被 `models/unit_cell.rs` 和 `commands/` 使用
//! - 使用 `error.rs`

pub mod expr;
pub mod integrate;
pub mod parser;
pub mod resolver;

pub use expr::{Expr, Function};
pub use integrate::SymbolicDerivator;
pub use resolver::{
    split_pairs, Formula, FormulaResolver, PropertyFunction, PropertySpec, ResolveMode, STRAIN,
    TEMPERATURE,
};
