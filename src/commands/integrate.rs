//! # integrate 子命令实现
//!
//! 对每个表达式求符号原函数并以表格显示。
//!
//! ## 依赖关系
//! - 使用 `cli/integrate.rs` 定义的参数
//! - 使用 `ucell::formula::SymbolicDerivator`

use crate::cli::integrate::IntegrateArgs;
use crate::utils::output;
use ucell::error::Result;
use ucell::formula::SymbolicDerivator;

use tabled::settings::Style;
use tabled::{Table, Tabled};

/// 积分结果行
#[derive(Debug, Clone, Tabled)]
struct IntegralRow {
    #[tabled(rename = "Integrand")]
    integrand: String,
    #[tabled(rename = "Antiderivative")]
    antiderivative: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// 执行 integrate
pub fn execute(args: IntegrateArgs) -> Result<()> {
    let rows = integrate_rows(&args.expressions, &args.variable, args.at)?;

    output::print_header(&format!("Antiderivatives in '{}'", args.variable));
    let mut table = Table::new(&rows);
    table.with(Style::rounded());
    println!("{}", table);

    Ok(())
}

/// 积分所有表达式，任一失败即返回错误
fn integrate_rows(expressions: &[String], variable: &str, at: Option<f64>) -> Result<Vec<IntegralRow>> {
    let derivator = SymbolicDerivator::new(variable);
    let functions = derivator.integrate(expressions)?;

    Ok(expressions
        .iter()
        .zip(functions)
        .map(|(integrand, function)| IntegralRow {
            integrand: integrand.clone(),
            value: at
                .map(|x| format!("{:e}", function.eval(x)))
                .unwrap_or_else(|| "-".to_string()),
            antiderivative: function.source,
        })
        .collect())
}
