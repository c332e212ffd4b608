//! # integrate 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/integrate.rs`

use clap::Args;

/// integrate 子命令参数
#[derive(Args, Debug)]
pub struct IntegrateArgs {
    /// Expressions such as 'lambda T: 3*T**2' (the 'lambda T:' header is optional)
    #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
    pub expressions: Vec<String>,

    /// Integration variable
    #[arg(long, default_value = "T")]
    pub variable: String,

    /// Also evaluate each antiderivative at this value
    #[arg(long, allow_hyphen_values = true)]
    pub at: Option<f64>,
}
