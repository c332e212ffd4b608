//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `batch/`, `utils/` 和 `ucell` 库
//! - 子模块: batch, integrate, positions, show

pub mod batch;
pub mod integrate;
pub mod positions;
pub mod show;

use crate::cli::Commands;
use ucell::error::Result;

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Show(args) => show::execute(args),
        Commands::Positions(args) => positions::execute(args),
        Commands::Integrate(args) => integrate::execute(args),
        Commands::Batch(args) => batch::execute(args),
    }
}
