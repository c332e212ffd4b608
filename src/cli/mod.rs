//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `show`: 显示晶胞性质
//! - `positions`: 应变扫描原子位置
//! - `integrate`: 符号积分
//! - `batch`: 批量导出
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: batch, integrate, positions, show

pub mod batch;
pub mod integrate;
pub mod positions;
pub mod show;

use crate::utils::logger;

use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;

/// ucell - 晶胞性质解析与推导工具
#[derive(Parser)]
#[command(name = "ucell")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "Resolve and derive unit-cell properties for layered-structure simulations", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only report errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn log_level(&self) -> LevelFilter {
        logger::level_from_flags(self.verbose, self.quiet)
    }
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Show the derived properties of a unit-cell definition
    Show(show::ShowArgs),

    /// Tabulate atom positions over a range of strains
    Positions(positions::PositionsArgs),

    /// Print symbolic antiderivatives of property expressions
    Integrate(integrate::IntegrateArgs),

    /// Project many unit-cell definitions to JSON in parallel
    Batch(batch::BatchArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_verbosity() {
        let cli = Cli::try_parse_from(["ucell", "-vv", "show", "cell.json"]).unwrap();
        assert_eq!(cli.log_level(), LevelFilter::Debug);

        let cli = Cli::try_parse_from(["ucell", "-q", "integrate", "lambda T: T"]).unwrap();
        assert_eq!(cli.log_level(), LevelFilter::Error);
    }
}
