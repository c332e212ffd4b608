//! # show 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/show.rs`

use ucell::projection::Domain;

use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// 输出格式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ShowFormat {
    /// Terminal table
    Table,
    /// Pretty-printed JSON
    Json,
}

/// show 子命令参数
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Unit-cell definition file (JSON)
    pub input: PathBuf,

    /// Simulation domain to project (all, heat, phonon, xrd, optical)
    #[arg(short, long, default_value = "all")]
    pub domain: Domain,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = ShowFormat::Table)]
    pub format: ShowFormat,

    /// Write the JSON projection to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
