//! # batch 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/batch.rs`

use ucell::projection::Domain;

use clap::Args;
use std::path::PathBuf;

/// batch 子命令参数
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Directory (or single file) with unit-cell definitions
    pub input: PathBuf,

    /// Output directory for the projected JSON files
    #[arg(short, long)]
    pub output: PathBuf,

    /// Simulation domain to project (all, heat, phonon, xrd, optical)
    #[arg(short, long, default_value = "all")]
    pub domain: Domain,

    /// File pattern(s), comma separated
    #[arg(short, long, default_value = "*.json")]
    pub pattern: String,

    /// Number of parallel jobs (0 = all CPU cores)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,

    /// Search subdirectories
    #[arg(short, long, default_value_t = false)]
    pub recursive: bool,

    /// Overwrite existing output files
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,
}
