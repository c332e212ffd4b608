//! # ucell - 晶胞性质命令行工具
//!
//! 读取 JSON 晶胞定义，显示派生性质、扫描应变下的原子位置、
//! 求解性质表达式的原函数，或批量导出各领域性质。
//!
//! ## 子命令
//! - `show`      - 显示晶胞性质（表格或 JSON）
//! - `positions` - 应变扫描原子位置
//! - `integrate` - 符号积分表达式
//! - `batch`     - 批量导出性质到 JSON
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     └── ucell  (库: 解析、晶胞模型、领域导出)
//!   ├── batch/      (批量处理)
//!   └── utils/      (输出、进度条、日志)
//! ```

mod batch;
mod cli;
mod commands;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = utils::logger::init(cli.log_level()) {
        utils::output::print_warning(&format!("Logger unavailable: {}", e));
    }

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
