//! # 日志输出
//!
//! 为 `log` 门面提供终端实现：库内的 `log::warn!` / `log::debug!` 等记录
//! 通过 `utils/output.rs` 的彩色标签打印到 stderr。
//!
//! ## 依赖关系
//! - 被 `main.rs` 初始化
//! - 使用 `utils/output.rs`
//! - 使用 `log` crate

use crate::utils::output;

use log::{Level, LevelFilter, Metadata, Record, SetLoggerError};

static LOGGER: TerminalLogger = TerminalLogger;

struct TerminalLogger;

/// 安装日志实现并设置最大级别
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER).map(|()| log::set_max_level(level))
}

/// 由 `-v` 次数和 `-q` 得到日志级别
///
/// 默认只显示警告；`-q` 只保留错误。
pub fn level_from_flags(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

impl log::Log for TerminalLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let msg = record.args().to_string();
        match record.level() {
            Level::Error => output::print_error(&msg),
            Level::Warn => output::print_warning(&msg),
            Level::Info => output::print_info(&msg),
            Level::Debug | Level::Trace => {
                output::print_debug(&format!("{}: {}", record.target(), msg))
            }
        }
    }

    fn flush(&self) {}
}
