//! # 工具函数模块
//!
//! 提供美化输出、进度条和日志输出。
//!
//! ## 依赖关系
//! - 被 `commands/`、`batch/` 和 `main.rs` 使用
//! - 子模块: logger, output, progress

pub mod logger;
pub mod output;
pub mod progress;
