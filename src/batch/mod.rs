//! # 批量处理模块
//!
//! 并行处理目录中的多个晶胞定义文件。
//!
//! ## 功能
//! - 按 glob 模式收集定义文件
//! - 基于 rayon 的并行处理
//! - 进度反馈与统计
//!
//! ## 依赖关系
//! - 被 `commands/batch.rs` 使用
//! - 使用 `rayon` 进行并行处理
//! - 使用 `indicatif` 显示进度

pub mod collector;
pub mod runner;

pub use collector::FileCollector;
pub use runner::{BatchRunner, FileOutcome};
