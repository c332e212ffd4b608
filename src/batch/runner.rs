//! # 批量执行器
//!
//! 在独立的 rayon 线程池中并行处理定义文件，汇总每个文件的结果。
//!
//! ## 依赖关系
//! - 被 `commands/batch.rs` 调用
//! - 使用 `utils/progress.rs` 创建进度条
//! - 使用 `rayon`、`num_cpus`

use crate::utils::progress;
use ucell::error::{CellError, Result};

use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// 单个定义文件的处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    /// 已写出投影文件
    Written(PathBuf),
    /// 输出已存在，未覆盖
    Skipped(PathBuf),
    /// 读取、解析或写出失败
    Failed { input: PathBuf, reason: String },
}

/// 批量统计
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub written: usize,
    pub skipped: usize,
    /// (输入文件, 原因)
    pub failures: Vec<(PathBuf, String)>,
}

impl BatchSummary {
    fn record(mut self, outcome: FileOutcome) -> Self {
        match outcome {
            FileOutcome::Written(_) => self.written += 1,
            FileOutcome::Skipped(_) => self.skipped += 1,
            FileOutcome::Failed { input, reason } => self.failures.push((input, reason)),
        }
        self
    }

    fn combine(mut self, other: Self) -> Self {
        self.written += other.written;
        self.skipped += other.skipped;
        self.failures.extend(other.failures);
        self
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn total(&self) -> usize {
        self.written + self.skipped + self.failed()
    }
}

/// 批量执行器
pub struct BatchRunner {
    jobs: usize,
}

impl BatchRunner {
    /// `jobs` 为 0 时使用全部 CPU 核心
    pub fn new(jobs: usize) -> Self {
        let jobs = if jobs == 0 { num_cpus::get() } else { jobs };
        Self { jobs }
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// 并行处理，失败按输入路径排序
    pub fn run<F>(&self, files: &[PathBuf], process: F) -> Result<BatchSummary>
    where
        F: Fn(&Path) -> FileOutcome + Sync + Send,
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .map_err(|e| CellError::InvalidArgument(format!("Failed to start workers: {}", e)))?;

        let pb = progress::create_progress_bar(files.len() as u64, "Projecting");

        let mut summary = pool.install(|| {
            files
                .par_iter()
                .map(|file| {
                    let outcome = process(file);
                    if let FileOutcome::Failed { input, reason } = &outcome {
                        log::debug!("{}: {}", input.display(), reason);
                    }
                    pb.inc(1);
                    outcome
                })
                .fold(BatchSummary::default, BatchSummary::record)
                .reduce(BatchSummary::default, BatchSummary::combine)
        });

        pb.finish_and_clear();
        summary.failures.sort_by(|a, b| a.0.cmp(&b.0));

        Ok(summary)
    }
}
