//! # batch 子命令实现
//!
//! 批量读取晶胞定义，按领域导出性质并写成 JSON 文件。
//!
//! ## 依赖关系
//! - 使用 `cli/batch.rs` 定义的参数
//! - 使用 `batch/` 模块收集文件并并行处理
//! - 使用 `ucell::definition` 和 `ucell::projection`

use crate::batch::{BatchRunner, FileCollector, FileOutcome};
use crate::cli::batch::BatchArgs;
use crate::utils::output;
use ucell::error::{CellError, Result};
use ucell::projection::{self, Domain};

use std::fs;
use std::path::{Path, PathBuf};

const MAX_REPORTED_FAILURES: usize = 10;

/// 执行 batch
pub fn execute(args: BatchArgs) -> Result<()> {
    output::print_header("Batch Unit-Cell Projection");

    if !args.input.exists() {
        return Err(CellError::FileNotFound {
            path: args.input.display().to_string(),
        });
    }

    let files = FileCollector::new(args.input.clone())
        .with_pattern(&args.pattern)?
        .recursive(args.recursive)
        .collect();

    if files.is_empty() {
        output::print_warning(&format!(
            "No matching files found with pattern '{}'",
            args.pattern
        ));
        return Ok(());
    }

    fs::create_dir_all(&args.output).map_err(|e| CellError::FileWriteError {
        path: args.output.display().to_string(),
        source: e,
    })?;

    let runner = BatchRunner::new(args.jobs);
    output::print_info(&format!(
        "Found {} definition files, projecting '{}' with {} jobs",
        files.len(),
        args.domain,
        runner.jobs()
    ));

    let summary = runner.run(&files, |file| {
        process_file(file, &args.output, args.domain, args.overwrite)
    })?;

    output::print_separator();
    output::print_success(&format!(
        "Batch complete: {} of {} written, {} skipped, {} failed",
        summary.written,
        summary.total(),
        summary.skipped,
        summary.failed()
    ));

    if !summary.failures.is_empty() {
        output::print_warning("Failed files:");
        for (path, reason) in summary.failures.iter().take(MAX_REPORTED_FAILURES) {
            output::print_error(&format!("  {}: {}", path.display(), reason));
        }
        if summary.failed() > MAX_REPORTED_FAILURES {
            output::print_warning(&format!(
                "  ... and {} more",
                summary.failed() - MAX_REPORTED_FAILURES
            ));
        }
    }

    Ok(())
}

/// 输出文件名 `<stem>_<domain>.json`
fn output_path(input: &Path, output_dir: &Path, domain: Domain) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("cell");
    output_dir.join(format!("{}_{}.json", stem, domain.to_string().to_lowercase()))
}

/// 处理单个定义文件
fn process_file(input: &Path, output_dir: &Path, domain: Domain, overwrite: bool) -> FileOutcome {
    let output_file = output_path(input, output_dir, domain);

    if output_file.exists() && !overwrite {
        log::info!("Output exists, skipping: {}", output_file.display());
        return FileOutcome::Skipped(output_file);
    }

    match project_to_file(input, &output_file, domain) {
        Ok(()) => FileOutcome::Written(output_file),
        Err(e) => FileOutcome::Failed {
            input: input.to_path_buf(),
            reason: e.to_string(),
        },
    }
}

fn project_to_file(input: &Path, output: &Path, domain: Domain) -> Result<()> {
    let mut cell = ucell::load_unit_cell(input)?;
    let map = projection::project(&mut cell, domain);
    let json = serde_json::to_string_pretty(&map)?;
    fs::write(output, json).map_err(|e| CellError::FileWriteError {
        path: output.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CELL: &str = r#"{
        "id": "Al", "c_axis": 4.05e-10, "sound_velocity": 6420,
        "heat_capacity": "lambda T: 2.4*T",
        "atoms": [{ "id": "Al", "mass_amu": 26.98, "count": 4 }]
    }"#;

    #[test]
    fn test_output_path() {
        let path = output_path(Path::new("cells/STO.json"), Path::new("out"), Domain::Xrd);
        assert_eq!(path, PathBuf::from("out/STO_xrd.json"));
    }

    #[test]
    fn test_process_file_writes_and_skips() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("Al.json");
        fs::write(&input, CELL).unwrap();
        let out_dir = dir.path().join("out");
        fs::create_dir(&out_dir).unwrap();

        let first = process_file(&input, &out_dir, Domain::Heat, false);
        assert_eq!(first, FileOutcome::Written(out_dir.join("Al_heat.json")));

        let written = fs::read_to_string(out_dir.join("Al_heat.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["int_heat_capacity"][0], "lambda T: 1.2*T**2");
        assert_eq!(value["num_subsystems"], 1);

        let second = process_file(&input, &out_dir, Domain::Heat, false);
        assert!(matches!(second, FileOutcome::Skipped(_)));
    }

    #[test]
    fn test_process_file_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.json");
        fs::write(&input, "{ \"id\": \"X\" }").unwrap();

        let result = process_file(&input, dir.path(), Domain::All, true);
        assert!(matches!(result, FileOutcome::Failed { .. }));
    }
}
