//! # positions 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/positions.rs`

use clap::Args;
use std::path::PathBuf;

/// positions 子命令参数
#[derive(Args, Debug)]
pub struct PositionsArgs {
    /// Unit-cell definition file (JSON)
    pub input: PathBuf,

    /// Strain range as 'start:end' (e.g., '0:0.01')
    #[arg(short, long, default_value = "0:0.01", allow_hyphen_values = true)]
    pub strain_range: String,

    /// Number of strain points (including both ends)
    #[arg(short = 'n', long, default_value_t = 11)]
    pub steps: usize,

    /// Export to CSV instead of printing a table
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// 解析应变范围 "start:end"
pub fn parse_strain_range(input: &str) -> Result<(f64, f64), String> {
    let (start, end) = input
        .split_once(':')
        .ok_or_else(|| format!("Invalid strain range '{}', expected 'start:end'", input))?;

    let start: f64 = start
        .trim()
        .parse()
        .map_err(|_| format!("Invalid strain value: '{}'", start.trim()))?;
    let end: f64 = end
        .trim()
        .parse()
        .map_err(|_| format!("Invalid strain value: '{}'", end.trim()))?;

    if !start.is_finite() || !end.is_finite() {
        return Err(format!("Strain range '{}' must be finite", input));
    }

    Ok((start, end))
}

/// 在区间内等距取 `steps` 个点
pub fn strain_points(start: f64, end: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => vec![],
        1 => vec![start],
        _ => {
            let step = (end - start) / (steps - 1) as f64;
            (0..steps).map(|i| start + step * i as f64).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strain_range() {
        assert_eq!(parse_strain_range("0:0.01").unwrap(), (0.0, 0.01));
        assert_eq!(parse_strain_range("-0.02 : 0.02").unwrap(), (-0.02, 0.02));
        assert!(parse_strain_range("0.01").is_err());
        assert!(parse_strain_range("a:b").is_err());
        assert!(parse_strain_range("0:inf").is_err());
    }

    #[test]
    fn test_strain_points() {
        let points = strain_points(0.0, 0.01, 3);
        assert_eq!(points.len(), 3);
        assert!((points[1] - 0.005).abs() < 1e-15);
        assert!((points[2] - 0.01).abs() < 1e-15);
        assert_eq!(strain_points(0.5, 1.0, 1), vec![0.5]);
        assert!(strain_points(0.0, 1.0, 0).is_empty());
    }
}
