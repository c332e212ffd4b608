//! # positions 子命令实现
//!
//! 在一组应变下计算晶胞中每个原子的相对位置。
//!
//! ## 依赖关系
//! - 使用 `cli/positions.rs` 定义的参数
//! - 使用 `ucell::definition` 读取晶胞
//! - 使用 `csv` 导出，`tabled` 显示

use crate::cli::positions::{parse_strain_range, strain_points, PositionsArgs};
use crate::utils::output;
use ucell::error::{CellError, Result};
use ucell::UnitCell;

use std::path::Path;
use tabled::builder::Builder;
use tabled::settings::Style;

/// 执行 positions
pub fn execute(args: PositionsArgs) -> Result<()> {
    let (start, end) = parse_strain_range(&args.strain_range).map_err(CellError::InvalidRange)?;
    if args.steps == 0 {
        return Err(CellError::InvalidArgument(
            "Number of strain points must be at least 1".to_string(),
        ));
    }

    let cell = ucell::load_unit_cell(&args.input)?;
    if cell.num_atoms() == 0 {
        output::print_warning(&format!("Unit cell '{}' has no atoms", cell.id()));
        return Ok(());
    }

    let strains = strain_points(start, end, args.steps);
    let (header, rows) = position_rows(&cell, &strains);

    match &args.output {
        Some(path) => {
            write_csv(path, &header, &rows)?;
            output::print_written(&args.input.display().to_string(), &path.display().to_string());
        }
        None => {
            output::print_header(&format!(
                "Atom Positions of '{}' (strain {} to {})",
                cell.name(),
                start,
                end
            ));
            let mut builder = Builder::default();
            builder.push_record(header);
            for row in rows {
                builder.push_record(row);
            }
            let mut table = builder.build();
            table.with(Style::rounded());
            println!("{}", table);
        }
    }

    Ok(())
}

/// 表头为 `strain` 加每个原子一列，原子列名为 `序号:ID`
fn position_rows(cell: &UnitCell, strains: &[f64]) -> (Vec<String>, Vec<Vec<String>>) {
    let mut header = vec!["strain".to_string()];
    header.extend(
        cell.atoms()
            .iter()
            .enumerate()
            .map(|(i, site)| format!("{}:{}", i, site.atom.id())),
    );

    let rows = strains
        .iter()
        .map(|&strain| {
            let mut row = vec![format!("{:.6}", strain)];
            row.extend(
                cell.atom_positions(strain)
                    .into_iter()
                    .map(|p| format!("{:.6}", p)),
            );
            row
        })
        .collect();

    (header, rows)
}

/// 导出 CSV
fn write_csv(path: &Path, header: &[String], rows: &[Vec<String>]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush().map_err(|e| CellError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ucell::models::{Atom, UnitCellOptions, ANGSTROM};

    fn cell() -> UnitCell {
        let mut cell = UnitCell::new("X", "X", 4.0 * ANGSTROM, UnitCellOptions::default()).unwrap();
        let oxygen = Atom::from_amu("O", "Oxygen", 15.999).shared();
        cell.add_atom(oxygen.clone(), 0.0).unwrap();
        cell.add_atom(oxygen, 0.5).unwrap();
        cell
    }

    #[test]
    fn test_position_rows() {
        let (header, rows) = position_rows(&cell(), &[0.0, 0.01]);
        assert_eq!(header, vec!["strain", "0:O", "1:O"]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][2], "0.505000");
    }

    #[test]
    fn test_write_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("positions.csv");
        let (header, rows) = position_rows(&cell(), &[0.0]);
        write_csv(&path, &header, &rows).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("strain,0:O,1:O"));
        assert_eq!(lines.next(), Some("0.000000,0.000000,0.500000"));
    }
}
