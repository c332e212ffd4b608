//! # show 子命令实现
//!
//! 读取晶胞定义，按领域导出性质，以表格或 JSON 输出。
//!
//! ## 依赖关系
//! - 使用 `cli/show.rs` 定义的参数
//! - 使用 `ucell::definition` 读取晶胞，`ucell::projection` 导出性质
//! - 使用 `utils/output.rs`

use crate::cli::show::{ShowArgs, ShowFormat};
use crate::utils::output;
use ucell::error::{CellError, Result};
use ucell::projection::{self, PropertyMap};

use std::fs;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// 性质表格行
#[derive(Debug, Clone, Tabled)]
struct PropertyRow {
    #[tabled(rename = "Property")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// 执行 show
pub fn execute(args: ShowArgs) -> Result<()> {
    let mut cell = ucell::load_unit_cell(&args.input)?;
    log::info!(
        "Loaded unit cell '{}' ({} atoms, {} subsystems)",
        cell.id(),
        cell.num_atoms(),
        cell.num_subsystems()
    );

    let map = projection::project(&mut cell, args.domain);

    if let Some(path) = &args.output {
        let json = serde_json::to_string_pretty(&map)?;
        fs::write(path, json).map_err(|e| CellError::FileWriteError {
            path: path.display().to_string(),
            source: e,
        })?;
        output::print_written(&args.input.display().to_string(), &path.display().to_string());
        return Ok(());
    }

    match args.format {
        ShowFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&map)?);
        }
        ShowFormat::Table => {
            output::print_header(&format!(
                "Unit Cell '{}' ({} properties)",
                cell.name(),
                args.domain
            ));
            println!("{}", render_table(&map));
        }
    }

    Ok(())
}

/// 渲染性质表格
fn render_table(map: &PropertyMap) -> String {
    let rows: Vec<PropertyRow> = map
        .iter()
        .map(|(name, value)| PropertyRow {
            name: name.to_string(),
            value: value.to_string(),
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::rounded());
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ucell::projection::PropertyValue;

    #[test]
    fn test_render_table() {
        let mut map = PropertyMap::new();
        map.insert("num_atoms", PropertyValue::Count(5));
        map.insert("heat_capacity", PropertyValue::Formulas(vec!["lambda T: 2*T".into()]));

        let table = render_table(&map);
        assert!(table.contains("Property"));
        assert!(table.contains("num_atoms"));
        assert!(table.contains("lambda T: 2*T"));
    }
}
