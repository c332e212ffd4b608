//! # 晶胞定义文件
//!
//! 从 JSON 文件读取晶胞参数、原子列表和可选的手动原函数，构造 `UnitCell`。
//!
//! ## 文件格式
//! ```text
//! {
//!   "id": "STO",
//!   "name": "SrTiO3",
//!   "c_axis": 3.905e-10,
//!   "sound_velocity": 5800,
//!   "heat_capacity": ["lambda T: 0.112*T", "lambda T: 450"],
//!   "thermal_conductivity": [0, 12],
//!   "linear_thermal_expansion": [0, 1e-5],
//!   "subsystem_coupling": ["lambda T: 5e17", "lambda T: -5e17"],
//!   "optical_refractive_index": [2.44, 0.01],
//!   "atoms": [
//!     { "id": "Sr", "name": "Strontium", "mass_amu": 87.62, "position": 0 },
//!     { "id": "O", "name": "Oxygen", "mass_amu": 15.999, "position": 0.5, "count": 2 }
//!   ],
//!   "higher_order_spring_constants": [1e3],
//!   "int_heat_capacity": ["lambda T: 0.056*T**2", "lambda T: 450*T"]
//! }
//! ```
//! 构造参数与 `UnitCellOptions` 的字段一一对应（SI 单位）。
//!
//! ## 依赖关系
//! - 被 `commands/` 调用
//! - 使用 `models/` 构造晶胞
//! - 使用 `serde_json` 解析

use crate::error::{CellError, Result};
use crate::formula::PropertySpec;
use crate::models::{Atom, AtomRef, UnitCell, UnitCellOptions};

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// 原子条目
#[derive(Debug, Clone, Deserialize)]
pub struct AtomDefinition {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// 质量 (kg)
    #[serde(default)]
    pub mass: Option<f64>,
    /// 质量 (u)
    #[serde(default)]
    pub mass_amu: Option<f64>,
    /// 相对位置（数值或 `lambda strain: ...`）
    #[serde(default)]
    pub position: PropertySpec,
    #[serde(default = "default_count")]
    pub count: usize,
}

fn default_count() -> usize {
    1
}

impl AtomDefinition {
    fn to_atom(&self) -> std::result::Result<Atom, String> {
        let name = self.name.clone().unwrap_or_else(|| self.id.clone());
        match (self.mass, self.mass_amu) {
            (Some(mass), None) => Ok(Atom::new(&self.id, name, mass)),
            (None, Some(amu)) => Ok(Atom::from_amu(&self.id, name, amu)),
            (Some(_), Some(_)) => Err(format!(
                "atom '{}' specifies both 'mass' and 'mass_amu'",
                self.id
            )),
            (None, None) => Err(format!("atom '{}' has no mass", self.id)),
        }
    }
}

/// 晶胞定义
#[derive(Debug, Clone, Deserialize)]
pub struct CellDefinition {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// 面外 c 轴 (m)
    pub c_axis: f64,
    #[serde(flatten)]
    pub options: UnitCellOptions,
    #[serde(default)]
    pub atoms: Vec<AtomDefinition>,
    #[serde(default)]
    pub higher_order_spring_constants: Vec<f64>,
    #[serde(default)]
    pub int_heat_capacity: Option<PropertySpec>,
    #[serde(default)]
    pub int_linear_thermal_expansion: Option<PropertySpec>,
}

impl CellDefinition {
    /// 从字符串内容解析
    pub fn from_json(content: &str, origin: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| CellError::DefinitionError {
            path: origin.to_string(),
            reason: e.to_string(),
        })
    }

    /// 构造晶胞
    ///
    /// 相同 ID 的原子条目共享同一个原子引用。
    pub fn build(self, origin: &str) -> Result<UnitCell> {
        let definition_error = |reason: String| CellError::DefinitionError {
            path: origin.to_string(),
            reason,
        };

        let name = self.name.unwrap_or_else(|| self.id.clone());
        let mut cell = UnitCell::new(self.id, name, self.c_axis, self.options)?;

        let mut registry: HashMap<String, (Atom, AtomRef)> = HashMap::new();
        for entry in &self.atoms {
            let atom = entry.to_atom().map_err(definition_error)?;

            let shared = match registry.get(&entry.id) {
                Some((known, shared)) if *known == atom => AtomRef::clone(shared),
                Some(_) => {
                    return Err(definition_error(format!(
                        "atom '{}' is defined twice with different properties",
                        entry.id
                    )))
                }
                None => {
                    let shared = atom.clone().shared();
                    registry.insert(entry.id.clone(), (atom, AtomRef::clone(&shared)));
                    shared
                }
            };

            cell.add_multiple_atoms(shared, entry.position.clone(), entry.count)?;
        }

        if !self.higher_order_spring_constants.is_empty() {
            cell.set_higher_order_spring_constants(&self.higher_order_spring_constants);
        }
        if let Some(spec) = self.int_heat_capacity {
            cell.set_int_heat_capacity(spec)?;
        }
        if let Some(spec) = self.int_linear_thermal_expansion {
            cell.set_int_linear_thermal_expansion(spec)?;
        }

        Ok(cell)
    }
}

/// 读取定义文件并构造晶胞
pub fn load_unit_cell(path: &Path) -> Result<UnitCell> {
    if !path.is_file() {
        return Err(CellError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let content = fs::read_to_string(path).map_err(|e| CellError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    let origin = path.display().to_string();
    CellDefinition::from_json(&content, &origin)?.build(&origin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ATOMIC_MASS_UNIT, ANGSTROM};

    const STO: &str = r#"
{
  "id": "STO",
  "name": "SrTiO3",
  "c_axis": 3.905e-10,
  "sound_velocity": 5800,
  "heat_capacity": ["lambda T: 0.112*T", "lambda T: 450"],
  "thermal_conductivity": [0, 12],
  "linear_thermal_expansion": [0, 1e-5],
  "subsystem_coupling": ["lambda T: 5e17", "lambda T: -5e17"],
  "optical_refractive_index": [2.44, 0.01],
  "atoms": [
    { "id": "Sr", "name": "Strontium", "mass_amu": 87.62, "position": 0 },
    { "id": "Ti", "name": "Titanium", "mass_amu": 47.867, "position": 0.5 },
    { "id": "O", "name": "Oxygen", "mass_amu": 15.999, "position": 0, "count": 2 },
    { "id": "O", "name": "Oxygen", "mass_amu": 15.999, "position": "lambda strain: 0.5*(strain+1)" }
  ],
  "higher_order_spring_constants": [1000]
}
"#;

    #[test]
    fn test_build_from_json() {
        let cell = CellDefinition::from_json(STO, "inline")
            .unwrap()
            .build("inline")
            .unwrap();

        assert_eq!(cell.name(), "SrTiO3");
        assert_eq!(cell.num_subsystems(), 2);
        assert_eq!(cell.num_atoms(), 5);
        assert_eq!(cell.atom_ids(), vec!["Sr", "Ti", "O"]);
        assert!((cell.c_axis() - 3.905 * ANGSTROM).abs() < 1e-25);
        assert_eq!(cell.optical_refractive_index.re, 2.44);
        assert_eq!(cell.spring_constant().len(), 2);
        assert_eq!(cell.spring_constant()[1], 1000.0);

        let total = (87.62 + 47.867 + 3.0 * 15.999) * ATOMIC_MASS_UNIT;
        assert!((cell.density() - total / cell.volume()).abs() < 1e-9 * cell.density());
    }

    #[test]
    fn test_same_id_shares_reference() {
        let cell = CellDefinition::from_json(STO, "inline")
            .unwrap()
            .build("inline")
            .unwrap();
        let oxygen: Vec<_> = cell
            .atoms()
            .iter()
            .filter(|site| site.atom.id() == "O")
            .collect();
        assert_eq!(oxygen.len(), 3);
        assert!(AtomRef::ptr_eq(&oxygen[0].atom, &oxygen[2].atom));
    }

    #[test]
    fn test_conflicting_atom_definitions() {
        let json = r#"{
            "id": "X", "c_axis": 4e-10,
            "atoms": [
                { "id": "O", "mass_amu": 16 },
                { "id": "O", "mass_amu": 17 }
            ]
        }"#;
        let err = CellDefinition::from_json(json, "inline")
            .unwrap()
            .build("inline")
            .unwrap_err();
        assert!(matches!(err, CellError::DefinitionError { .. }));
    }

    #[test]
    fn test_missing_mass() {
        let json = r#"{ "id": "X", "c_axis": 4e-10, "atoms": [{ "id": "O" }] }"#;
        let err = CellDefinition::from_json(json, "inline")
            .unwrap()
            .build("inline")
            .unwrap_err();
        assert!(matches!(err, CellError::DefinitionError { .. }));
    }

    #[test]
    fn test_manual_integrals_override() {
        let json = r#"{
            "id": "X", "c_axis": 4e-10,
            "heat_capacity": "lambda T: T*exp(-T)",
            "int_heat_capacity": "lambda T: -(T+1)*exp(-T)"
        }"#;
        let mut cell = CellDefinition::from_json(json, "inline")
            .unwrap()
            .build("inline")
            .unwrap();
        assert_eq!(cell.int_heat_capacity().len(), 1);
    }

    #[test]
    fn test_invalid_json_reports_origin() {
        let err = CellDefinition::from_json("{ not json", "broken.json").unwrap_err();
        match err {
            CellError::DefinitionError { path, .. } => assert_eq!(path, "broken.json"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
