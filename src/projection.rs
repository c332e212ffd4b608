//! # 性质投影
//!
//! 按模拟领域（热、声子、XRD、光学）导出晶胞性质的子集，供下游模拟阶段读取。
//!
//! ## 领域字段表
//! | 领域      | 字段 |
//! |-----------|------|
//! | `heat`    | c_axis, area, volume, optical_penetration_depth, thermal_conductivity, heat_capacity, int_heat_capacity, subsystem_coupling, num_subsystems |
//! | `phonon`  | num_subsystems, int_linear_thermal_expansion, c_axis, mass, spring_constant, phonon_damping |
//! | `xrd`     | num_atoms, atoms, area, debye_waller_factor, c_axis |
//! | `optical` | c_axis, optical_penetration_depth, optical_refractive_index, optical_refractive_index_per_strain |
//! | `all`     | 全部字段 |
//!
//! ## 依赖关系
//! - 被 `commands/` 调用
//! - 使用 `models/unit_cell.rs`

use crate::error::CellError;
use crate::models::unit_cell::sources;
use crate::models::UnitCell;

use num_complex::Complex64;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// 模拟领域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    All,
    Heat,
    Phonon,
    Xrd,
    Optical,
}

impl FromStr for Domain {
    type Err = CellError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(Domain::All),
            "heat" => Ok(Domain::Heat),
            "phonon" => Ok(Domain::Phonon),
            "xrd" => Ok(Domain::Xrd),
            "optical" => Ok(Domain::Optical),
            _ => Err(CellError::UnknownDomain(s.to_string())),
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::All => write!(f, "all"),
            Domain::Heat => write!(f, "heat"),
            Domain::Phonon => write!(f, "phonon"),
            Domain::Xrd => write!(f, "XRD"),
            Domain::Optical => write!(f, "optical"),
        }
    }
}

/// 可导出的晶胞字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Id,
    Name,
    AAxis,
    BAxis,
    CAxis,
    Area,
    Volume,
    Mass,
    Density,
    SoundVelocity,
    SpringConstant,
    DebyeWallerFactor,
    PhononDamping,
    OpticalPenetrationDepth,
    OpticalRefractiveIndex,
    OpticalRefractiveIndexPerStrain,
    HeatCapacity,
    ThermalConductivity,
    LinearThermalExpansion,
    SubsystemCoupling,
    IntHeatCapacity,
    IntLinearThermalExpansion,
    NumSubsystems,
    Atoms,
    NumAtoms,
}

const ALL_FIELDS: &[Field] = &[
    Field::Id,
    Field::Name,
    Field::AAxis,
    Field::BAxis,
    Field::CAxis,
    Field::Area,
    Field::Volume,
    Field::Mass,
    Field::Density,
    Field::SoundVelocity,
    Field::SpringConstant,
    Field::DebyeWallerFactor,
    Field::PhononDamping,
    Field::OpticalPenetrationDepth,
    Field::OpticalRefractiveIndex,
    Field::OpticalRefractiveIndexPerStrain,
    Field::HeatCapacity,
    Field::ThermalConductivity,
    Field::LinearThermalExpansion,
    Field::SubsystemCoupling,
    Field::IntHeatCapacity,
    Field::IntLinearThermalExpansion,
    Field::NumSubsystems,
    Field::Atoms,
    Field::NumAtoms,
];

const HEAT_FIELDS: &[Field] = &[
    Field::CAxis,
    Field::Area,
    Field::Volume,
    Field::OpticalPenetrationDepth,
    Field::ThermalConductivity,
    Field::HeatCapacity,
    Field::IntHeatCapacity,
    Field::SubsystemCoupling,
    Field::NumSubsystems,
];

const PHONON_FIELDS: &[Field] = &[
    Field::NumSubsystems,
    Field::IntLinearThermalExpansion,
    Field::CAxis,
    Field::Mass,
    Field::SpringConstant,
    Field::PhononDamping,
];

const XRD_FIELDS: &[Field] = &[
    Field::NumAtoms,
    Field::Atoms,
    Field::Area,
    Field::DebyeWallerFactor,
    Field::CAxis,
];

const OPTICAL_FIELDS: &[Field] = &[
    Field::CAxis,
    Field::OpticalPenetrationDepth,
    Field::OpticalRefractiveIndex,
    Field::OpticalRefractiveIndexPerStrain,
];

impl Domain {
    /// 该领域的字段
    pub fn fields(&self) -> &'static [Field] {
        match self {
            Domain::All => ALL_FIELDS,
            Domain::Heat => HEAT_FIELDS,
            Domain::Phonon => PHONON_FIELDS,
            Domain::Xrd => XRD_FIELDS,
            Domain::Optical => OPTICAL_FIELDS,
        }
    }
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::Name => "name",
            Field::AAxis => "a_axis",
            Field::BAxis => "b_axis",
            Field::CAxis => "c_axis",
            Field::Area => "area",
            Field::Volume => "volume",
            Field::Mass => "mass",
            Field::Density => "density",
            Field::SoundVelocity => "sound_velocity",
            Field::SpringConstant => "spring_constant",
            Field::DebyeWallerFactor => "debye_waller_factor",
            Field::PhononDamping => "phonon_damping",
            Field::OpticalPenetrationDepth => "optical_penetration_depth",
            Field::OpticalRefractiveIndex => "optical_refractive_index",
            Field::OpticalRefractiveIndexPerStrain => "optical_refractive_index_per_strain",
            Field::HeatCapacity => "heat_capacity",
            Field::ThermalConductivity => "thermal_conductivity",
            Field::LinearThermalExpansion => "linear_thermal_expansion",
            Field::SubsystemCoupling => "subsystem_coupling",
            Field::IntHeatCapacity => "int_heat_capacity",
            Field::IntLinearThermalExpansion => "int_linear_thermal_expansion",
            Field::NumSubsystems => "num_subsystems",
            Field::Atoms => "atoms",
            Field::NumAtoms => "num_atoms",
        }
    }

    /// 读取字段值，积分性质会在此触发惰性求解
    fn value(&self, cell: &mut UnitCell) -> PropertyValue {
        match self {
            Field::Id => PropertyValue::Text(cell.id().to_string()),
            Field::Name => PropertyValue::Text(cell.name().to_string()),
            Field::AAxis => PropertyValue::Number(cell.a_axis()),
            Field::BAxis => PropertyValue::Number(cell.b_axis()),
            Field::CAxis => PropertyValue::Number(cell.c_axis()),
            Field::Area => PropertyValue::Number(cell.area()),
            Field::Volume => PropertyValue::Number(cell.volume()),
            Field::Mass => PropertyValue::Number(cell.mass()),
            Field::Density => PropertyValue::Number(cell.density()),
            Field::SoundVelocity => PropertyValue::Number(cell.sound_velocity()),
            Field::SpringConstant => PropertyValue::Numbers(cell.spring_constant().to_vec()),
            Field::DebyeWallerFactor => PropertyValue::Number(cell.debye_waller_factor),
            Field::PhononDamping => PropertyValue::Number(cell.phonon_damping),
            Field::OpticalPenetrationDepth => {
                PropertyValue::Number(cell.optical_penetration_depth)
            }
            Field::OpticalRefractiveIndex => {
                PropertyValue::Complex(cell.optical_refractive_index)
            }
            Field::OpticalRefractiveIndexPerStrain => {
                PropertyValue::Complex(cell.optical_refractive_index_per_strain)
            }
            Field::HeatCapacity => PropertyValue::Formulas(sources(cell.heat_capacity())),
            Field::ThermalConductivity => {
                PropertyValue::Formulas(sources(cell.thermal_conductivity()))
            }
            Field::LinearThermalExpansion => {
                PropertyValue::Formulas(sources(cell.linear_thermal_expansion()))
            }
            Field::SubsystemCoupling => {
                PropertyValue::Formulas(sources(cell.subsystem_coupling()))
            }
            Field::IntHeatCapacity => PropertyValue::Formulas(sources(cell.int_heat_capacity())),
            Field::IntLinearThermalExpansion => {
                PropertyValue::Formulas(sources(cell.int_linear_thermal_expansion()))
            }
            Field::NumSubsystems => PropertyValue::Count(cell.num_subsystems()),
            Field::Atoms => PropertyValue::Atoms(
                cell.atoms()
                    .iter()
                    .map(|site| AtomEntry {
                        id: site.atom.id().to_string(),
                        name: site.atom.name().to_string(),
                        mass: site.atom.mass(),
                        position: site.position_source.clone(),
                    })
                    .collect(),
            ),
            Field::NumAtoms => PropertyValue::Count(cell.num_atoms()),
        }
    }
}

/// 投影中的原子条目
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtomEntry {
    pub id: String,
    pub name: String,
    pub mass: f64,
    pub position: String,
}

/// 字段值
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Number(f64),
    Count(usize),
    Text(String),
    Complex(Complex64),
    Numbers(Vec<f64>),
    Formulas(Vec<String>),
    Atoms(Vec<AtomEntry>),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Number(v) => write!(f, "{:e}", v),
            PropertyValue::Count(n) => write!(f, "{}", n),
            PropertyValue::Text(s) => write!(f, "{}", s),
            PropertyValue::Complex(c) => write!(f, "{} + {}i", c.re, c.im),
            PropertyValue::Numbers(values) => {
                let parts: Vec<String> = values.iter().map(|v| format!("{:e}", v)).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            PropertyValue::Formulas(items) => write!(f, "{}", items.join("\n")),
            PropertyValue::Atoms(atoms) => {
                let parts: Vec<String> = atoms
                    .iter()
                    .map(|a| format!("{} @ {}", a.id, a.position))
                    .collect();
                write!(f, "{}", parts.join("\n"))
            }
        }
    }
}

/// 字段名 -> 值
pub type PropertyMap = BTreeMap<&'static str, PropertyValue>;

/// 导出某一领域的性质
pub fn project(cell: &mut UnitCell, domain: Domain) -> PropertyMap {
    domain
        .fields()
        .iter()
        .map(|field| (field.name(), field.value(cell)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Atom, UnitCellOptions, ANGSTROM};
    use std::collections::BTreeSet;

    fn cell() -> UnitCell {
        let options = UnitCellOptions {
            sound_velocity: 5800.0,
            heat_capacity: "lambda T: 2*T".into(),
            ..Default::default()
        };
        let mut cell = UnitCell::new("STO", "SrTiO3", 3.905 * ANGSTROM, options).unwrap();
        cell.add_atom(Atom::from_amu("Sr", "Strontium", 87.62).shared(), 0.0)
            .unwrap();
        cell
    }

    fn keys(map: &PropertyMap) -> BTreeSet<&'static str> {
        map.keys().copied().collect()
    }

    #[test]
    fn test_optical_projection_fields() {
        let map = project(&mut cell(), Domain::Optical);
        let expected: BTreeSet<&str> = [
            "c_axis",
            "optical_penetration_depth",
            "optical_refractive_index",
            "optical_refractive_index_per_strain",
        ]
        .into_iter()
        .collect();
        assert_eq!(keys(&map), expected);
    }

    #[test]
    fn test_heat_projection_derives_integral() {
        let map = project(&mut cell(), Domain::Heat);
        assert_eq!(map.len(), HEAT_FIELDS.len());
        assert_eq!(
            map["int_heat_capacity"],
            PropertyValue::Formulas(vec!["lambda T: T**2".to_string()])
        );
    }

    #[test]
    fn test_phonon_and_xrd_projection() {
        let mut cell = cell();
        let phonon = project(&mut cell, Domain::Phonon);
        assert_eq!(
            phonon["spring_constant"],
            PropertyValue::Numbers(cell.spring_constant().to_vec())
        );

        let xrd = project(&mut cell, Domain::Xrd);
        assert_eq!(xrd["num_atoms"], PropertyValue::Count(1));
        match &xrd["atoms"] {
            PropertyValue::Atoms(atoms) => assert_eq!(atoms[0].id, "Sr"),
            other => panic!("unexpected value: {other:?}"),
        }
    }

    #[test]
    fn test_all_projection_contains_every_field() {
        let map = project(&mut cell(), Domain::All);
        assert_eq!(map.len(), ALL_FIELDS.len());
        for domain in [Domain::Heat, Domain::Phonon, Domain::Xrd, Domain::Optical] {
            for field in domain.fields() {
                assert!(map.contains_key(field.name()));
            }
        }
    }

    #[test]
    fn test_domain_parsing() {
        assert_eq!("XRD".parse::<Domain>().unwrap(), Domain::Xrd);
        assert_eq!("heat".parse::<Domain>().unwrap(), Domain::Heat);
        assert!(matches!(
            "acoustic".parse::<Domain>(),
            Err(CellError::UnknownDomain(_))
        ));
    }

    #[test]
    fn test_projection_serializes_to_json() {
        let map = project(&mut cell(), Domain::Optical);
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json["optical_refractive_index"], serde_json::json!([0.0, 0.0]));
    }
}
