//! # 晶胞数据模型
//!
//! 保存晶胞的几何、质量、声子、热学和光学参数，以及按应变变化的原子位置。
//!
//! ## 不变量
//! - 四个子系统性质列表长度相同，该长度即子系统数
//! - 添加原子后依次重算：原始总质量 -> 密度 -> 单位面积质量 -> 弹簧常数
//! - 弹簧常数 `k0 = m (v / c)^2` 始终与最新的质量、声速和 c 轴一致
//! - 积分性质首次访问时符号求解并缓存，手动设置会覆盖缓存
//!
//! ## 依赖关系
//! - 被 `projection.rs`、`definition.rs` 和 `commands/` 使用
//! - 使用 `formula/` 解析和积分性质
//! - 使用 `models/atom.rs` 的原子接口

use crate::error::{CellError, Result};
use crate::formula::expr::format_number;
use crate::formula::{Formula, FormulaResolver, PropertyFunction, PropertySpec};
use crate::formula::{SymbolicDerivator, STRAIN, TEMPERATURE};
use crate::models::atom::AtomRef;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// 1 Å (m)
pub const ANGSTROM: f64 = 1e-10;

/// 质量归一化的参考面积 1 Å² (m²)
pub const REFERENCE_AREA: f64 = ANGSTROM * ANGSTROM;

/// 构造晶胞的可选参数
///
/// 未给出的标量默认为 0，子系统性质默认为单个常数 0。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitCellOptions {
    /// 面内 a 轴 (m)，默认等于 c 轴
    pub a_axis: Option<f64>,
    /// 面内 b 轴 (m)，默认等于 a 轴
    pub b_axis: Option<f64>,
    /// Debye-Waller 因子 <u>^2 (m²)
    pub debye_waller_factor: f64,
    /// 声速 (m/s)
    pub sound_velocity: f64,
    /// 声子阻尼 (kg/s)
    pub phonon_damping: f64,
    /// 光学穿透深度 (m)
    pub optical_penetration_depth: f64,
    /// 折射率 n + iκ
    pub optical_refractive_index: Complex64,
    /// 折射率随应变的变化 dn/dη + i dκ/dη
    pub optical_refractive_index_per_strain: Complex64,
    /// 热容 [J/(kg K)]
    pub heat_capacity: PropertySpec,
    /// 热导率 [W/(m K)]
    pub thermal_conductivity: PropertySpec,
    /// 线性热膨胀系数 [1/K]
    pub linear_thermal_expansion: PropertySpec,
    /// 子系统耦合 [W/m³]
    pub subsystem_coupling: PropertySpec,
}

/// 晶胞中的一个原子位置
#[derive(Debug, Clone)]
pub struct AtomSite {
    pub atom: AtomRef,
    /// 相对位置随应变的函数
    pub position: Formula,
    pub position_source: String,
}

/// 晶胞
#[derive(Debug, Clone)]
pub struct UnitCell {
    id: String,
    name: String,

    a_axis: f64,
    b_axis: f64,
    c_axis: f64,
    area: f64,
    volume: f64,

    /// 单位面积（1 Å²）质量 (kg)
    mass: f64,
    /// 密度 (kg/m³)
    density: f64,
    sound_velocity: f64,
    /// 弹簧常数 [kg/s²]，索引 0 为谐波项
    spring_constant: Vec<f64>,

    pub debye_waller_factor: f64,
    pub phonon_damping: f64,
    pub optical_penetration_depth: f64,
    pub optical_refractive_index: Complex64,
    pub optical_refractive_index_per_strain: Complex64,

    heat_capacity: Vec<PropertyFunction>,
    thermal_conductivity: Vec<PropertyFunction>,
    linear_thermal_expansion: Vec<PropertyFunction>,
    subsystem_coupling: Vec<PropertyFunction>,

    int_heat_capacity: Option<Vec<PropertyFunction>>,
    int_linear_thermal_expansion: Option<Vec<PropertyFunction>>,

    atoms: Vec<AtomSite>,
}

impl UnitCell {
    /// 创建晶胞
    ///
    /// 四个子系统性质解析后的长度不一致时返回 `SubsystemCountMismatch`。
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        c_axis: f64,
        options: UnitCellOptions,
    ) -> Result<Self> {
        let resolver = FormulaResolver::temperature();

        let heat_capacity = resolver.resolve(options.heat_capacity)?;
        let thermal_conductivity = resolver.resolve(options.thermal_conductivity)?;
        let linear_thermal_expansion = resolver.resolve(options.linear_thermal_expansion)?;
        let subsystem_coupling = resolver.resolve(options.subsystem_coupling)?;

        let n = heat_capacity.len();
        if thermal_conductivity.len() != n
            || linear_thermal_expansion.len() != n
            || subsystem_coupling.len() != n
        {
            return Err(CellError::SubsystemCountMismatch {
                heat_capacity: n,
                thermal_conductivity: thermal_conductivity.len(),
                linear_thermal_expansion: linear_thermal_expansion.len(),
                subsystem_coupling: subsystem_coupling.len(),
            });
        }

        let a_axis = options.a_axis.unwrap_or(c_axis);
        let b_axis = options.b_axis.unwrap_or(a_axis);
        let area = a_axis * b_axis;

        let mut cell = UnitCell {
            id: id.into(),
            name: name.into(),
            a_axis,
            b_axis,
            c_axis,
            area,
            volume: area * c_axis,
            mass: 0.0,
            density: 0.0,
            sound_velocity: 0.0,
            spring_constant: vec![0.0],
            debye_waller_factor: options.debye_waller_factor,
            phonon_damping: options.phonon_damping,
            optical_penetration_depth: options.optical_penetration_depth,
            optical_refractive_index: options.optical_refractive_index,
            optical_refractive_index_per_strain: options.optical_refractive_index_per_strain,
            heat_capacity,
            thermal_conductivity,
            linear_thermal_expansion,
            subsystem_coupling,
            int_heat_capacity: None,
            int_linear_thermal_expansion: None,
            atoms: Vec::new(),
        };
        cell.set_sound_velocity(options.sound_velocity);

        Ok(cell)
    }

    // ─────────────────────────────────────────────────────────────
    // 原子
    // ─────────────────────────────────────────────────────────────

    /// 在相对位置添加原子
    ///
    /// 数值位置 `p` 展开为 `lambda strain: p*(strain+1)`，即位置随晶格应变线性缩放。
    /// 添加后重算质量、密度和谐波弹簧常数。
    pub fn add_atom(&mut self, atom: AtomRef, position: impl Into<PropertySpec>) -> Result<()> {
        let resolver = FormulaResolver::strain();

        let (position, position_source) = match position.into() {
            PropertySpec::Number(p) => {
                let source = format!("lambda {}: {}*({}+1)", STRAIN, format_number(p), STRAIN);
                (resolver.parse_text(&source)?, source)
            }
            PropertySpec::List(_) => {
                return Err(CellError::InvalidInput(
                    "a list as a single atom position".to_string(),
                ))
            }
            other => {
                let resolved = resolver.resolve(other)?.pop().ok_or_else(|| {
                    CellError::InvalidInput("an empty atom position".to_string())
                })?;
                (resolved.function, resolved.source)
            }
        };

        self.atoms.push(AtomSite {
            atom,
            position,
            position_source,
        });
        self.update_mass();

        Ok(())
    }

    /// 在同一位置添加 `count` 个相同原子
    pub fn add_multiple_atoms(
        &mut self,
        atom: AtomRef,
        position: impl Into<PropertySpec>,
        count: usize,
    ) -> Result<()> {
        let position = position.into();
        for _ in 0..count {
            self.add_atom(AtomRef::clone(&atom), position.clone())?;
        }
        Ok(())
    }

    /// 重算质量、密度和弹簧常数
    ///
    /// 密度使用归一化之前的总质量。
    fn update_mass(&mut self) {
        let total: f64 = self.atoms.iter().map(|site| site.atom.mass()).sum();

        self.density = total / self.volume;
        self.mass = total * REFERENCE_AREA / self.area;
        self.update_spring_constant();

        log::debug!(
            "Unit cell '{}': {} atoms, mass = {:e} kg, density = {:e} kg/m³",
            self.id,
            self.atoms.len(),
            self.mass,
            self.density
        );
    }

    /// 不重复的原子 ID（按首次出现顺序）
    pub fn atom_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for site in &self.atoms {
            let id = site.atom.id();
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }

    /// 给定应变下所有原子的相对位置
    pub fn atom_positions(&self, strain: f64) -> Vec<f64> {
        self.atoms
            .iter()
            .map(|site| site.position.eval(strain))
            .collect()
    }

    pub fn atoms(&self) -> &[AtomSite] {
        &self.atoms
    }

    pub fn num_atoms(&self) -> usize {
        self.atoms.len()
    }

    // ─────────────────────────────────────────────────────────────
    // 声子参数
    // ─────────────────────────────────────────────────────────────

    /// 设置声速，同时重算谐波弹簧常数
    pub fn set_sound_velocity(&mut self, sound_velocity: f64) {
        self.sound_velocity = sound_velocity;
        self.update_spring_constant();
    }

    /// k0 = m (v / c)^2
    fn update_spring_constant(&mut self) {
        let k0 = self.mass * (self.sound_velocity / self.c_axis).powi(2);
        match self.spring_constant.first_mut() {
            Some(first) => *first = k0,
            None => self.spring_constant.push(k0),
        }
    }

    /// 设置非谐高阶弹簧常数，保留索引 0 的谐波项
    pub fn set_higher_order_spring_constants(&mut self, coefficients: &[f64]) {
        self.spring_constant.truncate(1);
        self.spring_constant.extend_from_slice(coefficients);
    }

    /// 声阻抗 Z = sqrt(k0 m) / A
    pub fn acoustic_impedance(&self) -> f64 {
        (self.spring_constant[0] * self.mass).sqrt() / self.area
    }

    pub fn sound_velocity(&self) -> f64 {
        self.sound_velocity
    }

    pub fn spring_constant(&self) -> &[f64] {
        &self.spring_constant
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn density(&self) -> f64 {
        self.density
    }

    // ─────────────────────────────────────────────────────────────
    // 几何
    // ─────────────────────────────────────────────────────────────

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn a_axis(&self) -> f64 {
        self.a_axis
    }

    pub fn b_axis(&self) -> f64 {
        self.b_axis
    }

    pub fn c_axis(&self) -> f64 {
        self.c_axis
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    // ─────────────────────────────────────────────────────────────
    // 子系统性质
    // ─────────────────────────────────────────────────────────────

    pub fn num_subsystems(&self) -> usize {
        self.heat_capacity.len()
    }

    pub fn heat_capacity(&self) -> &[PropertyFunction] {
        &self.heat_capacity
    }

    pub fn thermal_conductivity(&self) -> &[PropertyFunction] {
        &self.thermal_conductivity
    }

    pub fn linear_thermal_expansion(&self) -> &[PropertyFunction] {
        &self.linear_thermal_expansion
    }

    pub fn subsystem_coupling(&self) -> &[PropertyFunction] {
        &self.subsystem_coupling
    }

    /// 热容的原函数，首次访问时符号求解
    ///
    /// 积分失败时记录警告并返回空列表，缓存保持为空，可用
    /// [`UnitCell::set_int_heat_capacity`] 手动设置。
    pub fn int_heat_capacity(&mut self) -> &[PropertyFunction] {
        match self.try_int_heat_capacity() {
            Ok(functions) => functions,
            Err(e) => {
                log::warn!("{}", e);
                &[]
            }
        }
    }

    pub fn try_int_heat_capacity(&mut self) -> Result<&[PropertyFunction]> {
        cached_integral(&mut self.int_heat_capacity, &self.heat_capacity)
    }

    /// 手动设置热容原函数，跳过符号积分
    pub fn set_int_heat_capacity(&mut self, spec: impl Into<PropertySpec>) -> Result<()> {
        self.int_heat_capacity = Some(FormulaResolver::temperature().resolve(spec)?);
        Ok(())
    }

    /// 线性热膨胀系数的原函数，首次访问时符号求解
    pub fn int_linear_thermal_expansion(&mut self) -> &[PropertyFunction] {
        match self.try_int_linear_thermal_expansion() {
            Ok(functions) => functions,
            Err(e) => {
                log::warn!("{}", e);
                &[]
            }
        }
    }

    pub fn try_int_linear_thermal_expansion(&mut self) -> Result<&[PropertyFunction]> {
        cached_integral(
            &mut self.int_linear_thermal_expansion,
            &self.linear_thermal_expansion,
        )
    }

    /// 手动设置线性热膨胀原函数，跳过符号积分
    pub fn set_int_linear_thermal_expansion(
        &mut self,
        spec: impl Into<PropertySpec>,
    ) -> Result<()> {
        self.int_linear_thermal_expansion = Some(FormulaResolver::temperature().resolve(spec)?);
        Ok(())
    }
}

/// 返回缓存的原函数，缓存为空时符号求解并写入
fn cached_integral<'a>(
    cache: &'a mut Option<Vec<PropertyFunction>>,
    integrands: &[PropertyFunction],
) -> Result<&'a [PropertyFunction]> {
    let functions = match cache.take() {
        Some(functions) => functions,
        None => {
            let sources: Vec<&str> = integrands.iter().map(|p| p.source.as_str()).collect();
            SymbolicDerivator::new(TEMPERATURE).integrate(&sources)?
        }
    };
    Ok(cache.insert(functions).as_slice())
}

/// 字符串形式列表
pub fn sources(functions: &[PropertyFunction]) -> Vec<String> {
    functions.iter().map(|p| p.source.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::atom::Atom;

    const C_AXIS: f64 = 3.905 * ANGSTROM;

    fn sto() -> UnitCell {
        UnitCell::new("STO", "SrTiO3", C_AXIS, UnitCellOptions::default()).unwrap()
    }

    #[test]
    fn test_default_geometry() {
        let cell = sto();
        assert_eq!(cell.a_axis(), C_AXIS);
        assert_eq!(cell.b_axis(), C_AXIS);
        assert!((cell.area() - C_AXIS * C_AXIS).abs() < 1e-40);
        assert!((cell.volume() - C_AXIS.powi(3)).abs() < 1e-50);
        assert_eq!(cell.num_subsystems(), 1);
        assert_eq!(cell.spring_constant(), &[0.0]);
    }

    #[test]
    fn test_b_axis_defaults_to_a_axis() {
        let options = UnitCellOptions {
            a_axis: Some(4.0 * ANGSTROM),
            ..Default::default()
        };
        let cell = UnitCell::new("X", "X", 2.0 * ANGSTROM, options).unwrap();
        assert_eq!(cell.b_axis(), 4.0 * ANGSTROM);
        assert!((cell.area() - 16.0 * REFERENCE_AREA).abs() < 1e-35);
    }

    #[test]
    fn test_subsystem_count_mismatch() {
        let options = UnitCellOptions {
            heat_capacity: vec!["lambda T: 0.1*T", "lambda T: 500"].into(),
            thermal_conductivity: 12.0.into(),
            ..Default::default()
        };
        let err = UnitCell::new("X", "X", C_AXIS, options).unwrap_err();
        assert!(matches!(err, CellError::SubsystemCountMismatch { .. }));
    }

    #[test]
    fn test_two_subsystems() {
        let options = UnitCellOptions {
            heat_capacity: vec!["lambda T: 0.1*T", "lambda T: 500"].into(),
            thermal_conductivity: vec![1.0, 2.0].into(),
            linear_thermal_expansion: vec![0.0, 1e-5].into(),
            subsystem_coupling: vec!["lambda T: 1e17", "lambda T: -1e17"].into(),
            ..Default::default()
        };
        let cell = UnitCell::new("X", "X", C_AXIS, options).unwrap();
        assert_eq!(cell.num_subsystems(), 2);
        assert!((cell.heat_capacity()[0].eval(300.0) - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_add_atom_linear_strain_scaling() {
        let mut cell = sto();
        let sr = Atom::from_amu("Sr", "Strontium", 87.62).shared();
        cell.add_atom(sr, 0.5).unwrap();

        assert!((cell.atom_positions(0.0)[0] - 0.5).abs() < 1e-12);
        assert!((cell.atom_positions(1.0)[0] - 1.0).abs() < 1e-12);
        assert_eq!(cell.atoms()[0].position_source, "lambda strain: 0.5*(strain+1)");
    }

    #[test]
    fn test_add_atom_expression_position() {
        let mut cell = sto();
        let o = Atom::from_amu("O", "Oxygen", 15.999).shared();
        cell.add_atom(o, "lambda strain: 0.1*(strain+1) + 0.01").unwrap();
        assert!((cell.atom_positions(0.0)[0] - 0.11).abs() < 1e-12);
    }

    #[test]
    fn test_add_atom_rejects_list_and_callable() {
        let mut cell = sto();
        let o = Atom::from_amu("O", "Oxygen", 15.999).shared();
        assert!(matches!(
            cell.add_atom(o.clone(), vec![0.1, 0.2]),
            Err(CellError::InvalidInput(_))
        ));

        fn pos(strain: f64) -> f64 {
            strain
        }
        assert!(matches!(
            cell.add_atom(o, pos as fn(f64) -> f64),
            Err(CellError::UnsupportedInput)
        ));
        assert_eq!(cell.num_atoms(), 0);
    }

    #[test]
    fn test_mass_density_spring_constant() {
        let options = UnitCellOptions {
            sound_velocity: 5800.0,
            ..Default::default()
        };
        let mut cell = UnitCell::new("STO", "SrTiO3", C_AXIS, options).unwrap();
        let sr = Atom::from_amu("Sr", "Strontium", 87.62).shared();
        let ti = Atom::from_amu("Ti", "Titanium", 47.867).shared();
        cell.add_atom(sr.clone(), 0.0).unwrap();
        cell.add_atom(ti.clone(), 0.5).unwrap();

        let total = sr.mass() + ti.mass();
        assert!((cell.density() - total / cell.volume()).abs() < 1e-9 * cell.density());

        let mass = total * REFERENCE_AREA / cell.area();
        assert!((cell.mass() - mass).abs() < 1e-12 * mass);

        let k0 = mass * (5800.0 / C_AXIS).powi(2);
        assert!((cell.spring_constant()[0] - k0).abs() < 1e-9 * k0);
    }

    #[test]
    fn test_sound_velocity_updates_only_spring_constant() {
        let mut cell = sto();
        cell.add_atom(Atom::from_amu("Sr", "Strontium", 87.62).shared(), 0.0)
            .unwrap();
        let (mass, density) = (cell.mass(), cell.density());

        cell.set_sound_velocity(4000.0);
        assert_eq!(cell.mass(), mass);
        assert_eq!(cell.density(), density);
        let k0 = mass * (4000.0 / C_AXIS).powi(2);
        assert!((cell.spring_constant()[0] - k0).abs() < 1e-9 * k0);
    }

    #[test]
    fn test_higher_order_spring_constants() {
        let mut cell = sto();
        cell.add_atom(Atom::from_amu("Sr", "Strontium", 87.62).shared(), 0.0)
            .unwrap();
        cell.set_sound_velocity(5800.0);
        let k0 = cell.spring_constant()[0];

        cell.set_higher_order_spring_constants(&[7.0, 8.0]);
        assert_eq!(cell.spring_constant(), &[k0, 7.0, 8.0]);

        cell.set_higher_order_spring_constants(&[1.0]);
        assert_eq!(cell.spring_constant(), &[k0, 1.0]);
    }

    #[test]
    fn test_acoustic_impedance() {
        let options = UnitCellOptions {
            sound_velocity: 5000.0,
            ..Default::default()
        };
        let mut cell = UnitCell::new("X", "X", C_AXIS, options).unwrap();
        cell.add_atom(Atom::from_amu("Sr", "Strontium", 87.62).shared(), 0.0)
            .unwrap();
        let expected = (cell.spring_constant()[0] * cell.mass()).sqrt() / cell.area();
        assert_eq!(cell.acoustic_impedance(), expected);
    }

    #[test]
    fn test_atom_ids_first_seen_order() {
        let mut cell = sto();
        let sr = Atom::from_amu("Sr", "Strontium", 87.62).shared();
        let o = Atom::from_amu("O", "Oxygen", 15.999).shared();
        cell.add_atom(sr.clone(), 0.0).unwrap();
        cell.add_multiple_atoms(o.clone(), 0.5, 3).unwrap();
        cell.add_atom(sr, 0.9).unwrap();

        assert_eq!(cell.num_atoms(), 5);
        assert_eq!(cell.atom_ids(), vec!["Sr", "O"]);
        assert_eq!(cell.atom_positions(0.0).len(), 5);
    }

    #[test]
    fn test_int_heat_capacity_is_cached() {
        let options = UnitCellOptions {
            heat_capacity: "lambda T: 2*T".into(),
            ..Default::default()
        };
        let mut cell = UnitCell::new("X", "X", C_AXIS, options).unwrap();

        let first = cell.int_heat_capacity().as_ptr();
        let second = cell.int_heat_capacity().as_ptr();
        assert_eq!(first, second);
        assert_eq!(cell.int_heat_capacity()[0].source, "lambda T: T**2");
    }

    #[test]
    fn test_int_heat_capacity_failure_then_manual_set() {
        let options = UnitCellOptions {
            heat_capacity: "lambda T: T*exp(-T)".into(),
            ..Default::default()
        };
        let mut cell = UnitCell::new("X", "X", C_AXIS, options).unwrap();

        assert!(cell.int_heat_capacity().is_empty());
        assert!(matches!(
            cell.try_int_heat_capacity(),
            Err(CellError::SymbolicIntegration { .. })
        ));

        cell.set_int_heat_capacity("lambda T: -(T+1)*exp(-T)").unwrap();
        let int_cp = cell.int_heat_capacity();
        assert_eq!(int_cp.len(), 1);
        assert!((int_cp[0].eval(0.0) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_int_linear_thermal_expansion() {
        let options = UnitCellOptions {
            linear_thermal_expansion: 1e-5.into(),
            ..Default::default()
        };
        let mut cell = UnitCell::new("X", "X", C_AXIS, options).unwrap();
        let int_alpha = cell.int_linear_thermal_expansion();
        assert!((int_alpha[0].eval(100.0) - 1e-3).abs() < 1e-15);

        cell.set_int_linear_thermal_expansion(0.5).unwrap();
        assert_eq!(cell.int_linear_thermal_expansion()[0].eval(100.0), 0.5);
    }
}
