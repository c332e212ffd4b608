//! # 原子数据模型
//!
//! 晶胞只通过 `Constituent` 接口读取原子的 `id`、`name` 和 `mass`，
//! 原子本身可被多个晶胞共享，晶胞从不修改它。
//!
//! ## 依赖关系
//! - 被 `models/unit_cell.rs` 使用
//! - 被 `definition.rs` 构造

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// 原子质量单位 (kg)
pub const ATOMIC_MASS_UNIT: f64 = 1.660_539_066_60e-27;

/// 晶胞可引用的原子接口
pub trait Constituent: fmt::Debug + Send + Sync {
    /// 原子 ID
    fn id(&self) -> &str;

    /// 原子名称
    fn name(&self) -> &str;

    /// 原子质量 (kg)
    fn mass(&self) -> f64;
}

/// 共享的原子引用
pub type AtomRef = Arc<dyn Constituent>;

/// 原子信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    /// 原子 ID（如 "Sr"）
    pub id: String,

    /// 显示名称
    pub name: String,

    /// 质量 (kg)
    pub mass: f64,
}

impl Atom {
    pub fn new(id: impl Into<String>, name: impl Into<String>, mass: f64) -> Self {
        Atom {
            id: id.into(),
            name: name.into(),
            mass,
        }
    }

    /// 以原子质量单位给出质量
    pub fn from_amu(id: impl Into<String>, name: impl Into<String>, mass_amu: f64) -> Self {
        Self::new(id, name, mass_amu * ATOMIC_MASS_UNIT)
    }

    /// 包装为共享引用
    pub fn shared(self) -> AtomRef {
        Arc::new(self)
    }
}

impl Constituent for Atom {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn mass(&self) -> f64 {
        self.mass
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atom_from_amu() {
        let atom = Atom::from_amu("O", "Oxygen", 15.999);
        assert!((atom.mass - 15.999 * ATOMIC_MASS_UNIT).abs() < 1e-35);
        assert_eq!(Constituent::id(&atom), "O");
    }

    #[test]
    fn test_shared_atom_is_reference_counted() {
        let atom = Atom::new("Ti", "Titanium", 7.95e-26).shared();
        let other = Arc::clone(&atom);
        assert_eq!(Arc::strong_count(&atom), 2);
        assert_eq!(other.name(), "Titanium");
    }
}
