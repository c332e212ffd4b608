//! # 数据模型模块
//!
//! 定义晶胞和原子的数据模型。
//!
//! ## 依赖关系
//! - 被 `projection.rs`、`definition.rs` 和 `commands/` 使用
//! - 子模块: atom, unit_cell

pub mod atom;
pub mod unit_cell;

pub use atom::{Atom, AtomRef, Constituent, ATOMIC_MASS_UNIT};
pub use unit_cell::{AtomSite, UnitCell, UnitCellOptions, ANGSTROM, REFERENCE_AREA};
