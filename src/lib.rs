//! # ucell - 晶胞性质解析与推导
//!
//! 将多种形式给出的材料性质（数值、`lambda` 文本、列表）统一解析为
//! 可求值的温度/应变函数，派生质量、密度、弹簧常数等量，并按模拟
//! 领域（heat / phonon / xrd / optical）导出性质子集。
//!
//! ## 依赖关系
//! ```text
//! lib.rs
//!   ├── formula/     (表达式解析、求值与符号积分)
//!   ├── models/      (原子与晶胞)
//!   ├── projection.rs(按领域导出性质)
//!   ├── definition.rs(JSON 晶胞定义)
//!   └── error.rs     (错误处理)
//! ```

pub mod definition;
pub mod error;
pub mod formula;
pub mod models;
pub mod projection;

pub use definition::{load_unit_cell, CellDefinition};
pub use error::{CellError, Result};
pub use formula::{FormulaResolver, PropertyFunction, PropertySpec, SymbolicDerivator};
pub use models::{Atom, AtomRef, Constituent, UnitCell, UnitCellOptions};
pub use projection::{project, Domain, PropertyMap, PropertyValue};
