//! # 统一错误处理模块
//!
//! 定义 ucell 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// ucell 统一错误类型
#[derive(Error, Debug)]
pub enum CellError {
    // ─────────────────────────────────────────────────────────────
    // 性质解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("String input for unit cell property '{expression}' cannot be converted to a function\nReason: {reason}")]
    InvalidExpression { expression: String, reason: String },

    #[error("Unit cell property input has to be a number, an expression string or a list of those (got {0})")]
    InvalidInput(String),

    #[error("Please use the string representation of the function instead of passing it directly")]
    UnsupportedInput,

    // ─────────────────────────────────────────────────────────────
    // 晶胞结构错误
    // ─────────────────────────────────────────────────────────────
    #[error("Heat capacity, thermal conductivity, linear thermal expansion and subsystem coupling have not the same number of elements ({heat_capacity}, {thermal_conductivity}, {linear_thermal_expansion}, {subsystem_coupling})")]
    SubsystemCountMismatch {
        heat_capacity: usize,
        thermal_conductivity: usize,
        linear_thermal_expansion: usize,
        subsystem_coupling: usize,
    },

    // ─────────────────────────────────────────────────────────────
    // 符号积分错误
    // ─────────────────────────────────────────────────────────────
    #[error("Symbolic integration of '{expression}' failed: {reason}. Set the anti-derivative manually instead")]
    SymbolicIntegration { expression: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // 投影错误
    // ─────────────────────────────────────────────────────────────
    #[error("Unknown property domain '{0}' (expected one of: all, heat, phonon, xrd, optical)")]
    UnknownDomain(String),

    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 定义文件错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse unit cell definition: {path}\nReason: {reason}")]
    DefinitionError { path: String, reason: String },

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid range format: {0}")]
    InvalidRange(String),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, CellError>;
