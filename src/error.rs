//! 错误类型
//!
//! 所有库函数返回 [`Result`]；二进制入口再用 `anyhow` 包装上下文。
//! 输入都是静态文件，出错即失败，不做重试。

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// 参考 FASTA 为空，或含有无法使用的记录
    #[error("malformed reference '{}': {reason}", path.display())]
    MalformedReference { path: PathBuf, reason: String },

    /// 变异列名无法解析为 `<contig>_<position>`
    #[error("invalid variant column '{column}': expected '<contig>_<position>'")]
    InvalidColumnEncoding { column: String },

    /// 解析出的位置超出 contig 长度
    #[error("variant column '{column}': position {position} is out of range for contig '{contig}' (length {length})")]
    PositionOutOfRange {
        column: String,
        contig: String,
        position: usize,
        length: usize,
    },

    #[error("variant column '{column}': contig '{contig}' is not in the reference")]
    UnknownContig { column: String, contig: String },

    /// 参考碱基不在替换循环内，没有后继
    #[error("cannot substitute base '{}' at {contig}:{position}", char::from(*base))]
    UnsubstitutableBase {
        contig: String,
        position: usize,
        base: u8,
    },

    #[error("basecall for sample '{sample}', column '{column}' must be a single symbol, got '{value}'")]
    InvalidBasecall {
        sample: String,
        column: String,
        value: String,
    },

    #[error("negative coverage {value} for sample '{sample}', column '{column}'")]
    NegativeCoverage {
        sample: String,
        column: String,
        value: f64,
    },

    #[error("coverage matrix has no column '{column}'")]
    MissingCoverageColumn { column: String },

    #[error("read length must be positive")]
    InvalidReadLength,

    /// 读段计划与突变 FASTA 的命名键不一致
    #[error("naming mismatch for '{key}': {detail}")]
    NamingMismatch { key: String, detail: String },

    /// 样本或 contig 名不能安全地用作输出文件名
    #[error("{kind} name '{name}' cannot be used in an output file name")]
    UnsafeName { kind: String, name: String },

    #[error("malformed table '{}': {reason}", path.display())]
    Table { path: PathBuf, reason: String },

    #[error("read simulation failed for '{key}': {reason}")]
    Simulator { key: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}
