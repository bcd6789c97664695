//! 覆盖度 → 读段对数量
//!
//! 对每个 (样本, contig)：
//!
//! ```text
//! read_pairs = round(fraction * total * contig_length / (2 * read_length))
//! ```
//!
//! 目标覆盖度需要 `coverage * contig_length` 个碱基，每个读段对贡献
//! `2 * read_length` 个碱基。

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::io::table::{self, LabeledMatrix};
use crate::mutate::fasta_name;

pub const DEFAULT_TOTAL_COLUMN: &str = "Covg total";

/// 覆盖度矩阵：contig 列给出各 contig 的权重，另有一列为样本总覆盖度。
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageMatrix {
    table: LabeledMatrix<f64>,
    total_column: String,
}

impl CoverageMatrix {
    pub fn new(table: LabeledMatrix<f64>, total_column: &str) -> Result<Self> {
        if table.col_position(total_column).is_none() {
            return Err(Error::MissingCoverageColumn { column: total_column.to_string() });
        }
        Ok(Self { table, total_column: total_column.to_string() })
    }

    pub fn from_path(path: &Path, total_column: &str) -> Result<Self> {
        let table = table::read_matrix_file(path, table::parse_f64)?;
        Self::new(table, total_column)
    }

    pub fn samples(&self) -> &[String] {
        self.table.rows()
    }

    pub fn total(&self, sample: &str) -> Option<f64> {
        self.table.get(sample, &self.total_column).copied()
    }

    pub fn fraction(&self, sample: &str, contig: &str) -> Option<f64> {
        if contig == self.total_column {
            return None;
        }
        self.table.get(sample, contig).copied()
    }

    /// contig 列，即除总覆盖度列以外的所有列
    pub fn contig_columns(&self) -> impl Iterator<Item = &str> {
        self.table.cols().iter().map(String::as_str).filter(move |c| *c != self.total_column)
    }

    fn check_non_negative(&self) -> Result<()> {
        for (sample, row) in self.table.iter_rows() {
            for (col, &v) in self.table.cols().iter().zip(row) {
                if v < 0.0 {
                    return Err(Error::NegativeCoverage {
                        sample: sample.to_string(),
                        column: col.clone(),
                        value: v,
                    });
                }
            }
        }
        Ok(())
    }
}

/// 单个 (样本, contig) 所需的读段对数。输入须为非负有限值。
pub fn read_pairs_for(fraction: f64, total: f64, contig_length: usize, read_length: usize) -> u64 {
    let bases = fraction * total * contig_length as f64;
    let pairs = bases / (2.0 * read_length as f64);
    pairs.round().max(0.0) as u64
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanEntry {
    pub sample: String,
    pub contig: String,
    pub name: String,
    pub contig_length: usize,
    /// 权重 × 总覆盖度
    pub coverage: f64,
    pub read_pairs: u64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReadCountPlan {
    entries: Vec<PlanEntry>,
}

impl ReadCountPlan {
    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, sample: &str, contig: &str) -> Option<&PlanEntry> {
        self.entries.iter().find(|e| e.sample == sample && e.contig == contig)
    }

    pub fn total_read_pairs(&self) -> u64 {
        self.entries.iter().map(|e| e.read_pairs).sum()
    }

    /// 写出制表符分隔的计划清单；`comments` 逐行以 `#` 开头写在表头之前。
    pub fn write_tsv<W: Write>(&self, mut out: W, comments: &[String]) -> Result<()> {
        for c in comments {
            writeln!(out, "# {}", c)?;
        }
        let mut wtr = csv::WriterBuilder::new().delimiter(b'\t').from_writer(out);
        for e in &self.entries {
            wtr.serialize(e)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// 为覆盖度矩阵中每个样本、参考中每个 contig 计算读段对数。
///
/// `contig_lengths` 按参考顺序给出；计划条目按 (样本行顺序, contig 顺序) 排列。
pub fn plan(cov: &CoverageMatrix, contig_lengths: &[(String, usize)], read_length: usize) -> Result<ReadCountPlan> {
    if read_length == 0 {
        return Err(Error::InvalidReadLength);
    }
    cov.check_non_negative()?;

    for col in cov.contig_columns() {
        if !contig_lengths.iter().any(|(name, _)| name == col) {
            log::warn!("coverage column '{}' is not a reference contig, ignored", col);
        }
    }

    let mut entries = Vec::with_capacity(cov.samples().len() * contig_lengths.len());
    for sample in cov.samples() {
        let total = cov
            .total(sample)
            .ok_or_else(|| Error::MissingCoverageColumn { column: cov.total_column.clone() })?;
        for (contig, len) in contig_lengths {
            let fraction = cov
                .fraction(sample, contig)
                .ok_or_else(|| Error::MissingCoverageColumn { column: contig.clone() })?;
            let read_pairs = read_pairs_for(fraction, total, *len, read_length);
            log::debug!(
                "{}/{}: coverage {:.3} x {} bp -> {} read pairs",
                sample,
                contig,
                fraction * total,
                len,
                read_pairs
            );
            entries.push(PlanEntry {
                sample: sample.clone(),
                contig: contig.clone(),
                name: fasta_name(sample, contig),
                contig_length: *len,
                coverage: fraction * total,
                read_pairs,
            });
        }
    }

    Ok(ReadCountPlan { entries })
}
