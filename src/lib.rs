//! # varsim-fastq
//!
//! 为变异检测流程生成测试数据：把"样本 × 变异位点"布尔矩阵投射到参考基因组上，
//! 为每个样本 × contig 写出突变后的 FASTA，并按目标覆盖度模拟双端 FASTQ 读段。
//!
//! - **参考加载**：读取多条记录 FASTA，保持顺序与大小写
//! - **变异投射**：列名 `<contig>_<position>`（0 起始），按 A→T→C→G→A 循环替换，
//!   或使用 basecall 矩阵中的显式碱基
//! - **覆盖度计划**：`round(fraction * total * contig_length / (2 * read_length))`
//! - **读段合成**：通过 [`synth::ReadSynthesizer`] 调用外部模拟器（默认 `wgsim`）
//!
//! ## 快速示例
//!
//! ```rust,no_run
//! use std::path::Path;
//! use varsim_fastq::{coverage, mutate, reference::Reference, io::table};
//!
//! let reference = Reference::load(Path::new("ref.fa"))?;
//! let variants = table::read_matrix_file(Path::new("variants.csv"), table::parse_bool)?;
//! let genomes = mutate::project(&variants, &reference, None)?;
//!
//! let cov = coverage::CoverageMatrix::from_path(Path::new("coverage.csv"), coverage::DEFAULT_TOTAL_COLUMN)?;
//! let plan = coverage::plan(&cov, &reference.contig_lengths(), 150)?;
//! println!("{} genomes, {} read pairs", genomes.len(), plan.total_read_pairs());
//! # Ok::<(), varsim_fastq::error::Error>(())
//! ```
//!
//! ## 模块说明
//!
//! - [`io`] — FASTA 读写、带标签的 CSV 矩阵
//! - [`reference`] — 参考基因组
//! - [`mutate`] — 变异投射
//! - [`coverage`] — 覆盖度到读段对数量的换算
//! - [`synth`] — 读段合成器接口与 wgsim 实现
//! - [`pipeline`] — 完整流程
//! - [`util`] — DNA 替换循环

pub mod coverage;
pub mod error;
pub mod io;
pub mod mutate;
pub mod pipeline;
pub mod reference;
pub mod synth;
pub mod util;
