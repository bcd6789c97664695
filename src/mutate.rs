//! 变异投射：把布尔变异矩阵映射到参考坐标，生成每个样本的突变序列。
//!
//! - 列名编码为 `<contig>_<position>`，position 从 0 开始；
//! - 每个样本都从参考序列的独立副本开始，样本之间不共享可变状态；
//! - 未提供 basecall 矩阵时按固定循环 A→T→C→G→A 取替换碱基，
//!   提供时按 (样本 ID, 列名) 标签取显式碱基。

use crate::error::{Error, Result};
use crate::io::table::LabeledMatrix;
use crate::reference::Reference;
use crate::util::dna;

pub type VariantMatrix = LabeledMatrix<bool>;
pub type BasecallMatrix = LabeledMatrix<String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantSite {
    pub column: String,
    pub contig: String,
    pub position: usize,
}

/// 解析列名 `<contig>_<position>`。
pub fn decode_site(column: &str) -> Result<VariantSite> {
    let invalid = || Error::InvalidColumnEncoding { column: column.to_string() };

    let mut parts = column.split('_');
    let (contig, pos) = match (parts.next(), parts.next(), parts.next()) {
        (Some(c), Some(p), None) => (c, p),
        _ => return Err(invalid()),
    };
    if contig.is_empty() || pos.is_empty() || !pos.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    // 纯数字但超出 usize 的位置饱和为 usize::MAX，投射时按越界处理
    let position = pos.parse::<usize>().unwrap_or(usize::MAX);

    Ok(VariantSite { column: column.to_string(), contig: contig.to_string(), position })
}

/// `(sample, contig)` 的统一命名；FASTA 与读段文件都由它派生。
pub fn fasta_name(sample: &str, contig: &str) -> String {
    format!("sample_{}_contig_{}", sample, contig)
}

/// 名称会成为输出文件名的一部分，不能含路径分隔符或 NUL。
pub fn check_name_component(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() || name.contains(['/', '\\', '\0']) {
        return Err(Error::UnsafeName { kind: kind.to_string(), name: name.to_string() });
    }
    Ok(())
}

/// 与 [`fasta_name`] 相同，但先校验样本和 contig 名可以安全地用作文件名。
pub fn checked_fasta_name(sample: &str, contig: &str) -> Result<String> {
    check_name_component("sample", sample)?;
    check_name_component("contig", contig)?;
    Ok(fasta_name(sample, contig))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutatedContig {
    pub contig: String,
    pub seq: Vec<u8>,
    /// 该 contig 上被改写的位置数
    pub n_mutations: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutatedGenome {
    pub sample: String,
    /// 与参考相同的 contig 顺序
    pub contigs: Vec<MutatedContig>,
}

impl MutatedGenome {
    pub fn contig(&self, name: &str) -> Option<&MutatedContig> {
        self.contigs.iter().find(|c| c.contig == name)
    }

    pub fn fasta_name(&self, contig: &str) -> String {
        fasta_name(&self.sample, contig)
    }

    pub fn n_mutations(&self) -> usize {
        self.contigs.iter().map(|c| c.n_mutations).sum()
    }
}

pub struct VariantProjector<'a> {
    reference: &'a Reference,
    variants: &'a VariantMatrix,
    basecalls: Option<&'a BasecallMatrix>,
    sites: Vec<VariantSite>,
}

impl<'a> VariantProjector<'a> {
    /// 先解析全部列名，任何一个列名非法都会在处理样本之前失败。
    pub fn new(
        variants: &'a VariantMatrix,
        reference: &'a Reference,
        basecalls: Option<&'a BasecallMatrix>,
    ) -> Result<Self> {
        let sites = variants
            .cols()
            .iter()
            .map(|c| decode_site(c))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { reference, variants, basecalls, sites })
    }

    pub fn samples(&self) -> &[String] {
        self.variants.rows()
    }

    pub fn sites(&self) -> &[VariantSite] {
        &self.sites
    }

    /// 返回位点所在 contig 的下标；contig 不存在或位置越界时报错。
    fn locate(&self, site: &VariantSite) -> Result<usize> {
        let ci = self.reference.contig_index(&site.contig).ok_or_else(|| Error::UnknownContig {
            column: site.column.clone(),
            contig: site.contig.clone(),
        })?;
        let length = self.reference.contigs()[ci].len();
        if site.position >= length {
            return Err(Error::PositionOutOfRange {
                column: site.column.clone(),
                contig: site.contig.clone(),
                position: site.position,
                length,
            });
        }
        Ok(ci)
    }

    /// `current` 为该位置当前的碱基
    fn alt_base(&self, sample: &str, site: &VariantSite, current: u8) -> Result<u8> {
        match self.basecalls {
            None => dna::cyclic_substitute(current).ok_or_else(|| Error::UnsubstitutableBase {
                contig: site.contig.clone(),
                position: site.position,
                base: current,
            }),
            Some(calls) => basecall(calls, sample, &site.column),
        }
    }

    /// 不复制序列，检查所有样本的每个为真的位点都能投射。
    /// 写出任何文件之前调用，投射错误不会留下部分输出。
    pub fn validate(&self) -> Result<()> {
        for (sample, row) in self.variants.iter_rows() {
            for (site, _) in self.sites.iter().zip(row).filter(|&(_, &present)| present) {
                let ci = self.locate(site)?;
                let base = self.reference.contigs()[ci].seq[site.position];
                self.alt_base(sample, site, base)?;
            }
        }
        Ok(())
    }

    pub fn project_sample(&self, sample: &str) -> Result<MutatedGenome> {
        let row = self.variants.row(sample).ok_or_else(|| Error::NamingMismatch {
            key: sample.to_string(),
            detail: "sample is not in the variant matrix".into(),
        })?;

        let mut seqs = self.reference.sequences();
        let mut counts = vec![0usize; seqs.len()];

        for (site, _) in self.sites.iter().zip(row).filter(|&(_, &present)| present) {
            let ci = self.locate(site)?;
            let alt = self.alt_base(sample, site, seqs[ci][site.position])?;
            seqs[ci][site.position] = alt;
            counts[ci] += 1;
        }

        let contigs = self
            .reference
            .contigs()
            .iter()
            .zip(seqs)
            .zip(counts)
            .map(|((c, seq), n_mutations)| MutatedContig { contig: c.name.clone(), seq, n_mutations })
            .collect();

        Ok(MutatedGenome { sample: sample.to_string(), contigs })
    }

    /// 按矩阵行顺序逐个样本投射。
    pub fn project_all(&self) -> Result<Vec<MutatedGenome>> {
        self.samples().iter().map(|s| self.project_sample(s)).collect()
    }
}

fn basecall(calls: &BasecallMatrix, sample: &str, column: &str) -> Result<u8> {
    let value = calls.get(sample, column).ok_or_else(|| Error::NamingMismatch {
        key: format!("{}/{}", sample, column),
        detail: "no entry in the basecall matrix".into(),
    })?;
    match value.as_bytes() {
        [b] if b.is_ascii_graphic() => Ok(*b),
        _ => Err(Error::InvalidBasecall {
            sample: sample.to_string(),
            column: column.to_string(),
            value: value.clone(),
        }),
    }
}

/// 一次性投射所有样本。
pub fn project(
    variants: &VariantMatrix,
    reference: &Reference,
    basecalls: Option<&BasecallMatrix>,
) -> Result<Vec<MutatedGenome>> {
    VariantProjector::new(variants, reference, basecalls)?.project_all()
}
