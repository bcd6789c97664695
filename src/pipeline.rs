//! 流程编排：加载参考 → 计划读段数 → 校验命名与变异位点 → 投射并写出 FASTA → 合成读段

use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::coverage::{self, CoverageMatrix, ReadCountPlan, DEFAULT_TOTAL_COLUMN};
use crate::error::{Error, Result};
use crate::io::{fasta, table};
use crate::mutate::{checked_fasta_name, MutatedGenome, VariantProjector};
use crate::reference::Reference;
use crate::synth::{ReadPair, ReadSynthesizer};

pub const PLAN_FILE: &str = "read_plan.tsv";

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub variants: PathBuf,
    pub coverage: PathBuf,
    pub reference: PathBuf,
    pub basecalls: Option<PathBuf>,
    pub outdir: PathBuf,
    /// 读段对每一端的长度
    pub read_length: usize,
    pub total_column: String,
    pub threads: usize,
    pub dry_run: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            variants: PathBuf::new(),
            coverage: PathBuf::new(),
            reference: PathBuf::new(),
            basecalls: None,
            outdir: PathBuf::from("."),
            read_length: 150,
            total_column: DEFAULT_TOTAL_COLUMN.to_string(),
            threads: 1,
            dry_run: false,
        }
    }
}

/// 一个 (样本, contig) 的突变 FASTA
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaArtifact {
    pub sample: String,
    pub contig: String,
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisJob {
    pub name: String,
    pub fasta: PathBuf,
    pub read_pairs: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub fastas_written: usize,
    pub mutations: usize,
    pub jobs_run: usize,
    pub jobs_skipped: usize,
    pub total_read_pairs: u64,
    pub reads: Vec<ReadPair>,
}

/// 列出每个 (样本, contig) 的 FASTA 路径；名称不能安全用作文件名时报错。
pub fn artifacts_for(samples: &[String], reference: &Reference, outdir: &Path) -> Result<Vec<FastaArtifact>> {
    let mut artifacts = Vec::with_capacity(samples.len() * reference.contigs().len());
    for s in samples {
        for c in reference.contigs() {
            let name = checked_fasta_name(s, &c.name)?;
            artifacts.push(FastaArtifact {
                sample: s.clone(),
                contig: c.name.clone(),
                path: outdir.join(format!("{}.fasta", name)),
                name,
            });
        }
    }
    Ok(artifacts)
}

/// 按 (样本, contig) 连接读段计划与 FASTA 产物。任何一侧多出的键都是错误，
/// 不会因为找不到 FASTA 而静默地产生 0 条读段；两个键拼出同一文件名也是错误。
pub fn join(plan: &ReadCountPlan, artifacts: &[FastaArtifact]) -> Result<Vec<SynthesisJob>> {
    let mut by_key: HashMap<(&str, &str), &FastaArtifact> = HashMap::with_capacity(artifacts.len());
    let mut by_name: HashMap<&str, &FastaArtifact> = HashMap::with_capacity(artifacts.len());
    for a in artifacts {
        if let Some(prev) = by_name.insert(a.name.as_str(), a) {
            return Err(Error::NamingMismatch {
                key: a.name.clone(),
                detail: format!(
                    "sample '{}' / contig '{}' and sample '{}' / contig '{}' map to the same file",
                    prev.sample, prev.contig, a.sample, a.contig
                ),
            });
        }
        by_key.insert((a.sample.as_str(), a.contig.as_str()), a);
    }

    let mut jobs = Vec::with_capacity(plan.len());
    let mut seen = HashSet::with_capacity(plan.len());
    for e in plan.entries() {
        let key = (e.sample.as_str(), e.contig.as_str());
        let art = by_key.get(&key).ok_or_else(|| Error::NamingMismatch {
            key: e.name.clone(),
            detail: format!("read plan entry for sample '{}' has no mutated FASTA", e.sample),
        })?;
        seen.insert(key);
        jobs.push(SynthesisJob { name: art.name.clone(), fasta: art.path.clone(), read_pairs: e.read_pairs });
    }

    if let Some(orphan) = artifacts.iter().find(|a| !seen.contains(&(a.sample.as_str(), a.contig.as_str()))) {
        return Err(Error::NamingMismatch {
            key: orphan.name.clone(),
            detail: format!("mutated FASTA for sample '{}' has no read plan entry", orphan.sample),
        });
    }
    Ok(jobs)
}

/// 写出一个样本的所有 contig，每个 contig 一个文件。
pub fn write_genome(genome: &MutatedGenome, outdir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::with_capacity(genome.contigs.len());
    for c in &genome.contigs {
        let path = outdir.join(format!("{}.fasta", genome.fasta_name(&c.contig)));
        let mut out = BufWriter::new(File::create(&path)?);
        let desc = format!("mutated contig_{} sample_{} n_mutations={}", c.contig, genome.sample, c.n_mutations);
        fasta::write_record(&mut out, &c.contig, Some(&desc), &c.seq)?;
        out.flush()?;
        paths.push(path);
    }
    Ok(paths)
}

fn write_plan(plan: &ReadCountPlan, cfg: &RunConfig) -> Result<PathBuf> {
    let path = cfg.outdir.join(PLAN_FILE);
    let comments = vec![
        format!("generated: {}", chrono::Utc::now().to_rfc3339()),
        format!("reference: {}", cfg.reference.display()),
        format!("variants: {}", cfg.variants.display()),
        format!("coverage: {}", cfg.coverage.display()),
        format!("read_length: {}", cfg.read_length),
    ];
    let out = BufWriter::new(File::create(&path)?);
    plan.write_tsv(out, &comments)?;
    Ok(path)
}

/// 运行读段合成；单个任务失败不影响其他任务，全部结束后统一报告。
pub fn synthesize_all(
    jobs: &[SynthesisJob],
    read_length: usize,
    threads: usize,
    synth: &dyn ReadSynthesizer,
) -> Result<Vec<ReadPair>> {
    let run_one = |job: &SynthesisJob| {
        log::info!("{}: simulating {} read pairs", job.name, job.read_pairs);
        synth.synthesize(&job.fasta, read_length, job.read_pairs)
    };

    let results: Vec<Result<ReadPair>> = if threads > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        pool.install(|| jobs.par_iter().map(run_one).collect())
    } else {
        jobs.iter().map(run_one).collect()
    };

    let mut reads = Vec::with_capacity(results.len());
    let mut first_err = None;
    let mut n_failed = 0usize;
    for (job, res) in jobs.iter().zip(results) {
        match res {
            Ok(p) => reads.push(p),
            Err(e) => {
                log::error!("{}: {}", job.name, e);
                n_failed += 1;
                first_err.get_or_insert(e);
            }
        }
    }
    if let Some(e) = first_err {
        if n_failed > 1 {
            log::error!("{} of {} read simulations failed", n_failed, jobs.len());
        }
        return Err(e);
    }
    Ok(reads)
}

pub fn run(cfg: &RunConfig, synth: &dyn ReadSynthesizer) -> Result<RunSummary> {
    if cfg.read_length == 0 {
        return Err(Error::InvalidReadLength);
    }
    let reference = Reference::load(&cfg.reference)?;

    let variants = table::read_matrix_file(&cfg.variants, table::parse_bool)?;
    let basecalls = match &cfg.basecalls {
        Some(p) => Some(table::read_matrix_file(p, table::parse_string)?),
        None => None,
    };
    let projector = VariantProjector::new(&variants, &reference, basecalls.as_ref())?;
    log::info!(
        "variant matrix: {} samples, {} sites",
        projector.samples().len(),
        projector.sites().len()
    );

    let cov = CoverageMatrix::from_path(&cfg.coverage, &cfg.total_column)?;
    let plan = coverage::plan(&cov, &reference.contig_lengths(), cfg.read_length)?;

    let artifacts = artifacts_for(projector.samples(), &reference, &cfg.outdir)?;
    let jobs = join(&plan, &artifacts)?;
    projector.validate()?;

    fs::create_dir_all(&cfg.outdir)?;
    let plan_path = write_plan(&plan, cfg)?;
    log::info!("read plan: {} ({} read pairs)", plan_path.display(), plan.total_read_pairs());

    let mut summary = RunSummary { total_read_pairs: plan.total_read_pairs(), ..RunSummary::default() };
    for sample in projector.samples() {
        let genome = projector.project_sample(sample)?;
        summary.mutations += genome.n_mutations();
        summary.fastas_written += write_genome(&genome, &cfg.outdir)?.len();
        log::info!("sample {}: {} positions mutated", sample, genome.n_mutations());
    }

    if cfg.dry_run {
        log::info!("dry run, skipping read simulation");
        return Ok(summary);
    }

    let (todo, skipped): (Vec<SynthesisJob>, Vec<SynthesisJob>) = jobs.into_iter().partition(|j| j.read_pairs > 0);
    for j in &skipped {
        log::info!("{}: zero read pairs, skipped", j.name);
    }
    summary.jobs_skipped = skipped.len();
    summary.reads = synthesize_all(&todo, cfg.read_length, cfg.threads, synth)?;
    summary.jobs_run = summary.reads.len();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::fasta::FastaRecord;
    use crate::io::table::LabeledMatrix;

    fn reference() -> Reference {
        let recs = vec![
            FastaRecord { id: "chr1".into(), desc: None, seq: b"ATCG".to_vec() },
            FastaRecord { id: "chr2".into(), desc: None, seq: b"GGGG".to_vec() },
        ];
        Reference::from_records(recs, Path::new("ref.fa")).unwrap()
    }

    fn plan_for(samples: &[&str]) -> ReadCountPlan {
        let table = LabeledMatrix::new(
            samples.iter().map(|s| s.to_string()).collect(),
            vec!["chr1".into(), "chr2".into(), "Covg total".into()],
            samples.iter().map(|_| vec![1.0, 1.0, 300.0]).collect(),
        )
        .unwrap();
        let cov = CoverageMatrix::new(table, DEFAULT_TOTAL_COLUMN).unwrap();
        coverage::plan(&cov, &reference().contig_lengths(), 2).unwrap()
    }

    fn samples(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn join_matches_by_name() {
        let arts = artifacts_for(&samples(&["s2", "s1"]), &reference(), Path::new("out")).unwrap();
        let jobs = join(&plan_for(&["s1", "s2"]), &arts).unwrap();
        assert_eq!(jobs.len(), 4);
        assert_eq!(jobs[0].name, "sample_s1_contig_chr1");
        assert_eq!(jobs[0].fasta, Path::new("out/sample_s1_contig_chr1.fasta"));
        // 300x over 4 bp with 2 bp reads
        assert!(jobs.iter().all(|j| j.read_pairs == 300));
    }

    #[test]
    fn plan_key_without_fasta_is_a_mismatch() {
        let arts = artifacts_for(&samples(&["s1"]), &reference(), Path::new("out")).unwrap();
        let err = join(&plan_for(&["s1", "s2"]), &arts).unwrap_err();
        assert!(matches!(err, Error::NamingMismatch { ref key, .. } if key == "sample_s2_contig_chr1"));
    }

    #[test]
    fn fasta_without_plan_entry_is_a_mismatch() {
        let arts = artifacts_for(&samples(&["s1", "s3"]), &reference(), Path::new("out")).unwrap();
        let err = join(&plan_for(&["s1"]), &arts).unwrap_err();
        assert!(matches!(err, Error::NamingMismatch { ref key, .. } if key.starts_with("sample_s3")));
    }

    #[test]
    fn colliding_file_names_are_a_mismatch() {
        let recs = vec![
            FastaRecord { id: "chr1".into(), desc: None, seq: b"ACGT".to_vec() },
            FastaRecord { id: "x_contig_chr1".into(), desc: None, seq: b"ACGT".to_vec() },
        ];
        let r = Reference::from_records(recs, Path::new("ref.fa")).unwrap();
        // sample_s_contig_x + _contig_chr1 == sample_s + _contig_x_contig_chr1
        let arts = artifacts_for(&samples(&["s_contig_x", "s"]), &r, Path::new("out")).unwrap();
        let table = LabeledMatrix::new(
            samples(&["s_contig_x", "s"]),
            vec!["chr1".into(), "x_contig_chr1".into(), "Covg total".into()],
            vec![vec![1.0, 1.0, 10.0], vec![1.0, 1.0, 10.0]],
        )
        .unwrap();
        let cov = CoverageMatrix::new(table, DEFAULT_TOTAL_COLUMN).unwrap();
        let plan = coverage::plan(&cov, &r.contig_lengths(), 2).unwrap();

        let err = join(&plan, &arts).unwrap_err();
        assert!(matches!(err, Error::NamingMismatch { ref key, .. } if key == "sample_s_contig_x_contig_chr1"));
    }

    #[test]
    fn sample_with_path_separator_is_rejected() {
        let err = artifacts_for(&samples(&["s1", "../x"]), &reference(), Path::new("out")).unwrap_err();
        assert!(matches!(err, Error::UnsafeName { ref name, .. } if name == "../x"));
    }
}
