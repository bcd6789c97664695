use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use varsim_fastq::coverage::DEFAULT_TOTAL_COLUMN;
use varsim_fastq::pipeline::{self, RunConfig};
use varsim_fastq::synth::{Wgsim, WgsimOpt};

#[derive(Parser, Debug)]
#[command(
    name = "varsim-fastq",
    author,
    version,
    about = "Project variant matrices onto a reference and simulate paired-end reads at target coverage",
    arg_required_else_help = true
)]
struct Cli {
    /// Boolean variant matrix CSV (rows: samples, columns: <contig>_<position>)
    #[arg(short = 'i', long = "input-variants-csv")]
    variants: PathBuf,
    /// Coverage matrix CSV (rows: samples, columns: contigs + total coverage)
    #[arg(short = 'c', long = "input-coverage-csv")]
    coverage: PathBuf,
    /// Reference FASTA to project mutations onto
    #[arg(short = 'r', long)]
    reference: PathBuf,
    /// Read length of each end
    #[arg(short = 'l', long, default_value_t = 150)]
    length: usize,
    /// Explicit alternate alleles, same labels as the variant matrix
    #[arg(short = 'b', long = "basecalls-csv")]
    basecalls: Option<PathBuf>,
    /// Output directory for FASTA, FASTQ and the read plan
    #[arg(short, long, default_value = ".")]
    outdir: PathBuf,
    /// Header of the total coverage column
    #[arg(long = "total-column", default_value = DEFAULT_TOTAL_COLUMN)]
    total_column: String,
    #[arg(short = 't', long = "threads", default_value_t = 1)]
    threads: usize,
    /// wgsim executable
    #[arg(long = "wgsim", default_value = "wgsim")]
    wgsim: PathBuf,
    /// Outer distance between the two ends
    #[arg(long = "outer-distance", default_value_t = 500)]
    outer_distance: u32,
    #[arg(long = "std-dev", default_value_t = 50)]
    std_dev: u32,
    /// Base error rate passed to wgsim
    #[arg(long = "error-rate", default_value_t = 0.02)]
    error_rate: f64,
    #[arg(long)]
    seed: Option<u64>,
    /// Write mutated FASTAs and the read plan, but do not simulate reads
    #[arg(long = "dry-run")]
    dry_run: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if cli.length == 0 {
        anyhow::bail!("--length must be positive");
    }
    if !(0.0..=1.0).contains(&cli.error_rate) {
        anyhow::bail!("--error-rate must be within [0, 1], got {}", cli.error_rate);
    }

    let cfg = RunConfig {
        variants: cli.variants,
        coverage: cli.coverage,
        reference: cli.reference,
        basecalls: cli.basecalls,
        outdir: cli.outdir,
        read_length: cli.length,
        total_column: cli.total_column,
        threads: cli.threads.max(1),
        dry_run: cli.dry_run,
    };
    let synth = Wgsim::new(WgsimOpt {
        program: cli.wgsim,
        outer_distance: cli.outer_distance,
        std_dev: cli.std_dev,
        base_error_rate: cli.error_rate,
        seed: cli.seed,
    });

    let summary = pipeline::run(&cfg, &synth)
        .with_context(|| format!("simulation into '{}' failed", cfg.outdir.display()))?;

    println!("fastas:      {}", summary.fastas_written);
    println!("mutations:   {}", summary.mutations);
    println!("read pairs:  {}", summary.total_read_pairs);
    println!("simulated:   {}", summary.jobs_run);
    println!("skipped:     {}", summary.jobs_skipped);
    Ok(())
}
