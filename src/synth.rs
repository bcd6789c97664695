//! 读段合成
//!
//! [`ReadSynthesizer`] 把一个突变 FASTA 和读段对数量变成一对 FASTQ 文件。
//! 默认实现 [`Wgsim`] 调用外部 `wgsim` 进程；测试中可替换为不启动进程的实现。

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadPair {
    pub r1: PathBuf,
    pub r2: PathBuf,
}

impl ReadPair {
    /// `<dir>/<stem>_R1.fq` 与 `<dir>/<stem>_R2.fq`，stem 取 FASTA 文件名去掉扩展名。
    pub fn beside(fasta: &Path) -> Self {
        let stem = fasta.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        let dir = fasta.parent().unwrap_or_else(|| Path::new(""));
        Self {
            r1: dir.join(format!("{}_R1.fq", stem)),
            r2: dir.join(format!("{}_R2.fq", stem)),
        }
    }
}

pub trait ReadSynthesizer: Sync {
    /// `read_pairs` 为 0 时调用方应跳过，不保证实现能处理。
    fn synthesize(&self, fasta: &Path, read_length: usize, read_pairs: u64) -> Result<ReadPair>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct WgsimOpt {
    pub program: PathBuf,
    pub outer_distance: u32,
    pub std_dev: u32,
    pub base_error_rate: f64,
    pub seed: Option<u64>,
}

impl Default for WgsimOpt {
    fn default() -> Self {
        Self {
            program: PathBuf::from("wgsim"),
            outer_distance: 500,
            std_dev: 50,
            base_error_rate: 0.02,
            seed: None,
        }
    }
}

/// 以子进程方式运行 wgsim。突变率和 indel 比例固定为 0，
/// 读段中的变异只来自投射后的 FASTA。
#[derive(Debug, Clone, Default)]
pub struct Wgsim {
    opt: WgsimOpt,
}

impl Wgsim {
    pub fn new(opt: WgsimOpt) -> Self {
        Self { opt }
    }

    pub fn command(&self, fasta: &Path, read_length: usize, read_pairs: u64, out: &ReadPair) -> Command {
        let mut cmd = Command::new(&self.opt.program);
        cmd.arg("-N")
            .arg(read_pairs.to_string())
            .arg("-1")
            .arg(read_length.to_string())
            .arg("-2")
            .arg(read_length.to_string())
            .arg("-d")
            .arg(self.opt.outer_distance.to_string())
            .arg("-s")
            .arg(self.opt.std_dev.to_string())
            .arg("-e")
            .arg(self.opt.base_error_rate.to_string())
            .args(["-r", "0", "-R", "0"]);
        if let Some(seed) = self.opt.seed {
            cmd.arg("-S").arg(seed.to_string());
        }
        cmd.arg(fasta).arg(&out.r1).arg(&out.r2);
        cmd
    }
}

impl ReadSynthesizer for Wgsim {
    fn synthesize(&self, fasta: &Path, read_length: usize, read_pairs: u64) -> Result<ReadPair> {
        let out = ReadPair::beside(fasta);
        let key = fasta.display().to_string();
        let mut cmd = self.command(fasta, read_length, read_pairs, &out);
        log::debug!("running {:?}", cmd);

        let output = cmd.output().map_err(|e| Error::Simulator {
            key: key.clone(),
            reason: format!("cannot execute '{}': {}", self.opt.program.display(), e),
        })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(Error::Simulator {
                key,
                reason: format!("'{}' exited with {}: {}", self.opt.program.display(), output.status, stderr),
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(cmd: &Command) -> Vec<String> {
        cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn read_paths_sit_next_to_fasta() {
        let p = ReadPair::beside(Path::new("out/sample_s1_contig_chr1.fasta"));
        assert_eq!(p.r1, Path::new("out/sample_s1_contig_chr1_R1.fq"));
        assert_eq!(p.r2, Path::new("out/sample_s1_contig_chr1_R2.fq"));
    }

    #[test]
    fn wgsim_command_line() {
        let w = Wgsim::new(WgsimOpt { seed: Some(7), ..WgsimOpt::default() });
        let fasta = Path::new("out/x.fasta");
        let cmd = w.command(fasta, 150, 100, &ReadPair::beside(fasta));
        assert_eq!(cmd.get_program(), "wgsim");
        assert_eq!(
            args(&cmd),
            [
                "-N", "100", "-1", "150", "-2", "150", "-d", "500", "-s", "50", "-e", "0.02", "-r", "0", "-R",
                "0", "-S", "7", "out/x.fasta", "out/x_R1.fq", "out/x_R2.fq",
            ]
        );
    }

    #[test]
    fn missing_program_is_a_simulator_error() {
        let w = Wgsim::new(WgsimOpt {
            program: PathBuf::from("/nonexistent/wgsim-binary"),
            ..WgsimOpt::default()
        });
        let err = w.synthesize(Path::new("x.fasta"), 150, 10).unwrap_err();
        assert!(matches!(err, Error::Simulator { .. }));
    }
}
