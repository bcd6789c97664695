//! 参考基因组加载
//!
//! 读取多条记录的 FASTA，保持记录顺序与原始大小写；加载后只读。

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Error, Result};
use crate::io::fasta::{FastaReader, FastaRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contig {
    pub name: String,
    pub seq: Vec<u8>,
}

impl Contig {
    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    contigs: Vec<Contig>,
    index: HashMap<String, usize>,
}

impl Reference {
    pub fn load(path: &Path) -> Result<Self> {
        let fh = File::open(path).map_err(|e| Error::MalformedReference {
            path: path.to_path_buf(),
            reason: format!("cannot open: {}", e),
        })?;
        Self::from_reader(BufReader::new(fh), path)
    }

    /// `origin` 仅用于错误信息。
    pub fn from_reader<R: BufRead>(reader: R, origin: &Path) -> Result<Self> {
        let records = FastaReader::new(reader).collect::<Result<Vec<_>>>()?;
        Self::from_records(records, origin)
    }

    pub fn from_records(records: Vec<FastaRecord>, origin: &Path) -> Result<Self> {
        let malformed = |reason: String| Error::MalformedReference { path: origin.to_path_buf(), reason };

        if records.is_empty() {
            return Err(malformed("no sequences found".into()));
        }

        let mut contigs = Vec::with_capacity(records.len());
        let mut index = HashMap::with_capacity(records.len());
        for (i, rec) in records.into_iter().enumerate() {
            if rec.id.is_empty() {
                return Err(malformed(format!("record #{} has an empty name", i + 1)));
            }
            if rec.seq.is_empty() {
                return Err(malformed(format!("contig '{}' has zero length", rec.id)));
            }
            if index.insert(rec.id.clone(), i).is_some() {
                return Err(malformed(format!("contig '{}' appears more than once", rec.id)));
            }
            contigs.push(Contig { name: rec.id, seq: rec.seq });
        }

        log::info!(
            "reference {}: {} contigs, {} bp",
            origin.display(),
            contigs.len(),
            contigs.iter().map(Contig::len).sum::<usize>()
        );
        Ok(Self { contigs, index })
    }

    pub fn contigs(&self) -> &[Contig] {
        &self.contigs
    }

    pub fn contig(&self, name: &str) -> Option<&Contig> {
        self.index.get(name).map(|&i| &self.contigs[i])
    }

    pub fn contig_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn contig_length(&self, name: &str) -> Option<usize> {
        self.contig(name).map(Contig::len)
    }

    /// 按文件顺序返回 (名称, 长度)
    pub fn contig_lengths(&self) -> Vec<(String, usize)> {
        self.contigs.iter().map(|c| (c.name.clone(), c.len())).collect()
    }

    /// 每个样本独立的可变序列副本，按 contig 顺序排列。
    pub fn sequences(&self) -> Vec<Vec<u8>> {
        self.contigs.iter().map(|c| c.seq.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn load_str(s: &str) -> Result<Reference> {
        Reference::from_reader(Cursor::new(s.as_bytes()), Path::new("ref.fa"))
    }

    #[test]
    fn keeps_order_case_and_lengths() {
        let r = load_str(">chr2\nacGT\n>chr1 primary\nATCGNN\nAT\n").unwrap();
        let names: Vec<&str> = r.contigs().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["chr2", "chr1"]);
        assert_eq!(r.contig("chr2").unwrap().seq, b"acGT");
        assert_eq!(r.contig_length("chr1"), Some(8));
        assert_eq!(r.contig_index("chr1"), Some(1));
        assert_eq!(r.contig_length("chrX"), None);
        assert_eq!(r.contig_lengths(), vec![("chr2".to_string(), 4), ("chr1".to_string(), 8)]);
    }

    #[test]
    fn empty_file_is_malformed() {
        let err = load_str("").unwrap_err();
        assert!(matches!(err, Error::MalformedReference { .. }));
    }

    #[test]
    fn zero_length_record_is_malformed() {
        let err = load_str(">chr1\nACGT\n>chr2\n").unwrap_err();
        assert!(matches!(err, Error::MalformedReference { ref reason, .. } if reason.contains("chr2")));
    }

    #[test]
    fn duplicate_names_are_malformed() {
        assert!(matches!(load_str(">a\nA\n>a\nC\n"), Err(Error::MalformedReference { .. })));
    }

    #[test]
    fn missing_file_is_malformed() {
        let err = Reference::load(Path::new("/nonexistent/ref.fa")).unwrap_err();
        assert!(matches!(err, Error::MalformedReference { .. }));
    }

    #[test]
    fn sequences_are_independent_copies() {
        let r = load_str(">chr1\nACGT\n").unwrap();
        let mut copy = r.sequences();
        copy[0][0] = b'T';
        assert_eq!(r.contig("chr1").unwrap().seq, b"ACGT");
    }
}
