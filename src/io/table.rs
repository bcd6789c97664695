//! 带行/列标签的 CSV 矩阵
//!
//! 表头第一格是样本索引列（内容忽略），其余为列标签；每行第一格为样本 ID。
//! 所有查找都按标签进行，不依赖行列位置。

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct LabeledMatrix<T> {
    rows: Vec<String>,
    cols: Vec<String>,
    cells: Vec<Vec<T>>,
    row_index: HashMap<String, usize>,
    col_index: HashMap<String, usize>,
}

impl<T> LabeledMatrix<T> {
    /// 由已解析的数据构建；行或列标签重复、行宽不一致时报错。
    pub fn new(rows: Vec<String>, cols: Vec<String>, cells: Vec<Vec<T>>) -> Result<Self> {
        let origin = PathBuf::from("<memory>");
        Self::build(&origin, rows, cols, cells)
    }

    fn build(origin: &Path, rows: Vec<String>, cols: Vec<String>, cells: Vec<Vec<T>>) -> Result<Self> {
        let table_err = |reason: String| Error::Table { path: origin.to_path_buf(), reason };

        if rows.len() != cells.len() {
            return Err(table_err(format!("{} row ids for {} rows", rows.len(), cells.len())));
        }
        if let Some((i, _)) = cells.iter().enumerate().find(|(_, r)| r.len() != cols.len()) {
            return Err(table_err(format!("row '{}' does not have {} cells", rows[i], cols.len())));
        }

        let mut row_index = HashMap::with_capacity(rows.len());
        for (i, r) in rows.iter().enumerate() {
            if row_index.insert(r.clone(), i).is_some() {
                return Err(table_err(format!("duplicate sample id '{}'", r)));
            }
        }
        let mut col_index = HashMap::with_capacity(cols.len());
        for (i, c) in cols.iter().enumerate() {
            if col_index.insert(c.clone(), i).is_some() {
                return Err(table_err(format!("duplicate column '{}'", c)));
            }
        }

        Ok(Self { rows, cols, cells, row_index, col_index })
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    pub fn cols(&self) -> &[String] {
        &self.cols
    }

    pub fn row(&self, id: &str) -> Option<&[T]> {
        self.row_index.get(id).map(|&i| self.cells[i].as_slice())
    }

    pub fn col_position(&self, label: &str) -> Option<usize> {
        self.col_index.get(label).copied()
    }

    pub fn get(&self, row: &str, col: &str) -> Option<&T> {
        let r = *self.row_index.get(row)?;
        let c = *self.col_index.get(col)?;
        Some(&self.cells[r][c])
    }

    /// 按文件顺序返回 (行 ID, 单元格)
    pub fn iter_rows(&self) -> impl Iterator<Item = (&str, &[T])> {
        self.rows.iter().map(String::as_str).zip(self.cells.iter().map(Vec::as_slice))
    }
}

/// 读取 CSV 矩阵；`parse` 解析单元格，返回 None 视为格式错误。
pub fn read_matrix<R, T, F>(reader: R, origin: &Path, parse: F) -> Result<LabeledMatrix<T>>
where
    R: Read,
    F: Fn(&str) -> Option<T>,
{
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    if headers.is_empty() {
        return Err(Error::Table { path: origin.to_path_buf(), reason: "missing header row".into() });
    }
    let cols: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

    let mut rows = Vec::new();
    let mut cells = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let mut fields = rec.iter();
        let id = fields.next().unwrap_or("").to_string();
        let mut row = Vec::with_capacity(cols.len());
        for (col, raw) in cols.iter().zip(fields) {
            let v = parse(raw).ok_or_else(|| Error::Table {
                path: origin.to_path_buf(),
                reason: format!("sample '{}', column '{}': cannot parse '{}'", id, col, raw),
            })?;
            row.push(v);
        }
        rows.push(id);
        cells.push(row);
    }

    LabeledMatrix::build(origin, rows, cols, cells)
}

pub fn read_matrix_file<T, F>(path: &Path, parse: F) -> Result<LabeledMatrix<T>>
where
    F: Fn(&str) -> Option<T>,
{
    let fh = File::open(path)?;
    read_matrix(std::io::BufReader::new(fh), path, parse)
}

/// 布尔单元格：true/false、1/0、t/f、yes/no、y/n（不区分大小写）
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "t" | "yes" | "y" => Some(true),
        "false" | "0" | "f" | "no" | "n" => Some(false),
        _ => None,
    }
}

/// 有限浮点数单元格
pub fn parse_f64(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn parse_string(s: &str) -> Option<String> {
    Some(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> PathBuf {
        PathBuf::from("test.csv")
    }

    #[test]
    fn reads_labels_and_cells() {
        let data = "sample,chr1_0,chr2_3\ns1,True,0\ns2, false ,1\n";
        let m = read_matrix(data.as_bytes(), &origin(), parse_bool).unwrap();
        assert_eq!(m.rows(), ["s1", "s2"]);
        assert_eq!(m.cols(), ["chr1_0", "chr2_3"]);
        assert_eq!(m.get("s1", "chr1_0"), Some(&true));
        assert_eq!(m.get("s2", "chr1_0"), Some(&false));
        assert_eq!(m.get("s2", "chr2_3"), Some(&true));
        assert_eq!(m.get("s3", "chr2_3"), None);
        assert_eq!(m.row("s1"), Some(&[true, false][..]));
    }

    #[test]
    fn unparseable_cell_is_a_table_error() {
        let data = ",chr1_0\ns1,maybe\n";
        let err = read_matrix(data.as_bytes(), &origin(), parse_bool).unwrap_err();
        assert!(matches!(err, Error::Table { .. }));
        assert!(err.to_string().contains("maybe"));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let data = ",a,b\ns1,1\n";
        assert!(read_matrix(data.as_bytes(), &origin(), parse_f64).is_err());
    }

    #[test]
    fn duplicate_sample_ids_are_rejected() {
        let data = ",a\ns1,1\ns1,2\n";
        let err = read_matrix(data.as_bytes(), &origin(), parse_f64).unwrap_err();
        assert!(err.to_string().contains("duplicate sample id"));
    }

    #[test]
    fn bool_parser_accepts_every_documented_spelling() {
        for s in ["true", "TRUE", "1", "t", "T", "yes", "Yes", "y", "Y"] {
            assert_eq!(parse_bool(s), Some(true), "{:?}", s);
        }
        for s in ["false", "False", "0", "f", "F", "no", "NO", "n", "N"] {
            assert_eq!(parse_bool(s), Some(false), "{:?}", s);
        }
        for s in ["", "2", "maybe", "tru", "-1"] {
            assert_eq!(parse_bool(s), None, "{:?}", s);
        }
    }

    #[test]
    fn float_parser_rejects_non_finite() {
        assert_eq!(parse_f64("0.5"), Some(0.5));
        assert_eq!(parse_f64("-1"), Some(-1.0));
        assert_eq!(parse_f64("NaN"), None);
        assert_eq!(parse_f64("inf"), None);
        assert_eq!(parse_f64(""), None);
    }
}
