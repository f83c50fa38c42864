//! Target list reading.
//!
//! Expected headers: `id, name, tmz, trt, subid`; any further columns
//! (`monoisotopic, cas, formula, ...`) are ignored except `concentration`,
//! which is carried into the feature tables.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use gcmatch::data::target::TargetFragment;
use gcmatch::ToleranceConfig;
use serde::Deserialize;

use crate::error::{BatchError, Result};

#[derive(Debug, Deserialize)]
struct TargetRow {
    id: u32,
    #[serde(default)]
    name: String,
    tmz: f64,
    trt: f64,
    subid: u32,
    #[serde(default)]
    concentration: Option<f64>,
}

/// One row of the target list.
#[derive(Clone, Debug, PartialEq)]
pub struct TargetEntry {
    pub id: u32,
    pub subid: u32,
    pub name: String,
    pub expected_mz: f64,
    pub expected_rt: f64,
    pub concentration: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TargetList {
    pub entries: Vec<TargetEntry>,
}

impl TargetList {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Target fragments with windows derived from `tolerance`.
    pub fn fragments(&self, tolerance: &ToleranceConfig) -> Vec<TargetFragment> {
        self.entries
            .iter()
            .map(|e| TargetFragment::from_expected(e.id, e.subid, e.expected_mz, e.expected_rt, tolerance))
            .collect()
    }
}

pub fn read_targets<R: Read>(reader: R) -> Result<TargetList> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut entries = Vec::new();
    for row in rdr.deserialize() {
        let row: TargetRow = row?;
        if !row.tmz.is_finite() || !row.trt.is_finite() {
            return Err(BatchError::Format(format!(
                "target {}/{} has non-finite tmz or trt",
                row.id, row.subid
            )));
        }
        entries.push(TargetEntry {
            id: row.id,
            subid: row.subid,
            name: row.name,
            expected_mz: row.tmz,
            expected_rt: row.trt,
            concentration: row.concentration,
        });
    }
    Ok(TargetList { entries })
}

pub fn read_targets_file(path: &Path) -> Result<TargetList> {
    let file = File::open(path).map_err(|e| BatchError::io(path, e))?;
    read_targets(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_targets_with_extra_columns() {
        let data = "\
id,name,tmz,trt,monoisotopic,cas,subid,formula,concentration
1,benzene,78.0469,5.12,78.0469,71-43-2,0,C6H6,2.5
1,benzene,77.0391,5.12,78.0469,71-43-2,1,C6H6,
2,toluene,91.0542,6.40,92.0626,108-88-3,0,C7H8,1.0
";
        let targets = read_targets(data.as_bytes()).unwrap();
        assert_eq!(targets.len(), 3);
        assert_eq!(targets.entries[1].subid, 1);
        assert_eq!(targets.entries[0].concentration, Some(2.5));
        assert_eq!(targets.entries[1].concentration, None);
        assert_eq!(targets.entries[2].name, "toluene");

        let fragments = targets.fragments(&ToleranceConfig::default());
        assert!((fragments[2].rt_window.1 - 6.7).abs() < 1e-9);
    }

    #[test]
    fn test_missing_required_column() {
        let data = "id,name,trt,subid\n1,x,5.0,0\n";
        assert!(matches!(read_targets(data.as_bytes()), Err(BatchError::Csv(_))));
    }
}
