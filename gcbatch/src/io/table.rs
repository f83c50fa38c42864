//! Wide feature tables: one row per target, one column per sample.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use gcmatch::algorithm::merge::MatchRecord;

use crate::batch::SampleResult;
use crate::error::{BatchError, Result};
use crate::io::targets::TargetList;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureTable {
    pub samples: Vec<String>,
    /// `values[row][sample]`, rows aligned with the target list.
    pub values: Vec<Vec<f64>>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureTables {
    pub signal: FeatureTable,
    pub rt: FeatureTable,
    pub mz: FeatureTable,
}

impl FeatureTables {
    /// Spread every sample's matches over the target rows; fragments without
    /// a match in a sample stay 0.
    pub fn build(targets: &TargetList, results: &[SampleResult]) -> Self {
        let mut rows: HashMap<(u32, u32), Vec<usize>> = HashMap::new();
        for (i, e) in targets.entries.iter().enumerate() {
            rows.entry((e.id, e.subid)).or_default().push(i);
        }

        let samples: Vec<String> = results.iter().map(|r| r.name.clone()).collect();
        let empty = || FeatureTable {
            samples: samples.clone(),
            values: vec![vec![0.0; samples.len()]; targets.len()],
        };
        let mut tables = FeatureTables { signal: empty(), rt: empty(), mz: empty() };

        for (s, result) in results.iter().enumerate() {
            for record in result.resolution.records() {
                let Some(indices) = rows.get(&(record.id, record.subid)) else {
                    continue;
                };
                for &row in indices {
                    tables.fill(row, s, record);
                }
            }
        }
        tables
    }

    fn fill(&mut self, row: usize, sample: usize, record: &MatchRecord) {
        self.signal.values[row][sample] = record.signal;
        self.rt.values[row][sample] = record.observed_rt;
        self.mz.values[row][sample] = record.observed_mz;
    }

    /// Write `feature.sample.{i,rt,mz}.csv` into `dir`.
    pub fn write_all(&self, dir: &Path, targets: &TargetList) -> Result<()> {
        for (suffix, table) in [("i", &self.signal), ("rt", &self.rt), ("mz", &self.mz)] {
            let path = dir.join(format!("feature.sample.{}.csv", suffix));
            let file = File::create(&path).map_err(|e| BatchError::io(&path, e))?;
            write_table(BufWriter::new(file), targets, table)?;
        }
        Ok(())
    }
}

pub fn write_table<W: Write>(writer: W, targets: &TargetList, table: &FeatureTable) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header: Vec<String> = ["id", "name", "tmz", "trt", "subid", "concentration"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    header.extend(table.samples.iter().cloned());
    wtr.write_record(&header)?;

    for (entry, values) in targets.entries.iter().zip(table.values.iter()) {
        let mut record = vec![
            entry.id.to_string(),
            entry.name.clone(),
            entry.expected_mz.to_string(),
            entry.expected_rt.to_string(),
            entry.subid.to_string(),
            entry.concentration.map(|c| c.to_string()).unwrap_or_default(),
        ];
        record.extend(values.iter().map(|v| v.to_string()));
        wtr.write_record(&record)?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}
