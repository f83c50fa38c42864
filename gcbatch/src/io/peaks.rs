//! Per-sample peak lists.
//!
//! A peak list is a CSV table with one detected peak per row. The m/z,
//! retention time and signal columns are picked by position; the sample name
//! is the signal column's header with a configured suffix stripped.

use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use gcmatch::data::observation::Observation;
use regex::Regex;

use crate::config::PeakColumns;
use crate::error::{BatchError, Result};

#[derive(Clone, Debug, PartialEq)]
pub struct SamplePeaks {
    pub name: String,
    pub observations: Vec<Observation>,
}

/// Empty cells read as NaN, which never falls inside a window or passes the
/// positive-signal filter.
fn parse_cell(record: &csv::StringRecord, column: usize, row: usize) -> Result<f64> {
    let cell = record
        .get(column)
        .ok_or_else(|| BatchError::Format(format!("row {}: no column {}", row + 1, column)))?
        .trim();
    if cell.is_empty() {
        return Ok(f64::NAN);
    }
    cell.parse::<f64>()
        .map_err(|_| BatchError::Format(format!("row {}: column {} is not numeric: '{}'", row + 1, column, cell)))
}

pub fn read_peaks<R: Read>(reader: R, columns: &PeakColumns, suffix: &Regex) -> Result<SamplePeaks> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let header = rdr
        .headers()?
        .get(columns.signal)
        .ok_or_else(|| BatchError::Format(format!("header has no signal column {}", columns.signal)))?
        .trim()
        .to_string();
    let name = suffix.replace(&header, "").into_owned();

    let mut observations = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        observations.push(Observation::new(
            parse_cell(&record, columns.mz, row)?,
            parse_cell(&record, columns.rt, row)?,
            parse_cell(&record, columns.signal, row)?,
        ));
    }
    Ok(SamplePeaks { name, observations })
}

pub fn read_peaks_file(path: &Path, columns: &PeakColumns, suffix: &Regex) -> Result<SamplePeaks> {
    let file = File::open(path).map_err(|e| BatchError::io(path, e))?;
    read_peaks(BufReader::new(file), columns, suffix)
        .map_err(|e| match e {
            BatchError::Format(msg) => BatchError::Format(format!("{}: {}", path.display(), msg)),
            other => other,
        })
}

/// `*.csv` files directly inside `dir`, sorted by file name.
pub fn discover_peak_lists(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| BatchError::io(dir, e))? {
        let path = entry.map_err(|e| BatchError::io(dir, e))?.path();
        let is_csv = path.extension().map_or(false, |ext| ext == "csv");
        if path.is_file() && is_csv {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suffix() -> Regex {
        Regex::new(r"\.mzXML Peak area$").unwrap()
    }

    #[test]
    fn test_read_peaks_by_position() {
        let data = "\
row m/z,row retention time,row ID,S01.mzXML Peak area
78.0470,5.13,1,1500.5
91.0541,6.41,2,0
";
        let peaks = read_peaks(data.as_bytes(), &PeakColumns::default(), &suffix()).unwrap();
        assert_eq!(peaks.name, "S01");
        assert_eq!(peaks.observations.len(), 2);
        assert!((peaks.observations[0].mz - 78.047).abs() < 1e-9);
        assert!(peaks.observations[0].has_signal());
        assert!(!peaks.observations[1].has_signal());
    }

    #[test]
    fn test_empty_cell_reads_as_nan() {
        let data = "mz,rt,id,S02\n100.0,5.0,1,\n";
        let peaks = read_peaks(data.as_bytes(), &PeakColumns::default(), &suffix()).unwrap();
        assert_eq!(peaks.name, "S02");
        assert!(peaks.observations[0].signal.is_nan());
        assert!(!peaks.observations[0].has_signal());
    }

    #[test]
    fn test_non_numeric_cell_is_reported() {
        let data = "mz,rt,id,S03\n100.0,abc,1,5\n";
        let err = read_peaks(data.as_bytes(), &PeakColumns::default(), &suffix()).unwrap_err();
        match err {
            BatchError::Format(msg) => assert!(msg.contains("row 1")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_signal_column() {
        let data = "mz,rt\n100.0,5.0\n";
        assert!(matches!(
            read_peaks(data.as_bytes(), &PeakColumns::default(), &suffix()),
            Err(BatchError::Format(_))
        ));
    }
}
