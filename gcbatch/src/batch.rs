//! Per-sample fan-out over a rayon pool.
//!
//! Samples are independent: each one is resolved on its own state and the
//! results are collected back in input order.

use std::fs;
use std::path::Path;

use gcmatch::data::target::TargetFragment;
use gcmatch::{resolve_with_shift, ResolveConfig, ResolveError, Resolution};
use log::{info, warn};
use rayon::prelude::*;

use crate::config::BatchConfig;
use crate::error::{BatchError, Result};
use crate::io::peaks::{discover_peak_lists, read_peaks_file, SamplePeaks};
use crate::io::table::FeatureTables;
use crate::io::targets::read_targets_file;

#[derive(Clone, Debug, PartialEq)]
pub struct SampleResult {
    pub name: String,
    pub resolution: Resolution,
    pub rt_shift: f64,
    /// The peak list had no rows; resolved as `NoCandidates`.
    pub no_observations: bool,
}

/// Counts reported after a batch run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchSummary {
    pub samples: usize,
    pub no_candidates: usize,
    pub no_observations: usize,
    pub matched_fragments: usize,
}

/// Resolve every sample in parallel.
pub fn resolve_samples(
    fragments: &[TargetFragment],
    samples: &[SamplePeaks],
    config: &ResolveConfig,
) -> Result<Vec<SampleResult>> {
    samples
        .par_iter()
        .map(|sample| {
            let shifted = match resolve_with_shift(fragments, &sample.observations, config) {
                Ok(shifted) => shifted,
                Err(ResolveError::NoObservations) => {
                    warn!("{}: empty peak list, no-match", sample.name);
                    return Ok(SampleResult {
                        name: sample.name.clone(),
                        resolution: Resolution::NoCandidates,
                        rt_shift: 0.0,
                        no_observations: true,
                    });
                }
                Err(source) => return Err(BatchError::Sample { name: sample.name.clone(), source }),
            };
            if shifted.resolution.is_no_candidates() {
                warn!("{}: no-match", sample.name);
            } else {
                info!(
                    "{}: {} fragments matched, rt shift {:.4}",
                    sample.name,
                    shifted.resolution.records().len(),
                    shifted.rt_shift
                );
            }
            Ok(SampleResult {
                name: sample.name.clone(),
                resolution: shifted.resolution,
                rt_shift: shifted.rt_shift,
                no_observations: false,
            })
        })
        .collect()
}

pub fn summarize(results: &[SampleResult]) -> BatchSummary {
    BatchSummary {
        samples: results.len(),
        no_candidates: results
            .iter()
            .filter(|r| !r.no_observations && r.resolution.is_no_candidates())
            .count(),
        no_observations: results.iter().filter(|r| r.no_observations).count(),
        matched_fragments: results.iter().map(|r| r.resolution.records().len()).sum(),
    }
}

/// Read the target list and every peak list in `peaks_dir`, resolve all
/// samples, and write the feature tables into `out_dir`.
pub fn run(config: &BatchConfig, peaks_dir: &Path, targets_path: &Path, out_dir: &Path) -> Result<BatchSummary> {
    config.validate()?;
    let suffix = config.sample_suffix_regex()?;

    let targets = read_targets_file(targets_path)?;
    if targets.is_empty() {
        return Err(BatchError::Resolve(gcmatch::ResolveError::NoTargets));
    }
    let fragments = targets.fragments(&config.tolerance);

    let paths = discover_peak_lists(peaks_dir)?;
    info!("{} targets, {} peak lists in {}", targets.len(), paths.len(), peaks_dir.display());

    let pool = rayon::ThreadPoolBuilder::new().num_threads(config.threads).build()?;
    let results = pool.install(|| -> Result<Vec<SampleResult>> {
        let samples = paths
            .par_iter()
            .map(|path| read_peaks_file(path, &config.columns, &suffix))
            .collect::<Result<Vec<SamplePeaks>>>()?;
        resolve_samples(&fragments, &samples, &config.resolve)
    })?;

    fs::create_dir_all(out_dir).map_err(|e| BatchError::io(out_dir, e))?;
    FeatureTables::build(&targets, &results).write_all(out_dir, &targets)?;

    let summary = summarize(&results);
    info!(
        "{} samples resolved ({} without candidates, {} empty), {} fragments matched",
        summary.samples, summary.no_candidates, summary.no_observations, summary.matched_fragments
    );
    Ok(summary)
}
