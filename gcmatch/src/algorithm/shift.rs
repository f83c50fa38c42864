//! Scalar retention-time shift between a target list and a sample.

use itertools::Itertools;
use statrs::statistics::{Data, Median};

use crate::algorithm::merge::MatchRecord;
use crate::data::target::TargetFragment;

/// Median of `observed_rt - expected_rt` over analytes with at least
/// `min_fragments` matched fragments, or `None` when no analyte qualifies.
pub fn estimate_rt_shift(records: &[MatchRecord], min_fragments: usize) -> Option<f64> {
    let deltas: Vec<f64> = records
        .iter()
        .into_group_map_by(|r| r.id)
        .into_values()
        .filter(|group| group.len() >= min_fragments)
        .flat_map(|group| group.into_iter().map(|r| r.observed_rt - r.expected_rt))
        .collect();

    if deltas.is_empty() {
        return None;
    }
    Some(Data::new(deltas).median())
}

/// Targets with rt windows re-centred on `expected_rt + shift`.
pub fn shift_targets(targets: &[TargetFragment], rt_half_width: f64, shift: f64) -> Vec<TargetFragment> {
    targets.iter().map(|t| t.recentered(rt_half_width, shift)).collect()
}
