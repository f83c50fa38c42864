//! Per-analyte reference retention time, per-fragment deviation, and the
//! adaptive deviation bound derived from them.

use crate::algorithm::state::MatchingState;
use crate::data::candidate::CandidateSet;

/// Lower of the two middle values (the true median for odd counts).
///
/// Sorts `values` in place and picks index `n / 2 + n % 2 - 1`.
///
/// # Example
///
/// ```
/// use gcmatch::algorithm::reference::low_median;
///
/// assert_eq!(low_median(&mut [5.0, 1.0, 3.0]), Some(3.0));
/// assert_eq!(low_median(&mut [7.0, 1.0, 5.0, 3.0]), Some(3.0));
/// ```
pub fn low_median(values: &mut [f64]) -> Option<f64> {
    let n = values.len();
    if n == 0 {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    Some(values[n / 2 + n % 2 - 1])
}

/// Quantile with linear interpolation between closest ranks on sorted data.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

/// `min(2 * q75(drts), drt_max)`, or `drt_max` when there is nothing to
/// estimate from.
pub fn adaptive_bound(drts: &mut [f64], drt_max: f64) -> f64 {
    drts.sort_by(|a, b| a.total_cmp(b));
    match quantile_sorted(drts, 0.75) {
        Some(q) if q.is_finite() => (2.0 * q).min(drt_max),
        _ => drt_max,
    }
}

/// Recompute irt for every analyte and drt for every fragment from the
/// current matching, and return the adaptive bound.
///
/// Analytes without a matched fragment lose their irt; fragments without a
/// match or without an analyte irt lose their drt. When no analyte has more
/// than one matched fragment every deviation is zero by construction, and
/// the bound falls back to `drt_max`.
pub fn refresh(set: &CandidateSet, state: &mut MatchingState, drt_max: f64) -> f64 {
    let mut rts: Vec<Vec<f64>> = vec![Vec::new(); set.analytes.len()];
    for (f, o) in state.matched_pairs() {
        rts[set.analyte_of(f)].push(set.observation_rt(o));
    }
    let informative = rts.iter().any(|v| v.len() > 1);
    for (analyte, mut values) in rts.into_iter().enumerate() {
        state.set_irt(analyte, low_median(&mut values));
    }

    let mut drts = Vec::new();
    for f in 0..set.fragments.len() {
        let drt = match (state.observation_of(f), state.irt(set.analyte_of(f))) {
            (Some(o), Some(irt)) => Some((irt - set.observation_rt(o)).abs()),
            _ => None,
        };
        state.set_deviation(f, drt);
        if let Some(d) = drt {
            drts.push(d);
        }
    }

    if informative {
        adaptive_bound(&mut drts, drt_max)
    } else {
        drt_max
    }
}
