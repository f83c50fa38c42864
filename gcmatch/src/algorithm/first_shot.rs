//! First-shot matching: greedy rt-ordered assignment, adaptive bound
//! tightening and eviction, repeated to a fixed point.

use log::debug;

use crate::algorithm::reference::refresh;
use crate::algorithm::state::MatchingState;
use crate::config::ResolveConfig;
use crate::data::candidate::{CandidateFlag, CandidateSet, ObservationKey};

/// Outcome of the first-shot loop.
#[derive(Clone, Debug, PartialEq)]
pub struct FirstShotReport {
    /// Number of outer passes run.
    pub passes: usize,
    /// Bound estimated from the matching in each pass, before any floor.
    pub estimates: Vec<f64>,
    /// Bound applied in each pass, in order.
    pub bounds: Vec<f64>,
    /// Bound carried into the second shot.
    pub drt_bound: f64,
}

/// Give every unmatched fragment the first free observation among its
/// unprocessed candidates, in analyte order then fragment order.
///
/// Returns the number of new assignments.
pub fn greedy_assign(set: &mut CandidateSet, state: &mut MatchingState) -> usize {
    let mut assigned = 0;
    for analyte in 0..set.analytes.len() {
        for k in 0..set.analytes[analyte].fragments.len() {
            let f = set.analytes[analyte].fragments[k];
            if state.is_matched(f) {
                continue;
            }
            let pick = set.candidates_of(f).iter().copied().find(|&ci| {
                let c = &set.candidates[ci];
                c.flag == CandidateFlag::Unprocessed && state.is_free(c.observation)
            });
            if let Some(ci) = pick {
                state.assign(f, set.candidates[ci].observation);
                set.candidates[ci].flag = CandidateFlag::FirstShot;
                assigned += 1;
            }
        }
    }
    assigned
}

/// Unpair every matched fragment whose deviation exceeds `bound`.
pub fn evict_outside(set: &CandidateSet, state: &mut MatchingState, bound: f64) -> usize {
    let outside: Vec<usize> = (0..set.fragments.len())
        .filter(|&f| state.is_matched(f) && state.deviation(f).map_or(false, |d| d > bound))
        .collect();
    for &f in &outside {
        state.evict(f);
    }
    outside.len()
}

/// True when two consecutive passes ended on the same matching.
///
/// Equal counts are not enough: a pass that evicts one fragment and admits
/// another leaves the count unchanged but must be followed by another pass.
pub fn reached_fixed_point(previous: &[Option<ObservationKey>], current: &[Option<ObservationKey>]) -> bool {
    let count = |m: &[Option<ObservationKey>]| m.iter().filter(|o| o.is_some()).count();
    count(previous) == count(current) && previous == current
}

/// Run first-shot passes until the matching stops changing.
///
/// The first `bound_test_limit` passes apply the estimated bound as is;
/// afterwards the largest bound seen so far is carried forward as a floor,
/// so the applied bound never decreases from then on.
pub fn run_first_shot(set: &mut CandidateSet, state: &mut MatchingState, config: &ResolveConfig) -> FirstShotReport {
    let mut previous = state.snapshot();
    let mut best: Option<f64> = None;
    let mut estimates = Vec::new();
    let mut bounds = Vec::new();

    loop {
        let assigned = greedy_assign(set, state);

        let estimate = refresh(set, state, config.drt_max);
        let bound = match best {
            Some(floor) if estimates.len() >= config.bound_test_limit => estimate.max(floor),
            _ => estimate,
        };
        best = Some(best.map_or(bound, |b| b.max(bound)));
        estimates.push(estimate);
        bounds.push(bound);

        let evicted = evict_outside(set, state, bound);
        // same bound, refreshed values only
        let hypothesis = refresh(set, state, config.drt_max);

        let current = state.snapshot();
        debug!(
            "first shot pass {}: +{} assigned, -{} evicted, {} matched, bound {:.5} (estimate {:.5}), hypothesis {:.5}",
            bounds.len(),
            assigned,
            evicted,
            state.matched_count(),
            bound,
            estimate,
            hypothesis
        );

        if reached_fixed_point(&previous, &current) {
            break;
        }
        previous = current;
    }

    FirstShotReport {
        passes: bounds.len(),
        drt_bound: bounds.last().copied().unwrap_or(config.drt_max),
        estimates,
        bounds,
    }
}
