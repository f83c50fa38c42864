//! Second-shot correction: one reverse sweep that lets fragments claim or
//! steal observations closer to their analyte's reference rt.

use std::collections::HashSet;

use log::debug;

use crate::algorithm::reference::refresh;
use crate::algorithm::state::MatchingState;
use crate::data::candidate::{AnalyteKey, CandidateSet, FragmentKey, ObservationKey};

/// What the sweep did, for logging and tests.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SecondShotReport {
    pub taken: usize,
    pub stolen: usize,
    pub moved: usize,
    /// Bound estimated from the corrected matching; not applied.
    pub hypothesis: f64,
}

/// Closest qualifying observation of an unmatched fragment.
enum Claim {
    Take(ObservationKey, f64),
    Steal(ObservationKey, f64),
}

fn best_claim(
    set: &CandidateSet,
    state: &MatchingState,
    fragment: FragmentKey,
    irt: f64,
    bound: f64,
    allow_steal: bool,
) -> Option<Claim> {
    let mut take: Option<(ObservationKey, f64)> = None;
    let mut steal: Option<(ObservationKey, f64)> = None;

    for &ci in set.candidates_of(fragment).iter().rev() {
        let o = set.candidates[ci].observation;
        let drt = (irt - set.observation_rt(o)).abs();
        if drt > bound {
            continue;
        }
        match state.holder_of(o) {
            None => {
                if take.map_or(true, |(_, d)| d > drt) {
                    take = Some((o, drt));
                }
            }
            Some(holder) => {
                if allow_steal
                    && take.is_none()
                    && state.deviation(holder).map_or(false, |d| d > drt)
                    && steal.map_or(true, |(_, d)| d > drt)
                {
                    steal = Some((o, drt));
                }
            }
        }
    }

    match (take, steal) {
        (Some((o, d)), _) => Some(Claim::Take(o, d)),
        (None, Some((o, d))) => Some(Claim::Steal(o, d)),
        _ => None,
    }
}

/// Analytes with a reference rt, latest reference first.
fn sweep_order(set: &CandidateSet, state: &MatchingState) -> Vec<(AnalyteKey, f64)> {
    let mut order: Vec<(AnalyteKey, f64)> = (0..set.analytes.len())
        .filter_map(|a| state.irt(a).map(|irt| (a, irt)))
        .collect();
    order.sort_by(|x, y| y.1.total_cmp(&x.1).then_with(|| y.0.cmp(&x.0)));
    order
}

/// Run the corrective sweep once and refresh irt/drt afterwards.
///
/// Unmatched fragments take the closest free observation within `bound` of
/// their analyte's irt, or failing that steal the closest occupied one whose
/// holder deviates more than this fragment would. The holder is left
/// unmatched and is not reconsidered during this sweep. Matched fragments
/// only move to a free observation that lowers their deviation.
pub fn run_second_shot(set: &CandidateSet, state: &mut MatchingState, bound: f64, drt_max: f64) -> SecondShotReport {
    let mut report = SecondShotReport::default();
    let mut displaced: HashSet<FragmentKey> = HashSet::new();

    for (analyte, irt) in sweep_order(set, state) {
        for &f in set.analytes[analyte].fragments.iter().rev() {
            if displaced.contains(&f) {
                continue;
            }
            if !state.is_matched(f) {
                match best_claim(set, state, f, irt, bound, true) {
                    Some(Claim::Take(o, drt)) => {
                        state.assign(f, o);
                        state.set_deviation(f, Some(drt));
                        report.taken += 1;
                    }
                    Some(Claim::Steal(o, drt)) => {
                        if let Some(holder) = state.assign(f, o) {
                            debug!("fragment {} steals observation {} from {}", f, o, holder);
                            displaced.insert(holder);
                        }
                        state.set_deviation(f, Some(drt));
                        report.stolen += 1;
                    }
                    None => {}
                }
            } else if let Some(current) = state.deviation(f) {
                if let Some(Claim::Take(o, drt)) = best_claim(set, state, f, irt, bound, false) {
                    if current > drt {
                        state.assign(f, o);
                        state.set_deviation(f, Some(drt));
                        report.moved += 1;
                    }
                }
            }
        }
    }

    report.hypothesis = refresh(set, state, drt_max);
    debug!(
        "second shot: {} taken, {} stolen, {} moved, hypothesis {:.5}",
        report.taken, report.stolen, report.moved, report.hypothesis
    );
    report
}
