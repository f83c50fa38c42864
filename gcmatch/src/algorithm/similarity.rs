//! Shape-similarity scoring and the seeding assignment built on it.
//!
//! Each fragment of an analyte is described by the distances from its
//! expected rt to the expected rts of its sibling fragments; each observation
//! linked to the analyte by the distances from its rt to the other linked
//! observations. The warping-path distance between the two profiles scores
//! how well the observation fits the fragment's place in the family.

use log::debug;

use crate::algorithm::dtw::path_length_score;
use crate::algorithm::state::MatchingState;
use crate::data::candidate::{CandidateFlag, CandidateSet, FragmentKey};

/// Store a shape distance on every candidate (smaller is better).
pub fn score_candidates(set: &mut CandidateSet) {
    for analyte in 0..set.analytes.len() {
        let fragments = set.analytes[analyte].fragments.clone();
        let observations = set.observations_of_analyte(analyte);

        for &f in &fragments {
            let trt = set.fragments[f].expected_rt;
            let target_profile: Vec<f64> = fragments
                .iter()
                .map(|&g| (trt - set.fragments[g].expected_rt).abs())
                .collect();

            for k in 0..set.candidates_of(f).len() {
                let ci = set.candidates_of(f)[k];
                let rt = set.observation_rt(set.candidates[ci].observation);
                let observed_profile: Vec<f64> = observations
                    .iter()
                    .map(|&p| (rt - set.observation_rt(p)).abs())
                    .collect();
                set.candidates[ci].score = path_length_score(&target_profile, &observed_profile);
            }
        }
    }
}

/// Assign every unmatched fragment its best-scoring contestable observation.
///
/// An observation is contestable when it is free, or when its holder scored
/// it strictly worse than the challenger does. A displaced holder goes back
/// on the worklist. Every successful contest strictly lowers the score held
/// on the contested observation, so the loop ends.
///
/// Returns the number of contests won against an incumbent.
pub fn seed_assignment(set: &mut CandidateSet, state: &mut MatchingState) -> usize {
    let mut worklist: Vec<FragmentKey> = (0..set.fragments.len())
        .rev()
        .filter(|&f| !state.is_matched(f))
        .collect();
    let mut contests = 0;

    while let Some(f) = worklist.pop() {
        if state.is_matched(f) {
            continue;
        }

        let mut best: Option<(usize, f64)> = None;
        for &ci in set.candidates_of(f) {
            let c = &set.candidates[ci];
            if best.map_or(false, |(_, s)| c.score >= s) {
                continue;
            }
            let contestable = match state.holder_of(c.observation) {
                None => true,
                Some(holder) => set
                    .score_of(holder, c.observation)
                    .map_or(false, |held| c.score < held),
            };
            if contestable {
                best = Some((ci, c.score));
            }
        }

        if let Some((ci, score)) = best {
            let observation = set.candidates[ci].observation;
            if let Some(evicted) = state.assign(f, observation) {
                debug!("fragment {} takes observation {} from {} (score {:.4})", f, observation, evicted, score);
                worklist.push(evicted);
                contests += 1;
            }
            set.candidates[ci].flag = CandidateFlag::Rejected;
        }
    }

    contests
}

/// Score all candidates and seed the matching from the scores.
pub fn run_similarity_seed(set: &mut CandidateSet, state: &mut MatchingState) -> usize {
    score_candidates(set);
    let contests = seed_assignment(set, state);
    debug!(
        "similarity seed matched {} of {} fragments ({} contests)",
        state.matched_count(),
        set.fragments.len(),
        contests
    );
    contests
}
