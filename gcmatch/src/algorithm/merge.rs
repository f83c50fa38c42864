use serde::{Deserialize, Serialize};

use crate::algorithm::state::MatchingState;
use crate::data::candidate::CandidateSet;

/// One matched target fragment of a sample.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: u32,
    pub subid: u32,
    pub observed_mz: f64,
    pub observed_rt: f64,
    pub signal: f64,
    pub expected_mz: f64,
    pub expected_rt: f64,
    pub inferred_rt: f64,
    pub deviation: f64,
}

/// Join the candidates against the final matching, keeping candidate order.
///
/// Fragments without a match produce no row.
pub fn merge_matches(set: &CandidateSet, state: &MatchingState) -> Vec<MatchRecord> {
    set.candidates
        .iter()
        .filter(|c| state.observation_of(c.fragment) == Some(c.observation))
        .filter_map(|c| {
            let fragment = &set.fragments[c.fragment];
            let observation = &set.observations[c.observation];
            Some(MatchRecord {
                id: fragment.id,
                subid: fragment.subid,
                observed_mz: observation.mz,
                observed_rt: observation.rt,
                signal: observation.signal,
                expected_mz: fragment.expected_mz,
                expected_rt: fragment.expected_rt,
                inferred_rt: state.irt(fragment.analyte)?,
                deviation: state.deviation(c.fragment)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::reference::refresh;
    use crate::data::observation::Observation;
    use crate::data::target::TargetFragment;

    #[test]
    fn test_only_matched_pairs_are_emitted() {
        let targets = vec![
            TargetFragment::new(1, 0, 100.0, 5.0, (99.9, 100.1), (4.7, 5.3)),
            TargetFragment::new(1, 1, 110.0, 5.0, (109.9, 110.1), (4.7, 5.3)),
        ];
        let obs = vec![
            Observation::new(100.0, 5.01, 42.0),
            Observation::new(100.05, 5.02, 7.0),
            Observation::new(110.0, 5.2, 3.0),
        ];
        let set = CandidateSet::generate(&targets, &obs);
        let mut state = MatchingState::new(set.fragments.len(), set.observations.len(), set.analytes.len());
        state.assign(0, 0);
        refresh(&set, &mut state, 0.02);

        let records = merge_matches(&set, &state);
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!((r.id, r.subid), (1, 0));
        assert!(r.signal == 42.0);
        assert!((r.inferred_rt - 5.01).abs() < 1e-12);
        assert!(r.deviation == 0.0);
    }
}
