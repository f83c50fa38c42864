//! Candidate generation and the dense per-sample registries.
//!
//! A [`CandidateSet`] owns everything a single sample's resolution run needs:
//! the (fragment, observation) pairs that fall inside a target's tolerance
//! window, plus three registries that enumerate fragments, observations and
//! analytes with dense integer keys in order of first appearance.

use std::collections::HashMap;

use ordered_float::OrderedFloat;

use crate::data::observation::Observation;
use crate::data::target::TargetFragment;

pub type FragmentKey = usize;
pub type ObservationKey = usize;
pub type AnalyteKey = usize;

/// Processing state of a candidate pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CandidateFlag {
    Unprocessed,
    /// Withdrawn from first-shot consideration (claimed by the similarity seed).
    Rejected,
    /// Claimed once by the first shot; never re-admitted by it.
    FirstShot,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub fragment: FragmentKey,
    pub observation: ObservationKey,
    /// Shape distance; smaller is a better match.
    pub score: f64,
    pub flag: CandidateFlag,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FragmentEntry {
    pub id: u32,
    pub subid: u32,
    pub expected_mz: f64,
    pub expected_rt: f64,
    pub analyte: AnalyteKey,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObservationEntry {
    pub mz: f64,
    pub rt: f64,
    pub signal: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnalyteEntry {
    pub id: u32,
    /// Fragment keys of this analyte, ascending.
    pub fragments: Vec<FragmentKey>,
}

#[derive(Clone, Debug, Default)]
pub struct CandidateSet {
    pub candidates: Vec<Candidate>,
    pub fragments: Vec<FragmentEntry>,
    pub observations: Vec<ObservationEntry>,
    pub analytes: Vec<AnalyteEntry>,
    by_fragment: Vec<Vec<usize>>,
    by_pair: HashMap<(FragmentKey, ObservationKey), usize>,
}

impl CandidateSet {
    /// Pair every target fragment with every observation inside its window.
    ///
    /// Observations without positive signal are ignored. Candidates are
    /// ordered by (observed rt, expected rt, analyte id, sub-id) and the
    /// registries are enumerated in that order. An empty set means the
    /// sample has no candidates at all.
    pub fn generate(targets: &[TargetFragment], observations: &[Observation]) -> Self {
        // observation indices with signal and finite coordinates, sorted by
        // rt for window lookup; a NaN rt would break the partition below
        let mut by_rt: Vec<usize> = (0..observations.len())
            .filter(|&i| {
                let o = &observations[i];
                o.has_signal() && o.rt.is_finite() && o.mz.is_finite()
            })
            .collect();
        by_rt.sort_by(|&a, &b| observations[a].rt.total_cmp(&observations[b].rt));

        let mut raw: Vec<(usize, usize)> = Vec::new();
        for (ti, target) in targets.iter().enumerate() {
            let (rt_lo, rt_hi) = target.rt_window;
            let start = by_rt.partition_point(|&i| observations[i].rt < rt_lo);
            for &oi in &by_rt[start..] {
                let o = &observations[oi];
                if o.rt > rt_hi {
                    break;
                }
                if target.contains(o.mz, o.rt) {
                    raw.push((ti, oi));
                }
            }
        }

        if raw.is_empty() {
            return CandidateSet::default();
        }

        raw.sort_by(|&(ta, oa), &(tb, ob)| {
            let (ta, tb) = (&targets[ta], &targets[tb]);
            observations[oa]
                .rt
                .total_cmp(&observations[ob].rt)
                .then_with(|| ta.expected_rt.total_cmp(&tb.expected_rt))
                .then_with(|| ta.id.cmp(&tb.id))
                .then_with(|| ta.subid.cmp(&tb.subid))
        });

        let mut set = CandidateSet::default();
        let mut fragment_keys: HashMap<(u32, u32), FragmentKey> = HashMap::new();
        let mut observation_keys: HashMap<(OrderedFloat<f64>, OrderedFloat<f64>), ObservationKey> =
            HashMap::new();
        let mut analyte_keys: HashMap<u32, AnalyteKey> = HashMap::new();

        for (ti, oi) in raw {
            let target = &targets[ti];
            let obs = &observations[oi];

            let fragment = *fragment_keys.entry((target.id, target.subid)).or_insert_with(|| {
                let analyte = *analyte_keys.entry(target.id).or_insert_with(|| {
                    set.analytes.push(AnalyteEntry { id: target.id, fragments: Vec::new() });
                    set.analytes.len() - 1
                });
                let key = set.fragments.len();
                set.analytes[analyte].fragments.push(key);
                set.fragments.push(FragmentEntry {
                    id: target.id,
                    subid: target.subid,
                    expected_mz: target.expected_mz,
                    expected_rt: target.expected_rt,
                    analyte,
                });
                set.by_fragment.push(Vec::new());
                key
            });

            let observation = *observation_keys
                .entry((OrderedFloat(obs.mz), OrderedFloat(obs.rt)))
                .or_insert_with(|| {
                    set.observations.push(ObservationEntry { mz: obs.mz, rt: obs.rt, signal: obs.signal });
                    set.observations.len() - 1
                });

            if set.by_pair.contains_key(&(fragment, observation)) {
                continue;
            }
            let idx = set.candidates.len();
            set.candidates.push(Candidate {
                fragment,
                observation,
                score: 0.0,
                flag: CandidateFlag::Unprocessed,
            });
            set.by_fragment[fragment].push(idx);
            set.by_pair.insert((fragment, observation), idx);
        }

        set
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Candidate indices of a fragment in ascending candidate order.
    #[inline]
    pub fn candidates_of(&self, fragment: FragmentKey) -> &[usize] {
        &self.by_fragment[fragment]
    }

    #[inline]
    pub fn pair_index(&self, fragment: FragmentKey, observation: ObservationKey) -> Option<usize> {
        self.by_pair.get(&(fragment, observation)).copied()
    }

    #[inline]
    pub fn score_of(&self, fragment: FragmentKey, observation: ObservationKey) -> Option<f64> {
        self.pair_index(fragment, observation).map(|i| self.candidates[i].score)
    }

    #[inline]
    pub fn observation_rt(&self, observation: ObservationKey) -> f64 {
        self.observations[observation].rt
    }

    #[inline]
    pub fn analyte_of(&self, fragment: FragmentKey) -> AnalyteKey {
        self.fragments[fragment].analyte
    }

    /// Observation keys linked to any fragment of an analyte, ascending.
    pub fn observations_of_analyte(&self, analyte: AnalyteKey) -> Vec<ObservationKey> {
        let mut keys: Vec<ObservationKey> = self.analytes[analyte]
            .fragments
            .iter()
            .flat_map(|&f| self.by_fragment[f].iter().map(|&c| self.candidates[c].observation))
            .collect();
        keys.sort_unstable();
        keys.dedup();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(id: u32, subid: u32, mz: f64, rt: f64) -> TargetFragment {
        TargetFragment::new(id, subid, mz, rt, (mz - 0.01, mz + 0.01), (rt - 0.3, rt + 0.3))
    }

    #[test]
    fn test_generate_pairs_inside_window() {
        let targets = vec![target(1, 0, 100.0, 5.0), target(1, 1, 120.0, 5.0)];
        let obs = vec![
            Observation::new(100.005, 5.1, 10.0),
            Observation::new(100.0, 7.0, 10.0),
            Observation::new(120.0, 4.9, 10.0),
            Observation::new(150.0, 5.0, 10.0),
        ];
        let set = CandidateSet::generate(&targets, &obs);
        assert_eq!(set.len(), 2);
        assert_eq!(set.fragments.len(), 2);
        assert_eq!(set.observations.len(), 2);
        assert_eq!(set.analytes.len(), 1);
    }

    #[test]
    fn test_keys_follow_rt_order() {
        let targets = vec![target(2, 0, 200.0, 6.0), target(1, 0, 100.0, 5.0)];
        let obs = vec![Observation::new(200.0, 6.1, 1.0), Observation::new(100.0, 5.1, 1.0)];
        let set = CandidateSet::generate(&targets, &obs);
        // earliest observed rt is enumerated first
        assert_eq!(set.fragments[0].id, 1);
        assert_eq!(set.fragments[1].id, 2);
        assert!((set.observations[0].rt - 5.1).abs() < 1e-12);
        assert_eq!(set.analytes[0].id, 1);
    }

    #[test]
    fn test_non_positive_signal_is_ignored() {
        let targets = vec![target(1, 0, 100.0, 5.0)];
        let obs = vec![Observation::new(100.0, 5.0, 0.0), Observation::new(100.0, 5.1, -3.0)];
        let set = CandidateSet::generate(&targets, &obs);
        assert!(set.is_empty());
    }

    #[test]
    fn test_nan_coordinates_are_skipped() {
        let targets = vec![target(1, 0, 100.0, 5.0), target(1, 1, 120.0, 5.0)];
        let obs = vec![
            Observation::new(100.0, -f64::NAN, 10.0),
            Observation::new(120.0, f64::NAN, 10.0),
            Observation::new(f64::NAN, 5.0, 10.0),
            Observation::new(100.0, 4.9, 10.0),
            Observation::new(120.0, 5.1, 10.0),
        ];
        let set = CandidateSet::generate(&targets, &obs);
        assert_eq!(set.len(), 2);
        assert_eq!(set.fragments.len(), 2);
        assert!(set.observations.iter().all(|o| o.rt.is_finite() && o.mz.is_finite()));
    }

    #[test]
    fn test_duplicate_points_collapse() {
        let targets = vec![target(1, 0, 100.0, 5.0)];
        let obs = vec![Observation::new(100.0, 5.0, 4.0), Observation::new(100.0, 5.0, 9.0)];
        let set = CandidateSet::generate(&targets, &obs);
        assert_eq!(set.len(), 1);
        assert_eq!(set.observations.len(), 1);
        assert!(set.observations[0].signal == 4.0);
    }

    #[test]
    fn test_observations_of_analyte() {
        let targets = vec![target(1, 0, 100.0, 5.0), target(1, 1, 120.0, 5.0), target(2, 0, 300.0, 9.0)];
        let obs = vec![
            Observation::new(100.0, 5.0, 1.0),
            Observation::new(120.0, 5.1, 1.0),
            Observation::new(300.0, 9.0, 1.0),
        ];
        let set = CandidateSet::generate(&targets, &obs);
        let a = set.analyte_of(0);
        assert_eq!(set.observations_of_analyte(a), vec![0, 1]);
        assert!(set.score_of(0, 0).is_some());
        assert!(set.score_of(0, 2).is_none());
    }
}
