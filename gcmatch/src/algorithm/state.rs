//! Owned matching state of one sample's resolution run.
//!
//! The fragment ↔ observation assignment is kept as a bijection between a
//! subset of fragments and a subset of observations. All mutation goes
//! through [`MatchingState::assign`] and [`MatchingState::evict`], which
//! keep both directions and the per-fragment deviation consistent.

use crate::data::candidate::{AnalyteKey, FragmentKey, ObservationKey};

#[derive(Clone, Debug, PartialEq)]
pub struct MatchingState {
    fragment_to_observation: Vec<Option<ObservationKey>>,
    observation_to_fragment: Vec<Option<FragmentKey>>,
    deviation: Vec<Option<f64>>,
    irt: Vec<Option<f64>>,
}

impl MatchingState {
    pub fn new(n_fragments: usize, n_observations: usize, n_analytes: usize) -> Self {
        MatchingState {
            fragment_to_observation: vec![None; n_fragments],
            observation_to_fragment: vec![None; n_observations],
            deviation: vec![None; n_fragments],
            irt: vec![None; n_analytes],
        }
    }

    /// Pair `fragment` with `observation`.
    ///
    /// A previous observation of `fragment` is released, and a fragment
    /// currently holding `observation` is evicted. Returns the evicted
    /// holder, if any. The deviation of `fragment` is cleared; callers set
    /// it explicitly or refresh it through the estimator.
    pub fn assign(&mut self, fragment: FragmentKey, observation: ObservationKey) -> Option<FragmentKey> {
        let displaced = match self.observation_to_fragment[observation] {
            Some(holder) if holder != fragment => {
                self.evict(holder);
                Some(holder)
            }
            _ => None,
        };
        if let Some(previous) = self.fragment_to_observation[fragment] {
            self.observation_to_fragment[previous] = None;
        }
        self.fragment_to_observation[fragment] = Some(observation);
        self.observation_to_fragment[observation] = Some(fragment);
        self.deviation[fragment] = None;
        displaced
    }

    /// Unpair `fragment`, returning the observation it held.
    pub fn evict(&mut self, fragment: FragmentKey) -> Option<ObservationKey> {
        let observation = self.fragment_to_observation[fragment].take();
        if let Some(o) = observation {
            self.observation_to_fragment[o] = None;
        }
        self.deviation[fragment] = None;
        observation
    }

    #[inline]
    pub fn observation_of(&self, fragment: FragmentKey) -> Option<ObservationKey> {
        self.fragment_to_observation[fragment]
    }

    #[inline]
    pub fn holder_of(&self, observation: ObservationKey) -> Option<FragmentKey> {
        self.observation_to_fragment[observation]
    }

    #[inline]
    pub fn is_free(&self, observation: ObservationKey) -> bool {
        self.observation_to_fragment[observation].is_none()
    }

    #[inline]
    pub fn is_matched(&self, fragment: FragmentKey) -> bool {
        self.fragment_to_observation[fragment].is_some()
    }

    #[inline]
    pub fn deviation(&self, fragment: FragmentKey) -> Option<f64> {
        self.deviation[fragment]
    }

    #[inline]
    pub fn set_deviation(&mut self, fragment: FragmentKey, drt: Option<f64>) {
        self.deviation[fragment] = drt;
    }

    #[inline]
    pub fn irt(&self, analyte: AnalyteKey) -> Option<f64> {
        self.irt[analyte]
    }

    #[inline]
    pub fn set_irt(&mut self, analyte: AnalyteKey, irt: Option<f64>) {
        self.irt[analyte] = irt;
    }

    pub fn n_fragments(&self) -> usize {
        self.fragment_to_observation.len()
    }

    pub fn matched_count(&self) -> usize {
        self.fragment_to_observation.iter().filter(|o| o.is_some()).count()
    }

    /// Matched (fragment, observation) pairs in fragment order.
    pub fn matched_pairs(&self) -> impl Iterator<Item = (FragmentKey, ObservationKey)> + '_ {
        self.fragment_to_observation
            .iter()
            .enumerate()
            .filter_map(|(f, o)| o.map(|o| (f, o)))
    }

    /// Copy of the fragment → observation map, used as a fixed-point witness.
    pub fn snapshot(&self) -> Vec<Option<ObservationKey>> {
        self.fragment_to_observation.clone()
    }

    /// Check that both directions of the assignment agree.
    pub fn is_consistent(&self) -> bool {
        let forward = self.matched_pairs().all(|(f, o)| self.observation_to_fragment[o] == Some(f));
        let backward = self
            .observation_to_fragment
            .iter()
            .enumerate()
            .all(|(o, f)| f.map_or(true, |f| self.fragment_to_observation[f] == Some(o)));
        forward && backward
    }
}
