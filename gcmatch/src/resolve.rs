//! Per-sample resolution entry points.
//!
//! Phases run strictly in order on state owned by the call: candidate
//! generation, optional similarity seeding, first shot, second shot, merge.

use log::{debug, info};

use crate::algorithm::first_shot::run_first_shot;
use crate::algorithm::merge::{merge_matches, MatchRecord};
use crate::algorithm::second_shot::run_second_shot;
use crate::algorithm::shift::{estimate_rt_shift, shift_targets};
use crate::algorithm::similarity::run_similarity_seed;
use crate::algorithm::state::MatchingState;
use crate::config::ResolveConfig;
use crate::data::candidate::CandidateSet;
use crate::data::observation::Observation;
use crate::data::target::TargetFragment;
use crate::error::{ResolveError, Result};

/// Result of resolving one sample.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolution {
    /// No observation fell inside any target window.
    NoCandidates,
    /// Matching ran; `records` may still be empty if everything was filtered.
    Resolved {
        records: Vec<MatchRecord>,
        drt_bound: f64,
        first_shot_passes: usize,
    },
}

impl Resolution {
    pub fn records(&self) -> &[MatchRecord] {
        match self {
            Resolution::NoCandidates => &[],
            Resolution::Resolved { records, .. } => records,
        }
    }

    pub fn into_records(self) -> Vec<MatchRecord> {
        match self {
            Resolution::NoCandidates => Vec::new(),
            Resolution::Resolved { records, .. } => records,
        }
    }

    pub fn is_no_candidates(&self) -> bool {
        matches!(self, Resolution::NoCandidates)
    }
}

/// Resolution after an optional retention-time shift correction.
#[derive(Clone, Debug, PartialEq)]
pub struct ShiftedResolution {
    pub resolution: Resolution,
    /// Shift applied to the target windows, 0 when none was estimated.
    pub rt_shift: f64,
}

/// Resolve the target fragments against one sample's observations.
///
/// # Arguments
///
/// * `targets` - target fragments with tolerance windows
/// * `observations` - detected peaks of the sample; non-positive signal is ignored
/// * `config` - resolution parameters
///
/// # Returns
///
/// * `Resolution::NoCandidates` if nothing fell inside a window, otherwise
///   one record per matched fragment in candidate order
pub fn resolve_sample(
    targets: &[TargetFragment],
    observations: &[Observation],
    config: &ResolveConfig,
) -> Result<Resolution> {
    if targets.is_empty() {
        return Err(ResolveError::NoTargets);
    }
    if observations.is_empty() {
        return Err(ResolveError::NoObservations);
    }
    config.validate()?;

    let mut set = CandidateSet::generate(targets, observations);
    if set.is_empty() {
        info!("no candidates among {} observations", observations.len());
        return Ok(Resolution::NoCandidates);
    }
    debug!(
        "{} candidates over {} fragments and {} observations",
        set.len(),
        set.fragments.len(),
        set.observations.len()
    );

    let mut state = MatchingState::new(set.fragments.len(), set.observations.len(), set.analytes.len());

    if config.similarity_seed {
        run_similarity_seed(&mut set, &mut state);
    }
    let first = run_first_shot(&mut set, &mut state, config);
    run_second_shot(&set, &mut state, first.drt_bound, config.drt_max);
    debug_assert!(state.is_consistent());

    Ok(Resolution::Resolved {
        records: merge_matches(&set, &state),
        drt_bound: first.drt_bound,
        first_shot_passes: first.passes,
    })
}

/// Resolve once, estimate a scalar rt shift from the result, and resolve
/// again with target windows re-centred on the shifted expected rt.
///
/// Falls back to the first resolution when shifting is disabled or no
/// analyte has enough matched fragments to estimate a shift.
pub fn resolve_with_shift(
    targets: &[TargetFragment],
    observations: &[Observation],
    config: &ResolveConfig,
) -> Result<ShiftedResolution> {
    let first = resolve_sample(targets, observations, config)?;
    if !config.shift.enabled {
        return Ok(ShiftedResolution { resolution: first, rt_shift: 0.0 });
    }

    match estimate_rt_shift(first.records(), config.shift.min_fragments) {
        Some(rt_shift) => {
            info!("rt shift {:.4}", rt_shift);
            let shifted = shift_targets(targets, config.shift.rt_half_width, rt_shift);
            let resolution = resolve_sample(&shifted, observations, config)?;
            Ok(ShiftedResolution { resolution, rt_shift })
        }
        None => Ok(ShiftedResolution { resolution: first, rt_shift: 0.0 }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::reference::refresh;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::HashSet;

    fn target(id: u32, subid: u32, mz: f64, rt: f64) -> TargetFragment {
        TargetFragment::new(id, subid, mz, rt, (mz - 0.01, mz + 0.01), (rt - 0.3, rt + 0.3))
    }

    fn no_shift() -> ResolveConfig {
        let mut config = ResolveConfig::default();
        config.shift.enabled = false;
        config
    }

    #[test]
    fn test_empty_inputs_fail_fast() {
        let obs = vec![Observation::new(100.0, 5.0, 1.0)];
        let targets = vec![target(1, 0, 100.0, 5.0)];
        assert_eq!(resolve_sample(&[], &obs, &no_shift()), Err(ResolveError::NoTargets));
        assert_eq!(resolve_sample(&targets, &[], &no_shift()), Err(ResolveError::NoObservations));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let obs = vec![Observation::new(100.0, 5.0, 1.0)];
        let targets = vec![target(1, 0, 100.0, 5.0)];
        let config = ResolveConfig { drt_max: -1.0, ..no_shift() };
        assert!(matches!(
            resolve_sample(&targets, &obs, &config),
            Err(ResolveError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_no_candidate_sample() {
        let targets = vec![target(1, 0, 100.0, 5.0)];
        let obs = vec![Observation::new(100.0, 9.0, 1.0), Observation::new(300.0, 5.0, 1.0)];
        let resolution = resolve_sample(&targets, &obs, &no_shift()).unwrap();
        assert!(resolution.is_no_candidates());
        assert!(resolution.records().is_empty());
    }

    #[test]
    fn test_three_analytes_two_fragments() {
        let mut targets = Vec::new();
        let mut obs = Vec::new();
        for id in 0..3u32 {
            let rt = 4.0 + 1.5 * id as f64;
            for subid in 0..2u32 {
                let mz = 150.0 + 20.0 * id as f64 + 5.0 * subid as f64;
                targets.push(target(id, subid, mz, rt));
                obs.push(Observation::new(mz, rt + 0.02, 1000.0 + subid as f64));
            }
        }
        let resolution = resolve_sample(&targets, &obs, &no_shift()).unwrap();
        match &resolution {
            Resolution::Resolved { records, first_shot_passes, .. } => {
                assert_eq!(records.len(), 6);
                assert!(*first_shot_passes <= 5);
                assert!(records.iter().all(|r| r.deviation == 0.0));
            }
            Resolution::NoCandidates => panic!("expected candidates"),
        }
    }

    fn overlapping() -> (Vec<TargetFragment>, Vec<Observation>) {
        // the point at (150, 5.004) is reachable from both analytes; analyte 1
        // sits on it, analyte 2 is centred 0.054 away
        let targets = vec![
            target(1, 0, 100.0, 5.00),
            target(1, 1, 150.0, 5.00),
            target(2, 0, 200.0, 4.95),
            target(2, 1, 150.0, 4.95),
        ];
        let obs = vec![
            Observation::new(100.0, 5.004, 10.0),
            Observation::new(150.0, 5.004, 20.0),
            Observation::new(200.0, 4.950, 30.0),
        ];
        (targets, obs)
    }

    #[test]
    fn test_closer_fragment_wins_shared_point() {
        for seed in [false, true] {
            let config = ResolveConfig { similarity_seed: seed, ..no_shift() };
            let (targets, obs) = overlapping();
            let records = resolve_sample(&targets, &obs, &config).unwrap().into_records();

            let holder: Vec<_> = records.iter().filter(|r| r.observed_mz == 150.0).collect();
            assert_eq!(holder.len(), 1);
            assert_eq!((holder[0].id, holder[0].subid), (1, 1));
            assert!(!records.iter().any(|r| r.id == 2 && r.subid == 1));
            assert_eq!(records.len(), 3);
        }
    }

    #[test]
    fn test_shift_recovers_displaced_sample() {
        // every observation runs 0.25 late; the default window only just
        // contains them, the re-centred window is tight around them
        let mut targets = Vec::new();
        let mut obs = Vec::new();
        for subid in 0..3u32 {
            let mz = 100.0 + 10.0 * subid as f64;
            targets.push(target(1, subid, mz, 5.0));
            obs.push(Observation::new(mz, 5.25, 1.0));
        }
        let shifted = resolve_with_shift(&targets, &obs, &ResolveConfig::default()).unwrap();
        assert!((shifted.rt_shift - 0.25).abs() < 1e-9);
        assert_eq!(shifted.resolution.records().len(), 3);
    }

    #[test]
    fn test_shift_disabled_reports_zero() {
        let (targets, obs) = overlapping();
        let shifted = resolve_with_shift(&targets, &obs, &no_shift()).unwrap();
        assert!(shifted.rt_shift == 0.0);
    }

    #[test]
    fn test_bijection_holds_after_every_phase() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..25 {
            let mut targets = Vec::new();
            for id in 0..6u32 {
                let rt = rng.gen_range(2.0..10.0);
                for subid in 0..rng.gen_range(1..4u32) {
                    let mz = 100.0 + rng.gen_range(0..8) as f64;
                    targets.push(target(id, subid, mz, rt + rng.gen_range(-0.02..0.02)));
                }
            }
            let obs: Vec<Observation> = (0..60)
                .map(|_| {
                    Observation::new(
                        100.0 + rng.gen_range(0..8) as f64,
                        rng.gen_range(2.0..10.0),
                        rng.gen_range(-1.0..100.0),
                    )
                })
                .collect();

            let config = no_shift();
            let mut set = CandidateSet::generate(&targets, &obs);
            if set.is_empty() {
                continue;
            }
            let mut state = MatchingState::new(set.fragments.len(), set.observations.len(), set.analytes.len());
            run_similarity_seed(&mut set, &mut state);
            assert!(state.is_consistent());
            let first = run_first_shot(&mut set, &mut state, &config);
            assert!(state.is_consistent());
            run_second_shot(&set, &mut state, first.drt_bound, config.drt_max);
            assert!(state.is_consistent());

            let before = state.clone();
            refresh(&set, &mut state, config.drt_max);
            assert_eq!(before, state);

            let records = merge_matches(&set, &state);
            let fragments: HashSet<(u32, u32)> = records.iter().map(|r| (r.id, r.subid)).collect();
            assert_eq!(fragments.len(), records.len());
            assert!(records.iter().all(|r| r.signal > 0.0));
        }
    }
}
