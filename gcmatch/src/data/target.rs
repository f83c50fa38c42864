use serde::{Deserialize, Serialize};

use crate::config::ToleranceConfig;

/// One expected analyte fragment with its tolerance windows.
///
/// Windows are closed intervals `(lower, upper)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetFragment {
    pub id: u32,
    pub subid: u32,
    pub expected_mz: f64,
    pub expected_rt: f64,
    pub mz_window: (f64, f64),
    pub rt_window: (f64, f64),
}

impl TargetFragment {
    pub fn new(
        id: u32,
        subid: u32,
        expected_mz: f64,
        expected_rt: f64,
        mz_window: (f64, f64),
        rt_window: (f64, f64),
    ) -> Self {
        TargetFragment { id, subid, expected_mz, expected_rt, mz_window, rt_window }
    }

    /// Derive both windows from the expected values.
    ///
    /// # Arguments
    ///
    /// * `tolerance` - m/z tolerance in ppm and rt half-width
    ///
    /// # Example
    ///
    /// ```
    /// use gcmatch::data::target::TargetFragment;
    /// use gcmatch::config::ToleranceConfig;
    ///
    /// let t = TargetFragment::from_expected(1, 0, 100.0, 5.0, &ToleranceConfig::default());
    /// assert!((t.mz_window.1 - 100.0006).abs() < 1e-9);
    /// assert!((t.rt_window.0 - 4.7).abs() < 1e-9);
    /// ```
    pub fn from_expected(
        id: u32,
        subid: u32,
        expected_mz: f64,
        expected_rt: f64,
        tolerance: &ToleranceConfig,
    ) -> Self {
        let dmz = expected_mz * tolerance.mz_ppm * 1e-6;
        let drt = tolerance.rt_half_width;
        TargetFragment::new(
            id,
            subid,
            expected_mz,
            expected_rt,
            (expected_mz - dmz, expected_mz + dmz),
            (expected_rt - drt, expected_rt + drt),
        )
    }

    /// Copy of this fragment with the rt window re-centred on `expected_rt + shift`.
    pub fn recentered(&self, rt_half_width: f64, shift: f64) -> Self {
        let centre = self.expected_rt + shift;
        TargetFragment {
            rt_window: (centre - rt_half_width, centre + rt_half_width),
            ..self.clone()
        }
    }

    #[inline]
    pub fn contains(&self, mz: f64, rt: f64) -> bool {
        mz >= self.mz_window.0
            && mz <= self.mz_window.1
            && rt >= self.rt_window.0
            && rt <= self.rt_window.1
    }
}
