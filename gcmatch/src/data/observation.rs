use serde::{Deserialize, Serialize};

/// One detected peak of a sample.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub mz: f64,
    pub rt: f64,
    pub signal: f64,
}

impl Observation {
    pub fn new(mz: f64, rt: f64, signal: f64) -> Self {
        Observation { mz, rt, signal }
    }

    /// Peaks without positive signal never take part in matching.
    #[inline]
    pub fn has_signal(&self) -> bool {
        self.signal > 0.0
    }
}
