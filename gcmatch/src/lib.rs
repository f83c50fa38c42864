pub mod config;
pub mod error;
pub mod resolve;

// data module
pub mod data {
    pub mod target;
    pub mod observation;
    pub mod candidate;
}

// algorithm module
pub mod algorithm {
    pub mod dtw;
    pub mod state;
    pub mod similarity;
    pub mod reference;
    pub mod first_shot;
    pub mod second_shot;
    pub mod merge;
    pub mod shift;
}

pub use config::{ResolveConfig, ShiftConfig, ToleranceConfig};
pub use error::{ResolveError, Result};
pub use resolve::{resolve_sample, resolve_with_shift, Resolution, ShiftedResolution};
