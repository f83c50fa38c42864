use thiserror::Error;

/// Errors surfaced by a resolution run.
///
/// Only caller contract violations end up here; degenerate data inside a run
/// (no candidates, single-fragment analytes, empty deviation distributions)
/// is recovered locally and reported through [`crate::resolve::Resolution`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    #[error("no target fragments supplied")]
    NoTargets,

    #[error("no observations supplied for sample")]
    NoObservations,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, ResolveError>;
