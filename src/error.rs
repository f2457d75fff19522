use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the eigenvalue engine.
///
/// Every variant except the I/O and parsing ones is an invariant violation:
/// the driver never retries, it hands the error back to the caller and the run
/// ends there.
#[derive(Debug, Error)]
pub enum Error {
    /// A bank or queue could not grow its storage.
    #[error("could not allocate {requested} particle slots for {what}")]
    AllocationFailure { what: &'static str, requested: usize },

    /// `dequeue` was called on a queue holding no particles.
    #[error("can't dequeue particle from empty queue")]
    EmptyQueue,

    /// Invalid user or API parameter.
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    /// A particle position fell outside the geometry it is binned against.
    #[error("out of bounds: {0}")]
    OutOfBounds(String),

    /// Malformed input that is not JSON (e.g. a saved source bank of the wrong size).
    #[error("parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
