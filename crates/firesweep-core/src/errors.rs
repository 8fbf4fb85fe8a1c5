//! Error types for network construction, fitting, inference, and the sweep.

use thiserror::Error;

/// Errors that can occur while building a network, fitting it, querying it,
/// or writing sweep records.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// without breaking changes. Library code never panics on bad input; every
/// public operation returns `Result<T, SweepError>`.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SweepError {
    /// Invalid graph shape (self-loop, duplicate edge, cycle).
    #[error("structure error: {0}")]
    Structure(String),

    /// Malformed observation table (row width mismatch, unknown column).
    #[error("data error: {0}")]
    Data(String),

    /// Parameter fitting could not produce a valid conditional probability table.
    #[error("fit error: {0}")]
    Fit(String),

    /// Invalid query or evidence, or evidence with zero probability.
    #[error("inference error: {0}")]
    Inference(String),

    /// Numerical stability error (NaN/Inf, invalid probabilities).
    #[error("numerical error: {0}")]
    Numerical(String),

    /// Invalid sweep configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Failure writing the output file.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SweepError>;
