//! # Firesweep Core
//!
//! Grid sweep over a three-node fire/alarm/mobilisation Bayesian network,
//! plus the small discrete-network library it runs on.
//!
//! - [`network`]: DAGs, observation tables, parameter learning, exact inference
//! - [`backend`]: the fit/infer interface the sweep is written against
//! - [`sweep`]: grid configuration, the sweep loop, and record output

pub mod backend;
pub mod errors;
pub mod network;
pub mod sweep;

pub use backend::{ExactBackend, NetworkBackend};
pub use errors::{Result, SweepError};
pub use network::{Dag, Estimator, Evidence, FittedNetwork, ObservationTable, Posterior};
pub use sweep::{
    run_sweep, AppendFileSink, ParamRange, RecordSink, SweepConfig, SweepParams, SweepRecord,
    SweepSummary,
};

/// Runs the configured sweep with exact inference, appending to `config.output`.
///
/// This is the whole reference run when called with [`SweepConfig::default`].
pub fn run_to_file(config: &SweepConfig) -> Result<SweepSummary> {
    config.validate()?;
    let backend = ExactBackend::new(config.estimator);
    let mut sink = AppendFileSink::open(&config.output, config.truncate)?;
    run_sweep(config, &backend, &mut sink)
}
