//! The fit/infer seam between the sweep and a Bayesian network library.
//!
//! The sweep only ever calls [`NetworkBackend::fit`] and
//! [`NetworkBackend::infer`], so tests can substitute a stub and exercise the
//! sweep loop without fitting anything.

use crate::errors::Result;
use crate::network::{
    fit_parameters, variable_elimination, Dag, Estimator, Evidence, FittedNetwork,
    ObservationTable, Posterior,
};

pub trait NetworkBackend {
    /// Fitted model produced by [`fit`](Self::fit).
    type Model;

    /// Estimates the parameters of `dag` from `table`.
    fn fit(&self, dag: &Dag, table: &ObservationTable) -> Result<Self::Model>;

    /// Posterior of `query` given point `evidence`.
    fn infer(&self, model: &Self::Model, query: &str, evidence: &Evidence) -> Result<Posterior>;
}

/// Tabular fitting plus exact variable elimination.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExactBackend {
    pub estimator: Estimator,
}

impl ExactBackend {
    pub fn new(estimator: Estimator) -> Self {
        Self { estimator }
    }

    pub fn maximum_likelihood() -> Self {
        Self::new(Estimator::MaximumLikelihood)
    }
}

impl NetworkBackend for ExactBackend {
    type Model = FittedNetwork;

    fn fit(&self, dag: &Dag, table: &ObservationTable) -> Result<FittedNetwork> {
        fit_parameters(dag, table, self.estimator)
    }

    fn infer(&self, model: &FittedNetwork, query: &str, evidence: &Evidence) -> Result<Posterior> {
        variable_elimination(model, query, evidence)
    }
}
