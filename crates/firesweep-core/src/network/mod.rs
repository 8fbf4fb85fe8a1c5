//! Discrete Bayesian networks.
//!
//! This module provides:
//! - **dag**: graph shape built from an edge list, with cycle detection
//! - **table**: column-major observation tables
//! - **estimator**: maximum-likelihood and Dirichlet parameter learning
//! - **cpd**: conditional probability tables and the fitted network
//! - **factor**: discrete factor algebra (product, reduce, marginalize)
//! - **inference**: exact posterior queries by variable elimination

pub mod cpd;
pub mod dag;
pub mod estimator;
pub mod factor;
pub mod inference;
pub mod table;

pub use cpd::{ConditionalProbabilityTable, FittedNetwork};
pub use dag::{Dag, VarId};
pub use estimator::{fit_parameters, Estimator};
pub use factor::Factor;
pub use inference::{variable_elimination, Evidence, Posterior};
pub use table::{ObservationTable, State};
