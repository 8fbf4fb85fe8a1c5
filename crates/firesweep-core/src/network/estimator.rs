//! Parameter learning: conditional probability tables from observed counts.
//!
//! Two estimators are provided:
//!
//! - **MaximumLikelihood**: `P(x | pa) = N(x, pa) / N(pa)`. A parent
//!   configuration that never occurs in the data gets a uniform column rather
//!   than `0/0`.
//! - **BayesianDirichlet**: BDeu smoothing. Each cell receives
//!   `pseudo_count / (|states| · |configs|)` pseudo-observations, so every
//!   column is proper even without data.
//!
//! State spaces are taken from the data: the sorted distinct values of each
//! column. A variable observed with a single value therefore has one state.

use std::sync::Arc;

use tracing::trace;

use crate::errors::{Result, SweepError};
use crate::network::cpd::{ConditionalProbabilityTable, FittedNetwork};
use crate::network::dag::Dag;
use crate::network::table::{ObservationTable, State};

/// Parameter estimation method.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Estimator {
    /// Relative frequencies.
    #[default]
    MaximumLikelihood,
    /// Dirichlet (BDeu) smoothed frequencies with equivalent sample size `pseudo_count`.
    BayesianDirichlet { pseudo_count: f64 },
}

impl Estimator {
    /// Rejects a non-finite or non-positive `pseudo_count`.
    pub fn validate(self) -> Result<Self> {
        if let Estimator::BayesianDirichlet { pseudo_count } = self {
            if !pseudo_count.is_finite() || pseudo_count <= 0.0 {
                return Err(SweepError::Fit(format!(
                    "pseudo_count must be finite and > 0, got {}",
                    pseudo_count
                )));
            }
        }
        Ok(self)
    }
}

/// Fits one conditional probability table per DAG node from `table`.
///
/// Every DAG node must have a column of the same name. Extra columns are
/// ignored.
pub fn fit_parameters(
    dag: &Dag,
    table: &ObservationTable,
    estimator: Estimator,
) -> Result<FittedNetwork> {
    let estimator = estimator.validate()?;
    if table.is_empty() {
        return Err(SweepError::Fit(
            "cannot fit parameters from an empty table".into(),
        ));
    }

    let mut columns: Vec<&[State]> = Vec::with_capacity(dag.len());
    let mut spaces: Vec<Vec<State>> = Vec::with_capacity(dag.len());
    for var in dag.nodes() {
        let name = dag.name(var);
        let column = table.column(name).ok_or_else(|| {
            SweepError::Fit(format!("no column for network variable '{}'", name))
        })?;
        columns.push(column);
        spaces.push(table.state_space(name)?);
    }

    let mut cpds = Vec::with_capacity(dag.len());
    for var in dag.nodes() {
        let parents = dag.parents(var);
        let card = spaces[var.index()].len();
        let parent_cards: Vec<usize> = parents.iter().map(|p| spaces[p.index()].len()).collect();
        let configs: usize = parent_cards.iter().product();

        let mut counts = vec![0.0_f64; configs * card];
        for row in 0..table.len() {
            let mut config = 0;
            for (&p, &pc) in parents.iter().zip(&parent_cards) {
                config = config * pc + state_position(&spaces[p.index()], columns[p.index()][row]);
            }
            let s = state_position(&spaces[var.index()], columns[var.index()][row]);
            counts[config * card + s] += 1.0;
        }

        let values = match estimator {
            Estimator::MaximumLikelihood => maximum_likelihood(&counts, card),
            Estimator::BayesianDirichlet { pseudo_count } => {
                let alpha = pseudo_count / (card * configs) as f64;
                dirichlet_smoothed(&counts, card, alpha)
            }
        };

        trace!(
            variable = dag.name(var),
            states = card,
            configs,
            "fitted conditional probability table"
        );

        cpds.push(ConditionalProbabilityTable::new(
            var,
            Arc::from(dag.name(var)),
            spaces[var.index()].clone(),
            parents.to_vec(),
            parent_cards,
            values,
        )?);
    }

    FittedNetwork::new(dag.clone(), cpds)
}

/// Values come from the same column the space was built from, so the search
/// always succeeds.
fn state_position(space: &[State], value: State) -> usize {
    space.binary_search(&value).unwrap_or(0)
}

fn maximum_likelihood(counts: &[f64], card: usize) -> Vec<f64> {
    let mut values = Vec::with_capacity(counts.len());
    for column in counts.chunks(card) {
        let total: f64 = column.iter().sum();
        if total == 0.0 {
            values.extend(std::iter::repeat(1.0 / card as f64).take(card));
        } else {
            values.extend(column.iter().map(|c| c / total));
        }
    }
    values
}

fn dirichlet_smoothed(counts: &[f64], card: usize, alpha: f64) -> Vec<f64> {
    let mut values = Vec::with_capacity(counts.len());
    for column in counts.chunks(card) {
        let total: f64 = column.iter().sum::<f64>() + alpha * card as f64;
        values.extend(column.iter().map(|c| (c + alpha) / total));
    }
    values
}
