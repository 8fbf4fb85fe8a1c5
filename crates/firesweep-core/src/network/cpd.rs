//! Conditional probability tables and the fitted network that owns them.

use std::sync::Arc;

use crate::errors::{Result, SweepError};
use crate::network::dag::{Dag, VarId};
use crate::network::factor::Factor;
use crate::network::table::State;

/// Tolerance for a CPT column summing to one.
const COLUMN_SUM_TOLERANCE: f64 = 1e-9;

/// `P(variable | parents)` as a dense table.
///
/// Values are laid out with parent configurations outermost (last parent
/// fastest) and the variable's own state innermost, so each consecutive run
/// of `states.len()` values is one conditional distribution.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConditionalProbabilityTable {
    pub variable: VarId,
    pub name: Arc<str>,
    pub states: Vec<State>,
    pub parents: Vec<VarId>,
    pub parent_cards: Vec<usize>,
    pub values: Vec<f64>,
}

impl ConditionalProbabilityTable {
    /// Builds a table and checks every conditional distribution is proper.
    pub fn new(
        variable: VarId,
        name: Arc<str>,
        states: Vec<State>,
        parents: Vec<VarId>,
        parent_cards: Vec<usize>,
        values: Vec<f64>,
    ) -> Result<Self> {
        let card = states.len();
        if card == 0 {
            return Err(SweepError::Fit(format!("variable '{}' has no states", name)));
        }
        let configs: usize = parent_cards.iter().product();
        if values.len() != configs * card {
            return Err(SweepError::Fit(format!(
                "table for '{}' expects {} values, got {}",
                name,
                configs * card,
                values.len()
            )));
        }
        for (config, column) in values.chunks(card).enumerate() {
            if column.iter().any(|p| !p.is_finite() || *p < 0.0) {
                return Err(SweepError::Numerical(format!(
                    "table for '{}' has an invalid probability in configuration {}",
                    name, config
                )));
            }
            let sum: f64 = column.iter().sum();
            if (sum - 1.0).abs() > COLUMN_SUM_TOLERANCE {
                return Err(SweepError::Numerical(format!(
                    "table for '{}' configuration {} sums to {}",
                    name, config, sum
                )));
            }
        }
        Ok(Self {
            variable,
            name,
            states,
            parents,
            parent_cards,
            values,
        })
    }

    pub fn cardinality(&self) -> usize {
        self.states.len()
    }

    pub fn num_parent_configs(&self) -> usize {
        self.parent_cards.iter().product()
    }

    /// Position of an observed value in this variable's state space.
    pub fn state_index(&self, value: State) -> Option<usize> {
        self.states.binary_search(&value).ok()
    }

    /// `P(variable = states[state] | parent configuration)`.
    pub fn probability(&self, parent_config: usize, state: usize) -> f64 {
        self.values[parent_config * self.cardinality() + state]
    }

    /// The table as a factor over `parents ++ [variable]`.
    pub fn to_factor(&self) -> Result<Factor> {
        let mut scope = self.parents.clone();
        scope.push(self.variable);
        let mut cards = self.parent_cards.clone();
        cards.push(self.cardinality());
        Factor::new(&scope, &cards, self.values.clone())
    }
}

/// A DAG together with one fitted table per node, indexed by [`VarId`].
#[derive(Debug, Clone)]
pub struct FittedNetwork {
    dag: Dag,
    cpds: Vec<ConditionalProbabilityTable>,
}

impl FittedNetwork {
    pub fn new(dag: Dag, cpds: Vec<ConditionalProbabilityTable>) -> Result<Self> {
        if cpds.len() != dag.len() {
            return Err(SweepError::Fit(format!(
                "network has {} nodes but {} tables",
                dag.len(),
                cpds.len()
            )));
        }
        for (i, cpd) in cpds.iter().enumerate() {
            if cpd.variable.index() != i || cpd.parents.as_slice() != dag.parents(cpd.variable) {
                return Err(SweepError::Fit(format!(
                    "table for '{}' does not match the graph",
                    cpd.name
                )));
            }
        }
        Ok(Self { dag, cpds })
    }

    pub fn dag(&self) -> &Dag {
        &self.dag
    }

    pub fn cpd(&self, var: VarId) -> &ConditionalProbabilityTable {
        &self.cpds[var.index()]
    }

    pub fn cpd_by_name(&self, name: &str) -> Option<&ConditionalProbabilityTable> {
        self.dag.id(name).map(|v| self.cpd(v))
    }

    pub fn cpds(&self) -> &[ConditionalProbabilityTable] {
        &self.cpds
    }
}
