//! Exact inference by variable elimination.

use std::sync::Arc;

use tracing::trace;

use crate::errors::{Result, SweepError};
use crate::network::cpd::FittedNetwork;
use crate::network::dag::VarId;
use crate::network::factor::Factor;
use crate::network::table::State;

/// Point evidence: observed values for a set of variables.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Evidence {
    assignments: Vec<(Arc<str>, State)>,
}

impl Evidence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the observation for `name`.
    pub fn with(mut self, name: &str, value: State) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: State) {
        match self.assignments.iter_mut().find(|(n, _)| n.as_ref() == name) {
            Some(slot) => slot.1 = value,
            None => self.assignments.push((Arc::from(name), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<State> {
        self.assignments
            .iter()
            .find(|(n, _)| n.as_ref() == name)
            .map(|&(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, State)> {
        self.assignments.iter().map(|(n, v)| (n.as_ref(), *v))
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

impl<'a> FromIterator<(&'a str, State)> for Evidence {
    fn from_iter<I: IntoIterator<Item = (&'a str, State)>>(iter: I) -> Self {
        let mut evidence = Evidence::new();
        for (name, value) in iter {
            evidence.set(name, value);
        }
        evidence
    }
}

/// A normalized distribution over one variable's states.
///
/// `values[i]` is the probability of `states[i]`; states are in ascending
/// order, so for a binary `{0, 1}` variable `values[1]` is `P(X = 1)`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Posterior {
    pub variable: Arc<str>,
    pub states: Vec<State>,
    pub values: Vec<f64>,
}

impl Posterior {
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Probability at a position of the value vector.
    pub fn value_at(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    /// Probability of an observed state value.
    pub fn probability_of(&self, state: State) -> Option<f64> {
        self.states
            .binary_search(&state)
            .ok()
            .map(|i| self.values[i])
    }
}

/// Computes `P(query | evidence)` exactly.
///
/// Fails if the query or an evidence variable is unknown, if the query is
/// itself observed, if an observed value is outside the variable's fitted
/// state space, or if the evidence has zero probability under the model.
pub fn variable_elimination(
    model: &FittedNetwork,
    query: &str,
    evidence: &Evidence,
) -> Result<Posterior> {
    let dag = model.dag();
    let query_id = dag
        .id(query)
        .ok_or_else(|| SweepError::Inference(format!("unknown query variable '{}'", query)))?;
    if evidence.get(query).is_some() {
        return Err(SweepError::Inference(format!(
            "query variable '{}' is also observed",
            query
        )));
    }

    let mut observed: Vec<(VarId, usize)> = Vec::with_capacity(evidence.len());
    for (name, value) in evidence.iter() {
        let var = dag.id(name).ok_or_else(|| {
            SweepError::Inference(format!("unknown evidence variable '{}'", name))
        })?;
        let cpd = model.cpd(var);
        let state = cpd.state_index(value).ok_or_else(|| {
            SweepError::Inference(format!(
                "evidence {}={} is outside the fitted states {:?}",
                name, value, cpd.states
            ))
        })?;
        observed.push((var, state));
    }

    let mut factors = Vec::with_capacity(dag.len());
    for cpd in model.cpds() {
        let mut factor = cpd.to_factor()?;
        for &(var, state) in &observed {
            factor = factor.reduce(var, state)?;
        }
        factors.push(factor);
    }

    let mut hidden: Vec<VarId> = dag
        .nodes()
        .filter(|&v| v != query_id && !observed.iter().any(|&(o, _)| o == v))
        .collect();

    while !hidden.is_empty() {
        let (slot, var) = pick_elimination_variable(&hidden, &factors);
        hidden.swap_remove(slot);
        trace!(variable = dag.name(var), "eliminating");

        let (touching, rest): (Vec<Factor>, Vec<Factor>) =
            factors.into_iter().partition(|f| f.contains(var));
        factors = rest;
        let joint = touching
            .iter()
            .fold(Factor::unit(), |acc, f| acc.product(f));
        factors.push(joint.marginalize(var));
    }

    let mut result = factors
        .iter()
        .fold(Factor::unit(), |acc, f| acc.product(f));
    let leftover: Vec<VarId> = result
        .scope()
        .iter()
        .copied()
        .filter(|&v| v != query_id)
        .collect();
    for v in leftover {
        result = result.marginalize(v);
    }
    if result.scope() != [query_id].as_slice() {
        return Err(SweepError::Numerical(format!(
            "elimination did not leave a factor over '{}'",
            query
        )));
    }

    if result.total() == 0.0 {
        return Err(SweepError::Inference(format!(
            "evidence has zero probability; P({} | evidence) is undefined",
            query
        )));
    }
    let result = result.normalize()?;

    let cpd = model.cpd(query_id);
    Ok(Posterior {
        variable: cpd.name.clone(),
        states: cpd.states.clone(),
        values: result.values().to_vec(),
    })
}

/// Greedy min-size heuristic: the variable whose combined factor has the
/// fewest variables. Ties go to the lowest [`VarId`].
fn pick_elimination_variable(hidden: &[VarId], factors: &[Factor]) -> (usize, VarId) {
    let mut best = (0, hidden[0], usize::MAX);
    for (slot, &var) in hidden.iter().enumerate() {
        let mut scope: Vec<VarId> = Vec::new();
        for f in factors.iter().filter(|f| f.contains(var)) {
            for &v in f.scope() {
                if !scope.contains(&v) {
                    scope.push(v);
                }
            }
        }
        let size = scope.len();
        if size < best.2 || (size == best.2 && var < best.1) {
            best = (slot, var, size);
        }
    }
    (best.0, best.1)
}
