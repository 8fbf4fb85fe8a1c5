//! Directed acyclic graph over named discrete variables.
//!
//! Nodes are numbered in order of first appearance in the edge list, so the
//! same edge list always produces the same [`VarId`] assignment. Parents are
//! kept in edge-list order; conditional probability tables index parent
//! configurations in that order.

use std::collections::VecDeque;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::errors::{Result, SweepError};

/// A unique identifier for a variable in a [`Dag`].
///
/// Uses u32 internally; ids are dense indexes starting at 0.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VarId(pub u32);

impl VarId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Parent list of a single node. Small networks rarely exceed four parents.
pub type Parents = SmallVec<[VarId; 4]>;

/// The causal structure of a Bayesian network.
#[derive(Debug, Clone)]
pub struct Dag {
    names: Vec<Arc<str>>,
    index: FxHashMap<Arc<str>, VarId>,
    parents: Vec<Parents>,
    edges: Vec<(VarId, VarId)>,
    topo: Vec<VarId>,
}

impl Dag {
    /// Builds a DAG from `(parent, child)` pairs.
    ///
    /// Rejects self-loops, duplicate edges, and cycles.
    pub fn from_edges(edges: &[(&str, &str)]) -> Result<Self> {
        let mut dag = Dag {
            names: Vec::new(),
            index: FxHashMap::default(),
            parents: Vec::new(),
            edges: Vec::with_capacity(edges.len()),
            topo: Vec::new(),
        };

        for &(src, dst) in edges {
            if src == dst {
                return Err(SweepError::Structure(format!("self-loop on '{}'", src)));
            }
            let s = dag.intern(src);
            let d = dag.intern(dst);
            if dag.edges.contains(&(s, d)) {
                return Err(SweepError::Structure(format!(
                    "duplicate edge '{}' -> '{}'",
                    src, dst
                )));
            }
            dag.edges.push((s, d));
            dag.parents[d.index()].push(s);
        }

        dag.topo = dag.compute_topological_order()?;
        Ok(dag)
    }

    fn intern(&mut self, name: &str) -> VarId {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = VarId(self.names.len() as u32);
        let name: Arc<str> = Arc::from(name);
        self.names.push(name.clone());
        self.index.insert(name, id);
        self.parents.push(Parents::new());
        id
    }

    /// Kahn's algorithm; ties broken by ascending [`VarId`] for determinism.
    fn compute_topological_order(&self) -> Result<Vec<VarId>> {
        let n = self.names.len();
        let mut in_degree: Vec<usize> = self.parents.iter().map(|p| p.len()).collect();
        let mut children: Vec<Vec<VarId>> = vec![Vec::new(); n];
        for &(s, d) in &self.edges {
            children[s.index()].push(d);
        }

        let mut ready: VecDeque<VarId> = (0..n as u32)
            .map(VarId)
            .filter(|v| in_degree[v.index()] == 0)
            .collect();
        let mut order = Vec::with_capacity(n);

        while let Some(v) = ready.pop_front() {
            order.push(v);
            for &c in &children[v.index()] {
                in_degree[c.index()] -= 1;
                if in_degree[c.index()] == 0 {
                    ready.push_back(c);
                }
            }
        }

        if order.len() != n {
            let stuck: Vec<&str> = (0..n)
                .filter(|&i| in_degree[i] > 0)
                .map(|i| self.names[i].as_ref())
                .collect();
            return Err(SweepError::Structure(format!(
                "graph contains a cycle through {:?}",
                stuck
            )));
        }
        Ok(order)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Variable ids in first-appearance order.
    pub fn nodes(&self) -> impl Iterator<Item = VarId> + '_ {
        (0..self.names.len() as u32).map(VarId)
    }

    pub fn name(&self, id: VarId) -> &str {
        &self.names[id.index()]
    }

    pub fn id(&self, name: &str) -> Option<VarId> {
        self.index.get(name).copied()
    }

    pub fn parents(&self, id: VarId) -> &[VarId] {
        &self.parents[id.index()]
    }

    pub fn edges(&self) -> &[(VarId, VarId)] {
        &self.edges
    }

    /// Parents always precede their children.
    pub fn topological_order(&self) -> &[VarId] {
        &self.topo
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nodes_follow_first_appearance() {
        let dag = Dag::from_edges(&[("F", "A"), ("F", "M"), ("A", "M")]).unwrap();
        let names: Vec<&str> = dag.nodes().map(|v| dag.name(v)).collect();
        assert_eq!(names, vec!["F", "A", "M"]);
        assert_eq!(dag.edges().len(), 3);
    }

    #[test]
    fn parents_keep_edge_order() {
        let dag = Dag::from_edges(&[("F", "A"), ("F", "M"), ("A", "M")]).unwrap();
        let m = dag.id("M").unwrap();
        let parents: Vec<&str> = dag.parents(m).iter().map(|&p| dag.name(p)).collect();
        assert_eq!(parents, vec!["F", "A"]);
        assert!(dag.parents(dag.id("F").unwrap()).is_empty());
    }

    #[test]
    fn topological_order_puts_parents_first() {
        let dag = Dag::from_edges(&[("A", "M"), ("F", "A"), ("F", "M")]).unwrap();
        let order: Vec<&str> = dag
            .topological_order()
            .iter()
            .map(|&v| dag.name(v))
            .collect();
        assert_eq!(order, vec!["F", "A", "M"]);
    }

    #[test]
    fn rejects_cycles() {
        let err = Dag::from_edges(&[("X", "Y"), ("Y", "Z"), ("Z", "X")]).unwrap_err();
        assert!(matches!(err, SweepError::Structure(_)));
    }

    #[test]
    fn rejects_self_loops_and_duplicates() {
        assert!(matches!(
            Dag::from_edges(&[("X", "X")]),
            Err(SweepError::Structure(_))
        ));
        assert!(matches!(
            Dag::from_edges(&[("X", "Y"), ("X", "Y")]),
            Err(SweepError::Structure(_))
        ));
    }
}
