//! Discrete factors over [`VarId`] scopes.
//!
//! Values are stored row-major: the last variable in the scope varies
//! fastest. All state indexes are positions within a variable's state
//! space, not raw observed values.

use smallvec::SmallVec;

use crate::errors::{Result, SweepError};
use crate::network::dag::VarId;

type Scope = SmallVec<[VarId; 4]>;
type Cards = SmallVec<[usize; 4]>;

#[derive(Debug, Clone, PartialEq)]
pub struct Factor {
    scope: Scope,
    cards: Cards,
    values: Vec<f64>,
}

impl Factor {
    pub fn new(scope: &[VarId], cards: &[usize], values: Vec<f64>) -> Result<Self> {
        if scope.len() != cards.len() {
            return Err(SweepError::Numerical(format!(
                "factor scope has {} variables but {} cardinalities",
                scope.len(),
                cards.len()
            )));
        }
        let expected: usize = cards.iter().product();
        if values.len() != expected {
            return Err(SweepError::Numerical(format!(
                "factor expects {} values, got {}",
                expected,
                values.len()
            )));
        }
        Ok(Self {
            scope: scope.iter().copied().collect(),
            cards: cards.iter().copied().collect(),
            values,
        })
    }

    /// The multiplicative identity: empty scope, single value 1.
    pub fn unit() -> Self {
        Self {
            scope: Scope::new(),
            cards: Cards::new(),
            values: vec![1.0],
        }
    }

    pub fn scope(&self) -> &[VarId] {
        &self.scope
    }

    pub fn cards(&self) -> &[usize] {
        &self.cards
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn contains(&self, var: VarId) -> bool {
        self.scope.contains(&var)
    }

    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    fn position(&self, var: VarId) -> Option<usize> {
        self.scope.iter().position(|&v| v == var)
    }

    fn strides(cards: &[usize]) -> Cards {
        let mut strides: Cards = SmallVec::from_elem(1, cards.len());
        for i in (0..cards.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * cards[i + 1];
        }
        strides
    }

    /// Pointwise product over the union of both scopes.
    pub fn product(&self, other: &Factor) -> Factor {
        let mut scope = self.scope.clone();
        let mut cards = self.cards.clone();
        for (&v, &c) in other.scope.iter().zip(&other.cards) {
            if !scope.contains(&v) {
                scope.push(v);
                cards.push(c);
            }
        }

        let self_strides = Self::strides(&self.cards);
        let other_strides = Self::strides(&other.cards);
        // Stride of each joint variable inside each operand, 0 when absent.
        let left: Cards = scope
            .iter()
            .map(|&v| self.position(v).map_or(0, |p| self_strides[p]))
            .collect();
        let right: Cards = scope
            .iter()
            .map(|&v| other.position(v).map_or(0, |p| other_strides[p]))
            .collect();

        let size: usize = cards.iter().product();
        let mut values = Vec::with_capacity(size);
        let mut assignment: Cards = SmallVec::from_elem(0, scope.len());
        for _ in 0..size {
            let li: usize = assignment.iter().zip(&left).map(|(a, s)| a * s).sum();
            let ri: usize = assignment.iter().zip(&right).map(|(a, s)| a * s).sum();
            values.push(self.values[li] * other.values[ri]);
            advance(&mut assignment, &cards);
        }

        Factor {
            scope,
            cards,
            values,
        }
    }

    /// Fixes `var` to `state` and drops it from the scope.
    ///
    /// A factor that does not mention `var` is returned unchanged.
    pub fn reduce(&self, var: VarId, state: usize) -> Result<Factor> {
        let Some(pos) = self.position(var) else {
            return Ok(self.clone());
        };
        if state >= self.cards[pos] {
            return Err(SweepError::Inference(format!(
                "state index {} out of range for variable {:?} with {} states",
                state, var, self.cards[pos]
            )));
        }
        let strides = Self::strides(&self.cards);
        let mut scope = self.scope.clone();
        let mut cards = self.cards.clone();
        scope.remove(pos);
        cards.remove(pos);

        let size: usize = cards.iter().product();
        let mut values = Vec::with_capacity(size);
        let mut assignment: Cards = SmallVec::from_elem(0, scope.len());
        for _ in 0..size {
            let mut idx = state * strides[pos];
            for (i, &a) in assignment.iter().enumerate() {
                let src = if i < pos { i } else { i + 1 };
                idx += a * strides[src];
            }
            values.push(self.values[idx]);
            advance(&mut assignment, &cards);
        }
        Ok(Factor {
            scope,
            cards,
            values,
        })
    }

    /// Sums `var` out of the factor.
    pub fn marginalize(&self, var: VarId) -> Factor {
        let Some(pos) = self.position(var) else {
            return self.clone();
        };
        let strides = Self::strides(&self.cards);
        let mut scope = self.scope.clone();
        let mut cards = self.cards.clone();
        scope.remove(pos);
        cards.remove(pos);

        let size: usize = cards.iter().product();
        let mut values = Vec::with_capacity(size);
        let mut assignment: Cards = SmallVec::from_elem(0, scope.len());
        for _ in 0..size {
            let mut base = 0;
            for (i, &a) in assignment.iter().enumerate() {
                let src = if i < pos { i } else { i + 1 };
                base += a * strides[src];
            }
            let sum: f64 = (0..self.cards[pos])
                .map(|s| self.values[base + s * strides[pos]])
                .sum();
            values.push(sum);
            advance(&mut assignment, &cards);
        }
        Factor {
            scope,
            cards,
            values,
        }
    }

    /// Scales values to sum to one.
    pub fn normalize(&self) -> Result<Factor> {
        let total = self.total();
        if !total.is_finite() || total <= 0.0 {
            return Err(SweepError::Numerical(format!(
                "cannot normalize factor with total mass {}",
                total
            )));
        }
        Ok(Factor {
            scope: self.scope.clone(),
            cards: self.cards.clone(),
            values: self.values.iter().map(|v| v / total).collect(),
        })
    }
}

/// Odometer increment over a mixed-radix assignment, last digit fastest.
fn advance(assignment: &mut [usize], cards: &[usize]) {
    for i in (0..assignment.len()).rev() {
        assignment[i] += 1;
        if assignment[i] < cards[i] {
            return;
        }
        assignment[i] = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const X: VarId = VarId(0);
    const Y: VarId = VarId(1);
    const Z: VarId = VarId(2);

    fn assert_values(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-12, "expected {:?}, got {:?}", expected, actual);
        }
    }

    #[test]
    fn product_of_disjoint_scopes_is_outer_product() {
        let fx = Factor::new(&[X], &[2], vec![0.2, 0.8]).unwrap();
        let fy = Factor::new(&[Y], &[3], vec![1.0, 2.0, 3.0]).unwrap();
        let joint = fx.product(&fy);
        assert_eq!(joint.scope(), &[X, Y]);
        assert_values(joint.values(), &[0.2, 0.4, 0.6, 0.8, 1.6, 2.4]);
    }

    #[test]
    fn product_aligns_shared_variables() {
        // f(X, Y) * g(Y, Z)
        let f = Factor::new(&[X, Y], &[2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let g = Factor::new(&[Y, Z], &[2, 2], vec![10.0, 20.0, 30.0, 40.0]).unwrap();
        let h = f.product(&g);
        assert_eq!(h.scope(), &[X, Y, Z]);
        // (x, y, z): f[x,y] * g[y,z]
        assert_values(
            h.values(),
            &[10.0, 20.0, 60.0, 80.0, 30.0, 60.0, 120.0, 160.0],
        );
    }

    #[test]
    fn reduce_keeps_matching_slice() {
        let f = Factor::new(&[X, Y], &[2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let ry = f.reduce(Y, 2).unwrap();
        assert_eq!(ry.scope(), &[X]);
        assert_values(ry.values(), &[3.0, 6.0]);
        let rx = f.reduce(X, 1).unwrap();
        assert_eq!(rx.scope(), &[Y]);
        assert_values(rx.values(), &[4.0, 5.0, 6.0]);
        assert!(f.reduce(Y, 3).is_err());
        assert_eq!(f.reduce(Z, 0).unwrap(), f);
    }

    #[test]
    fn marginalize_sums_out_variable() {
        let f = Factor::new(&[X, Y], &[2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_values(f.marginalize(Y).values(), &[6.0, 15.0]);
        assert_values(f.marginalize(X).values(), &[5.0, 7.0, 9.0]);
        let scalar = f.marginalize(X).marginalize(Y);
        assert!(scalar.scope().is_empty());
        assert_values(scalar.values(), &[21.0]);
    }

    #[test]
    fn normalize_rejects_zero_mass() {
        let f = Factor::new(&[X], &[2], vec![0.0, 0.0]).unwrap();
        assert!(matches!(f.normalize(), Err(SweepError::Numerical(_))));
        let g = Factor::new(&[X], &[2], vec![1.0, 3.0]).unwrap();
        assert_values(g.normalize().unwrap().values(), &[0.25, 0.75]);
    }

    #[test]
    fn unit_is_product_identity() {
        let f = Factor::new(&[X], &[2], vec![0.3, 0.7]).unwrap();
        assert_eq!(Factor::unit().product(&f).values(), f.values());
    }
}
