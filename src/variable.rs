#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use crate::error::{ModelError, Result};
use crate::operations::BinaryOperation;
use crate::quantity::Quantity;
use crate::random::RandomSource;
use crate::run::SimulationRun;
use crate::traits::CustomVariable;
use crate::unit::Unit;
use crate::var_id::VarId;
use std::fmt;
use std::sync::Arc;

/// Coarse classification of a variable, shown next to value-of-information results.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VarKind {
    /// Drawn directly from a defined, non-fixed distribution.
    Distribution,
    /// Built from other random variables.
    Combined,
    /// A fixed value.
    Fixed,
    /// Drawn from a distribution whose family is itself uncertain.
    Uncertain,
}

impl VarKind {
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            VarKind::Distribution => "D",
            VarKind::Combined => "C",
            VarKind::Fixed => "F",
            VarKind::Uncertain => "U",
        }
    }
}

impl fmt::Display for VarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A composable node that yields a [`Quantity`] per observation.
///
/// Variables form an immutable expression DAG; clones share the same node. Observation is
/// pull-based: a node observes its operands against the same random source and run. Only
/// persistent nodes remember anything, and only inside the [`SimulationRun`] they are given.
///
/// # Example
/// ```rust
/// use infoecon_rs::{RandomSource, RandomVariable, SimulationRun, Unit};
///
/// let hours = RandomVariable::normal_95(10.0, 20.0, Unit::of("h")).unwrap();
/// let rate = RandomVariable::fixed_value(50.0, Unit::of("EUR").div(&Unit::of("h")));
/// let cost = hours * rate;
///
/// let mut rng = RandomSource::seeded(1);
/// let q = cost.observe(&mut rng, &mut SimulationRun::new()).unwrap();
/// assert_eq!(q.unit().to_string(), "EUR");
/// ```
#[derive(Clone)]
pub struct RandomVariable {
    node: Arc<Node>,
    unit: Unit,
}

pub(crate) enum Node {
    Fixed(Quantity),
    Normal {
        mean: f64,
        sd: f64,
        unit: Unit,
    },
    LogNormal {
        mean: f64,
        sd: f64,
        unit: Unit,
    },
    ShiftedExponential {
        lambda: f64,
        shift: f64,
        inverse: bool,
        unit: Unit,
    },
    Block {
        lower: f64,
        upper: f64,
        unit: Unit,
    },
    Triangular {
        lower: f64,
        mode: f64,
        upper: f64,
        unit: Unit,
    },
    NormalComb {
        mode: f64,
        sd_left: f64,
        sd_right: f64,
        unit: Unit,
    },
    Empirical {
        values: Vec<f64>,
        unit: Unit,
    },
    Binomial {
        count: RandomVariable,
        prop: RandomVariable,
    },
    BetaBinomial {
        trials: u64,
        alpha: f64,
        beta: f64,
        shift: f64,
        unit: Unit,
    },
    Conditional {
        prop: RandomVariable,
        if_true: RandomVariable,
        if_false: RandomVariable,
    },
    Uncertain {
        index: RandomVariable,
        choices: Vec<RandomVariable>,
    },
    Binary {
        left: RandomVariable,
        right: RandomVariable,
        operation: BinaryOperation,
    },
    SumOfN {
        term: RandomVariable,
        count: RandomVariable,
    },
    Bound {
        base: RandomVariable,
        lower: f64,
        upper: f64,
    },
    Persistent {
        id: VarId,
        base: RandomVariable,
    },
    Custom(Arc<dyn CustomVariable>),
}

impl Node {
    fn unit(&self) -> Unit {
        match self {
            Node::Fixed(q) => q.unit().clone(),
            Node::Normal { unit, .. }
            | Node::LogNormal { unit, .. }
            | Node::ShiftedExponential { unit, .. }
            | Node::Block { unit, .. }
            | Node::Triangular { unit, .. }
            | Node::NormalComb { unit, .. }
            | Node::Empirical { unit, .. }
            | Node::BetaBinomial { unit, .. } => unit.clone(),
            Node::Binomial { count, .. } => count.unit().clone(),
            Node::Conditional { if_true, .. } => if_true.unit().clone(),
            Node::Uncertain { choices, .. } => choices
                .first()
                .map_or_else(Unit::scalar, |c| c.unit().clone()),
            Node::Binary {
                left,
                right,
                operation,
            } => operation.unit(left.unit(), right.unit()),
            Node::SumOfN { term, count } => count.unit().times(term.unit()),
            Node::Bound { base, .. } | Node::Persistent { base, .. } => base.unit().clone(),
            Node::Custom(custom) => custom.unit(),
        }
    }
}

impl RandomVariable {
    pub(crate) fn from_node(node: Node) -> Self {
        let unit = node.unit();
        Self {
            node: Arc::new(node),
            unit,
        }
    }

    /// Wraps a caller-supplied capability as a variable.
    pub fn custom<C>(custom: C) -> Self
    where
        C: CustomVariable + 'static,
    {
        Self::from_node(Node::Custom(Arc::new(custom)))
    }

    /// The unit of every quantity this variable yields.
    #[must_use]
    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    #[must_use]
    pub fn kind(&self) -> VarKind {
        match &*self.node {
            Node::Fixed(_) => VarKind::Fixed,
            Node::Normal { .. }
            | Node::LogNormal { .. }
            | Node::ShiftedExponential { .. }
            | Node::Block { .. }
            | Node::Triangular { .. }
            | Node::NormalComb { .. }
            | Node::Empirical { .. }
            | Node::BetaBinomial { .. } => VarKind::Distribution,
            Node::Binomial { .. }
            | Node::Conditional { .. }
            | Node::Binary { .. }
            | Node::SumOfN { .. } => VarKind::Combined,
            Node::Uncertain { .. } => VarKind::Uncertain,
            Node::Bound { base, .. } | Node::Persistent { base, .. } => base.kind(),
            Node::Custom(custom) => custom.kind(),
        }
    }

    /// Observes one value given a random source and the current draw's run.
    ///
    /// # Errors
    /// Fails on unit mismatches in sums and differences, on out-of-range index draws, on
    /// persistence contract violations, and on any error raised by a custom variable.
    pub fn observe(&self, rng: &mut RandomSource, run: &mut SimulationRun) -> Result<Quantity> {
        match &*self.node {
            Node::Fixed(q) => Ok(q.clone()),

            Node::Normal { mean, sd, unit } => {
                Ok(Quantity::new(rng.next_gaussian() * sd + mean, unit.clone()))
            }

            Node::LogNormal { mean, sd, unit } => Ok(Quantity::new(
                (rng.next_gaussian() * sd + mean).exp(),
                unit.clone(),
            )),

            Node::ShiftedExponential {
                lambda,
                shift,
                inverse,
                unit,
            } => {
                let sampled = -(1.0 - rng.next_f64()).ln() / lambda;
                let value = if *inverse {
                    shift - sampled
                } else {
                    shift + sampled
                };
                Ok(Quantity::new(value, unit.clone()))
            }

            Node::Block { lower, upper, unit } => {
                let segment = rng.next_f64();
                let diff = upper - lower;
                let start = if segment < 0.05 {
                    lower - diff
                } else if segment < 0.95 {
                    *lower
                } else {
                    *upper
                };
                Ok(Quantity::new(start + diff * rng.next_f64(), unit.clone()))
            }

            Node::Triangular {
                lower,
                mode,
                upper,
                unit,
            } => {
                let split = (mode - lower) / (upper - lower);
                let u = rng.next_f64();
                let value = if u < split {
                    lower + (u * (upper - lower) * (mode - lower)).sqrt()
                } else {
                    upper - ((1.0 - u) * (upper - lower) * (upper - mode)).sqrt()
                };
                Ok(Quantity::new(value, unit.clone()))
            }

            Node::NormalComb {
                mode,
                sd_left,
                sd_right,
                unit,
            } => {
                let value = if rng.next_bool(0.5) {
                    if *sd_left == 0.0 {
                        // a hard point mass would make ties in downstream comparisons
                        if rng.next_bool(0.95) {
                            *mode
                        } else {
                            mode.next_down()
                        }
                    } else {
                        mode - (rng.next_gaussian() * sd_left).abs()
                    }
                } else if *sd_right == 0.0 {
                    if rng.next_bool(0.95) {
                        *mode
                    } else {
                        mode.next_up()
                    }
                } else {
                    mode + (rng.next_gaussian() * sd_right).abs()
                };
                Ok(Quantity::new(value, unit.clone()))
            }

            Node::Empirical { values, unit } => {
                let index = rng.next_index(values.len());
                Ok(Quantity::new(values[index], unit.clone()))
            }

            Node::Binomial { count, prop } => {
                let trials = round_count(count.observe(rng, run)?.number());
                let p = prop.observe(rng, run)?.number();
                #[allow(clippy::cast_precision_loss)]
                let successes = rng.binomial(trials, p) as f64;
                Ok(Quantity::new(successes, self.unit.clone()))
            }

            Node::BetaBinomial {
                trials,
                alpha,
                beta,
                shift,
                unit,
            } => {
                let p = rng.beta(*alpha, *beta);
                #[allow(clippy::cast_precision_loss)]
                let successes = rng.binomial(*trials, p) as f64;
                Ok(Quantity::new(successes + shift, unit.clone()))
            }

            Node::Conditional {
                prop,
                if_true,
                if_false,
            } => {
                let p = prop.observe(rng, run)?.number();
                if rng.next_f64() < p {
                    if_true.observe(rng, run)
                } else {
                    if_false.observe(rng, run)
                }
            }

            Node::Uncertain { index, choices } => {
                let drawn = index.observe(rng, run)?.number().round();
                #[allow(clippy::cast_precision_loss)]
                let in_range = drawn >= 0.0 && drawn < choices.len() as f64;
                if !in_range {
                    return Err(ModelError::IndexOutOfRange {
                        index: drawn as i64,
                        len: choices.len(),
                    });
                }
                choices[drawn as usize].observe(rng, run)
            }

            Node::Binary {
                left,
                right,
                operation,
            } => {
                let l = left.observe(rng, run)?;
                let r = right.observe(rng, run)?;
                operation.apply(&l, &r)
            }

            Node::SumOfN { term, count } => {
                let n = round_count(count.observe(rng, run)?.number());
                let mut sum = 0.0;
                for _ in 0..n {
                    sum += term.observe(rng, run)?.number();
                }
                Ok(Quantity::new(sum, self.unit.clone()))
            }

            Node::Bound { base, lower, upper } => {
                let q = base.observe(rng, run)?;
                if q.number() < *lower {
                    Ok(Quantity::new(*lower, q.unit().clone()))
                } else if q.number() > *upper {
                    Ok(Quantity::new(*upper, q.unit().clone()))
                } else {
                    Ok(q)
                }
            }

            Node::Persistent { id, base } => {
                if run.has_persistent_value(id) {
                    return run.persistent_value(id).cloned();
                }
                let value = base.observe(rng, run).map_err(|e| e.in_variable(id))?;
                run.persist(id.clone(), value.clone())
                    .map_err(|e| e.in_variable(id))?;
                Ok(value)
            }

            Node::Custom(custom) => custom.observe(rng, run),
        }
    }

    /// Sum of `count` independent draws of this variable; `count` is rounded per draw.
    #[must_use]
    pub fn sum_of_n(&self, count: &RandomVariable) -> RandomVariable {
        Self::from_node(Node::SumOfN {
            term: self.clone(),
            count: count.clone(),
        })
    }

    #[must_use]
    pub fn sum_of_n_fixed(&self, count: u32) -> RandomVariable {
        self.sum_of_n(&RandomVariable::scalar(f64::from(count)))
    }

    /// Clamps every observation into `[lower, upper]`.
    #[must_use]
    pub fn bound(&self, lower: f64, upper: f64) -> RandomVariable {
        Self::from_node(Node::Bound {
            base: self.clone(),
            lower,
            upper,
        })
    }

    #[must_use]
    pub fn non_negative(&self) -> RandomVariable {
        self.bound(0.0, f64::INFINITY)
    }

    /// Wraps this variable so it yields one stable value per simulation run.
    ///
    /// Idempotent for the same id.
    ///
    /// # Errors
    /// Returns [`ModelError::ConflictingPersistentId`] if the variable is already
    /// persistent under a different id.
    pub fn ensure_persistent(self, id: &VarId) -> Result<RandomVariable> {
        match self.persistent_id() {
            Some(existing) if existing == id => Ok(self),
            Some(existing) => Err(ModelError::ConflictingPersistentId {
                existing: existing.clone(),
                requested: id.clone(),
            }),
            None => Ok(Self::from_node(Node::Persistent {
                id: id.clone(),
                base: self,
            })),
        }
    }

    /// The id this variable persists under, if it is persistent.
    #[must_use]
    pub fn persistent_id(&self) -> Option<&VarId> {
        match &*self.node {
            Node::Persistent { id, .. } => Some(id),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_persistent(&self) -> bool {
        self.persistent_id().is_some()
    }

    /// Counts the nodes of the expression, shared operands once per use.
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + match &*self.node {
            Node::Binomial { count, prop } => count.node_count() + prop.node_count(),
            Node::Conditional {
                prop,
                if_true,
                if_false,
            } => prop.node_count() + if_true.node_count() + if_false.node_count(),
            Node::Uncertain { index, choices } => {
                index.node_count() + choices.iter().map(Self::node_count).sum::<usize>()
            }
            Node::Binary { left, right, .. } => left.node_count() + right.node_count(),
            Node::SumOfN { term, count } => term.node_count() + count.node_count(),
            Node::Bound { base, .. } | Node::Persistent { base, .. } => base.node_count(),
            _ => 0,
        }
    }

    fn node_name(&self) -> &'static str {
        match &*self.node {
            Node::Fixed(_) => "Fixed",
            Node::Normal { .. } => "Normal",
            Node::LogNormal { .. } => "LogNormal",
            Node::ShiftedExponential { .. } => "ShiftedExponential",
            Node::Block { .. } => "Block",
            Node::Triangular { .. } => "Triangular",
            Node::NormalComb { .. } => "NormalComb",
            Node::Empirical { .. } => "Empirical",
            Node::Binomial { .. } => "Binomial",
            Node::BetaBinomial { .. } => "BetaBinomial",
            Node::Conditional { .. } => "Conditional",
            Node::Uncertain { .. } => "Uncertain",
            Node::Binary { operation, .. } => operation.name(),
            Node::SumOfN { .. } => "SumOfN",
            Node::Bound { .. } => "Bound",
            Node::Persistent { .. } => "Persistent",
            Node::Custom(_) => "Custom",
        }
    }
}

/// Rounds a drawn count to the nearest integer; negative and NaN counts are zero.
pub(crate) fn round_count(x: f64) -> u64 {
    if x.is_nan() || x <= 0.0 {
        0
    } else {
        x.round() as u64
    }
}

impl fmt::Debug for RandomVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("RandomVariable");
        s.field("node", &self.node_name())
            .field("kind", &self.kind())
            .field("unit", &self.unit);
        if let Some(id) = self.persistent_id() {
            s.field("id", id);
        }
        s.finish()
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    fn observe_once(v: &RandomVariable) -> Result<Quantity> {
        v.observe(&mut RandomSource::seeded(1), &mut SimulationRun::new())
    }

    #[test]
    fn test_fixed_kind_and_value() {
        let v = RandomVariable::fixed(Quantity::of(3.0, "EUR"));
        assert_eq!(v.kind(), VarKind::Fixed);
        assert_eq!(observe_once(&v).unwrap(), Quantity::of(3.0, "EUR"));
    }

    #[test]
    fn test_persistent_same_value_within_run() {
        let v = RandomVariable::normal(0.0, 1.0, Unit::scalar())
            .unwrap()
            .ensure_persistent(&VarId::named("x"))
            .unwrap();
        let mut rng = RandomSource::seeded(3);
        let mut run = SimulationRun::new();

        let first = v.observe(&mut rng, &mut run).unwrap();
        let second = v.observe(&mut rng, &mut run).unwrap();
        assert_eq!(first.number().to_bits(), second.number().to_bits());

        let fresh = v.observe(&mut rng, &mut SimulationRun::new()).unwrap();
        assert_ne!(first.number(), fresh.number());
    }

    #[test]
    fn test_persistent_shared_across_paths() {
        let x = RandomVariable::normal(0.0, 1.0, Unit::scalar())
            .unwrap()
            .ensure_persistent(&VarId::named("x"))
            .unwrap();
        let diff = &x - &x;
        for seed in 0..20 {
            let q = diff
                .observe(&mut RandomSource::seeded(seed), &mut SimulationRun::new())
                .unwrap();
            assert_eq!(q.number(), 0.0);
        }
    }

    #[test]
    fn test_non_persistent_paths_resample() {
        let x = RandomVariable::normal(0.0, 1.0, Unit::scalar()).unwrap();
        let diff = &x - &x;
        let q = observe_once(&diff).unwrap();
        assert_ne!(q.number(), 0.0);
    }

    #[test]
    fn test_ensure_persistent_idempotent() {
        let id = VarId::named("x");
        let v = RandomVariable::scalar(1.0).ensure_persistent(&id).unwrap();
        let again = v.clone().ensure_persistent(&id).unwrap();
        assert_eq!(again.node_count(), v.node_count());
        assert!(matches!(
            v.ensure_persistent(&VarId::named("y")),
            Err(ModelError::ConflictingPersistentId { .. })
        ));
    }

    #[test]
    fn test_persistent_kind_passes_through() {
        let v = RandomVariable::scalar(1.0)
            .ensure_persistent(&VarId::named("x"))
            .unwrap();
        assert_eq!(v.kind(), VarKind::Fixed);
    }

    #[test]
    fn test_sum_rejects_mismatched_units() {
        let sum = RandomVariable::fixed(Quantity::of(1.0, "EUR"))
            + RandomVariable::fixed(Quantity::of(1.0, "h"));
        assert!(matches!(
            observe_once(&sum),
            Err(ModelError::IncompatibleUnits { .. })
        ));
    }

    #[test]
    fn test_product_and_quotient_units() {
        let eur = RandomVariable::fixed(Quantity::of(10.0, "EUR"));
        let h = RandomVariable::fixed(Quantity::of(4.0, "h"));
        assert_eq!((&eur * &h).unit().to_string(), "EUR*h");
        let rate = &eur / &h;
        assert_eq!(rate.unit().to_string(), "EUR/h");
        assert_eq!(observe_once(&rate).unwrap().number(), 2.5);
        assert_eq!(rate.kind(), VarKind::Combined);
    }

    #[test]
    fn test_bound_clamps() {
        let low = RandomVariable::fixed(Quantity::of(-5.0, "EUR")).non_negative();
        assert_eq!(observe_once(&low).unwrap(), Quantity::of(0.0, "EUR"));
        let high = RandomVariable::scalar(12.0).bound(0.0, 10.0);
        assert_eq!(observe_once(&high).unwrap().number(), 10.0);
        let inside = RandomVariable::scalar(5.0).bound(0.0, 10.0);
        assert_eq!(observe_once(&inside).unwrap().number(), 5.0);
        assert_eq!(inside.kind(), VarKind::Fixed);
    }

    #[test]
    fn test_sum_of_n() {
        let term = RandomVariable::fixed(Quantity::of(2.5, "EUR"));
        let sum = term.sum_of_n(&RandomVariable::scalar(3.6));
        assert_eq!(observe_once(&sum).unwrap(), Quantity::of(10.0, "EUR"));

        let none = term.sum_of_n(&RandomVariable::scalar(-2.0));
        assert_eq!(observe_once(&none).unwrap().number(), 0.0);
    }

    #[test]
    fn test_node_count() {
        let a = RandomVariable::scalar(1.0);
        let b = RandomVariable::scalar(2.0);
        let expr = (&a + &b) * a;
        assert_eq!(expr.node_count(), 5);
    }

    #[test]
    fn test_debug_output() {
        let v = RandomVariable::scalar(1.0)
            .ensure_persistent(&VarId::named("x"))
            .unwrap();
        let debug = format!("{v:?}");
        assert!(debug.contains("Persistent"));
        assert!(debug.contains("x"));
    }
}
