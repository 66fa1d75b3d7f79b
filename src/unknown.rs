//! Quantities whose distribution family is itself uncertain.

use crate::distributions::{Between, StdDist};
use crate::error::{ModelError, Result};
use crate::model::{MultiVariableFactory, Producer, producer};
use crate::unit::Unit;
use crate::var_id::VarId;
use crate::variable::RandomVariable;

/// Factory for an estimate that names a range but no distribution family.
///
/// For a base id `x` it registers `x_dist`, a uniform choice among all candidate
/// indices, and `x` itself, which observes the candidate picked by `x_dist` and clamps
/// the draw into `[absolute_min, absolute_max]`. Every family is combined with every
/// range, so two families over three ranges give six candidates.
///
/// # Example
/// ```rust
/// use infoecon_rs::{Model, Unit, UnknownDistribution};
///
/// let mut model = Model::new();
/// let effort = UnknownDistribution::between(10.0, 40.0, Unit::of("h"))
///     .unwrap()
///     .non_negative();
/// model.add_factory("effort", &effort).unwrap();
/// assert_eq!(model.len(), 2);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct UnknownDistribution {
    families: Vec<StdDist>,
    absolute_min: f64,
    ranges: Vec<Between>,
    absolute_max: f64,
    unit: Unit,
}

impl UnknownDistribution {
    /// # Errors
    /// Returns [`ModelError::EmptyData`] if `families` or `ranges` is empty.
    pub fn new(
        families: Vec<StdDist>,
        absolute_min: f64,
        ranges: Vec<Between>,
        absolute_max: f64,
        unit: Unit,
    ) -> Result<Self> {
        if families.is_empty() {
            return Err(ModelError::EmptyData { what: "families" });
        }
        if ranges.is_empty() {
            return Err(ModelError::EmptyData { what: "ranges" });
        }
        Ok(Self {
            families,
            absolute_min,
            ranges,
            absolute_max,
            unit,
        })
    }

    /// All standard families over one range, unbounded.
    ///
    /// # Errors
    /// Returns an error if the range is malformed.
    pub fn between(lower: f64, upper: f64, unit: Unit) -> Result<Self> {
        Self::new(
            StdDist::ALL.to_vec(),
            f64::NEG_INFINITY,
            vec![Between::new(lower, upper)?],
            f64::INFINITY,
            unit,
        )
    }

    /// All standard families over one range, clamped to absolute limits.
    ///
    /// # Errors
    /// Returns an error unless `absolute_min <= lower < upper <= absolute_max`.
    pub fn bounded(
        absolute_min: f64,
        lower: f64,
        upper: f64,
        absolute_max: f64,
        unit: Unit,
    ) -> Result<Self> {
        if absolute_min > lower {
            return Err(ModelError::invalid_parameter(
                "absolute_min",
                absolute_min,
                "must not exceed lower",
            ));
        }
        if upper > absolute_max {
            return Err(ModelError::invalid_parameter(
                "absolute_max",
                absolute_max,
                "must not be below upper",
            ));
        }
        if lower >= upper {
            return Err(ModelError::invalid_parameter(
                "upper",
                upper,
                "must be greater than lower",
            ));
        }
        Self::new(
            StdDist::ALL.to_vec(),
            absolute_min,
            vec![Between::new(lower, upper)?],
            absolute_max,
            unit,
        )
    }

    /// Narrows the absolute limits.
    #[must_use]
    pub fn bound(mut self, lower: f64, upper: f64) -> Self {
        self.absolute_min = self.absolute_min.max(lower);
        self.absolute_max = self.absolute_max.min(upper);
        self
    }

    #[must_use]
    pub fn non_negative(self) -> Self {
        self.bound(0.0, f64::INFINITY)
    }

    fn candidates(&self) -> Result<Vec<RandomVariable>> {
        let mut candidates = Vec::with_capacity(self.families.len() * self.ranges.len());
        for family in &self.families {
            for range in &self.ranges {
                candidates.push(family.create(*range, self.unit.clone())?);
            }
        }
        Ok(candidates)
    }
}

impl MultiVariableFactory for UnknownDistribution {
    fn create(&self, base: &VarId) -> Result<Vec<(VarId, Producer)>> {
        let candidates = self.candidates()?;
        #[allow(clippy::cast_precision_loss)]
        let indices = (0..candidates.len()).map(|i| i as f64).collect();
        let index = RandomVariable::empirical(indices, Unit::scalar())?;

        let dist_id = base.subvar("dist");
        let (lower, upper) = (self.absolute_min, self.absolute_max);
        let index_id = dist_id.clone();
        let chosen = producer(move |inst| {
            Ok(RandomVariable::uncertain(&inst.get(&index_id)?, candidates.clone())?
                .bound(lower, upper))
        });

        Ok(vec![
            (dist_id, producer(move |_| Ok(index.clone()))),
            (base.clone(), chosen),
        ])
    }
}
