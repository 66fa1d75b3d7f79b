#![allow(clippy::cast_precision_loss)]

use crate::error::{ModelError, Result, ensure_finite};
use crate::quantity::Quantity;
use crate::unit::Unit;
use crate::variable::{Node, RandomVariable};

/// Number of standard deviations between the mean and a one-sided 95% bound.
pub const NORMAL_TAIL_FACTOR: f64 = 1.645;

fn ensure_ordered(lower: f64, upper: f64) -> Result<()> {
    ensure_finite("lower", lower)?;
    ensure_finite("upper", upper)?;
    if lower < upper {
        Ok(())
    } else {
        Err(ModelError::invalid_parameter(
            "upper",
            upper,
            "must be greater than lower",
        ))
    }
}

fn ensure_mode_inside(lower: f64, mode: f64, upper: f64) -> Result<()> {
    ensure_finite("mode", mode)?;
    if mode < lower {
        return Err(ModelError::invalid_parameter(
            "mode",
            mode,
            "must not be below lower",
        ));
    }
    if mode > upper {
        return Err(ModelError::invalid_parameter(
            "mode",
            mode,
            "must not be above upper",
        ));
    }
    Ok(())
}

fn ensure_scalar(variable: &RandomVariable) -> Result<()> {
    if variable.unit().is_scalar() {
        Ok(())
    } else {
        Err(ModelError::incompatible_units(
            variable.unit(),
            &Unit::scalar(),
        ))
    }
}

impl RandomVariable {
    /// Creates a variable that always yields the same quantity
    ///
    /// # Example
    /// ```rust
    /// use infoecon_rs::{Quantity, RandomSource, RandomVariable, SimulationRun};
    ///
    /// let price = RandomVariable::fixed(Quantity::of(42.0, "EUR"));
    /// let q = price
    ///     .observe(&mut RandomSource::seeded(0), &mut SimulationRun::new())
    ///     .unwrap();
    /// assert_eq!(q, Quantity::of(42.0, "EUR"));
    /// ```
    #[must_use]
    pub fn fixed(value: Quantity) -> Self {
        Self::from_node(Node::Fixed(value))
    }

    #[must_use]
    pub fn fixed_value(value: f64, unit: Unit) -> Self {
        Self::fixed(Quantity::new(value, unit))
    }

    /// A fixed dimensionless number.
    #[must_use]
    pub fn scalar(value: f64) -> Self {
        Self::fixed(Quantity::scalar(value))
    }

    /// A fixed zero with the given unit.
    #[must_use]
    pub fn zero(unit: &Unit) -> Self {
        Self::fixed_value(0.0, unit.clone())
    }

    /// Creates a normal distribution from its mean and standard deviation
    ///
    /// # Errors
    /// Returns an error if a parameter is not finite or `sd` is negative.
    pub fn normal(mean: f64, sd: f64, unit: Unit) -> Result<Self> {
        ensure_finite("mean", mean)?;
        ensure_finite("sd", sd)?;
        if sd < 0.0 {
            return Err(ModelError::invalid_parameter(
                "sd",
                sd,
                "must not be negative",
            ));
        }
        Ok(Self::from_node(Node::Normal { mean, sd, unit }))
    }

    /// Creates a normal distribution whose central 90% lies in `[lower, upper]`,
    /// i.e. `lower` and `upper` are the one-sided 95% bounds.
    ///
    /// # Errors
    /// Returns an error unless `lower < upper`.
    ///
    /// # Example
    /// ```rust
    /// use infoecon_rs::{RandomVariable, Unit};
    ///
    /// let effort = RandomVariable::normal_95(10.0, 20.0, Unit::of("h")).unwrap();
    /// assert!(RandomVariable::normal_95(20.0, 10.0, Unit::of("h")).is_err());
    /// ```
    pub fn normal_95(lower: f64, upper: f64, unit: Unit) -> Result<Self> {
        ensure_ordered(lower, upper)?;
        let mean = (lower + upper) / 2.0;
        let sd = (upper - lower) / NORMAL_TAIL_FACTOR / 2.0;
        Self::normal(mean, sd, unit)
    }

    /// Creates a log-normal distribution from the mean and standard deviation of its
    /// logarithm.
    ///
    /// # Errors
    /// Returns an error if a parameter is not finite or `sigma` is negative.
    pub fn log_normal(mu: f64, sigma: f64, unit: Unit) -> Result<Self> {
        ensure_finite("mu", mu)?;
        ensure_finite("sigma", sigma)?;
        if sigma < 0.0 {
            return Err(ModelError::invalid_parameter(
                "sigma",
                sigma,
                "must not be negative",
            ));
        }
        Ok(Self::from_node(Node::LogNormal {
            mean: mu,
            sd: sigma,
            unit,
        }))
    }

    /// Creates a log-normal distribution from one-sided 95% bounds.
    ///
    /// The bounds are taken to log space; a `lower` of zero maps to zero there.
    ///
    /// # Errors
    /// Returns an error unless `0 <= lower < upper`.
    pub fn log_normal_95(lower: f64, upper: f64, unit: Unit) -> Result<Self> {
        ensure_ordered(lower, upper)?;
        if lower < 0.0 {
            return Err(ModelError::invalid_parameter(
                "lower",
                lower,
                "must not be negative",
            ));
        }
        let log_lower = if lower > 0.0 { lower.ln() } else { 0.0 };
        let log_upper = upper.ln();
        let mu = (log_lower + log_upper) / 2.0;
        // upper below one with a zero lower bound flips the log-space interval
        let sigma = ((log_upper - log_lower) / NORMAL_TAIL_FACTOR / 2.0).abs();
        Self::log_normal(mu, sigma, unit)
    }

    /// Exponential tail starting at `lower`; 95% of the mass falls in `[lower, upper)`.
    ///
    /// # Errors
    /// Returns an error unless `lower < upper`.
    pub fn shifted_exponential(lower: f64, upper: f64, unit: Unit) -> Result<Self> {
        Self::shifted_exponential_impl(lower, upper, false, unit)
    }

    /// Mirror image of [`RandomVariable::shifted_exponential`]: the tail runs down from
    /// `upper`.
    ///
    /// # Errors
    /// Returns an error unless `lower < upper`.
    pub fn inverse_shifted_exponential(lower: f64, upper: f64, unit: Unit) -> Result<Self> {
        Self::shifted_exponential_impl(lower, upper, true, unit)
    }

    fn shifted_exponential_impl(lower: f64, upper: f64, inverse: bool, unit: Unit) -> Result<Self> {
        ensure_ordered(lower, upper)?;
        let lambda = 20.0_f64.ln() / (upper - lower);
        Ok(Self::from_node(Node::ShiftedExponential {
            lambda,
            shift: if inverse { upper } else { lower },
            inverse,
            unit,
        }))
    }

    /// Uniform central block with 5% tails on either side.
    ///
    /// 90% of draws fall in `[lower, upper)`, 5% in `[lower - diff, lower)` and 5% in
    /// `[upper, upper + diff)` where `diff = upper - lower`.
    ///
    /// # Errors
    /// Returns an error unless `lower < upper`.
    pub fn block(lower: f64, upper: f64, unit: Unit) -> Result<Self> {
        ensure_ordered(lower, upper)?;
        Ok(Self::from_node(Node::Block { lower, upper, unit }))
    }

    /// Triangular distribution on absolute bounds.
    ///
    /// # Errors
    /// Returns an error unless `lower <= mode <= upper` and `lower < upper`.
    pub fn triangular(lower: f64, mode: f64, upper: f64, unit: Unit) -> Result<Self> {
        ensure_ordered(lower, upper)?;
        ensure_mode_inside(lower, mode, upper)?;
        Ok(Self::from_node(Node::Triangular {
            lower,
            mode,
            upper,
            unit,
        }))
    }

    /// Two half-normal tails joined at `mode`, each reaching its one-sided 95% bound at
    /// `lower` and `upper` respectively.
    ///
    /// # Errors
    /// Returns an error unless `lower <= mode <= upper`.
    pub fn normal_comb(lower: f64, mode: f64, upper: f64, unit: Unit) -> Result<Self> {
        ensure_finite("lower", lower)?;
        ensure_finite("upper", upper)?;
        ensure_mode_inside(lower, mode, upper)?;
        Ok(Self::from_node(Node::NormalComb {
            mode,
            sd_left: (mode - lower) / NORMAL_TAIL_FACTOR,
            sd_right: (upper - mode) / NORMAL_TAIL_FACTOR,
            unit,
        }))
    }

    /// Picks one of the given values uniformly.
    ///
    /// # Errors
    /// Returns an error if `values` is empty or holds a non-finite number.
    pub fn empirical(values: Vec<f64>, unit: Unit) -> Result<Self> {
        if values.is_empty() {
            return Err(ModelError::EmptyData { what: "values" });
        }
        for value in &values {
            ensure_finite("values", *value)?;
        }
        Ok(Self::from_node(Node::Empirical { values, unit }))
    }

    /// Counts the successes in `count` Bernoulli trials with success probability `prop`.
    ///
    /// Both parameters are drawn per observation; the count is rounded to the nearest
    /// integer. The result carries the unit of `count`.
    ///
    /// # Errors
    /// Returns [`ModelError::IncompatibleUnits`] if `prop` is not dimensionless.
    pub fn binomial(count: &RandomVariable, prop: &RandomVariable) -> Result<Self> {
        ensure_scalar(prop)?;
        Ok(Self::from_node(Node::Binomial {
            count: count.clone(),
            prop: prop.clone(),
        }))
    }

    /// [`RandomVariable::binomial`] with a fixed trial count.
    ///
    /// # Errors
    /// Returns [`ModelError::IncompatibleUnits`] if `prop` is not dimensionless.
    pub fn binomial_fixed(count: u32, prop: &RandomVariable, unit: Unit) -> Result<Self> {
        Self::binomial(&Self::fixed_value(f64::from(count), unit), prop)
    }

    /// Distribution of how many members of a population have some property, given that
    /// `positives` of a random sample of `sample` members had it.
    ///
    /// Beta-binomial over the unsampled remainder with a uniform prior, shifted by the
    /// positives already observed.
    ///
    /// # Errors
    /// Returns an error unless `positives <= sample <= population`.
    pub fn extrapolate_from_sample(
        population: u64,
        sample: u64,
        positives: u64,
        unit: Unit,
    ) -> Result<Self> {
        if sample > population {
            return Err(ModelError::invalid_parameter(
                "sample",
                sample as f64,
                "must not exceed population",
            ));
        }
        if positives > sample {
            return Err(ModelError::invalid_parameter(
                "positives",
                positives as f64,
                "must not exceed sample",
            ));
        }
        Ok(Self::from_node(Node::BetaBinomial {
            trials: population - sample,
            alpha: 1.0 + positives as f64,
            beta: 1.0 + (sample - positives) as f64,
            shift: positives as f64,
            unit,
        }))
    }

    /// With probability `prop` a draw of `if_true`, otherwise a draw of `if_false`.
    ///
    /// # Errors
    /// Returns [`ModelError::IncompatibleUnits`] if `prop` is not dimensionless or the
    /// branches have different units.
    ///
    /// # Example
    /// ```rust
    /// use infoecon_rs::{Quantity, RandomVariable};
    ///
    /// let win = RandomVariable::fixed(Quantity::of(100.0, "EUR"));
    /// let lose = RandomVariable::fixed(Quantity::of(-20.0, "EUR"));
    /// let bet = RandomVariable::conditional(&RandomVariable::scalar(0.3), &win, &lose).unwrap();
    /// assert_eq!(bet.unit().to_string(), "EUR");
    /// ```
    pub fn conditional(
        prop: &RandomVariable,
        if_true: &RandomVariable,
        if_false: &RandomVariable,
    ) -> Result<Self> {
        ensure_scalar(prop)?;
        if if_true.unit() != if_false.unit() {
            return Err(ModelError::incompatible_units(
                if_true.unit(),
                if_false.unit(),
            ));
        }
        Ok(Self::from_node(Node::Conditional {
            prop: prop.clone(),
            if_true: if_true.clone(),
            if_false: if_false.clone(),
        }))
    }

    /// [`RandomVariable::conditional`] with a fixed probability.
    ///
    /// # Errors
    /// Returns an error if `prop` is not finite or the branch units differ.
    pub fn conditional_with_probability(
        prop: f64,
        if_true: &RandomVariable,
        if_false: &RandomVariable,
    ) -> Result<Self> {
        ensure_finite("prop", prop)?;
        Self::conditional(&Self::scalar(prop), if_true, if_false)
    }

    /// With probability `prop` a draw of `value`, otherwise zero in `value`'s unit.
    ///
    /// # Errors
    /// Returns [`ModelError::IncompatibleUnits`] if `prop` is not dimensionless.
    pub fn conditional_or_zero(prop: &RandomVariable, value: &RandomVariable) -> Result<Self> {
        Self::conditional(prop, value, &Self::zero(value.unit()))
    }

    /// Chooses among candidate distributions by a rounded draw of `index`.
    ///
    /// Models a quantity whose distribution family is itself unknown. Observation fails
    /// with [`ModelError::IndexOutOfRange`] if the rounded index selects no candidate.
    ///
    /// # Errors
    /// Returns an error if `choices` is empty or the candidates' units differ.
    pub fn uncertain(index: &RandomVariable, choices: Vec<RandomVariable>) -> Result<Self> {
        let Some(first) = choices.first() else {
            return Err(ModelError::EmptyData { what: "choices" });
        };
        if let Some(other) = choices.iter().find(|c| c.unit() != first.unit()) {
            return Err(ModelError::incompatible_units(first.unit(), other.unit()));
        }
        Ok(Self::from_node(Node::Uncertain {
            index: index.clone(),
            choices,
        }))
    }
}

/// A range estimate, the shared input of every [`StdDist`] family.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Between {
    pub lower: f64,
    pub upper: f64,
}

impl Between {
    /// # Errors
    /// Returns an error if a bound is not finite or `lower > upper`.
    pub fn new(lower: f64, upper: f64) -> Result<Self> {
        ensure_finite("lower", lower)?;
        ensure_finite("upper", upper)?;
        if lower > upper {
            return Err(ModelError::invalid_parameter(
                "lower",
                lower,
                "must not exceed upper",
            ));
        }
        Ok(Self { lower, upper })
    }
}

/// The standard distribution families a range estimate can be turned into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StdDist {
    Normal,
    LogNormal,
    ShiftedExp,
    InverseShiftedExp,
    Block,
}

impl StdDist {
    pub const ALL: [StdDist; 5] = [
        StdDist::Normal,
        StdDist::LogNormal,
        StdDist::ShiftedExp,
        StdDist::InverseShiftedExp,
        StdDist::Block,
    ];

    /// Builds this family from a range estimate.
    ///
    /// # Errors
    /// Returns the family constructor's error for ranges it cannot represent, e.g. an
    /// empty range or a negative lower bound for [`StdDist::LogNormal`].
    pub fn create(self, range: Between, unit: Unit) -> Result<RandomVariable> {
        match self {
            StdDist::Normal => RandomVariable::normal_95(range.lower, range.upper, unit),
            StdDist::LogNormal => RandomVariable::log_normal_95(range.lower, range.upper, unit),
            StdDist::ShiftedExp => {
                RandomVariable::shifted_exponential(range.lower, range.upper, unit)
            }
            StdDist::InverseShiftedExp => {
                RandomVariable::inverse_shifted_exponential(range.lower, range.upper, unit)
            }
            StdDist::Block => RandomVariable::block(range.lower, range.upper, unit),
        }
    }
}
