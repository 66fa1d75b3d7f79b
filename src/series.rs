#![allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]

//! Time series: one random variable per discrete time step, usually per year.
//!
//! A series is a recipe, not a variable. It resolves the variable for a given time through
//! an [`Instance`], so every series value shares the instance's named variables. Register
//! the values you want to analyze with [`value_at`] or [`sum_over`].
//!
//! # Example
//! ```rust
//! use infoecon_rs::series::{self, ExponentialGrowthSeries};
//! use infoecon_rs::{Model, Quantity, RandomSource, RandomVariable, SimulationRun};
//! use std::sync::Arc;
//!
//! let mut model = Model::new();
//! model.add_var("revenue", RandomVariable::fixed(Quantity::of(100.0, "EUR"))).unwrap();
//! model.add_var("growth", RandomVariable::scalar(1.1)).unwrap();
//!
//! let revenue = Arc::new(ExponentialGrowthSeries::new("revenue", "growth"));
//! model.add("revenue_total", series::sum_over(&revenue, 0, 2)).unwrap();
//!
//! let total = model.instantiate().get("revenue_total").unwrap();
//! let q = total.observe(&mut RandomSource::seeded(0), &mut SimulationRun::new()).unwrap();
//! assert!((q.number() - 331.0).abs() < 1e-9);
//! ```

use crate::error::{ModelError, Result};
use crate::model::Instance;
use crate::operations::BinaryOperation;
use crate::quantity::Quantity;
use crate::random::RandomSource;
use crate::run::{PersistentObject, SimulationRun};
use crate::traits::CustomVariable;
use crate::unit::Unit;
use crate::var_id::VarId;
use crate::variable::RandomVariable;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// A random variable per time step.
pub trait TimeSeries: Send + Sync {
    /// Resolves the value at `time`.
    ///
    /// # Errors
    /// Returns an error if `time` is outside the series or a dependency cannot be
    /// resolved.
    fn at(&self, time: usize, inst: &Instance<'_>) -> Result<RandomVariable>;

    /// Sum of the values from `from` to `to`, both inclusive.
    ///
    /// # Errors
    /// Returns an error if `from > to` or any value cannot be resolved.
    fn collapse(&self, from: usize, to: usize, inst: &Instance<'_>) -> Result<RandomVariable> {
        if from > to {
            return Err(ModelError::invalid_parameter(
                "from",
                from as f64,
                "must not exceed to",
            ));
        }
        let mut sum = self.at(from, inst)?;
        for time in from + 1..=to {
            sum = sum.plus(&self.at(time, inst)?);
        }
        Ok(sum)
    }

    /// Component-wise sum.
    fn plus<S>(self, other: S) -> CombinedSeries
    where
        Self: Sized + 'static,
        S: TimeSeries + 'static,
    {
        CombinedSeries::new(self, other, BinaryOperation::Add)
    }

    /// Component-wise difference.
    fn minus<S>(self, other: S) -> CombinedSeries
    where
        Self: Sized + 'static,
        S: TimeSeries + 'static,
    {
        CombinedSeries::new(self, other, BinaryOperation::Sub)
    }

    /// Component-wise maximum.
    fn max<S>(self, other: S) -> CombinedSeries
    where
        Self: Sized + 'static,
        S: TimeSeries + 'static,
    {
        CombinedSeries::new(self, other, BinaryOperation::Max)
    }

    /// Every value times the variable `factor`.
    fn times(self, factor: impl Into<VarId>) -> ScaledSeries
    where
        Self: Sized + 'static,
    {
        ScaledSeries::by_variable(self, factor, BinaryOperation::Mul)
    }

    /// Every value divided by the variable `divisor`.
    fn div(self, divisor: impl Into<VarId>) -> ScaledSeries
    where
        Self: Sized + 'static,
    {
        ScaledSeries::by_variable(self, divisor, BinaryOperation::Div)
    }

    /// Every value times a dimensionless constant.
    fn times_scalar(self, factor: f64) -> ScaledSeries
    where
        Self: Sized + 'static,
    {
        ScaledSeries::by_scalar(self, factor)
    }

    /// Change from the previous step; zero at time 0.
    fn differential(self) -> DifferentialSeries
    where
        Self: Sized + 'static,
    {
        DifferentialSeries::new(self)
    }

    /// The series shifted `delay` steps later, zero before.
    fn delayed(self, delay: usize) -> DelayedSeries
    where
        Self: Sized + 'static,
    {
        DelayedSeries::new(self, delay)
    }

    /// Follows this series until `years_until`, then shrinks by `shrink_rate` per step.
    fn shrink_after(
        self,
        years_until: impl Into<VarId>,
        shrink_rate: impl Into<VarId>,
    ) -> ShrinkAfterSeries
    where
        Self: Sized + 'static,
    {
        ShrinkAfterSeries::new(self, years_until, shrink_rate)
    }
}

impl<S: TimeSeries + ?Sized> TimeSeries for Arc<S> {
    fn at(&self, time: usize, inst: &Instance<'_>) -> Result<RandomVariable> {
        (**self).at(time, inst)
    }

    fn collapse(&self, from: usize, to: usize, inst: &Instance<'_>) -> Result<RandomVariable> {
        (**self).collapse(from, to, inst)
    }
}

type SharedSeries = Arc<dyn TimeSeries>;

/// A producer for the value of `series` at `time`, for use with [`crate::Model::add`].
///
/// Where the value at `time` is a bare named variable, as with [`ConcreteSeries`] or
/// [`ExponentialGrowthSeries`] at time 0, that variable already persists under its own id.
/// Register such producers with [`crate::Model::add_raw`]; [`crate::Model::add`] fails with
/// [`ModelError::ConflictingPersistentId`].
pub fn value_at<S>(
    series: &Arc<S>,
    time: usize,
) -> impl Fn(&Instance<'_>) -> Result<RandomVariable> + Send + Sync + 'static
where
    S: TimeSeries + ?Sized + 'static,
{
    let series = Arc::clone(series);
    move |inst: &Instance<'_>| series.at(time, inst)
}

/// A producer for the sum of `series` over `from..=to`.
///
/// With `from == to` the sum is the value at that time; the note on [`value_at`] applies.
pub fn sum_over<S>(
    series: &Arc<S>,
    from: usize,
    to: usize,
) -> impl Fn(&Instance<'_>) -> Result<RandomVariable> + Send + Sync + 'static
where
    S: TimeSeries + ?Sized + 'static,
{
    let series = Arc::clone(series);
    move |inst: &Instance<'_>| series.collapse(from, to, inst)
}

/// What a [`ConcreteSeries`] does past its last id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Repeat {
    /// Times past the end are an error.
    None,
    /// Times past the end repeat the last id.
    Last,
}

/// A series backed by one named variable per time step.
#[derive(Clone, Debug)]
pub struct ConcreteSeries {
    ids: Vec<VarId>,
    repeat: Repeat,
}

impl ConcreteSeries {
    /// # Errors
    /// Returns [`ModelError::EmptyData`] if no ids are given.
    pub fn new<I>(repeat: Repeat, ids: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<VarId>,
    {
        let ids: Vec<VarId> = ids.into_iter().map(Into::into).collect();
        if ids.is_empty() {
            return Err(ModelError::EmptyData { what: "series ids" });
        }
        Ok(Self { ids, repeat })
    }
}

impl TimeSeries for ConcreteSeries {
    fn at(&self, time: usize, inst: &Instance<'_>) -> Result<RandomVariable> {
        let id = match (self.ids.get(time), self.repeat) {
            (Some(id), _) => id,
            (None, Repeat::Last) => &self.ids[self.ids.len() - 1],
            (None, Repeat::None) => {
                return Err(ModelError::IndexOutOfRange {
                    index: time as i64,
                    len: self.ids.len(),
                });
            }
        };
        inst.get(id)
    }
}

/// `base` at time 0, each later step the previous one times `growth_rate`.
#[derive(Clone, Debug)]
pub struct ExponentialGrowthSeries {
    base: VarId,
    growth_rate: VarId,
}

impl ExponentialGrowthSeries {
    #[must_use]
    pub fn new(base: impl Into<VarId>, growth_rate: impl Into<VarId>) -> Self {
        Self {
            base: base.into(),
            growth_rate: growth_rate.into(),
        }
    }
}

impl TimeSeries for ExponentialGrowthSeries {
    fn at(&self, time: usize, inst: &Instance<'_>) -> Result<RandomVariable> {
        let mut value = inst.get(&self.base)?;
        if time > 0 {
            let rate = inst.get(&self.growth_rate)?;
            for _ in 0..time {
                value = value.times(&rate);
            }
        }
        Ok(value)
    }
}

/// `base + growth * time`.
#[derive(Clone, Debug)]
pub struct LinearGrowthSeries {
    base: VarId,
    growth: VarId,
}

impl LinearGrowthSeries {
    #[must_use]
    pub fn new(base: impl Into<VarId>, growth: impl Into<VarId>) -> Self {
        Self {
            base: base.into(),
            growth: growth.into(),
        }
    }
}

impl TimeSeries for LinearGrowthSeries {
    fn at(&self, time: usize, inst: &Instance<'_>) -> Result<RandomVariable> {
        Ok(inst
            .get(&self.base)?
            .plus(&inst.get(&self.growth)?.times_scalar(time as f64)))
    }
}

pub struct DelayedSeries {
    base: SharedSeries,
    delay: usize,
}

impl DelayedSeries {
    pub fn new(base: impl TimeSeries + 'static, delay: usize) -> Self {
        Self {
            base: Arc::new(base),
            delay,
        }
    }
}

impl TimeSeries for DelayedSeries {
    fn at(&self, time: usize, inst: &Instance<'_>) -> Result<RandomVariable> {
        if time < self.delay {
            let unit = self.base.at(0, inst)?.unit().clone();
            Ok(RandomVariable::zero(&unit))
        } else {
            self.base.at(time - self.delay, inst)
        }
    }
}

pub struct DifferentialSeries {
    base: SharedSeries,
}

impl DifferentialSeries {
    pub fn new(base: impl TimeSeries + 'static) -> Self {
        Self {
            base: Arc::new(base),
        }
    }
}

impl TimeSeries for DifferentialSeries {
    fn at(&self, time: usize, inst: &Instance<'_>) -> Result<RandomVariable> {
        if time == 0 {
            return Ok(self.base.at(0, inst)?.times_scalar(0.0));
        }
        Ok(self
            .base
            .at(time, inst)?
            .minus(&self.base.at(time - 1, inst)?))
    }
}

/// Two series joined step by step with a binary operation.
pub struct CombinedSeries {
    left: SharedSeries,
    right: SharedSeries,
    operation: BinaryOperation,
}

impl CombinedSeries {
    pub fn new(
        left: impl TimeSeries + 'static,
        right: impl TimeSeries + 'static,
        operation: BinaryOperation,
    ) -> Self {
        Self {
            left: Arc::new(left),
            right: Arc::new(right),
            operation,
        }
    }
}

impl TimeSeries for CombinedSeries {
    fn at(&self, time: usize, inst: &Instance<'_>) -> Result<RandomVariable> {
        Ok(RandomVariable::binary(
            &self.left.at(time, inst)?,
            &self.right.at(time, inst)?,
            self.operation,
        ))
    }
}

enum Operand {
    Variable(VarId),
    Constant(RandomVariable),
}

/// A series joined with one variable or constant at every step.
pub struct ScaledSeries {
    base: SharedSeries,
    operand: Operand,
    operation: BinaryOperation,
}

impl ScaledSeries {
    pub fn by_variable(
        base: impl TimeSeries + 'static,
        operand: impl Into<VarId>,
        operation: BinaryOperation,
    ) -> Self {
        Self {
            base: Arc::new(base),
            operand: Operand::Variable(operand.into()),
            operation,
        }
    }

    pub fn by_scalar(base: impl TimeSeries + 'static, factor: f64) -> Self {
        Self {
            base: Arc::new(base),
            operand: Operand::Constant(RandomVariable::scalar(factor)),
            operation: BinaryOperation::Mul,
        }
    }
}

impl TimeSeries for ScaledSeries {
    fn at(&self, time: usize, inst: &Instance<'_>) -> Result<RandomVariable> {
        let operand = match &self.operand {
            Operand::Variable(id) => inst.get(id)?,
            Operand::Constant(constant) => constant.clone(),
        };
        Ok(RandomVariable::binary(
            &self.base.at(time, inst)?,
            &operand,
            self.operation,
        ))
    }
}

/// Picks one of two series at every step by the probability variable `prop`.
///
/// With a persistent `prop` a whole draw follows one series; otherwise each step decides
/// on its own.
pub struct ConditionalSeries {
    prop: VarId,
    when_true: SharedSeries,
    when_false: SharedSeries,
}

impl ConditionalSeries {
    pub fn new(
        prop: impl Into<VarId>,
        when_true: impl TimeSeries + 'static,
        when_false: impl TimeSeries + 'static,
    ) -> Self {
        Self {
            prop: prop.into(),
            when_true: Arc::new(when_true),
            when_false: Arc::new(when_false),
        }
    }
}

impl TimeSeries for ConditionalSeries {
    fn at(&self, time: usize, inst: &Instance<'_>) -> Result<RandomVariable> {
        RandomVariable::conditional(
            &inst.get(&self.prop)?,
            &self.when_true.at(time, inst)?,
            &self.when_false.at(time, inst)?,
        )
    }
}

/// Follows `base` while `time <= years_until`, afterwards multiplies the previous step by
/// `shrink_rate`.
///
/// Each step `t` checks `years_until < t`: if true it shrinks the previous value, otherwise it
/// takes `base` at `t`.
pub struct ShrinkAfterSeries {
    base: SharedSeries,
    years_until: VarId,
    shrink_rate: VarId,
}

impl ShrinkAfterSeries {
    pub fn new(
        base: impl TimeSeries + 'static,
        years_until: impl Into<VarId>,
        shrink_rate: impl Into<VarId>,
    ) -> Self {
        Self {
            base: Arc::new(base),
            years_until: years_until.into(),
            shrink_rate: shrink_rate.into(),
        }
    }
}

impl TimeSeries for ShrinkAfterSeries {
    fn at(&self, time: usize, inst: &Instance<'_>) -> Result<RandomVariable> {
        let mut value = self.base.at(0, inst)?;
        if time == 0 {
            return Ok(value);
        }
        let years_until = inst.get(&self.years_until)?;
        let shrink_rate = inst.get(&self.shrink_rate)?;
        for step in 1..=time {
            let past = years_until.less_than(&RandomVariable::scalar(step as f64));
            value = RandomVariable::conditional(
                &past,
                &value.times(&shrink_rate),
                &self.base.at(step, inst)?,
            )?;
        }
        Ok(value)
    }
}

/// Yearly totals of deals that pay once when closed and a maintenance share afterwards.
///
/// In year `t`, `deal_counts(t)` deals close, fractional counts rounding stochastically.
/// Each deal pays `deal_size_initial` in year `t` and `deal_size_initial *
/// maintenance_factor` in each of the following `deal_duration` years. Every year's total
/// persists under its own id, so all values of one draw stem from the same deals.
pub struct DealsOverTimeSeries {
    deal_counts: SharedSeries,
    deal_size_initial: VarId,
    maintenance_factor: VarId,
    deal_duration: VarId,
    year_ids: Arc<YearIds>,
}

impl DealsOverTimeSeries {
    pub fn new(
        deal_counts: impl TimeSeries + 'static,
        deal_size_initial: impl Into<VarId>,
        maintenance_factor: impl Into<VarId>,
        deal_duration: impl Into<VarId>,
    ) -> Self {
        Self {
            deal_counts: Arc::new(deal_counts),
            deal_size_initial: deal_size_initial.into(),
            maintenance_factor: maintenance_factor.into(),
            deal_duration: deal_duration.into(),
            year_ids: Arc::new(YearIds::default()),
        }
    }
}

impl TimeSeries for DealsOverTimeSeries {
    fn at(&self, time: usize, inst: &Instance<'_>) -> Result<RandomVariable> {
        let counts = (0..=time)
            .map(|year| self.deal_counts.at(year, inst))
            .collect::<Result<Vec<_>>>()?;
        let size = inst.get(&self.deal_size_initial)?;
        let unit = size.unit().times(counts[0].unit());
        Ok(RandomVariable::custom(DealsVariable {
            time,
            year_ids: Arc::clone(&self.year_ids),
            counts,
            size,
            maintenance_factor: inst.get(&self.maintenance_factor)?,
            duration: inst.get(&self.deal_duration)?,
            unit,
        }))
    }
}

/// One opaque id per year, shared by every variable the series hands out.
#[derive(Default)]
struct YearIds(Mutex<HashMap<usize, VarId>>);

impl YearIds {
    fn get(&self, year: usize) -> VarId {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(year)
            .or_insert_with(VarId::unique)
            .clone()
    }
}

struct DealsVariable {
    time: usize,
    year_ids: Arc<YearIds>,
    counts: Vec<RandomVariable>,
    size: RandomVariable,
    maintenance_factor: RandomVariable,
    duration: RandomVariable,
    unit: Unit,
}

impl DealsVariable {
    // years are completed in order, so a year's accumulator is final once it is reached
    fn simulate_until_own_year(&self, rng: &mut RandomSource, run: &mut SimulationRun) -> Result<()> {
        for (year, count) in self.counts.iter().enumerate() {
            let id = self.year_ids.get(year);
            if run.has_persistent_value(&id) {
                continue;
            }
            let count = count.observe(rng, run)?.number();
            let deals = rng.round_stochastic(count);
            for _ in 0..deals {
                let size = self.size.observe(rng, run)?;
                let maintenance = size.times(&self.maintenance_factor.observe(rng, run)?);
                let duration = self.duration.observe(rng, run)?.number();
                let duration = rng.round_stochastic(duration);
                add_to_year(run, &id, &size)?;
                for offset in 1..=duration as usize {
                    add_to_year(run, &self.year_ids.get(year + offset), &maintenance)?;
                }
            }
            let total = self.year_total(run, &id)?;
            run.persist(id, total)?;
        }
        Ok(())
    }

    fn year_total(&self, run: &SimulationRun, id: &VarId) -> Result<Quantity> {
        if !run.has_persistent_object(id) {
            return Ok(Quantity::new(0.0, self.unit.clone()));
        }
        match run.persistent_object(id)? {
            PersistentObject::Accumulator(total) => Ok(total.clone()),
            PersistentObject::Values(_) => Err(ModelError::ObjectTypeMismatch(id.to_string())),
        }
    }
}

fn add_to_year(run: &mut SimulationRun, id: &VarId, amount: &Quantity) -> Result<()> {
    if !run.has_persistent_object(id) {
        return run.persist_object(id.clone(), PersistentObject::Accumulator(amount.clone()));
    }
    match run.persistent_object_mut(id)? {
        PersistentObject::Accumulator(total) => {
            *total = total.plus(amount)?;
            Ok(())
        }
        PersistentObject::Values(_) => Err(ModelError::ObjectTypeMismatch(id.to_string())),
    }
}

impl CustomVariable for DealsVariable {
    fn observe(&self, rng: &mut RandomSource, run: &mut SimulationRun) -> Result<Quantity> {
        let own = self.year_ids.get(self.time);
        if !run.has_persistent_value(&own) {
            self.simulate_until_own_year(rng, run)?;
        }
        Ok(run.persistent_value(&own)?.clone())
    }

    fn unit(&self) -> Unit {
        self.unit.clone()
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::model::Model;

    fn observe(variable: &RandomVariable) -> f64 {
        variable
            .observe(&mut RandomSource::seeded(0), &mut SimulationRun::new())
            .unwrap()
            .number()
    }

    fn model_with_years(values: &[f64]) -> (Model, ConcreteSeries) {
        let mut model = Model::new();
        let mut ids = Vec::new();
        for (year, value) in values.iter().enumerate() {
            let id = format!("y{year}");
            model
                .add_var(id.as_str(), RandomVariable::fixed(Quantity::of(*value, "EUR")))
                .unwrap();
            ids.push(id);
        }
        let series = ConcreteSeries::new(Repeat::None, ids).unwrap();
        (model, series)
    }

    #[test]
    fn test_concrete_series_repeat() {
        let (model, strict) = model_with_years(&[1.0, 2.0]);
        let inst = model.instantiate();
        assert_eq!(observe(&strict.at(1, &inst).unwrap()), 2.0);
        assert!(matches!(
            strict.at(2, &inst),
            Err(ModelError::IndexOutOfRange { index: 2, len: 2 })
        ));

        let repeating = ConcreteSeries::new(Repeat::Last, ["y0", "y1"]).unwrap();
        assert_eq!(observe(&repeating.at(7, &inst).unwrap()), 2.0);
        assert!(ConcreteSeries::new(Repeat::Last, Vec::<VarId>::new()).is_err());
    }

    #[test]
    fn test_linear_growth() {
        let mut model = Model::new();
        model.add_var("start", RandomVariable::scalar(5.0)).unwrap();
        model.add_var("step", RandomVariable::scalar(2.0)).unwrap();
        let series = LinearGrowthSeries::new("start", "step");
        let inst = model.instantiate();
        assert_eq!(observe(&series.at(0, &inst).unwrap()), 5.0);
        assert_eq!(observe(&series.at(3, &inst).unwrap()), 11.0);
    }

    #[test]
    fn test_delayed_and_differential() {
        let (model, series) = model_with_years(&[1.0, 4.0, 9.0]);
        let inst = model.instantiate();
        let shared = Arc::new(series);

        let delayed = Arc::clone(&shared).delayed(1);
        let zero = delayed.at(0, &inst).unwrap();
        assert_eq!(observe(&zero), 0.0);
        assert_eq!(zero.unit().to_string(), "EUR");
        assert_eq!(observe(&delayed.at(2, &inst).unwrap()), 4.0);

        let slope = Arc::clone(&shared).differential();
        assert_eq!(observe(&slope.at(0, &inst).unwrap()), 0.0);
        assert_eq!(observe(&slope.at(2, &inst).unwrap()), 5.0);
    }

    #[test]
    fn test_combined_and_scaled() {
        let (mut model, series) = model_with_years(&[1.0, 2.0]);
        model.add_var("share", RandomVariable::scalar(0.5)).unwrap();
        let shared = Arc::new(series);
        let inst = model.instantiate();

        let doubled = Arc::clone(&shared).plus(Arc::clone(&shared));
        assert_eq!(observe(&doubled.at(1, &inst).unwrap()), 4.0);
        let none = Arc::clone(&shared).minus(Arc::clone(&shared));
        assert_eq!(observe(&none.at(1, &inst).unwrap()), 0.0);

        let halved = Arc::clone(&shared).times("share");
        assert_eq!(observe(&halved.at(1, &inst).unwrap()), 1.0);
        let per_share = Arc::clone(&shared).div("share");
        assert_eq!(observe(&per_share.at(1, &inst).unwrap()), 4.0);
        let tripled = Arc::clone(&shared).times_scalar(3.0);
        assert_eq!(observe(&tripled.at(0, &inst).unwrap()), 3.0);
    }

    #[test]
    fn test_collapse() {
        let (model, series) = model_with_years(&[1.0, 2.0, 3.0, 4.0]);
        let inst = model.instantiate();
        assert_eq!(observe(&series.collapse(1, 3, &inst).unwrap()), 9.0);
        assert_eq!(observe(&series.collapse(2, 2, &inst).unwrap()), 3.0);
        assert!(series.collapse(3, 1, &inst).is_err());
    }

    #[test]
    fn test_conditional_series() {
        let (mut model, series) = model_with_years(&[1.0, 2.0]);
        model.add_var("always", RandomVariable::scalar(1.0)).unwrap();
        model.add_var("never", RandomVariable::scalar(0.0)).unwrap();
        let shared = Arc::new(series);
        let inst = model.instantiate();

        let tripled = Arc::clone(&shared).times_scalar(3.0);
        let chosen = ConditionalSeries::new("always", Arc::clone(&shared), tripled);
        assert_eq!(observe(&chosen.at(1, &inst).unwrap()), 2.0);

        let tripled = Arc::clone(&shared).times_scalar(3.0);
        let other = ConditionalSeries::new("never", Arc::clone(&shared), tripled);
        assert_eq!(observe(&other.at(1, &inst).unwrap()), 6.0);
    }

    #[test]
    fn test_shrink_after() {
        let mut model = Model::new();
        model
            .add_var("base", RandomVariable::fixed(Quantity::of(100.0, "EUR")))
            .unwrap();
        model.add_var("growth", RandomVariable::scalar(2.0)).unwrap();
        model.add_var("until", RandomVariable::scalar(2.0)).unwrap();
        model.add_var("rate", RandomVariable::scalar(0.5)).unwrap();
        let series = ExponentialGrowthSeries::new("base", "growth").shrink_after("until", "rate");
        let inst = model.instantiate();

        let values: Vec<f64> = (0..5)
            .map(|t| observe(&series.at(t, &inst).unwrap()))
            .collect();
        assert_eq!(values, [100.0, 200.0, 400.0, 200.0, 100.0]);
    }

    #[test]
    fn test_value_at_registers_in_model() {
        let (mut model, series) = model_with_years(&[1.0, 2.0, 3.0]);
        let shared = Arc::new(series);
        model.add_raw("last", value_at(&shared, 2)).unwrap();
        model.add("total", sum_over(&shared, 0, 2)).unwrap();
        let inst = model.instantiate();
        assert_eq!(observe(&inst.get("last").unwrap()), 3.0);
        assert_eq!(observe(&inst.get("total").unwrap()), 6.0);
    }

    #[test]
    fn test_named_series_value_needs_raw_registration() {
        let (mut model, series) = model_with_years(&[1.0, 2.0]);
        let shared = Arc::new(series);
        model.add("first", value_at(&shared, 0)).unwrap();
        model.add("single", sum_over(&shared, 1, 1)).unwrap();
        model.add_raw("first_raw", value_at(&shared, 0)).unwrap();
        let inst = model.instantiate();

        assert!(matches!(
            inst.get("first"),
            Err(ModelError::ConflictingPersistentId { .. })
        ));
        assert!(matches!(
            inst.get("single"),
            Err(ModelError::ConflictingPersistentId { .. })
        ));
        let raw = inst.get("first_raw").unwrap();
        assert_eq!(raw.persistent_id(), Some(&VarId::named("y0")));
        assert_eq!(observe(&raw), 1.0);
    }

    #[test]
    fn test_deals_without_deals_are_zero() {
        let mut model = Model::new();
        model.add_var("none", RandomVariable::scalar(0.0)).unwrap();
        model
            .add_var("size", RandomVariable::fixed(Quantity::of(50.0, "EUR")))
            .unwrap();
        model.add_var("factor", RandomVariable::scalar(0.2)).unwrap();
        model.add_var("duration", RandomVariable::scalar(1.0)).unwrap();
        let counts = ConcreteSeries::new(Repeat::Last, ["none"]).unwrap();
        let deals = DealsOverTimeSeries::new(counts, "size", "factor", "duration");
        let inst = model.instantiate();

        let year = deals.at(3, &inst).unwrap();
        assert_eq!(year.unit().to_string(), "EUR");
        let q = year
            .observe(&mut RandomSource::seeded(1), &mut SimulationRun::new())
            .unwrap();
        assert_eq!(q, Quantity::of(0.0, "EUR"));
    }
}
