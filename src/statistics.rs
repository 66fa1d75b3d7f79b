#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]

use crate::error::{ModelError, Result};
use crate::quantity::Quantity;
use crate::random::RandomSource;
use crate::run::SimulationRun;
use crate::unit::Unit;
use crate::variable::RandomVariable;
use std::fmt;

/// Running mean kept as `(sum, count)` so partial results merge exactly.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Mean {
    sum: f64,
    count: u64,
}

impl Mean {
    #[must_use]
    pub fn of(numbers: &[f64]) -> Self {
        Self {
            sum: numbers.iter().sum(),
            count: numbers.len() as u64,
        }
    }

    /// The mean of nothing; [`Mean::get`] is NaN until something is added.
    #[must_use]
    pub fn undefined() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self) -> f64 {
        self.sum / self.count as f64
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    #[must_use]
    pub fn is_defined(&self) -> bool {
        self.count > 0
    }

    /// Merges two means as if their underlying numbers had been pooled.
    #[must_use]
    pub fn add(&self, other: &Mean) -> Mean {
        Mean {
            sum: self.sum + other.sum,
            count: self.count + other.count,
        }
    }
}

impl fmt::Display for Mean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Quantity::scalar(self.get()))
    }
}

/// Sorted Monte Carlo draws of one variable.
///
/// # Example
/// ```rust
/// use infoecon_rs::{Sample, Unit};
///
/// let sample = Sample::new(vec![3.0, 1.0, 2.0], Unit::of("EUR")).unwrap();
/// assert_eq!(sample.min(), 1.0);
/// assert_eq!(sample.median(), 2.0);
/// assert_eq!(sample.mean(), 2.0);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    numbers: Vec<f64>,
    unit: Unit,
}

impl Sample {
    /// # Errors
    /// Returns [`ModelError::EmptyData`] if `numbers` is empty.
    pub fn new(mut numbers: Vec<f64>, unit: Unit) -> Result<Self> {
        if numbers.is_empty() {
            return Err(ModelError::EmptyData { what: "sample" });
        }
        numbers.sort_by(f64::total_cmp);
        Ok(Self { numbers, unit })
    }

    #[must_use]
    pub fn numbers(&self) -> &[f64] {
        &self.numbers
    }

    #[must_use]
    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    #[must_use]
    pub fn mean(&self) -> f64 {
        Mean::of(&self.numbers).get()
    }

    #[must_use]
    pub fn mean_quantity(&self) -> Quantity {
        Quantity::new(self.mean(), self.unit.clone())
    }

    #[must_use]
    pub fn min(&self) -> f64 {
        self.numbers[0]
    }

    #[must_use]
    pub fn max(&self) -> f64 {
        self.numbers[self.numbers.len() - 1]
    }

    /// The element at index `len / 2`.
    #[must_use]
    pub fn median(&self) -> f64 {
        self.numbers[self.numbers.len() / 2]
    }

    /// First and third quartile, the elements at `len / 4` and `len * 3 / 4`.
    #[must_use]
    pub fn quartiles(&self) -> (f64, f64) {
        let n = self.numbers.len();
        (self.numbers[n / 4], self.numbers[n * 3 / 4])
    }

    fn quantity(&self, value: f64) -> Quantity {
        Quantity::new(value, self.unit.clone())
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (first, third) = self.quartiles();
        let rows = [
            ("Mean:    ", self.mean()),
            ("Min:     ", self.min()),
            ("1. Quart:", first),
            ("Median:  ", self.median()),
            ("3. Quart:", third),
            ("Max:     ", self.max()),
        ];
        for (label, value) in rows {
            writeln!(f, "{label} {:>17}", self.quantity(value).to_string())?;
        }
        Ok(())
    }
}

/// Expected cost of deciding on the sign of a payoff without knowing it.
///
/// Going ahead loses the negative draws, holding back forgoes the positive ones; the
/// better of the two choices still pays the smaller of both averages.
///
/// # Errors
/// Returns [`ModelError::EmptyData`] if `samples` is empty.
///
/// # Example
/// ```rust
/// use infoecon_rs::statistics::value_of_perfect_information;
///
/// let vopi = value_of_perfect_information(&[-2.0, 1.0, 3.0, -1.0]).unwrap();
/// assert_eq!(vopi, 0.75);
/// ```
pub fn value_of_perfect_information(samples: &[f64]) -> Result<f64> {
    if samples.is_empty() {
        return Err(ModelError::EmptyData { what: "samples" });
    }
    let (losses, gains) = samples.iter().fold((0.0, 0.0), |(neg, pos), &x| {
        if x < 0.0 {
            (neg - x, pos)
        } else {
            (neg, pos + x)
        }
    });
    Ok(losses.min(gains) / samples.len() as f64)
}

/// Sequential sampling helpers, independent of any model
impl RandomVariable {
    /// Draws `count` values with a fresh [`SimulationRun`] per draw.
    ///
    /// # Errors
    /// Returns an error if `count` is zero or an observation fails.
    ///
    /// # Example
    /// ```rust
    /// use infoecon_rs::{RandomVariable, Unit};
    ///
    /// let v = RandomVariable::block(3.0, 8.0, Unit::of("h")).unwrap();
    /// let sample = v.sample(42, 1_000).unwrap();
    /// assert_eq!(sample.len(), 1_000);
    /// ```
    pub fn sample(&self, seed: u64, count: usize) -> Result<Sample> {
        if count == 0 {
            return Err(ModelError::invalid_sample_count(count, "must be positive"));
        }
        let mut rng = RandomSource::seeded(seed);
        let numbers = (0..count)
            .map(|_| {
                self.observe(&mut rng, &mut SimulationRun::new())
                    .map(|q| q.number())
            })
            .collect::<Result<Vec<_>>>()?;
        Sample::new(numbers, self.unit().clone())
    }

    /// # Errors
    /// Returns an error if `count` is zero or an observation fails.
    pub fn mean(&self, seed: u64, count: usize) -> Result<Mean> {
        Ok(Mean::of(self.sample(seed, count)?.numbers()))
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_merge() {
        let a = Mean::of(&[1.0, 2.0, 3.0]);
        let b = Mean::of(&[10.0]);
        let merged = a.add(&b);
        assert_eq!(merged.count(), 4);
        assert_eq!(merged.get(), 4.0);
    }

    #[test]
    fn test_mean_undefined() {
        let undefined = Mean::undefined();
        assert!(!undefined.is_defined());
        assert!(undefined.get().is_nan());
        assert_eq!(undefined.add(&Mean::of(&[2.0])).get(), 2.0);
    }

    #[test]
    fn test_mean_display() {
        assert_eq!(Mean::of(&[1.0, 2.0]).to_string(), "1,50");
    }

    #[test]
    fn test_sample_statistics() {
        let sample = Sample::new((1..=8).rev().map(f64::from).collect(), Unit::scalar()).unwrap();
        assert_eq!(sample.min(), 1.0);
        assert_eq!(sample.max(), 8.0);
        assert_eq!(sample.median(), 5.0);
        assert_eq!(sample.quartiles(), (3.0, 7.0));
        assert_eq!(sample.mean(), 4.5);
    }

    #[test]
    fn test_sample_rejects_empty() {
        assert!(Sample::new(Vec::new(), Unit::scalar()).is_err());
    }

    #[test]
    fn test_sample_display() {
        let sample = Sample::new(vec![1.0, 2.0, 3.0], Unit::of("EUR")).unwrap();
        let text = sample.to_string();
        assert!(text.starts_with("Mean:               2,00EUR\n"));
        assert!(text.contains("Max:                3,00EUR"));
        assert_eq!(text.lines().count(), 6);
    }

    #[test]
    fn test_value_of_perfect_information() {
        assert_eq!(value_of_perfect_information(&[1.0, 2.0]).unwrap(), 0.0);
        assert_eq!(value_of_perfect_information(&[-1.0, -2.0]).unwrap(), 0.0);
        assert_eq!(
            value_of_perfect_information(&[-4.0, 2.0, 2.0, 0.0]).unwrap(),
            1.0
        );
        assert!(value_of_perfect_information(&[]).is_err());
    }

    #[test]
    fn test_random_variable_sample_is_reproducible() {
        let v = RandomVariable::normal(5.0, 1.0, Unit::of("h")).unwrap();
        let a = v.sample(7, 500).unwrap();
        let b = v.sample(7, 500).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.unit().to_string(), "h");
        assert!((v.mean(7, 5_000).unwrap().get() - 5.0).abs() < 0.1);
        assert!(v.sample(7, 0).is_err());
    }
}
