use crate::operations::BinaryOperation;
use crate::variable::RandomVariable;

// Comparisons between two random variables
impl RandomVariable {
    /// The larger of two draws.
    ///
    /// # Example
    /// ```rust
    /// use infoecon_rs::{Quantity, RandomSource, RandomVariable, SimulationRun};
    ///
    /// let floor = RandomVariable::fixed(Quantity::of(10.0, "EUR"));
    /// let bid = RandomVariable::fixed(Quantity::of(7.0, "EUR"));
    /// let q = bid
    ///     .max(&floor)
    ///     .observe(&mut RandomSource::seeded(0), &mut SimulationRun::new())
    ///     .unwrap();
    /// assert_eq!(q, Quantity::of(10.0, "EUR"));
    /// ```
    #[must_use]
    pub fn max(&self, other: &RandomVariable) -> RandomVariable {
        Self::binary(self, other, BinaryOperation::Max)
    }

    /// Scalar indicator: 1 when this draw is smaller than the other, else 0.
    #[must_use]
    pub fn less_than(&self, other: &RandomVariable) -> RandomVariable {
        Self::binary(self, other, BinaryOperation::LessThan)
    }

    #[must_use]
    pub fn greater_than(&self, other: &RandomVariable) -> RandomVariable {
        other.less_than(self)
    }
}
