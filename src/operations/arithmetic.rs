use crate::error::Result;
use crate::quantity::Quantity;
use crate::unit::Unit;
use crate::variable::{Node, RandomVariable};
use std::cmp::Ordering;
use std::ops::{Add, Div, Mul, Sub};

/// Binary operation types for the expression graph
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOperation {
    Add,
    Sub,
    Mul,
    Div,
    /// The larger operand; units must match.
    Max,
    /// Scalar 1 if the left operand is smaller, else 0; units must match.
    LessThan,
}

impl BinaryOperation {
    /// Applies the operation to two observed quantities.
    ///
    /// # Errors
    /// Returns [`crate::ModelError::IncompatibleUnits`] for additive and comparing
    /// operations on operands with different units.
    pub fn apply(self, left: &Quantity, right: &Quantity) -> Result<Quantity> {
        match self {
            BinaryOperation::Add => left.plus(right),
            BinaryOperation::Sub => left.minus(right),
            BinaryOperation::Mul => Ok(left.times(right)),
            BinaryOperation::Div => Ok(left.div(right)),
            BinaryOperation::Max => match left.compare(right)? {
                Ordering::Less => Ok(right.clone()),
                _ => Ok(left.clone()),
            },
            BinaryOperation::LessThan => {
                let less = left.compare(right)? == Ordering::Less;
                Ok(Quantity::scalar(if less { 1.0 } else { 0.0 }))
            }
        }
    }

    /// Unit of the result given the operand units.
    #[must_use]
    pub fn unit(self, left: &Unit, right: &Unit) -> Unit {
        match self {
            BinaryOperation::Add | BinaryOperation::Sub | BinaryOperation::Max => left.clone(),
            BinaryOperation::Mul => left.times(right),
            BinaryOperation::Div => left.div(right),
            BinaryOperation::LessThan => Unit::scalar(),
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            BinaryOperation::Add => "Sum",
            BinaryOperation::Sub => "Difference",
            BinaryOperation::Mul => "Product",
            BinaryOperation::Div => "Quotient",
            BinaryOperation::Max => "Max",
            BinaryOperation::LessThan => "LessThan",
        }
    }
}

impl RandomVariable {
    pub(crate) fn binary(
        left: &RandomVariable,
        right: &RandomVariable,
        operation: BinaryOperation,
    ) -> RandomVariable {
        RandomVariable::from_node(Node::Binary {
            left: left.clone(),
            right: right.clone(),
            operation,
        })
    }

    /// Sum of two variables. Observation fails if the units differ.
    #[must_use]
    pub fn plus(&self, other: &RandomVariable) -> RandomVariable {
        Self::binary(self, other, BinaryOperation::Add)
    }

    /// Difference of two variables. Observation fails if the units differ.
    #[must_use]
    pub fn minus(&self, other: &RandomVariable) -> RandomVariable {
        Self::binary(self, other, BinaryOperation::Sub)
    }

    #[must_use]
    pub fn times(&self, other: &RandomVariable) -> RandomVariable {
        Self::binary(self, other, BinaryOperation::Mul)
    }

    #[must_use]
    pub fn div(&self, other: &RandomVariable) -> RandomVariable {
        Self::binary(self, other, BinaryOperation::Div)
    }

    /// Multiplies by a dimensionless constant.
    ///
    /// # Example
    /// ```rust
    /// use infoecon_rs::{Quantity, RandomSource, RandomVariable, SimulationRun};
    ///
    /// let cost = RandomVariable::fixed(Quantity::of(100.0, "EUR"));
    /// let share = cost.times_scalar(0.25);
    /// let q = share
    ///     .observe(&mut RandomSource::seeded(0), &mut SimulationRun::new())
    ///     .unwrap();
    /// assert_eq!(q, Quantity::of(25.0, "EUR"));
    /// ```
    #[must_use]
    pub fn times_scalar(&self, factor: f64) -> RandomVariable {
        self.times(&RandomVariable::scalar(factor))
    }
}

macro_rules! impl_binary_operator {
    ($trait:ident, $method:ident, $operation:expr) => {
        impl $trait for RandomVariable {
            type Output = RandomVariable;

            fn $method(self, rhs: Self) -> Self::Output {
                RandomVariable::binary(&self, &rhs, $operation)
            }
        }

        impl $trait for &RandomVariable {
            type Output = RandomVariable;

            fn $method(self, rhs: Self) -> Self::Output {
                RandomVariable::binary(self, rhs, $operation)
            }
        }

        impl $trait<&RandomVariable> for RandomVariable {
            type Output = RandomVariable;

            fn $method(self, rhs: &RandomVariable) -> Self::Output {
                RandomVariable::binary(&self, rhs, $operation)
            }
        }
    };
}

impl_binary_operator!(Add, add, BinaryOperation::Add);
impl_binary_operator!(Sub, sub, BinaryOperation::Sub);
impl_binary_operator!(Mul, mul, BinaryOperation::Mul);
impl_binary_operator!(Div, div, BinaryOperation::Div);

// Scaling by plain numbers keeps the unit
impl Mul<f64> for RandomVariable {
    type Output = RandomVariable;

    fn mul(self, rhs: f64) -> Self::Output {
        self.times_scalar(rhs)
    }
}

impl Mul<RandomVariable> for f64 {
    type Output = RandomVariable;

    fn mul(self, rhs: RandomVariable) -> Self::Output {
        RandomVariable::scalar(self).times(&rhs)
    }
}

impl Div<f64> for RandomVariable {
    type Output = RandomVariable;

    fn div(self, rhs: f64) -> Self::Output {
        RandomVariable::div(&self, &RandomVariable::scalar(rhs))
    }
}
