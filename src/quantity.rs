//! Numbers tagged with a [`Unit`].

use crate::error::{ModelError, Result};
use crate::unit::Unit;
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Div, Mul};

/// A numeric value with a unit.
///
/// Addition and subtraction require equal units; multiplication and division compose
/// units and never fail. Currency times a scalar probability stays currency, while
/// currency plus hours is rejected.
///
/// # Example
/// ```rust
/// use infoecon_rs::{Quantity, Unit};
///
/// let price = Quantity::of(4.0, "EUR");
/// let total = price.plus(&Quantity::of(3.0, "EUR")).unwrap();
/// assert_eq!(total, Quantity::of(7.0, "EUR"));
/// assert!(price.plus(&Quantity::of(3.0, "h")).is_err());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Quantity {
    value: f64,
    unit: Unit,
}

impl Quantity {
    /// A quantity with a single-symbol unit.
    #[must_use]
    pub fn of(value: f64, unit: &str) -> Self {
        Self::new(value, Unit::of(unit))
    }

    #[must_use]
    pub fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    /// A dimensionless quantity.
    #[must_use]
    pub fn scalar(value: f64) -> Self {
        Self::new(value, Unit::scalar())
    }

    #[must_use]
    pub fn number(&self) -> f64 {
        self.value
    }

    #[must_use]
    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    /// Sum of two quantities with equal units.
    ///
    /// # Errors
    /// Returns [`ModelError::IncompatibleUnits`] when the units differ.
    pub fn plus(&self, other: &Quantity) -> Result<Quantity> {
        self.ensure_same_unit(other)?;
        Ok(Self::new(self.value + other.value, self.unit.clone()))
    }

    /// Difference of two quantities with equal units.
    ///
    /// # Errors
    /// Returns [`ModelError::IncompatibleUnits`] when the units differ.
    pub fn minus(&self, other: &Quantity) -> Result<Quantity> {
        self.ensure_same_unit(other)?;
        Ok(Self::new(self.value - other.value, self.unit.clone()))
    }

    #[must_use]
    pub fn times(&self, other: &Quantity) -> Quantity {
        Self::new(self.value * other.value, self.unit.times(&other.unit))
    }

    #[must_use]
    pub fn div(&self, other: &Quantity) -> Quantity {
        Self::new(self.value / other.value, self.unit.div(&other.unit))
    }

    /// Compares two quantities with equal units.
    ///
    /// # Errors
    /// Returns [`ModelError::IncompatibleUnits`] when the units differ.
    pub fn compare(&self, other: &Quantity) -> Result<Ordering> {
        self.ensure_same_unit(other)?;
        Ok(self.value.total_cmp(&other.value))
    }

    fn ensure_same_unit(&self, other: &Quantity) -> Result<()> {
        if self.unit == other.unit {
            Ok(())
        } else {
            Err(ModelError::incompatible_units(&self.unit, &other.unit))
        }
    }
}

impl Mul for &Quantity {
    type Output = Quantity;

    fn mul(self, rhs: Self) -> Quantity {
        self.times(rhs)
    }
}

impl Div for &Quantity {
    type Output = Quantity;

    fn div(self, rhs: Self) -> Quantity {
        Quantity::div(self, rhs)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", format_grouped(self.value), self.unit)
    }
}

/// Two fraction digits, decimal comma, dot-grouped thousands: `1.234.567,10`.
pub(crate) fn format_grouped(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let negative = value < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0');
    format!("{}{grouped},{frac_part}", if negative { "-" } else { "" })
}

/// At most `max_fraction` digits, trailing zeros dropped, decimal comma, no grouping.
pub(crate) fn format_decimal_comma(value: f64, max_fraction: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let fixed = format!("{value:.max_fraction$}");
    let trimmed = if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.')
    } else {
        fixed.as_str()
    };
    if trimmed == "-0" {
        return "0".to_string();
    }
    trimmed.replace('.', ",")
}
