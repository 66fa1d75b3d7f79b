//! Dimensional units built from named symbols.

use std::fmt;
use std::ops::{Div, Mul};
use std::sync::Arc;

/// A dimensional unit: symbols in the numerator and the denominator.
///
/// Construction cancels matching symbols pairwise (one numerator symbol removes the first
/// equal denominator symbol) and sorts both sides, so equal units compare and print equally.
/// Units are immutable and cheap to clone.
///
/// # Example
/// ```rust
/// use infoecon_rs::Unit;
///
/// let eur = Unit::of("EUR");
/// let h = Unit::of("h");
/// assert_eq!((&eur / &h).to_string(), "EUR/h");
/// assert_eq!(&(&eur * &h) / &h, eur);
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Unit(Arc<UnitRepr>);

#[derive(PartialEq, Eq, Hash)]
struct UnitRepr {
    numer: Vec<String>,
    denom: Vec<String>,
}

impl Unit {
    fn new(mut numer: Vec<String>, mut denom: Vec<String>) -> Self {
        numer.retain(|symbol| match denom.iter().position(|d| d == symbol) {
            Some(idx) => {
                denom.remove(idx);
                false
            }
            None => true,
        });
        numer.sort();
        denom.sort();
        Self(Arc::new(UnitRepr { numer, denom }))
    }

    /// A unit consisting of a single symbol.
    #[must_use]
    pub fn of(symbol: &str) -> Self {
        Self::new(vec![symbol.to_string()], Vec::new())
    }

    /// The dimensionless unit.
    #[must_use]
    pub fn scalar() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    #[must_use]
    pub fn is_scalar(&self) -> bool {
        self.0.numer.is_empty() && self.0.denom.is_empty()
    }

    #[must_use]
    pub fn numerator(&self) -> &[String] {
        &self.0.numer
    }

    #[must_use]
    pub fn denominator(&self) -> &[String] {
        &self.0.denom
    }

    /// Product of two units.
    #[must_use]
    pub fn times(&self, other: &Unit) -> Unit {
        Self::new(
            combine(&self.0.numer, &other.0.numer),
            combine(&self.0.denom, &other.0.denom),
        )
    }

    /// Quotient of two units.
    #[must_use]
    pub fn div(&self, other: &Unit) -> Unit {
        Self::new(
            combine(&self.0.numer, &other.0.denom),
            combine(&self.0.denom, &other.0.numer),
        )
    }
}

fn combine(first: &[String], second: &[String]) -> Vec<String> {
    first.iter().chain(second).cloned().collect()
}

impl Default for Unit {
    fn default() -> Self {
        Self::scalar()
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let UnitRepr { numer, denom } = &*self.0;
        if numer.is_empty() {
            if !denom.is_empty() {
                f.write_str("1")?;
            }
        } else {
            f.write_str(&numer.join("*"))?;
        }
        if !denom.is_empty() {
            write!(f, "/{}", denom.join("*"))?;
        }
        Ok(())
    }
}

impl fmt::Debug for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unit({self})")
    }
}

impl Mul for &Unit {
    type Output = Unit;

    fn mul(self, rhs: Self) -> Unit {
        self.times(rhs)
    }
}

impl Div for &Unit {
    type Output = Unit;

    fn div(self, rhs: Self) -> Unit {
        Unit::div(self, rhs)
    }
}
