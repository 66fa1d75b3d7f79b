//! Error types for the infoecon-rs library.
//!
//! Every failure in this crate is a defect in the model definition or in a custom variable,
//! never a transient condition. Nothing is retried; errors travel up to the caller.

use crate::unit::Unit;
use crate::var_id::VarId;
use thiserror::Error;

/// The main error type for the infoecon-rs library.
#[derive(Error, Debug)]
pub enum ModelError {
    /// Two quantities with different units were added, subtracted or compared.
    #[error("Incompatible units: {left} vs {right}")]
    IncompatibleUnits {
        /// Unit of the left operand
        left: Unit,
        /// Unit of the right operand
        right: Unit,
    },

    /// A distribution parameter violates its constraint.
    #[error("Invalid parameter '{parameter}': value {value} {constraint}")]
    InvalidParameter {
        /// The name of the parameter
        parameter: &'static str,
        /// The invalid value
        value: f64,
        /// A description of the constraint that was violated
        constraint: &'static str,
    },

    /// A distribution parameter is NaN or infinite.
    #[error("Non-finite parameter '{parameter}': {value}")]
    NonFiniteParameter {
        /// The name of the parameter
        parameter: &'static str,
        /// The non-finite value
        value: f64,
    },

    /// An empty value list was given where at least one element is required.
    #[error("Empty data: {what} cannot be empty")]
    EmptyData {
        /// What was empty
        what: &'static str,
    },

    /// A variable id was registered twice.
    #[error("Duplicate definition: {0} already contained")]
    DuplicateDefinition(VarId),

    /// An auxiliary object name was registered twice.
    #[error("Duplicate object definition: {0} already contained")]
    DuplicateObject(String),

    /// A variable id was requested that has no definition.
    #[error("No definition for {0}")]
    UndefinedVariable(VarId),

    /// An auxiliary object was requested that has no definition.
    #[error("No definition for object {0}")]
    UndefinedObject(String),

    /// An auxiliary object exists but has a different type than requested.
    #[error("Object {0} has a different type than requested")]
    ObjectTypeMismatch(String),

    /// A value or object was written twice into the same simulation run.
    #[error("{0} was already persisted in this run")]
    AlreadyPersisted(VarId),

    /// A value or object was read from a simulation run that never stored it.
    #[error("{0} was not persisted in this run")]
    NotPersisted(VarId),

    /// A persistent variable was re-wrapped under a different id.
    #[error("Variable persisted as {existing} cannot be persisted again as {requested}")]
    ConflictingPersistentId {
        /// Id the variable is already persisted under
        existing: VarId,
        /// Id that was requested
        requested: VarId,
    },

    /// An index draw selected a candidate that does not exist.
    #[error("Index {index} out of range for {len} candidates")]
    IndexOutOfRange {
        /// The rounded index that was drawn
        index: i64,
        /// Number of available candidates
        len: usize,
    },

    /// A sample count or iteration count is unusable.
    #[error("Invalid sample count: {count} ({reason})")]
    InvalidSampleCount {
        /// The invalid sample count
        count: usize,
        /// The reason the count is invalid
        reason: &'static str,
    },

    /// Value-of-information analysis needs competing alternatives.
    #[error("At least two value variables are required, got {0}")]
    TooFewValueVariables(usize),

    /// Observing a named variable failed.
    #[error("Problem with {variable}: {source}")]
    Sampling {
        /// Innermost named variable whose observation failed
        variable: VarId,
        /// The underlying failure
        #[source]
        source: Box<ModelError>,
    },

    /// The sampling thread pool could not be created.
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Writing an export failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized `Result` type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

impl ModelError {
    /// Create an error for an invalid parameter with constraint.
    ///
    /// # Example
    /// ```
    /// use infoecon_rs::error::ModelError;
    ///
    /// let error = ModelError::invalid_parameter("upper", 1.0, "must exceed lower");
    /// assert!(error.to_string().contains("upper"));
    /// ```
    pub fn invalid_parameter(
        parameter: &'static str,
        value: f64,
        constraint: &'static str,
    ) -> Self {
        Self::InvalidParameter {
            parameter,
            value,
            constraint,
        }
    }

    /// Create an error for a non-finite parameter.
    pub fn non_finite(parameter: &'static str, value: f64) -> Self {
        Self::NonFiniteParameter { parameter, value }
    }

    /// Create an error for two mismatched units.
    pub fn incompatible_units(left: &Unit, right: &Unit) -> Self {
        Self::IncompatibleUnits {
            left: left.clone(),
            right: right.clone(),
        }
    }

    /// Create an error for an invalid sample count.
    pub fn invalid_sample_count(count: usize, reason: &'static str) -> Self {
        Self::InvalidSampleCount { count, reason }
    }

    /// Attaches the failing variable to an observation error.
    ///
    /// Errors that already name a variable are passed through, so the innermost
    /// named variable is the one reported.
    #[must_use]
    pub fn in_variable(self, variable: &VarId) -> Self {
        match self {
            sampling @ Self::Sampling { .. } => sampling,
            other => Self::Sampling {
                variable: variable.clone(),
                source: Box::new(other),
            },
        }
    }
}

/// Rejects NaN and infinite parameters.
pub(crate) fn ensure_finite(parameter: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ModelError::non_finite(parameter, value))
    }
}
