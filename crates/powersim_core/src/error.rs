use std::fmt;

use crate::model::FactorAxis;

/// Errors raised while validating the factor levels of a simulation grid.
///
/// These are fatal: no simulation work starts when the grid is malformed.
#[derive(Debug, Clone, PartialEq)]
pub enum InvalidFactorError {
    EmptyAxis(FactorAxis),
    /// A design needs at least one unit in each group
    SampleSizeTooSmall(usize),
    NonFiniteEffectSize(f64),
    DuplicateLevel { axis: FactorAxis, level: String },
}

impl fmt::Display for InvalidFactorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidFactorError::EmptyAxis(axis) => write!(f, "factor axis '{axis}' has no levels"),
            InvalidFactorError::SampleSizeTooSmall(n) => {
                write!(f, "sample size {n} is too small (minimum is 2)")
            }
            InvalidFactorError::NonFiniteEffectSize(e) => {
                write!(f, "effect size {e} is not a finite number")
            }
            InvalidFactorError::DuplicateLevel { axis, level } => {
                write!(f, "factor axis '{axis}' lists level {level} more than once")
            }
        }
    }
}

impl std::error::Error for InvalidFactorError {}

/// Errors raised when a sample cannot be fit by the estimator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DesignError {
    TooFewUnits { units: usize, minimum: usize },
}

impl fmt::Display for DesignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DesignError::TooFewUnits { units, minimum } => write!(
                f,
                "cannot fit a model to {units} units (at least {minimum} are required)"
            ),
        }
    }
}

impl std::error::Error for DesignError {}

/// Errors related to data generator parameters
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratorError {
    InvalidScale { name: &'static str, value: f64 },
}

impl fmt::Display for GeneratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratorError::InvalidScale { name, value } => write!(
                f,
                "invalid {name} standard deviation {value}: must be finite and positive"
            ),
        }
    }
}

impl std::error::Error for GeneratorError {}

/// Errors that abort a simulation run
#[derive(Debug, Clone)]
pub enum RunError {
    /// A grid row could not be estimated. The whole run is aborted rather
    /// than silently dropping the row.
    Design { row_id: usize, source: DesignError },
    /// The worker pool could not be created
    ThreadPool(String),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Design { row_id, source } => write!(f, "row {row_id}: {source}"),
            RunError::ThreadPool(msg) => write!(f, "failed to build worker pool: {msg}"),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunError::Design { source, .. } => Some(source),
            RunError::ThreadPool(_) => None,
        }
    }
}
