//! Error taxonomy for capacity calculations.

use std::fmt;

use thiserror::Error;

/// Numeric range a parameter must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// `v >= 0`
    NonNegative,
    /// `v > 0`
    Positive,
    /// `v <= 1`
    AtMostOne,
    /// Neither infinite nor NaN.
    Finite,
}

impl Constraint {
    /// Returns true when `value` satisfies the constraint. NaN never does.
    pub fn holds(self, value: f64) -> bool {
        match self {
            Constraint::NonNegative => value >= 0.0,
            Constraint::Positive => value > 0.0,
            Constraint::AtMostOne => value <= 1.0,
            Constraint::Finite => value.is_finite(),
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Constraint::NonNegative => "must be ≥ 0",
            Constraint::Positive => "must be > 0",
            Constraint::AtMostOne => "must be ≤ 1",
            Constraint::Finite => "must be finite",
        };
        f.write_str(text)
    }
}

/// Fieldless discriminant of [`CalcError`], for callers that only branch on kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidCoefficient,
    MissingParameter,
    InvalidParameter,
    UnknownScenarioKind,
}

/// Errors returned by the calculator. Never recovered internally.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("invalid coefficient {field}: {constraint} (got {value})")]
    InvalidCoefficient {
        field: &'static str,
        constraint: Constraint,
        value: f64,
    },

    #[error("{field} missing")]
    MissingParameter { field: &'static str },

    #[error("{field} {constraint} (got {value})")]
    InvalidParameter {
        field: &'static str,
        constraint: Constraint,
        value: f64,
    },

    #[error("unknown scenario kind: {0}")]
    UnknownScenarioKind(String),
}

impl CalcError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CalcError::InvalidCoefficient { .. } => ErrorKind::InvalidCoefficient,
            CalcError::MissingParameter { .. } => ErrorKind::MissingParameter,
            CalcError::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            CalcError::UnknownScenarioKind(_) => ErrorKind::UnknownScenarioKind,
        }
    }

    /// The offending field, if the error concerns one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            CalcError::InvalidCoefficient { field, .. }
            | CalcError::MissingParameter { field }
            | CalcError::InvalidParameter { field, .. } => Some(field),
            CalcError::UnknownScenarioKind(_) => None,
        }
    }
}
