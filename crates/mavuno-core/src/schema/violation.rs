//! Schema violation types.

use std::fmt;

use derive_more::{Deref, IntoIterator};
use serde::Serialize;
use thiserror::Error;

/// A single way in which a value fails its schema.
///
/// Every variant carries the path of the offending field, written as
/// `crops[2].plantingInfo.spacing`, or `$` for the root value.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// The value has the wrong JSON type.
    #[error("{path}: expected {expected}, got {found}")]
    TypeMismatch {
        path: String,
        expected: String,
        found: String,
    },

    /// A required field is absent.
    #[error("{path}: missing required field")]
    MissingField { path: String },

    /// The value is not one of the allowed enum members.
    #[error("{path}: {value} is not one of [{}]", .allowed.join(", "))]
    EnumOutOfRange {
        path: String,
        value: String,
        allowed: Vec<String>,
    },

    /// The array has fewer items than required.
    #[error("{path}: array has {actual} items, minimum is {min}")]
    TooFewItems {
        path: String,
        min: u64,
        actual: usize,
    },

    /// The array has more items than allowed.
    #[error("{path}: array has {actual} items, maximum is {max}")]
    TooManyItems {
        path: String,
        max: u64,
        actual: usize,
    },

    /// The string is shorter than `minLength`.
    #[error("{path}: string length {actual} is less than minimum {min}")]
    TooShort {
        path: String,
        min: u64,
        actual: usize,
    },

    /// The string is longer than `maxLength`.
    #[error("{path}: string length {actual} exceeds maximum {max}")]
    TooLong {
        path: String,
        max: u64,
        actual: usize,
    },

    /// The number is below `minimum`.
    #[error("{path}: {actual} is less than minimum {min}")]
    BelowMinimum { path: String, min: f64, actual: f64 },

    /// The number is above `maximum`.
    #[error("{path}: {actual} exceeds maximum {max}")]
    AboveMaximum { path: String, max: f64, actual: f64 },

    /// A field not declared in `properties` where `additionalProperties` is false.
    #[error("{path}: unexpected field")]
    UnexpectedField { path: String },

    /// The string does not match the declared `format`.
    #[error("{path}: not a valid {format}")]
    InvalidFormat { path: String, format: String },
}

impl Violation {
    /// Returns the path of the offending field.
    pub fn path(&self) -> &str {
        match self {
            Self::TypeMismatch { path, .. }
            | Self::MissingField { path }
            | Self::EnumOutOfRange { path, .. }
            | Self::TooFewItems { path, .. }
            | Self::TooManyItems { path, .. }
            | Self::TooShort { path, .. }
            | Self::TooLong { path, .. }
            | Self::BelowMinimum { path, .. }
            | Self::AboveMaximum { path, .. }
            | Self::UnexpectedField { path }
            | Self::InvalidFormat { path, .. } => path,
        }
    }
}

/// Every violation found while validating one value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deref, IntoIterator)]
#[serde(transparent)]
#[into_iterator(owned, ref)]
pub struct Violations(Vec<Violation>);

impl Violations {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a violation.
    pub fn push(&mut self, violation: Violation) {
        self.0.push(violation);
    }

    /// Returns the offending paths, in discovery order.
    pub fn paths(&self) -> Vec<&str> {
        self.0.iter().map(Violation::path).collect()
    }

    /// Returns true if any violation is reported for `path`.
    pub fn contains_path(&self, path: &str) -> bool {
        self.0.iter().any(|v| v.path() == path)
    }

    /// Consumes the set and returns the violations.
    pub fn into_vec(self) -> Vec<Violation> {
        self.0
    }
}

impl From<Vec<Violation>> for Violations {
    fn from(violations: Vec<Violation>) -> Self {
        Self(violations)
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Violations {}
