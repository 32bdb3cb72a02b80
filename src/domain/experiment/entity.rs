//! Experiment identity types

use serde::{Deserialize, Serialize};
use std::fmt;

use super::validation::{validate_experiment_name, ExperimentValidationError};
use crate::domain::storage::StorageKey;

// ============================================================================
// ExperimentName
// ============================================================================

/// Caller-supplied unique name of an experiment
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExperimentName(String);

impl ExperimentName {
    /// Create a new experiment name with validation
    pub fn new(name: impl Into<String>) -> Result<Self, ExperimentValidationError> {
        let name = name.into();
        validate_experiment_name(&name)?;
        Ok(Self(name))
    }

    /// Get the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ExperimentName {
    type Error = ExperimentValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ExperimentName {
    type Error = ExperimentValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ExperimentName> for String {
    fn from(name: ExperimentName) -> Self {
        name.0
    }
}

impl fmt::Display for ExperimentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ExperimentName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl StorageKey for ExperimentName {
    fn as_str(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// ExperimentKind
// ============================================================================

/// Shape of an experiment's outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentKind {
    /// Two conditions with equal weight
    Binary,
    /// One of N weighted conditions
    WeightedSplit,
    /// Independent inclusion of each variable
    Multivariate,
}

impl ExperimentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::WeightedSplit => "weighted_split",
            Self::Multivariate => "multivariate",
        }
    }

    /// Binary and weighted split experiments both resolve to a single condition
    pub fn is_single_condition(&self) -> bool {
        matches!(self, Self::Binary | Self::WeightedSplit)
    }
}

impl fmt::Display for ExperimentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
