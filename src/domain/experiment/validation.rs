//! Experiment validation utilities

use thiserror::Error;

use crate::domain::DomainError;

/// Maximum length in bytes for experiment names, bounded by the widest storage key column
pub const MAX_EXPERIMENT_NAME_LENGTH: usize = 255;

/// Validation errors for experiment names, weights and probabilities
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExperimentValidationError {
    #[error("Experiment name cannot be empty")]
    EmptyName,

    #[error("Experiment name exceeds maximum length of {0} bytes")]
    NameTooLong(usize),

    #[error("Experiment name contains control character {0:?}")]
    ControlCharacter(char),

    #[error("Condition set cannot be empty")]
    EmptyConditions,

    #[error("Weight at position {index} must be a finite, non-negative number, got {weight}")]
    InvalidWeight { index: usize, weight: f64 },

    #[error("Total weight must be positive and finite, got {0}")]
    InvalidTotal(f64),

    #[error("Probability at position {index} must lie in [0, 1], got {probability}")]
    ProbabilityOutOfRange { index: usize, probability: f64 },
}

impl From<ExperimentValidationError> for DomainError {
    fn from(err: ExperimentValidationError) -> Self {
        DomainError::invalid_input(err.to_string())
    }
}

/// Validate an experiment name
pub fn validate_experiment_name(name: &str) -> Result<(), ExperimentValidationError> {
    if name.is_empty() {
        return Err(ExperimentValidationError::EmptyName);
    }

    if name.len() > MAX_EXPERIMENT_NAME_LENGTH {
        return Err(ExperimentValidationError::NameTooLong(
            MAX_EXPERIMENT_NAME_LENGTH,
        ));
    }

    if let Some(ch) = name.chars().find(|c| c.is_control()) {
        return Err(ExperimentValidationError::ControlCharacter(ch));
    }

    Ok(())
}

/// Validate a sequence of sampling weights and return their total
pub fn validate_weights<I>(weights: I) -> Result<f64, ExperimentValidationError>
where
    I: IntoIterator<Item = f64>,
{
    let mut total = 0.0;
    let mut seen = 0;

    for (index, weight) in weights.into_iter().enumerate() {
        if !weight.is_finite() || weight < 0.0 {
            return Err(ExperimentValidationError::InvalidWeight { index, weight });
        }
        total += weight;
        seen += 1;
    }

    if seen == 0 {
        return Err(ExperimentValidationError::EmptyConditions);
    }

    if total <= 0.0 || !total.is_finite() {
        return Err(ExperimentValidationError::InvalidTotal(total));
    }

    Ok(total)
}

/// Validate a single inclusion probability
pub fn validate_probability(
    index: usize,
    probability: f64,
) -> Result<(), ExperimentValidationError> {
    if !(0.0..=1.0).contains(&probability) {
        return Err(ExperimentValidationError::ProbabilityOutOfRange { index, probability });
    }

    Ok(())
}
