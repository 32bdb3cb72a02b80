use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    /// Empty or degenerate condition set, bad probability or bad experiment name
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// The assignment store failed on load, save or delete
    #[error("Store unavailable: {message}")]
    StoreUnavailable { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True for caller mistakes that will fail the same way on retry
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }

    /// True when the persistence backend rejected the call
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. })
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_error() {
        let error = DomainError::invalid_input("condition set is empty");
        assert_eq!(error.to_string(), "Invalid input: condition set is empty");
        assert!(error.is_invalid_input());
        assert!(!error.is_store_unavailable());
    }

    #[test]
    fn test_store_unavailable_error() {
        let error = DomainError::store_unavailable("connection refused");
        assert_eq!(error.to_string(), "Store unavailable: connection refused");
        assert!(error.is_store_unavailable());
    }

    #[test]
    fn test_conflict_error() {
        let error = DomainError::conflict("kind mismatch");
        assert_eq!(error.to_string(), "Conflict: kind mismatch");
    }

    #[test]
    fn test_from_serde_json_error() {
        let err = serde_json::from_str::<u32>("\"nope\"").unwrap_err();
        let error: DomainError = err.into();
        assert!(matches!(error, DomainError::Serialization { .. }));
    }
}
