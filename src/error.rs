//! Error types and handling for the Tripwise application

use thiserror::Error;

/// Main error type for the Tripwise application
#[derive(Error, Debug)]
pub enum TripwiseError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Requested record does not exist (or belongs to someone else)
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Persistence failures, fatal to the request that hit them
    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl TripwiseError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a new storage error
    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            TripwiseError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            TripwiseError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            TripwiseError::NotFound { message } => message.clone(),
            TripwiseError::Storage { .. } => {
                "Your travel plan could not be saved. Please try again.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = TripwiseError::config("missing API key");
        assert!(matches!(config_err, TripwiseError::Config { .. }));

        let storage_err = TripwiseError::storage("disk full");
        assert!(matches!(storage_err, TripwiseError::Storage { .. }));

        let validation_err = TripwiseError::validation("citizenship is required");
        assert!(matches!(validation_err, TripwiseError::Validation { .. }));
    }

    #[test]
    fn test_user_messages() {
        let config_err = TripwiseError::config("test");
        assert!(config_err.user_message().contains("Configuration error"));

        let storage_err = TripwiseError::storage("test");
        assert!(storage_err.user_message().contains("could not be saved"));

        let validation_err = TripwiseError::validation("test input");
        assert!(validation_err.user_message().contains("test input"));
    }

    #[test]
    fn test_not_found_message_is_passed_through() {
        let err = TripwiseError::not_found("Plan 42 was not found");
        assert_eq!(err.user_message(), "Plan 42 was not found");
    }
}
