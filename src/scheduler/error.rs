//! Error types for the scheduler module

use std::fmt;

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Scheduler-specific errors
#[derive(Debug)]
pub enum SchedulerError {
    /// Unknown selection method name
    InvalidMethod {
        value: String,
        valid_options: Vec<String>,
    },

    /// Unknown display mode name
    InvalidDisplay {
        value: String,
        valid_options: Vec<String>,
    },

    /// Tick driver configuration error
    DriverConfigError {
        field: String,
        reason: String,
    },
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMethod {
                value,
                valid_options,
            } => {
                write!(
                    f,
                    "Invalid selection method '{}'. Valid options: {}",
                    value,
                    valid_options.join(", ")
                )
            }
            Self::InvalidDisplay {
                value,
                valid_options,
            } => {
                write!(
                    f,
                    "Invalid display mode '{}'. Valid options: {}",
                    value,
                    valid_options.join(", ")
                )
            }
            Self::DriverConfigError { field, reason } => {
                write!(f, "Tick driver config error in '{}': {}", field, reason)
            }
        }
    }
}

impl std::error::Error for SchedulerError {}

impl SchedulerError {
    /// Create an invalid method error
    pub fn invalid_method(value: impl Into<String>) -> Self {
        Self::InvalidMethod {
            value: value.into(),
            valid_options: vec!["sequential".to_string(), "random".to_string()],
        }
    }

    /// Create an invalid display error
    pub fn invalid_display(value: impl Into<String>) -> Self {
        Self::InvalidDisplay {
            value: value.into(),
            valid_options: vec![
                "chat".to_string(),
                "action".to_string(),
                "title".to_string(),
            ],
        }
    }

    /// Create a driver config error
    pub fn driver_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DriverConfigError {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_method_error() {
        let err = SchedulerError::invalid_method("weighted");
        assert!(err.to_string().contains("weighted"));
        assert!(err.to_string().contains("sequential"));
    }

    #[test]
    fn test_invalid_display_error() {
        let err = SchedulerError::invalid_display("bossbar");
        assert!(err.to_string().contains("bossbar"));
        assert!(err.to_string().contains("title"));
    }

    #[test]
    fn test_driver_config_error() {
        let err = SchedulerError::driver_config("period", "must be positive");
        assert_eq!(
            err.to_string(),
            "Tick driver config error in 'period': must be positive"
        );
    }
}
