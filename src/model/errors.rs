//! Configuration errors
//!
//! Raised when model dimensions, series, distributions or estimator
//! settings are missing or inconsistent. Always reported at construction,
//! never mid-run.

use std::fmt;

/// Result alias for configuration checks.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration error
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A required setting is absent or zero
    Missing {
        /// Name of the setting
        field: String,
    },

    /// A setting has an invalid value
    InvalidValue {
        /// Name of the setting
        field: String,
        /// Why the value was rejected
        reason: String,
    },

    /// A series or table has the wrong length
    LengthMismatch {
        /// Name of the series
        field: String,
        /// Required length
        expected: usize,
        /// Supplied length
        actual: usize,
    },

    /// Distribution parameters rejected
    InvalidDistribution {
        /// Distribution kind (e.g. "normal")
        kind: &'static str,
        /// Why the parameters were rejected
        reason: String,
    },

    /// JSON (de)serialization failure
    Parse {
        /// Parser message
        message: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing { field } => write!(f, "Missing setting: {}", field),
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for {}: {}", field, reason)
            }
            ConfigError::LengthMismatch {
                field,
                expected,
                actual,
            } => write!(
                f,
                "Length mismatch for {}: expected {}, got {}",
                field, expected, actual
            ),
            ConfigError::InvalidDistribution { kind, reason } => {
                write!(f, "Invalid {} distribution: {}", kind, reason)
            }
            ConfigError::Parse { message } => write!(f, "Failed to parse configuration: {}", message),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::LengthMismatch {
            field: "outflux".to_string(),
            expected: 10,
            actual: 9,
        };
        let msg = err.to_string();
        assert!(msg.contains("outflux"));
        assert!(msg.contains("10"));
        assert!(msg.contains("9"));

        let err = ConfigError::Missing {
            field: "num_draws".to_string(),
        };
        assert!(err.to_string().contains("num_draws"));
    }

    #[test]
    fn test_json_error_conversion() {
        let parse: Result<u32, _> = serde_json::from_str("not json");
        let err: ConfigError = parse.unwrap_err().into();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
