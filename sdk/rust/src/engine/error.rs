use thiserror::Error;

use crate::filters::FilterError;
use crate::gateway::GatewayError;

/// Errors from engine operations
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Index settings are required for '{0}'")]
    MissingSettings(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_filter_error() {
        let err: EngineError = FilterError::RecursionLimitExceeded { max_depth: 2 }.into();
        assert_eq!(
            err.to_string(),
            "Filter error: Predicate nesting exceeds maximum depth of 2"
        );
    }

    #[test]
    fn test_missing_settings_display() {
        let err = EngineError::MissingSettings("products".to_string());
        assert_eq!(err.to_string(), "Index settings are required for 'products'");
    }
}
