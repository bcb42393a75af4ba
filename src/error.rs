use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelError {
    #[error("failed to parse label configuration: {0}")]
    ConfigParse(String),

    #[error("label configuration is not valid:\n{}", .0.join("\n"))]
    ConfigValidation(Vec<String>),

    #[error("failed to start cache sweeper: {0}")]
    Sweeper(String),
}

impl From<serde_json::Error> for LabelError {
    fn from(err: serde_json::Error) -> Self {
        LabelError::ConfigParse(err.to_string())
    }
}

impl From<std::io::Error> for LabelError {
    fn from(err: std::io::Error) -> Self {
        LabelError::Sweeper(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_lists_every_violation() {
        let err = LabelError::ConfigValidation(vec![
            "(root): consumer_notifiers is required".to_string(),
            "consumer_notifiers.0: set is required".to_string(),
        ]);
        let rendered = err.to_string();
        assert!(rendered.starts_with("label configuration is not valid:\n"));
        assert!(rendered.contains("(root): consumer_notifiers is required\n"));
        assert!(rendered.ends_with("consumer_notifiers.0: set is required"));
    }

    #[test]
    fn test_parse_error_from_serde_json() {
        let err: LabelError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, LabelError::ConfigParse(_)));
    }
}
