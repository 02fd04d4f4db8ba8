//! Error types for Rehearseur
//!
//! The parser and the navigation engine never fail: malformed documents
//! degrade to defaults and a missing player turns every command into a
//! no-op. Errors only exist at the edges (configuration, the JS boundary,
//! the command line).

use thiserror::Error;
use wasm_bindgen::JsValue;

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, RehearseurError>;

#[derive(Error, Debug)]
pub enum RehearseurError {
    #[error("Unknown navigation source: {0}")]
    UnknownSource(String),

    #[error("Annotation not found: {0}")]
    UnknownAnnotation(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Browser API unavailable: {0}")]
    Browser(String),
}

impl From<serde_wasm_bindgen::Error> for RehearseurError {
    fn from(err: serde_wasm_bindgen::Error) -> Self {
        RehearseurError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for RehearseurError {
    fn from(err: serde_json::Error) -> Self {
        RehearseurError::Serialization(err.to_string())
    }
}

impl From<RehearseurError> for JsValue {
    fn from(err: RehearseurError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = RehearseurError::UnknownSource("mouse".to_string());
        assert_eq!(err.to_string(), "Unknown navigation source: mouse");

        let err = RehearseurError::UnknownAnnotation("intro".to_string());
        assert_eq!(err.to_string(), "Annotation not found: intro");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<u32>("not a number").unwrap_err();
        let err: RehearseurError = json_err.into();
        assert!(matches!(err, RehearseurError::Serialization(_)));
    }
}
