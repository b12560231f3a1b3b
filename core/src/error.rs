//! Error types for GATT operations.
//!
//! Only conditions that stop an operation from ever reaching the radio, or
//! that the radio itself refuses, are errors. Timeouts and interruptions are
//! ordinary [`Outcome`](crate::gatt::Outcome)s.

use thiserror::Error;

use crate::gatt::OperationState;

/// Errors raised while building or executing an [`Operation`](crate::gatt::Operation)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OperationError {
    #[error("Invalid target identifier: {0}")]
    InvalidTarget(String),

    #[error("Payload of {len} bytes exceeds the {max} byte attribute limit")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("Operation already executed (state: {0})")]
    AlreadyExecuted(OperationState),

    #[error("Radio rejected request for {target}: {reason}")]
    Rejected { target: String, reason: RadioError },
}

/// Errors a radio binding reports when it cannot issue a request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RadioError {
    #[error("Not connected")]
    NotConnected,

    #[error("Another GATT request is outstanding")]
    Busy,

    #[error("Characteristic not found: {0}")]
    UnknownAttribute(String),

    #[error("Request refused: {0}")]
    Refused(String),
}

/// Errors from [`EngineConfig::validate`](crate::config::EngineConfig::validate)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Unknown config key: {0}")]
    UnknownKey(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_message_includes_reason() {
        let err = OperationError::Rejected {
            target: "00002a19-0000-1000-8000-00805f9b34fb".to_string(),
            reason: RadioError::NotConnected,
        };
        let text = err.to_string();
        assert!(text.contains("00002a19"));
        assert!(text.contains("Not connected"));
    }

    #[test]
    fn test_payload_too_large_message() {
        let err = OperationError::PayloadTooLarge { len: 600, max: 512 };
        assert_eq!(
            err.to_string(),
            "Payload of 600 bytes exceeds the 512 byte attribute limit"
        );
    }
}
