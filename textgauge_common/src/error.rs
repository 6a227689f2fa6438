use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TextGaugeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid comparison pattern: {0}")]
    Pattern(String),
}

pub type Result<T> = std::result::Result<T, TextGaugeError>;

/// The diff pipeline failed internally (a panic or a lost worker).
///
/// This is the only error a comparison can produce; ordinary inputs,
/// including empty and identical documents, never fail.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
#[error("Diff computation failed: {message}")]
pub struct ComputationFailure {
    pub message: String,
}

impl ComputationFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
