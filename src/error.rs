use std::fmt;

use thiserror::Error;

/// Remote write operation that can be rejected by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    Create,
    Update,
    Delete,
}

impl fmt::Display for WriteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteOp::Create => write!(f, "create"),
            WriteOp::Update => write!(f, "update"),
            WriteOp::Delete => write!(f, "delete"),
        }
    }
}

#[derive(Error, Debug)]
pub enum HelpQueueError {
    #[error("ticket '{0}' not found")]
    TicketNotFound(String),

    #[error("{op} failed: {message}")]
    Write { op: WriteOp, message: String },

    #[error("not signed in")]
    NotSignedIn,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl HelpQueueError {
    /// Build a rejected-write error
    pub fn write(op: WriteOp, message: impl Into<String>) -> Self {
        HelpQueueError::Write {
            op,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, HelpQueueError>;
