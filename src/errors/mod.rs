// Error taxonomy shared by every layer of the client, built on thiserror.
use std::collections::BTreeMap;
use thiserror::Error;

// Make the response module public
pub mod response;
pub mod storage;

// Re-export commonly used types
pub use storage::{StorageError, StorageResult};

#[derive(Error, Debug)]
pub enum ClientError {
    /// The server could not be reached or the connection broke mid-request.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Transport-class failure: no response within the configured budget.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// A 401 that the refresh-and-retry could not resolve.
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        fields: BTreeMap<String, Vec<String>>,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Invalid response body: {0}")]
    Decode(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl ClientError {
    /// Client-side validation failure with no field details.
    pub fn validation(message: impl Into<String>) -> Self {
        ClientError::Validation {
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Client-side validation failure pinned to one field.
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut fields = BTreeMap::new();
        fields.insert(field.to_string(), vec![message.clone()]);
        ClientError::Validation { message, fields }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_) | ClientError::Timeout(_))
    }

    /// True when the caller should drop the session and ask for credentials again.
    pub fn requires_login(&self) -> bool {
        matches!(self, ClientError::Auth(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

// Custom result type
pub type ClientResult<T> = Result<T, ClientError>;
