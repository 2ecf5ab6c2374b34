use thiserror::Error;

#[derive(Error, Debug)]
pub enum OmnipathError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Schema error: {0}")]
    Schema(String),
    #[error("Invalid arguments:\n{}", .0.join("\n"))]
    InvalidArguments(Vec<String>),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Internal invariant violated: {0}")]
    Invariant(String),
    #[error("Lock poisoned: {0}")]
    Lock(String),
}

pub type Result<T> = std::result::Result<T, OmnipathError>;

impl OmnipathError {
    /// Client-side problems are reported as a payload, everything else is a fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidArguments(_))
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArguments(vec![message.into()])
    }
}

// Helper conversions
impl From<rusqlite::Error> for OmnipathError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Persistence(e.to_string())
    }
}

impl From<serde_json::Error> for OmnipathError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<config::ConfigError> for OmnipathError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for OmnipathError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        Self::Lock(e.to_string())
    }
}
