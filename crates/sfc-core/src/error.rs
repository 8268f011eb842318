use thiserror::Error;

#[derive(Debug, Error)]
pub enum SfcError {
    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Invalid contract: {field}: {reason}")]
    InvalidContract { field: String, reason: String },

    #[error("Degenerate configuration: {field}: {reason}")]
    DegenerateConfiguration { field: String, reason: String },

    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl SfcError {
    /// Whether the failure is attributable to the caller's payload (a 4xx at
    /// an HTTP boundary) rather than an internal fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SfcError::MissingInput(_)
                | SfcError::InvalidContract { .. }
                | SfcError::DegenerateConfiguration { .. }
                | SfcError::InvalidInput { .. }
                | SfcError::SerializationError(_)
        )
    }
}

impl From<serde_json::Error> for SfcError {
    fn from(e: serde_json::Error) -> Self {
        SfcError::SerializationError(e.to_string())
    }
}
