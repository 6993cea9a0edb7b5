use thiserror::Error;

/// Fallback message used when the server rejects a request without explaining why.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong";

/// Classified failure of a client operation.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Input refused locally before any request was made.
    #[error("{0}")]
    Validation(String),
    /// Credential missing, expired, or rejected, or a failed login/signup.
    #[error("{0}")]
    Auth(String),
    /// Any other non-success HTTP response.
    #[error("{message} (status {status})")]
    Api { status: u16, message: String },
    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),
    /// A success response whose body did not match the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(String),
    /// The credential file could not be read or written.
    #[error("credential storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl ApiError {
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Auth(_))
    }

    /// Message suitable for showing inline next to a form.
    pub fn display_message(&self) -> String {
        match self {
            ApiError::Validation(message) | ApiError::Auth(message) => message.clone(),
            ApiError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
