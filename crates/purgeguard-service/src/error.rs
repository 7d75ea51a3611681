use thiserror::Error;

/// Errors returned by purge service calls.
#[derive(Debug, Error)]
pub enum ServiceError {
  /// Transport-level failure (connection, TLS, client timeout, body read).
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// Non-success HTTP status.
  #[error("unexpected status {status}: {message}")]
  Status { status: u16, message: String },

  /// The response body did not have the expected shape.
  #[error("invalid response body: {message}")]
  Decode { message: String },

  /// The endpoint URL could not be built from configuration.
  #[error("invalid endpoint: {message}")]
  Endpoint { message: String },

  #[error("not found: {0}")]
  NotFound(String),

  #[error("invalid credential")]
  InvalidCredential,

  /// The service processed the request and reported a failure.
  #[error("{0}")]
  Service(String),

  #[error("request timed out after {timeout_ms}ms")]
  Timeout { timeout_ms: u64 },
}

impl ServiceError {
  /// Message suitable for showing to the operator.
  ///
  /// Service-reported failures are passed through verbatim.
  pub fn user_message(&self) -> String {
    match self {
      ServiceError::Service(message) => message.clone(),
      other => other.to_string(),
    }
  }
}
