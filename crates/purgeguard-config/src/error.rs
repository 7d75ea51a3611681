use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config file {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse config: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("invalid config value for '{field}': {message}")]
  Invalid { field: &'static str, message: String },

  #[error("invalid endpoint url: {message}")]
  Endpoint { message: String },
}
