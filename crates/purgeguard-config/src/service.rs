use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

/// Path segment replaced by the (percent-encoded) target id.
pub const TARGET_ID_PLACEHOLDER: &str = "{target_id}";

/// Where the purge service lives and how to talk to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
  /// Base URL every endpoint path is appended to.
  pub base_url: String,
  /// Per-request timeout applied by the HTTP client.
  pub request_timeout_ms: u64,
  /// Optional bearer token sent with every request.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub bearer_token: Option<String>,
  pub endpoints: EndpointConfig,
}

impl Default for ServiceConfig {
  fn default() -> Self {
    Self {
      base_url: "http://localhost:8080/api".to_string(),
      request_timeout_ms: 30_000,
      bearer_token: None,
      endpoints: EndpointConfig::default(),
    }
  }
}

/// Endpoint path templates, relative to `base_url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
  pub list_targets: String,
  pub impact_preview: String,
  pub verify_identity: String,
  pub execute: String,
}

impl Default for EndpointConfig {
  fn default() -> Self {
    Self {
      list_targets: "/schools".to_string(),
      impact_preview: "/schools/{target_id}/purge-preview".to_string(),
      verify_identity: "/auth/verify-password".to_string(),
      execute: "/schools/{target_id}/purge".to_string(),
    }
  }
}

impl ServiceConfig {
  /// Build the absolute URL for an endpoint template.
  ///
  /// Each `/`-separated piece of the template becomes one path segment. A
  /// segment equal to [`TARGET_ID_PLACEHOLDER`] is replaced by `target_id`,
  /// percent-encoded, so ids containing `/` cannot escape their segment.
  pub fn endpoint_url(&self, template: &str, target_id: Option<&str>) -> Result<Url, ConfigError> {
    let mut url = Url::parse(&self.base_url).map_err(|e| ConfigError::Endpoint {
      message: format!("{}: {}", self.base_url, e),
    })?;

    {
      let mut segments = url.path_segments_mut().map_err(|_| ConfigError::Endpoint {
        message: format!("{} cannot be used as a base url", self.base_url),
      })?;
      segments.pop_if_empty();

      for segment in template.split('/').filter(|s| !s.is_empty()) {
        if segment == TARGET_ID_PLACEHOLDER {
          let id = target_id.ok_or_else(|| ConfigError::Endpoint {
            message: format!("endpoint '{}' requires a target id", template),
          })?;
          segments.push(id);
        } else {
          segments.push(segment);
        }
      }
    }

    Ok(url)
  }

  pub(crate) fn validate(&self) -> Result<(), ConfigError> {
    let url = Url::parse(&self.base_url).map_err(|e| ConfigError::Invalid {
      field: "service.base_url",
      message: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
      return Err(ConfigError::Invalid {
        field: "service.base_url",
        message: format!("unsupported scheme '{}'", url.scheme()),
      });
    }

    if self.request_timeout_ms == 0 {
      return Err(ConfigError::Invalid {
        field: "service.request_timeout_ms",
        message: "must be greater than zero".to_string(),
      });
    }

    let endpoints = [
      ("service.endpoints.list_targets", &self.endpoints.list_targets),
      ("service.endpoints.impact_preview", &self.endpoints.impact_preview),
      ("service.endpoints.verify_identity", &self.endpoints.verify_identity),
      ("service.endpoints.execute", &self.endpoints.execute),
    ];
    for (field, path) in endpoints {
      if path.trim_matches('/').is_empty() {
        return Err(ConfigError::Invalid {
          field,
          message: "endpoint path is empty".to_string(),
        });
      }
    }

    Ok(())
  }
}
