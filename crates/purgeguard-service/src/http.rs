use std::time::Duration;

use async_trait::async_trait;
use purgeguard_config::ServiceConfig;
use purgeguard_workflow::{ImpactSummary, ResultSummary, Target};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::credential::Credential;
use crate::error::ServiceError;
use crate::wire::{ErrorBody, ExecuteResponse, VerifyRequest, VerifyResponse};
use crate::{ExecuteRequest, PurgeService};

/// [`PurgeService`] backed by a REST API.
pub struct HttpPurgeService {
  client: Client,
  config: ServiceConfig,
}

impl HttpPurgeService {
  /// Create a client for the service described by `config`.
  pub fn new(config: ServiceConfig) -> Result<Self, ServiceError> {
    let client = Client::builder().build()?;
    Ok(Self { client, config })
  }

  fn url(&self, template: &str, target_id: Option<&str>) -> Result<Url, ServiceError> {
    self
      .config
      .endpoint_url(template, target_id)
      .map_err(|e| ServiceError::Endpoint {
        message: e.to_string(),
      })
  }

  /// A request bounded by `request_timeout_ms`.
  fn request(&self, method: Method, url: Url) -> RequestBuilder {
    self
      .authorized(method, url)
      .timeout(Duration::from_millis(self.config.request_timeout_ms))
  }

  /// A request with no client-side timeout. The destructive call is bounded
  /// by the caller's execution timeout only.
  fn authorized(&self, method: Method, url: Url) -> RequestBuilder {
    let request = self.client.request(method, url);
    match &self.config.bearer_token {
      Some(token) => request.bearer_auth(token),
      None => request,
    }
  }
}

#[async_trait]
impl PurgeService for HttpPurgeService {
  async fn list_targets(&self) -> Result<Vec<Target>, ServiceError> {
    let url = self.url(&self.config.endpoints.list_targets, None)?;
    debug!(url = %url, "listing targets");

    let response = self.request(Method::GET, url).send().await?;
    if !response.status().is_success() {
      return Err(status_error(response).await);
    }
    decode(response).await
  }

  async fn fetch_impact_preview(&self, target_id: &str) -> Result<ImpactSummary, ServiceError> {
    let url = self.url(&self.config.endpoints.impact_preview, Some(target_id))?;
    debug!(url = %url, target_id = %target_id, "fetching impact preview");

    let response = self.request(Method::GET, url).send().await?;
    if response.status() == StatusCode::NOT_FOUND {
      return Err(ServiceError::NotFound(target_id.to_string()));
    }
    if !response.status().is_success() {
      return Err(status_error(response).await);
    }
    decode(response).await
  }

  async fn verify_identity(&self, actor_id: &str, credential: &Credential) -> Result<(), ServiceError> {
    let url = self.url(&self.config.endpoints.verify_identity, None)?;
    debug!(url = %url, actor_id = %actor_id, "verifying identity");

    let body = VerifyRequest {
      actor_id,
      password: credential.expose(),
    };
    let response = self.request(Method::POST, url).json(&body).send().await?;

    match response.status() {
      StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Err(ServiceError::InvalidCredential),
      status if !status.is_success() => return Err(status_error(response).await),
      _ => {}
    }

    let verification: VerifyResponse = decode(response).await?;
    if verification.verified {
      Ok(())
    } else {
      Err(ServiceError::InvalidCredential)
    }
  }

  async fn execute_destructive_operation(
    &self,
    request: &ExecuteRequest,
  ) -> Result<ResultSummary, ServiceError> {
    let url = self.url(&self.config.endpoints.execute, Some(&request.target_id))?;
    debug!(url = %url, target_id = %request.target_id, "sending destructive request");

    let response = self
      .authorized(Method::DELETE, url)
      .json(request)
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      warn!(status = status.as_u16(), "destructive request rejected");
      return Err(match error_body_message(&body) {
        Some(message) => ServiceError::Service(message),
        None => ServiceError::Status {
          status: status.as_u16(),
          message: fallback_message(status, &body),
        },
      });
    }

    let outcome: ExecuteResponse = decode(response).await?;
    outcome.into_result().map_err(ServiceError::Service)
  }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ServiceError> {
  let body = response.text().await?;
  serde_json::from_str(&body).map_err(|e| ServiceError::Decode {
    message: e.to_string(),
  })
}

async fn status_error(response: Response) -> ServiceError {
  let status = response.status();
  let body = response.text().await.unwrap_or_default();
  let message = error_body_message(&body).unwrap_or_else(|| fallback_message(status, &body));
  ServiceError::Status {
    status: status.as_u16(),
    message,
  }
}

fn error_body_message(body: &str) -> Option<String> {
  serde_json::from_str::<ErrorBody>(body)
    .ok()
    .and_then(ErrorBody::into_message)
}

fn fallback_message(status: StatusCode, body: &str) -> String {
  let body = body.trim();
  if body.is_empty() {
    status
      .canonical_reason()
      .unwrap_or("request failed")
      .to_string()
  } else {
    body.to_string()
  }
}
