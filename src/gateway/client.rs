use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::ApplicationGateway;
use super::error::GatewayError;
use super::types::{ErrorBody, JobWorkflow, StageSnapshot};
use crate::config::HirewiseConfig;
use crate::session::SessionStore;
use crate::workflow::{ApplicationState, TransitionRequest, WorkflowStage};

/// HTTP implementation of [`ApplicationGateway`].
///
/// Every call is sent exactly once. Nothing is cached between calls.
pub struct ApplicationClient {
    client: Client,
    base_url: Url,
    session: Arc<SessionStore>,
}

impl ApplicationClient {
    pub fn new(base_url: &str, session: Arc<SessionStore>) -> Result<Self, GatewayError> {
        Self::with_timeouts(
            base_url,
            session,
            Duration::from_secs(10),
            Duration::from_secs(30),
        )
    }

    pub fn from_config(config: &HirewiseConfig, session: Arc<SessionStore>) -> Result<Self, GatewayError> {
        Self::with_timeouts(
            &config.api_base_url,
            session,
            Duration::from_secs(config.connect_timeout_secs),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn with_timeouts(
        base_url: &str,
        session: Arc<SessionStore>,
        connect_timeout: Duration,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let base_url = Url::parse(base_url.trim()).map_err(|e| GatewayError::InvalidUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(GatewayError::InvalidUrl(format!("{base_url} cannot be used as a base URL")));
        }
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url,
            session,
        })
    }

    /// Appends percent-encoded `segments` to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GatewayError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn bearer(&self) -> Result<String, GatewayError> {
        self.session.get().ok_or(GatewayError::Unauthenticated)
    }
}

impl ApplicationGateway for ApplicationClient {
    async fn apply_transition(
        &self,
        application_id: &str,
        request: &TransitionRequest,
    ) -> Result<StageSnapshot, GatewayError> {
        let url = self.endpoint(&["applications", application_id, "stage"])?;
        let token = self.bearer()?;
        debug!(
            application_id,
            stage = %request.stage_name,
            action = %request.action,
            "sending stage transition"
        );

        let response = self
            .client
            .put(url)
            .bearer_auth(token)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        debug!(application_id, status = status.as_u16(), "stage transition response");
        if !status.is_success() {
            let message = error_message(response).await;
            if is_transient_status(status) {
                return Err(GatewayError::Transient {
                    status: status.as_u16(),
                    message,
                });
            }
            return Err(GatewayError::InvalidTransition {
                status: status.as_u16(),
                message,
            });
        }

        decode_applied(response).await
    }

    async fn fetch_workflow(&self, job_id: &str) -> Result<Vec<WorkflowStage>, GatewayError> {
        let url = self.endpoint(&["jobs", job_id])?;
        let job: JobWorkflow = self.get(url).await?;
        Ok(job.into_stages())
    }

    async fn fetch_application(&self, application_id: &str) -> Result<ApplicationState, GatewayError> {
        let url = self.endpoint(&["applications", application_id])?;
        self.get(url).await
    }
}

impl ApplicationClient {
    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, GatewayError> {
        let token = self.bearer()?;
        debug!(url = url.as_str(), "fetching");
        let response = self.client.get(url).bearer_auth(token).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = error_message(response).await;
            if is_transient_status(status) {
                return Err(GatewayError::Transient {
                    status: status.as_u16(),
                    message,
                });
            }
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        decode(response).await
    }
}

fn is_transient_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::REQUEST_TIMEOUT
            | StatusCode::TOO_MANY_REQUESTS
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

/// The backend's `{ "message": ... }`, else the raw body, else the status
/// reason phrase.
async fn error_message(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let body = body.trim();

    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body)
        && !parsed.message.trim().is_empty()
    {
        return parsed.message;
    }
    if !body.is_empty() {
        return body.to_string();
    }
    status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string()
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, GatewayError> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| GatewayError::Decode(e.to_string()))
}

/// Reads the 2xx reply to a transition. The backend has already acted, so
/// any failure here leaves the outcome unknown rather than retryable.
async fn decode_applied(response: Response) -> Result<StageSnapshot, GatewayError> {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .map_err(|e| GatewayError::OutcomeUnknown {
            status,
            reason: e.to_string(),
        })?;
    serde_json::from_str(&body).map_err(|e| GatewayError::OutcomeUnknown {
        status,
        reason: e.to_string(),
    })
}
