use std::time::Duration;

use reqwest::{Client, Response};

use crate::config::HttpSettings;
use crate::error::ParleyError;
use crate::request::{GenerationRequest, WirePayload};

/// Cap on how much of a non-2xx body is kept for the failure detail.
const MAX_ERROR_BODY_BYTES: usize = 64 * 1024;

/// Single-attempt HTTP transport for generation calls.
///
/// No request or connect timeout is set: a hanging call ends only when the
/// caller cancels it.
#[derive(Clone)]
pub struct HttpDispatch {
    client: Client,
}

impl Default for HttpDispatch {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpDispatch {
    pub fn new() -> Self {
        Self::from_settings(&HttpSettings::default())
    }

    pub fn from_settings(settings: &HttpSettings) -> Self {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(settings.pool_idle_timeout_secs))
            .pool_max_idle_per_host(settings.pool_max_idle_per_host)
            .build()
            .expect("failed to build HTTP client");

        Self { client }
    }

    /// POST the payload and return the response once a 2xx status arrives.
    ///
    /// The body is left unread so the caller can stream it. Non-2xx statuses
    /// become `HttpStatus` with the (capped) raw body as detail.
    pub async fn send(
        &self,
        request: &GenerationRequest,
        payload: &WirePayload,
    ) -> Result<Response, ParleyError> {
        let profile = request.provider.profile();
        let url = profile.url(&request.endpoint_base, request.streaming);

        tracing::debug!(
            %url,
            provider = %request.provider,
            streaming = request.streaming,
            turns = payload.contents.len(),
            "sending generation request"
        );

        let response = self
            .client
            .post(&url)
            .header(profile.header_name, profile.auth_header_value(&request.api_key))
            .header("Content-Type", "application/json")
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    ParleyError::NetworkUnavailable(e.to_string())
                } else {
                    ParleyError::Request(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_bytes = match response.bytes().await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(
                        status = status.as_u16(),
                        "failed to read error response body: {e}"
                    );
                    Default::default()
                }
            };
            let truncated = &error_bytes[..error_bytes.len().min(MAX_ERROR_BODY_BYTES)];
            let body = String::from_utf8_lossy(truncated).into_owned();
            tracing::warn!(status = status.as_u16(), "generation request rejected");
            return Err(ParleyError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}
