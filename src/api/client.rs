//! reqwest client for the itinerary backend

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{de::DeserializeOwned, Serialize};
use std::time::{Duration, Instant};

use super::{
    ApiError, ErrorResponse, FinalizeRequest, FinalizeResponse, GenerateRequest,
    GenerateResponse, ItineraryApi, Operation, SubmitResponse,
};
use crate::config::ServerConfig;
use crate::form::FormState;

/// HTTP implementation of [`ItineraryApi`]
pub struct HttpItineraryApi {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpItineraryApi {
    /// Create a client for the given base URL. Every request is bounded by
    /// `timeout`.
    pub fn new(base_url: &str, timeout: Duration, user_agent: &str) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self, ApiError> {
        Self::new(
            &config.base_url,
            Duration::from_secs(config.request_timeout_secs),
            &config.user_agent,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST a JSON body and decode the JSON answer.
    ///
    /// This is the single request path for every operation: 2xx decodes
    /// into `R`, non-2xx decodes into `{message}`, anything else becomes a
    /// transport or parse error.
    async fn post_json<B, R>(&self, operation: Operation, body: &B) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let endpoint = operation.endpoint();
        let url = format!("{}{}", self.base_url, endpoint);
        let started = Instant::now();

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(endpoint, &e))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(endpoint, &e))?;

        tracing::info!(
            endpoint,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "backend responded"
        );

        if status.is_success() {
            return serde_json::from_slice::<R>(&bytes).map_err(|e| {
                tracing::warn!(endpoint, error = %e, "unexpected success body");
                ApiError::Parse(e.to_string())
            });
        }

        let body: ErrorResponse =
            serde_json::from_slice(&bytes).map_err(|e| ApiError::Parse(e.to_string()))?;
        let message = body.message.unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        });
        Err(ApiError::Server {
            status: status.as_u16(),
            message,
        })
    }

    fn transport_error(&self, endpoint: &str, err: &reqwest::Error) -> ApiError {
        tracing::warn!(endpoint, error = %err, "backend request failed");
        if err.is_timeout() {
            ApiError::Timeout(self.timeout)
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl ItineraryApi for HttpItineraryApi {
    async fn submit(&self, form: &FormState) -> Result<SubmitResponse, ApiError> {
        self.post_json(Operation::Submit, form).await
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, ApiError> {
        let operation = if request.is_revision() {
            Operation::Revise
        } else {
            Operation::Generate
        };
        self.post_json(operation, request).await
    }

    async fn finalize(&self, request: &FinalizeRequest) -> Result<FinalizeResponse, ApiError> {
        self.post_json(Operation::Finalize, request).await
    }

    fn resolve_url(&self, url: &str) -> String {
        // base_url has its trailing slash trimmed; put it back so a path
        // prefix like `/api` is kept as a directory when joining
        Url::parse(&format!("{}/", self.base_url))
            .and_then(|base| base.join(url))
            .map(String::from)
            .unwrap_or_else(|_| url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(base: &str) -> HttpItineraryApi {
        HttpItineraryApi::new(base, Duration::from_secs(5), "travel-buddy-test").unwrap()
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        assert_eq!(api("http://localhost:5000/").base_url(), "http://localhost:5000");
        assert_eq!(api("http://localhost:5000").base_url(), "http://localhost:5000");
    }

    #[test]
    fn test_resolve_relative_pdf_url() {
        let api = api("http://localhost:5000");
        assert_eq!(
            api.resolve_url("/static/itineraries/trip.pdf"),
            "http://localhost:5000/static/itineraries/trip.pdf"
        );
    }

    #[test]
    fn test_resolve_keeps_base_path_prefix() {
        let api = api("http://host/api/");
        assert_eq!(
            api.resolve_url("static/x.pdf"),
            "http://host/api/static/x.pdf"
        );
        // Root-relative paths still resolve against the host
        assert_eq!(
            api.resolve_url("/static/x.pdf"),
            "http://host/static/x.pdf"
        );
    }

    #[test]
    fn test_resolve_absolute_pdf_url_unchanged() {
        let api = api("http://localhost:5000");
        assert_eq!(
            api.resolve_url("https://cdn.example.com/trip.pdf"),
            "https://cdn.example.com/trip.pdf"
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        // Port 9 (discard) is not expected to accept HTTP on loopback
        let api = api("http://127.0.0.1:9");
        let err = api.submit(&FormState::new()).await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_) | ApiError::Timeout(_)));
        assert!(!err.is_server_reported());
    }
}
