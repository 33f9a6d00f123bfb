//! HTTP client for the parse backend.

use std::time::Duration;

use reqwest::Client;
use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use super::error::ApiError;
use super::types::{
    ApiEnvelope, CookieExchangeData, CookieExchangeRequest, ParseRequest, ParseResult, Platform,
};
use crate::http::{ClientTimeouts, build_client};

/// Timeout applied to every backend call (30 seconds).
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 30;

const PARSE_PATH: &str = "/api/parse";
const COOKIE_EXCHANGE_PATH: &str = "/api/doubao_cookie";
const HEALTH_PATH: &str = "/health";

/// Client for the remote parse backend.
///
/// Issues a single request per call with no retry; callers decide whether
/// to try again.
///
/// # Example
///
/// ```no_run
/// use linkgrab_core::api::ApiClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let api = ApiClient::new("http://127.0.0.1:5000")?;
/// let result = api.parse("https://xhslink.com/abc123", None).await?;
/// println!("{} images", result.all_images.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Creates a client for `base_url` with the default 30 second timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Client`] when the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, DEFAULT_API_TIMEOUT_SECS)
    }

    /// Creates a client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Client`] when the HTTP client cannot be built.
    pub fn with_timeout(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self, ApiError> {
        let client = build_client(ClientTimeouts {
            connect: None,
            total: Some(Duration::from_secs(timeout_secs)),
        })
        .map_err(|error| ApiError::Client {
            reason: error.to_string(),
        })?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Returns the backend base address without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Asks the backend to resolve a share link into image candidates.
    ///
    /// When the response omits `platform`, it is inferred from `link`.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Network`] / [`ApiError::Timeout`] when the transport fails
    /// - [`ApiError::Api`] on a non-200 status, `success: false`, or missing data
    /// - [`ApiError::Decode`] when a 200 body is not a valid envelope
    #[instrument(skip(self, cookie), fields(link = %link, has_cookie = cookie.is_some()))]
    pub async fn parse(&self, link: &str, cookie: Option<&str>) -> Result<ParseResult, ApiError> {
        let endpoint = self.endpoint(PARSE_PATH);
        let body = ParseRequest {
            short_link: link,
            cookie: cookie.unwrap_or_default(),
        };

        let envelope: ApiEnvelope<ParseResult> = self.post_json(&endpoint, &body).await?;
        let mut result = envelope.data.ok_or_else(|| {
            ApiError::api(
                endpoint.clone(),
                StatusCode::OK.as_u16(),
                Some("response contained no data".to_string()),
            )
        })?;

        if result.platform.is_none() {
            let inferred = Platform::infer_from_link(link);
            debug!(platform = %inferred, "platform missing from response, inferred from link");
            result.platform = Some(inferred);
        }

        info!(
            platform = ?result.platform,
            candidates = result.all_images.len(),
            "parse succeeded"
        );
        Ok(result)
    }

    /// Trades a long caller credential for a short opaque session id.
    ///
    /// Never fails: any error degrades to `None` (the empty session id) and
    /// is logged.
    #[instrument(skip(self, cookie), fields(cookie_len = cookie.len()))]
    pub async fn exchange_cookie_for_session_id(&self, cookie: &str) -> Option<String> {
        let endpoint = self.endpoint(COOKIE_EXCHANGE_PATH);
        let body = CookieExchangeRequest { cookie };

        match self
            .post_json::<_, CookieExchangeData>(&endpoint, &body)
            .await
        {
            Ok(envelope) => {
                let sid = envelope
                    .data
                    .map(|data| data.sid.trim().to_string())
                    .filter(|sid| !sid.is_empty());
                if sid.is_none() {
                    warn!("cookie exchange returned no session id");
                }
                sid
            }
            Err(error) => {
                warn!(error = %error, "cookie exchange failed; continuing without session id");
                None
            }
        }
    }

    /// Checks that the backend answers its health endpoint.
    ///
    /// # Errors
    ///
    /// Returns a transport error or [`ApiError::Api`] for a non-200 status.
    #[instrument(skip(self))]
    pub async fn health(&self) -> Result<(), ApiError> {
        let endpoint = self.endpoint(HEALTH_PATH);
        let response = self
            .client
            .get(&endpoint)
            .send()
            .await
            .map_err(|e| ApiError::transport(endpoint.clone(), e))?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(ApiError::api(endpoint, status.as_u16(), None));
        }
        debug!("backend healthy");
        Ok(())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post_json<B, T>(&self, endpoint: &str, body: &B) -> Result<ApiEnvelope<T>, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(endpoint)
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::transport(endpoint, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::transport(endpoint, e))?;
        let decoded = serde_json::from_str::<ApiEnvelope<T>>(&text);

        if status != StatusCode::OK {
            let message = decoded.ok().and_then(|envelope| envelope.error);
            debug!(status = status.as_u16(), "backend returned non-200 status");
            return Err(ApiError::api(endpoint, status.as_u16(), message));
        }

        let envelope = decoded.map_err(|e| ApiError::decode(endpoint, e.to_string()))?;
        if !envelope.success {
            return Err(ApiError::api(endpoint, status.as_u16(), envelope.error));
        }
        Ok(envelope)
    }
}
