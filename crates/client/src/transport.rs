//! HTTP transport with credential attachment and one-shot auth recovery.
//!
//! Every request carries the bearer credential (when held) plus the cookie
//! jar the refresh endpoint correlates on. When the service answers 401 the
//! transport performs exactly one recovery attempt: refresh the token, and
//! if that succeeds, re-issue the original request once with the new
//! credential. If the refresh fails, the original 401 response is returned
//! unmodified. There is no second retry, no backoff, and no queuing of
//! concurrent requests during refresh - concurrent 401s each attempt their
//! own refresh, which the service treats idempotently.
//!
//! The recovery attempt is modeled as an explicit [`RequestPhase`] state
//! machine so the paths through it can be asserted in tests without any
//! timing dependence.

use std::sync::Arc;

use reqwest::{Method, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::token::TokenStore;
use crate::types::JwtResponse;

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Endpoint that exchanges the refresh cookie for a new access token.
pub(crate) const REFRESH_PATH: &str = "/auth/refresh";

/// Login endpoint; a 401 here means bad credentials, not an expired token.
pub(crate) const LOGIN_PATH: &str = "/auth/login";

/// Lifecycle of one logical request through the auth-recovery machine.
///
/// `Sent` is terminal for requests that never hit a 401 (or that target the
/// refresh/login endpoints, where recovery must not recurse). `Retried`
/// means the refresh succeeded and the request was re-issued once;
/// `Failed` means the refresh did not succeed and the original 401 was
/// surfaced unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPhase {
    /// Request completed without entering recovery.
    Sent,
    /// Service rejected the credential.
    Unauthorized,
    /// Refresh call in flight.
    Refreshing,
    /// Refresh succeeded; the request was re-issued exactly once.
    Retried,
    /// Refresh failed; the original response is surfaced.
    Failed,
}

/// HTTP transport for the bookstore service.
///
/// Cloning is cheap; clones share the HTTP connection pool, cookie jar, and
/// token store.
#[derive(Clone)]
pub struct Transport {
    inner: Arc<TransportInner>,
}

struct TransportInner {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenStore,
}

impl Transport {
    /// Create a transport for the configured service.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &ClientConfig, tokens: TokenStore) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            // The refresh credential is cookie-scoped; the jar must ride along
            .cookie_store(true)
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            inner: Arc::new(TransportInner {
                http,
                base_url: config.api_url.clone(),
                tokens,
            }),
        })
    }

    /// The token store this transport attaches credentials from.
    #[must_use]
    pub fn tokens(&self) -> &TokenStore {
        &self.inner.tokens
    }

    /// Issue a request, transparently recovering once from a 401.
    ///
    /// Non-2xx responses are returned as-is; interpreting status and body is
    /// the caller's job. Only network-level failures (and a failed refresh
    /// body parse) surface as errors here.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Network`] when no response could be obtained.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<Response, ApiError> {
        self.send_with_phase(method, path, query, body)
            .await
            .map(|(response, _)| response)
    }

    /// [`Self::send`], also reporting the terminal [`RequestPhase`].
    #[instrument(skip(self, query, body), fields(method = %method, path = %path))]
    pub async fn send_with_phase(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<(Response, RequestPhase), ApiError> {
        let request_id = Uuid::new_v4().to_string();

        let response = self.dispatch(&method, path, query, body, &request_id).await?;

        if response.status() != StatusCode::UNAUTHORIZED || is_recovery_exempt(path) {
            return Ok((response, RequestPhase::Sent));
        }

        // Sent -> Unauthorized -> Refreshing
        debug!(path, "credential rejected, attempting refresh");

        match self.refresh().await {
            Ok(()) => {
                // Refreshing -> Retried: re-issue exactly once with the new token
                let retried = self.dispatch(&method, path, query, body, &request_id).await?;
                Ok((retried, RequestPhase::Retried))
            }
            Err(err) => {
                // Refreshing -> Failed: surface the original 401 unmodified
                debug!(error = %err, "refresh failed, surfacing original response");
                Ok((response, RequestPhase::Failed))
            }
        }
    }

    /// Build and fire a single HTTP request.
    async fn dispatch(
        &self,
        method: &Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&serde_json::Value>,
        request_id: &str,
    ) -> Result<Response, ApiError> {
        let url = format!("{}{}", self.inner.base_url, path);

        let mut builder = self
            .inner
            .http
            .request(method.clone(), &url)
            .header(REQUEST_ID_HEADER, request_id);

        if !query.is_empty() {
            builder = builder.query(query);
        }

        if let Some(token) = self.inner.tokens.bearer() {
            builder = builder.bearer_auth(token);
        }

        if let Some(json) = body {
            builder = builder.json(json);
        }

        Ok(builder.send().await?)
    }

    /// Exchange the refresh cookie for a new access token.
    ///
    /// On success the new token replaces the held one; on failure the held
    /// token is cleared (it was already rejected).
    async fn refresh(&self) -> Result<(), ApiError> {
        let url = format!("{}{REFRESH_PATH}", self.inner.base_url);

        let response = self.inner.http.post(&url).send().await?;

        if !response.status().is_success() {
            self.inner.tokens.clear();
            return Err(ApiError::Unauthorized("token refresh failed".to_string()));
        }

        let text = response.text().await?;
        let jwt: JwtResponse = serde_json::from_str(&text)?;
        self.inner.tokens.set(jwt.access_token);
        Ok(())
    }

    // =========================================================================
    // JSON convenience layer
    //
    // The service layers talk through these; they map non-2xx responses into
    // the error taxonomy using the server-supplied body.
    // =========================================================================

    /// GET and parse a JSON body.
    ///
    /// # Errors
    ///
    /// Network failures, non-2xx responses, and unparseable bodies.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T, ApiError> {
        let response = self.send(Method::GET, path, query, None).await?;
        Self::parse_json(response).await
    }

    /// GET a plain-text body.
    ///
    /// # Errors
    ///
    /// Network failures and non-2xx responses.
    pub async fn get_text(&self, path: &str) -> Result<String, ApiError> {
        let response = self.send(Method::GET, path, &[], None).await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.text().await?)
    }

    /// POST a JSON body and parse a JSON response.
    ///
    /// # Errors
    ///
    /// Network failures, non-2xx responses, and unparseable bodies.
    pub async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let value = serde_json::to_value(body)?;
        let response = self.send(Method::POST, path, &[], Some(&value)).await?;
        Self::parse_json(response).await
    }

    /// POST a JSON body, expecting a plain-text response.
    ///
    /// # Errors
    ///
    /// Network failures and non-2xx responses.
    pub async fn post_text<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<String, ApiError> {
        let value = serde_json::to_value(body)?;
        let response = self.send(Method::POST, path, &[], Some(&value)).await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.text().await?)
    }

    /// POST with query parameters and no body, discarding the response body.
    ///
    /// # Errors
    ///
    /// Network failures and non-2xx responses.
    pub async fn post_query(&self, path: &str, query: &[(String, String)]) -> Result<(), ApiError> {
        let response = self.send(Method::POST, path, query, None).await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    /// DELETE with query parameters, discarding the response body.
    ///
    /// # Errors
    ///
    /// Network failures and non-2xx responses.
    pub async fn delete_query(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<(), ApiError> {
        let response = self.send(Method::DELETE, path, query, None).await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    /// PUT a JSON body and parse a JSON response.
    ///
    /// # Errors
    ///
    /// Network failures, non-2xx responses, and unparseable bodies.
    pub async fn put_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let value = serde_json::to_value(body)?;
        let response = self.send(Method::PUT, path, &[], Some(&value)).await?;
        Self::parse_json(response).await
    }

    /// PUT a JSON body, discarding the response body.
    ///
    /// # Errors
    ///
    /// Network failures and non-2xx responses.
    pub async fn put_empty<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), ApiError> {
        let value = serde_json::to_value(body)?;
        let response = self.send(Method::PUT, path, &[], Some(&value)).await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Map a non-2xx response into the error taxonomy using the server body.
    async fn ensure_success(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = extract_message(&body, status);
        Err(ApiError::from_status(status.as_u16(), message))
    }
}

/// Paths where a 401 must not trigger recovery: refreshing in response to a
/// failed refresh would recurse, and a 401 from login means bad credentials.
fn is_recovery_exempt(path: &str) -> bool {
    path == REFRESH_PATH || path == LOGIN_PATH
}

/// Pull a human-readable message out of an error body.
///
/// The service answers some errors with a JSON object carrying a `message`
/// field and others with plain text; fall back to the status reason when the
/// body is empty.
fn extract_message(body: &str, status: StatusCode) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body)
        && let Some(message) = value.get("message").and_then(|m| m.as_str())
    {
        return message.to_string();
    }

    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.to_string()
    }
}
