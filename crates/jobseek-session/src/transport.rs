//! Transport collaborator: GET/POST/PATCH against the Jobseek API.
//!
//! Operations depend only on the [`Transport`] trait. [`HttpTransport`] is the
//! reqwest-backed implementation; it presents the stored refresh credential
//! as a cookie on every request, the way a browser would.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::{AUTHORIZATION, COOKIE};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;
use crate::error::{RequestError, RequestErrorKind};
use crate::session::User;
use crate::storage::{CookieJar, REFRESH_COOKIE};

/// Data carried by a successful API response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

/// Async transport result.
pub type TransportFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ApiResponse, RequestError>> + Send + 'a>>;

/// HTTP helpers the session operations rely on.
pub trait Transport: Send + Sync {
    fn get<'a>(&'a self, path: &'a str) -> TransportFuture<'a>;

    fn post<'a>(&'a self, path: &'a str, body: Value) -> TransportFuture<'a>;

    /// PATCH authorized by the given access token.
    fn patch<'a>(&'a self, path: &'a str, body: Value, auth_token: &'a str)
    -> TransportFuture<'a>;
}

/// reqwest-backed transport.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: url::Url,
    cookies: Option<Arc<dyn CookieJar>>,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url.as_str())
            .field("cookies", &self.cookies.is_some())
            .finish()
    }
}

impl HttpTransport {
    /// Creates a transport for the given API base URL.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the client cannot be built.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        // A trailing slash makes `join` append instead of replacing the last segment.
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = url::Url::parse(&normalized)
            .with_context(|| format!("Invalid API base URL: {base_url}"))?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url,
            cookies: None,
        })
    }

    /// Creates a transport from config (base URL + timeout).
    ///
    /// # Errors
    /// Returns an error if the configured URL is invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.effective_api_base_url(), config.request_timeout())
    }

    /// Presents the refresh credential from `jar` on every request.
    #[must_use]
    pub fn with_cookie_jar(mut self, jar: Arc<dyn CookieJar>) -> Self {
        self.cookies = Some(jar);
        self
    }

    fn url(&self, path: &str) -> Result<url::Url, RequestError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| RequestError::new(RequestErrorKind::Connect, format!("bad path {path}: {e}")))
    }

    fn cookie_header(&self) -> Option<String> {
        let jar = self.cookies.as_ref()?;
        match jar.cookie(REFRESH_COOKIE) {
            Ok(cookie) => cookie.map(|c| format!("{REFRESH_COOKIE}={}", c.value)),
            Err(e) => {
                tracing::warn!(error = %e, "could not read refresh credential");
                None
            }
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> Result<reqwest::RequestBuilder, RequestError> {
        let url = self.url(path)?;
        tracing::debug!(%method, %url, "api request");
        let mut builder = self.client.request(method, url);
        if let Some(cookie) = self.cookie_header() {
            builder = builder.header(COOKIE, cookie);
        }
        Ok(builder)
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<ApiResponse, RequestError> {
        let response = builder.send().await.map_err(classify_reqwest_error)?;
        let status = response.status();
        let body = response.text().await.map_err(classify_reqwest_error)?;

        if !status.is_success() {
            let err = RequestError::http_status(status.as_u16(), &body);
            tracing::debug!(status = status.as_u16(), msg = ?err.server_message(), "api error");
            return Err(err);
        }

        if body.trim().is_empty() {
            return Ok(ApiResponse::default());
        }

        serde_json::from_str(&body).map_err(|e| {
            RequestError::new(
                RequestErrorKind::Decode,
                format!("Failed to parse API response: {e}"),
            )
        })
    }
}

impl Transport for HttpTransport {
    fn get<'a>(&'a self, path: &'a str) -> TransportFuture<'a> {
        Box::pin(async move {
            let builder = self.request(reqwest::Method::GET, path)?;
            self.send(builder).await
        })
    }

    fn post<'a>(&'a self, path: &'a str, body: Value) -> TransportFuture<'a> {
        Box::pin(async move {
            let builder = self.request(reqwest::Method::POST, path)?.json(&body);
            self.send(builder).await
        })
    }

    fn patch<'a>(
        &'a self,
        path: &'a str,
        body: Value,
        auth_token: &'a str,
    ) -> TransportFuture<'a> {
        Box::pin(async move {
            // The API expects the bare token, without a "Bearer" scheme.
            let builder = self
                .request(reqwest::Method::PATCH, path)?
                .header(AUTHORIZATION, auth_token)
                .json(&body);
            self.send(builder).await
        })
    }
}

/// Classifies a reqwest error into a `RequestError`.
pub(crate) fn classify_reqwest_error(e: reqwest::Error) -> RequestError {
    if e.is_timeout() {
        RequestError::new(RequestErrorKind::Timeout, format!("Request timed out: {e}"))
    } else if e.is_decode() {
        RequestError::new(RequestErrorKind::Decode, e.to_string())
    } else {
        RequestError::new(RequestErrorKind::Connect, format!("Request failed: {e}"))
    }
}
