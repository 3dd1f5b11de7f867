//! Typed JSON client for the Balance REST API
//!
//! Every call returns a [`CallResult`], so it can be handed straight to the
//! safe call runner. The client itself never retries.

use std::sync::Arc;
use std::time::Duration;

use balance_common::{CallError, CallResult};
use balance_domain::{ApiConfig, BalanceError};
use parking_lot::RwLock;
use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::{Client as ReqwestClient, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument};
use url::Url;

use crate::errors::{InfraError, IntoCallError};

/// Query pairs; blank values are dropped before sending
pub type Query<'a> = &'a [(&'a str, String)];

/// Client for `<base_url>/api` with an optional bearer token
#[derive(Clone)]
pub struct ApiClient {
    client: ReqwestClient,
    endpoint: String,
    timeout: Duration,
    token: Arc<RwLock<Option<String>>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .field("authenticated", &self.token.read().is_some())
            .finish()
    }
}

impl ApiClient {
    /// Start building a new API client.
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Client for the endpoint and timeout in `config`.
    ///
    /// # Errors
    ///
    /// Returns `BalanceError::Config` if the base URL is invalid or the
    /// underlying HTTP client cannot be built.
    pub fn from_config(config: &ApiConfig) -> balance_domain::Result<Self> {
        Self::builder()
            .base_url(&config.base_url)
            .prefix(&config.prefix)
            .timeout(config.timeout())
            .build()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Attach `Authorization: Bearer <token>` to subsequent requests
    pub fn set_auth_token(&self, token: impl Into<String>) {
        *self.token.write() = Some(token.into());
    }

    pub fn clear_auth_token(&self) {
        *self.token.write() = None;
    }

    pub fn has_auth_token(&self) -> bool {
        self.token.read().is_some()
    }

    /// `GET path?query`
    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: Query<'_>) -> CallResult<T> {
        self.execute(Method::GET, path, query, None).await
    }

    /// `POST path` with a JSON body
    pub async fn post<B, T>(&self, path: &str, body: &B) -> CallResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        self.execute(Method::POST, path, &[], Some(body)).await
    }

    /// `PUT path` without a body
    pub async fn put<T: DeserializeOwned>(&self, path: &str) -> CallResult<T> {
        self.execute(Method::PUT, path, &[], None).await
    }

    /// `PUT path` with a JSON body
    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> CallResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        self.execute(Method::PUT, path, &[], Some(body)).await
    }

    /// `DELETE path`
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> CallResult<T> {
        self.execute(Method::DELETE, path, &[], None).await
    }

    #[instrument(skip(self, query, body))]
    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: Query<'_>,
        body: Option<serde_json::Value>,
    ) -> CallResult<T> {
        let url = format!("{}{}", self.endpoint, path);
        let params: Vec<_> = query.iter().filter(|(_, value)| !value.trim().is_empty()).collect();

        let mut request = self
            .client
            .request(method, &url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .query(&params);
        let token = self.token.read().clone();
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        debug!(url = %url, "sending API request");
        let response =
            request.send().await.map_err(|err| err.into_call_error(self.timeout))?;

        let status = response.status();
        debug!(url = %url, %status, "received API response");

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(CallError::Http { status: status.as_u16(), detail: error_detail(status, &text) });
        }

        let bytes = response.bytes().await.map_err(|err| err.into_call_error(self.timeout))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            // 204 and other bodiless successes decode from `null`
            return serde_json::from_value(serde_json::Value::Null).map_err(|_| {
                CallError::Decode(format!(
                    "empty response ({}) cannot be decoded into the expected type",
                    status.as_u16()
                ))
            });
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Human-readable failure detail: JSON `detail` or `message`, else the raw
/// body, else the status reason.
fn error_detail(status: StatusCode, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        let field = ["detail", "message", "title"]
            .iter()
            .find_map(|key| json.get(*key).and_then(serde_json::Value::as_str));
        if let Some(text) = field {
            return text.to_string();
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status.canonical_reason().unwrap_or("request failed").to_string()
    } else {
        trimmed.to_string()
    }
}

/// Builder for [`ApiClient`].
#[derive(Debug)]
pub struct ApiClientBuilder {
    base_url: String,
    prefix: String,
    timeout: Duration,
    user_agent: Option<String>,
    token: Option<String>,
}

impl Default for ApiClientBuilder {
    fn default() -> Self {
        let config = ApiConfig::default();
        let timeout = config.timeout();
        Self {
            base_url: config.base_url,
            prefix: config.prefix,
            timeout,
            user_agent: None,
            token: None,
        }
    }
}

impl ApiClientBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Path prefix appended to the base URL (`/api` by default)
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// # Errors
    ///
    /// Returns `BalanceError::Config` for an unparsable base URL or a
    /// reqwest builder failure.
    pub fn build(self) -> balance_domain::Result<ApiClient> {
        Url::parse(&self.base_url).map_err(|err| {
            BalanceError::Config(format!("Invalid API base URL '{}': {err}", self.base_url))
        })?;

        let mut builder = ReqwestClient::builder().timeout(self.timeout);
        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }
        let client = builder.build().map_err(|err| BalanceError::from(InfraError::from(err)))?;

        let endpoint = format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.prefix.trim_end_matches('/')
        );

        Ok(ApiClient {
            client,
            endpoint,
            timeout: self.timeout,
            token: Arc::new(RwLock::new(self.token)),
        })
    }
}
