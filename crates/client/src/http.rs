//! Thin wrapper over [`reqwest`] that knows the backend base URL and the
//! session token.

use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::query::QueryParams;
use crate::session::SessionStore;

/// HTTP client for the PlatformOPS backend.
pub struct HttpClient {
    client: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
}

impl HttpClient {
    /// Create a client for `base_url`, e.g. `http://localhost:8000`.
    pub fn new(base_url: &str, session: Arc<SessionStore>) -> Result<Self, ApiError> {
        Self::with_client(reqwest::Client::new(), base_url, session)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        base_url: &str,
        session: Arc<SessionStore>,
    ) -> Result<Self, ApiError> {
        url::Url::parse(base_url)?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a path relative to the base, with query string.
    pub fn url(&self, path: &str, query: &QueryParams) -> String {
        let path = path.trim_start_matches('/');
        if query.is_empty() {
            format!("{}/{}", self.base_url, path)
        } else {
            format!("{}/{}?{}", self.base_url, path, query.encode())
        }
    }

    pub async fn get(&self, path: &str, query: &QueryParams) -> Result<Value, ApiError> {
        self.send::<()>(Method::GET, path, query, None).await
    }

    /// `GET` a strictly typed resource.
    pub async fn get_as<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &QueryParams,
    ) -> Result<T, ApiError> {
        let body = self.get(path, query).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// `GET` with an explicit bearer token instead of the session's, for
    /// requests made before the session exists.
    pub async fn get_as_with_token<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &QueryParams,
        token: &str,
    ) -> Result<T, ApiError> {
        let body = self
            .send_with_token::<()>(Method::GET, path, query, None, Some(token.to_string()))
            .await?;
        Ok(serde_json::from_value(body)?)
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &QueryParams,
        body: Option<&B>,
    ) -> Result<Value, ApiError> {
        self.send(Method::POST, path, query, body).await
    }

    pub async fn post_as<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        query: &QueryParams,
        body: Option<&B>,
    ) -> Result<T, ApiError> {
        let body = self.post(path, query, body).await?;
        Ok(serde_json::from_value(body)?)
    }

    // ---- private helpers ----

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &QueryParams,
        body: Option<&B>,
    ) -> Result<Value, ApiError> {
        self.send_with_token(method, path, query, body, self.session.token())
            .await
    }

    async fn send_with_token<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &QueryParams,
        body: Option<&B>,
        token: Option<String>,
    ) -> Result<Value, ApiError> {
        let mut request = self.client.request(method.clone(), self.url(path, query));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        tracing::debug!(
            method = %method,
            path,
            status = response.status().as_u16(),
            "Backend request",
        );

        Self::parse_response(response).await
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or an [`ApiError::Status`] carrying
    /// the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful body as JSON; an empty body is `null`.
    async fn parse_response(response: reqwest::Response) -> Result<Value, ApiError> {
        let response = Self::ensure_success(response).await?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn client(base: &str) -> HttpClient {
        let session = SessionStore::load(Arc::new(MemoryStore::new())).unwrap();
        HttpClient::new(base, Arc::new(session)).unwrap()
    }

    #[test]
    fn url_joins_base_path_and_query() {
        let http = client("http://localhost:8000/");
        assert_eq!(
            http.url("/api/alerts/events", &QueryParams::new().push("limit", 100)),
            "http://localhost:8000/api/alerts/events?limit=100"
        );
        assert_eq!(
            http.url("api/system/overview", &QueryParams::new()),
            "http://localhost:8000/api/system/overview"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let session = SessionStore::load(Arc::new(MemoryStore::new())).unwrap();
        let result = HttpClient::new("not a url", Arc::new(session));
        assert!(matches!(result, Err(ApiError::Url(_))));
    }
}
