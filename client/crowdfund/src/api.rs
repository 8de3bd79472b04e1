//! Backend REST client.
//!
//! Thin typed wrapper over [`reqwest`]: joins paths onto the configured base
//! URL, attaches the bearer token when one is given, and turns non-2xx
//! answers into [`ClientError::Http`] carrying the backend's own message.

use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::errors::{ClientError, Result};

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    // ─────────────────────────────────────────────────────────
    // Verbs
    // ─────────────────────────────────────────────────────────

    pub async fn get<T: DeserializeOwned>(&self, path: &str, token: Option<&str>) -> Result<T> {
        self.send(self.request(Method::GET, path, token)).await
    }

    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q, token: Option<&str>) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.send(self.request(Method::GET, path, token).query(query))
            .await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B, token: Option<&str>) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(self.request(Method::POST, path, token).json(body))
            .await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B, token: Option<&str>) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(self.request(Method::PUT, path, token).json(body))
            .await
    }

    /// `DELETE` ignores whatever body the backend sends back.
    pub async fn delete(&self, path: &str, token: Option<&str>) -> Result<()> {
        let response = self.request(Method::DELETE, path, token).send().await?;
        check_status(response).await.map(|_| ())
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let url = self.url(path);
        debug!("{method} {url}");
        let builder = self.http.request(method, url);
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder.send().await?;
        let body = check_status(response).await?;
        // An empty 2xx body decodes as JSON `null`.
        let text = if body.trim().is_empty() { "null" } else { body.as_str() };
        Ok(serde_json::from_str(text)?)
    }
}

/// Join path segments into a request path, percent-encoding each one.
///
/// A `/`, `?`, `#` or `%` inside an id stays inside its own segment. Empty and
/// dot segments are refused because they would move the request elsewhere.
pub fn path(segments: &[&str]) -> Result<String> {
    if let Some(bad) = segments
        .iter()
        .find(|s| s.trim().is_empty() || matches!(**s, "." | ".."))
    {
        return Err(ClientError::precondition(format!("Invalid path segment '{bad}'")));
    }

    let mut url = Url::parse("http://segments.invalid/")
        .map_err(|e| ClientError::Config(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| ClientError::Config("Cannot build request path".to_string()))?
        .extend(segments);

    // Tabs and newlines are dropped while encoding, which can leave a dot
    // segment behind that the URL parser then collapses.
    let pushed = url.path_segments().map(|s| s.count()).unwrap_or(0);
    if pushed != segments.len() {
        return Err(ClientError::precondition(format!(
            "Invalid path segment in '{}'",
            segments.join("/")
        )));
    }
    Ok(url.path().to_string())
}

/// Return the body of a 2xx response, or an [`ClientError::Http`] for anything else.
async fn check_status(response: reqwest::Response) -> Result<String> {
    let status = response.status();
    let body = response.text().await?;
    if status.is_success() {
        return Ok(body);
    }
    let message = error_message(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .map(String::from)
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
    });
    Err(ClientError::Http {
        status: status.as_u16(),
        message,
    })
}

/// Pull a human-readable message out of an error body.
fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => extract_field(&value, &["error", "message", "detail"]),
        Err(_) => Some(trimmed.to_string()),
    }
}

fn extract_field(value: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        match value.get(key) {
            Some(Value::String(s)) => return Some(s.clone()),
            Some(Value::Array(items)) => {
                if let Some(Value::String(s)) = items.first() {
                    return Some(s.clone());
                }
            }
            _ => {}
        }
    }
    None
}
