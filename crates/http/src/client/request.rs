//! Replayable request descriptions and bearer authentication

use super::ClientError;
use reqwest::{Method, RequestBuilder, Response, header};
use serde::Serialize;

/// An API call that can be issued again after a token refresh.
///
/// The request is rebuilt from this description on every attempt, so a retry
/// picks up whatever access token is current at that moment.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) body: Option<serde_json::Value>,
    pub(crate) retried: bool,
}

impl PendingRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            retried: false,
        }
    }

    /// Attach a JSON body
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ClientError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub const fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether this request already went through a refresh-and-retry
    pub const fn is_retry(&self) -> bool {
        self.retried
    }

    pub(crate) fn build(&self, http: &reqwest::Client, base_url: &str) -> RequestBuilder {
        let url = format!("{base_url}{}", self.path);
        let builder = http.request(self.method.clone(), url);
        match &self.body {
            Some(body) => builder.json(body),
            None => builder,
        }
    }
}

/// Set the bearer credential on an outgoing request, if there is one
pub fn authorize(builder: RequestBuilder, access_token: Option<&str>) -> RequestBuilder {
    match access_token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {token}")),
        None => builder,
    }
}

/// Turn a non-success response into an error, preferring the server's own message
pub async fn error_from_response(response: Response) -> ClientError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    ClientError::from_status(status, extract_message(&text).unwrap_or_else(|| status.to_string()))
}

fn extract_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str(body) {
        for key in ["mensaje", "message", "msg", "error"] {
            if let Some(serde_json::Value::String(message)) = map.get(key) {
                return Some(message.clone());
            }
        }
    }
    Some(body.to_string())
}
