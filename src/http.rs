//! HTTP-invocation collaborator
//!
//! Sends a described request to the service under test and hands back the
//! status code plus the body decoded into a generic tree. The scenario
//! runner is synchronous, so [`HttpClient`] owns a small current-thread
//! runtime and blocks on each request.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

use crate::common::config::HttpConfig;
use crate::common::{Error, Result};

/// Description of one request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestSpec {
    /// GET, POST, PUT, PATCH or DELETE (case-insensitive). Defaults to GET.
    #[serde(default)]
    pub method: Option<String>,
    pub path: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// A string body is sent verbatim; anything else is serialized as JSON.
    #[serde(default)]
    pub body: Option<Value>,
    #[serde(default)]
    pub query: Option<BTreeMap<String, String>>,
    /// Log the request and response at info level.
    #[serde(default)]
    pub debug: bool,
}

impl RequestSpec {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Some("POST".to_string()),
            path: path.into(),
            body: Some(body),
            ..Self::default()
        }
    }

    pub fn method(&self) -> Result<Method> {
        match self
            .method
            .as_deref()
            .map(str::to_ascii_uppercase)
            .as_deref()
        {
            None | Some("GET") => Ok(Method::GET),
            Some("POST") => Ok(Method::POST),
            Some("PUT") => Ok(Method::PUT),
            Some("PATCH") => Ok(Method::PATCH),
            Some("DELETE") => Ok(Method::DELETE),
            Some(other) => Err(Error::UnsupportedMethod(other.to_string())),
        }
    }

    /// Body as it goes on the wire.
    pub fn body_text(&self) -> Result<Option<String>> {
        match &self.body {
            None => Ok(None),
            Some(Value::String(text)) => Ok(Some(text.clone())),
            Some(value) => Ok(Some(serde_json::to_string(value)?)),
        }
    }
}

/// Status plus decoded body.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Value,
}

impl HttpResponse {
    /// Decode a raw body. An empty body decodes to null; a body that is not
    /// JSON is kept as text so the status and presence checks still run.
    pub fn decode(url: &str, status: u16, raw: &[u8]) -> Self {
        let body = if raw.iter().all(u8::is_ascii_whitespace) {
            Value::Null
        } else {
            serde_json::from_slice(raw).unwrap_or_else(|error| {
                warn!(%url, status, %error, "response body is not JSON, keeping it as text");
                Value::String(String::from_utf8_lossy(raw).into_owned())
            })
        };
        Self { status, body }
    }
}

/// Anything that can execute a [`RequestSpec`].
pub trait HttpInvoker {
    fn invoke(&self, request: &RequestSpec) -> Result<HttpResponse>;
}

/// `reqwest`-backed invoker against a base URL.
pub struct HttpClient {
    runtime: Runtime,
    client: reqwest::Client,
    base_url: String,
    headers: BTreeMap<String, String>,
}

impl HttpClient {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|source| Error::Http {
                url: config.base_url.clone(),
                source,
            })?;

        Ok(Self {
            runtime,
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            headers: config.headers.clone(),
        })
    }

    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send(&self, request: &RequestSpec) -> Result<HttpResponse> {
        let method = request.method()?;
        let url = self.url_for(&request.path);

        let mut builder = self
            .client
            .request(method.clone(), &url)
            .headers(self.headers_for(request)?);
        if let Some(query) = &request.query {
            builder = builder.query(query);
        }
        let body = request.body_text()?;
        if let Some(body) = &body {
            builder = builder.body(body.clone());
        }

        if request.debug {
            info!(%method, %url, body = body.as_deref().unwrap_or(""), "request");
        } else {
            debug!(%method, %url, "request");
        }

        let http_error = |source| Error::Http {
            url: url.clone(),
            source,
        };
        let response = builder.send().await.map_err(http_error)?;
        let status = response.status().as_u16();
        let raw = response.bytes().await.map_err(http_error)?;

        if request.debug {
            info!(status, body = %String::from_utf8_lossy(&raw), "response");
        } else {
            debug!(status, bytes = raw.len(), "response");
        }

        Ok(HttpResponse::decode(&url, status, &raw))
    }

    /// Configured headers overlaid with the request's own; names compare
    /// case-insensitively. `Content-Type` defaults to JSON.
    pub fn headers_for(&self, request: &RequestSpec) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        for (name, value) in self.headers.iter().chain(&request.headers) {
            let invalid = |reason: String| Error::InvalidHeader {
                name: name.clone(),
                reason,
            };
            let header =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
            let value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
            headers.insert(header, value);
        }
        headers
            .entry(CONTENT_TYPE)
            .or_insert(HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

impl HttpInvoker for HttpClient {
    fn invoke(&self, request: &RequestSpec) -> Result<HttpResponse> {
        self.runtime.block_on(self.send(request))
    }
}
