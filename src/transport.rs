use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, Method,
};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::{Result, VectoError};

pub const TEXT_MIME: &str = "text/plain";
pub const BINARY_MIME: &str = "application/octet-stream";

/// A bearer token. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Bearer(String);

impl Bearer {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Bearer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Bearer(<redacted>)")
    }
}

/// One request against the service, fully shaped and authenticated.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// Client operation name, used for error context.
    pub operation: &'static str,
    pub method: Method,
    /// Path relative to the base URL, e.g. `api/v0/lookup`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub bearer: Bearer,
    pub body: Body,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    Json(Value),
    Multipart(MultipartForm),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PartValue {
    Text(String),
    File { bytes: Vec<u8>, mime: &'static str },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormPart {
    pub name: String,
    pub value: PartValue,
}

/// An ordered multipart body. Repeated names are significant: the service
/// pairs the n-th `id` with the n-th `input`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartForm {
    parts: Vec<FormPart>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.parts.push(FormPart {
            name: name.to_string(),
            value: PartValue::Text(value.into()),
        });
        self
    }

    pub fn file(mut self, name: &str, bytes: Vec<u8>, mime: &'static str) -> Self {
        self.parts.push(FormPart {
            name: name.to_string(),
            value: PartValue::File { bytes, mime },
        });
        self
    }

    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    /// Values of every text field called `name`, in order.
    pub fn texts(&self, name: &str) -> Vec<&str> {
        self.parts
            .iter()
            .filter(|p| p.name == name)
            .filter_map(|p| match &p.value {
                PartValue::Text(text) => Some(text.as_str()),
                PartValue::File { .. } => None,
            })
            .collect()
    }

    /// Contents of every file part called `name`, in order.
    pub fn files(&self, name: &str) -> Vec<&[u8]> {
        self.parts
            .iter()
            .filter(|p| p.name == name)
            .filter_map(|p| match &p.value {
                PartValue::File { bytes, .. } => Some(bytes.as_slice()),
                PartValue::Text(_) => None,
            })
            .collect()
    }

    fn into_reqwest(self) -> std::result::Result<Form, reqwest::Error> {
        let mut form = Form::new();
        for part in self.parts {
            form = match part.value {
                PartValue::Text(text) => form.text(part.name, text),
                PartValue::File { bytes, mime } => form.part(
                    part.name,
                    Part::bytes(bytes).file_name("_").mime_str(mime)?,
                ),
            };
        }
        Ok(form)
    }
}

/// Sends shaped requests and returns the decoded JSON body.
///
/// Implementations must be safe to share between concurrent callers.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn send(&self, request: ApiRequest) -> Result<Value>;
}

/// The reqwest backed transport. Clones share one connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(VectoError::Config(format!(
                "base url must start with http:// or https://, got `{base_url}`"
            )));
        }
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| VectoError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip_all, fields(operation = request.operation, method = %request.method, path = %request.path))]
    async fn send(&self, request: ApiRequest) -> Result<Value> {
        let ApiRequest {
            operation,
            method,
            path,
            query,
            bearer,
            body,
        } = request;

        let mut builder = self
            .client
            .request(method, self.url(&path))
            .bearer_auth(bearer.secret());
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        builder = match body {
            Body::Empty => builder,
            Body::Json(json) => builder.json(&json),
            Body::Multipart(form) => {
                let form = form.into_reqwest().map_err(|source| VectoError::Transport {
                    operation,
                    path: path.clone(),
                    source,
                })?;
                builder.multipart(form)
            }
        };

        debug!("sending request");
        let response = match builder.send().await {
            Ok(response) => response,
            Err(source) => {
                return Err(VectoError::Transport {
                    operation,
                    path,
                    source,
                })
            }
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(source) => {
                return Err(VectoError::Transport {
                    operation,
                    path,
                    source,
                })
            }
        };
        debug!(status = status.as_u16(), "received response");

        if !status.is_success() {
            return Err(VectoError::Api {
                operation,
                path,
                status: status.as_u16(),
                message: text,
            });
        }
        parse_body(operation, &text)
    }
}

/// Empty bodies decode to `null`; anything else must be JSON.
pub(crate) fn parse_body(operation: &'static str, text: &str) -> Result<Value> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text)
        .map_err(|e| VectoError::decode(operation, format!("malformed JSON body: {e}")))
}
