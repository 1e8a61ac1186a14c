use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::{Headers, Method, TransportError, TransportErrorKind, TransportOptions};

/// A single request as handed to a [`Transport`].
#[derive(Clone, Debug, PartialEq)]
pub struct TransportRequest {
    pub url: String,
    pub method: Method,
    pub headers: Headers,
    pub body: Option<Bytes>,
    /// Per-attempt timeout; the engine enforces it as well.
    pub timeout: Option<Duration>,
    pub options: TransportOptions,
}

/// Raw response returned by a [`Transport`].
#[derive(Clone, Debug, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Headers,
    pub body: Bytes,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs one HTTP exchange.
///
/// Implementations must not retry on their own; the engine owns the retry
/// loop. On wasm32 the returned future need not be `Send`.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait Transport: Send + Sync {
    async fn perform(&self, request: TransportRequest)
        -> Result<TransportResponse, TransportError>;
}

/// [`Transport`] backed by a `reqwest::Client`.
///
/// Honors the pass-through option `"query"`: an object whose entries are
/// appended to the URL as query pairs. Other options are ignored.
#[derive(Clone, Default)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReqwestTransport").finish_non_exhaustive()
    }
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing client, keeping its pool and TLS settings.
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl Transport for ReqwestTransport {
    async fn perform(
        &self,
        request: TransportRequest,
    ) -> Result<TransportResponse, TransportError> {
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|err| TransportError::other(format!("invalid method: {err}")))?;

        let mut builder = self
            .http
            .request(method, &request.url)
            .headers(request.headers.into_map());

        if let Some(query) = query_pairs(&request.options)? {
            builder = builder.query(&query);
        }
        if let Some(timeout) = request.timeout {
            // On WASM, reqwest uses AbortController for timeout.
            builder = builder.timeout(timeout);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let headers = Headers::from(response.headers().clone());
        let body = response.bytes().await.map_err(map_reqwest_error)?;

        Ok(TransportResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_owned(),
            headers,
            body,
        })
    }
}

fn query_pairs(options: &TransportOptions) -> Result<Option<Vec<(String, String)>>, TransportError> {
    let Some(query) = options.get("query") else {
        return Ok(None);
    };
    let object = query
        .as_object()
        .ok_or_else(|| TransportError::other("transport option 'query' must be an object"))?;

    let pairs = object
        .iter()
        .map(|(key, value)| {
            let value = match value {
                serde_json::Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            (key.clone(), value)
        })
        .collect();
    Ok(Some(pairs))
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    let kind = if err.is_timeout() {
        TransportErrorKind::Timeout
    } else if is_connect(&err) {
        TransportErrorKind::Connect
    } else if err.is_request() || err.is_body() {
        TransportErrorKind::Io
    } else {
        TransportErrorKind::Other
    };
    TransportError::new(kind, err.to_string())
}

// is_connect() is not available on wasm32 targets (no TCP)
fn is_connect(err: &reqwest::Error) -> bool {
    #[cfg(not(target_arch = "wasm32"))]
    {
        err.is_connect()
    }
    #[cfg(target_arch = "wasm32")]
    {
        let _ = err;
        false
    }
}
