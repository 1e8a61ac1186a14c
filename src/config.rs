use std::collections::BTreeMap;
use std::fmt;

use reqwest::header::{HeaderValue, CONTENT_TYPE};

use crate::{Body, FetchError, Headers, Result};

/// Default number of retries after the initial attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default base delay for exponential backoff, in milliseconds.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;

/// Opaque options handed through to the [`Transport`](crate::Transport).
pub type TransportOptions = BTreeMap<String, serde_json::Value>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Options => "OPTIONS",
            Self::Head => "HEAD",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a successful response body is decoded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ResponseMode {
    #[default]
    Json,
    Text,
    Blob,
    ArrayBuffer,
}

impl ResponseMode {
    /// `Accept` header value announced by the builder's mode shortcuts.
    pub fn accept(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Text => "text/plain",
            Self::Blob | Self::ArrayBuffer => "application/octet-stream",
        }
    }
}

/// Fully resolved configuration used for a whole attempt sequence.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestConfig {
    pub url: String,
    pub method: Method,
    pub headers: Headers,
    pub body: Option<Body>,
    pub response_mode: ResponseMode,
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Maximum number of retries after the initial attempt.
    pub max_retries: u32,
    /// Base retry backoff in milliseconds.
    pub retry_delay_ms: u64,
    pub transport_options: TransportOptions,
}

/// A configuration layer where every field may be left unset.
///
/// Used both for process-wide defaults and for the fields a builder set
/// explicitly.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PartialConfig {
    pub url: Option<String>,
    pub method: Option<Method>,
    pub headers: Option<Headers>,
    pub body: Option<Body>,
    pub response_mode: Option<ResponseMode>,
    pub timeout_ms: Option<u64>,
    pub max_retries: Option<u32>,
    pub retry_delay_ms: Option<u64>,
    pub transport_options: Option<TransportOptions>,
}

impl PartialConfig {
    /// Overlays every field set in `other` onto `self`.
    ///
    /// Last write wins per field; a set `headers` map replaces the previous
    /// one as a whole.
    pub fn merge(&mut self, other: PartialConfig) {
        macro_rules! overlay {
            ($($field:ident),*) => {
                $(if other.$field.is_some() {
                    self.$field = other.$field;
                })*
            };
        }
        overlay!(
            url,
            method,
            headers,
            body,
            response_mode,
            timeout_ms,
            max_retries,
            retry_delay_ms,
            transport_options
        );
    }

    /// Reads retry and timeout defaults from the environment.
    ///
    /// Reads:
    /// - `FETCH_TIMEOUT_MS` — per-attempt timeout
    /// - `FETCH_MAX_RETRIES` — retries after the initial attempt
    /// - `FETCH_RETRY_DELAY_MS` — base backoff delay
    ///
    /// Unset variables leave the field unset. Returns an error if a variable
    /// is set but not a valid number.
    ///
    /// **Not available on `wasm32` targets.**
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env() -> std::result::Result<Self, String> {
        Ok(Self {
            timeout_ms: read_env_number("FETCH_TIMEOUT_MS")?,
            max_retries: read_env_number("FETCH_MAX_RETRIES")?,
            retry_delay_ms: read_env_number("FETCH_RETRY_DELAY_MS")?,
            ..Self::default()
        })
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn read_env_number<T: std::str::FromStr>(name: &str) -> std::result::Result<Option<T>, String>
where
    T::Err: fmt::Display,
{
    match std::env::var(name) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|err| format!("invalid {name} value '{value}': {err}")),
        Err(_) => Ok(None),
    }
}

/// Resolves the configuration for one `execute` call.
///
/// Local fields override global ones, which override built-in defaults.
/// Headers are unioned with local values winning per name. A structured
/// body gets `Content-Type: application/json` unless one is already set.
pub fn effective_config(global: &PartialConfig, local: &PartialConfig) -> Result<RequestConfig> {
    let url = local
        .url
        .as_ref()
        .or(global.url.as_ref())
        .map(|url| url.trim())
        .filter(|url| !url.is_empty())
        .ok_or_else(|| FetchError::Unknown("request url is required".to_owned()))?
        .to_owned();

    let mut headers = global.headers.clone().unwrap_or_default();
    if let Some(local_headers) = &local.headers {
        headers.extend(local_headers);
    }

    let body = local.body.clone().or_else(|| global.body.clone());
    let structured = body.as_ref().is_some_and(Body::is_structured);
    if structured && !headers.as_map().contains_key(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }

    Ok(RequestConfig {
        url,
        method: local.method.or(global.method).unwrap_or_default(),
        headers,
        body,
        response_mode: local
            .response_mode
            .or(global.response_mode)
            .unwrap_or_default(),
        timeout_ms: local.timeout_ms.or(global.timeout_ms),
        max_retries: local
            .max_retries
            .or(global.max_retries)
            .unwrap_or(DEFAULT_MAX_RETRIES),
        retry_delay_ms: local
            .retry_delay_ms
            .or(global.retry_delay_ms)
            .unwrap_or(DEFAULT_RETRY_DELAY_MS),
        transport_options: local
            .transport_options
            .clone()
            .or_else(|| global.transport_options.clone())
            .unwrap_or_default(),
    })
}
