use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use reqwest::header::{HeaderName, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    backoff::{Sleeper, TimerSleeper},
    engine::Engine,
    headers::parse_header,
    AbortSignal, Body, ConfigStore, FetchError, Headers, Method, PartialConfig, ReqwestTransport,
    RequestInterceptor, Response, ResponseInterceptor, ResponseMode, Result, Transport,
    TransportOptions,
};

static DEFAULT_TRANSPORT: OnceLock<Arc<ReqwestTransport>> = OnceLock::new();

fn default_transport() -> Arc<dyn Transport> {
    DEFAULT_TRANSPORT
        .get_or_init(|| Arc::new(ReqwestTransport::new()))
        .clone()
}

#[derive(Clone)]
/// Fluent request builder.
///
/// Every setter records a local override; unset fields fall back to the
/// defaults held in the [`ConfigStore`], then to built-in defaults.
///
/// Setters that parse their input (such as [`FetchBuilder::header`]) keep
/// the first failure and [`FetchBuilder::execute`] returns it without
/// sending anything. [`FetchBuilder::try_header`] fails at the call site
/// instead.
///
/// # Example
///
/// ```no_run
/// use fetch_builder::FetchBuilder;
///
/// # async fn run() -> fetch_builder::Result<()> {
/// let response = FetchBuilder::get("https://api.example.com/users/1")
///     .header("Authorization", "Bearer token")
///     .max_retries(2)
///     .execute()
///     .await?;
/// println!("{:?}", response.data);
/// # Ok(())
/// # }
/// ```
pub struct FetchBuilder {
    local: PartialConfig,
    request_interceptors: Vec<Arc<dyn RequestInterceptor>>,
    response_interceptors: Vec<Arc<dyn ResponseInterceptor>>,
    transport: Arc<dyn Transport>,
    sleeper: Arc<dyn Sleeper>,
    store: ConfigStore,
    abort: Option<AbortSignal>,
    error: Option<FetchError>,
}

impl fmt::Debug for FetchBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut local = self.local.clone();
        if let Some(headers) = local.headers.as_mut() {
            if headers.as_map().contains_key(AUTHORIZATION) {
                headers.insert(AUTHORIZATION, HeaderValue::from_static("<redacted>"));
            }
        }
        f.debug_struct("FetchBuilder")
            .field("local", &local)
            .field("request_interceptors", &self.request_interceptors.len())
            .field("response_interceptors", &self.response_interceptors.len())
            .field("abort", &self.abort.is_some())
            .field("error", &self.error)
            .finish()
    }
}

impl Default for FetchBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchBuilder {
    /// Creates an empty builder bound to the process-wide defaults and the
    /// shared `reqwest` transport.
    pub fn new() -> Self {
        Self {
            local: PartialConfig::default(),
            request_interceptors: Vec::new(),
            response_interceptors: Vec::new(),
            transport: default_transport(),
            sleeper: Arc::new(TimerSleeper),
            store: ConfigStore::global().clone(),
            abort: None,
            error: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new().url(url).method(Method::Get)
    }

    pub fn post(url: impl Into<String>, body: impl Into<Body>) -> Self {
        Self::new().url(url).method(Method::Post).body(body)
    }

    pub fn put(url: impl Into<String>, body: impl Into<Body>) -> Self {
        Self::new().url(url).method(Method::Put).body(body)
    }

    pub fn patch(url: impl Into<String>, body: impl Into<Body>) -> Self {
        Self::new().url(url).method(Method::Patch).body(body)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new().url(url).method(Method::Delete)
    }

    pub fn head(url: impl Into<String>) -> Self {
        Self::new().url(url).method(Method::Head)
    }

    pub fn options(url: impl Into<String>) -> Self {
        Self::new().url(url).method(Method::Options)
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.local.url = Some(url.into());
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.local.method = Some(method);
        self
    }

    /// Sets one header, replacing every previous value with the same name.
    ///
    /// An invalid name or value is reported by [`FetchBuilder::execute`].
    pub fn header(self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        match parse_header(name.as_ref(), value.as_ref()) {
            Ok((name, value)) => self.insert_header(name, value),
            Err(err) => self.fail(err),
        }
    }

    /// Like [`FetchBuilder::header`], but rejects an invalid name or value
    /// immediately.
    pub fn try_header(self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let (name, value) = parse_header(name.as_ref(), value.as_ref())?;
        Ok(self.insert_header(name, value))
    }

    /// Merges `headers` into the headers set so far; names present in
    /// `headers` replace earlier values.
    pub fn headers(mut self, headers: impl Into<Headers>) -> Self {
        self.local
            .headers
            .get_or_insert_with(Headers::new)
            .extend(&headers.into());
        self
    }

    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.local.body = Some(body.into());
        self
    }

    /// Serializes `value` into a structured body.
    pub fn json_body<T: Serialize + ?Sized>(self, value: &T) -> Result<Self> {
        Ok(self.body(Body::json(value)?))
    }

    pub fn response_mode(mut self, mode: ResponseMode) -> Self {
        self.local.response_mode = Some(mode);
        self
    }

    /// Decodes the response as JSON and sends `Accept: application/json`.
    pub fn json(self) -> Self {
        self.accepting(ResponseMode::Json)
    }

    /// Decodes the response as text and sends `Accept: text/plain`.
    pub fn text(self) -> Self {
        self.accepting(ResponseMode::Text)
    }

    /// Returns the raw body and sends `Accept: application/octet-stream`.
    pub fn blob(self) -> Self {
        self.accepting(ResponseMode::Blob)
    }

    /// Same as [`FetchBuilder::blob`].
    pub fn array_buffer(self) -> Self {
        self.accepting(ResponseMode::ArrayBuffer)
    }

    fn accepting(self, mode: ResponseMode) -> Self {
        self.response_mode(mode)
            .insert_header(ACCEPT, HeaderValue::from_static(mode.accept()))
    }

    fn insert_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.local
            .headers
            .get_or_insert_with(Headers::new)
            .insert(name, value);
        self
    }

    fn fail(mut self, err: FetchError) -> Self {
        #[cfg(feature = "tracing")]
        tracing::debug!("builder setter rejected input: {}", err);
        self.error.get_or_insert(err);
        self
    }

    /// Per-attempt timeout in milliseconds.
    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.local.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn timeout(self, timeout: Duration) -> Self {
        let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self.timeout_ms(millis)
    }

    /// Maximum number of retries after the initial attempt.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.local.max_retries = Some(max_retries);
        self
    }

    /// Base delay of the exponential backoff, in milliseconds.
    pub fn retry_delay_ms(mut self, retry_delay_ms: u64) -> Self {
        self.local.retry_delay_ms = Some(retry_delay_ms);
        self
    }

    pub fn transport_option(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.local
            .transport_options
            .get_or_insert_with(TransportOptions::new)
            .insert(key.into(), value);
        self
    }

    pub fn transport_options(mut self, options: TransportOptions) -> Self {
        self.local.transport_options = Some(options);
        self
    }

    /// Registers a request interceptor; interceptors run in registration order.
    pub fn request_interceptor(mut self, interceptor: impl RequestInterceptor + 'static) -> Self {
        self.request_interceptors.push(Arc::new(interceptor));
        self
    }

    /// Registers a response interceptor; interceptors run in registration order.
    pub fn response_interceptor(mut self, interceptor: impl ResponseInterceptor + 'static) -> Self {
        self.response_interceptors.push(Arc::new(interceptor));
        self
    }

    pub fn abort_signal(mut self, signal: AbortSignal) -> Self {
        self.abort = Some(signal);
        self
    }

    /// Reads defaults from `store` instead of the process-wide one.
    pub fn with_store(mut self, store: ConfigStore) -> Self {
        self.store = store;
        self
    }

    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Arc::new(transport);
        self
    }

    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Arc::new(sleeper);
        self
    }

    /// Fields set explicitly on this builder.
    pub fn local_config(&self) -> &PartialConfig {
        &self.local
    }

    /// Sends the request, retrying transient failures.
    pub async fn execute(&self) -> Result<Response> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        let defaults = self.store.get_defaults();
        let engine = Engine {
            transport: self.transport.as_ref(),
            sleeper: self.sleeper.as_ref(),
            request_interceptors: &self.request_interceptors,
            response_interceptors: &self.response_interceptors,
            abort: self.abort.as_ref(),
        };
        engine.execute(&defaults, &self.local).await
    }

    /// Sends the request and deserializes the JSON payload into `T`.
    pub async fn execute_json<T: DeserializeOwned>(&self) -> Result<T> {
        self.execute().await?.data.deserialize()
    }
}
