//! `fetch-builder` is a fluent async HTTP request builder.
//!
//! A [`FetchBuilder`] collects per-request settings, merges them over the
//! defaults held in a [`ConfigStore`], runs request interceptors once, then
//! sends the request through a [`Transport`] with exponential-backoff
//! retries:
//! - network failures and 5xx responses are retried up to `max_retries` times
//! - 4xx responses, timeouts, aborts and decode failures end the request
//! - every failure is reported as a classified [`FetchError`]

mod abort;
mod backoff;
mod body;
mod builder;
mod classify;
mod config;
mod decode;
mod engine;
mod error;
mod headers;
mod interceptor;
mod store;
mod transport;
mod types;

pub use abort::{AbortController, AbortSignal};
pub use backoff::{delay_for, Sleeper, TimerSleeper};
pub use body::Body;
pub use builder::FetchBuilder;
pub use classify::{classify, CancelReason, RawFailure};
pub use config::{
    effective_config, Method, PartialConfig, RequestConfig, ResponseMode, TransportOptions,
    DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY_MS,
};
pub use error::{ErrorKind, FetchError, TransportError, TransportErrorKind};
pub use headers::Headers;
pub use interceptor::{RequestInterceptor, ResponseInterceptor};
pub use store::ConfigStore;
pub use transport::{ReqwestTransport, Transport, TransportRequest, TransportResponse};
pub use types::{Payload, Response};

pub type Result<T> = std::result::Result<T, FetchError>;
