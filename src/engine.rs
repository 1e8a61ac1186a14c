use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{self, Either};

use crate::{
    backoff::{self, delay_for, Sleeper},
    classify::{classify, CancelReason, RawFailure},
    config::effective_config,
    decode::decode_body,
    AbortSignal, Body, FetchError, PartialConfig, RequestConfig, RequestInterceptor, Response,
    ResponseInterceptor, ResponseMode, Result, Transport, TransportRequest, TransportResponse,
};

/// Runs one `execute` call: merge, intercept, then the attempt loop.
pub(crate) struct Engine<'a> {
    pub transport: &'a dyn Transport,
    pub sleeper: &'a dyn Sleeper,
    pub request_interceptors: &'a [Arc<dyn RequestInterceptor>],
    pub response_interceptors: &'a [Arc<dyn ResponseInterceptor>],
    pub abort: Option<&'a AbortSignal>,
}

impl Engine<'_> {
    pub(crate) async fn execute(
        &self,
        defaults: &PartialConfig,
        local: &PartialConfig,
    ) -> Result<Response> {
        let mut config = effective_config(defaults, local)?;
        for interceptor in self.request_interceptors {
            config = interceptor
                .intercept(config)
                .await
                .map_err(|err| classify(&RawFailure::Interceptor(err)))?;
        }

        let request = build_transport_request(&config)?;
        let max_retries = config.max_retries;
        let mut attempt = 0u32;

        while attempt <= max_retries {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                "{} {} (attempt {} of {})",
                request.method,
                request.url,
                attempt.saturating_add(1),
                max_retries.saturating_add(1)
            );

            let failure = match self.attempt(request.clone(), config.timeout_ms).await {
                Ok(response) if response.is_success() => {
                    return self
                        .finish(response, config.response_mode, attempt.saturating_add(1))
                        .await;
                }
                Ok(response) => RawFailure::Status {
                    code: response.status,
                    text: response.status_text,
                },
                Err(failure) => failure,
            };

            let error = classify(&failure);
            if attempt >= max_retries || !error.is_retryable() {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    "{} {} failed after {} attempt(s): {}",
                    request.method,
                    request.url,
                    attempt.saturating_add(1),
                    error
                );
                return Err(error);
            }

            let delay = delay_for(attempt, config.retry_delay_ms);

            #[cfg(feature = "tracing")]
            tracing::debug!("retrying request after {} ms: {}", delay.as_millis(), error);

            attempt += 1;
            self.sleeper.sleep(delay).await;
        }

        Err(FetchError::Unknown(
            "retry loop ended without a result".to_owned(),
        ))
    }

    /// Performs one transport call, racing it against timeout and abort.
    async fn attempt(
        &self,
        request: TransportRequest,
        timeout_ms: Option<u64>,
    ) -> std::result::Result<TransportResponse, RawFailure> {
        if self.abort.is_some_and(AbortSignal::is_aborted) {
            return Err(RawFailure::Cancelled(CancelReason::Aborted));
        }

        let perform = self.transport.perform(request);
        let cancelled = Box::pin(cancellation(timeout_ms, self.abort.cloned()));

        match future::select(perform, cancelled).await {
            Either::Left((outcome, _)) => outcome.map_err(RawFailure::Transport),
            Either::Right((reason, _)) => Err(RawFailure::Cancelled(reason)),
        }
    }

    async fn finish(
        &self,
        response: TransportResponse,
        mode: ResponseMode,
        attempts: u32,
    ) -> Result<Response> {
        let mut data = decode_body(response.body, mode)
            .map_err(|message| classify(&RawFailure::Decode(message)))?;

        for interceptor in self.response_interceptors {
            data = interceptor
                .intercept(data)
                .await
                .map_err(|err| classify(&RawFailure::Interceptor(err)))?;
        }

        Ok(Response {
            status: response.status,
            status_text: response.status_text,
            headers: response.headers,
            data,
            attempts,
        })
    }
}

fn build_transport_request(config: &RequestConfig) -> Result<TransportRequest> {
    Ok(TransportRequest {
        url: config.url.clone(),
        method: config.method,
        headers: config.headers.clone(),
        body: config.body.as_ref().map(Body::to_bytes).transpose()?,
        timeout: config.timeout_ms.map(Duration::from_millis),
        options: config.transport_options.clone(),
    })
}

/// Resolves when the current attempt must be cancelled.
async fn cancellation(timeout_ms: Option<u64>, signal: Option<AbortSignal>) -> CancelReason {
    let aborted = Box::pin(async move {
        match signal {
            Some(signal) => {
                signal.aborted().await;
                CancelReason::Aborted
            }
            None => future::pending().await,
        }
    });
    let timer = Box::pin(async move {
        match timeout_ms {
            Some(timeout_ms) => {
                backoff::sleep(Duration::from_millis(timeout_ms)).await;
                CancelReason::Timeout { timeout_ms }
            }
            None => future::pending().await,
        }
    });

    future::select(aborted, timer).await.factor_first().0
}
