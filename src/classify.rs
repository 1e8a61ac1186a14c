use crate::{FetchError, TransportError, TransportErrorKind};

/// Why an attempt was cancelled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CancelReason {
    /// The per-attempt timer armed from `timeout_ms` fired.
    Timeout { timeout_ms: u64 },
    /// The caller's [`AbortSignal`](crate::AbortSignal) fired.
    Aborted,
}

/// Unclassified failure of a single attempt.
#[derive(Clone, Debug, PartialEq)]
pub enum RawFailure {
    Cancelled(CancelReason),
    Status { code: u16, text: String },
    Transport(TransportError),
    Decode(String),
    /// An interceptor rejected the request or response.
    Interceptor(FetchError),
}

const CONNECTIVITY_HINTS: [&str; 5] = ["network", "connection", "connect", "dns", "reset"];

/// Maps a raw failure onto the closed [`FetchError`] taxonomy.
///
/// Checks run in a fixed order: cancellation, HTTP status, connectivity,
/// then everything else.
pub fn classify(failure: &RawFailure) -> FetchError {
    match failure {
        RawFailure::Cancelled(CancelReason::Timeout { timeout_ms }) => FetchError::Timeout {
            timeout_ms: Some(*timeout_ms),
        },
        RawFailure::Cancelled(CancelReason::Aborted) => FetchError::Abort,
        RawFailure::Status { code, text } => FetchError::Http {
            status: *code,
            status_text: text.clone(),
        },
        RawFailure::Transport(err) => classify_transport(err),
        RawFailure::Decode(message) => FetchError::Decode(message.clone()),
        RawFailure::Interceptor(err) => err.clone(),
    }
}

fn classify_transport(err: &TransportError) -> FetchError {
    match err.kind {
        TransportErrorKind::Connect | TransportErrorKind::Io => FetchError::Network {
            message: err.message.clone(),
        },
        TransportErrorKind::Timeout => FetchError::Timeout { timeout_ms: None },
        TransportErrorKind::Other if mentions_connectivity(&err.message) => FetchError::Network {
            message: err.message.clone(),
        },
        TransportErrorKind::Other => FetchError::Unknown(err.message.clone()),
    }
}

fn mentions_connectivity(message: &str) -> bool {
    let lowered = message.to_ascii_lowercase();
    CONNECTIVITY_HINTS
        .iter()
        .any(|hint| lowered.contains(hint))
}
