use std::fmt;

/// Classified failure returned by [`FetchBuilder::execute`](crate::FetchBuilder::execute).
///
/// The set is closed: every failure path of a request ends in exactly one
/// of these variants.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// Connectivity failure (connection refused, DNS failure, socket reset).
    #[error("network error: {message}")]
    Network { message: String },
    /// The server answered with a non-2xx status.
    #[error("http error {status}: {status_text}")]
    Http { status: u16, status_text: String },
    /// The configured timeout elapsed before a response arrived.
    #[error("request timed out")]
    Timeout { timeout_ms: Option<u64> },
    /// The request was cancelled by the caller.
    #[error("request was aborted")]
    Abort,
    /// A 2xx body could not be parsed in the requested response mode.
    #[error("decode error: {0}")]
    Decode(String),
    /// Any failure that matches none of the other kinds.
    #[error("unknown error: {0}")]
    Unknown(String),
}

/// Fieldless discriminant of [`FetchError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Network,
    Http,
    Timeout,
    Abort,
    Decode,
    Unknown,
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network { .. } => ErrorKind::Network,
            Self::Http { .. } => ErrorKind::Http,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Abort => ErrorKind::Abort,
            Self::Decode(_) => ErrorKind::Decode,
            Self::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// HTTP status code, for [`FetchError::Http`] only.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether another attempt may succeed.
    ///
    /// Network failures and 5xx responses are retryable. Client errors,
    /// timeouts, aborts, decode failures and unknown errors are terminal.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::Http { status, .. } => (500..600).contains(status),
            Self::Timeout { .. } | Self::Abort | Self::Decode(_) | Self::Unknown(_) => false,
        }
    }
}

/// Coarse cause of a transport-level failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Could not establish a connection (refused, DNS, TLS handshake).
    Connect,
    /// The connection broke while sending the request or reading the body.
    Io,
    /// The transport's own timer fired.
    Timeout,
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Connect => "connect",
            Self::Io => "io",
            Self::Timeout => "timeout",
            Self::Other => "other",
        };
        f.write_str(text)
    }
}

/// Failure reported by a [`Transport`](crate::Transport) implementation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{kind} transport error: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn connect(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Connect, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Other, message)
    }
}
