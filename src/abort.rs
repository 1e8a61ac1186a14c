//! Caller-initiated cancellation of in-flight requests.

use tokio_util::sync::CancellationToken;

/// Cancels every request bound to one of its signals.
///
/// ```no_run
/// use fetch_builder::{AbortController, FetchBuilder};
///
/// # async fn run() {
/// let controller = AbortController::new();
/// let request = FetchBuilder::get("https://api.example.com/slow")
///     .abort_signal(controller.signal());
///
/// controller.abort();
/// assert!(request.execute().await.is_err());
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct AbortController {
    token: CancellationToken,
}

impl AbortController {
    pub fn new() -> Self {
        Self::default()
    }

    /// A signal observing this controller. Dropping the controller without
    /// calling [`AbortController::abort`] never fires it.
    pub fn signal(&self) -> AbortSignal {
        AbortSignal {
            token: self.token.clone(),
        }
    }

    /// Aborts the in-flight attempt and every later one.
    pub fn abort(&self) {
        self.token.cancel();
    }

    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Receiving side of an [`AbortController`].
#[derive(Clone, Debug)]
pub struct AbortSignal {
    token: CancellationToken,
}

impl AbortSignal {
    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the controller aborts.
    pub async fn aborted(&self) {
        self.token.cancelled().await;
    }
}

/// Lets callers that already hold a token (e.g. a server's shutdown token)
/// abort requests with it.
impl From<CancellationToken> for AbortSignal {
    fn from(token: CancellationToken) -> Self {
        Self { token }
    }
}
