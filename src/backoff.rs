use std::time::Duration;

use async_trait::async_trait;

/// Delay before the attempt following failed attempt `attempt` (0-based).
///
/// Grows as `base_ms * 2^attempt` with no cap; saturates at `u64::MAX`
/// milliseconds instead of overflowing.
pub fn delay_for(attempt: u32, base_ms: u64) -> Duration {
    let multiplier = 1u64.checked_shl(attempt).unwrap_or(0);
    let delay_ms = if multiplier == 0 {
        if base_ms == 0 {
            0
        } else {
            u64::MAX
        }
    } else {
        base_ms.saturating_mul(multiplier)
    };
    Duration::from_millis(delay_ms)
}

/// Suspends the calling task between attempts.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Default [`Sleeper`], backed by the host timer.
///
/// On native targets: `tokio::time::sleep`.
/// On WASM targets: the JS global `setTimeout`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TimerSleeper;

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl Sleeper for TimerSleeper {
    async fn sleep(&self, duration: Duration) {
        sleep(duration).await;
    }
}

/// Host timer shared by backoff waits and per-attempt timeouts.
pub(crate) async fn sleep(duration: Duration) {
    #[cfg(not(target_arch = "wasm32"))]
    tokio::time::sleep(duration).await;

    #[cfg(target_arch = "wasm32")]
    js_timer::sleep(duration).await;
}

#[cfg(target_arch = "wasm32")]
mod js_timer {
    use std::time::Duration;

    use js_sys::{Function, Promise};
    use wasm_bindgen::prelude::wasm_bindgen;
    use wasm_bindgen::JsValue;
    use wasm_bindgen_futures::JsFuture;

    #[wasm_bindgen]
    extern "C" {
        #[wasm_bindgen(js_name = "setTimeout")]
        fn set_timeout(handler: &Function, timeout: i32) -> JsValue;
    }

    // setTimeout treats delays above i32::MAX ms as 0.
    const MAX_CHUNK_MS: u128 = i32::MAX as u128;

    pub(super) async fn sleep(duration: Duration) {
        let mut remaining = duration.as_millis();
        loop {
            let chunk = remaining.min(MAX_CHUNK_MS);
            let promise = Promise::new(&mut |resolve, _reject| {
                set_timeout(&resolve, chunk as i32);
            });
            let _ = JsFuture::from(promise).await;

            remaining -= chunk;
            if remaining == 0 {
                break;
            }
        }
    }
}
