use bytes::Bytes;

use crate::{Payload, ResponseMode};

/// Decodes a 2xx response body according to `mode`.
///
/// Returns the failure message on error; the engine turns it into a
/// [`FetchError::Decode`](crate::FetchError::Decode).
pub(crate) fn decode_body(body: Bytes, mode: ResponseMode) -> Result<Payload, String> {
    match mode {
        ResponseMode::Json => serde_json::from_slice::<serde_json::Value>(&body)
            .map(Payload::Json)
            .map_err(|err| {
                format!(
                    "invalid JSON response: {err}; body: {}",
                    String::from_utf8_lossy(&body)
                )
            }),
        ResponseMode::Text => String::from_utf8(body.to_vec())
            .map(Payload::Text)
            .map_err(|err| format!("response body is not valid UTF-8: {err}")),
        ResponseMode::Blob | ResponseMode::ArrayBuffer => Ok(Payload::Bytes(body)),
    }
}
