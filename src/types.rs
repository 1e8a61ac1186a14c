use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::{FetchError, Headers, Result};

/// Decoded body of a successful response.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    Json(serde_json::Value),
    Text(String),
    /// Raw bytes, produced by both the `blob` and `array_buffer` modes.
    Bytes(Bytes),
}

impl Payload {
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Bytes(value) => Some(value),
            _ => None,
        }
    }

    /// Deserializes a JSON payload into `T`.
    pub fn deserialize<T: DeserializeOwned>(self) -> Result<T> {
        match self {
            Self::Json(value) => serde_json::from_value(value)
                .map_err(|err| FetchError::Decode(format!("unexpected JSON shape: {err}"))),
            Self::Text(_) => Err(FetchError::Decode(
                "expected JSON payload, got text".to_owned(),
            )),
            Self::Bytes(_) => Err(FetchError::Decode(
                "expected JSON payload, got bytes".to_owned(),
            )),
        }
    }
}

/// Successful outcome of [`FetchBuilder::execute`](crate::FetchBuilder::execute).
#[derive(Clone, Debug, PartialEq)]
pub struct Response {
    pub status: u16,
    pub status_text: String,
    pub headers: Headers,
    pub data: Payload,
    /// Number of transport calls made, including the successful one.
    pub attempts: u32,
}
