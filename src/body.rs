use bytes::Bytes;
use serde::Serialize;

use crate::{FetchError, Result};

/// Request payload, tagged by how it goes on the wire.
#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    /// Sent verbatim as UTF-8 text.
    Text(String),
    /// Sent verbatim as raw bytes.
    Bytes(Bytes),
    /// Structured data, serialized to JSON right before sending.
    Json(serde_json::Value),
}

impl Body {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn bytes(value: impl Into<Bytes>) -> Self {
        Self::Bytes(value.into())
    }

    /// Captures any serializable value as a structured body.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        serde_json::to_value(value)
            .map(Self::Json)
            .map_err(|err| FetchError::Unknown(format!("failed to serialize request body: {err}")))
    }

    /// Whether this body triggers `Content-Type: application/json` injection.
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Json(_))
    }

    pub(crate) fn to_bytes(&self) -> Result<Bytes> {
        match self {
            Self::Text(text) => Ok(Bytes::copy_from_slice(text.as_bytes())),
            Self::Bytes(bytes) => Ok(bytes.clone()),
            Self::Json(value) => serde_json::to_vec(value).map(Bytes::from).map_err(|err| {
                FetchError::Unknown(format!("failed to serialize request body: {err}"))
            }),
        }
    }
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Body {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<Vec<u8>> for Body {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value.into())
    }
}

impl From<Bytes> for Body {
    fn from(value: Bytes) -> Self {
        Self::Bytes(value)
    }
}

impl From<serde_json::Value> for Body {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}
