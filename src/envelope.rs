//! The JSON envelope that is actually chunked and transmitted.
//!
//! `{"data": "<base64>", "mimeType": "<label>"}`; the label names the
//! transform applied before base64 so the receiver can reverse it.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while unwrapping an envelope.
#[derive(Error, Debug)]
pub enum EnvelopeError {
    #[error("Envelope is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Envelope is missing string field '{0}'")]
    MissingField(&'static str),

    #[error("Envelope data is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}

/// Wire envelope around the transformed payload bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Standard base64 of the payload bytes.
    pub data: String,
    /// Transform label.
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

impl Envelope {
    /// Wraps already-transformed bytes.
    pub fn wrap(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self {
            data: BASE64.encode(bytes),
            mime_type: mime_type.into(),
        }
    }

    /// Serializes the envelope into the string handed to the chunker.
    pub fn to_json(&self) -> Result<String, EnvelopeError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a reassembled envelope.
    ///
    /// Fields are checked by hand so a wrong type is reported the same way as
    /// a missing field.
    pub fn from_json(text: &str) -> Result<Self, EnvelopeError> {
        let value: serde_json::Value = serde_json::from_str(text)?;

        let field = |name: &'static str| {
            value
                .get(name)
                .and_then(|v| v.as_str())
                .map(str::to_owned)
                .ok_or(EnvelopeError::MissingField(name))
        };

        Ok(Self {
            data: field("data")?,
            mime_type: field("mimeType")?,
        })
    }

    /// Returns the base64-decoded payload bytes.
    pub fn decode_data(&self) -> Result<Vec<u8>, EnvelopeError> {
        Ok(BASE64.decode(&self.data)?)
    }
}
