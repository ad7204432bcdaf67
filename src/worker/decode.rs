//! Response envelope decoding
//!
//! The extraction API is not consistent about where the page body lives:
//! sometimes `httpResponseBody` is a base64 string, sometimes an object
//! with the payload nested under `data` or `text`, and browser-rendered
//! requests come back as plain `browserHtml`. The priority order below is
//! load-bearing: it has to match what already-cached responses were
//! decoded with.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use serde_json::Value;
use thiserror::Error;

/// Upper bound on the envelope excerpt attached to decode failures
const PREVIEW_CHARS: usize = 500;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Unrecognized response envelope: {preview}")]
    UnrecognizedEnvelope { preview: String },
}

/// Recognized envelope shapes, in decode priority order
#[derive(Debug, PartialEq, Eq)]
pub enum Envelope<'a> {
    /// `httpResponseBody` is itself the encoded body
    StringBody(&'a str),
    /// `httpResponseBody` is an object carrying the body under `data`/`text`
    StructuredBody(&'a str),
    /// `browserHtml` rendered page, already plain text
    RenderedPage(&'a str),
    Unknown,
}

/// Classify an envelope into the variant that will decode it.
///
/// Empty body fields fall through to the next shape, matching how the API's
/// older envelope variants are handled downstream.
pub fn classify(envelope: &Value) -> Envelope<'_> {
    match envelope.get("httpResponseBody") {
        Some(Value::String(body)) if !body.is_empty() => {
            return Envelope::StringBody(body);
        }
        Some(Value::Object(body)) => {
            let nested = body
                .get("data")
                .and_then(Value::as_str)
                .or_else(|| body.get("text").and_then(Value::as_str));
            if let Some(nested) = nested.filter(|s| !s.is_empty()) {
                return Envelope::StructuredBody(nested);
            }
        }
        _ => {}
    }

    match envelope.get("browserHtml") {
        Some(Value::String(html)) if !html.is_empty() => Envelope::RenderedPage(html),
        _ => Envelope::Unknown,
    }
}

/// Extract the raw page bytes from a response envelope.
pub fn decode(envelope: &Value) -> Result<Bytes, DecodeError> {
    match classify(envelope) {
        Envelope::StringBody(body) | Envelope::StructuredBody(body) => Ok(decode_body(body)),
        Envelope::RenderedPage(html) => Ok(Bytes::copy_from_slice(html.as_bytes())),
        Envelope::Unknown => Err(DecodeError::UnrecognizedEnvelope {
            preview: preview(envelope),
        }),
    }
}

/// Base64-decode a body field, falling back to its raw bytes when the API
/// handed back plain text in a body slot.
fn decode_body(body: &str) -> Bytes {
    match BASE64.decode(body) {
        Ok(decoded) => Bytes::from(decoded),
        Err(_) => Bytes::copy_from_slice(body.as_bytes()),
    }
}

/// Bounded excerpt of the serialized envelope for diagnostics
fn preview(envelope: &Value) -> String {
    let rendered = envelope.to_string();
    match rendered.char_indices().nth(PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &rendered[..idx]),
        None => rendered,
    }
}
