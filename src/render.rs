//! Pretty-printing of server responses.
//!
//! Responses are re-encoded without touching key order or numeric literals:
//! `serde_json` is built with `preserve_order` and `arbitrary_precision`, so a
//! value like `12345678901234567890.1` comes back out exactly as it went in.

use serde_json::Value;
use tracing::debug;

/// Text appended after every rendered response to separate batches.
pub const RESULT_SEPARATOR: &str = "\n\n";

/// A response ready to be written to a result destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedResult {
    /// Re-indented JSON, followed by [`RESULT_SEPARATOR`].
    Pretty(String),
    /// The response body exactly as received, because it was not JSON.
    Raw(String),
}

impl RenderedResult {
    pub fn text(&self) -> &str {
        match self {
            Self::Pretty(text) | Self::Raw(text) => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Pretty(text) | Self::Raw(text) => text,
        }
    }

    pub fn is_pretty(&self) -> bool {
        matches!(self, Self::Pretty(_))
    }
}

/// Renders a response body with 2-space indentation.
///
/// Bodies that fail to parse are passed through untouched.
pub fn render(body: &str) -> RenderedResult {
    let pretty = serde_json::from_str::<Value>(body)
        .and_then(|value| serde_json::to_string_pretty(&value));

    match pretty {
        Ok(mut text) => {
            text.push_str(RESULT_SEPARATOR);
            RenderedResult::Pretty(text)
        }
        Err(e) => {
            debug!("Response is not JSON, showing raw text: {e}");
            RenderedResult::Raw(body.to_string())
        }
    }
}
