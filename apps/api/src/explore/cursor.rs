//! Opaque pagination tokens.
//!
//! A token is standard base64 over `{"t": <timestamp>}` where `t` is the
//! exclusive upper bound of the next page. Tokens never carry offsets, so a
//! page boundary stays valid while new decisions are being written.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("pagination token is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("pagination token has an invalid structure: {0}")]
    Structure(#[from] serde_json::Error),

    #[error("pagination token boundary must be positive")]
    ZeroBoundary,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PaginationCursor {
    #[serde(rename = "t")]
    timestamp: u64,
}

/// Encodes a page boundary into an opaque token.
pub fn encode(timestamp: u64) -> String {
    STANDARD.encode(serde_json::json!({ "t": timestamp }).to_string())
}

/// Decodes a token into a page boundary. An empty token means the first page.
///
/// A zero boundary is rejected: no page can end at timestamp 0, and its cache
/// key would collide with the first page's.
pub fn decode(token: &str) -> Result<Option<u64>, TokenError> {
    if token.is_empty() {
        return Ok(None);
    }

    let bytes = STANDARD.decode(token)?;
    let cursor: PaginationCursor = serde_json::from_slice(&bytes)?;
    if cursor.timestamp == 0 {
        return Err(TokenError::ZeroBoundary);
    }
    Ok(Some(cursor.timestamp))
}
