//! Share tokens: document text compressed with raw DEFLATE and encoded as
//! URL-safe base64 (no padding), so a token can sit in a URL fragment or path
//! without escaping.

use std::io::{Read, Write};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("token is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("token payload is not a valid deflate stream: {0}")]
    Inflate(#[source] std::io::Error),

    #[error("decoded content is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Encode document text into a share token.
pub fn encode(text: &str) -> String {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
    // Writing into a Vec cannot fail.
    let compressed = encoder
        .write_all(text.as_bytes())
        .and_then(|()| encoder.finish())
        .unwrap_or_default();
    URL_SAFE_NO_PAD.encode(compressed)
}

/// Decode a share token, reporting which stage rejected it.
pub fn try_decode(token: &str) -> Result<String, CodecError> {
    let compressed = URL_SAFE_NO_PAD.decode(token.trim())?;
    let mut bytes = Vec::new();
    DeflateDecoder::new(compressed.as_slice())
        .read_to_end(&mut bytes)
        .map_err(CodecError::Inflate)?;
    Ok(String::from_utf8(bytes)?)
}

/// Decode a share token. A malformed token yields an empty string, which
/// callers treat as "nothing recovered".
pub fn decode(token: &str) -> String {
    try_decode(token).unwrap_or_else(|e| {
        tracing::debug!("discarding share token: {e}");
        String::new()
    })
}
