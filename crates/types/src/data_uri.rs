//! `data:<mime>;base64,<payload>` handling.
//!
//! Templates, images and rendered output all cross the boundary either as
//! raw bytes or as base64 data-URIs; both forms are accepted everywhere.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataUriError {
    #[error("data URI has no ',' separating header and payload")]
    MissingSeparator,

    #[error("only base64 data URIs are supported (header was '{0}')")]
    NotBase64(String),

    #[error("invalid base64 payload: {0}")]
    Base64(String),
}

/// A decoded data-URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl DataUri {
    /// Parses a base64 data-URI. Whitespace inside the payload is ignored.
    pub fn parse(uri: &str) -> Result<Self, DataUriError> {
        let rest = uri.trim().strip_prefix("data:").unwrap_or(uri.trim());
        let (header, payload) = rest.split_once(',').ok_or(DataUriError::MissingSeparator)?;
        let mime = match header.strip_suffix(";base64") {
            Some(mime) => mime,
            None => return Err(DataUriError::NotBase64(header.to_string())),
        };
        let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        let bytes = STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| DataUriError::Base64(e.to_string()))?;
        Ok(Self {
            mime: mime.to_string(),
            bytes,
        })
    }

    /// Encodes bytes as a data-URI with the given MIME type.
    pub fn encode(mime: &str, bytes: &[u8]) -> String {
        format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
    }

    /// Returns true if the string looks like a data-URI rather than bare base64.
    pub fn is_data_uri(s: &str) -> bool {
        s.trim_start().starts_with("data:")
    }
}

/// Accepts either raw bytes or the UTF-8 text of a data-URI and returns the
/// binary payload.
pub fn decode_binary_input(input: &[u8]) -> Result<Vec<u8>, DataUriError> {
    let head = &input[..input.len().min(5)];
    if head == b"data:" {
        let text = String::from_utf8_lossy(input);
        return DataUri::parse(&text).map(|uri| uri.bytes);
    }
    Ok(input.to_vec())
}

/// Decodes a string that is either a data-URI or a bare base64 payload.
pub fn decode_base64_text(input: &str) -> Result<Vec<u8>, DataUriError> {
    if DataUri::is_data_uri(input) {
        return DataUri::parse(input).map(|uri| uri.bytes);
    }
    let compact: String = input.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| DataUriError::Base64(e.to_string()))
}
