use crate::ids::PlaceholderToken;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// One entry of the image-size configuration table.
///
/// A width or height of `0` (or a missing value) means "let the renderer
/// decide" from the image itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSlot {
    pub placeholder: PlaceholderToken,
    #[serde(default)]
    pub card_name: Option<String>,
    #[serde(default, deserialize_with = "dimension")]
    pub width: Option<u32>,
    #[serde(default, deserialize_with = "dimension")]
    pub height: Option<u32>,
}

impl ImageSlot {
    pub fn new(placeholder: impl Into<PlaceholderToken>, width: Option<u32>, height: Option<u32>) -> Self {
        Self {
            placeholder: placeholder.into(),
            card_name: None,
            width,
            height,
        }
    }
}

fn dimension<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let raw: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    let px = match raw {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().trim_end_matches("px").parse::<f64>().ok(),
        _ => None,
    };
    Ok(px.filter(|v| v.is_finite() && *v >= 1.0).map(|v| v.round() as u32))
}

/// Decoded image bytes ready for the renderer, with the caller's size if any.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePayload {
    pub bytes: Arc<Vec<u8>>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl ImagePayload {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Arc::new(bytes),
            width: None,
            height: None,
        }
    }

    pub fn with_size(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// A single image that could not be used. Never fatal for the request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("image '{placeholder}' could not be decoded: {reason}")]
pub struct ImageDecodeError {
    pub placeholder: PlaceholderToken,
    pub reason: String,
}

impl ImageDecodeError {
    pub fn new(placeholder: impl Into<PlaceholderToken>, reason: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
            reason: reason.into(),
        }
    }
}
