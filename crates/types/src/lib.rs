//! Foundation types shared by every valuer crate.
//!
//! Nothing in here knows about schemas, merging or archives; these are the
//! small value types that flow between those stages.

pub mod data_uri;
pub mod document;
pub mod ids;
pub mod image;
pub mod path;
pub mod value;

pub use data_uri::{DataUri, DataUriError, decode_base64_text, decode_binary_input};
pub use document::{DOCX_MIME, RenderResult};
pub use ids::PlaceholderToken;
pub use image::{ImageDecodeError, ImagePayload, ImageSlot};
pub use path::{FieldPath, PathSegment};
pub use value::{NOT_AVAILABLE, coerce_number, is_empty_value};

use serde::{Deserialize, Serialize};
use std::fmt;

/// The scalar kind a schema leaf expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    #[default]
    String,
    Number,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::String => f.write_str("string"),
            ValueKind::Number => f.write_str("number"),
        }
    }
}
