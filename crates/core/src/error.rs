//! The unified error type for report assembly.

use thiserror::Error;
use valuer_merge::MergeError;
use valuer_render::RenderError;
use valuer_schema::SchemaParseError;
use valuer_traits::StoreError;

/// Everything that can end a report request.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssemblyError {
    /// A schema, template or image-size table is missing or unreadable.
    #[error("Could not load {resource}: {message}")]
    ConfigLoad { resource: String, message: String },

    #[error("Schema is unusable: {0}")]
    Schema(#[from] SchemaParseError),

    #[error("Merge failed: {0}")]
    Merge(#[from] MergeError),

    #[error("Rendering failed: {0}")]
    Render(#[from] RenderError),
}

impl AssemblyError {
    pub(crate) fn config_load(resource: impl Into<String>, message: impl ToString) -> Self {
        AssemblyError::ConfigLoad {
            resource: resource.into(),
            message: message.to_string(),
        }
    }

    /// A short machine-readable name for the error family.
    pub fn kind(&self) -> &'static str {
        match self {
            AssemblyError::ConfigLoad { .. } => "config_load",
            AssemblyError::Schema(_) => "schema",
            AssemblyError::Merge(_) => "merge",
            AssemblyError::Render(_) => "render",
        }
    }

    /// The template placeholder the user should look at, if the error names one.
    pub fn placeholder(&self) -> Option<&str> {
        match self {
            AssemblyError::Render(e) => e.placeholder.as_deref(),
            _ => None,
        }
    }
}

impl From<StoreError> for AssemblyError {
    fn from(err: StoreError) -> Self {
        let resource = err.key().unwrap_or("configuration document").to_string();
        AssemblyError::ConfigLoad {
            resource,
            message: err.to_string(),
        }
    }
}
