use std::fmt;
use thiserror::Error;

/// The substitution pass a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderStage {
    Image,
    Text,
}

impl fmt::Display for RenderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderStage::Image => f.write_str("image"),
            RenderStage::Text => f.write_str("text"),
        }
    }
}

/// A fatal rendering failure, attributable to a placeholder where possible.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{stage} phase failed{}: {message}", placeholder_suffix(.placeholder))]
pub struct RenderError {
    pub stage: RenderStage,
    /// The placeholder (or partial tag) the user has to fix.
    pub placeholder: Option<String>,
    pub message: String,
}

impl RenderError {
    pub fn new(stage: RenderStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            placeholder: None,
            message: message.into(),
        }
    }

    pub fn at(stage: RenderStage, placeholder: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            stage,
            placeholder: Some(placeholder.into()),
            message: message.into(),
        }
    }
}

fn placeholder_suffix(placeholder: &Option<String>) -> String {
    match placeholder {
        Some(p) => format!(" at '{p}'"),
        None => String::new(),
    }
}

/// Failures reading or writing the zip container itself.
#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("not a valid zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("part '{0}' is not UTF-8 text")]
    NotUtf8(String),

    #[error("part '{part}' is not well-formed XML: {message}")]
    MalformedXml { part: String, message: String },
}

impl ContainerError {
    pub(crate) fn in_stage(self, stage: RenderStage) -> RenderError {
        RenderError::new(stage, self.to_string())
    }
}
