use crate::flow::FlowState;
use indexmap::IndexMap;
use valuer_merge::MergedData;
use valuer_placeholder::ImageInput;
use valuer_schema::{SchemaIssue, ValidationWarning};
use valuer_source::DataSource;
use valuer_types::{ImageDecodeError, PlaceholderToken, RenderResult};

/// Where the template comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateInput {
    /// A document key in the configuration store.
    Key(String),
    /// Raw bytes or the bytes of a data-URI.
    Inline(Vec<u8>),
}

/// Everything needed to assemble one report.
#[derive(Debug, Clone)]
pub struct AssemblyRequest {
    pub schema_key: String,
    pub template: TemplateInput,
    pub image_config_key: Option<String>,
    /// Highest priority first.
    pub sources: Vec<DataSource>,
    pub images: IndexMap<PlaceholderToken, ImageInput>,
}

impl AssemblyRequest {
    pub fn new(schema_key: impl Into<String>, template: TemplateInput) -> Self {
        Self {
            schema_key: schema_key.into(),
            template,
            image_config_key: None,
            sources: Vec::new(),
            images: IndexMap::new(),
        }
    }

    /// Adds a source below the ones already added.
    pub fn with_source(mut self, source: DataSource) -> Self {
        self.sources.push(source);
        self
    }

    pub fn with_image_config(mut self, key: impl Into<String>) -> Self {
        self.image_config_key = Some(key.into());
        self
    }

    pub fn with_image(mut self, token: impl Into<PlaceholderToken>, image: impl Into<ImageInput>) -> Self {
        self.images.insert(token.into(), image.into());
        self
    }

    /// Name used in log lines for this request.
    pub(crate) fn label(&self) -> String {
        match &self.template {
            TemplateInput::Key(key) => format!("{} + {key}", self.schema_key),
            TemplateInput::Inline(_) => format!("{} + inline template", self.schema_key),
        }
    }
}

/// A successfully assembled report and everything worth showing alongside it.
#[derive(Debug, Clone)]
pub struct AssemblyReport {
    pub result: RenderResult,
    /// Per-source findings, then required fields left empty after merge.
    pub warnings: Vec<ValidationWarning>,
    pub image_errors: Vec<ImageDecodeError>,
    /// Schema nodes that were ignored.
    pub schema_issues: Vec<SchemaIssue>,
    /// Template tokens rendered empty because nothing mapped them.
    pub unknown_tokens: Vec<String>,
    pub merged: MergedData,
    pub transitions: Vec<FlowState>,
}
