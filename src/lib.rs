//! # valuer
//!
//! Assembles property-valuation reports. An operator-edited schema describes
//! the report's fields; several ranked data trees (draft, extracted data,
//! defaults) are validated against it and merged; the merged tree is mapped
//! to template tokens and substituted into a word-processing template,
//! images first, text second.
//!
//! The engine is split into small crates. This crate re-exports their public
//! surface and ships the `valuer` command-line tool.
//!
//! ```ignore
//! use valuer::{AssemblyRequest, DataSource, InMemoryConfigStore, ReportAssembler, TemplateInput};
//! use serde_json::json;
//!
//! let store = InMemoryConfigStore::new();
//! store.add_json("schema.json", &json!({ "ownerName": { "label": "Owner", "placeholder": "ownerName" } }))?;
//! store.add("template.docx", std::fs::read("template.docx")?)?;
//!
//! let assembler = ReportAssembler::builder().with_store(store).build();
//! let report = assembler.assemble(
//!     AssemblyRequest::new("schema.json", TemplateInput::Key("template.docx".into()))
//!         .with_source(DataSource::draft(json!({ "ownerName": "Jane Doe" }))),
//! )?;
//! std::fs::write("report.docx", &report.result.document_bytes)?;
//! ```

// Foundation
pub use valuer_types::{
    DOCX_MIME, DataUri, DataUriError, FieldPath, ImageDecodeError, ImagePayload, ImageSlot, NOT_AVAILABLE,
    PathSegment, PlaceholderToken, RenderResult, ValueKind, is_empty_value,
};

// Schema and validation
pub use valuer_schema::{
    FieldReport, FieldStatus, LeafNode, ObjectNode, RepeatedNode, SchemaIssue, SchemaModel, SchemaNode,
    SchemaParseError, ValidationResult, ValidationWarning, Validator,
};

// Sources and merge
pub use valuer_merge::{DataMerger, MergeError, MergedData};
pub use valuer_source::{DataSource, SourceKind, SourceStack};

// Mapping and rendering
pub use valuer_placeholder::{ImageInput, ImageMap, TextMap, map_images, map_text};
pub use valuer_render::{
    ContainerError, Delimiters, PartFilter, RenderConfig, RenderError, RenderOutcome, RenderStage, TemplateRenderer,
};

// Orchestration
pub use valuer_core::{
    AssemblyConfig, AssemblyError, AssemblyFailure, AssemblyReport, AssemblyRequest, ConfigStore, Executor,
    ExecutorImpl, FlowState, InMemoryConfigStore, Progress, ReportAssembler, ReportAssemblerBuilder, StoreError,
    SyncExecutor, TemplateInput,
};
pub use valuer_resource::FilesystemConfigStore;

#[cfg(feature = "rayon-executor")]
pub use valuer_executor::RayonExecutor;
