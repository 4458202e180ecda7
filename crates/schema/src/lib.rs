//! Declarative report schema and the validator derived from it.
//!
//! The schema is operator-edited configuration, so its shape is only known at
//! run time. It is modelled as a tagged tree of [`SchemaNode`]s:
//!
//! - **Object** nodes group fields into sections ("Property Details").
//! - **Leaf** nodes describe one scalar field and its template token.
//! - **Repeated** nodes describe homogeneous rows ("comparable sales").
//! - **Unknown** nodes are anything that could not be classified. They are
//!   kept for diagnostics and skipped by validation, merge and mapping.
//!
//! Parsing never fails on a malformed node; only a root that is not a JSON
//! object is rejected.

mod error;
mod model;
mod parser;
pub mod validator;

pub use error::{SchemaIssue, SchemaParseError};
pub use model::{
    Leaves, LeafNode, ObjectNode, RepeatedNode, SchemaModel, SchemaNode, UnknownNode,
    ValidationHints,
};
pub use validator::{FieldReport, FieldStatus, ValidationResult, ValidationWarning, Validator};

/// Nodes nested deeper than this are classified as unknown.
pub const MAX_SCHEMA_DEPTH: usize = 32;
