use thiserror::Error;
use valuer_types::FieldPath;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaParseError {
    #[error("Schema root must be a JSON object, found {found}")]
    NotAnObject { found: &'static str },
}

/// A non-fatal problem found while parsing a schema. The offending node is
/// ignored; the rest of the schema stays usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaIssue {
    pub path: FieldPath,
    pub message: String,
}

impl std::fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
