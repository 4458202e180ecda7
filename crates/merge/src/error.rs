use thiserror::Error;
use valuer_types::FieldPath;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("Schema is nested deeper than {limit} levels at '{path}'")]
    DepthLimit { path: FieldPath, limit: usize },
}
