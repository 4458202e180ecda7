//! Schema-driven merge of ranked data sources.
//!
//! The merge is a pure fold over the schema tree:
//!
//! - **Leaves** take the first value, in priority order, that is not an empty
//!   sentinel (`absent`, `null`, `""`, `"N/A"`). With no such value the leaf
//!   resolves to `""`.
//! - **Sections** recurse and rebuild the merged subtree.
//! - **Repeated sections** are taken whole from the highest-priority source
//!   that defines the list, even an empty one. Rows are never reconciled
//!   element-wise.
//! - Keys unknown to the schema are dropped inside sections, but top-level
//!   keys outside any section pass through unchanged.

mod error;

pub use error::MergeError;

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use valuer_schema::{ObjectNode, SchemaModel, SchemaNode};
use valuer_source::{DataSource, SourceStack};
use valuer_types::{FieldPath, is_empty_value};

/// Default recursion limit. Parsed schemas are cut off well below this; only
/// hand-built models can reach it.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// The canonical data object produced by a merge.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedData {
    value: Value,
    provenance: BTreeMap<FieldPath, String>,
}

impl MergedData {
    /// Wraps an already merged tree (for callers that render saved data
    /// directly).
    pub fn from_value(value: Value) -> Self {
        Self {
            value,
            provenance: BTreeMap::new(),
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    pub fn get(&self, path: &FieldPath) -> Option<&Value> {
        path.resolve(&self.value)
    }

    /// The name of the source that supplied each non-empty leaf or list.
    pub fn provenance(&self) -> &BTreeMap<FieldPath, String> {
        &self.provenance
    }

    pub fn source_of(&self, path: &FieldPath) -> Option<&str> {
        self.provenance.get(path).map(String::as_str)
    }
}

/// Merges ranked data sources against a schema.
#[derive(Debug, Clone, Copy)]
pub struct DataMerger {
    max_depth: usize,
}

impl Default for DataMerger {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// One candidate subtree and the name of the source it came from.
type Candidate<'a> = (&'a str, &'a Map<String, Value>);

impl DataMerger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn merge(&self, sources: &SourceStack, model: &SchemaModel) -> Result<MergedData, MergeError> {
        let candidates: Vec<Candidate<'_>> = sources
            .iter()
            .filter_map(|s| s.value().as_object().map(|m| (s.name(), m)))
            .collect();

        let mut provenance = BTreeMap::new();
        let mut root = self.merge_object(model.root(), &candidates, &FieldPath::root(), 0, &mut provenance)?;
        pass_through_top_level(model.root(), sources, &mut root, &mut provenance);

        log::debug!(
            "Merged {} source(s) into {} top-level field(s)",
            candidates.len(),
            root.len()
        );
        Ok(MergedData {
            value: Value::Object(root),
            provenance,
        })
    }

    fn merge_object(
        &self,
        node: &ObjectNode,
        candidates: &[Candidate<'_>],
        path: &FieldPath,
        depth: usize,
        provenance: &mut BTreeMap<FieldPath, String>,
    ) -> Result<Map<String, Value>, MergeError> {
        if depth > self.max_depth {
            return Err(MergeError::DepthLimit {
                path: path.clone(),
                limit: self.max_depth,
            });
        }

        let mut merged = Map::new();
        for (name, child) in &node.children {
            let child_path = path.child(name.as_str());
            match child {
                SchemaNode::Leaf(_) => {
                    let winner = candidates
                        .iter()
                        .find(|(_, map)| !is_empty_value(map.get(name)));
                    let value = match winner {
                        Some((source, map)) => {
                            provenance.insert(child_path, source.to_string());
                            map.get(name).cloned().unwrap_or_default()
                        }
                        None => Value::String(String::new()),
                    };
                    merged.insert(name.clone(), value);
                }
                SchemaNode::Object(section) => {
                    let nested: Vec<Candidate<'_>> = candidates
                        .iter()
                        .filter_map(|(source, map)| map.get(name)?.as_object().map(|m| (*source, m)))
                        .collect();
                    let value = self.merge_object(section, &nested, &child_path, depth + 1, provenance)?;
                    merged.insert(name.clone(), Value::Object(value));
                }
                SchemaNode::Repeated(repeated) => {
                    let winner = candidates
                        .iter()
                        .find_map(|(source, map)| map.get(name)?.as_array().map(|rows| (*source, rows)));
                    let mut rows_out = Vec::new();
                    if let Some((source, rows)) = winner {
                        provenance.insert(child_path.clone(), source.to_string());
                        for (i, row) in rows.iter().enumerate() {
                            let row_path = child_path.index(i);
                            let row_candidates: Vec<Candidate<'_>> =
                                row.as_object().map(|m| (source, m)).into_iter().collect();
                            let shaped = self.merge_object(
                                &repeated.item,
                                &row_candidates,
                                &row_path,
                                depth + 1,
                                provenance,
                            )?;
                            rows_out.push(Value::Object(shaped));
                        }
                    }
                    merged.insert(name.clone(), Value::Array(rows_out));
                }
                SchemaNode::Unknown(_) => {}
            }
        }

        if log::log_enabled!(log::Level::Debug) {
            for (source, map) in candidates {
                for key in map.keys().filter(|k| !node.children.contains_key(*k)) {
                    if !path.is_root() {
                        log::debug!("Dropping '{}' from source '{source}': not in schema", path.child(key.as_str()));
                    }
                }
            }
        }
        Ok(merged)
    }
}

/// Copies top-level keys the schema does not mention, first non-empty value
/// wins. Keys the schema names (even as unknown nodes) are never copied.
fn pass_through_top_level(
    schema_root: &ObjectNode,
    sources: &SourceStack,
    merged: &mut Map<String, Value>,
    provenance: &mut BTreeMap<FieldPath, String>,
) {
    for source in sources.iter().filter(|s| s.is_usable()) {
        let Some(map) = source.value().as_object() else {
            continue;
        };
        for (key, value) in map {
            if schema_root.children.contains_key(key) || merged.contains_key(key) {
                continue;
            }
            if is_empty_value(Some(value)) {
                continue;
            }
            provenance.insert(FieldPath::root().child(key.as_str()), source.name().to_string());
            merged.insert(key.clone(), value.clone());
        }
    }
}

/// Merges with the default settings.
pub fn merge(sources: &SourceStack, model: &SchemaModel) -> Result<MergedData, MergeError> {
    DataMerger::default().merge(sources, model)
}

/// Convenience for merging a plain list of sources, highest priority first.
pub fn merge_sources(sources: Vec<DataSource>, model: &SchemaModel) -> Result<MergedData, MergeError> {
    merge(&SourceStack::from(sources), model)
}
