use indexmap::IndexMap;
use serde_json::Value;
use valuer_merge::MergedData;
use valuer_schema::{ObjectNode, SchemaModel, SchemaNode};
use valuer_types::PlaceholderToken;

/// `token -> value` for every text placeholder, in schema order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextMap {
    values: IndexMap<PlaceholderToken, String>,
    non_empty: usize,
}

impl TextMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value unless the token is already mapped. Values are stored as
    /// given; callers outside the mapper are expected to pass normalised text.
    pub fn insert(&mut self, token: impl Into<PlaceholderToken>, value: impl Into<String>) -> bool {
        let value = value.into();
        let non_empty = !value.is_empty();
        match self.values.entry(token.into()) {
            indexmap::map::Entry::Occupied(_) => false,
            indexmap::map::Entry::Vacant(slot) => {
                slot.insert(value);
                if non_empty {
                    self.non_empty += 1;
                }
                true
            }
        }
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.values.get(token).map(String::as_str)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.values.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Leaves whose normalised value is not the empty string.
    pub fn non_empty_count(&self) -> usize {
        self.non_empty
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PlaceholderToken, &str)> {
        self.values.iter().map(|(k, v)| (k, v.as_str()))
    }
}

/// Builds the text table for `merged` data shaped by `model`.
///
/// Leaves inside repeated sections are mapped once per row under indexed
/// tokens (`comp_address_1`, `comp_address_2`, ...).
pub fn map_text(merged: &MergedData, model: &SchemaModel) -> TextMap {
    let mut map = TextMap::new();
    let mut rows = Vec::new();
    map_object(&mut map, model.root(), Some(merged.value()), &mut rows);
    log::debug!(
        "Mapped {} text placeholder(s), {} non-empty",
        map.len(),
        map.non_empty_count()
    );
    map
}

fn map_object(map: &mut TextMap, node: &ObjectNode, value: Option<&Value>, rows: &mut Vec<usize>) {
    for (name, child) in &node.children {
        let field = value.and_then(|v| v.get(name));
        match child {
            SchemaNode::Leaf(leaf) => {
                let token = rows.iter().fold(leaf.token.clone(), |t, row| t.indexed(*row));
                let text = normalize_newlines(&stringify(&token, field));
                if !map.insert(token.clone(), text) {
                    log::debug!("Token '{token}' is mapped twice; keeping the first value");
                }
            }
            SchemaNode::Object(section) => map_object(map, section, field, rows),
            SchemaNode::Repeated(repeated) => {
                let items = field.and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[]);
                let count = match repeated.slots {
                    Some(slots) => {
                        if items.len() > slots {
                            log::warn!(
                                "'{name}' has {} rows but the template only has {slots} slots; dropping the rest",
                                items.len()
                            );
                        }
                        slots
                    }
                    None => items.len(),
                };
                for i in 0..count {
                    rows.push(i);
                    map_object(map, &repeated.item, items.get(i), rows);
                    rows.pop();
                }
            }
            SchemaNode::Unknown(_) => {}
        }
    }
}

/// Converts a merged leaf value to the text placed in the document.
pub fn stringify(token: &PlaceholderToken, value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::Object(_)) => {
            log::warn!("Value for '{token}' is an object; rendering it empty");
            String::new()
        }
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::Object(_) | Value::Array(_) => {
                    log::warn!("Ignoring nested structure in list value for '{token}'");
                    None
                }
                scalar => Some(scalar_text(scalar)),
            })
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        Some(scalar) => scalar_text(scalar),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                return n.to_string();
            }
            match n.as_f64() {
                Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
                _ => n.to_string(),
            }
        }
        _ => String::new(),
    }
}

/// Folds every line-ending spelling into `\n`: CRLF, lone CR, and the
/// two-character escapes `\r\n` and `\n` left behind by upstream JSON
/// double-encoding.
pub fn normalize_newlines(text: &str) -> String {
    if !text.contains('\r') && !text.contains('\\') {
        return text.to_string();
    }
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace("\\r\\n", "\n")
        .replace("\\n", "\n")
}
