//! Total parser from the schema definition document to a [`SchemaModel`].

use crate::MAX_SCHEMA_DEPTH;
use crate::error::{SchemaIssue, SchemaParseError, json_type_name};
use crate::model::{
    LeafNode, ObjectNode, RepeatedNode, SchemaModel, SchemaNode, ValidationHints,
};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashSet;
use valuer_types::{FieldPath, PlaceholderToken, ValueKind};

const REPEAT_KEY: &str = "$repeat";
const SLOTS_KEY: &str = "$slots";

/// Validation kinds that make a leaf numeric.
const NUMERIC_KINDS: &[&str] = &["number", "numeric", "integer", "currency", "area"];

pub(crate) fn parse(raw: &Value) -> Result<SchemaModel, SchemaParseError> {
    let Value::Object(map) = raw else {
        return Err(SchemaParseError::NotAnObject {
            found: json_type_name(raw),
        });
    };

    let mut parser = Parser::default();
    let root = parser.object(map, &FieldPath::root(), 0);
    for issue in &parser.issues {
        log::warn!("Ignoring schema node {issue}");
    }
    Ok(SchemaModel::with_issues(root, parser.issues))
}

#[derive(Default)]
struct Parser {
    issues: Vec<SchemaIssue>,
    seen_tokens: HashSet<PlaceholderToken>,
}

impl Parser {
    fn unknown(&mut self, path: &FieldPath, message: impl Into<String>) -> SchemaNode {
        let message = message.into();
        self.issues.push(SchemaIssue {
            path: path.clone(),
            message: message.clone(),
        });
        SchemaNode::unknown(message)
    }

    fn object(&mut self, map: &Map<String, Value>, path: &FieldPath, depth: usize) -> ObjectNode {
        let mut node = ObjectNode::new();
        for (name, value) in map {
            // `$`-prefixed keys are annotations for humans and tools.
            if name.starts_with('$') {
                continue;
            }
            let child_path = path.child(name.as_str());
            let child = self.node(name, value, &child_path, depth + 1);
            node.children.insert(name.clone(), child);
        }
        node
    }

    fn node(&mut self, name: &str, value: &Value, path: &FieldPath, depth: usize) -> SchemaNode {
        if depth > MAX_SCHEMA_DEPTH {
            return self.unknown(path, format!("nested deeper than {MAX_SCHEMA_DEPTH} levels"));
        }
        match value {
            Value::Object(map) if map.contains_key(REPEAT_KEY) => self.repeated_object(map, path, depth),
            Value::Object(map) if map.contains_key("placeholder") => self.leaf(name, map, path),
            Value::Object(map) => SchemaNode::Object(self.object(map, path, depth)),
            Value::Array(items) => self.repeated_array(items, path, depth),
            other => self.unknown(
                path,
                format!("expected a section, a field or a list, found {}", json_type_name(other)),
            ),
        }
    }

    fn leaf(&mut self, name: &str, map: &Map<String, Value>, path: &FieldPath) -> SchemaNode {
        let Some(raw_token) = map.get("placeholder").and_then(Value::as_str) else {
            return self.unknown(path, "field 'placeholder' must be a string");
        };
        let token = PlaceholderToken::new(raw_token);
        if token.is_empty() {
            return self.unknown(path, "field has an empty placeholder");
        }
        if !self.seen_tokens.insert(token.clone()) {
            return self.unknown(path, format!("placeholder '{token}' is already used by another field"));
        }

        let label = map
            .get("label")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| name.to_string());
        let (validation, hinted_kind) = self.validation(map.get("validation"), path);
        let kind = match map.get("type").and_then(Value::as_str) {
            Some("number") => ValueKind::Number,
            Some("string") => ValueKind::String,
            Some(other) => {
                self.issues.push(SchemaIssue {
                    path: path.clone(),
                    message: format!("unknown field type '{other}', treating as string"),
                });
                ValueKind::String
            }
            None => hinted_kind,
        };

        SchemaNode::Leaf(LeafNode {
            label,
            token,
            kind,
            validation,
        })
    }

    fn validation(&mut self, raw: Option<&Value>, path: &FieldPath) -> (ValidationHints, ValueKind) {
        let mut hints = ValidationHints::default();
        let mut kind = ValueKind::String;
        let kind_of = |name: &str| {
            if NUMERIC_KINDS.contains(&name.to_ascii_lowercase().as_str()) {
                ValueKind::Number
            } else {
                ValueKind::String
            }
        };

        match raw {
            None | Some(Value::Null) => {}
            Some(Value::String(shorthand)) => {
                if shorthand.eq_ignore_ascii_case("required") {
                    hints.required = true;
                } else {
                    kind = kind_of(shorthand);
                }
            }
            Some(Value::Object(map)) => {
                if let Some(name) = map.get("kind").and_then(Value::as_str) {
                    kind = kind_of(name);
                }
                hints.required = map.get("required").and_then(Value::as_bool).unwrap_or(false);
                hints.min = map.get("min").and_then(Value::as_f64);
                hints.max = map.get("max").and_then(Value::as_f64);
                hints.max_length = map
                    .get("maxLength")
                    .and_then(Value::as_u64)
                    .and_then(|n| usize::try_from(n).ok());
                if let Some(pattern) = map.get("pattern").and_then(Value::as_str) {
                    match Regex::new(pattern) {
                        Ok(re) => hints.pattern = Some(re),
                        Err(e) => self.issues.push(SchemaIssue {
                            path: path.clone(),
                            message: format!("ignoring invalid validation pattern: {e}"),
                        }),
                    }
                }
            }
            Some(other) => self.issues.push(SchemaIssue {
                path: path.clone(),
                message: format!("ignoring validation hint of type {}", json_type_name(other)),
            }),
        }
        (hints, kind)
    }

    fn repeated_object(&mut self, map: &Map<String, Value>, path: &FieldPath, depth: usize) -> SchemaNode {
        let item = match map.get(REPEAT_KEY) {
            Some(Value::Object(item)) if !item.contains_key("placeholder") => item,
            _ => return self.unknown(path, "'$repeat' must describe a section of fields"),
        };
        let slots = match map.get(SLOTS_KEY) {
            None => None,
            Some(raw) => match raw.as_u64().and_then(|n| usize::try_from(n).ok()) {
                Some(n) if n > 0 => Some(n),
                _ => {
                    self.issues.push(SchemaIssue {
                        path: path.clone(),
                        message: "'$slots' must be a positive integer, ignoring".to_string(),
                    });
                    None
                }
            },
        };
        let item = self.object(item, &path.each(), depth);
        SchemaNode::Repeated(RepeatedNode { item, slots })
    }

    fn repeated_array(&mut self, items: &[Value], path: &FieldPath, depth: usize) -> SchemaNode {
        let Some(first) = items.first() else {
            return self.unknown(path, "list has no item shape");
        };
        let item = match first {
            Value::Object(map) if !map.contains_key("placeholder") && !map.contains_key(REPEAT_KEY) => map,
            _ => return self.unknown(path, "list items must be sections of fields"),
        };
        let shape = raw_shape(first);
        if items[1..].iter().any(|other| raw_shape(other) != shape) {
            return self.unknown(path, "list items do not share one shape");
        }
        let item = self.object(item, &path.each(), depth);
        SchemaNode::Repeated(RepeatedNode::new(item))
    }
}

/// A structural fingerprint used to check that list items are homogeneous.
/// Field tokens and labels do not take part; only names and node kinds do.
fn raw_shape(value: &Value) -> String {
    match value {
        Value::Object(map) if map.contains_key("placeholder") => "leaf".to_string(),
        Value::Object(map) => {
            let inner: Vec<String> = map
                .iter()
                .filter(|(k, _)| !k.starts_with('$'))
                .map(|(k, v)| format!("{k}:{}", raw_shape(v)))
                .collect();
            format!("{{{}}}", inner.join(","))
        }
        Value::Array(items) => format!("[{}]", items.first().map(raw_shape).unwrap_or_default()),
        other => json_type_name(other).to_string(),
    }
}
