//! Run-time validator derived from a [`SchemaModel`].
//!
//! The validator is compiled once from the schema into an owned rule tree,
//! then checks arbitrary JSON payloads against it. Findings are reported,
//! never fatal: callers decide what to surface.

use crate::model::{LeafNode, ObjectNode, SchemaModel, SchemaNode};
use regex::Regex;
use serde_json::Value;
use std::fmt;
use valuer_types::{FieldPath, ValueKind, coerce_number, is_empty_value};

/// The outcome for one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldStatus {
    Valid,
    /// Missing, or one of the empty sentinels.
    Absent,
    WrongKind { expected: String, found: String },
    Constraint(String),
}

impl FieldStatus {
    /// True for findings worth showing to a user (not `Valid`, not `Absent`).
    pub fn is_problem(&self) -> bool {
        matches!(self, FieldStatus::WrongKind { .. } | FieldStatus::Constraint(_))
    }
}

impl fmt::Display for FieldStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldStatus::Valid => f.write_str("valid"),
            FieldStatus::Absent => f.write_str("no value"),
            FieldStatus::WrongKind { expected, found } => write!(f, "expected {expected}, found {found}"),
            FieldStatus::Constraint(message) => f.write_str(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldReport {
    pub path: FieldPath,
    pub status: FieldStatus,
}

/// Per-field findings for one payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationResult {
    pub fields: Vec<FieldReport>,
}

impl ValidationResult {
    pub fn status(&self, path: &FieldPath) -> Option<&FieldStatus> {
        self.fields.iter().find(|r| &r.path == path).map(|r| &r.status)
    }

    /// Reports for fields whose value is present but unusable.
    pub fn problems(&self) -> impl Iterator<Item = &FieldReport> {
        self.fields.iter().filter(|r| r.status.is_problem())
    }

    pub fn absent(&self) -> impl Iterator<Item = &FieldReport> {
        self.fields.iter().filter(|r| r.status == FieldStatus::Absent)
    }

    pub fn is_clean(&self) -> bool {
        self.problems().next().is_none()
    }

    /// Converts problems into warnings tagged with a source name.
    pub fn into_warnings(self, source: Option<&str>) -> Vec<ValidationWarning> {
        self.fields
            .into_iter()
            .filter(|r| r.status.is_problem())
            .map(|r| ValidationWarning {
                source: source.map(str::to_string),
                path: r.path,
                status: r.status,
            })
            .collect()
    }
}

/// A non-fatal, per-field finding returned alongside a successful result.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationWarning {
    /// The data source the value came from; `None` for post-merge findings.
    pub source: Option<String>,
    pub path: FieldPath,
    pub status: FieldStatus,
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "[{source}] {}: {}", self.path, self.status),
            None => write!(f, "{}: {}", self.path, self.status),
        }
    }
}

#[derive(Debug, Clone)]
struct LeafRule {
    kind: ValueKind,
    required: bool,
    min: Option<f64>,
    max: Option<f64>,
    max_length: Option<usize>,
    pattern: Option<Regex>,
}

#[derive(Debug, Clone)]
enum Rule {
    Object(Vec<(String, Rule)>),
    Leaf(LeafRule),
    Repeated(Box<Rule>),
}

/// A validator compiled from one schema.
#[derive(Debug, Clone)]
pub struct Validator {
    root: Vec<(String, Rule)>,
}

impl Validator {
    pub fn build(model: &SchemaModel) -> Self {
        Self {
            root: compile_object(model.root()),
        }
    }

    /// Checks a payload. Every schema leaf outside repeated sections gets a
    /// report; repeated sections get one report per row and leaf.
    pub fn check(&self, data: &Value) -> ValidationResult {
        let mut result = ValidationResult::default();
        check_object(&self.root, Some(data), &FieldPath::root(), &mut result);
        result
    }

    /// Paths of `required` leaves that have no value in `data`.
    pub fn missing_required(&self, data: &Value) -> Vec<FieldPath> {
        let mut missing = Vec::new();
        collect_required(&self.root, Some(data), &FieldPath::root(), &mut missing);
        missing
    }
}

fn compile_object(node: &ObjectNode) -> Vec<(String, Rule)> {
    node.children
        .iter()
        .filter_map(|(name, child)| compile(child).map(|rule| (name.clone(), rule)))
        .collect()
}

fn compile(node: &SchemaNode) -> Option<Rule> {
    match node {
        SchemaNode::Object(obj) => Some(Rule::Object(compile_object(obj))),
        SchemaNode::Leaf(leaf) => Some(Rule::Leaf(compile_leaf(leaf))),
        SchemaNode::Repeated(rep) => Some(Rule::Repeated(Box::new(Rule::Object(compile_object(&rep.item))))),
        SchemaNode::Unknown(_) => None,
    }
}

fn compile_leaf(leaf: &LeafNode) -> LeafRule {
    LeafRule {
        kind: leaf.kind,
        required: leaf.validation.required,
        min: leaf.validation.min,
        max: leaf.validation.max,
        max_length: leaf.validation.max_length,
        pattern: leaf.validation.pattern.clone(),
    }
}

fn kind_name(value: &Value) -> String {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "text",
        Value::Array(_) => "list",
        Value::Object(_) => "section",
    }
    .to_string()
}

fn check_object(rules: &[(String, Rule)], data: Option<&Value>, path: &FieldPath, out: &mut ValidationResult) {
    let map = match data {
        Some(Value::Object(map)) => Some(map),
        Some(Value::Null) | None => None,
        Some(other) => {
            out.fields.push(FieldReport {
                path: path.clone(),
                status: FieldStatus::WrongKind {
                    expected: "section".to_string(),
                    found: kind_name(other),
                },
            });
            return;
        }
    };
    for (name, rule) in rules {
        let child_path = path.child(name.as_str());
        let value = map.and_then(|m| m.get(name));
        check_rule(rule, value, &child_path, out);
    }
}

fn check_rule(rule: &Rule, value: Option<&Value>, path: &FieldPath, out: &mut ValidationResult) {
    match rule {
        Rule::Object(children) => check_object(children, value, path, out),
        Rule::Leaf(leaf) => out.fields.push(FieldReport {
            path: path.clone(),
            status: check_leaf(leaf, value),
        }),
        Rule::Repeated(item) => match value {
            None | Some(Value::Null) => out.fields.push(FieldReport {
                path: path.clone(),
                status: FieldStatus::Absent,
            }),
            Some(Value::Array(rows)) => {
                for (i, row) in rows.iter().enumerate() {
                    check_rule(item, Some(row), &path.index(i), out);
                }
            }
            Some(other) => out.fields.push(FieldReport {
                path: path.clone(),
                status: FieldStatus::WrongKind {
                    expected: "list".to_string(),
                    found: kind_name(other),
                },
            }),
        },
    }
}

fn check_leaf(rule: &LeafRule, value: Option<&Value>) -> FieldStatus {
    if is_empty_value(value) {
        return FieldStatus::Absent;
    }
    let Some(value) = value else {
        return FieldStatus::Absent;
    };

    let wrong_kind = || FieldStatus::WrongKind {
        expected: rule.kind.to_string(),
        found: kind_name(value),
    };

    match rule.kind {
        ValueKind::Number => {
            let Some(number) = coerce_number(value) else {
                return wrong_kind();
            };
            if let Some(min) = rule.min
                && number < min
            {
                return FieldStatus::Constraint(format!("{number} is below the minimum of {min}"));
            }
            if let Some(max) = rule.max
                && number > max
            {
                return FieldStatus::Constraint(format!("{number} is above the maximum of {max}"));
            }
            FieldStatus::Valid
        }
        ValueKind::String => {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Array(items) if items.iter().all(|v| !v.is_array() && !v.is_object()) => {
                    return FieldStatus::Valid;
                }
                _ => return wrong_kind(),
            };
            if let Some(limit) = rule.max_length
                && text.chars().count() > limit
            {
                return FieldStatus::Constraint(format!("longer than {limit} characters"));
            }
            if let Some(pattern) = &rule.pattern
                && !pattern.is_match(&text)
            {
                return FieldStatus::Constraint(format!("does not match pattern '{}'", pattern.as_str()));
            }
            FieldStatus::Valid
        }
    }
}

fn collect_required(rules: &[(String, Rule)], data: Option<&Value>, path: &FieldPath, out: &mut Vec<FieldPath>) {
    let map = data.and_then(Value::as_object);
    for (name, rule) in rules {
        let child_path = path.child(name.as_str());
        let value = map.and_then(|m| m.get(name));
        match rule {
            Rule::Object(children) => collect_required(children, value, &child_path, out),
            Rule::Leaf(leaf) if leaf.required && is_empty_value(value) => out.push(child_path),
            Rule::Leaf(_) => {}
            Rule::Repeated(item) => {
                if let (Some(Value::Array(rows)), Rule::Object(children)) = (value, item.as_ref()) {
                    for (i, row) in rows.iter().enumerate() {
                        collect_required(children, Some(row), &child_path.index(i), out);
                    }
                }
            }
        }
    }
}
