use crate::error::{SchemaIssue, SchemaParseError};
use indexmap::IndexMap;
use regex::Regex;
use std::collections::HashSet;
use valuer_types::{FieldPath, PathSegment, PlaceholderToken, ValueKind};

/// Optional checks attached to a leaf.
#[derive(Debug, Clone, Default)]
pub struct ValidationHints {
    pub required: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub max_length: Option<usize>,
    pub pattern: Option<Regex>,
}

impl ValidationHints {
    pub fn is_empty(&self) -> bool {
        !self.required
            && self.min.is_none()
            && self.max.is_none()
            && self.max_length.is_none()
            && self.pattern.is_none()
    }
}

/// A terminal schema node: one scalar field and the token it fills.
#[derive(Debug, Clone)]
pub struct LeafNode {
    pub label: String,
    pub token: PlaceholderToken,
    pub kind: ValueKind,
    pub validation: ValidationHints,
}

impl LeafNode {
    pub fn new(label: impl Into<String>, token: impl Into<PlaceholderToken>) -> Self {
        Self {
            label: label.into(),
            token: token.into(),
            kind: ValueKind::String,
            validation: ValidationHints::default(),
        }
    }

    pub fn numeric(mut self) -> Self {
        self.kind = ValueKind::Number;
        self
    }

    pub fn required(mut self) -> Self {
        self.validation.required = true;
        self
    }
}

/// An ordered section of named children.
#[derive(Debug, Clone, Default)]
pub struct ObjectNode {
    pub children: IndexMap<String, SchemaNode>,
}

impl ObjectNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a child, replacing any previous child with the same name.
    pub fn with(mut self, name: impl Into<String>, node: impl Into<SchemaNode>) -> Self {
        self.children.insert(name.into(), node.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&SchemaNode> {
        self.children.get(name)
    }
}

/// Homogeneous rows sharing one item shape.
#[derive(Debug, Clone)]
pub struct RepeatedNode {
    pub item: ObjectNode,
    /// Fixed number of rows the template provides tokens for, if any.
    pub slots: Option<usize>,
}

impl RepeatedNode {
    pub fn new(item: ObjectNode) -> Self {
        Self { item, slots: None }
    }

    pub fn with_slots(mut self, slots: usize) -> Self {
        self.slots = Some(slots);
        self
    }
}

/// A node that could not be classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownNode {
    pub reason: String,
}

#[derive(Debug, Clone)]
pub enum SchemaNode {
    Object(ObjectNode),
    Leaf(LeafNode),
    Repeated(RepeatedNode),
    Unknown(UnknownNode),
}

impl SchemaNode {
    pub fn unknown(reason: impl Into<String>) -> Self {
        SchemaNode::Unknown(UnknownNode {
            reason: reason.into(),
        })
    }

    pub fn as_leaf(&self) -> Option<&LeafNode> {
        match self {
            SchemaNode::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, SchemaNode::Unknown(_))
    }
}

impl From<ObjectNode> for SchemaNode {
    fn from(node: ObjectNode) -> Self {
        SchemaNode::Object(node)
    }
}

impl From<LeafNode> for SchemaNode {
    fn from(node: LeafNode) -> Self {
        SchemaNode::Leaf(node)
    }
}

impl From<RepeatedNode> for SchemaNode {
    fn from(node: RepeatedNode) -> Self {
        SchemaNode::Repeated(node)
    }
}

/// A parsed schema. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct SchemaModel {
    root: ObjectNode,
    issues: Vec<SchemaIssue>,
}

impl SchemaModel {
    /// Parses a schema definition document.
    ///
    /// Only a non-object root is an error. Every other unclassifiable node is
    /// kept as [`SchemaNode::Unknown`] and reported through [`Self::issues`].
    pub fn parse(raw: &serde_json::Value) -> Result<Self, SchemaParseError> {
        crate::parser::parse(raw)
    }

    /// Builds a model from an already-constructed tree (used by tests and by
    /// callers that assemble schemas in code).
    pub fn from_root(root: ObjectNode) -> Self {
        Self {
            root,
            issues: Vec::new(),
        }
    }

    pub(crate) fn with_issues(root: ObjectNode, issues: Vec<SchemaIssue>) -> Self {
        Self { root, issues }
    }

    pub fn root(&self) -> &ObjectNode {
        &self.root
    }

    /// Diagnostics for the nodes that were ignored during parsing.
    pub fn issues(&self) -> &[SchemaIssue] {
        &self.issues
    }

    /// Walks every leaf depth-first in schema order. Leaves inside repeated
    /// sections are reported once, under a `[]` path segment.
    ///
    /// The walk borrows the immutable tree, so calling this again restarts it.
    pub fn traverse_leaves(&self) -> Leaves<'_> {
        Leaves {
            stack: vec![(FieldPath::root(), self.root.children.iter())],
        }
    }

    /// Finds the node at `path`. Index and `[]` segments step into the item
    /// shape of a repeated section.
    pub fn lookup(&self, path: &FieldPath) -> Option<&SchemaNode> {
        let mut segments = path.segments().iter();
        let mut current = match segments.next()? {
            PathSegment::Key(key) => self.root.get(key)?,
            _ => return None,
        };
        let mut pending_row = false;
        for segment in segments {
            current = match (current, segment) {
                (SchemaNode::Repeated(_), PathSegment::Index(_) | PathSegment::Each) if !pending_row => {
                    pending_row = true;
                    continue;
                }
                (SchemaNode::Repeated(rep), PathSegment::Key(key)) if pending_row => {
                    pending_row = false;
                    rep.item.get(key)?
                }
                (SchemaNode::Object(obj), PathSegment::Key(key)) => obj.get(key)?,
                _ => return None,
            };
        }
        (!pending_row).then_some(current)
    }

    pub fn leaf_count(&self) -> usize {
        self.traverse_leaves().count()
    }

    /// Every placeholder token declared by the schema (repeated-section
    /// tokens in their un-indexed form).
    pub fn tokens(&self) -> HashSet<PlaceholderToken> {
        self.traverse_leaves()
            .map(|(_, leaf)| leaf.token.clone())
            .collect()
    }
}

/// Lazy depth-first iterator over `(path, leaf)` pairs.
pub struct Leaves<'a> {
    stack: Vec<(FieldPath, indexmap::map::Iter<'a, String, SchemaNode>)>,
}

impl<'a> Iterator for Leaves<'a> {
    type Item = (FieldPath, &'a LeafNode);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (base, children) = self.stack.last_mut()?;
            let Some((name, node)) = children.next() else {
                self.stack.pop();
                continue;
            };
            let path = base.child(name.as_str());
            match node {
                SchemaNode::Leaf(leaf) => return Some((path, leaf)),
                SchemaNode::Object(obj) => self.stack.push((path, obj.children.iter())),
                SchemaNode::Repeated(rep) => self.stack.push((path.each(), rep.item.children.iter())),
                SchemaNode::Unknown(_) => {}
            }
        }
    }
}
