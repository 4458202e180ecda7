//! Ranked data sources for the merge stage.
//!
//! A report is assembled from several candidate trees: the user's saved
//! draft, freshly extracted data, and defaults. Each is a [`DataSource`];
//! a [`SourceStack`] orders them from highest to lowest priority.
//!
//! ## Example
//!
//! ```ignore
//! use valuer_source::{DataSource, SourceStack};
//! use valuer_types::FieldPath;
//! use serde_json::json;
//!
//! let stack = SourceStack::new()
//!     .with(DataSource::defaults(json!({ "ownerName": "Unknown" })))
//!     .with(DataSource::draft(json!({ "ownerName": "N/A" })))
//!     .sorted_by_kind();
//!
//! let first = stack.iter().next().unwrap();
//! assert_eq!(first.name(), "draft");
//! assert_eq!(first.get(&FieldPath::parse("ownerName")), Some(&json!("N/A")));
//! ```
//!
//! Choosing a value per leaf is the merge stage's job; the stack only fixes
//! the order.

use serde_json::Value;
use std::fmt;
use valuer_types::FieldPath;

/// Where a data source came from. Only used for naming and for
/// [`SourceStack::sorted_by_kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceKind {
    /// The user's saved, hand-edited draft.
    Draft,
    /// Data produced by the extraction step.
    Extracted,
    /// Operator-supplied fallbacks.
    Defaults,
    Custom,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SourceKind::Draft => "draft",
            SourceKind::Extracted => "extracted",
            SourceKind::Defaults => "defaults",
            SourceKind::Custom => "custom",
        })
    }
}

/// One ranked input tree. The tree only approximately matches the schema:
/// fields may be missing, `null`, `""` or `"N/A"`.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSource {
    name: String,
    kind: SourceKind,
    value: Value,
}

impl DataSource {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            kind: SourceKind::Custom,
            value,
        }
    }

    fn of_kind(kind: SourceKind, value: Value) -> Self {
        Self {
            name: kind.to_string(),
            kind,
            value,
        }
    }

    pub fn draft(value: Value) -> Self {
        Self::of_kind(SourceKind::Draft, value)
    }

    pub fn extracted(value: Value) -> Self {
        Self::of_kind(SourceKind::Extracted, value)
    }

    pub fn defaults(value: Value) -> Self {
        Self::of_kind(SourceKind::Defaults, value)
    }

    /// Parses a source from JSON text.
    pub fn from_json_str(name: impl Into<String>, json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(name, serde_json::from_str(json)?))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Value at `path`, or `None` if the path does not resolve.
    pub fn get(&self, path: &FieldPath) -> Option<&Value> {
        path.resolve(&self.value)
    }

    /// Top-level trees that are not objects contribute nothing to a merge.
    pub fn is_usable(&self) -> bool {
        self.value.is_object()
    }
}

/// Data sources ordered from highest (index 0) to lowest priority.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceStack {
    sources: Vec<DataSource>,
}

impl SourceStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a source below every source already on the stack.
    pub fn with(mut self, source: DataSource) -> Self {
        self.push(source);
        self
    }

    pub fn push(&mut self, source: DataSource) {
        if !source.is_usable() {
            log::warn!(
                "Data source '{}' is not a JSON object and will contribute no values",
                source.name()
            );
        }
        self.sources.push(source);
    }

    /// Reorders the stack as draft, extracted, defaults, custom. Sources of
    /// the same kind keep their relative order.
    pub fn sorted_by_kind(mut self) -> Self {
        self.sources.sort_by_key(DataSource::kind);
        self
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DataSource> {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl From<Vec<DataSource>> for SourceStack {
    fn from(sources: Vec<DataSource>) -> Self {
        let mut stack = SourceStack::new();
        for source in sources {
            stack.push(source);
        }
        stack
    }
}

impl<'a> IntoIterator for &'a SourceStack {
    type Item = &'a DataSource;
    type IntoIter = std::slice::Iter<'a, DataSource>;

    fn into_iter(self) -> Self::IntoIter {
        self.sources.iter()
    }
}
