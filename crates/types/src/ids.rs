//! Newtype wrapper for template placeholder tokens.
//!
//! Tokens travel from the schema, through the mapper, into the renderer.
//! Keeping them distinct from arbitrary strings stops a label or a path from
//! being looked up in a token table by accident.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// The bare name of a placeholder, without delimiters or sigils.
#[derive(Debug, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct PlaceholderToken(Arc<str>);

impl PlaceholderToken {
    /// Creates a token, stripping any surrounding `[...]`/`{...}` delimiters
    /// and a leading `%` image sigil so that `"[owner]"`, `"{%photo}"` and
    /// `"owner"` all name the same placeholder.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(Self::strip(raw.as_ref()).into())
    }

    /// Returns the string representation of this token.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the token has no name at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Derives the token used for one row of a repeated section.
    pub fn indexed(&self, row: usize) -> Self {
        Self(format!("{}_{}", self.0, row + 1).into())
    }

    fn strip(raw: &str) -> &str {
        let mut s = raw.trim();
        for (open, close) in [("[", "]"), ("{", "}")] {
            if let Some(inner) = s.strip_prefix(open).and_then(|r| r.strip_suffix(close)) {
                s = inner.trim();
            }
        }
        s.strip_prefix('%').unwrap_or(s).trim()
    }
}

impl From<String> for PlaceholderToken {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for PlaceholderToken {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<PlaceholderToken> for String {
    fn from(t: PlaceholderToken) -> Self {
        t.0.to_string()
    }
}

impl AsRef<str> for PlaceholderToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for PlaceholderToken {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlaceholderToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_delimiters_and_sigil() {
        assert_eq!(PlaceholderToken::new("[ownerName]").as_str(), "ownerName");
        assert_eq!(PlaceholderToken::new("{%photo_front}").as_str(), "photo_front");
        assert_eq!(PlaceholderToken::new("%photo_front").as_str(), "photo_front");
        assert_eq!(PlaceholderToken::new("  plain ").as_str(), "plain");
    }

    #[test]
    fn indexed_tokens_are_one_based() {
        let token = PlaceholderToken::new("comp_address");
        assert_eq!(token.indexed(0).as_str(), "comp_address_1");
        assert_eq!(token.indexed(2).as_str(), "comp_address_3");
    }

    #[test]
    fn usable_as_str_key() {
        let mut map = std::collections::HashMap::new();
        map.insert(PlaceholderToken::new("a"), 1);
        assert_eq!(map.get("a"), Some(&1));
    }
}
