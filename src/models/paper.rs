//! Paper model for upstream search and recommendation results.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A paper as returned by the upstream API.
///
/// The gateway only interprets the identifier; every other field (title,
/// abstract, authors, publication metadata, ...) is carried through untouched
/// in `fields` and re-serialized exactly as upstream sent it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paper {
    /// Upstream identifier, globally unique per upstream
    #[serde(rename = "paperId")]
    pub paper_id: String,

    /// Pass-through payload (title, abstract, authors, url, journal, ...)
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Paper {
    /// Create a paper with just an identifier
    pub fn new(paper_id: impl Into<String>) -> Self {
        Self {
            paper_id: paper_id.into(),
            fields: Map::new(),
        }
    }

    /// Convenience accessor for the title, when upstream provided one
    pub fn title(&self) -> Option<&str> {
        self.fields.get("title").and_then(Value::as_str)
    }
}
