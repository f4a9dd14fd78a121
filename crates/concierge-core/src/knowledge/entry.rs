//! Knowledge entry types

use serde::{Deserialize, Serialize};

/// One static reference passage in the knowledge collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    /// Unique within one loaded collection
    pub id: u32,
    /// Grouping label (not used in scoring)
    #[serde(default)]
    pub category: String,
    /// Short title
    pub topic: String,
    /// Reference text
    pub content: String,
}

impl KnowledgeEntry {
    /// Create a new entry
    pub fn new(
        id: u32,
        category: impl Into<String>,
        topic: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id,
            category: category.into(),
            topic: topic.into(),
            content: content.into(),
        }
    }

    /// Text the retriever scores against: topic and content joined by a space
    pub fn searchable_text(&self) -> String {
        format!("{} {}", self.topic, self.content)
    }
}

/// An entry paired with its similarity score for one retrieval call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredEntry<'a> {
    pub entry: &'a KnowledgeEntry,
    pub score: f64,
}

impl ScoredEntry<'_> {
    /// Detach the score, cloning the entry
    pub fn into_entry(self) -> KnowledgeEntry {
        self.entry.clone()
    }
}
