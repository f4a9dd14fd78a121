//! Immutable knowledge collection
//!
//! A `KnowledgeBase` is built once (from the compiled-in table, a TOML file,
//! or a vector of entries), validated, and then only ever read.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::{Error, Result};

use super::entry::KnowledgeEntry;

/// Knowledge table shipped with the binary
const BUILTIN_KNOWLEDGE: &str = include_str!("../../data/knowledge.toml");

#[derive(Debug, Deserialize)]
struct KnowledgeFile {
    #[serde(default, rename = "entry")]
    entries: Vec<KnowledgeEntry>,
}

/// Validated, read-only collection of knowledge entries
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    entries: Vec<KnowledgeEntry>,
}

impl KnowledgeBase {
    /// Build a collection, rejecting duplicate ids and blank topics or content
    pub fn new(entries: Vec<KnowledgeEntry>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(entries.len());

        for entry in &entries {
            if !seen.insert(entry.id) {
                return Err(Error::InvalidKnowledge(format!(
                    "duplicate entry id {}",
                    entry.id
                )));
            }
            if entry.topic.trim().is_empty() {
                return Err(Error::InvalidKnowledge(format!(
                    "entry {} has an empty topic",
                    entry.id
                )));
            }
            if entry.content.trim().is_empty() {
                return Err(Error::InvalidKnowledge(format!(
                    "entry {} has empty content",
                    entry.id
                )));
            }
        }

        Ok(Self { entries })
    }

    /// Collection with no entries
    pub fn empty() -> Self {
        Self::default()
    }

    /// The compiled-in clinic knowledge table
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_KNOWLEDGE)
    }

    /// Parse a TOML document made of `[[entry]]` tables
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let file: KnowledgeFile = toml::from_str(source)?;
        Self::new(file.entries)
    }

    /// Load a TOML knowledge file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path)?;
        let base = Self::from_toml_str(&source)?;
        info!(path = %path.display(), entries = base.len(), "Loaded knowledge collection");
        Ok(base)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in collection order
    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, KnowledgeEntry> {
        self.entries.iter()
    }

    /// Look up an entry by id
    pub fn get(&self, id: u32) -> Result<&KnowledgeEntry> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .ok_or(Error::KnowledgeNotFound(id))
    }

    /// Distinct categories in order of first appearance
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .map(|e| e.category.as_str())
            .filter(|c| seen.insert(*c))
            .collect()
    }
}

impl<'a> IntoIterator for &'a KnowledgeBase {
    type Item = &'a KnowledgeEntry;
    type IntoIter = std::slice::Iter<'a, KnowledgeEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_loads_and_is_valid() {
        let base = KnowledgeBase::builtin().unwrap();
        assert_eq!(base.len(), 17);
        assert_eq!(base.get(9).unwrap().topic, "Headaches");
        assert_eq!(base.get(17).unwrap().topic, "Diabetes Management");
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let result = KnowledgeBase::new(vec![
            KnowledgeEntry::new(10, "Common Symptoms", "Cold and Flu", "Rest"),
            KnowledgeEntry::new(10, "Chronic Conditions", "Diabetes", "Monitor"),
        ]);
        let err = result.unwrap_err();
        assert!(matches!(err, Error::InvalidKnowledge(_)));
        assert!(err.to_string().contains("duplicate entry id 10"));
    }

    #[test]
    fn test_rejects_blank_topic_and_content() {
        let blank_topic = KnowledgeBase::new(vec![KnowledgeEntry::new(1, "", "  ", "text")]);
        assert!(blank_topic.is_err());

        let blank_content = KnowledgeBase::new(vec![KnowledgeEntry::new(1, "", "topic", "\n")]);
        assert!(blank_content.is_err());
    }

    #[test]
    fn test_get_missing_entry() {
        let base = KnowledgeBase::empty();
        assert!(matches!(base.get(42), Err(Error::KnowledgeNotFound(42))));
    }

    #[test]
    fn test_categories_in_first_occurrence_order() {
        let base = KnowledgeBase::new(vec![
            KnowledgeEntry::new(1, "Core", "A", "a"),
            KnowledgeEntry::new(2, "Services", "B", "b"),
            KnowledgeEntry::new(3, "Core", "C", "c"),
        ])
        .unwrap();
        assert_eq!(base.categories(), vec!["Core", "Services"]);
    }

    #[test]
    fn test_from_toml_str_without_entries() {
        let base = KnowledgeBase::from_toml_str("").unwrap();
        assert!(base.is_empty());
    }

    #[test]
    fn test_from_toml_str_reports_parse_errors() {
        let err = KnowledgeBase::from_toml_str("[[entry]]\nid = \"one\"").unwrap_err();
        assert!(matches!(err, Error::KnowledgeLoad(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.toml");
        fs::write(
            &path,
            "[[entry]]\nid = 1\ncategory = \"Core\"\ntopic = \"Digital Twin\"\ncontent = \"Virtual model\"\n",
        )
        .unwrap();

        let base = KnowledgeBase::load(&path).unwrap();
        assert_eq!(base.len(), 1);
        assert_eq!(base.entries()[0].category, "Core");
    }
}
