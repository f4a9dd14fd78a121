//! Knowledge retrieval
//!
//! Maps a free-text message to the few knowledge entries most worth putting
//! in front of the model. Retrieval is total: an empty query, an empty
//! collection or a query with no matches all produce an empty result, and the
//! caller carries on without extra context.

use std::sync::Arc;

use tracing::debug;

use super::base::KnowledgeBase;
use super::entry::{KnowledgeEntry, ScoredEntry};
use super::scoring::ScoringVariant;

/// Number of entries returned when no explicit limit is given
pub const DEFAULT_TOP_K: usize = 3;

/// Ranks entries of an injected knowledge collection against a query
///
/// The collection is shared read-only, so one retriever can serve any number
/// of concurrent callers.
#[derive(Debug, Clone)]
pub struct Retriever {
    knowledge: Arc<KnowledgeBase>,
    variant: ScoringVariant,
    top_k: usize,
}

impl Retriever {
    /// Create a retriever over `knowledge` using one scoring variant
    pub fn new(knowledge: Arc<KnowledgeBase>, variant: ScoringVariant) -> Self {
        Self {
            knowledge,
            variant,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Set the default number of entries returned by [`Retriever::search`]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub fn variant(&self) -> ScoringVariant {
        self.variant
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Score every entry and sort by descending score
    ///
    /// Equal scores keep collection order. Nothing is filtered out.
    pub fn rank(&self, query: &str) -> Vec<ScoredEntry<'_>> {
        let prepared = self.variant.prepare(query);

        let mut scored: Vec<ScoredEntry<'_>> = self
            .knowledge
            .iter()
            .map(|entry| ScoredEntry {
                entry,
                score: prepared.score(&entry.searchable_text()),
            })
            .collect();

        // sort_by is stable: ties stay in collection order
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored
    }

    /// Entries scoring above the variant threshold, best first, at most `top_k`
    pub fn retrieve_scored(&self, query: &str, top_k: usize) -> Vec<ScoredEntry<'_>> {
        let threshold = self.variant.threshold();

        let results: Vec<ScoredEntry<'_>> = self
            .rank(query)
            .into_iter()
            .filter(|s| s.score > threshold)
            .take(top_k)
            .collect();

        debug!(
            variant = %self.variant,
            top_k,
            candidates = self.knowledge.len(),
            retrieved = results.len(),
            "Knowledge retrieval complete"
        );

        results
    }

    /// Like [`Retriever::retrieve_scored`] but returns owned entries
    pub fn retrieve(&self, query: &str, top_k: usize) -> Vec<KnowledgeEntry> {
        self.retrieve_scored(query, top_k)
            .into_iter()
            .map(ScoredEntry::into_entry)
            .collect()
    }

    /// Retrieve using the configured default `top_k`
    pub fn search(&self, query: &str) -> Vec<KnowledgeEntry> {
        self.retrieve(query, self.top_k)
    }
}

/// One-shot retrieval over a borrowed collection
pub fn retrieve(
    query: &str,
    collection: &[KnowledgeEntry],
    top_k: usize,
    variant: ScoringVariant,
) -> Vec<KnowledgeEntry> {
    let prepared = variant.prepare(query);
    let threshold = variant.threshold();

    let mut scored: Vec<(f64, &KnowledgeEntry)> = collection
        .iter()
        .map(|entry| (prepared.score(&entry.searchable_text()), entry))
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    scored
        .into_iter()
        .filter(|(score, _)| *score > threshold)
        .take(top_k)
        .map(|(_, entry)| entry.clone())
        .collect()
}
