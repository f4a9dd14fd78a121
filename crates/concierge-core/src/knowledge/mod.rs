//! Knowledge collection and retrieval
//!
//! This module provides:
//! - The immutable knowledge collection (built-in table or TOML file)
//! - Lexical scoring variants (normalised overlap, keyword + verbatim bonus)
//! - The retriever that picks the top entries for a user message

mod base;
mod entry;
mod retriever;
mod scoring;

pub use base::KnowledgeBase;
pub use entry::{KnowledgeEntry, ScoredEntry};
pub use retriever::{DEFAULT_TOP_K, Retriever, retrieve};
pub use scoring::{KEYWORD_THRESHOLD, OVERLAP_THRESHOLD, PreparedQuery, ScoringVariant};
