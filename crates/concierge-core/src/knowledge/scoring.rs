//! Lexical similarity scoring
//!
//! Two scoring strategies exist for the same question ("how relevant is this
//! passage to the user's message?"). A retriever is built with exactly one of
//! them; scores from different variants are not comparable.
//!
//! - [`ScoringVariant::Overlap`]: share of distinct query words found in the
//!   passage, normalised by the longer of the two token lists. Kept when
//!   `score > 0.1`.
//! - [`ScoringVariant::Keyword`]: +1 per query word longer than three
//!   characters that appears in the passage, +10 when the whole query appears
//!   verbatim. Kept when `score > 0`.
//!
//! Tokenisation is plain lower-casing plus whitespace splitting. Punctuation
//! stays attached to its word, so `"twin?"` does not match `"twin"`.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Minimum score an Overlap match must exceed
pub const OVERLAP_THRESHOLD: f64 = 0.1;

/// Minimum score a Keyword match must exceed
pub const KEYWORD_THRESHOLD: f64 = 0.0;

/// Query words this short or shorter are ignored by Keyword scoring
const KEYWORD_MIN_TOKEN_CHARS: usize = 3;

/// Bonus when the full query appears verbatim in the passage
const VERBATIM_BONUS: f64 = 10.0;

/// Scoring strategy used by a retriever
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringVariant {
    /// Normalised distinct-word overlap, suited to short passages
    Overlap,
    /// Long-word hits plus verbatim-substring bonus, suited to the curated table
    #[default]
    Keyword,
}

impl ScoringVariant {
    pub const ALL: [ScoringVariant; 2] = [ScoringVariant::Overlap, ScoringVariant::Keyword];

    /// Scores at or below this value are discarded
    pub fn threshold(self) -> f64 {
        match self {
            Self::Overlap => OVERLAP_THRESHOLD,
            Self::Keyword => KEYWORD_THRESHOLD,
        }
    }

    /// Prepare a query once so it can be scored against many passages
    pub fn prepare(self, query: &str) -> PreparedQuery {
        PreparedQuery::new(self, query)
    }

    /// Score one query against one passage
    pub fn score(self, query: &str, text: &str) -> f64 {
        self.prepare(query).score(text)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Overlap => "overlap",
            Self::Keyword => "keyword",
        }
    }
}

impl fmt::Display for ScoringVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoringVariant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "overlap" => Ok(Self::Overlap),
            "keyword" => Ok(Self::Keyword),
            other => Err(Error::InvalidInput(format!(
                "unknown scoring variant '{}'. Valid options: overlap, keyword",
                other
            ))),
        }
    }
}

/// A lower-cased, tokenised query bound to one scoring variant
#[derive(Debug, Clone)]
pub struct PreparedQuery {
    variant: ScoringVariant,
    lowered: String,
    tokens: Vec<String>,
}

impl PreparedQuery {
    fn new(variant: ScoringVariant, query: &str) -> Self {
        let lowered = query.to_lowercase();
        let tokens = match variant {
            ScoringVariant::Overlap => tokenize(&lowered),
            ScoringVariant::Keyword => tokenize(&lowered)
                .into_iter()
                .filter(|t| t.chars().count() > KEYWORD_MIN_TOKEN_CHARS)
                .collect(),
        };

        Self {
            variant,
            lowered,
            tokens,
        }
    }

    pub fn variant(&self) -> ScoringVariant {
        self.variant
    }

    /// Score this query against a passage
    pub fn score(&self, text: &str) -> f64 {
        let text = text.to_lowercase();
        match self.variant {
            ScoringVariant::Overlap => self.overlap_score(&text),
            ScoringVariant::Keyword => self.keyword_score(&text),
        }
    }

    fn overlap_score(&self, text: &str) -> f64 {
        let text_tokens = tokenize(text);
        let denominator = self.tokens.len().max(text_tokens.len());
        if denominator == 0 {
            return 0.0;
        }

        let text_set: HashSet<&str> = text_tokens.iter().map(String::as_str).collect();
        let query_set: HashSet<&str> = self.tokens.iter().map(String::as_str).collect();
        let common = query_set.iter().filter(|t| text_set.contains(*t)).count();

        common as f64 / denominator as f64
    }

    fn keyword_score(&self, text: &str) -> f64 {
        let text_set: HashSet<&str> = text.split_whitespace().collect();
        let mut score = self
            .tokens
            .iter()
            .filter(|t| text_set.contains(t.as_str()))
            .count() as f64;

        if !self.lowered.trim().is_empty() && text.contains(&self.lowered) {
            score += VERBATIM_BONUS;
        }

        score
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}
