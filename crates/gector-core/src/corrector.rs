//! Corrector trait and common types

use crate::error::Result;
use crate::params::DecodeParams;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Trait for grammatical error correction models
#[async_trait]
pub trait Corrector: Send + Sync {
    /// Correct a batch of whitespace-tokenized sentences
    async fn handle_batch(
        &self,
        batch: &[Vec<String>],
        params: &DecodeParams,
    ) -> Result<BatchOutcome>;

    /// Get the corrector name
    fn name(&self) -> &str;
}

/// Result of correcting one batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    /// Corrected tokens, one entry per input sentence
    pub predictions: Vec<Vec<String>>,

    /// Number of sentence updates made across all iterations
    pub corrections: usize,

    /// Version history, one entry per input sentence
    pub history: Vec<SentenceHistory>,
}

impl BatchOutcome {
    /// Outcome that leaves every sentence untouched
    pub fn unchanged(batch: &[Vec<String>]) -> Self {
        Self {
            predictions: batch.to_vec(),
            corrections: 0,
            history: batch.iter().map(|s| SentenceHistory::new(s)).collect(),
        }
    }
}

/// Every distinct version a sentence went through, source first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SentenceHistory {
    pub versions: Vec<String>,
}

impl SentenceHistory {
    /// Start a history from the source tokens
    pub fn new(source: &[String]) -> Self {
        Self {
            versions: vec![source.join(" ")],
        }
    }

    /// Record a new version unless it repeats the latest one
    pub fn push(&mut self, tokens: &[String]) {
        let line = tokens.join(" ");
        if self.versions.last() != Some(&line) {
            self.versions.push(line);
        }
    }

    /// Number of recorded changes after the source
    pub fn changes(&self) -> usize {
        self.versions.len().saturating_sub(1)
    }
}
