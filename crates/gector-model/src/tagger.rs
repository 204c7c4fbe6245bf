//! Sequence tagger seam between the correction loop and the network

use gector_core::Result;

/// Per-sequence tagger output
#[derive(Debug, Clone, PartialEq)]
pub struct TagOutput {
    /// Label probabilities for each tagged position, `$START` first.
    /// May be shorter than the sequence when it was truncated.
    pub label_probs: Vec<Vec<f32>>,

    /// Highest `INCORRECT` probability over the sequence
    pub error_probability: f32,
}

/// Something that assigns correction label probabilities to token sequences
pub trait Tagger: Send + Sync {
    /// Tag a batch of `$START`-prefixed token sequences
    fn tag(&self, sequences: &[Vec<String>], special_tokens_fix: bool) -> Result<Vec<TagOutput>>;

    /// Get the tagger name
    fn name(&self) -> &str;
}
