//! Batching loop between a request and a corrector

use crate::corrector::{Corrector, SentenceHistory};
use crate::error::{Error, Result};
use crate::normalize::Normalizer;
use crate::params::RequestPlan;
use std::slice::Chunks;
use tracing::debug;

/// Output of a full prediction run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Prediction {
    /// Corrected sentences, in input order
    pub lines: Vec<String>,

    /// Total updates reported by the corrector
    pub corrections: usize,

    /// Per-sentence histories, in input order
    pub history: Vec<SentenceHistory>,
}

/// Split `items` into consecutive batches of `batch_size`.
///
/// The final batch holds the remainder. A batch size below one never fills,
/// so everything lands in a single batch.
pub fn batches<T>(items: &[T], batch_size: i64) -> Chunks<'_, T> {
    let size = if batch_size > 0 {
        batch_size as usize
    } else {
        items.len().max(1)
    };
    items.chunks(size)
}

/// Correct every sentence of the plan, batch by batch
pub async fn predict(
    corrector: &dyn Corrector,
    plan: &RequestPlan,
    normalizer: &Normalizer,
) -> Result<Prediction> {
    let tokenized: Vec<Vec<String>> = plan
        .input_text
        .iter()
        .map(|sent| sent.split_whitespace().map(str::to_string).collect())
        .collect();

    let mut predictions = Vec::with_capacity(tokenized.len());
    let mut history = Vec::with_capacity(tokenized.len());
    let mut corrections = 0;

    for (index, batch) in batches(&tokenized, plan.batch_size).enumerate() {
        debug!(batch = index, size = batch.len(), corrector = corrector.name(), "Flushing batch");

        let outcome = corrector.handle_batch(batch, &plan.decode).await?;
        if outcome.predictions.len() != batch.len() {
            return Err(Error::model(format!(
                "{} returned {} predictions for {} sentences",
                corrector.name(),
                outcome.predictions.len(),
                batch.len()
            )));
        }
        if outcome.history.len() != batch.len() {
            return Err(Error::model(format!(
                "{} returned {} histories for {} sentences",
                corrector.name(),
                outcome.history.len(),
                batch.len()
            )));
        }

        predictions.extend(outcome.predictions);
        history.extend(outcome.history);
        corrections += outcome.corrections;
    }

    let mut lines: Vec<String> = predictions.iter().map(|tokens| tokens.join(" ")).collect();
    if plan.to_normalize {
        lines = lines.iter().map(|line| normalizer.normalize(line)).collect();
    }

    Ok(Prediction {
        lines,
        corrections,
        history,
    })
}
