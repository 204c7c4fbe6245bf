//! Iterative sequence-tagging correction
//!
//! Each pass tags the sentences that are still changing, turns the most
//! likely label at every position into an edit and applies the edits. A
//! sentence stops being re-tagged once a pass leaves it unchanged or brings
//! it back to a version seen before.

use crate::tagger::{TagOutput, Tagger};
use crate::transform::{apply_edits, token_action};
use crate::vocab::{LabelVocabulary, VerbFormDictionary, START_TOKEN};
use async_trait::async_trait;
use gector_core::{BatchOutcome, Corrector, DecodeParams, Error, Result, SentenceHistory};
use std::time::Instant;
use tracing::debug;

/// GECToR corrector over any [`Tagger`]
pub struct GecBertModel<T> {
    name: String,
    tagger: T,
    vocab: LabelVocabulary,
    verbs: VerbFormDictionary,
}

impl<T: Tagger> GecBertModel<T> {
    pub fn new(tagger: T, vocab: LabelVocabulary, verbs: VerbFormDictionary) -> Self {
        Self {
            name: format!("gector-{}", tagger.name()),
            tagger,
            vocab,
            verbs,
        }
    }

    pub fn tagger(&self) -> &T {
        &self.tagger
    }

    pub fn vocab(&self) -> &LabelVocabulary {
        &self.vocab
    }

    /// Run the correction passes over one batch
    pub fn correct(&self, batch: &[Vec<String>], params: &DecodeParams) -> Result<BatchOutcome> {
        let mut final_batch = batch.to_vec();
        let mut history: Vec<SentenceHistory> =
            batch.iter().map(|s| SentenceHistory::new(s)).collect();
        let mut seen: Vec<Vec<Vec<String>>> = batch.iter().map(|s| vec![s.clone()]).collect();

        let mut pred_ids: Vec<usize> = (0..batch.len())
            .filter(|&i| batch[i].len() >= params.min_len)
            .collect();
        let mut total_updates = 0;

        for iteration in 0..params.iterations {
            if pred_ids.is_empty() {
                break;
            }

            let sequences: Vec<Vec<String>> = pred_ids
                .iter()
                .map(|&i| self.preprocess(&final_batch[i], params))
                .collect();

            let outputs = self.tagger.tag(&sequences, params.special_tokens_fix)?;
            if outputs.len() != sequences.len() {
                return Err(Error::model(format!(
                    "tagger returned {} outputs for {} sequences",
                    outputs.len(),
                    sequences.len()
                )));
            }

            let mut still_changing = Vec::new();
            for (&id, output) in pred_ids.iter().zip(&outputs) {
                let prediction = self.postprocess(&final_batch[id], output, params);
                if prediction == final_batch[id] {
                    continue;
                }

                let cycled = seen[id].contains(&prediction);
                history[id].push(&prediction);
                if !cycled {
                    seen[id].push(prediction.clone());
                    still_changing.push(id);
                }
                final_batch[id] = prediction;
                total_updates += 1;
            }

            debug!(
                iteration,
                tagged = pred_ids.len(),
                changed = still_changing.len(),
                "Correction pass complete"
            );
            pred_ids = still_changing;
        }

        Ok(BatchOutcome {
            predictions: final_batch,
            corrections: total_updates,
            history,
        })
    }

    /// `$START` marker plus the first `max_len` tokens
    fn preprocess(&self, tokens: &[String], params: &DecodeParams) -> Vec<String> {
        let mut sequence = Vec::with_capacity(tokens.len().min(params.max_len) + 1);
        sequence.push(START_TOKEN.to_string());
        sequence.extend(tokens.iter().take(params.max_len).map(|t| {
            if params.lowercase_tokens {
                t.to_lowercase()
            } else {
                t.clone()
            }
        }));
        sequence
    }

    /// Apply the best label at every position to the original tokens
    fn postprocess(&self, tokens: &[String], output: &TagOutput, params: &DecodeParams) -> Vec<String> {
        let best: Vec<(usize, f32)> = output
            .label_probs
            .iter()
            .map(|row| self.best_label(row, params))
            .collect();

        if best.iter().all(|&(idx, _)| idx == self.vocab.keep_index()) {
            return tokens.to_vec();
        }
        if output.error_probability < params.min_error_probability {
            return tokens.to_vec();
        }

        let length = tokens.len().min(params.max_len);
        let edits: Vec<_> = best
            .iter()
            .enumerate()
            .take(length + 1)
            .filter_map(|(position, &(idx, prob))| {
                if idx == self.vocab.keep_index() {
                    return None;
                }
                let label = self.vocab.label(idx)?;
                token_action(position, label, prob, params.min_error_probability)
            })
            .collect();

        apply_edits(tokens, &edits, &self.verbs)
    }

    /// Most likely label after the keep/delete confidence biases
    fn best_label(&self, row: &[f32], params: &DecodeParams) -> (usize, f32) {
        let keep = self.vocab.keep_index();
        let delete = self.vocab.delete_index();

        row.iter()
            .enumerate()
            .map(|(idx, &p)| {
                let bias = if idx == keep {
                    params.confidence
                } else if Some(idx) == delete {
                    params.del_confidence
                } else {
                    0.0
                };
                (idx, p + bias)
            })
            .fold((keep, f32::NEG_INFINITY), |best, cur| {
                if cur.1 > best.1 {
                    cur
                } else {
                    best
                }
            })
    }
}

#[async_trait]
impl<T: Tagger> Corrector for GecBertModel<T> {
    async fn handle_batch(
        &self,
        batch: &[Vec<String>],
        params: &DecodeParams,
    ) -> Result<BatchOutcome> {
        let start = Instant::now();
        let outcome = self.correct(batch, params)?;

        debug!(
            sentences = batch.len(),
            corrections = outcome.corrections,
            latency_us = start.elapsed().as_micros() as u64,
            "Batch corrected"
        );
        Ok(outcome)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
