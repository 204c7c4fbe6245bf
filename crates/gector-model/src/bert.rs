//! BERT sequence tagger on Candle
//!
//! Weights are expected in a single safetensors file converted from a
//! GECToR checkpoint: the encoder under [`ENCODER_PREFIX`] and the two
//! projection heads under [`LABELS_HEAD_PREFIX`] and [`DETECT_HEAD_PREFIX`].
//! Each word is represented by its first sub-word piece.

use crate::model_loader::ModelFiles;
use crate::tagger::{TagOutput, Tagger};
use crate::vocab::{LabelVocabulary, START_TOKEN};
use candle_core::{DType, Device, Tensor, D};
use candle_nn::{linear, Linear, Module, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use gector_core::{Error, Result};
use serde::Deserialize;
use std::iter;
use tokenizers::Tokenizer;
use tracing::{debug, warn};

pub const ENCODER_PREFIX: &str = "text_field_embedder.token_embedder_bert.bert_model";
pub const LABELS_HEAD_PREFIX: &str = "tag_labels_projection_layer._module";
pub const DETECT_HEAD_PREFIX: &str = "tag_detect_projection_layer._module";

/// Sub-word pieces kept per word
const MAX_PIECES_PER_WORD: usize = 5;

/// Encoder sizes and architecture read from `config.json`
#[derive(Debug, Deserialize)]
struct EncoderDims {
    hidden_size: usize,
    max_position_embeddings: usize,
    #[serde(default)]
    model_type: Option<String>,
}

#[derive(Debug, Clone, Copy)]
struct SpecialIds {
    cls: u32,
    sep: u32,
    pad: u32,
    unk: u32,
    start: Option<u32>,
}

/// Token ids of one sequence and the position of each word's first piece
struct Encoded {
    ids: Vec<u32>,
    offsets: Vec<u32>,
}

pub struct BertTagger {
    name: String,
    model: BertModel,
    labels_head: Linear,
    detect_head: Linear,
    tokenizer: Tokenizer,
    device: Device,
    special: SpecialIds,
    incorrect_index: usize,
    max_pieces: usize,
}

impl BertTagger {
    /// Load encoder, heads and tokenizer
    pub fn load(files: &ModelFiles, vocab: &LabelVocabulary, device: Device) -> Result<Self> {
        let config_json = std::fs::read_to_string(&files.config)
            .map_err(|e| Error::model(format!("Failed to read config: {}", e)))?;
        let (bert_config, dims) = parse_config(&config_json)?;

        let tokenizer = Tokenizer::from_file(&files.tokenizer)
            .map_err(|e| Error::model(format!("Failed to load tokenizer: {}", e)))?;

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[files.weights.clone()], DType::F32, &device)
                .map_err(|e| Error::model(format!("Failed to load weights: {}", e)))?
        };

        Self::from_var_builder(vb, &bert_config, &dims, tokenizer, vocab, device)
    }

    fn from_var_builder(
        vb: VarBuilder,
        bert_config: &BertConfig,
        dims: &EncoderDims,
        tokenizer: Tokenizer,
        vocab: &LabelVocabulary,
        device: Device,
    ) -> Result<Self> {
        let special = special_ids(&tokenizer)?;

        let model = BertModel::load(vb.pp(ENCODER_PREFIX), bert_config)
            .map_err(|e| Error::model(format!("Failed to load BERT encoder: {}", e)))?;
        let labels_head = linear(dims.hidden_size, vocab.num_labels(), vb.pp(LABELS_HEAD_PREFIX))
            .map_err(|e| Error::model(format!("Failed to load label head: {}", e)))?;
        let detect_head = linear(
            dims.hidden_size,
            vocab.num_detect_tags(),
            vb.pp(DETECT_HEAD_PREFIX),
        )
        .map_err(|e| Error::model(format!("Failed to load detection head: {}", e)))?;

        if special.start.is_none() {
            warn!("Tokenizer has no {} token; special_tokens_fix will fall back to plain pieces", START_TOKEN);
        }

        Ok(Self {
            name: "bert".to_string(),
            model,
            labels_head,
            detect_head,
            tokenizer,
            device,
            special,
            incorrect_index: vocab.incorrect_index(),
            max_pieces: dims.max_position_embeddings,
        })
    }

    fn word_pieces(&self, word: &str, special_tokens_fix: bool) -> Result<Vec<u32>> {
        if special_tokens_fix && word == START_TOKEN {
            if let Some(id) = self.special.start {
                return Ok(vec![id]);
            }
        }

        let encoding = self
            .tokenizer
            .encode(word, false)
            .map_err(|e| Error::model(format!("Tokenization failed: {}", e)))?;

        let mut ids: Vec<u32> = encoding
            .get_ids()
            .iter()
            .copied()
            .take(MAX_PIECES_PER_WORD)
            .collect();
        if ids.is_empty() {
            ids.push(self.special.unk);
        }
        Ok(ids)
    }

    /// Words past the encoder's position limit are dropped
    fn encode(&self, sequence: &[String], special_tokens_fix: bool) -> Result<Encoded> {
        let mut ids = vec![self.special.cls];
        let mut offsets = Vec::with_capacity(sequence.len());

        for word in sequence {
            let pieces = self.word_pieces(word, special_tokens_fix)?;
            if ids.len() + pieces.len() + 1 > self.max_pieces {
                debug!(kept = offsets.len(), total = sequence.len(), "Truncating long sequence");
                break;
            }
            offsets.push(ids.len() as u32);
            ids.extend(pieces);
        }
        ids.push(self.special.sep);

        Ok(Encoded { ids, offsets })
    }

    fn forward(&self, encoded: &[Encoded]) -> candle_core::Result<Vec<TagOutput>> {
        let batch = encoded.len();
        let seq_len = encoded.iter().map(|e| e.ids.len()).max().unwrap_or(0);

        let mut input = Vec::with_capacity(batch * seq_len);
        let mut mask = Vec::with_capacity(batch * seq_len);
        for e in encoded {
            let padding = seq_len - e.ids.len();
            input.extend(e.ids.iter().copied().chain(iter::repeat(self.special.pad).take(padding)));
            mask.extend(iter::repeat(1u32).take(e.ids.len()).chain(iter::repeat(0u32).take(padding)));
        }

        let input_ids = Tensor::from_vec(input, (batch, seq_len), &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let attention_mask = Tensor::from_vec(mask, (batch, seq_len), &self.device)?;

        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        let mut outputs = Vec::with_capacity(batch);
        for (i, e) in encoded.iter().enumerate() {
            if e.offsets.is_empty() {
                outputs.push(TagOutput {
                    label_probs: Vec::new(),
                    error_probability: 0.0,
                });
                continue;
            }

            let index = Tensor::from_vec(e.offsets.clone(), e.offsets.len(), &self.device)?;
            let words = hidden.get(i)?.index_select(&index, 0)?;

            let label_probs =
                candle_nn::ops::softmax(&self.labels_head.forward(&words)?, D::Minus1)?
                    .to_vec2::<f32>()?;
            let detect_probs =
                candle_nn::ops::softmax(&self.detect_head.forward(&words)?, D::Minus1)?
                    .to_vec2::<f32>()?;

            let error_probability = detect_probs
                .iter()
                .filter_map(|row| row.get(self.incorrect_index).copied())
                .fold(0.0f32, f32::max);

            outputs.push(TagOutput {
                label_probs,
                error_probability,
            });
        }

        Ok(outputs)
    }
}

impl Tagger for BertTagger {
    fn tag(&self, sequences: &[Vec<String>], special_tokens_fix: bool) -> Result<Vec<TagOutput>> {
        if sequences.is_empty() {
            return Ok(Vec::new());
        }

        let encoded = sequences
            .iter()
            .map(|s| self.encode(s, special_tokens_fix))
            .collect::<Result<Vec<_>>>()?;

        self.forward(&encoded)
            .map_err(|e| Error::model(format!("Model forward pass failed: {}", e)))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Parse `config.json` for the encoder.
///
/// Only BERT encoders are accepted. RoBERTa checkpoints number positions from
/// `pad_token_id + 1`, which the BERT embeddings cannot reproduce.
fn parse_config(config_json: &str) -> Result<(BertConfig, EncoderDims)> {
    let dims: EncoderDims = serde_json::from_str(config_json)
        .map_err(|e| Error::model(format!("Failed to parse encoder dimensions: {}", e)))?;

    match dims.model_type.as_deref() {
        None | Some("bert") => {}
        Some(other) => {
            return Err(Error::model(format!(
                "Unsupported encoder type \"{}\": only BERT GECToR checkpoints can be loaded",
                other
            )))
        }
    }

    let bert_config: BertConfig = serde_json::from_str(config_json)
        .map_err(|e| Error::model(format!("Failed to parse config: {}", e)))?;
    Ok((bert_config, dims))
}

/// Look up the WordPiece special token ids
fn special_ids(tokenizer: &Tokenizer) -> Result<SpecialIds> {
    let find = |token: &str| {
        tokenizer
            .token_to_id(token)
            .ok_or_else(|| Error::model(format!("Tokenizer lacks special token {}", token)))
    };

    Ok(SpecialIds {
        cls: find("[CLS]")?,
        sep: find("[SEP]")?,
        pad: find("[PAD]")?,
        unk: find("[UNK]")?,
        start: tokenizer.token_to_id(START_TOKEN),
    })
}
