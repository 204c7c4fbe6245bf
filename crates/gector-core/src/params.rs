//! Params file and per-request decode parameters
//!
//! The params file is a JSON document:
//!
//! ```json
//! {
//!   "batch_size": 32,
//!   "to_normalize": true,
//!   "model_params": {
//!     "model_path": "models/gector-bert-base",
//!     "max_len": 50,
//!     "min_len": 3,
//!     "iterations": 5,
//!     "min_error_probability": 0.0
//!   }
//! }
//! ```
//!
//! Every key is optional. The file is re-read on each [`ParamsFile::load`]
//! call so edits take effect on the next request.

use crate::error::Result;
use crate::types::GectorRequest;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Defaults for batching, normalization and the model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParamsFile {
    /// Sentences per model call
    #[serde(default = "default_batch_size")]
    pub batch_size: i64,

    /// Normalize detokenized output
    #[serde(default = "default_true")]
    pub to_normalize: bool,

    /// Model location and decode defaults
    #[serde(default)]
    pub model_params: ModelParams,
}

impl ParamsFile {
    /// Read and parse the params file at `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let params: Self = serde_json::from_str(&content)?;
        debug!(path = %path.display(), "Loaded params file");
        Ok(params)
    }
}

impl Default for ParamsFile {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            to_normalize: true,
            model_params: ModelParams::default(),
        }
    }
}

/// Contents of the `model_params` object
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ModelParams {
    #[serde(flatten)]
    pub spec: ModelSpec,

    #[serde(flatten)]
    pub decode: DecodeParams,
}

/// Where the model comes from and where it runs. Read once at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelSpec {
    /// Directory with `config.json`, `tokenizer.json` and `model.safetensors`
    #[serde(default)]
    pub model_path: Option<PathBuf>,

    /// Hugging Face repository used when `model_path` is not set
    #[serde(default)]
    pub hf_repo: Option<String>,

    #[serde(default = "default_revision")]
    pub hf_revision: String,

    /// Directory with `labels.txt` and `d_tags.txt`; defaults to `<model>/vocabulary`
    #[serde(default)]
    pub vocab_path: Option<PathBuf>,

    /// Verb form dictionary used by `$TRANSFORM_VERB_*` labels
    #[serde(default)]
    pub verb_form_vocab_path: Option<PathBuf>,

    /// Device to run on (cpu, cuda, metal)
    #[serde(default = "default_device")]
    pub device: String,
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self {
            model_path: None,
            hf_repo: None,
            hf_revision: default_revision(),
            vocab_path: None,
            verb_form_vocab_path: None,
            device: default_device(),
        }
    }
}

/// Decode parameters, adjustable per request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecodeParams {
    /// Maximum number of tokens tagged per sentence
    #[serde(default = "default_max_len")]
    pub max_len: usize,

    /// Sentences shorter than this are returned untouched
    #[serde(default = "default_min_len")]
    pub min_len: usize,

    /// Lowercase tokens before tagging
    #[serde(default)]
    pub lowercase_tokens: bool,

    /// Maximum number of correction passes
    #[serde(default = "default_iterations")]
    pub iterations: usize,

    /// Encode the `$START` marker as a dedicated vocabulary token
    #[serde(default)]
    pub special_tokens_fix: bool,

    /// Edits and sentences below this probability are skipped
    #[serde(default)]
    pub min_error_probability: f32,

    /// Bias added to the `$KEEP` probability
    #[serde(default)]
    pub confidence: f32,

    /// Bias added to the `$DELETE` probability
    #[serde(default)]
    pub del_confidence: f32,
}

impl Default for DecodeParams {
    fn default() -> Self {
        Self {
            max_len: default_max_len(),
            min_len: default_min_len(),
            lowercase_tokens: false,
            iterations: default_iterations(),
            special_tokens_fix: false,
            min_error_probability: 0.0,
            confidence: 0.0,
            del_confidence: 0.0,
        }
    }
}

impl DecodeParams {
    /// Apply request overrides.
    ///
    /// A key is honoured only when its value has the expected JSON type:
    /// non-negative integers for lengths and iterations, booleans for flags,
    /// any number for `min_error_probability`. Anything else is ignored.
    pub fn with_overrides(mut self, overrides: &Map<String, Value>) -> Self {
        for (key, value) in overrides {
            let applied = match key.as_str() {
                "max_len" => set_usize(&mut self.max_len, value),
                "min_len" => set_usize(&mut self.min_len, value),
                "iterations" => set_usize(&mut self.iterations, value),
                "lowercase_tokens" => set_bool(&mut self.lowercase_tokens, value),
                "special_tokens_fix" => set_bool(&mut self.special_tokens_fix, value),
                "min_error_probability" => match value.as_f64() {
                    Some(p) => {
                        self.min_error_probability = p as f32;
                        true
                    }
                    None => false,
                },
                _ => false,
            };

            if !applied {
                debug!(key = %key, value = %value, "Ignoring model_params override");
            }
        }
        self
    }
}

fn set_usize(slot: &mut usize, value: &Value) -> bool {
    match value.as_u64() {
        Some(n) => {
            *slot = n as usize;
            true
        }
        None => false,
    }
}

fn set_bool(slot: &mut bool, value: &Value) -> bool {
    match value.as_bool() {
        Some(b) => {
            *slot = b;
            true
        }
        None => false,
    }
}

/// Everything needed to serve one request
#[derive(Debug, Clone, PartialEq)]
pub struct RequestPlan {
    pub input_text: Vec<String>,
    pub batch_size: i64,
    pub to_normalize: bool,
    pub decode: DecodeParams,
}

impl RequestPlan {
    /// Merge a request with the params file defaults
    pub fn resolve(request: GectorRequest, defaults: &ParamsFile) -> Self {
        let batch_size = request.batch_size.unwrap_or(defaults.batch_size);
        let decode = defaults
            .model_params
            .decode
            .clone()
            .with_overrides(&request.model_params);

        Self {
            input_text: request.input_text,
            batch_size,
            to_normalize: request.to_normalize.unwrap_or(defaults.to_normalize),
            decode,
        }
    }
}

fn default_batch_size() -> i64 {
    32
}

fn default_true() -> bool {
    true
}

fn default_revision() -> String {
    "main".to_string()
}

fn default_device() -> String {
    "cpu".to_string()
}

fn default_max_len() -> usize {
    50
}

fn default_min_len() -> usize {
    3
}

fn default_iterations() -> usize {
    5
}
