//! GECToR Core
//!
//! Core types, traits, and utilities shared across the GECToR serving crates.
//!
//! This crate provides:
//! - Wire types for the `/gector` request and response envelope
//! - The params file loader and per-request override rules
//! - The `Corrector` trait that correction models implement
//! - The batching loop that feeds sentences to a corrector
//! - Text normalization for detokenized output
//! - Error types and result handling

pub mod corrector;
pub mod error;
pub mod normalize;
pub mod params;
pub mod predict;
pub mod types;

pub use corrector::{BatchOutcome, Corrector, SentenceHistory};
pub use error::{Error, Result};
pub use normalize::Normalizer;
pub use params::{DecodeParams, ModelParams, ModelSpec, ParamsFile, RequestPlan};
pub use predict::{batches, predict, Prediction};
pub use types::{parse_request, CorrectionResult, ErrorBody, GectorRequest, GectorResponse, Status};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::corrector::{BatchOutcome, Corrector, SentenceHistory};
    pub use crate::error::{Error, Result};
    pub use crate::params::{DecodeParams, ParamsFile};
    pub use crate::types::{GectorRequest, GectorResponse};
}
