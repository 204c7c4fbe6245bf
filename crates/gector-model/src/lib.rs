//! GECToR Model
//!
//! Grammatical error correction by iterative sequence tagging.
//!
//! A tagger predicts one correction label per token (`$KEEP`, `$DELETE`,
//! `$APPEND_x`, `$REPLACE_x`, `$TRANSFORM_*`, `$MERGE_*`). The corrector
//! applies the predicted edits and re-tags the result until the sentence
//! settles or the iteration budget runs out.
//!
//! The Candle BERT tagger and the model loader sit behind the `ml-models`
//! feature (on by default).

#[cfg(feature = "ml-models")]
pub mod bert;
pub mod gec_model;
#[cfg(feature = "ml-models")]
pub mod model_loader;
pub mod tagger;
pub mod transform;
pub mod vocab;

#[cfg(feature = "ml-models")]
pub use bert::BertTagger;
pub use gec_model::GecBertModel;
#[cfg(feature = "ml-models")]
pub use model_loader::{create_device, load_gector, ModelFiles};
pub use tagger::{TagOutput, Tagger};
pub use transform::{apply_edits, token_action, Edit};
pub use vocab::{LabelVocabulary, VerbFormDictionary, START_TOKEN};
