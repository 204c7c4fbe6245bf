//! Locating and loading GECToR model files

use crate::bert::BertTagger;
use crate::gec_model::GecBertModel;
use crate::vocab::{LabelVocabulary, VerbFormDictionary};
use candle_core::Device;
use gector_core::{Error, ModelSpec, Result};
use hf_hub::{api::sync::Api, Repo, RepoType};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const CONFIG_FILE: &str = "config.json";
const TOKENIZER_FILE: &str = "tokenizer.json";
const WEIGHTS_FILE: &str = "model.safetensors";
const VOCAB_DIR: &str = "vocabulary";

/// Paths of everything a GECToR model needs
#[derive(Debug, Clone, PartialEq)]
pub struct ModelFiles {
    pub config: PathBuf,
    pub tokenizer: PathBuf,
    pub weights: PathBuf,
    pub vocab_dir: PathBuf,
}

impl ModelFiles {
    /// Resolve model files from a local directory or the Hugging Face Hub
    pub fn resolve(spec: &ModelSpec) -> Result<Self> {
        match (&spec.model_path, &spec.hf_repo) {
            (Some(path), _) => Self::from_dir(path, spec.vocab_path.as_deref()),
            (None, Some(repo)) => Self::from_hub(repo, &spec.hf_revision, spec.vocab_path.as_deref()),
            (None, None) => Err(Error::config(
                "model_params must set either model_path or hf_repo",
            )),
        }
    }

    /// Files laid out in a single local directory
    pub fn from_dir(dir: &Path, vocab_dir: Option<&Path>) -> Result<Self> {
        if !dir.is_dir() {
            return Err(Error::config(format!(
                "Model directory not found: {}",
                dir.display()
            )));
        }

        let files = Self {
            config: dir.join(CONFIG_FILE),
            tokenizer: dir.join(TOKENIZER_FILE),
            weights: dir.join(WEIGHTS_FILE),
            vocab_dir: vocab_dir
                .map(Path::to_path_buf)
                .unwrap_or_else(|| dir.join(VOCAB_DIR)),
        };

        for path in [&files.config, &files.tokenizer, &files.weights] {
            if !path.exists() {
                return Err(Error::config(format!(
                    "Model file not found: {}",
                    path.display()
                )));
            }
        }

        Ok(files)
    }

    /// Download (or reuse cached) files from a Hugging Face repository
    fn from_hub(repo_id: &str, revision: &str, vocab_dir: Option<&Path>) -> Result<Self> {
        info!("Fetching model from Hugging Face: {} @ {}", repo_id, revision);

        let api = Api::new()
            .map_err(|e| Error::config(format!("Failed to initialize HF API: {}", e)))?;
        let repo = api.repo(Repo::with_revision(
            repo_id.to_string(),
            RepoType::Model,
            revision.to_string(),
        ));

        let fetch = |filename: &str| {
            repo.get(filename).map_err(|e| {
                Error::config(format!("Failed to download {} from HF: {}", filename, e))
            })
        };

        let config = fetch(CONFIG_FILE)?;
        let tokenizer = fetch(TOKENIZER_FILE)?;
        let weights = fetch(WEIGHTS_FILE)?;

        let vocab_dir = match vocab_dir {
            Some(dir) => dir.to_path_buf(),
            None => {
                let labels = fetch(format!("{}/labels.txt", VOCAB_DIR).as_str())?;
                fetch(format!("{}/d_tags.txt", VOCAB_DIR).as_str())?;
                labels
                    .parent()
                    .map(Path::to_path_buf)
                    .ok_or_else(|| Error::config("Invalid HF cache path for vocabulary"))?
            }
        };

        Ok(Self {
            config,
            tokenizer,
            weights,
            vocab_dir,
        })
    }
}

/// Create a Candle device from its configured name
pub fn create_device(name: &str) -> Result<Device> {
    match name.to_ascii_lowercase().as_str() {
        "cpu" => Ok(Device::Cpu),
        "cuda" => Device::new_cuda(0)
            .map_err(|e| Error::model(format!("Failed to create CUDA device: {}", e))),
        "metal" | "mps" => Device::new_metal(0)
            .map_err(|e| Error::model(format!("Failed to create Metal device: {}", e))),
        other => Err(Error::config(format!("Unknown device: {}", other))),
    }
}

/// Load the full corrector described by `spec`
pub fn load_gector(spec: &ModelSpec) -> Result<GecBertModel<BertTagger>> {
    let files = ModelFiles::resolve(spec)?;
    let device = create_device(&spec.device)?;

    let vocab = LabelVocabulary::from_dir(&files.vocab_dir)?;
    let verbs = match &spec.verb_form_vocab_path {
        Some(path) => VerbFormDictionary::from_file(path)?,
        None => {
            warn!("No verb_form_vocab_path configured; $TRANSFORM_VERB_* edits will be skipped");
            VerbFormDictionary::default()
        }
    };

    let tagger = BertTagger::load(&files, &vocab, device)?;
    info!(
        "Loaded GECToR model from {} ({} labels)",
        files.weights.display(),
        vocab.num_labels()
    );

    Ok(GecBertModel::new(tagger, vocab, verbs))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch_model_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for file in [CONFIG_FILE, TOKENIZER_FILE, WEIGHTS_FILE] {
            std::fs::write(dir.path().join(file), b"{}").unwrap();
        }
        dir
    }

    #[test]
    fn test_resolve_local_dir() {
        let dir = touch_model_dir();
        let spec = ModelSpec {
            model_path: Some(dir.path().to_path_buf()),
            ..Default::default()
        };

        let files = ModelFiles::resolve(&spec).unwrap();
        assert_eq!(files.weights, dir.path().join(WEIGHTS_FILE));
        assert_eq!(files.vocab_dir, dir.path().join(VOCAB_DIR));
    }

    #[test]
    fn test_explicit_vocab_dir() {
        let dir = touch_model_dir();
        let files = ModelFiles::from_dir(dir.path(), Some(Path::new("/data/vocab"))).unwrap();
        assert_eq!(files.vocab_dir, PathBuf::from("/data/vocab"));
    }

    #[test]
    fn test_missing_weights() {
        let dir = touch_model_dir();
        std::fs::remove_file(dir.path().join(WEIGHTS_FILE)).unwrap();

        let err = ModelFiles::from_dir(dir.path(), None).unwrap_err();
        assert!(err.to_string().contains(WEIGHTS_FILE));
    }

    #[test]
    fn test_missing_source() {
        let err = ModelFiles::resolve(&ModelSpec::default()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let spec = ModelSpec {
            model_path: Some(PathBuf::from("/nonexistent/gector")),
            ..Default::default()
        };
        assert!(ModelFiles::resolve(&spec).is_err());
    }

    #[test]
    fn test_create_device() {
        assert!(matches!(create_device("CPU").unwrap(), Device::Cpu));
        assert!(matches!(create_device("tpu"), Err(Error::Config(_))));
    }
}
