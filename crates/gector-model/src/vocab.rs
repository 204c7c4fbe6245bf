//! Output vocabularies: correction labels, detection tags and verb forms

use gector_core::{Error, Result};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

pub const KEEP: &str = "$KEEP";
pub const DELETE: &str = "$DELETE";
pub const UNKNOWN: &str = "@@UNKNOWN@@";
pub const PADDING: &str = "@@PADDING@@";
pub const INCORRECT: &str = "INCORRECT";

/// Marker prepended to every sentence so edits can target its start
pub const START_TOKEN: &str = "$START";

/// Correction labels and detection tags, indexed by line number
#[derive(Debug, Clone)]
pub struct LabelVocabulary {
    labels: Vec<String>,
    detect_tags: Vec<String>,
    delete_index: Option<usize>,
    incorrect_index: usize,
}

impl LabelVocabulary {
    /// Load `labels.txt` and `d_tags.txt` from a vocabulary directory
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let labels = read_lines(&dir.join("labels.txt"))?;
        let detect_tags = read_lines(&dir.join("d_tags.txt"))?;

        debug!(
            labels = labels.len(),
            detect_tags = detect_tags.len(),
            dir = %dir.display(),
            "Loaded label vocabulary"
        );

        Self::new(labels, detect_tags)
    }

    /// Build from in-memory label lists
    pub fn new(labels: Vec<String>, detect_tags: Vec<String>) -> Result<Self> {
        if labels.first().map(String::as_str) != Some(KEEP) {
            return Err(Error::config(format!(
                "label vocabulary must start with {}, found {:?}",
                KEEP,
                labels.first()
            )));
        }

        let incorrect_index = detect_tags
            .iter()
            .position(|t| t == INCORRECT)
            .ok_or_else(|| Error::config(format!("detection tags lack {}", INCORRECT)))?;

        let delete_index = labels.iter().position(|l| l == DELETE);

        Ok(Self {
            labels,
            detect_tags,
            delete_index,
            incorrect_index,
        })
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn num_labels(&self) -> usize {
        self.labels.len()
    }

    pub fn num_detect_tags(&self) -> usize {
        self.detect_tags.len()
    }

    /// Index of `$KEEP`, always zero
    pub fn keep_index(&self) -> usize {
        0
    }

    pub fn delete_index(&self) -> Option<usize> {
        self.delete_index
    }

    /// Index of `INCORRECT` among the detection tags
    pub fn incorrect_index(&self) -> usize {
        self.incorrect_index
    }
}

/// Maps `word_FROM_TO` keys to inflected verb forms
#[derive(Debug, Clone, Default)]
pub struct VerbFormDictionary {
    decode: HashMap<String, String>,
}

impl VerbFormDictionary {
    /// Load a `verb-form-vocab.txt` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let lines = read_lines(path)?;
        let dict = Self::from_lines(lines.iter().map(String::as_str));
        debug!(entries = dict.len(), path = %path.display(), "Loaded verb form dictionary");
        Ok(dict)
    }

    /// Parse lines of the form `go_went:VB_VBD`. Malformed lines are skipped.
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let mut decode = HashMap::new();

        for line in lines {
            let Some((words, tags)) = line.trim().split_once(':') else {
                continue;
            };
            let (Some((source, target)), Some((from, to))) =
                (words.split_once('_'), tags.split_once('_'))
            else {
                continue;
            };

            decode
                .entry(format!("{}_{}_{}", source, from, to))
                .or_insert_with(|| target.to_string());
        }

        Self { decode }
    }

    /// Look up the form of `word` for a `FROM_TO` tag pair
    pub fn decode(&self, word: &str, tags: &str) -> Option<&str> {
        self.decode
            .get(&format!("{}_{}", word, tags))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.decode.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decode.is_empty()
    }
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::config(format!("Failed to read {}: {}", path.display(), e)))?;

    Ok(content
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}
