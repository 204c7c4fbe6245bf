//! Detokenization of corrected output

use crate::error::{Error, Result};
use regex::Regex;

/// Turns a space-joined token line back into ordinary text
pub struct Normalizer {
    whitespace: Regex,
    before_closing: Regex,
    after_opening: Regex,
    clitics: Regex,
}

impl Normalizer {
    /// Create a new normalizer
    pub fn new() -> Result<Self> {
        Ok(Self {
            whitespace: Regex::new(r"\s+")
                .map_err(|e| Error::internal(format!("Failed to compile whitespace regex: {}", e)))?,
            before_closing: Regex::new(r"\s+([.,!?;:%)\]}])")
                .map_err(|e| Error::internal(format!("Failed to compile punctuation regex: {}", e)))?,
            after_opening: Regex::new(r"([(\[{$])\s+")
                .map_err(|e| Error::internal(format!("Failed to compile bracket regex: {}", e)))?,
            clitics: Regex::new(r"(?i)\s+(n't|'s|'re|'ve|'ll|'d|'m)\b")
                .map_err(|e| Error::internal(format!("Failed to compile clitic regex: {}", e)))?,
        })
    }

    /// Normalize a single line
    pub fn normalize(&self, line: &str) -> String {
        let text = self.whitespace.replace_all(line.trim(), " ");
        let text = self.before_closing.replace_all(&text, "${1}");
        let text = self.after_opening.replace_all(&text, "${1}");
        let text = self.clitics.replace_all(&text, "${1}");
        text.into_owned()
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new().expect("Failed to create normalizer")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_punctuation_spacing() {
        let n = Normalizer::new().unwrap();
        assert_eq!(n.normalize("Hello , world !"), "Hello, world!");
        assert_eq!(n.normalize("Wait ... what ?"), "Wait... what?");
        assert_eq!(n.normalize("It costs $ 5 ( about 10 % )"), "It costs $5 (about 10%)");
    }

    #[test]
    fn test_clitics() {
        let n = Normalizer::new().unwrap();
        assert_eq!(n.normalize("I do n't think she 's here"), "I don't think she's here");
        assert_eq!(n.normalize("We 'll see , I 'm sure"), "We'll see, I'm sure");
        assert_eq!(n.normalize("They DO N'T care"), "They DON'T care");
    }

    #[test]
    fn test_whitespace_collapse() {
        let n = Normalizer::new().unwrap();
        assert_eq!(n.normalize("  too   many\tspaces .  "), "too many spaces.");
        assert_eq!(n.normalize(""), "");
    }

    #[test]
    fn test_leading_quote_untouched() {
        let n = Normalizer::new().unwrap();
        assert_eq!(n.normalize("she said 'sorry'"), "she said 'sorry'");
    }
}
