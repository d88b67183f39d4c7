//! Text preprocessing and keyword normalization.

use super::patterns::PatternSet;

/// Collapse every whitespace run (including line breaks) into one space
/// and trim both ends.
pub fn preprocess(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove all whitespace.
pub fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

impl PatternSet {
    /// Rewrite known OCR misreads of section labels into their canonical
    /// keyword. Purely textual and idempotent.
    pub fn normalize_keywords(&self, text: &str) -> String {
        self.corrections
            .iter()
            .fold(text.to_string(), |acc, (misread, canonical)| {
                if acc.contains(misread) {
                    acc.replace(misread, canonical)
                } else {
                    acc
                }
            })
    }
}
