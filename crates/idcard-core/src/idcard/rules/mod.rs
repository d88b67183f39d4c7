//! Rule-based field extraction for national ID card text.

pub mod cleaning;
pub mod derived;
pub mod fields;
pub mod id_number;
pub mod normalize;
pub mod patterns;

pub use cleaning::{clean_coarse, is_han, post_process};
pub use derived::{birth_date_iso, sex_from_id, DerivedFields, Sex};
pub use id_number::{
    correct_confusions, extract_id_number, validate_checksum, validate_id_number,
    IdNumberExtractor,
};
pub use normalize::{preprocess, strip_whitespace};
pub use patterns::{FieldKind, PatternSet, ALL_KEYWORDS, KEYWORD_CORRECTIONS};

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// Extraction context with confidence scores.
#[derive(Debug, Clone)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
    /// Position in the searched text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, confidence: f32, source: impl Into<String>) -> Self {
        Self {
            value,
            confidence,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }

    /// Whether the value differs from the matched source text.
    pub fn is_corrected(&self) -> bool
    where
        T: AsRef<str>,
    {
        self.value.as_ref() != self.source
    }
}
