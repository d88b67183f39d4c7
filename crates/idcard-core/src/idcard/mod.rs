//! ID card field extraction module.

mod parser;
pub mod rules;

pub use parser::{IdCardParser, ParseResult};

use crate::models::record::IdCardRecord;
use crate::ocr::OcrResult;

/// Trait for ID card field extractors.
///
/// Extraction is total: degraded input yields a record whose fields are
/// mostly `NotFound` or `LowQuality`, never an error.
pub trait IdCardExtractor {
    /// Extract a record from an OCR result.
    fn extract(&self, ocr_result: &OcrResult) -> IdCardRecord;

    /// Extract a record from plain text.
    fn extract_from_text(&self, text: &str) -> IdCardRecord;
}
