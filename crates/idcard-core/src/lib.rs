//! Core library for Chinese national ID card OCR text.
//!
//! This crate provides:
//! - Keyword normalization for common OCR misreads of card labels
//! - Identity number recovery, validation and MOD 11-2 check digit
//! - Sex, birth date and age derived from the identity number
//! - Keyword-anchored extraction of name, ethnicity, address, issuing
//!   authority and validity period, with per-field cleanup and status
//! - Image grouping and sidecar OCR output loading for batch runs

pub mod error;
pub mod idcard;
pub mod models;
pub mod ocr;

pub use error::{IdCardError, Result};
pub use idcard::{IdCardExtractor, IdCardParser, ParseResult};
pub use models::config::{BatchConfig, ExportConfig, ExtractionConfig, IdCardConfig};
pub use models::record::{Field, FieldId, FieldStatus, IdCardRecord, RecordStatus};
pub use ocr::{OcrEngine, OcrResult, SidecarTextEngine, TextRegion};
