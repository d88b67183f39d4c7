//! ID card parser: normalization, identity number recovery, anchored
//! field extraction, cleanup and classification, in that order.

use std::sync::Arc;
use std::time::Instant;

use chrono::{Local, NaiveDate};
use tracing::{debug, info};

use crate::models::config::ExtractionConfig;
use crate::models::record::{Field, FieldId, FieldStatus, IdCardRecord};
use crate::ocr::OcrResult;

use super::rules::{
    clean_coarse, post_process, preprocess, validate_checksum, validate_id_number,
    DerivedFields, FieldExtractor, FieldKind, IdNumberExtractor, PatternSet,
};
use super::IdCardExtractor;

/// Result of parsing one card.
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Extracted record.
    pub record: IdCardRecord,
    /// Notes about missing, corrected or doubtful fields.
    pub warnings: Vec<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Rule-based ID card parser.
///
/// Holds only immutable state, so one parser can serve any number of
/// threads.
#[derive(Debug, Clone)]
pub struct IdCardParser {
    patterns: Arc<PatternSet>,
    /// Whether the check digit must match for the number to be valid.
    verify_checksum: bool,
    /// Whether a trailing `x` is upper-cased.
    uppercase_check_digit: bool,
}

impl IdCardParser {
    /// Create a new parser with default settings.
    pub fn new() -> Self {
        let defaults = ExtractionConfig::default();
        Self {
            patterns: Arc::new(PatternSet::new()),
            verify_checksum: defaults.verify_checksum,
            uppercase_check_digit: defaults.uppercase_check_digit,
        }
    }

    /// Apply extraction settings from configuration.
    pub fn with_config(mut self, config: &ExtractionConfig) -> Self {
        self.verify_checksum = config.verify_checksum;
        self.uppercase_check_digit = config.uppercase_check_digit;
        self
    }

    /// Set check digit verification.
    pub fn with_checksum_verification(mut self, verify: bool) -> Self {
        self.verify_checksum = verify;
        self
    }

    /// Share an already built pattern set.
    pub fn with_patterns(mut self, patterns: Arc<PatternSet>) -> Self {
        self.patterns = patterns;
        self
    }

    pub fn patterns(&self) -> &Arc<PatternSet> {
        &self.patterns
    }

    /// Parse the OCR text of one card, computing age as of today.
    pub fn parse(&self, text: &str) -> ParseResult {
        self.parse_on(text, Local::now().date_naive())
    }

    /// Parse the OCR text of one card, computing age as of `today`.
    pub fn parse_on(&self, text: &str, today: NaiveDate) -> ParseResult {
        let start = Instant::now();
        let mut warnings = Vec::new();

        info!("Parsing ID card from {} characters of text", text.chars().count());

        let mut record = IdCardRecord::new(text);

        let normalized = self.patterns.normalize_keywords(&preprocess(text));

        self.extract_identity(&normalized, today, &mut record, &mut warnings);

        for kind in FieldKind::ANCHORED {
            let raw = self.patterns.extract_field(&normalized, kind);
            let value = post_process(clean_coarse(raw.as_deref(), kind), kind);
            let status = self.patterns.classify(value.as_deref(), kind);

            debug!("{:?}: {:?} ({})", kind, value, status);
            *record.field_mut(record_field(kind)) = Field::from_option(value, status);
        }

        for (id, field) in record.fields() {
            match field.status {
                FieldStatus::NotFound => warnings.push(format!("{} not found", id)),
                FieldStatus::LowQuality => warnings.push(format!("{} is low quality", id)),
                _ => {}
            }
        }

        debug!(
            "Extracted {} of {} fields",
            record.fields().filter(|(_, f)| f.is_present()).count(),
            FieldId::ALL.len()
        );

        ParseResult {
            record,
            warnings,
            processing_time_ms: start.elapsed().as_millis() as u64,
        }
    }

    fn is_valid_id(&self, id: &str) -> bool {
        validate_id_number(id) && (!self.verify_checksum || validate_checksum(id))
    }

    /// Identity number, then sex, birth date and age: derived from the
    /// number when it is valid, otherwise read directly from the text.
    fn extract_identity(
        &self,
        text: &str,
        today: NaiveDate,
        record: &mut IdCardRecord,
        warnings: &mut Vec<String>,
    ) {
        let candidate = IdNumberExtractor::new(&self.patterns)
            .with_uppercase_check_digit(self.uppercase_check_digit)
            .extract(text);

        let valid = candidate.as_ref().is_some_and(|m| self.is_valid_id(&m.value));

        record.id_number = match candidate {
            Some(m) => {
                if let Some((start, end)) = m.position {
                    debug!("Identity number found at {}..{} of compacted text", start, end);
                }
                if m.is_corrected() {
                    warnings.push(format!(
                        "id_number corrected from {} (confidence {:.2})",
                        m.source, m.confidence
                    ));
                }
                let status = if valid {
                    FieldStatus::Success
                } else {
                    FieldStatus::LowQuality
                };
                Field::found(m.value, status)
            }
            None => Field::not_found(),
        };

        if valid {
            debug!("Deriving sex, birth date and age from identity number");
            let derived =
                DerivedFields::from_id_number(record.id_number.value().unwrap_or_default(), today);

            record.sex = Field::from_option(
                derived.sex.map(|s| s.as_str().to_string()),
                FieldStatus::Success,
            );
            record.birth_date = Field::from_option(derived.birth_date, FieldStatus::Success);
            record.age = Field::from_option(derived.age.map(|a| a.to_string()), FieldStatus::Success);
        } else {
            debug!("Identity number unusable, reading sex and birth date from text");
            record.sex = self.direct_field(self.patterns.extract_direct_sex(text), FieldKind::Sex);
            record.birth_date = self.direct_field(
                self.patterns.extract_direct_birth_date(text),
                FieldKind::BirthDate,
            );
            // Never inferred from a free-text birth date
            record.age = Field::not_found();
        }
    }

    fn direct_field(&self, raw: Option<String>, kind: FieldKind) -> Field {
        let value = post_process(clean_coarse(raw.as_deref(), kind), kind);
        let status = self.patterns.classify(value.as_deref(), kind);
        Field::from_option(value, status)
    }
}

impl Default for IdCardParser {
    fn default() -> Self {
        Self::new()
    }
}

impl IdCardExtractor for IdCardParser {
    fn extract(&self, ocr_result: &OcrResult) -> IdCardRecord {
        self.parse(&ocr_result.text).record
    }

    fn extract_from_text(&self, text: &str) -> IdCardRecord {
        self.parse(text).record
    }
}

fn record_field(kind: FieldKind) -> FieldId {
    match kind {
        FieldKind::Name => FieldId::Name,
        FieldKind::Sex => FieldId::Sex,
        FieldKind::Ethnicity => FieldId::Ethnicity,
        FieldKind::Address => FieldId::Address,
        FieldKind::IssuingAuthority => FieldId::IssuingAuthority,
        FieldKind::ValidityPeriod => FieldId::ValidityPeriod,
        FieldKind::BirthDate => FieldId::BirthDate,
    }
}
