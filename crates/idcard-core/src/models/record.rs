//! ID card record model and its declarative field registry.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::idcard::rules::derived::birth_date_iso;
use crate::models::config::ExportConfig;

/// Header of the caller-assigned sequence number column.
pub const SEQUENCE_HEADER: &str = "序号";

/// Header of the raw OCR text column.
pub const RAW_TEXT_HEADER: &str = "原始OCR";

/// Confidence/quality classification attached to one extracted value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStatus {
    /// Value present and passes its validity check.
    Success,
    /// Value present but implausible, or recovered via a fallback path.
    LowQuality,
    /// No match at all.
    #[default]
    NotFound,
    /// Reserved for manual review; never produced by the parser.
    Partial,
    /// Reserved for manual review; never produced by the parser.
    Failed,
}

impl FieldStatus {
    /// Whether a display should highlight the value for review.
    pub fn is_flagged(&self) -> bool {
        matches!(self, Self::LowQuality | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::LowQuality => "low_quality",
            Self::NotFound => "not_found",
            Self::Partial => "partial",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for FieldStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One extracted value paired with its status.
///
/// An absent value always carries [`FieldStatus::NotFound`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub status: FieldStatus,
}

impl Field {
    /// A present value with the given status. Empty values become `NotFound`.
    pub fn found(value: impl Into<String>, status: FieldStatus) -> Self {
        let value = value.into();
        if value.is_empty() {
            return Self::not_found();
        }
        Self {
            value: Some(value),
            status,
        }
    }

    pub fn not_found() -> Self {
        Self {
            value: None,
            status: FieldStatus::NotFound,
        }
    }

    /// Build from an optional value; absent or empty maps to `NotFound`.
    pub fn from_option(value: Option<String>, status: FieldStatus) -> Self {
        match value {
            Some(v) => Self::found(v, status),
            None => Self::not_found(),
        }
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }
}

/// Identifies one field of an [`IdCardRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldId {
    Name,
    Sex,
    Age,
    BirthDate,
    Ethnicity,
    IdNumber,
    Address,
    IssuingAuthority,
    ValidityPeriod,
}

impl FieldId {
    /// All fields in display order.
    pub const ALL: [FieldId; 9] = [
        FieldId::Name,
        FieldId::Sex,
        FieldId::Age,
        FieldId::BirthDate,
        FieldId::Ethnicity,
        FieldId::IdNumber,
        FieldId::Address,
        FieldId::IssuingAuthority,
        FieldId::ValidityPeriod,
    ];

    /// Stable snake_case key, as used in JSON and configuration.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Sex => "sex",
            Self::Age => "age",
            Self::BirthDate => "birth_date",
            Self::Ethnicity => "ethnicity",
            Self::IdNumber => "id_number",
            Self::Address => "address",
            Self::IssuingAuthority => "issuing_authority",
            Self::ValidityPeriod => "validity_period",
        }
    }

    /// Default column header.
    pub fn header(&self) -> &'static str {
        match self {
            Self::Name => "姓名",
            Self::Sex => "性别",
            Self::Age => "年龄",
            Self::BirthDate => "出生日期",
            Self::Ethnicity => "民族",
            Self::IdNumber => "身份证号码",
            Self::Address => "住址",
            Self::IssuingAuthority => "签发机关",
            Self::ValidityPeriod => "有效期限",
        }
    }

    /// Look a field up by its key.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Record-level summary of how much of a card was recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// Name, identity number, address, issuing authority and validity
    /// period are all present.
    Complete,
    /// The identity number is present but something else is missing.
    Partial,
    /// Not even the identity number was recovered.
    Failed,
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Complete => write!(f, "complete"),
            Self::Partial => write!(f, "partial"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Structured result of parsing the OCR text of one physical card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdCardRecord {
    /// Position in a batch, assigned by the caller (0 until assigned).
    pub sequence: u32,
    pub name: Field,
    pub sex: Field,
    pub age: Field,
    pub birth_date: Field,
    pub ethnicity: Field,
    pub id_number: Field,
    pub address: Field,
    pub issuing_authority: Field,
    pub validity_period: Field,
    /// OCR text exactly as received.
    pub raw_text: String,
}

impl IdCardRecord {
    /// An empty record holding only the raw text.
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            ..Self::default()
        }
    }

    pub fn with_sequence(mut self, sequence: u32) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn field(&self, id: FieldId) -> &Field {
        match id {
            FieldId::Name => &self.name,
            FieldId::Sex => &self.sex,
            FieldId::Age => &self.age,
            FieldId::BirthDate => &self.birth_date,
            FieldId::Ethnicity => &self.ethnicity,
            FieldId::IdNumber => &self.id_number,
            FieldId::Address => &self.address,
            FieldId::IssuingAuthority => &self.issuing_authority,
            FieldId::ValidityPeriod => &self.validity_period,
        }
    }

    pub fn field_mut(&mut self, id: FieldId) -> &mut Field {
        match id {
            FieldId::Name => &mut self.name,
            FieldId::Sex => &mut self.sex,
            FieldId::Age => &mut self.age,
            FieldId::BirthDate => &mut self.birth_date,
            FieldId::Ethnicity => &mut self.ethnicity,
            FieldId::IdNumber => &mut self.id_number,
            FieldId::Address => &mut self.address,
            FieldId::IssuingAuthority => &mut self.issuing_authority,
            FieldId::ValidityPeriod => &mut self.validity_period,
        }
    }

    /// Iterate over all fields in display order.
    pub fn fields(&self) -> impl Iterator<Item = (FieldId, &Field)> {
        FieldId::ALL.into_iter().map(move |id| (id, self.field(id)))
    }

    /// Apply a manual correction. The field becomes `Success`, or
    /// `NotFound` when the new value is blank.
    pub fn correct(&mut self, id: FieldId, value: impl Into<String>) {
        let value = value.into();
        *self.field_mut(id) = Field::found(value.trim(), FieldStatus::Success);
    }

    /// Fields that should be reviewed by an operator.
    pub fn flagged_fields(&self) -> Vec<FieldId> {
        self.fields()
            .filter(|(_, f)| f.status.is_flagged())
            .map(|(id, _)| id)
            .collect()
    }

    pub fn status(&self) -> RecordStatus {
        let required = [
            &self.name,
            &self.id_number,
            &self.address,
            &self.issuing_authority,
            &self.validity_period,
        ];

        if required.iter().all(|f| f.is_present()) {
            RecordStatus::Complete
        } else if self.id_number.is_present() {
            RecordStatus::Partial
        } else {
            RecordStatus::Failed
        }
    }

    /// Column headers for a spreadsheet export.
    pub fn export_headers(export: &ExportConfig) -> Vec<String> {
        let mut headers = vec![SEQUENCE_HEADER.to_string()];
        headers.extend(export.columns.iter().map(|id| export.header_for(*id)));
        if export.include_raw_text {
            headers.push(RAW_TEXT_HEADER.to_string());
        }
        headers
    }

    /// Ordered (header, value) pairs for a spreadsheet export.
    pub fn export_row(&self, export: &ExportConfig) -> Vec<(String, String)> {
        let mut row = vec![(SEQUENCE_HEADER.to_string(), self.sequence.to_string())];

        for id in &export.columns {
            let raw = self.field(*id).value().unwrap_or_default();
            let value = match id {
                FieldId::BirthDate if export.iso_dates => {
                    birth_date_iso(raw).unwrap_or_else(|| raw.to_string())
                }
                _ => raw.to_string(),
            };
            row.push((export.header_for(*id), value));
        }

        if export.include_raw_text {
            row.push((RAW_TEXT_HEADER.to_string(), self.raw_text.clone()));
        }

        row
    }
}
