//! Configuration structures for the extraction pipeline and its glue.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::models::record::FieldId;

/// Main configuration for idcard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IdCardConfig {
    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Spreadsheet export configuration.
    pub export: ExportConfig,

    /// Batch processing configuration.
    pub batch: BatchConfig,
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Also require the MOD 11-2 check digit to match before an identity
    /// number counts as valid.
    pub verify_checksum: bool,

    /// Upper-case a trailing `x` check character.
    pub uppercase_check_digit: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            verify_checksum: false,
            uppercase_check_digit: true,
        }
    }
}

/// Spreadsheet export configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Exported field columns, in order. The sequence column always comes first.
    pub columns: Vec<FieldId>,

    /// Append the raw OCR text as the last column.
    pub include_raw_text: bool,

    /// Custom column headers keyed by field key (e.g. `"id_number"`).
    pub headers: BTreeMap<String, String>,

    /// Write birth dates as `YYYY-MM-DD` instead of `YYYY年MM月DD日`.
    pub iso_dates: bool,

    /// Prefix CSV output with a UTF-8 byte order mark.
    pub utf8_bom: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            columns: FieldId::ALL.to_vec(),
            include_raw_text: false,
            headers: BTreeMap::new(),
            iso_dates: false,
            utf8_bom: true,
        }
    }
}

impl ExportConfig {
    /// Column header for a field, honouring custom names.
    pub fn header_for(&self, id: FieldId) -> String {
        self.headers
            .get(id.key())
            .cloned()
            .unwrap_or_else(|| id.header().to_string())
    }
}

/// Batch processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Number of cards parsed concurrently.
    pub jobs: usize,

    /// File extensions picked up by the batch command.
    pub extensions: Vec<String>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            jobs: 4,
            extensions: ["jpg", "jpeg", "png", "bmp", "tif", "tiff", "txt"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl BatchConfig {
    /// Whether a path has one of the configured extensions.
    pub fn accepts(&self, path: &Path) -> bool {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext))
    }
}

impl IdCardConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.batch.jobs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "batch.jobs".to_string(),
                reason: "must be at least 1".to_string(),
            }
            .into());
        }

        for key in self.export.headers.keys() {
            if FieldId::from_key(key).is_none() {
                return Err(ConfigError::InvalidValue {
                    key: format!("export.headers.{key}"),
                    reason: "unknown field".to_string(),
                }
                .into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IdCardError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = IdCardConfig::default();
        assert!(!config.extraction.verify_checksum);
        assert_eq!(config.export.columns.len(), 9);
        assert_eq!(config.batch.jobs, 4);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: IdCardConfig =
            serde_json::from_str(r#"{"extraction": {"verify_checksum": true}}"#).unwrap();
        assert!(config.extraction.verify_checksum);
        assert!(config.extraction.uppercase_check_digit);
        assert!(config.export.utf8_bom);
    }

    #[test]
    fn test_custom_header() {
        let mut export = ExportConfig::default();
        export
            .headers
            .insert("id_number".to_string(), "公民身份号码".to_string());

        assert_eq!(export.header_for(FieldId::IdNumber), "公民身份号码");
        assert_eq!(export.header_for(FieldId::Name), "姓名");
    }

    #[test]
    fn test_batch_accepts_extension() {
        let batch = BatchConfig::default();
        assert!(batch.accepts(Path::new("cards/A_1.JPG")));
        assert!(batch.accepts(Path::new("cards/A_1.txt")));
        assert!(!batch.accepts(Path::new("cards/A_1.json")));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = IdCardConfig::default();
        config.export.include_raw_text = true;
        config.export.columns = vec![FieldId::Name, FieldId::IdNumber];
        config.save(&path).unwrap();

        let loaded = IdCardConfig::from_file(&path).unwrap();
        assert!(loaded.export.include_raw_text);
        assert_eq!(loaded.export.columns, vec![FieldId::Name, FieldId::IdNumber]);
    }

    #[test]
    fn test_rejects_zero_jobs() {
        let mut config = IdCardConfig::default();
        config.batch.jobs = 0;
        assert!(matches!(
            config.validate(),
            Err(IdCardError::Config(ConfigError::InvalidValue { .. }))
        ));
    }
}
