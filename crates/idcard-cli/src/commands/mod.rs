//! Subcommands.

pub mod batch;
pub mod config;
pub mod process;

use std::io::Write;
use std::path::{Path, PathBuf};

use console::style;
use tracing::debug;

use idcard_core::models::config::{ExportConfig, IdCardConfig};
use idcard_core::models::record::{Field, IdCardRecord};

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("idcard")
        .join("config.json")
}

/// Load the configuration named on the command line, else the default
/// file if one exists, else built-in defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<IdCardConfig> {
    if let Some(path) = config_path {
        return Ok(IdCardConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Using configuration from {}", default_path.display());
        Ok(IdCardConfig::from_file(&default_path)?)
    } else {
        Ok(IdCardConfig::default())
    }
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Write records as CSV using the export column layout.
///
/// The byte order mark lets spreadsheet applications detect UTF-8.
pub fn write_csv<W: Write>(
    mut writer: W,
    records: &[IdCardRecord],
    export: &ExportConfig,
    bom: bool,
) -> anyhow::Result<()> {
    if bom {
        writer.write_all(UTF8_BOM)?;
    }

    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(IdCardRecord::export_headers(export))?;

    for record in records {
        wtr.write_record(record.export_row(export).into_iter().map(|(_, value)| value))?;
    }

    wtr.flush()?;
    Ok(())
}

/// Human-readable listing of a record, highlighting fields that need review.
pub fn format_record_text(record: &IdCardRecord) -> String {
    let mut output = String::new();

    for (id, field) in record.fields() {
        output.push_str(&format!("{}: {}\n", id.header(), format_field(field)));
    }

    output
}

fn format_field(field: &Field) -> String {
    let value = field.value().unwrap_or("-");

    if field.status.is_flagged() {
        style(format!("{} [{}]", value, field.status)).red().to_string()
    } else if field.is_present() {
        value.to_string()
    } else {
        style(value).dim().to_string()
    }
}
