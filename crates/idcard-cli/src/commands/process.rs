//! Process command - extract fields from a single card.

use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::time::Instant;

use chrono::NaiveDate;
use clap::Args;
use console::style;
use tracing::{debug, info};

use idcard_core::idcard::{IdCardParser, ParseResult};
use idcard_core::models::config::IdCardConfig;
use idcard_core::ocr::{OcrEngine, SidecarTextEngine};

use super::{format_record_text, load_config, write_csv};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input: OCR text (.txt), OCR regions (.json), an image with a sidecar
    /// next to it, or "-" to read text from stdin
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Compute age as of this date (YYYY-MM-DD) instead of today
    #[arg(long)]
    as_of: Option<NaiveDate>,

    /// Verify the identity number check digit
    #[arg(long)]
    verify_checksum: bool,

    /// Show record status and extraction warnings
    #[arg(long)]
    show_status: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text listing
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if args.verify_checksum {
        config.extraction.verify_checksum = true;
    }

    let text = read_input(&args)?;

    let parser = IdCardParser::new().with_config(&config.extraction);
    let result = match args.as_of {
        Some(date) => parser.parse_on(&text, date),
        None => parser.parse(&text),
    };
    let record = result.record.clone().with_sequence(1);

    let output = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&record)?,
        OutputFormat::Csv => {
            let mut buffer = Vec::new();
            let bom = config.export.utf8_bom && args.output.is_some();
            write_csv(&mut buffer, std::slice::from_ref(&record), &config.export, bom)?;
            String::from_utf8(buffer)?
        }
        OutputFormat::Text => format_record_text(&record),
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        print!("{}", output);
        if !output.ends_with('\n') {
            println!();
        }
    }

    if args.show_status {
        print_status(&result, &config);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

fn read_input(args: &ProcessArgs) -> anyhow::Result<String> {
    if args.input.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let ocr = SidecarTextEngine::new().recognize(&args.input)?;
    debug!("Read {} text regions", ocr.regions.len());

    Ok(ocr.text)
}

fn print_status(result: &ParseResult, config: &IdCardConfig) {
    let record = &result.record;

    eprintln!();
    eprintln!("{} Record status: {}", style("ℹ").blue(), record.status());
    if config.extraction.verify_checksum {
        eprintln!("{} Check digit verification enabled", style("ℹ").blue());
    }

    let flagged = record.flagged_fields();
    if !flagged.is_empty() {
        let names: Vec<_> = flagged.iter().map(|id| config.export.header_for(*id)).collect();
        eprintln!("{} Needs review: {}", style("⚠").yellow(), names.join(", "));
    }

    for warning in &result.warnings {
        eprintln!("  - {}", warning);
    }

    eprintln!(
        "{} Processing time: {}ms",
        style("ℹ").blue(),
        result.processing_time_ms
    );
}
