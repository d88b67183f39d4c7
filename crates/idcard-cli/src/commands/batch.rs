//! Batch processing command - many cards into one spreadsheet.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use clap::Args;
use console::style;
use futures_util::stream::{self, StreamExt};
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use idcard_core::idcard::{IdCardParser, ParseResult};
use idcard_core::models::record::{IdCardRecord, RecordStatus};
use idcard_core::ocr::{combine_group_text, group_images, ImageGroup, OcrEngine, SidecarTextEngine};

use super::{load_config, write_csv};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern of card images or OCR text files (e.g. "cards/*")
    #[arg(required = true)]
    input: String,

    /// Output CSV file
    #[arg(short, long, default_value = "idcard_results.csv")]
    output: PathBuf,

    /// Also write one JSON record per card into this directory
    #[arg(long)]
    json_dir: Option<PathBuf>,

    /// Number of cards processed concurrently (default from config)
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Compute ages as of this date (YYYY-MM-DD) instead of today
    #[arg(long)]
    as_of: Option<NaiveDate>,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing one card.
struct ProcessResult {
    group: ImageGroup,
    parsed: Result<ParseResult, String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;
    let jobs = args.jobs.unwrap_or(config.batch.jobs).max(1);

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file() && config.batch.accepts(p))
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    let groups = group_images(&files);

    println!(
        "{} Found {} files for {} cards",
        style("ℹ").blue(),
        files.len(),
        groups.len()
    );

    let pb = ProgressBar::new(groups.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} cards")?
            .progress_chars("=>-"),
    );

    let parser = Arc::new(IdCardParser::new().with_config(&config.extraction));
    let engine: Arc<dyn OcrEngine> = Arc::new(SidecarTextEngine::new());
    let as_of = args.as_of;

    // Buffered keeps results in input order while running `jobs` at a time
    let results: Vec<ProcessResult> = stream::iter(groups)
        .map(|group| {
            let parser = Arc::clone(&parser);
            let engine = Arc::clone(&engine);
            async move {
                tokio::task::spawn_blocking(move || process_group(group, &parser, engine.as_ref(), as_of))
                    .await
            }
        })
        .buffered(jobs)
        .inspect(|_| pb.inc(1))
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .collect::<Result<_, _>>()?;

    pb.finish_and_clear();

    let failed: Vec<_> = results.iter().filter(|r| r.parsed.is_err()).collect();

    if !args.continue_on_error {
        if let Some(result) = failed.first() {
            let message = result.parsed.as_ref().err().cloned().unwrap_or_default();
            error!("Failed to process {}: {}", result.group.group_id, message);
            anyhow::bail!("Processing failed: {}", message);
        }
    }

    let records: Vec<(&ImageGroup, IdCardRecord)> = results
        .iter()
        .filter_map(|r| r.parsed.as_ref().ok().map(|p| (&r.group, p.record.clone())))
        .zip(1u32..)
        .map(|((group, record), sequence)| (group, record.with_sequence(sequence)))
        .collect();

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let rows: Vec<IdCardRecord> = records.iter().map(|(_, record)| record.clone()).collect();
    write_csv(
        fs::File::create(&args.output)?,
        &rows,
        &config.export,
        config.export.utf8_bom,
    )?;

    if let Some(json_dir) = &args.json_dir {
        fs::create_dir_all(json_dir)?;
        for (group, record) in &records {
            let path = json_dir.join(format!("{}.json", group.group_id));
            fs::write(&path, serde_json::to_string_pretty(record)?)?;
            debug!("Wrote {}", path.display());
        }
    }

    print_summary(&results, &records, start);

    println!(
        "{} Results written to {}",
        style("✓").green(),
        args.output.display()
    );

    Ok(())
}

fn process_group(
    group: ImageGroup,
    parser: &IdCardParser,
    engine: &dyn OcrEngine,
    as_of: Option<NaiveDate>,
) -> ProcessResult {
    let start = Instant::now();

    let parsed = combine_group_text(engine, &group)
        .map(|ocr| match as_of {
            Some(date) => parser.parse_on(&ocr.text, date),
            None => parser.parse(&ocr.text),
        })
        .map_err(|e| {
            warn!("Failed to process {}: {}", group.group_id, e);
            e.to_string()
        });

    ProcessResult {
        group,
        parsed,
        processing_time_ms: start.elapsed().as_millis() as u64,
    }
}

fn print_summary(
    results: &[ProcessResult],
    records: &[(&ImageGroup, IdCardRecord)],
    start: Instant,
) {
    let count = |status: RecordStatus| {
        records
            .iter()
            .filter(|(_, record)| record.status() == status)
            .count()
    };

    println!(
        "{} Processed {} cards in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} complete, {} partial, {} without identity number",
        style(count(RecordStatus::Complete)).green(),
        style(count(RecordStatus::Partial)).yellow(),
        style(count(RecordStatus::Failed)).red()
    );

    let total_ms: u64 = results.iter().map(|r| r.processing_time_ms).sum();
    debug!("Total card processing time: {}ms", total_ms);

    let review: Vec<_> = records
        .iter()
        .filter(|(_, record)| !record.flagged_fields().is_empty())
        .collect();

    if !review.is_empty() {
        println!();
        println!("{}", style("Needs review:").yellow());
        for (group, record) in review {
            let fields: Vec<_> = record
                .flagged_fields()
                .iter()
                .map(|id| id.header())
                .collect();
            println!(
                "  {}. {}: {}",
                record.sequence,
                group.group_id,
                fields.join(", ")
            );
        }
    }

    let failed: Vec<_> = results.iter().filter(|r| r.parsed.is_err()).collect();
    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed cards:").red());
        for result in failed {
            println!(
                "  - {}: {}",
                result.group.group_id,
                result.parsed.as_ref().err().map(String::as_str).unwrap_or("unknown error")
            );
        }
    }
}
