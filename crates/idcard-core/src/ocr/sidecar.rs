//! Engine that reads OCR output produced ahead of time.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use super::{OcrEngine, OcrResult, TextRegion};
use crate::error::{OcrError, Result};

/// Sidecar formats, in lookup order.
const SIDECAR_EXTENSIONS: [&str; 2] = ["txt", "json"];

#[derive(Deserialize)]
#[serde(untagged)]
enum SidecarEntry {
    Text(String),
    Region {
        text: String,
        #[serde(default)]
        score: Option<f32>,
    },
}

impl From<SidecarEntry> for TextRegion {
    fn from(entry: SidecarEntry) -> Self {
        match entry {
            SidecarEntry::Text(text) => TextRegion::new(text),
            SidecarEntry::Region { text, score } => TextRegion { text, score },
        }
    }
}

/// Reads recognized text from a file stored next to each image.
///
/// For `cards/A_1.jpg` it looks for `cards/A_1.txt` (one region per line)
/// and then `cards/A_1.json` (an array of strings or of
/// `{"text": ..., "score": ...}` objects). A `.txt` or `.json` input is
/// read directly.
#[derive(Debug, Clone, Default)]
pub struct SidecarTextEngine;

impl SidecarTextEngine {
    pub fn new() -> Self {
        Self
    }

    /// Locate the OCR output for `path`.
    pub fn sidecar_path(&self, path: &Path) -> Option<PathBuf> {
        if is_sidecar(path) {
            return path.is_file().then(|| path.to_path_buf());
        }

        SIDECAR_EXTENSIONS
            .iter()
            .map(|ext| path.with_extension(ext))
            .find(|candidate| candidate.is_file())
    }

    fn read(&self, sidecar: &Path) -> Result<OcrResult> {
        let content = fs::read_to_string(sidecar)?;

        match extension(sidecar).as_str() {
            "json" => {
                let entries: Vec<SidecarEntry> =
                    serde_json::from_str(&content).map_err(|e| OcrError::InvalidOutput {
                        path: sidecar.to_path_buf(),
                        reason: e.to_string(),
                    })?;
                Ok(OcrResult::from_regions(entries.into_iter().map(Into::into).collect()))
            }
            _ => Ok(OcrResult::from_lines(content.lines())),
        }
    }
}

impl OcrEngine for SidecarTextEngine {
    fn recognize(&self, path: &Path) -> Result<OcrResult> {
        if path.is_dir() {
            return Err(OcrError::Unsupported(path.to_path_buf()).into());
        }

        let sidecar = self
            .sidecar_path(path)
            .ok_or_else(|| OcrError::MissingOutput(path.to_path_buf()))?;

        debug!("Reading OCR output for {} from {}", path.display(), sidecar.display());
        self.read(&sidecar)
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

fn is_sidecar(path: &Path) -> bool {
    SIDECAR_EXTENSIONS.contains(&extension(path).as_str())
}
