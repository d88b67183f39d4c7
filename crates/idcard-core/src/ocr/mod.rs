//! OCR engine interface.
//!
//! Recognition itself happens outside this crate. The parser only needs
//! the ordered text regions an engine produced for each image.

mod grouping;
mod sidecar;

pub use grouping::{combine_group_text, group_id, group_images, ImageGroup, MAX_IMAGES_PER_GROUP};
pub use sidecar::SidecarTextEngine;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One recognized line of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRegion {
    /// Recognized text content.
    pub text: String,

    /// Recognition confidence score (0.0 - 1.0), if the engine reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl TextRegion {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            score: None,
        }
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }
}

/// Result of OCR on one image, or on every image of one card.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrResult {
    /// Recognized regions in reading order.
    pub regions: Vec<TextRegion>,

    /// Full text (regions joined with newlines).
    pub text: String,
}

impl OcrResult {
    /// Build from regions, dropping blank ones.
    pub fn from_regions(regions: Vec<TextRegion>) -> Self {
        let regions: Vec<TextRegion> = regions
            .into_iter()
            .filter(|r| !r.text.trim().is_empty())
            .collect();

        let text = regions
            .iter()
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        Self { regions, text }
    }

    /// Build from plain lines of text.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_regions(lines.into_iter().map(TextRegion::new).collect())
    }

    /// Concatenate results in order, e.g. the front and back of a card.
    pub fn combine(results: impl IntoIterator<Item = OcrResult>) -> Self {
        Self::from_regions(results.into_iter().flat_map(|r| r.regions).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// An OCR engine: image in, ordered text regions out.
pub trait OcrEngine: Send + Sync {
    /// Recognize the text of one image.
    fn recognize(&self, path: &Path) -> Result<OcrResult>;
}
