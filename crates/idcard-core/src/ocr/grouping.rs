//! Grouping of image files into physical cards.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{OcrEngine, OcrResult};
use crate::error::Result;

/// A card has at most a front and a back.
pub const MAX_IMAGES_PER_GROUP: usize = 2;

/// Images belonging to one physical card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageGroup {
    /// Shared base name of the images.
    pub group_id: String,
    /// Image paths in sorted order.
    pub paths: Vec<PathBuf>,
}

/// Base name used for grouping: the file stem without its last `_suffix`.
///
/// `A_front.jpg` and `A_back.jpg` both belong to group `A`.
pub fn group_id(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    match stem.rsplit_once('_') {
        Some((base, _)) if !base.is_empty() => base.to_string(),
        _ => stem.to_string(),
    }
}

/// Group paths into cards, ordered by group id.
///
/// Files sharing a stem (an image and its OCR sidecar) count once.
pub fn group_images(paths: &[PathBuf]) -> Vec<ImageGroup> {
    let mut groups: BTreeMap<String, BTreeMap<PathBuf, PathBuf>> = BTreeMap::new();

    for path in paths {
        groups
            .entry(group_id(path))
            .or_default()
            .entry(path.with_extension(""))
            .and_modify(|existing| {
                if path.as_path() < existing.as_path() {
                    *existing = path.clone();
                }
            })
            .or_insert_with(|| path.clone());
    }

    groups
        .into_iter()
        .map(|(group_id, sources)| {
            let mut paths: Vec<PathBuf> = sources.into_values().collect();
            paths.sort();

            if paths.len() > MAX_IMAGES_PER_GROUP {
                warn!(
                    "Group {} has {} images, keeping the first {}",
                    group_id,
                    paths.len(),
                    MAX_IMAGES_PER_GROUP
                );
                paths.truncate(MAX_IMAGES_PER_GROUP);
            }

            ImageGroup { group_id, paths }
        })
        .collect()
}

/// OCR every image of a group and join the text, one line per region.
pub fn combine_group_text(engine: &dyn OcrEngine, group: &ImageGroup) -> Result<OcrResult> {
    let results = group
        .paths
        .iter()
        .map(|path| engine.recognize(path))
        .collect::<Result<Vec<_>>>()?;

    Ok(OcrResult::combine(results))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OcrError;
    use pretty_assertions::assert_eq;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_group_id() {
        assert_eq!(group_id(Path::new("cards/A_front.jpg")), "A");
        assert_eq!(group_id(Path::new("zhang_san_2.png")), "zhang_san");
        assert_eq!(group_id(Path::new("single.jpg")), "single");
        assert_eq!(group_id(Path::new("_1.jpg")), "_1");
    }

    #[test]
    fn test_group_front_and_back() {
        let groups = group_images(&paths(&["b_2.jpg", "a_2.jpg", "a_1.jpg", "b_1.jpg", "c.jpg"]));

        assert_eq!(
            groups,
            vec![
                ImageGroup { group_id: "a".into(), paths: paths(&["a_1.jpg", "a_2.jpg"]) },
                ImageGroup { group_id: "b".into(), paths: paths(&["b_1.jpg", "b_2.jpg"]) },
                ImageGroup { group_id: "c".into(), paths: paths(&["c.jpg"]) },
            ]
        );
    }

    #[test]
    fn test_group_caps_at_two() {
        let groups = group_images(&paths(&["a_3.jpg", "a_1.jpg", "a_2.jpg"]));
        assert_eq!(groups[0].paths, paths(&["a_1.jpg", "a_2.jpg"]));
    }

    #[test]
    fn test_image_and_sidecar_count_once() {
        let groups = group_images(&paths(&["a_1.jpg", "a_1.txt", "a_2.txt"]));
        assert_eq!(groups[0].paths, paths(&["a_1.jpg", "a_2.txt"]));
    }

    struct FixedEngine;

    impl OcrEngine for FixedEngine {
        fn recognize(&self, path: &Path) -> Result<OcrResult> {
            match path.to_str() {
                Some("a_1.jpg") => Ok(OcrResult::from_lines(["姓名张三"])),
                Some("a_2.jpg") => Ok(OcrResult::from_lines(["签发机关北京市公安局"])),
                _ => Err(OcrError::MissingOutput(path.to_path_buf()).into()),
            }
        }
    }

    #[test]
    fn test_combine_group_text() {
        let group = ImageGroup {
            group_id: "a".into(),
            paths: paths(&["a_1.jpg", "a_2.jpg"]),
        };

        let result = combine_group_text(&FixedEngine, &group).unwrap();
        assert_eq!(result.text, "姓名张三\n签发机关北京市公安局");
    }

    #[test]
    fn test_combine_group_text_propagates_missing_output() {
        let group = ImageGroup {
            group_id: "b".into(),
            paths: paths(&["b_1.jpg"]),
        };

        assert!(combine_group_text(&FixedEngine, &group).is_err());
    }
}
