use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;

/// Image files directly inside `dir`, sorted by path.
///
/// A missing directory is an empty gallery.
pub fn gallery_images(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut images = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_image_extension(&path) {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.iter().any(|ext| ext.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

/// Decodes an image file into an RGB frame.
pub fn load_rgb(path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
    let img = image::open(path)?.to_rgb8();
    let (width, height) = img.dimensions();
    Ok(Frame::new(img.into_raw(), width, height, 3, 0))
}

/// Per-image feature cache shared by the resolvers.
///
/// Entries are keyed by path and invalidated when the file's modification
/// time changes, so a crop overwriting a stale file is re-read.
pub(crate) struct FeatureCache<F> {
    entries: HashMap<PathBuf, (Option<SystemTime>, F)>,
}

impl<F> FeatureCache<F> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Scores every gallery image against `query` and returns the best one
    /// scoring at least `threshold`. Ties go to the earlier path.
    ///
    /// Images that fail to decode or featurize are skipped with a warning.
    pub fn best_match(
        &mut self,
        dir: &Path,
        query: &F,
        threshold: f64,
        mut featurize: impl FnMut(&Frame) -> Result<F, Box<dyn std::error::Error>>,
        score: impl Fn(&F, &F) -> f64,
    ) -> Result<Option<PathBuf>, Box<dyn std::error::Error>> {
        let mut best: Option<(PathBuf, f64)> = None;

        for path in gallery_images(dir)? {
            let modified = std::fs::metadata(&path).and_then(|m| m.modified()).ok();
            let fresh = matches!(self.entries.get(&path), Some((m, _)) if *m == modified);
            if !fresh {
                let feature = match load_rgb(&path).and_then(|img| featurize(&img)) {
                    Ok(f) => f,
                    Err(e) => {
                        log::warn!("Skipping gallery image {}: {e}", path.display());
                        continue;
                    }
                };
                self.entries.insert(path.clone(), (modified, feature));
            }

            let Some((_, feature)) = self.entries.get(&path) else {
                continue;
            };
            let s = score(query, feature);
            if s >= threshold && best.as_ref().map_or(true, |(_, b)| s > *b) {
                best = Some((path, s));
            }
        }

        Ok(best.map(|(path, _)| path))
    }
}
