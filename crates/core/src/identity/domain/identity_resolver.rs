use std::path::{Path, PathBuf};

use crate::shared::frame::Frame;

/// Domain interface for face re-identification against a gallery directory.
///
/// Returns the path of the best-matching gallery image, or `None` when
/// nothing in the directory is similar enough. Implementations may cache
/// per-image features between calls, hence `&mut self`.
pub trait IdentityResolver: Send {
    fn find_match(
        &mut self,
        crop: &Frame,
        gallery_dir: &Path,
    ) -> Result<Option<PathBuf>, Box<dyn std::error::Error>>;
}
