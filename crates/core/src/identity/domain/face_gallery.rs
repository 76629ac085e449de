use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::identity::domain::identity::IdentityKey;
use crate::shared::constants::GALLERY_IMAGE_EXTENSION;
use crate::shared::frame::Frame;
use crate::video::domain::image_writer::ImageWriter;

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("failed to create gallery directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to save gallery image {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error>,
    },
}

/// Flat directory holding one representative crop per identity, plus the
/// in-memory index between those files and identity keys.
///
/// Files already in the directory when the gallery is opened are not
/// indexed; only crops saved through [`FaceGallery::add`] map to keys.
pub struct FaceGallery {
    dir: PathBuf,
    writer: Box<dyn ImageWriter>,
    keys_by_path: HashMap<PathBuf, IdentityKey>,
    paths_by_key: HashMap<IdentityKey, PathBuf>,
}

impl FaceGallery {
    pub fn open(dir: &Path, writer: Box<dyn ImageWriter>) -> Result<Self, GalleryError> {
        std::fs::create_dir_all(dir).map_err(|source| GalleryError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
            writer,
            keys_by_path: HashMap::new(),
            paths_by_key: HashMap::new(),
        })
    }

    /// File name for the `ordinal`-th face of 1-based frame `frame_number`.
    pub fn file_name(frame_number: usize, ordinal: usize) -> String {
        format!("fr{frame_number}_fc{ordinal}.{GALLERY_IMAGE_EXTENSION}")
    }

    /// Saves `crop` as the representative image of `key`.
    pub fn add(
        &mut self,
        key: IdentityKey,
        crop: &Frame,
        frame_number: usize,
        ordinal: usize,
    ) -> Result<PathBuf, GalleryError> {
        let path = self.dir.join(Self::file_name(frame_number, ordinal));
        self.writer
            .write(&path, crop, None)
            .map_err(|source| GalleryError::Write {
                path: path.clone(),
                source,
            })?;
        self.keys_by_path.insert(path.clone(), key);
        self.paths_by_key.insert(key, path.clone());
        Ok(path)
    }

    pub fn key_for(&self, path: &Path) -> Option<IdentityKey> {
        self.keys_by_path.get(path).copied()
    }

    pub fn image_for(&self, key: IdentityKey) -> Option<&Path> {
        self.paths_by_key.get(&key).map(PathBuf::as_path)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn len(&self) -> usize {
        self.paths_by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths_by_key.is_empty()
    }
}
