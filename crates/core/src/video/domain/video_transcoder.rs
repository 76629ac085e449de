use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TranscodeError {
    #[error("failed to read {path}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error>,
    },
    #[error("failed to write {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error>,
    },
}

/// Re-encodes a finished video into a format browsers can play inline.
pub trait VideoTranscoder: Send {
    fn transcode(&self, input: &Path, output: &Path) -> Result<(), TranscodeError>;
}
