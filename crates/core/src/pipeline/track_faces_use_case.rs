use std::path::Path;
use std::time::Instant;

use crate::identity::domain::identity_store::FaceIdentityStore;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

use super::frame_tracker::FrameTracker;
use super::pipeline_logger::{elapsed_ms, PipelineLogger};

/// Runs a whole video through a [`FrameTracker`], one frame at a time.
///
/// The reader must already be open; `metadata` is what its `open` returned.
/// Every decoded frame is written to the output, annotated or not.
pub struct TrackFacesUseCase {
    reader: Box<dyn VideoReader>,
    writer: Box<dyn VideoWriter>,
    tracker: FrameTracker,
    logger: Box<dyn PipelineLogger>,
    on_progress: Option<Box<dyn Fn(usize, usize) + Send>>,
}

impl TrackFacesUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        writer: Box<dyn VideoWriter>,
        tracker: FrameTracker,
        logger: Box<dyn PipelineLogger>,
        on_progress: Option<Box<dyn Fn(usize, usize) + Send>>,
    ) -> Self {
        Self {
            reader,
            writer,
            tracker,
            logger,
            on_progress,
        }
    }

    /// Tracks every frame and writes the annotated video to `output_path`.
    /// Returns the number of frames written.
    ///
    /// The reader is closed whether or not the run succeeds. Once the writer
    /// is open it is closed too, so a failed run leaves a finalized partial
    /// video.
    pub fn execute(
        &mut self,
        metadata: &VideoMetadata,
        output_path: &Path,
    ) -> Result<usize, Box<dyn std::error::Error>> {
        let result = self.run(metadata, output_path);
        self.reader.close();
        result
    }

    fn run(
        &mut self,
        metadata: &VideoMetadata,
        output_path: &Path,
    ) -> Result<usize, Box<dyn std::error::Error>> {
        self.writer.open(output_path, metadata)?;
        let result = self.write_frames(metadata.total_frames);
        let closed = self.writer.close();

        let written = match result {
            Ok(written) => {
                closed?;
                written
            }
            Err(e) => {
                if let Err(close_err) = closed {
                    log::warn!("Failed to finalize {}: {close_err}", output_path.display());
                }
                return Err(e);
            }
        };

        self.logger.info(&format!(
            "Tracked {} identities across {written} frames",
            self.tracker.store().len()
        ));
        self.logger.summary();
        Ok(written)
    }

    fn write_frames(&mut self, total: usize) -> Result<usize, Box<dyn std::error::Error>> {
        let mut written = 0;

        for frame in self.reader.frames() {
            let mut frame = frame?;
            let drawn = self.tracker.track(&mut frame, self.logger.as_mut())?;
            self.logger.metric("faces", drawn as f64);

            let t = Instant::now();
            self.writer.write(&frame)?;
            self.logger.timing("write", elapsed_ms(t));
            written += 1;

            self.logger.progress(frame.number(), total);
            if let Some(ref cb) = self.on_progress {
                cb(frame.number(), total);
            }
        }

        Ok(written)
    }

    pub fn store(&self) -> &FaceIdentityStore {
        self.tracker.store()
    }
}
