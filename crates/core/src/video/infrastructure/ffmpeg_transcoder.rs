use std::path::Path;

use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_transcoder::{TranscodeError, VideoTranscoder};
use crate::video::domain::video_writer::VideoWriter;
use crate::video::infrastructure::ffmpeg_reader::FfmpegReader;
use crate::video::infrastructure::ffmpeg_writer::{EncoderProfile, FfmpegWriter};

/// Re-encodes a video to H.264 MP4 with `+faststart` so browsers can stream it.
///
/// Falls back to MPEG-4 part 2 when the linked ffmpeg has no H.264 encoder.
/// An existing output file is overwritten.
pub struct FfmpegTranscoder {
    profile: EncoderProfile,
}

impl FfmpegTranscoder {
    pub fn new() -> Self {
        Self {
            profile: EncoderProfile::h264_faststart(),
        }
    }

    pub fn with_profile(profile: EncoderProfile) -> Self {
        Self { profile }
    }

    fn effective_profile(&self) -> EncoderProfile {
        if ffmpeg_next::init().is_ok() && ffmpeg_next::encoder::find(self.profile.codec).is_none() {
            log::warn!(
                "{:?} encoder unavailable, transcoding with MPEG-4",
                self.profile.codec
            );
            return EncoderProfile {
                codec: ffmpeg_next::codec::Id::MPEG4,
                codec_options: Vec::new(),
                format_options: self.profile.format_options.clone(),
                even_dimensions: self.profile.even_dimensions,
            };
        }
        self.profile.clone()
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoTranscoder for FfmpegTranscoder {
    fn transcode(&self, input: &Path, output: &Path) -> Result<(), TranscodeError> {
        let input_err = |source| TranscodeError::Input {
            path: input.to_path_buf(),
            source,
        };
        let output_err = |source| TranscodeError::Output {
            path: output.to_path_buf(),
            source,
        };

        let mut reader = FfmpegReader::new();
        let metadata = reader.open(input).map_err(input_err)?;
        let mut writer = FfmpegWriter::with_profile(self.effective_profile());
        writer.open(output, &metadata).map_err(output_err)?;

        for frame in reader.frames() {
            let frame = frame.map_err(input_err)?;
            writer.write(&frame).map_err(output_err)?;
        }
        writer.close().map_err(output_err)?;
        reader.close();

        log::info!(
            "Transcoded {} -> {} ({} frames)",
            input.display(),
            output.display(),
            writer.frame_count()
        );
        Ok(())
    }
}
