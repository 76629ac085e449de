use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_writer::VideoWriter;

const FALLBACK_FPS: i32 = 30;

/// Codec and muxer options the writer encodes with.
#[derive(Clone, Debug, PartialEq)]
pub struct EncoderProfile {
    pub codec: ffmpeg_next::codec::Id,
    /// Passed to the encoder when it is opened.
    pub codec_options: Vec<(String, String)>,
    /// Passed to the muxer when the header is written.
    pub format_options: Vec<(String, String)>,
    /// Drop a trailing odd row/column; H.264 rejects odd sizes with 4:2:0 chroma.
    pub even_dimensions: bool,
}

impl EncoderProfile {
    /// MPEG-4 part 2: available in every ffmpeg build.
    pub fn mpeg4() -> Self {
        Self {
            codec: ffmpeg_next::codec::Id::MPEG4,
            codec_options: Vec::new(),
            format_options: Vec::new(),
            even_dimensions: false,
        }
    }

    /// H.264 with the index up front so playback can start before download
    /// completes.
    pub fn h264_faststart() -> Self {
        Self {
            codec: ffmpeg_next::codec::Id::H264,
            codec_options: vec![("preset".into(), "medium".into()), ("crf".into(), "23".into())],
            format_options: vec![("movflags".into(), "+faststart".into())],
            even_dimensions: true,
        }
    }

    /// Size of the encoded picture for a `width` x `height` source.
    pub fn encoded_size(&self, width: u32, height: u32) -> (u32, u32) {
        if self.even_dimensions {
            (width & !1, height & !1)
        } else {
            (width, height)
        }
    }
}

impl Default for EncoderProfile {
    fn default() -> Self {
        Self::mpeg4()
    }
}

fn dictionary(options: &[(String, String)]) -> ffmpeg_next::Dictionary<'static> {
    let mut dict = ffmpeg_next::Dictionary::new();
    for (key, value) in options {
        dict.set(key, value);
    }
    dict
}

/// Open encoder state; present only between `open` and `close`.
struct Session {
    octx: ffmpeg_next::format::context::Output,
    encoder: ffmpeg_next::codec::encoder::video::Encoder,
    scaler: ffmpeg_next::software::scaling::Context,
    time_base: ffmpeg_next::Rational,
    stream_index: usize,
}

impl Session {
    fn drain(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let ost_time_base = self
            .octx
            .stream(self.stream_index)
            .ok_or("FfmpegWriter: output stream missing")?
            .time_base();
        let mut encoded = ffmpeg_next::Packet::empty();
        while self.encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(self.stream_index);
            encoded.rescale_ts(self.time_base, ost_time_base);
            encoded.write_interleaved(&mut self.octx)?;
        }
        Ok(())
    }
}

/// Encodes RGB frames via ffmpeg-next.
pub struct FfmpegWriter {
    profile: EncoderProfile,
    session: Option<Session>,
    width: u32,
    height: u32,
    frame_count: usize,
}

// Safety: FfmpegWriter is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegWriter {}

impl FfmpegWriter {
    pub fn new() -> Self {
        Self::with_profile(EncoderProfile::default())
    }

    pub fn with_profile(profile: EncoderProfile) -> Self {
        Self {
            profile,
            session: None,
            width: 0,
            height: 0,
            frame_count: 0,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }
}

impl Default for FfmpegWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoWriter for FfmpegWriter {
    fn open(
        &mut self,
        path: &Path,
        metadata: &VideoMetadata,
    ) -> Result<(), Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let (out_w, out_h) = self.profile.encoded_size(metadata.width, metadata.height);
        if out_w == 0 || out_h == 0 {
            return Err(format!(
                "cannot encode {}x{} video",
                metadata.width, metadata.height
            )
            .into());
        }

        let mut octx = ffmpeg_next::format::output(path)?;

        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let codec = ffmpeg_next::encoder::find(self.profile.codec)
            .ok_or_else(|| format!("{:?} encoder not found", self.profile.codec))?;

        let mut ost = octx.add_stream(Some(codec))?;
        let stream_index = ost.index();

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()?;

        encoder_ctx.set_width(out_w);
        encoder_ctx.set_height(out_h);
        encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);

        let fps_i = metadata.fps.round() as i32;
        let fps_i = if fps_i <= 0 { FALLBACK_FPS } else { fps_i };
        let time_base = ffmpeg_next::Rational(1, fps_i);

        encoder_ctx.set_time_base(time_base);
        encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(fps_i, 1)));

        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let encoder = encoder_ctx.open_with(dictionary(&self.profile.codec_options))?;
        ost.set_parameters(&encoder);

        octx.write_header_with(dictionary(&self.profile.format_options))?;

        // RGB -> YUV, squeezed to the even size when the profile needs one
        let scaler = ffmpeg_next::software::scaling::Context::get(
            ffmpeg_next::format::Pixel::RGB24,
            metadata.width,
            metadata.height,
            ffmpeg_next::format::Pixel::YUV420P,
            out_w,
            out_h,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        self.width = metadata.width;
        self.height = metadata.height;
        self.frame_count = 0;
        self.session = Some(Session {
            octx,
            encoder,
            scaler,
            time_base,
            stream_index,
        });

        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        let session = self.session.as_mut().ok_or("FfmpegWriter: not opened")?;
        if frame.width() != self.width || frame.height() != self.height {
            return Err(format!(
                "frame is {}x{}, writer expects {}x{}",
                frame.width(),
                frame.height(),
                self.width,
                self.height
            )
            .into());
        }

        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::new(
            ffmpeg_next::format::Pixel::RGB24,
            self.width,
            self.height,
        );

        let stride = rgb_frame.stride(0);
        let row_bytes = self.width as usize * 3;
        let data = rgb_frame.data_mut(0);
        let src = frame.data();

        // Copy pixel data, respecting stride
        for row in 0..self.height as usize {
            let src_start = row * row_bytes;
            let dst_start = row * stride;
            data[dst_start..dst_start + row_bytes]
                .copy_from_slice(&src[src_start..src_start + row_bytes]);
        }

        let mut yuv_frame = ffmpeg_next::util::frame::video::Video::empty();
        session.scaler.run(&rgb_frame, &mut yuv_frame)?;
        yuv_frame.set_pts(Some(self.frame_count as i64));

        session.encoder.send_frame(&yuv_frame)?;
        session.drain()?;

        self.frame_count += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let Some(mut session) = self.session.take() else {
            return Ok(());
        };

        session.encoder.send_eof()?;
        session.drain()?;
        session.octx.write_trailer()?;
        log::debug!("Wrote {} frames", self.frame_count);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::domain::video_reader::VideoReader;
    use crate::video::infrastructure::ffmpeg_reader::FfmpegReader;

    fn metadata(w: u32, h: u32, fps: f64) -> VideoMetadata {
        VideoMetadata {
            width: w,
            height: h,
            fps,
            total_frames: 0,
            codec: String::new(),
            source_path: None,
        }
    }

    fn solid_frame(index: usize, w: u32, h: u32, value: u8) -> Frame {
        let data = vec![value; (w * h * 3) as usize];
        Frame::new(data, w, h, 3, index)
    }

    #[test]
    fn test_write_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mp4");

        let mut writer = FfmpegWriter::new();
        writer.open(&path, &metadata(160, 120, 30.0)).unwrap();
        for i in 0..3 {
            writer.write(&solid_frame(i, 160, 120, 128)).unwrap();
        }
        writer.close().unwrap();

        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
        assert_eq!(writer.frame_count(), 3);
    }

    #[test]
    fn test_roundtrip_keeps_resolution_and_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roundtrip.mp4");

        let mut writer = FfmpegWriter::new();
        writer.open(&path, &metadata(160, 120, 25.0)).unwrap();
        for i in 0..3 {
            writer.write(&solid_frame(i, 160, 120, 128)).unwrap();
        }
        writer.close().unwrap();

        let mut reader = FfmpegReader::new();
        let meta = reader.open(&path).unwrap();
        assert_eq!((meta.width, meta.height), (160, 120));
        assert!((meta.fps - 25.0).abs() < 0.5);

        let frames: Vec<_> = reader.frames().map(|f| f.unwrap()).collect();
        assert_eq!(frames.len(), 3);

        // Codec is lossy, but the overall brightness should be close
        let first = &frames[0];
        let avg: f64 =
            first.data().iter().map(|&b| b as f64).sum::<f64>() / first.data().len() as f64;
        assert!(
            (avg - 128.0).abs() < 40.0,
            "Average pixel value {avg} should be close to 128"
        );
    }

    #[test]
    fn test_write_without_open_returns_error() {
        let mut writer = FfmpegWriter::new();
        assert!(writer.write(&solid_frame(0, 160, 120, 128)).is_err());
    }

    #[test]
    fn test_write_rejects_mismatched_frame_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mp4");

        let mut writer = FfmpegWriter::new();
        writer.open(&path, &metadata(160, 120, 30.0)).unwrap();

        assert!(writer.write(&solid_frame(0, 80, 60, 128)).is_err());
        writer.close().unwrap();
    }

    #[test]
    fn test_open_in_missing_directory_fails() {
        let mut writer = FfmpegWriter::new();
        let result = writer.open(Path::new("/nonexistent/dir/out.mp4"), &metadata(160, 120, 30.0));
        assert!(result.is_err());
    }

    #[test]
    fn test_close_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mp4");

        let mut writer = FfmpegWriter::new();
        writer.open(&path, &metadata(160, 120, 30.0)).unwrap();
        writer.write(&solid_frame(0, 160, 120, 128)).unwrap();
        writer.close().unwrap();

        assert!(writer.close().is_ok());
    }

    #[test]
    fn test_encoded_size() {
        assert_eq!(EncoderProfile::mpeg4().encoded_size(161, 121), (161, 121));
        assert_eq!(EncoderProfile::h264_faststart().encoded_size(161, 121), (160, 120));
        assert_eq!(EncoderProfile::h264_faststart().encoded_size(160, 120), (160, 120));
    }

    #[test]
    fn test_profiles() {
        assert_eq!(EncoderProfile::default().codec, ffmpeg_next::codec::Id::MPEG4);
        let h264 = EncoderProfile::h264_faststart();
        assert!(h264
            .format_options
            .contains(&("movflags".to_string(), "+faststart".to_string())));
    }
}
