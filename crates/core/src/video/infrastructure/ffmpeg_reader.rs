use std::path::Path;

use ffmpeg_next::format::context::Input;
use ffmpeg_next::format::Pixel;
use ffmpeg_next::software::scaling::{Context as Scaler, Flags};
use ffmpeg_next::util::frame::video::Video as VideoFrame;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;

type FrameResult = Result<Frame, Box<dyn std::error::Error>>;

/// Decodes the best video stream of a file into RGB24 [`Frame`]s.
pub struct FfmpegReader {
    source: Option<Source>,
}

// Safety: the reader is moved between threads but never shared; the raw
// ffmpeg pointers it owns are only touched through `&mut self`.
unsafe impl Send for FfmpegReader {}

impl FfmpegReader {
    pub fn new() -> Self {
        Self { source: None }
    }
}

impl Default for FfmpegReader {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoReader for FfmpegReader {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;
        let input = ffmpeg_next::format::input(path)?;

        let (stream_index, fps, total_frames, parameters) = {
            let stream = input
                .streams()
                .best(ffmpeg_next::media::Type::Video)
                .ok_or_else(|| format!("{} has no video stream", path.display()))?;
            (
                stream.index(),
                frame_rate(stream.rate()),
                stream.frames().max(0) as usize,
                stream.parameters(),
            )
        };

        let decoder = ffmpeg_next::codec::context::Context::from_parameters(parameters)?
            .decoder()
            .video()?;
        let (width, height) = (decoder.width(), decoder.height());
        let scaler = Scaler::get(
            decoder.format(),
            width,
            height,
            Pixel::RGB24,
            width,
            height,
            Flags::BILINEAR,
        )?;

        let metadata = VideoMetadata {
            width,
            height,
            fps,
            total_frames,
            codec: decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            source_path: Some(path.to_path_buf()),
        };
        log::debug!(
            "Opened {}: {}x{} @ {:.2} fps, {} frames ({})",
            path.display(),
            width,
            height,
            fps,
            total_frames,
            metadata.codec
        );

        self.source = Some(Source {
            input,
            decoder,
            scaler,
            stream_index,
            width,
            height,
            next_index: 0,
            drained: false,
        });
        Ok(metadata)
    }

    fn frames(&mut self) -> Box<dyn Iterator<Item = FrameResult> + '_> {
        match self.source.as_mut() {
            Some(source) => Box::new(std::iter::from_fn(move || source.next_frame().transpose())),
            None => Box::new(std::iter::once(Err("video not opened".into()))),
        }
    }

    fn close(&mut self) {
        self.source = None;
    }
}

fn frame_rate(rate: ffmpeg_next::Rational) -> f64 {
    if rate.denominator() == 0 {
        0.0
    } else {
        rate.numerator() as f64 / rate.denominator() as f64
    }
}

/// An open input with its decoder; frames are pulled one at a time.
struct Source {
    input: Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: Scaler,
    stream_index: usize,
    width: u32,
    height: u32,
    next_index: usize,
    drained: bool,
}

impl Source {
    /// Next frame in decode order, or `None` once the decoder is flushed.
    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        loop {
            let mut decoded = VideoFrame::empty();
            if self.decoder.receive_frame(&mut decoded).is_ok() {
                return self.convert(&decoded).map(Some);
            }
            if self.drained {
                return Ok(None);
            }
            self.feed();
        }
    }

    /// Sends the next packet of the video stream, or end-of-stream.
    fn feed(&mut self) {
        loop {
            let Some((stream, packet)) = self.input.packets().next() else {
                let _ = self.decoder.send_eof();
                self.drained = true;
                return;
            };
            if stream.index() != self.stream_index {
                continue;
            }
            if let Err(e) = self.decoder.send_packet(&packet) {
                log::debug!("Skipping undecodable packet: {e}");
            }
            return;
        }
    }

    fn convert(&mut self, decoded: &VideoFrame) -> FrameResult {
        let mut rgb = VideoFrame::empty();
        self.scaler.run(decoded, &mut rgb)?;

        // Rows may be padded past width * 3
        let stride = rgb.stride(0);
        let row_len = self.width as usize * 3;
        let data = rgb.data(0);
        let mut pixels = Vec::with_capacity(row_len * self.height as usize);
        for row in 0..self.height as usize {
            let start = row * stride;
            pixels.extend_from_slice(&data[start..start + row_len]);
        }

        let frame = Frame::new(pixels, self.width, self.height, 3, self.next_index);
        self.next_index += 1;
        Ok(frame)
    }
}
