use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::shared::frame::Frame;
use crate::video::domain::image_writer::ImageWriter;

pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Writes a single frame to an image file using the `image` crate.
///
/// The format follows the file extension. JPEG output uses an explicit
/// quality; other formats use the crate defaults.
pub struct ImageFileWriter {
    jpeg_quality: u8,
}

impl ImageFileWriter {
    pub fn new() -> Self {
        Self::with_jpeg_quality(DEFAULT_JPEG_QUALITY)
    }

    pub fn with_jpeg_quality(jpeg_quality: u8) -> Self {
        Self {
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }
}

impl Default for ImageFileWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn is_jpeg(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"))
        .unwrap_or(false)
}

impl ImageWriter for ImageFileWriter {
    fn write(
        &self,
        path: &Path,
        frame: &Frame,
        size: Option<(u32, u32)>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let img = image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
            .ok_or("Failed to create image from frame data")?;

        let img = match size {
            Some((w, h)) => image::imageops::resize(&img, w, h, image::imageops::FilterType::Triangle),
            None => img,
        };

        if is_jpeg(path) {
            let out = BufWriter::new(File::create(path)?);
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(out, self.jpeg_quality);
            img.write_with_encoder(encoder)?;
        } else {
            img.save(path)?;
        }
        Ok(())
    }
}
