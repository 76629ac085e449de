use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use crate::annotation::domain::frame_annotator::{FaceLabel, FrameAnnotator};
use crate::annotation::infrastructure::bitmap_font;
use crate::shared::constants::LABEL_FONT_DIVISOR;
use crate::shared::frame::Frame;

const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const BOX_THICKNESS: u32 = 2;
const LABEL_BACKGROUND: Rgb<u8> = Rgb([0, 0, 0]);
const LABEL_COLOR: Rgb<u8> = Rgb([255, 255, 0]);

/// Draws a red box around each face and a yellow-on-black label above it.
///
/// Labels use a TrueType font when one is configured, otherwise a built-in
/// bitmap font. Text height is a fixed fraction of the frame height.
pub struct LabelAnnotator {
    font: Option<FontVec>,
}

impl LabelAnnotator {
    /// Annotator using the built-in bitmap font.
    pub fn new() -> Self {
        Self { font: None }
    }

    pub fn with_font(font: FontVec) -> Self {
        Self { font: Some(font) }
    }

    pub fn from_font_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let bytes = std::fs::read(path)
            .map_err(|e| format!("failed to read font {}: {e}", path.display()))?;
        let font = FontVec::try_from_vec(bytes)
            .map_err(|e| format!("invalid font {}: {e}", path.display()))?;
        Ok(Self::with_font(font))
    }

    fn measure(&self, text: &str, font_px: u32) -> (u32, u32) {
        match &self.font {
            Some(font) => text_size(PxScale::from(font_px as f32), font, text),
            None => bitmap_font::text_size(text, bitmap_font::scale_for(font_px)),
        }
    }

    fn draw_label(&self, img: &mut RgbImage, x: i32, y: i32, text: &str, font_px: u32) {
        match &self.font {
            Some(font) => draw_text_mut(
                img,
                LABEL_COLOR,
                x,
                y,
                PxScale::from(font_px as f32),
                font,
                text,
            ),
            None => bitmap_font::draw_text(
                img,
                x,
                y,
                text,
                bitmap_font::scale_for(font_px),
                LABEL_COLOR,
            ),
        }
    }

    fn draw_face(&self, img: &mut RgbImage, label: &FaceLabel, font_px: u32) {
        let r = &label.region;
        if r.width <= 0 || r.height <= 0 {
            return;
        }

        for inset in 0..BOX_THICKNESS as i32 {
            let w = r.width - 2 * inset;
            let h = r.height - 2 * inset;
            if w <= 0 || h <= 0 {
                break;
            }
            let rect = Rect::at(r.x + inset, r.y + inset).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(img, rect, BOX_COLOR);
        }

        let (text_w, text_h) = self.measure(&label.text, font_px);
        if text_w == 0 || text_h == 0 {
            return;
        }
        let text_x = label_x(r.x, text_w, img.width());
        let text_y = r.y - text_h as i32;

        draw_filled_rect_mut(
            img,
            Rect::at(text_x, text_y).of_size(text_w, text_h),
            LABEL_BACKGROUND,
        );
        self.draw_label(img, text_x, text_y, &label.text, font_px);
    }
}

impl Default for LabelAnnotator {
    fn default() -> Self {
        Self::new()
    }
}

/// Label text height for a frame of `frame_height` pixels.
pub fn font_px_for(frame_height: u32) -> u32 {
    (frame_height / LABEL_FONT_DIVISOR).max(1)
}

/// Left edge of a label: the box's x, or shifted left by half the text width
/// (never past the frame's left edge) when it would overflow on the right.
fn label_x(box_x: i32, text_w: u32, frame_w: u32) -> i32 {
    if box_x as i64 + text_w as i64 <= frame_w as i64 {
        box_x
    } else {
        (box_x - (text_w / 2) as i32).max(0)
    }
}

impl FrameAnnotator for LabelAnnotator {
    fn annotate(
        &self,
        frame: &mut Frame,
        labels: &[FaceLabel],
    ) -> Result<(), Box<dyn std::error::Error>> {
        if labels.is_empty() {
            return Ok(());
        }
        if frame.channels() != 3 {
            return Err(format!("expected RGB frame, got {} channels", frame.channels()).into());
        }

        let mut img = RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
            .ok_or("frame data does not match its dimensions")?;
        let font_px = font_px_for(frame.height());

        for label in labels {
            self.draw_face(&mut img, label, font_px);
        }

        frame.data_mut().copy_from_slice(img.as_raw());
        Ok(())
    }
}
