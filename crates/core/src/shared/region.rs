/// Axis-aligned face box in frame pixel coordinates.
///
/// Coordinates come straight from the analyzer and may extend past the
/// frame edges; use [`FaceRegion::clamped`] before touching pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaceRegion {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl FaceRegion {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// True when the box is the analyzer's "no face found" placeholder.
    ///
    /// Detectors run without enforced detection report the whole frame as a
    /// single face whose size is the frame size minus one pixel.
    pub fn is_full_frame(&self, frame_width: u32, frame_height: u32) -> bool {
        self.width as i64 == frame_width as i64 - 1
            && self.height as i64 == frame_height as i64 - 1
    }

    /// Visible part of the box as `(x, y, width, height)`.
    ///
    /// Returns `None` when the intersection with the frame is empty.
    pub fn clamped(&self, frame_width: u32, frame_height: u32) -> Option<(u32, u32, u32, u32)> {
        let fw = frame_width as i64;
        let fh = frame_height as i64;
        let x1 = (self.x as i64).clamp(0, fw);
        let y1 = (self.y as i64).clamp(0, fh);
        let x2 = (self.x as i64 + self.width as i64).clamp(0, fw);
        let y2 = (self.y as i64 + self.height as i64).clamp(0, fh);

        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some((x1 as u32, y1 as u32, (x2 - x1) as u32, (y2 - y1) as u32))
    }
}
