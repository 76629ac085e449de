use ndarray::ArrayView3;

use crate::shared::region::FaceRegion;

/// A single video frame: contiguous RGB bytes in row-major order.
///
/// Format conversion happens at I/O boundaries only; the domain layer
/// treats pixel data as opaque.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Zero-based decode index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// One-based position in the video, as reported to progress callbacks
    /// and used in gallery file names.
    pub fn number(&self) -> usize {
        self.index + 1
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Copies the pixels under `region`, clamped to the frame bounds.
    ///
    /// Returns `None` when nothing of the region lies inside the frame.
    pub fn crop(&self, region: &FaceRegion) -> Option<Frame> {
        let (x1, y1, w, h) = region.clamped(self.width, self.height)?;
        let (x1, y1) = (x1 as usize, y1 as usize);
        let (x2, y2) = (x1 + w as usize, y1 + h as usize);
        let channels = self.channels as usize;

        let src = self.as_ndarray();
        let mut data = Vec::with_capacity(w as usize * h as usize * channels);
        for row in y1..y2 {
            for col in x1..x2 {
                for c in 0..channels {
                    data.push(src[[row, col, c]]);
                }
            }
        }

        Some(Frame::new(data, w, h, self.channels, self.index))
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
