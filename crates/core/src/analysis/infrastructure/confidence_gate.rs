use crate::analysis::domain::face_analyzer::FaceAnalyzer;
use crate::analysis::domain::observation::DetectedFace;
use crate::shared::frame::Frame;

/// Decorator that drops detections below a confidence threshold.
///
/// Faces the inner analyzer reports without a confidence pass through.
pub struct ConfidenceGate {
    inner: Box<dyn FaceAnalyzer>,
    threshold: f64,
}

impl ConfidenceGate {
    pub fn new(inner: Box<dyn FaceAnalyzer>, threshold: f64) -> Result<Self, &'static str> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err("confidence threshold must be between 0 and 1");
        }
        Ok(Self { inner, threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl FaceAnalyzer for ConfidenceGate {
    fn analyze(&mut self, frame: &Frame) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>> {
        let faces = self.inner.analyze(frame)?;
        let before = faces.len();
        let kept: Vec<DetectedFace> = faces
            .into_iter()
            .filter(|f| f.confidence.map_or(true, |c| c >= self.threshold))
            .collect();
        if kept.len() < before {
            log::debug!(
                "Frame {}: dropped {} face(s) below confidence {}",
                frame.number(),
                before - kept.len(),
                self.threshold
            );
        }
        Ok(kept)
    }
}
