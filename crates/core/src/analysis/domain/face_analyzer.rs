use crate::analysis::domain::observation::DetectedFace;
use crate::shared::frame::Frame;

/// Domain interface for per-frame face detection and attribute inference.
///
/// Implementations may be stateful (e.g., replay cursors, model sessions),
/// hence `&mut self`.
pub trait FaceAnalyzer: Send {
    fn analyze(&mut self, frame: &Frame) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>>;
}
