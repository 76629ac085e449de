use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Container-reported frame count; 0 when the container does not say.
    pub total_frames: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction() {
        let meta = VideoMetadata {
            width: 1920,
            height: 1080,
            fps: 25.0,
            total_frames: 750,
            codec: "h264".to_string(),
            source_path: Some(PathBuf::from("/tmp/interview.mp4")),
        };
        assert_eq!(meta.width, 1920);
        assert_eq!(meta.height, 1080);
        assert_eq!(meta.fps, 25.0);
        assert_eq!(meta.total_frames, 750);
        assert_eq!(meta.codec, "h264");
        assert_eq!(meta.source_path, Some(PathBuf::from("/tmp/interview.mp4")));
    }
}
