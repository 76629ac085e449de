pub const EMBEDDING_MODEL_NAME: &str = "w600k_r50.onnx";
pub const EMBEDDING_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/w600k_r50.onnx";

/// Extensions a gallery scan treats as face images.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "webp"];

/// Extension of crops the gallery writes.
pub const GALLERY_IMAGE_EXTENSION: &str = "jpg";

/// Label font height as a fraction of frame height (`height / 40`).
pub const LABEL_FONT_DIVISOR: u32 = 40;

pub const DEFAULT_CONFIDENCE: f64 = 0.7;
