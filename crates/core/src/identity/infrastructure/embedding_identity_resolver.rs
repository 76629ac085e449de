/// ArcFace embedding-based identity resolver using ONNX Runtime.
///
/// Matches faces by cosine similarity of ArcFace embeddings. Preferred
/// over histogram matching when model availability and latency allow.
use std::path::{Path, PathBuf};

use crate::identity::domain::identity_resolver::IdentityResolver;
use crate::identity::infrastructure::gallery_scan::FeatureCache;
use crate::shared::frame::Frame;

pub const DEFAULT_THRESHOLD: f64 = 0.4;

const INPUT_SIZE: usize = 112;
const NORM_MEAN: f32 = 127.5;
const NORM_STD: f32 = 127.5;

pub struct EmbeddingIdentityResolver {
    session: ort::session::Session,
    threshold: f64,
    cache: FeatureCache<Vec<f32>>,
}

impl EmbeddingIdentityResolver {
    pub fn new(model_path: &Path, threshold: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let intra_threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let session = ort::session::Session::builder()?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
            .with_inter_threads(1)?
            .with_intra_threads(intra_threads)?
            .with_execution_providers(preferred_execution_providers())?
            .commit_from_file(model_path)?;
        log::info!("Loaded embedding model {}", model_path.display());
        Ok(Self {
            session,
            threshold,
            cache: FeatureCache::new(),
        })
    }
}

/// CoreML on macOS, DirectML on Windows; ONNX Runtime falls back to CPU
/// when the provider is unavailable.
fn preferred_execution_providers() -> Vec<ort::execution_providers::ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![]
    }
}

fn embed(
    session: &mut ort::session::Session,
    frame: &Frame,
) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
    let tensor = preprocess(frame.data(), frame.width(), frame.height());
    let input_value = ort::value::Tensor::from_array(tensor)?;
    let outputs = session.run(ort::inputs![input_value])?;
    let embedding_array = outputs[0].try_extract_array::<f32>()?;
    let embedding_slice = embedding_array
        .as_slice()
        .ok_or("Cannot get embedding slice")?;

    let mut embedding = embedding_slice.to_vec();
    l2_normalize(&mut embedding);
    Ok(embedding)
}

impl IdentityResolver for EmbeddingIdentityResolver {
    fn find_match(
        &mut self,
        crop: &Frame,
        gallery_dir: &Path,
    ) -> Result<Option<PathBuf>, Box<dyn std::error::Error>> {
        if crop.width() == 0 || crop.height() == 0 {
            return Ok(None);
        }
        let session = &mut self.session;
        let query = embed(session, crop)?;
        self.cache.best_match(
            gallery_dir,
            &query,
            self.threshold,
            |img| embed(session, img),
            |a, b| cosine_similarity(a, b),
        )
    }
}

/// Resize crop to 112x112, normalize, NCHW layout.
fn preprocess(rgb_data: &[u8], width: u32, height: u32) -> ndarray::Array4<f32> {
    let src_w = width as usize;
    let src_h = height as usize;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, INPUT_SIZE, INPUT_SIZE));
    if src_w == 0 || src_h == 0 {
        return tensor;
    }

    for y in 0..INPUT_SIZE {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / INPUT_SIZE as f64) as usize).min(src_h - 1);
        for x in 0..INPUT_SIZE {
            let src_x =
                (((x as f64 + 0.5) * src_w as f64 / INPUT_SIZE as f64) as usize).min(src_w - 1);
            let offset = (src_y * src_w + src_x) * 3;
            if offset + 2 < rgb_data.len() {
                for c in 0..3 {
                    tensor[[0, c, y, x]] = (rgb_data[offset + c] as f32 - NORM_MEAN) / NORM_STD;
                }
            }
        }
    }

    tensor
}

fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Dot product of L2-normalized vectors equals cosine similarity.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum()
}
