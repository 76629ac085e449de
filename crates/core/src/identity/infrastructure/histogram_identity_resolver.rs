/// HSV histogram-based identity resolver.
///
/// A fast resolver that compares face crops by their color distribution
/// using 2D Hue-Saturation histograms with Pearson correlation.
/// No ML model required; useful when ArcFace is unavailable.
use std::path::{Path, PathBuf};

use crate::identity::domain::identity_resolver::IdentityResolver;
use crate::identity::infrastructure::gallery_scan::FeatureCache;
use crate::shared::frame::Frame;

pub const DEFAULT_THRESHOLD: f64 = 0.7;

const HUE_BINS: usize = 32;
const SAT_BINS: usize = 32;

pub struct HistogramIdentityResolver {
    threshold: f64,
    cache: FeatureCache<Vec<f64>>,
}

impl HistogramIdentityResolver {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            cache: FeatureCache::new(),
        }
    }
}

impl Default for HistogramIdentityResolver {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl IdentityResolver for HistogramIdentityResolver {
    fn find_match(
        &mut self,
        crop: &Frame,
        gallery_dir: &Path,
    ) -> Result<Option<PathBuf>, Box<dyn std::error::Error>> {
        if crop.width() == 0 || crop.height() == 0 {
            return Ok(None);
        }
        let query = histogram_of(crop);
        self.cache.best_match(
            gallery_dir,
            &query,
            self.threshold,
            |img| Ok(histogram_of(img)),
            |a, b| pearson_correlation(a, b),
        )
    }
}

fn histogram_of(frame: &Frame) -> Vec<f64> {
    compute_histogram(frame.data(), frame.width(), frame.height())
}

fn compute_histogram(rgb_data: &[u8], width: u32, height: u32) -> Vec<f64> {
    let num_pixels = (width * height) as usize;
    let mut hist = vec![0.0f64; HUE_BINS * SAT_BINS];
    let mut count = 0usize;

    for i in 0..num_pixels {
        let offset = i * 3;
        if offset + 2 >= rgb_data.len() {
            break;
        }
        let r = rgb_data[offset] as f64 / 255.0;
        let g = rgb_data[offset + 1] as f64 / 255.0;
        let b = rgb_data[offset + 2] as f64 / 255.0;

        let (h, s, _v) = rgb_to_hsv(r, g, b);

        let h_bin = ((h / 360.0) * HUE_BINS as f64).min(HUE_BINS as f64 - 1.0) as usize;
        let s_bin = (s * SAT_BINS as f64).min(SAT_BINS as f64 - 1.0) as usize;

        hist[h_bin * SAT_BINS + s_bin] += 1.0;
        count += 1;
    }

    if count > 0 {
        let total = count as f64;
        for v in &mut hist {
            *v /= total;
        }
    }

    hist
}

fn rgb_to_hsv(r: f64, g: f64, b: f64) -> (f64, f64, f64) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let v = max;
    let s = if max > 0.0 { delta / max } else { 0.0 };

    let h = if delta == 0.0 {
        0.0
    } else if (max - r).abs() < f64::EPSILON {
        60.0 * (((g - b) / delta) % 6.0)
    } else if (max - g).abs() < f64::EPSILON {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };

    let h = if h < 0.0 { h + 360.0 } else { h };

    (h, s, v)
}

/// Pearson correlation coefficient.
///
/// Returns 1.0 when both inputs have zero variance (identical distributions),
/// and 0.0 when only one has zero variance (undefined, treated as uncorrelated).
fn pearson_correlation(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }

    let mean_a = a[..n].iter().sum::<f64>() / n as f64;
    let mean_b = b[..n].iter().sum::<f64>() / n as f64;

    let (cov, var_a, var_b) = a[..n].iter().zip(&b[..n]).fold(
        (0.0, 0.0, 0.0),
        |(cov, va, vb), (x, y)| {
            let da = x - mean_a;
            let db = y - mean_b;
            (cov + da * db, va + da * da, vb + db * db)
        },
    );

    let denom = (var_a * var_b).sqrt();
    if denom < f64::EPSILON {
        return if var_a < f64::EPSILON && var_b < f64::EPSILON {
            1.0
        } else {
            0.0
        };
    }

    cov / denom
}
