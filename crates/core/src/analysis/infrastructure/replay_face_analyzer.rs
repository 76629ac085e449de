use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::domain::face_analyzer::FaceAnalyzer;
use crate::analysis::domain::observation::{DetectedFace, Observation};
use crate::shared::frame::Frame;
use crate::shared::region::FaceRegion;

#[derive(Error, Debug)]
pub enum AnalysisLoadError {
    #[error("failed to read analysis file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid analysis file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Classifier output for one decoded frame.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FrameRecord {
    pub frame: usize,
    #[serde(default)]
    pub faces: Vec<FaceRecord>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FaceRecord {
    pub age: f64,
    pub dominant_gender: String,
    pub dominant_race: String,
    pub dominant_emotion: String,
    #[serde(default)]
    pub face_confidence: Option<f64>,
    pub region: RegionRecord,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct RegionRecord {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl From<&FaceRecord> for DetectedFace {
    fn from(record: &FaceRecord) -> Self {
        DetectedFace {
            observation: Observation {
                age: record.age,
                gender: record.dominant_gender.clone(),
                race: record.dominant_race.clone(),
                emotion: record.dominant_emotion.clone(),
                region: FaceRegion::new(
                    record.region.x,
                    record.region.y,
                    record.region.w,
                    record.region.h,
                ),
            },
            confidence: record.face_confidence,
        }
    }
}

/// Replays pre-computed classifier output by frame index.
///
/// The classifier runs out of process and writes one record per frame; this
/// analyzer serves those results back in decode order. Frames without a
/// record yield no faces.
pub struct ReplayFaceAnalyzer {
    faces: HashMap<usize, Vec<DetectedFace>>,
}

impl ReplayFaceAnalyzer {
    pub fn from_path(path: &Path) -> Result<Self, AnalysisLoadError> {
        let text = fs::read_to_string(path).map_err(|source| AnalysisLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let records: Vec<FrameRecord> =
            serde_json::from_str(&text).map_err(|source| AnalysisLoadError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        log::info!(
            "Loaded analysis for {} frames from {}",
            records.len(),
            path.display()
        );
        Ok(Self::from_records(records))
    }

    /// Later records for the same frame extend earlier ones.
    pub fn from_records(records: Vec<FrameRecord>) -> Self {
        let mut faces: HashMap<usize, Vec<DetectedFace>> = HashMap::new();
        for record in &records {
            faces
                .entry(record.frame)
                .or_default()
                .extend(record.faces.iter().map(DetectedFace::from));
        }
        Self { faces }
    }

    pub fn frame_count(&self) -> usize {
        self.faces.len()
    }
}

impl FaceAnalyzer for ReplayFaceAnalyzer {
    fn analyze(&mut self, frame: &Frame) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>> {
        Ok(self.faces.get(&frame.index()).cloned().unwrap_or_default())
    }
}
