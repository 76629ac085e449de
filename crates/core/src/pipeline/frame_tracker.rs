use std::time::Instant;

use crate::aggregation::aggregate::AggregationPolicy;
use crate::analysis::domain::face_analyzer::FaceAnalyzer;
use crate::annotation::domain::frame_annotator::{FaceLabel, FrameAnnotator};
use crate::identity::domain::identity_store::FaceIdentityStore;
use crate::shared::frame::Frame;

use super::pipeline_logger::{elapsed_ms, PipelineLogger};

/// Per-frame step of a run: analyze, attribute each face to an identity,
/// then draw the identity's current verdict.
pub struct FrameTracker {
    analyzer: Box<dyn FaceAnalyzer>,
    store: FaceIdentityStore,
    annotator: Box<dyn FrameAnnotator>,
    policy: AggregationPolicy,
}

impl FrameTracker {
    pub fn new(
        analyzer: Box<dyn FaceAnalyzer>,
        store: FaceIdentityStore,
        annotator: Box<dyn FrameAnnotator>,
        policy: AggregationPolicy,
    ) -> Self {
        Self {
            analyzer,
            store,
            annotator,
            policy,
        }
    }

    /// Tracks the faces in `frame` and annotates it in place. Returns the
    /// number of faces drawn.
    ///
    /// Analyzer failures are logged and the frame passes through untouched.
    /// Gallery and annotation failures end the run.
    pub fn track(
        &mut self,
        frame: &mut Frame,
        logger: &mut dyn PipelineLogger,
    ) -> Result<usize, Box<dyn std::error::Error>> {
        let frame_number = frame.number();

        let t = Instant::now();
        let detected = match self.analyzer.analyze(frame) {
            Ok(faces) => faces,
            Err(e) => {
                log::warn!("Face analysis failed on frame {frame_number}: {e}");
                Vec::new()
            }
        };
        logger.timing("analyze", elapsed_ms(t));

        let t = Instant::now();
        let mut labels = Vec::with_capacity(detected.len());
        for (ordinal, face) in detected.into_iter().enumerate() {
            let region = face.observation.region;
            if region.is_full_frame(frame.width(), frame.height()) {
                log::debug!("Frame {frame_number}: ignoring full-frame box");
                continue;
            }
            let Some(crop) = frame.crop(&region) else {
                log::warn!("Frame {frame_number}: face {ordinal} lies outside the frame");
                continue;
            };

            let key = self.store.resolve_or_create(&crop, frame_number, ordinal)?;
            self.store.record(key, face.observation)?;
            if let Some(verdict) = self.store.get(key).and_then(|i| i.aggregate(&self.policy)) {
                labels.push(FaceLabel::from_aggregate(region, &verdict));
            }
        }
        logger.timing("identify", elapsed_ms(t));

        if !labels.is_empty() {
            let t = Instant::now();
            self.annotator.annotate(frame, &labels)?;
            logger.timing("annotate", elapsed_ms(t));
        }

        Ok(labels.len())
    }

    pub fn store(&self) -> &FaceIdentityStore {
        &self.store
    }

    pub fn into_store(self) -> FaceIdentityStore {
        self.store
    }
}
