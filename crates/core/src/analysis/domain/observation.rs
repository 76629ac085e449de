use crate::shared::region::FaceRegion;

/// One face as read by the classifier in one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Observation {
    pub age: f64,
    pub gender: String,
    pub race: String,
    pub emotion: String,
    pub region: FaceRegion,
}

/// An analyzer hit: the observation plus the detector's confidence, when
/// the analyzer reports one.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectedFace {
    pub observation: Observation,
    pub confidence: Option<f64>,
}
