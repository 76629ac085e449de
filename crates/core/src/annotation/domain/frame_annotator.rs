use crate::aggregation::aggregate::Aggregate;
use crate::shared::frame::Frame;
use crate::shared::region::FaceRegion;

/// Text to draw above one face box.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceLabel {
    pub region: FaceRegion,
    pub text: String,
}

impl FaceLabel {
    /// `"<gender>, <age>, <race>, <emotion>"`.
    pub fn from_aggregate(region: FaceRegion, aggregate: &Aggregate) -> Self {
        Self {
            region,
            text: format!(
                "{}, {}, {}, {}",
                aggregate.gender, aggregate.age, aggregate.race, aggregate.emotion
            ),
        }
    }
}

/// Draws face boxes and their labels onto a frame in place.
pub trait FrameAnnotator: Send {
    fn annotate(
        &self,
        frame: &mut Frame,
        labels: &[FaceLabel],
    ) -> Result<(), Box<dyn std::error::Error>>;
}
