use serde::{Deserialize, Serialize};

use crate::aggregation::aggregate::Aggregate;
use crate::aggregation::emotion_tally::EmotionTally;
use crate::analysis::domain::emotion::Emotion;

/// One exported line per identity. Field order is the CSV column order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    pub age: i32,
    pub gender: String,
    pub race: String,
    pub angry: u32,
    pub disgust: u32,
    pub fear: u32,
    pub happy: u32,
    pub sad: u32,
    pub surprise: u32,
    pub neutral: u32,
}

impl ResultRow {
    pub fn count(&self, emotion: Emotion) -> u32 {
        match emotion {
            Emotion::Angry => self.angry,
            Emotion::Disgust => self.disgust,
            Emotion::Fear => self.fear,
            Emotion::Happy => self.happy,
            Emotion::Sad => self.sad,
            Emotion::Surprise => self.surprise,
            Emotion::Neutral => self.neutral,
        }
    }

    pub fn tally(&self) -> EmotionTally {
        let mut tally = EmotionTally::default();
        for emotion in Emotion::ALL {
            for _ in 0..self.count(emotion) {
                tally.add(emotion);
            }
        }
        tally
    }
}

impl From<&Aggregate> for ResultRow {
    fn from(agg: &Aggregate) -> Self {
        let t = &agg.tally;
        Self {
            age: agg.age,
            gender: agg.gender.clone(),
            race: agg.race.clone(),
            angry: t.get(Emotion::Angry),
            disgust: t.get(Emotion::Disgust),
            fear: t.get(Emotion::Fear),
            happy: t.get(Emotion::Happy),
            sad: t.get(Emotion::Sad),
            surprise: t.get(Emotion::Surprise),
            neutral: t.get(Emotion::Neutral),
        }
    }
}
