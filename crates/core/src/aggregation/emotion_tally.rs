use crate::analysis::domain::emotion::Emotion;

/// Per-category emotion counts, zero-filled over all seven categories.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EmotionTally {
    counts: [u32; 7],
}

impl EmotionTally {
    /// Counts every recognised label. Unknown labels are dropped.
    pub fn from_labels<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        let mut tally = Self::default();
        for label in labels {
            if let Some(emotion) = Emotion::parse(label) {
                tally.add(emotion);
            }
        }
        tally
    }

    pub fn add(&mut self, emotion: Emotion) {
        self.counts[emotion.slot()] += 1;
    }

    pub fn get(&self, emotion: Emotion) -> u32 {
        self.counts[emotion.slot()]
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    /// Sum over the charted categories (neutral excluded).
    pub fn charted_total(&self) -> u32 {
        Emotion::CHARTED.iter().map(|&e| self.get(e)).sum()
    }

    /// `(emotion, count)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (Emotion, u32)> + '_ {
        Emotion::ALL.iter().map(move |&e| (e, self.get(e)))
    }

    pub fn merge(&mut self, other: &EmotionTally) {
        for (slot, count) in other.counts.iter().enumerate() {
            self.counts[slot] += count;
        }
    }
}
