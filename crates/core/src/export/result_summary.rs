use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::aggregation::emotion_tally::EmotionTally;
use crate::analysis::domain::emotion::Emotion;
use crate::export::result_exporter::ExportError;
use crate::export::result_row::ResultRow;

const MIN_CHARTED_AGE: i32 = 1;
const MAX_CHARTED_AGE: i32 = 99;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum AgeGroup {
    Under18,
    From18To25,
    From26To40,
    From41To60,
    Over60,
}

impl AgeGroup {
    pub const ALL: [AgeGroup; 5] = [
        AgeGroup::Under18,
        AgeGroup::From18To25,
        AgeGroup::From26To40,
        AgeGroup::From41To60,
        AgeGroup::Over60,
    ];

    pub fn of(age: i32) -> AgeGroup {
        match age {
            i32::MIN..=17 => AgeGroup::Under18,
            18..=25 => AgeGroup::From18To25,
            26..=40 => AgeGroup::From26To40,
            41..=60 => AgeGroup::From41To60,
            _ => AgeGroup::Over60,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgeGroup::Under18 => "<18",
            AgeGroup::From18To25 => "18-25",
            AgeGroup::From26To40 => "26-40",
            AgeGroup::From41To60 => "41-60",
            AgeGroup::Over60 => "60+",
        }
    }
}

/// Counts over the six charted emotions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ChartedEmotions {
    pub angry: u32,
    pub disgust: u32,
    pub fear: u32,
    pub happy: u32,
    pub sad: u32,
    pub surprise: u32,
}

impl From<&EmotionTally> for ChartedEmotions {
    fn from(t: &EmotionTally) -> Self {
        Self {
            angry: t.get(Emotion::Angry),
            disgust: t.get(Emotion::Disgust),
            fear: t.get(Emotion::Fear),
            happy: t.get(Emotion::Happy),
            sad: t.get(Emotion::Sad),
            surprise: t.get(Emotion::Surprise),
        }
    }
}

impl ChartedEmotions {
    pub fn total(&self) -> u32 {
        self.angry + self.disgust + self.fear + self.happy + self.sad + self.surprise
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AgeGroupEmotions {
    pub group: &'static str,
    pub identities: usize,
    pub emotions: ChartedEmotions,
}

/// Chart data derived from exported rows.
///
/// Neutral is left out of every emotion breakdown and reported once as
/// `neutral_total`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResultSummary {
    pub identities: usize,
    pub gender_distribution: BTreeMap<String, usize>,
    /// Identities per integer age, limited to plausible ages.
    pub age_distribution: BTreeMap<i32, usize>,
    pub emotion_totals: ChartedEmotions,
    pub neutral_total: u32,
    pub emotions_by_gender: BTreeMap<String, ChartedEmotions>,
    /// One entry per age group, youngest first, including empty groups.
    pub emotions_by_age_group: Vec<AgeGroupEmotions>,
}

impl ResultSummary {
    pub fn from_rows(rows: &[ResultRow]) -> Self {
        let mut gender_distribution = BTreeMap::new();
        let mut age_distribution = BTreeMap::new();
        let mut overall = EmotionTally::default();
        let mut by_gender: BTreeMap<String, EmotionTally> = BTreeMap::new();
        let mut by_age: BTreeMap<AgeGroup, (usize, EmotionTally)> = AgeGroup::ALL
            .iter()
            .map(|&g| (g, (0, EmotionTally::default())))
            .collect();

        for row in rows {
            let tally = row.tally();
            *gender_distribution.entry(row.gender.clone()).or_insert(0) += 1;
            if (MIN_CHARTED_AGE..=MAX_CHARTED_AGE).contains(&row.age) {
                *age_distribution.entry(row.age).or_insert(0) += 1;
            }
            overall.merge(&tally);
            by_gender.entry(row.gender.clone()).or_default().merge(&tally);
            if let Some((count, group_tally)) = by_age.get_mut(&AgeGroup::of(row.age)) {
                *count += 1;
                group_tally.merge(&tally);
            }
        }

        Self {
            identities: rows.len(),
            gender_distribution,
            age_distribution,
            emotion_totals: ChartedEmotions::from(&overall),
            neutral_total: overall.get(Emotion::Neutral),
            emotions_by_gender: by_gender
                .iter()
                .map(|(g, t)| (g.clone(), ChartedEmotions::from(t)))
                .collect(),
            emotions_by_age_group: by_age
                .iter()
                .map(|(group, (count, t))| AgeGroupEmotions {
                    group: group.label(),
                    identities: *count,
                    emotions: ChartedEmotions::from(t),
                })
                .collect(),
        }
    }

    pub fn write_json(&self, path: &Path) -> Result<(), ExportError> {
        let json = serde_json::to_string_pretty(self).map_err(|source| ExportError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Wrote summary to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::result_exporter::{read_tables, write_rows};
    use rstest::rstest;

    fn row(age: i32, gender: &str, happy: u32, sad: u32, neutral: u32) -> ResultRow {
        ResultRow {
            age,
            gender: gender.into(),
            race: "white".into(),
            angry: 0,
            disgust: 0,
            fear: 0,
            happy,
            sad,
            surprise: 0,
            neutral,
        }
    }

    #[rstest]
    #[case(0, AgeGroup::Under18)]
    #[case(17, AgeGroup::Under18)]
    #[case(18, AgeGroup::From18To25)]
    #[case(25, AgeGroup::From18To25)]
    #[case(26, AgeGroup::From26To40)]
    #[case(40, AgeGroup::From26To40)]
    #[case(41, AgeGroup::From41To60)]
    #[case(60, AgeGroup::From41To60)]
    #[case(61, AgeGroup::Over60)]
    fn test_age_groups(#[case] age: i32, #[case] expected: AgeGroup) {
        assert_eq!(AgeGroup::of(age), expected);
    }

    #[test]
    fn test_empty_rows() {
        let summary = ResultSummary::from_rows(&[]);

        assert_eq!(summary.identities, 0);
        assert!(summary.gender_distribution.is_empty());
        assert_eq!(summary.emotion_totals.total(), 0);
        assert_eq!(summary.emotions_by_age_group.len(), 5);
    }

    #[test]
    fn test_gender_distribution() {
        let rows = vec![
            row(30, "Man", 1, 0, 0),
            row(30, "Woman", 1, 0, 0),
            row(30, "Woman", 1, 0, 0),
        ];

        let summary = ResultSummary::from_rows(&rows);

        assert_eq!(summary.gender_distribution["Man"], 1);
        assert_eq!(summary.gender_distribution["Woman"], 2);
    }

    #[test]
    fn test_neutral_reported_separately() {
        let rows = vec![row(30, "Man", 2, 1, 5), row(50, "Woman", 0, 0, 3)];

        let summary = ResultSummary::from_rows(&rows);

        assert_eq!(summary.emotion_totals.happy, 2);
        assert_eq!(summary.emotion_totals.sad, 1);
        assert_eq!(summary.emotion_totals.total(), 3);
        assert_eq!(summary.neutral_total, 8);
    }

    #[test]
    fn test_emotions_by_gender_and_age_group() {
        let rows = vec![
            row(16, "Man", 1, 0, 0),
            row(30, "Man", 2, 0, 0),
            row(35, "Woman", 0, 4, 1),
        ];

        let summary = ResultSummary::from_rows(&rows);

        assert_eq!(summary.emotions_by_gender["Man"].happy, 3);
        assert_eq!(summary.emotions_by_gender["Woman"].sad, 4);

        let groups: Vec<_> = summary.emotions_by_age_group.iter().map(|g| g.group).collect();
        assert_eq!(groups, vec!["<18", "18-25", "26-40", "41-60", "60+"]);
        let adults = &summary.emotions_by_age_group[2];
        assert_eq!(adults.identities, 2);
        assert_eq!(adults.emotions.happy, 2);
        assert_eq!(adults.emotions.sad, 4);
        assert_eq!(summary.emotions_by_age_group[1].identities, 0);
    }

    #[test]
    fn test_age_distribution_ignores_implausible_ages() {
        let rows = vec![row(0, "Man", 1, 0, 0), row(30, "Man", 1, 0, 0), row(120, "Man", 1, 0, 0)];

        let summary = ResultSummary::from_rows(&rows);

        assert_eq!(summary.age_distribution.len(), 1);
        assert_eq!(summary.age_distribution[&30], 1);
    }

    #[test]
    fn test_write_json() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("summary.json");

        ResultSummary::from_rows(&[row(30, "Man", 1, 0, 2)])
            .write_json(&path)
            .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["identities"], 1);
        assert_eq!(value["neutral_total"], 2);
        assert_eq!(value["emotion_totals"]["happy"], 1);
        assert!(value["emotion_totals"].get("neutral").is_none());
        assert_eq!(value["emotions_by_age_group"][2]["group"], "26-40");
    }

    #[test]
    fn test_summary_over_two_tables() {
        let tmp = tempfile::TempDir::new().unwrap();
        let morning = tmp.path().join("morning.csv");
        let evening = tmp.path().join("evening.csv");
        write_rows(&[row(30, "Man", 2, 0, 1), row(20, "Woman", 0, 1, 0)], &morning).unwrap();
        write_rows(&[row(45, "Woman", 1, 3, 2)], &evening).unwrap();

        let rows = read_tables(&[morning, evening]).unwrap();
        let summary = ResultSummary::from_rows(&rows);

        assert_eq!(summary.identities, 3);
        assert_eq!(summary.gender_distribution["Man"], 1);
        assert_eq!(summary.gender_distribution["Woman"], 2);
        assert_eq!(summary.emotion_totals.happy, 3);
        assert_eq!(summary.emotion_totals.sad, 4);
        assert_eq!(summary.neutral_total, 3);
        assert_eq!(summary.emotions_by_gender["Woman"].sad, 4);
        assert_eq!(summary.emotions_by_age_group[3].identities, 1);
    }
}
