use std::collections::HashMap;

use crate::aggregation::emotion_tally::EmotionTally;
use crate::analysis::domain::observation::Observation;

pub const MAN: &str = "Man";
pub const WOMAN: &str = "Woman";

/// Which label wins when `Man` and `Woman` have equal votes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GenderTiePolicy {
    #[default]
    PreferWoman,
    PreferMan,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AggregationPolicy {
    pub gender_tie: GenderTiePolicy,
}

/// Current verdict for one identity.
#[derive(Clone, Debug, PartialEq)]
pub struct Aggregate {
    pub gender: String,
    pub race: String,
    pub age: i32,
    /// Emotion of the latest observation.
    pub emotion: String,
    pub tally: EmotionTally,
}

/// Reduces an observation history. Returns `None` for an empty history.
pub fn aggregate(observations: &[Observation], policy: &AggregationPolicy) -> Option<Aggregate> {
    let last = observations.last()?;
    Some(Aggregate {
        gender: dominant_gender(observations, policy.gender_tie).to_string(),
        race: dominant_race(observations)?,
        age: mean_age(observations)?,
        emotion: last.emotion.clone(),
        tally: EmotionTally::from_labels(observations.iter().map(|o| o.emotion.as_str())),
    })
}

/// Majority vote between `Man` and `Woman`; other labels are not counted.
pub fn dominant_gender(observations: &[Observation], tie: GenderTiePolicy) -> &'static str {
    let men = observations.iter().filter(|o| o.gender == MAN).count();
    let women = observations.iter().filter(|o| o.gender == WOMAN).count();
    match men.cmp(&women) {
        std::cmp::Ordering::Greater => MAN,
        std::cmp::Ordering::Less => WOMAN,
        std::cmp::Ordering::Equal => match tie {
            GenderTiePolicy::PreferWoman => WOMAN,
            GenderTiePolicy::PreferMan => MAN,
        },
    }
}

/// Most frequent race label; ties go to the label seen first.
pub fn dominant_race(observations: &[Observation]) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();
    for o in observations {
        let count = counts.entry(o.race.as_str()).or_insert(0);
        if *count == 0 {
            first_seen.push(o.race.as_str());
        }
        *count += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for label in first_seen {
        let count = counts[label];
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((label, count));
        }
    }
    best.map(|(label, _)| label.to_string())
}

/// Arithmetic mean truncated toward zero.
pub fn mean_age(observations: &[Observation]) -> Option<i32> {
    if observations.is_empty() {
        return None;
    }
    let sum: f64 = observations.iter().map(|o| o.age).sum();
    Some((sum / observations.len() as f64).trunc() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::domain::emotion::Emotion;
    use crate::shared::region::FaceRegion;
    use rstest::rstest;

    fn obs(age: f64, gender: &str, race: &str, emotion: &str) -> Observation {
        Observation {
            age,
            gender: gender.to_string(),
            race: race.to_string(),
            emotion: emotion.to_string(),
            region: FaceRegion::new(0, 0, 10, 10),
        }
    }

    fn genders(labels: &[&str]) -> Vec<Observation> {
        labels.iter().map(|g| obs(30.0, g, "white", "happy")).collect()
    }

    #[test]
    fn test_empty_history_has_no_aggregate() {
        assert_eq!(aggregate(&[], &AggregationPolicy::default()), None);
    }

    #[test]
    fn test_single_observation() {
        let history = vec![obs(34.7, "Man", "asian", "sad")];

        let agg = aggregate(&history, &AggregationPolicy::default()).unwrap();

        assert_eq!(agg.gender, "Man");
        assert_eq!(agg.race, "asian");
        assert_eq!(agg.age, 34);
        assert_eq!(agg.emotion, "sad");
        assert_eq!(agg.tally.get(Emotion::Sad), 1);
        assert_eq!(agg.tally.total(), 1);
    }

    #[rstest]
    #[case::man_majority(&["Man", "Man", "Woman"], GenderTiePolicy::PreferWoman, "Man")]
    #[case::woman_majority(&["Woman", "Man", "Woman"], GenderTiePolicy::PreferMan, "Woman")]
    #[case::tie_prefers_woman(&["Man", "Woman"], GenderTiePolicy::PreferWoman, "Woman")]
    #[case::tie_prefers_man(&["Man", "Woman"], GenderTiePolicy::PreferMan, "Man")]
    #[case::unknown_labels_ignored(&["unknown", "unknown", "Man"], GenderTiePolicy::PreferWoman, "Man")]
    #[case::all_unknown_is_tie(&["unknown"], GenderTiePolicy::PreferWoman, "Woman")]
    #[case::all_unknown_is_tie_man(&["unknown"], GenderTiePolicy::PreferMan, "Man")]
    fn test_dominant_gender(
        #[case] labels: &[&str],
        #[case] tie: GenderTiePolicy,
        #[case] expected: &str,
    ) {
        assert_eq!(dominant_gender(&genders(labels), tie), expected);
    }

    #[test]
    fn test_default_policy_prefers_woman() {
        assert_eq!(
            AggregationPolicy::default().gender_tie,
            GenderTiePolicy::PreferWoman
        );
    }

    #[test]
    fn test_dominant_race_majority() {
        let history = vec![
            obs(30.0, "Man", "white", "happy"),
            obs(30.0, "Man", "asian", "happy"),
            obs(30.0, "Man", "asian", "happy"),
        ];
        assert_eq!(dominant_race(&history).as_deref(), Some("asian"));
    }

    #[test]
    fn test_dominant_race_tie_goes_to_first_seen() {
        let history = vec![
            obs(30.0, "Man", "latino hispanic", "happy"),
            obs(30.0, "Man", "black", "happy"),
            obs(30.0, "Man", "black", "happy"),
            obs(30.0, "Man", "latino hispanic", "happy"),
        ];
        assert_eq!(dominant_race(&history).as_deref(), Some("latino hispanic"));
    }

    #[rstest]
    #[case(&[30.0, 31.0], 30)]
    #[case(&[20.0, 21.0, 23.0], 21)]
    #[case(&[20.0, 21.0, 25.0], 22)]
    #[case(&[29.99], 29)]
    #[case(&[0.4], 0)]
    fn test_mean_age_truncates(#[case] ages: &[f64], #[case] expected: i32) {
        let history: Vec<_> = ages.iter().map(|&a| obs(a, "Man", "white", "happy")).collect();
        assert_eq!(mean_age(&history), Some(expected));
    }

    #[test]
    fn test_emotion_is_latest_not_majority() {
        let history = vec![
            obs(30.0, "Man", "white", "happy"),
            obs(30.0, "Man", "white", "happy"),
            obs(30.0, "Man", "white", "angry"),
        ];

        let agg = aggregate(&history, &AggregationPolicy::default()).unwrap();

        assert_eq!(agg.emotion, "angry");
        assert_eq!(agg.tally.get(Emotion::Happy), 2);
        assert_eq!(agg.tally.get(Emotion::Angry), 1);
    }

    #[test]
    fn test_tally_sum_matches_recognised_observations() {
        let history = vec![
            obs(30.0, "Man", "white", "happy"),
            obs(30.0, "Man", "white", "Neutral"),
            obs(30.0, "Man", "white", "FEAR"),
            obs(30.0, "Man", "white", "surprise"),
        ];

        let agg = aggregate(&history, &AggregationPolicy::default()).unwrap();

        assert_eq!(agg.tally.total() as usize, history.len());
    }
}
