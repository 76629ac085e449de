use std::fmt;

use crate::aggregation::aggregate::{aggregate, Aggregate, AggregationPolicy};
use crate::analysis::domain::observation::Observation;

/// Opaque identity handle minted by the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey(u32);

impl IdentityKey {
    pub(crate) fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "face-{}", self.0)
    }
}

/// One tracked person and everything observed about them, in frame order.
#[derive(Clone, Debug, PartialEq)]
pub struct Identity {
    key: IdentityKey,
    observations: Vec<Observation>,
}

impl Identity {
    pub fn new(key: IdentityKey) -> Self {
        Self {
            key,
            observations: Vec::new(),
        }
    }

    pub fn key(&self) -> IdentityKey {
        self.key
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub(crate) fn push(&mut self, observation: Observation) {
        self.observations.push(observation);
    }

    pub fn aggregate(&self, policy: &AggregationPolicy) -> Option<Aggregate> {
        aggregate(&self.observations, policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::region::FaceRegion;

    #[test]
    fn test_key_display() {
        assert_eq!(IdentityKey::new(3).to_string(), "face-3");
    }

    #[test]
    fn test_new_identity_has_no_aggregate() {
        let identity = Identity::new(IdentityKey::new(0));
        assert!(identity.observations().is_empty());
        assert!(identity.aggregate(&AggregationPolicy::default()).is_none());
    }

    #[test]
    fn test_push_keeps_order() {
        let mut identity = Identity::new(IdentityKey::new(0));
        for emotion in ["happy", "sad"] {
            identity.push(Observation {
                age: 20.0,
                gender: "Woman".into(),
                race: "white".into(),
                emotion: emotion.into(),
                region: FaceRegion::new(0, 0, 5, 5),
            });
        }

        let emotions: Vec<_> = identity
            .observations()
            .iter()
            .map(|o| o.emotion.as_str())
            .collect();
        assert_eq!(emotions, vec!["happy", "sad"]);
        assert_eq!(
            identity.aggregate(&AggregationPolicy::default()).unwrap().emotion,
            "sad"
        );
    }
}
