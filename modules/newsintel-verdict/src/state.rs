//! The subject-state registry: the latest score/label per subject,
//! updated monotonically in time (I4).

use std::collections::HashMap;
use std::sync::RwLock;

use newsintel_common::SubjectState;

#[derive(Default)]
pub struct SubjectStateRegistry {
    states: RwLock<HashMap<String, SubjectState>>,
}

impl SubjectStateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `candidate` only if it is newer than (or there is no)
    /// existing state for the subject. Returns `true` if applied.
    pub fn update_if_newer(&self, candidate: SubjectState) -> bool {
        let mut states = self.states.write().expect("subject state lock poisoned");
        match states.get(&candidate.subject) {
            Some(existing) if existing.last_updated >= candidate.last_updated => false,
            _ => {
                states.insert(candidate.subject.clone(), candidate);
                true
            }
        }
    }

    pub fn get(&self, subject: &str) -> Option<SubjectState> {
        self.states
            .read()
            .expect("subject state lock poisoned")
            .get(subject)
            .cloned()
    }

    pub fn snapshot(&self) -> Vec<SubjectState> {
        self.states
            .read()
            .expect("subject state lock poisoned")
            .values()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use newsintel_common::SentimentLabel;

    fn state(subject: &str, last_updated: chrono::DateTime<Utc>) -> SubjectState {
        SubjectState {
            subject: subject.to_string(),
            score: 0.1,
            label: SentimentLabel::Neutral,
            last_updated,
        }
    }

    #[test]
    fn older_update_is_rejected() {
        let registry = SubjectStateRegistry::new();
        let now = Utc::now();
        assert!(registry.update_if_newer(state("AAPL", now)));
        assert!(!registry.update_if_newer(state("AAPL", now - Duration::seconds(1))));
        assert_eq!(registry.get("AAPL").unwrap().last_updated, now);
    }

    #[test]
    fn newer_update_is_applied() {
        let registry = SubjectStateRegistry::new();
        let now = Utc::now();
        registry.update_if_newer(state("AAPL", now));
        assert!(registry.update_if_newer(state("AAPL", now + Duration::seconds(1))));
    }
}
