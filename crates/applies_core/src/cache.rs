use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::SubjectId;

pub const CACHE_KEY_PREFIX: &str = "applies:";

/// Persisted record for one subject: `{ applies, at, url }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub applies: f64,
    /// Capture time, epoch milliseconds.
    pub at: i64,
    pub url: String,
}

pub fn cache_key(subject: &SubjectId) -> String {
    format!("{CACHE_KEY_PREFIX}{subject}")
}

pub fn subject_from_cache_key(key: &str) -> Option<SubjectId> {
    key.strip_prefix(CACHE_KEY_PREFIX).and_then(SubjectId::parse)
}

/// Last seen value per subject. Last write wins; entries are never evicted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppliesBoard {
    entries: HashMap<SubjectId, CacheEntry>,
}

impl AppliesBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, subject: SubjectId, entry: CacheEntry) {
        self.entries.insert(subject, entry);
    }

    pub fn get(&self, subject: &SubjectId) -> Option<&CacheEntry> {
        self.entries.get(subject)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(applies: f64) -> CacheEntry {
        CacheEntry {
            applies,
            at: 0,
            url: String::new(),
        }
    }

    #[test]
    fn keys_round_trip_subject() {
        let subject = SubjectId::parse("4100").unwrap();
        assert_eq!(cache_key(&subject), "applies:4100");
        assert_eq!(subject_from_cache_key("applies:4100"), Some(subject));
        assert_eq!(subject_from_cache_key("views:4100"), None);
    }

    #[test]
    fn board_keeps_one_value_per_subject() {
        let mut board = AppliesBoard::new();
        let first = SubjectId::parse("1").unwrap();
        let second = SubjectId::parse("2").unwrap();
        board.record(first.clone(), entry(5.0));
        board.record(second.clone(), entry(9.0));
        board.record(first.clone(), entry(6.0));

        assert_eq!(board.len(), 2);
        assert_eq!(board.get(&first).map(|e| e.applies), Some(6.0));
        assert_eq!(board.get(&second).map(|e| e.applies), Some(9.0));
    }
}
