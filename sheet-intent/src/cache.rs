//! Memoised classifications keyed by normalised input.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::types::Classification;

/// Diagnostic snapshot of the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub keys: Vec<String>,
}

/// Per-classifier cache. Entries only ever hold fully validated results.
#[derive(Debug, Default)]
pub struct ClassificationCache {
    entries: Mutex<HashMap<String, Classification>>,
}

impl ClassificationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lower-cased, trimmed key.
    pub fn key(text: &str) -> String {
        text.trim().to_lowercase()
    }

    pub fn get(&self, text: &str) -> Option<Classification> {
        let key = Self::key(text);
        self.entries.lock().ok()?.get(&key).cloned()
    }

    pub fn set(&self, text: &str, classification: Classification) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(Self::key(text), classification);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size and sorted key list.
    pub fn stats(&self) -> CacheStats {
        let mut keys: Vec<String> = self
            .entries
            .lock()
            .map(|e| e.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        CacheStats {
            size: keys.len(),
            keys,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Intent, Target};
    use pretty_assertions::assert_eq;

    fn sample() -> Classification {
        Classification::new(Intent::Sort, "sort_data", Target::all_data(), 0.9, "test")
    }

    #[test]
    fn keys_are_normalised() {
        let cache = ClassificationCache::new();
        cache.set("  Sort The Data ", sample());
        assert_eq!(cache.get("sort the data"), Some(sample()));
        assert_eq!(cache.get("SORT THE DATA"), Some(sample()));
        assert!(cache.get("sort").is_none());
    }

    #[test]
    fn stats_and_clear() {
        let cache = ClassificationCache::new();
        cache.set("b", sample());
        cache.set("a", sample());
        assert_eq!(
            cache.stats(),
            CacheStats {
                size: 2,
                keys: vec!["a".to_string(), "b".to_string()]
            }
        );
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().size, 0);
    }
}
