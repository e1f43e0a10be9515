// src/keyspace.rs
//
// Fixed key space shared read-only by every worker.

use std::sync::Arc;

/// Build `count` keys of the form `{prefix}{index}`, indices starting at 0.
pub fn generate_keys(count: usize, prefix: &str) -> Vec<String> {
    (0..count).map(|i| format!("{}{}", prefix, i)).collect()
}

/// Immutable, cheaply clonable key space
#[derive(Debug, Clone)]
pub struct KeySpace {
    keys: Arc<[String]>,
}

impl KeySpace {
    pub fn new(count: usize, prefix: &str) -> Self {
        Self {
            keys: generate_keys(count, prefix).into(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Key at `idx`; callers draw `idx` from `0..len()`
    #[inline]
    pub fn get(&self, idx: usize) -> Option<&str> {
        self.keys.get(idx).map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.keys
    }
}
