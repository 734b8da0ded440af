//! Ordered lookup tables for factor scoring.

use std::fmt::Debug;

/// Half-open numeric bucket table.
///
/// Buckets are contiguous and ascending: `[lower, b0) → s0, [b0, b1) → s1, ...`,
/// and anything at or above the last bound gets `fallback`. The first matching
/// bucket wins. Values below `lower` fall into the first bucket.
#[derive(Debug, Clone, Copy)]
pub struct BucketTable {
    lower: f64,
    /// (exclusive upper bound, score), ascending by bound
    buckets: &'static [(f64, f64)],
    fallback: f64,
}

impl BucketTable {
    pub const fn new(lower: f64, buckets: &'static [(f64, f64)], fallback: f64) -> Self {
        Self {
            lower,
            buckets,
            fallback,
        }
    }

    /// Score for `value`.
    pub fn score(&self, value: f64) -> f64 {
        self.buckets
            .iter()
            .find(|(upper, _)| value < *upper)
            .map(|(_, score)| *score)
            .unwrap_or(self.fallback)
    }

    /// Human-readable label of the bucket `value` falls into, e.g. "[2, 5)".
    pub fn label(&self, value: f64) -> String {
        let mut lower = self.lower;
        for (upper, _) in self.buckets {
            if value < *upper {
                return format!("[{}, {})", lower, upper);
            }
            lower = *upper;
        }
        format!(">= {}", lower)
    }
}

/// Keyed score table with a default for unlisted keys.
#[derive(Debug, Clone, Copy)]
pub struct LookupTable<K: 'static> {
    entries: &'static [(K, f64)],
    default: f64,
}

impl<K: 'static> LookupTable<K> {
    pub const fn new(entries: &'static [(K, f64)], default: f64) -> Self {
        Self { entries, default }
    }
}

impl<K: PartialEq + Copy + Debug + 'static> LookupTable<K> {
    pub fn get(&self, key: K) -> f64 {
        self.entries
            .iter()
            .find(|(entry, _)| *entry == key)
            .map(|(_, score)| *score)
            .unwrap_or(self.default)
    }

    /// Score for an optional key; `None` maps to the default.
    pub fn get_or_default(&self, key: Option<K>) -> f64 {
        key.map(|k| self.get(k)).unwrap_or(self.default)
    }
}
