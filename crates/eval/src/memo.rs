//! Per-stage result cache keyed by the exact input tuple.
//!
//! A cache belongs to one [`Evaluator`](crate::Evaluator) and is not shared
//! between threads. With a capacity, the cache is emptied once full.

use std::collections::HashMap;

use dicedist_core::DiceTuple;

#[derive(Debug, Default)]
pub struct MemoCache {
    entries: HashMap<DiceTuple, DiceTuple>,
    capacity: Option<usize>,
    hits: u64,
    misses: u64,
}

/// Counters summed over every cache of one evaluator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl MemoStats {
    pub fn sum<'a>(caches: impl IntoIterator<Item = &'a MemoCache>) -> Self {
        let mut stats = MemoStats::default();
        for cache in caches {
            cache.add_to(&mut stats);
        }
        stats
    }
}

impl MemoCache {
    pub fn new(capacity: Option<usize>) -> Self {
        MemoCache {
            entries: HashMap::new(),
            capacity,
            hits: 0,
            misses: 0,
        }
    }

    pub fn get(&mut self, input: &[i64]) -> Option<DiceTuple> {
        match self.entries.get(input) {
            Some(found) => {
                self.hits += 1;
                Some(found.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, input: DiceTuple, output: DiceTuple) {
        if let Some(capacity) = self.capacity {
            if capacity == 0 {
                return;
            }
            if self.entries.len() >= capacity {
                tracing::trace!(capacity, "memo cache full, clearing");
                self.entries.clear();
            }
        }
        self.entries.insert(input, output);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn add_to(&self, stats: &mut MemoStats) {
        stats.hits += self.hits;
        stats.misses += self.misses;
        stats.entries += self.entries.len();
    }
}
