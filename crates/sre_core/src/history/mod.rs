//! Bounded, insertion-ordered history of analyses.
//!
//! - FIFO eviction once `capacity` is exceeded
//! - entries are shared as `Arc` and never mutated after insertion
//! - thread-safe via `RwLock`; a poisoned lock is recovered since entries are immutable

use std::collections::VecDeque;
use std::sync::{Arc, PoisonError, RwLock};

use crate::domain::IncidentAnalysis;

pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

#[derive(Debug)]
pub struct AnalysisHistory {
    entries: RwLock<VecDeque<Arc<IncidentAnalysis>>>,
    capacity: usize,
}

impl AnalysisHistory {
    /// A capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        AnalysisHistory {
            entries: RwLock::new(VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_CAPACITY))),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append, evicting the oldest entries until within capacity.
    pub fn record(&self, analysis: IncidentAnalysis) -> Arc<IncidentAnalysis> {
        let stored = Arc::new(analysis);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.push_back(Arc::clone(&stored));
        while entries.len() > self.capacity {
            entries.pop_front();
        }
        stored
    }

    /// Up to `limit` entries, most recent first.
    pub fn recent(&self, limit: usize) -> Vec<Arc<IncidentAnalysis>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.iter().rev().take(limit).cloned().collect()
    }

    pub fn get(&self, id: &str) -> Option<Arc<IncidentAnalysis>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.iter().find(|a| a.id == id).cloned()
    }

    pub fn latest(&self) -> Option<Arc<IncidentAnalysis>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.back().cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl Default for AnalysisHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
