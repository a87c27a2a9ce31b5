//! Shared mutable state for the live batch and classification progress.
//!
//! Every mutation replaces the whole collection with a new one derived
//! from the old, so update-in-place races stay visible and auditable.

use crate::models::FileRecord;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct BatchStore {
    records: Mutex<Vec<FileRecord>>,
}

impl BatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<FileRecord> {
        self.records.lock().expect("batch store poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().expect("batch store poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a fully settled intake batch in one step.
    pub fn append_all(&self, batch: Vec<FileRecord>) {
        self.replace(|mut records| {
            records.extend(batch);
            records
        });
    }

    pub fn remove(&self, id: &str) {
        self.replace(|records| records.into_iter().filter(|r| r.id != id).collect());
    }

    pub fn clear(&self) {
        self.replace(|_| Vec::new());
    }

    /// Rewrite one record by id, leaving the rest untouched.
    pub fn update<F>(&self, id: &str, mutate: F)
    where
        F: FnOnce(&mut FileRecord),
    {
        let mut mutate = Some(mutate);
        self.replace(|records| {
            records
                .into_iter()
                .map(|mut record| {
                    if record.id == id {
                        if let Some(mutate) = mutate.take() {
                            mutate(&mut record);
                        }
                    }
                    record
                })
                .collect()
        });
    }

    pub fn replace<F>(&self, derive: F)
    where
        F: FnOnce(Vec<FileRecord>) -> Vec<FileRecord>,
    {
        let mut guard = self.records.lock().expect("batch store poisoned");
        let current = std::mem::take(&mut *guard);
        *guard = derive(current);
    }
}

/// Settled/total counters for one orchestration run. `settled` increments
/// exactly once per record, regardless of window boundaries.
#[derive(Debug, Default)]
pub struct Progress {
    settled: AtomicUsize,
    total: AtomicUsize,
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self, total: usize) {
        self.settled.store(0, Ordering::SeqCst);
        self.total.store(total, Ordering::SeqCst);
    }

    pub fn record_settled(&self) {
        self.settled.fetch_add(1, Ordering::SeqCst);
    }

    pub fn settled(&self) -> usize {
        self.settled.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    pub fn percent(&self) -> u8 {
        let total = self.total();
        if total == 0 {
            return 0;
        }
        ((self.settled() * 100) / total) as u8
    }
}
