use std::sync::Arc;

use tracing::info;

use crate::analyzer::FeedbackAnalyzer;
use crate::error::Result;
use crate::metrics;
use crate::models::{FeedbackRecord, FilterSpec};
use crate::period::Clock;

/// Owns the full feedback collection and the most recent filtered subset.
///
/// Both are held behind `Arc` and swapped whole, so a snapshot taken by a
/// reader never observes a half-applied `load` or `filter`.
#[derive(Debug, Clone)]
pub struct FeedbackRepository {
    records: Arc<[FeedbackRecord]>,
    filtered: Arc<[FeedbackRecord]>,
    generation: u64,
}

impl Default for FeedbackRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedbackRepository {
    pub fn new() -> Self {
        Self {
            records: Arc::from(Vec::new()),
            filtered: Arc::from(Vec::new()),
            generation: 0,
        }
    }

    pub fn with_records(records: Vec<FeedbackRecord>) -> Self {
        let mut repository = Self::new();
        repository.load(records);
        repository
    }

    /// Replaces the collection and clears any previous filter result.
    pub fn load(&mut self, records: Vec<FeedbackRecord>) {
        self.records = Arc::from(records);
        self.filtered = Arc::from(Vec::new());
        self.generation += 1;
        info!(
            records = self.records.len(),
            generation = self.generation,
            "loaded feedback"
        );
    }

    /// Runs `analyzer` over the current collection and stores the result.
    ///
    /// On error the previously stored result is left untouched.
    pub fn filter<C: Clock>(
        &mut self,
        analyzer: &FeedbackAnalyzer<C>,
        spec: &FilterSpec,
    ) -> Result<&[FeedbackRecord]> {
        let filtered = analyzer.filter(&self.records, spec)?;
        self.filtered = Arc::from(filtered);
        Ok(self.filtered())
    }

    pub fn records(&self) -> &[FeedbackRecord] {
        &self.records
    }

    pub fn filtered(&self) -> &[FeedbackRecord] {
        &self.filtered
    }

    pub fn records_snapshot(&self) -> Arc<[FeedbackRecord]> {
        Arc::clone(&self.records)
    }

    pub fn filtered_snapshot(&self) -> Arc<[FeedbackRecord]> {
        Arc::clone(&self.filtered)
    }

    /// Bumped on every `load`; lets callers key caches on the collection.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn total_responses(&self) -> usize {
        metrics::total_responses(&self.records)
    }

    /// Computed over the whole collection, never the filtered subset.
    pub fn satisfaction_score(&self) -> i32 {
        metrics::satisfaction_score(&self.records)
    }
}
