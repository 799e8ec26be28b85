//! Durable backing for feedback records and aggregates.

use super::{FeedbackError, FeedbackRecord, PerformanceAggregate};
use crate::style::ConversationStyle;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

/// Number of feedback records received on one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub feedback_count: u64,
}

/// Persistence seam for the feedback store.
///
/// Implementations must be safe to call from many request tasks at once.
pub trait FeedbackStorage: Send + Sync {
    /// Persist `record` together with the aggregate that now includes it.
    ///
    /// Both writes land or neither does; on error the storage is unchanged.
    fn record(
        &self,
        record: &FeedbackRecord,
        aggregate: &PerformanceAggregate,
    ) -> Result<(), FeedbackError>;

    fn load_aggregates(&self) -> Result<Vec<PerformanceAggregate>, FeedbackError>;

    /// Per-day record counts for records at or after `since`, oldest first.
    fn daily_counts(&self, since: DateTime<Utc>) -> Result<Vec<DailyCount>, FeedbackError>;

    fn record_count(&self) -> Result<u64, FeedbackError>;
}

/// Process-local storage, used when no database path is configured and in tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    records: Mutex<Vec<FeedbackRecord>>,
    aggregates: Mutex<HashMap<(String, ConversationStyle), PerformanceAggregate>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn records(&self) -> Vec<FeedbackRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> FeedbackError {
    FeedbackError::Storage("memory storage lock poisoned".to_string())
}

impl FeedbackStorage for MemoryStorage {
    fn record(
        &self,
        record: &FeedbackRecord,
        aggregate: &PerformanceAggregate,
    ) -> Result<(), FeedbackError> {
        // Take both locks before mutating either.
        let mut records = self.records.lock().map_err(poisoned)?;
        let mut aggregates = self.aggregates.lock().map_err(poisoned)?;
        records.push(record.clone());
        aggregates.insert(
            (aggregate.backend.clone(), aggregate.style),
            aggregate.clone(),
        );
        Ok(())
    }

    fn load_aggregates(&self) -> Result<Vec<PerformanceAggregate>, FeedbackError> {
        Ok(self
            .aggregates
            .lock()
            .map_err(poisoned)?
            .values()
            .cloned()
            .collect())
    }

    fn daily_counts(&self, since: DateTime<Utc>) -> Result<Vec<DailyCount>, FeedbackError> {
        let records = self.records.lock().map_err(poisoned)?;
        let mut by_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();
        for record in records.iter().filter(|r| r.timestamp >= since) {
            *by_day.entry(record.timestamp.date_naive()).or_default() += 1;
        }
        Ok(by_day
            .into_iter()
            .map(|(date, feedback_count)| DailyCount {
                date,
                feedback_count,
            })
            .collect())
    }

    fn record_count(&self) -> Result<u64, FeedbackError> {
        Ok(self.records.lock().map_err(poisoned)?.len() as u64)
    }
}
