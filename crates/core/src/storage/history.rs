use crate::domain::fortune::HistoryRecord;
use crate::storage::kv::KvStore;
use anyhow::Context;
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;

pub const STORAGE_KEY: &str = "fortune_history";
pub const MAX_RECORDS: usize = 30;

/// Capacity-bounded, date-keyed log of daily fortune snapshots over an
/// injected key-value backend. Not safe against concurrent writers; writes
/// are last-write-wins.
#[derive(Clone)]
pub struct HistoryStore {
    kv: Arc<dyn KvStore>,
    key: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStats {
    pub total: usize,
    pub avg_score: u8,
    pub max_record: HistoryRecord,
    pub min_record: HistoryRecord,
}

impl HistoryStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self::with_key(kv, STORAGE_KEY)
    }

    pub fn with_key(kv: Arc<dyn KvStore>, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
        }
    }

    /// Saves one record, replacing any record with the same date and evicting
    /// the oldest entries past `MAX_RECORDS`. Storage failures are logged and
    /// swallowed; the caller's day continues either way.
    pub async fn append(&self, record: HistoryRecord) {
        if let Err(err) = self.try_append(&record).await {
            tracing::error!(date = %record.date, error = %err, "failed to save history record");
        }
    }

    async fn try_append(&self, record: &HistoryRecord) -> anyhow::Result<()> {
        let mut records = self.list().await;
        records.retain(|existing| existing.date != record.date);
        records.insert(0, record.clone());
        records.truncate(MAX_RECORDS);

        let payload = serde_json::to_string(&records).context("serialize history failed")?;
        self.kv.set(&self.key, &payload).await
    }

    /// All records, most recent capture first. Read or parse failures are
    /// logged and collapse to an empty list.
    pub async fn list(&self) -> Vec<HistoryRecord> {
        match self.try_list().await {
            Ok(records) => records,
            Err(err) => {
                tracing::error!(error = %err, "failed to load history");
                Vec::new()
            }
        }
    }

    async fn try_list(&self) -> anyhow::Result<Vec<HistoryRecord>> {
        let Some(raw) = self.kv.get(&self.key).await? else {
            return Ok(Vec::new());
        };
        let mut records: Vec<HistoryRecord> =
            serde_json::from_str(&raw).context("history payload is not a valid record array")?;
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(records)
    }

    pub async fn clear(&self) {
        if let Err(err) = self.kv.delete(&self.key).await {
            tracing::error!(error = %err, "failed to clear history");
        }
    }

    pub async fn stats(&self) -> Option<HistoryStats> {
        let records = self.list().await;
        stats_of(&records)
    }

    pub async fn score_for(&self, date: NaiveDate) -> Option<u8> {
        self.list()
            .await
            .iter()
            .find(|record| record.date == date)
            .map(|record| record.fortune.total_score)
    }
}

/// Max/min keep the first record seen while folding over the
/// recency-descending list, so the newer of two tied records wins.
pub fn stats_of(records: &[HistoryRecord]) -> Option<HistoryStats> {
    let (first, rest) = records.split_first()?;

    let sum: u32 = records
        .iter()
        .map(|record| record.fortune.total_score as u32)
        .sum();
    let avg_score = (sum as f64 / records.len() as f64).round() as u8;

    let mut max_record = first;
    let mut min_record = first;
    for record in rest {
        if record.fortune.total_score > max_record.fortune.total_score {
            max_record = record;
        }
        if record.fortune.total_score < min_record.fortune.total_score {
            min_record = record;
        }
    }

    Some(HistoryStats {
        total: records.len(),
        avg_score,
        max_record: max_record.clone(),
        min_record: min_record.clone(),
    })
}
