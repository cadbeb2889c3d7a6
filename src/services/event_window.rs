use chrono::{DateTime, Duration, Utc};
use drowsiness_core::EventKind;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::EscalationConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub ts: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: EventKind,
}

impl EventRecord {
    pub fn now(kind: EventKind) -> Self {
        Self { ts: Utc::now(), kind }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestDecision {
    /// Events inside the window after this one was appended.
    pub count: usize,
    pub escalate: bool,
}

/// Sliding window of recent detection events.
///
/// Append, count and the post-escalation reset all happen under one
/// lock, so two concurrent reports can never both observe the threshold.
pub struct EventWindow {
    records: Mutex<Vec<EventRecord>>,
    window: Duration,
    threshold: usize,
}

impl EventWindow {
    pub fn new(window_secs: u64, threshold: usize) -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            window: Duration::seconds(window_secs.min(u64::from(u32::MAX)) as i64),
            threshold: threshold.max(1),
        }
    }

    pub fn from_config(config: &EscalationConfig) -> Self {
        Self::new(config.window_secs, config.threshold)
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn window_secs(&self) -> i64 {
        self.window.num_seconds()
    }

    pub async fn ingest(&self, record: EventRecord) -> IngestDecision {
        let mut records = self.records.lock().await;
        let cutoff = record.ts - self.window;
        records.push(record);
        // 窗口边界上的事件仍计入；窗口外的旧事件只是不计数，留到下次升级时一并清空
        let count = records.iter().filter(|r| r.ts >= cutoff).count();
        let escalate = count >= self.threshold;
        if escalate {
            // 升级后清空，下一轮重新计数
            records.clear();
        }
        IngestDecision { count, escalate }
    }

    /// Current contents in arrival order, including stale records not yet cleared.
    pub async fn snapshot(&self) -> Vec<EventRecord> {
        self.records.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}
