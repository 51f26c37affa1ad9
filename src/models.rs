use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// One recorded click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickEvent {
    pub timestamp: DateTime<Utc>,
    pub interval_since_last_click: Duration,
}

impl ClickEvent {
    pub fn new(timestamp: DateTime<Utc>, interval_since_last_click: Duration) -> Self {
        Self {
            timestamp,
            interval_since_last_click,
        }
    }
}

/// Per-session counters. Transitions return a new value instead of mutating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionState {
    pub session_start: DateTime<Utc>,
    pub last_click_time: DateTime<Utc>,
    pub click_count: u64,
}

impl SessionState {
    pub fn new(session_start: DateTime<Utc>) -> Self {
        Self {
            session_start,
            last_click_time: session_start,
            click_count: 0,
        }
    }

    pub fn record_click(self, timestamp: DateTime<Utc>) -> Self {
        Self {
            last_click_time: timestamp,
            click_count: self.click_count.saturating_add(1),
            ..self
        }
    }

    /// Drops the count back to zero. Session start and last click time survive.
    pub fn cleared(self) -> Self {
        Self {
            click_count: 0,
            ..self
        }
    }
}

/// A fixed-width time window and the number of events that fell in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    pub index: usize,
    pub window_start: Duration,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_clicks: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_seconds: i64,
    pub seconds_since_last_click: i64,
    pub average_clicks_per_minute: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub click_number: u64,
    pub timestamp: DateTime<Utc>,
    pub interval_ms: i64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickOutcome {
    pub stats: SessionStats,
    pub entry: HistoryEntry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramBar {
    pub index: usize,
    pub label: String,
    pub count: usize,
    pub bar: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Histogram {
    pub bucket_seconds: u32,
    pub total_buckets: usize,
    pub max_count: usize,
    pub bars: Vec<HistogramBar>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PeakActivity {
    NotApplicable,
    CurrentMinute { count: usize },
    Minute { index: usize, count: usize },
}

impl PeakActivity {
    pub fn describe(&self) -> String {
        match self {
            PeakActivity::NotApplicable => "not applicable".to_string(),
            PeakActivity::CurrentMinute { count } => format!("current minute ({count} clicks)"),
            PeakActivity::Minute { index, count } => format!("minute {index} ({count} clicks)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub filename: String,
    pub mime_type: &'static str,
    pub content: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionCreated {
    pub session_id: u64,
    pub session_start: DateTime<Utc>,
}
