use crate::errors::EngineError;
use crate::export::{export_csv, format_timestamp};
use crate::histogram::{build_histogram, HistogramSettings};
use crate::history::HistoryStore;
use crate::models::{
    ClickEvent, ClickOutcome, CsvExport, Histogram, HistoryEntry, PeakActivity, SessionState,
    SessionStats,
};
use crate::peak::detect_peak;
use crate::stats::compute_stats;
use chrono::{DateTime, TimeZone, Utc};
use std::fmt::Display;
use tracing::{debug, warn};

/// What to do with a click whose timestamp precedes the last recorded one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderingPolicy {
    /// Raise the timestamp to the last recorded click and keep it.
    #[default]
    Clamp,
    Reject,
}

impl std::str::FromStr for OrderingPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "clamp" => Ok(Self::Clamp),
            "reject" => Ok(Self::Reject),
            other => Err(format!("unknown ordering policy '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineSettings {
    pub histogram: HistogramSettings,
    pub ordering: OrderingPolicy,
}

/// One user's click session: counters plus the ordered event log.
#[derive(Debug, Clone)]
pub struct ClickSession {
    state: SessionState,
    history: HistoryStore,
    settings: EngineSettings,
}

impl ClickSession {
    pub fn new(session_start: DateTime<Utc>, settings: EngineSettings) -> Self {
        Self {
            state: SessionState::new(session_start),
            history: HistoryStore::new(),
            settings,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn on_click<Tz>(&mut self, now: DateTime<Utc>, tz: &Tz) -> Result<ClickOutcome, EngineError>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let timestamp = match self.history.last_timestamp() {
            Some(last) if now < last => match self.settings.ordering {
                OrderingPolicy::Clamp => {
                    warn!(%last, attempted = %now, "clock went backwards, clamping click");
                    last
                }
                OrderingPolicy::Reject => {
                    return Err(EngineError::OrderingViolation {
                        last,
                        attempted: now,
                    });
                }
            },
            _ => now,
        };

        let previous = self.history.last_timestamp().unwrap_or(self.state.session_start);
        let event = ClickEvent::new(timestamp, timestamp - previous);
        self.history.append(event)?;
        self.state = self.state.record_click(timestamp);
        debug!(clicks = self.state.click_count, "click recorded");

        Ok(ClickOutcome {
            stats: compute_stats(&self.state, now.max(timestamp)),
            entry: history_entry(self.state.click_count, &event, tz),
        })
    }

    pub fn on_clear(&mut self) {
        self.history.clear();
        self.state = self.state.cleared();
        debug!("history cleared");
    }

    pub fn on_export_request<Tz>(&self, now: DateTime<Utc>, tz: &Tz) -> Result<CsvExport, EngineError>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let snapshot = self.history.snapshot();
        export_csv(&snapshot, now, tz)
    }

    pub fn read_stats(&self, now: DateTime<Utc>) -> SessionStats {
        compute_stats(&self.state, now)
    }

    pub fn read_histogram(&self, now: DateTime<Utc>) -> Histogram {
        let snapshot = self.history.snapshot();
        build_histogram(&snapshot, self.state.session_start, now, &self.settings.histogram)
    }

    pub fn read_peak(&self, now: DateTime<Utc>) -> PeakActivity {
        let snapshot = self.history.snapshot();
        detect_peak(&snapshot, self.state.session_start, now)
    }

    pub fn history<Tz>(&self, tz: &Tz) -> Vec<HistoryEntry>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        self.history
            .snapshot()
            .iter()
            .enumerate()
            .map(|(i, event)| history_entry(i as u64 + 1, event, tz))
            .collect()
    }
}

fn history_entry<Tz>(click_number: u64, event: &ClickEvent, tz: &Tz) -> HistoryEntry
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    HistoryEntry {
        click_number,
        timestamp: event.timestamp,
        interval_ms: event.interval_since_last_click.num_milliseconds(),
        label: format!(
            "Click #{click_number} at {}",
            format_timestamp(event.timestamp, tz)
        ),
    }
}
