use crate::errors::EngineError;
use crate::models::ClickEvent;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Ordered click log for one session.
///
/// Events live behind an `Arc`; appends copy on write when a snapshot is
/// still alive, so a snapshot never sees later appends or a half-written event.
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    events: Arc<Vec<ClickEvent>>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, event: ClickEvent) -> Result<(), EngineError> {
        if let Some(last) = self.last_timestamp() {
            if event.timestamp < last {
                return Err(EngineError::OrderingViolation {
                    last,
                    attempted: event.timestamp,
                });
            }
        }
        Arc::make_mut(&mut self.events).push(event);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.events = Arc::default();
    }

    pub fn snapshot(&self) -> Arc<Vec<ClickEvent>> {
        Arc::clone(&self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.events.last().map(|event| event.timestamp)
    }
}
