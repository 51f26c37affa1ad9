use crate::buckets::{bucket_count, bucketize};
use crate::models::{ClickEvent, PeakActivity};
use chrono::{DateTime, Utc};

const MINUTE_MS: i64 = 60_000;

/// Finds the busiest whole minute of the session.
///
/// Ties go to the earliest minute. Before the first full minute has elapsed
/// the raw event count is reported as the current minute.
pub fn detect_peak(
    events: &[ClickEvent],
    session_start: DateTime<Utc>,
    now: DateTime<Utc>,
) -> PeakActivity {
    if events.len() < 2 {
        return PeakActivity::NotApplicable;
    }

    let minutes = bucket_count(session_start, now, MINUTE_MS);
    if minutes < 2 {
        return PeakActivity::CurrentMinute {
            count: events.len(),
        };
    }

    let mut peak: Option<(usize, usize)> = None;
    for bucket in bucketize(events, session_start, minutes, MINUTE_MS) {
        if bucket.count > peak.map_or(0, |(_, count)| count) {
            peak = Some((bucket.index, bucket.count));
        }
    }

    match peak {
        Some((index, count)) => PeakActivity::Minute { index, count },
        None => PeakActivity::NotApplicable,
    }
}
