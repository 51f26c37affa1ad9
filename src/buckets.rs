use crate::models::{Bucket, ClickEvent};
use chrono::{DateTime, Duration, Utc};

/// Number of `width_ms` windows needed to cover `session_start..=now`.
/// Zero when `now` precedes the session start.
pub fn bucket_count(session_start: DateTime<Utc>, now: DateTime<Utc>, width_ms: i64) -> usize {
    let elapsed_ms = (now - session_start).num_milliseconds();
    if elapsed_ms < 0 || width_ms <= 0 {
        return 0;
    }
    usize::try_from(elapsed_ms / width_ms)
        .map(|full| full.saturating_add(1))
        .unwrap_or(usize::MAX)
}

/// Counts events per fixed-width window. Events whose window falls outside
/// `0..count` (clock skew) are dropped.
pub fn bucketize(
    events: &[ClickEvent],
    session_start: DateTime<Utc>,
    count: usize,
    width_ms: i64,
) -> Vec<Bucket> {
    let mut buckets: Vec<Bucket> = (0..count)
        .map(|index| Bucket {
            index,
            window_start: Duration::milliseconds(width_ms.saturating_mul(index as i64)),
            count: 0,
        })
        .collect();
    if width_ms <= 0 {
        return buckets;
    }

    for event in events {
        let offset_ms = (event.timestamp - session_start).num_milliseconds();
        let index = offset_ms.div_euclid(width_ms);
        if let Ok(index) = usize::try_from(index) {
            if let Some(bucket) = buckets.get_mut(index) {
                bucket.count += 1;
            }
        }
    }

    buckets
}
