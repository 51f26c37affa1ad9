use crate::buckets::{bucket_count, bucketize};
use crate::models::{ClickEvent, Histogram, HistogramBar};
use chrono::{DateTime, Utc};

/// Longest bar a histogram will ever render.
pub const MAX_BAR_SCALE: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistogramSettings {
    pub bucket_seconds: u32,
    pub window: usize,
    pub bar_scale: usize,
    pub glyph: char,
}

impl Default for HistogramSettings {
    fn default() -> Self {
        Self {
            bucket_seconds: 10,
            window: 10,
            bar_scale: 20,
            glyph: '█',
        }
    }
}

/// Click counts in fixed-width windows since the session start, keeping only
/// the trailing `settings.window` buckets. Bars are scaled against the
/// fullest bucket of the whole session, not just the visible window.
pub fn build_histogram(
    events: &[ClickEvent],
    session_start: DateTime<Utc>,
    now: DateTime<Utc>,
    settings: &HistogramSettings,
) -> Histogram {
    let width_ms = i64::from(settings.bucket_seconds.max(1)) * 1000;
    let total_buckets = bucket_count(session_start, now, width_ms);
    let buckets = bucketize(events, session_start, total_buckets, width_ms);

    let max_count = buckets.iter().map(|b| b.count).max().unwrap_or(0).max(1);
    let visible = total_buckets.min(settings.window);
    let bar_scale = settings.bar_scale.min(MAX_BAR_SCALE);

    let bars = buckets[total_buckets - visible..]
        .iter()
        .map(|bucket| {
            let start = bucket.window_start.num_seconds();
            let end = start + i64::from(settings.bucket_seconds.max(1));
            let length = (bucket.count.saturating_mul(bar_scale) / max_count).min(bar_scale);
            HistogramBar {
                index: bucket.index,
                label: format!("{start}-{end} sec"),
                count: bucket.count,
                bar: std::iter::repeat(settings.glyph).take(length).collect(),
            }
        })
        .collect();

    Histogram {
        bucket_seconds: settings.bucket_seconds.max(1),
        total_buckets,
        max_count,
        bars,
    }
}
