use crate::models::{SessionState, SessionStats};
use chrono::{DateTime, Utc};

/// Derives the running counters for a session. Pure: the same `(state, now)`
/// always yields the same stats.
pub fn compute_stats(state: &SessionState, now: DateTime<Utc>) -> SessionStats {
    let session_duration_seconds = whole_seconds_between(state.session_start, now);
    let seconds_since_last_click = whole_seconds_between(state.last_click_time, now);

    SessionStats {
        total_clicks: state.click_count,
        session_start: state.session_start,
        session_duration_seconds,
        seconds_since_last_click,
        average_clicks_per_minute: average_per_minute(state.click_count, session_duration_seconds),
    }
}

pub fn average_per_minute(click_count: u64, session_duration_seconds: i64) -> f64 {
    if click_count == 0 || session_duration_seconds <= 0 {
        return 0.0;
    }
    click_count as f64 * 60.0 / session_duration_seconds as f64
}

fn whole_seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_milliseconds().div_euclid(1000).max(0)
}
