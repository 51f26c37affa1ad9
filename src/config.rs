use crate::histogram::{HistogramSettings, MAX_BAR_SCALE};
use crate::session::EngineSettings;
use chrono::Duration;
use std::env;
use std::str::FromStr;
use tracing::warn;

pub const DEFAULT_SESSION_TTL_SECS: i64 = 30 * 60;
pub const MAX_SESSION_TTL_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub engine: EngineSettings,
    /// Sessions idle for longer than this are dropped from the registry.
    pub session_ttl_secs: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            engine: EngineSettings::default(),
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Config::default();
        let histogram = HistogramSettings {
            bucket_seconds: parse_positive(
                &lookup,
                "CLICK_HISTOGRAM_BUCKET_SECS",
                defaults.engine.histogram.bucket_seconds,
            ),
            window: parse_positive(&lookup, "CLICK_HISTOGRAM_WINDOW", defaults.engine.histogram.window),
            bar_scale: parse_capped(
                &lookup,
                "CLICK_HISTOGRAM_BAR_SCALE",
                defaults.engine.histogram.bar_scale,
                MAX_BAR_SCALE,
            ),
            ..defaults.engine.histogram.clone()
        };

        Self {
            port: parse_or(&lookup, "PORT", defaults.port),
            engine: EngineSettings {
                histogram,
                ordering: parse_or(&lookup, "CLICK_ORDERING_POLICY", defaults.engine.ordering),
            },
            session_ttl_secs: parse_capped(
                &lookup,
                "CLICK_SESSION_TTL_SECS",
                defaults.session_ttl_secs,
                MAX_SESSION_TTL_SECS,
            ),
        }
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::seconds(self.session_ttl_secs.clamp(1, MAX_SESSION_TTL_SECS))
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                warn!("ignoring invalid {key}={raw}");
                default
            }
        },
        None => default,
    }
}

fn parse_positive<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + PartialOrd + Default + Copy,
{
    let value = parse_or(lookup, key, default);
    if value > T::default() {
        value
    } else {
        warn!("{key} must be positive, using default");
        default
    }
}

fn parse_capped<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T, max: T) -> T
where
    T: FromStr + PartialOrd + Default + Copy + std::fmt::Display,
{
    let value = parse_positive(lookup, key, default);
    if value > max {
        warn!("{key}={value} exceeds {max}, capping");
        max
    } else {
        value
    }
}
