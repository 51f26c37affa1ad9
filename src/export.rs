use crate::errors::EngineError;
use crate::models::{ClickEvent, CsvExport};
use chrono::{DateTime, TimeZone, Utc};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::fmt::Display;

pub const CSV_MIME_TYPE: &str = "text/csv";
const CSV_HEADER: &str = "Click Number,Timestamp";
const TIMESTAMP_PATTERN: &str = "%Y-%m-%d %H:%M:%S";
const FILENAME_PATTERN: &str = "%Y%m%d_%H%M";

pub fn format_timestamp<Tz>(instant: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    instant.with_timezone(tz).format(TIMESTAMP_PATTERN).to_string()
}

pub fn csv_filename<Tz>(now: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!("click_history_{}.csv", now.with_timezone(tz).format(FILENAME_PATTERN))
}

/// Renders the click log as CSV. Built fresh on every call.
pub fn export_csv<Tz>(events: &[ClickEvent], now: DateTime<Utc>, tz: &Tz) -> Result<CsvExport, EngineError>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let rows = events
        .iter()
        .enumerate()
        .map(|(i, event)| (i as u64 + 1, format_timestamp(event.timestamp, tz)));

    Ok(CsvExport {
        filename: csv_filename(now, tz),
        mime_type: CSV_MIME_TYPE,
        content: write_rows(rows)?,
    })
}

/// Numbers go out bare; every other value is quoted with embedded quotes doubled.
fn write_rows<I, V>(rows: I) -> Result<Vec<u8>, EngineError>
where
    I: IntoIterator<Item = (u64, V)>,
    V: AsRef<str>,
{
    let mut buffer = Vec::with_capacity(64);
    buffer.extend_from_slice(CSV_HEADER.as_bytes());
    buffer.push(b'\n');

    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::NonNumeric)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(buffer);
    for (number, value) in rows {
        writer.write_record([number.to_string().as_str(), value.as_ref()])?;
    }
    writer
        .into_inner()
        .map_err(|err| EngineError::Export(err.error().to_string()))
}
