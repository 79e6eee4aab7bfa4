pub mod config;
pub mod layout;
pub mod move_item;
pub mod plan;
pub mod proposals;
pub mod slots;

use chrono::NaiveDate;
use dayweave_core::clock;
use dayweave_core::{CalendarEvent, JsonCalendarFile};
use serde::Serialize;
use std::path::Path;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// `--date` or today.
pub fn resolve_date(date: Option<&str>) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    match date {
        Some(value) => Ok(clock::parse_date(value)?),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

/// Events from `--events`, or none.
pub fn load_events(path: Option<&Path>) -> Result<Vec<CalendarEvent>, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(JsonCalendarFile::new(path).read()?),
        None => Ok(Vec::new()),
    }
}

/// Parse an optional `HH:MM` flag into a day minute.
pub fn parse_minute(value: Option<&str>) -> Result<Option<u32>, Box<dyn std::error::Error>> {
    value.map(clock::parse_hhmm).transpose().map_err(Into::into)
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Single-threaded runtime for the async repository calls.
pub fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}
