//! `MM-DD-YY` calendar dates and file modification dates.

use chrono::{DateTime, Local, NaiveDate};
use std::time::SystemTime;

use super::GatherError;

/// Calendar format used on the command line and in generated titles.
pub const DATE_FORMAT: &str = "%m-%d-%y";

/// Parse an `MM-DD-YY` date.
pub fn parse_date(value: &str) -> Result<NaiveDate, GatherError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        GatherError::InvalidDateFormat {
            value: value.to_string(),
        }
    })
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Local calendar date of a modification time.
pub fn local_date(mtime: SystemTime) -> NaiveDate {
    DateTime::<Local>::from(mtime).date_naive()
}
