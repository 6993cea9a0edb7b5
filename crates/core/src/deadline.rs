//! Deadline validation and display rules.
//!
//! A deadline is entered as three free-form numeric strings. It only counts as a deadline when
//! all three are present, the year has exactly four digits, and together they name a real
//! calendar day. Anything else is treated as "no deadline" rather than an error.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const DISPLAY_FORMAT: &str = "%b %-d, %Y";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deadline {
    #[serde(default)]
    pub day: String,
    #[serde(default)]
    pub month: String,
    #[serde(default)]
    pub year: String,
}

impl Deadline {
    pub fn new(day: impl Into<String>, month: impl Into<String>, year: impl Into<String>) -> Self {
        Self {
            day: day.into(),
            month: month.into(),
            year: year.into(),
        }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            day: date.format("%d").to_string(),
            month: date.format("%m").to_string(),
            year: date.format("%Y").to_string(),
        }
    }

    /// Split an ISO `YYYY-MM-DD` string into components without validating them.
    pub fn from_iso(input: &str) -> Self {
        let mut parts = input.trim().splitn(3, '-');
        let year = parts.next().unwrap_or_default();
        let month = parts.next().unwrap_or_default();
        let day = parts.next().unwrap_or_default();
        Self::new(day, month, year)
    }

    /// True when every component is blank.
    pub fn is_empty(&self) -> bool {
        self.day.trim().is_empty() && self.month.trim().is_empty() && self.year.trim().is_empty()
    }

    pub fn clear(&mut self) {
        self.day.clear();
        self.month.clear();
        self.year.clear();
    }

    /// The calendar day named by the components, if they form a valid deadline.
    pub fn date(&self) -> Option<NaiveDate> {
        let day = parse_component(&self.day, 2)?;
        let month = parse_component(&self.month, 2)?;
        let year = self.year.trim();
        if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let year: i32 = year.parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    }

    /// Display string such as `Mar 5, 2025`, or `None` when the deadline is incomplete or
    /// invalid.
    pub fn formatted(&self) -> Option<String> {
        self.date().map(format_date)
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DISPLAY_FORMAT).to_string()
}

fn parse_component(raw: &str, max_digits: usize) -> Option<u32> {
    let value = raw.trim();
    if value.is_empty() || value.len() > max_digits {
        return None;
    }
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}
