//! Daily sales/restock report.
//!
//! Two interpretations of "items added" exist for a report date, and both are
//! offered through [`AddedWindow`]:
//!
//! - [`AddedWindow::OnDay`] (default): units from products registered on that
//!   exact calendar date.
//! - [`AddedWindow::UpToAndIncluding`]: units from products registered on or
//!   before that date.
//!
//! "Units" means the quantity a product was registered with, so later sales
//! do not shrink what was added.

use core::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use stockkeep_core::{DomainError, DomainResult};

/// A real calendar date selected for reporting.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportDate(NaiveDate);

impl ReportDate {
    /// Build a report date from day/month/year.
    ///
    /// The day must lie in 1..=31; any combination that is not a real
    /// calendar date (e.g. 31/2) fails with `InvalidDate` instead of clamping.
    pub fn from_parts(day: u32, month: u32, year: i32) -> DomainResult<Self> {
        if !(1..=31).contains(&day) {
            return Err(DomainError::validation("day must be between 1 and 31"));
        }
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or_else(|| DomainError::invalid_date(format!("{}/{}/{}", day, month, year)))
    }

    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for ReportDate {
    fn from(value: NaiveDate) -> Self {
        Self(value)
    }
}

impl core::fmt::Display for ReportDate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}/{}", self.0.day(), self.0.month(), self.0.year())
    }
}

/// Which registrations count as "added" for a report date.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AddedWindow {
    #[default]
    OnDay,
    #[serde(rename = "cumulative")]
    UpToAndIncluding,
}

impl AddedWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddedWindow::OnDay => "on-day",
            AddedWindow::UpToAndIncluding => "cumulative",
        }
    }

    /// Whether a product registered on `registered_on` counts toward `report_date`.
    pub fn includes(&self, registered_on: NaiveDate, report_date: ReportDate) -> bool {
        match self {
            AddedWindow::OnDay => registered_on == report_date.date(),
            AddedWindow::UpToAndIncluding => registered_on <= report_date.date(),
        }
    }
}

impl FromStr for AddedWindow {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "on-day" | "day" => Ok(AddedWindow::OnDay),
            "cumulative" | "up-to" => Ok(AddedWindow::UpToAndIncluding),
            other => Err(DomainError::validation(format!(
                "unknown added window '{}' (expected 'on-day' or 'cumulative')",
                other
            ))),
        }
    }
}

impl core::fmt::Display for AddedWindow {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregates for one calendar date. Both totals are zero when nothing matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyReport {
    pub date: ReportDate,
    pub window: AddedWindow,
    pub items_added: i64,
    pub items_sold: i64,
}

impl DailyReport {
    pub fn empty(date: ReportDate, window: AddedWindow) -> Self {
        Self {
            date,
            window,
            items_added: 0,
            items_sold: 0,
        }
    }
}
