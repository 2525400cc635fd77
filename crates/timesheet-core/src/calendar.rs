//! Year classification
//!
//! [`YearCalendar`] walks Jan 1 to Dec 31 of one year and classifies every
//! date. Precedence is fixed: public holiday, then weekend, then special day,
//! then normal workday.

use std::collections::{BTreeMap, HashMap};
use std::iter::FusedIterator;

use chrono::{Datelike, NaiveDate, Weekday};

use crate::config::TimesheetConfig;
use crate::{ConfigError, DayKind, DayRecord, SpecialDay};

/// Classifier for all days of one year
#[derive(Clone, Debug)]
pub struct YearCalendar {
    year: i32,
    first: NaiveDate,
    last: NaiveDate,
    holidays: BTreeMap<NaiveDate, String>,
    special_days: HashMap<NaiveDate, SpecialDay>,
    weekend_label: String,
    holiday_label: Option<String>,
}

impl YearCalendar {
    /// Create a calendar from a holiday table and special-day lookup
    pub fn new(
        year: i32,
        holidays: BTreeMap<NaiveDate, String>,
        special_days: HashMap<NaiveDate, SpecialDay>,
    ) -> Result<Self, ConfigError> {
        let first = NaiveDate::from_ymd_opt(year, 1, 1).ok_or(ConfigError::InvalidYear(year))?;
        let last = NaiveDate::from_ymd_opt(year, 12, 31).ok_or(ConfigError::InvalidYear(year))?;
        Ok(Self {
            year,
            first,
            last,
            holidays,
            special_days,
            weekend_label: "Wochenende".into(),
            holiday_label: None,
        })
    }

    /// Build the calendar for the configured year, country and special days
    pub fn from_config(config: &TimesheetConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let table = config.holiday_calendar()?;
        let holidays = table.holidays(config.year);
        tracing::debug!(
            calendar = table.name(),
            year = config.year,
            holidays = holidays.len(),
            "built holiday table"
        );

        let mut calendar = Self::new(config.year, holidays, config.special_days())?
            .weekend_label(config.labels.weekend.clone());
        calendar.holiday_label = config.labels.holiday.clone();
        Ok(calendar)
    }

    /// Set the label written on weekend rows
    pub fn weekend_label(mut self, label: impl Into<String>) -> Self {
        self.weekend_label = label.into();
        self
    }

    /// Use one fixed label for every holiday instead of its name
    pub fn holiday_label(mut self, label: impl Into<String>) -> Self {
        self.holiday_label = Some(label.into());
        self
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    pub fn last_day(&self) -> NaiveDate {
        self.last
    }

    /// 365, or 366 in a leap year
    pub fn day_count(&self) -> usize {
        self.last.ordinal() as usize
    }

    /// Classify a single date
    pub fn classify(&self, date: NaiveDate) -> DayRecord {
        if let Some(name) = self.holidays.get(&date) {
            let label = self.holiday_label.as_ref().unwrap_or(name);
            return DayRecord::new(date, DayKind::Holiday, label.clone());
        }
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            return DayRecord::new(date, DayKind::Weekend, self.weekend_label.clone());
        }
        if let Some(special) = self.special_days.get(&date) {
            return DayRecord::new(date, DayKind::Special, special.label.clone())
                .with_color(special.color.clone());
        }
        DayRecord::normal(date)
    }

    /// Iterate the whole year in chronological order.
    ///
    /// Each call starts a fresh pass from January 1.
    pub fn days(&self) -> Days<'_> {
        Days {
            calendar: self,
            next: Some(self.first),
            remaining: self.day_count(),
        }
    }
}

/// Lazy iterator over the classified days of a [`YearCalendar`]
#[derive(Clone, Debug)]
pub struct Days<'a> {
    calendar: &'a YearCalendar,
    next: Option<NaiveDate>,
    remaining: usize,
}

impl Iterator for Days<'_> {
    type Item = DayRecord;

    fn next(&mut self) -> Option<DayRecord> {
        let date = self.next?;
        self.next = date.succ_opt().filter(|d| *d <= self.calendar.last);
        self.remaining -= 1;
        Some(self.calendar.classify(date))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Days<'_> {}

impl FusedIterator for Days<'_> {}
