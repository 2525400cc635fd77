//! # timesheet-core
//!
//! Core domain model for the annual timesheet generator.
//!
//! This crate provides:
//! - Domain types: `DayKind`, `DayRecord`, `Member`, `SheetPlan`
//! - Configuration loading (`TimesheetConfig`) from YAML
//! - Public holiday tables (`HolidayCalendar`, `GermanHolidays`)
//! - The year classifier (`YearCalendar`) producing one `DayRecord` per day
//! - The `Renderer` trait and error types
//!
//! ## Example
//!
//! ```rust
//! use timesheet_core::{DayKind, Member, SheetPlan, TimesheetConfig, YearCalendar};
//!
//! let config = TimesheetConfig::from_yaml_str("year: 2025\ncountry: DE\nsubdiv: BY\n").unwrap();
//! let calendar = YearCalendar::from_config(&config).unwrap();
//! assert_eq!(calendar.days().count(), 365);
//!
//! let member = Member::new("Anna").hours(vec![8.0, 8.0, 8.0, 8.0, 6.0]);
//! let plan = SheetPlan::build(&member, &calendar).unwrap();
//! assert_eq!(plan.rows[0].day.kind, DayKind::Holiday); // Neujahr
//! ```

pub mod calendar;
pub mod config;
pub mod holidays;
pub mod sheet;

pub use calendar::{Days, YearCalendar};
pub use config::{
    AbsenceLabels, DayLabels, MemberConfig, SpecialDayConfig, StyleMap, StyleName,
    TimesheetConfig,
};
pub use holidays::{
    calendar_for, easter_sunday, GermanHolidays, GermanState, HolidayCalendar, NoHolidays,
};
pub use sheet::{
    validate_sheet_name, Member, PlannedRow, SheetNames, SheetPlan, FIRST_DATA_ROW,
    MAX_SHEET_NAME_LEN, MIN_WEEKDAY_HOURS,
};

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Type Aliases
// ============================================================================

/// Working hours as entered in the sheet (decimal hours, e.g. 7.5)
pub type Hours = f64;

/// Hex color string as written in the configuration (e.g. `#FFC000`)
pub type HexColor = String;

// ============================================================================
// Day Classification
// ============================================================================

/// Classification of a single calendar day
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayKind {
    /// Regular workday with target hours
    #[default]
    Normal,
    /// Saturday or Sunday
    Weekend,
    /// Public holiday from the country/subdivision table
    Holiday,
    /// Organization-specific special day
    Special,
}

impl DayKind {
    /// Only normal days carry target hours and an absence dropdown.
    pub fn is_workday(self) -> bool {
        matches!(self, DayKind::Normal)
    }
}

impl std::fmt::Display for DayKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DayKind::Normal => write!(f, "normal"),
            DayKind::Weekend => write!(f, "weekend"),
            DayKind::Holiday => write!(f, "holiday"),
            DayKind::Special => write!(f, "special"),
        }
    }
}

/// One classified calendar day
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRecord {
    /// The calendar date
    pub date: NaiveDate,
    /// Classification
    pub kind: DayKind,
    /// Display label (holiday name, weekend label, special-day name; empty for normal days)
    pub label: String,
    /// Background color override, set only for special days that configure one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<HexColor>,
}

impl DayRecord {
    /// Create a record with the given classification and label
    pub fn new(date: NaiveDate, kind: DayKind, label: impl Into<String>) -> Self {
        Self {
            date,
            kind,
            label: label.into(),
            color: None,
        }
    }

    /// Create an unlabeled workday record
    pub fn normal(date: NaiveDate) -> Self {
        Self::new(date, DayKind::Normal, "")
    }

    /// Set the color override
    pub fn with_color(mut self, color: Option<HexColor>) -> Self {
        self.color = color;
        self
    }

    /// German weekday name for the date
    pub fn weekday_name(&self) -> &'static str {
        use chrono::Datelike;
        weekday_name_de(self.date.weekday())
    }
}

/// German weekday name as shown in the `Wochentag` column
pub fn weekday_name_de(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Montag",
        Weekday::Tue => "Dienstag",
        Weekday::Wed => "Mittwoch",
        Weekday::Thu => "Donnerstag",
        Weekday::Fri => "Freitag",
        Weekday::Sat => "Samstag",
        Weekday::Sun => "Sonntag",
    }
}

/// A resolved special-day entry (label and optional color) for one date
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialDay {
    pub label: String,
    pub color: Option<HexColor>,
}

impl SpecialDay {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            color: None,
        }
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Output rendering of member timesheets
pub trait Renderer {
    type Output;

    /// Render one sheet per member
    fn render(&self, members: &[Member]) -> Result<Self::Output, RenderError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    NotFound { path: String },

    #[error("Failed to parse configuration file '{path}': {message}")]
    Parse { path: String, message: String },

    #[error("Unsupported country for holiday lookup: {0}")]
    UnsupportedCountry(String),

    #[error("Unsupported subdivision '{subdiv}' for country {country}")]
    UnsupportedSubdivision { country: String, subdiv: String },

    #[error("Year {0} is outside the supported range 1900-9999")]
    InvalidYear(i32),
}

/// Per-member validation error
#[derive(Debug, Error)]
pub enum TimesheetError {
    #[error(
        "Member '{member}' has {found} weekday-hours entries, \
         at least {} required (Monday to Friday)",
        MIN_WEEKDAY_HOURS
    )]
    InsufficientWeekdayHours { member: String, found: usize },

    #[error("Member '{member}' cannot be used as a sheet name: {reason}")]
    InvalidSheetName { member: String, reason: String },

    #[error("Member '{member}' is listed more than once (sheet names ignore case)")]
    DuplicateMember { member: String },
}

/// Rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn only_normal_days_are_workdays() {
        assert!(DayKind::Normal.is_workday());
        assert!(!DayKind::Weekend.is_workday());
        assert!(!DayKind::Holiday.is_workday());
        assert!(!DayKind::Special.is_workday());
    }

    #[test]
    fn day_kind_display() {
        assert_eq!(DayKind::Holiday.to_string(), "holiday");
        assert_eq!(DayKind::Special.to_string(), "special");
    }

    #[test]
    fn weekday_names_are_german() {
        // 2025-03-03 is a Monday
        let monday = DayRecord::normal(date(2025, 3, 3));
        assert_eq!(monday.weekday_name(), "Montag");
        assert_eq!(weekday_name_de(Weekday::Sun), "Sonntag");
    }

    #[test]
    fn day_record_serializes_without_empty_color() {
        let record = DayRecord::new(date(2025, 1, 1), DayKind::Holiday, "Neujahr");
        let yaml = serde_yaml::to_string(&record).unwrap();
        assert!(yaml.contains("kind: holiday"));
        assert!(!yaml.contains("color"));
    }

    #[test]
    fn insufficient_hours_message_names_member() {
        let err = TimesheetError::InsufficientWeekdayHours {
            member: "Bob".into(),
            found: 3,
        };
        assert_eq!(
            err.to_string(),
            "Member 'Bob' has 3 weekday-hours entries, at least 5 required (Monday to Friday)"
        );
    }

    #[test]
    fn config_error_displays_path() {
        let err = ConfigError::NotFound {
            path: "/missing/config.yaml".into(),
        };
        assert_eq!(
            err.to_string(),
            "Configuration file not found: /missing/config.yaml"
        );
    }
}
