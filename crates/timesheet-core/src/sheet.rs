//! Per-member row planning
//!
//! A [`SheetPlan`] lists the rows one member's sheet will contain, with their
//! spreadsheet row numbers and target hours. Writers consume the plan; no
//! spreadsheet library is involved here.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::calendar::YearCalendar;
use crate::config::{DEFAULT_VACATION_DAYS, DEFAULT_WEEKDAY_HOURS};
use crate::{DayKind, DayRecord, Hours, TimesheetError};

/// Minimum number of weekday-hours entries (Monday to Friday)
pub const MIN_WEEKDAY_HOURS: usize = 5;

/// Spreadsheet row (1-based) of the first day; row 1 holds the header
pub const FIRST_DATA_ROW: u32 = 2;

/// Longest sheet name Excel accepts, in characters
pub const MAX_SHEET_NAME_LEN: usize = 31;

const SHEET_NAME_FORBIDDEN: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// A team member with resolved dates
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    /// Target hours indexed by weekday, Monday = 0
    pub hours: Vec<Hours>,
    /// First materialized day (default: January 1)
    pub start: Option<NaiveDate>,
    /// Last materialized day (default: December 31)
    pub stop: Option<NaiveDate>,
    /// Annual leave entitlement in days
    pub vacation_days: f64,
}

impl Member {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hours: DEFAULT_WEEKDAY_HOURS.to_vec(),
            start: None,
            stop: None,
            vacation_days: DEFAULT_VACATION_DAYS,
        }
    }

    pub fn hours(mut self, hours: Vec<Hours>) -> Self {
        self.hours = hours;
        self
    }

    pub fn start(mut self, date: NaiveDate) -> Self {
        self.start = Some(date);
        self
    }

    pub fn stop(mut self, date: NaiveDate) -> Self {
        self.stop = Some(date);
        self
    }

    pub fn vacation_days(mut self, days: f64) -> Self {
        self.vacation_days = days;
        self
    }

    /// Reject members without an entry for every weekday, or whose name
    /// cannot become a sheet name
    pub fn validate(&self) -> Result<(), TimesheetError> {
        if self.hours.len() < MIN_WEEKDAY_HOURS {
            return Err(TimesheetError::InsufficientWeekdayHours {
                member: self.name.clone(),
                found: self.hours.len(),
            });
        }
        validate_sheet_name(&self.name).map_err(|reason| TimesheetError::InvalidSheetName {
            member: self.name.clone(),
            reason,
        })
    }

    /// Start/stop bounds lying outside `year`
    pub fn bounds_outside(&self, year: i32) -> Vec<(&'static str, NaiveDate)> {
        [("start", self.start), ("stop", self.stop)]
            .into_iter()
            .filter_map(|(field, date)| Some((field, date?)))
            .filter(|(_, date)| date.year() != year)
            .collect()
    }

    /// Target hours for the weekday of `date`
    pub fn target_hours(&self, date: NaiveDate) -> Option<Hours> {
        let index = date.weekday().num_days_from_monday() as usize;
        self.hours.get(index).copied()
    }
}

/// Check `name` against Excel's worksheet naming rules
pub fn validate_sheet_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("name is empty".into());
    }
    let len = name.chars().count();
    if len > MAX_SHEET_NAME_LEN {
        return Err(format!("{len} characters, at most {MAX_SHEET_NAME_LEN} allowed"));
    }
    if let Some(c) = name.chars().find(|c| SHEET_NAME_FORBIDDEN.contains(c)) {
        return Err(format!("contains '{c}'"));
    }
    if name.starts_with('\'') || name.ends_with('\'') {
        return Err("starts or ends with an apostrophe".into());
    }
    if name.eq_ignore_ascii_case("History") {
        return Err("'History' is reserved".into());
    }
    Ok(())
}

/// Sheet names already used in one workbook.
///
/// Excel compares sheet names case-insensitively, so `Anna` and `anna`
/// collide. The first member to claim a name keeps it.
#[derive(Debug, Default)]
pub struct SheetNames {
    taken: HashSet<String>,
}

impl SheetNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(&mut self, member: &Member) -> Result<(), TimesheetError> {
        if self.taken.insert(member.name.to_lowercase()) {
            Ok(())
        } else {
            Err(TimesheetError::DuplicateMember {
                member: member.name.clone(),
            })
        }
    }
}

/// One row of a member sheet
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlannedRow {
    /// 1-based spreadsheet row, as used in formulas
    pub excel_row: u32,
    pub day: DayRecord,
    /// Set for normal days only
    pub target_hours: Option<Hours>,
}

/// All rows of one member sheet
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SheetPlan {
    pub member: String,
    pub vacation_days: f64,
    pub rows: Vec<PlannedRow>,
}

impl SheetPlan {
    /// Plan the rows for `member`.
    ///
    /// Days before the member's start date and after the stop date are left
    /// out; the remaining rows are numbered consecutively from
    /// [`FIRST_DATA_ROW`].
    pub fn build(member: &Member, calendar: &YearCalendar) -> Result<Self, TimesheetError> {
        member.validate()?;

        for (field, date) in member.bounds_outside(calendar.year()) {
            tracing::warn!(
                member = %member.name,
                field,
                %date,
                year = calendar.year(),
                "member date lies outside the target year"
            );
        }

        let start = member.start.unwrap_or_else(|| calendar.first_day());
        let stop = member.stop.unwrap_or_else(|| calendar.last_day());

        let rows: Vec<PlannedRow> = calendar
            .days()
            .skip_while(|day| day.date < start)
            .take_while(|day| day.date <= stop)
            .zip(FIRST_DATA_ROW..)
            .map(|(day, excel_row)| {
                let target_hours = if day.kind.is_workday() {
                    member.target_hours(day.date)
                } else {
                    None
                };
                PlannedRow {
                    excel_row,
                    day,
                    target_hours,
                }
            })
            .collect();

        if rows.is_empty() {
            tracing::warn!(
                member = %member.name,
                %start,
                %stop,
                "no days between start and stop date"
            );
        }

        Ok(Self {
            member: member.name.clone(),
            vacation_days: member.vacation_days,
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row of the first day
    pub fn first_row(&self) -> u32 {
        FIRST_DATA_ROW
    }

    /// Row of the last day (the header row's successor when the plan is empty)
    pub fn last_row(&self) -> u32 {
        self.rows.last().map_or(FIRST_DATA_ROW, |r| r.excel_row)
    }

    /// Number of rows of the given kind
    pub fn count(&self, kind: DayKind) -> usize {
        self.rows.iter().filter(|r| r.day.kind == kind).count()
    }

    /// Sum of target hours over all planned workdays
    pub fn target_total(&self) -> Hours {
        self.rows.iter().filter_map(|r| r.target_hours).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holidays::{GermanHolidays, GermanState, HolidayCalendar};
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn bavaria_2025() -> YearCalendar {
        let holidays = GermanHolidays::for_state(GermanState::BY).holidays(2025);
        YearCalendar::new(2025, holidays, HashMap::new()).unwrap()
    }

    #[test]
    fn four_hours_entries_are_rejected() {
        let member = Member::new("Bob").hours(vec![8.0, 8.0, 8.0, 8.0]);
        let err = SheetPlan::build(&member, &bavaria_2025()).unwrap_err();
        assert!(matches!(
            err,
            TimesheetError::InsufficientWeekdayHours { ref member, found: 4 } if member == "Bob"
        ));
    }

    #[test]
    fn sheet_name_rules() {
        assert!(validate_sheet_name("Anna Schmidt").is_ok());
        assert!(validate_sheet_name(&"x".repeat(31)).is_ok());
        assert!(validate_sheet_name("").is_err());
        assert!(validate_sheet_name(&"x".repeat(32)).is_err());
        assert!(validate_sheet_name("'Anna").is_err());
        assert!(validate_sheet_name("history").is_err());
        for name in ["Team [Nord]", "A:B", "Q?", "a*b", "x/y", "x\\y"] {
            assert!(validate_sheet_name(name).is_err(), "{name} should be rejected");
        }
        assert_eq!(validate_sheet_name("Team [Nord]").unwrap_err(), "contains '['");
    }

    #[test]
    fn invalid_sheet_name_rejects_member() {
        let err = SheetPlan::build(&Member::new("Team [Nord]"), &bavaria_2025()).unwrap_err();
        assert!(matches!(
            err,
            TimesheetError::InvalidSheetName { ref member, .. } if member == "Team [Nord]"
        ));
    }

    #[test]
    fn sheet_names_collide_ignoring_case() {
        let mut names = SheetNames::new();
        assert!(names.claim(&Member::new("Anna")).is_ok());
        assert!(names.claim(&Member::new("Ben")).is_ok());
        let err = names.claim(&Member::new("ANNA")).unwrap_err();
        assert!(matches!(err, TimesheetError::DuplicateMember { ref member } if member == "ANNA"));
    }

    #[test]
    fn bounds_outside_year() {
        let member = Member::new("Marco")
            .start(date(2025, 3, 1))
            .stop(date(2025, 8, 31));
        assert!(member.bounds_outside(2025).is_empty());
        assert_eq!(
            member.bounds_outside(2026),
            vec![("start", date(2025, 3, 1)), ("stop", date(2025, 8, 31))]
        );
        assert!(Member::new("Anna").bounds_outside(2026).is_empty());
    }

    #[test]
    fn full_year_without_bounds() {
        let plan = SheetPlan::build(&Member::new("Anna"), &bavaria_2025()).unwrap();
        assert_eq!(plan.len(), 365);
        assert_eq!(plan.first_row(), 2);
        assert_eq!(plan.last_row(), 366);
        // 104 weekend days, one of them (Allerheiligen, Saturday) counted as holiday
        assert_eq!(plan.count(DayKind::Weekend), 103);
        assert_eq!(plan.count(DayKind::Holiday), 13);
        assert_eq!(plan.count(DayKind::Normal), 249);
    }

    #[test]
    fn stop_date_truncates_rows() {
        let stop = date(2025, 3, 31);
        let member = Member::new("Anna").stop(stop);
        let plan = SheetPlan::build(&member, &bavaria_2025()).unwrap();
        assert_eq!(plan.len(), stop.ordinal() as usize);
        assert_eq!(plan.rows.last().unwrap().day.date, stop);
    }

    #[test]
    fn start_date_skips_leading_days() {
        let member = Member::new("Carla").start(date(2025, 12, 1));
        let plan = SheetPlan::build(&member, &bavaria_2025()).unwrap();
        assert_eq!(plan.len(), 31);
        assert_eq!(plan.rows[0].day.date, date(2025, 12, 1));
        assert_eq!(plan.rows[0].excel_row, FIRST_DATA_ROW);
    }

    #[test]
    fn stop_before_start_yields_no_rows() {
        let member = Member::new("Dan")
            .start(date(2025, 6, 1))
            .stop(date(2025, 5, 1));
        let plan = SheetPlan::build(&member, &bavaria_2025()).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.last_row(), FIRST_DATA_ROW);
    }

    #[test]
    fn target_hours_follow_weekday() {
        let member = Member::new("Eva").hours(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        let plan = SheetPlan::build(&member, &bavaria_2025()).unwrap();

        // 2025-01-07 Tuesday, 2025-01-10 Friday, 2025-01-11 Saturday
        let by_date = |d: NaiveDate| plan.rows.iter().find(|r| r.day.date == d).unwrap();
        assert_eq!(by_date(date(2025, 1, 7)).target_hours, Some(2.0));
        assert_eq!(by_date(date(2025, 1, 10)).target_hours, Some(5.0));
        assert_eq!(by_date(date(2025, 1, 11)).target_hours, None);
        // Neujahr (Wednesday)
        assert_eq!(by_date(date(2025, 1, 1)).target_hours, None);
    }

    #[test]
    fn weekend_entries_beyond_friday_are_ignored() {
        let member = Member::new("Finn").hours(vec![8.0; 7]);
        let plan = SheetPlan::build(&member, &bavaria_2025()).unwrap();
        assert_eq!(plan.target_total(), 8.0 * plan.count(DayKind::Normal) as f64);
    }

    #[test]
    fn rows_are_consecutive() {
        let plan = SheetPlan::build(&Member::new("Gina"), &bavaria_2025()).unwrap();
        for pair in plan.rows.windows(2) {
            assert_eq!(pair[1].excel_row, pair[0].excel_row + 1);
            assert_eq!(pair[0].day.date.succ_opt(), Some(pair[1].day.date));
        }
    }
}
