//! YAML configuration
//!
//! Every key is optional. Missing keys fall back to the defaults below, so an
//! empty file yields a valid configuration for the current year in Bavaria.
//!
//! ```yaml
//! year: 2025
//! country: DE
//! subdiv: BY
//! format: "%d/%m"
//! holidays:
//!   - name: Betriebsausflug
//!     dates: ["12/06"]
//!     color: "#FFC000"
//! members:
//!   - name: Anna
//!     hours: [8, 8, 8, 8, 7]
//!     stop: "30/09"
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::holidays::{calendar_for, HolidayCalendar};
use crate::sheet::Member;
use crate::{ConfigError, DayKind, Hours, SpecialDay};

/// Default working hours Monday to Friday
pub const DEFAULT_WEEKDAY_HOURS: [Hours; 5] = [8.0, 8.0, 8.0, 8.0, 7.0];

/// Default annual leave entitlement in days
pub const DEFAULT_VACATION_DAYS: f64 = 30.0;

/// Complete run configuration, loaded once and read-only afterwards
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimesheetConfig {
    /// Target year
    pub year: i32,
    /// Country code for the public holiday table (`DE`, or `none`)
    pub country: String,
    /// Subdivision code (e.g. `BY`); empty for nationwide holidays only
    pub subdiv: String,
    /// chrono format for day/month strings (special days, member bounds)
    pub format: String,
    /// Days before today that a balance is shown for
    pub balance_grace_days: u32,
    /// Day labels
    pub labels: DayLabels,
    /// Absence reasons offered in the dropdown and counted in the summary
    pub absence: AbsenceLabels,
    /// Style lookup per sheet element
    pub styles: StyleMap,
    /// Organization-specific special days
    pub holidays: Vec<SpecialDayConfig>,
    /// Team members, one sheet each
    pub members: Vec<MemberConfig>,
}

impl Default for TimesheetConfig {
    fn default() -> Self {
        Self {
            year: Local::now().year(),
            country: "DE".into(),
            subdiv: "BY".into(),
            format: "%d/%m".into(),
            balance_grace_days: 2,
            labels: DayLabels::default(),
            absence: AbsenceLabels::default(),
            styles: StyleMap::default(),
            holidays: Vec::new(),
            members: Vec::new(),
        }
    }
}

impl TimesheetConfig {
    /// Load configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| ConfigError::NotFound {
            path: path_str.clone(),
        })?;

        let config = Self::parse(&content, &path_str)?;
        tracing::debug!(
            path = %path_str,
            year = config.year,
            members = config.members.len(),
            "loaded configuration"
        );
        Ok(config)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        Self::parse(content, "<inline>")
    }

    fn parse(content: &str, path: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to an empty mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    /// Check the values that have no sensible fallback
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1900..=9999).contains(&self.year) {
            return Err(ConfigError::InvalidYear(self.year));
        }
        calendar_for(&self.country, &self.subdiv)?;
        Ok(())
    }

    /// Holiday table for the configured country/subdivision
    pub fn holiday_calendar(&self) -> Result<Box<dyn HolidayCalendar>, ConfigError> {
        calendar_for(&self.country, &self.subdiv)
    }

    /// Parse a date string: ISO `YYYY-MM-DD`, or day/month in `format` within the configured year.
    pub fn parse_day(&self, text: &str) -> Option<NaiveDate> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            return Some(date);
        }
        NaiveDate::parse_from_str(
            &format!("{text} {}", self.year),
            &format!("{} %Y", self.format),
        )
        .ok()
    }

    /// Resolve the special-day list into a date lookup for the configured year.
    ///
    /// Unparseable dates are logged and skipped. A later entry wins when two
    /// entries name the same date.
    pub fn special_days(&self) -> HashMap<NaiveDate, SpecialDay> {
        let mut days = HashMap::new();
        for entry in &self.holidays {
            for text in &entry.dates {
                match self.parse_day(text) {
                    Some(date) if date.year() == self.year => {
                        days.insert(
                            date,
                            SpecialDay {
                                label: entry.name.clone(),
                                color: entry.color.clone(),
                            },
                        );
                    }
                    Some(date) => {
                        tracing::debug!(
                            special_day = %entry.name,
                            %date,
                            "special day outside target year, skipped"
                        );
                    }
                    None => {
                        tracing::warn!(
                            special_day = %entry.name,
                            date = %text,
                            format = %self.format,
                            "cannot parse special-day date, skipped"
                        );
                    }
                }
            }
        }
        days
    }

    /// Resolve a member record, parsing its optional bounds.
    pub fn resolve_member(&self, member: &MemberConfig) -> Member {
        let bound = |field: &str, text: &Option<String>| {
            let text = text.as_deref()?;
            let parsed = self.parse_day(text);
            if parsed.is_none() && !text.trim().is_empty() {
                tracing::warn!(
                    member = %member.name,
                    field,
                    value = %text,
                    "cannot parse member date, using default"
                );
            }
            parsed
        };

        let mut resolved = Member::new(member.name.clone())
            .hours(member.hours.clone())
            .vacation_days(member.vacation_days);
        resolved.start = bound("start", &member.start);
        resolved.stop = bound("stop", &member.stop);
        resolved
    }

    /// All configured members, resolved
    pub fn members(&self) -> Vec<Member> {
        self.members.iter().map(|m| self.resolve_member(m)).collect()
    }
}

/// Fixed labels for non-normal days
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DayLabels {
    /// Label written on weekend rows
    pub weekend: String,
    /// Replaces the individual holiday names when set
    pub holiday: Option<String>,
}

impl Default for DayLabels {
    fn default() -> Self {
        Self {
            weekend: "Wochenende".into(),
            holiday: None,
        }
    }
}

/// Absence reasons
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbsenceLabels {
    pub vacation: String,
    pub training: String,
    pub sick: String,
    pub compensatory: String,
}

impl Default for AbsenceLabels {
    fn default() -> Self {
        Self {
            vacation: "Urlaub".into(),
            training: "Schulung".into(),
            sick: "Krank".into(),
            compensatory: "Gleittag".into(),
        }
    }
}

impl AbsenceLabels {
    /// Dropdown entries, in display order
    pub fn options(&self) -> [&str; 4] {
        [
            self.vacation.as_str(),
            self.training.as_str(),
            self.sick.as_str(),
            self.compensatory.as_str(),
        ]
    }
}

/// Named cell styles
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StyleName {
    #[default]
    Normal,
    Title,
    Heading,
    Accent1,
    Accent2,
    Accent3,
    Accent4,
    Accent5,
    Accent6,
}

/// Style lookup: which named style each sheet element uses
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleMap {
    pub header: StyleName,
    pub normal: StyleName,
    pub weekend: StyleName,
    pub holiday: StyleName,
    pub special: StyleName,
}

impl Default for StyleMap {
    fn default() -> Self {
        Self {
            header: StyleName::Title,
            normal: StyleName::Normal,
            weekend: StyleName::Accent2,
            holiday: StyleName::Accent1,
            special: StyleName::Accent6,
        }
    }
}

impl StyleMap {
    pub fn for_kind(&self, kind: DayKind) -> StyleName {
        match kind {
            DayKind::Normal => self.normal,
            DayKind::Weekend => self.weekend,
            DayKind::Holiday => self.holiday,
            DayKind::Special => self.special,
        }
    }
}

/// One named special day with its dates
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecialDayConfig {
    pub name: String,
    /// Day/month strings in the configured `format`, or ISO dates
    pub dates: Vec<String>,
    /// Background color such as `#FFC000`
    pub color: Option<String>,
}

/// One team member as written in the configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemberConfig {
    pub name: String,
    /// Target hours Monday, Tuesday, ... (at least five entries)
    pub hours: Vec<Hours>,
    pub start: Option<String>,
    pub stop: Option<String>,
    pub vacation_days: f64,
}

impl Default for MemberConfig {
    fn default() -> Self {
        Self {
            name: "x".into(),
            hours: DEFAULT_WEEKDAY_HOURS.to_vec(),
            start: None,
            stop: None,
            vacation_days: DEFAULT_VACATION_DAYS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    const SAMPLE: &str = r##"
year: 2025
country: DE
subdiv: SN
holidays:
  - name: Betriebsausflug
    dates: ["12/06", "11/09"]
    color: "#FFC000"
  - name: Stadtfest
    dates: ["2025-07-04"]
members:
  - name: Anna
    hours: [8, 8, 8, 8, 6.5]
    stop: "30/09"
  - name: Ben
    hours: [4, 4, 4]
    start: "2025-03-01"
    vacation_days: 15
"##;

    #[test]
    fn empty_document_yields_defaults() {
        let config = TimesheetConfig::from_yaml_str("").unwrap();
        assert_eq!(config.country, "DE");
        assert_eq!(config.subdiv, "BY");
        assert_eq!(config.format, "%d/%m");
        assert_eq!(config.year, Local::now().year());
        assert!(config.members.is_empty());
    }

    #[test]
    fn missing_member_keys_use_defaults() {
        let config = TimesheetConfig::from_yaml_str("members:\n  - {}\n").unwrap();
        let member = &config.members[0];
        assert_eq!(member.name, "x");
        assert_eq!(member.hours, vec![8.0, 8.0, 8.0, 8.0, 7.0]);
        assert_eq!(member.vacation_days, 30.0);
    }

    #[test]
    fn parses_sample() {
        let config = TimesheetConfig::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(config.year, 2025);
        assert_eq!(config.subdiv, "SN");
        assert_eq!(config.members.len(), 2);
        assert_eq!(config.members[0].hours[4], 6.5);
        assert_eq!(config.members[1].vacation_days, 15.0);
        assert_eq!(config.styles, StyleMap::default());
    }

    #[test]
    fn special_days_resolve_in_target_year() {
        let config = TimesheetConfig::from_yaml_str(SAMPLE).unwrap();
        let days = config.special_days();
        assert_eq!(days.len(), 3);
        let outing = &days[&date(2025, 6, 12)];
        assert_eq!(outing.label, "Betriebsausflug");
        assert_eq!(outing.color.as_deref(), Some("#FFC000"));
        assert_eq!(days[&date(2025, 7, 4)].label, "Stadtfest");
    }

    #[test]
    fn unparseable_special_day_is_skipped() {
        let config = TimesheetConfig::from_yaml_str(
            "year: 2025\nholidays:\n  - name: Schalttag\n    dates: [\"29/02\", \"soon\"]\n",
        )
        .unwrap();
        assert!(config.special_days().is_empty());
    }

    #[test]
    fn member_bounds_accept_both_formats() {
        let config = TimesheetConfig::from_yaml_str(SAMPLE).unwrap();
        let members = config.members();
        assert_eq!(members[0].stop, Some(date(2025, 9, 30)));
        assert_eq!(members[0].start, None);
        assert_eq!(members[1].start, Some(date(2025, 3, 1)));
    }

    #[test]
    fn invalid_member_bound_falls_back() {
        let config =
            TimesheetConfig::from_yaml_str("year: 2025\nmembers:\n  - name: C\n    stop: later\n")
                .unwrap();
        assert_eq!(config.members()[0].stop, None);
    }

    #[test]
    fn custom_format() {
        let config =
            TimesheetConfig::from_yaml_str("year: 2024\nformat: \"%m-%d\"\n").unwrap();
        assert_eq!(config.parse_day("02-29"), Some(date(2024, 2, 29)));
        assert_eq!(config.parse_day("29/02"), None);
    }

    #[test]
    fn style_map_lookup_and_override() {
        let config = TimesheetConfig::from_yaml_str("styles:\n  weekend: Accent4\n").unwrap();
        assert_eq!(config.styles.for_kind(DayKind::Weekend), StyleName::Accent4);
        assert_eq!(config.styles.for_kind(DayKind::Holiday), StyleName::Accent1);
        assert_eq!(config.styles.header, StyleName::Title);
    }

    #[test]
    fn unknown_style_is_a_parse_error() {
        let err = TimesheetConfig::from_yaml_str("styles:\n  weekend: Sparkly\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn validate_rejects_bad_year_and_country() {
        let mut config = TimesheetConfig::default();
        assert!(config.validate().is_ok());

        config.year = 1812;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidYear(1812))));

        config.year = 2025;
        config.country = "XX".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnsupportedCountry(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = TimesheetConfig::load(file.path()).unwrap();
        assert_eq!(config.members[0].name, "Anna");
    }

    #[test]
    fn load_missing_file() {
        let err = TimesheetConfig::load("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn absence_options_order() {
        let labels = AbsenceLabels::default();
        assert_eq!(labels.options(), ["Urlaub", "Schulung", "Krank", "Gleittag"]);
    }
}
