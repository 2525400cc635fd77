//! Public holiday tables
//!
//! A [`HolidayCalendar`] maps every public holiday of a year to its name.
//! [`GermanHolidays`] covers the nationwide holidays plus the regional ones of
//! all sixteen states. Movable feasts are derived from the Gregorian Easter
//! date.
//!
//! ```rust
//! use chrono::NaiveDate;
//! use timesheet_core::{GermanHolidays, GermanState, HolidayCalendar};
//!
//! let bavaria = GermanHolidays::for_state(GermanState::BY);
//! let epiphany = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
//! assert_eq!(bavaria.holiday_name(epiphany).as_deref(), Some("Heilige Drei Könige"));
//! ```

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate, Weekday};

use crate::ConfigError;

/// Lookup of public holidays for a country/subdivision
pub trait HolidayCalendar: Send + Sync {
    /// Human-readable name of the calendar (e.g. `DE-BY`)
    fn name(&self) -> &str;

    /// All holidays of `year`, keyed by date
    fn holidays(&self, year: i32) -> BTreeMap<NaiveDate, String>;

    /// Name of the holiday on `date`, if any
    fn holiday_name(&self, date: NaiveDate) -> Option<String> {
        self.holidays(date.year()).remove(&date)
    }

    fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holiday_name(date).is_some()
    }
}

/// Build the holiday calendar for a country/subdivision pair.
///
/// An empty country or `none` yields [`NoHolidays`]. An empty subdivision
/// yields the nationwide table only.
pub fn calendar_for(country: &str, subdiv: &str) -> Result<Box<dyn HolidayCalendar>, ConfigError> {
    match country.trim().to_ascii_uppercase().as_str() {
        "" | "NONE" => Ok(Box::new(NoHolidays)),
        "DE" => {
            let subdiv = subdiv.trim();
            if subdiv.is_empty() {
                Ok(Box::new(GermanHolidays::national()))
            } else {
                Ok(Box::new(GermanHolidays::from_subdivision(subdiv)?))
            }
        }
        other => Err(ConfigError::UnsupportedCountry(other.to_string())),
    }
}

/// Easter Sunday of the Gregorian calendar (anonymous Gregorian algorithm)
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year.rem_euclid(19);
    let b = year.div_euclid(100);
    let c = year.rem_euclid(100);
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

// ============================================================================
// Empty calendar
// ============================================================================

/// Calendar without any public holidays
#[derive(Clone, Copy, Debug, Default)]
pub struct NoHolidays;

impl HolidayCalendar for NoHolidays {
    fn name(&self) -> &str {
        "none"
    }

    fn holidays(&self, _year: i32) -> BTreeMap<NaiveDate, String> {
        BTreeMap::new()
    }
}

// ============================================================================
// Germany
// ============================================================================

/// German federal states (ISO 3166-2:DE subdivision codes)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GermanState {
    /// Baden-Württemberg
    BW,
    /// Bayern
    BY,
    /// Berlin
    BE,
    /// Brandenburg
    BB,
    /// Bremen
    HB,
    /// Hamburg
    HH,
    /// Hessen
    HE,
    /// Mecklenburg-Vorpommern
    MV,
    /// Niedersachsen
    NI,
    /// Nordrhein-Westfalen
    NW,
    /// Rheinland-Pfalz
    RP,
    /// Saarland
    SL,
    /// Sachsen
    SN,
    /// Sachsen-Anhalt
    ST,
    /// Schleswig-Holstein
    SH,
    /// Thüringen
    TH,
}

impl GermanState {
    pub const ALL: [GermanState; 16] = [
        GermanState::BW,
        GermanState::BY,
        GermanState::BE,
        GermanState::BB,
        GermanState::HB,
        GermanState::HH,
        GermanState::HE,
        GermanState::MV,
        GermanState::NI,
        GermanState::NW,
        GermanState::RP,
        GermanState::SL,
        GermanState::SN,
        GermanState::ST,
        GermanState::SH,
        GermanState::TH,
    ];

    pub fn code(self) -> &'static str {
        match self {
            GermanState::BW => "BW",
            GermanState::BY => "BY",
            GermanState::BE => "BE",
            GermanState::BB => "BB",
            GermanState::HB => "HB",
            GermanState::HH => "HH",
            GermanState::HE => "HE",
            GermanState::MV => "MV",
            GermanState::NI => "NI",
            GermanState::NW => "NW",
            GermanState::RP => "RP",
            GermanState::SL => "SL",
            GermanState::SN => "SN",
            GermanState::ST => "ST",
            GermanState::SH => "SH",
            GermanState::TH => "TH",
        }
    }
}

impl FromStr for GermanState {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        GermanState::ALL
            .into_iter()
            .find(|state| state.code() == code)
            .ok_or_else(|| ConfigError::UnsupportedSubdivision {
                country: "DE".into(),
                subdiv: s.to_string(),
            })
    }
}

/// German public holidays, optionally including one state's regional holidays
#[derive(Clone, Debug)]
pub struct GermanHolidays {
    state: Option<GermanState>,
    name: String,
}

impl GermanHolidays {
    /// Nationwide holidays only
    pub fn national() -> Self {
        Self {
            state: None,
            name: "DE".into(),
        }
    }

    /// Nationwide plus the regional holidays of `state`
    pub fn for_state(state: GermanState) -> Self {
        Self {
            state: Some(state),
            name: format!("DE-{}", state.code()),
        }
    }

    /// Parse a subdivision code such as `BY`
    pub fn from_subdivision(code: &str) -> Result<Self, ConfigError> {
        Ok(Self::for_state(code.parse()?))
    }

    pub fn state(&self) -> Option<GermanState> {
        self.state
    }

    fn in_state(&self, states: &[GermanState]) -> bool {
        self.state.is_some_and(|s| states.contains(&s))
    }
}

impl HolidayCalendar for GermanHolidays {
    fn name(&self) -> &str {
        &self.name
    }

    fn holidays(&self, year: i32) -> BTreeMap<NaiveDate, String> {
        use GermanState::*;

        let mut table = BTreeMap::new();
        let fixed = |month: u32, day: u32| NaiveDate::from_ymd_opt(year, month, day);

        // Nationwide fixed dates
        add(&mut table, fixed(1, 1), "Neujahr");
        add(&mut table, fixed(5, 1), "Erster Mai");
        add(&mut table, fixed(10, 3), "Tag der Deutschen Einheit");
        add(&mut table, fixed(12, 25), "Erster Weihnachtstag");
        add(&mut table, fixed(12, 26), "Zweiter Weihnachtstag");

        // Easter-relative dates
        if let Some(easter) = easter_sunday(year) {
            let offset = |days: i64| {
                if days < 0 {
                    easter.checked_sub_days(Days::new(days.unsigned_abs()))
                } else {
                    easter.checked_add_days(Days::new(days as u64))
                }
            };
            add(&mut table, offset(-2), "Karfreitag");
            add(&mut table, offset(1), "Ostermontag");
            add(&mut table, offset(39), "Christi Himmelfahrt");
            add(&mut table, offset(50), "Pfingstmontag");

            if self.in_state(&[BB]) {
                add(&mut table, Some(easter), "Ostersonntag");
                add(&mut table, offset(49), "Pfingstsonntag");
            }
            if self.in_state(&[BW, BY, HE, NW, RP, SL]) {
                add(&mut table, offset(60), "Fronleichnam");
            }
        }

        // Regional fixed dates
        if self.in_state(&[BW, BY, ST]) {
            add(&mut table, fixed(1, 6), "Heilige Drei Könige");
        }
        if (self.in_state(&[BE]) && year >= 2019) || (self.in_state(&[MV]) && year >= 2023) {
            add(&mut table, fixed(3, 8), "Internationaler Frauentag");
        }
        if self.in_state(&[BE]) && (year == 2020 || year == 2025) {
            add(&mut table, fixed(5, 8), "Tag der Befreiung");
        }
        if self.in_state(&[BY, SL]) {
            add(&mut table, fixed(8, 15), "Mariä Himmelfahrt");
        }
        if self.in_state(&[TH]) && year >= 2019 {
            add(&mut table, fixed(9, 20), "Weltkindertag");
        }
        if year == 2017
            || self.in_state(&[BB, MV, SN, ST, TH])
            || (self.in_state(&[HB, HH, NI, SH]) && year >= 2018)
        {
            add(&mut table, fixed(10, 31), "Reformationstag");
        }
        if self.in_state(&[BW, BY, NW, RP, SL]) {
            add(&mut table, fixed(11, 1), "Allerheiligen");
        }
        if year <= 1994 || self.in_state(&[SN]) {
            add(&mut table, repentance_day(year), "Buß- und Bettag");
        }

        table
    }
}

/// Wednesday before November 23
fn repentance_day(year: i32) -> Option<NaiveDate> {
    let nov22 = NaiveDate::from_ymd_opt(year, 11, 22)?;
    let back = (nov22.weekday().num_days_from_monday() + 7
        - Weekday::Wed.num_days_from_monday())
        % 7;
    nov22.checked_sub_days(Days::new(u64::from(back)))
}

/// Insert a holiday, joining names when two holidays share a date.
fn add(table: &mut BTreeMap<NaiveDate, String>, date: Option<NaiveDate>, name: &str) {
    let Some(date) = date else {
        return;
    };
    table
        .entry(date)
        .and_modify(|existing| {
            existing.push_str("; ");
            existing.push_str(name);
        })
        .or_insert_with(|| name.to_string());
}
