//! Plain-text listing of classified days

use timesheet_core::{DayKind, DayRecord};

/// Renders one line per day: date, weekday, kind, label
#[derive(Clone, Debug, Default)]
pub struct DayListRenderer {
    /// Only list days that are not normal workdays
    pub non_working_only: bool,
}

impl DayListRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip normal workdays
    pub fn non_working_only(mut self) -> Self {
        self.non_working_only = true;
        self
    }

    pub fn render<I>(&self, days: I) -> String
    where
        I: IntoIterator<Item = DayRecord>,
    {
        let mut out = String::new();
        for day in days {
            if self.non_working_only && day.kind == DayKind::Normal {
                continue;
            }
            out.push_str(&day_line(&day));
            out.push('\n');
        }
        out
    }
}

/// `2025-01-01  Mittwoch    holiday  Neujahr`
pub fn day_line(day: &DayRecord) -> String {
    format!(
        "{}  {:<10}  {:<7}  {}",
        day.date.format("%Y-%m-%d"),
        day.weekday_name(),
        day.kind.to_string(),
        day.label
    )
    .trim_end()
    .to_string()
}
