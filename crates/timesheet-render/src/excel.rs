//! Excel timesheet renderer
//!
//! Generates one XLSX worksheet per team member:
//! - Header row: Datum, Wochentag, Soll, Ist, Saldo, Abwesenheit
//! - One row per planned day (see [`SheetPlan`])
//! - A summary block in columns H:I with leave, training, sick-day and
//!   overtime counters
//!
//! ## Row Layout
//!
//! ```text
//! | Datum      | Wochentag | Soll | Ist | Saldo       | Abwesenheit     |
//! |------------|-----------|------|-----|-------------|-----------------|
//! | 01.01.2025 | Mittwoch  |      |     |             | Neujahr         |  <- holiday style
//! | 02.01.2025 | Donnerstag| 8.00 |     | =IF(F3<>...)| [dropdown]      |  <- normal day
//! | 04.01.2025 | Samstag   |      |     |             | Wochenende      |  <- weekend style
//! ```
//!
//! Normal days leave the `Ist` cell blank for manual entry. The `Saldo` cell
//! holds a formula comparing actual and target hours:
//! ```text
//! =IF(F3<>"",0,IF(AND(A3<TODAY()-2,C3<>""),D3-C3,""))
//! ```
//! A day with an absence reason counts as balanced. The balance appears only
//! for days older than the configured grace period.
//!
//! Every counter in the summary block is a formula over the generated row
//! range. Nothing is evaluated at render time.

use std::collections::HashMap;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use rust_xlsxwriter::{
    DataValidation, ExcelDateTime, Format, FormatAlign, FormatBorder, Workbook, Worksheet,
};
use timesheet_core::{
    DayKind, Member, PlannedRow, RenderError, Renderer, SheetNames, SheetPlan, StyleName,
    TimesheetConfig, TimesheetError, YearCalendar,
};

/// Day column headers, in column order
pub const HEADERS: [&str; 6] = ["Datum", "Wochentag", "Soll", "Ist", "Saldo", "Abwesenheit"];

pub const COL_DATE: u16 = 0;
pub const COL_WEEKDAY: u16 = 1;
pub const COL_TARGET: u16 = 2;
pub const COL_ACTUAL: u16 = 3;
pub const COL_BALANCE: u16 = 4;
pub const COL_ABSENCE: u16 = 5;

/// Summary block position (column H labels, column I values)
pub const COL_SUMMARY_LABEL: u16 = 7;
pub const COL_SUMMARY_VALUE: u16 = 8;
/// Excel row of the summary title; entries follow directly below
pub const SUMMARY_TITLE_ROW: u32 = 2;

/// Excel timesheet renderer
#[derive(Clone, Debug)]
pub struct TimesheetRenderer {
    config: TimesheetConfig,
    /// Width of the six day columns
    pub column_width: f64,
    /// Height of every day row
    pub row_height: f64,
    /// Number format for the date column
    pub date_format: String,
    /// Whether to freeze the header row
    pub freeze_header: bool,
}

impl TimesheetRenderer {
    pub fn new(config: TimesheetConfig) -> Self {
        Self {
            config,
            column_width: 20.0,
            row_height: 25.0,
            date_format: "DD.MM.YYYY".into(),
            freeze_header: true,
        }
    }

    /// Set the width of the day columns
    pub fn column_width(mut self, width: f64) -> Self {
        self.column_width = width;
        self
    }

    /// Set the height of the day rows
    pub fn row_height(mut self, height: f64) -> Self {
        self.row_height = height;
        self
    }

    /// Set the Excel number format of the date column
    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    /// Keep the header row scrolling with the days
    pub fn no_freeze_header(mut self) -> Self {
        self.freeze_header = false;
        self
    }

    pub fn config(&self) -> &TimesheetConfig {
        &self.config
    }

    /// Build the workbook in memory.
    ///
    /// Members failing validation (weekday hours, sheet name, duplicate name)
    /// are skipped and reported in the returned [`RenderSummary`]; the
    /// remaining members are still written.
    pub fn build_workbook(
        &self,
        members: &[Member],
    ) -> Result<(Workbook, RenderSummary), RenderError> {
        if members.is_empty() {
            return Err(RenderError::InvalidData("No members to render".into()));
        }

        let calendar = YearCalendar::from_config(&self.config)?;
        let formats = self.create_formats();

        let mut workbook = Workbook::new();
        let mut summary = RenderSummary::default();
        let mut sheet_names = SheetNames::new();

        for member in members {
            let planned = SheetPlan::build(member, &calendar)
                .and_then(|plan| sheet_names.claim(member).map(|()| plan));
            let plan = match planned {
                Ok(plan) => plan,
                Err(err) => {
                    tracing::error!(member = %member.name, "{err}");
                    summary.rejected.push(err);
                    continue;
                }
            };

            self.add_member_sheet(&mut workbook, &plan, &formats)?;
            tracing::info!(member = %plan.member, rows = plan.len(), "wrote member sheet");
            summary.written.push(plan.member);
        }

        if summary.written.is_empty() {
            return Err(RenderError::InvalidData(format!(
                "No member sheet could be written ({} rejected)",
                summary.rejected.len()
            )));
        }

        Ok((workbook, summary))
    }

    /// Generate Excel workbook bytes
    pub fn render_to_bytes(&self, members: &[Member]) -> Result<RenderedWorkbook, RenderError> {
        let (mut workbook, summary) = self.build_workbook(members)?;
        let bytes = workbook
            .save_to_buffer()
            .map_err(|e| RenderError::Format(format!("Failed to create Excel: {e}")))?;
        Ok(RenderedWorkbook { bytes, summary })
    }

    /// Generate the workbook and write it to `path`
    pub fn save(
        &self,
        members: &[Member],
        path: impl AsRef<Path>,
    ) -> Result<RenderSummary, RenderError> {
        let rendered = self.render_to_bytes(members)?;
        std::fs::write(path.as_ref(), &rendered.bytes)?;
        tracing::info!(
            path = %path.as_ref().display(),
            sheets = rendered.summary.written.len(),
            "saved workbook"
        );
        Ok(rendered.summary)
    }

    /// Create reusable formats
    fn create_formats(&self) -> ExcelFormats {
        let styles = [
            StyleName::Normal,
            StyleName::Title,
            StyleName::Heading,
            StyleName::Accent1,
            StyleName::Accent2,
            StyleName::Accent3,
            StyleName::Accent4,
            StyleName::Accent5,
            StyleName::Accent6,
        ]
        .into_iter()
        .map(|name| (name, RowFormats::new(style_format(name), &self.date_format)))
        .collect();

        // Special days with their own color
        let mut colors = HashMap::new();
        let special_style = style_format(self.config.styles.special);
        for entry in &self.config.holidays {
            let Some(color) = entry.color.as_deref() else {
                continue;
            };
            match parse_hex_color(color) {
                Some(rgb) => {
                    let base = special_style
                        .clone()
                        .set_background_color(rgb)
                        .set_font_color(0x000000);
                    colors.insert(color.to_string(), RowFormats::new(base, &self.date_format));
                }
                None => {
                    tracing::warn!(
                        special_day = %entry.name,
                        color,
                        "invalid color, using special-day style"
                    );
                }
            }
        }

        let header = style_format(self.config.styles.header).set_align(FormatAlign::Center);

        let summary_title = style_format(StyleName::Title);

        let summary_label = Format::new()
            .set_bold()
            .set_border(FormatBorder::Thin);

        let summary_value = Format::new()
            .set_num_format("0.00")
            .set_border(FormatBorder::Thin);

        ExcelFormats {
            header,
            summary_title,
            summary_label,
            summary_value,
            styles,
            colors,
        }
    }

    /// Add one member sheet
    fn add_member_sheet(
        &self,
        workbook: &mut Workbook,
        plan: &SheetPlan,
        formats: &ExcelFormats,
    ) -> Result<(), RenderError> {
        let sheet = workbook.add_worksheet();
        sheet.set_name(&plan.member).map_err(|e| {
            RenderError::Format(format!("Invalid sheet name '{}': {e}", plan.member))
        })?;

        self.write_header(sheet, formats)?;

        for row in &plan.rows {
            self.write_day_row(sheet, row, formats)?;
        }

        // Absence reason dropdown, one validation per block of normal days
        let absence = DataValidation::new()
            .allow_list_strings(&self.config.absence.options())
            .map_err(|e| RenderError::Format(e.to_string()))?;
        for (first, last) in normal_row_runs(plan) {
            sheet
                .add_data_validation(first - 1, COL_ABSENCE, last - 1, COL_ABSENCE, &absence)
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }

        self.write_summary(sheet, plan, formats)?;

        Ok(())
    }

    /// Write the header row and column widths
    fn write_header(
        &self,
        sheet: &mut Worksheet,
        formats: &ExcelFormats,
    ) -> Result<(), RenderError> {
        for (col, header) in HEADERS.iter().enumerate() {
            sheet
                .write_with_format(0, col as u16, *header, &formats.header)
                .map_err(|e| RenderError::Format(e.to_string()))?;
            sheet.set_column_width(col as u16, self.column_width).ok();
        }
        sheet.set_row_height(0, self.row_height).ok();

        if self.freeze_header {
            sheet.set_freeze_panes(1, 0).ok();
        }

        Ok(())
    }

    /// Write one day row
    fn write_day_row(
        &self,
        sheet: &mut Worksheet,
        row: &PlannedRow,
        formats: &ExcelFormats,
    ) -> Result<(), RenderError> {
        let r = row.excel_row - 1; // rust_xlsxwriter rows are 0-indexed
        let day = &row.day;
        let fmt = formats.for_day(&self.config, day.kind, day.color.as_deref());

        // Col A: Date
        sheet
            .write_datetime_with_format(r, COL_DATE, &excel_date(day.date)?, &fmt.date)
            .map_err(|e| RenderError::Format(e.to_string()))?;

        // Col B: Weekday
        sheet
            .write_with_format(r, COL_WEEKDAY, day.weekday_name(), &fmt.text)
            .map_err(|e| RenderError::Format(e.to_string()))?;

        if day.kind == DayKind::Normal {
            // Col C: Target hours
            match row.target_hours {
                Some(hours) => sheet.write_with_format(r, COL_TARGET, hours, &fmt.number),
                None => sheet.write_blank(r, COL_TARGET, &fmt.number),
            }
            .map_err(|e| RenderError::Format(e.to_string()))?;

            // Col D: Actual hours, entered by hand
            sheet
                .write_blank(r, COL_ACTUAL, &fmt.number)
                .map_err(|e| RenderError::Format(e.to_string()))?;

            // Col E: Balance
            let formula = balance_formula(row.excel_row, self.config.balance_grace_days);
            sheet
                .write_formula_with_format(r, COL_BALANCE, formula.as_str(), &fmt.number)
                .map_err(|e| RenderError::Format(e.to_string()))?;

            // Col F: Absence reason, validated per block in add_member_sheet
            sheet
                .write_blank(r, COL_ABSENCE, &fmt.text)
                .map_err(|e| RenderError::Format(e.to_string()))?;
        } else {
            for col in [COL_TARGET, COL_ACTUAL, COL_BALANCE] {
                sheet
                    .write_blank(r, col, &fmt.text)
                    .map_err(|e| RenderError::Format(e.to_string()))?;
            }

            // Col F: Holiday / weekend / special-day label
            sheet
                .write_with_format(r, COL_ABSENCE, day.label.as_str(), &fmt.text)
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }

        sheet.set_row_height(r, self.row_height).ok();

        Ok(())
    }

    /// Write the summary block next to the day columns
    fn write_summary(
        &self,
        sheet: &mut Worksheet,
        plan: &SheetPlan,
        formats: &ExcelFormats,
    ) -> Result<(), RenderError> {
        let title_row = SUMMARY_TITLE_ROW - 1;
        sheet
            .write_with_format(
                title_row,
                COL_SUMMARY_LABEL,
                "Zusammenfassung",
                &formats.summary_title,
            )
            .map_err(|e| RenderError::Format(e.to_string()))?;
        sheet
            .write_blank(title_row, COL_SUMMARY_VALUE, &formats.summary_title)
            .map_err(|e| RenderError::Format(e.to_string()))?;

        sheet.set_column_width(COL_SUMMARY_LABEL, 24).ok();
        sheet.set_column_width(COL_SUMMARY_VALUE, 14).ok();

        for (i, entry) in self.summary_entries(plan).iter().enumerate() {
            let r = title_row + 1 + i as u32;
            sheet
                .write_with_format(
                    r,
                    COL_SUMMARY_LABEL,
                    entry.label.as_str(),
                    &formats.summary_label,
                )
                .map_err(|e| RenderError::Format(e.to_string()))?;

            match &entry.value {
                SummaryValue::Text(text) => sheet.write_with_format(
                    r,
                    COL_SUMMARY_VALUE,
                    text.as_str(),
                    &formats.summary_label,
                ),
                SummaryValue::Number(n) => {
                    sheet.write_with_format(r, COL_SUMMARY_VALUE, *n, &formats.summary_value)
                }
                SummaryValue::Formula(formula) => sheet.write_formula_with_format(
                    r,
                    COL_SUMMARY_VALUE,
                    formula.as_str(),
                    &formats.summary_value,
                ),
            }
            .map_err(|e| RenderError::Format(e.to_string()))?;
        }

        Ok(())
    }

    /// Entries of the summary block, top to bottom.
    ///
    /// Counters reference the day rows of `plan`; the remaining-leave entry
    /// references the cells of the entitlement and leave-taken entries.
    pub fn summary_entries(&self, plan: &SheetPlan) -> Vec<SummaryEntry> {
        let first = plan.first_row();
        let last = plan.last_row();
        let range = |col: u16| {
            let letter = col_to_letter(col);
            format!("{letter}{first}:{letter}{last}")
        };
        let absence = range(COL_ABSENCE);
        let balance = range(COL_BALANCE);
        let countif = |label: &str| format!("=COUNTIF({absence},\"{}\")", excel_string(label));

        // Excel rows of the entries referenced by "Resturlaub"
        let value_cell = |index: u32| {
            format!("{}{}", col_to_letter(COL_SUMMARY_VALUE), SUMMARY_TITLE_ROW + 1 + index)
        };
        let labels = &self.config.absence;

        vec![
            SummaryEntry::new("Mitarbeiter", SummaryValue::Text(plan.member.clone())),
            SummaryEntry::new("Urlaubsanspruch", SummaryValue::Number(plan.vacation_days)),
            SummaryEntry::new("Urlaub genommen", SummaryValue::Formula(countif(&labels.vacation))),
            SummaryEntry::new(
                "Resturlaub",
                SummaryValue::Formula(format!("={}-{}", value_cell(1), value_cell(2))),
            ),
            SummaryEntry::new("Schulungstage", SummaryValue::Formula(countif(&labels.training))),
            SummaryEntry::new("Krankheitstage", SummaryValue::Formula(countif(&labels.sick))),
            SummaryEntry::new("Gleittage", SummaryValue::Formula(countif(&labels.compensatory))),
            SummaryEntry::new(
                "Sollstunden",
                SummaryValue::Formula(format!("=SUM({})", range(COL_TARGET))),
            ),
            SummaryEntry::new(
                "Überstunden",
                SummaryValue::Formula(format!("=SUMIF({balance},\">0\")")),
            ),
            SummaryEntry::new(
                "Minusstunden",
                SummaryValue::Formula(format!("=SUMIF({balance},\"<0\")")),
            ),
            SummaryEntry::new("Saldo", SummaryValue::Formula(format!("=SUM({balance})"))),
        ]
    }
}

/// Outcome of a render run
#[derive(Debug, Default)]
pub struct RenderSummary {
    /// Members with a sheet, in workbook order
    pub written: Vec<String>,
    /// Members rejected by validation
    pub rejected: Vec<TimesheetError>,
}

impl RenderSummary {
    /// True when no member was rejected
    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Workbook bytes plus the render outcome
#[derive(Debug)]
pub struct RenderedWorkbook {
    pub bytes: Vec<u8>,
    pub summary: RenderSummary,
}

/// One label/value line of the summary block
#[derive(Clone, Debug, PartialEq)]
pub struct SummaryEntry {
    pub label: String,
    pub value: SummaryValue,
}

impl SummaryEntry {
    fn new(label: &str, value: SummaryValue) -> Self {
        Self {
            label: label.to_string(),
            value,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SummaryValue {
    Text(String),
    Number(f64),
    Formula(String),
}

/// Balance formula for one day row (1-based Excel row)
pub fn balance_formula(excel_row: u32, grace_days: u32) -> String {
    let r = excel_row;
    format!("=IF(F{r}<>\"\",0,IF(AND(A{r}<TODAY()-{grace_days},C{r}<>\"\"),D{r}-C{r},\"\"))")
}

/// Consecutive normal-day rows as inclusive `(first, last)` pairs of
/// 1-based Excel rows
pub fn normal_row_runs(plan: &SheetPlan) -> Vec<(u32, u32)> {
    let mut runs: Vec<(u32, u32)> = Vec::new();
    for row in plan.rows.iter().filter(|r| r.day.kind == DayKind::Normal) {
        match runs.last_mut() {
            Some((_, last)) if *last + 1 == row.excel_row => *last = row.excel_row,
            _ => runs.push((row.excel_row, row.excel_row)),
        }
    }
    runs
}

/// Convert column number to Excel letter (0 -> A, 25 -> Z, 26 -> AA)
pub fn col_to_letter(col: u16) -> String {
    let mut result = String::new();
    let mut n = u32::from(col);
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}

/// Parse `#RRGGBB` (the `#` is optional)
pub fn parse_hex_color(color: &str) -> Option<u32> {
    let hex = color.trim().trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

/// Quote a string for use inside an Excel string literal
fn excel_string(text: &str) -> String {
    text.replace('"', "\"\"")
}

fn excel_date(date: NaiveDate) -> Result<ExcelDateTime, RenderError> {
    let year = u16::try_from(date.year())
        .map_err(|_| RenderError::InvalidData(format!("Date out of Excel range: {date}")))?;
    ExcelDateTime::from_ymd(year, date.month() as u8, date.day() as u8)
        .map_err(|e| RenderError::InvalidData(format!("Date out of Excel range: {date}: {e}")))
}

/// Base format of a named style
fn style_format(name: StyleName) -> Format {
    let base = Format::new().set_border(FormatBorder::Thin);

    match name {
        StyleName::Normal => base,
        StyleName::Title => base
            .set_bold()
            .set_font_size(13)
            .set_font_color(0x44546A)
            .set_border_bottom(FormatBorder::Medium),
        StyleName::Heading => base.set_bold().set_font_color(0x44546A),
        StyleName::Accent1 => accent(base, 0x4472C4),
        StyleName::Accent2 => accent(base, 0xED7D31),
        StyleName::Accent3 => accent(base, 0xA5A5A5),
        StyleName::Accent4 => accent(base, 0xFFC000),
        StyleName::Accent5 => accent(base, 0x5B9BD5),
        StyleName::Accent6 => accent(base, 0x70AD47),
    }
}

/// Filled background with white text
fn accent(base: Format, background: u32) -> Format {
    base.set_background_color(background).set_font_color(0xFFFFFF)
}

/// Date/text/number variants of one style
#[derive(Clone)]
struct RowFormats {
    date: Format,
    text: Format,
    number: Format,
}

impl RowFormats {
    fn new(base: Format, date_format: &str) -> Self {
        Self {
            date: base.clone().set_num_format(date_format),
            number: base.clone().set_num_format("0.00"),
            text: base,
        }
    }
}

/// Reusable Excel formats
struct ExcelFormats {
    header: Format,
    summary_title: Format,
    summary_label: Format,
    summary_value: Format,
    // One entry per named style
    styles: HashMap<StyleName, RowFormats>,
    // Special-day color overrides, keyed by the configured color string
    colors: HashMap<String, RowFormats>,
}

impl ExcelFormats {
    fn for_day(&self, config: &TimesheetConfig, kind: DayKind, color: Option<&str>) -> &RowFormats {
        color
            .and_then(|c| self.colors.get(c))
            .or_else(|| self.styles.get(&config.styles.for_kind(kind)))
            .unwrap_or(&self.styles[&StyleName::Normal])
    }
}

impl Renderer for TimesheetRenderer {
    type Output = RenderedWorkbook;

    fn render(&self, members: &[Member]) -> Result<RenderedWorkbook, RenderError> {
        self.render_to_bytes(members)
    }
}
