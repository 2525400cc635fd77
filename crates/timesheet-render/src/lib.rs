//! # timesheet-render
//!
//! Output backends for timesheet sheet plans.
//!
//! This crate provides:
//! - The XLSX workbook writer (one sheet per member, formulas, dropdowns, summary block)
//! - A plain-text listing of classified days
//!
//! ## Example
//!
//! ```rust,ignore
//! use timesheet_core::{Renderer, TimesheetConfig};
//! use timesheet_render::TimesheetRenderer;
//!
//! let config = TimesheetConfig::load("config.yaml")?;
//! let members = config.members();
//! let renderer = TimesheetRenderer::new(config);
//! let rendered = renderer.render(&members)?;
//! std::fs::write("timesheet.xlsx", rendered.bytes)?;
//! ```

pub mod excel;
pub mod text;

pub use excel::{
    balance_formula, normal_row_runs, RenderSummary, RenderedWorkbook, SummaryEntry, SummaryValue,
    TimesheetRenderer, HEADERS,
};
pub use text::{day_line, DayListRenderer};
