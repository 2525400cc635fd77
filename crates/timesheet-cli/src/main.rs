//! timesheet CLI - Annual timesheet workbook generator
//!
//! Command-line interface for generating, inspecting and checking timesheets.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use timesheet_core::{DayKind, Member, SheetNames, SheetPlan, TimesheetConfig, YearCalendar};
use timesheet_render::{DayListRenderer, TimesheetRenderer};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "timesheet")]
#[command(author, version, about = "Annual timesheet workbook generator", long_about = None)]
struct Cli {
    /// Verbose output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file
    #[arg(short, long, default_value = "config.yaml", env = "TIMESHEET_CONFIG", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the timesheet workbook, one sheet per member
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "timesheet.xlsx")]
        output: PathBuf,

        /// Override the configured year
        #[arg(short, long)]
        year: Option<i32>,

        /// Only generate sheets for these members
        #[arg(short, long = "member", value_name = "NAME")]
        members: Vec<String>,
    },

    /// Print the classified days of the year
    Days {
        /// Override the configured year
        #[arg(short, long)]
        year: Option<i32>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = DaysFormat::Text)]
        format: DaysFormat,

        /// Only list weekends, holidays and special days
        #[arg(long)]
        non_working: bool,
    },

    /// Validate the configuration and every member
    Check,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DaysFormat {
    Text,
    Json,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = load_config(&cli.config)?;

    match cli.command {
        Commands::Generate { output, year, members } => {
            if let Some(year) = year {
                config.year = year;
            }
            cmd_generate(config, &output, &members)
        }
        Commands::Days { year, format, non_working } => {
            if let Some(year) = year {
                config.year = year;
            }
            cmd_days(&config, format, non_working)
        }
        Commands::Check => cmd_check(&config, &cli.config),
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(path: &Path) -> Result<TimesheetConfig> {
    let config = TimesheetConfig::load(path)
        .with_context(|| format!("Failed to load configuration {}", path.display()))?;
    tracing::info!(path = %path.display(), year = config.year, "configuration loaded");
    Ok(config)
}

/// Keep only the requested members, in configuration order
fn select_members(all: Vec<Member>, names: &[String]) -> Result<Vec<Member>> {
    if names.is_empty() {
        return Ok(all);
    }

    for name in names {
        if !all.iter().any(|m| &m.name == name) {
            bail!("No member named '{name}' in the configuration");
        }
    }

    Ok(all.into_iter().filter(|m| names.contains(&m.name)).collect())
}

fn cmd_generate(config: TimesheetConfig, output: &Path, names: &[String]) -> Result<ExitCode> {
    let members = select_members(config.members(), names)?;
    let year = config.year;

    let renderer = TimesheetRenderer::new(config);
    let summary = renderer
        .save(&members, output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    for error in &summary.rejected {
        eprintln!("Skipped: {error}");
    }
    println!(
        "Wrote {} sheet(s) for {} to {}",
        summary.written.len(),
        year,
        output.display()
    );

    Ok(if summary.is_complete() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_days(config: &TimesheetConfig, format: DaysFormat, non_working: bool) -> Result<ExitCode> {
    let calendar = YearCalendar::from_config(config).context("Failed to build the year calendar")?;

    match format {
        DaysFormat::Text => {
            let mut renderer = DayListRenderer::new();
            if non_working {
                renderer = renderer.non_working_only();
            }
            print!("{}", renderer.render(calendar.days()));
        }
        DaysFormat::Json => {
            let days: Vec<_> = calendar
                .days()
                .filter(|day| !non_working || day.kind != DayKind::Normal)
                .collect();
            println!("{}", serde_json::to_string_pretty(&days)?);
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn cmd_check(config: &TimesheetConfig, path: &Path) -> Result<ExitCode> {
    let calendar = YearCalendar::from_config(config).context("Failed to build the year calendar")?;
    let table = config.holiday_calendar()?;
    let holidays = calendar.days().filter(|d| d.kind == DayKind::Holiday).count();

    println!("Configuration: {}", path.display());
    println!(
        "Year {}: {} ({} holidays, {} special days configured)",
        calendar.year(),
        table.name(),
        holidays,
        config.special_days().len()
    );

    let members = config.members();
    if members.is_empty() {
        println!("No members configured");
    }

    let mut names = SheetNames::new();
    let mut failed = 0;
    for member in &members {
        let planned = SheetPlan::build(member, &calendar)
            .and_then(|plan| names.claim(member).map(|()| plan));
        match planned {
            Ok(plan) => println!(
                "  ok    {} ({} rows, {:.1} target hours)",
                member.name,
                plan.len(),
                plan.target_total()
            ),
            Err(e) => {
                failed += 1;
                println!("  error {e}");
            }
        }
        for (field, date) in member.bounds_outside(calendar.year()) {
            println!(
                "  warn  {}: {field} {date} is outside {}",
                member.name,
                calendar.year()
            );
        }
    }

    if failed > 0 {
        println!("{failed} of {} member(s) would be skipped", members.len());
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
