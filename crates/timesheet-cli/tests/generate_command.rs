//! Integration tests for `timesheet generate`
//!
//! ## Exit Code Contract
//!
//! | Exit Code | Meaning |
//! |-----------|---------|
//! | 0 | Every selected member was written |
//! | 1 | At least one member was skipped, or the run failed |

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const TEAM: &str = r##"
year: 2025
country: DE
subdiv: BY
holidays:
  - name: Betriebsausflug
    dates: ["12/06"]
    color: "#FFC000"
members:
  - name: Anna
    hours: [8, 8, 8, 8, 7]
  - name: Ben
    hours: [8, 8, 8, 8, 8]
    start: "01/03"
    stop: "30/09"
"##;

fn write_config(dir: &TempDir, yaml: &str) -> PathBuf {
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, yaml).unwrap();
    path
}

fn run_generate(config: &Path, output: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_timesheet"))
        .arg("--config")
        .arg(config)
        .arg("generate")
        .arg("--output")
        .arg(output)
        .args(args)
        .output()
        .expect("failed to execute timesheet")
}

fn assert_xlsx(path: &Path) {
    let bytes = std::fs::read(path).unwrap();
    assert_eq!(&bytes[0..2], b"PK", "output should be a zip container");
}

#[test]
fn generate_writes_workbook() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, TEAM);
    let output = dir.path().join("team.xlsx");

    let result = run_generate(&config, &output, &[]);

    assert!(result.status.success(), "stderr: {}", String::from_utf8_lossy(&result.stderr));
    assert_xlsx(&output);
    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains("Wrote 2 sheet(s) for 2025"));
}

#[test]
fn generate_with_year_override() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, TEAM);
    let output = dir.path().join("2024.xlsx");

    let result = run_generate(&config, &output, &["--year", "2024"]);

    assert_eq!(result.status.code(), Some(0));
    assert_xlsx(&output);
    assert!(String::from_utf8_lossy(&result.stdout).contains("for 2024"));
}

#[test]
fn rejected_member_exits_1_and_others_are_written() {
    let dir = TempDir::new().unwrap();
    let yaml = format!("{TEAM}  - name: Carla\n    hours: [8, 8, 8]\n");
    let config = write_config(&dir, &yaml);
    let output = dir.path().join("team.xlsx");

    let result = run_generate(&config, &output, &[]);

    assert_eq!(result.status.code(), Some(1));
    assert_xlsx(&output);
    let stdout = String::from_utf8_lossy(&result.stdout);
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stdout.contains("Wrote 2 sheet(s)"));
    assert!(stderr.contains("Member 'Carla' has 3 weekday-hours entries"));
}

#[test]
fn member_filter() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, TEAM);
    let output = dir.path().join("ben.xlsx");

    let result = run_generate(&config, &output, &["--member", "Ben"]);

    assert_eq!(result.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&result.stdout).contains("Wrote 1 sheet(s)"));
}

#[test]
fn unknown_member_fails_without_output() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, TEAM);
    let output = dir.path().join("nobody.xlsx");

    let result = run_generate(&config, &output, &["--member", "Zoe"]);

    assert_eq!(result.status.code(), Some(1));
    assert!(!output.exists());
    assert!(String::from_utf8_lossy(&result.stderr).contains("No member named 'Zoe'"));
}

#[test]
fn missing_config_fails() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.xlsx");

    let result = run_generate(&dir.path().join("absent.yaml"), &output, &[]);

    assert_eq!(result.status.code(), Some(1));
    assert!(!output.exists());
    assert!(String::from_utf8_lossy(&result.stderr).contains("Failed to load configuration"));
}

#[test]
fn unusable_sheet_name_skips_only_that_member() {
    let dir = TempDir::new().unwrap();
    let yaml = format!("{TEAM}  - name: \"Team [Nord]\"\n  - name: anna\n");
    let config = write_config(&dir, &yaml);
    let output = dir.path().join("team.xlsx");

    let result = run_generate(&config, &output, &[]);

    assert_eq!(result.status.code(), Some(1));
    assert_xlsx(&output);
    let stdout = String::from_utf8_lossy(&result.stdout);
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stdout.contains("Wrote 2 sheet(s)"));
    assert!(stderr.contains("Skipped: Member 'Team [Nord]' cannot be used as a sheet name"));
    assert!(stderr.contains("Skipped: Member 'anna' is listed more than once"));
}

#[test]
fn year_override_warns_about_iso_bounds() {
    let dir = TempDir::new().unwrap();
    let yaml = "year: 2025\nmembers:\n  - name: Marco\n    stop: \"2025-08-31\"\n";
    let config = write_config(&dir, yaml);
    let output = dir.path().join("2026.xlsx");

    let result = run_generate(&config, &output, &["--year", "2026"]);

    assert_eq!(result.status.code(), Some(0));
    assert_xlsx(&output);
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("member date lies outside the target year"));
}
