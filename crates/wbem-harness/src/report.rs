//! Per-case results and the run summary

use crate::error::HarnessError;
use crate::verify::Mismatch;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Verdict for one test case
#[derive(Debug, Clone, PartialEq)]
pub enum CaseStatus {
    Passed,
    /// Every expectation was checked; these ones did not hold
    Failed(Vec<Mismatch>),
    /// The case could not be judged
    Errored(HarnessError),
}

impl CaseStatus {
    pub fn label(&self) -> &'static str {
        match self {
            CaseStatus::Passed => "passed",
            CaseStatus::Failed(_) => "failed",
            CaseStatus::Errored(_) => "errored",
        }
    }
}

/// Result of running one test case
#[derive(Debug, Clone, PartialEq)]
pub struct CaseResult {
    pub name: String,
    pub description: String,
    pub source: PathBuf,
    pub status: CaseStatus,
    pub duration: Duration,
}

impl CaseResult {
    pub fn passed(&self) -> bool {
        matches!(self.status, CaseStatus::Passed)
    }

    pub fn mismatches(&self) -> &[Mismatch] {
        match &self.status {
            CaseStatus::Failed(mismatches) => mismatches,
            _ => &[],
        }
    }

    pub fn print_summary(&self) {
        match &self.status {
            CaseStatus::Passed => println!("✅ {} - PASS", self.name),
            CaseStatus::Failed(mismatches) => {
                println!(
                    "❌ {} - FAIL ({} mismatches) [{}]",
                    self.name,
                    mismatches.len(),
                    self.source.display()
                );
                for mismatch in mismatches {
                    println!("   {}", mismatch);
                }
            }
            CaseStatus::Errored(error) => {
                println!(
                    "💥 {} - ERROR [{}]",
                    self.name,
                    self.source.display()
                );
                println!("   {}: {}", error.kind_name(), error);
            }
        }
    }
}

/// Results of a whole run, in load order
#[derive(Debug, Clone)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    pub cases: Vec<CaseResult>,
}

impl RunReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            duration: Duration::ZERO,
            cases: Vec::new(),
        }
    }

    pub fn passed(&self) -> usize {
        self.count(|s| matches!(s, CaseStatus::Passed))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, CaseStatus::Failed(_)))
    }

    pub fn errored(&self) -> usize {
        self.count(|s| matches!(s, CaseStatus::Errored(_)))
    }

    fn count(&self, pred: impl Fn(&CaseStatus) -> bool) -> usize {
        self.cases.iter().filter(|c| pred(&c.status)).count()
    }

    /// Check if all cases passed
    pub fn all_passed(&self) -> bool {
        self.cases.iter().all(CaseResult::passed)
    }

    /// Process exit code for this run
    pub fn exit_code(&self) -> u8 {
        if self.all_passed() {
            0
        } else {
            1
        }
    }

    /// Look up a case result by name
    pub fn case(&self, name: &str) -> Option<&CaseResult> {
        self.cases.iter().find(|c| c.name == name)
    }

    /// Print summary of all results
    pub fn print_summary(&self) {
        println!("\n=== WBEM Client Test Summary ===");
        println!("Started: {}", self.started_at.to_rfc3339());
        println!();

        for case in &self.cases {
            case.print_summary();
        }

        let total = self.cases.len();
        println!();
        println!(
            "Results: {}/{} passed, {} failed, {} errored ({:.2}s)",
            self.passed(),
            total,
            self.failed(),
            self.errored(),
            self.duration.as_secs_f64()
        );

        if self.all_passed() {
            println!("✅ All tests passed!");
        } else {
            println!("❌ {} tests did not pass", total - self.passed());
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&ReportDto::from(self))
    }

    pub fn write_json(&self, path: &Path) -> io::Result<()> {
        let json = self.to_json().map_err(io::Error::other)?;
        fs::write(path, json)
    }
}

#[derive(Serialize)]
struct ReportDto<'a> {
    started_at: DateTime<Utc>,
    duration_ms: u128,
    total: usize,
    passed: usize,
    failed: usize,
    errored: usize,
    cases: Vec<CaseDto<'a>>,
}

#[derive(Serialize)]
struct CaseDto<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    source: String,
    status: &'static str,
    duration_ms: u128,
    #[serde(skip_serializing_if = "no_mismatches")]
    mismatches: &'a [Mismatch],
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorDto>,
}

fn no_mismatches(mismatches: &&[Mismatch]) -> bool {
    mismatches.is_empty()
}

#[derive(Serialize)]
struct ErrorDto {
    kind: &'static str,
    message: String,
}

impl<'a> From<&'a RunReport> for ReportDto<'a> {
    fn from(report: &'a RunReport) -> Self {
        Self {
            started_at: report.started_at,
            duration_ms: report.duration.as_millis(),
            total: report.cases.len(),
            passed: report.passed(),
            failed: report.failed(),
            errored: report.errored(),
            cases: report.cases.iter().map(CaseDto::from).collect(),
        }
    }
}

impl<'a> From<&'a CaseResult> for CaseDto<'a> {
    fn from(case: &'a CaseResult) -> Self {
        Self {
            name: &case.name,
            description: Some(case.description.as_str()).filter(|d| !d.is_empty()),
            source: case.source.display().to_string(),
            status: case.status.label(),
            duration_ms: case.duration.as_millis(),
            mismatches: case.mismatches(),
            error: match &case.status {
                CaseStatus::Errored(error) => Some(ErrorDto {
                    kind: error.kind_name(),
                    message: error.to_string(),
                }),
                _ => None,
            },
        }
    }
}
