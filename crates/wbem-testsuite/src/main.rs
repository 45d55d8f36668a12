//! WBEM client test suite runner
//!
//! Loads declarative test cases and runs them against the WBEM client with
//! a mock transport.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use wbem_harness::{HarnessConfig, TestHarness};
use wbem_testsuite::WbemClientFactory;

#[derive(Debug, Parser)]
#[command(name = "wbem-testsuite", version, about = "Run WBEM client test cases")]
struct Cli {
    /// Test case files or directories (default: $WBEM_TEST_DIR or tests/testclient)
    paths: Vec<PathBuf>,

    /// Run only the test case with this name
    #[arg(long, value_name = "NAME")]
    case: Option<String>,

    /// Run test files concurrently
    #[arg(long)]
    parallel: bool,

    /// Also write the report as JSON
    #[arg(long, value_name = "FILE")]
    report_json: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> HarnessConfig {
        let mut config = HarnessConfig::from_env();
        if !self.paths.is_empty() {
            config.test_paths = self.paths;
        }
        if let Some(case) = self.case {
            config.case_filter = Some(case);
        }
        if self.parallel {
            config.parallel = true;
        }
        if let Some(path) = self.report_json {
            config.report_json = Some(path);
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let config = cli.into_config();
    info!(paths = ?config.test_paths, "Starting WBEM client test suite");

    let harness = TestHarness::new(config, Arc::new(WbemClientFactory));
    let report = harness.run().await.context("Failed to load test cases")?;
    report.print_summary();

    if let Some(path) = &harness.config.report_json {
        report
            .write_json(path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!(path = %path.display(), "Wrote JSON report");
    }

    Ok(ExitCode::from(report.exit_code()))
}
