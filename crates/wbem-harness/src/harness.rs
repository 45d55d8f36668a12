//! Test harness that loads cases and drives them through the client

use crate::client::ClientFactory;
use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::invoker::OperationInvoker;
use crate::report::{CaseResult, CaseStatus, RunReport};
use crate::verify::{Mismatch, ResultVerifier};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use wbem_core::{ObjectBuilder, TypeRegistry};
use wbem_testcase::{LoadResult, TestCase, TestCaseLoader};

/// Runs single cases against fresh clients
///
/// Cheap to clone; clones share the registry and the factory.
#[derive(Clone)]
pub struct CaseRunner {
    registry: Arc<TypeRegistry>,
    factory: Arc<dyn ClientFactory>,
}

impl CaseRunner {
    /// Create a runner whose registry holds every type the factory exposes
    pub fn new(factory: Arc<dyn ClientFactory>) -> Self {
        let registry = factory.register_types(TypeRegistry::builder()).build();
        Self {
            registry: Arc::new(registry),
            factory,
        }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Run one case: invoke, then verify
    pub fn run_case(&self, case: &TestCase) -> CaseResult {
        let started = Instant::now();
        let status = match self.judge(case) {
            Ok(mismatches) if mismatches.is_empty() => CaseStatus::Passed,
            Ok(mismatches) => CaseStatus::Failed(mismatches),
            Err(error) => CaseStatus::Errored(error),
        };
        let duration = started.elapsed();

        match &status {
            CaseStatus::Passed => info!(case = %case.name, ?duration, "Case passed"),
            CaseStatus::Failed(mismatches) => {
                warn!(
                    case = %case.name,
                    source = %case.source.display(),
                    mismatches = mismatches.len(),
                    "Case failed"
                );
                for mismatch in mismatches {
                    debug!(case = %case.name, "{}", mismatch);
                }
            }
            CaseStatus::Errored(error) => warn!(
                case = %case.name,
                source = %case.source.display(),
                kind = error.kind_name(),
                %error,
                "Case errored"
            ),
        }

        CaseResult {
            name: case.name.clone(),
            description: case.description.clone(),
            source: case.source.clone(),
            status,
            duration,
        }
    }

    fn judge(&self, case: &TestCase) -> Result<Vec<Mismatch>, HarnessError> {
        let builder = ObjectBuilder::new(&self.registry);
        let invocation = OperationInvoker::new(builder, self.factory.as_ref())
            .invoke(&case.request, case.http_response.as_ref())?;
        let verdict = ResultVerifier::new(builder).verify(case, &invocation)?;
        Ok(verdict.failures)
    }

    /// Run the cases of one file in order
    pub fn run_file(&self, cases: &[TestCase]) -> Vec<CaseResult> {
        cases.iter().map(|case| self.run_case(case)).collect()
    }
}

/// Loads the configured test files and runs every case in them
pub struct TestHarness {
    pub config: HarnessConfig,
    runner: CaseRunner,
}

impl TestHarness {
    /// Create a new test harness from config
    pub fn new(config: HarnessConfig, factory: Arc<dyn ClientFactory>) -> Self {
        Self {
            config,
            runner: CaseRunner::new(factory),
        }
    }

    pub fn runner(&self) -> &CaseRunner {
        &self.runner
    }

    /// Load all cases, grouped per file in load order
    pub fn load(&self) -> LoadResult<Vec<Vec<TestCase>>> {
        let mut loader = TestCaseLoader::new();
        if let Some(name) = &self.config.case_filter {
            loader = loader.with_case_filter(name.clone());
        }
        loader.load_paths(&self.config.test_paths)
    }

    /// Load and run everything
    ///
    /// Loading errors abort the run before any case executes.
    pub async fn run(&self) -> LoadResult<RunReport> {
        let files = self.load()?;
        let count: usize = files.iter().map(Vec::len).sum();
        info!(files = files.len(), cases = count, parallel = self.config.parallel, "Running test cases");

        let mut report = RunReport::new(Utc::now());
        let started = Instant::now();
        report.cases = if self.config.parallel {
            self.run_parallel(files).await
        } else {
            self.run_sequential(&files)
        };
        report.duration = started.elapsed();

        info!(
            passed = report.passed(),
            failed = report.failed(),
            errored = report.errored(),
            "Run finished"
        );
        Ok(report)
    }

    /// Run every file one after another
    pub fn run_sequential(&self, files: &[Vec<TestCase>]) -> Vec<CaseResult> {
        files
            .iter()
            .flat_map(|cases| self.runner.run_file(cases))
            .collect()
    }

    /// Run files concurrently, keeping results in load order
    pub async fn run_parallel(&self, files: Vec<Vec<TestCase>>) -> Vec<CaseResult> {
        let handles: Vec<_> = files
            .into_iter()
            .map(|cases| {
                let runner = self.runner.clone();
                let fallback = cases.clone();
                let handle = tokio::task::spawn_blocking(move || runner.run_file(&cases));
                (handle, fallback)
            })
            .collect();

        let mut results = Vec::new();
        for (handle, cases) in handles {
            match handle.await {
                Ok(file_results) => results.extend(file_results),
                Err(e) => {
                    error!(error = %e, "Test file worker failed");
                    results.extend(cases.iter().map(|case| CaseResult {
                        name: case.name.clone(),
                        description: case.description.clone(),
                        source: case.source.clone(),
                        status: CaseStatus::Errored(HarnessError::ClientPanicked {
                            operation: case.request.operation.clone(),
                            message: e.to_string(),
                        }),
                        duration: Default::default(),
                    }));
                }
            }
        }
        results
    }
}
