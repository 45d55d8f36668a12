//! Harness configuration

use std::env;
use std::path::PathBuf;

/// Settings for one harness run
#[derive(Debug, Clone, PartialEq)]
pub struct HarnessConfig {
    /// Test case files or directories, loaded in the given order
    pub test_paths: Vec<PathBuf>,
    /// Run only the case with this name
    pub case_filter: Option<String>,
    /// Run test files concurrently; cases within a file stay sequential
    pub parallel: bool,
    /// Also write the run report as JSON to this path
    pub report_json: Option<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::for_paths([default_test_dir()])
    }
}

impl HarnessConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let test_dir = env::var("WBEM_TEST_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_test_dir());

        Self {
            test_paths: vec![test_dir],
            case_filter: env::var("WBEM_TESTCASE").ok().filter(|s| !s.is_empty()),
            parallel: env::var("WBEM_PARALLEL")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
            report_json: None,
        }
    }

    /// Configuration for an explicit set of paths, ignoring the environment
    pub fn for_paths(test_paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            test_paths: test_paths.into_iter().map(Into::into).collect(),
            case_filter: None,
            parallel: false,
            report_json: None,
        }
    }

    pub fn with_case_filter(mut self, name: impl Into<String>) -> Self {
        self.case_filter = Some(name.into());
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_report_json(mut self, path: impl Into<PathBuf>) -> Self {
        self.report_json = Some(path.into());
        self
    }
}

/// `tests/testclient` under the workspace root
fn default_test_dir() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent() // crates/
        .and_then(|p| p.parent()) // workspace root
        .map(|p| p.join("tests").join("testclient"))
        .unwrap_or_else(|| manifest_dir.join("tests").join("testclient"))
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("1"));
        assert!(parse_flag("TRUE"));
        assert!(parse_flag(" yes "));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("off"));
        assert!(!parse_flag(""));
    }

    #[test]
    fn test_default_test_dir() {
        let dir = default_test_dir();
        assert!(dir.ends_with("tests/testclient"));
    }

    #[test]
    fn test_default_ignores_environment() {
        let config = HarnessConfig::default();

        assert_eq!(config.test_paths, [default_test_dir()]);
        assert_eq!(config.case_filter, None);
        assert!(!config.parallel);
        assert_eq!(config.report_json, None);
    }

    #[test]
    fn test_builder_methods() {
        let config = HarnessConfig::for_paths(["a.yaml", "dir"])
            .with_case_filter("GetInstance1")
            .with_parallel(true)
            .with_report_json("report.json");

        assert_eq!(
            config.test_paths,
            [PathBuf::from("a.yaml"), PathBuf::from("dir")]
        );
        assert_eq!(config.case_filter.as_deref(), Some("GetInstance1"));
        assert!(config.parallel);
        assert_eq!(config.report_json, Some(PathBuf::from("report.json")));
    }
}
