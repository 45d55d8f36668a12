//! Test case file loader
//!
//! Loads YAML files holding sequences of test case records. Supports the
//! `!include path` tag for sharing fixture fragments between files; include
//! paths resolve relative to the including file.

use crate::error::{LoadError, LoadResult};
use crate::testcase::TestCase;
use serde_yaml::Value;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, trace};

/// Loader for test case files
#[derive(Debug, Default)]
pub struct TestCaseLoader {
    /// Only keep the case with this name
    case_filter: Option<String>,
    /// Track included files to detect circular includes
    include_stack: HashSet<PathBuf>,
    /// Where each case name was first seen
    seen: HashMap<String, PathBuf>,
}

impl TestCaseLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only the case with the given name
    pub fn with_case_filter(mut self, name: impl Into<String>) -> Self {
        self.case_filter = Some(name.into());
        self
    }

    /// Load test cases from files and directories, in the order given
    ///
    /// Directories contribute their `*.yaml`/`*.yml` files sorted by name.
    pub fn load_paths(&mut self, paths: &[PathBuf]) -> LoadResult<Vec<Vec<TestCase>>> {
        let mut files = Vec::new();
        for path in paths {
            if path.is_dir() {
                files.extend(self.get_yaml_files(path)?);
            } else if path.is_file() {
                files.push(path.clone());
            } else {
                return Err(LoadError::NotFound { path: path.clone() });
            }
        }

        let mut loaded = Vec::with_capacity(files.len());
        for file in files {
            let cases = self.load_file(&file)?;
            if !cases.is_empty() {
                loaded.push(cases);
            }
        }

        if let Some(name) = &self.case_filter {
            if loaded.is_empty() {
                return Err(LoadError::CaseNotFound { name: name.clone() });
            }
        }
        Ok(loaded)
    }

    /// Load the test cases of one file, in file order
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load_file(&mut self, path: &Path) -> LoadResult<Vec<TestCase>> {
        debug!("Loading test case file");
        let document = self.load_yaml(path)?;

        let records = match document {
            Value::Sequence(records) => records,
            Value::Null => Vec::new(),
            _ => {
                return Err(LoadError::InvalidDocument {
                    path: path.to_path_buf(),
                    reason: "expected a sequence of test cases".to_string(),
                })
            }
        };

        let mut cases = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            let name = record
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("#{}", index));

            let case = TestCase::from_yaml(record, path).map_err(|reason| {
                LoadError::InvalidCase {
                    path: path.to_path_buf(),
                    name: name.clone(),
                    reason,
                }
            })?;

            if let Some(first) = self.seen.get(&case.name) {
                return Err(LoadError::DuplicateName {
                    name: case.name,
                    first: first.clone(),
                    second: path.to_path_buf(),
                });
            }
            self.seen.insert(case.name.clone(), path.to_path_buf());

            if self
                .case_filter
                .as_ref()
                .map_or(true, |filter| *filter == case.name)
            {
                cases.push(case);
            }
        }

        debug!(count = cases.len(), "Loaded test cases");
        Ok(cases)
    }

    /// Read a YAML file and resolve its includes
    fn load_yaml(&mut self, path: &Path) -> LoadResult<Value> {
        // `sub/../a.yaml` and `a.yaml` must be the same include
        let path = fs::canonicalize(path).map_err(|e| LoadError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        // Check for circular includes
        if self.include_stack.contains(&path) {
            return Err(LoadError::CircularInclude { path });
        }

        let content = fs::read_to_string(&path).map_err(|e| LoadError::ReadFile {
            path: path.clone(),
            source: e,
        })?;

        let value: Value = serde_yaml::from_str(&content).map_err(|e| LoadError::ParseYaml {
            path: path.clone(),
            source: e,
        })?;

        self.include_stack.insert(path.clone());
        let result = self.process_value(value, &path);
        self.include_stack.remove(&path);

        result
    }

    /// Process a YAML value, resolving `!include` tags
    fn process_value(&mut self, value: Value, source_path: &Path) -> LoadResult<Value> {
        match value {
            Value::Tagged(tagged) if tagged.tag == "!include" => {
                let include_path = Self::value_to_path(&tagged.value, source_path)?;
                trace!("Including file: {:?}", include_path);
                self.load_yaml(&include_path)
            }
            Value::Tagged(mut tagged) => {
                tagged.value = self.process_value(tagged.value, source_path)?;
                Ok(Value::Tagged(tagged))
            }
            Value::Mapping(map) => {
                let mut result = serde_yaml::Mapping::new();
                for (k, v) in map {
                    result.insert(k, self.process_value(v, source_path)?);
                }
                Ok(Value::Mapping(result))
            }
            Value::Sequence(seq) => seq
                .into_iter()
                .map(|v| self.process_value(v, source_path))
                .collect::<LoadResult<Vec<_>>>()
                .map(Value::Sequence),
            _ => Ok(value),
        }
    }

    /// Convert a YAML value to a path, resolving relative to the source file
    fn value_to_path(value: &Value, source_path: &Path) -> LoadResult<PathBuf> {
        let path_str = value.as_str().ok_or_else(|| LoadError::InvalidIncludePath {
            path: format!("{:?}", value),
            reason: "path must be a string".to_string(),
        })?;

        let path = Path::new(path_str);
        if path.is_absolute() {
            return Ok(path.to_path_buf());
        }
        let base_dir = source_path.parent().unwrap_or_else(|| Path::new("."));
        Ok(base_dir.join(path))
    }

    /// Get all YAML files in a directory, sorted by name
    fn get_yaml_files(&self, dir: &Path) -> LoadResult<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(|e| LoadError::ReadFile {
                path: dir.to_path_buf(),
                source: e,
            })?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .map(|ext| ext == "yaml" || ext == "yml")
                        .unwrap_or(false)
            })
            .collect();

        files.sort();
        Ok(files)
    }
}

/// Load test cases from files and directories, grouped by file
pub fn load_paths(paths: &[PathBuf], case_filter: Option<&str>) -> LoadResult<Vec<Vec<TestCase>>> {
    let mut loader = TestCaseLoader::new();
    if let Some(name) = case_filter {
        loader = loader.with_case_filter(name);
    }
    loader.load_paths(paths)
}
