//! Main analysis orchestrator for dt-linter
//!
//! Architecture: Domain Services - Analyzer orchestrates the full check
//! workflow
//! - Coordinates scope filtering, parsing, type resolution, and result
//!   aggregation
//! - `analyze_file` is the host-agnostic per-file boundary: synchronous,
//!   returns findings, never prints, never owns process exit
//! - Handles parallel processing and error recovery gracefully

pub mod engine;
pub mod resolver;
pub mod syntax;

use crate::analyzer::engine::RuleEngine;
use crate::analyzer::syntax::SourceUnit;
use crate::classify::TypeClassifier;
use crate::config::LintConfig;
use crate::domain::violations::{LintError, LintReport, LintResult, Violation};
use crate::scope::ScopeFilter;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Main analyzer that orchestrates the entire lint run
pub struct Analyzer {
    /// Immutable configuration shared read-only by all workers
    config: LintConfig,
    /// Scope classifier for determining which files to analyze
    scope: ScopeFilter,
    /// Universal-type classifier
    classifier: TypeClassifier,
}

/// Options for customizing analysis behavior
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Whether to use parallel processing
    pub parallel: bool,
    /// Maximum number of files to analyze
    pub max_files: Option<usize>,
    /// Whether to continue on errors or fail fast
    pub fail_fast: bool,
    /// Additional exclude globs for this run only
    pub exclude_patterns: Vec<String>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            max_files: None,
            fail_fast: false,
            exclude_patterns: Vec::new(),
        }
    }
}

impl Analyzer {
    /// Create a new analyzer with the given configuration.
    ///
    /// Configuration problems (bad globs, bad allow-list entries) are fatal
    /// here, before any file is read.
    pub fn new(config: LintConfig) -> LintResult<Self> {
        config.validate()?;
        let scope = ScopeFilter::from_config(&config.scope)?;
        let classifier = TypeClassifier::new(&config.types)?;

        Ok(Self {
            config,
            scope,
            classifier,
        })
    }

    /// Create an analyzer with default configuration
    pub fn with_defaults() -> LintResult<Self> {
        Self::new(LintConfig::default())
    }

    /// The configuration this analyzer was built from
    pub fn config(&self) -> &LintConfig {
        &self.config
    }

    /// Analyze a single file and return its findings.
    ///
    /// This is the plugin-adapter boundary: a host framework can call it
    /// once per discovered file and merge results into its own pipeline.
    /// Out-of-scope files produce no findings; unparseable files produce
    /// exactly one DT005 finding.
    pub fn analyze_file<P: AsRef<Path>>(&self, file_path: P) -> LintResult<Vec<Violation>> {
        let file_path = file_path.as_ref();

        if !self.scope.in_scope(file_path) {
            tracing::debug!("Out of scope: {}", file_path.display());
            return Ok(Vec::new());
        }

        let source = fs::read_to_string(file_path).map_err(|e| {
            LintError::analysis(
                file_path.display().to_string(),
                format!("Failed to read file: {e}"),
            )
        })?;

        let unit = match SourceUnit::parse(file_path, source) {
            Ok(unit) => unit,
            Err(finding) => {
                tracing::warn!("Skipping unparseable file {}", file_path.display());
                return Ok(vec![*finding]);
            }
        };

        Ok(RuleEngine::new(&self.classifier).check(&unit))
    }

    /// Analyze multiple paths and return a complete lint report.
    ///
    /// Directories are expanded through the scope filter. Each worker owns
    /// one file end-to-end; the collector concatenates per-file violation
    /// lists and the final report sort restores a deterministic order.
    pub fn analyze_paths<P: AsRef<Path>>(
        &self,
        paths: &[P],
        options: &AnalysisOptions,
    ) -> LintResult<LintReport> {
        let start_time = Instant::now();
        let mut report = LintReport::new();

        let mut files_to_analyze = Vec::new();

        for path in paths {
            let path = path.as_ref();

            if path.is_file() {
                files_to_analyze.push(path.to_path_buf());
            } else if path.is_dir() {
                let discovered = self.scope.find_files(path)?;
                files_to_analyze.extend(discovered);
            }
        }

        // Apply run-only exclusions if specified
        if !options.exclude_patterns.is_empty() {
            let mut temp_scope = self.scope.clone();
            for pattern in &options.exclude_patterns {
                temp_scope.add_exclude(pattern)?;
            }
            files_to_analyze = temp_scope.filter_paths(&files_to_analyze);
        }

        if let Some(max_files) = options.max_files {
            files_to_analyze.truncate(max_files);
        }

        let total_files = files_to_analyze.len();

        let violations = if options.parallel && files_to_analyze.len() > 1 {
            self.analyze_files_parallel(&files_to_analyze, options)?
        } else {
            self.analyze_files_sequential(&files_to_analyze, options)?
        };

        for violation in violations {
            report.add_violation(violation);
        }

        report.set_files_analyzed(total_files);
        report.set_execution_time(start_time.elapsed().as_millis() as u64);
        report.sort_violations();

        Ok(report)
    }

    /// Analyze a directory tree and return a lint report
    pub fn analyze_directory<P: AsRef<Path>>(
        &self,
        root: P,
        options: &AnalysisOptions,
    ) -> LintResult<LintReport> {
        self.analyze_paths(&[root.as_ref()], options)
    }

    /// Analyze files sequentially
    fn analyze_files_sequential(
        &self,
        files: &[PathBuf],
        options: &AnalysisOptions,
    ) -> LintResult<Vec<Violation>> {
        let mut all_violations = Vec::new();

        for file_path in files {
            match self.analyze_file(file_path) {
                Ok(violations) => all_violations.extend(violations),
                Err(e) => {
                    if options.fail_fast {
                        return Err(e);
                    }
                    tracing::warn!("Failed to analyze {}: {}", file_path.display(), e);
                }
            }
        }

        Ok(all_violations)
    }

    /// Analyze files in parallel: rayon fan-out, mutex fan-in
    fn analyze_files_parallel(
        &self,
        files: &[PathBuf],
        options: &AnalysisOptions,
    ) -> LintResult<Vec<Violation>> {
        let violations = Arc::new(Mutex::new(Vec::new()));
        let errors = Arc::new(Mutex::new(Vec::new()));

        files
            .par_iter()
            .for_each(|file_path| match self.analyze_file(file_path) {
                Ok(file_violations) => {
                    if let Ok(mut v) = violations.lock() {
                        v.extend(file_violations);
                    }
                }
                Err(e) => {
                    if let Ok(mut errs) = errors.lock() {
                        errs.push((file_path.clone(), e));
                    }
                }
            });

        let errors = Arc::try_unwrap(errors)
            .map_err(|_| LintError::analysis("<collector>", "worker still holds error sink"))?
            .into_inner()
            .map_err(|_| LintError::analysis("<collector>", "error sink poisoned"))?;

        if !errors.is_empty() {
            if options.fail_fast {
                let (file_path, error) = errors
                    .into_iter()
                    .next()
                    .ok_or_else(|| LintError::analysis("<collector>", "empty error set"))?;
                return Err(LintError::analysis(
                    file_path.display().to_string(),
                    error.to_string(),
                ));
            }
            for (file_path, error) in errors {
                tracing::warn!("Failed to analyze {}: {}", file_path.display(), error);
            }
        }

        let violations = Arc::try_unwrap(violations)
            .map_err(|_| LintError::analysis("<collector>", "worker still holds result sink"))?
            .into_inner()
            .map_err(|_| LintError::analysis("<collector>", "result sink poisoned"))?;
        Ok(violations)
    }
}
