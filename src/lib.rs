//! dt-linter - Domain-type discipline enforcement for Python codebases
//!
//! Architecture: Clean Architecture - Library interface serves as the application layer
//! - Pure domain logic separated from infrastructure concerns
//! - Clean boundaries between the rule engine and external dependencies
//! - Hook integration API provides lint workflows for CI and pre-commit use
//!
//! The linter flags business-logic declarations whose annotations name
//! universal types (`str`, `int`, `Dict[...]`, ...) instead of the domain
//! types the codebase defines for those concepts.

pub mod analyzer;
pub mod classify;
pub mod config;
pub mod domain;
pub mod report;
pub mod scope;

// Re-export main types for convenient access
pub use domain::violations::{
    LintError, LintReport, LintResult, LintSummary, RuleCode, Severity, Violation,
};

pub use config::{ConfigBuilder, LintConfig, ScopeSection, TypeSection};

pub use analyzer::{AnalysisOptions, Analyzer};

pub use classify::{Classification, TypeClassifier};

pub use report::{OutputFormat, ReportFormatter, ReportOptions};

pub use scope::ScopeFilter;

use std::path::{Path, PathBuf};

/// Main linter facade providing high-level lint operations
pub struct DomainTypeLinter {
    analyzer: Analyzer,
    report_formatter: ReportFormatter,
}

/// Options for full lint workflows
#[derive(Debug, Clone)]
pub struct LintOptions {
    /// Output format for results
    pub output_format: OutputFormat,
    /// Report options
    pub report_options: ReportOptions,
    /// Analysis options
    pub analysis_options: AnalysisOptions,
}

impl Default for LintOptions {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::Human,
            report_options: ReportOptions::default(),
            analysis_options: AnalysisOptions::default(),
        }
    }
}

impl DomainTypeLinter {
    /// Create a new linter with the given configuration
    pub fn new_with_config(config: LintConfig) -> LintResult<Self> {
        let analyzer = Analyzer::new(config)?;
        let report_formatter = ReportFormatter::default();

        Ok(Self {
            analyzer,
            report_formatter,
        })
    }

    /// Create a linter with default configuration
    pub fn new() -> LintResult<Self> {
        Self::new_with_config(LintConfig::default())
    }

    /// Create a linter loading configuration from file
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> LintResult<Self> {
        let config = LintConfig::load_from_file(path)?;
        Self::new_with_config(config)
    }

    /// Set custom report formatter
    pub fn with_report_formatter(mut self, formatter: ReportFormatter) -> Self {
        self.report_formatter = formatter;
        self
    }

    /// The configuration this linter was built from
    pub fn config(&self) -> &LintConfig {
        self.analyzer.config()
    }

    /// Lint files for automation workflows - primary API for hooks and bots
    pub async fn lint_for_hook<P: AsRef<Path>>(&self, paths: Vec<P>) -> LintResult<LintReport> {
        self.lint_with_options(paths, &LintOptions::default()).await
    }

    /// Lint files with custom options
    pub async fn lint_with_options<P: AsRef<Path>>(
        &self,
        paths: Vec<P>,
        options: &LintOptions,
    ) -> LintResult<LintReport> {
        let paths: Vec<PathBuf> = paths.iter().map(|p| p.as_ref().to_path_buf()).collect();

        self.analyzer.analyze_paths(
            &paths.iter().map(|p| p.as_path()).collect::<Vec<_>>(),
            &options.analysis_options,
        )
    }

    /// Lint a single file
    pub fn lint_file<P: AsRef<Path>>(&self, file_path: P) -> LintResult<LintReport> {
        let violations = self.analyzer.analyze_file(file_path)?;

        let mut report = LintReport::new();
        for violation in violations {
            report.add_violation(violation);
        }
        report.set_files_analyzed(1);
        report.sort_violations();

        Ok(report)
    }

    /// Lint an entire directory tree
    pub fn lint_directory<P: AsRef<Path>>(
        &self,
        root: P,
        options: &AnalysisOptions,
    ) -> LintResult<LintReport> {
        self.analyzer.analyze_directory(root, options)
    }

    /// Format a lint report for output
    pub fn format_report(&self, report: &LintReport, format: OutputFormat) -> LintResult<String> {
        self.report_formatter.format_report(report, format)
    }
}

/// Convenience function to create a linter with default settings
pub fn create_linter() -> LintResult<DomainTypeLinter> {
    DomainTypeLinter::new()
}

/// Convenience function to lint files with default settings
pub async fn lint_files<P: AsRef<Path>>(files: Vec<P>) -> LintResult<LintReport> {
    let linter = DomainTypeLinter::new()?;
    linter.lint_for_hook(files).await
}

/// Convenience function to lint a directory with default settings
pub fn lint_directory<P: AsRef<Path>>(directory: P) -> LintResult<LintReport> {
    let linter = DomainTypeLinter::new()?;
    linter.lint_directory(directory, &AnalysisOptions::default())
}

/// Hook integration utilities
pub mod hooks {
    use super::*;

    /// Pre-commit check for modified files
    ///
    /// Returns an error if any blocking violations are found, so callers
    /// can wire the result straight into a commit hook.
    pub async fn pre_commit_check<P: AsRef<Path>>(modified_files: Vec<P>) -> LintResult<()> {
        let linter = DomainTypeLinter::new()?;
        let report = linter.lint_for_hook(modified_files).await?;

        if report.has_errors() {
            let error_count = report.summary.violations_by_severity.error;
            return Err(LintError::config(format!(
                "Pre-commit check failed: {} blocking violation{} found",
                error_count,
                if error_count == 1 { "" } else { "s" }
            )));
        }

        Ok(())
    }

    /// CI check that also fails on warnings
    ///
    /// Strict variant suitable for pipelines: any finding at all, including
    /// malformed-annotation warnings, fails the run.
    pub async fn ci_check<P: AsRef<Path>>(files: Vec<P>) -> LintResult<LintReport> {
        let options = LintOptions {
            analysis_options: AnalysisOptions {
                fail_fast: true,
                parallel: true,
                ..Default::default()
            },
            ..Default::default()
        };

        let linter = DomainTypeLinter::new()?;
        let report = linter.lint_with_options(files, &options).await?;

        if report.has_violations() {
            return Err(LintError::config(format!(
                "CI check failed: {} violation{} found",
                report.violations.len(),
                if report.violations.len() == 1 { "" } else { "s" }
            )));
        }

        Ok(report)
    }
}
