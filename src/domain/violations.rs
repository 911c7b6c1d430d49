//! Core domain models for domain-type violations and lint results
//!
//! Architecture: Rich Domain Models - Violations are entities with behavior, not just data
//! - Violations carry their rule code, location, and the offending type name
//! - LintReport acts as an aggregate root managing collections of violations
//! - Rule codes are a closed enum so every finding has a stable identifier

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Stable rule codes for every category of finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RuleCode {
    /// DT001 - universal type used in a function parameter annotation
    #[serde(rename = "DT001")]
    UniversalParameter,
    /// DT002 - universal type used in a return annotation
    #[serde(rename = "DT002")]
    UniversalReturn,
    /// DT003 - universal type used in an attribute annotation
    #[serde(rename = "DT003")]
    UniversalAttribute,
    /// DT004 - annotation could not be resolved (bad forward reference)
    #[serde(rename = "DT004")]
    MalformedAnnotation,
    /// DT005 - source file could not be parsed
    #[serde(rename = "DT005")]
    SyntaxError,
}

impl RuleCode {
    /// The short code as it appears in reports
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UniversalParameter => "DT001",
            Self::UniversalReturn => "DT002",
            Self::UniversalAttribute => "DT003",
            Self::MalformedAnnotation => "DT004",
            Self::SyntaxError => "DT005",
        }
    }

    /// Parse a code string back into a rule code
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_uppercase().as_str() {
            "DT001" => Some(Self::UniversalParameter),
            "DT002" => Some(Self::UniversalReturn),
            "DT003" => Some(Self::UniversalAttribute),
            "DT004" => Some(Self::MalformedAnnotation),
            "DT005" => Some(Self::SyntaxError),
            _ => None,
        }
    }

    /// All rule codes, in report order
    pub fn all() -> &'static [RuleCode] {
        &[
            Self::UniversalParameter,
            Self::UniversalReturn,
            Self::UniversalAttribute,
            Self::MalformedAnnotation,
            Self::SyntaxError,
        ]
    }

    /// Severity assigned to findings of this rule
    pub fn default_severity(self) -> Severity {
        match self {
            Self::MalformedAnnotation => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// One-line description used by `dt-linter rules` and `dt-linter explain`
    pub fn description(self) -> &'static str {
        match self {
            Self::UniversalParameter => {
                "Function parameter annotated with a universal type instead of a domain type"
            }
            Self::UniversalReturn => {
                "Return value annotated with a universal type instead of a domain type"
            }
            Self::UniversalAttribute => {
                "Attribute annotated with a universal type instead of a domain type"
            }
            Self::MalformedAnnotation => {
                "Annotation text could not be parsed (unresolvable forward reference)"
            }
            Self::SyntaxError => "Source file could not be parsed; the file was skipped",
        }
    }

    /// Whether violations of this rule name an offending type
    pub fn names_a_type(self) -> bool {
        matches!(
            self,
            Self::UniversalParameter | Self::UniversalReturn | Self::UniversalAttribute
        )
    }
}

impl std::fmt::Display for RuleCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity levels for findings
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational messages and suggestions
    Info,
    /// Warnings that should be addressed but don't block builds
    Warning,
    /// Errors that block commits and fail CI/CD builds
    Error,
}

impl Severity {
    /// Whether this severity level should cause the run to fail
    pub fn is_blocking(self) -> bool {
        matches!(self, Self::Error)
    }

    /// Convert to string for display
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// A domain-type finding produced by the rule engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    /// Rule code identifying the violation category
    pub code: RuleCode,
    /// Severity level of this violation
    pub severity: Severity,
    /// File path where the violation was found
    pub file_path: PathBuf,
    /// Line number (1-indexed) of the annotation site
    pub line: u32,
    /// Column number (1-indexed) of the annotation site
    pub column: u32,
    /// The offending universal type name, when the rule names one
    pub type_name: Option<String>,
    /// The declaration the annotation belongs to (e.g. `Service.register`)
    pub declaration: Option<String>,
    /// Human-readable description of the violation
    pub message: String,
    /// When this violation was detected
    pub detected_at: DateTime<Utc>,
}

impl Violation {
    /// Create a new violation at a known annotation site
    pub fn new(
        code: RuleCode,
        file_path: PathBuf,
        line: u32,
        column: u32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            severity: code.default_severity(),
            file_path,
            line,
            column,
            type_name: None,
            declaration: None,
            message: message.into(),
            detected_at: Utc::now(),
        }
    }

    /// Record the offending universal type name
    pub fn with_type_name(mut self, name: impl Into<String>) -> Self {
        self.type_name = Some(name.into());
        self
    }

    /// Record the enclosing declaration path
    pub fn with_declaration(mut self, declaration: impl Into<String>) -> Self {
        self.declaration = Some(declaration.into());
        self
    }

    /// Override the default severity for this rule
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Whether this violation is blocking (prevents commits/builds)
    pub fn is_blocking(&self) -> bool {
        self.severity.is_blocking()
    }

    /// Format violation for display
    pub fn format_display(&self) -> String {
        format!(
            "{}:{}:{} [{}] {}",
            self.file_path.display(),
            self.line,
            self.column,
            self.code,
            self.message
        )
    }
}

/// Summary statistics for a lint report
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LintSummary {
    /// Total number of files analyzed
    pub total_files: usize,
    /// Number of violations by severity level
    pub violations_by_severity: ViolationCounts,
    /// Total execution time in milliseconds
    pub execution_time_ms: u64,
    /// Timestamp when the lint run was performed
    pub linted_at: DateTime<Utc>,
}

/// Count of violations by severity level
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViolationCounts {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
}

impl ViolationCounts {
    /// Total number of violations across all severities
    pub fn total(&self) -> usize {
        self.error + self.warning + self.info
    }

    /// Whether there are any blocking violations
    pub fn has_blocking(&self) -> bool {
        self.error > 0
    }

    /// Add a violation to the counts
    pub fn add(&mut self, severity: Severity) {
        match severity {
            Severity::Error => self.error += 1,
            Severity::Warning => self.warning += 1,
            Severity::Info => self.info += 1,
        }
    }
}

/// Complete lint report containing all violations and metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LintReport {
    /// All violations found during the run
    pub violations: Vec<Violation>,
    /// Summary statistics
    pub summary: LintSummary,
}

impl LintReport {
    /// Create a new empty report
    pub fn new() -> Self {
        Self {
            violations: Vec::new(),
            summary: LintSummary {
                linted_at: Utc::now(),
                ..Default::default()
            },
        }
    }

    /// Add a violation to the report
    pub fn add_violation(&mut self, violation: Violation) {
        self.summary.violations_by_severity.add(violation.severity);
        self.violations.push(violation);
    }

    /// Whether the report contains any violations
    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }

    /// Whether the report contains blocking violations (errors)
    pub fn has_errors(&self) -> bool {
        self.summary.violations_by_severity.has_blocking()
    }

    /// Get violations with a specific rule code
    pub fn violations_with_code(&self, code: RuleCode) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(move |v| v.code == code)
    }

    /// Set the number of files analyzed
    pub fn set_files_analyzed(&mut self, count: usize) {
        self.summary.total_files = count;
    }

    /// Set the execution time
    pub fn set_execution_time(&mut self, duration_ms: u64) {
        self.summary.execution_time_ms = duration_ms;
    }

    /// Merge another report into this one
    pub fn merge(&mut self, other: LintReport) {
        for violation in other.violations {
            self.add_violation(violation);
        }
        self.summary.total_files += other.summary.total_files;
    }

    /// Sort violations for deterministic output
    ///
    /// Order within a file is (line, column) ascending, ties broken by rule
    /// code (parameter before return before attribute). The sort is stable,
    /// so discovery order within a slot is preserved.
    pub fn sort_violations(&mut self) {
        self.violations.sort_by(|a, b| {
            a.file_path
                .cmp(&b.file_path)
                .then_with(|| a.line.cmp(&b.line))
                .then_with(|| a.column.cmp(&b.column))
                .then_with(|| a.code.cmp(&b.code))
        });
    }
}

impl Default for LintReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Error types that can occur during a lint run
#[derive(Debug, thiserror::Error)]
pub enum LintError {
    /// Configuration file could not be loaded, parsed, or validated.
    /// Always fatal before any file is processed.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// File could not be read or accessed
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Analysis failed for a specific file
    #[error("Analysis error in {file}: {message}")]
    Analysis { file: String, message: String },
}

impl LintError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an analysis error
    pub fn analysis(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Analysis {
            file: file.into(),
            message: message.into(),
        }
    }
}

/// Result type for dt-linter operations
pub type LintResult<T> = Result<T, LintError>;
