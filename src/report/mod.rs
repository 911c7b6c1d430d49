//! Report generation with multiple output formats
//!
//! Architecture: Anti-Corruption Layer - Formatters translate domain objects
//! to external formats
//! - LintReport (domain) is converted to various external representations
//! - Each formatter encapsulates the rules for its specific output format
//! - The engine never prints; presentation lives entirely here

use crate::domain::violations::{LintReport, LintResult, Severity, Violation};
use serde_json::Value as JsonValue;
use std::io::Write;

/// Supported output formats for lint reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable format with colors
    Human,
    /// JSON format for programmatic consumption
    Json,
    /// GitHub Actions format for workflow integration
    GitHub,
}

impl OutputFormat {
    /// Parse format from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "human" => Some(Self::Human),
            "json" => Some(Self::Json),
            "github" => Some(Self::GitHub),
            _ => None,
        }
    }

    /// All available format names
    pub fn all_formats() -> &'static [&'static str] {
        &["human", "json", "github"]
    }
}

/// Options for customizing report output
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Whether to use colored output (for human format)
    pub use_colors: bool,
    /// Maximum number of violations to include
    pub max_violations: Option<usize>,
    /// Minimum severity level to include
    pub min_severity: Option<Severity>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            use_colors: true,
            max_violations: None,
            min_severity: None,
        }
    }
}

/// Main report formatter that dispatches to specific formatters
pub struct ReportFormatter {
    options: ReportOptions,
}

impl Default for ReportFormatter {
    fn default() -> Self {
        Self::new(ReportOptions::default())
    }
}

impl ReportFormatter {
    /// Create a new report formatter with options
    pub fn new(options: ReportOptions) -> Self {
        Self { options }
    }

    /// Format a lint report in the specified format
    pub fn format_report(&self, report: &LintReport, format: OutputFormat) -> LintResult<String> {
        let filtered = self.filter_violations(&report.violations);

        match format {
            OutputFormat::Human => Ok(self.format_human(report, &filtered)),
            OutputFormat::Json => self.format_json(report, &filtered),
            OutputFormat::GitHub => Ok(self.format_github(&filtered)),
        }
    }

    /// Write a formatted report to a writer
    pub fn write_report<W: Write>(
        &self,
        report: &LintReport,
        format: OutputFormat,
        mut writer: W,
    ) -> LintResult<()> {
        let formatted = self.format_report(report, format)?;
        writer
            .write_all(formatted.as_bytes())
            .map_err(|e| crate::domain::violations::LintError::Io { source: e })?;
        Ok(())
    }

    /// Filter violations based on report options
    fn filter_violations<'a>(&self, violations: &'a [Violation]) -> Vec<&'a Violation> {
        let mut filtered: Vec<&Violation> = violations
            .iter()
            .filter(|v| match self.options.min_severity {
                Some(min) => v.severity >= min,
                None => true,
            })
            .collect();

        if let Some(max) = self.options.max_violations {
            filtered.truncate(max);
        }

        filtered
    }

    /// Format report in human-readable format
    fn format_human(&self, report: &LintReport, violations: &[&Violation]) -> String {
        let mut output = String::new();

        if violations.is_empty() {
            if self.options.use_colors {
                output.push_str("\x1b[32mNo domain-type violations found\x1b[0m\n");
            } else {
                output.push_str("No domain-type violations found\n");
            }
        } else {
            if self.options.use_colors {
                let color = if report.has_errors() { "31" } else { "33" };
                output.push_str(&format!(
                    "\x1b[{color}mDomain-Type Violations Found\x1b[0m\n\n"
                ));
            } else {
                output.push_str("Domain-Type Violations Found\n\n");
            }

            // Group violations by file
            let mut by_file: std::collections::BTreeMap<&std::path::Path, Vec<&Violation>> =
                std::collections::BTreeMap::new();

            for &violation in violations {
                by_file.entry(&violation.file_path).or_default().push(violation);
            }

            for (file_path, file_violations) in by_file {
                output.push_str(&format!("{}\n", file_path.display()));

                for violation in file_violations {
                    let severity_color = match violation.severity {
                        Severity::Error => "31",
                        Severity::Warning => "33",
                        Severity::Info => "36",
                    };

                    if self.options.use_colors {
                        output.push_str(&format!(
                            "  \x1b[2m{}:{}\x1b[0m [\x1b[{}m{}\x1b[0m] {} {}\n",
                            violation.line,
                            violation.column,
                            severity_color,
                            violation.severity.as_str(),
                            violation.code,
                            violation.message
                        ));
                    } else {
                        output.push_str(&format!(
                            "  {}:{} [{}] {} {}\n",
                            violation.line,
                            violation.column,
                            violation.severity.as_str(),
                            violation.code,
                            violation.message
                        ));
                    }
                }

                output.push('\n');
            }
        }

        output.push_str(&self.format_summary(report));
        output
    }

    /// Format report in JSON format
    fn format_json(&self, report: &LintReport, violations: &[&Violation]) -> LintResult<String> {
        let json_violations: Vec<JsonValue> = violations
            .iter()
            .map(|v| {
                serde_json::json!({
                    "code": v.code.as_str(),
                    "severity": v.severity.as_str(),
                    "file_path": v.file_path.display().to_string(),
                    "line": v.line,
                    "column": v.column,
                    "type_name": v.type_name,
                    "declaration": v.declaration,
                    "message": v.message,
                    "detected_at": v.detected_at.to_rfc3339()
                })
            })
            .collect();

        let json_report = serde_json::json!({
            "violations": json_violations,
            "summary": {
                "total_files": report.summary.total_files,
                "violations_by_severity": {
                    "error": report.summary.violations_by_severity.error,
                    "warning": report.summary.violations_by_severity.warning,
                    "info": report.summary.violations_by_severity.info
                },
                "execution_time_ms": report.summary.execution_time_ms,
                "linted_at": report.summary.linted_at.to_rfc3339()
            }
        });

        serde_json::to_string_pretty(&json_report).map_err(|e| {
            crate::domain::violations::LintError::config(format!("JSON serialization failed: {e}"))
        })
    }

    /// Format report for GitHub Actions annotations
    fn format_github(&self, violations: &[&Violation]) -> String {
        let mut output = String::new();

        for violation in violations {
            let level = match violation.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
                Severity::Info => "notice",
            };

            output.push_str(&format!(
                "::{} file={},line={},col={},title={}::{}\n",
                level,
                violation.file_path.display(),
                violation.line,
                violation.column,
                violation.code,
                violation.message
            ));
        }

        output
    }

    /// Format the summary section
    fn format_summary(&self, report: &LintReport) -> String {
        let mut summary = String::new();

        let total = report.summary.violations_by_severity.total();
        let execution_time = (report.summary.execution_time_ms as f64) / 1000.0;

        if self.options.use_colors {
            summary.push_str("\x1b[1mSummary:\x1b[0m ");
        } else {
            summary.push_str("Summary: ");
        }

        if total == 0 {
            let text = format!(
                "0 violations in {} files ({:.1}s)\n",
                report.summary.total_files, execution_time
            );
            if self.options.use_colors {
                summary.push_str(&format!("\x1b[32m{text}\x1b[0m"));
            } else {
                summary.push_str(&text);
            }
        } else {
            let mut parts = Vec::new();
            let counts = &report.summary.violations_by_severity;

            if counts.error > 0 {
                let text = format!(
                    "{} error{}",
                    counts.error,
                    if counts.error == 1 { "" } else { "s" }
                );
                if self.options.use_colors {
                    parts.push(format!("\x1b[31m{text}\x1b[0m"));
                } else {
                    parts.push(text);
                }
            }

            if counts.warning > 0 {
                let text = format!(
                    "{} warning{}",
                    counts.warning,
                    if counts.warning == 1 { "" } else { "s" }
                );
                if self.options.use_colors {
                    parts.push(format!("\x1b[33m{text}\x1b[0m"));
                } else {
                    parts.push(text);
                }
            }

            if counts.info > 0 {
                let text = format!("{} info", counts.info);
                if self.options.use_colors {
                    parts.push(format!("\x1b[36m{text}\x1b[0m"));
                } else {
                    parts.push(text);
                }
            }

            summary.push_str(&format!(
                "{} in {} files ({:.1}s)\n",
                parts.join(", "),
                report.summary.total_files,
                execution_time
            ));
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::violations::RuleCode;
    use std::path::PathBuf;

    fn create_test_report() -> LintReport {
        let mut report = LintReport::new();

        report.add_violation(
            Violation::new(
                RuleCode::UniversalParameter,
                PathBuf::from("app/service.py"),
                3,
                18,
                "Use of universal type 'str' is not allowed in parameter 'name' of 'register'",
            )
            .with_type_name("str")
            .with_declaration("parameter 'name' of 'register'"),
        );

        report.set_files_analyzed(10);
        report.set_execution_time(1200);

        report
    }

    #[test]
    fn test_human_format() {
        let formatter = ReportFormatter::new(ReportOptions {
            use_colors: false,
            ..Default::default()
        });

        let report = create_test_report();
        let output = formatter.format_report(&report, OutputFormat::Human).unwrap();

        assert!(output.contains("Domain-Type Violations Found"));
        assert!(output.contains("app/service.py"));
        assert!(output.contains("3:18"));
        assert!(output.contains("DT001"));
        assert!(output.contains("Summary:"));
    }

    #[test]
    fn test_json_format() {
        let formatter = ReportFormatter::default();
        let report = create_test_report();
        let output = formatter.format_report(&report, OutputFormat::Json).unwrap();

        let json: JsonValue = serde_json::from_str(&output).unwrap();
        assert!(json["violations"].is_array());
        assert_eq!(json["violations"].as_array().unwrap().len(), 1);
        assert_eq!(json["violations"][0]["code"], "DT001");
        assert_eq!(json["violations"][0]["type_name"], "str");
        assert_eq!(json["summary"]["total_files"], 10);
    }

    #[test]
    fn test_github_format() {
        let formatter = ReportFormatter::default();
        let report = create_test_report();
        let output = formatter
            .format_report(&report, OutputFormat::GitHub)
            .unwrap();

        assert!(output.contains("::error"));
        // Properties must be one comma-separated list, or GitHub folds the
        // position into the title
        assert!(output.contains("file=app/service.py,line=3,col=18,title=DT001::"));
    }

    #[test]
    fn test_empty_report() {
        let formatter = ReportFormatter::new(ReportOptions {
            use_colors: false,
            ..Default::default()
        });

        let report = LintReport::new();
        let output = formatter.format_report(&report, OutputFormat::Human).unwrap();

        assert!(output.contains("No domain-type violations found"));
    }

    #[test]
    fn test_severity_filtering() {
        let formatter = ReportFormatter::new(ReportOptions {
            min_severity: Some(Severity::Error),
            ..Default::default()
        });

        let mut report = LintReport::new();
        report.add_violation(Violation::new(
            RuleCode::MalformedAnnotation,
            PathBuf::from("a.py"),
            1,
            1,
            "warning finding",
        ));
        report.add_violation(Violation::new(
            RuleCode::UniversalReturn,
            PathBuf::from("b.py"),
            2,
            1,
            "error finding",
        ));

        let output = formatter.format_report(&report, OutputFormat::Json).unwrap();
        let json: JsonValue = serde_json::from_str(&output).unwrap();

        assert_eq!(json["violations"].as_array().unwrap().len(), 1);
        assert_eq!(json["violations"][0]["code"], "DT002");
    }

    #[test]
    fn test_max_violations_cap() {
        let formatter = ReportFormatter::new(ReportOptions {
            max_violations: Some(1),
            ..Default::default()
        });

        let mut report = create_test_report();
        report.add_violation(Violation::new(
            RuleCode::UniversalReturn,
            PathBuf::from("b.py"),
            2,
            1,
            "second finding",
        ));

        let output = formatter.format_report(&report, OutputFormat::Json).unwrap();
        let json: JsonValue = serde_json::from_str(&output).unwrap();
        assert_eq!(json["violations"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!(OutputFormat::from_str("human"), Some(OutputFormat::Human));
        assert_eq!(OutputFormat::from_str("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("github"), Some(OutputFormat::GitHub));
        assert_eq!(OutputFormat::from_str("xml"), None);
    }
}
