//! dt-linter CLI - Command-line interface for domain-type enforcement
//!
//! Architecture: Application Layer - CLI coordinates user interactions with domain services
//! - Translates user commands to domain operations
//! - Handles external concerns like file I/O, process exit codes, and terminal output
//! - Provides clean separation between user interface and business logic

use clap::{Parser, Subcommand, ValueEnum};
use dt_linter::{
    AnalysisOptions, DomainTypeLinter, LintConfig, LintOptions, LintResult, OutputFormat,
    ReportOptions, RuleCode, Severity,
};
use std::path::{Path, PathBuf};
use std::process;

/// dt-linter - Domain-type discipline for Python code
#[derive(Parser)]
#[command(name = "dt-linter")]
#[command(version = "0.1.0")]
#[command(about = "Flags universal types (str, int, Dict, ...) in business-logic annotations")]
#[command(
    long_about = "dt-linter analyzes Python annotations and reports declarations that use universal types where a domain type is expected. Designed for pre-commit hooks and CI/CD integration."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check files for domain-type violations
    Check {
        /// Paths to analyze (files or directories)
        paths: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormatArg,

        /// Minimum severity level to report
        #[arg(short, long, value_enum)]
        severity: Option<SeverityArg>,

        /// Maximum number of violations to report
        #[arg(long)]
        max_violations: Option<usize>,

        /// Additional exclude patterns
        #[arg(long, action = clap::ArgAction::Append)]
        exclude: Vec<String>,

        /// Disable parallel processing
        #[arg(long)]
        no_parallel: bool,

        /// Fail on first error
        #[arg(long)]
        fail_fast: bool,
    },

    /// Validate configuration file
    ValidateConfig {
        /// Configuration file to validate
        config_file: Option<PathBuf>,
    },

    /// Explain what a specific rule does
    Explain {
        /// Rule code to explain (e.g. DT001)
        code: String,
    },

    /// List available rules
    Rules,
}

#[derive(Copy, Clone, ValueEnum, PartialEq)]
enum OutputFormatArg {
    Human,
    Json,
    Github,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Github => OutputFormat::GitHub,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum SeverityArg {
    Info,
    Warning,
    Error,
}

impl From<SeverityArg> for Severity {
    fn from(arg: SeverityArg) -> Self {
        match arg {
            SeverityArg::Info => Severity::Info,
            SeverityArg::Warning => Severity::Warning,
            SeverityArg::Error => Severity::Error,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = run_command(cli).await;

    match result {
        Ok(exit_code) => {
            process::exit(exit_code);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

async fn run_command(cli: Cli) -> LintResult<i32> {
    match cli.command {
        Commands::Check {
            paths,
            format,
            severity,
            max_violations,
            exclude,
            no_parallel,
            fail_fast,
        } => {
            run_check(
                cli.config,
                paths,
                format,
                severity,
                max_violations,
                exclude,
                no_parallel,
                fail_fast,
                !cli.no_color,
            )
            .await
        }
        Commands::ValidateConfig { config_file } => run_validate_config(config_file.or(cli.config)),
        Commands::Explain { code } => run_explain(code),
        Commands::Rules => run_list_rules(),
    }
}

/// Load config from an explicit path, or discover a default config file
fn load_config(config_path: Option<PathBuf>) -> LintResult<LintConfig> {
    if let Some(config_path) = config_path {
        return LintConfig::load_from_file(config_path);
    }

    let default_configs = ["dt_linter.yaml", "dt_linter.yml", ".dt_linter.yaml"];
    for config_name in &default_configs {
        if Path::new(config_name).exists() {
            return LintConfig::load_from_file(config_name);
        }
    }

    Ok(LintConfig::default())
}

#[allow(clippy::too_many_arguments)]
async fn run_check(
    config_path: Option<PathBuf>,
    paths: Vec<PathBuf>,
    format: OutputFormatArg,
    severity: Option<SeverityArg>,
    max_violations: Option<usize>,
    exclude_patterns: Vec<String>,
    no_parallel: bool,
    fail_fast: bool,
    use_colors: bool,
) -> LintResult<i32> {
    let config = load_config(config_path)?;
    let linter = DomainTypeLinter::new_with_config(config)?;

    // Use current directory if no paths specified
    let paths = if paths.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        paths
    };

    let report_options = ReportOptions {
        use_colors,
        max_violations,
        min_severity: severity.map(|s| s.into()),
    };

    let lint_options = LintOptions {
        output_format: format.into(),
        report_options: report_options.clone(),
        analysis_options: AnalysisOptions {
            parallel: !no_parallel,
            fail_fast,
            exclude_patterns,
            ..Default::default()
        },
    };

    let report = linter.lint_with_options(paths, &lint_options).await?;

    let formatter = dt_linter::ReportFormatter::new(report_options);
    let formatted = formatter.format_report(&report, format.into())?;
    println!("{formatted}");

    if report.has_errors() {
        Ok(1)
    } else {
        Ok(0)
    }
}

fn run_validate_config(config_path: Option<PathBuf>) -> LintResult<i32> {
    let config_path = config_path.unwrap_or_else(|| PathBuf::from("dt_linter.yaml"));

    println!("Validating configuration: {}", config_path.display());

    match LintConfig::load_from_file(&config_path) {
        Ok(config) => {
            println!("Configuration is valid");
            println!("Configuration summary:");
            println!(
                "  Include patterns: {} ({})",
                config.scope.include.len(),
                config.scope.include.join(", ")
            );
            println!("  Exclude patterns: {}", config.scope.exclude.len());
            println!(
                "  Exempt generics: {}",
                if config.types.exempt.is_empty() {
                    "(none)".to_string()
                } else {
                    config.types.exempt.join(", ")
                }
            );
            println!(
                "  Universal aliases: {}",
                if config.types.universal_aliases.is_empty() {
                    "(none)".to_string()
                } else {
                    config.types.universal_aliases.join(", ")
                }
            );

            Ok(0)
        }
        Err(e) => {
            eprintln!("Configuration validation failed: {e}");
            Ok(1)
        }
    }
}

fn run_explain(code: String) -> LintResult<i32> {
    match RuleCode::from_code(&code) {
        Some(rule) => {
            println!("Rule: {rule}");
            println!("Severity: {}", rule.default_severity().as_str());
            println!();
            println!("Description:");
            println!("   {}", rule.description());
            Ok(0)
        }
        None => {
            eprintln!("Rule '{code}' not found");
            println!();
            println!("Available rules:");
            for rule in RuleCode::all() {
                println!("  - {rule}");
            }
            Ok(1)
        }
    }
}

fn run_list_rules() -> LintResult<i32> {
    println!("Available Rules\n");

    for rule in RuleCode::all() {
        println!(
            "  {} [{}] - {}",
            rule,
            rule.default_severity().as_str(),
            rule.description()
        );
    }

    Ok(0)
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_check_command() {
        let temp_dir = TempDir::new().unwrap();
        let test_file = temp_dir.path().join("service.py");

        fs::write(&test_file, "def register(name: str) -> Record:\n    pass\n").unwrap();

        let result = run_check(
            None,
            vec![test_file],
            OutputFormatArg::Json,
            None,
            None,
            vec![],
            false,
            false,
            false,
        )
        .await;

        // Should find violations (exit code 1)
        assert_eq!(result.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_check_command_clean_file() {
        let temp_dir = TempDir::new().unwrap();
        let test_file = temp_dir.path().join("service.py");

        fs::write(&test_file, "def ship(order: Order) -> Receipt:\n    pass\n").unwrap();

        let result = run_check(
            None,
            vec![test_file],
            OutputFormatArg::Json,
            None,
            None,
            vec![],
            false,
            false,
            false,
        )
        .await;

        assert_eq!(result.unwrap(), 0);
    }

    #[test]
    fn test_validate_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("dt_linter.yaml");

        let config = LintConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        fs::write(&config_file, yaml).unwrap();

        let result = run_validate_config(Some(config_file));
        assert_eq!(result.unwrap(), 0);
    }

    #[test]
    fn test_validate_missing_config() {
        let result = run_validate_config(Some(PathBuf::from("/nonexistent/dt_linter.yaml")));
        assert_eq!(result.unwrap(), 1);
    }

    #[test]
    fn test_explain_rule() {
        let result = run_explain("DT001".to_string());
        assert_eq!(result.unwrap(), 0);

        let result = run_explain("DT099".to_string());
        assert_eq!(result.unwrap(), 1);
    }

    #[test]
    fn test_list_rules() {
        let result = run_list_rules();
        assert_eq!(result.unwrap(), 0);
    }
}
