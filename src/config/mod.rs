//! Configuration loading and management for dt-linter
//!
//! Architecture: Anti-Corruption Layer - Configuration translates external YAML formats
//! - Raw YAML structures are converted to clean domain objects
//! - Default scope and type lists are embedded in the domain, not infrastructure
//! - Validation is fail-fast: a bad glob silently changes scope for the whole
//!   run, so it is rejected before any file is read

use crate::domain::violations::{LintError, LintResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main configuration structure for dt-linter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LintConfig {
    /// Configuration format version
    #[serde(default = "default_version")]
    pub version: String,
    /// Which files count as business logic
    #[serde(default)]
    pub scope: ScopeSection,
    /// Universal/exempt type lists
    #[serde(default)]
    pub types: TypeSection,
}

/// Include/exclude glob sets defining the business-logic scope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeSection {
    /// Globs a path must match to be in scope
    #[serde(default = "default_include")]
    pub include: Vec<String>,
    /// Globs that take a path out of scope. Exclude wins over include.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

/// Configured type name lists consumed by the classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeSection {
    /// Names or globs that are never reported, regardless of the built-in set
    #[serde(default = "default_exempt")]
    pub exempt: Vec<String>,
    /// Extra names treated as universal in addition to the built-in set
    #[serde(default = "default_universal_aliases")]
    pub universal_aliases: Vec<String>,
}

impl Default for ScopeSection {
    fn default() -> Self {
        Self {
            include: default_include(),
            exclude: default_exclude(),
        }
    }
}

impl Default for TypeSection {
    fn default() -> Self {
        Self {
            exempt: default_exempt(),
            universal_aliases: default_universal_aliases(),
        }
    }
}

fn default_include() -> Vec<String> {
    vec!["**/*.py".to_string()]
}

fn default_exclude() -> Vec<String> {
    vec![
        "**/__pycache__/**".to_string(),
        "**/.venv/**".to_string(),
        "**/.git/**".to_string(),
        "**/build/**".to_string(),
        "**/dist/**".to_string(),
    ]
}

/// Generic callables and type objects are structural, not domain data
fn default_exempt() -> Vec<String> {
    vec![
        "Callable".to_string(),
        "Awaitable".to_string(),
        "Type".to_string(),
    ]
}

fn default_universal_aliases() -> Vec<String> {
    vec!["Decimal".to_string()]
}

fn default_version() -> String {
    "1.0".to_string()
}

impl LintConfig {
    /// Load configuration from a YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> LintResult<Self> {
        let contents = fs::read_to_string(&path).map_err(|e| {
            LintError::config(format!(
                "Failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: Self = serde_yaml::from_str(&contents).map_err(|e| {
            LintError::config(format!(
                "Failed to parse config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from string content
    pub fn load_from_str(content: &str) -> LintResult<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| LintError::config(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Get default configuration with built-in scope and type lists
    pub fn with_defaults() -> Self {
        Self {
            version: default_version(),
            scope: ScopeSection::default(),
            types: TypeSection::default(),
        }
    }

    /// Validate the configuration for consistency and correctness.
    ///
    /// Every glob must compile and every list entry must be non-empty and
    /// unique. Failure here is fatal at startup.
    pub fn validate(&self) -> LintResult<()> {
        if !["1.0"].contains(&self.version.as_str()) {
            return Err(LintError::config(format!(
                "Unsupported configuration version: {}. Supported versions: 1.0",
                self.version
            )));
        }

        if self.scope.include.is_empty() {
            return Err(LintError::config(
                "scope.include must contain at least one glob",
            ));
        }

        Self::validate_glob_list("scope.include", &self.scope.include)?;
        Self::validate_glob_list("scope.exclude", &self.scope.exclude)?;
        Self::validate_glob_list("types.exempt", &self.types.exempt)?;

        for (i, name) in self.types.universal_aliases.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(LintError::config(format!(
                    "types.universal_aliases[{i}] is empty"
                )));
            }
            if self.types.universal_aliases[..i].contains(name) {
                return Err(LintError::config(format!(
                    "Duplicate entry '{name}' in types.universal_aliases"
                )));
            }
        }

        Ok(())
    }

    fn validate_glob_list(field: &str, patterns: &[String]) -> LintResult<()> {
        for (i, pattern) in patterns.iter().enumerate() {
            if pattern.trim().is_empty() {
                return Err(LintError::config(format!("{field}[{i}] is empty")));
            }
            if patterns[..i].contains(pattern) {
                return Err(LintError::config(format!(
                    "Duplicate entry '{pattern}' in {field}"
                )));
            }
            glob::Pattern::new(pattern).map_err(|e| {
                LintError::config(format!("Invalid glob '{pattern}' in {field}: {e}"))
            })?;
        }
        Ok(())
    }

    /// Convert to JSON for serialization
    pub fn to_json(&self) -> LintResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| LintError::config(format!("Failed to serialize config: {e}")))
    }
}

impl Default for LintConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Configuration builder for programmatic construction
pub struct ConfigBuilder {
    config: LintConfig,
}

impl ConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: LintConfig::default(),
        }
    }

    /// Replace the include globs
    pub fn include(mut self, globs: Vec<String>) -> Self {
        self.config.scope.include = globs;
        self
    }

    /// Replace the exclude globs
    pub fn exclude(mut self, globs: Vec<String>) -> Self {
        self.config.scope.exclude = globs;
        self
    }

    /// Add an include glob
    pub fn add_include(mut self, glob: impl Into<String>) -> Self {
        self.config.scope.include.push(glob.into());
        self
    }

    /// Add an exclude glob
    pub fn add_exclude(mut self, glob: impl Into<String>) -> Self {
        self.config.scope.exclude.push(glob.into());
        self
    }

    /// Add a name or glob to the exempt allow-list
    pub fn add_exempt(mut self, entry: impl Into<String>) -> Self {
        self.config.types.exempt.push(entry.into());
        self
    }

    /// Add a configured universal alias
    pub fn add_universal_alias(mut self, name: impl Into<String>) -> Self {
        self.config.types.universal_aliases.push(name.into());
        self
    }

    /// Build the final configuration
    pub fn build(self) -> LintResult<LintConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
