//! Scope classification using include/exclude glob patterns
//!
//! Architecture: Service Layer - ScopeFilter encapsulates the rules for
//! deciding which paths count as business logic
//! - A path is in scope iff it matches at least one include glob and no
//!   exclude glob; exclude always wins over include on conflict
//! - A declaration inherits its file's scope; there is no per-declaration
//!   override

use crate::config::ScopeSection;
use crate::domain::violations::{LintError, LintResult};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Decides whether a file path is inside the configured business-logic scope
#[derive(Debug, Clone)]
pub struct ScopeFilter {
    include: Vec<ScopePattern>,
    exclude: Vec<ScopePattern>,
}

/// A single compiled scope pattern
#[derive(Debug, Clone)]
struct ScopePattern {
    pattern: glob::Pattern,
    /// Original pattern string; its shape decides filename-vs-path matching
    original: String,
}

impl ScopePattern {
    fn compile(original: &str) -> LintResult<Self> {
        let pattern = glob::Pattern::new(original)
            .map_err(|e| LintError::config(format!("Invalid scope glob '{original}': {e}")))?;
        Ok(Self {
            pattern,
            original: original.to_string(),
        })
    }

    /// Patterns containing a separator match the full path; bare patterns
    /// match the filename only.
    fn matches(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();

        if self.original.contains('/') {
            if self.pattern.matches(&path_str) {
                return true;
            }
            // Relative globs like `app/**` should also hit `./app/service.py`
            if let Some(stripped) = path_str.strip_prefix("./") {
                return self.pattern.matches(stripped);
            }
            false
        } else if let Some(filename) = path.file_name() {
            self.pattern.matches(&filename.to_string_lossy())
        } else {
            false
        }
    }
}

impl ScopeFilter {
    /// Compile a filter from include and exclude glob lists
    pub fn new(include: &[String], exclude: &[String]) -> LintResult<Self> {
        let include = include
            .iter()
            .map(|p| ScopePattern::compile(p))
            .collect::<LintResult<Vec<_>>>()?;
        let exclude = exclude
            .iter()
            .map(|p| ScopePattern::compile(p))
            .collect::<LintResult<Vec<_>>>()?;

        Ok(Self { include, exclude })
    }

    /// Compile a filter straight from a configured scope section
    pub fn from_config(scope: &ScopeSection) -> LintResult<Self> {
        Self::new(&scope.include, &scope.exclude)
    }

    /// Whether the path is inside the business-logic scope.
    ///
    /// Exclude takes precedence: a path matched by both an include and an
    /// exclude glob is out of scope.
    pub fn in_scope<P: AsRef<Path>>(&self, path: P) -> bool {
        let path = path.as_ref();

        if self.exclude.iter().any(|p| p.matches(path)) {
            return false;
        }

        self.include.iter().any(|p| p.matches(path))
    }

    /// Discover all in-scope files under a directory tree
    pub fn find_files<P: AsRef<Path>>(&self, root: P) -> LintResult<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();

            if path.is_file() && self.in_scope(path) {
                files.push(path.to_path_buf());
            }
        }

        tracing::debug!("Discovered {} in-scope files", files.len());
        Ok(files)
    }

    /// Filter a list of paths to only those in scope
    pub fn filter_paths<P: AsRef<Path>>(&self, paths: &[P]) -> Vec<PathBuf> {
        paths
            .iter()
            .filter(|p| self.in_scope(p))
            .map(|p| p.as_ref().to_path_buf())
            .collect()
    }

    /// Add an exclude pattern to the filter
    pub fn add_exclude(&mut self, pattern: &str) -> LintResult<()> {
        self.exclude.push(ScopePattern::compile(pattern)?);
        Ok(())
    }
}
