//! Syntax loading: parsing Python source into an owned AST
//!
//! Architecture: Anti-Corruption Layer - SourceUnit wraps the external parser
//! - A file that fails to parse contributes zero declarations and exactly one
//!   DT005 finding; the failure is local, never fatal to the run
//! - The parser reports byte offsets only, so each unit carries a line index
//!   mapping offsets to 1-based (line, column) pairs

use crate::domain::violations::{RuleCode, Violation};
use rustpython_parser::ast;
use std::path::{Path, PathBuf};

/// One analyzed file: path, raw text, and the parsed syntax tree.
///
/// Created per analysis pass and discarded after findings are emitted; no
/// state survives across files or runs.
#[derive(Debug)]
pub struct SourceUnit {
    pub path: PathBuf,
    pub source: String,
    pub module: ast::Mod,
    line_index: LineIndex,
}

impl SourceUnit {
    /// Parse file text into a source unit.
    ///
    /// On parse failure the error side carries the DT005 finding for the
    /// file, located at the parser's reported offset.
    pub fn parse(path: &Path, source: String) -> Result<SourceUnit, Box<Violation>> {
        let line_index = LineIndex::new(&source);

        match rustpython_parser::parse(
            &source,
            rustpython_parser::Mode::Module,
            &path.display().to_string(),
        ) {
            Ok(module) => Ok(SourceUnit {
                path: path.to_path_buf(),
                source,
                module,
                line_index,
            }),
            Err(e) => {
                let offset = u32::from(e.offset) as usize;
                let (line, column) = line_index.location(offset);
                tracing::debug!("Parse failure in {}: {}", path.display(), e.error);
                Err(Box::new(
                    Violation::new(
                        RuleCode::SyntaxError,
                        path.to_path_buf(),
                        line,
                        column,
                        format!("Syntax error: {}", e.error),
                    ),
                ))
            }
        }
    }

    /// Map a byte offset into a 1-based (line, column) pair
    pub fn location(&self, offset: usize) -> (u32, u32) {
        self.line_index.location(offset)
    }
}

/// Byte offsets of every line start, for offset-to-location mapping
#[derive(Debug)]
struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    /// Columns are byte-based within the line, 1-indexed
    fn location(&self, offset: usize) -> (u32, u32) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let column = offset - self.line_starts[line];
        (line as u32 + 1, column as u32 + 1)
    }
}
