//! Domain layer for dt-linter
//!
//! Architecture: Rich Domain Models - Pure business logic for domain-type enforcement
//! - Contains the core entities and value objects: rule codes, violations, reports
//! - Independent of infrastructure concerns like file systems or output formats
//! - Expresses the ubiquitous language of type provenance and annotation checking

pub mod violations;

// Re-export main domain types for convenience
pub use violations::*;
