//! Universal-type classification
//!
//! Architecture: Domain Model - Classification is a pure, total function over
//! a qualified type name
//! - The exempt allow-list is consulted first, then the fixed universal set,
//!   and anything else counts as a domain type
//! - Dotted names classify by their final segment, so `typing.Dict` behaves
//!   like `Dict`

use crate::config::TypeSection;
use crate::domain::violations::{LintError, LintResult};
use std::collections::HashSet;

/// Result of classifying one qualified type name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Explicitly allow-listed; never reported
    Exempt,
    /// Built-in primitive, untyped container, or configured alias of one
    Universal,
    /// Anything else: assumed to be a domain-specific type
    Domain,
}

/// Primitive scalar and byte types
const UNIVERSAL_BASE_TYPES: &[&str] = &[
    "str", "int", "float", "complex", "bool", "bytes", "bytearray", "Any", "AnyStr",
];

/// Container and wrapper types that are universal when used bare
const UNIVERSAL_CONTAINER_TYPES: &[&str] = &[
    "list",
    "List",
    "dict",
    "Dict",
    "set",
    "Set",
    "tuple",
    "Tuple",
    "frozenset",
    "FrozenSet",
    "Mapping",
    "MutableMapping",
    "Sequence",
    "MutableSequence",
    "Iterable",
    "Iterator",
    "AsyncIterable",
    "AsyncIterator",
    "AsyncGenerator",
    "Generator",
    "Container",
    "Collection",
    "Reversible",
    "DefaultDict",
    "ChainMap",
    "Deque",
    "Optional",
    "ClassVar",
    "Final",
    "Annotated",
];

/// Classifies qualified type names as exempt, universal, or domain
#[derive(Debug, Clone)]
pub struct TypeClassifier {
    /// Exact exempt names
    exempt_names: HashSet<String>,
    /// Glob-style exempt entries (anything containing a metacharacter)
    exempt_patterns: Vec<glob::Pattern>,
    /// Built-in universal names plus configured aliases
    universal: HashSet<&'static str>,
    /// Configured extra universal names (owned)
    universal_aliases: HashSet<String>,
}

impl TypeClassifier {
    /// Build a classifier from the configured type lists
    pub fn new(types: &TypeSection) -> LintResult<Self> {
        let mut exempt_names = HashSet::new();
        let mut exempt_patterns = Vec::new();

        for entry in &types.exempt {
            if entry.contains(['*', '?', '[']) {
                let pattern = glob::Pattern::new(entry).map_err(|e| {
                    LintError::config(format!("Invalid exempt pattern '{entry}': {e}"))
                })?;
                exempt_patterns.push(pattern);
            } else {
                exempt_names.insert(entry.clone());
            }
        }

        let universal: HashSet<&'static str> = UNIVERSAL_BASE_TYPES
            .iter()
            .chain(UNIVERSAL_CONTAINER_TYPES.iter())
            .copied()
            .collect();

        Ok(Self {
            exempt_names,
            exempt_patterns,
            universal,
            universal_aliases: types.universal_aliases.iter().cloned().collect(),
        })
    }

    /// Build a classifier with the default configured lists
    pub fn with_defaults() -> Self {
        // Defaults are statically known to be valid
        Self::new(&TypeSection::default()).unwrap_or_else(|_| Self {
            exempt_names: HashSet::new(),
            exempt_patterns: Vec::new(),
            universal: UNIVERSAL_BASE_TYPES
                .iter()
                .chain(UNIVERSAL_CONTAINER_TYPES.iter())
                .copied()
                .collect(),
            universal_aliases: HashSet::new(),
        })
    }

    /// Classify one qualified name. First match wins: exempt, then
    /// universal, then domain.
    pub fn classify(&self, qualified_name: &str) -> Classification {
        let last_segment = final_segment(qualified_name);

        if self.is_exempt(qualified_name, last_segment) {
            return Classification::Exempt;
        }

        if self.universal.contains(last_segment) || self.universal_aliases.contains(last_segment) {
            return Classification::Universal;
        }

        Classification::Domain
    }

    /// Whether this bare name is a universal scalar (used for alias
    /// registration: `UserStr = str` registers an alias, `X = list` does not
    /// register a scalar alias in the same way but is still universal)
    pub fn is_universal_base(&self, name: &str) -> bool {
        let last = final_segment(name);
        UNIVERSAL_BASE_TYPES.contains(&last) || self.universal_aliases.contains(last)
    }

    fn is_exempt(&self, qualified_name: &str, last_segment: &str) -> bool {
        if self.exempt_names.contains(qualified_name) || self.exempt_names.contains(last_segment) {
            return true;
        }

        self.exempt_patterns
            .iter()
            .any(|p| p.matches(qualified_name) || p.matches(last_segment))
    }
}

fn final_segment(qualified_name: &str) -> &str {
    qualified_name
        .rsplit('.')
        .next()
        .unwrap_or(qualified_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn classifier() -> TypeClassifier {
        TypeClassifier::with_defaults()
    }

    #[rstest]
    #[case("str")]
    #[case("int")]
    #[case("float")]
    #[case("complex")]
    #[case("bool")]
    #[case("bytes")]
    #[case("bytearray")]
    #[case("Any")]
    #[case("AnyStr")]
    fn universal_base_types(#[case] name: &str) {
        assert_eq!(classifier().classify(name), Classification::Universal);
        assert!(classifier().is_universal_base(name));
    }

    #[rstest]
    #[case("list")]
    #[case("List")]
    #[case("dict")]
    #[case("Dict")]
    #[case("Set")]
    #[case("frozenset")]
    #[case("Mapping")]
    #[case("Sequence")]
    #[case("Iterable")]
    #[case("AsyncGenerator")]
    #[case("Optional")]
    #[case("Annotated")]
    fn universal_container_types(#[case] name: &str) {
        assert_eq!(classifier().classify(name), Classification::Universal);
    }

    #[rstest]
    #[case("UserId")]
    #[case("EmailAddress")]
    #[case("Money")]
    #[case("UserRecord")]
    fn domain_types(#[case] name: &str) {
        assert_eq!(classifier().classify(name), Classification::Domain);
    }

    #[rstest]
    #[case("Callable")]
    #[case("Awaitable")]
    #[case("Type")]
    fn default_exempt_names(#[case] name: &str) {
        assert_eq!(classifier().classify(name), Classification::Exempt);
    }

    #[test]
    fn test_configured_alias_is_universal() {
        // `Decimal` ships as a default universal alias
        assert_eq!(classifier().classify("Decimal"), Classification::Universal);
    }

    #[test]
    fn test_dotted_names_classify_by_final_segment() {
        let c = classifier();
        assert_eq!(c.classify("typing.Dict"), Classification::Universal);
        assert_eq!(c.classify("builtins.str"), Classification::Universal);
        assert_eq!(c.classify("app.types.UserId"), Classification::Domain);
        assert_eq!(c.classify("typing.Callable"), Classification::Exempt);
    }

    #[test]
    fn test_exempt_wins_over_universal() {
        let types = TypeSection {
            exempt: vec!["str".to_string()],
            universal_aliases: vec![],
        };
        let c = TypeClassifier::new(&types).unwrap();
        assert_eq!(c.classify("str"), Classification::Exempt);
    }

    #[test]
    fn test_exempt_glob_patterns() {
        let types = TypeSection {
            exempt: vec!["User*".to_string()],
            universal_aliases: vec![],
        };
        let c = TypeClassifier::new(&types).unwrap();
        assert_eq!(c.classify("UserId"), Classification::Exempt);
        assert_eq!(c.classify("app.model.UserName"), Classification::Exempt);
        assert_eq!(c.classify("OrderId"), Classification::Domain);
    }

    #[test]
    fn test_invalid_exempt_pattern_rejected() {
        let types = TypeSection {
            exempt: vec!["[oops".to_string()],
            universal_aliases: vec![],
        };
        assert!(TypeClassifier::new(&types).is_err());
    }

    #[test]
    fn test_classification_is_stable() {
        // Pure and total: repeated calls agree
        let c = classifier();
        for _ in 0..3 {
            assert_eq!(c.classify("str"), Classification::Universal);
            assert_eq!(c.classify("UserId"), Classification::Domain);
        }
    }
}
