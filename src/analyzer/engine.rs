//! Rule engine: walks a source unit and emits domain-type violations
//!
//! Architecture: Domain Services - The engine orchestrates resolution and
//! classification over every declaration in a file
//! - Violations are emitted at the annotation site, never at a nested
//!   sub-location: the report points where the fix goes
//! - Slot-level deduplication: each distinct offending name is reported at
//!   most once per slot, first traversal offense wins
//! - A malformed annotation degrades to a DT004 finding; the rest of the
//!   file is still analyzed

use crate::analyzer::resolver::TypeSlot;
use crate::analyzer::syntax::SourceUnit;
use crate::classify::{Classification, TypeClassifier};
use crate::domain::violations::{RuleCode, Violation};
use rustpython_parser::ast::{self, Ranged};
use std::collections::HashSet;

/// Checks one source unit against the domain-type discipline
pub struct RuleEngine<'a> {
    classifier: &'a TypeClassifier,
}

impl<'a> RuleEngine<'a> {
    pub fn new(classifier: &'a TypeClassifier) -> Self {
        Self { classifier }
    }

    /// Produce the ordered violation list for a unit.
    ///
    /// Ordering is (line, column) ascending, ties broken by rule code
    /// (parameter before return before attribute), then discovery order.
    pub fn check(&self, unit: &SourceUnit) -> Vec<Violation> {
        let mut walker = FileWalker {
            unit,
            classifier: self.classifier,
            aliases: HashSet::new(),
            scope: Vec::new(),
            violations: Vec::new(),
        };

        if let ast::Mod::Module(module) = &unit.module {
            walker.walk_stmts(&module.body);
        }

        let mut violations = walker.violations;
        violations.sort_by(|a, b| {
            a.line
                .cmp(&b.line)
                .then_with(|| a.column.cmp(&b.column))
                .then_with(|| a.code.cmp(&b.code))
        });
        violations
    }
}

/// Single-pass walker carrying the scope stack and file-local aliases
struct FileWalker<'a> {
    unit: &'a SourceUnit,
    classifier: &'a TypeClassifier,
    /// Names assigned from a bare universal type (`UserStr = str`).
    /// Registered in document order; they never leak across files.
    aliases: HashSet<String>,
    scope: Vec<String>,
    violations: Vec<Violation>,
}

impl FileWalker<'_> {
    fn walk_stmts(&mut self, stmts: &[ast::Stmt]) {
        for stmt in stmts {
            self.walk_stmt(stmt);
        }
    }

    fn walk_stmt(&mut self, stmt: &ast::Stmt) {
        match stmt {
            ast::Stmt::FunctionDef(func) => {
                self.check_function(func.name.as_str(), &func.args, func.returns.as_deref());
                self.scope.push(func.name.to_string());
                self.walk_stmts(&func.body);
                self.scope.pop();
            }
            ast::Stmt::AsyncFunctionDef(func) => {
                self.check_function(func.name.as_str(), &func.args, func.returns.as_deref());
                self.scope.push(func.name.to_string());
                self.walk_stmts(&func.body);
                self.scope.pop();
            }
            ast::Stmt::ClassDef(class) => {
                self.scope.push(class.name.to_string());
                self.walk_stmts(&class.body);
                self.scope.pop();
            }
            ast::Stmt::AnnAssign(assign) => {
                let site = attribute_name(&assign.target);
                self.check_slot(
                    RuleCode::UniversalAttribute,
                    site,
                    &assign.annotation,
                );
            }
            ast::Stmt::Assign(assign) => self.register_alias(assign),
            ast::Stmt::If(stmt) => {
                self.walk_stmts(&stmt.body);
                self.walk_stmts(&stmt.orelse);
            }
            ast::Stmt::While(stmt) => {
                self.walk_stmts(&stmt.body);
                self.walk_stmts(&stmt.orelse);
            }
            ast::Stmt::For(stmt) => {
                self.walk_stmts(&stmt.body);
                self.walk_stmts(&stmt.orelse);
            }
            ast::Stmt::AsyncFor(stmt) => {
                self.walk_stmts(&stmt.body);
                self.walk_stmts(&stmt.orelse);
            }
            ast::Stmt::With(stmt) => self.walk_stmts(&stmt.body),
            ast::Stmt::AsyncWith(stmt) => self.walk_stmts(&stmt.body),
            ast::Stmt::Match(stmt) => {
                for case in &stmt.cases {
                    self.walk_stmts(&case.body);
                }
            }
            ast::Stmt::Try(stmt) => {
                self.walk_stmts(&stmt.body);
                for handler in &stmt.handlers {
                    let ast::ExceptHandler::ExceptHandler(handler) = handler;
                    self.walk_stmts(&handler.body);
                }
                self.walk_stmts(&stmt.orelse);
                self.walk_stmts(&stmt.finalbody);
            }
            _ => {}
        }
    }

    /// `UserStr = str` registers `UserStr` as a file-local universal alias;
    /// annotations using it afterwards are violations naming the alias
    fn register_alias(&mut self, assign: &ast::StmtAssign) {
        if let ast::Expr::Name(value) = assign.value.as_ref() {
            if self.classifier.is_universal_base(value.id.as_str()) {
                for target in &assign.targets {
                    if let ast::Expr::Name(target) = target {
                        self.aliases.insert(target.id.to_string());
                    }
                }
            }
        }
    }

    fn check_function(
        &mut self,
        name: &str,
        args: &ast::Arguments,
        returns: Option<&ast::Expr>,
    ) {
        let declaration = self.scoped_name(name);

        let param_slots = args
            .posonlyargs
            .iter()
            .chain(&args.args)
            .map(|arg| &arg.def)
            .chain(args.vararg.iter().map(|arg| arg.as_ref()))
            .chain(args.kwonlyargs.iter().map(|arg| &arg.def))
            .chain(args.kwarg.iter().map(|arg| arg.as_ref()));

        for arg in param_slots {
            if let Some(annotation) = &arg.annotation {
                self.check_slot(
                    RuleCode::UniversalParameter,
                    format!("parameter '{}' of '{}'", arg.arg.as_str(), declaration),
                    annotation,
                );
            }
        }

        if let Some(annotation) = returns {
            self.check_slot(
                RuleCode::UniversalReturn,
                format!("return type of '{declaration}'"),
                annotation,
            );
        }
    }

    /// Resolve one annotation slot and emit violations for its universal
    /// references, deduplicated by name within the slot
    fn check_slot(&mut self, code: RuleCode, site: String, annotation: &ast::Expr) {
        let offset = u32::from(annotation.range().start()) as usize;
        let (line, column) = self.unit.location(offset);

        let slot = TypeSlot::lower(annotation);
        let refs = match slot.resolve() {
            Ok(refs) => refs,
            Err(malformed) => {
                tracing::debug!(
                    "Malformed annotation in {} at {}:{}: {}",
                    self.unit.path.display(),
                    line,
                    column,
                    malformed
                );
                self.violations.push(
                    Violation::new(
                        RuleCode::MalformedAnnotation,
                        self.unit.path.clone(),
                        line,
                        column,
                        format!("Malformed annotation on {site}: {malformed}"),
                    )
                    .with_declaration(site),
                );
                return;
            }
        };

        let mut reported: HashSet<&str> = HashSet::new();

        for type_ref in &refs {
            // A parameterized universal base is not itself the offense; the
            // fix site is its arguments
            if type_ref.parameterized {
                continue;
            }
            if reported.contains(type_ref.name.as_str()) {
                continue;
            }

            let offense = if self.aliases.contains(&type_ref.name) {
                Some(format!(
                    "Use of universal type alias '{}' is not allowed in {}",
                    type_ref.name, site
                ))
            } else {
                match self.classifier.classify(&type_ref.name) {
                    Classification::Universal => Some(format!(
                        "Use of universal type '{}' is not allowed in {}",
                        type_ref.name, site
                    )),
                    Classification::Exempt | Classification::Domain => None,
                }
            };

            if let Some(message) = offense {
                reported.insert(type_ref.name.as_str());
                self.violations.push(
                    Violation::new(code, self.unit.path.clone(), line, column, message)
                        .with_type_name(type_ref.name.clone())
                        .with_declaration(site.clone()),
                );
            }
        }
    }

    fn scoped_name(&self, name: &str) -> String {
        if self.scope.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.scope.join("."), name)
        }
    }
}

fn attribute_name(target: &ast::Expr) -> String {
    match target {
        ast::Expr::Name(name) => format!("attribute '{}'", name.id.as_str()),
        ast::Expr::Attribute(attr) => format!("attribute '{}'", attr.attr.as_str()),
        _ => "attribute".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn check(source: &str) -> Vec<Violation> {
        let unit = SourceUnit::parse(Path::new("service.py"), source.to_string()).unwrap();
        let classifier = TypeClassifier::with_defaults();
        RuleEngine::new(&classifier).check(&unit)
    }

    #[test]
    fn test_universal_parameters_reported() {
        let source = "def register(name: str, age: int) -> UserRecord:\n    pass\n";
        let violations = check(source);

        assert_eq!(violations.len(), 2);
        assert!(violations
            .iter()
            .all(|v| v.code == RuleCode::UniversalParameter));
        assert_eq!(violations[0].type_name.as_deref(), Some("str"));
        assert_eq!(violations[1].type_name.as_deref(), Some("int"));
        // Zero violations for the domain-typed return
        assert!(!violations
            .iter()
            .any(|v| v.code == RuleCode::UniversalReturn));
    }

    #[test]
    fn test_domain_types_produce_nothing() {
        let source = "def register(name: UserName, age: Age) -> UserRecord:\n    pass\n";
        assert!(check(source).is_empty());
    }

    #[test]
    fn test_universal_return_reported() {
        let source = "def lookup(user_id: UserId) -> str:\n    pass\n";
        let violations = check(source);

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].code, RuleCode::UniversalReturn);
        assert_eq!(violations[0].type_name.as_deref(), Some("str"));
    }

    #[test]
    fn test_attribute_annotation_reported() {
        let source = "class Account:\n    balance: float\n    owner: OwnerId\n";
        let violations = check(source);

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].code, RuleCode::UniversalAttribute);
        assert_eq!(violations[0].type_name.as_deref(), Some("float"));
        assert_eq!(violations[0].line, 2);
    }

    #[test]
    fn test_slot_level_deduplication() {
        // Two occurrences of `str` in one slot produce exactly one violation
        let source = "def index(mapping: Dict[str, str]) -> UserIndex:\n    pass\n";
        let violations = check(source);

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].type_name.as_deref(), Some("str"));
    }

    #[test]
    fn test_depth_two_distinct_names_each_report_once() {
        // Each distinct universal name contributes independently
        let source = "def load(data: List[Dict[str, int]]) -> Archive:\n    pass\n";
        let violations = check(source);

        let names: Vec<_> = violations
            .iter()
            .filter_map(|v| v.type_name.as_deref())
            .collect();
        assert_eq!(names, vec!["str", "int"]);
    }

    #[test]
    fn test_parameterized_universal_base_not_reported() {
        // `List[UserId]` has a domain argument; the parameterized base is fine
        let source = "def batch(ids: List[UserId]) -> BatchResult:\n    pass\n";
        assert!(check(source).is_empty());
    }

    #[test]
    fn test_bare_universal_container_reported() {
        let source = "def dump(payload: dict) -> Report:\n    pass\n";
        let violations = check(source);

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].type_name.as_deref(), Some("dict"));
    }

    #[test]
    fn test_optional_universal_still_reported() {
        let source = "def find(key: Optional[str]) -> Record:\n    pass\n";
        let violations = check(source);

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].type_name.as_deref(), Some("str"));
    }

    #[test]
    fn test_pipe_none_optional_still_reported() {
        let source = "def find(key: str | None) -> Record:\n    pass\n";
        let violations = check(source);

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].type_name.as_deref(), Some("str"));
    }

    #[test]
    fn test_violation_located_at_slot_not_nested_argument() {
        let source = "def index(mapping: Dict[str, UserId]) -> Index:\n    pass\n";
        let violations = check(source);

        assert_eq!(violations.len(), 1);
        // Column of the annotation site (`Dict...`), not of the nested `str`
        assert_eq!(violations[0].line, 1);
        assert_eq!(violations[0].column, 20);
    }

    #[test]
    fn test_malformed_forward_ref_yields_dt004_and_no_violation() {
        let source = "def load(raw: \"List[\") -> Record:\n    pass\n";
        let violations = check(source);

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].code, RuleCode::MalformedAnnotation);
        assert!(violations[0].type_name.is_none());
    }

    #[test]
    fn test_malformed_slot_does_not_abort_rest_of_file() {
        let source = "def load(raw: \"List[\") -> Record:\n    pass\n\ndef save(data: str) -> Receipt:\n    pass\n";
        let violations = check(source);

        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].code, RuleCode::MalformedAnnotation);
        assert_eq!(violations[1].code, RuleCode::UniversalParameter);
    }

    #[test]
    fn test_valid_forward_ref_resolved() {
        let source = "def load(raw: \"bytes\") -> Record:\n    pass\n";
        let violations = check(source);

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].type_name.as_deref(), Some("bytes"));
    }

    #[test]
    fn test_file_local_alias_registered_and_reported() {
        let source = "UserStr = str\n\ndef greet(name: UserStr) -> Greeting:\n    pass\n";
        let violations = check(source);

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].type_name.as_deref(), Some("UserStr"));
        assert!(violations[0].message.contains("alias"));
    }

    #[test]
    fn test_methods_and_nested_functions_are_declaration_sites() {
        let source = "class Service:\n    def handle(self, raw: bytes) -> Event:\n        def convert(value: int) -> Amount:\n            pass\n";
        let violations = check(source);

        assert_eq!(violations.len(), 2);
        assert!(violations[0]
            .declaration
            .as_deref()
            .unwrap()
            .contains("Service.handle"));
        assert!(violations[1]
            .declaration
            .as_deref()
            .unwrap()
            .contains("Service.handle.convert"));
    }

    #[test]
    fn test_async_and_starred_parameters() {
        let source =
            "async def collect(*items: str, **extras: int) -> Basket:\n    pass\n";
        let violations = check(source);

        let names: Vec<_> = violations
            .iter()
            .filter_map(|v| v.type_name.as_deref())
            .collect();
        assert_eq!(names, vec!["str", "int"]);
    }

    #[test]
    fn test_declarations_inside_match_cases_walked() {
        let source = "def route(event: Event) -> Outcome:\n    match event.kind:\n        case \"created\":\n            def handle(payload: str) -> Ack:\n                pass\n        case _:\n            fallback: int = 0\n";
        let violations = check(source);

        let names: Vec<_> = violations
            .iter()
            .filter_map(|v| v.type_name.as_deref())
            .collect();
        assert_eq!(names, vec!["str", "int"]);
        assert_eq!(violations[0].code, RuleCode::UniversalParameter);
        assert_eq!(violations[1].code, RuleCode::UniversalAttribute);
    }

    #[test]
    fn test_unannotated_slots_skipped() {
        let source = "def legacy(name, age):\n    pass\n";
        assert!(check(source).is_empty());
    }

    #[test]
    fn test_exempt_names_never_reported() {
        let source = "def run(task: Callable[[UserId], Money]) -> TaskHandle:\n    pass\n";
        assert!(check(source).is_empty());
    }

    #[test]
    fn test_dotted_universal_reported() {
        let source = "def tag(labels: typing.Dict) -> Tags:\n    pass\n";
        let violations = check(source);

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].type_name.as_deref(), Some("typing.Dict"));
    }

    #[test]
    fn test_module_level_annotated_assignment() {
        let source = "RETRY_LIMIT: int = 3\n";
        let violations = check(source);

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].code, RuleCode::UniversalAttribute);
    }

    #[test]
    fn test_idempotent_ordering() {
        let source = "def f(a: str, b: int) -> bytes:\n    pass\nclass C:\n    x: float\n";
        let first = check(source);
        let second = check(source);

        let keys: Vec<_> = first
            .iter()
            .map(|v| (v.line, v.column, v.code, v.type_name.clone()))
            .collect();
        let keys2: Vec<_> = second
            .iter()
            .map(|v| (v.line, v.column, v.code, v.type_name.clone()))
            .collect();
        assert_eq!(keys, keys2);
    }
}
