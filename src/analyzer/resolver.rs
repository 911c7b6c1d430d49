//! Type reference resolution for annotation expressions
//!
//! Architecture: Domain Model - TypeSlot is a closed tagged-variant lowering
//! of the parser's annotation expressions
//! - The resolver matches the variants exhaustively instead of inspecting
//!   parser node kinds at each use site
//! - Forward references are "parse then recurse": the quoted text is parsed
//!   as an expression and resolved through the same code path

use rustpython_parser::ast;

/// Closed lowering of an annotation expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSlot {
    /// Simple or dotted name: `str`, `typing.Dict`, `app.types.UserId`
    Name(String),
    /// Subscripted generic: `Container[Arg1, Arg2, ...]`
    Generic {
        base: Box<TypeSlot>,
        args: Vec<TypeSlot>,
    },
    /// Union via `A | B`
    Union(Vec<TypeSlot>),
    /// String-quoted forward reference, re-parsed on resolution
    ForwardRef(String),
    /// The `None` marker in an optional idiom; never classified
    NoneMarker,
    /// Bracketed argument list, e.g. the parameter list of `Callable`
    Group(Vec<TypeSlot>),
    /// Call expression; positional arguments may carry type names
    Call(Vec<TypeSlot>),
    /// Anything the resolver does not interpret (literals, ellipsis)
    Opaque,
}

/// The construct a resolved reference appeared in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeRole {
    /// The annotation itself
    Direct,
    /// Member of a union
    UnionMember,
    /// Argument of a subscripted generic
    GenericArgument,
    /// Non-`None` member of an optional idiom
    OptionalWrapped,
}

/// One flattened reference out of a slot: qualified name, nesting depth,
/// containing construct, and whether the name was subscripted itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    pub name: String,
    pub depth: usize,
    pub role: TypeRole,
    pub parameterized: bool,
}

/// Resolution failure: the slot is skipped and surfaced as a DT004 finding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedAnnotation {
    pub text: String,
    pub detail: String,
}

impl std::fmt::Display for MalformedAnnotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "annotation '{}' could not be parsed: {}",
            self.text, self.detail
        )
    }
}

impl TypeSlot {
    /// Lower a parsed annotation expression into its closed variant form
    pub fn lower(expr: &ast::Expr) -> TypeSlot {
        match expr {
            ast::Expr::Name(name) => TypeSlot::Name(name.id.to_string()),
            ast::Expr::Attribute(_) => match dotted_name(expr) {
                Some(name) => TypeSlot::Name(name),
                None => TypeSlot::Opaque,
            },
            ast::Expr::Subscript(sub) => TypeSlot::Generic {
                base: Box::new(Self::lower(&sub.value)),
                args: lower_slice(&sub.slice),
            },
            ast::Expr::BinOp(binop) if matches!(binop.op, ast::Operator::BitOr) => {
                let mut members = Vec::new();
                flatten_union(&binop.left, &mut members);
                flatten_union(&binop.right, &mut members);
                TypeSlot::Union(members)
            }
            ast::Expr::Tuple(tuple) => {
                TypeSlot::Group(tuple.elts.iter().map(Self::lower).collect())
            }
            ast::Expr::List(list) => TypeSlot::Group(list.elts.iter().map(Self::lower).collect()),
            ast::Expr::Call(call) => TypeSlot::Call(call.args.iter().map(Self::lower).collect()),
            ast::Expr::Constant(constant) => match &constant.value {
                ast::Constant::Str(text) => TypeSlot::ForwardRef(text.clone()),
                ast::Constant::None => TypeSlot::NoneMarker,
                _ => TypeSlot::Opaque,
            },
            _ => TypeSlot::Opaque,
        }
    }

    /// Flatten the slot into its resolved reference sequence.
    ///
    /// Produced fresh per evaluation; an unresolvable forward reference
    /// inside the slot fails the whole slot.
    pub fn resolve(&self) -> Result<Vec<TypeRef>, MalformedAnnotation> {
        let mut refs = Vec::new();
        self.resolve_into(0, TypeRole::Direct, &mut refs)?;
        Ok(refs)
    }

    fn resolve_into(
        &self,
        depth: usize,
        role: TypeRole,
        refs: &mut Vec<TypeRef>,
    ) -> Result<(), MalformedAnnotation> {
        match self {
            TypeSlot::Name(name) => {
                refs.push(TypeRef {
                    name: name.clone(),
                    depth,
                    role,
                    parameterized: false,
                });
                Ok(())
            }
            TypeSlot::NoneMarker | TypeSlot::Opaque => Ok(()),
            TypeSlot::ForwardRef(text) => {
                let slot = parse_forward_ref(text)?;
                slot.resolve_into(depth, role, refs)
            }
            TypeSlot::Union(members) => resolve_union(members, depth, refs),
            TypeSlot::Group(members) | TypeSlot::Call(members) => {
                for member in members {
                    member.resolve_into(depth, role, refs)?;
                }
                Ok(())
            }
            TypeSlot::Generic { base, args } => {
                if let TypeSlot::Name(base_name) = base.as_ref() {
                    match final_segment(base_name) {
                        // The optional idiom: the wrapper itself is never
                        // referenced, the wrapped member keeps the depth
                        "Optional" => {
                            for arg in args {
                                arg.resolve_into(depth, TypeRole::OptionalWrapped, refs)?;
                            }
                            Ok(())
                        }
                        "Union" => resolve_union(args, depth, refs),
                        // Only the first argument is a type; the rest is
                        // metadata and must not surface findings
                        "Annotated" => match args.first() {
                            Some(arg) => arg.resolve_into(depth, role, refs),
                            None => Ok(()),
                        },
                        _ => {
                            refs.push(TypeRef {
                                name: base_name.clone(),
                                depth,
                                role,
                                parameterized: true,
                            });
                            for arg in args {
                                arg.resolve_into(depth + 1, TypeRole::GenericArgument, refs)?;
                            }
                            Ok(())
                        }
                    }
                } else {
                    base.resolve_into(depth, role, refs)?;
                    for arg in args {
                        arg.resolve_into(depth + 1, TypeRole::GenericArgument, refs)?;
                    }
                    Ok(())
                }
            }
        }
    }
}

/// Union members resolve at the same depth. When one member is the `None`
/// marker, the remaining members are the optional idiom.
fn resolve_union(
    members: &[TypeSlot],
    depth: usize,
    refs: &mut Vec<TypeRef>,
) -> Result<(), MalformedAnnotation> {
    let has_none = members.iter().any(|m| matches!(m, TypeSlot::NoneMarker));
    let role = if has_none {
        TypeRole::OptionalWrapped
    } else {
        TypeRole::UnionMember
    };

    for member in members {
        member.resolve_into(depth, role, refs)?;
    }
    Ok(())
}

fn flatten_union(expr: &ast::Expr, members: &mut Vec<TypeSlot>) {
    match TypeSlot::lower(expr) {
        TypeSlot::Union(nested) => members.extend(nested),
        slot => members.push(slot),
    }
}

fn lower_slice(slice: &ast::Expr) -> Vec<TypeSlot> {
    match slice {
        ast::Expr::Tuple(tuple) => tuple.elts.iter().map(TypeSlot::lower).collect(),
        other => vec![TypeSlot::lower(other)],
    }
}

fn parse_forward_ref(text: &str) -> Result<TypeSlot, MalformedAnnotation> {
    match rustpython_parser::parse(text, rustpython_parser::Mode::Expression, "<annotation>") {
        Ok(ast::Mod::Expression(module)) => Ok(TypeSlot::lower(&module.body)),
        Ok(_) => Err(MalformedAnnotation {
            text: text.to_string(),
            detail: "not an expression".to_string(),
        }),
        Err(e) => Err(MalformedAnnotation {
            text: text.to_string(),
            detail: e.error.to_string(),
        }),
    }
}

fn dotted_name(expr: &ast::Expr) -> Option<String> {
    match expr {
        ast::Expr::Name(name) => Some(name.id.to_string()),
        ast::Expr::Attribute(attr) => {
            dotted_name(&attr.value).map(|base| format!("{}.{}", base, attr.attr.as_str()))
        }
        _ => None,
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

    fn slot(text: &str) -> TypeSlot {
        let module =
            rustpython_parser::parse(text, rustpython_parser::Mode::Expression, "<test>").unwrap();
        match module {
            ast::Mod::Expression(module) => TypeSlot::lower(&module.body),
            _ => unreachable!(),
        }
    }

    fn names(refs: &[TypeRef]) -> Vec<&str> {
        refs.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_simple_name() {
        let refs = slot("str").resolve().unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].name, "str");
        assert_eq!(refs[0].depth, 0);
        assert_eq!(refs[0].role, TypeRole::Direct);
        assert!(!refs[0].parameterized);
    }

    #[test]
    fn test_dotted_name() {
        let refs = slot("typing.Dict").resolve().unwrap();
        assert_eq!(names(&refs), vec!["typing.Dict"]);
    }

    #[test]
    fn test_subscripted_generic() {
        let refs = slot("List[str]").resolve().unwrap();
        assert_eq!(names(&refs), vec!["List", "str"]);
        assert!(refs[0].parameterized);
        assert_eq!(refs[0].depth, 0);
        assert_eq!(refs[1].depth, 1);
        assert_eq!(refs[1].role, TypeRole::GenericArgument);
    }

    #[test]
    fn test_nested_generic_depths() {
        let refs = slot("List[Dict[str, int]]").resolve().unwrap();
        assert_eq!(names(&refs), vec!["List", "Dict", "str", "int"]);
        assert_eq!(refs[1].depth, 1);
        assert!(refs[1].parameterized);
        assert_eq!(refs[2].depth, 2);
        assert_eq!(refs[3].depth, 2);
    }

    #[test]
    fn test_pipe_union_members() {
        let refs = slot("UserId | OrderId").resolve().unwrap();
        assert_eq!(names(&refs), vec!["UserId", "OrderId"]);
        assert!(refs.iter().all(|r| r.role == TypeRole::UnionMember));
        assert!(refs.iter().all(|r| r.depth == 0));
    }

    #[test]
    fn test_pipe_union_with_none_is_optional() {
        let refs = slot("str | None").resolve().unwrap();
        assert_eq!(names(&refs), vec!["str"]);
        assert_eq!(refs[0].role, TypeRole::OptionalWrapped);
    }

    #[test]
    fn test_optional_wrapper_not_referenced() {
        let refs = slot("Optional[str]").resolve().unwrap();
        assert_eq!(names(&refs), vec!["str"]);
        assert_eq!(refs[0].role, TypeRole::OptionalWrapped);
        assert_eq!(refs[0].depth, 0);
    }

    #[test]
    fn test_union_subscript() {
        let refs = slot("Union[UserId, str]").resolve().unwrap();
        assert_eq!(names(&refs), vec!["UserId", "str"]);
        assert!(refs.iter().all(|r| r.role == TypeRole::UnionMember));
    }

    #[test]
    fn test_union_subscript_with_none() {
        let refs = slot("Union[int, None]").resolve().unwrap();
        assert_eq!(names(&refs), vec!["int"]);
        assert_eq!(refs[0].role, TypeRole::OptionalWrapped);
    }

    #[test]
    fn test_forward_ref_parse_then_recurse() {
        let refs = slot("\"List[UserId]\"").resolve().unwrap();
        assert_eq!(names(&refs), vec!["List", "UserId"]);
    }

    #[test]
    fn test_malformed_forward_ref() {
        let err = slot("\"List[\"").resolve().unwrap_err();
        assert_eq!(err.text, "List[");
    }

    #[test]
    fn test_annotated_metadata_ignored() {
        // The trailing string is metadata, not a forward reference
        let refs = slot("Annotated[UserId, \"not a type (\"]").resolve().unwrap();
        assert_eq!(names(&refs), vec!["UserId"]);
    }

    #[test]
    fn test_callable_arguments() {
        let refs = slot("Callable[[UserId, str], Money]").resolve().unwrap();
        assert_eq!(names(&refs), vec!["Callable", "UserId", "str", "Money"]);
        assert!(refs[0].parameterized);
        assert!(refs[1..].iter().all(|r| r.depth == 1));
    }

    #[test]
    fn test_tuple_ellipsis_ignored() {
        let refs = slot("Tuple[int, ...]").resolve().unwrap();
        assert_eq!(names(&refs), vec!["Tuple", "int"]);
    }

    #[test]
    fn test_call_positional_args() {
        let refs = slot("NewType(\"UserId\", int)").resolve().unwrap();
        // The first argument is a string literal; parsed as an expression it
        // is a bare name, the second carries the aliased base type
        assert!(refs.iter().any(|r| r.name == "int"));
    }

    #[test]
    fn test_nested_optional_in_generic() {
        let refs = slot("Dict[str, Optional[int]]").resolve().unwrap();
        assert_eq!(names(&refs), vec!["Dict", "str", "int"]);
        assert_eq!(refs[2].role, TypeRole::OptionalWrapped);
        assert_eq!(refs[2].depth, 1);
    }

    #[test]
    fn test_opaque_literal_produces_nothing() {
        let refs = slot("42").resolve().unwrap();
        assert!(refs.is_empty());
    }
}
