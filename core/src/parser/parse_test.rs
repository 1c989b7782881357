use pretty_assertions::assert_eq;

use crate::parser::{
    BinaryOp, Constant, DictItem, Expr, ExprKind, Module, ParseError, Span, StmtKind, UnaryOp,
    parse,
};

fn module(source: &str) -> Module {
    parse(source).unwrap_or_else(|e| panic!("failed to parse {source:?}: {e}"))
}

fn expr(source: &str) -> Expr {
    let module = module(source);
    assert_eq!(module.body.len(), 1, "expected one statement in {source:?}");
    match module.body.into_iter().next().map(|s| s.kind) {
        Some(StmtKind::Expr(expr)) => expr,
        other => panic!("expected expression statement, got {other:?}"),
    }
}

fn constant(source: &str) -> Constant {
    match expr(source).kind {
        ExprKind::Constant(c) => c,
        other => panic!("expected constant, got {other:?}"),
    }
}

#[test]
fn test_empty_source_has_no_statements() {
    assert!(module("").body.is_empty());
    assert!(module("   \n\n# just a comment\n").body.is_empty());
}

#[test]
fn test_name_and_spans() {
    let e = expr("foo");
    assert_eq!(e.kind, ExprKind::Name("foo".to_string()));
    assert_eq!(e.span, Span::new(0, 3));

    let e = expr("  a + bc");
    assert_eq!(e.span, Span::new(2, 8));
}

#[test]
fn test_integer_literals() {
    assert_eq!(constant("42"), Constant::Int(42));
    assert_eq!(constant("1_000"), Constant::Int(1000));
    assert_eq!(constant("0x1F"), Constant::Int(31));
    assert_eq!(constant("0o17"), Constant::Int(15));
    assert_eq!(constant("0b101"), Constant::Int(5));
}

#[test]
fn test_integer_overflow_is_parse_error() {
    let err = parse("99999999999999999999").unwrap_err();
    assert_eq!(err.message, "invalid integer literal");
    assert_eq!(err.span, Span::new(0, 20));
}

#[test]
fn test_float_literals() {
    assert_eq!(constant("3.5"), Constant::Float(3.5));
    assert_eq!(constant(".5"), Constant::Float(0.5));
    assert_eq!(constant("2."), Constant::Float(2.0));
    assert_eq!(constant("1e3"), Constant::Float(1000.0));
}

#[test]
fn test_string_literals() {
    assert_eq!(constant("'abc'"), Constant::Str("abc".to_string()));
    assert_eq!(constant("\"a\\nb\""), Constant::Str("a\nb".to_string()));
    assert_eq!(constant("'\\x41\\u00e9'"), Constant::Str("Aé".to_string()));
    assert_eq!(constant("r'\\d'"), Constant::Str("\\d".to_string()));
    assert_eq!(constant("'a' \"b\""), Constant::Str("ab".to_string()));
    assert_eq!(constant("'it\\'s'"), Constant::Str("it's".to_string()));
}

#[test]
fn test_bad_escape_is_parse_error() {
    let err = parse("'\\xZZ'").unwrap_err();
    assert_eq!(err.message, "invalid escape sequence");
}

#[test]
fn test_keyword_constants() {
    assert_eq!(constant("True"), Constant::Bool(true));
    assert_eq!(constant("False"), Constant::Bool(false));
    assert_eq!(constant("None"), Constant::None);
}

#[test]
fn test_unary_minus_is_not_folded() {
    match expr("-5").kind {
        ExprKind::UnaryOp { op, operand } => {
            assert_eq!(op, UnaryOp::Neg);
            assert_eq!(operand.kind, ExprKind::Constant(Constant::Int(5)));
        }
        other => panic!("expected unary op, got {other:?}"),
    }
}

#[test]
fn test_call_arguments() {
    match expr("f(a, *b, c=1, **d)").kind {
        ExprKind::Call {
            func,
            args,
            keywords,
        } => {
            assert_eq!(func.simple_name(), Some("f"));
            assert_eq!(args.len(), 2);
            assert!(matches!(args[1].kind, ExprKind::Starred(_)));
            assert_eq!(keywords.len(), 2);
            assert_eq!(keywords[0].arg.as_deref(), Some("c"));
            assert_eq!(keywords[1].arg, None);
        }
        other => panic!("expected call, got {other:?}"),
    }
}

#[test]
fn test_bare_generator_argument() {
    match expr("sum(x for x in y)").kind {
        ExprKind::Call { args, .. } => {
            assert_eq!(args.len(), 1);
            assert!(matches!(args[0].kind, ExprKind::GeneratorExp { .. }));
        }
        other => panic!("expected call, got {other:?}"),
    }
}

#[test]
fn test_displays() {
    assert!(matches!(expr("()").kind, ExprKind::Tuple(ref items) if items.is_empty()));
    assert!(matches!(expr("(1,)").kind, ExprKind::Tuple(ref items) if items.len() == 1));
    assert!(matches!(expr("(1)").kind, ExprKind::Constant(Constant::Int(1))));
    assert!(matches!(expr("1, 2").kind, ExprKind::Tuple(ref items) if items.len() == 2));
    assert!(matches!(expr("[1, 2]").kind, ExprKind::List(ref items) if items.len() == 2));
    assert!(matches!(expr("{1, 2}").kind, ExprKind::Set(ref items) if items.len() == 2));
    assert!(matches!(expr("{}").kind, ExprKind::Dict(ref items) if items.is_empty()));
    match expr("{'a': 1, **b}").kind {
        ExprKind::Dict(items) => {
            assert!(matches!(items[0], DictItem::Pair { .. }));
            assert!(matches!(items[1], DictItem::Spread(_)));
        }
        other => panic!("expected dict, got {other:?}"),
    }
}

#[test]
fn test_comprehensions() {
    assert!(matches!(expr("[x for x in y]").kind, ExprKind::ListComp { .. }));
    assert!(matches!(expr("{x for x in y}").kind, ExprKind::SetComp { .. }));
    assert!(matches!(expr("(x for x in y)").kind, ExprKind::GeneratorExp { .. }));
    match expr("{k: v for k, v in d if k}").kind {
        ExprKind::DictComp { generators, .. } => {
            assert_eq!(generators.len(), 1);
            assert!(matches!(generators[0].target.kind, ExprKind::Tuple(ref t) if t.len() == 2));
            assert_eq!(generators[0].ifs.len(), 1);
        }
        other => panic!("expected dict comprehension, got {other:?}"),
    }
}

#[test]
fn test_subscripts_and_slices() {
    match expr("a[1:2]").kind {
        ExprKind::Subscript { index, .. } => match index.kind {
            ExprKind::Slice { lower, upper, step } => {
                assert!(lower.is_some());
                assert!(upper.is_some());
                assert!(step.is_none());
            }
            other => panic!("expected slice, got {other:?}"),
        },
        other => panic!("expected subscript, got {other:?}"),
    }
    match expr("a[1, ::2]").kind {
        ExprKind::Subscript { index, .. } => {
            assert!(matches!(index.kind, ExprKind::Tuple(ref items) if items.len() == 2));
        }
        other => panic!("expected subscript, got {other:?}"),
    }
}

#[test]
fn test_lambda_parameters() {
    match expr("lambda a, b=1, *c, **d: a").kind {
        ExprKind::Lambda { params, .. } => {
            let names: Vec<_> = params.params.iter().map(|p| p.name.as_str()).collect();
            assert_eq!(names, vec!["a", "b"]);
            assert!(params.params[1].default.is_some());
            assert_eq!(params.varargs.as_deref(), Some("c"));
            assert_eq!(params.kwargs.as_deref(), Some("d"));
        }
        other => panic!("expected lambda, got {other:?}"),
    }
}

#[test]
fn test_duplicate_lambda_parameter_is_parse_error() {
    let err: ParseError = parse("lambda x, x: x").unwrap_err();
    assert!(err.message.contains("duplicate argument 'x'"), "{}", err.message);
}

#[test]
fn test_statements() {
    let body = module("import os; x = 1\nx += 2\ndef f(): pass").body;
    assert_eq!(body.len(), 4);
    assert!(matches!(body[0].kind, StmtKind::Import(ref names) if names[0].name == "os"));
    assert!(matches!(body[1].kind, StmtKind::Assign { ref targets, .. } if targets.len() == 1));
    assert!(matches!(
        body[2].kind,
        StmtKind::AugAssign {
            op: BinaryOp::Add,
            ..
        }
    ));
    assert!(matches!(body[3].kind, StmtKind::FunctionDef { ref name, .. } if name == "f"));
}

#[test]
fn test_chained_assignment() {
    match &module("a = b = 3").body[0].kind {
        StmtKind::Assign { targets, value } => {
            assert_eq!(targets.len(), 2);
            assert_eq!(value.kind, ExprKind::Constant(Constant::Int(3)));
        }
        other => panic!("expected assignment, got {other:?}"),
    }
}

#[test]
fn test_from_import() {
    match &module("from os.path import join as j, sep").body[0].kind {
        StmtKind::ImportFrom { module, names } => {
            assert_eq!(module, "os.path");
            assert_eq!(names.len(), 2);
            assert_eq!(names[0].asname.as_deref(), Some("j"));
        }
        other => panic!("expected import, got {other:?}"),
    }
}

#[test]
fn test_syntax_error_reports_position() {
    let err = parse("1 +").unwrap_err();
    assert!(err.span.0.start <= 3);
    assert!(parse("f(").is_err());
    assert!(parse("a b").is_err());
}

#[test]
fn test_keywords_are_not_names() {
    assert!(parse("lambda = 1").is_err());
    assert!(matches!(expr("lambda_ + 1").kind, ExprKind::BinOp { .. }));
    assert!(matches!(expr("None_").kind, ExprKind::Name(_)));
}
