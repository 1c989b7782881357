use indoc::indoc;
use pretty_assertions::assert_eq;

use crate::parser::{self, Span};
use crate::stdlib;
use crate::verifier::{Policy, SafetyViolation, Verifier, ViolationKind};

fn check_with(policy: &Policy, source: &str) -> Result<(), SafetyViolation> {
    let module = parser::parse(source).unwrap_or_else(|e| panic!("failed to parse {source:?}: {e}"));
    Verifier::new(policy).check(&module)
}

fn check(source: &str) -> Result<(), SafetyViolation> {
    check_with(&Policy::default(), source)
}

fn violation(source: &str) -> ViolationKind {
    match check(source) {
        Ok(()) => panic!("expected {source:?} to be rejected"),
        Err(err) => err.kind,
    }
}

fn disallowed(name: &str) -> ViolationKind {
    ViolationKind::DisallowedCall {
        name: name.to_string(),
    }
}

#[test]
fn test_accepts_plain_expressions() {
    for source in [
        "1",
        "a[0:250]",
        "x + y * 2",
        "'abc'",
        "[1, 2, 3]",
        "{'a': 1}",
        "a if b else c",
        "not a and b or c",
        "lambda x: x + 1",
        "_",
        "a.b",
        "a[1:2, ::3]",
    ] {
        assert_eq!(check(source), Ok(()), "{source}");
    }
}

#[test]
fn test_accepts_allowed_calls() {
    for source in [
        "float(x)",
        "float()",
        "float(x=6)",
        "float(*args)",
        "float(**kwargs)",
        "str(float(_))",
        "int(x) + int(y)",
        "[float(x) for x in y]",
        "float(float(float(1)))",
    ] {
        assert_eq!(check(source), Ok(()), "{source}");
    }
}

#[test]
fn test_rejects_disallowed_calls_anywhere() {
    assert_eq!(violation("malicious()"), disallowed("malicious"));
    assert_eq!(violation("1 + malicious()"), disallowed("malicious"));
    assert_eq!(violation("float(x=malicious())"), disallowed("malicious"));
    assert_eq!(violation("float(malicious())"), disallowed("malicious"));
    assert_eq!(violation("float(*malicious())"), disallowed("malicious"));
    assert_eq!(violation("float(**malicious())"), disallowed("malicious"));
    assert_eq!(
        violation("float(*[malicious() for u in [1]])"),
        disallowed("malicious")
    );
    assert_eq!(violation("[x for x in evil()]"), disallowed("evil"));
    assert_eq!(violation("[x for x in y if evil(x)]"), disallowed("evil"));
    assert_eq!(violation("{k: evil() for k in y}"), disallowed("evil"));
    assert_eq!(violation("lambda x=evil(): x"), disallowed("evil"));
    assert_eq!(violation("lambda: evil()"), disallowed("evil"));
    assert_eq!(violation("a[evil():]"), disallowed("evil"));
    assert_eq!(violation("{**evil()}"), disallowed("evil"));
    assert_eq!(violation("__import__('os')"), disallowed("__import__"));
    assert_eq!(violation("eval('1')"), disallowed("eval"));
}

#[test]
fn test_rejects_unnamed_callees() {
    assert_eq!(
        violation("(lambda x: x)()"),
        ViolationKind::UnnamedCallee {
            callee: "lambda expression"
        }
    );
    assert_eq!(
        violation("'abc'.upper()"),
        ViolationKind::UnnamedCallee {
            callee: "attribute access"
        }
    );
    assert_eq!(
        violation("float(1)()"),
        ViolationKind::UnnamedCallee {
            callee: "call result"
        }
    );
    assert_eq!(
        violation("fs[0]()"),
        ViolationKind::UnnamedCallee { callee: "subscript" }
    );
    assert_eq!(
        violation("(float if a else int)(1)"),
        ViolationKind::UnnamedCallee {
            callee: "conditional expression"
        }
    );
}

#[test]
fn test_rejects_statements() {
    for (source, found) in [
        ("x = 1", "assignment"),
        ("x += 1", "augmented assignment"),
        ("import os", "import"),
        ("from os import path", "import"),
        ("del x", "del statement"),
        ("def f(): pass", "function definition"),
        ("class A: pass", "class definition"),
        ("for i in x: pass", "for loop"),
        ("while 1: pass", "while loop"),
        ("if x: y", "if statement"),
        ("with x: pass", "with statement"),
        ("raise E", "raise statement"),
        ("pass", "pass statement"),
    ] {
        assert_eq!(
            violation(source),
            ViolationKind::NotSingleExpression {
                found: found.to_string()
            },
            "{source}"
        );
    }
}

#[test]
fn test_rejects_multiple_or_zero_statements() {
    assert_eq!(
        violation("1; 2"),
        ViolationKind::NotSingleExpression {
            found: "2 statements".to_string()
        }
    );
    let source = indoc! {"
        a
        b
        c
    "};
    assert_eq!(
        violation(source),
        ViolationKind::NotSingleExpression {
            found: "3 statements".to_string()
        }
    );
    assert_eq!(
        violation(""),
        ViolationKind::NotSingleExpression {
            found: "0 statements".to_string()
        }
    );
}

#[test]
fn test_first_violation_wins() {
    let err = check("a() + b()").unwrap_err();
    assert_eq!(err.kind, disallowed("a"));
    assert_eq!(err.span, Span::new(0, 1));

    // The callee is checked before its arguments.
    let err = check("outer(inner())").unwrap_err();
    assert_eq!(err.kind, disallowed("outer"));
}

#[test]
fn test_violation_span_points_at_callee() {
    let err = check("1 + evil(2)").unwrap_err();
    assert_eq!(err.span, Span::new(4, 8));
    assert_eq!(err.to_string(), "call to 'evil' not in allowed list");
}

#[test]
fn test_comprehension_may_shadow_allowed_name() {
    assert_eq!(check("[float for float in x]"), Ok(()));
    assert_eq!(check("[float(x) for float in x]"), Ok(()));
}

#[test]
fn test_extra_callables() {
    let policy = Policy::builder()
        .allow_all(["ord", "cmp"].map(|n| stdlib::by_name(n).unwrap()))
        .unwrap()
        .build();
    assert_eq!(check_with(&policy, "cmp(ord(_), 4)"), Ok(()));
    assert_eq!(check("cmp(ord(_), 4)").unwrap_err().kind, disallowed("cmp"));
}

#[test]
fn test_empty_policy_rejects_base_calls() {
    let policy = Policy::empty();
    assert_eq!(
        check_with(&policy, "float(1)").unwrap_err().kind,
        disallowed("float")
    );
    assert_eq!(check_with(&policy, "[1, 'a', None]"), Ok(()));
}

#[test]
fn test_check_is_idempotent() {
    let policy = Policy::default();
    let verifier = Verifier::new(&policy);
    for source in ["float(x)", "evil()", "x = 1"] {
        let module = parser::parse(source).unwrap();
        assert_eq!(verifier.check(&module), verifier.check(&module));
    }
}

#[test]
fn test_verbose_mode_changes_nothing() {
    crate::test_utils::init_test_logging();
    let verbose = Policy::builder().verbose(true).build();
    for source in ["float(x)", "evil()", "(lambda: 1)()"] {
        assert_eq!(check_with(&verbose, source), check(source));
    }
}
