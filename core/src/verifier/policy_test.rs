use pretty_assertions::assert_eq;

use crate::stdlib;
use crate::values::{NativeFunction, Value};
use crate::verifier::{Policy, PolicyBuilder, PolicyError};

fn noop(name: &str) -> NativeFunction {
    NativeFunction::new(name, |_, _| Ok(Value::None))
}

#[test]
fn test_default_policy_is_base_set() {
    assert_eq!(Policy::default().names(), vec!["float", "int", "str"]);
}

#[test]
fn test_empty_policy_has_no_callables() {
    assert!(Policy::empty().names().is_empty());
    assert!(!Policy::empty().is_allowed("float"));
}

#[test]
fn test_allow_extends_base_set() {
    let policy = Policy::builder().allow(noop("lookup")).unwrap().build();
    assert_eq!(policy.names(), vec!["float", "int", "lookup", "str"]);
    assert!(policy.get("lookup").is_some());
}

#[test]
fn test_duplicate_name_is_rejected() {
    let err = Policy::builder()
        .allow(noop("f"))
        .unwrap()
        .allow(noop("f"))
        .unwrap_err();
    assert_eq!(err, PolicyError::DuplicateCallable { name: "f".to_string() });
}

#[test]
fn test_base_names_cannot_be_registered_again() {
    let err = Policy::builder().allow(noop("float")).unwrap_err();
    assert_eq!(
        err,
        PolicyError::DuplicateCallable {
            name: "float".to_string()
        }
    );
    // Without the base set the name is free.
    assert!(PolicyBuilder::empty().allow(noop("float")).is_ok());
}

#[test]
fn test_argument_name_is_reserved() {
    let err = Policy::builder().allow(noop("_")).unwrap_err();
    assert_eq!(err, PolicyError::ReservedName { name: "_".to_string() });
    assert_eq!(
        err.to_string(),
        "'_' is reserved for the expression argument"
    );
}

#[test]
fn test_invalid_identifier_is_rejected() {
    for name in ["", "1abc", "a-b", "a.b"] {
        assert_eq!(
            Policy::builder().allow(noop(name)).unwrap_err(),
            PolicyError::InvalidName {
                name: name.to_string()
            }
        );
    }
}

#[test]
fn test_built_policy_does_not_alias_builder() {
    let builder = Policy::builder().allow(noop("a")).unwrap();
    let first = builder.clone().build();
    let second = builder.allow(noop("b")).unwrap().build();
    assert!(!first.is_allowed("b"));
    assert!(second.is_allowed("b"));
}

#[test]
fn test_allow_all_stops_at_first_error() {
    let err = Policy::builder()
        .allow_all([stdlib::by_name("ord").unwrap(), stdlib::by_name("ord").unwrap()])
        .unwrap_err();
    assert_eq!(err, PolicyError::DuplicateCallable { name: "ord".to_string() });
}

#[test]
fn test_verbose_flag() {
    assert!(!Policy::default().verbose());
    assert!(Policy::builder().verbose(true).build().verbose());
}
