// Tests with valid inputs for each rule in the grammar.

use crate::parser::{ExpressionParser, Rule};
use pest::Parser;
use pest::iterators::Pair;

fn contains_rule(pair: Pair<Rule>, target_rule: Rule) -> bool {
    if pair.as_rule() == target_rule {
        return true;
    }
    for inner in pair.into_inner() {
        if contains_rule(inner, target_rule) {
            return true;
        }
    }
    false
}

macro_rules! rule_examples {
    ( $($rule:ident => [$($expr:expr),* $(,)?]),* $(,)? ) => {
        $(
            #[test]
            fn $rule() {
                let inputs = vec![$($expr),*];
                for input in inputs {
                    let result = ExpressionParser::parse(Rule::main, input)
                        .unwrap_or_else(|e| panic!("Failed to parse '{}': {}", input, e));
                    let root = result.into_iter().next().unwrap();
                    assert!(
                        contains_rule(root.clone(), Rule::$rule),
                        "Expected to find rule {:?} in parse tree for input '{}'",
                        Rule::$rule,
                        input
                    );
                }
            }
        )*
    };
}

rule_examples! {
    integer => ["42", "-99", "1_000", "0b1010", "0o755", "0xDEAD_BEEF"],
    float => ["3.14", "-0.001", "2.", ".5", "6.022e23", "1.6E-19", "1_000.0"],
    strings => ["\"hello\"", "'world'", "'a' 'b'", "r'\\d+'", "\"unicode: \\u0041\""],
    raw_prefix => ["r'x'", "R\"y\""],
    true_lit => ["True"],
    false_lit => ["False"],
    none_lit => ["None"],
    ident => ["foo", "_bar123", "_", "Trueish", "format"],
    call_op => ["foo()", "foo(1)", "foo(1, 2, 3,)", "f('x')", "foo.bar(x)"],
    keyword_arg => ["f(a=1)", "f(1, key=lambda x: x)"],
    starred_arg => ["f(*args)"],
    double_starred_arg => ["f(**kwargs)"],
    positional_arg => ["f(x for x in y)", "f(a, b)"],
    attr_op => ["a.b", "a.b.c", "(1).real"],
    subscript_op => ["a[0]", "a[1][2]", "a[1, 2]"],
    slice_rest => ["a[:]", "a[1:]", "a[:2]", "a[::2]", "a[1:2:3]"],
    list_expr => ["[]", "[1]", "[1, 2, 3]", "[a, b,]", "[x for x in y]"],
    paren_expr => ["()", "(1,)", "(a)", "(x for x in y)"],
    dict_body => ["{a: 1}", "{a: 1, **b}", "{k: v for k, v in d}"],
    set_body => ["{1}", "{1, 2,}", "{x for x in y}"],
    comp_for => ["[x for x in y if x if x > 1]", "[a for b in c for a in b]"],
    target_list => ["[x for x, y in z]", "[x for (x, *y) in z]", "[a for [a] in b]"],
    lambda_expr => ["lambda: 1", "lambda x, y=2, *a, **k: x", "lambda x: lambda y: x + y"],
    conditional => ["a if b else c"],
    or_test => ["a or b"],
    and_test => ["a and b"],
    not_test => ["not a", "not not a"],
    not_in => ["a not in b"],
    in_op => ["a in b"],
    is_not => ["a is not None"],
    is_op => ["a is None"],
    pow => ["2 ** 3"],
    floordiv => ["7 // 2"],
    invert => ["~x"],
    starred => ["*a, b"],
    expr_stmt => ["a = 1", "a = b = 2", "a += 1", "a: int = 1", "f(x)"],
    assign_tail => ["x = 5"],
    aug_tail => ["x **= 2"],
    ann_tail => ["x: int"],
    import_stmt => ["import os", "import os.path as p, sys"],
    from_import_stmt => ["from os import path", "from . import x", "from a import (b, c as d)", "from a import *"],
    pass_stmt => ["pass"],
    return_stmt => ["return", "return 1, 2"],
    raise_stmt => ["raise", "raise E from e"],
    assert_stmt => ["assert x", "assert x, 'msg'"],
    global_stmt => ["global a, b"],
    del_stmt => ["del a, b[0]"],
    function_def => ["def f(x): return x", "def f(x=1) -> int: pass"],
    class_def => ["class A: pass", "class A(B, metaclass=M): pass"],
    if_stmt => ["if x: pass"],
    while_stmt => ["while x: x -= 1"],
    for_stmt => ["for i in range(3): print(i)"],
    with_stmt => ["with open(f) as h: pass"],
}
