use lazy_static::lazy_static;
use pest::Parser;
use pest::iterators::Pair;
use pest::pratt_parser::{Assoc, Op, PrattParser};
use pest_derive::Parser;

use crate::parser::ast::{
    Comprehension, Constant, DictItem, Expr, ExprKind, ImportAlias, Keyword, Module, Param,
    Parameters, Stmt, StmtKind, WithItem,
};
use crate::parser::{BinaryOp, BoolOp, CompareOp, ParseError, Span, UnaryOp};

lazy_static! {
    // Note: precedence is defined lowest to highest.
    static ref PRATT_PARSER: PrattParser<Rule> = PrattParser::new()
        // (lowest precedence)
        .op(Op::infix(Rule::bit_or, Assoc::Left))         // `|`
        .op(Op::infix(Rule::bit_xor, Assoc::Left))        // `^`
        .op(Op::infix(Rule::bit_and, Assoc::Left))        // `&`
        .op(
            Op::infix(Rule::lshift, Assoc::Left) |
            Op::infix(Rule::rshift, Assoc::Left)
        )                                                // `<<`, `>>`
        .op(
            Op::infix(Rule::add, Assoc::Left) |
            Op::infix(Rule::sub, Assoc::Left)
        )                                                // `+`, `-`
        .op(
            Op::infix(Rule::mul, Assoc::Left) |
            Op::infix(Rule::matmul, Assoc::Left) |
            Op::infix(Rule::div, Assoc::Left) |
            Op::infix(Rule::floordiv, Assoc::Left) |
            Op::infix(Rule::modulo, Assoc::Left)
        )                                                // `*`, `@`, `/`, `//`, `%`
        .op(
            Op::prefix(Rule::pos) |
            Op::prefix(Rule::neg) |
            Op::prefix(Rule::invert)
        )                                                // `+x`, `-x`, `~x`
        .op(Op::infix(Rule::pow, Assoc::Right))          // `**` (binds tighter than a unary on its left)

        // Trailers.
        .op(
            Op::postfix(Rule::call_op) |
            Op::postfix(Rule::subscript_op) |
            Op::postfix(Rule::attr_op)
        )                                                // `()`, `[]`, `.`
        // (highest precedence)
        ;
}

#[derive(Parser)]
#[grammar = "parser/expression.pest"]
pub struct ExpressionParser;

type ParseResult<T> = Result<T, ParseError>;

/// Parse source text into a module of statements.
pub fn parse(source: &str) -> ParseResult<Module> {
    let mut pairs = ExpressionParser::parse(Rule::main, source)?;
    let main = pairs
        .next()
        .ok_or_else(|| ParseError::new("missing expected pair in rule", Span::new(0, source.len())))?;
    let span = Span::from(main.as_span());
    let body = main
        .into_inner()
        .filter(|pair| pair.as_rule() != Rule::EOI)
        .map(parse_stmt)
        .collect::<ParseResult<_>>()?;
    Ok(Module { body, span })
}

fn is_keyword(rule: Rule) -> bool {
    matches!(
        rule,
        Rule::kw_and
            | Rule::kw_as
            | Rule::kw_assert
            | Rule::kw_async
            | Rule::kw_await
            | Rule::kw_break
            | Rule::kw_class
            | Rule::kw_continue
            | Rule::kw_def
            | Rule::kw_del
            | Rule::kw_elif
            | Rule::kw_else
            | Rule::kw_except
            | Rule::kw_false
            | Rule::kw_finally
            | Rule::kw_for
            | Rule::kw_from
            | Rule::kw_global
            | Rule::kw_if
            | Rule::kw_import
            | Rule::kw_in
            | Rule::kw_is
            | Rule::kw_lambda
            | Rule::kw_none
            | Rule::kw_nonlocal
            | Rule::kw_not
            | Rule::kw_or
            | Rule::kw_pass
            | Rule::kw_raise
            | Rule::kw_return
            | Rule::kw_true
            | Rule::kw_try
            | Rule::kw_while
            | Rule::kw_with
            | Rule::kw_yield
    )
}

/// Inner pairs with keyword tokens dropped.
fn significant<'i>(pair: Pair<'i, Rule>) -> impl Iterator<Item = Pair<'i, Rule>> {
    pair.into_inner().filter(|p| !is_keyword(p.as_rule()))
}

fn next_pair<'i>(
    pairs: &mut impl Iterator<Item = Pair<'i, Rule>>,
    span: pest::Span<'i>,
    what: &str,
) -> ParseResult<Pair<'i, Rule>> {
    pairs
        .next()
        .ok_or_else(|| ParseError::at(format!("missing {what}"), span))
}

fn unexpected(pair: &Pair<'_, Rule>) -> ParseError {
    ParseError::at(format!("Unhandled rule: {:?}", pair.as_rule()), pair.as_span())
}

// ============================================================================
// Statements
// ============================================================================

fn parse_stmt(pair: Pair<'_, Rule>) -> ParseResult<Stmt> {
    let pest_span = pair.as_span();
    let kind = match pair.as_rule() {
        Rule::expr_stmt => parse_expr_stmt(pair)?,
        Rule::import_stmt => StmtKind::Import(
            significant(pair)
                .map(parse_import_alias)
                .collect::<ParseResult<_>>()?,
        ),
        Rule::from_import_stmt => {
            let mut inner = significant(pair);
            let module = next_pair(&mut inner, pest_span, "module name")?
                .as_str()
                .to_string();
            let names = inner.map(parse_import_alias).collect::<ParseResult<_>>()?;
            StmtKind::ImportFrom { module, names }
        }
        Rule::pass_stmt => StmtKind::Pass,
        Rule::break_stmt => StmtKind::Break,
        Rule::continue_stmt => StmtKind::Continue,
        Rule::return_stmt => StmtKind::Return(
            significant(pair)
                .next()
                .map(parse_star_expressions)
                .transpose()?,
        ),
        Rule::raise_stmt => {
            let mut inner = significant(pair);
            let exc = inner.next().map(parse_expr).transpose()?;
            let cause = inner.next().map(parse_expr).transpose()?;
            StmtKind::Raise { exc, cause }
        }
        Rule::assert_stmt => {
            let mut inner = significant(pair);
            let test = parse_expr(next_pair(&mut inner, pest_span, "assertion")?)?;
            let msg = inner.next().map(parse_expr).transpose()?;
            StmtKind::Assert { test, msg }
        }
        Rule::global_stmt => {
            StmtKind::Global(significant(pair).map(|p| p.as_str().to_string()).collect())
        }
        Rule::nonlocal_stmt => {
            StmtKind::Nonlocal(significant(pair).map(|p| p.as_str().to_string()).collect())
        }
        Rule::del_stmt => {
            let targets = parse_star_expressions(next_pair(
                &mut significant(pair),
                pest_span,
                "del target",
            )?)?;
            match targets.kind {
                ExprKind::Tuple(items) => StmtKind::Delete(items),
                _ => StmtKind::Delete(vec![targets]),
            }
        }
        Rule::function_def => {
            let mut name = String::new();
            let mut params = Parameters::default();
            let mut returns = None;
            let mut body = Vec::new();
            for part in significant(pair) {
                match part.as_rule() {
                    Rule::ident => name = part.as_str().to_string(),
                    Rule::param_list => params = parse_params(part)?,
                    Rule::expression => returns = Some(parse_expr(part)?),
                    Rule::suite => body = parse_suite(part)?,
                    _ => return Err(unexpected(&part)),
                }
            }
            StmtKind::FunctionDef {
                name,
                params,
                returns,
                body,
            }
        }
        Rule::class_def => {
            let mut name = String::new();
            let mut arg_pairs = Vec::new();
            let mut body = Vec::new();
            for part in significant(pair) {
                match part.as_rule() {
                    Rule::ident => name = part.as_str().to_string(),
                    Rule::suite => body = parse_suite(part)?,
                    _ => arg_pairs.push(part),
                }
            }
            let (args, keywords) = parse_call_args(arg_pairs)?;
            StmtKind::ClassDef {
                name,
                args,
                keywords,
                body,
            }
        }
        Rule::if_stmt | Rule::while_stmt => {
            let is_if = pair.as_rule() == Rule::if_stmt;
            let mut inner = significant(pair);
            let test = parse_expr(next_pair(&mut inner, pest_span, "condition")?)?;
            let body = parse_suite(next_pair(&mut inner, pest_span, "body")?)?;
            if is_if {
                StmtKind::If { test, body }
            } else {
                StmtKind::While { test, body }
            }
        }
        Rule::for_stmt => {
            let mut inner = significant(pair);
            let target = parse_target_list(next_pair(&mut inner, pest_span, "loop target")?)?;
            let iter = parse_star_expressions(next_pair(&mut inner, pest_span, "iterable")?)?;
            let body = parse_suite(next_pair(&mut inner, pest_span, "body")?)?;
            StmtKind::For { target, iter, body }
        }
        Rule::with_stmt => {
            let mut items = Vec::new();
            let mut body = Vec::new();
            for part in significant(pair) {
                match part.as_rule() {
                    Rule::with_item => {
                        let item_span = part.as_span();
                        let mut inner = significant(part);
                        let context =
                            parse_expr(next_pair(&mut inner, item_span, "context manager")?)?;
                        let target = inner.next().map(parse_target).transpose()?;
                        items.push(WithItem { context, target });
                    }
                    Rule::suite => body = parse_suite(part)?,
                    _ => return Err(unexpected(&part)),
                }
            }
            StmtKind::With { items, body }
        }
        _ => return Err(unexpected(&pair)),
    };
    Ok(Stmt {
        kind,
        span: Span::from(pest_span),
    })
}

fn parse_suite(pair: Pair<'_, Rule>) -> ParseResult<Vec<Stmt>> {
    pair.into_inner().map(parse_stmt).collect()
}

fn parse_expr_stmt(pair: Pair<'_, Rule>) -> ParseResult<StmtKind> {
    let pest_span = pair.as_span();
    let mut inner = pair.into_inner();
    let first = parse_star_expressions(next_pair(&mut inner, pest_span, "expression")?)?;

    let Some(tail) = inner.next() else {
        return Ok(StmtKind::Expr(first));
    };

    match tail.as_rule() {
        Rule::ann_tail => {
            let tail_span = tail.as_span();
            let mut parts = tail.into_inner();
            let annotation = parse_expr(next_pair(&mut parts, tail_span, "annotation")?)?;
            let value = parts.next().map(parse_assign_tail).transpose()?;
            Ok(StmtKind::AnnAssign {
                target: first,
                annotation,
                value,
            })
        }
        Rule::aug_tail => {
            let tail_span = tail.as_span();
            let mut parts = tail.into_inner();
            let op_pair = next_pair(&mut parts, tail_span, "operator")?;
            let op = aug_assign_op(op_pair.as_str()).ok_or_else(|| unexpected(&op_pair))?;
            let value = parse_star_expressions(next_pair(&mut parts, tail_span, "value")?)?;
            Ok(StmtKind::AugAssign {
                target: first,
                op,
                value,
            })
        }
        Rule::assign_tail => {
            let mut targets = vec![first];
            let mut value = parse_assign_tail(tail)?;
            for next in inner {
                targets.push(value);
                value = parse_assign_tail(next)?;
            }
            Ok(StmtKind::Assign { targets, value })
        }
        _ => Err(unexpected(&tail)),
    }
}

fn parse_assign_tail(pair: Pair<'_, Rule>) -> ParseResult<Expr> {
    let pest_span = pair.as_span();
    parse_star_expressions(next_pair(&mut pair.into_inner(), pest_span, "value")?)
}

fn aug_assign_op(symbol: &str) -> Option<BinaryOp> {
    let op = match symbol.strip_suffix('=')? {
        "+" => BinaryOp::Add,
        "-" => BinaryOp::Sub,
        "*" => BinaryOp::Mul,
        "@" => BinaryOp::MatMul,
        "/" => BinaryOp::Div,
        "//" => BinaryOp::FloorDiv,
        "%" => BinaryOp::Mod,
        "**" => BinaryOp::Pow,
        "<<" => BinaryOp::LShift,
        ">>" => BinaryOp::RShift,
        "|" => BinaryOp::BitOr,
        "^" => BinaryOp::BitXor,
        "&" => BinaryOp::BitAnd,
        _ => return None,
    };
    Some(op)
}

fn parse_import_alias(pair: Pair<'_, Rule>) -> ParseResult<ImportAlias> {
    let pest_span = pair.as_span();
    if pair.as_rule() == Rule::import_star {
        return Ok(ImportAlias {
            name: "*".to_string(),
            asname: None,
        });
    }
    let mut inner = significant(pair);
    let name = next_pair(&mut inner, pest_span, "import name")?
        .as_str()
        .to_string();
    let asname = inner.next().map(|p| p.as_str().to_string());
    Ok(ImportAlias { name, asname })
}

// ============================================================================
// Expressions
// ============================================================================

/// A comma-separated list of (possibly starred) expressions; more than one
/// item or a trailing comma makes a tuple.
fn parse_star_expressions(pair: Pair<'_, Rule>) -> ParseResult<Expr> {
    let span = Span::from(pair.as_span());
    let (mut items, trailing) = parse_items(pair)?;
    if items.len() == 1 && !trailing {
        if let Some(item) = items.pop() {
            return Ok(item);
        }
    }
    Ok(Expr::new(ExprKind::Tuple(items), span))
}

fn parse_items(pair: Pair<'_, Rule>) -> ParseResult<(Vec<Expr>, bool)> {
    let mut items = Vec::new();
    let mut trailing = false;
    for item in pair.into_inner() {
        match item.as_rule() {
            Rule::trailing_comma => trailing = true,
            _ => items.push(parse_expr(item)?),
        }
    }
    Ok((items, trailing))
}

pub(crate) fn parse_expr(pair: Pair<'_, Rule>) -> ParseResult<Expr> {
    let pest_span = pair.as_span();
    let span = Span::from(pest_span);
    match pair.as_rule() {
        Rule::expression => parse_expr(next_pair(&mut pair.into_inner(), pest_span, "expression")?),

        Rule::lambda_expr => {
            let mut params = Parameters::default();
            let mut body = None;
            for part in significant(pair) {
                match part.as_rule() {
                    Rule::param_list => params = parse_params(part)?,
                    _ => body = Some(parse_expr(part)?),
                }
            }
            let body = body.ok_or_else(|| ParseError::at("missing lambda body", pest_span))?;
            Ok(Expr::new(
                ExprKind::Lambda {
                    params,
                    body: Box::new(body),
                },
                span,
            ))
        }

        Rule::conditional => {
            let mut inner = significant(pair);
            let body = parse_expr(next_pair(&mut inner, pest_span, "expression")?)?;
            let Some(test) = inner.next() else {
                return Ok(body);
            };
            let test = parse_expr(test)?;
            let orelse = parse_expr(next_pair(&mut inner, pest_span, "else branch")?)?;
            Ok(Expr::new(
                ExprKind::IfExp {
                    test: Box::new(test),
                    body: Box::new(body),
                    orelse: Box::new(orelse),
                },
                span,
            ))
        }

        Rule::or_test | Rule::and_test => {
            let op = if pair.as_rule() == Rule::or_test {
                BoolOp::Or
            } else {
                BoolOp::And
            };
            let mut operands = significant(pair).map(parse_expr);
            let mut result = operands
                .next()
                .ok_or_else(|| ParseError::at("missing operand", pest_span))??;
            for right in operands {
                let right = right?;
                let span = Span::combine(&result.span, &right.span);
                result = Expr::new(
                    ExprKind::BoolOp {
                        op,
                        left: Box::new(result),
                        right: Box::new(right),
                    },
                    span,
                );
            }
            Ok(result)
        }

        Rule::not_test => {
            let mut inner = pair.into_inner();
            let first = next_pair(&mut inner, pest_span, "operand")?;
            if first.as_rule() != Rule::kw_not {
                return parse_expr(first);
            }
            let operand = parse_expr(next_pair(&mut inner, pest_span, "operand")?)?;
            Ok(Expr::new(
                ExprKind::UnaryOp {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                },
                span,
            ))
        }

        Rule::comparison => {
            let mut inner = pair.into_inner();
            let left = parse_expr(next_pair(&mut inner, pest_span, "operand")?)?;
            let mut ops = Vec::new();
            let mut comparators = Vec::new();
            while let Some(op) = inner.next() {
                ops.push(compare_op(&op)?);
                comparators.push(parse_expr(next_pair(&mut inner, pest_span, "operand")?)?);
            }
            if ops.is_empty() {
                return Ok(left);
            }
            Ok(Expr::new(
                ExprKind::Compare {
                    left: Box::new(left),
                    ops,
                    comparators,
                },
                span,
            ))
        }

        Rule::arith => parse_arith(pair),

        Rule::starred => {
            let value = parse_expr(next_pair(&mut pair.into_inner(), pest_span, "operand")?)?;
            Ok(Expr::new(ExprKind::Starred(Box::new(value)), span))
        }

        _ => parse_primary(pair),
    }
}

fn compare_op(pair: &Pair<'_, Rule>) -> ParseResult<CompareOp> {
    let op = match pair.as_rule() {
        Rule::eq => CompareOp::Eq,
        Rule::not_eq => CompareOp::NotEq,
        Rule::lt => CompareOp::Lt,
        Rule::lt_e => CompareOp::LtE,
        Rule::gt => CompareOp::Gt,
        Rule::gt_e => CompareOp::GtE,
        Rule::in_op => CompareOp::In,
        Rule::not_in => CompareOp::NotIn,
        Rule::is_op => CompareOp::Is,
        Rule::is_not => CompareOp::IsNot,
        _ => return Err(unexpected(pair)),
    };
    Ok(op)
}

fn binary_op(rule: Rule) -> Option<BinaryOp> {
    let op = match rule {
        Rule::add => BinaryOp::Add,
        Rule::sub => BinaryOp::Sub,
        Rule::mul => BinaryOp::Mul,
        Rule::matmul => BinaryOp::MatMul,
        Rule::div => BinaryOp::Div,
        Rule::floordiv => BinaryOp::FloorDiv,
        Rule::modulo => BinaryOp::Mod,
        Rule::pow => BinaryOp::Pow,
        Rule::lshift => BinaryOp::LShift,
        Rule::rshift => BinaryOp::RShift,
        Rule::bit_or => BinaryOp::BitOr,
        Rule::bit_xor => BinaryOp::BitXor,
        Rule::bit_and => BinaryOp::BitAnd,
        _ => return None,
    };
    Some(op)
}

fn parse_arith(pair: Pair<'_, Rule>) -> ParseResult<Expr> {
    PRATT_PARSER
        .map_primary(parse_primary)
        .map_prefix(|op, rhs| {
            let rhs = rhs?;
            let unary = match op.as_rule() {
                Rule::pos => UnaryOp::Pos,
                Rule::neg => UnaryOp::Neg,
                Rule::invert => UnaryOp::Invert,
                _ => return Err(unexpected(&op)),
            };
            let span = Span::new(op.as_span().start(), rhs.span.0.end);
            Ok(Expr::new(
                ExprKind::UnaryOp {
                    op: unary,
                    operand: Box::new(rhs),
                },
                span,
            ))
        })
        .map_infix(|lhs, op, rhs| {
            let (lhs, rhs) = (lhs?, rhs?);
            let binary = binary_op(op.as_rule()).ok_or_else(|| unexpected(&op))?;
            let span = Span::combine(&lhs.span, &rhs.span);
            Ok(Expr::new(
                ExprKind::BinOp {
                    op: binary,
                    left: Box::new(lhs),
                    right: Box::new(rhs),
                },
                span,
            ))
        })
        .map_postfix(|lhs, op| {
            let lhs = lhs?;
            let span = Span::new(lhs.span.0.start, op.as_span().end());
            let op_span = op.as_span();
            match op.as_rule() {
                Rule::call_op => {
                    let (args, keywords) = parse_call_args(op.into_inner())?;
                    Ok(Expr::new(
                        ExprKind::Call {
                            func: Box::new(lhs),
                            args,
                            keywords,
                        },
                        span,
                    ))
                }
                Rule::subscript_op => {
                    let index_span = Span::new(op_span.start() + 1, op_span.end() - 1);
                    let mut items = Vec::new();
                    let mut trailing = false;
                    for item in op.into_inner() {
                        match item.as_rule() {
                            Rule::trailing_comma => trailing = true,
                            _ => items.push(parse_subscript_item(item)?),
                        }
                    }
                    let index = match items.pop() {
                        Some(item) if items.is_empty() && !trailing => item,
                        Some(item) => {
                            items.push(item);
                            Expr::new(ExprKind::Tuple(items), index_span)
                        }
                        None => return Err(ParseError::at("missing subscript", op_span)),
                    };
                    Ok(Expr::new(
                        ExprKind::Subscript {
                            value: Box::new(lhs),
                            index: Box::new(index),
                        },
                        span,
                    ))
                }
                Rule::attr_op => {
                    let attr = next_pair(&mut op.into_inner(), op_span, "attribute name")?
                        .as_str()
                        .to_string();
                    Ok(Expr::new(
                        ExprKind::Attribute {
                            value: Box::new(lhs),
                            attr,
                        },
                        span,
                    ))
                }
                _ => Err(unexpected(&op)),
            }
        })
        .parse(pair.into_inner())
}

fn parse_call_args<'i>(
    pairs: impl IntoIterator<Item = Pair<'i, Rule>>,
) -> ParseResult<(Vec<Expr>, Vec<Keyword>)> {
    let mut args = Vec::new();
    let mut keywords = Vec::new();
    for arg in pairs {
        let pest_span = arg.as_span();
        let span = Span::from(pest_span);
        match arg.as_rule() {
            Rule::positional_arg => {
                let mut inner = arg.into_inner();
                let value = parse_expr(next_pair(&mut inner, pest_span, "argument")?)?;
                let generators = inner.map(parse_comp_for).collect::<ParseResult<Vec<_>>>()?;
                if generators.is_empty() {
                    args.push(value);
                } else {
                    args.push(Expr::new(
                        ExprKind::GeneratorExp {
                            element: Box::new(value),
                            generators,
                        },
                        span,
                    ));
                }
            }
            Rule::starred_arg => {
                let value = parse_expr(next_pair(&mut arg.into_inner(), pest_span, "argument")?)?;
                args.push(Expr::new(ExprKind::Starred(Box::new(value)), span));
            }
            Rule::keyword_arg => {
                let mut inner = arg.into_inner();
                let name = next_pair(&mut inner, pest_span, "keyword")?
                    .as_str()
                    .to_string();
                let value = parse_expr(next_pair(&mut inner, pest_span, "argument")?)?;
                keywords.push(Keyword {
                    arg: Some(name),
                    value,
                    span,
                });
            }
            Rule::double_starred_arg => {
                let value = parse_expr(next_pair(&mut arg.into_inner(), pest_span, "argument")?)?;
                keywords.push(Keyword {
                    arg: None,
                    value,
                    span,
                });
            }
            _ => return Err(unexpected(&arg)),
        }
    }
    Ok((args, keywords))
}

fn parse_subscript_item(pair: Pair<'_, Rule>) -> ParseResult<Expr> {
    let pest_span = pair.as_span();
    let span = Span::from(pest_span);
    let mut lower = None;
    let mut rest = None;
    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::slice_lower => lower = Some(part),
            Rule::slice_rest => rest = Some(part),
            _ => return Err(unexpected(&part)),
        }
    }
    let lower = lower.map(parse_slice_bound).transpose()?;
    let Some(rest) = rest else {
        return lower.ok_or_else(|| ParseError::at("missing subscript", pest_span));
    };
    let mut upper = None;
    let mut step = None;
    for part in rest.into_inner() {
        match part.as_rule() {
            Rule::slice_upper => upper = Some(parse_slice_bound(part)?),
            Rule::slice_step => step = Some(parse_slice_bound(part)?),
            _ => return Err(unexpected(&part)),
        }
    }
    Ok(Expr::new(
        ExprKind::Slice {
            lower: lower.map(Box::new),
            upper: upper.map(Box::new),
            step: step.map(Box::new),
        },
        span,
    ))
}

fn parse_slice_bound(pair: Pair<'_, Rule>) -> ParseResult<Expr> {
    let pest_span = pair.as_span();
    parse_expr(next_pair(&mut pair.into_inner(), pest_span, "slice bound")?)
}

fn parse_params(pair: Pair<'_, Rule>) -> ParseResult<Parameters> {
    let mut params = Parameters::default();
    let mut seen: Vec<String> = Vec::new();
    for part in pair.into_inner() {
        let pest_span = part.as_span();
        let rule = part.as_rule();
        let mut inner = part.into_inner();
        let name = next_pair(&mut inner, pest_span, "parameter name")?
            .as_str()
            .to_string();
        if seen.contains(&name) {
            return Err(ParseError::at(
                format!("duplicate argument '{name}' in function definition"),
                pest_span,
            ));
        }
        seen.push(name.clone());
        match rule {
            Rule::param => {
                let default = inner.next().map(parse_expr).transpose()?;
                params.params.push(Param { name, default });
            }
            Rule::varargs_param => params.varargs = Some(name),
            Rule::kwargs_param => params.kwargs = Some(name),
            _ => return Err(ParseError::at(format!("Unhandled rule: {rule:?}"), pest_span)),
        }
    }
    Ok(params)
}

fn parse_comp_for(pair: Pair<'_, Rule>) -> ParseResult<Comprehension> {
    let pest_span = pair.as_span();
    let mut inner = significant(pair);
    let target = parse_target_list(next_pair(&mut inner, pest_span, "comprehension target")?)?;
    let iter = parse_expr(next_pair(&mut inner, pest_span, "comprehension iterable")?)?;
    let ifs = inner
        .map(|cond| {
            let cond_span = cond.as_span();
            parse_expr(next_pair(&mut significant(cond), cond_span, "condition")?)
        })
        .collect::<ParseResult<_>>()?;
    Ok(Comprehension { target, iter, ifs })
}

fn parse_target_list(pair: Pair<'_, Rule>) -> ParseResult<Expr> {
    let span = Span::from(pair.as_span());
    let mut items = Vec::new();
    let mut trailing = false;
    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::trailing_comma => trailing = true,
            _ => items.push(parse_target(part)?),
        }
    }
    if items.len() == 1 && !trailing {
        if let Some(item) = items.pop() {
            return Ok(item);
        }
    }
    Ok(Expr::new(ExprKind::Tuple(items), span))
}

fn parse_target(pair: Pair<'_, Rule>) -> ParseResult<Expr> {
    let pest_span = pair.as_span();
    let span = Span::from(pest_span);
    match pair.as_rule() {
        Rule::target_name => Ok(Expr::new(ExprKind::Name(pair.as_str().to_string()), span)),
        Rule::starred_target => {
            let inner = parse_target(next_pair(&mut pair.into_inner(), pest_span, "target")?)?;
            Ok(Expr::new(ExprKind::Starred(Box::new(inner)), span))
        }
        Rule::paren_target => {
            parse_target_list(next_pair(&mut pair.into_inner(), pest_span, "target")?)
        }
        Rule::list_target => {
            let list = parse_target_list(next_pair(&mut pair.into_inner(), pest_span, "target")?)?;
            let items = match list.kind {
                ExprKind::Tuple(items) => items,
                _ => vec![list],
            };
            Ok(Expr::new(ExprKind::List(items), span))
        }
        _ => Err(unexpected(&pair)),
    }
}

// ============================================================================
// Atoms
// ============================================================================

fn parse_primary(pair: Pair<'_, Rule>) -> ParseResult<Expr> {
    let pest_span = pair.as_span();
    let span = Span::from(pest_span);
    match pair.as_rule() {
        Rule::ident => Ok(Expr::new(ExprKind::Name(pair.as_str().to_string()), span)),

        Rule::integer => {
            let value = parse_int_literal(pair.as_str())
                .ok_or_else(|| ParseError::at("invalid integer literal", pest_span))?;
            Ok(Expr::new(ExprKind::Constant(Constant::Int(value)), span))
        }

        Rule::float => {
            let value = pair
                .as_str()
                .replace('_', "")
                .parse::<f64>()
                .map_err(|_| ParseError::at("invalid float literal", pest_span))?;
            Ok(Expr::new(ExprKind::Constant(Constant::Float(value)), span))
        }

        Rule::true_lit => Ok(Expr::new(ExprKind::Constant(Constant::Bool(true)), span)),
        Rule::false_lit => Ok(Expr::new(ExprKind::Constant(Constant::Bool(false)), span)),
        Rule::none_lit => Ok(Expr::new(ExprKind::Constant(Constant::None), span)),

        Rule::strings => {
            let mut value = String::new();
            for string in pair.into_inner() {
                value.push_str(&parse_string(string)?);
            }
            Ok(Expr::new(ExprKind::Constant(Constant::Str(value)), span))
        }

        Rule::paren_expr => {
            let (mut items, generators, trailing) = parse_display(pair)?;
            if !generators.is_empty() {
                let element = items
                    .pop()
                    .ok_or_else(|| ParseError::at("missing generator element", pest_span))?;
                return Ok(Expr::new(
                    ExprKind::GeneratorExp {
                        element: Box::new(element),
                        generators,
                    },
                    span,
                ));
            }
            let is_group = items.len() == 1
                && !trailing
                && !matches!(items[0].kind, ExprKind::Starred(_));
            match items.pop() {
                Some(item) if is_group => Ok(item),
                Some(item) => {
                    items.push(item);
                    Ok(Expr::new(ExprKind::Tuple(items), span))
                }
                None => Ok(Expr::new(ExprKind::Tuple(Vec::new()), span)),
            }
        }

        Rule::list_expr => {
            let (mut items, generators, _) = parse_display(pair)?;
            if generators.is_empty() {
                return Ok(Expr::new(ExprKind::List(items), span));
            }
            let element = items
                .pop()
                .ok_or_else(|| ParseError::at("missing comprehension element", pest_span))?;
            Ok(Expr::new(
                ExprKind::ListComp {
                    element: Box::new(element),
                    generators,
                },
                span,
            ))
        }

        Rule::brace_expr => match pair.into_inner().next() {
            None => Ok(Expr::new(ExprKind::Dict(Vec::new()), span)),
            Some(body) if body.as_rule() == Rule::dict_body => parse_dict_body(body, span),
            Some(body) => {
                let (mut items, generators, _) = parse_display(body)?;
                if generators.is_empty() {
                    return Ok(Expr::new(ExprKind::Set(items), span));
                }
                let element = items
                    .pop()
                    .ok_or_else(|| ParseError::at("missing comprehension element", pest_span))?;
                Ok(Expr::new(
                    ExprKind::SetComp {
                        element: Box::new(element),
                        generators,
                    },
                    span,
                ))
            }
        },

        _ => Err(unexpected(&pair)),
    }
}

/// Items, comprehension clauses and trailing-comma flag of a bracketed display.
fn parse_display(pair: Pair<'_, Rule>) -> ParseResult<(Vec<Expr>, Vec<Comprehension>, bool)> {
    let mut items = Vec::new();
    let mut generators = Vec::new();
    let mut trailing = false;
    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::comp_for => generators.push(parse_comp_for(part)?),
            Rule::trailing_comma => trailing = true,
            _ => items.push(parse_expr(part)?),
        }
    }
    Ok((items, generators, trailing))
}

fn parse_dict_body(pair: Pair<'_, Rule>, span: Span) -> ParseResult<Expr> {
    let pest_span = pair.as_span();
    let mut items = Vec::new();
    let mut generators = Vec::new();
    for part in pair.into_inner() {
        let part_span = part.as_span();
        match part.as_rule() {
            Rule::dict_pair => {
                let mut inner = part.into_inner();
                let key = parse_expr(next_pair(&mut inner, part_span, "key")?)?;
                let value = parse_expr(next_pair(&mut inner, part_span, "value")?)?;
                items.push(DictItem::Pair { key, value });
            }
            Rule::dict_spread => {
                let value = parse_expr(next_pair(&mut part.into_inner(), part_span, "mapping")?)?;
                items.push(DictItem::Spread(value));
            }
            Rule::comp_for => generators.push(parse_comp_for(part)?),
            _ => return Err(unexpected(&part)),
        }
    }
    if generators.is_empty() {
        return Ok(Expr::new(ExprKind::Dict(items), span));
    }
    match items.pop() {
        Some(DictItem::Pair { key, value }) => Ok(Expr::new(
            ExprKind::DictComp {
                key: Box::new(key),
                value: Box::new(value),
                generators,
            },
            span,
        )),
        _ => Err(ParseError::at(
            "dict unpacking cannot be used in dict comprehension",
            pest_span,
        )),
    }
}

fn parse_int_literal(text: &str) -> Option<i64> {
    let digits = text.replace('_', "");
    let (radix, body) = match digits.get(..2) {
        Some("0x" | "0X") => (16, &digits[2..]),
        Some("0o" | "0O") => (8, &digits[2..]),
        Some("0b" | "0B") => (2, &digits[2..]),
        _ => (10, digits.as_str()),
    };
    i64::from_str_radix(body, radix).ok()
}

fn parse_string(pair: Pair<'_, Rule>) -> ParseResult<String> {
    let pest_span = pair.as_span();
    let mut raw = false;
    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::raw_prefix => raw = true,
            Rule::dq_body | Rule::sq_body => {
                if raw {
                    return Ok(part.as_str().to_string());
                }
                return unescape(part.as_str())
                    .ok_or_else(|| ParseError::at("invalid escape sequence", part.as_span()));
            }
            _ => return Err(unexpected(&part)),
        }
    }
    Err(ParseError::at("missing string body", pest_span))
}

fn unescape(body: &str) -> Option<String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\n') => {}
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('a') => out.push('\x07'),
            Some('b') => out.push('\x08'),
            Some('f') => out.push('\x0c'),
            Some('v') => out.push('\x0b'),
            Some('x') => out.push(hex_escape(&mut chars, 2)?),
            Some('u') => out.push(hex_escape(&mut chars, 4)?),
            Some('U') => out.push(hex_escape(&mut chars, 8)?),
            // Unknown escapes are kept verbatim.
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    Some(out)
}

fn hex_escape(chars: &mut core::str::Chars<'_>, len: usize) -> Option<char> {
    let digits: String = chars.by_ref().take(len).collect();
    if digits.len() != len {
        return None;
    }
    u32::from_str_radix(&digits, 16)
        .ok()
        .and_then(char::from_u32)
}
