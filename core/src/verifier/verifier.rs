use tracing::{info, trace};

use crate::parser::{Expr, ExprKind, Module, StmtKind};
use crate::verifier::{Policy, SafetyViolation, ViolationKind};

/// Walks a syntax tree and rejects anything outside the policy.
///
/// The walk is depth-first in source order and stops at the first violation.
/// It never mutates the tree, so checking the same tree twice gives the same
/// answer.
#[derive(Debug, Clone, Copy)]
pub struct Verifier<'p> {
    policy: &'p Policy,
}

impl<'p> Verifier<'p> {
    pub fn new(policy: &'p Policy) -> Self {
        Self { policy }
    }

    /// Accept `module` only if it is a single expression statement whose
    /// calls all go to allowed names.
    pub fn check(&self, module: &Module) -> Result<(), SafetyViolation> {
        self.verified_expr(module).map(|_| ())
    }

    /// Like [`check`](Self::check), returning the verified expression.
    pub fn verified_expr<'m>(&self, module: &'m Module) -> Result<&'m Expr, SafetyViolation> {
        let expr = match &module.body[..] {
            [stmt] => match &stmt.kind {
                StmtKind::Expr(expr) => expr,
                other => {
                    return Err(SafetyViolation::new(
                        ViolationKind::NotSingleExpression {
                            found: other.describe().to_string(),
                        },
                        stmt.span.clone(),
                    ));
                }
            },
            body => {
                return Err(SafetyViolation::new(
                    ViolationKind::NotSingleExpression {
                        found: format!("{} statements", body.len()),
                    },
                    module.span.clone(),
                ));
            }
        };
        self.check_expr(expr)?;
        Ok(expr)
    }

    /// Check a single expression tree.
    pub fn check_expr(&self, expr: &Expr) -> Result<(), SafetyViolation> {
        self.visit(expr, 0)
    }

    fn visit(&self, expr: &Expr, depth: usize) -> Result<(), SafetyViolation> {
        if self.policy.verbose() {
            info!(depth, node = expr.describe(), span = %expr.span, "visiting");
        } else {
            trace!(depth, node = expr.describe(), span = %expr.span, "visiting");
        }

        if let ExprKind::Call { func, .. } = &expr.kind {
            self.check_callee(func)?;
        }

        // Callee, positional and keyword arguments and spreads included.
        for child in expr.children() {
            self.visit(child, depth + 1)?;
        }
        Ok(())
    }

    fn check_callee(&self, callee: &Expr) -> Result<(), SafetyViolation> {
        let violation = |kind| Err(SafetyViolation::new(kind, callee.span.clone()));
        match callee.simple_name() {
            Some(name) if self.policy.is_allowed(name) => {
                if self.policy.verbose() {
                    info!(name, "allowed call");
                }
                Ok(())
            }
            Some(name) => violation(ViolationKind::DisallowedCall {
                name: name.to_string(),
            }),
            None => violation(ViolationKind::UnnamedCallee {
                callee: callee.describe(),
            }),
        }
    }
}

