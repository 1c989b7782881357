//! Syntax tree for the host expression language.
//!
//! The tree is a closed set of node kinds. The verifier only cares about
//! two things: whether an expression is a plain name ([`Expr::simple_name`])
//! and which expressions sit directly beneath it ([`Expr::children`]).

use smallvec::SmallVec;

use super::{BinaryOp, BoolOp, CompareOp, Span, UnaryOp};

/// A parsed source text: zero or more statements.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Expr(Expr),
    Assign {
        targets: Vec<Expr>,
        value: Expr,
    },
    AugAssign {
        target: Expr,
        op: BinaryOp,
        value: Expr,
    },
    AnnAssign {
        target: Expr,
        annotation: Expr,
        value: Option<Expr>,
    },
    Delete(Vec<Expr>),
    Import(Vec<ImportAlias>),
    ImportFrom {
        module: String,
        names: Vec<ImportAlias>,
    },
    Pass,
    Break,
    Continue,
    Return(Option<Expr>),
    Raise {
        exc: Option<Expr>,
        cause: Option<Expr>,
    },
    Assert {
        test: Expr,
        msg: Option<Expr>,
    },
    Global(Vec<String>),
    Nonlocal(Vec<String>),
    FunctionDef {
        name: String,
        params: Parameters,
        returns: Option<Expr>,
        body: Vec<Stmt>,
    },
    ClassDef {
        name: String,
        args: Vec<Expr>,
        keywords: Vec<Keyword>,
        body: Vec<Stmt>,
    },
    For {
        target: Expr,
        iter: Expr,
        body: Vec<Stmt>,
    },
    While {
        test: Expr,
        body: Vec<Stmt>,
    },
    If {
        test: Expr,
        body: Vec<Stmt>,
    },
    With {
        items: Vec<WithItem>,
        body: Vec<Stmt>,
    },
}

impl StmtKind {
    /// Human-readable name of the statement kind, used in diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            StmtKind::Expr(_) => "expression",
            StmtKind::Assign { .. } => "assignment",
            StmtKind::AugAssign { .. } => "augmented assignment",
            StmtKind::AnnAssign { .. } => "annotated assignment",
            StmtKind::Delete(_) => "del statement",
            StmtKind::Import(_) | StmtKind::ImportFrom { .. } => "import",
            StmtKind::Pass => "pass statement",
            StmtKind::Break => "break statement",
            StmtKind::Continue => "continue statement",
            StmtKind::Return(_) => "return statement",
            StmtKind::Raise { .. } => "raise statement",
            StmtKind::Assert { .. } => "assert statement",
            StmtKind::Global(_) => "global declaration",
            StmtKind::Nonlocal(_) => "nonlocal declaration",
            StmtKind::FunctionDef { .. } => "function definition",
            StmtKind::ClassDef { .. } => "class definition",
            StmtKind::For { .. } => "for loop",
            StmtKind::While { .. } => "while loop",
            StmtKind::If { .. } => "if statement",
            StmtKind::With { .. } => "with statement",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportAlias {
    pub name: String,
    pub asname: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WithItem {
    pub context: Expr,
    pub target: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Name(String),
    Constant(Constant),
    BoolOp {
        op: BoolOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    BinOp {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// Chained comparison: `left ops[0] comparators[0] ops[1] comparators[1] ...`
    Compare {
        left: Box<Expr>,
        ops: Vec<CompareOp>,
        comparators: Vec<Expr>,
    },
    /// `body if test else orelse`
    IfExp {
        test: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
    },
    Lambda {
        params: Parameters,
        body: Box<Expr>,
    },
    /// Positional arguments may contain `Starred` spreads; a keyword
    /// without a name is a `**mapping` spread.
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
        keywords: Vec<Keyword>,
    },
    Attribute {
        value: Box<Expr>,
        attr: String,
    },
    Subscript {
        value: Box<Expr>,
        index: Box<Expr>,
    },
    Slice {
        lower: Option<Box<Expr>>,
        upper: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
    },
    Starred(Box<Expr>),
    List(Vec<Expr>),
    Tuple(Vec<Expr>),
    Set(Vec<Expr>),
    Dict(Vec<DictItem>),
    ListComp {
        element: Box<Expr>,
        generators: Vec<Comprehension>,
    },
    SetComp {
        element: Box<Expr>,
        generators: Vec<Comprehension>,
    },
    GeneratorExp {
        element: Box<Expr>,
        generators: Vec<Comprehension>,
    },
    DictComp {
        key: Box<Expr>,
        value: Box<Expr>,
        generators: Vec<Comprehension>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    /// `None` for a `**mapping` spread.
    pub arg: Option<String>,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DictItem {
    Pair { key: Expr, value: Expr },
    Spread(Expr),
}

/// One `for target in iter if cond...` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Comprehension {
    pub target: Expr,
    pub iter: Expr,
    pub ifs: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Parameters {
    pub params: Vec<Param>,
    pub varargs: Option<String>,
    pub kwargs: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub default: Option<Expr>,
}

pub type Children<'a> = SmallVec<[&'a Expr; 4]>;

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// The identifier this expression refers to, if it is a plain name.
    ///
    /// Every other node kind has no simple name; a call through such a node
    /// can never match an allowed callable.
    pub fn simple_name(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Name(name) => Some(name),
            _ => None,
        }
    }

    /// Short description of the node kind, used in diagnostics.
    pub fn describe(&self) -> &'static str {
        match &self.kind {
            ExprKind::Name(_) => "name",
            ExprKind::Constant(_) => "literal",
            ExprKind::BoolOp { .. } => "boolean operation",
            ExprKind::BinOp { .. } => "binary operation",
            ExprKind::UnaryOp { .. } => "unary operation",
            ExprKind::Compare { .. } => "comparison",
            ExprKind::IfExp { .. } => "conditional expression",
            ExprKind::Lambda { .. } => "lambda expression",
            ExprKind::Call { .. } => "call result",
            ExprKind::Attribute { .. } => "attribute access",
            ExprKind::Subscript { .. } => "subscript",
            ExprKind::Slice { .. } => "slice",
            ExprKind::Starred(_) => "starred expression",
            ExprKind::List(_) => "list",
            ExprKind::Tuple(_) => "tuple",
            ExprKind::Set(_) => "set",
            ExprKind::Dict(_) => "dict",
            ExprKind::ListComp { .. } => "list comprehension",
            ExprKind::SetComp { .. } => "set comprehension",
            ExprKind::GeneratorExp { .. } => "generator expression",
            ExprKind::DictComp { .. } => "dict comprehension",
        }
    }

    /// Every expression directly beneath this one, in source order.
    ///
    /// This must stay exhaustive: a child left out here is a subtree the
    /// verifier never sees.
    pub fn children(&self) -> Children<'_> {
        let mut out = Children::new();
        match &self.kind {
            ExprKind::Name(_) | ExprKind::Constant(_) => {}
            ExprKind::BoolOp { left, right, .. } | ExprKind::BinOp { left, right, .. } => {
                out.push(left);
                out.push(right);
            }
            ExprKind::UnaryOp { operand, .. } => out.push(operand),
            ExprKind::Compare {
                left, comparators, ..
            } => {
                out.push(left);
                out.extend(comparators.iter());
            }
            ExprKind::IfExp { test, body, orelse } => {
                out.push(body);
                out.push(test);
                out.push(orelse);
            }
            ExprKind::Lambda { params, body } => {
                out.extend(params.params.iter().filter_map(|p| p.default.as_ref()));
                out.push(body);
            }
            ExprKind::Call {
                func,
                args,
                keywords,
            } => {
                out.push(func);
                out.extend(args.iter());
                out.extend(keywords.iter().map(|k| &k.value));
            }
            ExprKind::Attribute { value, .. } => out.push(value),
            ExprKind::Subscript { value, index } => {
                out.push(value);
                out.push(index);
            }
            ExprKind::Slice { lower, upper, step } => {
                out.extend([lower, upper, step].into_iter().flatten().map(|e| &**e));
            }
            ExprKind::Starred(value) => out.push(value),
            ExprKind::List(items) | ExprKind::Tuple(items) | ExprKind::Set(items) => {
                out.extend(items.iter());
            }
            ExprKind::Dict(items) => {
                for item in items {
                    match item {
                        DictItem::Pair { key, value } => {
                            out.push(key);
                            out.push(value);
                        }
                        DictItem::Spread(value) => out.push(value),
                    }
                }
            }
            ExprKind::ListComp {
                element,
                generators,
            }
            | ExprKind::SetComp {
                element,
                generators,
            }
            | ExprKind::GeneratorExp {
                element,
                generators,
            } => {
                out.push(element);
                push_generators(&mut out, generators);
            }
            ExprKind::DictComp {
                key,
                value,
                generators,
            } => {
                out.push(key);
                out.push(value);
                push_generators(&mut out, generators);
            }
        }
        out
    }
}

fn push_generators<'a>(out: &mut Children<'a>, generators: &'a [Comprehension]) {
    for generator in generators {
        out.push(&generator.target);
        out.push(&generator.iter);
        out.extend(generator.ifs.iter());
    }
}
