//! Relational expression trees.
//!
//! Facts, predicate bodies and run-command bodies are all [`Expr`] values.
//! Function calls hold a [`FuncRef`] handle rather than a name, so a
//! module-local predicate can never be confused with a library one that
//! happens to share its name.

use serde::{Deserialize, Serialize};

/// Handle to a predicate or function declared in the fixed library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LibraryFn(pub u16);

/// Handle to a predicate or function declared by the module itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LocalFn(pub u16);

/// Identity of a callable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FuncRef {
    Library(LibraryFn),
    Local(LocalFn),
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    /// Relational union `+`.
    Union,
    /// Relational difference `-`.
    Difference,
    /// Relational intersection `&`.
    Intersection,
    /// Cartesian product `->`.
    Product,
    /// Subset `in`.
    In,
    /// Equality `=`.
    Equal,
    /// Inequality `!=`.
    NotEqual,
    /// Conjunction `and`.
    And,
    /// Disjunction `or`.
    Or,
    /// Implication `implies`.
    Implies,
}

impl BinaryOp {
    /// Source token for the operator.
    pub fn token(self) -> &'static str {
        match self {
            BinaryOp::Union => "+",
            BinaryOp::Difference => "-",
            BinaryOp::Intersection => "&",
            BinaryOp::Product => "->",
            BinaryOp::In => "in",
            BinaryOp::Equal => "=",
            BinaryOp::NotEqual => "!=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Implies => "implies",
        }
    }

    /// Binding strength; higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::Implies => 2,
            BinaryOp::And => 3,
            BinaryOp::In | BinaryOp::Equal | BinaryOp::NotEqual => 5,
            BinaryOp::Union | BinaryOp::Difference => 7,
            BinaryOp::Intersection => 9,
            BinaryOp::Product => 10,
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Cardinality `#`.
    Cardinality,
    No,
    Some,
    Lone,
    One,
    /// Negation `!`.
    Not,
    /// Transpose `~`.
    Transpose,
    /// Transitive closure `^`.
    Closure,
    /// Reflexive transitive closure `*`.
    ReflexiveClosure,
}

impl UnaryOp {
    /// Source token, including the separating space for keyword operators.
    pub fn token(self) -> &'static str {
        match self {
            UnaryOp::Cardinality => "#",
            UnaryOp::No => "no ",
            UnaryOp::Some => "some ",
            UnaryOp::Lone => "lone ",
            UnaryOp::One => "one ",
            UnaryOp::Not => "!",
            UnaryOp::Transpose => "~",
            UnaryOp::Closure => "^",
            UnaryOp::ReflexiveClosure => "*",
        }
    }
}

/// Quantifier kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuantKind {
    All,
    Some,
    No,
    Lone,
    One,
}

impl QuantKind {
    pub fn keyword(self) -> &'static str {
        match self {
            QuantKind::All => "all",
            QuantKind::Some => "some",
            QuantKind::No => "no",
            QuantKind::Lone => "lone",
            QuantKind::One => "one",
        }
    }
}

/// A relational expression or formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Reference to a bound variable or signature.
    Var(String),
    /// Relational join `a.b`.
    Join(Box<Expr>, Box<Expr>),
    /// Binary operator application.
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    /// Unary operator application.
    Unary(UnaryOp, Box<Expr>),
    /// Predicate or function call; zero arguments renders as a bare name.
    Call(FuncRef, Vec<Expr>),
    /// `kind var: domain | body`
    Quantifier {
        kind: QuantKind,
        var: String,
        domain: String,
        body: Box<Expr>,
    },
    /// Integer constant.
    Const(i64),
}

impl Expr {
    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var(name.into())
    }

    /// `self.rhs`
    pub fn join(self, rhs: Expr) -> Self {
        Expr::Join(Box::new(self), Box::new(rhs))
    }

    /// `var.field`, the usual way a bound variable reaches one of its fields.
    pub fn field(var: &str, field: &str) -> Self {
        Expr::var(var).join(Expr::var(field))
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary(op, Box::new(lhs), Box::new(rhs))
    }

    pub fn unary(op: UnaryOp, inner: Expr) -> Self {
        Expr::Unary(op, Box::new(inner))
    }

    /// `self + rhs`
    pub fn union(self, rhs: Expr) -> Self {
        Expr::binary(BinaryOp::Union, self, rhs)
    }

    /// `self in rhs`
    pub fn within(self, rhs: Expr) -> Self {
        Expr::binary(BinaryOp::In, self, rhs)
    }

    /// `self = rhs`
    pub fn equals(self, rhs: Expr) -> Self {
        Expr::binary(BinaryOp::Equal, self, rhs)
    }

    /// `self and rhs`
    pub fn and(self, rhs: Expr) -> Self {
        Expr::binary(BinaryOp::And, self, rhs)
    }

    /// `no self`
    pub fn no(self) -> Self {
        Expr::unary(UnaryOp::No, self)
    }

    /// `some self`
    pub fn some(self) -> Self {
        Expr::unary(UnaryOp::Some, self)
    }

    /// `#self`
    pub fn cardinality(self) -> Self {
        Expr::unary(UnaryOp::Cardinality, self)
    }

    /// `all var: domain | body`
    pub fn all(var: impl Into<String>, domain: impl Into<String>, body: Expr) -> Self {
        Expr::Quantifier {
            kind: QuantKind::All,
            var: var.into(),
            domain: domain.into(),
            body: Box::new(body),
        }
    }

    /// Left-nested union of all operands; `None` when there are none.
    pub fn union_all(operands: impl IntoIterator<Item = Expr>) -> Option<Self> {
        operands.into_iter().reduce(Expr::union)
    }

    /// Left-nested conjunction of all operands; `None` when there are none.
    pub fn conjoin(operands: impl IntoIterator<Item = Expr>) -> Option<Self> {
        operands.into_iter().reduce(Expr::and)
    }

    /// Flatten a conjunction tree into its conjuncts, left to right.
    pub fn conjuncts(&self) -> Vec<&Expr> {
        let mut out = Vec::new();
        self.collect_conjuncts(&mut out);
        out
    }

    fn collect_conjuncts<'a>(&'a self, out: &mut Vec<&'a Expr>) {
        match self {
            Expr::Binary(BinaryOp::And, lhs, rhs) => {
                lhs.collect_conjuncts(out);
                rhs.collect_conjuncts(out);
            }
            other => out.push(other),
        }
    }

    /// Every callable referenced in this expression, in first-reference order.
    pub fn calls(&self) -> Vec<FuncRef> {
        let mut out = Vec::new();
        self.collect_calls(&mut out);
        out
    }

    fn collect_calls(&self, out: &mut Vec<FuncRef>) {
        match self {
            Expr::Var(_) | Expr::Const(_) => {}
            Expr::Join(a, b) | Expr::Binary(_, a, b) => {
                a.collect_calls(out);
                b.collect_calls(out);
            }
            Expr::Unary(_, a) => a.collect_calls(out),
            Expr::Quantifier { body, .. } => body.collect_calls(out),
            Expr::Call(func, args) => {
                if !out.contains(func) {
                    out.push(*func);
                }
                for arg in args {
                    arg.collect_calls(out);
                }
            }
        }
    }
}
