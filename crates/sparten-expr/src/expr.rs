//! The index-expression tree.
//!
//! An [`IndexExpr`] is a shared-ownership handle to one node of an
//! expression DAG: tensor accesses and scalar immediates at the leaves,
//! negation and the four arithmetic operators above them. Nodes are
//! structurally immutable — children are never rebound, and a subtree may
//! appear under any number of parents — but each node carries a mutable
//! list of operator-split scheduling annotations (see
//! [`crate::schedule::OperatorSplit`]).
//!
//! Expressions are built with ordinary operators; literals lift implicitly:
//!
//! ```
//! use sparten_core::{Format, ScalarKind, Shape, TensorType};
//! use sparten_expr::{IndexVar, TensorVar};
//!
//! let ty = TensorType::new(ScalarKind::Float64, Shape::fixed(&[4]));
//! let b = TensorVar::new("b", ty.clone(), Format::dense(1));
//! let c = TensorVar::new("c", ty, Format::dense(1));
//!
//! let i = IndexVar::named("i");
//! let expr = b.access(&[i.clone()]).unwrap() * 2.0 - c.access(&[i]).unwrap();
//! assert_eq!(expr.to_string(), "b(i) * 2 - c(i)");
//! ```

use std::fmt;
use std::ops;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::schedule::OperatorSplit;
use crate::tensor::TensorVar;
use crate::var::IndexVar;

/// Stable identity of one expression node, used to key scheduling
/// annotations back to the operator they split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExprId(usize);

/// The four binary arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// Addition
    Add,
    /// Subtraction
    Sub,
    /// Multiplication
    Mul,
    /// Division
    Div,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryOp::Add => write!(f, "+"),
            BinaryOp::Sub => write!(f, "-"),
            BinaryOp::Mul => write!(f, "*"),
            BinaryOp::Div => write!(f, "/"),
        }
    }
}

/// One node variant of an index expression.
#[derive(Debug)]
pub enum ExprKind {
    /// A tensor access `T(i,j,…)`; the index-var count equals the tensor's
    /// rank
    Access {
        /// The accessed tensor
        tensor: TensorVar,
        /// One index variable per dimension
        indices: Vec<IndexVar>,
    },
    /// An integer immediate
    IntImm(i64),
    /// A single-precision float immediate
    FloatImm(f32),
    /// A double-precision float immediate
    DoubleImm(f64),
    /// Unary negation
    Neg(IndexExpr),
    /// A binary arithmetic operator
    Binary {
        /// The operator
        op: BinaryOp,
        /// Left operand
        lhs: IndexExpr,
        /// Right operand
        rhs: IndexExpr,
    },
}

struct ExprNode {
    kind: ExprKind,
    splits: RwLock<Vec<OperatorSplit>>,
}

/// A shared-ownership handle to an expression node.
///
/// Cloning is cheap and shares the node; dropping the last handle drops the
/// subtree. The tree is a DAG by construction — children exist before their
/// parents — so reference counting cannot leak cycles.
#[derive(Clone)]
pub struct IndexExpr {
    node: Arc<ExprNode>,
}

impl IndexExpr {
    fn make(kind: ExprKind) -> Self {
        Self {
            node: Arc::new(ExprNode {
                kind,
                splits: RwLock::new(Vec::new()),
            }),
        }
    }

    pub(crate) fn access(tensor: TensorVar, indices: Vec<IndexVar>) -> Self {
        Self::make(ExprKind::Access { tensor, indices })
    }

    /// An integer immediate.
    pub fn int(value: i64) -> Self {
        Self::make(ExprKind::IntImm(value))
    }

    /// A single-precision float immediate.
    pub fn float(value: f32) -> Self {
        Self::make(ExprKind::FloatImm(value))
    }

    /// A double-precision float immediate.
    pub fn double(value: f64) -> Self {
        Self::make(ExprKind::DoubleImm(value))
    }

    /// The node variant.
    pub fn kind(&self) -> &ExprKind {
        &self.node.kind
    }

    /// The node's identity, stable for the node's lifetime.
    pub fn id(&self) -> ExprId {
        ExprId(Arc::as_ptr(&self.node) as usize)
    }

    /// Returns true if both handles point at the same node.
    pub fn same_node(&self, other: &IndexExpr) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }

    /// Declares that iteration over `old` at this node is to be tiled into
    /// `left` × `right`.
    ///
    /// The annotation is scheduling metadata on this node only: it does not
    /// change the expression's structure and does not propagate to children.
    /// Repeated identical splits accumulate rather than deduplicate. A
    /// subtree shared between expressions carries a single annotation list,
    /// visible through every referencing tree.
    pub fn split(&self, old: &IndexVar, left: &IndexVar, right: &IndexVar) {
        self.node.splits.write().push(OperatorSplit::new(
            self.id(),
            old.clone(),
            left.clone(),
            right.clone(),
        ));
    }

    /// A snapshot of this node's operator splits, in annotation order.
    pub fn splits(&self) -> Vec<OperatorSplit> {
        self.node.splits.read().clone()
    }

    /// The ordered children of this node: none for accesses and immediates,
    /// one for negation, left-then-right for binary operators.
    pub fn children(&self) -> Vec<&IndexExpr> {
        match self.kind() {
            ExprKind::Access { .. }
            | ExprKind::IntImm(_)
            | ExprKind::FloatImm(_)
            | ExprKind::DoubleImm(_) => Vec::new(),
            ExprKind::Neg(child) => vec![child],
            ExprKind::Binary { lhs, rhs, .. } => vec![lhs, rhs],
        }
    }

    /// Pre-order traversal: visits this node, then each child's subtree in
    /// order. Deterministic and total; a node shared under several parents
    /// is visited once per occurrence.
    pub fn walk<F: FnMut(&IndexExpr)>(&self, f: &mut F) {
        f(self);
        for child in self.children() {
            child.walk(f);
        }
    }

    fn precedence(&self) -> u8 {
        match self.kind() {
            ExprKind::Binary {
                op: BinaryOp::Add | BinaryOp::Sub,
                ..
            } => 1,
            ExprKind::Binary {
                op: BinaryOp::Mul | BinaryOp::Div,
                ..
            } => 2,
            ExprKind::Neg(_) => 3,
            _ => 4,
        }
    }

    fn fmt_child(child: &IndexExpr, parens: bool, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if parens {
            write!(f, "({})", child)
        } else {
            write!(f, "{}", child)
        }
    }
}

impl fmt::Display for IndexExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            ExprKind::Access { tensor, indices } => {
                write!(f, "{}", tensor.name())?;
                if !indices.is_empty() {
                    write!(f, "(")?;
                    for (k, var) in indices.iter().enumerate() {
                        if k > 0 {
                            write!(f, ",")?;
                        }
                        write!(f, "{}", var)?;
                    }
                    write!(f, ")")?;
                }
                Ok(())
            }
            ExprKind::IntImm(value) => write!(f, "{}", value),
            ExprKind::FloatImm(value) => write!(f, "{}", value),
            ExprKind::DoubleImm(value) => write!(f, "{}", value),
            ExprKind::Neg(child) => {
                write!(f, "-")?;
                Self::fmt_child(child, child.precedence() < 3, f)
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let prec = self.precedence();
                Self::fmt_child(lhs, lhs.precedence() < prec, f)?;
                write!(f, " {} ", op)?;
                // The right operand of - and / also needs parentheses at
                // equal precedence.
                let rhs_parens = rhs.precedence() < prec
                    || (rhs.precedence() == prec
                        && matches!(op, BinaryOp::Sub | BinaryOp::Div));
                Self::fmt_child(rhs, rhs_parens, f)
            }
        }
    }
}

impl fmt::Debug for IndexExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IndexExpr({})", self)
    }
}

impl From<i64> for IndexExpr {
    fn from(value: i64) -> Self {
        IndexExpr::int(value)
    }
}

impl From<i32> for IndexExpr {
    fn from(value: i32) -> Self {
        IndexExpr::int(value as i64)
    }
}

impl From<f32> for IndexExpr {
    fn from(value: f32) -> Self {
        IndexExpr::float(value)
    }
}

impl From<f64> for IndexExpr {
    fn from(value: f64) -> Self {
        IndexExpr::double(value)
    }
}

impl From<&IndexExpr> for IndexExpr {
    fn from(expr: &IndexExpr) -> Self {
        expr.clone()
    }
}

impl ops::Neg for IndexExpr {
    type Output = IndexExpr;

    fn neg(self) -> IndexExpr {
        IndexExpr::make(ExprKind::Neg(self))
    }
}

impl ops::Neg for &IndexExpr {
    type Output = IndexExpr;

    fn neg(self) -> IndexExpr {
        -self.clone()
    }
}

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $op:expr) => {
        impl<R: Into<IndexExpr>> ops::$trait<R> for IndexExpr {
            type Output = IndexExpr;

            fn $method(self, rhs: R) -> IndexExpr {
                IndexExpr::make(ExprKind::Binary {
                    op: $op,
                    lhs: self,
                    rhs: rhs.into(),
                })
            }
        }

        impl<R: Into<IndexExpr>> ops::$trait<R> for &IndexExpr {
            type Output = IndexExpr;

            fn $method(self, rhs: R) -> IndexExpr {
                ops::$trait::$method(self.clone(), rhs)
            }
        }
    };
}

impl_binary_op!(Add, add, BinaryOp::Add);
impl_binary_op!(Sub, sub, BinaryOp::Sub);
impl_binary_op!(Mul, mul, BinaryOp::Mul);
impl_binary_op!(Div, div, BinaryOp::Div);

#[cfg(test)]
mod tests {
    use super::*;
    use sparten_core::{Format, ScalarKind, Shape, TensorType};

    fn vector(name: &str) -> TensorVar {
        TensorVar::new(
            name,
            TensorType::new(ScalarKind::Float64, Shape::fixed(&[4])),
            Format::dense(1),
        )
    }

    fn acc(tensor: &TensorVar, var: &IndexVar) -> IndexExpr {
        tensor.access(&[var.clone()]).unwrap()
    }

    #[test]
    fn test_literal_lifting() {
        assert!(matches!(IndexExpr::from(3i64).kind(), ExprKind::IntImm(3)));
        assert!(matches!(IndexExpr::from(3i32).kind(), ExprKind::IntImm(3)));
        assert!(matches!(
            IndexExpr::from(2.5f32).kind(),
            ExprKind::FloatImm(v) if *v == 2.5
        ));
        assert!(matches!(
            IndexExpr::from(2.5f64).kind(),
            ExprKind::DoubleImm(v) if *v == 2.5
        ));
    }

    #[test]
    fn test_children_order() {
        let (a, b) = (vector("a"), vector("b"));
        let i = IndexVar::named("i");
        let lhs = acc(&a, &i);
        let rhs = acc(&b, &i);
        let sum = &lhs + &rhs;

        let children = sum.children();
        assert_eq!(children.len(), 2);
        assert!(children[0].same_node(&lhs));
        assert!(children[1].same_node(&rhs));

        let neg = -&sum;
        assert_eq!(neg.children().len(), 1);
        assert!(neg.children()[0].same_node(&sum));
        assert!(lhs.children().is_empty());
    }

    #[test]
    fn test_walk_is_preorder() {
        let (a, b) = (vector("a"), vector("b"));
        let i = IndexVar::named("i");
        let expr = acc(&a, &i) + acc(&b, &i) * 2;

        let mut names = Vec::new();
        expr.walk(&mut |node| {
            names.push(match node.kind() {
                ExprKind::Access { tensor, .. } => tensor.name().to_string(),
                ExprKind::Binary { op, .. } => op.to_string(),
                other => format!("{:?}", other),
            })
        });
        assert_eq!(names, vec!["+", "a", "*", "b", "IntImm(2)"]);
    }

    #[test]
    fn test_shared_subtree_is_visited_per_occurrence() {
        let a = vector("a");
        let i = IndexVar::named("i");
        let shared = acc(&a, &i);
        let expr = &shared + &shared;

        let mut count = 0;
        expr.walk(&mut |node| {
            if node.same_node(&shared) {
                count += 1;
            }
        });
        assert_eq!(count, 2);
    }

    #[test]
    fn test_split_records_on_root_only() {
        let (a, b) = (vector("a"), vector("b"));
        let i = IndexVar::named("i");
        let inner = acc(&a, &i) * acc(&b, &i);
        let expr = &inner + 1.0;

        let (left, right) = (IndexVar::named("i0"), IndexVar::named("i1"));
        expr.split(&i, &left, &right);
        expr.split(&i, &left, &right);

        assert_eq!(expr.splits().len(), 2);
        assert!(inner.splits().is_empty());
        assert_eq!(expr.splits()[0].node(), expr.id());
        assert_eq!(expr.splits()[0].old(), &i);
    }

    #[test]
    fn test_splits_shared_across_parents() {
        let a = vector("a");
        let i = IndexVar::named("i");
        let shared = acc(&a, &i);
        let first = &shared + 1.0;
        let second = &shared * 2.0;

        shared.split(&i, &IndexVar::named("io"), &IndexVar::named("ii"));

        // Both trees see the annotation through the shared node.
        assert_eq!(first.children()[0].splits().len(), 1);
        assert_eq!(second.children()[0].splits().len(), 1);
    }

    #[test]
    fn test_display_precedence() {
        let (a, b, c) = (vector("a"), vector("b"), vector("c"));
        let i = IndexVar::named("i");

        let expr = (acc(&a, &i) + acc(&b, &i)) * acc(&c, &i);
        assert_eq!(expr.to_string(), "(a(i) + b(i)) * c(i)");

        let expr = acc(&a, &i) + acc(&b, &i) * acc(&c, &i);
        assert_eq!(expr.to_string(), "a(i) + b(i) * c(i)");

        let expr = acc(&a, &i) - (acc(&b, &i) - acc(&c, &i));
        assert_eq!(expr.to_string(), "a(i) - (b(i) - c(i))");

        let expr = acc(&a, &i) / (acc(&b, &i) / acc(&c, &i));
        assert_eq!(expr.to_string(), "a(i) / (b(i) / c(i))");

        let expr = -(acc(&a, &i) + acc(&b, &i));
        assert_eq!(expr.to_string(), "-(a(i) + b(i))");

        let expr = -acc(&a, &i) * acc(&b, &i);
        assert_eq!(expr.to_string(), "-a(i) * b(i)");
    }

    #[test]
    fn test_display_immediates() {
        let a = vector("a");
        let i = IndexVar::named("i");
        let expr = acc(&a, &i) * 2.5 + 1;
        assert_eq!(expr.to_string(), "a(i) * 2.5 + 1");
    }

    #[test]
    fn test_node_identity() {
        let a = vector("a");
        let i = IndexVar::named("i");
        let expr = acc(&a, &i);
        let alias = expr.clone();

        assert_eq!(expr.id(), alias.id());
        assert!(expr.same_node(&alias));

        let other = acc(&a, &i);
        assert_ne!(expr.id(), other.id());
    }
}
