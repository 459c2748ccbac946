//! Operator-split scheduling annotations and their aggregation.
//!
//! An [`OperatorSplit`] declares that iteration over one index variable at
//! one operator node is to be tiled into an outer × inner pair. Splits are
//! recorded on expression nodes (see [`IndexExpr::split`](crate::IndexExpr::split));
//! a [`Schedule`] is the flat collection gathered from a whole tree.

use crate::expr::{ExprId, IndexExpr};
use crate::var::IndexVar;

/// A declaration that iteration over `old` at the node `node` is split into
/// a tiled iteration over `left` × `right`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorSplit {
    node: ExprId,
    old: IndexVar,
    left: IndexVar,
    right: IndexVar,
}

impl OperatorSplit {
    pub(crate) fn new(node: ExprId, old: IndexVar, left: IndexVar, right: IndexVar) -> Self {
        Self {
            node,
            old,
            left,
            right,
        }
    }

    /// Identity of the operator node carrying the split.
    pub fn node(&self) -> ExprId {
        self.node
    }

    /// The variable whose iteration is split.
    pub fn old(&self) -> &IndexVar {
        &self.old
    }

    /// The outer tile variable.
    pub fn left(&self) -> &IndexVar {
        &self.left
    }

    /// The inner tile variable.
    pub fn right(&self) -> &IndexVar {
        &self.right
    }
}

/// The operator splits of one expression tree, in pre-order discovery
/// order.
///
/// A schedule is a value snapshot: it is built fresh from the tree and is
/// not invalidated by later annotations. Splits on a subtree shared between
/// trees appear once per occurrence, and duplicate annotations are
/// preserved.
///
/// # Examples
///
/// ```
/// use sparten_expr::{IndexExpr, IndexVar, Schedule};
///
/// let expr = IndexExpr::int(1) + IndexExpr::int(2);
/// let (i, io, ii) = (IndexVar::named("i"), IndexVar::named("io"), IndexVar::named("ii"));
/// expr.split(&i, &io, &ii);
///
/// let schedule = Schedule::from_expr(&expr);
/// assert_eq!(schedule.len(), 1);
/// assert_eq!(schedule.splits()[0].old(), &i);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    splits: Vec<OperatorSplit>,
}

impl Schedule {
    /// Collects every operator split reachable from `expr`, visiting nodes
    /// pre-order.
    pub fn from_expr(expr: &IndexExpr) -> Self {
        let mut splits = Vec::new();
        expr.walk(&mut |node| splits.extend(node.splits()));
        Self { splits }
    }

    /// The collected splits in discovery order.
    pub fn splits(&self) -> &[OperatorSplit] {
        &self.splits
    }

    /// Number of collected splits.
    pub fn len(&self) -> usize {
        self.splits.len()
    }

    /// Returns true if no splits were collected.
    pub fn is_empty(&self) -> bool {
        self.splits.is_empty()
    }

    /// Iterates over the collected splits.
    pub fn iter(&self) -> impl Iterator<Item = &OperatorSplit> {
        self.splits.iter()
    }
}
