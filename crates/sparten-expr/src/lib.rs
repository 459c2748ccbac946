//! # sparten-expr
//!
//! Index-notation expressions, symbolic tensors, and bind-time validation.
//!
//! This crate is the symbolic half of sparten: users create iteration axes
//! ([`IndexVar`]) and symbolic tensors ([`TensorVar`]), compose element-wise
//! index expressions ([`IndexExpr`]) with ordinary operators, and bind an
//! expression to an output tensor as an assignment or accumulation. Binding
//! runs the semantic validator — dimension typechecking, transposition
//! detection, and distribution detection — and either stores the binding
//! atomically or leaves the tensor untouched.
//!
//! Scheduling annotations ([operator splits](OperatorSplit)) attach to
//! expression nodes and aggregate into a [`Schedule`]; staged coordinate
//! data packs into compressed storage through
//! [`TensorVar::insert`]/[`TensorVar::pack`]. Nothing here evaluates an
//! expression: the bound tuple (name, type, format, free variables,
//! expression, accumulate flag, schedule) is the hand-off to a lowering
//! backend.
//!
//! # Examples
//!
//! Sparse matrix-vector style binding:
//!
//! ```
//! use sparten_core::{Format, ScalarKind, Shape, TensorType};
//! use sparten_expr::{IndexVar, TensorVar};
//!
//! let f64_vec = |n| TensorType::new(ScalarKind::Float64, Shape::fixed(&[n]));
//! let a = TensorVar::new("a", f64_vec(3), Format::dense(1));
//! let b = TensorVar::new("B", TensorType::new(ScalarKind::Float64, Shape::fixed(&[3, 3])),
//!                        "ds".parse().unwrap());
//! let c = TensorVar::new("c", f64_vec(3), Format::dense(1));
//!
//! let (i, j) = (IndexVar::named("i"), IndexVar::named("j"));
//! let rhs = b.access(&[i.clone(), j.clone()]).unwrap() * c.access(&[j]).unwrap();
//! a.assign(&[i], rhs).unwrap();
//!
//! assert_eq!(a.index_expr().unwrap().to_string(), "B(i,j) * c(j)");
//! ```

#![deny(warnings)]

pub mod expr;
pub mod schedule;
pub mod tensor;
mod validate;
pub mod var;

pub use expr::{BinaryOp, ExprId, ExprKind, IndexExpr};
pub use schedule::{OperatorSplit, Schedule};
pub use tensor::{AccessError, BindError, DimensionConflict, TensorError, TensorVar};
pub use var::IndexVar;
