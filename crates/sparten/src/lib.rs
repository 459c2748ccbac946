//! # sparten — sparse tensor algebra frontend
//!
//! sparten is the symbolic layer of a sparse tensor compiler: it represents
//! tensors whose dimensions are stored dense or compressed, lets you express
//! element-wise computations in index notation bound to an output tensor,
//! and packs coordinate-listed data into the chosen compressed layout.
//! Nothing here evaluates or lowers expressions — the bound tuple (name,
//! type, format, free variables, expression, accumulate flag, schedule) and
//! the packed arrays are the hand-off to a backend.
//!
//! This is the meta crate re-exporting the sparten components.
//!
//! ## Quick start: packing
//!
//! ```
//! use sparten::prelude::*;
//!
//! // A 3x3 CSR matrix: dense rows over compressed columns.
//! let ty = TensorType::new(ScalarKind::Float64, Shape::fixed(&[3, 3]));
//! let a = TensorVar::new("A", ty, "ds".parse()?);
//! a.insert(&[0, 1], 1.0)?;
//! a.insert(&[2, 0], 2.0)?;
//! a.insert(&[2, 2], 3.0)?;
//!
//! let packed = a.pack()?;
//! let (segments, indices) = packed.level(1).as_sparse().unwrap();
//! assert_eq!(segments, &[0, 1, 1, 3]);
//! assert_eq!(indices, &[1, 0, 2]);
//! assert_eq!(packed.values(), &[1.0, 2.0, 3.0]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Quick start: index expressions
//!
//! ```
//! use sparten::prelude::*;
//!
//! let vec_ty = |n| TensorType::new(ScalarKind::Float64, Shape::fixed(&[n]));
//! let a = TensorVar::new("a", vec_ty(3), Format::dense(1));
//! let b = TensorVar::new("B", TensorType::new(ScalarKind::Float64, Shape::fixed(&[3, 3])),
//!                        "ds".parse()?);
//! let c = TensorVar::new("c", vec_ty(3), Format::dense(1));
//!
//! let (i, j) = (IndexVar::named("i"), IndexVar::named("j"));
//! let rhs = b.access(&[i.clone(), j.clone()])? * c.access(&[j])?;
//! a.assign(&[i], rhs)?;
//!
//! assert_eq!(a.index_expr().unwrap().to_string(), "B(i,j) * c(j)");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Components
//!
//! ### Descriptors ([`core`])
//!
//! Scalar kinds, known-or-variable dimensions, shapes, tensor types, and
//! per-dimension storage formats with an optional storage-level ordering.
//!
//! ### Storage ([`storage`])
//!
//! The coordinate-list intake ([`CoordinateSet`](storage::CoordinateSet)),
//! the level packer ([`pack`](storage::pack)), and the packed result
//! ([`PackedTensor`](storage::PackedTensor)) with per-level segment/index
//! arrays and linearized values.
//!
//! ### Expressions ([`expr`])
//!
//! Index variables, the shared-ownership expression tree with operator-split
//! annotations, schedules, and symbolic tensors with validated binding.

#![deny(warnings)]

pub use sparten_core as core;
pub use sparten_expr as expr;
pub use sparten_storage as storage;

/// Convenient imports for typical frontend use.
pub mod prelude {
    pub use sparten_core::{
        Dimension, Format, FormatError, LevelType, ScalarKind, Shape, TensorType,
    };
    pub use sparten_expr::{
        AccessError, BindError, IndexExpr, IndexVar, OperatorSplit, Schedule, TensorVar,
    };
    pub use sparten_storage::{pack, CoordinateSet, LevelIndex, PackedTensor};
}
