//! # sparten-storage
//!
//! Coordinate intake and compressed level packing for sparten tensors.
//!
//! This crate turns an unordered list of (coordinate, value) entries into
//! the indexed storage layout described by a [`Format`](sparten_core::Format):
//! a tree of levels where each dense level fans out implicitly over its
//! dimension extent and each sparse level stores segment and index arrays
//! for only its nonempty children, with all values linearized at the leaves.
//!
//! # Examples
//!
//! Packing a 3x3 matrix into CSR (`"ds"`):
//!
//! ```
//! use sparten_storage::{pack, CoordinateSet};
//!
//! let mut set = CoordinateSet::new(2);
//! set.push(&[0, 1], 1.0).unwrap();
//! set.push(&[2, 0], 2.0).unwrap();
//! set.push(&[2, 2], 3.0).unwrap();
//!
//! let packed = pack(&set, &[3, 3], &"ds".parse().unwrap()).unwrap();
//! let (segments, indices) = packed.level(1).as_sparse().unwrap();
//! assert_eq!(segments, &[0, 1, 1, 3]);
//! assert_eq!(indices, &[1, 0, 2]);
//! assert_eq!(packed.values(), &[1.0, 2.0, 3.0]);
//! ```
//!
//! # Duplicate coordinates
//!
//! The packer does not reduce duplicate coordinates on its own: duplicates
//! that reach a sparse leaf are kept as repeated indices within a segment,
//! and only duplicates that meet through dense levels are summed. Callers
//! that want canonical output pre-reduce with
//! [`CoordinateSet::deduplicate`].

#![deny(warnings)]

pub mod coo;
pub mod pack;


pub use coo::{CoordinateEntry, CoordinateError, CoordinateSet, Coords};
pub use pack::{pack, LevelIndex, PackError, PackedTensor};
