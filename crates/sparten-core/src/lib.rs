//! # sparten-core
//!
//! Type, shape, and storage-format descriptors for the sparten stack.
//!
//! This crate defines the small vocabulary every other sparten crate speaks:
//!
//! - Scalar element kinds ([`ScalarKind`]) and dimensions that may be known
//!   or left variable ([`Dimension`], [`Shape`], [`TensorType`])
//! - Per-dimension storage formats ([`Format`], [`LevelType`]): each stored
//!   level is either dense or compressed, with an optional storage-level
//!   ordering over the logical dimensions
//! - A process-wide fresh-name generator ([`fresh_name`]) backing anonymous
//!   index variables and tensors
//!
//! # Examples
//!
//! ```
//! use sparten_core::{Format, ScalarKind, Shape, TensorType};
//!
//! // A 3x3 f64 matrix stored with dense rows and compressed columns (CSR).
//! let ty = TensorType::new(ScalarKind::Float64, Shape::fixed(&[3, 3]));
//! let format: Format = "ds".parse().unwrap();
//!
//! assert_eq!(ty.to_string(), "f64(3x3)");
//! assert_eq!(format.to_string(), "ds");
//! ```

#![deny(warnings)]

pub mod format;
pub mod name;
pub mod types;

pub use format::{Format, FormatError, LevelType};
pub use name::fresh_name;
pub use types::{Dimension, ScalarKind, Shape, TensorType};
