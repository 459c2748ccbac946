//! Symbolic tensors and expression binding.
//!
//! A [`TensorVar`] names a tensor with a type and a storage format. It can
//! be bound to at most one index expression — assignment or accumulation —
//! which is validated at bind time; and it can stage coordinate data and
//! pack it into compressed storage. Like index variables, tensor variables
//! are shared handles compared by identity.
//!
//! # Examples
//!
//! Binding a matrix-vector style expression:
//!
//! ```
//! use sparten_core::{Format, ScalarKind, Shape, TensorType};
//! use sparten_expr::{IndexVar, TensorVar};
//!
//! let vec_ty = TensorType::new(ScalarKind::Float64, Shape::fixed(&[3]));
//! let a = TensorVar::new("a", vec_ty.clone(), Format::dense(1));
//! let b = TensorVar::new("b", vec_ty.clone(), Format::dense(1));
//! let c = TensorVar::new("c", vec_ty, Format::dense(1));
//!
//! let i = IndexVar::named("i");
//! let rhs = b.access(&[i.clone()]).unwrap() + c.access(&[i.clone()]).unwrap();
//! a.assign(&[i], rhs).unwrap();
//!
//! assert!(a.is_bound());
//! assert_eq!(a.index_expr().unwrap().to_string(), "b(i) + c(i)");
//! ```

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use sparten_core::{fresh_name, Dimension, Format, Shape, TensorType};
use sparten_storage::{CoordinateError, CoordinateSet, PackError, PackedTensor};

use crate::expr::IndexExpr;
use crate::schedule::Schedule;
use crate::validate;
use crate::var::IndexVar;

/// Errors from constructing a tensor access.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// The access has the wrong number of index variables.
    #[error("tensor {tensor} has rank {rank} but was accessed with {got} index variables")]
    ArityMismatch {
        /// Name of the accessed tensor
        tensor: String,
        /// The tensor's rank
        rank: usize,
        /// Number of index variables supplied
        got: usize,
    },
}

/// One conflicting use of an index variable found by the dimension
/// typecheck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionConflict {
    /// The variable bound at two disagreeing dimensions
    pub var: IndexVar,
    /// The dimension the variable was first bound at
    pub expected: Dimension,
    /// The disagreeing dimension
    pub found: Dimension,
}

fn render_conflicts(conflicts: &[DimensionConflict]) -> String {
    conflicts
        .iter()
        .map(|c| format!("{} was bound at {}, now used at {}", c.var, c.expected, c.found))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors from binding an expression to a tensor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    /// The tensor already has a bound expression.
    #[error("tensor {tensor} already has a bound expression")]
    AlreadyBound {
        /// Name of the tensor
        tensor: String,
    },

    /// The free-variable list does not match the tensor's rank.
    #[error("tensor {tensor} has rank {rank} but was bound with {got} free index variables")]
    ArityMismatch {
        /// Name of the tensor
        tensor: String,
        /// The tensor's rank
        rank: usize,
        /// Number of free variables supplied
        got: usize,
    },

    /// The tensor's format does not have one level per dimension.
    #[error("format of {tensor} has {levels} levels but the tensor has rank {rank}")]
    MalformedFormat {
        /// Name of the tensor
        tensor: String,
        /// Number of levels in the format
        levels: usize,
        /// The tensor's rank
        rank: usize,
    },

    /// Index variables were used at disagreeing dimensions.
    #[error("index variables bound to conflicting dimensions: {}", render_conflicts(.conflicts))]
    DimensionMismatch {
        /// Every conflicting pair, in discovery order
        conflicts: Vec<DimensionConflict>,
    },

    /// The expression would traverse an operand's storage in a permuted
    /// order relative to the output format.
    #[error("accessing {tensor} would transpose storage relative to the output ordering")]
    UnsupportedTransposition {
        /// Name of the offending tensor
        tensor: String,
    },

    /// A reduction variable would have to be materialized along several
    /// sparse operands at once.
    #[error("reduction over {var} distributes across multiple sparse operands")]
    UnsupportedDistribution {
        /// The offending reduction variable
        var: IndexVar,
    },
}

/// Errors from staging or packing tensor data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TensorError {
    /// The coordinate had the wrong number of components.
    #[error(transparent)]
    Coordinate(#[from] CoordinateError),

    /// The coordinate lies outside the tensor's known extents.
    #[error("coordinate {coords:?} is out of bounds for {tensor} with shape {shape}")]
    CoordinateOutOfBounds {
        /// Name of the tensor
        tensor: String,
        /// The offending coordinate
        coords: Vec<u32>,
        /// The tensor's shape
        shape: Shape,
    },

    /// The tensor cannot be packed while a dimension size is unknown.
    #[error("cannot pack {tensor}: dimension {axis} has no known size")]
    UnknownDimension {
        /// Name of the tensor
        tensor: String,
        /// The variable-size dimension
        axis: usize,
    },

    /// The packer rejected the staged data.
    #[error(transparent)]
    Pack(#[from] PackError),
}

#[derive(Clone)]
struct Binding {
    free_vars: Vec<IndexVar>,
    expr: IndexExpr,
    accumulate: bool,
}

struct TensorContent {
    name: String,
    ty: TensorType,
    format: Format,
    binding: RwLock<Option<Binding>>,
    coords: RwLock<CoordinateSet<f64>>,
}

/// A symbolic tensor: a name, a type, a storage format, at most one bound
/// expression, and staged coordinate data.
///
/// `TensorVar` is a shared handle; clones refer to the same tensor and
/// equality is identity. Binding and data staging go through interior
/// locks, so handles can be used from several threads.
#[derive(Clone)]
pub struct TensorVar {
    content: Arc<TensorContent>,
}

impl TensorVar {
    /// Creates a tensor with the given name, type, and format.
    ///
    /// Whether the format's length matches the rank is checked at bind and
    /// pack time, not here.
    pub fn new(name: impl Into<String>, ty: TensorType, format: Format) -> Self {
        let rank = ty.rank();
        Self {
            content: Arc::new(TensorContent {
                name: name.into(),
                ty,
                format,
                binding: RwLock::new(None),
                coords: RwLock::new(CoordinateSet::new(rank)),
            }),
        }
    }

    /// Creates a tensor with an auto-generated name (`A0`, `A1`, …).
    pub fn fresh(ty: TensorType, format: Format) -> Self {
        Self::new(fresh_name('A'), ty, format)
    }

    /// The tensor's name.
    pub fn name(&self) -> &str {
        &self.content.name
    }

    /// The tensor's type.
    pub fn tensor_type(&self) -> &TensorType {
        &self.content.ty
    }

    /// The tensor's storage format.
    pub fn format(&self) -> &Format {
        &self.content.format
    }

    /// The tensor's rank.
    pub fn rank(&self) -> usize {
        self.content.ty.rank()
    }

    /// Builds the access expression `self(indices…)`.
    ///
    /// # Errors
    ///
    /// Fails unless exactly one index variable per dimension is given.
    pub fn access(&self, indices: &[IndexVar]) -> Result<IndexExpr, AccessError> {
        if indices.len() != self.rank() {
            return Err(AccessError::ArityMismatch {
                tensor: self.name().to_string(),
                rank: self.rank(),
                got: indices.len(),
            });
        }
        Ok(IndexExpr::access(self.clone(), indices.to_vec()))
    }

    /// Binds `expr` to this tensor over the given free variables.
    ///
    /// The bind is atomic: validation runs under the binding lock and any
    /// failure leaves the tensor unbound. Checks run in order — rebinding,
    /// free-variable arity, format length, dimension typecheck,
    /// transposition, distribution — and the first failure is reported.
    pub fn bind(
        &self,
        free_vars: &[IndexVar],
        expr: IndexExpr,
        accumulate: bool,
    ) -> Result<(), BindError> {
        let mut binding = self.content.binding.write();
        if binding.is_some() {
            return Err(BindError::AlreadyBound {
                tensor: self.name().to_string(),
            });
        }

        let rank = self.rank();
        if free_vars.len() != rank {
            return Err(BindError::ArityMismatch {
                tensor: self.name().to_string(),
                rank,
                got: free_vars.len(),
            });
        }
        if self.content.format.len() != rank {
            return Err(BindError::MalformedFormat {
                tensor: self.name().to_string(),
                levels: self.content.format.len(),
                rank,
            });
        }

        validate::dimension_typecheck(free_vars, self.content.ty.shape(), &expr)
            .map_err(|conflicts| BindError::DimensionMismatch { conflicts })?;
        if let Some(tensor) = validate::find_transposition(self, free_vars, &expr) {
            return Err(BindError::UnsupportedTransposition { tensor });
        }
        if let Some(var) = validate::find_distribution(free_vars, &expr) {
            return Err(BindError::UnsupportedDistribution { var });
        }

        log::debug!(
            "bound {} = {} over {} free variables",
            self.name(),
            expr,
            free_vars.len()
        );
        *binding = Some(Binding {
            free_vars: free_vars.to_vec(),
            expr,
            accumulate,
        });
        Ok(())
    }

    /// Binds `self(free_vars…) = expr`.
    pub fn assign(&self, free_vars: &[IndexVar], expr: IndexExpr) -> Result<(), BindError> {
        self.bind(free_vars, expr, false)
    }

    /// Binds `self(free_vars…) += expr`.
    pub fn accumulate(&self, free_vars: &[IndexVar], expr: IndexExpr) -> Result<(), BindError> {
        self.bind(free_vars, expr, true)
    }

    /// Returns true once an expression is bound.
    pub fn is_bound(&self) -> bool {
        self.content.binding.read().is_some()
    }

    /// The free variables of the bound expression, if any.
    pub fn free_vars(&self) -> Option<Vec<IndexVar>> {
        self.content
            .binding
            .read()
            .as_ref()
            .map(|b| b.free_vars.clone())
    }

    /// The bound expression, if any.
    pub fn index_expr(&self) -> Option<IndexExpr> {
        self.content.binding.read().as_ref().map(|b| b.expr.clone())
    }

    /// Returns true if the binding accumulates into the tensor rather than
    /// assigning it.
    pub fn is_accumulating(&self) -> bool {
        self.content
            .binding
            .read()
            .as_ref()
            .map(|b| b.accumulate)
            .unwrap_or(false)
    }

    /// A snapshot of the operator splits recorded across the bound
    /// expression, gathered pre-order; empty while unbound.
    pub fn schedule(&self) -> Schedule {
        match self.index_expr() {
            Some(expr) => Schedule::from_expr(&expr),
            None => Schedule::default(),
        }
    }

    /// Every index variable involved in the binding: the free variables
    /// plus every variable appearing under an access in the bound
    /// expression. Empty while unbound.
    pub fn index_vars(&self) -> BTreeSet<IndexVar> {
        let binding = self.content.binding.read();
        let mut vars = BTreeSet::new();
        if let Some(binding) = binding.as_ref() {
            vars.extend(binding.free_vars.iter().cloned());
            binding.expr.walk(&mut |node| {
                if let crate::expr::ExprKind::Access { indices, .. } = node.kind() {
                    vars.extend(indices.iter().cloned());
                }
            });
        }
        vars
    }

    /// The iteration range of every index variable in the binding, derived
    /// from the dimensions it indexes. The first dimension a variable is
    /// seen at wins; a validated binding has no disagreeing later uses.
    pub fn index_var_ranges(&self) -> HashMap<IndexVar, Dimension> {
        let binding = self.content.binding.read();
        let mut ranges = HashMap::new();
        if let Some(binding) = binding.as_ref() {
            for (var, dim) in binding.free_vars.iter().zip(self.content.ty.shape().dims()) {
                ranges.entry(var.clone()).or_insert(*dim);
            }
            binding.expr.walk(&mut |node| {
                if let crate::expr::ExprKind::Access { tensor, indices } = node.kind() {
                    for (var, dim) in indices.iter().zip(tensor.tensor_type().shape().dims()) {
                        ranges.entry(var.clone()).or_insert(*dim);
                    }
                }
            });
        }
        ranges
    }

    /// Stages a coordinate/value entry for packing.
    ///
    /// Duplicate coordinates are accepted; see
    /// [`pack`](TensorVar::pack) for how they are treated.
    pub fn insert(&self, coords: &[u32], value: f64) -> Result<(), TensorError> {
        let shape = self.content.ty.shape();
        for (&coord, dim) in coords.iter().zip(shape.dims()) {
            if let Dimension::Fixed(extent) = dim {
                if coord as usize >= *extent {
                    return Err(TensorError::CoordinateOutOfBounds {
                        tensor: self.name().to_string(),
                        coords: coords.to_vec(),
                        shape: shape.clone(),
                    });
                }
            }
        }
        self.content.coords.write().push(coords, value)?;
        Ok(())
    }

    /// Packs the staged entries into this tensor's storage format,
    /// returning an immutable snapshot.
    ///
    /// Duplicates that reach a sparse leaf are kept as repeated indices;
    /// duplicates meeting through dense levels are summed. Every dimension
    /// must have a known size.
    pub fn pack(&self) -> Result<PackedTensor<f64>, TensorError> {
        let shape = self.content.ty.shape();
        let mut extents = Vec::with_capacity(shape.rank());
        for (axis, dim) in shape.dims().iter().enumerate() {
            match dim.size() {
                Some(extent) => extents.push(extent),
                None => {
                    return Err(TensorError::UnknownDimension {
                        tensor: self.name().to_string(),
                        axis,
                    })
                }
            }
        }
        let coords = self.content.coords.read();
        Ok(sparten_storage::pack(&coords, &extents, &self.content.format)?)
    }
}

impl PartialEq for TensorVar {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.content, &other.content)
    }
}

impl Eq for TensorVar {}

impl Hash for TensorVar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.content) as usize).hash(state);
    }
}

impl PartialOrd for TensorVar {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TensorVar {
    fn cmp(&self, other: &Self) -> Ordering {
        Arc::as_ptr(&self.content).cmp(&Arc::as_ptr(&other.content))
    }
}

impl fmt::Debug for TensorVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TensorVar")
            .field("name", &self.name())
            .field("type", &self.content.ty)
            .field("format", &self.content.format)
            .finish()
    }
}

impl fmt::Display for TensorVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {}", self.name(), self.content.ty)
    }
}
